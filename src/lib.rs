//! Rentchat - realtime booking conversation client
//!
//! This library provides the client-side core of the booking chat for a
//! car-rental marketplace: the live messaging session bound to one rental
//! booking between a renter and an owner/agent. It combines a REST backend
//! boundary with a Pusher-style realtime channel subscription, and keeps the
//! conversation state (message history, unread counts, read receipts, typing
//! indicator) consistent across both delivery paths.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod client;
pub mod composer;
pub mod config;
pub mod protocol;
pub mod realtime;
pub mod receipts;
pub mod session;
pub mod store;
pub mod typing;

/// Result type alias for rentchat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for rentchat operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or rejected bearer credential
    #[error("Auth error: {0}")]
    Auth(String),

    /// REST backend error
    #[error("API error: {0}")]
    Api(String),

    /// Realtime channel error
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize the rentchat library with logging
pub fn init() {
    tracing_subscriber::fmt::init();
}

#[cfg(test)]
mod tests;
