//! Conversation directory entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counterpart user on the other side of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterpart {
    /// User ID of the counterpart
    pub id: u64,
    /// Display name
    pub name: String,
    /// Avatar URL
    #[serde(default)]
    pub avatar: Option<String>,
    /// Username handle
    #[serde(default)]
    pub username: Option<String>,
    /// Contact phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
}

/// Vehicle attached to the booked rental
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Manufacturer
    pub make: String,
    /// Model name
    pub model: String,
}

/// A booking with chat, as listed in the conversation directory
///
/// Created server-side when a booking is made; fetched read-only by this
/// client. Only the unread count is mutated locally, when messages are
/// marked read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Booking ID identifying the conversation
    #[serde(rename = "id")]
    pub booking_id: u64,
    /// The user on the other side of the chat
    #[serde(rename = "user")]
    pub counterpart: Counterpart,
    /// The booked vehicle
    #[serde(rename = "car")]
    pub vehicle: Vehicle,
    /// Scheduled start of the rental
    #[serde(rename = "start_time")]
    pub starts_at: DateTime<Utc>,
    /// Number of unread messages in this conversation
    #[serde(default)]
    pub unread_count: u32,
}
