//! Session bootstrap
//!
//! Resolves the current user's identity and the authenticated REST handle
//! from the configured bearer credential. The identity is an explicit value
//! handed to every component that needs an "is this mine" comparison; no
//! global cache.

use crate::api::{ApiClient, UserIdentity};
use crate::config::ClientConfig;
use crate::{Error, Result};
use tracing::info;

/// Authenticated session: the resolved identity plus the REST handle
#[derive(Debug, Clone)]
pub struct Session {
    api: ApiClient,
    identity: UserIdentity,
}

impl Session {
    /// Establish a session from the configured credential
    ///
    /// # Errors
    /// Returns [`Error::Auth`] when no bearer credential is configured, and
    /// the profile fetch's error when the backend rejects it - the chat view
    /// refuses to initialize in either case.
    pub async fn bootstrap(config: &ClientConfig) -> Result<Self> {
        let token = config
            .bearer_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Auth("No bearer credential configured".to_string()))?;

        let api = ApiClient::new(&config.api_base_url, token)?;
        let identity = api.profile().await?;

        info!("Session established for user {}", identity.id);

        Ok(Self { api, identity })
    }

    /// The authenticated REST handle
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The current user's identity
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }
}
