//! REST backend boundary
//!
//! Thin typed wrapper over the marketplace REST API. Every response envelope
//! is normalized here, exactly once, by the `normalize_*` functions; the rest
//! of the crate only ever sees the stable shapes from [`crate::store`].

use crate::store::{Conversation, Message};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Current-user identity resolved at session bootstrap
///
/// Passed explicitly into every "is this message mine" comparison instead of
/// being cached in global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// User ID
    pub id: u64,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Account email
    #[serde(default)]
    pub email: Option<String>,
}

/// Signed payload returned by the private-channel auth handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAuth {
    /// Signature the realtime service expects in the subscribe frame
    pub auth: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    user: UserIdentity,
}

/// History page inside the envelope: nested pagination, or the legacy flat
/// list some endpoints still return. One untagged enum, decoded in one
/// place, so downstream code never probes response shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryPage {
    Paginated { data: Vec<Message> },
    Legacy { messages: Vec<Message> },
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    booking_id: u64,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct MarkReadRequest {
    message_id: u64,
}

#[derive(Debug, Serialize)]
struct ChannelAuthRequest<'a> {
    socket_id: &'a str,
    channel_name: &'a str,
}

/// Parse the conversation list envelope `{ "data": [...] }`
pub(crate) fn normalize_conversations(raw: &str) -> Result<Vec<Conversation>> {
    let envelope: Envelope<Vec<Conversation>> = serde_json::from_str(raw)?;
    Ok(envelope.data)
}

/// Parse the history envelope, accepting both page shapes
pub(crate) fn normalize_history(raw: &str) -> Result<Vec<Message>> {
    let envelope: Envelope<HistoryPage> = serde_json::from_str(raw)?;
    Ok(match envelope.data {
        HistoryPage::Paginated { data } => data,
        HistoryPage::Legacy { messages } => messages,
    })
}

/// Parse the profile envelope `{ "user": {...} }`
pub(crate) fn normalize_profile(raw: &str) -> Result<UserIdentity> {
    let envelope: ProfileEnvelope = serde_json::from_str(raw)?;
    Ok(envelope.user)
}

/// Parse the unread-count map `{ "data": { "<booking_id>": count } }`
///
/// Keys arrive as JSON strings; entries that don't parse as booking IDs are
/// skipped with a warning rather than failing the whole poll.
pub(crate) fn normalize_unread_counts(raw: &str) -> Result<HashMap<u64, u32>> {
    let envelope: Envelope<HashMap<String, u32>> = serde_json::from_str(raw)?;
    let mut counts = HashMap::with_capacity(envelope.data.len());
    for (key, count) in envelope.data {
        match key.parse::<u64>() {
            Ok(booking_id) => {
                counts.insert(booking_id, count);
            }
            Err(_) => warn!("Skipping unread-count entry with non-numeric key {:?}", key),
        }
    }
    Ok(counts)
}

/// Parse the optional created-message echo from a send response
pub(crate) fn normalize_send_echo(raw: &str) -> Option<Message> {
    match serde_json::from_str::<Envelope<Message>>(raw) {
        Ok(envelope) => Some(envelope.data),
        Err(_) => {
            debug!("Send response carried no message echo");
            None
        }
    }
}

/// Typed REST client for the booking chat backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given origin, authenticated with a bearer token
    ///
    /// # Arguments
    /// * `base_url` - REST backend origin, e.g. `https://api.example.com`
    /// * `bearer_token` - Credential sent as `Authorization: Bearer ...` on every call
    pub fn new(base_url: &str, bearer_token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", bearer_token))
            .map_err(|e| Error::Auth(format!("Invalid bearer credential: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check status and read the body, mapping failures into crate errors
    async fn read_body(response: reqwest::Response, context: &str) -> Result<String> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth(format!("{} rejected the credential", context)));
        }
        if !status.is_success() {
            return Err(Error::Api(format!("{} failed with status {}", context, status)));
        }
        Ok(response.text().await?)
    }

    /// Resolve the current user's identity
    pub async fn profile(&self) -> Result<UserIdentity> {
        debug!("Fetching profile");
        let response = self.http.get(self.url("/profile")).send().await?;
        let body = Self::read_body(response, "Profile fetch").await?;
        normalize_profile(&body)
    }

    /// Fetch the list of bookings-with-chat for the current user
    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        debug!("Fetching conversation directory");
        let response = self.http.get(self.url("/driver/bookings")).send().await?;
        let body = Self::read_body(response, "Directory fetch").await?;
        normalize_conversations(&body)
    }

    /// Fetch the message history for one booking
    pub async fn history(&self, booking_id: u64) -> Result<Vec<Message>> {
        debug!("Fetching history for booking {}", booking_id);
        let response = self
            .http
            .get(self.url(&format!("/bookings/{}/chat", booking_id)))
            .send()
            .await?;
        let body = Self::read_body(response, "History fetch").await?;
        normalize_history(&body)
    }

    /// Send a message, returning the created message when the backend echoes it
    pub async fn send_message(&self, booking_id: u64, text: &str) -> Result<Option<Message>> {
        debug!("Sending message to booking {}", booking_id);
        let response = self
            .http
            .post(self.url(&format!("/bookings/{}/chat", booking_id)))
            .json(&SendMessageRequest {
                booking_id,
                message: text,
            })
            .send()
            .await?;
        let body = Self::read_body(response, "Send").await?;
        Ok(normalize_send_echo(&body))
    }

    /// Mark one message as read
    pub async fn mark_read(&self, booking_id: u64, message_id: u64) -> Result<()> {
        debug!("Marking message {} read in booking {}", message_id, booking_id);
        let response = self
            .http
            .post(self.url(&format!("/bookings/{}/chat/mark-read", booking_id)))
            .json(&MarkReadRequest { message_id })
            .send()
            .await?;
        Self::read_body(response, "Mark-read").await?;
        Ok(())
    }

    /// Fetch the unread-count projection for all conversations
    pub async fn unread_counts(&self) -> Result<HashMap<u64, u32>> {
        debug!("Fetching unread counts");
        let response = self
            .http
            .get(self.url("/bookings/chat/unread-count"))
            .send()
            .await?;
        let body = Self::read_body(response, "Unread-count fetch").await?;
        normalize_unread_counts(&body)
    }

    /// Signal that the current user is typing in a booking's chat
    pub async fn typing_ping(&self, booking_id: u64) -> Result<()> {
        debug!("Typing ping for booking {}", booking_id);
        let response = self
            .http
            .post(self.url(&format!("/bookings/{}/chat/typing", booking_id)))
            .send()
            .await?;
        Self::read_body(response, "Typing ping").await?;
        Ok(())
    }

    /// Authorize a private-channel subscription for this socket
    pub async fn channel_auth(&self, socket_id: &str, channel_name: &str) -> Result<ChannelAuth> {
        debug!("Authorizing channel {} for socket {}", channel_name, socket_id);
        let response = self
            .http
            .post(self.url("/broadcasting/auth"))
            .json(&ChannelAuthRequest {
                socket_id,
                channel_name,
            })
            .send()
            .await?;
        let body = Self::read_body(response, "Channel auth").await?;
        Ok(serde_json::from_str(&body)?)
    }
}
