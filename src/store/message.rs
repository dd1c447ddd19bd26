//! Message structures and read-state tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compact sender embedded in a delivered message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderSummary {
    /// User ID of the sender
    pub id: u64,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A chat message within a booking conversation
///
/// Once appended to a store a message is immutable except for `read_at`,
/// which transitions from `None` to a value exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message ID (server-assigned)
    pub id: u64,
    /// Booking this message belongs to
    #[serde(default)]
    pub booking_id: u64,
    /// User ID of the sender
    pub sender_id: u64,
    /// Embedded sender summary, when the backend includes one
    #[serde(default)]
    pub sender: Option<SenderSummary>,
    /// Message body text (wire name `message`)
    #[serde(rename = "message")]
    pub body: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Read timestamp; `None` until the recipient has seen the message
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Whether this message was authored by the given user
    pub fn is_mine(&self, user_id: u64) -> bool {
        self.sender_id == user_id
    }

    /// Whether the message has been read
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Set the read timestamp if not already set
    ///
    /// The transition is one-way: a second call leaves the original value in
    /// place and returns `false`.
    pub fn mark_read(&mut self, read_at: DateTime<Utc>) -> bool {
        if self.read_at.is_some() {
            return false;
        }
        self.read_at = Some(read_at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn message(id: u64, sender_id: u64) -> Message {
        Message {
            id,
            booking_id: 42,
            sender_id,
            sender: None,
            body: "hello".to_string(),
            created_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn test_mark_read_sets_once() {
        let mut msg = message(1, 7);
        let first = Utc::now();
        let later = first + Duration::seconds(30);

        assert!(msg.mark_read(first));
        assert!(!msg.mark_read(later), "second mark_read must be a no-op");
        assert_eq!(msg.read_at, Some(first));
    }

    #[test]
    fn test_is_mine() {
        let msg = message(1, 7);
        assert!(msg.is_mine(7));
        assert!(!msg.is_mine(8));
    }

    #[test]
    fn test_wire_body_field_is_message() {
        let json = serde_json::to_string(&message(1, 7)).expect("serialize");
        assert!(json.contains("\"message\":\"hello\""));
    }
}
