//! Realtime wire protocol
//!
//! This module defines the frames exchanged with the realtime broadcast
//! service including:
//! - The raw frame structure (event name, channel, data)
//! - Decoding into typed channel events
//! - Builders for the outbound control and whisper frames
//! - Channel naming for booking conversations
//!
//! Frames are Pusher-style JSON. The service double-encodes the `data` field
//! of some control frames as a JSON string; that quirk is absorbed here, in
//! one place, so the subscriber only ever sees decoded values.

use crate::store::Message;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Event names used on the socket
pub mod events {
    /// Handshake completion, carries the socket ID
    pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
    /// Outbound channel subscription request
    pub const SUBSCRIBE: &str = "pusher:subscribe";
    /// Outbound channel unsubscription
    pub const UNSUBSCRIBE: &str = "pusher:unsubscribe";
    /// Subscription acknowledgement
    pub const SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";
    /// Server keepalive probe
    pub const PING: &str = "pusher:ping";
    /// Keepalive response
    pub const PONG: &str = "pusher:pong";
    /// Server-reported protocol error
    pub const ERROR: &str = "pusher:error";
    /// A message was broadcast on a conversation channel
    pub const MESSAGE_SENT: &str = "MessageSent";
    /// The remote party read a message
    pub const MESSAGE_READ: &str = "MessageRead";
    /// Client-to-client typing whisper (not persisted)
    pub const TYPING_WHISPER: &str = "client-typing";
}

/// Private channel name for a booking conversation
pub fn booking_channel(booking_id: u64) -> String {
    format!("private-booking.{}", booking_id)
}

/// Raw frame as it travels on the socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    /// Event name
    pub event: String,

    /// Channel the event belongs to, absent on connection-level frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Event payload, possibly double-encoded as a JSON string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Frame {
    /// Create a frame for a channel event
    pub fn new(event: &str, channel: Option<&str>, data: Option<Value>) -> Self {
        Self {
            event: event.to_string(),
            channel: channel.map(str::to_string),
            data,
        }
    }

    /// Encode the frame to its JSON wire form
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Json)
    }

    /// Decode a frame from its JSON wire form
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(Error::Json)
    }

    /// The frame payload with the double-encoding quirk absorbed
    ///
    /// A `data` field holding a JSON string is decoded once more; anything
    /// else is returned as-is.
    pub fn decoded_data(&self) -> Result<Value> {
        match &self.data {
            None => Ok(Value::Null),
            Some(Value::String(inner)) => serde_json::from_str(inner).map_err(Error::Json),
            Some(value) => Ok(value.clone()),
        }
    }
}

/// Build the subscribe frame for a private channel
pub fn subscribe_frame(channel: &str, auth: &str) -> Frame {
    Frame::new(
        events::SUBSCRIBE,
        None,
        Some(json!({ "channel": channel, "auth": auth })),
    )
}

/// Build the unsubscribe frame for a channel
pub fn unsubscribe_frame(channel: &str) -> Frame {
    Frame::new(events::UNSUBSCRIBE, None, Some(json!({ "channel": channel })))
}

/// Build the keepalive response frame
pub fn pong_frame() -> Frame {
    Frame::new(events::PONG, None, None)
}

/// Build a typing whisper for the given channel
pub fn whisper_frame(channel: &str, user_id: u64) -> Frame {
    Frame::new(
        events::TYPING_WHISPER,
        Some(channel),
        Some(json!({ "user_id": user_id })),
    )
}

/// Decoded channel event delivered to the subscriber's handler
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// Socket handshake completed
    Connected {
        /// Socket ID used for the channel auth handshake
        socket_id: String,
    },
    /// Private-channel subscription acknowledged
    SubscriptionSucceeded {
        /// The acknowledged channel
        channel: String,
    },
    /// A new message was broadcast on the conversation channel
    MessageSent {
        /// Channel the message arrived on
        channel: String,
        /// The delivered message
        message: Message,
    },
    /// The remote party read a message
    MessageRead {
        /// Channel the receipt arrived on
        channel: String,
        /// ID of the message that was read
        message_id: u64,
        /// When it was read
        read_at: DateTime<Utc>,
    },
    /// Typing whisper from another client on the channel
    TypingWhisper {
        /// Channel the whisper arrived on
        channel: String,
        /// User who is typing
        user_id: u64,
    },
    /// Server keepalive probe
    Ping,
    /// Server-reported protocol error
    ProtocolError {
        /// Human-readable error description
        message: String,
    },
    /// Any event this client does not consume
    Other {
        /// The unrecognized event name
        event: String,
    },
}

impl ChannelEvent {
    /// Decode a raw frame into a typed channel event
    ///
    /// Unknown event names map to [`ChannelEvent::Other`] rather than an
    /// error, so new server events never break the subscriber.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let channel = frame.channel.clone().unwrap_or_default();

        match frame.event.as_str() {
            events::CONNECTION_ESTABLISHED => {
                #[derive(Deserialize)]
                struct Data {
                    socket_id: String,
                }
                let data: Data = serde_json::from_value(frame.decoded_data()?)?;
                Ok(ChannelEvent::Connected {
                    socket_id: data.socket_id,
                })
            }
            events::SUBSCRIPTION_SUCCEEDED => Ok(ChannelEvent::SubscriptionSucceeded { channel }),
            events::MESSAGE_SENT => {
                #[derive(Deserialize)]
                struct Data {
                    message: Message,
                }
                let data: Data = serde_json::from_value(frame.decoded_data()?)?;
                Ok(ChannelEvent::MessageSent {
                    channel,
                    message: data.message,
                })
            }
            events::MESSAGE_READ => {
                #[derive(Deserialize)]
                struct Data {
                    message_id: u64,
                    read_at: DateTime<Utc>,
                }
                let data: Data = serde_json::from_value(frame.decoded_data()?)?;
                Ok(ChannelEvent::MessageRead {
                    channel,
                    message_id: data.message_id,
                    read_at: data.read_at,
                })
            }
            events::TYPING_WHISPER => {
                #[derive(Deserialize)]
                struct Data {
                    user_id: u64,
                }
                let data: Data = serde_json::from_value(frame.decoded_data()?)?;
                Ok(ChannelEvent::TypingWhisper {
                    channel,
                    user_id: data.user_id,
                })
            }
            events::PING => Ok(ChannelEvent::Ping),
            events::ERROR => {
                #[derive(Deserialize)]
                struct Data {
                    #[serde(default)]
                    message: String,
                }
                let data: Data =
                    serde_json::from_value(frame.decoded_data()?).unwrap_or(Data {
                        message: String::new(),
                    });
                Ok(ChannelEvent::ProtocolError {
                    message: data.message,
                })
            }
            other => Ok(ChannelEvent::Other {
                event: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_json_roundtrip() {
        let original = whisper_frame("private-booking.42", 7);

        let encoded = original.to_json().expect("Failed to encode frame");
        let decoded = Frame::from_json(&encoded).expect("Failed to decode frame");

        assert_eq!(decoded, original);
        assert_eq!(decoded.event, events::TYPING_WHISPER);
        assert_eq!(decoded.channel.as_deref(), Some("private-booking.42"));
    }

    #[test]
    fn test_double_encoded_handshake_data() {
        // The handshake frame carries its payload as a JSON *string*
        let raw = r#"{"event":"pusher:connection_established","data":"{\"socket_id\":\"123.456\"}"}"#;

        let frame = Frame::from_json(raw).expect("Failed to decode frame");
        let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

        match event {
            ChannelEvent::Connected { socket_id } => assert_eq!(socket_id, "123.456"),
            other => panic!("Expected Connected, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_maps_to_other() {
        let frame = Frame::new("SomethingNew", Some("private-booking.1"), None);
        let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

        match event {
            ChannelEvent::Other { event } => assert_eq!(event, "SomethingNew"),
            other => panic!("Expected Other, got {:?}", other),
        }
    }

    #[test]
    fn test_booking_channel_name() {
        assert_eq!(booking_channel(42), "private-booking.42");
    }
}
