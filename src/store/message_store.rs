//! Ordered message history for the selected conversation
//!
//! The store holds the history of exactly one booking at a time. Appends are
//! idempotent upserts by message ID, so a message delivered both via the
//! REST echo and the realtime channel lands exactly once. Responses from a
//! conversation that is no longer selected are rejected by comparing the
//! booking ID captured at request time against the current one.

use crate::store::message::Message;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Ordered, de-duplicated message history for one conversation
#[derive(Debug, Default)]
pub struct MessageStore {
    /// Booking the store is currently bound to
    booking_id: Option<u64>,
    /// Messages in arrival order
    messages: Vec<Message>,
    /// Whether the last history load failed (empty store, surfaced error)
    load_failed: bool,
}

impl MessageStore {
    /// Create an empty store bound to no conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Booking the store is currently bound to
    pub fn booking_id(&self) -> Option<u64> {
        self.booking_id
    }

    /// Messages in arrival order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Look up a message by ID
    pub fn get(&self, message_id: u64) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// Number of messages currently held
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the store holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the last history load for the current booking failed
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// Bind the store to a conversation, dropping all prior state
    ///
    /// Called synchronously at conversation switch, before the history fetch
    /// is issued. Messages from the previous conversation never bleed into
    /// the new view.
    pub fn begin_load(&mut self, booking_id: u64) {
        self.booking_id = Some(booking_id);
        self.messages.clear();
        self.load_failed = false;
    }

    /// Replace the store contents with a freshly fetched history
    ///
    /// Rejected (returns `false`) when `booking_id` is not the currently
    /// bound conversation - a stale response from before a switch. Messages
    /// that arrived over the realtime channel while the fetch was in flight
    /// are kept, re-appended behind the history through the same idempotent
    /// upsert.
    pub fn replace(&mut self, booking_id: u64, history: Vec<Message>) -> bool {
        if self.booking_id != Some(booking_id) {
            debug!(
                "Discarding stale history for booking {} (current: {:?})",
                booking_id, self.booking_id
            );
            return false;
        }

        let live: Vec<Message> = std::mem::take(&mut self.messages);
        self.load_failed = false;

        for message in history {
            self.append(message);
        }
        for message in live {
            self.append(message);
        }

        true
    }

    /// Record a failed history load for the given conversation
    ///
    /// Leaves an empty store with the failure surfaced, never a stale
    /// display. Rejected for a booking that is no longer selected.
    pub fn mark_load_failed(&mut self, booking_id: u64) -> bool {
        if self.booking_id != Some(booking_id) {
            return false;
        }
        self.messages.clear();
        self.load_failed = true;
        true
    }

    /// Append one message, de-duplicated by ID
    ///
    /// Returns `true` only when the message was newly inserted. A message
    /// for another booking, or one whose ID is already present, is dropped -
    /// this is what makes the REST-echo and realtime delivery paths safe to
    /// race against each other.
    pub fn append(&mut self, message: Message) -> bool {
        if self.booking_id != Some(message.booking_id) {
            debug!(
                "Dropping message {} for booking {} (current: {:?})",
                message.id, message.booking_id, self.booking_id
            );
            return false;
        }
        if self.messages.iter().any(|m| m.id == message.id) {
            debug!("Duplicate append of message {} ignored", message.id);
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Set a message's read timestamp if not already set
    ///
    /// Returns `true` when the transition happened. Later events never unset
    /// or rewind an existing read timestamp.
    pub fn mark_read(&mut self, message_id: u64, read_at: DateTime<Utc>) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => message.mark_read(read_at),
            None => {
                debug!("Read receipt for unknown message {} ignored", message_id);
                false
            }
        }
    }

    /// Unbind the store and drop all state
    pub fn clear(&mut self) {
        self.booking_id = None;
        self.messages.clear();
        self.load_failed = false;
    }
}
