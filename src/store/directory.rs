//! Conversation directory with unread-count projection merging

use crate::store::conversation::Conversation;
use std::collections::HashMap;
use tracing::debug;

/// Directory of bookings-with-chat available to the current user
///
/// The full list is replaced on a directory fetch; the periodic
/// unread-count poll merges only the unread projection into the entries
/// already loaded, without discarding any other field.
#[derive(Debug, Default)]
pub struct ConversationDirectory {
    conversations: Vec<Conversation>,
}

impl ConversationDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversations in the order the backend listed them
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Look up a conversation by booking ID
    pub fn get(&self, booking_id: u64) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.booking_id == booking_id)
    }

    /// Number of conversations in the directory
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Replace the directory with a freshly fetched list
    pub fn replace(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    /// Merge the unread-count projection into the loaded directory
    ///
    /// Entries absent from `counts` keep their stored count; entries in
    /// `counts` with no matching conversation are ignored until the next
    /// full directory fetch picks them up.
    pub fn merge_unread_counts(&mut self, counts: &HashMap<u64, u32>) {
        for conversation in &mut self.conversations {
            if let Some(count) = counts.get(&conversation.booking_id) {
                conversation.unread_count = *count;
            }
        }
    }

    /// Decrement a conversation's unread count, saturating at zero
    pub fn decrement_unread(&mut self, booking_id: u64, by: u32) {
        match self.conversations.iter_mut().find(|c| c.booking_id == booking_id) {
            Some(conversation) => {
                conversation.unread_count = conversation.unread_count.saturating_sub(by);
            }
            None => debug!("Unread decrement for unknown booking {} ignored", booking_id),
        }
    }

    /// Total unread messages across all conversations
    pub fn total_unread(&self) -> u64 {
        self.conversations.iter().map(|c| u64::from(c.unread_count)).sum()
    }
}
