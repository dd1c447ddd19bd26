//! Read receipts
//!
//! Best-effort, one-shot mark-read calls plus the policy deciding which
//! messages qualify. Failures are logged and swallowed - read status never
//! blocks anything, and the visible state is handled by the realtime
//! `MessageRead` echo or an optimistic local set.

use crate::api::{ApiClient, UserIdentity};
use crate::store::Message;
use tracing::{debug, warn};

/// Whether a message should be marked read on behalf of the current user
///
/// A candidate has no read timestamp yet and was not authored by the
/// current user. Own messages are only ever marked by the remote party,
/// reflected back as `MessageRead` events.
pub fn is_receipt_candidate(message: &Message, identity: &UserIdentity) -> bool {
    message.read_at.is_none() && message.sender_id != identity.id
}

/// Fire a one-shot mark-read call
///
/// Not retried; on failure the message simply stays shown as unread until a
/// later delivery marks it.
pub async fn mark_as_read(api: &ApiClient, booking_id: u64, message_id: u64) {
    match api.mark_read(booking_id, message_id).await {
        Ok(()) => debug!("Marked message {} read in booking {}", message_id, booking_id),
        Err(e) => warn!(
            "Failed to mark message {} read in booking {}: {}",
            message_id, booking_id, e
        ),
    }
}

/// Mark every candidate in a freshly loaded history page
///
/// Returns how many candidates were submitted, for the caller's local
/// unread-count adjustment.
pub async fn mark_candidates(
    api: &ApiClient,
    identity: &UserIdentity,
    booking_id: u64,
    messages: &[Message],
) -> u32 {
    let mut submitted = 0u32;

    for message in messages {
        if is_receipt_candidate(message, identity) {
            mark_as_read(api, booking_id, message.id).await;
            submitted += 1;
        }
    }

    submitted
}
