//! Message composer
//!
//! The draft buffer with optimistic-clear semantics: the input is cleared
//! before the send resolves, and restored - without clobbering anything the
//! user typed in the meantime - when the send fails.

use tokio::sync::Mutex;

/// Draft text for the message being composed
#[derive(Debug, Default)]
pub struct Composer {
    draft: Mutex<String>,
}

impl Composer {
    /// Create an empty composer
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft with the given text
    pub async fn set_draft(&self, text: impl Into<String>) {
        let mut draft = self.draft.lock().await;
        *draft = text.into();
    }

    /// Current draft text
    pub async fn draft(&self) -> String {
        self.draft.lock().await.clone()
    }

    /// Take the draft for sending, clearing the input optimistically
    ///
    /// Returns `None` when the draft trims to empty - nothing to send.
    pub async fn take_draft(&self) -> Option<String> {
        let mut draft = self.draft.lock().await;
        if draft.trim().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut *draft))
    }

    /// Restore a draft after a failed send
    ///
    /// No user input is ever lost: the failed text comes back unless the
    /// user already started typing something new.
    pub async fn restore_draft(&self, text: String) {
        let mut draft = self.draft.lock().await;
        if draft.is_empty() {
            *draft = text;
        }
    }

    /// Clear the draft
    pub async fn clear(&self) {
        let mut draft = self.draft.lock().await;
        draft.clear();
    }
}
