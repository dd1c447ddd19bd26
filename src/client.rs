//! Booking conversation client
//!
//! This module wires the session, conversation directory, message store,
//! realtime subscriber, read receipts, typing indicator, and composer into
//! one facade. It owns the teardown-then-setup choreography on conversation
//! switch and the background unread-count poll.
//!
//! Error policy follows the chat view's taxonomy: a missing credential
//! refuses to bootstrap; history and send failures surface to the caller;
//! mark-read and typing signals fail silently; realtime transport errors are
//! left to the transport.

use crate::api::{ApiClient, UserIdentity};
use crate::composer::Composer;
use crate::config::ClientConfig;
use crate::protocol::{self, ChannelEvent};
use crate::realtime::RealtimeConnection;
use crate::receipts;
use crate::session::Session;
use crate::store::{Conversation, ConversationDirectory, Message, MessageStore};
use crate::typing::{TypingIndicator, TypingPublisher, TypingState};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Top-level client for booking conversations
///
/// # Example
/// ```rust,no_run
/// use rentchat::client::ChatClient;
/// use rentchat::config::ClientConfig;
///
/// # async fn example() -> rentchat::Result<()> {
/// let config = ClientConfig::new("https://api.example.com", "wss://ws.example.com/app/key")
///     .with_bearer_token("secret-token");
///
/// let client = ChatClient::bootstrap(config).await?;
/// client.start_unread_polling().await;
///
/// client.select_conversation(42).await?;
/// client.send("When can I pick up the car?").await?;
///
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct ChatClient {
    config: ClientConfig,
    api: ApiClient,
    identity: UserIdentity,
    directory: Arc<Mutex<ConversationDirectory>>,
    store: Arc<Mutex<MessageStore>>,
    typing: Arc<TypingIndicator>,
    typing_publisher: TypingPublisher,
    composer: Composer,
    realtime: Mutex<Option<RealtimeConnection>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl ChatClient {
    /// Establish a session and load the conversation directory
    ///
    /// # Errors
    /// Returns [`Error::Auth`] when no bearer credential is configured and
    /// the profile fetch's error when the backend rejects it. A failed
    /// initial directory load is logged and swallowed - the next poll cycle
    /// or a manual refresh retries it naturally.
    pub async fn bootstrap(config: ClientConfig) -> Result<Self> {
        let session = Session::bootstrap(&config).await?;
        let client = Self::from_parts(config, session.api().clone(), session.identity().clone());

        if let Err(e) = client.refresh_directory().await {
            warn!("Initial directory load failed: {}", e);
        }

        Ok(client)
    }

    /// Assemble a client from already-resolved parts
    pub(crate) fn from_parts(config: ClientConfig, api: ApiClient, identity: UserIdentity) -> Self {
        let typing = Arc::new(TypingIndicator::new(config.typing_quiet_period_ms));
        let typing_publisher = TypingPublisher::new(config.typing_refresh_interval_ms);

        Self {
            config,
            api,
            identity,
            directory: Arc::new(Mutex::new(ConversationDirectory::new())),
            store: Arc::new(Mutex::new(MessageStore::new())),
            typing,
            typing_publisher,
            composer: Composer::new(),
            realtime: Mutex::new(None),
            poller: Mutex::new(None),
        }
    }

    /// The current user's identity
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    /// Snapshot of the conversation directory
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.directory.lock().await.conversations().to_vec()
    }

    /// Snapshot of the selected conversation's messages
    pub async fn messages(&self) -> Vec<Message> {
        self.store.lock().await.messages().to_vec()
    }

    /// Booking of the currently selected conversation
    pub async fn active_booking(&self) -> Option<u64> {
        self.store.lock().await.booking_id()
    }

    /// Whether the last history load for the selected conversation failed
    pub async fn history_failed(&self) -> bool {
        self.store.lock().await.load_failed()
    }

    /// Current state of the remote-typing affordance
    pub async fn typing_state(&self) -> TypingState {
        self.typing.state().await
    }

    /// Current composer draft
    pub async fn draft(&self) -> String {
        self.composer.draft().await
    }

    /// Replace the composer draft
    pub async fn set_draft(&self, text: impl Into<String>) {
        self.composer.set_draft(text).await;
    }

    /// Fetch the full conversation directory
    pub async fn refresh_directory(&self) -> Result<()> {
        let conversations = self.api.conversations().await?;
        info!("Loaded {} conversations", conversations.len());
        self.directory.lock().await.replace(conversations);
        Ok(())
    }

    /// Start the fixed-interval unread-count poll
    ///
    /// Poll failures are logged and skipped without touching the loaded
    /// directory - availability over consistency for a background refresh.
    pub async fn start_unread_polling(&self) {
        let mut poller = self.poller.lock().await;
        if poller.is_some() {
            return;
        }

        let api = self.api.clone();
        let directory = self.directory.clone();
        let period = Duration::from_millis(self.config.unread_poll_interval_ms);

        *poller = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the fetch on mount already
            // covered that point in time
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match api.unread_counts().await {
                    Ok(counts) => directory.lock().await.merge_unread_counts(&counts),
                    Err(e) => warn!("Unread-count poll failed, keeping last known counts: {}", e),
                }
            }
        }));

        info!(
            "Unread-count polling started ({} ms interval)",
            self.config.unread_poll_interval_ms
        );
    }

    /// Stop the unread-count poll
    pub async fn stop_unread_polling(&self) {
        let mut poller = self.poller.lock().await;
        if let Some(handle) = poller.take() {
            handle.abort();
        }
    }

    /// Select a conversation: teardown, history load, receipts, subscribe
    ///
    /// Strictly teardown-then-setup: the prior channel is released and the
    /// store rebound before the history fetch goes out. A response that
    /// resolves after a further switch is discarded, never applied to the
    /// new view.
    ///
    /// # Errors
    /// A failed history fetch leaves an empty store with the failure
    /// surfaced and returns the error; retry is manual.
    pub async fn select_conversation(&self, booking_id: u64) -> Result<()> {
        info!("Selecting conversation for booking {}", booking_id);

        {
            let realtime = self.realtime.lock().await;
            if let Some(connection) = realtime.as_ref() {
                if let Err(e) = connection.unsubscribe().await {
                    warn!("Unsubscribe during switch failed: {}", e);
                }
            }
        }
        self.typing.reset().await;
        self.typing_publisher.reset().await;
        self.store.lock().await.begin_load(booking_id);

        let history = match self.api.history(booking_id).await {
            Ok(history) => history,
            Err(e) => {
                self.store.lock().await.mark_load_failed(booking_id);
                return Err(e);
            }
        };

        let accepted = self.store.lock().await.replace(booking_id, history.clone());
        if !accepted {
            // Superseded by a newer selection while the fetch was in flight
            return Ok(());
        }

        let candidates =
            receipts::mark_candidates(&self.api, &self.identity, booking_id, &history).await;
        if candidates > 0 {
            self.directory.lock().await.decrement_unread(booking_id, candidates);
        }

        self.attach_channel(booking_id).await
    }

    /// Authorize and subscribe the private channel for a booking
    async fn attach_channel(&self, booking_id: u64) -> Result<()> {
        self.ensure_realtime().await?;

        let channel = protocol::booking_channel(booking_id);
        let realtime = self.realtime.lock().await;
        let connection = realtime
            .as_ref()
            .ok_or_else(|| Error::Realtime("Realtime connection unavailable".to_string()))?;

        let auth = self.api.channel_auth(connection.socket_id(), &channel).await?;

        // The selection may have moved on while authorizing
        if self.store.lock().await.booking_id() != Some(booking_id) {
            debug!("Skipping subscribe for superseded booking {}", booking_id);
            return Ok(());
        }

        connection.subscribe(&channel, &auth.auth).await
    }

    /// Connect the realtime socket once and install the event handler
    async fn ensure_realtime(&self) -> Result<()> {
        let mut realtime = self.realtime.lock().await;
        if realtime.is_some() {
            return Ok(());
        }

        let connection = RealtimeConnection::connect(&self.config.ws_url).await?;
        connection.set_event_handler(self.event_handler()).await;
        *realtime = Some(connection);

        Ok(())
    }

    /// Build the handler dispatching decoded channel events
    ///
    /// The handler runs on the reader task; anything that needs the network
    /// or a store lock is spawned so the stream never stalls. Handlers are
    /// idempotent: re-delivered events fall out at the store's dedup and the
    /// read-state monotonicity.
    fn event_handler(&self) -> impl Fn(ChannelEvent) + Send + Sync + 'static {
        let api = self.api.clone();
        let identity = self.identity.clone();
        let store = self.store.clone();
        let directory = self.directory.clone();
        let typing = self.typing.clone();

        move |event| match event {
            ChannelEvent::MessageSent { message, .. } => {
                let api = api.clone();
                let store = store.clone();
                let directory = directory.clone();
                let mine = message.sender_id == identity.id;

                tokio::spawn(async move {
                    let booking_id = message.booking_id;
                    let message_id = message.id;

                    let inserted = store.lock().await.append(message);

                    // A message the current user did not author gets its
                    // receipt exactly once, on first insertion
                    if inserted && !mine {
                        receipts::mark_as_read(&api, booking_id, message_id).await;
                    }

                    match api.unread_counts().await {
                        Ok(counts) => directory.lock().await.merge_unread_counts(&counts),
                        Err(e) => warn!("Unread-count refresh failed: {}", e),
                    }
                });
            }
            ChannelEvent::MessageRead {
                message_id,
                read_at,
                ..
            } => {
                let store = store.clone();
                tokio::spawn(async move {
                    store.lock().await.mark_read(message_id, read_at);
                });
            }
            ChannelEvent::TypingWhisper { user_id, .. } => {
                // Local echo suppression
                if user_id != identity.id {
                    let typing = typing.clone();
                    tokio::spawn(async move {
                        typing.pulse().await;
                    });
                }
            }
            ChannelEvent::SubscriptionSucceeded { channel } => {
                info!("Subscription confirmed on {}", channel);
            }
            ChannelEvent::ProtocolError { message } => {
                warn!("Realtime service error: {}", message);
            }
            ChannelEvent::Connected { .. } | ChannelEvent::Ping | ChannelEvent::Other { .. } => {}
        }
    }

    /// Set the draft and send it
    ///
    /// Returns `Ok(true)` when the message went out, `Ok(false)` when the
    /// send was rejected as a no-op (blank text or no selected
    /// conversation).
    pub async fn send(&self, text: &str) -> Result<bool> {
        self.composer.set_draft(text).await;
        self.send_draft().await
    }

    /// Send the current draft with optimistic clearing
    ///
    /// The draft is cleared before the network call resolves and restored
    /// when the call fails, so no typed input is ever lost. A backend echo
    /// of the created message is appended through the store's idempotent
    /// upsert, which also guards the race against the realtime delivery of
    /// the same message.
    pub async fn send_draft(&self) -> Result<bool> {
        let Some(draft) = self.composer.take_draft().await else {
            return Ok(false);
        };

        let Some(booking_id) = self.store.lock().await.booking_id() else {
            debug!("Send rejected: no conversation selected");
            self.composer.restore_draft(draft).await;
            return Ok(false);
        };

        match self.api.send_message(booking_id, &draft).await {
            Ok(echo) => {
                if let Some(message) = echo {
                    self.store.lock().await.append(message);
                }
                Ok(true)
            }
            Err(e) => {
                warn!("Send failed, restoring draft: {}", e);
                self.composer.restore_draft(draft).await;
                Err(e)
            }
        }
    }

    /// Register a keystroke in the composer's input
    ///
    /// Throttled into at most one typing signal per refresh interval, sent
    /// both as a REST ping and as a channel whisper. Both legs are
    /// best-effort; failures are logged and swallowed.
    pub async fn typing_keystroke(&self) {
        let Some(booking_id) = self.store.lock().await.booking_id() else {
            return;
        };

        if !self.typing_publisher.should_send().await {
            return;
        }

        if let Err(e) = self.api.typing_ping(booking_id).await {
            debug!("Typing ping failed: {}", e);
        }

        let realtime = self.realtime.lock().await;
        if let Some(connection) = realtime.as_ref() {
            if let Err(e) = connection.whisper(self.identity.id).await {
                debug!("Typing whisper failed: {}", e);
            }
        }
    }

    /// Tear the client down: polling, typing timers, realtime connection
    pub async fn shutdown(&self) {
        self.stop_unread_polling().await;
        self.typing.reset().await;

        let connection = self.realtime.lock().await.take();
        if let Some(connection) = connection {
            if let Err(e) = connection.unsubscribe().await {
                debug!("Unsubscribe during shutdown failed: {}", e);
            }
            connection.shutdown().await;
        }

        info!("Chat client shut down");
    }
}
