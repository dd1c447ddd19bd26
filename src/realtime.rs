//! Realtime channel subscriber
//!
//! This module owns the WebSocket leg of the client:
//! - Connection and `connection_established` handshake
//! - One reader task decoding frames and dispatching typed events
//! - Private-channel subscribe/unsubscribe with the one-live-channel rule
//! - Client whisper events on the active channel
//!
//! Reconnection is owned by the caller's transport policy, not here; the
//! handlers this module dispatches to are idempotent against re-delivery.

use crate::protocol::{self, ChannelEvent, Frame};
use crate::{Error, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Callback type for decoded channel events
pub type EventHandler = Arc<dyn Fn(ChannelEvent) + Send + Sync>;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Connection to the realtime broadcast service
///
/// Holds at most one channel subscription at a time. Switching
/// conversations unsubscribes the prior channel before the new subscribe
/// frame goes out, so two listeners are never live at once.
pub struct RealtimeConnection {
    /// Write half of the socket
    sink: Arc<Mutex<WsSink>>,
    /// Socket ID assigned during the handshake
    socket_id: String,
    /// The single currently subscribed channel
    current_channel: Arc<Mutex<Option<String>>>,
    /// Event handler callback
    event_handler: Arc<Mutex<Option<EventHandler>>>,
    /// Reader task, aborted on shutdown
    reader: JoinHandle<()>,
}

impl RealtimeConnection {
    /// Connect to the realtime service and complete the handshake
    ///
    /// # Arguments
    /// * `ws_url` - WebSocket endpoint, e.g. `wss://ws.example.com/app/rentchat`
    ///
    /// # Errors
    /// Returns an error if the socket cannot be opened or the connection
    /// closes before the handshake frame arrives.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        info!("Connecting to realtime service at {}", ws_url);

        let (socket, _response) = connect_async(ws_url).await?;
        let (sink, source) = socket.split();
        let sink = Arc::new(Mutex::new(sink));
        let event_handler: Arc<Mutex<Option<EventHandler>>> = Arc::new(Mutex::new(None));

        let (handshake_tx, handshake_rx) = oneshot::channel();
        let reader = tokio::spawn(read_loop(
            source,
            sink.clone(),
            event_handler.clone(),
            handshake_tx,
        ));

        let socket_id = handshake_rx.await.map_err(|_| {
            Error::Realtime("Connection closed before handshake completed".to_string())
        })?;

        info!("Realtime handshake complete, socket id {}", socket_id);

        Ok(Self {
            sink,
            socket_id,
            current_channel: Arc::new(Mutex::new(None)),
            event_handler,
            reader,
        })
    }

    /// Socket ID assigned by the service, used for the channel auth handshake
    pub fn socket_id(&self) -> &str {
        &self.socket_id
    }

    /// Set the handler invoked for every decoded channel event
    pub async fn set_event_handler<F>(&self, handler: F)
    where
        F: Fn(ChannelEvent) + Send + Sync + 'static,
    {
        let mut guard = self.event_handler.lock().await;
        *guard = Some(Arc::new(handler));
    }

    /// The currently subscribed channel, if any
    pub async fn current_channel(&self) -> Option<String> {
        self.current_channel.lock().await.clone()
    }

    /// Subscribe to a private channel
    ///
    /// Any prior subscription is released first, inside the same critical
    /// section, so exactly one channel is ever live.
    ///
    /// # Arguments
    /// * `channel` - Channel name, e.g. from [`protocol::booking_channel`]
    /// * `auth` - Signature from the backend's channel auth handshake
    pub async fn subscribe(&self, channel: &str, auth: &str) -> Result<()> {
        let mut guard = self.current_channel.lock().await;

        if let Some(previous) = guard.take() {
            self.send_frame(&protocol::unsubscribe_frame(&previous)).await?;
            info!("Unsubscribed from channel {}", previous);
        }

        self.send_frame(&protocol::subscribe_frame(channel, auth)).await?;
        *guard = Some(channel.to_string());
        info!("Subscribed to channel {}", channel);

        Ok(())
    }

    /// Unsubscribe from the active channel, if any
    pub async fn unsubscribe(&self) -> Result<()> {
        let mut guard = self.current_channel.lock().await;

        if let Some(channel) = guard.take() {
            self.send_frame(&protocol::unsubscribe_frame(&channel)).await?;
            info!("Unsubscribed from channel {}", channel);
        }

        Ok(())
    }

    /// Send a typing whisper on the active channel
    ///
    /// # Errors
    /// Returns an error when no channel is subscribed or the socket write
    /// fails.
    pub async fn whisper(&self, user_id: u64) -> Result<()> {
        let guard = self.current_channel.lock().await;
        let channel = guard
            .as_ref()
            .ok_or_else(|| Error::Realtime("No active channel for whisper".to_string()))?;

        self.send_frame(&protocol::whisper_frame(channel, user_id)).await
    }

    async fn send_frame(&self, frame: &Frame) -> Result<()> {
        let json = frame.to_json()?;
        debug!("-> {}", json);

        let mut sink = self.sink.lock().await;
        sink.send(WsMessage::text(json)).await?;
        Ok(())
    }

    /// Abort the reader task and close the socket
    ///
    /// The event handler is never invoked after this returns.
    pub async fn shutdown(&self) {
        self.reader.abort();

        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            debug!("Socket close failed: {}", e);
        }

        info!("Realtime connection shut down");
    }
}

/// Reader loop: decode frames, answer pings, dispatch everything else
async fn read_loop(
    mut source: WsSource,
    sink: Arc<Mutex<WsSink>>,
    event_handler: Arc<Mutex<Option<EventHandler>>>,
    handshake: oneshot::Sender<String>,
) {
    let mut handshake = Some(handshake);

    while let Some(item) = source.next().await {
        let message = match item {
            Ok(message) => message,
            Err(e) => {
                error!("Realtime stream error: {}", e);
                break;
            }
        };

        let text = match message {
            WsMessage::Text(text) => text,
            WsMessage::Ping(payload) => {
                let mut sink = sink.lock().await;
                if let Err(e) = sink.send(WsMessage::Pong(payload)).await {
                    warn!("Failed to answer transport ping: {}", e);
                }
                continue;
            }
            WsMessage::Close(_) => {
                info!("Realtime connection closed by server");
                break;
            }
            _ => continue,
        };

        debug!("<- {}", text.as_str());

        let frame = match Frame::from_json(text.as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                continue;
            }
        };

        let event = match ChannelEvent::from_frame(&frame) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping undecodable {} event: {}", frame.event, e);
                continue;
            }
        };

        match event {
            ChannelEvent::Connected { socket_id } => match handshake.take() {
                Some(tx) => {
                    let _ = tx.send(socket_id);
                }
                None => warn!("Duplicate handshake frame ignored"),
            },
            ChannelEvent::Ping => {
                let pong = match protocol::pong_frame().to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode pong: {}", e);
                        continue;
                    }
                };
                let mut sink = sink.lock().await;
                if let Err(e) = sink.send(WsMessage::text(pong)).await {
                    warn!("Failed to answer keepalive ping: {}", e);
                }
            }
            other => {
                let guard = event_handler.lock().await;
                match guard.as_ref() {
                    Some(handler) => handler(other),
                    None => debug!("No event handler set, event dropped"),
                }
            }
        }
    }
}
