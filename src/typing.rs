//! Typing indicator
//!
//! Inbound: the IDLE/TYPING display state driven by channel whispers, with a
//! cancellable quiet timer. Outbound: the throttle deciding when the local
//! user's keystrokes turn into typing signals.
//!
//! Timer handles are owned here and aborted on reset or teardown; a
//! generation counter makes sure a superseded timer can never clear the
//! state a newer whisper armed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Display state of the remote-typing affordance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState {
    /// Nobody is typing
    Idle,
    /// The remote user is typing
    Typing,
}

/// Inbound typing indicator with a cancellable quiet timer
///
/// # Example
/// ```rust,no_run
/// use rentchat::typing::TypingIndicator;
///
/// # async fn example() {
/// let indicator = TypingIndicator::new(3_000);
///
/// // A whisper from the remote user arrived
/// indicator.pulse().await;
/// assert!(indicator.is_typing().await);
///
/// // 3 seconds of silence later the indicator clears itself
/// # }
/// ```
pub struct TypingIndicator {
    /// Current display state
    state: Arc<Mutex<TypingState>>,
    /// Quiet period after which TYPING falls back to IDLE
    quiet_period: Duration,
    /// Bumped on every pulse/reset; a timer only clears its own generation
    generation: Arc<AtomicU64>,
    /// The armed quiet timer, if any
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl TypingIndicator {
    /// Create an indicator with the given quiet period
    pub fn new(quiet_period_ms: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(TypingState::Idle)),
            quiet_period: Duration::from_millis(quiet_period_ms),
            generation: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(None),
        }
    }

    /// Current display state
    pub async fn state(&self) -> TypingState {
        *self.state.lock().await
    }

    /// Whether the remote user is currently shown as typing
    pub async fn is_typing(&self) -> bool {
        self.state().await == TypingState::Typing
    }

    /// Register a whisper from the remote user
    ///
    /// Flips the state to TYPING and (re)arms the quiet timer; every new
    /// whisper pushes the fall-back to IDLE out by the full quiet period.
    pub async fn pulse(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.lock().await;
            *state = TypingState::Typing;
        }

        let mut timer = self.timer.lock().await;
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let generations = self.generation.clone();
        let quiet_period = self.quiet_period;

        *timer = Some(tokio::spawn(async move {
            sleep(quiet_period).await;

            // A newer pulse or a reset owns the state now
            if generations.load(Ordering::SeqCst) != generation {
                return;
            }

            let mut state = state.lock().await;
            *state = TypingState::Idle;
            debug!("Typing indicator cleared after quiet period");
        }));
    }

    /// Clear the indicator immediately and cancel the timer
    ///
    /// Called on conversation switch and teardown.
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut timer = self.timer.lock().await;
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        let mut state = self.state.lock().await;
        *state = TypingState::Idle;
    }
}

/// Throttle for outbound typing signals
///
/// While the local user types continuously, a signal goes out at most once
/// per refresh interval; the first keystroke after a pause always sends.
#[derive(Debug)]
pub struct TypingPublisher {
    refresh_interval: Duration,
    last_sent: Mutex<Option<Instant>>,
}

impl TypingPublisher {
    /// Create a publisher with the given refresh interval
    pub fn new(refresh_interval_ms: u64) -> Self {
        Self {
            refresh_interval: Duration::from_millis(refresh_interval_ms),
            last_sent: Mutex::new(None),
        }
    }

    /// Whether the throttle window allows a new signal right now
    ///
    /// Records the send time when it does.
    pub async fn should_send(&self) -> bool {
        let mut last_sent = self.last_sent.lock().await;

        match *last_sent {
            Some(at) if at.elapsed() < self.refresh_interval => false,
            _ => {
                *last_sent = Some(Instant::now());
                true
            }
        }
    }

    /// Forget the throttle history
    ///
    /// Called on conversation switch so the first keystroke in a new chat
    /// signals immediately.
    pub async fn reset(&self) {
        let mut last_sent = self.last_sent.lock().await;
        *last_sent = None;
    }
}
