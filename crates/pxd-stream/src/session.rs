//! Session state machine over a [`StreamTransport`].
//!
//! # States
//!
//! ```text
//! Disconnected ──spawn──► Connecting ──ok──► Open ──stream error/close──► Reconnecting
//!                             │                ▲                               │
//!                             │ fail           └───────────ok─────────────────┘
//!                             ▼                                                │
//!                        Reconnecting ──cap consecutive failures reached──► Closed (terminal)
//! ```
//!
//! A successful open resets the consecutive-failure counter. `Closed` is
//! terminal: the owner discards the session and builds a new one when the
//! connection info changes. Dropping the [`StreamSession`] handle (or the
//! event receiver) cancels the task and releases the transport regardless
//! of state.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{FeedStream, SessionError, StreamTransport, TransportError};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Built but not yet spawned, or torn down by the owner.
    Disconnected,
    /// First dial in progress.
    Connecting,
    /// Feed is live; items are flowing.
    Open,
    /// Lost the feed; retrying while attempts remain.
    Reconnecting,
    /// Attempt budget exhausted. **Terminal.**
    Closed,
}

impl SessionState {
    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed)
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Everything the session tells its consumer, in strict arrival order on
/// one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent<T> {
    /// One decoded feed item (a snapshot, a log line, ...).
    Item(T),
    /// The session moved to a new lifecycle state.
    State(SessionState),
    /// Terminal failure; no further events follow.
    Terminal(SessionError),
}

// ---------------------------------------------------------------------------
// SessionOptions
// ---------------------------------------------------------------------------

/// Tuning knobs; the defaults match the dashboard's socket helper.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Consecutive failed connect→read cycles tolerated before `Closed`.
    pub max_attempts: u32,
    /// Pause between reconnect attempts.
    pub retry_delay: Duration,
    /// Event channel capacity.
    pub channel_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            channel_capacity: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// StreamSession
// ---------------------------------------------------------------------------

/// Owner handle for a running session task.
///
/// Dropping the handle signals shutdown; [`close`][StreamSession::close]
/// does the same but waits for the task to finish releasing the transport.
pub struct StreamSession {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<SessionState>,
    task: tokio::task::JoinHandle<()>,
}

impl StreamSession {
    /// Spawn the session task and return the handle plus the ordered event
    /// stream.
    pub fn spawn<T, Tr>(transport: Tr, opts: SessionOptions) -> (StreamSession, mpsc::Receiver<SessionEvent<T>>)
    where
        T: Send + 'static,
        Tr: StreamTransport<T> + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(opts.channel_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);

        let task = tokio::spawn(run_session(transport, opts, event_tx, shutdown_rx, state_tx));

        (
            StreamSession {
                shutdown: shutdown_tx,
                state: state_rx,
                task,
            },
            event_rx,
        )
    }

    /// Current lifecycle state, readable without consuming events.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Signal shutdown and wait for the task to release the transport.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

// ---------------------------------------------------------------------------
// Task body
// ---------------------------------------------------------------------------

async fn run_session<T, Tr>(
    transport: Tr,
    opts: SessionOptions,
    events: mpsc::Sender<SessionEvent<T>>,
    mut shutdown: watch::Receiver<bool>,
    state: watch::Sender<SessionState>,
) where
    T: Send + 'static,
    Tr: StreamTransport<T>,
{
    let mut consecutive_failures: u32 = 0;
    let mut first_attempt = true;

    loop {
        let connecting = if first_attempt {
            SessionState::Connecting
        } else {
            SessionState::Reconnecting
        };
        first_attempt = false;
        if !publish_state(&events, &state, connecting).await {
            return;
        }

        let connected = tokio::select! {
            _ = shutdown.changed() => return,
            connected = transport.connect() => connected,
        };

        let last_error = match connected {
            Ok(stream) => {
                consecutive_failures = 0;
                info!("feed open");
                if !publish_state(&events, &state, SessionState::Open).await {
                    return;
                }

                match drain_feed(stream, &events, &mut shutdown).await {
                    DrainOutcome::Shutdown => return,
                    DrainOutcome::Interrupted(err) => err,
                }
            }
            Err(err) => {
                debug!(%err, "connect attempt failed");
                err
            }
        };

        consecutive_failures += 1;
        if consecutive_failures >= opts.max_attempts {
            warn!(attempts = consecutive_failures, %last_error, "attempt budget exhausted");
            let _ = state.send(SessionState::Closed);
            let _ = events
                .send(SessionEvent::State(SessionState::Closed))
                .await;
            let _ = events
                .send(SessionEvent::Terminal(SessionError::AttemptsExhausted {
                    attempts: consecutive_failures,
                    last: last_error,
                }))
                .await;
            return;
        }

        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(opts.retry_delay) => {}
        }
    }
}

enum DrainOutcome {
    /// Owner asked us to stop (or the consumer went away).
    Shutdown,
    /// The feed broke; reconnect if attempts remain.
    Interrupted(TransportError),
}

/// Pump items from an open feed into the event channel until it breaks.
async fn drain_feed<T: Send + 'static>(
    mut stream: Box<dyn FeedStream<T>>,
    events: &mpsc::Sender<SessionEvent<T>>,
    shutdown: &mut watch::Receiver<bool>,
) -> DrainOutcome {
    loop {
        let next = tokio::select! {
            _ = shutdown.changed() => return DrainOutcome::Shutdown,
            next = stream.next_item() => next,
        };

        match next {
            Some(Ok(item)) => {
                if events.send(SessionEvent::Item(item)).await.is_err() {
                    // Consumer dropped its receiver: same as shutdown.
                    return DrainOutcome::Shutdown;
                }
            }
            Some(Err(err)) => return DrainOutcome::Interrupted(err),
            None => return DrainOutcome::Interrupted(TransportError::Closed),
        }
    }
}

/// Mirror a state into the watch and the event stream. Returns `false`
/// when the consumer is gone.
async fn publish_state<T>(
    events: &mpsc::Sender<SessionEvent<T>>,
    state: &watch::Sender<SessionState>,
    next: SessionState,
) -> bool {
    let _ = state.send(next);
    events.send(SessionEvent::State(next)).await.is_ok()
}
