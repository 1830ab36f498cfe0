//! Connection lifecycle and reconnection.

use super::{ConnectionStatus, Connector, FrameStream, StreamError};
use futures::StreamExt;
use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Sleep;

/// Default delay before a dropped connection is retried.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(4000);

type ConnectAttempt = Pin<Box<dyn Future<Output = Result<FrameStream, StreamError>> + Send>>;

/// The single transport handle owned by the manager.
enum Link {
    Idle,
    Connecting(ConnectAttempt),
    Open(FrameStream),
}

/// Something the owner of the manager should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Connection established
    Connected,
    /// Text frame received on the open connection
    Frame(String),
    /// Transport reported an error; status is `Error` until the following
    /// event applies the close
    Errored { message: String },
    /// Connection ended (or never came up); a reconnect has been scheduled
    Disconnected { error: Option<String> },
    /// The reconnect timer fired and a new attempt is in flight
    Reconnecting,
}

enum Wake {
    Established(Result<FrameStream, StreamError>),
    Inbound(Option<Result<String, StreamError>>),
    TimerFired,
}

/// Owns at most one logical connection to the producer and keeps
/// [`ConnectionStatus`] accurate.
///
/// The manager is driven by a single task: callers invoke [`connect`] and
/// [`disconnect`] directly and await [`next_event`] for everything the
/// transport or the reconnect timer produces. Only one reconnect timer is
/// ever outstanding.
///
/// [`connect`]: ConnectionManager::connect
/// [`disconnect`]: ConnectionManager::disconnect
/// [`next_event`]: ConnectionManager::next_event
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    endpoint: String,
    reconnect_delay: Duration,
    link: Link,
    reconnect_timer: Option<Pin<Box<Sleep>>>,
    /// Error already published, close handling not yet applied
    pending_close: Option<String>,
    status: watch::Sender<ConnectionStatus>,
    reconnect_attempts: u64,
}

impl ConnectionManager {
    /// Create a manager in the `Connecting` state. No attempt is made until
    /// [`connect`](Self::connect) is called.
    pub fn new(
        connector: Arc<dyn Connector>,
        endpoint: impl Into<String>,
        reconnect_delay: Duration,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::connecting());
        Self {
            connector,
            endpoint: endpoint.into(),
            reconnect_delay,
            link: Link::Idle,
            reconnect_timer: None,
            pending_close: None,
            status,
            reconnect_attempts: 0,
        }
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_online(&self) -> bool {
        matches!(self.link, Link::Open(_))
    }

    /// True while a connection attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        matches!(self.link, Link::Connecting(_))
    }

    /// True while a reconnect timer is pending.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_timer.is_some()
    }

    /// Number of reconnect attempts triggered by the timer so far.
    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts
    }

    /// Start a connection attempt.
    ///
    /// No-op while online or while an attempt is already in flight. Cancels
    /// any pending reconnect timer and clears the last error.
    pub fn connect(&mut self) {
        match self.link {
            Link::Open(_) => {
                tracing::debug!(endpoint = %self.endpoint, "Already online, ignoring connect");
                return;
            }
            Link::Connecting(_) => {
                tracing::debug!(endpoint = %self.endpoint, "Connection attempt already in flight");
                return;
            }
            Link::Idle => {}
        }

        self.cancel_reconnect();
        self.pending_close = None;
        self.set_status(ConnectionStatus::connecting());

        tracing::info!(
            endpoint = %self.endpoint,
            connector = self.connector.name(),
            "Connecting to telemetry producer"
        );

        let connector = Arc::clone(&self.connector);
        let endpoint = self.endpoint.clone();
        self.link = Link::Connecting(Box::pin(async move { connector.connect(&endpoint).await }));
    }

    /// Close the active connection (or abandon an in-flight attempt) and
    /// cancel any pending reconnect.
    ///
    /// No automatic reconnection happens afterwards until [`connect`] is
    /// called again. A no-op with nothing connected, no attempt in flight
    /// and no reconnect pending.
    ///
    /// [`connect`]: Self::connect
    pub fn disconnect(&mut self) {
        let had_link = !matches!(self.link, Link::Idle);
        let had_timer = self.reconnect_timer.is_some();
        let had_close = self.pending_close.take().is_some();
        if !had_link && !had_timer && !had_close {
            return;
        }

        // Dropping the stream or the pending attempt closes the transport
        self.link = Link::Idle;
        self.cancel_reconnect();

        tracing::info!(endpoint = %self.endpoint, "Disconnected from telemetry producer");
        self.set_status(ConnectionStatus::offline(None));
    }

    /// Wait for the next transport or timer event and apply its state
    /// transition.
    ///
    /// Cancel-safe: the pending attempt, the frame stream and the timer all
    /// live in `self`, so dropping this future loses nothing. Pends forever
    /// when idle with no timer outstanding.
    ///
    /// A transport error takes two calls: the first publishes `Error` and
    /// returns [`StreamEvent::Errored`], the next yields once so watchers
    /// see it, then moves to `Offline` and schedules the reconnect.
    pub async fn next_event(&mut self) -> StreamEvent {
        if self.pending_close.is_some() {
            tokio::task::yield_now().await;
            if let Some(message) = self.pending_close.take() {
                return self.handle_termination(Some(message));
            }
        }

        let wake = {
            let link = &mut self.link;
            let timer = &mut self.reconnect_timer;

            let transport = async {
                match link {
                    Link::Idle => pending::<Wake>().await,
                    Link::Connecting(attempt) => Wake::Established(attempt.as_mut().await),
                    Link::Open(frames) => Wake::Inbound(frames.next().await),
                }
            };
            let reconnect = async {
                match timer {
                    Some(sleep) => {
                        sleep.as_mut().await;
                        Wake::TimerFired
                    }
                    None => pending::<Wake>().await,
                }
            };

            tokio::select! {
                wake = transport => wake,
                wake = reconnect => wake,
            }
        };

        match wake {
            Wake::Established(Ok(frames)) => {
                self.link = Link::Open(frames);
                self.set_status(ConnectionStatus::online());
                tracing::info!(endpoint = %self.endpoint, "Connected to telemetry producer");
                StreamEvent::Connected
            }
            Wake::Established(Err(error)) | Wake::Inbound(Some(Err(error))) => {
                self.link = Link::Idle;
                self.handle_error(error)
            }
            Wake::Inbound(Some(Ok(frame))) => StreamEvent::Frame(frame),
            Wake::Inbound(None) => {
                self.link = Link::Idle;
                tracing::warn!(endpoint = %self.endpoint, "Connection to producer closed");
                self.handle_termination(None)
            }
            Wake::TimerFired => {
                self.reconnect_timer = None;
                self.reconnect_attempts += 1;
                metrics::counter!("observatory_reconnect_attempts_total").increment(1);
                tracing::info!(
                    attempt = self.reconnect_attempts,
                    "Reconnect timer fired"
                );
                self.connect();
                StreamEvent::Reconnecting
            }
        }
    }

    /// Publish the error; the close is applied by the next `next_event`.
    fn handle_error(&mut self, error: StreamError) -> StreamEvent {
        let message = error.to_string();
        tracing::warn!(endpoint = %self.endpoint, error = %message, "Telemetry stream error");
        self.set_status(ConnectionStatus::error(message.clone()));
        self.pending_close = Some(message.clone());
        StreamEvent::Errored { message }
    }

    fn handle_termination(&mut self, error: Option<String>) -> StreamEvent {
        self.set_status(ConnectionStatus::offline(error.clone()));
        self.schedule_reconnect();
        StreamEvent::Disconnected { error }
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect_timer.is_some() {
            return;
        }
        tracing::info!(
            delay_ms = self.reconnect_delay.as_millis() as u64,
            "Scheduling reconnect"
        );
        self.reconnect_timer = Some(Box::pin(tokio::time::sleep(self.reconnect_delay)));
    }

    fn cancel_reconnect(&mut self) {
        if self.reconnect_timer.take().is_some() {
            tracing::debug!("Cancelled pending reconnect");
        }
    }

    fn set_status(&self, next: ConnectionStatus) {
        let previous = self.status.borrow().state;
        let changed = self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });

        if changed && previous != next.state {
            tracing::debug!(
                old_state = %previous,
                new_state = %next.state,
                "Connection state changed"
            );
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}
