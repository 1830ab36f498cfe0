//! Telemetry client task
//!
//! One tokio task owns the [`ConnectionManager`] and the [`TelemetryEngine`]
//! and reacts to cancellation, commands from [`ClientHandle`]s and stream
//! events in delivery order. Everything observable leaves the task through
//! watch channels.

use crate::config::ObservatoryConfig;
use crate::engine::{EngineView, FrameOutcome, TelemetryEngine};
use crate::preferences::DataSource;
use crate::stream::{
    resolve_endpoint, ConnectionManager, ConnectionStatus, Connector, StreamError, StreamEvent,
    WebSocketConnector,
};
use crate::synthetic::{SyntheticConnector, SYNTHETIC_ENDPOINT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const COMMAND_BUFFER: usize = 16;

/// The client task has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("telemetry client has stopped")]
pub struct ClientClosed;

enum Command {
    Connect(oneshot::Sender<()>),
    Disconnect(oneshot::Sender<()>),
}

/// Owns the connection and the engine. Drive it with [`run`](Self::run) or
/// [`spawn`](Self::spawn).
pub struct TelemetryClient {
    manager: ConnectionManager,
    engine: TelemetryEngine,
    commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
}

impl TelemetryClient {
    /// Pair a manager and an engine with a fresh handle.
    pub fn new(manager: ConnectionManager, engine: TelemetryEngine) -> (Self, ClientHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = CancellationToken::new();

        let handle = ClientHandle {
            commands: tx,
            status: manager.subscribe(),
            view: engine.subscribe(),
            endpoint: Arc::from(manager.endpoint()),
            cancel: cancel.clone(),
        };

        let client = Self {
            manager,
            engine,
            commands: rx,
            cancel,
        };
        (client, handle)
    }

    /// Build a client for `source` from configuration.
    pub fn from_config(
        config: &ObservatoryConfig,
        source: DataSource,
    ) -> Result<(Self, ClientHandle), StreamError> {
        let (connector, endpoint): (Arc<dyn Connector>, String) = match source {
            DataSource::Live => (
                Arc::new(WebSocketConnector::new()),
                resolve_endpoint(&config.stream)?,
            ),
            DataSource::Synthetic => (
                Arc::new(SyntheticConnector::from_config(&config.synthetic)),
                SYNTHETIC_ENDPOINT.to_string(),
            ),
        };

        Ok(Self::with_connector(
            connector,
            endpoint,
            config.stream.reconnect_delay(),
            config.logging.log_frames,
        ))
    }

    /// Build a client around an arbitrary connector.
    pub fn with_connector(
        connector: Arc<dyn Connector>,
        endpoint: impl Into<String>,
        reconnect_delay: Duration,
        log_frames: bool,
    ) -> (Self, ClientHandle) {
        let manager = ConnectionManager::new(connector, endpoint, reconnect_delay);
        let engine = TelemetryEngine::new().with_frame_logging(log_frames);
        Self::new(manager, engine)
    }

    /// Run on a new tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Connect, then process events until cancelled or every handle is
    /// dropped. The connection is closed on every exit path.
    pub async fn run(mut self) {
        tracing::info!(endpoint = %self.manager.endpoint(), "Telemetry client started");
        self.manager.connect();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    tracing::debug!("Telemetry client cancelled");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        tracing::debug!("All client handles dropped");
                        break;
                    }
                },
                event = self.manager.next_event() => self.handle_event(event),
            }
        }

        self.manager.disconnect();
        let stats = self.engine.stats();
        tracing::info!(
            accepted = stats.accepted,
            duplicates = stats.duplicates,
            malformed = stats.malformed,
            reconnects = self.manager.reconnect_attempts(),
            "Telemetry client stopped"
        );
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect(ack) => {
                self.manager.connect();
                let _ = ack.send(());
            }
            Command::Disconnect(ack) => {
                self.manager.disconnect();
                let _ = ack.send(());
            }
        }
    }

    fn handle_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Frame(raw) => {
                if let FrameOutcome::Malformed(reason) = self.engine.ingest_frame(&raw) {
                    tracing::debug!(reason = %reason, "Frame dropped");
                }
            }
            StreamEvent::Connected => {
                tracing::debug!("Stream connected");
            }
            StreamEvent::Errored { message } => {
                tracing::debug!(error = %message, "Stream errored");
            }
            StreamEvent::Disconnected { error } => {
                tracing::debug!(error = ?error, "Stream disconnected");
            }
            StreamEvent::Reconnecting => {
                tracing::debug!(attempt = self.manager.reconnect_attempts(), "Reconnecting");
            }
        }
    }
}

/// Cheap, cloneable access to a running [`TelemetryClient`].
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    view: watch::Receiver<Arc<EngineView>>,
    endpoint: Arc<str>,
    cancel: CancellationToken,
}

impl ClientHandle {
    /// Watch connection status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn current_status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Watch the engine view, republished after every accepted snapshot.
    pub fn view(&self) -> watch::Receiver<Arc<EngineView>> {
        self.view.clone()
    }

    pub fn current_view(&self) -> Arc<EngineView> {
        Arc::clone(&self.view.borrow())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask for a connection attempt. No-op while online or connecting.
    pub async fn reconnect(&self) -> Result<(), ClientClosed> {
        self.request(Command::Connect).await
    }

    /// Close the connection and stop automatic reconnection. Resolves once
    /// the transport is dropped and any reconnect timer is cancelled.
    pub async fn disconnect(&self) -> Result<(), ClientClosed> {
        self.request(Command::Disconnect).await
    }

    /// Stop the client task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request(&self, make: fn(oneshot::Sender<()>) -> Command) -> Result<(), ClientClosed> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(make(ack))
            .await
            .map_err(|_| ClientClosed)?;
        done.await.map_err(|_| ClientClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{ConnectionState, FrameStream};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Hands out one mpsc-backed stream per connection.
    struct ChannelConnector {
        streams: Mutex<Vec<mpsc::UnboundedReceiver<Result<String, StreamError>>>>,
        attempts: AtomicUsize,
    }

    impl ChannelConnector {
        fn new(count: usize) -> (Arc<Self>, Vec<mpsc::UnboundedSender<Result<String, StreamError>>>) {
            let mut senders = Vec::new();
            let mut receivers = Vec::new();
            for _ in 0..count {
                let (tx, rx) = mpsc::unbounded_channel();
                senders.push(tx);
                receivers.push(rx);
            }
            receivers.reverse();
            let connector = Arc::new(Self {
                streams: Mutex::new(receivers),
                attempts: AtomicUsize::new(0),
            });
            (connector, senders)
        }
    }

    #[async_trait]
    impl Connector for ChannelConnector {
        async fn connect(&self, _endpoint: &str) -> Result<FrameStream, StreamError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let next = self.streams.lock().unwrap().pop();
            match next {
                Some(mut rx) => Ok(async_stream::stream! {
                    while let Some(item) = rx.recv().await {
                        yield item;
                    }
                }
                .boxed()),
                None => Err(StreamError::ConnectionFailed("no more streams".to_string())),
            }
        }

        fn name(&self) -> &'static str {
            "channel"
        }
    }

    fn frame(timestamp: &str, utilization: u32) -> String {
        format!(
            r#"{{"timestamp":"{timestamp}","gpus":[{{"id":0,"utilization":{utilization}}}]}}"#
        )
    }

    async fn wait_for_state(handle: &ClientHandle, state: ConnectionState) {
        let mut status = handle.status();
        status
            .wait_for(|s| s.state == state)
            .await
            .expect("client task stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_flow_into_view() {
        let (connector, senders) = ChannelConnector::new(1);
        let (client, handle) =
            TelemetryClient::with_connector(connector, "test://", Duration::from_secs(4), false);
        let task = client.spawn();

        wait_for_state(&handle, ConnectionState::Online).await;
        senders[0].send(Ok(frame("t1", 40))).unwrap();
        senders[0].send(Ok(frame("t1", 40))).unwrap();
        senders[0].send(Ok(frame("t2", 60))).unwrap();

        let mut view = handle.view();
        let current = view
            .wait_for(|v| v.stats.accepted == 2)
            .await
            .unwrap()
            .clone();
        assert_eq!(
            current.series(crate::history::SeriesKey::GpuUtilization(0)),
            &[40.0, 60.0]
        );
        assert_eq!(current.stats.duplicates, 1);

        handle.shutdown();
        task.await.unwrap();
        assert_eq!(handle.current_status().state, ConnectionState::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_reconnects_after_delay_and_keeps_history() {
        let (connector, senders) = ChannelConnector::new(2);
        let (client, handle) = TelemetryClient::with_connector(
            connector.clone(),
            "test://",
            Duration::from_secs(4),
            false,
        );
        let task = client.spawn();

        wait_for_state(&handle, ConnectionState::Online).await;
        senders[0].send(Ok(frame("t1", 10))).unwrap();
        let mut senders = senders.into_iter();
        drop(senders.next());

        wait_for_state(&handle, ConnectionState::Offline).await;
        assert_eq!(handle.current_view().stats.accepted, 1);
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);

        // Reconnect timer fires after the configured delay
        wait_for_state(&handle, ConnectionState::Online).await;
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 2);
        assert!(handle.current_view().latest.is_some());

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_observed_before_offline() {
        let (connector, senders) = ChannelConnector::new(2);
        let (client, handle) =
            TelemetryClient::with_connector(connector, "test://", Duration::from_secs(4), false);
        let mut status = handle.status();
        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while status.changed().await.is_ok() {
                let current = status.borrow_and_update().clone();
                let done = current.state == ConnectionState::Offline;
                seen.push(current);
                if done {
                    break;
                }
            }
            seen
        });
        let task = client.spawn();

        wait_for_state(&handle, ConnectionState::Online).await;
        senders[0]
            .send(Err(StreamError::Transport("reset".to_string())))
            .unwrap();

        let seen = watcher.await.unwrap();
        let states: Vec<_> = seen.iter().map(|s| s.state).collect();
        let errored = states
            .iter()
            .position(|s| *s == ConnectionState::Error)
            .expect("error state never published");
        assert_eq!(errored, states.len() - 2);
        assert_eq!(seen[errored], ConnectionStatus::error("transport error: reset"));
        assert_eq!(
            seen[errored + 1],
            ConnectionStatus::offline(Some("transport error: reset".to_string()))
        );

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_reconnection() {
        let (connector, _senders) = ChannelConnector::new(1);
        let (client, handle) = TelemetryClient::with_connector(
            connector.clone(),
            "test://",
            Duration::from_secs(4),
            false,
        );
        let task = client.spawn();

        wait_for_state(&handle, ConnectionState::Online).await;
        handle.disconnect().await.unwrap();
        assert_eq!(handle.current_status(), ConnectionStatus::offline(None));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(handle.current_status().state, ConnectionState::Offline);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_fail_after_shutdown() {
        let (connector, _senders) = ChannelConnector::new(1);
        let (client, handle) =
            TelemetryClient::with_connector(connector, "test://", Duration::from_secs(4), false);
        let task = client.spawn();

        handle.shutdown();
        task.await.unwrap();
        assert_eq!(handle.reconnect().await, Err(ClientClosed));
        assert!(handle.is_closed());
    }
}
