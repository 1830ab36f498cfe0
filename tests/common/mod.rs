//! Shared test utilities for observatory integration tests.
//!
//! Provides snapshot builders, a channel-backed connector for driving the
//! client without a network, and a real WebSocket producer built on axum.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::StreamExt;
use observatory::stream::{Connector, FrameStream, StreamError};
use observatory::telemetry::{GpuReading, HostReading, TelemetrySnapshot};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// =============================================================================
// Snapshot Builders
// =============================================================================

/// GPU with utilization and memory readings.
pub fn make_gpu(id: u32, utilization: f64, memory_used: f64, memory_total: f64) -> GpuReading {
    GpuReading {
        id,
        name: Some(format!("Test GPU {}", id)),
        utilization: Some(utilization),
        memory_used: Some(memory_used),
        memory_total: Some(memory_total),
        ..Default::default()
    }
}

/// Host with CPU and memory percentages.
pub fn make_host(cpu: f64, memory: f64) -> HostReading {
    HostReading {
        cpu_usage: Some(cpu),
        memory_usage: Some(memory),
        ..Default::default()
    }
}

pub fn make_snapshot(
    timestamp: &str,
    gpus: Vec<GpuReading>,
    host: Option<HostReading>,
) -> TelemetrySnapshot {
    TelemetrySnapshot {
        timestamp: timestamp.to_string(),
        gpus,
        system: host,
    }
}

/// Serialized single-GPU snapshot.
pub fn make_frame(timestamp: &str, utilization: f64) -> String {
    make_snapshot(
        timestamp,
        vec![make_gpu(0, utilization, 1024.0, 8192.0)],
        None,
    )
    .to_frame()
    .unwrap()
}

// =============================================================================
// Channel Connector
// =============================================================================

pub type FrameSender = mpsc::UnboundedSender<Result<String, StreamError>>;

/// Connector whose connections are fed by test code.
///
/// Each `connect` pops the next prepared connection; once they run out,
/// attempts are refused.
pub struct ChannelConnector {
    connections: Mutex<VecDeque<mpsc::UnboundedReceiver<Result<String, StreamError>>>>,
    attempts: AtomicUsize,
}

impl ChannelConnector {
    /// Prepare `count` connections and return their senders in order.
    pub fn with_connections(count: usize) -> (Arc<Self>, Vec<FrameSender>) {
        let mut senders = Vec::with_capacity(count);
        let mut connections = VecDeque::with_capacity(count);
        for _ in 0..count {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.push(tx);
            connections.push_back(rx);
        }
        let connector = Arc::new(Self {
            connections: Mutex::new(connections),
            attempts: AtomicUsize::new(0),
        });
        (connector, senders)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ChannelConnector {
    async fn connect(&self, _endpoint: &str) -> Result<FrameStream, StreamError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.connections.lock().unwrap().pop_front();
        match next {
            Some(mut rx) => Ok(async_stream::stream! {
                while let Some(item) = rx.recv().await {
                    yield item;
                }
            }
            .boxed()),
            None => Err(StreamError::ConnectionFailed(
                "connection refused".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

// =============================================================================
// WebSocket Producer
// =============================================================================

/// What the producer does with one accepted connection.
#[derive(Debug, Clone)]
pub struct Session {
    /// Text frames pushed in order
    pub frames: Vec<String>,
    /// Close after the last frame instead of idling
    pub close: bool,
}

#[derive(Clone)]
struct ProducerState {
    sessions: Arc<Mutex<VecDeque<Session>>>,
    accepted: Arc<AtomicUsize>,
}

/// A running WebSocket producer on a random local port.
pub struct TestProducer {
    pub url: String,
    accepted: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl TestProducer {
    /// Number of WebSocket upgrades served so far.
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for TestProducer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start a producer at `/ws/gpu` that plays one `Session` per connection.
/// Connections beyond the script idle without sending anything.
pub async fn spawn_producer(sessions: Vec<Session>) -> TestProducer {
    let accepted = Arc::new(AtomicUsize::new(0));
    let state = ProducerState {
        sessions: Arc::new(Mutex::new(sessions.into())),
        accepted: Arc::clone(&accepted),
    };

    let app = Router::new()
        .route("/ws/gpu", get(producer_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestProducer {
        url: format!("ws://{}/ws/gpu", addr),
        accepted,
        task,
    }
}

async fn producer_handler(ws: WebSocketUpgrade, State(state): State<ProducerState>) -> Response {
    state.accepted.fetch_add(1, Ordering::SeqCst);
    let session = state.sessions.lock().unwrap().pop_front();
    ws.on_upgrade(move |socket| play_session(socket, session))
}

async fn play_session(mut socket: WebSocket, session: Option<Session>) {
    let Some(session) = session else {
        // Hold the connection open until the client goes away
        while let Some(Ok(_)) = socket.recv().await {}
        return;
    };

    for frame in session.frames {
        if socket.send(Message::Text(frame)).await.is_err() {
            return;
        }
    }

    if session.close {
        let _ = socket.send(Message::Close(None)).await;
    } else {
        while let Some(Ok(_)) = socket.recv().await {}
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
