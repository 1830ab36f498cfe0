//! Transport seam between the connection manager and a producer.

use super::StreamError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Inbound text frames of one established connection.
///
/// The stream ending means the connection terminated; an `Err` item is a
/// transport error on that connection.
pub type FrameStream = BoxStream<'static, Result<String, StreamError>>;

/// Opens connections to a telemetry producer.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a connection and return its inbound frame stream.
    ///
    /// Dropping the returned stream closes the connection.
    async fn connect(&self, endpoint: &str) -> Result<FrameStream, StreamError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Connects to a live producer over WebSocket (`ws://` or `wss://`).
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &str) -> Result<FrameStream, StreamError> {
        let (socket, response) = connect_async(endpoint)
            .await
            .map_err(StreamError::from_ws_error)?;

        tracing::debug!(
            endpoint = endpoint,
            status = %response.status(),
            "WebSocket handshake complete"
        );

        // The producer pushes text frames only; the client never writes.
        let frames = socket.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "WebSocket closed by producer");
                    None
                }
                Ok(Message::Binary(_)) => {
                    tracing::trace!("Received binary message (ignored)");
                    None
                }
                // Pings are answered by tungstenite itself
                Ok(_) => None,
                Err(e) => Some(Err(StreamError::from_ws_error(e))),
            }
        });

        Ok(frames.boxed())
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}
