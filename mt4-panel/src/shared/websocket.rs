/// WebSocket transport for the account snapshot feed
///
/// Forwards raw `"<topic> <json-body>"` frames into a [`ChannelTransport`].
/// Topic filtering happens on the receiving side.
use crate::shared::error::TransportError;
use crate::shared::transport::{ChannelTransport, RawPayload};
use futures::{SinkExt, Stream, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, error, info, warn};

/// Default feed endpoint
pub const DEFAULT_URL: &str = "ws://127.0.0.1:5559";

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// WebSocket server URL
    pub url: String,
    /// Ping interval to keep connection alive
    pub ping_interval: Duration,
    /// Reconnection delay after disconnect
    pub reconnect_delay: Duration,
    /// Maximum channel buffer size for payloads
    pub channel_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
            channel_buffer_size: 1000,
        }
    }
}

impl WebSocketConfig {
    /// Create a new configuration with custom URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set ping interval
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }
}

/// Connection status updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// WebSocket client for the snapshot feed
pub struct WebSocketClient {
    config: WebSocketConfig,
}

/// Why a single connection stopped reading
enum ReadEnd {
    /// The consuming transport was dropped
    ReceiverGone,
    /// Server close or socket error
    Disconnected(Option<TransportError>),
}

impl WebSocketClient {
    /// Create a new WebSocket client with default configuration
    pub fn new() -> Self {
        Self::with_config(WebSocketConfig::default())
    }

    /// Create a new WebSocket client with custom configuration
    pub fn with_config(config: WebSocketConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Start a reconnecting client
    ///
    /// Returns the transport fed by the connection and a receiver for status
    /// updates. The background task ends once the transport is dropped.
    pub fn start(self) -> (ChannelTransport, mpsc::Receiver<ConnectionStatus>) {
        let (payload_tx, transport) = ChannelTransport::channel(self.config.channel_buffer_size);
        let (status_tx, status_rx) = mpsc::channel(10);

        tokio::spawn(async move {
            run_websocket_loop(self.config, payload_tx, status_tx).await;
        });

        (transport, status_rx)
    }

    /// Connect once without reconnecting
    ///
    /// A failed connect is returned directly; a later socket error surfaces
    /// through the transport.
    pub async fn connect_once(self) -> Result<ChannelTransport, TransportError> {
        let (ws_stream, _) =
            connect_async(&self.config.url)
                .await
                .map_err(|error| TransportError::Connect {
                    url: self.config.url.clone(),
                    reason: error.to_string(),
                })?;
        info!(url = %self.config.url, "connected");

        let (payload_tx, transport) = ChannelTransport::channel(self.config.channel_buffer_size);
        let (_write, read) = ws_stream.split();

        tokio::spawn(async move {
            if let ReadEnd::Disconnected(Some(error)) = forward_frames(read, &payload_tx).await {
                let _ = payload_tx.send(Err(error)).await;
            }
        });

        Ok(transport)
    }
}

impl Default for WebSocketClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Main WebSocket connection loop with auto-reconnect
async fn run_websocket_loop(
    config: WebSocketConfig,
    payload_tx: mpsc::Sender<RawPayload>,
    status_tx: mpsc::Sender<ConnectionStatus>,
) {
    info!(url = %config.url, "starting feed client");

    loop {
        let _ = status_tx.send(ConnectionStatus::Reconnecting).await;

        match connect_async(&config.url).await {
            Ok((ws_stream, _)) => {
                info!(url = %config.url, "feed connected");
                let _ = status_tx.send(ConnectionStatus::Connected).await;

                let (mut write, read) = ws_stream.split();

                // Keep the connection alive until reading stops
                let ping_interval = config.ping_interval;
                let (ping_shutdown_tx, mut ping_shutdown_rx) = mpsc::channel::<()>(1);

                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(ping_interval);
                    loop {
                        tokio::select! {
                            _ = interval.tick() => {
                                if write.send(Message::Ping(vec![].into())).await.is_err() {
                                    debug!("ping failed, connection likely dead");
                                    break;
                                }
                            }
                            _ = ping_shutdown_rx.recv() => {
                                debug!("ping task stopped");
                                break;
                            }
                        }
                    }
                });

                let end = forward_frames(read, &payload_tx).await;

                let _ = ping_shutdown_tx.send(()).await;
                let _ = status_tx.send(ConnectionStatus::Disconnected).await;

                match end {
                    ReadEnd::ReceiverGone => {
                        info!("transport dropped, stopping feed client");
                        return;
                    }
                    ReadEnd::Disconnected(_) => warn!(delay = ?config.reconnect_delay, "feed disconnected, reconnecting"),
                }
            }
            Err(e) => {
                error!(url = %config.url, error = %e, "feed connect failed");
                let _ = status_tx.send(ConnectionStatus::Disconnected).await;
            }
        }

        if payload_tx.is_closed() {
            return;
        }

        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Forward text frames (and UTF-8 binary frames) until the connection ends
async fn forward_frames<S>(mut read: S, payload_tx: &mpsc::Sender<RawPayload>) -> ReadEnd
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = read.next().await {
        let payload = match msg {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "dropping non UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(_)) => {
                info!("feed server closed connection");
                return ReadEnd::Disconnected(Some(TransportError::Closed));
            }
            Ok(_) => continue,
            Err(e) => {
                error!(error = %e, "feed socket error");
                return ReadEnd::Disconnected(Some(TransportError::Socket(e.to_string())));
            }
        };

        if is_welcome(&payload) {
            debug!("skipping welcome message");
            continue;
        }

        if payload_tx.send(Ok(payload)).await.is_err() {
            return ReadEnd::ReceiverGone;
        }
    }

    ReadEnd::Disconnected(None)
}

/// Bridges that greet with `{"type":"welcome"}` before forwarding the feed
fn is_welcome(payload: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|value| value.get("type").and_then(|v| v.as_str()).map(|t| t == "welcome"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::transport::Transport;

    #[test]
    fn test_config_builder() {
        let config = WebSocketConfig::new("ws://localhost:8080")
            .with_ping_interval(Duration::from_secs(15))
            .with_reconnect_delay(Duration::from_secs(5))
            .with_channel_buffer_size(500);

        assert_eq!(config.url, "ws://localhost:8080");
        assert_eq!(config.ping_interval, Duration::from_secs(15));
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.channel_buffer_size, 500);
    }

    #[test]
    fn test_default_config() {
        let config = WebSocketConfig::default();
        assert_eq!(config.url, "ws://127.0.0.1:5559");
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.reconnect_delay, Duration::from_secs(2));
        assert_eq!(config.channel_buffer_size, 1000);
    }

    #[test]
    fn test_is_welcome() {
        struct TestCase {
            input: &'static str,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: bridge greeting
                input: r#"{"type":"welcome"}"#,
                expected: true,
            },
            TestCase {
                // TC1: snapshot payload is not json as a whole
                input: r#"711700 {"balance":1}"#,
                expected: false,
            },
            TestCase {
                // TC2: other json
                input: r#"{"type":"other"}"#,
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(is_welcome(test.input), test.expected, "TC{} failed", index);
        }
    }

    #[tokio::test]
    async fn test_forward_frames() {
        let frames: Vec<Result<Message, tungstenite::Error>> = vec![
            Ok(Message::Text(r#"{"type":"welcome"}"#.into())),
            Ok(Message::Text("711700 {}".into())),
            Ok(Message::Binary(b"711700 {\"a\":1}".to_vec().into())),
            Ok(Message::Close(None)),
        ];
        let (payload_tx, mut transport) = ChannelTransport::channel(8);
        transport.subscribe("711700").await.unwrap();

        let end = forward_frames(futures::stream::iter(frames), &payload_tx).await;
        assert!(matches!(end, ReadEnd::Disconnected(Some(TransportError::Closed))));

        let first = transport.try_recv(Duration::from_millis(20)).await.unwrap();
        let second = transport.try_recv(Duration::from_millis(20)).await.unwrap();
        assert_eq!(first.as_deref(), Some("711700 {}"));
        assert_eq!(second.as_deref(), Some("711700 {\"a\":1}"));
    }

    #[tokio::test]
    async fn test_connect_once_refused() {
        // Port 9 (discard) is almost never listening on loopback
        let client = WebSocketClient::with_config(WebSocketConfig::new("ws://127.0.0.1:9"));
        let result = client.connect_once().await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
