//! Subscribe-style transport seam.
//!
//! The panel only needs a topic-filtered subscribe and a receive bounded by a
//! timeout, so the stream loop keeps its cadence when the feed is quiet.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;

use crate::shared::error::TransportError;

/// Source of raw `"<topic> <json-body>"` payloads
#[async_trait]
pub trait Transport: Send {
    /// Start receiving payloads whose topic starts with `topic`
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next subscribed payload
    ///
    /// `Ok(None)` means nothing arrived in time; an error is fatal.
    async fn try_recv(&mut self, timeout: Duration) -> Result<Option<String>, TransportError>;
}

/// Item carried by a [`ChannelTransport`]
pub type RawPayload = Result<String, TransportError>;

/// Transport reading from a tokio mpsc channel
///
/// Like a SUB socket, nothing is delivered until at least one topic is subscribed.
#[derive(Debug)]
pub struct ChannelTransport {
    rx: mpsc::Receiver<RawPayload>,
    topics: Vec<String>,
}

impl ChannelTransport {
    pub fn new(rx: mpsc::Receiver<RawPayload>) -> Self {
        Self {
            rx,
            topics: Vec::new(),
        }
    }

    /// Create a transport and the sender that feeds it
    pub fn channel(buffer: usize) -> (mpsc::Sender<RawPayload>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }

    fn accepts(&self, raw: &str) -> bool {
        self.topics.iter().any(|topic| raw.starts_with(topic.as_str()))
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if !self.topics.iter().any(|existing| existing == topic) {
            self.topics.push(topic.to_string());
        }
        Ok(())
    }

    async fn try_recv(&mut self, timeout: Duration) -> Result<Option<String>, TransportError> {
        let deadline = Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Err(_elapsed) => return Ok(None),
                Ok(None) => return Err(TransportError::Closed),
                Ok(Some(Err(error))) => return Err(error),
                Ok(Some(Ok(raw))) => {
                    if self.accepts(&raw) {
                        return Ok(Some(raw));
                    }
                    trace!("dropping payload for unsubscribed topic");
                }
            }
        }
    }
}
