use thiserror::Error;

/// Errors raised while decoding a published snapshot.
///
/// Both variants are recoverable: the offending message or fragment is skipped.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DecodeError {
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("malformed order fragment at index {index}: {reason}")]
    MalformedOrderFragment { index: usize, reason: String },
}

/// Errors raised by a [`Transport`](crate::shared::transport::Transport).
///
/// Transport failures are fatal to the panel since it has no value without data.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("transport channel closed")]
    Closed,

    #[error("SocketError: {0}")]
    Socket(String),
}

/// Errors raised by a [`Renderer`](crate::shared::widget::Renderer).
///
/// Logged by the caller; the next state change draws again.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum RenderError {
    #[error("terminal io: {0}")]
    Io(String),
}

impl From<std::io::Error> for RenderError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

/// All errors that terminate a panel or logger run.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("no snapshot received for account {account} within {waited_ms}ms")]
    NoSnapshot { account: String, waited_ms: u64 },
}
