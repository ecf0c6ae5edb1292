/// MT4 Panel - Shared Library
///
/// This library provides common functionality for the two binaries:
/// - mt4-panel: live terminal view of one account's positions and orders
/// - mt4-logger: one-shot balance/equity sampler
///
/// The library includes:
/// - Snapshot decoding and the ticket-keyed order ledger
/// - Per-instrument aggregation and display rows
/// - WebSocket transport and the terminal renderer
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{
    AccountSnapshot, AccountSummary, Order, OrderFragment, OrderKind, Quote, Ticket,
};

pub use shared::error::{DecodeError, PanelError, RenderError, TransportError};

pub use shared::websocket::ConnectionStatus;
pub use shared::websocket::{WebSocketClient, WebSocketConfig};

pub use shared::aggregation::{aggregate, InstrumentGroup};
pub use shared::ledger::{ApplyOutcome, Ledger, LedgerView};
pub use shared::monitor::{Connectivity, StalenessMonitor};

// Panel engine
pub use shared::config::PanelConfig;
pub use shared::input::{Command, Control, CrosstermKeys, KeySource};
pub use shared::runner::{run_ingestion, run_input};
pub use shared::state::{Dashboard, PanelState, TickOutcome};
pub use shared::transport::{ChannelTransport, Transport};
pub use shared::view::{DisplayMode, PanelFrame, View};
pub use shared::widget::{Renderer, TerminalRenderer};
