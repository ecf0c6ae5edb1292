//! One-shot balance/equity sampling for the `mt4-logger` binary.

use crate::shared::error::PanelError;
use crate::shared::snapshot;
use crate::shared::transport::Transport;
use crate::shared::types::AccountSummary;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default wait for a snapshot before giving up
pub const DEFAULT_WAIT: Duration = Duration::from_millis(1000);

/// Wait up to `wait` for the first snapshot of `account` and return its summary
///
/// Payloads for other accounts are skipped while the window is open; the first
/// payload for `account` must decode.
pub async fn fetch_summary<T: Transport>(
    transport: &mut T,
    account: &str,
    wait: Duration,
) -> Result<AccountSummary, PanelError> {
    transport.subscribe(account).await?;
    let deadline = Instant::now() + wait;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Some(raw) = transport.try_recv(remaining).await? else {
            return Err(PanelError::NoSnapshot {
                account: account.to_string(),
                waited_ms: wait.as_millis() as u64,
            });
        };

        let topic = raw.split_whitespace().next().unwrap_or_default();
        if topic != account {
            debug!(%topic, "skipping payload for another account");
            continue;
        }

        return snapshot::decode(&raw)
            .map(|envelope| envelope.snapshot.summary)
            .map_err(PanelError::from);
    }
}

/// Format one log line: `<unix-seconds> <balance> <equity>`
pub fn format_line(now: DateTime<Utc>, summary: &AccountSummary) -> String {
    format!("{} {} {}", now.timestamp(), summary.balance, summary.equity)
}
