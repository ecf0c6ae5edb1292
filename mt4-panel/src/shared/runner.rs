//! The two panel loops: stream ingestion and keyboard input.
//!
//! Both poll with a bounded wait and share one shutdown flag, so either side
//! can stop the other within one poll interval.

use crate::shared::error::TransportError;
use crate::shared::input::{Command, Control, KeySource};
use crate::shared::state::Dashboard;
use crate::shared::transport::Transport;
use crate::shared::widget::Renderer;
use chrono::Utc;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

/// Subscribe to the panel's account and apply payloads until shutdown
///
/// Runs the staleness check and TTL eviction after every wait, whether or not a
/// payload arrived. A transport error raises the shutdown flag and is returned.
pub async fn run_ingestion<T, R>(
    dashboard: Dashboard<R>,
    mut transport: T,
    shutdown: &AtomicBool,
    poll: Duration,
) -> Result<(), TransportError>
where
    T: Transport,
    R: Renderer,
{
    let account = dashboard.inspect(|state| state.config().account.clone());
    if let Err(error) = transport.subscribe(&account).await {
        shutdown.store(true, Ordering::SeqCst);
        return Err(error);
    }
    info!(%account, "subscribed");
    dashboard.redraw();

    while !shutdown.load(Ordering::SeqCst) {
        match transport.try_recv(poll).await {
            Ok(Some(raw)) => {
                dashboard.ingest(&raw, Utc::now());
            }
            Ok(None) => {}
            Err(error) => {
                error!(%error, "transport failed, shutting down");
                shutdown.store(true, Ordering::SeqCst);
                return Err(error);
            }
        }
        dashboard.tick(Utc::now());
    }

    debug!("ingestion loop stopped");
    Ok(())
}

/// Read keys and apply commands until quit or shutdown
pub fn run_input<K, R>(
    dashboard: &Dashboard<R>,
    keys: &mut K,
    shutdown: &AtomicBool,
    poll: Duration,
) -> io::Result<()>
where
    K: KeySource,
    R: Renderer,
{
    while !shutdown.load(Ordering::SeqCst) {
        let key = match keys.next_key(poll) {
            Ok(Some(key)) => key,
            Ok(None) => continue,
            Err(error) => {
                shutdown.store(true, Ordering::SeqCst);
                return Err(error);
            }
        };

        let Some(command) = Command::from_key(key) else {
            debug!(?key, "unbound key");
            continue;
        };

        if dashboard.command(command) == Control::Quit {
            info!("quit requested");
            shutdown.store(true, Ordering::SeqCst);
        }
    }

    Ok(())
}
