//! Feed staleness detection.
//!
//! Independent of per-order expiry: the feed can be alive while a single ticket
//! has aged out, and the feed can stall while every order is still within TTL.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

/// Whether snapshots are currently arriving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Live,
    Stale,
}

impl Connectivity {
    pub fn is_live(&self) -> bool {
        matches!(self, Connectivity::Live)
    }
}

/// Tracks the last message time and flips between [`Connectivity`] states
#[derive(Debug, Clone)]
pub struct StalenessMonitor {
    ttl: TimeDelta,
    last_message: Option<DateTime<Utc>>,
    state: Connectivity,
}

impl StalenessMonitor {
    /// Create a monitor in the [`Connectivity::Stale`] state
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            last_message: None,
            state: Connectivity::Stale,
        }
    }

    /// Record a successfully applied snapshot
    ///
    /// Returns true when this moved the feed from Stale to Live.
    pub fn record_message(&mut self, now: DateTime<Utc>) -> bool {
        self.last_message = Some(now);
        let revived = self.state == Connectivity::Stale;
        if revived {
            info!("feed live");
        }
        self.state = Connectivity::Live;
        revived
    }

    /// Check the feed at `now`
    ///
    /// Returns true when this moved the feed from Live to Stale, which happens
    /// exactly when `now - last_message > ttl`.
    pub fn check(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == Connectivity::Stale {
            return false;
        }

        let expired = self
            .last_message
            .map(|last| now - last > self.ttl)
            .unwrap_or(true);

        if expired {
            warn!(ttl_ms = self.ttl.num_milliseconds(), "no data received within ttl, feed stale");
            self.state = Connectivity::Stale;
        }
        expired
    }

    pub fn connectivity(&self) -> Connectivity {
        self.state
    }

    pub fn last_message(&self) -> Option<DateTime<Utc>> {
        self.last_message
    }
}
