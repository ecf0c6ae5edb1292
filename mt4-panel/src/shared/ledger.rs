//! Order ledger: ticket-keyed orders reconciled from account snapshots.
//!
//! Snapshots arrive one instrument at a time, possibly duplicated or out of order.
//! Every apply is an upsert that replaces values, so duplicates never double count,
//! and orders that stop being mentioned age out after the TTL.

use crate::shared::types::{AccountSnapshot, AccountSummary, Order, Quote, Ticket};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Counts produced by one [`Ledger::apply`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// Fragments the decoder already dropped as malformed
    pub skipped: usize,
}

/// Ticket-keyed order store plus the latest quote per instrument
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    orders: BTreeMap<Ticket, Order>,
    quotes: HashMap<String, Quote>,
    summary: AccountSummary,
}

/// Read-only view of a [`Ledger`] for one aggregation pass
#[derive(Debug, Clone, Copy)]
pub struct LedgerView<'a> {
    pub orders: &'a BTreeMap<Ticket, Order>,
    pub quotes: &'a HashMap<String, Quote>,
    pub summary: AccountSummary,
}

impl<'a> LedgerView<'a> {
    /// Iterate orders in ticket order
    pub fn orders(&self) -> impl Iterator<Item = &'a Order> + 'a {
        self.orders.values()
    }

    pub fn quote(&self, instrument: &str) -> Option<&'a Quote> {
        self.quotes.get(instrument)
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert every order fragment of the snapshot
    ///
    /// The quote and account summary are replaced unconditionally (last write wins).
    pub fn apply(&mut self, snapshot: &AccountSnapshot, now: DateTime<Utc>) -> ApplyOutcome {
        let mut outcome = ApplyOutcome {
            skipped: snapshot.skipped_fragments,
            ..Default::default()
        };

        self.summary = snapshot.summary;
        self.quotes
            .insert(snapshot.quote.name.clone(), snapshot.quote.clone());

        for fragment in &snapshot.orders {
            if let Some(symbol) = fragment
                .instrument
                .as_deref()
                .filter(|symbol| *symbol != snapshot.quote.name)
            {
                debug!(ticket = fragment.ticket, %symbol, quote = %snapshot.quote.name, "order symbol differs from quote, keyed by quote");
            }

            match self.orders.get_mut(&fragment.ticket) {
                Some(order) => {
                    order.refresh(fragment, now);
                    outcome.updated += 1;
                }
                None => {
                    let order = Order::from_fragment(fragment, &snapshot.quote.name, now);
                    debug!(ticket = order.ticket, instrument = %order.instrument, kind = %order.kind, "new order");
                    self.orders.insert(fragment.ticket, order);
                    outcome.inserted += 1;
                }
            }
        }

        outcome
    }

    /// Remove every order last seen more than `ttl` before `now`
    ///
    /// Quotes no longer referenced by any order go with them. Returns the number of
    /// orders removed.
    pub fn evict(&mut self, now: DateTime<Utc>, ttl: TimeDelta) -> usize {
        let before = self.orders.len();
        self.orders.retain(|ticket, order| {
            let expired = order.is_expired(now, ttl);
            if expired {
                debug!(ticket, instrument = %order.instrument, "evicting stale order");
            }
            !expired
        });
        let removed = before - self.orders.len();

        if removed > 0 {
            let orders = &self.orders;
            self.quotes
                .retain(|name, _| orders.values().any(|order| &order.instrument == name));
        }

        removed
    }

    pub fn view(&self) -> LedgerView<'_> {
        LedgerView {
            orders: &self.orders,
            quotes: &self.quotes,
            summary: self.summary,
        }
    }

    pub fn get(&self, ticket: Ticket) -> Option<&Order> {
        self.orders.get(&ticket)
    }

    pub fn quote(&self, instrument: &str) -> Option<&Quote> {
        self.quotes.get(instrument)
    }

    pub fn summary(&self) -> AccountSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
