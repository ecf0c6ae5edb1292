/// Instrument aggregation over a ledger view
///
/// Groups are derived on every render and never cached, so an evicted order
/// disappears from the totals on the very next frame.
use crate::shared::ledger::LedgerView;
use std::collections::BTreeMap;

/// Net positions below this magnitude are shown as flat
const FLAT_EPSILON: f64 = 1e-9;

/// Per-instrument totals derived from the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentGroup {
    pub instrument: String,
    /// Signed lots: BUY adds, SELL subtracts, pending orders are ignored
    pub net_lots: f64,
    pub live_orders: usize,
    pub pending_orders: usize,
    pub profit: f64,
    pub swap: f64,
}

impl InstrumentGroup {
    fn new(instrument: &str) -> Self {
        Self {
            instrument: instrument.to_string(),
            net_lots: 0.0,
            live_orders: 0,
            pending_orders: 0,
            profit: 0.0,
            swap: 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.profit + self.swap
    }

    /// Total number of orders on this instrument
    pub fn order_count(&self) -> usize {
        self.live_orders + self.pending_orders
    }

    /// Check if any filled BUY/SELL position exists
    ///
    /// Pending-only instruments are suppressed from the positions view.
    pub fn has_live_orders(&self) -> bool {
        self.live_orders > 0
    }

    /// Position label, e.g. `LONG 0.60 (2)`, `SHORT -1.00` or `NONE`
    ///
    /// The count suffix appears when more than one order contributes; pending
    /// orders count towards it only when `count_pending` is set.
    pub fn position(&self, count_pending: bool) -> String {
        let count = if count_pending {
            self.order_count()
        } else {
            self.live_orders
        };
        let suffix = if count > 1 {
            format!(" ({count})")
        } else {
            String::new()
        };

        if self.net_lots.abs() < FLAT_EPSILON {
            "NONE".to_string()
        } else if self.net_lots > 0.0 {
            format!("LONG {:.2}{}", self.net_lots, suffix)
        } else {
            format!("SHORT {:.2}{}", self.net_lots, suffix)
        }
    }
}

/// Group every order in the view by instrument, ordered by instrument name
pub fn aggregate(view: &LedgerView<'_>) -> Vec<InstrumentGroup> {
    let mut groups: BTreeMap<&str, InstrumentGroup> = BTreeMap::new();

    for order in view.orders() {
        let group = groups
            .entry(order.instrument.as_str())
            .or_insert_with(|| InstrumentGroup::new(&order.instrument));

        group.net_lots += order.kind.signed_lots(order.size);
        if order.kind.is_live() {
            group.live_orders += 1;
        } else {
            group.pending_orders += 1;
        }
        group.profit += order.profit;
        group.swap += order.swap;
    }

    groups.into_values().collect()
}
