//! Display rows built from the ledger for the current [`DisplayMode`].
//!
//! One builder per mode; the renderer only ever sees finished rows and never
//! touches the ledger.

use crate::shared::aggregation::aggregate;
use crate::shared::ledger::LedgerView;
use crate::shared::types::{AccountSummary, Order, OrderKind, Ticket};
use itertools::Itertools;

/// Which table the panel shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    #[default]
    Positions,
    Orders,
    Pending,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 3] = [
        DisplayMode::Positions,
        DisplayMode::Orders,
        DisplayMode::Pending,
    ];

    /// Advance to the next mode, wrapping around
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|mode| *mode == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayMode::Positions => "Positions",
            DisplayMode::Orders => "Orders",
            DisplayMode::Pending => "Pending Orders",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub instrument: String,
    pub position: String,
    pub profit: f64,
    pub swap: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub instrument: String,
    pub ticket: Ticket,
    pub kind: OrderKind,
    pub size: f64,
    pub open_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub swap: f64,
    pub profit: f64,
    pub digits: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingRow {
    pub instrument: String,
    pub ticket: Ticket,
    pub kind: OrderKind,
    pub size: f64,
    pub price: f64,
    pub bid: f64,
    pub ask: f64,
    pub digits: u32,
    /// Trigger price is within the configured fraction of ATR from the market
    pub near_trigger: bool,
}

/// Rows for one display mode
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Positions(Vec<PositionRow>),
    Orders { rows: Vec<OrderRow>, show_stops: bool },
    Pending(Vec<PendingRow>),
}

impl View {
    pub fn mode(&self) -> DisplayMode {
        match self {
            View::Positions(_) => DisplayMode::Positions,
            View::Orders { .. } => DisplayMode::Orders,
            View::Pending(_) => DisplayMode::Pending,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            View::Positions(rows) => rows.len(),
            View::Orders { rows, .. } => rows.len(),
            View::Pending(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Account summary line under the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footer {
    pub balance: f64,
    pub profit: f64,
    /// Absolute profit as a percentage of balance, 0 when balance is 0
    pub profit_percent: f64,
    pub equity: f64,
    /// Show only profit, not balance and equity
    pub hide_balance: bool,
}

impl Footer {
    pub fn new(summary: AccountSummary, hide_balance: bool) -> Self {
        let profit_percent = if summary.balance != 0.0 {
            (summary.profit / summary.balance * 100.0).abs()
        } else {
            0.0
        };

        Self {
            balance: summary.balance,
            profit: summary.profit,
            profit_percent,
            equity: summary.equity,
            hide_balance,
        }
    }
}

/// Everything the renderer needs for one draw
#[derive(Debug, Clone, PartialEq)]
pub enum PanelFrame {
    /// Feed is stale: hide the tables behind a banner
    NoData { account: String },
    Live { view: View, footer: Footer },
}

impl PanelFrame {
    pub fn is_live(&self) -> bool {
        matches!(self, PanelFrame::Live { .. })
    }
}

/// Display switches that shape the rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    pub count_pending: bool,
    pub hide_pending: bool,
    pub show_stops: bool,
    pub near_trigger_atr: f64,
}

/// Build the rows for `mode` from a ledger view
pub fn build_view(mode: DisplayMode, ledger: &LedgerView<'_>, options: &ViewOptions) -> View {
    match mode {
        DisplayMode::Positions => View::Positions(position_rows(ledger, options)),
        DisplayMode::Orders => View::Orders {
            rows: order_rows(ledger, options),
            show_stops: options.show_stops,
        },
        DisplayMode::Pending => View::Pending(pending_rows(ledger, options)),
    }
}

fn position_rows(ledger: &LedgerView<'_>, options: &ViewOptions) -> Vec<PositionRow> {
    aggregate(ledger)
        .into_iter()
        .filter(|group| group.has_live_orders())
        .map(|group| PositionRow {
            position: group.position(options.count_pending),
            profit: group.profit,
            swap: group.swap,
            total: group.total(),
            instrument: group.instrument,
        })
        .collect()
}

/// Orders sorted by instrument, then ticket
fn sorted_orders<'a>(ledger: &LedgerView<'a>) -> impl Iterator<Item = &'a Order> {
    ledger
        .orders()
        .sorted_by(|a, b| {
            a.instrument
                .cmp(&b.instrument)
                .then_with(|| a.ticket.cmp(&b.ticket))
        })
}

fn order_rows(ledger: &LedgerView<'_>, options: &ViewOptions) -> Vec<OrderRow> {
    sorted_orders(ledger)
        .filter(|order| !(options.hide_pending && order.kind.is_pending()))
        .map(|order| OrderRow {
            instrument: order.instrument.clone(),
            ticket: order.ticket,
            kind: order.kind,
            size: order.size,
            open_price: order.open_price,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            swap: order.swap,
            profit: order.profit,
            digits: ledger.quote(&order.instrument).map_or(5, |quote| quote.digits),
        })
        .collect()
}

fn pending_rows(ledger: &LedgerView<'_>, options: &ViewOptions) -> Vec<PendingRow> {
    sorted_orders(ledger)
        .filter(|order| order.kind.is_pending())
        .filter_map(|order| {
            let quote = ledger.quote(&order.instrument)?;
            let reference = if order.kind.is_buy_side() {
                quote.ask
            } else {
                quote.bid
            };
            let near_trigger = quote.atr > 0.0
                && (order.open_price - reference).abs() <= quote.atr * options.near_trigger_atr;

            Some(PendingRow {
                instrument: order.instrument.clone(),
                ticket: order.ticket,
                kind: order.kind,
                size: order.size,
                price: order.open_price,
                bid: quote.bid,
                ask: quote.ask,
                digits: quote.digits,
                near_trigger,
            })
        })
        .collect()
}
