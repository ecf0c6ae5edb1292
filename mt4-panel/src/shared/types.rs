/// Core data types for account snapshots
///
/// These types match the JSON body published by the MetaTrader account feed,
/// one message per instrument: `"<account> {balance, equity, profit, symbol, orders}"`

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Broker order identifier
pub type Ticket = u64;

/// MetaTrader order type
///
/// Integer codes follow the MT4 `OP_*` constants.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Buy,
    Sell,
    BuyLimit,
    BuyStop,
    SellLimit,
    SellStop,
}

impl OrderKind {
    /// Map an MT4 `OP_*` code to an order type
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(OrderKind::Buy),
            1 => Some(OrderKind::Sell),
            2 => Some(OrderKind::BuyLimit),
            3 => Some(OrderKind::SellLimit),
            4 => Some(OrderKind::BuyStop),
            5 => Some(OrderKind::SellStop),
            _ => None,
        }
    }

    /// Parse an order type name, accepting `BUY_LIMIT`, `BUY LIMIT` and `buylimit`
    pub fn from_name(name: &str) -> Option<Self> {
        let normalised: String = name
            .chars()
            .filter(|c| !matches!(c, '_' | ' ' | '-'))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        match normalised.as_str() {
            "BUY" => Some(OrderKind::Buy),
            "SELL" => Some(OrderKind::Sell),
            "BUYLIMIT" => Some(OrderKind::BuyLimit),
            "BUYSTOP" => Some(OrderKind::BuyStop),
            "SELLLIMIT" => Some(OrderKind::SellLimit),
            "SELLSTOP" => Some(OrderKind::SellStop),
            _ => None,
        }
    }

    /// Convert to display string
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Buy => "BUY",
            OrderKind::Sell => "SELL",
            OrderKind::BuyLimit => "BUY LIMIT",
            OrderKind::BuyStop => "BUY STOP",
            OrderKind::SellLimit => "SELL LIMIT",
            OrderKind::SellStop => "SELL STOP",
        }
    }

    /// Check if this is a filled market position (BUY or SELL)
    pub fn is_live(&self) -> bool {
        matches!(self, OrderKind::Buy | OrderKind::Sell)
    }

    /// Check if this is a limit or stop order waiting to trigger
    pub fn is_pending(&self) -> bool {
        !self.is_live()
    }

    /// Check if this order buys when (or once) filled
    pub fn is_buy_side(&self) -> bool {
        matches!(
            self,
            OrderKind::Buy | OrderKind::BuyLimit | OrderKind::BuyStop
        )
    }

    /// Signed lot contribution to the net position
    ///
    /// Pending orders contribute nothing until they are filled.
    pub fn signed_lots(&self, size: f64) -> f64 {
        match self {
            OrderKind::Buy => size,
            OrderKind::Sell => -size,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => OrderKind::from_code(code)
                .ok_or_else(|| de::Error::custom(format!("unknown order type code {code}"))),
            Raw::Name(name) => OrderKind::from_name(&name)
                .ok_or_else(|| de::Error::custom(format!("unknown order type {name:?}"))),
        }
    }
}

/// Latest market context for one instrument
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Quote {
    /// Symbol name (e.g., "EURUSD")
    pub name: String,
    pub bid: f64,
    pub ask: f64,
    /// Decimal places used to display prices
    pub digits: u32,
    /// Average true range, used to flag pending orders close to triggering
    #[serde(default)]
    pub atr: f64,
}

/// One order entry as published inside a snapshot
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OrderFragment {
    pub ticket: Ticket,
    #[serde(rename = "type")]
    pub kind: OrderKind,
    #[serde(default, alias = "lots", alias = "volume")]
    pub size: f64,
    /// Falls back to the snapshot's quote name when absent
    #[serde(default, rename = "symbol", alias = "instrument")]
    pub instrument: Option<String>,
    #[serde(default, alias = "openPrice", alias = "price")]
    pub open_price: f64,
    #[serde(default, rename = "sl", alias = "stopLoss", alias = "stop_loss")]
    pub stop_loss: f64,
    #[serde(default, rename = "tp", alias = "takeProfit", alias = "take_profit")]
    pub take_profit: f64,
    #[serde(default)]
    pub swap: f64,
    #[serde(default)]
    pub profit: f64,
    /// Broker open time (unix seconds)
    #[serde(default, rename = "time", alias = "open_time")]
    pub open_time: Option<i64>,
}

/// Account-level totals carried by every snapshot
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct AccountSummary {
    pub balance: f64,
    pub equity: f64,
    pub profit: f64,
}

/// One decoded account snapshot
///
/// Ephemeral: consumed by a single ledger apply and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub summary: AccountSummary,
    pub quote: Quote,
    pub orders: Vec<OrderFragment>,
    /// Number of order fragments dropped by the decoder
    pub skipped_fragments: usize,
}

/// One broker order or position tracked by the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub ticket: Ticket,
    pub kind: OrderKind,
    pub instrument: String,
    pub size: f64,
    pub open_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub swap: f64,
    pub profit: f64,
    pub open_time: Option<i64>,
    /// Time of the most recent snapshot mentioning this ticket
    pub last_seen: DateTime<Utc>,
}

impl Order {
    /// Create a new order from its first fragment
    pub fn from_fragment(fragment: &OrderFragment, instrument: &str, now: DateTime<Utc>) -> Self {
        Self {
            ticket: fragment.ticket,
            kind: fragment.kind,
            instrument: instrument.to_string(),
            size: fragment.size,
            open_price: fragment.open_price,
            stop_loss: fragment.stop_loss,
            take_profit: fragment.take_profit,
            swap: fragment.swap,
            profit: fragment.profit,
            open_time: fragment.open_time,
            last_seen: now,
        }
    }

    /// Overwrite the fields that change over an order's lifetime
    ///
    /// Values are replaced, never accumulated, so a duplicate snapshot is harmless.
    pub fn refresh(&mut self, fragment: &OrderFragment, now: DateTime<Utc>) {
        self.kind = fragment.kind;
        self.size = fragment.size;
        self.open_price = fragment.open_price;
        self.stop_loss = fragment.stop_loss;
        self.take_profit = fragment.take_profit;
        self.swap = fragment.swap;
        self.profit = fragment.profit;
        self.last_seen = now;
    }

    /// Check if the order was last seen more than `ttl` ago
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::TimeDelta) -> bool {
        now - self.last_seen > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_kind_codes() {
        struct TestCase {
            input: i64,
            expected: Option<OrderKind>,
        }

        let tests = vec![
            TestCase {
                // TC0: OP_BUY
                input: 0,
                expected: Some(OrderKind::Buy),
            },
            TestCase {
                // TC1: OP_SELL
                input: 1,
                expected: Some(OrderKind::Sell),
            },
            TestCase {
                // TC2: OP_SELLLIMIT
                input: 3,
                expected: Some(OrderKind::SellLimit),
            },
            TestCase {
                // TC3: OP_BUYSTOP
                input: 4,
                expected: Some(OrderKind::BuyStop),
            },
            TestCase {
                // TC4: out of range
                input: 6,
                expected: None,
            },
            TestCase {
                // TC5: negative
                input: -1,
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = OrderKind::from_code(test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_order_kind_names() {
        assert_eq!(OrderKind::from_name("BUY"), Some(OrderKind::Buy));
        assert_eq!(OrderKind::from_name("sell"), Some(OrderKind::Sell));
        assert_eq!(OrderKind::from_name("BUY_LIMIT"), Some(OrderKind::BuyLimit));
        assert_eq!(OrderKind::from_name("SELL STOP"), Some(OrderKind::SellStop));
        assert_eq!(OrderKind::from_name("HOLD"), None);
    }

    #[test]
    fn test_order_kind_families() {
        assert!(OrderKind::Buy.is_live());
        assert!(OrderKind::Sell.is_live());
        assert!(OrderKind::BuyLimit.is_pending());
        assert!(OrderKind::SellStop.is_pending());
        assert!(OrderKind::BuyStop.is_buy_side());
        assert!(!OrderKind::SellLimit.is_buy_side());
    }

    #[test]
    fn test_signed_lots() {
        assert_eq!(OrderKind::Buy.signed_lots(1.5), 1.5);
        assert_eq!(OrderKind::Sell.signed_lots(0.4), -0.4);
        assert_eq!(OrderKind::BuyLimit.signed_lots(2.0), 0.0);
        assert_eq!(OrderKind::SellStop.signed_lots(2.0), 0.0);
    }

    #[test]
    fn test_order_kind_display() {
        assert_eq!(OrderKind::BuyLimit.to_string(), "BUY LIMIT");
        assert_eq!(OrderKind::Sell.to_string(), "SELL");
    }

    #[test]
    fn test_order_refresh_replaces_values() {
        let now = Utc::now();
        let mut fragment = OrderFragment {
            ticket: 7,
            kind: OrderKind::BuyLimit,
            size: 1.0,
            instrument: None,
            open_price: 1.1,
            stop_loss: 0.0,
            take_profit: 0.0,
            swap: 0.0,
            profit: 0.0,
            open_time: None,
        };
        let mut order = Order::from_fragment(&fragment, "EURUSD", now);
        assert_eq!(order.instrument, "EURUSD");

        fragment.kind = OrderKind::Buy;
        fragment.profit = 12.5;
        fragment.swap = -1.0;
        fragment.size = 0.5;
        let later = now + chrono::TimeDelta::seconds(1);
        order.refresh(&fragment, later);
        order.refresh(&fragment, later);

        assert_eq!(order.kind, OrderKind::Buy);
        assert_eq!(order.profit, 12.5);
        assert_eq!(order.swap, -1.0);
        assert_eq!(order.size, 0.5);
        assert_eq!(order.last_seen, later);
    }
}
