//! Snapshot decoder.
//!
//! Turns one published payload `"<topic> <json-body>"` into an [`Envelope`].
//! A bad order fragment is skipped on its own so one broken record never blanks
//! the whole panel.

use crate::shared::error::DecodeError;
use crate::shared::types::{AccountSnapshot, AccountSummary, OrderFragment, Quote};
use serde::Deserialize;
use tracing::warn;

/// A decoded message together with the topic it was published on
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Account identifier used as the publish topic
    pub topic: String,
    pub snapshot: AccountSnapshot,
}

/// Body shape as published; order fragments are decoded one by one afterwards
#[derive(Debug, Deserialize)]
struct RawSnapshot {
    balance: f64,
    equity: f64,
    profit: f64,
    #[serde(rename = "symbol", alias = "instrument")]
    quote: Quote,
    #[serde(default)]
    orders: Option<Vec<serde_json::Value>>,
}

/// Decode a raw payload of the form `"<topic> <json-body>"`
pub fn decode(raw: &str) -> Result<Envelope, DecodeError> {
    let (topic, body) = raw
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| DecodeError::MalformedSnapshot("missing topic or body".to_string()))?;

    Ok(Envelope {
        topic: topic.to_string(),
        snapshot: decode_body(body)?,
    })
}

/// Decode the JSON body of a snapshot message
pub fn decode_body(body: &str) -> Result<AccountSnapshot, DecodeError> {
    let raw: RawSnapshot = serde_json::from_str(body.trim())
        .map_err(|error| DecodeError::MalformedSnapshot(error.to_string()))?;

    let mut orders = Vec::new();
    let mut skipped_fragments = 0;

    for (index, value) in raw.orders.unwrap_or_default().into_iter().enumerate() {
        match serde_json::from_value::<OrderFragment>(value) {
            Ok(fragment) => orders.push(fragment),
            Err(error) => {
                let error = DecodeError::MalformedOrderFragment {
                    index,
                    reason: error.to_string(),
                };
                warn!(instrument = %raw.quote.name, %error, "skipping order fragment");
                skipped_fragments += 1;
            }
        }
    }

    Ok(AccountSnapshot {
        summary: AccountSummary {
            balance: raw.balance,
            equity: raw.equity,
            profit: raw.profit,
        },
        quote: raw.quote,
        orders,
        skipped_fragments,
    })
}
