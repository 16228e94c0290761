//! Gamma API response types.
//!
//! `GET /markets/{id}` returns a single flat market object. Several fields
//! arrive either as JSON-encoded strings or as native JSON values depending on
//! the endpoint version, so they are captured loosely and normalized here.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{MarketId, MarketQuote, Price, DEFAULT_OUTCOME_PRICE};

/// Market data from the Gamma API.
///
/// Only the fields a quote is built from are kept; everything else in the
/// payload is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    /// Closed markets are resolved.
    #[serde(default)]
    pub closed: bool,
    /// Outcome prices, `["0.65", "0.35"]` or the same list JSON-encoded.
    #[serde(default)]
    pub outcome_prices: Option<Value>,
    /// Lifetime volume, number or numeric string.
    #[serde(default)]
    pub volume: Option<Value>,
    /// Liquidity depth, number or numeric string.
    #[serde(default)]
    pub liquidity: Option<Value>,
    #[serde(default)]
    pub tokens: Vec<GammaToken>,
}

/// One outcome token of a market.
#[derive(Debug, Deserialize)]
pub struct GammaToken {
    pub outcome: String,
    #[serde(default)]
    pub winner: bool,
}

/// Read a decimal out of a JSON number or numeric string.
fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

impl GammaMarket {
    /// Parsed outcome prices in listing order (yes first, no second).
    ///
    /// Entries that fail to parse become `None`.
    #[must_use]
    pub fn outcome_prices(&self) -> Vec<Option<Price>> {
        let list = match &self.outcome_prices {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::String(encoded)) => match serde_json::from_str::<Vec<Value>>(encoded) {
                Ok(items) => items,
                Err(e) => {
                    debug!(error = %e, raw = %encoded, "failed to parse outcomePrices");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };
        list.iter().map(decimal_from_value).collect()
    }

    /// The single outcome flagged as winner, if exactly one is.
    #[must_use]
    pub fn winning_outcome(&self) -> Option<String> {
        let mut winners = self.tokens.iter().filter(|t| t.winner);
        match (winners.next(), winners.next()) {
            (Some(token), None) => Some(token.outcome.clone()),
            _ => None,
        }
    }

    /// Normalize into a ledger quote for `market_id`.
    ///
    /// Missing or unparsable prices default to 0.5; volume and liquidity
    /// default to zero.
    #[must_use]
    pub fn into_quote(self, market_id: MarketId) -> MarketQuote {
        let prices = self.outcome_prices();
        let price_at = |i: usize| {
            prices
                .get(i)
                .copied()
                .flatten()
                .unwrap_or(DEFAULT_OUTCOME_PRICE)
        };

        MarketQuote {
            market_id,
            yes_price: price_at(0),
            no_price: price_at(1),
            is_resolved: self.closed,
            winning_outcome: if self.closed {
                self.winning_outcome()
            } else {
                None
            },
            volume: self
                .volume
                .as_ref()
                .and_then(decimal_from_value)
                .unwrap_or(Decimal::ZERO),
            liquidity: self
                .liquidity
                .as_ref()
                .and_then(decimal_from_value)
                .unwrap_or(Decimal::ZERO),
        }
    }
}
