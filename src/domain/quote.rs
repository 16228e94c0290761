//! Market quotes supplied by the external price source.
//!
//! Quotes are transient: the ledger reads them to revalue and settle
//! positions and never persists them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::id::MarketId;
use super::money::Price;
use super::outcome::Outcome;

/// Price assumed for an outcome when the source does not report one.
pub const DEFAULT_OUTCOME_PRICE: Price = dec!(0.5);

/// Current prices and resolution status of one binary market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub market_id: MarketId,
    pub yes_price: Price,
    pub no_price: Price,
    pub is_resolved: bool,
    /// Raw winning outcome label as reported by the source, if any.
    pub winning_outcome: Option<String>,
    /// Informational only.
    pub volume: Decimal,
    /// Informational only.
    pub liquidity: Decimal,
}

impl MarketQuote {
    /// An open market trading at the given prices.
    pub fn open(market_id: impl Into<MarketId>, yes_price: Price, no_price: Price) -> Self {
        Self {
            market_id: market_id.into(),
            yes_price,
            no_price,
            is_resolved: false,
            winning_outcome: None,
            volume: Decimal::ZERO,
            liquidity: Decimal::ZERO,
        }
    }

    /// A resolved market with the given winning label.
    pub fn resolved(market_id: impl Into<MarketId>, winning_outcome: impl Into<String>) -> Self {
        let winning_outcome = winning_outcome.into();
        let (yes_price, no_price) = match Outcome::parse(&winning_outcome) {
            Ok(Outcome::Yes) => (Decimal::ONE, Decimal::ZERO),
            Ok(Outcome::No) => (Decimal::ZERO, Decimal::ONE),
            Err(_) => (DEFAULT_OUTCOME_PRICE, DEFAULT_OUTCOME_PRICE),
        };
        Self {
            market_id: market_id.into(),
            yes_price,
            no_price,
            is_resolved: true,
            winning_outcome: Some(winning_outcome),
            volume: Decimal::ZERO,
            liquidity: Decimal::ZERO,
        }
    }

    /// Price of the given outcome.
    #[must_use]
    pub fn price_for(&self, outcome: Outcome) -> Price {
        match outcome {
            Outcome::Yes => self.yes_price,
            Outcome::No => self.no_price,
        }
    }

    /// The winning outcome, if the market is resolved and the label is one
    /// of the two binary outcomes.
    #[must_use]
    pub fn winner(&self) -> Option<Outcome> {
        if !self.is_resolved {
            return None;
        }
        self.winning_outcome
            .as_deref()
            .and_then(|label| Outcome::parse(label).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_for_picks_side() {
        let q = MarketQuote::open("M1", dec!(0.62), dec!(0.38));
        assert_eq!(q.price_for(Outcome::Yes), dec!(0.62));
        assert_eq!(q.price_for(Outcome::No), dec!(0.38));
        assert_eq!(q.winner(), None);
    }

    #[test]
    fn winner_is_case_insensitive() {
        let q = MarketQuote::resolved("M1", "Yes");
        assert_eq!(q.winner(), Some(Outcome::Yes));
        assert_eq!(q.yes_price, Decimal::ONE);
    }

    #[test]
    fn unknown_or_missing_winner_is_none() {
        assert_eq!(MarketQuote::resolved("M1", "Draw").winner(), None);
        assert_eq!(MarketQuote::resolved("M1", "").winner(), None);

        let mut q = MarketQuote::open("M1", dec!(0.5), dec!(0.5));
        q.is_resolved = true;
        assert_eq!(q.winner(), None);
    }
}
