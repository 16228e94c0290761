//! Trade requests and the append-only trade audit log.
//!
//! - [`TradeRequest`] - a member's instruction to buy or sell at a quoted price
//! - [`Trade`] - an immutable record of a balance-affecting event
//!
//! # Examples
//!
//! ```
//! use polyledger::domain::{MemberId, Outcome, TradeRequest, TradeSide};
//! use rust_decimal_macros::dec;
//!
//! let request = TradeRequest::new(
//!     MemberId::new(1),
//!     "M1",
//!     Outcome::Yes,
//!     TradeSide::Buy,
//!     dec!(100),
//!     dec!(0.40),
//! );
//! assert!(request.validate().is_ok());
//! assert_eq!(request.total_value().unwrap(), dec!(40));
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, MemberId, TradeId};
use super::money::{notional, Amount, Price, Shares};
use super::outcome::Outcome;

/// Direction of a member-initiated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl FromStr for TradeSide {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("buy") {
            Ok(TradeSide::Buy)
        } else if trimmed.eq_ignore_ascii_case("sell") {
            Ok(TradeSide::Sell)
        } else {
            Err(DomainError::UnknownSide {
                label: s.to_string(),
            })
        }
    }
}

impl From<TradeSide> for TradeKind {
    fn from(side: TradeSide) -> Self {
        match side {
            TradeSide::Buy => TradeKind::Buy,
            TradeSide::Sell => TradeKind::Sell,
        }
    }
}

/// Kind of balance-affecting event recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Buy,
    Sell,
    Settle,
}

impl TradeKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Buy => "buy",
            TradeKind::Sell => "sell",
            TradeKind::Settle => "settle",
        }
    }

    /// Sells and settlements close exposure and count toward win rate.
    #[must_use]
    pub const fn is_closing(&self) -> bool {
        matches!(self, TradeKind::Sell | TradeKind::Settle)
    }
}

impl FromStr for TradeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TradeKind::Buy),
            "sell" => Ok(TradeKind::Sell),
            "settle" => Ok(TradeKind::Settle),
            other => Err(format!("unknown trade kind '{other}'")),
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's instruction to trade at a quoted price.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    pub member_id: MemberId,
    pub market_id: MarketId,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub outcome: Outcome,
    pub side: TradeSide,
    pub shares: Shares,
    pub price: Price,
}

impl TradeRequest {
    pub fn new(
        member_id: MemberId,
        market_id: impl Into<MarketId>,
        outcome: Outcome,
        side: TradeSide,
        shares: Shares,
        price: Price,
    ) -> Self {
        Self {
            member_id,
            market_id: market_id.into(),
            market_slug: None,
            market_question: None,
            outcome,
            side,
            shares,
            price,
        }
    }

    /// Attach display metadata copied onto positions and trades.
    #[must_use]
    pub fn with_market_info(mut self, slug: Option<String>, question: Option<String>) -> Self {
        self.market_slug = slug;
        self.market_question = question;
        self
    }

    /// `shares * price`.
    pub fn total_value(&self) -> Result<Amount, DomainError> {
        notional(self.shares, self.price)
    }

    /// Check the preconditions that do not need the store.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.member_id.is_valid() {
            return Err(DomainError::InvalidId {
                entity: "member",
                id: self.member_id.value(),
            });
        }
        if self.market_id.is_blank() {
            return Err(DomainError::EmptyMarketId);
        }
        if self.shares <= Decimal::ZERO {
            return Err(DomainError::NonPositiveShares {
                shares: self.shares,
            });
        }
        if self.price <= Decimal::ZERO {
            return Err(DomainError::NonPositivePrice { price: self.price });
        }
        self.total_value()?;
        Ok(())
    }
}

/// Immutable audit record of a balance-affecting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub member_id: MemberId,
    pub market_id: MarketId,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub kind: TradeKind,
    pub outcome: Outcome,
    pub shares: Shares,
    pub price: Price,
    pub total_value: Amount,
    /// `None` for buys and for sells with no position behind them.
    pub pnl: Option<Amount>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to append a trade. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub member_id: MemberId,
    pub market_id: MarketId,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub kind: TradeKind,
    pub outcome: Outcome,
    pub shares: Shares,
    pub price: Price,
    pub pnl: Option<Amount>,
}

impl NewTrade {
    /// Audit record for a member-initiated trade.
    #[must_use]
    pub fn for_request(request: &TradeRequest, pnl: Option<Amount>) -> Self {
        Self {
            member_id: request.member_id,
            market_id: request.market_id.clone(),
            market_slug: request.market_slug.clone(),
            market_question: request.market_question.clone(),
            kind: request.side.into(),
            outcome: request.outcome,
            shares: request.shares,
            price: request.price,
            pnl,
        }
    }

    pub fn total_value(&self) -> Result<Amount, DomainError> {
        notional(self.shares, self.price)
    }

    pub fn into_trade(self, id: TradeId, now: DateTime<Utc>) -> Result<Trade, DomainError> {
        let total_value = self.total_value()?;
        Ok(Trade {
            id,
            member_id: self.member_id,
            market_id: self.market_id,
            market_slug: self.market_slug,
            market_question: self.market_question,
            kind: self.kind,
            outcome: self.outcome,
            shares: self.shares,
            price: self.price,
            total_value,
            pnl: self.pnl,
            created_at: now,
        })
    }
}
