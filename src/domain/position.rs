//! Open positions and the arithmetic that moves them.
//!
//! A [`Position`] is one member's open exposure to one outcome of one market.
//! Positions are created by buys, shrunk by partial sells and removed by full
//! sells or settlement. The methods here never touch storage; they compute the
//! [`PositionPatch`] or [`SettlementAmounts`] that the engines commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, MemberId, PositionId};
use super::money::{add, mark_pnl, notional, sub, Amount, Price, Shares};
use super::outcome::Outcome;

/// A member's open exposure to one outcome of one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub member_id: MemberId,
    pub market_id: MarketId,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub outcome: Outcome,
    pub shares: Shares,
    /// Cost basis per share.
    pub entry_price: Price,
    /// Last revalued price.
    pub current_price: Price,
    pub unrealized_pnl: Amount,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Total cost basis of the shares still held.
    pub fn cost_basis(&self) -> Result<Amount, DomainError> {
        notional(self.shares, self.entry_price)
    }

    /// Unrealized pnl if the held shares were valued at `price`.
    pub fn unrealized_at(&self, price: Price) -> Result<Amount, DomainError> {
        mark_pnl(price, self.entry_price, self.shares)
    }

    /// Realized pnl of selling `shares` at `price` against this cost basis.
    pub fn sell_pnl(&self, price: Price, shares: Shares) -> Result<Amount, DomainError> {
        mark_pnl(price, self.entry_price, shares)
    }

    /// True when selling `shares` closes the position entirely.
    #[must_use]
    pub fn is_closed_by(&self, shares: Shares) -> bool {
        shares >= self.shares
    }

    /// Patch for a partial sell of `sold` shares.
    ///
    /// Unrealized pnl is recomputed at the position's existing mark, not at the
    /// sell price.
    pub fn reduced_by(&self, sold: Shares) -> Result<PositionPatch, DomainError> {
        let remaining = sub(self.shares, sold)?;
        Ok(PositionPatch {
            shares: Some(remaining),
            unrealized_pnl: Some(mark_pnl(self.current_price, self.entry_price, remaining)?),
            ..Default::default()
        })
    }

    /// Patch for marking the position at a fresh quote.
    pub fn revalued_at(&self, price: Price) -> Result<PositionPatch, DomainError> {
        Ok(PositionPatch {
            current_price: Some(price),
            unrealized_pnl: Some(self.unrealized_at(price)?),
            ..Default::default()
        })
    }

    /// Patch for adding `shares` bought at `price` with average-cost merging.
    pub fn averaged_with(
        &self,
        shares: Shares,
        price: Price,
    ) -> Result<PositionPatch, DomainError> {
        let total = add(self.shares, shares)?;
        let entry = add(self.cost_basis()?, notional(shares, price)?)?
            .checked_div(total)
            .ok_or(DomainError::Overflow { op: "average entry" })?;
        Ok(PositionPatch {
            shares: Some(total),
            entry_price: Some(entry),
            unrealized_pnl: Some(mark_pnl(self.current_price, entry, total)?),
            ..Default::default()
        })
    }

    /// Final amounts when the market resolves in favour of `winner`.
    pub fn settle_against(&self, winner: Outcome) -> Result<SettlementAmounts, DomainError> {
        let payout_per_share = if self.outcome == winner {
            Decimal::ONE
        } else {
            Decimal::ZERO
        };
        let total_payout = notional(self.shares, payout_per_share)?;
        Ok(SettlementAmounts {
            payout_per_share,
            total_payout,
            final_pnl: sub(total_payout, self.cost_basis()?)?,
        })
    }
}

/// Payout figures for settling one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementAmounts {
    /// 1 for the winning outcome, 0 otherwise.
    pub payout_per_share: Price,
    pub total_payout: Amount,
    pub final_pnl: Amount,
}

/// Fields required to open a position. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub member_id: MemberId,
    pub market_id: MarketId,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub outcome: Outcome,
    pub shares: Shares,
    pub entry_price: Price,
}

impl NewPosition {
    /// Materialize the stored record: marked at entry with zero pnl.
    #[must_use]
    pub fn into_position(self, id: PositionId, now: DateTime<Utc>) -> Position {
        Position {
            id,
            member_id: self.member_id,
            market_id: self.market_id,
            market_slug: self.market_slug,
            market_question: self.market_question,
            outcome: self.outcome,
            shares: self.shares,
            entry_price: self.entry_price,
            current_price: self.entry_price,
            unrealized_pnl: Decimal::ZERO,
            opened_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a position row. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionPatch {
    pub shares: Option<Shares>,
    pub entry_price: Option<Price>,
    pub current_price: Option<Price>,
    pub unrealized_pnl: Option<Amount>,
}

impl PositionPatch {
    /// Apply this patch to an in-memory position.
    pub fn apply_to(&self, position: &mut Position, now: DateTime<Utc>) {
        if let Some(shares) = self.shares {
            position.shares = shares;
        }
        if let Some(entry) = self.entry_price {
            position.entry_price = entry;
        }
        if let Some(price) = self.current_price {
            position.current_price = price;
        }
        if let Some(pnl) = self.unrealized_pnl {
            position.unrealized_pnl = pnl;
        }
        position.updated_at = now;
    }
}
