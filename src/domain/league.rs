//! Leagues and their members.
//!
//! A league groups members who trade the same market universe with independent
//! balances. Ranking and rollups are always scoped to one league.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{LeagueId, MemberId};
use super::money::Amount;

/// Lifecycle state of a league.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeagueStatus {
    #[default]
    Active,
    Completed,
    Upcoming,
}

impl LeagueStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LeagueStatus::Active => "active",
            LeagueStatus::Completed => "completed",
            LeagueStatus::Upcoming => "upcoming",
        }
    }
}

impl FromStr for LeagueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(LeagueStatus::Active),
            "completed" => Ok(LeagueStatus::Completed),
            "upcoming" => Ok(LeagueStatus::Upcoming),
            other => Err(format!("unknown league status '{other}'")),
        }
    }
}

impl fmt::Display for LeagueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scoped competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub status: LeagueStatus,
    /// Balance every new member starts with.
    pub starting_capital: Amount,
    /// Informational cap carried from league settings.
    pub max_position_size: Amount,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a league. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeague {
    pub name: String,
    pub status: LeagueStatus,
    pub starting_capital: Amount,
    pub max_position_size: Amount,
}

impl NewLeague {
    /// Validate and build a new active league.
    pub fn try_new(
        name: impl Into<String>,
        starting_capital: Amount,
        max_position_size: Amount,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyLeagueName);
        }
        if starting_capital <= Decimal::ZERO {
            return Err(DomainError::NonPositiveCapital {
                capital: starting_capital,
            });
        }
        Ok(Self {
            name,
            status: LeagueStatus::Active,
            starting_capital,
            max_position_size,
        })
    }

    #[must_use]
    pub fn with_status(mut self, status: LeagueStatus) -> Self {
        self.status = status;
        self
    }
}

/// A participant's account within one league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub league_id: LeagueId,
    /// Opaque identifier of the user behind this membership.
    pub user_id: String,
    /// Spendable capital.
    pub current_balance: Amount,
    /// Cumulative realized profit and loss.
    pub total_pnl: Amount,
    /// Count of buy, sell and settle operations.
    pub total_trades: u64,
    /// Percentage of closing trades with positive pnl.
    pub win_rate: Decimal,
    /// Dense rank within the league, 1 = best `total_pnl`.
    pub rank: Option<u32>,
    pub joined_at: DateTime<Utc>,
}

/// Fields required to enroll a member. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub league_id: LeagueId,
    pub user_id: String,
    pub starting_balance: Amount,
}

/// Partial update of a member row. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPatch {
    pub current_balance: Option<Amount>,
    pub total_pnl: Option<Amount>,
    pub total_trades: Option<u64>,
    pub win_rate: Option<Decimal>,
    pub rank: Option<u32>,
}

impl MemberPatch {
    /// Patch that only assigns a rank.
    #[must_use]
    pub fn rank(rank: u32) -> Self {
        Self {
            rank: Some(rank),
            ..Default::default()
        }
    }

    /// Apply this patch to an in-memory member.
    pub fn apply_to(&self, member: &mut Member) {
        if let Some(balance) = self.current_balance {
            member.current_balance = balance;
        }
        if let Some(pnl) = self.total_pnl {
            member.total_pnl = pnl;
        }
        if let Some(trades) = self.total_trades {
            member.total_trades = trades;
        }
        if let Some(win_rate) = self.win_rate {
            member.win_rate = win_rate;
        }
        if let Some(rank) = self.rank {
            member.rank = Some(rank);
        }
    }
}

/// Win rate over the pnl of a member's closing trades.
///
/// A closing trade without pnl (a sell with no position behind it) counts in
/// the denominator but never as a win. Returns zero when there are no closing
/// trades.
pub fn win_rate<I>(closing_pnls: I) -> Decimal
where
    I: IntoIterator<Item = Option<Amount>>,
{
    let (wins, total) = closing_pnls
        .into_iter()
        .fold((0u64, 0u64), |(wins, total), pnl| match pnl {
            Some(p) if p > Decimal::ZERO => (wins + 1, total + 1),
            _ => (wins, total + 1),
        });

    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(wins) * Decimal::ONE_HUNDRED / Decimal::from(total)
}
