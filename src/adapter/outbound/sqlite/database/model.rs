//! Database model types for Diesel ORM.
//!
//! Decimals are stored as their canonical string form and timestamps as
//! RFC 3339 text so no precision is lost in SQLite.

use diesel::prelude::*;

use super::schema::{league_members, leagues, positions, trades};

/// Database row for a league (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = leagues)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LeagueRow {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub starting_capital: String,
    pub max_position_size: String,
    pub created_at: String,
}

/// Database row for a league (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = leagues)]
pub struct NewLeagueRow {
    pub name: String,
    pub status: String,
    pub starting_capital: String,
    pub max_position_size: String,
    pub created_at: String,
}

/// Database row for a league member (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = league_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MemberRow {
    pub id: i64,
    pub league_id: i64,
    pub user_id: String,
    pub current_balance: String,
    pub total_pnl: String,
    pub total_trades: i64,
    pub win_rate: String,
    pub rank: Option<i32>,
    pub joined_at: String,
}

/// Database row for a league member (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = league_members)]
pub struct NewMemberRow {
    pub league_id: i64,
    pub user_id: String,
    pub current_balance: String,
    pub total_pnl: String,
    pub total_trades: i64,
    pub win_rate: String,
    pub joined_at: String,
}

/// Partial member update. `None` fields are left untouched.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = league_members)]
pub struct MemberChangeset {
    pub current_balance: Option<String>,
    pub total_pnl: Option<String>,
    pub total_trades: Option<i64>,
    pub win_rate: Option<String>,
    pub rank: Option<i32>,
}

impl MemberChangeset {
    /// Diesel rejects an update with nothing to set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_balance.is_none()
            && self.total_pnl.is_none()
            && self.total_trades.is_none()
            && self.win_rate.is_none()
            && self.rank.is_none()
    }
}

/// Database row for an open position (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionRow {
    pub id: i64,
    pub league_member_id: i64,
    pub market_id: String,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub outcome: String,
    pub shares: String,
    pub entry_price: String,
    pub current_price: String,
    pub unrealized_pnl: String,
    pub opened_at: String,
    pub updated_at: String,
}

/// Database row for an open position (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = positions)]
pub struct NewPositionRow {
    pub league_member_id: i64,
    pub market_id: String,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub outcome: String,
    pub shares: String,
    pub entry_price: String,
    pub current_price: String,
    pub unrealized_pnl: String,
    pub opened_at: String,
    pub updated_at: String,
}

/// Partial position update. Always stamps `updated_at`.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = positions)]
pub struct PositionChangeset {
    pub shares: Option<String>,
    pub entry_price: Option<String>,
    pub current_price: Option<String>,
    pub unrealized_pnl: Option<String>,
    pub updated_at: String,
}

/// Database row for a trade (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeRow {
    pub id: i64,
    pub league_member_id: i64,
    pub market_id: String,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub trade_type: String,
    pub outcome: String,
    pub shares: String,
    pub price: String,
    pub total_value: String,
    pub pnl: Option<String>,
    pub created_at: String,
}

/// Database row for a trade (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = trades)]
pub struct NewTradeRow {
    pub league_member_id: i64,
    pub market_id: String,
    pub market_slug: Option<String>,
    pub market_question: Option<String>,
    pub trade_type: String,
    pub outcome: String,
    pub shares: String,
    pub price: String,
    pub total_value: String,
    pub pnl: Option<String>,
    pub created_at: String,
}
