//! SQLite ledger store implementation.
//!
//! Diesel is synchronous, so every call checks a connection out of the pool
//! on the blocking thread pool. A [`LedgerBatch`] is applied inside one
//! `BEGIN IMMEDIATE` transaction: a failing operation rolls back everything
//! before it.
//!
//! A blocking task cannot be cancelled, so a commit that times out still runs
//! to the end on its worker. The worker asks a [`CommitGate`] for permission
//! right before `COMMIT`; once the caller has given up the gate refuses and
//! the transaction rolls back instead.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::adapter::outbound::sqlite::database::connection::{self, DbPool};
use crate::adapter::outbound::sqlite::database::model::{
    LeagueRow, MemberChangeset, MemberRow, NewLeagueRow, NewMemberRow, NewPositionRow,
    NewTradeRow, PositionChangeset, PositionRow, TradeRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    league_members, leagues, positions, trades,
};
use crate::domain::{
    League, LeagueId, LeagueStatus, MarketId, Member, MemberId, MemberPatch, NewLeague,
    NewMember, NewPosition, NewTrade, Outcome, Position, PositionId, PositionPatch, Trade,
    TradeId, TradeKind,
};
use crate::error::{Error, Result};
use crate::port::{
    CommitReceipt, LeagueFilter, LedgerBatch, LedgerOp, LedgerStore, MemberFilter,
    PositionFilter, TradeFilter,
};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    id: i64,
}

fn last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64> {
    Ok(diesel::sql_query("SELECT last_insert_rowid() AS id")
        .get_result::<LastInsertRowId>(conn)?
        .id)
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| Error::Parse(format!("{field} '{raw}': {e}")))
}

fn parse_optional_decimal(field: &'static str, raw: Option<&str>) -> Result<Option<Decimal>> {
    raw.map(|r| parse_decimal(field, r)).transpose()
}

fn parse_time(field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("{field} '{raw}': {e}")))
}

fn parse_outcome(raw: &str) -> Result<Outcome> {
    Outcome::parse(raw).map_err(|e| Error::Parse(e.to_string()))
}

fn league_from_row(row: LeagueRow) -> Result<League> {
    Ok(League {
        id: LeagueId::new(row.id),
        status: LeagueStatus::from_str(&row.status).map_err(Error::Parse)?,
        starting_capital: parse_decimal("starting_capital", &row.starting_capital)?,
        max_position_size: parse_decimal("max_position_size", &row.max_position_size)?,
        created_at: parse_time("created_at", &row.created_at)?,
        name: row.name,
    })
}

fn member_from_row(row: MemberRow) -> Result<Member> {
    Ok(Member {
        id: MemberId::new(row.id),
        league_id: LeagueId::new(row.league_id),
        current_balance: parse_decimal("current_balance", &row.current_balance)?,
        total_pnl: parse_decimal("total_pnl", &row.total_pnl)?,
        total_trades: u64::try_from(row.total_trades)
            .map_err(|e| Error::Parse(format!("total_trades: {e}")))?,
        win_rate: parse_decimal("win_rate", &row.win_rate)?,
        rank: row
            .rank
            .map(u32::try_from)
            .transpose()
            .map_err(|e| Error::Parse(format!("rank: {e}")))?,
        joined_at: parse_time("joined_at", &row.joined_at)?,
        user_id: row.user_id,
    })
}

fn position_from_row(row: PositionRow) -> Result<Position> {
    Ok(Position {
        id: PositionId::new(row.id),
        member_id: MemberId::new(row.league_member_id),
        market_id: MarketId::new(row.market_id),
        market_slug: row.market_slug,
        market_question: row.market_question,
        outcome: parse_outcome(&row.outcome)?,
        shares: parse_decimal("shares", &row.shares)?,
        entry_price: parse_decimal("entry_price", &row.entry_price)?,
        current_price: parse_decimal("current_price", &row.current_price)?,
        unrealized_pnl: parse_decimal("unrealized_pnl", &row.unrealized_pnl)?,
        opened_at: parse_time("opened_at", &row.opened_at)?,
        updated_at: parse_time("updated_at", &row.updated_at)?,
    })
}

fn trade_from_row(row: TradeRow) -> Result<Trade> {
    Ok(Trade {
        id: TradeId::new(row.id),
        member_id: MemberId::new(row.league_member_id),
        market_id: MarketId::new(row.market_id),
        market_slug: row.market_slug,
        market_question: row.market_question,
        kind: TradeKind::from_str(&row.trade_type).map_err(Error::Parse)?,
        outcome: parse_outcome(&row.outcome)?,
        shares: parse_decimal("shares", &row.shares)?,
        price: parse_decimal("price", &row.price)?,
        total_value: parse_decimal("total_value", &row.total_value)?,
        pnl: parse_optional_decimal("pnl", row.pnl.as_deref())?,
        created_at: parse_time("created_at", &row.created_at)?,
    })
}

fn new_position_row(position: NewPosition, stamp: &str) -> NewPositionRow {
    NewPositionRow {
        league_member_id: position.member_id.value(),
        market_id: position.market_id.to_string(),
        market_slug: position.market_slug,
        market_question: position.market_question,
        outcome: position.outcome.as_str().to_string(),
        shares: position.shares.to_string(),
        entry_price: position.entry_price.to_string(),
        current_price: position.entry_price.to_string(),
        unrealized_pnl: Decimal::ZERO.to_string(),
        opened_at: stamp.to_string(),
        updated_at: stamp.to_string(),
    }
}

fn new_trade_row(trade: NewTrade, stamp: &str) -> Result<NewTradeRow> {
    Ok(NewTradeRow {
        league_member_id: trade.member_id.value(),
        total_value: trade.total_value()?.to_string(),
        market_id: trade.market_id.to_string(),
        market_slug: trade.market_slug,
        market_question: trade.market_question,
        trade_type: trade.kind.as_str().to_string(),
        outcome: trade.outcome.as_str().to_string(),
        shares: trade.shares.to_string(),
        price: trade.price.to_string(),
        pnl: trade.pnl.map(|p| p.to_string()),
        created_at: stamp.to_string(),
    })
}

fn position_changeset(patch: &PositionPatch, stamp: &str) -> PositionChangeset {
    PositionChangeset {
        shares: patch.shares.map(|d| d.to_string()),
        entry_price: patch.entry_price.map(|d| d.to_string()),
        current_price: patch.current_price.map(|d| d.to_string()),
        unrealized_pnl: patch.unrealized_pnl.map(|d| d.to_string()),
        updated_at: stamp.to_string(),
    }
}

fn member_changeset(patch: &MemberPatch) -> Result<MemberChangeset> {
    Ok(MemberChangeset {
        current_balance: patch.current_balance.map(|d| d.to_string()),
        total_pnl: patch.total_pnl.map(|d| d.to_string()),
        total_trades: patch
            .total_trades
            .map(i64::try_from)
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("total_trades: {e}")))?,
        win_rate: patch.win_rate.map(|d| d.to_string()),
        rank: patch
            .rank
            .map(i32::try_from)
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("rank: {e}")))?,
    })
}

fn apply_ops(
    conn: &mut SqliteConnection,
    ops: Vec<LedgerOp>,
    now: DateTime<Utc>,
) -> Result<CommitReceipt> {
    let stamp = now.to_rfc3339();
    let mut receipt = CommitReceipt::default();

    for op in ops {
        match op {
            LedgerOp::InsertPosition(new) => {
                diesel::insert_into(positions::table)
                    .values(&new_position_row(new, &stamp))
                    .execute(conn)?;
                receipt
                    .positions
                    .push(PositionId::new(last_insert_rowid(conn)?));
            }
            LedgerOp::UpdatePosition { id, patch } => {
                let updated = diesel::update(positions::table.find(id.value()))
                    .set(&position_changeset(&patch, &stamp))
                    .execute(conn)?;
                if updated == 0 {
                    return Err(Error::not_found("position", id));
                }
            }
            LedgerOp::DeletePosition(id) => {
                let deleted = diesel::delete(positions::table.find(id.value())).execute(conn)?;
                if deleted == 0 {
                    return Err(Error::not_found("position", id));
                }
            }
            LedgerOp::InsertTrade(new) => {
                diesel::insert_into(trades::table)
                    .values(&new_trade_row(new, &stamp)?)
                    .execute(conn)?;
                receipt.trades.push(TradeId::new(last_insert_rowid(conn)?));
            }
            LedgerOp::UpdateMember { id, patch } => {
                let changes = member_changeset(&patch)?;
                let found = if changes.is_empty() {
                    league_members::table
                        .find(id.value())
                        .select(league_members::id)
                        .first::<i64>(conn)
                        .optional()?
                        .is_some()
                } else {
                    diesel::update(league_members::table.find(id.value()))
                        .set(&changes)
                        .execute(conn)?
                        > 0
                };
                if !found {
                    return Err(Error::not_found("member", id));
                }
            }
        }
    }

    Ok(receipt)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum GateState {
    #[default]
    Pending,
    Committing,
    Abandoned,
}

/// Decides whether a batch running on a blocking worker may still commit.
#[derive(Debug, Default)]
struct CommitGate {
    state: Mutex<GateState>,
}

impl CommitGate {
    /// Called by the worker inside the transaction, right before `COMMIT`.
    fn begin_commit(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state == GateState::Abandoned {
            return Err(Error::ExternalUnavailable(
                "commit abandoned by caller".into(),
            ));
        }
        *state = GateState::Committing;
        Ok(())
    }

    /// Called by the caller when it stops waiting. Returns false when the
    /// worker is already committing and the outcome must be awaited.
    fn abandon(&self) -> bool {
        let mut state = self.state.lock();
        if *state == GateState::Committing {
            return false;
        }
        *state = GateState::Abandoned;
        true
    }
}

/// Abandons the gate if the commit future is dropped before it resolves.
struct AbandonOnDrop<'a>(&'a CommitGate);

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

/// SQLite-backed ledger store.
///
/// Implements the [`LedgerStore`] trait for persistent storage of leagues,
/// members, open positions and the trade log.
#[derive(Clone)]
pub struct SqliteLedgerStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteLedgerStore {
    /// Create a new SQLite ledger store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open `database_url`, run pending migrations and wrap the pool.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(database_url: &str) -> Result<Self> {
        let pool = connection::open(database_url)?;
        debug!(database = database_url, "ledger database ready");
        Ok(Self::new(pool))
    }

    /// Apply `batch` in one transaction, giving up after `limit` if set.
    async fn commit_gated(
        &self,
        batch: LedgerBatch,
        limit: Option<Duration>,
    ) -> Result<CommitReceipt> {
        let ops = batch.into_ops();
        let count = ops.len();
        let gate = Arc::new(CommitGate::default());
        let worker_gate = Arc::clone(&gate);
        let pool = self.pool.clone();

        let mut worker = tokio::task::spawn_blocking(move || -> Result<CommitReceipt> {
            let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
            conn.immediate_transaction(|conn| -> Result<CommitReceipt> {
                let receipt = apply_ops(conn, ops, Utc::now())?;
                worker_gate.begin_commit()?;
                Ok(receipt)
            })
        });
        let _abandon = AbandonOnDrop(&gate);

        let joined = match limit {
            None => (&mut worker).await,
            Some(limit) => match tokio::time::timeout(limit, &mut worker).await {
                Ok(joined) => joined,
                Err(_) if gate.abandon() => {
                    warn!(
                        ops = count,
                        timeout = ?limit,
                        "ledger batch abandoned before commit"
                    );
                    return Err(Error::timed_out("commit", limit));
                }
                Err(_) => worker.await,
            },
        };

        let receipt = joined.map_err(|e| Error::Database(e.to_string()))??;
        debug!(ops = count, "ledger batch committed");
        Ok(receipt)
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))?
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn members(&self, filter: &MemberFilter) -> Result<Vec<Member>> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let mut query = league_members::table
                .select(MemberRow::as_select())
                .into_boxed();
            if let Some(id) = filter.id {
                query = query.filter(league_members::id.eq(id.value()));
            }
            if let Some(league_id) = filter.league_id {
                query = query.filter(league_members::league_id.eq(league_id.value()));
            }
            query
                .order(league_members::id.asc())
                .load::<MemberRow>(conn)?
                .into_iter()
                .map(member_from_row)
                .collect()
        })
        .await
    }

    async fn leagues(&self, filter: &LeagueFilter) -> Result<Vec<League>> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let mut query = leagues::table.select(LeagueRow::as_select()).into_boxed();
            if let Some(id) = filter.id {
                query = query.filter(leagues::id.eq(id.value()));
            }
            if let Some(status) = filter.status {
                query = query.filter(leagues::status.eq(status.as_str()));
            }
            query
                .order(leagues::id.asc())
                .load::<LeagueRow>(conn)?
                .into_iter()
                .map(league_from_row)
                .collect()
        })
        .await
    }

    async fn positions(&self, filter: &PositionFilter) -> Result<Vec<Position>> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let mut query = positions::table
                .select(PositionRow::as_select())
                .into_boxed();
            if let Some(id) = filter.id {
                query = query.filter(positions::id.eq(id.value()));
            }
            if let Some(member_id) = filter.member_id {
                query = query.filter(positions::league_member_id.eq(member_id.value()));
            }
            if let Some(market_id) = filter.market_id {
                query = query.filter(positions::market_id.eq(market_id.to_string()));
            }
            if let Some(outcome) = filter.outcome {
                query = query.filter(positions::outcome.eq(outcome.as_str()));
            }
            query
                .order(positions::id.asc())
                .load::<PositionRow>(conn)?
                .into_iter()
                .map(position_from_row)
                .collect()
        })
        .await
    }

    async fn trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let mut query = trades::table.select(TradeRow::as_select()).into_boxed();
            if let Some(member_id) = filter.member_id {
                query = query.filter(trades::league_member_id.eq(member_id.value()));
            }
            if let Some(market_id) = filter.market_id {
                query = query.filter(trades::market_id.eq(market_id.to_string()));
            }
            if !filter.kinds.is_empty() {
                let kinds: Vec<String> = filter
                    .kinds
                    .iter()
                    .map(|k| k.as_str().to_string())
                    .collect();
                query = query.filter(trades::trade_type.eq_any(kinds));
            }
            query
                .order(trades::id.asc())
                .load::<TradeRow>(conn)?
                .into_iter()
                .map(trade_from_row)
                .collect()
        })
        .await
    }

    async fn insert_league(&self, league: NewLeague) -> Result<League> {
        self.with_conn(move |conn| {
            let now = Utc::now();
            let row = NewLeagueRow {
                name: league.name.clone(),
                status: league.status.as_str().to_string(),
                starting_capital: league.starting_capital.to_string(),
                max_position_size: league.max_position_size.to_string(),
                created_at: now.to_rfc3339(),
            };
            let id = conn.immediate_transaction(|conn| {
                diesel::insert_into(leagues::table)
                    .values(&row)
                    .execute(conn)?;
                last_insert_rowid(conn)
            })?;
            Ok(League {
                id: LeagueId::new(id),
                name: league.name,
                status: league.status,
                starting_capital: league.starting_capital,
                max_position_size: league.max_position_size,
                created_at: now,
            })
        })
        .await
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member> {
        self.with_conn(move |conn| {
            let now = Utc::now();
            let row = NewMemberRow {
                league_id: member.league_id.value(),
                user_id: member.user_id.clone(),
                current_balance: member.starting_balance.to_string(),
                total_pnl: Decimal::ZERO.to_string(),
                total_trades: 0,
                win_rate: Decimal::ZERO.to_string(),
                joined_at: now.to_rfc3339(),
            };
            let id = conn.immediate_transaction(|conn| {
                let league_exists = leagues::table
                    .find(member.league_id.value())
                    .select(leagues::id)
                    .first::<i64>(conn)
                    .optional()?
                    .is_some();
                if !league_exists {
                    return Err(Error::not_found("league", member.league_id));
                }
                diesel::insert_into(league_members::table)
                    .values(&row)
                    .execute(conn)?;
                last_insert_rowid(conn)
            })?;
            Ok(Member {
                id: MemberId::new(id),
                league_id: member.league_id,
                user_id: member.user_id,
                current_balance: member.starting_balance,
                total_pnl: Decimal::ZERO,
                total_trades: 0,
                win_rate: Decimal::ZERO,
                rank: None,
                joined_at: now,
            })
        })
        .await
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<CommitReceipt> {
        self.commit_gated(batch, None).await
    }

    async fn commit_within(&self, batch: LedgerBatch, limit: Duration) -> Result<CommitReceipt> {
        self.commit_gated(batch, Some(limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn store_with_member() -> (SqliteLedgerStore, Member) {
        let store = SqliteLedgerStore::open(":memory:").unwrap();
        let league = store
            .insert_league(NewLeague::try_new("Test", dec!(1000), dec!(500)).unwrap())
            .await
            .unwrap();
        let member = store
            .insert_member(NewMember {
                league_id: league.id,
                user_id: "alice".into(),
                starting_balance: league.starting_capital,
            })
            .await
            .unwrap();
        (store, member)
    }

    fn new_position(member_id: MemberId, market: &str) -> NewPosition {
        NewPosition {
            member_id,
            market_id: MarketId::new(market),
            market_slug: Some("will-it-rain".into()),
            market_question: Some("Will it rain?".into()),
            outcome: Outcome::Yes,
            shares: dec!(100),
            entry_price: dec!(0.4),
        }
    }

    fn sell(member_id: MemberId, pnl: Option<Decimal>) -> NewTrade {
        NewTrade {
            member_id,
            market_id: MarketId::new("M1"),
            market_slug: None,
            market_question: None,
            kind: TradeKind::Sell,
            outcome: Outcome::Yes,
            shares: dec!(40),
            price: dec!(0.6),
            pnl,
        }
    }

    #[tokio::test]
    async fn league_and_member_round_trip() {
        let (store, member) = store_with_member().await;

        let loaded = store.member(member.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_balance, dec!(1000));
        assert_eq!(loaded.user_id, "alice");
        assert_eq!(loaded.rank, None);

        let league = store.league(member.league_id).await.unwrap().unwrap();
        assert_eq!(league.status, LeagueStatus::Active);
        assert_eq!(league.max_position_size, dec!(500));
    }

    #[tokio::test]
    async fn insert_member_requires_league() {
        let store = SqliteLedgerStore::open(":memory:").unwrap();
        let err = store
            .insert_member(NewMember {
                league_id: LeagueId::new(42),
                user_id: "bob".into(),
                starting_balance: dec!(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "league", .. }));
    }

    #[tokio::test]
    async fn commit_persists_positions_trades_and_member() {
        let (store, member) = store_with_member().await;

        let mut batch = LedgerBatch::new();
        batch
            .insert_position(new_position(member.id, "M1"))
            .insert_trade(sell(member.id, Some(dec!(8))))
            .update_member(
                member.id,
                MemberPatch {
                    current_balance: Some(dec!(984.123456789)),
                    total_trades: Some(2),
                    win_rate: Some(dec!(100)),
                    ..Default::default()
                },
            );
        let receipt = store.commit(batch).await.unwrap();
        assert_eq!(receipt.positions, vec![PositionId::new(1)]);
        assert_eq!(receipt.trades, vec![TradeId::new(1)]);

        let position = store.position(PositionId::new(1)).await.unwrap().unwrap();
        assert_eq!(position.current_price, dec!(0.4));
        assert_eq!(position.unrealized_pnl, Decimal::ZERO);
        assert_eq!(position.market_slug.as_deref(), Some("will-it-rain"));

        let trades = store
            .trades(&TradeFilter::closing_for(member.id))
            .await
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].total_value, dec!(24));
        assert_eq!(trades[0].pnl, Some(dec!(8)));

        let member = store.member(member.id).await.unwrap().unwrap();
        assert_eq!(member.current_balance, dec!(984.123456789));
        assert_eq!(member.total_trades, 2);
    }

    #[tokio::test]
    async fn failed_commit_rolls_back() {
        let (store, member) = store_with_member().await;

        let mut batch = LedgerBatch::new();
        batch
            .insert_trade(sell(member.id, None))
            .update_member(
                member.id,
                MemberPatch {
                    current_balance: Some(dec!(1)),
                    ..Default::default()
                },
            )
            .update_position(PositionId::new(7), PositionPatch::default());

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "position", .. }));

        assert!(store
            .trades(&TradeFilter::for_member(member.id))
            .await
            .unwrap()
            .is_empty());
        let member = store.member(member.id).await.unwrap().unwrap();
        assert_eq!(member.current_balance, dec!(1000));
    }

    #[test]
    fn abandoned_gate_refuses_commit() {
        let gate = CommitGate::default();
        assert!(gate.abandon());
        assert!(matches!(
            gate.begin_commit(),
            Err(Error::ExternalUnavailable(_))
        ));
    }

    #[test]
    fn committing_gate_cannot_be_abandoned() {
        let gate = CommitGate::default();
        gate.begin_commit().unwrap();
        assert!(!gate.abandon());
        {
            let _dropped = AbandonOnDrop(&gate);
        }
        assert_eq!(*gate.state.lock(), GateState::Committing);
    }

    #[tokio::test]
    async fn commit_within_generous_limit_applies() {
        let (store, member) = store_with_member().await;
        let mut batch = LedgerBatch::new();
        batch.insert_position(new_position(member.id, "M1"));
        let receipt = store
            .commit_within(batch, std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(receipt.positions.len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_position() {
        let (store, member) = store_with_member().await;
        let mut batch = LedgerBatch::new();
        batch.insert_position(new_position(member.id, "M1"));
        let id = store.commit(batch).await.unwrap().positions[0];

        let mut batch = LedgerBatch::new();
        batch.update_position(
            id,
            PositionPatch {
                current_price: Some(dec!(0.55)),
                unrealized_pnl: Some(dec!(15)),
                ..Default::default()
            },
        );
        store.commit(batch).await.unwrap();
        let position = store.position(id).await.unwrap().unwrap();
        assert_eq!(position.current_price, dec!(0.55));
        assert_eq!(position.unrealized_pnl, dec!(15));
        assert_eq!(position.shares, dec!(100));

        let mut batch = LedgerBatch::new();
        batch.delete_position(id);
        store.commit(batch).await.unwrap();
        assert!(store.position(id).await.unwrap().is_none());

        let mut batch = LedgerBatch::new();
        batch.delete_position(id);
        assert!(store.commit(batch).await.is_err());
    }

    #[tokio::test]
    async fn empty_member_patch_still_checks_existence() {
        let (store, member) = store_with_member().await;

        let mut batch = LedgerBatch::new();
        batch.update_member(member.id, MemberPatch::default());
        assert!(store.commit(batch).await.is_ok());

        let mut batch = LedgerBatch::new();
        batch.update_member(MemberId::new(999), MemberPatch::default());
        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "member", .. }));
    }

    #[tokio::test]
    async fn filters_scope_reads() {
        let (store, member) = store_with_member().await;
        let mut other = new_position(member.id, "M2");
        other.outcome = Outcome::No;
        let mut batch = LedgerBatch::new();
        batch
            .insert_position(new_position(member.id, "M1"))
            .insert_position(other)
            .insert_trade(NewTrade {
                kind: TradeKind::Buy,
                pnl: None,
                ..sell(member.id, None)
            });
        store.commit(batch).await.unwrap();

        let on_m2 = store
            .positions(&PositionFilter::on_market(MarketId::new("M2")))
            .await
            .unwrap();
        assert_eq!(on_m2.len(), 1);
        assert_eq!(on_m2[0].outcome, Outcome::No);

        let holding = store
            .positions(&PositionFilter::holding(
                member.id,
                MarketId::new("M1"),
                Outcome::No,
            ))
            .await
            .unwrap();
        assert!(holding.is_empty());

        assert!(store
            .trades(&TradeFilter::closing_for(member.id))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .trades(&TradeFilter::for_member(member.id))
                .await
                .unwrap()
                .len(),
            1
        );

        let active = store
            .leagues(&LeagueFilter::with_status(LeagueStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        let members = store
            .members(&MemberFilter::in_league(member.league_id))
            .await
            .unwrap();
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let url = path.to_string_lossy().to_string();

        let member_id = {
            let store = SqliteLedgerStore::open(&url).unwrap();
            let league = store
                .insert_league(NewLeague::try_new("Durable", dec!(250), dec!(50)).unwrap())
                .await
                .unwrap();
            store
                .insert_member(NewMember {
                    league_id: league.id,
                    user_id: "carol".into(),
                    starting_balance: league.starting_capital,
                })
                .await
                .unwrap()
                .id
        };

        let reopened = SqliteLedgerStore::open(&url).unwrap();
        let member = reopened.member(member_id).await.unwrap().unwrap();
        assert_eq!(member.current_balance, dec!(250));
    }
}
