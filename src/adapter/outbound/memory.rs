//! In-memory ledger store.
//!
//! Backs tests and dry runs. A commit applies the batch in place under the
//! write lock while recording the inverse of each step; a failing operation
//! replays that log backwards, so no partial state is left behind.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::{
    League, LeagueId, Member, MemberId, NewLeague, NewMember, Position, PositionId, Trade,
    TradeId,
};
use crate::error::{Error, Result};
use crate::port::{
    CommitReceipt, LeagueFilter, LedgerBatch, LedgerOp, LedgerStore, MemberFilter,
    PositionFilter, TradeFilter,
};

#[derive(Debug, Default)]
struct Tables {
    leagues: BTreeMap<LeagueId, League>,
    members: BTreeMap<MemberId, Member>,
    positions: BTreeMap<PositionId, Position>,
    trades: BTreeMap<TradeId, Trade>,
    last_league: i64,
    last_member: i64,
    last_position: i64,
    last_trade: i64,
}

/// Inverse of one applied operation.
#[derive(Debug)]
enum Undo {
    RemovePosition(PositionId),
    RestorePosition(Position),
    RemoveTrade(TradeId),
    RestoreMember(Member),
}

impl Tables {
    /// Apply `ops` in order. On failure every applied op is reverted, so the
    /// tables and id counters are exactly as they were before the call.
    fn apply(&mut self, ops: Vec<LedgerOp>, now: DateTime<Utc>) -> Result<CommitReceipt> {
        let (last_position, last_trade) = (self.last_position, self.last_trade);
        let mut undo = Vec::with_capacity(ops.len());

        match self.apply_logged(ops, now, &mut undo) {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                for step in undo.into_iter().rev() {
                    self.revert(step);
                }
                self.last_position = last_position;
                self.last_trade = last_trade;
                Err(e)
            }
        }
    }

    fn apply_logged(
        &mut self,
        ops: Vec<LedgerOp>,
        now: DateTime<Utc>,
        undo: &mut Vec<Undo>,
    ) -> Result<CommitReceipt> {
        let mut receipt = CommitReceipt::default();

        for op in ops {
            match op {
                LedgerOp::InsertPosition(new) => {
                    self.last_position += 1;
                    let id = PositionId::new(self.last_position);
                    self.positions.insert(id, new.into_position(id, now));
                    undo.push(Undo::RemovePosition(id));
                    receipt.positions.push(id);
                }
                LedgerOp::UpdatePosition { id, patch } => {
                    let position = self
                        .positions
                        .get_mut(&id)
                        .ok_or_else(|| Error::not_found("position", id))?;
                    undo.push(Undo::RestorePosition(position.clone()));
                    patch.apply_to(position, now);
                }
                LedgerOp::DeletePosition(id) => {
                    let removed = self
                        .positions
                        .remove(&id)
                        .ok_or_else(|| Error::not_found("position", id))?;
                    undo.push(Undo::RestorePosition(removed));
                }
                LedgerOp::InsertTrade(new) => {
                    let id = TradeId::new(self.last_trade + 1);
                    let trade = new.into_trade(id, now)?;
                    self.last_trade = id.value();
                    self.trades.insert(id, trade);
                    undo.push(Undo::RemoveTrade(id));
                    receipt.trades.push(id);
                }
                LedgerOp::UpdateMember { id, patch } => {
                    let member = self
                        .members
                        .get_mut(&id)
                        .ok_or_else(|| Error::not_found("member", id))?;
                    undo.push(Undo::RestoreMember(member.clone()));
                    patch.apply_to(member);
                }
            }
        }

        Ok(receipt)
    }

    fn revert(&mut self, step: Undo) {
        match step {
            Undo::RemovePosition(id) => {
                self.positions.remove(&id);
            }
            Undo::RestorePosition(position) => {
                self.positions.insert(position.id, position);
            }
            Undo::RemoveTrade(id) => {
                self.trades.remove(&id);
            }
            Undo::RestoreMember(member) => {
                self.members.insert(member.id, member);
            }
        }
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl MemoryLedgerStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open positions across all members.
    #[must_use]
    pub fn open_position_count(&self) -> usize {
        self.tables.read().positions.len()
    }

    /// Number of recorded trades across all members.
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.tables.read().trades.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn members(&self, filter: &MemberFilter) -> Result<Vec<Member>> {
        Ok(self
            .tables
            .read()
            .members
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }

    async fn leagues(&self, filter: &LeagueFilter) -> Result<Vec<League>> {
        Ok(self
            .tables
            .read()
            .leagues
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }

    async fn positions(&self, filter: &PositionFilter) -> Result<Vec<Position>> {
        Ok(self
            .tables
            .read()
            .positions
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>> {
        Ok(self
            .tables
            .read()
            .trades
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn insert_league(&self, league: NewLeague) -> Result<League> {
        let mut tables = self.tables.write();
        tables.last_league += 1;
        let league = League {
            id: LeagueId::new(tables.last_league),
            name: league.name,
            status: league.status,
            starting_capital: league.starting_capital,
            max_position_size: league.max_position_size,
            created_at: Utc::now(),
        };
        tables.leagues.insert(league.id, league.clone());
        Ok(league)
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member> {
        let mut tables = self.tables.write();
        if !tables.leagues.contains_key(&member.league_id) {
            return Err(Error::not_found("league", member.league_id));
        }
        tables.last_member += 1;
        let member = Member {
            id: MemberId::new(tables.last_member),
            league_id: member.league_id,
            user_id: member.user_id,
            current_balance: member.starting_balance,
            total_pnl: Decimal::ZERO,
            total_trades: 0,
            win_rate: Decimal::ZERO,
            rank: None,
            joined_at: Utc::now(),
        };
        tables.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<CommitReceipt> {
        self.tables.write().apply(batch.into_ops(), Utc::now())
    }
}
