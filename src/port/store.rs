//! Ledger store port.
//!
//! Reads are scoped by typed filters. All balance-affecting writes go through
//! [`LedgerStore::commit`], which applies a [`LedgerBatch`] atomically: either
//! every operation in the batch is applied or none is.
//!
//! # Implementation Notes
//!
//! - Implementations must be thread-safe (`Send + Sync`)
//! - Read results are ordered by ascending id (creation order)
//! - Updates and deletes that target a missing row fail the whole batch
//!   with [`Error::NotFound`]
//! - A commit that reports a timeout leaves no trace, not even later

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    League, LeagueId, LeagueStatus, MarketId, Member, MemberId, MemberPatch, NewLeague,
    NewMember, NewPosition, NewTrade, Outcome, Position, PositionId, PositionPatch, Trade,
    TradeId, TradeKind,
};
use crate::error::{Error, Result};

/// Member selection. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberFilter {
    pub id: Option<MemberId>,
    pub league_id: Option<LeagueId>,
}

impl MemberFilter {
    #[must_use]
    pub fn by_id(id: MemberId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn in_league(league_id: LeagueId) -> Self {
        Self {
            league_id: Some(league_id),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn matches(&self, member: &Member) -> bool {
        self.id.map_or(true, |id| member.id == id)
            && self.league_id.map_or(true, |id| member.league_id == id)
    }
}

/// League selection. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueFilter {
    pub id: Option<LeagueId>,
    pub status: Option<LeagueStatus>,
}

impl LeagueFilter {
    #[must_use]
    pub fn by_id(id: LeagueId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_status(status: LeagueStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn matches(&self, league: &League) -> bool {
        self.id.map_or(true, |id| league.id == id)
            && self.status.map_or(true, |status| league.status == status)
    }
}

/// Position selection. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionFilter {
    pub id: Option<PositionId>,
    pub member_id: Option<MemberId>,
    pub market_id: Option<MarketId>,
    pub outcome: Option<Outcome>,
}

impl PositionFilter {
    /// Every open position.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn by_id(id: PositionId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn for_member(member_id: MemberId) -> Self {
        Self {
            member_id: Some(member_id),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn on_market(market_id: MarketId) -> Self {
        Self {
            market_id: Some(market_id),
            ..Default::default()
        }
    }

    /// The (member, market, outcome) triple a position is keyed by.
    #[must_use]
    pub fn holding(member_id: MemberId, market_id: MarketId, outcome: Outcome) -> Self {
        Self {
            id: None,
            member_id: Some(member_id),
            market_id: Some(market_id),
            outcome: Some(outcome),
        }
    }

    #[must_use]
    pub fn matches(&self, position: &Position) -> bool {
        self.id.map_or(true, |id| position.id == id)
            && self.member_id.map_or(true, |id| position.member_id == id)
            && self
                .market_id
                .as_ref()
                .map_or(true, |id| &position.market_id == id)
            && self.outcome.map_or(true, |o| position.outcome == o)
    }
}

/// Trade selection. An empty `kinds` list matches every kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeFilter {
    pub member_id: Option<MemberId>,
    pub market_id: Option<MarketId>,
    pub kinds: Vec<TradeKind>,
}

impl TradeFilter {
    #[must_use]
    pub fn for_member(member_id: MemberId) -> Self {
        Self {
            member_id: Some(member_id),
            ..Default::default()
        }
    }

    /// A member's sells and settlements.
    #[must_use]
    pub fn closing_for(member_id: MemberId) -> Self {
        Self {
            member_id: Some(member_id),
            market_id: None,
            kinds: vec![TradeKind::Sell, TradeKind::Settle],
        }
    }

    #[must_use]
    pub fn matches(&self, trade: &Trade) -> bool {
        self.member_id.map_or(true, |id| trade.member_id == id)
            && self
                .market_id
                .as_ref()
                .map_or(true, |id| &trade.market_id == id)
            && (self.kinds.is_empty() || self.kinds.contains(&trade.kind))
    }
}

/// One write inside a [`LedgerBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOp {
    InsertPosition(NewPosition),
    UpdatePosition { id: PositionId, patch: PositionPatch },
    DeletePosition(PositionId),
    InsertTrade(NewTrade),
    UpdateMember { id: MemberId, patch: MemberPatch },
}

/// Ordered set of writes committed as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerBatch {
    ops: Vec<LedgerOp>,
}

impl LedgerBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_position(&mut self, position: NewPosition) -> &mut Self {
        self.ops.push(LedgerOp::InsertPosition(position));
        self
    }

    pub fn update_position(&mut self, id: PositionId, patch: PositionPatch) -> &mut Self {
        self.ops.push(LedgerOp::UpdatePosition { id, patch });
        self
    }

    pub fn delete_position(&mut self, id: PositionId) -> &mut Self {
        self.ops.push(LedgerOp::DeletePosition(id));
        self
    }

    pub fn insert_trade(&mut self, trade: NewTrade) -> &mut Self {
        self.ops.push(LedgerOp::InsertTrade(trade));
        self
    }

    pub fn update_member(&mut self, id: MemberId, patch: MemberPatch) -> &mut Self {
        self.ops.push(LedgerOp::UpdateMember { id, patch });
        self
    }

    #[must_use]
    pub fn ops(&self) -> &[LedgerOp] {
        &self.ops
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<LedgerOp> {
        self.ops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Identifiers assigned while committing a batch, in operation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub positions: Vec<PositionId>,
    pub trades: Vec<TradeId>,
}

/// Durable storage for members, leagues, positions and trades.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn members(&self, filter: &MemberFilter) -> Result<Vec<Member>>;

    async fn leagues(&self, filter: &LeagueFilter) -> Result<Vec<League>>;

    async fn positions(&self, filter: &PositionFilter) -> Result<Vec<Position>>;

    async fn trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>>;

    async fn insert_league(&self, league: NewLeague) -> Result<League>;

    async fn insert_member(&self, member: NewMember) -> Result<Member>;

    /// Apply every operation in `batch` or none of them.
    async fn commit(&self, batch: LedgerBatch) -> Result<CommitReceipt>;

    /// Like [`commit`](Self::commit), but give up once `limit` elapses.
    ///
    /// A batch that gives up with [`Error::ExternalUnavailable`] must never be
    /// applied later. The default drops the pending commit future, which is
    /// enough for stores that do their work while being polled. Stores that
    /// hand work to another thread override this.
    async fn commit_within(&self, batch: LedgerBatch, limit: Duration) -> Result<CommitReceipt> {
        match tokio::time::timeout(limit, self.commit(batch)).await {
            Ok(result) => result,
            Err(_) => Err(Error::timed_out("commit", limit)),
        }
    }

    /// Get a member by ID.
    async fn member(&self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.members(&MemberFilter::by_id(id)).await?.into_iter().next())
    }

    /// Get a league by ID.
    async fn league(&self, id: LeagueId) -> Result<Option<League>> {
        Ok(self.leagues(&LeagueFilter::by_id(id)).await?.into_iter().next())
    }

    /// Get an open position by ID.
    async fn position(&self, id: PositionId) -> Result<Option<Position>> {
        Ok(self
            .positions(&PositionFilter::by_id(id))
            .await?
            .into_iter()
            .next())
    }
}
