//! Caller-facing ledger operations.
//!
//! [`Ledger`] is the single entry point used by the CLI and scheduler. Trade
//! submission and ranking complete before returning; revaluation and
//! settlement return a [`SweepHandle`] as soon as the work has started.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::domain::{
    League, LeagueId, LeagueStatus, Member, MemberId, NewLeague, NewMember, Position, Trade,
    TradeRequest,
};
use crate::error::{Error, Result};
use crate::port::{PositionFilter, TradeFilter};

use super::context::LedgerContext;
use super::position::{PositionEngine, PositionPolicy, TradeReceipt};
use super::ranking::RankingEngine;
use super::revaluation::RevaluationEngine;
use super::settlement::SettlementEngine;
use super::sweep::SweepHandle;

/// A member with its open positions and trade history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberStatement {
    pub member: Member,
    pub positions: Vec<Position>,
    pub trades: Vec<Trade>,
}

impl MemberStatement {
    /// Unrealized pnl summed over open positions, saturating at the decimal
    /// range.
    #[must_use]
    pub fn unrealized_pnl(&self) -> Decimal {
        self.positions
            .iter()
            .map(|p| p.unrealized_pnl)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

/// The ledger engines behind one shared context.
#[derive(Clone)]
pub struct Ledger {
    ctx: LedgerContext,
    positions: PositionEngine,
    revaluation: RevaluationEngine,
    settlement: SettlementEngine,
    ranking: RankingEngine,
}

impl Ledger {
    pub fn new(ctx: LedgerContext, policy: PositionPolicy) -> Self {
        Self {
            positions: PositionEngine::new(ctx.clone(), policy),
            revaluation: RevaluationEngine::new(ctx.clone()),
            settlement: SettlementEngine::new(ctx.clone()),
            ranking: RankingEngine::new(ctx.clone()),
            ctx,
        }
    }

    #[must_use]
    pub fn context(&self) -> &LedgerContext {
        &self.ctx
    }

    #[must_use]
    pub fn revaluation(&self) -> &RevaluationEngine {
        &self.revaluation
    }

    #[must_use]
    pub fn settlement(&self) -> &SettlementEngine {
        &self.settlement
    }

    /// Apply a buy or sell for a member.
    ///
    /// # Errors
    /// See [`PositionEngine::apply_trade`].
    pub async fn submit_trade(&self, request: TradeRequest) -> Result<TradeReceipt> {
        self.positions.apply_trade(request).await
    }

    /// Start a background revaluation of every open position.
    #[must_use]
    pub fn trigger_revaluation(&self) -> SweepHandle {
        self.revaluation.spawn()
    }

    /// Start a background settlement of every resolved market.
    #[must_use]
    pub fn trigger_settlement(&self) -> SweepHandle {
        self.settlement.spawn()
    }

    /// Recompute ranks for one league, or for every active league.
    ///
    /// # Errors
    /// See [`RankingEngine::recompute`] and [`RankingEngine::recompute_active`].
    pub async fn recompute_ranks(&self, league_id: Option<LeagueId>) -> Result<usize> {
        match league_id {
            Some(id) => self.ranking.recompute(id).await,
            None => self.ranking.recompute_active().await,
        }
    }

    /// Create an active league.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] for a blank name or non-positive capital.
    pub async fn create_league(
        &self,
        name: &str,
        starting_capital: Decimal,
        max_position_size: Decimal,
    ) -> Result<League> {
        let league = NewLeague::try_new(name.trim(), starting_capital, max_position_size)?;
        let league = self
            .ctx
            .bounded("create league", self.ctx.store().insert_league(league))
            .await?;
        info!(league_id = %league.id, name = %league.name, "league created");
        Ok(league)
    }

    /// Enroll a user in a league with the league's starting capital.
    ///
    /// # Errors
    /// - [`Error::NotFound`] for an unknown league
    /// - [`Error::InvalidInput`] for a blank user id or a completed league
    pub async fn enroll_member(&self, league_id: LeagueId, user_id: &str) -> Result<Member> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".into()));
        }
        if !league_id.is_valid() {
            return Err(Error::InvalidInput(format!("invalid league id {league_id}")));
        }

        let league = self
            .ctx
            .bounded("load league", self.ctx.store().league(league_id))
            .await?
            .ok_or_else(|| Error::not_found("league", league_id))?;
        if league.status == LeagueStatus::Completed {
            return Err(Error::InvalidInput(format!(
                "league {league_id} is completed"
            )));
        }

        let member = self
            .ctx
            .bounded(
                "enroll member",
                self.ctx.store().insert_member(NewMember {
                    league_id,
                    user_id: user_id.to_string(),
                    starting_balance: league.starting_capital,
                }),
            )
            .await?;
        info!(
            member_id = %member.id,
            league_id = %league_id,
            balance = %member.current_balance,
            "member enrolled"
        );
        Ok(member)
    }

    /// Load a member with its open positions and trades.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] for an unknown member.
    pub async fn member_statement(&self, member_id: MemberId) -> Result<MemberStatement> {
        if !member_id.is_valid() {
            return Err(Error::InvalidInput(format!("invalid member id {member_id}")));
        }
        let store = self.ctx.store();
        let member = self
            .ctx
            .bounded("load member", store.member(member_id))
            .await?
            .ok_or_else(|| Error::not_found("member", member_id))?;
        let positions = self
            .ctx
            .bounded(
                "load positions",
                store.positions(&PositionFilter::for_member(member_id)),
            )
            .await?;
        let trades = self
            .ctx
            .bounded("load trades", store.trades(&TradeFilter::for_member(member_id)))
            .await?;

        Ok(MemberStatement {
            member,
            positions,
            trades,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Outcome, TradeKind, TradeSide};
    use crate::port::{LedgerBatch, LedgerStore};
    use crate::testkit::LedgerFixture;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn enroll_uses_league_capital() {
        let fx = LedgerFixture::new().await;
        let ledger = fx.ledger(PositionPolicy::default());
        let league = ledger
            .create_league("  Spring Cup ", dec!(250), dec!(50))
            .await
            .unwrap();
        assert_eq!(league.name, "Spring Cup");

        let member = ledger.enroll_member(league.id, "alice").await.unwrap();
        assert_eq!(member.current_balance, dec!(250));
        assert_eq!(member.total_trades, 0);
        assert_eq!(member.rank, None);
    }

    #[tokio::test]
    async fn enroll_rejects_unknown_completed_and_blank() {
        let fx = LedgerFixture::new().await;
        let ledger = fx.ledger(PositionPolicy::default());

        assert!(matches!(
            ledger.enroll_member(LeagueId::new(42), "bob").await,
            Err(Error::NotFound { entity: "league", .. })
        ));
        assert!(matches!(
            ledger.enroll_member(fx.league.id, "   ").await,
            Err(Error::InvalidInput(_))
        ));

        let done = fx
            .store
            .insert_league(
                NewLeague::try_new("Done", dec!(100), dec!(10))
                    .unwrap()
                    .with_status(LeagueStatus::Completed),
            )
            .await
            .unwrap();
        assert!(matches!(
            ledger.enroll_member(done.id, "bob").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn create_league_validates() {
        let fx = LedgerFixture::new().await;
        let ledger = fx.ledger(PositionPolicy::default());
        assert!(matches!(
            ledger.create_league("", dec!(100), dec!(10)).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.create_league("Broke", dec!(0), dec!(10)).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn statement_collects_positions_and_trades() {
        let fx = LedgerFixture::new().await;
        let ledger = fx.ledger(PositionPolicy::default());
        let member = fx.member(dec!(1000)).await;

        ledger
            .submit_trade(TradeRequest::new(
                member.id,
                "M1",
                Outcome::Yes,
                TradeSide::Buy,
                dec!(100),
                dec!(0.40),
            ))
            .await
            .unwrap();
        let mut batch = LedgerBatch::new();
        let position = fx.store.positions(&PositionFilter::all()).await.unwrap()[0].clone();
        batch.update_position(position.id, position.revalued_at(dec!(0.50)).unwrap());
        fx.store.commit(batch).await.unwrap();

        let statement = ledger.member_statement(member.id).await.unwrap();
        assert_eq!(statement.member.current_balance, dec!(960));
        assert_eq!(statement.positions.len(), 1);
        assert_eq!(statement.trades.len(), 1);
        assert_eq!(statement.trades[0].kind, TradeKind::Buy);
        assert_eq!(statement.unrealized_pnl(), dec!(10));

        assert!(matches!(
            ledger.member_statement(MemberId::new(77)).await,
            Err(Error::NotFound { entity: "member", .. })
        ));
    }

    #[tokio::test]
    async fn ranks_one_or_all_leagues() {
        let fx = LedgerFixture::new().await;
        let ledger = fx.ledger(PositionPolicy::default());
        fx.member(dec!(1000)).await;
        fx.member(dec!(1000)).await;

        assert_eq!(ledger.recompute_ranks(Some(fx.league.id)).await.unwrap(), 2);
        let other = ledger.create_league("Other", dec!(10), dec!(1)).await.unwrap();
        ledger.enroll_member(other.id, "carol").await.unwrap();
        assert_eq!(ledger.recompute_ranks(None).await.unwrap(), 3);
    }
}
