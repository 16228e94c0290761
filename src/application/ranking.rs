//! Ranking engine: dense league ranks by realized pnl.

use std::cmp::Reverse;

use tracing::{info, warn};

use crate::domain::{LeagueId, LeagueStatus, MemberPatch};
use crate::error::{Error, Result};
use crate::port::{LeagueFilter, LedgerBatch, MemberFilter};

use super::context::LedgerContext;

/// Assigns ranks 1..N within a league.
///
/// Members are ordered by `total_pnl` descending with ties broken by member
/// id, so repeated runs over unchanged data never reorder anyone. Only the
/// rank field is written, and only for members whose rank changed.
#[derive(Clone)]
pub struct RankingEngine {
    ctx: LedgerContext,
}

impl RankingEngine {
    pub fn new(ctx: LedgerContext) -> Self {
        Self { ctx }
    }

    /// Rank one league. Returns the number of members ranked.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] for an unknown league, or the store error
    /// that prevented the ranks from being written.
    pub async fn recompute(&self, league_id: LeagueId) -> Result<usize> {
        if !league_id.is_valid() {
            return Err(Error::InvalidInput(format!("invalid league id {league_id}")));
        }
        self.ctx
            .bounded("load league", self.ctx.store().league(league_id))
            .await?
            .ok_or_else(|| Error::not_found("league", league_id))?;

        let mut members = self
            .ctx
            .bounded(
                "load league members",
                self.ctx.store().members(&MemberFilter::in_league(league_id)),
            )
            .await?;
        members.sort_by_key(|m| (Reverse(m.total_pnl), m.id));

        let mut batch = LedgerBatch::new();
        for (index, member) in members.iter().enumerate() {
            let rank = u32::try_from(index + 1)
                .map_err(|_| Error::InvalidInput(format!("league {league_id} too large to rank")))?;
            if member.rank != Some(rank) {
                batch.update_member(member.id, MemberPatch::rank(rank));
            }
        }

        let changed = batch.len();
        if !batch.is_empty() {
            self.ctx.commit(batch).await?;
        }

        info!(
            league_id = %league_id,
            ranked = members.len(),
            changed,
            "league ranks recomputed"
        );
        Ok(members.len())
    }

    /// Rank every active league. A failing league is logged and skipped.
    ///
    /// # Errors
    /// Fails only when the list of leagues cannot be read.
    pub async fn recompute_active(&self) -> Result<usize> {
        let leagues = self
            .ctx
            .bounded(
                "load active leagues",
                self.ctx
                    .store()
                    .leagues(&LeagueFilter::with_status(LeagueStatus::Active)),
            )
            .await?;

        let mut ranked = 0;
        for league in leagues {
            match self.recompute(league.id).await {
                Ok(count) => ranked += count,
                Err(e) => warn!(league_id = %league.id, error = %e, "league ranking failed"),
            }
        }
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::LedgerStore;
    use crate::testkit::LedgerFixture;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn ranks_by_pnl_with_stable_ties() {
        let fx = LedgerFixture::new().await;
        let a = fx.member(dec!(1000)).await;
        let b = fx.member(dec!(1000)).await;
        let c = fx.member(dec!(1000)).await;
        for (id, pnl) in [(a.id, dec!(-10)), (b.id, dec!(50)), (c.id, dec!(-10))] {
            let mut batch = LedgerBatch::new();
            batch.update_member(
                id,
                MemberPatch {
                    total_pnl: Some(pnl),
                    ..Default::default()
                },
            );
            fx.store.commit(batch).await.unwrap();
        }

        let engine = RankingEngine::new(fx.context());
        assert_eq!(engine.recompute(fx.league.id).await.unwrap(), 3);

        let rank = |id| {
            let store = fx.store.clone();
            async move { store.member(id).await.unwrap().unwrap().rank }
        };
        assert_eq!(rank(b.id).await, Some(1));
        assert_eq!(rank(a.id).await, Some(2));
        assert_eq!(rank(c.id).await, Some(3));

        assert_eq!(engine.recompute(fx.league.id).await.unwrap(), 3);
        assert_eq!(rank(a.id).await, Some(2));
        assert_eq!(rank(c.id).await, Some(3));
    }

    #[tokio::test]
    async fn unknown_league_is_not_found() {
        let fx = LedgerFixture::new().await;
        let engine = RankingEngine::new(fx.context());
        assert!(matches!(
            engine.recompute(LeagueId::new(99)).await,
            Err(Error::NotFound { entity: "league", .. })
        ));
        assert!(matches!(
            engine.recompute(LeagueId::new(0)).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
