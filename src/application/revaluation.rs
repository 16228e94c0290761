//! Revaluation engine: marks open positions at current quotes.
//!
//! Balances and realized pnl are never touched here. Each market is quoted
//! once per sweep; a market whose quote fails is skipped whole and picked up
//! again next sweep.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::domain::{MarketId, MarketQuote, MemberId, PositionId};
use crate::error::Result;
use crate::port::{LedgerBatch, PositionFilter};

use super::context::LedgerContext;
use super::sweep::{self, MarketTally, SweepControl, SweepHandle, SweepKind, SweepReport};

/// Recomputes unrealized pnl from live prices.
#[derive(Clone)]
pub struct RevaluationEngine {
    ctx: LedgerContext,
}

impl RevaluationEngine {
    pub fn new(ctx: LedgerContext) -> Self {
        Self { ctx }
    }

    /// Start a revaluation sweep in the background.
    #[must_use]
    pub fn spawn(&self) -> SweepHandle {
        let engine = self.clone();
        sweep::spawn(SweepKind::Revaluation, move |control| async move {
            engine.run(&control).await
        })
    }

    /// Revalue every open position, market by market.
    ///
    /// # Errors
    /// Fails only when the set of open positions cannot be read. Per-market
    /// and per-position failures are counted in the report instead.
    pub async fn run(&self, control: &SweepControl) -> Result<SweepReport> {
        let markets = self.open_markets().await?;
        let mut report = SweepReport::default();

        for market_id in markets {
            if control.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.markets_seen += 1;

            match self.revalue_market(&market_id).await {
                Ok(tally) => report.add(tally),
                Err(e) => {
                    warn!(market_id = %market_id, error = %e, "skipping market revaluation");
                    report.markets_unavailable += 1;
                }
            }
        }

        Ok(report)
    }

    /// Quote one market and mark all of its open positions.
    ///
    /// # Errors
    /// Returns the quote or store error that prevented the market from being
    /// processed; no position on the market is touched in that case.
    pub async fn revalue_market(&self, market_id: &MarketId) -> Result<MarketTally> {
        let positions = self
            .ctx
            .bounded(
                "load market positions",
                self.ctx
                    .store()
                    .positions(&PositionFilter::on_market(market_id.clone())),
            )
            .await?;
        if positions.is_empty() {
            return Ok(MarketTally::default());
        }

        let quote = self.ctx.quote(market_id).await?;
        let mut tally = MarketTally::default();

        for position in positions {
            match self.revalue_position(position.id, position.member_id, &quote).await {
                Ok(true) => tally.updated += 1,
                Ok(false) => tally.skipped += 1,
                Err(e) => {
                    warn!(
                        position_id = %position.id,
                        market_id = %market_id,
                        error = %e,
                        "position revaluation failed"
                    );
                    tally.failed += 1;
                }
            }
        }

        debug!(
            market_id = %market_id,
            yes_price = %quote.yes_price,
            no_price = %quote.no_price,
            updated = tally.updated,
            "market revalued"
        );
        Ok(tally)
    }

    /// Returns false when the position was closed before the lock was taken.
    async fn revalue_position(
        &self,
        position_id: PositionId,
        member_id: MemberId,
        quote: &MarketQuote,
    ) -> Result<bool> {
        let _guard = self.ctx.lock_member(member_id).await;

        let Some(position) = self
            .ctx
            .bounded("load position", self.ctx.store().position(position_id))
            .await?
        else {
            return Ok(false);
        };

        let mut batch = LedgerBatch::new();
        batch.update_position(
            position.id,
            position.revalued_at(quote.price_for(position.outcome))?,
        );
        self.ctx.commit(batch).await?;
        Ok(true)
    }

    async fn open_markets(&self) -> Result<BTreeSet<MarketId>> {
        let positions = self
            .ctx
            .bounded(
                "load open positions",
                self.ctx.store().positions(&PositionFilter::all()),
            )
            .await?;
        Ok(positions.into_iter().map(|p| p.market_id).collect())
    }
}
