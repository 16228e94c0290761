//! Settlement engine: closes positions on resolved markets.
//!
//! Settling a position pays it out, records a `settle` trade, updates the
//! member's totals and deletes the position in one batch. Because settled
//! positions are gone, re-running settlement on a market is a no-op, which is
//! what makes the sweep safe to repeat.

use std::collections::BTreeSet;
use std::iter;

use tracing::{debug, info, warn};

use crate::domain::{
    money, win_rate, MarketId, MemberId, MemberPatch, NewTrade, Outcome, PositionId, TradeKind,
};
use crate::error::{Error, Result};
use crate::port::{LedgerBatch, PositionFilter};

use super::context::LedgerContext;
use super::sweep::{self, MarketTally, SweepControl, SweepHandle, SweepKind, SweepReport};

/// What settlement found for one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSettlement {
    /// Not resolved yet; retried next sweep.
    Unresolved,
    Settled { winner: Outcome, tally: MarketTally },
}

/// Pays out positions on resolved markets.
#[derive(Clone)]
pub struct SettlementEngine {
    ctx: LedgerContext,
}

impl SettlementEngine {
    pub fn new(ctx: LedgerContext) -> Self {
        Self { ctx }
    }

    /// Start a settlement sweep in the background.
    #[must_use]
    pub fn spawn(&self) -> SweepHandle {
        let engine = self.clone();
        sweep::spawn(SweepKind::Settlement, move |control| async move {
            engine.run(&control).await
        })
    }

    /// Settle every resolved market that still has open positions.
    ///
    /// # Errors
    /// Fails only when the set of open positions cannot be read.
    pub async fn run(&self, control: &SweepControl) -> Result<SweepReport> {
        let positions = self
            .ctx
            .bounded(
                "load open positions",
                self.ctx.store().positions(&PositionFilter::all()),
            )
            .await?;
        let markets: BTreeSet<MarketId> = positions.into_iter().map(|p| p.market_id).collect();
        let mut report = SweepReport::default();

        for market_id in markets {
            if control.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.markets_seen += 1;

            match self.settle_market(&market_id).await {
                Ok(MarketSettlement::Unresolved) => {
                    debug!(market_id = %market_id, "market not resolved yet");
                    report.markets_unresolved += 1;
                }
                Ok(MarketSettlement::Settled { tally, .. }) => report.add(tally),
                Err(Error::Ambiguous { market_id, reason }) => {
                    warn!(
                        market_id = %market_id,
                        reason = %reason,
                        "ambiguous resolution, skipping"
                    );
                    report.markets_ambiguous += 1;
                }
                Err(e) => {
                    warn!(market_id = %market_id, error = %e, "skipping market settlement");
                    report.markets_unavailable += 1;
                }
            }
        }

        Ok(report)
    }

    /// Settle one market if it has resolved.
    ///
    /// # Errors
    /// - [`Error::Ambiguous`] when the market is resolved but no single
    ///   winning outcome can be determined
    /// - the quote or store error that prevented the market from being read
    pub async fn settle_market(&self, market_id: &MarketId) -> Result<MarketSettlement> {
        let quote = self.ctx.quote(market_id).await?;
        if !quote.is_resolved {
            return Ok(MarketSettlement::Unresolved);
        }
        let winner = quote.winner().ok_or_else(|| Error::Ambiguous {
            market_id: market_id.clone(),
            reason: match &quote.winning_outcome {
                Some(label) => format!("winning outcome '{label}' is not yes or no"),
                None => "no single winning outcome".into(),
            },
        })?;

        let positions = self
            .ctx
            .bounded(
                "load market positions",
                self.ctx
                    .store()
                    .positions(&PositionFilter::on_market(market_id.clone())),
            )
            .await?;

        let mut tally = MarketTally::default();
        for position in positions {
            match self
                .settle_position(position.id, position.member_id, winner)
                .await
            {
                Ok(true) => tally.updated += 1,
                Ok(false) => tally.skipped += 1,
                Err(e) => {
                    warn!(
                        position_id = %position.id,
                        market_id = %market_id,
                        error = %e,
                        "position settlement failed, will retry next sweep"
                    );
                    tally.failed += 1;
                }
            }
        }

        Ok(MarketSettlement::Settled { winner, tally })
    }

    /// Returns false when the position was closed before the lock was taken.
    async fn settle_position(
        &self,
        position_id: PositionId,
        member_id: MemberId,
        winner: Outcome,
    ) -> Result<bool> {
        let _guard = self.ctx.lock_member(member_id).await;

        let Some(position) = self
            .ctx
            .bounded("load position", self.ctx.store().position(position_id))
            .await?
        else {
            return Ok(false);
        };
        let member = self
            .ctx
            .bounded("load member", self.ctx.store().member(member_id))
            .await?
            .ok_or_else(|| Error::not_found("member", member_id))?;

        let amounts = position.settle_against(winner)?;
        let new_balance = money::add(member.current_balance, amounts.total_payout)?;
        let total_pnl = money::add(member.total_pnl, amounts.final_pnl)?;
        let closing = self.ctx.closing_pnls(member_id).await?;

        let mut batch = LedgerBatch::new();
        batch
            .insert_trade(NewTrade {
                member_id,
                market_id: position.market_id.clone(),
                market_slug: position.market_slug.clone(),
                market_question: position.market_question.clone(),
                kind: TradeKind::Settle,
                outcome: position.outcome,
                shares: position.shares,
                price: amounts.payout_per_share,
                pnl: Some(amounts.final_pnl),
            })
            .update_member(
                member_id,
                MemberPatch {
                    current_balance: Some(new_balance),
                    total_pnl: Some(total_pnl),
                    total_trades: Some(member.total_trades + 1),
                    win_rate: Some(win_rate(
                        closing.into_iter().chain(iter::once(Some(amounts.final_pnl))),
                    )),
                    ..Default::default()
                },
            )
            .delete_position(position.id);
        self.ctx.commit(batch).await?;

        info!(
            member_id = %member_id,
            position_id = %position.id,
            market_id = %position.market_id,
            winner = %winner,
            payout = %amounts.total_payout,
            pnl = %amounts.final_pnl,
            "position settled"
        );
        Ok(true)
    }
}
