//! Position engine: applies one buy or sell to a member's ledger.
//!
//! The whole read-compute-commit cycle runs under the member's lock and ends
//! in a single [`LedgerBatch`], so a trade either lands completely (position,
//! balance and audit record) or not at all.

use std::iter;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{
    money, win_rate, Amount, Member, MemberPatch, NewPosition, NewTrade, Position, PositionId,
    TradeId, TradeRequest, TradeSide,
};
use crate::error::{Error, Result};
use crate::port::{LedgerBatch, PositionFilter};

use super::context::LedgerContext;

/// How a buy treats an existing position on the same market and outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionPolicy {
    /// Merge into the most recent open position at a weighted entry price.
    #[default]
    AverageCost,
    /// Open an independent position for every buy.
    Separate,
}

/// What a trade did to the member's positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "position_id", rename_all = "snake_case")]
pub enum PositionChange {
    Opened(PositionId),
    Increased(PositionId),
    Reduced(PositionId),
    Closed(PositionId),
    /// A sell with no open position behind it.
    Unbacked,
}

/// Result of a committed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReceipt {
    pub trade_id: TradeId,
    pub position: PositionChange,
    pub new_balance: Amount,
    /// Realized pnl; `None` for buys and unbacked sells.
    pub pnl: Option<Amount>,
}

struct Plan {
    batch: LedgerBatch,
    /// `None` when the batch opens a new position.
    change: Option<PositionChange>,
    new_balance: Amount,
    pnl: Option<Amount>,
}

/// Applies member trades.
#[derive(Clone)]
pub struct PositionEngine {
    ctx: LedgerContext,
    policy: PositionPolicy,
}

impl PositionEngine {
    pub fn new(ctx: LedgerContext, policy: PositionPolicy) -> Self {
        Self { ctx, policy }
    }

    #[must_use]
    pub fn policy(&self) -> PositionPolicy {
        self.policy
    }

    /// Apply a buy or sell at the requested price.
    ///
    /// # Errors
    /// - [`Error::InvalidInput`] for non-positive shares or price and
    ///   malformed identifiers
    /// - [`Error::NotFound`] when the member does not exist
    /// - [`Error::InsufficientBalance`] when a buy costs more than the balance
    /// - [`Error::ExternalUnavailable`] or a store error when the ledger cannot
    ///   be read or written; nothing is applied in that case
    pub async fn apply_trade(&self, request: TradeRequest) -> Result<TradeReceipt> {
        request.validate()?;

        let _guard = self.ctx.lock_member(request.member_id).await;

        let member = self
            .ctx
            .bounded("load member", self.ctx.store().member(request.member_id))
            .await?
            .ok_or_else(|| Error::not_found("member", request.member_id))?;

        let plan = match request.side {
            TradeSide::Buy => self.plan_buy(&member, &request).await?,
            TradeSide::Sell => self.plan_sell(&member, &request).await?,
        };

        let receipt = self.ctx.commit(plan.batch).await?;
        let trade_id = receipt
            .trades
            .first()
            .copied()
            .ok_or_else(|| Error::Database("commit returned no trade id".into()))?;
        let change = match plan.change {
            Some(change) => change,
            None => PositionChange::Opened(
                receipt
                    .positions
                    .first()
                    .copied()
                    .ok_or_else(|| Error::Database("commit returned no position id".into()))?,
            ),
        };

        info!(
            member_id = %member.id,
            market_id = %request.market_id,
            outcome = %request.outcome,
            side = ?request.side,
            shares = %request.shares,
            price = %request.price,
            balance = %plan.new_balance,
            pnl = ?plan.pnl,
            "trade committed"
        );

        Ok(TradeReceipt {
            trade_id,
            position: change,
            new_balance: plan.new_balance,
            pnl: plan.pnl,
        })
    }

    async fn plan_buy(&self, member: &Member, request: &TradeRequest) -> Result<Plan> {
        let cost = request.total_value()?;
        if cost > member.current_balance {
            return Err(Error::InsufficientBalance {
                required: cost,
                available: member.current_balance,
            });
        }

        let mut batch = LedgerBatch::new();
        let existing = match self.policy {
            PositionPolicy::AverageCost => self.most_recent_position(request).await?,
            PositionPolicy::Separate => None,
        };

        let change = match existing {
            Some(position) => {
                debug!(position_id = %position.id, "averaging into open position");
                batch.update_position(
                    position.id,
                    position.averaged_with(request.shares, request.price)?,
                );
                Some(PositionChange::Increased(position.id))
            }
            None => {
                batch.insert_position(NewPosition {
                    member_id: request.member_id,
                    market_id: request.market_id.clone(),
                    market_slug: request.market_slug.clone(),
                    market_question: request.market_question.clone(),
                    outcome: request.outcome,
                    shares: request.shares,
                    entry_price: request.price,
                });
                None
            }
        };

        let new_balance = money::sub(member.current_balance, cost)?;
        let closing = self.ctx.closing_pnls(member.id).await?;
        batch
            .insert_trade(NewTrade::for_request(request, None))
            .update_member(
                member.id,
                MemberPatch {
                    current_balance: Some(new_balance),
                    total_trades: Some(member.total_trades + 1),
                    win_rate: Some(win_rate(closing)),
                    ..Default::default()
                },
            );

        Ok(Plan {
            batch,
            change,
            new_balance,
            pnl: None,
        })
    }

    async fn plan_sell(&self, member: &Member, request: &TradeRequest) -> Result<Plan> {
        let mut batch = LedgerBatch::new();

        let (change, pnl) = match self.most_recent_position(request).await? {
            Some(position) => {
                let pnl = position.sell_pnl(request.price, request.shares)?;
                let change = if position.is_closed_by(request.shares) {
                    batch.delete_position(position.id);
                    PositionChange::Closed(position.id)
                } else {
                    batch.update_position(position.id, position.reduced_by(request.shares)?);
                    PositionChange::Reduced(position.id)
                };
                (change, Some(pnl))
            }
            None => {
                debug!(
                    member_id = %member.id,
                    market_id = %request.market_id,
                    "sell without open position, crediting balance only"
                );
                (PositionChange::Unbacked, None)
            }
        };

        let new_balance = money::add(member.current_balance, request.total_value()?)?;
        let total_pnl = money::add(member.total_pnl, pnl.unwrap_or(Decimal::ZERO))?;
        let closing = self.ctx.closing_pnls(member.id).await?;
        batch
            .insert_trade(NewTrade::for_request(request, pnl))
            .update_member(
                member.id,
                MemberPatch {
                    current_balance: Some(new_balance),
                    total_pnl: Some(total_pnl),
                    total_trades: Some(member.total_trades + 1),
                    win_rate: Some(win_rate(closing.into_iter().chain(iter::once(pnl)))),
                    ..Default::default()
                },
            );

        Ok(Plan {
            batch,
            change: Some(change),
            new_balance,
            pnl,
        })
    }

    /// Highest-id open position for the request's member, market and outcome.
    async fn most_recent_position(
        &self,
        request: &TradeRequest,
    ) -> Result<Option<Position>> {
        let filter = PositionFilter::holding(
            request.member_id,
            request.market_id.clone(),
            request.outcome,
        );
        let positions = self
            .ctx
            .bounded("load positions", self.ctx.store().positions(&filter))
            .await?;
        Ok(positions.into_iter().max_by_key(|p| p.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketId, MemberId, Outcome};
    use crate::port::LedgerStore;
    use crate::testkit::LedgerFixture;
    use rust_decimal_macros::dec;

    fn request(member: MemberId, side: TradeSide, shares: Decimal, price: Decimal) -> TradeRequest {
        TradeRequest::new(member, "M1", Outcome::Yes, side, shares, price)
    }

    #[tokio::test]
    async fn buy_then_partial_sell() {
        let fx = LedgerFixture::new().await;
        let member = fx.member(dec!(1000)).await;
        let engine = PositionEngine::new(fx.context(), PositionPolicy::Separate);

        let buy = engine
            .apply_trade(request(member.id, TradeSide::Buy, dec!(100), dec!(0.40)))
            .await
            .unwrap();
        assert_eq!(buy.new_balance, dec!(960));
        assert_eq!(buy.pnl, None);
        let PositionChange::Opened(position_id) = buy.position else {
            panic!("expected an opened position, got {:?}", buy.position);
        };

        let sell = engine
            .apply_trade(request(member.id, TradeSide::Sell, dec!(40), dec!(0.60)))
            .await
            .unwrap();
        assert_eq!(sell.pnl, Some(dec!(8)));
        assert_eq!(sell.new_balance, dec!(984));
        assert_eq!(sell.position, PositionChange::Reduced(position_id));

        let position = fx.store.position(position_id).await.unwrap().unwrap();
        assert_eq!(position.shares, dec!(60));
        assert_eq!(position.entry_price, dec!(0.40));

        let member = fx.store.member(member.id).await.unwrap().unwrap();
        assert_eq!(member.total_pnl, dec!(8));
        assert_eq!(member.total_trades, 2);
        assert_eq!(member.win_rate, dec!(100));
    }

    #[tokio::test]
    async fn insufficient_balance_changes_nothing() {
        let fx = LedgerFixture::new().await;
        let member = fx.member(dec!(10)).await;
        let engine = PositionEngine::new(fx.context(), PositionPolicy::default());

        let err = engine
            .apply_trade(request(member.id, TradeSide::Buy, dec!(100), dec!(0.5)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { .. }));
        assert_eq!(fx.store.trade_count(), 0);
        assert_eq!(fx.store.open_position_count(), 0);
    }

    #[tokio::test]
    async fn invalid_input_rejected_before_lookup() {
        let fx = LedgerFixture::new().await;
        let engine = PositionEngine::new(fx.context(), PositionPolicy::default());

        for (shares, price) in [(dec!(0), dec!(0.5)), (dec!(1), dec!(0)), (dec!(-1), dec!(0.5))] {
            let err = engine
                .apply_trade(request(MemberId::new(1), TradeSide::Buy, shares, price))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{err}");
        }

        let mut blank = request(MemberId::new(1), TradeSide::Buy, dec!(1), dec!(0.5));
        blank.market_id = MarketId::new(" ");
        assert!(matches!(
            engine.apply_trade(blank).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn unknown_member_is_not_found() {
        let fx = LedgerFixture::new().await;
        let engine = PositionEngine::new(fx.context(), PositionPolicy::default());
        let err = engine
            .apply_trade(request(MemberId::new(77), TradeSide::Buy, dec!(1), dec!(0.5)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "member", .. }));
    }
}
