mod support;

use std::str::FromStr;

use polyledger::application::{PositionChange, PositionPolicy, SweepStatus};
use polyledger::domain::{MarketQuote, Outcome, TradeKind};
use polyledger::error::Error;
use polyledger::port::{LedgerStore, PositionFilter};
use polyledger::testkit::LedgerFixture;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use support::{buy, sell};

#[tokio::test]
async fn buy_sell_settle_walkthrough() {
    let fx = LedgerFixture::new().await;
    let ledger = fx.ledger(PositionPolicy::default());
    let member = fx.member(dec!(1000)).await;

    let receipt = ledger
        .submit_trade(buy(member.id, "M1", Outcome::Yes, dec!(100), dec!(0.40)))
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, dec!(960));
    let PositionChange::Opened(position_id) = receipt.position else {
        panic!("expected a new position, got {:?}", receipt.position);
    };
    let position = fx.store.position(position_id).await.unwrap().unwrap();
    assert_eq!(position.shares, dec!(100));
    assert_eq!(position.entry_price, dec!(0.40));

    let receipt = ledger
        .submit_trade(sell(member.id, "M1", Outcome::Yes, dec!(40), dec!(0.60)))
        .await
        .unwrap();
    assert_eq!(receipt.pnl, Some(dec!(8)));
    assert_eq!(receipt.new_balance, dec!(984));
    let position = fx.store.position(position_id).await.unwrap().unwrap();
    assert_eq!(position.shares, dec!(60));
    assert_eq!(position.entry_price, dec!(0.40));

    fx.quotes.set("M1", MarketQuote::resolved("M1", "Yes"));
    let status = ledger.trigger_settlement().wait().await;
    let SweepStatus::Completed(report) = status else {
        panic!("unexpected settlement status {status:?}");
    };
    assert_eq!(report.positions_updated, 1);

    assert!(fx.store.position(position_id).await.unwrap().is_none());
    let member = fx.store.member(member.id).await.unwrap().unwrap();
    assert_eq!(member.current_balance, dec!(1044));
    assert_eq!(member.total_pnl, dec!(44));
    assert_eq!(member.total_trades, 3);
    assert_eq!(member.win_rate, dec!(100));

    let statement = ledger.member_statement(member.id).await.unwrap();
    let kinds: Vec<_> = statement.trades.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, [TradeKind::Buy, TradeKind::Sell, TradeKind::Settle]);
    let settle = &statement.trades[2];
    assert_eq!(settle.price, dec!(1));
    assert_eq!(settle.pnl, Some(dec!(36)));
    assert_eq!(settle.total_value, dec!(60));
}

#[tokio::test]
async fn full_sell_removes_position() {
    let fx = LedgerFixture::new().await;
    let ledger = fx.ledger(PositionPolicy::default());
    let member = fx.member(dec!(100)).await;

    ledger
        .submit_trade(buy(member.id, "M1", Outcome::No, dec!(10), dec!(0.30)))
        .await
        .unwrap();
    let receipt = ledger
        .submit_trade(sell(member.id, "M1", Outcome::No, dec!(25), dec!(0.20)))
        .await
        .unwrap();

    assert!(matches!(receipt.position, PositionChange::Closed(_)));
    assert_eq!(receipt.pnl, Some(dec!(-2.5)));
    assert_eq!(receipt.new_balance, dec!(100) - dec!(3) + dec!(5));
    assert_eq!(fx.store.open_position_count(), 0);

    let member = fx.store.member(member.id).await.unwrap().unwrap();
    assert_eq!(member.win_rate, dec!(0));
    assert_eq!(member.total_pnl, dec!(-2.5));
}

#[tokio::test]
async fn sell_without_position_credits_balance() {
    let fx = LedgerFixture::new().await;
    let ledger = fx.ledger(PositionPolicy::default());
    let member = fx.member(dec!(50)).await;

    let receipt = ledger
        .submit_trade(sell(member.id, "GHOST", Outcome::Yes, dec!(10), dec!(0.5)))
        .await
        .unwrap();
    assert_eq!(receipt.position, PositionChange::Unbacked);
    assert_eq!(receipt.pnl, None);
    assert_eq!(receipt.new_balance, dec!(55));

    let member = fx.store.member(member.id).await.unwrap().unwrap();
    assert_eq!(member.total_trades, 1);
    assert_eq!(member.total_pnl, dec!(0));
    assert_eq!(member.win_rate, dec!(0));
}

#[tokio::test]
async fn rejected_trades_leave_no_trace() {
    let fx = LedgerFixture::new().await;
    let ledger = fx.ledger(PositionPolicy::default());
    let member = fx.member(dec!(10)).await;

    assert!(matches!(
        ledger
            .submit_trade(buy(member.id, "M1", Outcome::Yes, dec!(100), dec!(0.5)))
            .await,
        Err(Error::InsufficientBalance { .. })
    ));
    assert!(matches!(
        ledger
            .submit_trade(buy(member.id, "M1", Outcome::Yes, dec!(0), dec!(0.5)))
            .await,
        Err(Error::InvalidInput(_))
    ));

    assert_eq!(fx.store.trade_count(), 0);
    assert_eq!(fx.store.open_position_count(), 0);
    let unchanged = fx.store.member(member.id).await.unwrap().unwrap();
    assert_eq!(unchanged, member);
}

#[tokio::test]
async fn out_of_range_amounts_are_rejected_without_panicking() {
    let fx = LedgerFixture::new().await;
    let ledger = fx.ledger(PositionPolicy::default());
    let member = fx.member(dec!(10)).await;

    let huge_shares = Decimal::from_str("10000000000000000000000").unwrap();
    let err = ledger
        .submit_trade(sell(member.id, "M1", Outcome::Yes, huge_shares, dec!(100000000)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "{err}");

    // The trade value fits, but crediting it to the balance does not.
    let err = ledger
        .submit_trade(sell(member.id, "M1", Outcome::Yes, Decimal::MAX, dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "{err}");

    assert_eq!(fx.store.trade_count(), 0);
    let unchanged = fx.store.member(member.id).await.unwrap().unwrap();
    assert_eq!(unchanged, member);
}

#[tokio::test]
async fn revaluation_marks_without_touching_balances() {
    let fx = LedgerFixture::new().await;
    let ledger = fx.ledger(PositionPolicy::default());
    let member = fx.member(dec!(1000)).await;
    ledger
        .submit_trade(buy(member.id, "M1", Outcome::No, dec!(50), dec!(0.60)))
        .await
        .unwrap();
    fx.quotes.set("M1", MarketQuote::open("M1", dec!(0.3), dec!(0.7)));

    let status = ledger.trigger_revaluation().wait().await;
    assert!(matches!(status, SweepStatus::Completed(_)), "{status:?}");

    let statement = ledger.member_statement(member.id).await.unwrap();
    assert_eq!(statement.positions[0].current_price, dec!(0.7));
    assert_eq!(statement.unrealized_pnl(), dec!(5));
    assert_eq!(statement.member.current_balance, dec!(970));
    assert_eq!(statement.member.total_pnl, dec!(0));
}

#[tokio::test]
async fn ranks_are_gapless_and_ordered() {
    let fx = LedgerFixture::new().await;
    let ledger = fx.ledger(PositionPolicy::default());
    let winner = fx.member(dec!(100)).await;
    let loser = fx.member(dec!(100)).await;

    // winner: +50 realized; loser: -10 realized.
    ledger
        .submit_trade(buy(winner.id, "A", Outcome::Yes, dec!(100), dec!(0.5)))
        .await
        .unwrap();
    ledger
        .submit_trade(sell(winner.id, "A", Outcome::Yes, dec!(100), dec!(1)))
        .await
        .unwrap();
    ledger
        .submit_trade(buy(loser.id, "B", Outcome::Yes, dec!(20), dec!(0.6)))
        .await
        .unwrap();
    ledger
        .submit_trade(sell(loser.id, "B", Outcome::Yes, dec!(20), dec!(0.1)))
        .await
        .unwrap();

    assert_eq!(ledger.recompute_ranks(Some(fx.league.id)).await.unwrap(), 2);
    let winner = fx.store.member(winner.id).await.unwrap().unwrap();
    let loser = fx.store.member(loser.id).await.unwrap().unwrap();
    assert_eq!((winner.total_pnl, winner.rank), (dec!(50), Some(1)));
    assert_eq!((loser.total_pnl, loser.rank), (dec!(-10), Some(2)));
}

#[tokio::test]
async fn market_metadata_flows_to_positions_and_trades() {
    let fx = LedgerFixture::new().await;
    let ledger = fx.ledger(PositionPolicy::default());
    let member = fx.member(dec!(100)).await;

    ledger
        .submit_trade(
            buy(member.id, "M1", Outcome::Yes, dec!(10), dec!(0.5)).with_market_info(
                Some("will-it-rain".into()),
                Some("Will it rain?".into()),
            ),
        )
        .await
        .unwrap();
    fx.quotes.set("M1", MarketQuote::resolved("M1", "no"));
    ledger.trigger_settlement().wait().await;

    let statement = ledger.member_statement(member.id).await.unwrap();
    assert!(statement.positions.is_empty());
    for trade in &statement.trades {
        assert_eq!(trade.market_slug.as_deref(), Some("will-it-rain"));
        assert_eq!(trade.market_question.as_deref(), Some("Will it rain?"));
    }
    assert_eq!(statement.trades[1].pnl, Some(dec!(-5)));
    assert!(fx
        .store
        .positions(&PositionFilter::all())
        .await
        .unwrap()
        .is_empty());
}
