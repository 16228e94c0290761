mod support;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::{Connection, SqliteConnection};
use polyledger::application::{PositionChange, PositionPolicy, SweepStatus};
use polyledger::domain::{MarketQuote, Outcome, TradeKind};
use polyledger::error::Error;
use rust_decimal_macros::dec;

use support::{buy, ledger_db_path, sell, sqlite_ledger, sqlite_ledger_with_timeout};

#[tokio::test]
async fn trade_revalue_settle_rank_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, quotes) = sqlite_ledger(&dir, PositionPolicy::default());

    let league = ledger.create_league("Disk Cup", dec!(500), dec!(100)).await.unwrap();
    let alice = ledger.enroll_member(league.id, "alice").await.unwrap();
    let bob = ledger.enroll_member(league.id, "bob").await.unwrap();

    let receipt = ledger
        .submit_trade(buy(alice.id, "M1", Outcome::Yes, dec!(100), dec!(0.40)))
        .await
        .unwrap();
    assert!(matches!(receipt.position, PositionChange::Opened(_)));
    ledger
        .submit_trade(buy(alice.id, "M1", Outcome::Yes, dec!(100), dec!(0.60)))
        .await
        .unwrap();
    ledger
        .submit_trade(buy(bob.id, "M1", Outcome::No, dec!(50), dec!(0.50)))
        .await
        .unwrap();

    quotes.set("M1", MarketQuote::open("M1", dec!(0.55), dec!(0.45)));
    let status = ledger.trigger_revaluation().wait().await;
    assert!(matches!(status, SweepStatus::Completed(_)), "{status:?}");

    let statement = ledger.member_statement(alice.id).await.unwrap();
    assert_eq!(statement.positions.len(), 1);
    assert_eq!(statement.positions[0].shares, dec!(200));
    assert_eq!(statement.positions[0].entry_price, dec!(0.5));
    assert_eq!(statement.unrealized_pnl(), dec!(10));
    assert_eq!(statement.member.current_balance, dec!(400));

    quotes.set("M1", MarketQuote::resolved("M1", "yes"));
    let status = ledger.trigger_settlement().wait().await;
    assert!(matches!(status, SweepStatus::Completed(_)), "{status:?}");

    assert_eq!(ledger.recompute_ranks(Some(league.id)).await.unwrap(), 2);

    let alice = ledger.member_statement(alice.id).await.unwrap();
    assert!(alice.positions.is_empty());
    assert_eq!(alice.member.current_balance, dec!(600));
    assert_eq!(alice.member.total_pnl, dec!(100));
    assert_eq!(alice.member.rank, Some(1));
    let kinds: Vec<_> = alice.trades.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TradeKind::Buy, TradeKind::Buy, TradeKind::Settle]);

    let bob = ledger.member_statement(bob.id).await.unwrap();
    assert_eq!(bob.member.current_balance, dec!(475));
    assert_eq!(bob.member.total_pnl, dec!(-25));
    assert_eq!(bob.member.rank, Some(2));
}

#[tokio::test]
async fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let member_id = {
        let (ledger, _) = sqlite_ledger(&dir, PositionPolicy::default());
        let league = ledger.create_league("Persist", dec!(100), dec!(10)).await.unwrap();
        let member = ledger.enroll_member(league.id, "carol").await.unwrap();
        ledger
            .submit_trade(buy(member.id, "M9", Outcome::No, dec!(10), dec!(0.30)))
            .await
            .unwrap();
        member.id
    };

    let (ledger, _) = sqlite_ledger(&dir, PositionPolicy::default());
    let receipt = ledger
        .submit_trade(sell(member_id, "M9", Outcome::No, dec!(4), dec!(0.50)))
        .await
        .unwrap();
    assert!(matches!(receipt.position, PositionChange::Reduced(_)));
    assert_eq!(receipt.pnl, Some(dec!(0.8)));
    assert_eq!(receipt.new_balance, dec!(99));

    let statement = ledger.member_statement(member_id).await.unwrap();
    assert_eq!(statement.positions[0].shares, dec!(6));
    assert_eq!(statement.trades.len(), 2);
}

#[tokio::test]
async fn sqlite_rejects_overdraw_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, _) = sqlite_ledger(&dir, PositionPolicy::default());
    let league = ledger.create_league("Tight", dec!(10), dec!(10)).await.unwrap();
    let member = ledger.enroll_member(league.id, "dave").await.unwrap();

    let err = ledger
        .submit_trade(buy(member.id, "M1", Outcome::Yes, dec!(100), dec!(0.5)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientBalance { .. }), "{err}");

    let statement = ledger.member_statement(member.id).await.unwrap();
    assert_eq!(statement.member.current_balance, dec!(10));
    assert_eq!(statement.member.total_trades, 0);
    assert!(statement.positions.is_empty());
    assert!(statement.trades.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn commit_that_times_out_is_never_applied() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, _) =
        sqlite_ledger_with_timeout(&dir, PositionPolicy::default(), Duration::from_millis(300));
    let league = ledger.create_league("Locked", dec!(1000), dec!(500)).await.unwrap();
    let member = ledger.enroll_member(league.id, "erin").await.unwrap();

    // Another writer holds the database lock well past the call timeout.
    let path = ledger_db_path(&dir);
    let (locked_tx, locked_rx) = mpsc::channel();
    let writer = thread::spawn(move || {
        let mut conn = SqliteConnection::establish(&path.to_string_lossy()).unwrap();
        conn.batch_execute("BEGIN IMMEDIATE").unwrap();
        locked_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(1500));
        conn.batch_execute("ROLLBACK").unwrap();
    });
    tokio::task::spawn_blocking(move || locked_rx.recv().unwrap())
        .await
        .unwrap();

    let err = ledger
        .submit_trade(buy(member.id, "M1", Outcome::Yes, dec!(100), dec!(0.40)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ExternalUnavailable(_)), "{err}");

    tokio::task::spawn_blocking(move || writer.join().unwrap())
        .await
        .unwrap();
    // Leave the abandoned batch time to acquire the lock and finish.
    tokio::time::sleep(Duration::from_secs(1)).await;

    let statement = ledger.member_statement(member.id).await.unwrap();
    assert_eq!(statement.member.current_balance, dec!(1000));
    assert_eq!(statement.member.total_trades, 0);
    assert!(statement.positions.is_empty());
    assert!(statement.trades.is_empty());

    let receipt = ledger
        .submit_trade(buy(member.id, "M1", Outcome::Yes, dec!(100), dec!(0.40)))
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, dec!(960));
    let statement = ledger.member_statement(member.id).await.unwrap();
    assert_eq!(statement.trades.len(), 1);
    assert_eq!(statement.positions.len(), 1);
}
