//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use polyledger::adapter::outbound::sqlite::SqliteLedgerStore;
use polyledger::application::{Ledger, LedgerContext, PositionPolicy, DEFAULT_CALL_TIMEOUT};
use polyledger::domain::{MemberId, Outcome, TradeRequest, TradeSide};
use polyledger::testkit::ScriptedQuoteProvider;
use rust_decimal::Decimal;

pub fn buy(
    member: MemberId,
    market: &str,
    outcome: Outcome,
    shares: Decimal,
    price: Decimal,
) -> TradeRequest {
    TradeRequest::new(member, market, outcome, TradeSide::Buy, shares, price)
}

pub fn sell(
    member: MemberId,
    market: &str,
    outcome: Outcome,
    shares: Decimal,
    price: Decimal,
) -> TradeRequest {
    TradeRequest::new(member, market, outcome, TradeSide::Sell, shares, price)
}

/// Path of the SQLite file [`sqlite_ledger`] opens in `dir`.
pub fn ledger_db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("ledger.db")
}

/// A ledger over a SQLite file in `dir`, with scripted quotes.
pub fn sqlite_ledger(
    dir: &tempfile::TempDir,
    policy: PositionPolicy,
) -> (Ledger, Arc<ScriptedQuoteProvider>) {
    sqlite_ledger_with_timeout(dir, policy, DEFAULT_CALL_TIMEOUT)
}

/// Like [`sqlite_ledger`] with a custom bound on each store call.
pub fn sqlite_ledger_with_timeout(
    dir: &tempfile::TempDir,
    policy: PositionPolicy,
    call_timeout: Duration,
) -> (Ledger, Arc<ScriptedQuoteProvider>) {
    let path = ledger_db_path(dir);
    let store = SqliteLedgerStore::open(&path.to_string_lossy()).expect("open sqlite store");
    let quotes = Arc::new(ScriptedQuoteProvider::new());
    let ctx =
        LedgerContext::new(Arc::new(store), quotes.clone()).with_call_timeout(call_timeout);
    (Ledger::new(ctx, policy), quotes)
}
