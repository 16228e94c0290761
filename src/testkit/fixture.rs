//! Seeded ledger for engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rust_decimal_macros::dec;

use crate::adapter::outbound::memory::MemoryLedgerStore;
use crate::application::{Ledger, LedgerContext, PositionPolicy};
use crate::domain::{
    Amount, League, MarketId, Member, MemberId, NewLeague, NewMember, NewPosition, Outcome,
    PositionId, Price, Shares,
};
use crate::port::{LedgerBatch, LedgerStore};

use super::quotes::ScriptedQuoteProvider;

/// An in-memory store holding one active league, plus scripted quotes.
pub struct LedgerFixture {
    pub store: Arc<MemoryLedgerStore>,
    pub quotes: Arc<ScriptedQuoteProvider>,
    pub league: League,
    next_user: AtomicUsize,
}

impl LedgerFixture {
    /// A fresh store with one active league (capital 1000).
    pub async fn new() -> Self {
        let store = Arc::new(MemoryLedgerStore::new());
        let league = store
            .insert_league(
                NewLeague::try_new("Test League", dec!(1000), dec!(100))
                    .expect("valid test league"),
            )
            .await
            .expect("insert test league");
        Self {
            store,
            quotes: Arc::new(ScriptedQuoteProvider::new()),
            league,
            next_user: AtomicUsize::new(1),
        }
    }

    /// Enroll a member of the fixture league with `balance`.
    pub async fn member(&self, balance: Amount) -> Member {
        let n = self.next_user.fetch_add(1, Ordering::SeqCst);
        self.store
            .insert_member(NewMember {
                league_id: self.league.id,
                user_id: format!("user-{n}"),
                starting_balance: balance,
            })
            .await
            .expect("insert test member")
    }

    /// Insert a position directly, without charging the member.
    pub async fn open_position(
        &self,
        member_id: MemberId,
        market: &str,
        outcome: Outcome,
        shares: Shares,
        entry_price: Price,
    ) -> PositionId {
        let mut batch = LedgerBatch::new();
        batch.insert_position(NewPosition {
            member_id,
            market_id: MarketId::new(market),
            market_slug: None,
            market_question: None,
            outcome,
            shares,
            entry_price,
        });
        let receipt = self.store.commit(batch).await.expect("insert test position");
        receipt.positions[0]
    }

    /// Context over the fixture store and quotes, with a fresh lock table.
    pub fn context(&self) -> LedgerContext {
        LedgerContext::new(self.store.clone(), self.quotes.clone())
    }

    /// Ledger facade over [`context`](Self::context).
    pub fn ledger(&self, policy: PositionPolicy) -> Ledger {
        Ledger::new(self.context(), policy)
    }
}
