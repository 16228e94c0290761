//! Shared collaborators for the ledger engines.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Amount, MarketId, MarketQuote, MemberId};
use crate::error::{Error, Result};
use crate::port::{CommitReceipt, LedgerBatch, LedgerStore, QuoteProvider, TradeFilter};

use super::lock::{MemberGuard, MemberLocks};

/// Default bound on a single quote or store call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Store, quote source and member locks shared by every engine.
///
/// Cloning is cheap; clones share the same lock table.
#[derive(Clone)]
pub struct LedgerContext {
    store: Arc<dyn LedgerStore>,
    quotes: Arc<dyn QuoteProvider>,
    locks: Arc<MemberLocks>,
    call_timeout: Duration,
}

impl LedgerContext {
    pub fn new(store: Arc<dyn LedgerStore>, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self {
            store,
            quotes,
            locks: Arc::new(MemberLocks::new()),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    #[must_use]
    pub fn quotes(&self) -> &Arc<dyn QuoteProvider> {
        &self.quotes
    }

    #[must_use]
    pub fn locks(&self) -> &Arc<MemberLocks> {
        &self.locks
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Run one external call under the configured timeout.
    ///
    /// # Errors
    /// Returns [`Error::ExternalUnavailable`] when the call does not finish in
    /// time, otherwise whatever the call returned.
    pub async fn bounded<T, F>(&self, call: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::timed_out(call, self.call_timeout)),
        }
    }

    /// Fetch a quote under the call timeout.
    ///
    /// # Errors
    /// Propagates provider failures and timeouts.
    pub async fn quote(&self, market_id: &MarketId) -> Result<MarketQuote> {
        self.bounded("quote", self.quotes.quote(market_id)).await
    }

    /// Commit a batch under the call timeout.
    ///
    /// The store, not this context, enforces the limit: a batch reported as
    /// timed out is never applied afterwards.
    ///
    /// # Errors
    /// Propagates store failures and timeouts.
    pub async fn commit(&self, batch: LedgerBatch) -> Result<CommitReceipt> {
        self.store.commit_within(batch, self.call_timeout).await
    }

    /// Pnl of every sell and settlement the member has recorded.
    ///
    /// # Errors
    /// Propagates store failures and timeouts.
    pub async fn closing_pnls(&self, member: MemberId) -> Result<Vec<Option<Amount>>> {
        let trades = self
            .bounded(
                "load closing trades",
                self.store.trades(&TradeFilter::closing_for(member)),
            )
            .await?;
        Ok(trades.into_iter().map(|t| t.pnl).collect())
    }

    /// Wait for exclusive access to `member`.
    pub async fn lock_member(&self, member: MemberId) -> MemberGuard {
        self.locks.lock(member).await
    }
}
