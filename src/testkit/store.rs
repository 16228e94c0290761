//! Store wrapper with injectable commit failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{League, Member, NewLeague, NewMember, Position, Trade};
use crate::error::{Error, Result};
use crate::port::{
    CommitReceipt, LeagueFilter, LedgerBatch, LedgerStore, MemberFilter, PositionFilter,
    TradeFilter,
};

/// Delegates to an inner store, failing or stalling commits when told to.
pub struct FailingStore {
    inner: Arc<dyn LedgerStore>,
    fail_commits: AtomicUsize,
    stall_commits: AtomicBool,
    commits: AtomicUsize,
}

impl FailingStore {
    pub fn new(inner: Arc<dyn LedgerStore>) -> Self {
        Self {
            inner,
            fail_commits: AtomicUsize::new(0),
            stall_commits: AtomicBool::new(false),
            commits: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` commits without touching the inner store.
    pub fn fail_next_commits(&self, n: usize) {
        self.fail_commits.store(n, Ordering::SeqCst);
    }

    /// Make every commit hang until its time limit, or forever without one.
    pub fn stall_commits(&self, stall: bool) {
        self.stall_commits.store(stall, Ordering::SeqCst);
    }

    /// Commits that reached the inner store.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn take_injected_failure(&self) -> Result<()> {
        let injected = self
            .fail_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(Error::Database("injected commit failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for FailingStore {
    async fn members(&self, filter: &MemberFilter) -> Result<Vec<Member>> {
        self.inner.members(filter).await
    }

    async fn leagues(&self, filter: &LeagueFilter) -> Result<Vec<League>> {
        self.inner.leagues(filter).await
    }

    async fn positions(&self, filter: &PositionFilter) -> Result<Vec<Position>> {
        self.inner.positions(filter).await
    }

    async fn trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>> {
        self.inner.trades(filter).await
    }

    async fn insert_league(&self, league: NewLeague) -> Result<League> {
        self.inner.insert_league(league).await
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member> {
        self.inner.insert_member(member).await
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<CommitReceipt> {
        if self.stall_commits.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.take_injected_failure()?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(batch).await
    }

    async fn commit_within(&self, batch: LedgerBatch, limit: Duration) -> Result<CommitReceipt> {
        if self.stall_commits.load(Ordering::SeqCst) {
            tokio::time::sleep(limit).await;
            return Err(Error::timed_out("commit", limit));
        }
        self.take_injected_failure()?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit_within(batch, limit).await
    }
}
