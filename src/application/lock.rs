//! Per-member mutual exclusion.
//!
//! Every read-modify-write of a member's balance, positions or trade log runs
//! while holding that member's lock. Different members never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::MemberId;

/// Guard held for the duration of one member mutation.
pub type MemberGuard = OwnedMutexGuard<()>;

/// Lock table keyed by member.
#[derive(Debug, Default)]
pub struct MemberLocks {
    locks: DashMap<MemberId, Arc<Mutex<()>>>,
}

impl MemberLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `member`.
    pub async fn lock(&self, member: MemberId) -> MemberGuard {
        let lock = Arc::clone(self.locks.entry(member).or_default().value());
        lock.lock_owned().await
    }

    /// Drop entries nobody holds or waits on. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - self.locks.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
