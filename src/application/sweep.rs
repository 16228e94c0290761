//! Background sweep tasks with observable status.
//!
//! A sweep is spawned onto the runtime and reports through a `watch` channel,
//! so callers get an acknowledgement immediately and can poll, wait on or
//! cancel the run afterwards. Cancellation is cooperative: sweeps check the
//! flag between markets and never abandon a market half way.

use std::fmt;
use std::future::Future;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::Result;

/// Which batch job a sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepKind {
    Revaluation,
    Settlement,
}

impl SweepKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SweepKind::Revaluation => "revaluation",
            SweepKind::Settlement => "settlement",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-market position counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketTally {
    /// Positions written.
    pub updated: usize,
    /// Positions closed by someone else before we got to them.
    pub skipped: usize,
    /// Positions whose write failed; retried next sweep.
    pub failed: usize,
}

/// Counters accumulated over one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub markets_seen: usize,
    pub markets_processed: usize,
    /// Quote could not be fetched.
    pub markets_unavailable: usize,
    /// Market not resolved yet (settlement only).
    pub markets_unresolved: usize,
    /// Resolved without a single winner (settlement only).
    pub markets_ambiguous: usize,
    pub positions_updated: usize,
    pub positions_skipped: usize,
    pub positions_failed: usize,
    pub cancelled: bool,
}

impl SweepReport {
    pub fn add(&mut self, tally: MarketTally) {
        self.markets_processed += 1;
        self.positions_updated += tally.updated;
        self.positions_skipped += tally.skipped;
        self.positions_failed += tally.failed;
    }

    /// True when some unit of work was left for the next sweep.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.markets_unavailable > 0 || self.positions_failed > 0
    }
}

/// Lifecycle of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepStatus {
    Running,
    Completed(SweepReport),
    /// Finished, but some markets or positions were skipped after errors.
    CompletedWithFailures(SweepReport),
    Cancelled(SweepReport),
    /// The sweep could not start its work at all.
    Failed(String),
}

impl SweepStatus {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !matches!(self, SweepStatus::Running)
    }

    /// The report, if the sweep got far enough to produce one.
    #[must_use]
    pub fn report(&self) -> Option<&SweepReport> {
        match self {
            SweepStatus::Completed(r)
            | SweepStatus::CompletedWithFailures(r)
            | SweepStatus::Cancelled(r) => Some(r),
            SweepStatus::Running | SweepStatus::Failed(_) => None,
        }
    }

    fn from_outcome(result: Result<SweepReport>) -> Self {
        match result {
            Ok(report) if report.cancelled => SweepStatus::Cancelled(report),
            Ok(report) if report.has_failures() => SweepStatus::CompletedWithFailures(report),
            Ok(report) => SweepStatus::Completed(report),
            Err(e) => SweepStatus::Failed(e.to_string()),
        }
    }
}

/// Cancellation flag handed to a running sweep.
#[derive(Debug, Clone)]
pub struct SweepControl {
    cancel: watch::Receiver<bool>,
}

impl SweepControl {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// A control that is never cancelled, for running a sweep inline.
    #[must_use]
    pub fn detached() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { cancel: rx }
    }
}

/// Handle for observing and cancelling a spawned sweep.
#[derive(Debug)]
pub struct SweepHandle {
    kind: SweepKind,
    status: watch::Receiver<SweepStatus>,
    cancel: watch::Sender<bool>,
}

impl SweepHandle {
    #[must_use]
    pub fn kind(&self) -> SweepKind {
        self.kind
    }

    /// Current status snapshot.
    #[must_use]
    pub fn status(&self) -> SweepStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status.borrow().is_finished()
    }

    /// Ask the sweep to stop after the market it is working on.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Wait for the sweep to finish and return its final status.
    pub async fn wait(&self) -> SweepStatus {
        let mut status = self.status.clone();
        loop {
            let current = status.borrow_and_update().clone();
            if current.is_finished() {
                return current;
            }
            if status.changed().await.is_err() {
                let last = status.borrow().clone();
                return if last.is_finished() {
                    last
                } else {
                    SweepStatus::Failed("sweep task ended without reporting".into())
                };
            }
        }
    }
}

/// Spawn `run` as a sweep of the given kind.
pub fn spawn<F, Fut>(kind: SweepKind, run: F) -> SweepHandle
where
    F: FnOnce(SweepControl) -> Fut,
    Fut: Future<Output = Result<SweepReport>> + Send + 'static,
{
    let (status_tx, status_rx) = watch::channel(SweepStatus::Running);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let work = run(SweepControl { cancel: cancel_rx });

    tokio::spawn(async move {
        let status = SweepStatus::from_outcome(work.await);
        match &status {
            SweepStatus::Failed(reason) => warn!(sweep = %kind, reason = %reason, "sweep failed"),
            other => {
                if let Some(r) = other.report() {
                    info!(
                        sweep = %kind,
                        markets_seen = r.markets_seen,
                        markets_processed = r.markets_processed,
                        markets_unavailable = r.markets_unavailable,
                        markets_unresolved = r.markets_unresolved,
                        markets_ambiguous = r.markets_ambiguous,
                        positions_updated = r.positions_updated,
                        positions_skipped = r.positions_skipped,
                        positions_failed = r.positions_failed,
                        cancelled = r.cancelled,
                        "sweep finished"
                    );
                }
            }
        }
        status_tx.send_replace(status);
    });

    SweepHandle {
        kind,
        status: status_rx,
        cancel: cancel_tx,
    }
}
