//! Periodic sweep scheduler behind `polyledger run`.
//!
//! Each sweep kind runs on its own interval. A kind is never started again
//! while its previous run is still in flight; the tick is skipped instead.
//! On shutdown running sweeps are cancelled and awaited.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::application::{Ledger, SweepHandle, SweepKind, SweepStatus};
use crate::error::Result;

use super::config::ScheduleConfig;

/// Drives revaluation, settlement and ranking on fixed intervals.
pub struct Scheduler {
    ledger: Ledger,
    revalue_every: Duration,
    settle_every: Duration,
    rank_every: Duration,
}

impl Scheduler {
    pub fn new(ledger: Ledger, schedule: &ScheduleConfig) -> Self {
        Self::with_intervals(
            ledger,
            schedule.revalue_interval(),
            schedule.settle_interval(),
            schedule.rank_interval(),
        )
    }

    pub fn with_intervals(
        ledger: Ledger,
        revalue_every: Duration,
        settle_every: Duration,
        rank_every: Duration,
    ) -> Self {
        Self {
            ledger,
            revalue_every,
            settle_every,
            rank_every,
        }
    }

    /// Run until `shutdown` flips to true or its sender is dropped.
    ///
    /// # Errors
    /// Currently always returns `Ok`; sweep failures are logged and retried on
    /// the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut revalue_tick = interval(self.revalue_every);
        let mut settle_tick = interval(self.settle_every);
        let mut rank_tick = interval(self.rank_every);
        for tick in [&mut revalue_tick, &mut settle_tick, &mut rank_tick] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        let mut revaluation: Option<SweepHandle> = None;
        let mut settlement: Option<SweepHandle> = None;
        let mut ranking: Option<JoinHandle<()>> = None;

        info!(
            revalue_secs = self.revalue_every.as_secs_f64(),
            settle_secs = self.settle_every.as_secs_f64(),
            rank_secs = self.rank_every.as_secs_f64(),
            "scheduler started"
        );

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                info!("Shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            info!("Shutdown channel closed");
                            break;
                        }
                    }
                }
                _ = revalue_tick.tick() => {
                    start_sweep(&mut revaluation, SweepKind::Revaluation, || {
                        self.ledger.trigger_revaluation()
                    });
                }
                _ = settle_tick.tick() => {
                    start_sweep(&mut settlement, SweepKind::Settlement, || {
                        self.ledger.trigger_settlement()
                    });
                }
                _ = rank_tick.tick() => {
                    if ranking.as_ref().is_some_and(|task| !task.is_finished()) {
                        debug!("ranking still running, skipping tick");
                    } else {
                        ranking = Some(spawn_ranking(self.ledger.clone()));
                    }
                }
            }
        }

        for handle in [revaluation, settlement].into_iter().flatten() {
            if !handle.is_finished() {
                info!(sweep = %handle.kind(), "cancelling running sweep");
                handle.cancel();
            }
            if let SweepStatus::Failed(reason) = handle.wait().await {
                warn!(sweep = %handle.kind(), reason = %reason, "last sweep failed");
            }
        }
        if let Some(task) = ranking {
            if let Err(e) = task.await {
                error!(error = %e, "ranking task panicked");
            }
        }

        info!("scheduler stopped");
        Ok(())
    }
}

fn spawn_ranking(ledger: Ledger) -> JoinHandle<()> {
    tokio::spawn(async move {
        match ledger.recompute_ranks(None).await {
            Ok(ranked) => debug!(ranked, "scheduled ranking finished"),
            Err(e) => warn!(error = %e, "scheduled ranking failed"),
        }
        ledger.context().locks().prune();
    })
}

/// Start a sweep in `slot` unless the previous one is still running.
fn start_sweep(
    slot: &mut Option<SweepHandle>,
    kind: SweepKind,
    start: impl FnOnce() -> SweepHandle,
) -> bool {
    if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
        debug!(sweep = %kind, "previous sweep still running, skipping tick");
        return false;
    }
    *slot = Some(start());
    true
}
