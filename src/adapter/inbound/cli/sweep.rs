//! Handlers for the `revalue`, `settle` and `rank` commands.

use crate::adapter::inbound::cli::command::RankArgs;
use crate::adapter::inbound::cli::output::Output;
use crate::application::{Ledger, SweepHandle, SweepStatus};
use crate::domain::LeagueId;
use crate::error::{Error, Result};

pub async fn revalue(ledger: &Ledger, out: &Output) -> Result<()> {
    report(ledger.trigger_revaluation(), out).await
}

pub async fn settle(ledger: &Ledger, out: &Output) -> Result<()> {
    report(ledger.trigger_settlement(), out).await
}

pub async fn rank(ledger: &Ledger, args: &RankArgs, out: &Output) -> Result<()> {
    let ranked = ledger
        .recompute_ranks(args.league.map(LeagueId::new))
        .await?;
    out.success(&format!("Ranked {ranked} members"));
    Ok(())
}

async fn report(handle: SweepHandle, out: &Output) -> Result<()> {
    let kind = handle.kind();
    let status = handle.wait().await;
    if let Some(report) = status.report() {
        out.record("sweep", report);
        out.section(&format!("{kind} sweep"));
        out.field("Markets seen", report.markets_seen);
        out.field("Processed", report.markets_processed);
        out.field("Unavailable", report.markets_unavailable);
        out.field("Unresolved", report.markets_unresolved);
        out.field("Ambiguous", report.markets_ambiguous);
        out.field("Updated", report.positions_updated);
        out.field("Failed", report.positions_failed);
    }

    match status {
        SweepStatus::Completed(_) => {
            out.success(&format!("{kind} complete"));
            Ok(())
        }
        SweepStatus::CompletedWithFailures(_) => {
            out.warning(&format!("{kind} finished with failures; they retry next sweep"));
            Ok(())
        }
        SweepStatus::Cancelled(_) => {
            out.warning(&format!("{kind} cancelled"));
            Ok(())
        }
        SweepStatus::Failed(reason) => Err(Error::ExternalUnavailable(reason)),
        SweepStatus::Running => Err(Error::Connection(format!("{kind} still running"))),
    }
}
