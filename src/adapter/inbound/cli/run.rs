//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::cli::output::Output;
use crate::application::Ledger;
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::infrastructure::Scheduler;

/// Run the scheduler until Ctrl-C.
pub async fn execute(ledger: Ledger, config: &Config, out: &Output) -> Result<()> {
    out.section("polyledger run");
    out.field("Database", &config.database);
    out.field("Revalue every", format!("{}s", config.schedule.revalue_interval_secs));
    out.field("Settle every", format!("{}s", config.schedule.settle_interval_secs));
    out.field("Rank every", format!("{}s", config.schedule.rank_interval_secs));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received"),
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C, shutting down"),
        }
        shutdown_tx.send_replace(true);
    });

    Scheduler::new(ledger, &config.schedule)
        .run(shutdown_rx)
        .await?;
    out.success("Scheduler stopped");
    Ok(())
}
