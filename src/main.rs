use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use polyledger::adapter::inbound::cli::{self, Cli, Output};
use polyledger::infrastructure::config::Config;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    let out = Output::new(args.json, args.quiet);

    if let Err(e) = run(args, &out).await {
        error!(error = %e, "command failed");
        out.error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(args: Cli, out: &Output) -> anyhow::Result<()> {
    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    config.init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "polyledger starting");

    cli::execute(args.command, &config, out).await?;
    Ok(())
}
