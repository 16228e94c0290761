//! Command-line adapter: argument parsing, dispatch and output.

pub mod command;
pub mod league;
pub mod output;
pub mod run;
pub mod sweep;
pub mod trade;

pub use command::{Cli, Commands};
pub use output::Output;

use crate::error::Result;
use crate::infrastructure::build_ledger;
use crate::infrastructure::config::Config;

/// Build the ledger described by `config` and run `command` against it.
///
/// # Errors
/// Returns the error of the ledger operation behind the command.
pub async fn execute(command: Commands, config: &Config, out: &Output) -> Result<()> {
    let ledger = build_ledger(config)?;
    match command {
        Commands::Run => run::execute(ledger, config, out).await,
        Commands::Trade(args) => trade::execute(&ledger, args, out).await,
        Commands::Revalue => sweep::revalue(&ledger, out).await,
        Commands::Settle => sweep::settle(&ledger, out).await,
        Commands::Rank(args) => sweep::rank(&ledger, &args, out).await,
        Commands::League(command) => league::execute(&ledger, command, out).await,
        Commands::Member(command) => league::execute_member(&ledger, command, out).await,
    }
}
