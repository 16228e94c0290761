//! Command-line interface definitions.
//!
//! Defines the CLI structure for the polyledger binary using `clap`. Every
//! subcommand is a thin caller of the [`Ledger`](crate::application::Ledger)
//! facade.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::{Outcome, TradeSide};

/// Fantasy prediction-market league ledger
#[derive(Parser, Debug)]
#[command(name = "polyledger")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (defaults apply when it is missing)
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the polyledger CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scheduled revaluation, settlement and ranking until Ctrl-C
    Run,

    /// Submit a buy or sell for a member
    Trade(TradeArgs),

    /// Revalue every open position at current quotes
    Revalue,

    /// Settle every open position on a resolved market
    Settle,

    /// Recompute league ranks
    Rank(RankArgs),

    /// Manage leagues
    #[command(subcommand)]
    League(LeagueCommand),

    /// Inspect members
    #[command(subcommand)]
    Member(MemberCommand),
}

/// Arguments for `polyledger trade`.
#[derive(Args, Debug)]
pub struct TradeArgs {
    /// Member placing the trade
    #[arg(long)]
    pub member: i64,

    /// Market identifier
    #[arg(long)]
    pub market: String,

    /// Outcome traded [yes, no]
    #[arg(long)]
    pub outcome: Outcome,

    /// Trade side [buy, sell]
    #[arg(long)]
    pub side: TradeSide,

    /// Number of shares
    #[arg(long)]
    pub shares: Decimal,

    /// Price per share
    #[arg(long)]
    pub price: Decimal,

    /// Market slug copied onto the position and trade
    #[arg(long)]
    pub slug: Option<String>,

    /// Market question copied onto the position and trade
    #[arg(long)]
    pub question: Option<String>,
}

/// Arguments for `polyledger rank`.
#[derive(Args, Debug)]
pub struct RankArgs {
    /// Rank only this league (default: every active league)
    #[arg(long)]
    pub league: Option<i64>,
}

/// Subcommands for `polyledger league`.
#[derive(Subcommand, Debug)]
pub enum LeagueCommand {
    /// Create an active league
    Create(LeagueCreateArgs),
    /// Enroll a user in a league
    Enroll(LeagueEnrollArgs),
}

#[derive(Args, Debug)]
pub struct LeagueCreateArgs {
    #[arg(long)]
    pub name: String,

    /// Balance every new member starts with
    #[arg(long)]
    pub capital: Decimal,

    /// Informational per-position cap
    #[arg(long, default_value = "0")]
    pub max_position: Decimal,
}

#[derive(Args, Debug)]
pub struct LeagueEnrollArgs {
    #[arg(long)]
    pub league: i64,

    /// Opaque user identifier
    #[arg(long)]
    pub user: String,
}

/// Subcommands for `polyledger member`.
#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    /// Show balance, open positions and trade history
    Show(MemberShowArgs),
}

#[derive(Args, Debug)]
pub struct MemberShowArgs {
    #[arg(long)]
    pub member: i64,
}
