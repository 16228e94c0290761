//! Polyledger - settlement and accounting core for a fantasy
//! prediction-market trading league.
//!
//! Members of a league trade simulated positions on real prediction markets.
//! This crate turns trade requests, live quotes and market resolutions into
//! balances, realized and unrealized pnl, and league rankings.
//!
//! # Architecture
//!
//! The crate uses a ports-and-adapters layout:
//!
//! - [`domain`] - Records and the arithmetic that moves them (no I/O)
//! - [`port`] - `LedgerStore` and `QuoteProvider` contracts
//! - [`adapter`] - SQLite and in-memory stores, the Gamma quote client, the CLI
//! - [`application`] - Position, revaluation, settlement and ranking engines
//!   behind the [`Ledger`](application::Ledger) facade
//! - [`infrastructure`] - Configuration, logging and the sweep scheduler
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use polyledger::infrastructure::{build_ledger, config::Config};
//!
//! # async fn demo() -> polyledger::error::Result<()> {
//! let config = Config::load_or_default("config.toml")?;
//! let ledger = build_ledger(&config)?;
//! let ranked = ledger.recompute_ranks(None).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
