//! Polymarket Gamma API integration.
//!
//! Supplies prices and resolution status for the ledger's revaluation and
//! settlement sweeps.

pub mod client;
pub mod response;
pub mod settings;

pub use client::GammaQuoteProvider;
pub use settings::GammaConfig;
