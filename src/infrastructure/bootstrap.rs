//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::polymarket::GammaQuoteProvider;
use crate::adapter::outbound::sqlite::SqliteLedgerStore;
use crate::application::{Ledger, LedgerContext};
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::port::{LedgerStore, QuoteProvider};

/// Open the SQLite store and Gamma client described by `config` and wire
/// them into a [`Ledger`].
///
/// # Errors
/// Returns [`Error::Database`](crate::error::Error::Database) when the
/// database cannot be opened or migrated.
pub fn build_ledger(config: &Config) -> Result<Ledger> {
    let store: Arc<dyn LedgerStore> = Arc::new(SqliteLedgerStore::open(&config.database)?);
    let quotes: Arc<dyn QuoteProvider> = Arc::new(GammaQuoteProvider::from_config(&config.quotes));
    info!(
        database = %config.database,
        quotes = quotes.name(),
        policy = ?config.ledger.position_policy,
        "ledger ready"
    );

    let ctx = LedgerContext::new(store, quotes).with_call_timeout(config.ledger.call_timeout());
    Ok(Ledger::new(ctx, config.ledger.position_policy))
}
