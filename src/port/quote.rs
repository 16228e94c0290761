//! Quote provider port.

use async_trait::async_trait;

use crate::domain::{MarketId, MarketQuote};
use crate::error::Result;

/// Source of current outcome prices and resolution status.
///
/// Implementations report transport failures as errors; the engines decide
/// whether a failure skips one market or fails the calling operation.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the current quote for a market.
    async fn quote(&self, market_id: &MarketId) -> Result<MarketQuote>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
