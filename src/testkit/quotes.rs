//! Scripted quote provider.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{MarketId, MarketQuote};
use crate::error::{Error, Result};
use crate::port::QuoteProvider;

#[derive(Debug, Clone)]
enum Script {
    Quote(MarketQuote),
    Fail,
    Hang,
}

/// A [`QuoteProvider`] answering from per-market scripts.
///
/// Markets without a script answer [`Error::NotFound`]. Every call is
/// counted, including failed ones.
#[derive(Debug, Default)]
pub struct ScriptedQuoteProvider {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `market` with `quote` from now on.
    pub fn set(&self, market: &str, quote: MarketQuote) {
        self.scripts
            .lock()
            .insert(market.to_string(), Script::Quote(quote));
    }

    /// Fail every quote for `market` with a transport error.
    pub fn fail(&self, market: &str) {
        self.scripts.lock().insert(market.to_string(), Script::Fail);
    }

    /// Never answer quotes for `market`.
    pub fn hang(&self, market: &str) {
        self.scripts.lock().insert(market.to_string(), Script::Hang);
    }

    /// Number of quote calls made for `market`.
    pub fn calls(&self, market: &str) -> usize {
        self.calls.lock().get(market).copied().unwrap_or(0)
    }
}

#[async_trait]
impl QuoteProvider for ScriptedQuoteProvider {
    async fn quote(&self, market_id: &MarketId) -> Result<MarketQuote> {
        *self
            .calls
            .lock()
            .entry(market_id.as_str().to_string())
            .or_default() += 1;
        let script = self.scripts.lock().get(market_id.as_str()).cloned();

        match script {
            Some(Script::Quote(quote)) => Ok(quote),
            Some(Script::Fail) => Err(Error::ExternalUnavailable(format!(
                "scripted failure for {market_id}"
            ))),
            Some(Script::Hang) => std::future::pending().await,
            None => Err(Error::not_found("market", market_id)),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
