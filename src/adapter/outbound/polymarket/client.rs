//! Gamma API quote client.
//!
//! Fetches one market per call from `GET {gamma_url}/markets/{id}` and
//! normalizes it into a [`MarketQuote`]. Connect failures and timeouts are
//! retried with a fixed backoff; everything else fails immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::response::GammaMarket;
use super::settings::GammaConfig;
use crate::domain::{MarketId, MarketQuote};
use crate::error::{Error, Result};
use crate::port::QuoteProvider;

/// HTTP client for the Polymarket Gamma API.
pub struct GammaQuoteProvider {
    http: HttpClient,
    gamma_url: String,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
}

impl GammaQuoteProvider {
    /// Create a client with default HTTP settings and no retries.
    #[must_use]
    pub fn new(gamma_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            gamma_url: gamma_url.into(),
            retry_max_attempts: 1,
            retry_backoff_ms: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &GammaConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            gamma_url: config.gamma_url.clone(),
            retry_max_attempts: config.retry_max_attempts,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    fn market_url(&self, market_id: &MarketId) -> String {
        format!(
            "{}/markets/{}",
            self.gamma_url.trim_end_matches('/'),
            market_id
        )
    }

    async fn get_with_retry<T>(&self, url: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        let max_attempts = self.retry_max_attempts.max(1);

        loop {
            attempt += 1;
            let response = match self.http.get(url).send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                    continue;
                }
            };

            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let response = response.error_for_status()?;

            match response.json::<T>().await {
                Ok(parsed) => return Ok(Some(parsed)),
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                }
            }
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn backoff(&self, attempt: u32, max_attempts: u32, err: &reqwest::Error) {
        warn!(
            attempt,
            max_attempts,
            error = %err,
            "HTTP request failed, retrying"
        );
        if self.retry_backoff_ms > 0 {
            sleep(Duration::from_millis(self.retry_backoff_ms)).await;
        }
    }

    /// Fetch the raw Gamma record for a market.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] when Gamma does not know the market and a
    /// transport error otherwise.
    pub async fn get_market(&self, market_id: &MarketId) -> Result<GammaMarket> {
        let url = self.market_url(market_id);
        debug!(url = %url, "Fetching market (Gamma)");
        self.get_with_retry::<GammaMarket>(&url)
            .await?
            .ok_or_else(|| Error::not_found("market", market_id))
    }
}

#[async_trait]
impl QuoteProvider for GammaQuoteProvider {
    async fn quote(&self, market_id: &MarketId) -> Result<MarketQuote> {
        let market = self.get_market(market_id).await?;
        Ok(market.into_quote(market_id.clone()))
    }

    fn name(&self) -> &'static str {
        "gamma"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_url_joins_without_double_slash() {
        let client = GammaQuoteProvider::new("https://gamma.example.com/");
        assert_eq!(
            client.market_url(&MarketId::new("512")),
            "https://gamma.example.com/markets/512"
        );
    }

    #[test]
    fn from_config_keeps_retry_settings() {
        let config = GammaConfig {
            gamma_url: "https://custom-gamma.example.com".into(),
            retry_max_attempts: 5,
            retry_backoff_ms: 10,
            ..Default::default()
        };
        let client = GammaQuoteProvider::from_config(&config);
        assert_eq!(client.retry_max_attempts, 5);
        assert_eq!(client.retry_backoff_ms, 10);
        assert_eq!(client.name(), "gamma");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_retryable_failure() {
        let config = GammaConfig {
            gamma_url: "http://127.0.0.1:9".into(),
            timeout_ms: 1_000,
            connect_timeout_ms: 500,
            retry_max_attempts: 1,
            retry_backoff_ms: 0,
        };
        let client = GammaQuoteProvider::from_config(&config);
        let err = client.quote(&MarketId::new("512")).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
