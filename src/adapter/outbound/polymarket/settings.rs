//! Gamma quote client configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// HTTP settings for the Gamma quote client (`[quotes]` section).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GammaConfig {
    /// Gamma API base URL.
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum number of attempts for transient failures.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Backoff between retries in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".into()
}

const fn default_timeout_ms() -> u64 {
    30_000
}

const fn default_connect_timeout_ms() -> u64 {
    5_000
}

const fn default_retry_max_attempts() -> u32 {
    2
}

const fn default_retry_backoff_ms() -> u64 {
    250
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl GammaConfig {
    /// Reject settings the client cannot run with.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for an empty URL or zero timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gamma_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "quotes.gamma_url",
                reason: "must not be empty".into(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "quotes.timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "quotes.connect_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_section() {
        let config: GammaConfig = toml::from_str("").unwrap();
        assert_eq!(config, GammaConfig::default());
        assert_eq!(config.retry_max_attempts, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_url_and_zero_timeout() {
        let config = GammaConfig {
            gamma_url: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "quotes.gamma_url", .. })
        ));

        let config = GammaConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "quotes.timeout_ms", .. })
        ));
    }
}
