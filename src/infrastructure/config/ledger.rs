//! Ledger engine settings (`[ledger]` section).

use std::time::Duration;

use serde::Deserialize;

use crate::application::PositionPolicy;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Bound on every quote and store call, in seconds.
    pub call_timeout_secs: u64,
    /// How repeated buys of the same outcome are recorded.
    pub position_policy: PositionPolicy,
}

impl LedgerConfig {
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for a zero call timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.call_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ledger.call_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 30,
            position_policy: PositionPolicy::default(),
        }
    }
}
