//! Sweep intervals (`[schedule]` section).

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub revalue_interval_secs: u64,
    pub settle_interval_secs: u64,
    pub rank_interval_secs: u64,
}

impl ScheduleConfig {
    #[must_use]
    pub fn revalue_interval(&self) -> Duration {
        Duration::from_secs(self.revalue_interval_secs)
    }

    #[must_use]
    pub fn settle_interval(&self) -> Duration {
        Duration::from_secs(self.settle_interval_secs)
    }

    #[must_use]
    pub fn rank_interval(&self) -> Duration {
        Duration::from_secs(self.rank_interval_secs)
    }

    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for any zero interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, secs) in [
            ("schedule.revalue_interval_secs", self.revalue_interval_secs),
            ("schedule.settle_interval_secs", self.settle_interval_secs),
            ("schedule.rank_interval_secs", self.rank_interval_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            revalue_interval_secs: 300,
            settle_interval_secs: 600,
            rank_interval_secs: 900,
        }
    }
}
