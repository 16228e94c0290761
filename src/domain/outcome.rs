//! Binary market outcomes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// One of the two resolvable sides of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// Canonical lower-case spelling used in storage and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Yes => "yes",
            Outcome::No => "no",
        }
    }

    /// Parse an outcome label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Result<Self, DomainError> {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case("yes") {
            Ok(Outcome::Yes)
        } else if trimmed.eq_ignore_ascii_case("no") {
            Ok(Outcome::No)
        } else {
            Err(DomainError::UnknownOutcome {
                label: label.to_string(),
            })
        }
    }
}

impl FromStr for Outcome {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
