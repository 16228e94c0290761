use std::time::Duration;

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::{Amount, MarketId};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    /// Non-positive shares or price, malformed identifiers.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    /// Quote provider or store transport failure, including timeouts.
    #[error("external service unavailable: {0}")]
    ExternalUnavailable(String),

    /// Market resolved but no single winning outcome could be determined.
    #[error("market {market_id} resolution is ambiguous: {reason}")]
    Ambiguous { market_id: MarketId, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn timed_out(call: &str, limit: Duration) -> Self {
        Error::ExternalUnavailable(format!("{call} timed out after {}ms", limit.as_millis()))
    }

    /// True for caller mistakes that are rejected without touching state.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::NotFound { .. }
                | Error::InsufficientBalance { .. }
        )
    }

    /// True for transport and storage failures a later sweep may recover from.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ExternalUnavailable(_)
                | Error::Http(_)
                | Error::Io(_)
                | Error::Connection(_)
                | Error::Database(_)
        )
    }
}

impl From<DomainError> for Error {
    fn from(e: DomainError) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        Error::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
