//! Domain validation errors for core domain types.
//!
//! These errors are returned by constructors and parsers that enforce the
//! invariants of ledger records. The application layer maps every variant to
//! [`Error::InvalidInput`](crate::error::Error::InvalidInput).
//!
//! # Examples
//!
//! ```
//! use polyledger::domain::{DomainError, Outcome};
//!
//! let result = Outcome::parse("maybe");
//! assert!(matches!(result, Err(DomainError::UnknownOutcome { .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Share quantities on a trade must be positive.
    #[error("shares must be positive, got {shares}")]
    NonPositiveShares {
        /// The invalid quantity that was provided.
        shares: Decimal,
    },

    /// Trade prices must be positive.
    #[error("price must be positive, got {price}")]
    NonPositivePrice {
        /// The invalid price that was provided.
        price: Decimal,
    },

    /// Outcome labels must be "yes" or "no".
    #[error("unknown outcome '{label}', expected yes or no")]
    UnknownOutcome {
        /// The label that failed to parse.
        label: String,
    },

    /// Trade side labels must be "buy" or "sell".
    #[error("unknown trade side '{label}', expected buy or sell")]
    UnknownSide {
        /// The label that failed to parse.
        label: String,
    },

    /// Market identifiers cannot be blank.
    #[error("market id cannot be empty")]
    EmptyMarketId,

    /// Store identifiers are positive integers.
    #[error("invalid {entity} id {id}")]
    InvalidId {
        /// Entity kind, e.g. "member".
        entity: &'static str,
        /// The raw identifier.
        id: i64,
    },

    /// League names cannot be blank.
    #[error("league name cannot be empty")]
    EmptyLeagueName,

    /// Leagues must start members with some capital.
    #[error("starting capital must be positive, got {capital}")]
    NonPositiveCapital {
        /// The invalid capital amount.
        capital: Decimal,
    },

    /// Ledger arithmetic left the representable decimal range.
    #[error("amount out of range in {op}")]
    Overflow {
        /// The operation that overflowed.
        op: &'static str,
    },
}
