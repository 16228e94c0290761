//! Monetary types for price, share and balance representation.
//!
//! All arithmetic on ledger amounts goes through the checked helpers here so
//! that out-of-range values surface as [`DomainError::Overflow`] instead of
//! panicking inside `Decimal`'s operators.

use rust_decimal::Decimal;

use super::error::DomainError;

/// Price per share, represented as a Decimal for precision.
pub type Price = Decimal;

/// Share quantity, represented as a Decimal for precision.
pub type Shares = Decimal;

/// Balance or profit/loss amount.
pub type Amount = Decimal;

/// Value of `shares` at `price`.
pub fn notional(shares: Shares, price: Price) -> Result<Amount, DomainError> {
    shares.checked_mul(price).ok_or(DomainError::Overflow { op: "notional" })
}

/// Mark-to-market profit of `shares` bought at `entry` and valued at `mark`.
pub fn mark_pnl(mark: Price, entry: Price, shares: Shares) -> Result<Amount, DomainError> {
    mark.checked_sub(entry)
        .and_then(|delta| delta.checked_mul(shares))
        .ok_or(DomainError::Overflow { op: "mark pnl" })
}

/// `a + b`, failing instead of panicking when out of range.
pub fn add(a: Amount, b: Amount) -> Result<Amount, DomainError> {
    a.checked_add(b).ok_or(DomainError::Overflow { op: "add" })
}

/// `a - b`, failing instead of panicking when out of range.
pub fn sub(a: Amount, b: Amount) -> Result<Amount, DomainError> {
    a.checked_sub(b).ok_or(DomainError::Overflow { op: "subtract" })
}
