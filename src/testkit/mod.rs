//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`fixture`] - `LedgerFixture`: an in-memory store with one league and
//!   helpers for seeding members and positions.
//! - [`quotes`] - `ScriptedQuoteProvider`, a [`QuoteProvider`](crate::port::QuoteProvider)
//!   with per-market scripted answers and call counts.
//! - [`store`] - `FailingStore`, a store wrapper that fails or stalls commits
//!   on demand.

pub mod fixture;
pub mod quotes;
pub mod store;

pub use fixture::LedgerFixture;
pub use quotes::ScriptedQuoteProvider;
pub use store::FailingStore;
