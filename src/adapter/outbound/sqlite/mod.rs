//! SQLite persistence adapter.
//!
//! Provides a SQLite-backed [`LedgerStore`](crate::port::LedgerStore) using
//! Diesel ORM with embedded migrations.

pub mod database;
pub mod store;

pub use store::SqliteLedgerStore;
