//! Outbound adapters (driven side).

pub mod memory;
pub mod polymarket;
pub mod sqlite;
