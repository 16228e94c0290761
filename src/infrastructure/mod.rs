//! Infrastructure: configuration, wiring and scheduling.

pub mod bootstrap;
pub mod config;
pub mod scheduler;

pub use bootstrap::build_ledger;
pub use scheduler::Scheduler;
