//! Infrastructure configuration modules.

pub mod ledger;
pub mod logging;
pub mod schedule;
pub mod settings;

pub use ledger::LedgerConfig;
pub use logging::LoggingConfig;
pub use schedule::ScheduleConfig;
pub use settings::Config;
