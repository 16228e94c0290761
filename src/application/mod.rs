//! Application services (use cases).
//!
//! The four ledger engines share a [`LedgerContext`] holding the store, the
//! quote provider and the per-member lock table. [`Ledger`] wires them
//! together behind the caller-facing operations.

pub mod context;
pub mod ledger;
pub mod lock;
pub mod position;
pub mod ranking;
pub mod revaluation;
pub mod settlement;
pub mod sweep;

pub use context::{LedgerContext, DEFAULT_CALL_TIMEOUT};
pub use ledger::{Ledger, MemberStatement};
pub use lock::{MemberGuard, MemberLocks};
pub use position::{PositionChange, PositionEngine, PositionPolicy, TradeReceipt};
pub use ranking::RankingEngine;
pub use revaluation::RevaluationEngine;
pub use settlement::{MarketSettlement, SettlementEngine};
pub use sweep::{MarketTally, SweepControl, SweepHandle, SweepKind, SweepReport, SweepStatus};
