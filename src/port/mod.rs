//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with the two
//! collaborators the ledger engines depend on.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │  (position, revaluation,│
//!                    │   settlement, ranking)  │
//!                    └───────────┬─────────────┘
//!                                │
//!               ┌────────────────┴────────────────┐
//!               ▼                                 ▼
//!        ┌─────────────┐                   ┌─────────────┐
//!        │   Quote     │                   │   Ledger    │
//!        │  Provider   │                   │    Store    │
//!        └─────────────┘                   └─────────────┘
//!         gamma adapter                    sqlite / memory
//! ```
//!
//! # Available Ports
//!
//! - [`QuoteProvider`] - Current prices and resolution status per market
//! - [`LedgerStore`] - Members, leagues, positions and trades with atomic batches

mod quote;
mod store;

pub use quote::QuoteProvider;
pub use store::{
    CommitReceipt, LeagueFilter, LedgerBatch, LedgerOp, LedgerStore, MemberFilter,
    PositionFilter, TradeFilter,
};
