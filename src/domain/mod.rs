//! Ledger domain: typed records and the arithmetic that moves them.
//!
//! Nothing in this module performs I/O. Engines in
//! [`application`](crate::application) read records through the
//! [`LedgerStore`](crate::port::LedgerStore) port, use the methods here to
//! compute new state, and commit the result as one batch.

pub mod error;
pub mod id;
pub mod league;
pub mod money;
pub mod outcome;
pub mod position;
pub mod quote;
pub mod trade;

pub use error::DomainError;
pub use id::{LeagueId, MarketId, MemberId, PositionId, TradeId};
pub use league::{win_rate, League, LeagueStatus, Member, MemberPatch, NewLeague, NewMember};
pub use money::{Amount, Price, Shares};
pub use outcome::Outcome;
pub use position::{NewPosition, Position, PositionPatch, SettlementAmounts};
pub use quote::{MarketQuote, DEFAULT_OUTCOME_PRICE};
pub use trade::{NewTrade, Trade, TradeKind, TradeRequest, TradeSide};
