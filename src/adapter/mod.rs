//! Port implementations.
//!
//! - [`inbound`] drives the application (the CLI).
//! - [`outbound`] is driven by it (stores and quote providers).

pub mod inbound;
pub mod outbound;
