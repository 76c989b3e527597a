//! Gauge Emissions Treasury
//!
//! Accumulates the share of proposal deposits that governance slashes when
//! a proposal is vetoed. Moving the funds is the host's job; the pool keeps
//! the balance and an audit trail.

pub mod error;
pub mod pool;

pub use error::{Result, TreasuryError};
pub use pool::{TreasuryPool, TreasurySource, TreasuryStats, TreasuryTransaction};
