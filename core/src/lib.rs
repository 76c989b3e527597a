//! Gauge Emissions Core Library
//!
//! Shared building blocks for the gauge voting and governance engines:
//! fixed-point amounts, configuration, errors, notifications, and the
//! collaborator traits (voting power source, gauge registry).

pub mod config;
pub mod error;
pub mod events;
pub mod math;
pub mod power;
pub mod registry;
pub mod shared;

pub use config::{ConfigError, EngineConfig, EventConfig, GovernanceConfig, VotingConfig};
pub use error::{ErrorKind, GaugeError, Result};
pub use events::{EventBus, GaugeEvent, RejectionReason};
pub use power::{StaticPowerSource, VotingPowerSource};
pub use registry::GaugeRegistry;
pub use shared::{shared, Shared};

/// Voting power and token amounts, fixed-point scaled by [`UNIT`].
pub type Amount = u64;

pub type GaugeId = String;
pub type PoolId = String;
pub type VoterId = String;
pub type VoteId = String;
pub type BribeId = String;
pub type ProposalId = String;

/// One whole token (9 decimal places)
pub const UNIT: Amount = 1_000_000_000;

/// Gauge weights are fractions of this value (1.0 == WEIGHT_SCALE)
pub const WEIGHT_SCALE: u64 = 1_000_000_000;

/// Configuration thresholds are expressed in basis points
pub const BPS_SCALE: u32 = 10_000;

/// Upper bound on the sum of a voter's gauge allocations (percent)
pub const MAX_TOTAL_ALLOCATION: u32 = 100;

pub const DAY_SECS: u64 = 86_400;
pub const WEEK_SECS: u64 = 7 * DAY_SECS;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_constants() {
        assert_eq!(UNIT, 1_000_000_000);
        assert_eq!(WEIGHT_SCALE, UNIT);
        assert_eq!(BPS_SCALE, 10_000);
        assert_eq!(WEEK_SECS, 604_800);
    }
}
