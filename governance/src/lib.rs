//! Permissionless Gauge Governance
//!
//! Anyone with a deposit can propose a gauge for a new pool. Token holders
//! support or veto the proposal; vetoed proposals lose part of their
//! deposit to the treasury, passed ones become live gauges after a delay
//! and are scored by the performance tracker.

pub mod engine;
pub mod metrics;
pub mod proposal;

pub use engine::{GovernanceEngine, GovernanceSnapshot, GovernanceStats};
pub use metrics::{GaugeMetrics, MetricsReport, PerformanceTracker};
pub use proposal::{resolve, Ballot, BallotChoice, GaugeProposal, ProposalOutcome, ProposalStatus, Resolution};
