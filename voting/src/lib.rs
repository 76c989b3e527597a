//! Gauge Voting Engine
//!
//! Voters split their voting power across reward gauges, epochs snapshot
//! the resulting emission weights, and third parties bribe gauges to pay
//! the voters who support them.

pub mod bribe;
pub mod engine;
pub mod epoch;
pub mod gauge;
pub mod vote;

pub use bribe::Bribe;
pub use engine::{GaugeVotingEngine, IdSequence, VotingSnapshot, VotingStats};
pub use epoch::Epoch;
pub use gauge::{Gauge, GaugeWeight};
pub use vote::Vote;
