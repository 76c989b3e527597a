//! Gauge votes

use gauge_core::{Amount, GaugeId, VoteId, VoterId};
use serde::{Deserialize, Serialize};

/// A voter's live allocation to one gauge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub voter: VoterId,
    pub gauge_id: GaugeId,

    /// Percentage of the voter's power (0-100)
    pub weight: u32,

    /// Power committed, `power * weight / 100` at the last (re)calculation
    pub ve_amount: Amount,

    pub epoch: u64,
    pub cast_at: u64,
}

/// Key of the vote ledger: at most one vote per (voter, gauge)
pub(crate) type AllocationKey = (VoterId, GaugeId);

pub(crate) fn allocation_key(voter: &str, gauge_id: &str) -> AllocationKey {
    (voter.to_string(), gauge_id.to_string())
}
