//! Gauge proposals and their resolution rules

use gauge_core::math::ratio_at_least;
use gauge_core::{Amount, GaugeId, GovernanceConfig, PoolId, ProposalId, RejectionReason, VoterId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Accepting ballots
    Pending,
    Vetoed,
    Rejected,
    /// Waiting out the activation delay
    Passed,
    /// Gauge created
    Active,
}

impl ProposalStatus {
    /// Whether a proposal in this state still holds its pool
    pub fn holds_pool(&self) -> bool {
        matches!(self, Self::Pending | Self::Passed | Self::Active)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Vetoed => "vetoed",
            Self::Rejected => "rejected",
            Self::Passed => "passed",
            Self::Active => "active",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotChoice {
    Support,
    Veto,
}

impl From<bool> for BallotChoice {
    fn from(support: bool) -> Self {
        if support {
            Self::Support
        } else {
            Self::Veto
        }
    }
}

/// A voter's current ballot, with the power it carried when cast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub choice: BallotChoice,
    pub power: Amount,
    pub cast_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeProposal {
    pub id: ProposalId,
    pub pool_id: PoolId,
    pub name: String,
    pub description: String,
    pub proposer: VoterId,
    pub deposit: Amount,
    pub created_at: u64,
    pub voting_deadline: u64,
    pub activation_time: Option<u64>,
    pub status: ProposalStatus,
    pub support_votes: Amount,
    pub veto_votes: Amount,
    pub ballots: BTreeMap<VoterId, Ballot>,
    pub gauge_id: Option<GaugeId>,
    pub finalized_at: Option<u64>,
}

impl GaugeProposal {
    /// Total power that took part in the vote
    pub fn participation(&self) -> Amount {
        self.support_votes.saturating_add(self.veto_votes)
    }

    pub fn is_voting_open(&self, now: u64) -> bool {
        self.status == ProposalStatus::Pending && now <= self.voting_deadline
    }

    /// Replace the voter's ballot, moving its power between tally buckets.
    ///
    /// Every ballot change goes through here so the old power always leaves
    /// its bucket before the new power enters one. Returns the replaced
    /// ballot.
    pub(crate) fn set_ballot(&mut self, voter: &str, ballot: Option<Ballot>) -> Option<Ballot> {
        let previous = self.ballots.remove(voter);
        if let Some(old) = &previous {
            let bucket = self.bucket(old.choice);
            *bucket = bucket.saturating_sub(old.power);
        }
        if let Some(ballot) = ballot {
            let bucket = self.bucket(ballot.choice);
            *bucket = bucket.saturating_add(ballot.power);
            self.ballots.insert(voter.to_string(), ballot);
        }
        previous
    }

    fn bucket(&mut self, choice: BallotChoice) -> &mut Amount {
        match choice {
            BallotChoice::Support => &mut self.support_votes,
            BallotChoice::Veto => &mut self.veto_votes,
        }
    }
}

/// Outcome of [`resolve`] before any amounts are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Veto,
    Reject(RejectionReason),
    Pass,
}

/// Apply the resolution rules, in order, to final tallies.
///
/// 1. veto share of total supply at or above the veto threshold
/// 2. participation share of total supply below the minimum
/// 3. support share of participation against the support threshold
///
/// A zero total supply counts as zero participation.
pub fn resolve(support: Amount, veto: Amount, total_supply: Amount, config: &GovernanceConfig) -> Resolution {
    if total_supply > 0 && ratio_at_least(veto, total_supply, config.veto_threshold_bps) {
        return Resolution::Veto;
    }

    let participation = support.saturating_add(veto);
    if total_supply == 0 || !ratio_at_least(participation, total_supply, config.min_participation_bps) {
        return Resolution::Reject(RejectionReason::LowParticipation);
    }

    if ratio_at_least(support, participation, config.support_threshold_bps) {
        Resolution::Pass
    } else {
        Resolution::Reject(RejectionReason::InsufficientSupport)
    }
}

/// What `finalize` decided, with the deposit split it implies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProposalOutcome {
    Vetoed { slashed: Amount, returned: Amount },
    Rejected { reason: RejectionReason, returned: Amount },
    Passed { activation_time: u64 },
}

impl ProposalOutcome {
    pub fn status(&self) -> ProposalStatus {
        match self {
            Self::Vetoed { .. } => ProposalStatus::Vetoed,
            Self::Rejected { .. } => ProposalStatus::Rejected,
            Self::Passed { .. } => ProposalStatus::Passed,
        }
    }
}
