//! Gauge engine error types

use std::borrow::Borrow;
use thiserror::Error;

use crate::{Amount, BribeId, GaugeId, PoolId, ProposalId, VoterId};

/// Coarse classification callers can branch on without matching every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    PolicyViolation,
    Ineligible,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GaugeError {
    // Missing entities
    #[error("Gauge not found: {0}")]
    GaugeNotFound(GaugeId),

    #[error("No vote from {voter} on gauge {gauge_id}")]
    VoteNotFound { voter: VoterId, gauge_id: GaugeId },

    #[error("Bribe not found: {0}")]
    BribeNotFound(BribeId),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("No metrics tracked for gauge {0}")]
    MetricsNotFound(GaugeId),

    // Operation outside its valid state
    #[error("Gauge is not active: {0}")]
    GaugeInactive(GaugeId),

    #[error("Epoch {epoch} has not ended: ends at {end_time}, now {now}")]
    EpochNotEnded { epoch: u64, end_time: u64, now: u64 },

    #[error("Bribe {bribe_id} is locked until {unlock_at}")]
    BribeLocked { bribe_id: BribeId, unlock_at: u64 },

    #[error("Proposal {proposal_id} is {status}, expected {expected}")]
    InvalidProposalState {
        proposal_id: ProposalId,
        status: String,
        expected: String,
    },

    #[error("Voting on proposal {proposal_id} closed at {deadline}")]
    VotingClosed { proposal_id: ProposalId, deadline: u64 },

    #[error("Voting on proposal {proposal_id} is open until {deadline}")]
    VotingStillOpen { proposal_id: ProposalId, deadline: u64 },

    #[error("Proposal {proposal_id} cannot activate before {activation_time}")]
    ActivationNotReady {
        proposal_id: ProposalId,
        activation_time: u64,
    },

    // Business rule violations
    #[error("Vote weight {weight}% out of range, max {max}%")]
    WeightOutOfRange { weight: u32, max: u32 },

    #[error("Total allocation would be {}% ({allocated}% already allocated + {requested}%), max {max}%", allocation_total(.allocated, .requested))]
    AllocationExceeded {
        allocated: u32,
        requested: u32,
        max: u32,
    },

    #[error("Insufficient deposit: required {required}, provided {provided}")]
    InsufficientDeposit { required: Amount, provided: Amount },

    #[error("Proposer cooldown active: {remaining_secs} seconds remaining")]
    CooldownActive { remaining_secs: u64 },

    #[error("Pool {pool_id} already has live proposal {proposal_id}")]
    DuplicatePoolProposal {
        pool_id: PoolId,
        proposal_id: ProposalId,
    },

    #[error("Pool {pool_id} already has active gauge {gauge_id}")]
    GaugeExistsForPool { pool_id: PoolId, gauge_id: GaugeId },

    #[error("{voter} already claimed bribe {bribe_id}")]
    AlreadyClaimed { voter: VoterId, bribe_id: BribeId },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid gauge: {0}")]
    InvalidGauge(String),

    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    // Caller lacks standing
    #[error("{0} has no voting power")]
    NoVotingPower(VoterId),

    #[error("{voter} has nothing to claim from bribe {bribe_id}")]
    NothingToClaim { voter: VoterId, bribe_id: BribeId },
}

impl GaugeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GaugeNotFound(_)
            | Self::VoteNotFound { .. }
            | Self::BribeNotFound(_)
            | Self::ProposalNotFound(_)
            | Self::MetricsNotFound(_) => ErrorKind::NotFound,

            Self::GaugeInactive(_)
            | Self::EpochNotEnded { .. }
            | Self::BribeLocked { .. }
            | Self::InvalidProposalState { .. }
            | Self::VotingClosed { .. }
            | Self::VotingStillOpen { .. }
            | Self::ActivationNotReady { .. } => ErrorKind::InvalidState,

            Self::WeightOutOfRange { .. }
            | Self::AllocationExceeded { .. }
            | Self::InsufficientDeposit { .. }
            | Self::CooldownActive { .. }
            | Self::DuplicatePoolProposal { .. }
            | Self::GaugeExistsForPool { .. }
            | Self::AlreadyClaimed { .. }
            | Self::InvalidAmount(_)
            | Self::InvalidGauge(_)
            | Self::InvalidProposal(_) => ErrorKind::PolicyViolation,

            Self::NoVotingPower(_) | Self::NothingToClaim { .. } => ErrorKind::Ineligible,
        }
    }
}

pub type Result<T> = std::result::Result<T, GaugeError>;

fn allocation_total(allocated: impl Borrow<u32>, requested: impl Borrow<u32>) -> u64 {
    u64::from(*allocated.borrow()) + u64::from(*requested.borrow())
}
