//! Engine notifications
//!
//! Engines publish [`GaugeEvent`]s on a broadcast channel the host drains.
//! Publishing never blocks: with no subscribers the event is dropped, and a
//! slow subscriber loses its oldest buffered events instead of stalling the
//! engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

use crate::{Amount, BribeId, GaugeId, PoolId, ProposalId, VoterId};

/// Why a proposal was rejected without being vetoed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    LowParticipation,
    InsufficientSupport,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowParticipation => write!(f, "participation below minimum"),
            Self::InsufficientSupport => write!(f, "support below threshold"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GaugeEvent {
    EpochStarted {
        epoch: u64,
        start_time: u64,
        end_time: u64,
    },

    EpochFinalized {
        epoch: u64,
        total_votes: Amount,
        weights: BTreeMap<GaugeId, u64>,
    },

    GaugeCreated {
        gauge_id: GaugeId,
        pool_id: PoolId,
        name: String,
    },

    GaugeDeactivated { gauge_id: GaugeId },

    VoteCast {
        voter: VoterId,
        gauge_id: GaugeId,
        weight: u32,
        ve_amount: Amount,
        epoch: u64,
    },

    VoteRemoved { voter: VoterId, gauge_id: GaugeId },

    BribeAdded {
        bribe_id: BribeId,
        gauge_id: GaugeId,
        token: String,
        amount: Amount,
        depositor: String,
    },

    BribeClaimed {
        bribe_id: BribeId,
        voter: VoterId,
        amount: Amount,
    },

    ProposalCreated {
        proposal_id: ProposalId,
        pool_id: PoolId,
        proposer: VoterId,
        deposit: Amount,
        voting_deadline: u64,
    },

    ProposalVoted {
        proposal_id: ProposalId,
        voter: VoterId,
        support: bool,
        power: Amount,
    },

    ProposalVetoed {
        proposal_id: ProposalId,
        slashed: Amount,
        returned: Amount,
    },

    ProposalRejected {
        proposal_id: ProposalId,
        reason: RejectionReason,
        returned: Amount,
    },

    ProposalPassed {
        proposal_id: ProposalId,
        activation_time: u64,
    },

    GaugeActivated {
        proposal_id: ProposalId,
        gauge_id: GaugeId,
    },

    MetricsUpdated { gauge_id: GaugeId, score: u32 },
}

impl GaugeEvent {
    /// Wire name of the event, matching its serialized `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::EpochStarted { .. } => "epoch_started",
            Self::EpochFinalized { .. } => "epoch_finalized",
            Self::GaugeCreated { .. } => "gauge_created",
            Self::GaugeDeactivated { .. } => "gauge_deactivated",
            Self::VoteCast { .. } => "vote_cast",
            Self::VoteRemoved { .. } => "vote_removed",
            Self::BribeAdded { .. } => "bribe_added",
            Self::BribeClaimed { .. } => "bribe_claimed",
            Self::ProposalCreated { .. } => "proposal_created",
            Self::ProposalVoted { .. } => "proposal_voted",
            Self::ProposalVetoed { .. } => "proposal_vetoed",
            Self::ProposalRejected { .. } => "proposal_rejected",
            Self::ProposalPassed { .. } => "proposal_passed",
            Self::GaugeActivated { .. } => "gauge_activated",
            Self::MetricsUpdated { .. } => "metrics_updated",
        }
    }
}

/// Cloneable publisher handle; engines sharing a bus share subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GaugeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GaugeEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: GaugeEvent) {
        log::trace!("event {}", event.name());
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::config::EventConfig::default().channel_capacity)
    }
}
