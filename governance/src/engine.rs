//! Permissionless governance engine
//!
//! Owns the proposal table, the proposer cooldown clock, the treasury pool
//! and the performance tracker. Gauges are created only through the
//! [`GaugeRegistry`] handed in by the host.

use gauge_core::math::apply_bps;
use gauge_core::{
    Amount, EventBus, GaugeError, GaugeEvent, GaugeId, GaugeRegistry, GovernanceConfig,
    ProposalId, Result, VoterId, VotingPowerSource,
};
use gauge_treasury::TreasuryPool;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::metrics::{GaugeMetrics, MetricsReport, PerformanceTracker};
use crate::proposal::{
    resolve, Ballot, BallotChoice, GaugeProposal, ProposalOutcome, ProposalStatus, Resolution,
};

/// Serializable view of the governance state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub proposals: Vec<GaugeProposal>,
    pub last_proposal_at: BTreeMap<VoterId, u64>,
    pub treasury: TreasuryPool,
    pub metrics: Vec<GaugeMetrics>,
    pub proposal_sequence: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceStats {
    pub total_proposals: usize,
    pub pending: usize,
    pub passed: usize,
    pub active: usize,
    pub vetoed: usize,
    pub rejected: usize,
    pub total_slashed: Amount,
    pub treasury_balance: Amount,
    pub tracked_gauges: usize,
}

pub struct GovernanceEngine<P: VotingPowerSource + ?Sized, R: GaugeRegistry> {
    config: GovernanceConfig,
    power: Arc<P>,
    registry: R,
    events: EventBus,

    /// Submission order
    proposals: Vec<GaugeProposal>,
    proposal_index: HashMap<ProposalId, usize>,

    /// Proposer -> time of their latest proposal
    last_proposal_at: HashMap<VoterId, u64>,

    treasury: TreasuryPool,
    tracker: PerformanceTracker,
    proposal_sequence: u64,
}

impl<P: VotingPowerSource + ?Sized, R: GaugeRegistry> GovernanceEngine<P, R> {
    pub fn new(config: GovernanceConfig, power: Arc<P>, registry: R, events: EventBus) -> Self {
        Self {
            config,
            power,
            registry,
            events,
            proposals: Vec::new(),
            proposal_index: HashMap::new(),
            last_proposal_at: HashMap::new(),
            treasury: TreasuryPool::new(),
            tracker: PerformanceTracker::new(),
            proposal_sequence: 0,
        }
    }

    /// Rebuild an engine from a snapshot taken with [`Self::snapshot`]
    pub fn restore(
        config: GovernanceConfig,
        power: Arc<P>,
        registry: R,
        events: EventBus,
        snapshot: GovernanceSnapshot,
    ) -> Self {
        let proposal_index = snapshot
            .proposals
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        info!(
            "governance engine restored with {} proposals",
            snapshot.proposals.len()
        );

        Self {
            config,
            power,
            registry,
            events,
            proposals: snapshot.proposals,
            proposal_index,
            last_proposal_at: snapshot.last_proposal_at.into_iter().collect(),
            treasury: snapshot.treasury,
            tracker: PerformanceTracker::from_metrics(snapshot.metrics),
            proposal_sequence: snapshot.proposal_sequence,
        }
    }

    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            proposals: self.proposals.clone(),
            last_proposal_at: self
                .last_proposal_at
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            treasury: self.treasury.clone(),
            metrics: self.tracker.metrics().to_vec(),
            proposal_sequence: self.proposal_sequence,
        }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn treasury(&self) -> &TreasuryPool {
        &self.treasury
    }

    // Proposals

    /// Submit a proposal to add a gauge for `pool_id`.
    ///
    /// The proposer's cooldown starts immediately, whatever the outcome.
    pub fn propose(
        &mut self,
        proposer: &str,
        pool_id: &str,
        name: &str,
        description: &str,
        deposit: Amount,
        now: u64,
    ) -> Result<ProposalId> {
        let pool_id = pool_id.trim();
        let name = name.trim();
        if pool_id.is_empty() {
            return Err(GaugeError::InvalidProposal("pool id is empty".to_string()));
        }
        if name.is_empty() {
            return Err(GaugeError::InvalidProposal("name is empty".to_string()));
        }
        if deposit < self.config.min_deposit {
            return Err(GaugeError::InsufficientDeposit {
                required: self.config.min_deposit,
                provided: deposit,
            });
        }

        let remaining_secs = self.cooldown_remaining(proposer, now);
        if remaining_secs > 0 {
            return Err(GaugeError::CooldownActive { remaining_secs });
        }

        if let Some(live) = self
            .proposals
            .iter()
            .find(|p| p.pool_id == pool_id && p.status.holds_pool())
        {
            return Err(GaugeError::DuplicatePoolProposal {
                pool_id: pool_id.to_string(),
                proposal_id: live.id.clone(),
            });
        }
        if let Some(gauge_id) = self.registry.active_gauge_for_pool(pool_id) {
            return Err(GaugeError::GaugeExistsForPool {
                pool_id: pool_id.to_string(),
                gauge_id,
            });
        }

        self.proposal_sequence += 1;
        let id = format!("proposal-{}", self.proposal_sequence);
        let voting_deadline = now.saturating_add(self.config.voting_period_secs);

        self.proposals.push(GaugeProposal {
            id: id.clone(),
            pool_id: pool_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            proposer: proposer.to_string(),
            deposit,
            created_at: now,
            voting_deadline,
            activation_time: None,
            status: ProposalStatus::Pending,
            support_votes: 0,
            veto_votes: 0,
            ballots: BTreeMap::new(),
            gauge_id: None,
            finalized_at: None,
        });
        self.proposal_index.insert(id.clone(), self.proposals.len() - 1);
        self.last_proposal_at.insert(proposer.to_string(), now);

        info!(
            "Proposal {} by {} for pool {} (deposit {}, voting until {})",
            id, proposer, pool_id, deposit, voting_deadline
        );
        self.events.publish(GaugeEvent::ProposalCreated {
            proposal_id: id.clone(),
            pool_id: pool_id.to_string(),
            proposer: proposer.to_string(),
            deposit,
            voting_deadline,
        });

        Ok(id)
    }

    /// Cast or replace `voter`'s ballot. The ballot carries the voter's
    /// power at the time it is cast.
    pub fn vote(&mut self, proposal_id: &str, voter: &str, support: bool, now: u64) -> Result<Ballot> {
        let position = self.proposal_position(proposal_id)?;
        let proposal = &self.proposals[position];
        if proposal.status != ProposalStatus::Pending {
            return Err(invalid_state(proposal, "pending"));
        }
        if !proposal.is_voting_open(now) {
            return Err(GaugeError::VotingClosed {
                proposal_id: proposal_id.to_string(),
                deadline: proposal.voting_deadline,
            });
        }

        let power = self.power.current_power(voter);
        if power == 0 {
            return Err(GaugeError::NoVotingPower(voter.to_string()));
        }

        let ballot = Ballot {
            choice: BallotChoice::from(support),
            power,
            cast_at: now,
        };
        let proposal = &mut self.proposals[position];
        let replaced = proposal.set_ballot(voter, Some(ballot.clone()));

        debug!(
            "{} voted {:?} on {} with {} (replaced: {}), support {} veto {}",
            voter,
            ballot.choice,
            proposal_id,
            power,
            replaced.is_some(),
            proposal.support_votes,
            proposal.veto_votes
        );
        self.events.publish(GaugeEvent::ProposalVoted {
            proposal_id: proposal_id.to_string(),
            voter: voter.to_string(),
            support,
            power,
        });

        Ok(ballot)
    }

    /// Resolve a proposal once its voting period is over.
    ///
    /// Vetoed proposals have part of their deposit slashed into the
    /// treasury; the rest of the deposit is reported as returned.
    pub fn finalize(&mut self, proposal_id: &str, now: u64) -> Result<ProposalOutcome> {
        let position = self.proposal_position(proposal_id)?;
        let proposal = &self.proposals[position];
        if proposal.status != ProposalStatus::Pending {
            return Err(invalid_state(proposal, "pending"));
        }
        if now < proposal.voting_deadline {
            return Err(GaugeError::VotingStillOpen {
                proposal_id: proposal_id.to_string(),
                deadline: proposal.voting_deadline,
            });
        }

        let total_supply = self.power.total_power();
        let deposit = proposal.deposit;
        let outcome = match resolve(
            proposal.support_votes,
            proposal.veto_votes,
            total_supply,
            &self.config,
        ) {
            Resolution::Veto => {
                let slashed = apply_bps(deposit, self.config.slash_bps);
                ProposalOutcome::Vetoed {
                    slashed,
                    returned: deposit.saturating_sub(slashed),
                }
            }
            Resolution::Reject(reason) => ProposalOutcome::Rejected {
                reason,
                returned: deposit,
            },
            Resolution::Pass => ProposalOutcome::Passed {
                activation_time: now.saturating_add(self.config.activation_delay_secs),
            },
        };

        // The treasury is the only step that can still fail
        if let ProposalOutcome::Vetoed { slashed, .. } = outcome {
            if slashed > 0 {
                self.treasury
                    .deposit_slash(proposal_id, &proposal.proposer, slashed, now)
                    .map_err(|e| GaugeError::InvalidAmount(e.to_string()))?;
            }
        }

        let proposal = &mut self.proposals[position];
        proposal.status = outcome.status();
        proposal.finalized_at = Some(now);

        let event = match outcome {
            ProposalOutcome::Vetoed { slashed, returned } => {
                warn!(
                    "Proposal {} vetoed ({} of {} supply): slashed {}, returned {}",
                    proposal_id, proposal.veto_votes, total_supply, slashed, returned
                );
                GaugeEvent::ProposalVetoed {
                    proposal_id: proposal_id.to_string(),
                    slashed,
                    returned,
                }
            }
            ProposalOutcome::Rejected { reason, returned } => {
                info!("Proposal {} rejected: {}", proposal_id, reason);
                GaugeEvent::ProposalRejected {
                    proposal_id: proposal_id.to_string(),
                    reason,
                    returned,
                }
            }
            ProposalOutcome::Passed { activation_time } => {
                proposal.activation_time = Some(activation_time);
                info!(
                    "Proposal {} passed ({} for, {} against), activates at {}",
                    proposal_id, proposal.support_votes, proposal.veto_votes, activation_time
                );
                GaugeEvent::ProposalPassed {
                    proposal_id: proposal_id.to_string(),
                    activation_time,
                }
            }
        };
        self.events.publish(event);

        Ok(outcome)
    }

    /// Create the gauge for a passed proposal whose delay has elapsed.
    ///
    /// If the registry refuses (an operator registered a gauge for the same
    /// pool in the meantime) the error is returned and the proposal stays
    /// `Passed`, still holding its pool. The call can be retried; it succeeds
    /// once the conflicting gauge is deactivated.
    pub fn activate(&mut self, proposal_id: &str, now: u64) -> Result<GaugeId> {
        let position = self.proposal_position(proposal_id)?;
        let proposal = &self.proposals[position];
        if proposal.status != ProposalStatus::Passed {
            return Err(invalid_state(proposal, "passed"));
        }
        let activation_time = proposal.activation_time.unwrap_or(proposal.voting_deadline);
        if now < activation_time {
            return Err(GaugeError::ActivationNotReady {
                proposal_id: proposal_id.to_string(),
                activation_time,
            });
        }

        let gauge_id = self
            .registry
            .create_gauge(&proposal.pool_id, &proposal.name, now)?;

        let proposal = &mut self.proposals[position];
        proposal.gauge_id = Some(gauge_id.clone());
        proposal.status = ProposalStatus::Active;
        self.tracker.track(&gauge_id, proposal_id, now);

        info!(
            "Proposal {} activated as gauge {} for pool {}",
            proposal_id, gauge_id, proposal.pool_id
        );
        self.events.publish(GaugeEvent::GaugeActivated {
            proposal_id: proposal_id.to_string(),
            gauge_id: gauge_id.clone(),
        });

        Ok(gauge_id)
    }

    // Scheduler queries

    /// Pending proposals whose voting period is over
    pub fn get_pending_finalization(&self, now: u64) -> Vec<ProposalId> {
        self.proposals
            .iter()
            .filter(|p| p.status == ProposalStatus::Pending && now >= p.voting_deadline)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Passed proposals whose activation delay has elapsed
    pub fn get_ready_for_activation(&self, now: u64) -> Vec<ProposalId> {
        self.proposals
            .iter()
            .filter(|p| {
                p.status == ProposalStatus::Passed
                    && p.activation_time.is_some_and(|t| now >= t)
            })
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn get_proposal(&self, proposal_id: &str) -> Option<&GaugeProposal> {
        self.proposal_index
            .get(proposal_id)
            .map(|i| &self.proposals[*i])
    }

    /// Proposals in submission order, optionally filtered by status
    pub fn list_proposals(&self, status: Option<ProposalStatus>) -> Vec<&GaugeProposal> {
        self.proposals
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .collect()
    }

    /// Seconds until `proposer` may submit again (0 when free to propose)
    pub fn cooldown_remaining(&self, proposer: &str, now: u64) -> u64 {
        self.last_proposal_at
            .get(proposer)
            .map_or(0, |last| {
                last.saturating_add(self.config.proposer_cooldown_secs)
                    .saturating_sub(now)
            })
    }

    // Performance tracking

    pub fn update_metrics(
        &mut self,
        gauge_id: &str,
        report: &MetricsReport,
        now: u64,
    ) -> Result<GaugeMetrics> {
        let metrics = self.tracker.update_metrics(gauge_id, report, now)?.clone();
        debug!(
            "Metrics for {}: volume {}, fees {}, users {}, score {}",
            gauge_id, metrics.total_volume, metrics.total_fees, metrics.unique_users, metrics.score
        );
        self.events.publish(GaugeEvent::MetricsUpdated {
            gauge_id: gauge_id.to_string(),
            score: metrics.score,
        });
        Ok(metrics)
    }

    pub fn get_metrics(&self, gauge_id: &str) -> Option<&GaugeMetrics> {
        self.tracker.get_metrics(gauge_id)
    }

    pub fn get_gauge_rankings(&self) -> Vec<&GaugeMetrics> {
        self.tracker.get_gauge_rankings()
    }

    pub fn get_stats(&self) -> GovernanceStats {
        let mut stats = GovernanceStats {
            total_proposals: self.proposals.len(),
            total_slashed: self.treasury.total_slashed(),
            treasury_balance: self.treasury.balance(),
            tracked_gauges: self.tracker.metrics().len(),
            ..Default::default()
        };
        for proposal in &self.proposals {
            match proposal.status {
                ProposalStatus::Pending => stats.pending += 1,
                ProposalStatus::Passed => stats.passed += 1,
                ProposalStatus::Active => stats.active += 1,
                ProposalStatus::Vetoed => stats.vetoed += 1,
                ProposalStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }

    fn proposal_position(&self, proposal_id: &str) -> Result<usize> {
        self.proposal_index
            .get(proposal_id)
            .copied()
            .ok_or_else(|| GaugeError::ProposalNotFound(proposal_id.to_string()))
    }
}

fn invalid_state(proposal: &GaugeProposal, expected: &str) -> GaugeError {
    GaugeError::InvalidProposalState {
        proposal_id: proposal.id.clone(),
        status: proposal.status.to_string(),
        expected: expected.to_string(),
    }
}
