//! Time-driven transitions
//!
//! The engines never act on their own clock. A host calls
//! [`Scheduler::tick`] with the current time and the scheduler advances the
//! epoch when it is due, finalizes proposals whose voting closed, and
//! activates passed proposals whose delay has elapsed.

use gauge_core::{GaugeError, GaugeId, ProposalId, Shared, VotingPowerSource};
use gauge_governance::{GovernanceEngine, ProposalOutcome};
use gauge_voting::{Epoch, GaugeVotingEngine};
use log::{debug, warn};

pub type VotingHandle<P> = Shared<GaugeVotingEngine<P>>;
pub type GovernanceHandle<P> = Shared<GovernanceEngine<P, VotingHandle<P>>>;

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub now: u64,
    pub finalized_epoch: Option<Epoch>,
    pub resolved: Vec<(ProposalId, ProposalOutcome)>,
    pub activated: Vec<(ProposalId, GaugeId)>,
    pub failures: Vec<(ProposalId, GaugeError)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.finalized_epoch.is_none()
            && self.resolved.is_empty()
            && self.activated.is_empty()
            && self.failures.is_empty()
    }
}

pub struct Scheduler<P: VotingPowerSource> {
    voting: VotingHandle<P>,
    governance: GovernanceHandle<P>,
}

impl<P: VotingPowerSource> Scheduler<P> {
    pub fn new(voting: VotingHandle<P>, governance: GovernanceHandle<P>) -> Self {
        Self { voting, governance }
    }

    pub fn tick(&self, now: u64) -> TickReport {
        let mut report = TickReport {
            now,
            ..Default::default()
        };

        {
            let mut voting = self.voting.write();
            if voting.should_advance_epoch(now) {
                match voting.advance_epoch(now) {
                    Ok(epoch) => report.finalized_epoch = Some(epoch),
                    Err(e) => warn!("Epoch advance at {} failed: {}", now, e),
                }
            }
        }

        let mut governance = self.governance.write();
        for proposal_id in governance.get_pending_finalization(now) {
            match governance.finalize(&proposal_id, now) {
                Ok(outcome) => report.resolved.push((proposal_id, outcome)),
                Err(e) => {
                    warn!("Finalizing {} failed: {}", proposal_id, e);
                    report.failures.push((proposal_id, e));
                }
            }
        }

        for proposal_id in governance.get_ready_for_activation(now) {
            match governance.activate(&proposal_id, now) {
                Ok(gauge_id) => report.activated.push((proposal_id, gauge_id)),
                Err(e) => {
                    warn!("Activating {} failed: {}", proposal_id, e);
                    report.failures.push((proposal_id, e));
                }
            }
        }

        if !report.is_empty() {
            debug!(
                "tick {}: epoch {:?}, {} resolved, {} activated, {} failed",
                now,
                report.finalized_epoch.as_ref().map(|e| e.number),
                report.resolved.len(),
                report.activated.len(),
                report.failures.len()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauge_core::{
        shared, EventBus, GovernanceConfig, StaticPowerSource, VotingConfig, DAY_SECS, WEEK_SECS,
    };
    use gauge_governance::ProposalStatus;
    use std::sync::Arc;

    type Setup = (
        Scheduler<StaticPowerSource>,
        VotingHandle<StaticPowerSource>,
        GovernanceHandle<StaticPowerSource>,
    );

    fn setup() -> Setup {
        let power = Arc::new(StaticPowerSource::from_balances([("alice", 1_000u64)]));
        let bus = EventBus::new(64);
        let voting = shared(GaugeVotingEngine::new(
            VotingConfig::default(),
            power.clone(),
            bus.clone(),
            0,
        ));
        let config = GovernanceConfig {
            min_deposit: 10,
            ..GovernanceConfig::default()
        };
        let governance = shared(GovernanceEngine::new(config, power, voting.clone(), bus));
        let scheduler = Scheduler::new(voting.clone(), governance.clone());
        (scheduler, voting, governance)
    }

    #[test]
    fn test_idle_tick_does_nothing() {
        let (scheduler, voting, _) = setup();
        let report = scheduler.tick(10);
        assert!(report.is_empty());
        assert_eq!(voting.read().current_epoch().number, 1);
    }

    #[test]
    fn test_tick_advances_epoch_when_due() {
        let (scheduler, voting, _) = setup();
        assert!(scheduler.tick(WEEK_SECS - 1).finalized_epoch.is_none());

        let report = scheduler.tick(WEEK_SECS);
        assert_eq!(report.finalized_epoch.map(|e| e.number), Some(1));
        assert_eq!(voting.read().current_epoch().number, 2);
    }

    #[test]
    fn test_tick_runs_proposal_lifecycle() {
        let (scheduler, voting, governance) = setup();
        let id = {
            let mut gov = governance.write();
            let id = gov.propose("alice", "pool-a", "A", "", 10, 0).unwrap();
            gov.vote(&id, "alice", true, 1).unwrap();
            id
        };

        let report = scheduler.tick(3 * DAY_SECS);
        assert_eq!(report.resolved.len(), 1);
        assert!(matches!(report.resolved[0].1, ProposalOutcome::Passed { .. }));
        assert!(report.activated.is_empty());

        let report = scheduler.tick(4 * DAY_SECS);
        assert_eq!(report.activated, vec![(id.clone(), "gauge-1".to_string())]);
        assert_eq!(
            governance.read().get_proposal(&id).unwrap().status,
            ProposalStatus::Active
        );
        assert!(voting.read().get_gauge("gauge-1").is_some());

        // nothing left to do
        assert!(scheduler.tick(5 * DAY_SECS).is_empty());
    }

    #[test]
    fn test_activation_failure_is_reported() {
        let (scheduler, voting, governance) = setup();
        {
            let mut gov = governance.write();
            let id = gov.propose("alice", "pool-a", "A", "", 10, 0).unwrap();
            gov.vote(&id, "alice", true, 1).unwrap();
        }
        scheduler.tick(3 * DAY_SECS);
        voting.write().create_gauge("pool-a", "A", 3 * DAY_SECS).unwrap();

        let report = scheduler.tick(4 * DAY_SECS);
        assert!(report.activated.is_empty());
        assert!(matches!(
            report.failures[0].1,
            GaugeError::GaugeExistsForPool { .. }
        ));
    }
}
