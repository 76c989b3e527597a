//! Scenario runner
//!
//! Wires a voting engine and a governance engine to one power table and one
//! event bus, then replays a [`Scenario`]. Before each action the scheduler
//! ticks at the action's timestamp, the way a host polling a clock would.
//! Failed actions are recorded and the run continues.

use gauge_core::{shared, EngineConfig, EventBus, GaugeError, GaugeEvent, StaticPowerSource};
use gauge_governance::{GovernanceEngine, GovernanceSnapshot, MetricsReport};
use gauge_voting::{GaugeVotingEngine, VotingSnapshot};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::scenario::{Action, Scenario, TimedAction};
use crate::scheduler::{GovernanceHandle, Scheduler, TickReport, VotingHandle};

/// One replayed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub at: u64,
    pub action: String,
    pub tick: TickReport,
    pub outcome: Result<String, GaugeError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub steps: Vec<StepRecord>,
    /// Events seen on the bus, by wire name
    pub event_counts: BTreeMap<&'static str, usize>,
    /// Events lost because the bus buffer overflowed
    pub lagged: u64,
}

impl SimulationReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| s.outcome.is_err())
    }
}

/// Final state written by `--state-out`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    pub voting: VotingSnapshot,
    pub governance: GovernanceSnapshot,
}

pub struct Simulation {
    power: Arc<StaticPowerSource>,
    voting: VotingHandle<StaticPowerSource>,
    governance: GovernanceHandle<StaticPowerSource>,
    scheduler: Scheduler<StaticPowerSource>,
    events: broadcast::Receiver<GaugeEvent>,
}

impl Simulation {
    pub fn new(config: &EngineConfig, scenario: &Scenario) -> Self {
        let power = Arc::new(StaticPowerSource::from_balances(
            scenario.power.iter().map(|(voter, amount)| (voter.clone(), *amount)),
        ));
        power.set_total_supply(scenario.total_supply);

        let bus = EventBus::new(config.events.channel_capacity);
        let events = bus.subscribe();

        let voting = shared(GaugeVotingEngine::new(
            config.voting.clone(),
            power.clone(),
            bus.clone(),
            scenario.genesis,
        ));
        let governance = shared(GovernanceEngine::new(
            config.governance.clone(),
            power.clone(),
            voting.clone(),
            bus,
        ));
        let scheduler = Scheduler::new(voting.clone(), governance.clone());

        info!(
            "Simulation ready: {} voters, genesis {}",
            power.holder_count(),
            scenario.genesis
        );

        Self {
            power,
            voting,
            governance,
            scheduler,
            events,
        }
    }

    /// Build a simulation and replay every action of `scenario`
    pub fn run(config: &EngineConfig, scenario: &Scenario) -> (Self, SimulationReport) {
        let mut simulation = Self::new(config, scenario);
        let mut report = SimulationReport::default();
        simulation.drain_events(&mut report);

        for step in &scenario.actions {
            let record = simulation.step(step);
            report.steps.push(record);
            simulation.drain_events(&mut report);
        }

        info!(
            "Simulation finished: {} actions, {} failed",
            report.steps.len(),
            report.failures().count()
        );
        (simulation, report)
    }

    pub fn step(&mut self, step: &TimedAction) -> StepRecord {
        let tick = self.scheduler.tick(step.at);
        let outcome = self.apply(&step.action, step.at);
        if let Err(e) = &outcome {
            debug!("{} at {} failed: {}", step.action, step.at, e);
        }
        StepRecord {
            at: step.at,
            action: step.action.to_string(),
            tick,
            outcome,
        }
    }

    fn apply(&mut self, action: &Action, now: u64) -> gauge_core::Result<String> {
        match action {
            Action::CreateGauge { pool_id, name } => {
                let id = self.voting.write().create_gauge(pool_id, name, now)?;
                Ok(format!("created {}", id))
            }
            Action::DeactivateGauge { gauge_id } => {
                self.voting.write().deactivate_gauge(gauge_id)?;
                Ok("deactivated".to_string())
            }
            Action::SetPower { voter, power } => {
                let previous = self.power.set_power(voter.clone(), *power).unwrap_or(0);
                Ok(format!("{} -> {}", previous, power))
            }
            Action::Vote {
                voter,
                gauge_id,
                weight,
            } => {
                let vote = self.voting.write().vote(voter, gauge_id, *weight, now)?;
                Ok(format!("{} with {}", vote.id, vote.ve_amount))
            }
            Action::RemoveVote { voter, gauge_id } => {
                let vote = self.voting.write().remove_vote(voter, gauge_id)?;
                Ok(format!("removed {}", vote.id))
            }
            Action::AddBribe {
                gauge_id,
                token,
                amount,
                depositor,
            } => {
                let id = self
                    .voting
                    .write()
                    .add_bribe(gauge_id, token, *amount, depositor, now)?;
                Ok(format!("created {}", id))
            }
            Action::ClaimBribe { voter, bribe_id } => {
                let amount = self.voting.write().claim_bribe(voter, bribe_id, now)?;
                Ok(format!("claimed {}", amount))
            }
            Action::Propose {
                proposer,
                pool_id,
                name,
                description,
                deposit,
            } => {
                let id = self
                    .governance
                    .write()
                    .propose(proposer, pool_id, name, description, *deposit, now)?;
                Ok(format!("created {}", id))
            }
            Action::ProposalVote {
                proposal_id,
                voter,
                support,
            } => {
                let ballot = self
                    .governance
                    .write()
                    .vote(proposal_id, voter, *support, now)?;
                Ok(format!("power {}", ballot.power))
            }
            Action::UpdateMetrics {
                gauge_id,
                volume,
                fees,
                unique_users,
                tvl,
            } => {
                let report = MetricsReport {
                    volume: *volume,
                    fees: *fees,
                    unique_users: *unique_users,
                    tvl: *tvl,
                };
                let metrics = self
                    .governance
                    .write()
                    .update_metrics(gauge_id, &report, now)?;
                Ok(format!("score {}", metrics.score))
            }
            Action::Tick => Ok("tick".to_string()),
        }
    }

    fn drain_events(&mut self, report: &mut SimulationReport) {
        loop {
            match self.events.try_recv() {
                Ok(event) => *report.event_counts.entry(event.name()).or_insert(0) += 1,
                Err(TryRecvError::Lagged(missed)) => report.lagged += missed,
                Err(_) => break,
            }
        }
    }

    pub fn voting(&self) -> &VotingHandle<StaticPowerSource> {
        &self.voting
    }

    pub fn governance(&self) -> &GovernanceHandle<StaticPowerSource> {
        &self.governance
    }

    pub fn state(&self) -> SimulationState {
        SimulationState {
            voting: self.voting.read().snapshot(),
            governance: self.governance.read().snapshot(),
        }
    }
}
