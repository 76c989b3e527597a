//! Scenario files for the simulator
//!
//! A scenario is a JSON document with the initial voting power table and a
//! list of timestamped actions. Amounts are raw fixed-point units (one
//! token is 1_000_000_000). Actions run in file order and their timestamps
//! must never go backwards.
//!
//! ```json
//! {
//!   "genesis": 0,
//!   "total_supply": 1000,
//!   "power": { "alice": 400, "bob": 50 },
//!   "actions": [
//!     { "at": 0, "action": "create_gauge", "pool_id": "pool-a", "name": "A" },
//!     { "at": 5, "action": "vote", "voter": "alice", "gauge_id": "gauge-1", "weight": 100 },
//!     { "at": 604800, "action": "tick" }
//!   ]
//! }
//! ```

use anyhow::{bail, Context, Result};
use gauge_core::{Amount, BribeId, GaugeId, PoolId, ProposalId, VoterId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Opening time of the first epoch
    #[serde(default)]
    pub genesis: u64,

    /// Overrides the sum of the power table when set
    #[serde(default)]
    pub total_supply: Option<Amount>,

    #[serde(default)]
    pub power: BTreeMap<VoterId, Amount>,

    pub actions: Vec<TimedAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedAction {
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    CreateGauge {
        pool_id: PoolId,
        name: String,
    },
    DeactivateGauge {
        gauge_id: GaugeId,
    },
    SetPower {
        voter: VoterId,
        power: Amount,
    },
    Vote {
        voter: VoterId,
        gauge_id: GaugeId,
        weight: u32,
    },
    RemoveVote {
        voter: VoterId,
        gauge_id: GaugeId,
    },
    AddBribe {
        gauge_id: GaugeId,
        token: String,
        amount: Amount,
        depositor: String,
    },
    ClaimBribe {
        voter: VoterId,
        bribe_id: BribeId,
    },
    Propose {
        proposer: VoterId,
        pool_id: PoolId,
        name: String,
        #[serde(default)]
        description: String,
        deposit: Amount,
    },
    ProposalVote {
        proposal_id: ProposalId,
        voter: VoterId,
        support: bool,
    },
    UpdateMetrics {
        gauge_id: GaugeId,
        #[serde(default)]
        volume: Amount,
        #[serde(default)]
        fees: Amount,
        #[serde(default)]
        unique_users: u64,
        #[serde(default)]
        tvl: Amount,
    },
    /// Run the scheduler only
    Tick,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateGauge { pool_id, .. } => write!(f, "create gauge for {}", pool_id),
            Self::DeactivateGauge { gauge_id } => write!(f, "deactivate {}", gauge_id),
            Self::SetPower { voter, power } => write!(f, "set power of {} to {}", voter, power),
            Self::Vote {
                voter,
                gauge_id,
                weight,
            } => write!(f, "{} votes {}% on {}", voter, weight, gauge_id),
            Self::RemoveVote { voter, gauge_id } => {
                write!(f, "{} removes vote on {}", voter, gauge_id)
            }
            Self::AddBribe {
                gauge_id,
                token,
                amount,
                ..
            } => write!(f, "bribe {} {} on {}", amount, token, gauge_id),
            Self::ClaimBribe { voter, bribe_id } => write!(f, "{} claims {}", voter, bribe_id),
            Self::Propose {
                proposer, pool_id, ..
            } => write!(f, "{} proposes {}", proposer, pool_id),
            Self::ProposalVote {
                proposal_id,
                voter,
                support,
            } => {
                let side = if *support { "supports" } else { "vetoes" };
                write!(f, "{} {} {}", voter, side, proposal_id)
            }
            Self::UpdateMetrics { gauge_id, .. } => write!(f, "metrics for {}", gauge_id),
            Self::Tick => write!(f, "tick"),
        }
    }
}

impl Scenario {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("loading scenario {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        let mut previous = self.genesis;
        for (index, step) in self.actions.iter().enumerate() {
            if step.at < previous {
                bail!(
                    "action {} ({}) at {} is earlier than {}",
                    index + 1,
                    step.action,
                    step.at,
                    previous
                );
            }
            previous = step.at;
        }
        Ok(())
    }

    /// Timestamp of the last action, or genesis for an empty scenario
    pub fn end_time(&self) -> u64 {
        self.actions.last().map_or(self.genesis, |a| a.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_actions() {
        let json = r#"{
            "power": { "alice": 10 },
            "actions": [
                { "at": 1, "action": "create_gauge", "pool_id": "pool-a", "name": "A" },
                { "at": 2, "action": "propose", "proposer": "alice", "pool_id": "pool-b",
                  "name": "B", "deposit": 5 },
                { "at": 3, "action": "update_metrics", "gauge_id": "gauge-1", "volume": 7 },
                { "at": 3, "action": "tick" }
            ]
        }"#;
        let scenario = Scenario::from_json(json).unwrap();

        assert_eq!(scenario.genesis, 0);
        assert_eq!(scenario.total_supply, None);
        assert_eq!(scenario.actions.len(), 4);
        assert!(matches!(
            &scenario.actions[1].action,
            Action::Propose { description, deposit: 5, .. } if description.is_empty()
        ));
        assert!(matches!(
            scenario.actions[2].action,
            Action::UpdateMetrics { volume: 7, fees: 0, .. }
        ));
        assert_eq!(scenario.actions[3].action, Action::Tick);
        assert_eq!(scenario.end_time(), 3);
    }

    #[test]
    fn test_timestamps_must_not_go_backwards() {
        let json = r#"{
            "genesis": 10,
            "actions": [ { "at": 5, "action": "tick" } ]
        }"#;
        let err = Scenario::from_json(json).unwrap_err();
        assert!(err.to_string().contains("earlier than 10"));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let json = r#"{ "actions": [ { "at": 1, "action": "mint" } ] }"#;
        assert!(Scenario::from_json(json).is_err());
    }
}
