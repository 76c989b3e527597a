//! End-to-end scenario replays through the scheduler and both engines

use gauge_cli::{Scenario, Simulation, SimulationState};
use gauge_core::{EngineConfig, GaugeError, WEIGHT_SCALE};
use gauge_governance::{ProposalOutcome, ProposalStatus};
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[governance]
min_deposit = 1000
"#;

const LIFECYCLE: &str = r#"{
    "genesis": 0,
    "power": { "alice": 400, "bob": 50, "carol": 550 },
    "actions": [
        { "at": 0, "action": "create_gauge", "pool_id": "pool-a", "name": "A" },
        { "at": 0, "action": "vote", "voter": "alice", "gauge_id": "gauge-1", "weight": 100 },
        { "at": 0, "action": "vote", "voter": "carol", "gauge_id": "gauge-1", "weight": 50 },
        { "at": 10, "action": "add_bribe", "gauge_id": "gauge-1", "token": "USDC",
          "amount": 700, "depositor": "protocol" },
        { "at": 10, "action": "propose", "proposer": "bob", "pool_id": "pool-b",
          "name": "B", "deposit": 1000 },
        { "at": 20, "action": "proposal_vote", "proposal_id": "proposal-1",
          "voter": "alice", "support": true },
        { "at": 20, "action": "proposal_vote", "proposal_id": "proposal-1",
          "voter": "bob", "support": false },
        { "at": 86410, "action": "claim_bribe", "voter": "alice", "bribe_id": "bribe-1" },
        { "at": 86410, "action": "claim_bribe", "voter": "alice", "bribe_id": "bribe-1" },
        { "at": 259210, "action": "tick" },
        { "at": 345610, "action": "vote", "voter": "carol", "gauge_id": "gauge-2", "weight": 50 },
        { "at": 345620, "action": "update_metrics", "gauge_id": "gauge-2", "unique_users": 30 },
        { "at": 604800, "action": "tick" }
    ]
}"#;

fn write_inputs(dir: &TempDir, scenario: &str) -> (EngineConfig, Scenario) {
    let config_path = dir.path().join("engine.toml");
    let scenario_path = dir.path().join("scenario.json");
    fs::write(&config_path, CONFIG).unwrap();
    fs::write(&scenario_path, scenario).unwrap();

    (
        EngineConfig::load_from_file(&config_path).unwrap(),
        Scenario::load_from_file(&scenario_path).unwrap(),
    )
}

#[test]
fn test_full_lifecycle_scenario() {
    let dir = TempDir::new().unwrap();
    let (config, scenario) = write_inputs(&dir, LIFECYCLE);
    assert_eq!(config.governance.min_deposit, 1_000);

    let (simulation, report) = Simulation::run(&config, &scenario);
    let steps = &report.steps;

    // 700 * 400 / 675, rounded down
    assert_eq!(steps[7].outcome, Ok("claimed 414".to_string()));
    assert!(matches!(
        steps[8].outcome,
        Err(GaugeError::AlreadyClaimed { .. })
    ));
    assert_eq!(report.failures().count(), 1);

    assert!(matches!(
        steps[9].tick.resolved.as_slice(),
        [(id, ProposalOutcome::Passed { activation_time: 345_610 })] if id == "proposal-1"
    ));
    assert_eq!(
        steps[10].tick.activated,
        vec![("proposal-1".to_string(), "gauge-2".to_string())]
    );
    assert_eq!(steps[11].outcome, Ok("score 300".to_string()));

    let epoch = steps[12].tick.finalized_epoch.as_ref().unwrap();
    assert_eq!(epoch.number, 1);
    assert_eq!(epoch.total_votes, 950);
    assert_eq!(epoch.weights.values().sum::<u64>(), WEIGHT_SCALE);
    assert!(epoch.weight_of("gauge-1") > epoch.weight_of("gauge-2"));

    assert_eq!(report.event_counts["epoch_started"], 2);
    assert_eq!(report.event_counts["epoch_finalized"], 1);
    assert_eq!(report.event_counts["vote_cast"], 3);
    assert_eq!(report.event_counts["bribe_claimed"], 1);
    assert_eq!(report.event_counts["gauge_activated"], 1);
    assert_eq!(report.lagged, 0);

    let governance = simulation.governance().read();
    let proposal = governance.get_proposal("proposal-1").unwrap();
    assert_eq!(proposal.status, ProposalStatus::Active);
    assert_eq!(governance.get_metrics("gauge-2").unwrap().score, 300);
}

#[test]
fn test_vetoed_proposal_funds_treasury() {
    let json = r#"{
        "power": { "alice": 300, "bob": 150 },
        "total_supply": 1000,
        "actions": [
            { "at": 0, "action": "propose", "proposer": "alice", "pool_id": "pool-x",
              "name": "X", "deposit": 1000 },
            { "at": 1, "action": "proposal_vote", "proposal_id": "proposal-1",
              "voter": "alice", "support": true },
            { "at": 1, "action": "proposal_vote", "proposal_id": "proposal-1",
              "voter": "bob", "support": false },
            { "at": 259200, "action": "tick" },
            { "at": 259200, "action": "propose", "proposer": "alice", "pool_id": "pool-x",
              "name": "X", "deposit": 1000 }
        ]
    }"#;
    let config = EngineConfig::from_toml_str(CONFIG).unwrap();
    let scenario = Scenario::from_json(json).unwrap();
    let (simulation, report) = Simulation::run(&config, &scenario);

    assert_eq!(
        report.steps[3].tick.resolved,
        vec![(
            "proposal-1".to_string(),
            ProposalOutcome::Vetoed {
                slashed: 500,
                returned: 500,
            }
        )]
    );
    // the pool is free again but alice is still cooling down
    assert!(matches!(
        report.steps[4].outcome,
        Err(GaugeError::CooldownActive { .. })
    ));
    assert_eq!(simulation.governance().read().treasury().balance(), 500);
}

#[test]
fn test_state_out_round_trips() {
    let dir = TempDir::new().unwrap();
    let (config, scenario) = write_inputs(&dir, LIFECYCLE);
    let (simulation, _) = Simulation::run(&config, &scenario);

    let path = dir.path().join("state.json");
    let state = simulation.state();
    fs::write(&path, serde_json::to_string_pretty(&state).unwrap()).unwrap();

    let loaded: SimulationState = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, state);
    assert_eq!(loaded.voting.gauges.len(), 2);
    assert_eq!(loaded.voting.finalized_epochs.len(), 1);
    assert_eq!(loaded.governance.proposals.len(), 1);
}

#[test]
fn test_default_config_written_by_config_command_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("default.toml");
    EngineConfig::default().save_to_file(&path).unwrap();

    let loaded = EngineConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, EngineConfig::default());
}
