//! Bribe ledger scenarios

use gauge_core::{Amount, ErrorKind, EventBus, GaugeError, StaticPowerSource, VotingConfig, DAY_SECS};
use gauge_voting::GaugeVotingEngine;
use std::sync::Arc;

const START: u64 = 10_000;

fn setup(balances: &[(&str, Amount)]) -> (GaugeVotingEngine<StaticPowerSource>, Arc<StaticPowerSource>, String) {
    let power = Arc::new(StaticPowerSource::from_balances(
        balances.iter().map(|(v, p)| (v.to_string(), *p)),
    ));
    let mut engine = GaugeVotingEngine::new(
        VotingConfig::default(),
        power.clone(),
        EventBus::new(64),
        START,
    );
    let gauge = engine.create_gauge("pool-a", "Pool A", START).unwrap();
    (engine, power, gauge)
}

/// Voters holding 40 and 60 of a gauge's 100 votes split a 100-token bribe 40/60
#[test]
fn test_bribe_pro_rata() {
    let (mut engine, _, gauge) = setup(&[("alice", 40), ("bob", 60)]);
    engine.vote("alice", &gauge, 100, START).unwrap();
    engine.vote("bob", &gauge, 100, START).unwrap();
    assert_eq!(engine.get_gauge(&gauge).unwrap().total_votes, 100);

    let bribe = engine.add_bribe(&gauge, "USDC", 100, "protocol", START).unwrap();
    let unlocked = START + DAY_SECS;

    assert_eq!(engine.claimable_bribe("alice", &bribe, unlocked), 40);
    assert_eq!(engine.claim_bribe("alice", &bribe, unlocked).unwrap(), 40);
    assert_eq!(engine.claim_bribe("bob", &bribe, unlocked).unwrap(), 60);

    let recorded = engine.get_bribe(&bribe).unwrap();
    assert_eq!(recorded.claimed_total(), 100);
    assert_eq!(recorded.remaining(), 0);
    assert_eq!(recorded.claims.get("alice"), Some(&40));
}

#[test]
fn test_claim_locked_until_delay_elapses() {
    let (mut engine, _, gauge) = setup(&[("alice", 40)]);
    engine.vote("alice", &gauge, 100, START).unwrap();
    let bribe = engine.add_bribe(&gauge, "USDC", 100, "protocol", START).unwrap();

    let err = engine
        .claim_bribe("alice", &bribe, START + DAY_SECS - 1)
        .unwrap_err();
    assert_eq!(
        err,
        GaugeError::BribeLocked {
            bribe_id: bribe.clone(),
            unlock_at: START + DAY_SECS,
        }
    );
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(engine.claimable_bribe("alice", &bribe, START), 0);

    // nothing was recorded by the failed attempt
    assert!(!engine.get_bribe(&bribe).unwrap().has_claimed("alice"));
    assert!(engine.claim_bribe("alice", &bribe, START + DAY_SECS).is_ok());
}

#[test]
fn test_second_claim_always_fails() {
    let (mut engine, _, gauge) = setup(&[("alice", 40), ("bob", 60)]);
    engine.vote("alice", &gauge, 100, START).unwrap();
    engine.vote("bob", &gauge, 100, START).unwrap();
    let bribe = engine.add_bribe(&gauge, "USDC", 100, "protocol", START).unwrap();
    let unlocked = START + DAY_SECS;

    engine.claim_bribe("alice", &bribe, unlocked).unwrap();
    // even after bob leaves and alice would own the whole gauge
    engine.remove_vote("bob", &gauge).unwrap();

    assert!(matches!(
        engine.claim_bribe("alice", &bribe, unlocked + 1),
        Err(GaugeError::AlreadyClaimed { .. })
    ));
    assert_eq!(engine.claimable_bribe("alice", &bribe, unlocked + 1), 0);
    assert_eq!(engine.get_bribe(&bribe).unwrap().claims["alice"], 40);
}

#[test]
fn test_non_voter_has_nothing_to_claim() {
    let (mut engine, _, gauge) = setup(&[("alice", 40), ("carol", 10)]);
    engine.vote("alice", &gauge, 100, START).unwrap();
    let bribe = engine.add_bribe(&gauge, "USDC", 100, "protocol", START).unwrap();

    let err = engine
        .claim_bribe("carol", &bribe, START + DAY_SECS)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ineligible);

    assert!(matches!(
        engine.claim_bribe("alice", "bribe-99", START + DAY_SECS),
        Err(GaugeError::BribeNotFound(_))
    ));
}

/// Shares are pro-rated against live totals at claim time, not the totals
/// when the bribe was deposited.
#[test]
fn test_share_uses_totals_at_claim_time() {
    let (mut engine, _, gauge) = setup(&[("alice", 40), ("bob", 60), ("carol", 100)]);
    engine.vote("alice", &gauge, 100, START).unwrap();
    engine.vote("bob", &gauge, 100, START).unwrap();
    let bribe = engine.add_bribe(&gauge, "USDC", 100, "protocol", START).unwrap();

    // carol votes after the deposit and dilutes everyone
    engine.vote("carol", &gauge, 100, START + 1).unwrap();
    let unlocked = START + DAY_SECS;

    assert_eq!(engine.claim_bribe("alice", &bribe, unlocked).unwrap(), 20);
    assert_eq!(engine.claim_bribe("carol", &bribe, unlocked).unwrap(), 50);

    // carol leaves: bob's live share would be 60 but only 30 is left

    engine.remove_vote("carol", &gauge).unwrap();
    assert_eq!(engine.claim_bribe("bob", &bribe, unlocked).unwrap(), 30);
    assert_eq!(engine.get_bribe(&bribe).unwrap().remaining(), 0);
}

#[test]
fn test_add_bribe_validation() {
    let (mut engine, _, gauge) = setup(&[]);
    assert!(matches!(
        engine.add_bribe(&gauge, "USDC", 0, "protocol", START),
        Err(GaugeError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine.add_bribe(&gauge, " ", 10, "protocol", START),
        Err(GaugeError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine.add_bribe("gauge-9", "USDC", 10, "protocol", START),
        Err(GaugeError::GaugeNotFound(_))
    ));

    engine.deactivate_gauge(&gauge).unwrap();
    assert!(matches!(
        engine.add_bribe(&gauge, "USDC", 10, "protocol", START),
        Err(GaugeError::GaugeInactive(_))
    ));
    assert!(engine.get_bribes(&gauge).unwrap().is_empty());
}

#[test]
fn test_bribes_keep_deposit_order_and_epoch() {
    let (mut engine, _, gauge) = setup(&[]);
    let first = engine.add_bribe(&gauge, "USDC", 10, "a", START).unwrap();
    let end = engine.current_epoch().end_time;
    engine.advance_epoch(end).unwrap();
    let second = engine.add_bribe(&gauge, "DAI", 20, "b", end).unwrap();

    let bribes = engine.get_bribes(&gauge).unwrap();
    assert_eq!(bribes.len(), 2);
    assert_eq!(bribes[0].id, first);
    assert_eq!(bribes[0].epoch, 1);
    assert_eq!(bribes[1].id, second);
    assert_eq!(bribes[1].epoch, 2);
}
