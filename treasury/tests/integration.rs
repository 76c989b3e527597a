use gauge_treasury::*;

#[test]
fn test_treasury_audit_trail() {
    let mut pool = TreasuryPool::new();
    pool.deposit_slash("proposal-1", "alice", 500, 1_000).unwrap();
    pool.deposit_slash("proposal-4", "carol", 120, 2_000).unwrap();

    let trail = pool.transactions();
    assert_eq!(trail[0].balance_after, 500);
    assert_eq!(trail[1].balance_after, 620);
    assert_eq!(
        trail[1].source,
        TreasurySource::ProposalSlash {
            proposal_id: "proposal-4".to_string(),
            proposer: "carol".to_string(),
        }
    );

    let stats = pool.get_stats();
    assert_eq!(stats.balance, 620);
    assert_eq!(stats.total_slashed, 620);
    assert_eq!(stats.slash_count, 2);
    assert_eq!(stats.last_deposit_at, Some(2_000));
}

#[test]
fn test_empty_pool_stats() {
    let pool = TreasuryPool::new();
    assert_eq!(pool.get_stats(), TreasuryStats::default());
}

#[test]
fn test_pool_serializes_for_snapshots() {
    let mut pool = TreasuryPool::new();
    pool.deposit_slash("proposal-1", "alice", 42, 10).unwrap();

    let json = serde_json::to_string(&pool).unwrap();
    assert!(json.contains("\"kind\":\"proposal_slash\""));
    let restored: TreasuryPool = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, pool);
}
