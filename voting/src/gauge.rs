//! Gauge types

use gauge_core::{Amount, GaugeId, PoolId};
use serde::{Deserialize, Serialize};

use crate::bribe::Bribe;

/// A reward-eligible pool tracked by the voting engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    pub id: GaugeId,
    pub pool_id: PoolId,
    pub name: String,

    /// Share of emissions from the last finalized epoch (of WEIGHT_SCALE)
    pub current_weight: u64,

    /// Sum of `ve_amount` over live votes
    pub total_votes: Amount,

    /// Live votes carrying non-zero power
    pub voter_count: u32,

    pub bribes: Vec<Bribe>,
    pub is_active: bool,
    pub created_at: u64,
}

impl Gauge {
    pub fn new(id: GaugeId, pool_id: PoolId, name: String, created_at: u64) -> Self {
        Self {
            id,
            pool_id,
            name,
            current_weight: 0,
            total_votes: 0,
            voter_count: 0,
            bribes: Vec::new(),
            is_active: true,
            created_at,
        }
    }

    pub(crate) fn add_contribution(&mut self, ve_amount: Amount) {
        if ve_amount > 0 {
            self.total_votes = self.total_votes.saturating_add(ve_amount);
            self.voter_count += 1;
        }
    }

    pub(crate) fn remove_contribution(&mut self, ve_amount: Amount) {
        if ve_amount > 0 {
            self.total_votes = self.total_votes.saturating_sub(ve_amount);
            self.voter_count = self.voter_count.saturating_sub(1);
        }
    }

    pub(crate) fn reset_tally(&mut self) {
        self.total_votes = 0;
        self.voter_count = 0;
    }

    pub fn bribe(&self, bribe_id: &str) -> Option<&Bribe> {
        self.bribes.iter().find(|b| b.id == bribe_id)
    }
}

/// Row of the gauge weight listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeWeight {
    pub gauge_id: GaugeId,
    pub pool_id: PoolId,
    pub name: String,
    pub current_weight: u64,
    pub total_votes: Amount,
    pub voter_count: u32,
    pub is_active: bool,

    /// Whether the finalized weight reaches the configured emissions minimum
    pub meets_minimum: bool,
}
