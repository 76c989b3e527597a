//! Settlement epochs

use gauge_core::math::apportion;
use gauge_core::{Amount, GaugeId, WEIGHT_SCALE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gauge::Gauge;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    pub number: u64,
    pub start_time: u64,
    pub end_time: u64,

    /// Votes across active gauges at finalization
    pub total_votes: Amount,

    /// Finalized weight per gauge (of WEIGHT_SCALE)
    pub weights: BTreeMap<GaugeId, u64>,

    pub finalized: bool,
    pub finalized_at: Option<u64>,
}

impl Epoch {
    pub fn open(number: u64, start_time: u64, duration_secs: u64) -> Self {
        Self {
            number,
            start_time,
            end_time: start_time.saturating_add(duration_secs),
            total_votes: 0,
            weights: BTreeMap::new(),
            finalized: false,
            finalized_at: None,
        }
    }

    pub fn has_ended(&self, now: u64) -> bool {
        now >= self.end_time
    }

    pub fn weight_of(&self, gauge_id: &str) -> u64 {
        self.weights.get(gauge_id).copied().unwrap_or(0)
    }
}

/// Weight of every gauge from its share of the votes on active gauges.
///
/// Inactive gauges get 0. Weights sum to exactly WEIGHT_SCALE whenever any
/// active gauge holds votes; leftover rounding units go to the largest
/// remainders, earlier-created gauges first on ties.
pub fn compute_weights(gauges: &[Gauge]) -> (Amount, Vec<u64>) {
    let tallies: Vec<u64> = gauges
        .iter()
        .map(|g| if g.is_active { g.total_votes } else { 0 })
        .collect();
    let total = tallies
        .iter()
        .fold(0u64, |sum, votes| sum.saturating_add(*votes));
    (total, apportion(&tallies, WEIGHT_SCALE))
}
