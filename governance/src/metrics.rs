//! Performance tracking for gauges created through governance
//!
//! Scores are kept in hundredths of a point: four sub-scores of up to 25
//! points each make a composite between 0 and 100 points (0..=10_000).

use gauge_core::math::{ema_tenth, mul_div};
use gauge_core::{Amount, GaugeError, GaugeId, ProposalId, Result, UNIT, WEEK_SECS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weekly volume worth one point
pub const VOLUME_SCALE: Amount = 10_000 * UNIT;
/// Weekly fees worth one point
pub const FEES_SCALE: Amount = 100 * UNIT;
/// Unique users worth one point
pub const USERS_SCALE: u64 = 10;
/// Average TVL worth one point
pub const TVL_SCALE: Amount = 40_000 * UNIT;

/// Cap on each sub-score (25 points)
pub const SUB_SCORE_CAP: u32 = 2_500;
pub const MAX_SCORE: u32 = 4 * SUB_SCORE_CAP;

/// One periodic report from an external metrics feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Volume routed since the previous report
    pub volume: Amount,
    /// Fees generated since the previous report
    pub fees: Amount,
    pub unique_users: u64,
    /// Current total value locked
    pub tvl: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeMetrics {
    pub gauge_id: GaugeId,
    pub proposal_id: ProposalId,
    pub activated_at: u64,
    pub last_updated: u64,
    pub total_volume: Amount,
    pub total_fees: Amount,
    /// Highest unique-user count reported so far
    pub unique_users: u64,
    /// Exponential moving average, starting from zero
    pub avg_tvl: Amount,
    pub score: u32,
    pub updates: u64,
}

impl GaugeMetrics {
    fn new(gauge_id: &str, proposal_id: &str, now: u64) -> Self {
        Self {
            gauge_id: gauge_id.to_string(),
            proposal_id: proposal_id.to_string(),
            activated_at: now,
            last_updated: now,
            total_volume: 0,
            total_fees: 0,
            unique_users: 0,
            avg_tvl: 0,
            score: 0,
            updates: 0,
        }
    }

    fn apply(&mut self, report: &MetricsReport, now: u64) {
        self.total_volume = self.total_volume.saturating_add(report.volume);
        self.total_fees = self.total_fees.saturating_add(report.fees);
        self.unique_users = self.unique_users.max(report.unique_users);
        self.avg_tvl = ema_tenth(self.avg_tvl, report.tvl);
        self.last_updated = now.max(self.last_updated);
        self.updates += 1;
        self.score = self.compute_score(now);
    }

    /// Cumulative amount scaled to a per-week rate. Gauges younger than a
    /// week are measured as if a full week had passed.
    fn weekly(&self, total: Amount, now: u64) -> Amount {
        let elapsed = now.saturating_sub(self.activated_at).max(WEEK_SECS);
        mul_div(total, WEEK_SECS, elapsed)
    }

    pub fn weekly_volume(&self, now: u64) -> Amount {
        self.weekly(self.total_volume, now)
    }

    pub fn weekly_fees(&self, now: u64) -> Amount {
        self.weekly(self.total_fees, now)
    }

    fn compute_score(&self, now: u64) -> u32 {
        sub_score(self.weekly_volume(now), VOLUME_SCALE)
            + sub_score(self.weekly_fees(now), FEES_SCALE)
            + sub_score(self.unique_users, USERS_SCALE)
            + sub_score(self.avg_tvl, TVL_SCALE)
    }
}

fn sub_score(value: u64, scale: u64) -> u32 {
    let hundredths = mul_div(value, 100, scale).min(SUB_SCORE_CAP as u64);
    hundredths as u32
}

/// Metrics for every gauge activated through governance, in activation order
#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    metrics: Vec<GaugeMetrics>,
    index: HashMap<GaugeId, usize>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_metrics(metrics: Vec<GaugeMetrics>) -> Self {
        let index = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| (m.gauge_id.clone(), i))
            .collect();
        Self { metrics, index }
    }

    /// Start tracking a freshly activated gauge. Tracking an already tracked
    /// gauge keeps the existing entry.
    pub fn track(&mut self, gauge_id: &str, proposal_id: &str, now: u64) -> &GaugeMetrics {
        let position = match self.index.get(gauge_id).copied() {
            Some(position) => position,
            None => {
                self.metrics.push(GaugeMetrics::new(gauge_id, proposal_id, now));
                let position = self.metrics.len() - 1;
                self.index.insert(gauge_id.to_string(), position);
                position
            }
        };
        &self.metrics[position]
    }

    pub fn update_metrics(
        &mut self,
        gauge_id: &str,
        report: &MetricsReport,
        now: u64,
    ) -> Result<&GaugeMetrics> {
        let position = *self
            .index
            .get(gauge_id)
            .ok_or_else(|| GaugeError::MetricsNotFound(gauge_id.to_string()))?;
        self.metrics[position].apply(report, now);
        Ok(&self.metrics[position])
    }

    pub fn get_metrics(&self, gauge_id: &str) -> Option<&GaugeMetrics> {
        self.index.get(gauge_id).map(|i| &self.metrics[*i])
    }

    /// Highest score first; equal scores keep activation order
    pub fn get_gauge_rankings(&self) -> Vec<&GaugeMetrics> {
        let mut ranked: Vec<&GaugeMetrics> = self.metrics.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    pub fn metrics(&self) -> &[GaugeMetrics] {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_accumulates_and_tracks_high_water_mark() {
        let mut tracker = PerformanceTracker::new();
        tracker.track("gauge-1", "proposal-1", 0);

        let report = MetricsReport {
            volume: 100,
            fees: 10,
            unique_users: 50,
            tvl: 1_000,
        };
        tracker.update_metrics("gauge-1", &report, 10).unwrap();
        let second = MetricsReport {
            unique_users: 20,
            ..report
        };
        let m = tracker.update_metrics("gauge-1", &second, 20).unwrap();

        assert_eq!(m.total_volume, 200);
        assert_eq!(m.total_fees, 20);
        assert_eq!(m.unique_users, 50);
        // 0 -> 100 -> 190
        assert_eq!(m.avg_tvl, 190);
        assert_eq!(m.updates, 2);
        assert_eq!(m.last_updated, 20);
    }

    #[test]
    fn test_sub_scores_are_capped() {
        let mut tracker = PerformanceTracker::new();
        tracker.track("gauge-1", "proposal-1", 0);

        let huge = MetricsReport {
            volume: u64::MAX / 2,
            fees: u64::MAX / 2,
            unique_users: 1_000_000,
            tvl: 0,
        };
        let m = tracker.update_metrics("gauge-1", &huge, WEEK_SECS).unwrap();
        // tvl average is still zero
        assert_eq!(m.score, 3 * SUB_SCORE_CAP);

        for _ in 0..200 {
            let report = MetricsReport {
                tvl: u64::MAX / 2,
                ..Default::default()
            };
            tracker.update_metrics("gauge-1", &report, WEEK_SECS).unwrap();
        }
        assert_eq!(tracker.get_metrics("gauge-1").unwrap().score, MAX_SCORE);
    }

    #[test]
    fn test_volume_is_weekly_normalized() {
        let mut tracker = PerformanceTracker::new();
        tracker.track("gauge-1", "proposal-1", 0);

        let report = MetricsReport {
            volume: 20_000 * UNIT,
            ..Default::default()
        };
        // two weeks in: 10k per week, one point
        let m = tracker.update_metrics("gauge-1", &report, 2 * WEEK_SECS).unwrap();
        assert_eq!(m.weekly_volume(2 * WEEK_SECS), 10_000 * UNIT);
        assert_eq!(m.score, 100);

        // a young gauge is measured over a full week
        tracker.track("gauge-2", "proposal-2", 0);
        let m = tracker.update_metrics("gauge-2", &report, 60).unwrap();
        assert_eq!(m.score, 200);
    }

    #[test]
    fn test_unknown_gauge() {
        let mut tracker = PerformanceTracker::new();
        assert_eq!(
            tracker.update_metrics("gauge-9", &MetricsReport::default(), 0),
            Err(GaugeError::MetricsNotFound("gauge-9".to_string()))
        );
    }

    #[test]
    fn test_rankings_stable_on_ties() {
        let mut tracker = PerformanceTracker::new();
        for i in 1..=3 {
            tracker.track(&format!("gauge-{}", i), &format!("proposal-{}", i), 0);
        }
        let users = |n| MetricsReport {
            unique_users: n,
            ..Default::default()
        };
        tracker.update_metrics("gauge-1", &users(10), 1).unwrap();
        tracker.update_metrics("gauge-2", &users(30), 1).unwrap();
        tracker.update_metrics("gauge-3", &users(10), 1).unwrap();

        let order: Vec<&str> = tracker
            .get_gauge_rankings()
            .iter()
            .map(|m| m.gauge_id.as_str())
            .collect();
        assert_eq!(order, vec!["gauge-2", "gauge-1", "gauge-3"]);

        let restored = PerformanceTracker::from_metrics(tracker.metrics().to_vec());
        assert_eq!(restored.get_metrics("gauge-2").unwrap().score, 300);
    }
}
