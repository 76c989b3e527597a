//! Gauge voting engine
//!
//! Owns the gauge registry, the vote ledger, the epoch history and the
//! bribe ledger. Every mutating call validates completely before touching
//! state, so a failed call leaves the engine exactly as it was.

use gauge_core::math::percent_of;
use gauge_core::{
    Amount, BribeId, EventBus, GaugeError, GaugeEvent, GaugeId, GaugeRegistry, Result,
    VotingConfig, VotingPowerSource, MAX_TOTAL_ALLOCATION,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::bribe::Bribe;
use crate::epoch::{compute_weights, Epoch};
use crate::gauge::{Gauge, GaugeWeight};
use crate::vote::{allocation_key, AllocationKey, Vote};

/// Last identifier handed out per entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence {
    pub gauges: u64,
    pub votes: u64,
    pub bribes: u64,
}

/// Serializable view of the whole engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSnapshot {
    pub current_epoch: Epoch,
    pub finalized_epochs: Vec<Epoch>,
    pub gauges: Vec<Gauge>,
    pub votes: Vec<Vote>,
    pub sequence: IdSequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingStats {
    pub current_epoch: u64,
    pub epoch_end_time: u64,
    pub total_gauges: usize,
    pub active_gauges: usize,
    pub total_votes: Amount,
    pub unique_voters: usize,
    pub live_votes: usize,
    pub total_bribes: usize,
}

pub struct GaugeVotingEngine<P: VotingPowerSource + ?Sized> {
    config: VotingConfig,
    power: Arc<P>,
    events: EventBus,

    /// Creation order; gauges are never removed
    gauges: Vec<Gauge>,
    gauge_index: HashMap<GaugeId, usize>,

    votes: BTreeMap<AllocationKey, Vote>,

    /// Bribe id -> position of its gauge
    bribe_index: HashMap<BribeId, usize>,

    current: Epoch,
    history: Vec<Epoch>,
    sequence: IdSequence,
}

impl<P: VotingPowerSource + ?Sized> GaugeVotingEngine<P> {
    /// Create an engine whose first epoch opens at `genesis`
    pub fn new(config: VotingConfig, power: Arc<P>, events: EventBus, genesis: u64) -> Self {
        let current = Epoch::open(1, genesis, config.epoch_duration_secs);
        info!(
            "gauge voting engine started: epoch 1 [{}, {})",
            current.start_time, current.end_time
        );
        events.publish(GaugeEvent::EpochStarted {
            epoch: current.number,
            start_time: current.start_time,
            end_time: current.end_time,
        });

        Self {
            config,
            power,
            events,
            gauges: Vec::new(),
            gauge_index: HashMap::new(),
            votes: BTreeMap::new(),
            bribe_index: HashMap::new(),
            current,
            history: Vec::new(),
            sequence: IdSequence::default(),
        }
    }

    /// Rebuild an engine from a snapshot taken with [`Self::snapshot`]
    pub fn restore(
        config: VotingConfig,
        power: Arc<P>,
        events: EventBus,
        snapshot: VotingSnapshot,
    ) -> Self {
        let mut gauge_index = HashMap::new();
        let mut bribe_index = HashMap::new();
        for (position, gauge) in snapshot.gauges.iter().enumerate() {
            gauge_index.insert(gauge.id.clone(), position);
            for bribe in &gauge.bribes {
                bribe_index.insert(bribe.id.clone(), position);
            }
        }

        let votes = snapshot
            .votes
            .into_iter()
            .map(|vote| (allocation_key(&vote.voter, &vote.gauge_id), vote))
            .collect();

        info!(
            "gauge voting engine restored at epoch {} with {} gauges",
            snapshot.current_epoch.number,
            snapshot.gauges.len()
        );

        let mut engine = Self {
            config,
            power,
            events,
            gauges: snapshot.gauges,
            gauge_index,
            votes,
            bribe_index,
            current: snapshot.current_epoch,
            history: snapshot.finalized_epochs,
            sequence: snapshot.sequence,
        };
        // Gauge tallies are derived state; the stored votes are authoritative
        engine.rebuild_tallies();
        engine
    }

    pub fn snapshot(&self) -> VotingSnapshot {
        VotingSnapshot {
            current_epoch: self.current.clone(),
            finalized_epochs: self.history.clone(),
            gauges: self.gauges.clone(),
            votes: self.votes.values().cloned().collect(),
            sequence: self.sequence.clone(),
        }
    }

    pub fn config(&self) -> &VotingConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ------------------------------------------------------------------
    // Gauge registry
    // ------------------------------------------------------------------

    pub fn create_gauge(&mut self, pool_id: &str, name: &str, now: u64) -> Result<GaugeId> {
        let pool_id = pool_id.trim();
        let name = name.trim();
        if pool_id.is_empty() {
            return Err(GaugeError::InvalidGauge("pool id must not be empty".to_string()));
        }
        if name.is_empty() {
            return Err(GaugeError::InvalidGauge("gauge name must not be empty".to_string()));
        }
        if let Some(existing) = self.gauge_for_pool(pool_id) {
            return Err(GaugeError::GaugeExistsForPool {
                pool_id: pool_id.to_string(),
                gauge_id: existing.id.clone(),
            });
        }

        self.sequence.gauges += 1;
        let id = format!("gauge-{}", self.sequence.gauges);
        let gauge = Gauge::new(id.clone(), pool_id.to_string(), name.to_string(), now);

        self.gauge_index.insert(id.clone(), self.gauges.len());
        self.gauges.push(gauge);

        info!("gauge {} created for pool {} ({})", id, pool_id, name);
        self.events.publish(GaugeEvent::GaugeCreated {
            gauge_id: id.clone(),
            pool_id: pool_id.to_string(),
            name: name.to_string(),
        });

        Ok(id)
    }

    /// Stop a gauge from receiving votes, bribes and emissions weight.
    ///
    /// Existing votes and bribes stay on record; voters can still remove
    /// their votes to free the allocation.
    pub fn deactivate_gauge(&mut self, gauge_id: &str) -> Result<()> {
        let position = self.gauge_position(gauge_id)?;
        let gauge = &mut self.gauges[position];
        if !gauge.is_active {
            return Err(GaugeError::GaugeInactive(gauge_id.to_string()));
        }
        gauge.is_active = false;

        info!("gauge {} deactivated", gauge_id);
        self.events.publish(GaugeEvent::GaugeDeactivated {
            gauge_id: gauge_id.to_string(),
        });
        Ok(())
    }

    pub fn get_gauge(&self, gauge_id: &str) -> Option<&Gauge> {
        self.gauge_index.get(gauge_id).map(|&pos| &self.gauges[pos])
    }

    pub fn gauges(&self) -> &[Gauge] {
        &self.gauges
    }

    /// The active gauge for a pool, if any
    pub fn gauge_for_pool(&self, pool_id: &str) -> Option<&Gauge> {
        self.gauges
            .iter()
            .find(|g| g.is_active && g.pool_id == pool_id)
    }

    fn gauge_position(&self, gauge_id: &str) -> Result<usize> {
        self.gauge_index
            .get(gauge_id)
            .copied()
            .ok_or_else(|| GaugeError::GaugeNotFound(gauge_id.to_string()))
    }

    // ------------------------------------------------------------------
    // Votes
    // ------------------------------------------------------------------

    /// Allocate `weight` percent of the voter's power to a gauge.
    ///
    /// Replaces any earlier vote from the same voter on the same gauge.
    pub fn vote(&mut self, voter: &str, gauge_id: &str, weight: u32, now: u64) -> Result<Vote> {
        let position = self.gauge_position(gauge_id)?;
        if !self.gauges[position].is_active {
            return Err(GaugeError::GaugeInactive(gauge_id.to_string()));
        }
        if weight > self.config.max_user_weight {
            return Err(GaugeError::WeightOutOfRange {
                weight,
                max: self.config.max_user_weight,
            });
        }

        let power = self.power.current_power(voter);
        if power == 0 {
            return Err(GaugeError::NoVotingPower(voter.to_string()));
        }

        // A re-vote on the same gauge frees its old weight first
        let key = allocation_key(voter, gauge_id);
        let existing = self.votes.get(&key).map_or(0, |v| v.weight);
        let allocated = self.get_voter_allocation(voter).saturating_sub(existing);
        if allocated.saturating_add(weight) > MAX_TOTAL_ALLOCATION {
            return Err(GaugeError::AllocationExceeded {
                allocated,
                requested: weight,
                max: MAX_TOTAL_ALLOCATION,
            });
        }

        self.sequence.votes += 1;
        let vote = Vote {
            id: format!("vote-{}", self.sequence.votes),
            voter: voter.to_string(),
            gauge_id: gauge_id.to_string(),
            weight,
            ve_amount: percent_of(power, weight),
            epoch: self.current.number,
            cast_at: now,
        };
        self.apply_allocation(key, Some(vote.clone()));

        debug!(
            "{} voted {}% ({} power) on {}",
            voter, weight, vote.ve_amount, gauge_id
        );
        self.events.publish(GaugeEvent::VoteCast {
            voter: vote.voter.clone(),
            gauge_id: vote.gauge_id.clone(),
            weight,
            ve_amount: vote.ve_amount,
            epoch: vote.epoch,
        });

        Ok(vote)
    }

    pub fn remove_vote(&mut self, voter: &str, gauge_id: &str) -> Result<Vote> {
        // Removing a missing key leaves every tally untouched
        let Some(removed) = self.apply_allocation(allocation_key(voter, gauge_id), None) else {
            return Err(GaugeError::VoteNotFound {
                voter: voter.to_string(),
                gauge_id: gauge_id.to_string(),
            });
        };

        debug!("{} removed vote on {}", voter, gauge_id);
        self.events.publish(GaugeEvent::VoteRemoved {
            voter: voter.to_string(),
            gauge_id: gauge_id.to_string(),
        });

        Ok(removed)
    }

    /// Set the live allocation for one (voter, gauge) pair and move the
    /// gauge tally by the difference. All vote bookkeeping goes through here.
    fn apply_allocation(&mut self, key: AllocationKey, next: Option<Vote>) -> Option<Vote> {
        let added = next.as_ref().map_or(0, |v| v.ve_amount);
        let position = self.gauge_index.get(&key.1).copied();

        let previous = match next {
            Some(vote) => self.votes.insert(key, vote),
            None => self.votes.remove(&key),
        };

        if let Some(position) = position {
            let gauge = &mut self.gauges[position];
            if let Some(previous) = &previous {
                gauge.remove_contribution(previous.ve_amount);
            }
            gauge.add_contribution(added);
        }

        previous
    }

    /// Re-derive every vote from current voting power and rebuild all gauge
    /// tallies from scratch.
    pub fn recalculate_all_votes(&mut self) {
        let mut powers: HashMap<String, Amount> = HashMap::new();
        for vote in self.votes.values_mut() {
            let power = *powers
                .entry(vote.voter.clone())
                .or_insert_with(|| self.power.current_power(&vote.voter));
            vote.ve_amount = percent_of(power, vote.weight);
        }
        self.rebuild_tallies();

        debug!(
            "recalculated {} votes from {} voters",
            self.votes.len(),
            powers.len()
        );
    }

    /// Recompute every gauge's vote total and voter count from the live votes
    fn rebuild_tallies(&mut self) {
        for gauge in &mut self.gauges {
            gauge.reset_tally();
        }
        for vote in self.votes.values() {
            if let Some(&position) = self.gauge_index.get(&vote.gauge_id) {
                self.gauges[position].add_contribution(vote.ve_amount);
            }
        }
    }

    pub fn get_vote(&self, voter: &str, gauge_id: &str) -> Option<&Vote> {
        self.votes.get(&allocation_key(voter, gauge_id))
    }

    pub fn get_voter_votes(&self, voter: &str) -> Vec<&Vote> {
        self.votes
            .range(allocation_key(voter, "")..)
            .take_while(|((owner, _), _)| owner == voter)
            .map(|(_, vote)| vote)
            .collect()
    }

    /// Sum of the voter's live weights, in percent
    pub fn get_voter_allocation(&self, voter: &str) -> u32 {
        self.get_voter_votes(voter).iter().map(|v| v.weight).sum()
    }

    // ------------------------------------------------------------------
    // Epochs
    // ------------------------------------------------------------------

    pub fn current_epoch(&self) -> &Epoch {
        &self.current
    }

    pub fn finalized_epochs(&self) -> &[Epoch] {
        &self.history
    }

    pub fn get_epoch(&self, number: u64) -> Option<&Epoch> {
        if number == self.current.number {
            return Some(&self.current);
        }
        self.history.iter().find(|e| e.number == number)
    }

    pub fn should_advance_epoch(&self, now: u64) -> bool {
        self.current.has_ended(now)
    }

    /// Finalize the current epoch, open the next one at `now` and re-derive
    /// all votes against fresh voting power. Returns the finalized epoch.
    pub fn advance_epoch(&mut self, now: u64) -> Result<Epoch> {
        if !self.current.has_ended(now) {
            return Err(GaugeError::EpochNotEnded {
                epoch: self.current.number,
                end_time: self.current.end_time,
                now,
            });
        }

        let (total_votes, weights) = compute_weights(&self.gauges);
        let mut snapshot = BTreeMap::new();
        for (gauge, weight) in self.gauges.iter_mut().zip(weights) {
            gauge.current_weight = weight;
            snapshot.insert(gauge.id.clone(), weight);
        }

        let next = Epoch::open(
            self.current.number + 1,
            now,
            self.config.epoch_duration_secs,
        );
        let mut finished = std::mem::replace(&mut self.current, next);
        finished.total_votes = total_votes;
        finished.weights = snapshot;
        finished.finalized = true;
        finished.finalized_at = Some(now);
        self.history.push(finished.clone());

        info!(
            "epoch {} finalized: {} total votes across {} gauges",
            finished.number,
            total_votes,
            finished.weights.len()
        );
        self.events.publish(GaugeEvent::EpochFinalized {
            epoch: finished.number,
            total_votes,
            weights: finished.weights.clone(),
        });

        info!(
            "epoch {} started [{}, {})",
            self.current.number, self.current.start_time, self.current.end_time
        );
        self.events.publish(GaugeEvent::EpochStarted {
            epoch: self.current.number,
            start_time: self.current.start_time,
            end_time: self.current.end_time,
        });

        self.recalculate_all_votes();
        Ok(finished)
    }

    /// Gauges ordered by live votes (highest first, creation order on ties)
    pub fn get_gauge_weights(&self) -> Vec<GaugeWeight> {
        let mut rows: Vec<GaugeWeight> = self
            .gauges
            .iter()
            .map(|g| GaugeWeight {
                gauge_id: g.id.clone(),
                pool_id: g.pool_id.clone(),
                name: g.name.clone(),
                current_weight: g.current_weight,
                total_votes: g.total_votes,
                voter_count: g.voter_count,
                is_active: g.is_active,
                meets_minimum: g.is_active && g.current_weight >= self.config.min_gauge_weight,
            })
            .collect();
        rows.sort_by(|a, b| b.total_votes.cmp(&a.total_votes));
        rows
    }

    // ------------------------------------------------------------------
    // Bribes
    // ------------------------------------------------------------------

    pub fn add_bribe(
        &mut self,
        gauge_id: &str,
        token: &str,
        amount: Amount,
        depositor: &str,
        now: u64,
    ) -> Result<BribeId> {
        let position = self.gauge_position(gauge_id)?;
        if !self.gauges[position].is_active {
            return Err(GaugeError::GaugeInactive(gauge_id.to_string()));
        }
        if amount == 0 {
            return Err(GaugeError::InvalidAmount(
                "bribe amount must be positive".to_string(),
            ));
        }
        if token.trim().is_empty() {
            return Err(GaugeError::InvalidAmount(
                "bribe token must be named".to_string(),
            ));
        }

        self.sequence.bribes += 1;
        let id = format!("bribe-{}", self.sequence.bribes);
        let bribe = Bribe {
            id: id.clone(),
            gauge_id: gauge_id.to_string(),
            token: token.trim().to_string(),
            amount,
            depositor: depositor.to_string(),
            epoch: self.current.number,
            created_at: now,
            claims: BTreeMap::new(),
        };

        self.gauges[position].bribes.push(bribe);
        self.bribe_index.insert(id.clone(), position);

        info!(
            "bribe {} of {} {} added to {} by {}",
            id, amount, token, gauge_id, depositor
        );
        self.events.publish(GaugeEvent::BribeAdded {
            bribe_id: id.clone(),
            gauge_id: gauge_id.to_string(),
            token: token.trim().to_string(),
            amount,
            depositor: depositor.to_string(),
        });

        Ok(id)
    }

    /// Pay the voter's pro-rata share of a bribe, once.
    ///
    /// The share is computed against the gauge's live vote totals at claim
    /// time and frozen as the recorded claim.
    pub fn claim_bribe(&mut self, voter: &str, bribe_id: &str, now: u64) -> Result<Amount> {
        let (gauge_pos, bribe_pos, share) = self.assess_claim(voter, bribe_id, now)?;
        self.gauges[gauge_pos].bribes[bribe_pos]
            .claims
            .insert(voter.to_string(), share);

        debug!("{} claimed {} from bribe {}", voter, share, bribe_id);
        self.events.publish(GaugeEvent::BribeClaimed {
            bribe_id: bribe_id.to_string(),
            voter: voter.to_string(),
            amount: share,
        });

        Ok(share)
    }

    /// What [`Self::claim_bribe`] would pay right now (0 when it would fail)
    pub fn claimable_bribe(&self, voter: &str, bribe_id: &str, now: u64) -> Amount {
        self.assess_claim(voter, bribe_id, now)
            .map(|(_, _, share)| share)
            .unwrap_or(0)
    }

    fn assess_claim(&self, voter: &str, bribe_id: &str, now: u64) -> Result<(usize, usize, Amount)> {
        let not_found = || GaugeError::BribeNotFound(bribe_id.to_string());

        let gauge_pos = *self.bribe_index.get(bribe_id).ok_or_else(not_found)?;
        let gauge = &self.gauges[gauge_pos];
        let bribe_pos = gauge
            .bribes
            .iter()
            .position(|b| b.id == bribe_id)
            .ok_or_else(not_found)?;
        let bribe = &gauge.bribes[bribe_pos];

        let unlock_at = bribe.unlock_at(self.config.bribe_claim_delay_secs);
        if now < unlock_at {
            return Err(GaugeError::BribeLocked {
                bribe_id: bribe_id.to_string(),
                unlock_at,
            });
        }
        if bribe.has_claimed(voter) {
            return Err(GaugeError::AlreadyClaimed {
                voter: voter.to_string(),
                bribe_id: bribe_id.to_string(),
            });
        }

        let ve_amount = self.get_vote(voter, &gauge.id).map_or(0, |v| v.ve_amount);
        let share = if ve_amount == 0 {
            0
        } else {
            bribe.share_for(ve_amount, gauge.total_votes)
        };
        if share == 0 {
            return Err(GaugeError::NothingToClaim {
                voter: voter.to_string(),
                bribe_id: bribe_id.to_string(),
            });
        }

        Ok((gauge_pos, bribe_pos, share))
    }

    pub fn get_bribe(&self, bribe_id: &str) -> Option<&Bribe> {
        let position = *self.bribe_index.get(bribe_id)?;
        self.gauges[position].bribe(bribe_id)
    }

    pub fn get_bribes(&self, gauge_id: &str) -> Result<&[Bribe]> {
        let position = self.gauge_position(gauge_id)?;
        Ok(&self.gauges[position].bribes)
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    pub fn get_stats(&self) -> VotingStats {
        let mut unique_voters = 0;
        let mut last_voter: Option<&str> = None;
        for (voter, _) in self.votes.keys() {
            if last_voter != Some(voter.as_str()) {
                unique_voters += 1;
                last_voter = Some(voter.as_str());
            }
        }

        VotingStats {
            current_epoch: self.current.number,
            epoch_end_time: self.current.end_time,
            total_gauges: self.gauges.len(),
            active_gauges: self.gauges.iter().filter(|g| g.is_active).count(),
            total_votes: self
                .gauges
                .iter()
                .filter(|g| g.is_active)
                .fold(0u64, |sum, g| sum.saturating_add(g.total_votes)),
            unique_voters,
            live_votes: self.votes.len(),
            total_bribes: self.bribe_index.len(),
        }
    }
}

impl<P: VotingPowerSource + ?Sized> GaugeRegistry for GaugeVotingEngine<P> {
    fn create_gauge(&mut self, pool_id: &str, name: &str, now: u64) -> Result<GaugeId> {
        GaugeVotingEngine::create_gauge(self, pool_id, name, now)
    }

    fn active_gauge_for_pool(&self, pool_id: &str) -> Option<GaugeId> {
        self.gauge_for_pool(pool_id).map(|g| g.id.clone())
    }
}
