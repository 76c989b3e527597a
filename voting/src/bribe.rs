//! Bribe ledger entries

use gauge_core::math::mul_div;
use gauge_core::{Amount, BribeId, GaugeId, VoterId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Third-party incentive deposited against a gauge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bribe {
    pub id: BribeId,
    pub gauge_id: GaugeId,
    pub token: String,
    pub amount: Amount,
    pub depositor: String,
    pub epoch: u64,
    pub created_at: u64,

    /// Frozen payout per voter
    pub claims: BTreeMap<VoterId, Amount>,
}

impl Bribe {
    pub fn unlock_at(&self, claim_delay_secs: u64) -> u64 {
        self.created_at.saturating_add(claim_delay_secs)
    }

    pub fn has_claimed(&self, voter: &str) -> bool {
        self.claims.contains_key(voter)
    }

    pub fn claimed_total(&self) -> Amount {
        self.claims
            .values()
            .fold(0u64, |sum, amount| sum.saturating_add(*amount))
    }

    pub fn remaining(&self) -> Amount {
        self.amount.saturating_sub(self.claimed_total())
    }

    /// Pro-rata share for a voter holding `ve_amount` of `gauge_total`.
    ///
    /// Never more than what is still unclaimed, so the payouts of one bribe
    /// can not exceed its deposit even when gauge totals move between claims.
    pub fn share_for(&self, ve_amount: Amount, gauge_total: Amount) -> Amount {
        mul_div(self.amount, ve_amount, gauge_total).min(self.remaining())
    }
}
