//! Voting power lookups
//!
//! Voting power lives in an external ledger (locked stake that decays over
//! time). Engines only ever query it, and may do so at any moment, so
//! implementations must answer with the power as of the call.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::{Amount, VoterId};

pub trait VotingPowerSource: Send + Sync {
    /// Current effective voting power of `voter` (0 if unknown)
    fn current_power(&self, voter: &str) -> Amount;

    /// Aggregate voting power across all holders
    fn total_power(&self) -> Amount;
}

/// In-memory power table for hosts without a live ledger
///
/// The total supply defaults to the sum of registered balances; hosts that
/// know the real supply (including holders who never vote) can pin it with
/// [`StaticPowerSource::set_total_supply`].
#[derive(Debug, Default)]
pub struct StaticPowerSource {
    balances: RwLock<HashMap<VoterId, Amount>>,
    total_supply: RwLock<Option<Amount>>,
}

impl StaticPowerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_balances<I, S>(balances: I) -> Self
    where
        I: IntoIterator<Item = (S, Amount)>,
        S: Into<VoterId>,
    {
        let source = Self::new();
        for (voter, power) in balances {
            source.set_power(voter, power);
        }
        source
    }

    /// Set (or replace) a holder's power; returns the previous value
    pub fn set_power(&self, voter: impl Into<VoterId>, power: Amount) -> Option<Amount> {
        self.balances.write().insert(voter.into(), power)
    }

    pub fn set_total_supply(&self, total: Option<Amount>) {
        *self.total_supply.write() = total;
    }

    pub fn holder_count(&self) -> usize {
        self.balances.read().len()
    }
}

impl VotingPowerSource for StaticPowerSource {
    fn current_power(&self, voter: &str) -> Amount {
        self.balances.read().get(voter).copied().unwrap_or(0)
    }

    fn total_power(&self) -> Amount {
        if let Some(total) = *self.total_supply.read() {
            return total;
        }
        self.balances
            .read()
            .values()
            .fold(0u64, |sum, power| sum.saturating_add(*power))
    }
}
