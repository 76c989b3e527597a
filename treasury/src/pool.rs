//! Treasury pool accounting

use gauge_core::{Amount, ProposalId, VoterId};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreasuryError};

/// Where a treasury deposit came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreasurySource {
    /// Slashed share of a vetoed proposal's deposit
    ProposalSlash {
        proposal_id: ProposalId,
        proposer: VoterId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryTransaction {
    pub id: String,
    pub source: TreasurySource,
    pub amount: Amount,
    pub balance_after: Amount,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryStats {
    pub balance: Amount,
    pub total_slashed: Amount,
    pub slash_count: usize,
    pub last_deposit_at: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryPool {
    balance: Amount,
    total_slashed: Amount,
    transactions: Vec<TreasuryTransaction>,
}

impl TreasuryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the slashed part of a vetoed proposal's deposit.
    ///
    /// Returns the recorded transaction. Zero amounts are rejected so the
    /// audit trail only holds real movements.
    pub fn deposit_slash(
        &mut self,
        proposal_id: &str,
        proposer: &str,
        amount: Amount,
        timestamp: u64,
    ) -> Result<&TreasuryTransaction> {
        if amount == 0 {
            return Err(TreasuryError::InvalidAmount(format!(
                "slash for proposal {} is zero",
                proposal_id
            )));
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(TreasuryError::BalanceOverflow {
                balance: self.balance,
                amount,
            })?;

        self.balance = balance;
        self.total_slashed = self.total_slashed.saturating_add(amount);

        let id = format!("treasury-{}", self.transactions.len() + 1);
        info!(
            "Treasury received {} from proposal {} ({}), balance {}",
            amount, proposal_id, proposer, balance
        );
        self.transactions.push(TreasuryTransaction {
            id,
            source: TreasurySource::ProposalSlash {
                proposal_id: proposal_id.to_string(),
                proposer: proposer.to_string(),
            },
            amount,
            balance_after: balance,
            timestamp,
        });

        Ok(&self.transactions[self.transactions.len() - 1])
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn total_slashed(&self) -> Amount {
        self.total_slashed
    }

    /// Audit trail, oldest first
    pub fn transactions(&self) -> &[TreasuryTransaction] {
        &self.transactions
    }

    pub fn get_stats(&self) -> TreasuryStats {
        TreasuryStats {
            balance: self.balance,
            total_slashed: self.total_slashed,
            slash_count: self.transactions.len(),
            last_deposit_at: self.transactions.last().map(|tx| tx.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_slash_updates_balance() {
        let mut pool = TreasuryPool::new();
        let tx = pool.deposit_slash("proposal-1", "alice", 500, 100).unwrap();
        assert_eq!(tx.id, "treasury-1");
        assert_eq!(tx.balance_after, 500);

        pool.deposit_slash("proposal-2", "bob", 250, 200).unwrap();
        assert_eq!(pool.balance(), 750);
        assert_eq!(pool.total_slashed(), 750);
        assert_eq!(pool.transactions().len(), 2);
    }

    #[test]
    fn test_zero_slash_rejected() {
        let mut pool = TreasuryPool::new();
        assert!(matches!(
            pool.deposit_slash("proposal-1", "alice", 0, 100),
            Err(TreasuryError::InvalidAmount(_))
        ));
        assert!(pool.transactions().is_empty());
    }

    #[test]
    fn test_overflow_leaves_pool_unchanged() {
        let mut pool = TreasuryPool::new();
        pool.deposit_slash("proposal-1", "alice", u64::MAX, 1).unwrap();

        let err = pool.deposit_slash("proposal-2", "bob", 1, 2).unwrap_err();
        assert_eq!(
            err,
            TreasuryError::BalanceOverflow {
                balance: u64::MAX,
                amount: 1
            }
        );
        assert_eq!(pool.transactions().len(), 1);
    }
}
