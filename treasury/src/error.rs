//! Treasury error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Treasury balance overflow: balance {balance}, deposit {amount}")]
    BalanceOverflow { balance: u64, amount: u64 },
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
