// 12.0.2: outcomes and errors of notification processing.

use crate::cascade::PriceRule;
use crate::chain::ChainError;
use crate::config::ConfigError;
use crate::loan::{LoanStatus, StatusChange};
use crate::resolver::PriceSource;
use crate::types::{Address, LoanId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// State was updated.
    Applied,
    /// Reserves were synced and the pair's tokens repriced under `rule`.
    Priced { rule: PriceRule, source: PriceSource },
    /// A loan update ran through the status machine.
    LoanTransition { status: LoanStatus, change: StatusChange },
    /// Well-formed notification that changes nothing (zero transfer, untracked pair).
    Unchanged,
    /// The notification could not be applied and was dropped.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexerError {
    #[error("Token {0:?} not found")]
    TokenNotFound(Address),

    #[error("Pair {0:?} not found")]
    PairNotFound(Address),

    #[error("Pool {0:?} not found")]
    PoolNotFound(Address),

    #[error("Loan {0} not found")]
    LoanNotFound(LoanId),

    #[error("Pair {0:?} already indexed")]
    DuplicatePair(Address),

    #[error("Pool {0:?} already indexed")]
    DuplicatePool(Address),

    #[error("Loan {0} already indexed")]
    DuplicateLoan(LoanId),

    #[error("Chain read failed: {0}")]
    Chain(#[from] ChainError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
