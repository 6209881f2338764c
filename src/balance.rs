//! Per-account share balances of lending pools.

use crate::token::NumeraireValue;
use crate::types::{Address, BlockNumber, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountBalanceId {
    pub pool: Address,
    pub account: Address,
}

impl AccountBalanceId {
    pub fn new(pool: Address, account: Address) -> Self {
        Self { pool, account }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub id: AccountBalanceId,
    /// Balance in the pool's share unit.
    pub shares: U256,
    /// Shares valued at the pool's supplied value when the balance last moved.
    pub value: NumeraireValue,
    pub last_updated: BlockNumber,
}

impl AccountBalance {
    pub fn new(id: AccountBalanceId, block: BlockNumber) -> Self {
        Self {
            id,
            shares: U256::zero(),
            value: NumeraireValue::ZERO,
            last_updated: block,
        }
    }

    pub fn credit(&mut self, amount: U256) {
        self.shares = self.shares.saturating_add(amount);
    }

    // a debit past zero means an earlier credit was never observed
    pub fn debit(&mut self, amount: U256) {
        if amount > self.shares {
            tracing::warn!(pool = ?self.id.pool, account = ?self.id.account, "share balance underflow, clamping");
        }
        self.shares = self.shares.saturating_sub(amount);
    }
}
