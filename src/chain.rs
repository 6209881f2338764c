// Chain reader integration
//
// Read-only contract calls the core depends on. The core never decodes chain data itself: a
// reader returns typed snapshots, and a failed or reverted call is a recoverable error that
// skips the notification that needed it. StaticChainReader serves snapshots from memory for
// simulations and tests.

use crate::types::{Address, Sided, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// ERC20 metadata of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
}

/// Reserves of a constant-product pool, read directly from the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservesSnapshot {
    pub tokens: Sided<Address>,
    pub reserves: Sided<U256>,
}

/// Strategy contracts a lending pool delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Strategies {
    pub short: Address,
    pub borrow: Address,
    pub repay: Address,
    pub liquidation: Address,
}

/// Full metric snapshot of a lending pool. Rates and indices are raw 18-decimal integers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Tokens held by the pool (collateral and withdrawn liquidity).
    pub token_balances: Sided<U256>,
    /// Pair liquidity shares held by the pool.
    pub lp_tokens_held: U256,
    pub lp_tokens_borrowed: U256,
    pub lp_tokens_borrowed_plus_interest: U256,
    /// Invariant of the liquidity the pool still holds as pair shares.
    pub lp_invariant: U256,
    /// Borrowed invariant including accrued interest.
    pub borrowed_invariant: U256,
    pub cfmm_reserves: Sided<U256>,
    pub cfmm_invariant: U256,
    pub cfmm_total_supply: U256,
    /// Supply of the pool's own shares.
    pub total_supply: U256,
    pub utilization_rate: U256,
    pub ema_utilization_rate: U256,
    pub borrow_rate: U256,
    pub supply_rate: U256,
    pub origination_fee: U256,
    pub accumulated_fee_index: U256,
    pub strategies: Strategies,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("call {call} on {contract:?} reverted")]
    Reverted { contract: Address, call: &'static str },

    #[error("chain reader unavailable: {0}")]
    Unavailable(String),
}

/// Read-only contract calls.
pub trait ChainReader {
    fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError>;

    fn pair_reserves(&self, pair: Address) -> Result<ReservesSnapshot, ChainError>;

    fn pool_snapshot(&self, pool: Address) -> Result<PoolSnapshot, ChainError>;
}

/// In-memory reader. Anything not registered reverts.
#[derive(Debug, Clone, Default)]
pub struct StaticChainReader {
    tokens: HashMap<Address, TokenMetadata>,
    reserves: HashMap<Address, ReservesSnapshot>,
    pools: HashMap<Address, PoolSnapshot>,
}

impl StaticChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&mut self, token: Address, symbol: &str, decimals: u32) {
        self.tokens.insert(
            token,
            TokenMetadata {
                symbol: symbol.to_string(),
                name: symbol.to_string(),
                decimals,
            },
        );
    }

    pub fn set_reserves(&mut self, pair: Address, snapshot: ReservesSnapshot) {
        self.reserves.insert(pair, snapshot);
    }

    pub fn set_pool_snapshot(&mut self, pool: Address, snapshot: PoolSnapshot) {
        self.pools.insert(pool, snapshot);
    }

    /// Makes later snapshot reads of `pool` revert.
    pub fn revert_pool(&mut self, pool: &Address) {
        self.pools.remove(pool);
    }
}

impl ChainReader for StaticChainReader {
    fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError> {
        self.tokens.get(&token).cloned().ok_or(ChainError::Reverted {
            contract: token,
            call: "symbol/name/decimals",
        })
    }

    fn pair_reserves(&self, pair: Address) -> Result<ReservesSnapshot, ChainError> {
        self.reserves.get(&pair).cloned().ok_or(ChainError::Reverted {
            contract: pair,
            call: "getReserves",
        })
    }

    fn pool_snapshot(&self, pool: Address) -> Result<PoolSnapshot, ChainError> {
        self.pools.get(&pool).cloned().ok_or(ChainError::Reverted {
            contract: pool,
            call: "getLatestPoolData",
        })
    }
}
