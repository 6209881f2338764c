//! Trading pair entity.
//!
//! Created on discovery, reserves overwritten on every sync. A pair can be linked to one
//! lending pool and can stop being tracked without being deleted.

use crate::fixed_point::{div_trunc, invariant_of, to_decimal, ETH_DIGITS};
use crate::types::{Address, BlockNumber, ProtocolId, Sided, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPair {
    pub id: Address,
    pub token0: Address,
    pub token1: Address,
    pub protocol: ProtocolId,
    pub reserves: Sided<U256>,
    /// Supply of the pair's liquidity share.
    pub total_supply: U256,
    /// Lending pool built on this pair, if any.
    pub pool: Option<Address>,
    /// Untracked pairs keep their reserves but neither price tokens nor count toward balances.
    pub tracked: bool,
    pub created_at: BlockNumber,
}

impl TradingPair {
    pub fn new(
        id: Address,
        token0: Address,
        token1: Address,
        protocol: ProtocolId,
        tracked: bool,
        created_at: BlockNumber,
    ) -> Self {
        Self {
            id,
            token0,
            token1,
            protocol,
            reserves: [U256::zero(); 2],
            total_supply: U256::zero(),
            pool: None,
            tracked,
            created_at,
        }
    }

    pub fn tokens(&self) -> Sided<Address> {
        [self.token0, self.token1]
    }

    pub fn has_reserves(&self) -> bool {
        !self.reserves[0].is_zero() && !self.reserves[1].is_zero()
    }

    /// Constant-product invariant of the current reserves.
    pub fn invariant(&self) -> U256 {
        invariant_of(self.reserves[0], self.reserves[1])
    }

    /// Token1 per token0, adjusted for each side's decimals. Zero when either reserve is empty.
    pub fn price(&self, decimals0: u32, decimals1: u32) -> Decimal {
        reserve_ratio(self.reserves, decimals0, decimals1)
    }
}

/// `reserve1 / reserve0` in display units, truncated to 18 digits.
pub fn reserve_ratio(reserves: Sided<U256>, decimals0: u32, decimals1: u32) -> Decimal {
    let amount0 = to_decimal(reserves[0], decimals0);
    let amount1 = to_decimal(reserves[1], decimals1);
    div_trunc(amount1, amount0, ETH_DIGITS)
}
