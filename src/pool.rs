//! Lending pool entity.
//!
//! A pool lends out the liquidity of exactly one trading pair. Its invariant quantities and
//! held balances come from chain snapshots; its valuations are always recomputed wholesale
//! from those quantities, the pair price and the tokens' cached prices.

use crate::chain::{PoolSnapshot, Strategies};
use crate::fixed_point::{div_trunc, mul_div, to_decimal, ETH_DIGITS, USD_VALUE_DIGITS};
use crate::token::NumeraireValue;
use crate::types::{Address, BlockNumber, ProtocolId, Sided, U256};
use crate::valuation::PricingContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// snapshot rates are 18-decimal fixed point
const RATE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolRates {
    pub utilization: Decimal,
    pub ema_utilization: Decimal,
    pub borrow_rate: Decimal,
    pub supply_rate: Decimal,
    pub origination_fee: Decimal,
    pub accumulated_fee_index: Decimal,
}

impl PoolRates {
    fn from_snapshot(snapshot: &PoolSnapshot) -> Self {
        let rate = |raw: U256| to_decimal(raw, RATE_DECIMALS);
        Self {
            utilization: rate(snapshot.utilization_rate),
            ema_utilization: rate(snapshot.ema_utilization_rate),
            borrow_rate: rate(snapshot.borrow_rate),
            supply_rate: rate(snapshot.supply_rate),
            origination_fee: rate(snapshot.origination_fee),
            accumulated_fee_index: rate(snapshot.accumulated_fee_index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolValuation {
    /// Liquidity still in the pair plus tokens held by the pool.
    pub value_locked: NumeraireValue,
    /// Everything owed to liquidity providers: held liquidity plus borrowed liquidity with interest.
    pub supplied: NumeraireValue,
    /// Borrowed liquidity including accrued interest.
    pub borrowed: NumeraireValue,
    /// Tokens held by the pool.
    pub collateral: NumeraireValue,
}

/// Raw amounts a pool attributes to each token's balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolHoldings {
    /// Feeds token pool-held balances.
    pub token_balances: Sided<U256>,
    /// Borrowed invariant split at the snapshot reserves. Feeds token borrowed balances.
    pub borrowed_split: Sided<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingPool {
    pub id: Address,
    pub pair: Address,
    pub tokens: Sided<Address>,
    pub protocol: ProtocolId,
    pub holdings: PoolHoldings,
    pub lp_tokens_held: U256,
    pub lp_tokens_borrowed: U256,
    pub lp_tokens_borrowed_plus_interest: U256,
    /// Invariant still deposited in the pair.
    pub lp_invariant: U256,
    /// Borrowed principal in invariant units.
    pub borrowed_invariant: U256,
    pub borrowed_plus_interest_invariant: U256,
    pub cfmm_reserves: Sided<U256>,
    pub cfmm_invariant: U256,
    /// Supply of the pool's shares.
    pub total_supply: U256,
    pub rates: PoolRates,
    pub strategies: Strategies,
    pub valuation: PoolValuation,
    pub loan_count: u64,
    pub active_loan_count: u64,
    pub created_at: BlockNumber,
    pub last_updated: Option<BlockNumber>,
}

impl LendingPool {
    pub fn new(
        id: Address,
        pair: Address,
        tokens: Sided<Address>,
        protocol: ProtocolId,
        created_at: BlockNumber,
    ) -> Self {
        Self {
            id,
            pair,
            tokens,
            protocol,
            holdings: PoolHoldings::default(),
            lp_tokens_held: U256::zero(),
            lp_tokens_borrowed: U256::zero(),
            lp_tokens_borrowed_plus_interest: U256::zero(),
            lp_invariant: U256::zero(),
            borrowed_invariant: U256::zero(),
            borrowed_plus_interest_invariant: U256::zero(),
            cfmm_reserves: [U256::zero(); 2],
            cfmm_invariant: U256::zero(),
            total_supply: U256::zero(),
            rates: PoolRates::default(),
            strategies: Strategies::default(),
            valuation: PoolValuation::default(),
            loan_count: 0,
            active_loan_count: 0,
            created_at,
            last_updated: None,
        }
    }

    pub fn supplied_invariant(&self) -> U256 {
        self.lp_invariant.saturating_add(self.borrowed_plus_interest_invariant)
    }

    /// Overwrites every snapshot-derived field and returns the holdings before and after.
    pub fn apply_snapshot(&mut self, snapshot: &PoolSnapshot, block: BlockNumber) -> (PoolHoldings, PoolHoldings) {
        let before = self.holdings;

        self.lp_tokens_held = snapshot.lp_tokens_held;
        self.lp_tokens_borrowed = snapshot.lp_tokens_borrowed;
        self.lp_tokens_borrowed_plus_interest = snapshot.lp_tokens_borrowed_plus_interest;
        self.lp_invariant = snapshot.lp_invariant;
        self.borrowed_plus_interest_invariant = snapshot.borrowed_invariant;
        self.borrowed_invariant = mul_div(
            snapshot.lp_tokens_borrowed,
            snapshot.cfmm_invariant,
            snapshot.cfmm_total_supply,
        );
        self.cfmm_reserves = snapshot.cfmm_reserves;
        self.cfmm_invariant = snapshot.cfmm_invariant;
        self.total_supply = snapshot.total_supply;
        self.rates = PoolRates::from_snapshot(snapshot);
        self.strategies = snapshot.strategies;
        self.last_updated = Some(block);

        let split = |side: usize| {
            mul_div(
                snapshot.cfmm_reserves[side],
                snapshot.borrowed_invariant,
                snapshot.cfmm_invariant,
            )
        };
        self.holdings = PoolHoldings {
            token_balances: snapshot.token_balances,
            borrowed_split: [split(0), split(1)],
        };

        (before, self.holdings)
    }

    /// Recomputes every valuation field.
    pub fn revalue(&mut self, ctx: &PricingContext) {
        let held = ctx.value_invariant(self.lp_invariant).value;
        let collateral = ctx.value_amounts(self.holdings.token_balances);
        self.valuation = PoolValuation {
            value_locked: held + collateral,
            supplied: ctx.value_invariant(self.supplied_invariant()).value,
            borrowed: ctx.value_invariant(self.borrowed_plus_interest_invariant).value,
            collateral,
        };
    }

    /// Value of `shares` of this pool at its current supplied value.
    pub fn share_value(&self, shares: U256, share_decimals: u32) -> NumeraireValue {
        let shares = to_decimal(shares, share_decimals);
        let supply = to_decimal(self.total_supply, share_decimals);
        // multiply before dividing, the fraction alone does not survive truncation
        let pro_rata = |value: Decimal, digits: u32| {
            div_trunc(value.checked_mul(shares).unwrap_or(Decimal::ZERO), supply, digits)
        };
        NumeraireValue {
            eth: pro_rata(self.valuation.supplied.eth, ETH_DIGITS),
            usd: pro_rata(self.valuation.supplied.usd, USD_VALUE_DIGITS),
        }
    }

    pub fn record_loan_opened(&mut self) {
        self.loan_count += 1;
        self.active_loan_count += 1;
    }

    pub fn record_loan_terminated(&mut self) {
        if self.active_loan_count == 0 {
            tracing::warn!(pool = ?self.id, "pool active loan count already zero, clamping");
        }
        self.active_loan_count = self.active_loan_count.saturating_sub(1);
    }
}
