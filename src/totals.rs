//! Protocol-wide running totals.
//!
//! The totals are an incremental ledger: they are never recomputed from scratch, so every
//! change to a token's valuation has to be reported as a delta between its old and new
//! contribution. The sums are private and only move through [`AggregateTotals::apply_delta`];
//! token prices and balances only change inside [`AggregateTotals::revalue_pair`], which
//! captures both tokens' contributions before the mutation and applies both deltas after it.

use crate::token::{Contribution, NumeraireValue, Token};
use crate::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateTotals {
    total_value_locked: NumeraireValue,
    pool_held_value: NumeraireValue,
    lp_value: NumeraireValue,
    borrowed_value: NumeraireValue,
    pair_count: u64,
    pool_count: u64,
    loan_count: u64,
    active_loan_count: u64,
}

impl AggregateTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_value_locked(&self) -> NumeraireValue {
        self.total_value_locked
    }

    pub fn pool_held_value(&self) -> NumeraireValue {
        self.pool_held_value
    }

    pub fn lp_value(&self) -> NumeraireValue {
        self.lp_value
    }

    pub fn borrowed_value(&self) -> NumeraireValue {
        self.borrowed_value
    }

    pub fn pair_count(&self) -> u64 {
        self.pair_count
    }

    pub fn pool_count(&self) -> u64 {
        self.pool_count
    }

    pub fn loan_count(&self) -> u64 {
        self.loan_count
    }

    pub fn active_loan_count(&self) -> u64 {
        self.active_loan_count
    }

    /// Replaces one token's `old` contribution with its `new` one.
    pub fn apply_delta(&mut self, token: &Address, old: Contribution, new: Contribution) {
        if old == new {
            return;
        }
        let delta = new.balance - old.balance;
        tracing::debug!(
            token = ?token,
            tvl_usd_delta = %delta.usd,
            tvl_eth_delta = %delta.eth,
            "aggregate delta"
        );
        self.total_value_locked = self.total_value_locked - old.balance + new.balance;
        self.pool_held_value = self.pool_held_value - old.pool_held + new.pool_held;
        self.lp_value = self.lp_value - old.lp_held + new.lp_held;
        self.borrowed_value = self.borrowed_value - old.borrowed + new.borrowed;
    }

    /// Runs `mutate` on both tokens of a pair inside one bracket: both contributions are
    /// captured first, valuation fields are refreshed from the mutated prices and balances,
    /// then both deltas are applied.
    pub fn revalue_pair<R>(
        &mut self,
        token0: &mut Token,
        token1: &mut Token,
        mutate: impl FnOnce(&mut Token, &mut Token) -> R,
    ) -> R {
        let old0 = token0.contribution();
        let old1 = token1.contribution();

        let out = mutate(token0, token1);
        token0.refresh_values();
        token1.refresh_values();

        self.apply_delta(&token0.id, old0, token0.contribution());
        self.apply_delta(&token1.id, old1, token1.contribution());
        out
    }

    pub fn record_pair_created(&mut self) {
        self.pair_count += 1;
    }

    pub fn record_pool_created(&mut self) {
        self.pool_count += 1;
    }

    /// A loan was created; it enters OPEN.
    pub fn record_loan_opened(&mut self) {
        self.loan_count += 1;
        self.active_loan_count += 1;
    }

    /// A loan entered CLOSED or LIQUIDATED.
    pub fn record_loan_terminated(&mut self) {
        if self.active_loan_count == 0 {
            tracing::warn!("active loan count already zero, clamping");
        }
        self.active_loan_count = self.active_loan_count.saturating_sub(1);
    }
}
