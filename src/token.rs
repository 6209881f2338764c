//! Token entity.
//!
//! Raw balances are partitioned by custody source and the total is recomputed from the
//! partitions, never accumulated on its own. Prices and valuation fields are only written
//! inside an aggregate bracket (see [`crate::totals::AggregateTotals::revalue_pair`]), which is
//! why their setters are crate-private.

use crate::fixed_point::{mul_trunc, rebalance, to_decimal, ETH_DIGITS, USD_VALUE_DIGITS};
use crate::types::{Address, U256};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Largest value, in either numeraire, a single token balance may contribute. Anything above
/// it comes from a manipulated or degenerate price and counts as zero, which keeps every
/// aggregate sum far inside the decimal range.
pub const MAX_CONTRIBUTION: Decimal = dec!(1000000000000000);

/// A value expressed in both numeraires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NumeraireValue {
    pub eth: Decimal,
    pub usd: Decimal,
}

impl NumeraireValue {
    pub const ZERO: Self = Self {
        eth: Decimal::ZERO,
        usd: Decimal::ZERO,
    };

    pub fn new(eth: Decimal, usd: Decimal) -> Self {
        Self { eth, usd }
    }

    /// Values `amount` of a token priced at (`price_eth`, `price_usd`).
    pub fn of_amount(amount: Decimal, price_eth: Decimal, price_usd: Decimal) -> Self {
        Self {
            eth: mul_trunc(amount, price_eth, ETH_DIGITS),
            usd: mul_trunc(amount, price_usd, USD_VALUE_DIGITS),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.eth.is_zero() && self.usd.is_zero()
    }

    /// Zeroes each component whose magnitude exceeds `limit`.
    pub fn bounded(self, limit: Decimal) -> Self {
        let bound = |v: Decimal| if v.abs() > limit { Decimal::ZERO } else { v };
        Self {
            eth: bound(self.eth),
            usd: bound(self.usd),
        }
    }
}

// a clamp is only reachable past the range bounded contributions can sum to
fn add_or_saturate(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        tracing::warn!(%a, %b, "numeraire sum overflowed, saturating");
        a.saturating_add(b)
    })
}

fn sub_or_saturate(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b).unwrap_or_else(|| {
        tracing::warn!(%a, %b, "numeraire difference overflowed, saturating");
        a.saturating_sub(b)
    })
}

impl Add for NumeraireValue {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            eth: add_or_saturate(self.eth, rhs.eth),
            usd: add_or_saturate(self.usd, rhs.usd),
        }
    }
}

impl Sub for NumeraireValue {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            eth: sub_or_saturate(self.eth, rhs.eth),
            usd: sub_or_saturate(self.usd, rhs.usd),
        }
    }
}

/// Raw (undecimalized) balances by custody source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawBalances {
    /// Held directly by lending pools.
    pub pool_held: U256,
    /// Reserves of tracked trading pairs.
    pub lp_held: U256,
    /// Token split of lending pools' borrowed invariant. An exposure, not a custody source.
    pub borrowed: U256,
    /// `pool_held + lp_held`.
    pub total: U256,
}

impl RawBalances {
    fn recompute_total(&mut self) {
        self.total = self.pool_held.saturating_add(self.lp_held);
    }
}

/// The valuation fields of one token, which is also exactly what the token contributes to
/// the protocol-wide totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contribution {
    pub balance: NumeraireValue,
    pub pool_held: NumeraireValue,
    pub lp_held: NumeraireValue,
    pub borrowed: NumeraireValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    raw: RawBalances,
    price_eth: Decimal,
    price_usd: Decimal,
    values: Contribution,
}

impl Token {
    pub fn new(id: Address, symbol: impl Into<String>, name: impl Into<String>, decimals: u32) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            name: name.into(),
            decimals,
            raw: RawBalances::default(),
            price_eth: Decimal::ZERO,
            price_usd: Decimal::ZERO,
            values: Contribution::default(),
        }
    }

    pub fn raw(&self) -> &RawBalances {
        &self.raw
    }

    pub fn price_eth(&self) -> Decimal {
        self.price_eth
    }

    pub fn price_usd(&self) -> Decimal {
        self.price_usd
    }

    pub fn values(&self) -> &Contribution {
        &self.values
    }

    /// Current contribution to the aggregate totals.
    pub fn contribution(&self) -> Contribution {
        self.values
    }

    /// Raw amount scaled by this token's decimals.
    pub fn amount(&self, raw: U256) -> Decimal {
        to_decimal(raw, self.decimals)
    }

    pub fn is_priced(&self) -> bool {
        !self.price_eth.is_zero() || !self.price_usd.is_zero()
    }

    pub(crate) fn set_price_eth(&mut self, price: Decimal) {
        self.price_eth = price;
    }

    pub(crate) fn set_price_usd(&mut self, price: Decimal) {
        self.price_usd = price;
    }

    pub(crate) fn shift_lp_held(&mut self, removed: U256, added: U256) {
        self.raw.lp_held = rebalance(self.raw.lp_held, removed, added);
        self.raw.recompute_total();
    }

    pub(crate) fn shift_pool_held(&mut self, removed: U256, added: U256) {
        self.raw.pool_held = rebalance(self.raw.pool_held, removed, added);
        self.raw.recompute_total();
    }

    pub(crate) fn shift_borrowed(&mut self, removed: U256, added: U256) {
        self.raw.borrowed = rebalance(self.raw.borrowed, removed, added);
    }

    /// Recomputes every valuation field from raw balances and cached prices.
    pub(crate) fn refresh_values(&mut self) {
        let value = |raw: U256| {
            let value = NumeraireValue::of_amount(self.amount(raw), self.price_eth, self.price_usd);
            let bounded = value.bounded(MAX_CONTRIBUTION);
            if bounded != value {
                tracing::warn!(token = ?self.id, symbol = %self.symbol, eth = %value.eth, usd = %value.usd, "balance value out of range, counted as zero");
            }
            bounded
        };
        let values = Contribution {
            balance: value(self.raw.total),
            pool_held: value(self.raw.pool_held),
            lp_held: value(self.raw.lp_held),
            borrowed: value(self.raw.borrowed),
        };
        self.values = values;
    }
}
