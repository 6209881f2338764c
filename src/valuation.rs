// 6.0: invariant-based position valuation.
// an invariant I = sqrt(r0 * r1) is a size measure of a constant-product position that does not
// depend on the reserve split. at price P (token1 per token0) the token1 reserve behind I is
// I * sqrt(P), so the whole position is worth 2 * I * sqrt(P) in token1 terms.
// pool supply, pool borrows, loan liquidity all go through the same PricingContext::value_invariant.

use crate::fixed_point::{div_trunc, mul_trunc, sqrt, to_decimal, ETH_DIGITS, USD_VALUE_DIGITS};
use crate::pair::TradingPair;
use crate::token::{NumeraireValue, Token};
use crate::types::{Sided, U256};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Result of valuing one invariant quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvariantValue {
    /// Whole position expressed in token0, truncated to token0's decimals.
    pub in_token0: Decimal,
    /// Whole position expressed in token1, truncated to token1's decimals.
    pub in_token1: Decimal,
    pub value: NumeraireValue,
}

/// Everything needed to value positions on one pair, captured once per notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingContext {
    /// Token1 per token0.
    pub price: Decimal,
    pub decimals: Sided<u32>,
    pub prices_eth: Sided<Decimal>,
    pub prices_usd: Sided<Decimal>,
    /// Liquidity-share supply of the pair. An empty pair values everything at zero.
    pub share_supply: U256,
}

impl PricingContext {
    pub fn new(pair: &TradingPair, token0: &Token, token1: &Token) -> Self {
        Self {
            price: pair.price(token0.decimals, token1.decimals),
            decimals: [token0.decimals, token1.decimals],
            prices_eth: [token0.price_eth(), token1.price_eth()],
            prices_usd: [token0.price_usd(), token1.price_usd()],
            share_supply: pair.total_supply,
        }
    }

    /// Values an invariant quantity at the captured price.
    pub fn value_invariant(&self, invariant: U256) -> InvariantValue {
        if invariant.is_zero() || self.share_supply.is_zero() || self.price <= Decimal::ZERO {
            return InvariantValue::default();
        }

        let [decimals0, decimals1] = self.decimals;
        let combined = decimals0 + decimals1;

        // I / sqrt(10^(d0 + d1)), split so 10^(d0 + d1) never has to fit a decimal
        let mut scaled = to_decimal(invariant, combined / 2);
        if combined % 2 == 1 {
            scaled = scaled.checked_div(sqrt(dec!(10))).unwrap_or(Decimal::ZERO);
        }

        let doubled = scaled.checked_mul(dec!(2)).unwrap_or(Decimal::ZERO);
        let in_token1 = mul_trunc(doubled, sqrt(self.price), decimals1);
        let in_token0 = div_trunc(in_token1, self.price, decimals0);

        InvariantValue {
            in_token0,
            in_token1,
            value: self.numeraire([in_token0, in_token1]),
        }
    }

    /// Values a pair of raw token amounts (collateral, pool-held balances).
    pub fn value_amounts(&self, raw: Sided<U256>) -> NumeraireValue {
        let amount = |side: usize| to_decimal(raw[side], self.decimals[side]);
        (0..2)
            .map(|side| NumeraireValue::of_amount(amount(side), self.prices_eth[side], self.prices_usd[side]))
            .fold(NumeraireValue::ZERO, |acc, v| acc + v)
    }

    // token1 price first; token0 terms only when token1 has no price in that numeraire
    fn numeraire(&self, amounts: Sided<Decimal>) -> NumeraireValue {
        let pick = |prices: &Sided<Decimal>, digits: u32| {
            if !prices[1].is_zero() {
                mul_trunc(amounts[1], prices[1], digits)
            } else {
                mul_trunc(amounts[0], prices[0], digits)
            }
        };
        NumeraireValue {
            eth: pick(&self.prices_eth, ETH_DIGITS),
            usd: pick(&self.prices_usd, USD_VALUE_DIGITS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e18(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    fn context(price: Decimal, decimals: Sided<u32>) -> PricingContext {
        PricingContext {
            price,
            decimals,
            prices_eth: [dec!(0.25), dec!(0.0625)],
            prices_usd: [dec!(750), dec!(187.5)],
            share_supply: e18(1),
        }
    }

    #[test]
    fn position_worth_twice_the_token1_reserve() {
        // reserves 1 token0 / 4 token1 give I = 2
        let ctx = context(dec!(4), [18, 18]);
        let v = ctx.value_invariant(e18(2));
        assert_eq!(v.in_token1, dec!(8));
        assert_eq!(v.in_token0, dec!(2));
        assert_eq!(v.value.eth, dec!(0.5));
        assert_eq!(v.value.usd, dec!(1500));
    }

    #[test]
    fn mixed_decimals() {
        // 1 WETH (18) against 4 USDC-like units (6): I = sqrt(1e18 * 4e6) = 2e12
        let ctx = context(dec!(4), [18, 6]);
        let v = ctx.value_invariant(U256::from(2_000_000_000_000u64));
        assert_eq!(v.in_token1, dec!(8));
    }

    #[test]
    fn zero_inputs_value_to_zero() {
        let ctx = context(dec!(4), [18, 18]);
        assert_eq!(ctx.value_invariant(U256::zero()), InvariantValue::default());

        let mut empty = context(dec!(4), [18, 18]);
        empty.share_supply = U256::zero();
        assert_eq!(empty.value_invariant(e18(2)), InvariantValue::default());

        let unpriced = context(Decimal::ZERO, [18, 18]);
        assert_eq!(unpriced.value_invariant(e18(2)), InvariantValue::default());
    }

    #[test]
    fn falls_back_to_token0_price() {
        let mut ctx = context(dec!(4), [18, 18]);
        ctx.prices_eth = [dec!(0.25), Decimal::ZERO];
        ctx.prices_usd = [Decimal::ZERO, Decimal::ZERO];
        let v = ctx.value_invariant(e18(2));
        // 2 token0 at 0.25
        assert_eq!(v.value.eth, dec!(0.5));
        assert_eq!(v.value.usd, Decimal::ZERO);
    }

    #[test]
    fn amounts_valued_per_side() {
        let ctx = context(dec!(4), [18, 18]);
        let v = ctx.value_amounts([e18(1), e18(4)]);
        assert_eq!(v.eth, dec!(0.5));
        assert_eq!(v.usd, dec!(1500));
    }
}
