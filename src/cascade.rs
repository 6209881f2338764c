// 5.0: token price propagation. given the two tokens of a pair and the reserve ratio
// (token1 per token0), assign native and USD prices by the first matching anchor:
// native, then stable, then secondary reference, token0 before token1. no match leaves
// prices alone and the balances are valued at whatever prices were cached before.
//
// 5.1 all divisions truncate: native prices to 18 digits, USD prices to 6.

use crate::config::NetworkConfig;
use crate::fixed_point::{div_trunc, mul_trunc, truncate, ETH_DIGITS, USD_PRICE_DIGITS};
use crate::token::Token;
use crate::types::{Address, Sided};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a token can anchor prices with. A token holds exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenRole {
    Native,
    Stable,
    SecondaryReference,
    Unclassified,
}

impl TokenRole {
    pub fn of(token: &Address, network: &NetworkConfig) -> Self {
        if network.is_native(token) {
            TokenRole::Native
        } else if network.is_stable(token) {
            TokenRole::Stable
        } else if network.is_secondary_reference(token) {
            TokenRole::SecondaryReference
        } else {
            TokenRole::Unclassified
        }
    }
}

/// Derivation rule chosen for a pair. Variants are listed in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceRule {
    Token0Native,
    Token1Native,
    Token0Stable,
    Token1Stable,
    Token0Reference,
    Token1Reference,
    Unpriced,
}

impl PriceRule {
    /// First match wins.
    pub fn select(roles: Sided<TokenRole>) -> Self {
        use TokenRole::*;
        match roles {
            [Native, _] => PriceRule::Token0Native,
            [_, Native] => PriceRule::Token1Native,
            [Stable, _] => PriceRule::Token0Stable,
            [_, Stable] => PriceRule::Token1Stable,
            [SecondaryReference, _] => PriceRule::Token0Reference,
            [_, SecondaryReference] => PriceRule::Token1Reference,
            [Unclassified, Unclassified] => PriceRule::Unpriced,
        }
    }

    pub fn for_tokens(token0: &Address, token1: &Address, network: &NetworkConfig) -> Self {
        Self::select([TokenRole::of(token0, network), TokenRole::of(token1, network)])
    }
}

/// Prices both tokens of a pair.
///
/// `pair_price` is token1 per token0, `eth_usd` the reference native/USD rate. A zero
/// `eth_usd` means the rate is unknown: USD prices keep their cached values. A non-positive
/// `pair_price` prices nothing.
pub fn propagate(
    network: &NetworkConfig,
    token0: &mut Token,
    token1: &mut Token,
    pair_price: Decimal,
    eth_usd: Decimal,
) -> PriceRule {
    if pair_price <= Decimal::ZERO {
        return PriceRule::Unpriced;
    }
    let rule = PriceRule::for_tokens(&token0.id, &token1.id, network);
    apply(rule, token0, token1, pair_price, eth_usd);
    rule
}

fn apply(rule: PriceRule, token0: &mut Token, token1: &mut Token, pair_price: Decimal, eth_usd: Decimal) {
    let usd_known = eth_usd > Decimal::ZERO;

    match rule {
        PriceRule::Token0Native => {
            let other_eth = div_trunc(Decimal::ONE, pair_price, ETH_DIGITS);
            token0.set_price_eth(Decimal::ONE);
            token1.set_price_eth(other_eth);
            if usd_known {
                token0.set_price_usd(truncate(eth_usd, USD_PRICE_DIGITS));
                token1.set_price_usd(mul_trunc(other_eth, eth_usd, USD_PRICE_DIGITS));
            }
        }
        PriceRule::Token1Native => {
            let other_eth = truncate(pair_price, ETH_DIGITS);
            token1.set_price_eth(Decimal::ONE);
            token0.set_price_eth(other_eth);
            if usd_known {
                token1.set_price_usd(truncate(eth_usd, USD_PRICE_DIGITS));
                token0.set_price_usd(mul_trunc(other_eth, eth_usd, USD_PRICE_DIGITS));
            }
        }
        PriceRule::Token0Stable => {
            token0.set_price_usd(Decimal::ONE);
            token1.set_price_usd(div_trunc(Decimal::ONE, pair_price, USD_PRICE_DIGITS));
            if usd_known {
                let stable_eth = div_trunc(Decimal::ONE, eth_usd, ETH_DIGITS);
                token0.set_price_eth(stable_eth);
                token1.set_price_eth(div_trunc(stable_eth, pair_price, ETH_DIGITS));
            }
        }
        PriceRule::Token1Stable => {
            token1.set_price_usd(Decimal::ONE);
            token0.set_price_usd(truncate(pair_price, USD_PRICE_DIGITS));
            if usd_known {
                let stable_eth = div_trunc(Decimal::ONE, eth_usd, ETH_DIGITS);
                token1.set_price_eth(stable_eth);
                token0.set_price_eth(mul_trunc(pair_price, stable_eth, ETH_DIGITS));
            }
        }
        PriceRule::Token0Reference => {
            let anchor = token0.price_eth();
            if anchor.is_zero() {
                return;
            }
            let other_eth = div_trunc(anchor, pair_price, ETH_DIGITS);
            token1.set_price_eth(other_eth);
            if usd_known {
                token1.set_price_usd(mul_trunc(other_eth, eth_usd, USD_PRICE_DIGITS));
            }
        }
        PriceRule::Token1Reference => {
            let anchor = token1.price_eth();
            if anchor.is_zero() {
                return;
            }
            let other_eth = mul_trunc(pair_price, anchor, ETH_DIGITS);
            token0.set_price_eth(other_eth);
            if usd_known {
                token0.set_price_usd(mul_trunc(other_eth, eth_usd, USD_PRICE_DIGITS));
            }
        }
        PriceRule::Unpriced => {}
    }
}
