// 4.0: reference price resolver. produces the native asset's price in USD.
// the indexed reference pair wins when the store has it. until then the configured external
// pool is read straight from the chain. anything missing on the way resolves to zero, which
// every consumer reads as "unknown, keep cached USD prices".
//
// 4.1 the rate is reserve1 / reserve0 in display units. pools list their tokens in address
// order, so when token0 is the USD side the ratio comes out as native per USD and is inverted.

use crate::chain::ChainReader;
use crate::config::NetworkConfig;
use crate::fixed_point::{div_trunc, truncate, USD_PRICE_DIGITS};
use crate::pair::reserve_ratio;
use crate::store::Store;
use crate::types::{Address, Sided, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceSource {
    ReferencePair,
    FallbackPool,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceQuote {
    /// USD per native unit, truncated to 6 digits. Zero when unknown.
    pub eth_usd: Decimal,
    pub source: PriceSource,
}

impl ReferenceQuote {
    pub const UNAVAILABLE: Self = Self {
        eth_usd: Decimal::ZERO,
        source: PriceSource::Unavailable,
    };

    pub fn is_known(&self) -> bool {
        self.eth_usd > Decimal::ZERO
    }
}

// symbol and decimals are all the rate needs from a token
struct QuoteToken {
    symbol: String,
    decimals: u32,
}

pub fn resolve_eth_usd<S: Store, C: ChainReader>(
    network: &NetworkConfig,
    store: &S,
    chain: &C,
) -> ReferenceQuote {
    if let Some(pair) = network.reference_pair.and_then(|id| store.load_pair(&id)) {
        let eth_usd = quote(store, chain, pair.tokens(), pair.reserves).unwrap_or(Decimal::ZERO);
        return ReferenceQuote {
            eth_usd,
            source: PriceSource::ReferencePair,
        };
    }

    let Some(pool) = network.fallback_pool else {
        return ReferenceQuote::UNAVAILABLE;
    };
    let snapshot = match chain.pair_reserves(pool) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(pool = ?pool, error = %e, "fallback reference pool read failed");
            return ReferenceQuote::UNAVAILABLE;
        }
    };
    match quote(store, chain, snapshot.tokens, snapshot.reserves) {
        Some(eth_usd) => ReferenceQuote {
            eth_usd,
            source: PriceSource::FallbackPool,
        },
        None => ReferenceQuote::UNAVAILABLE,
    }
}

fn quote<S: Store, C: ChainReader>(
    store: &S,
    chain: &C,
    tokens: Sided<Address>,
    reserves: Sided<U256>,
) -> Option<Decimal> {
    if reserves[0].is_zero() || reserves[1].is_zero() {
        return None;
    }
    let token0 = resolve_token(store, chain, tokens[0])?;
    let token1 = resolve_token(store, chain, tokens[1])?;

    let ratio = reserve_ratio(reserves, token0.decimals, token1.decimals);
    if ratio.is_zero() {
        return None;
    }
    let eth_usd = if token0.symbol.contains("USD") {
        div_trunc(Decimal::ONE, ratio, USD_PRICE_DIGITS)
    } else {
        truncate(ratio, USD_PRICE_DIGITS)
    };
    Some(eth_usd)
}

fn resolve_token<S: Store, C: ChainReader>(store: &S, chain: &C, id: Address) -> Option<QuoteToken> {
    if let Some(token) = store.load_token(&id) {
        return Some(QuoteToken {
            symbol: token.symbol,
            decimals: token.decimals,
        });
    }
    match chain.token_metadata(id) {
        Ok(meta) => Some(QuoteToken {
            symbol: meta.symbol,
            decimals: meta.decimals,
        }),
        Err(e) => {
            tracing::debug!(token = ?id, error = %e, "reference token unresolved");
            None
        }
    }
}
