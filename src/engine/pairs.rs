//! Trading pair notifications: discovery, reserve syncs, untracking.

use super::core::Indexer;
use super::results::{IndexerError, ProcessOutcome};
use crate::cascade::propagate;
use crate::chain::ChainReader;
use crate::events::{PairCreatedEvent, PairUntrackedEvent, ReserveSyncEvent};
use crate::loan::BlockStamp;
use crate::pair::TradingPair;
use crate::resolver::resolve_eth_usd;
use crate::store::Store;
use crate::types::U256;
use crate::valuation::PricingContext;

impl<S: Store, C: ChainReader> Indexer<S, C> {
    pub(super) fn on_pair_created(
        &mut self,
        ev: &PairCreatedEvent,
        stamp: BlockStamp,
    ) -> Result<ProcessOutcome, IndexerError> {
        if self.store.load_pair(&ev.pair).is_some() {
            return Err(IndexerError::DuplicatePair(ev.pair));
        }
        let token0 = self.resolve_token(ev.token0)?;
        let token1 = self.resolve_token(ev.token1)?;

        let tracked = self.config.is_protocol_tracked(ev.protocol);
        let pair = TradingPair::new(ev.pair, ev.token0, ev.token1, ev.protocol, tracked, stamp.block);
        let mut totals = self.load_totals();
        totals.record_pair_created();

        tracing::info!(
            pair = ?ev.pair,
            token0 = %token0.symbol,
            token1 = %token1.symbol,
            protocol = ev.protocol.0,
            tracked,
            "pair discovered"
        );

        self.store.save_token(token0);
        self.store.save_token(token1);
        self.store.save_pair(pair);
        self.store.save_totals(totals);
        Ok(ProcessOutcome::Applied)
    }

    /// Overwrites the pair's reserves, then reprices both tokens inside one aggregate bracket
    /// and revalues the pair's lending pool at the new prices.
    pub(super) fn on_reserve_sync(&mut self, ev: &ReserveSyncEvent) -> Result<ProcessOutcome, IndexerError> {
        let mut pair = self.load_pair(ev.pair)?;
        let previous = pair.reserves;
        pair.reserves = [ev.reserve0, ev.reserve1];

        if !pair.tracked {
            self.store.save_pair(pair);
            return Ok(ProcessOutcome::Unchanged);
        }

        let (mut token0, mut token1) = self.load_pair_tokens(&pair)?;
        let mut pool = match pair.pool {
            Some(id) => Some(self.store.load_pool(&id).ok_or(IndexerError::PoolNotFound(id))?),
            None => None,
        };

        // the reference pair may be this one, so the resolver has to see the new reserves
        self.store.save_pair(pair.clone());
        let quote = resolve_eth_usd(&self.config.network, &self.store, &self.chain);
        let pair_price = pair.price(token0.decimals, token1.decimals);

        let network = &self.config.network;
        let mut totals = self.load_totals();
        let rule = totals.revalue_pair(&mut token0, &mut token1, |t0, t1| {
            t0.shift_lp_held(previous[0], pair.reserves[0]);
            t1.shift_lp_held(previous[1], pair.reserves[1]);
            propagate(network, t0, t1, pair_price, quote.eth_usd)
        });

        tracing::debug!(
            pair = ?pair.id,
            ?rule,
            pair_price = %pair_price,
            eth_usd = %quote.eth_usd,
            source = ?quote.source,
            "reserves synced"
        );

        if let Some(pool) = pool.as_mut() {
            pool.revalue(&PricingContext::new(&pair, &token0, &token1));
        }

        self.store.save_token(token0);
        self.store.save_token(token1);
        if let Some(pool) = pool {
            self.store.save_pool(pool);
        }
        self.store.save_totals(totals);
        Ok(ProcessOutcome::Priced {
            rule,
            source: quote.source,
        })
    }

    /// Removes the pair's reserves from its tokens' balances. Reserves keep syncing afterwards
    /// but no longer price or count.
    pub(super) fn on_pair_untracked(&mut self, ev: &PairUntrackedEvent) -> Result<ProcessOutcome, IndexerError> {
        let mut pair = self.load_pair(ev.pair)?;
        if !pair.tracked {
            return Ok(ProcessOutcome::Unchanged);
        }
        let (mut token0, mut token1) = self.load_pair_tokens(&pair)?;

        let mut totals = self.load_totals();
        totals.revalue_pair(&mut token0, &mut token1, |t0, t1| {
            t0.shift_lp_held(pair.reserves[0], U256::zero());
            t1.shift_lp_held(pair.reserves[1], U256::zero());
        });
        pair.tracked = false;

        tracing::info!(pair = ?pair.id, "pair untracked");

        self.store.save_token(token0);
        self.store.save_token(token1);
        self.store.save_pair(pair);
        self.store.save_totals(totals);
        Ok(ProcessOutcome::Applied)
    }
}
