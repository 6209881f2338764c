//! Lending pool notifications.

use super::core::Indexer;
use super::results::{IndexerError, ProcessOutcome};
use crate::chain::ChainReader;
use crate::events::{PoolCreatedEvent, PoolUpdatedEvent};
use crate::loan::BlockStamp;
use crate::pool::LendingPool;
use crate::store::Store;
use crate::valuation::PricingContext;

impl<S: Store, C: ChainReader> Indexer<S, C> {
    pub(super) fn on_pool_created(
        &mut self,
        ev: &PoolCreatedEvent,
        stamp: BlockStamp,
    ) -> Result<ProcessOutcome, IndexerError> {
        if self.store.load_pool(&ev.pool).is_some() {
            return Err(IndexerError::DuplicatePool(ev.pool));
        }
        let mut pair = self.load_pair(ev.pair)?;

        // token sides always follow the pair
        if ev.tokens != pair.tokens() {
            tracing::warn!(pool = ?ev.pool, pair = ?pair.id, "pool tokens differ from pair tokens, using pair order");
        }
        if let Some(existing) = pair.pool {
            tracing::warn!(pair = ?pair.id, previous = ?existing, pool = ?ev.pool, "pair relinked to a new pool");
        }

        let pool = LendingPool::new(ev.pool, ev.pair, pair.tokens(), ev.protocol, stamp.block);
        pair.pool = Some(pool.id);
        let mut totals = self.load_totals();
        totals.record_pool_created();

        tracing::info!(pool = ?pool.id, pair = ?pair.id, protocol = ev.protocol.0, "pool created");

        self.store.save_pool(pool);
        self.store.save_pair(pair);
        self.store.save_totals(totals);
        Ok(ProcessOutcome::Applied)
    }

    /// Reads the pool's metric snapshot and applies it. Token pool-held and borrowed balances
    /// move inside one aggregate bracket; the pool is then revalued wholesale.
    ///
    /// The borrowed split uses the snapshot's reserves, so a reserve sync landing between
    /// two updates leaves it stale until the next update.
    pub(super) fn on_pool_updated(
        &mut self,
        ev: &PoolUpdatedEvent,
        stamp: BlockStamp,
    ) -> Result<ProcessOutcome, IndexerError> {
        let mut pool = self.store.load_pool(&ev.pool).ok_or(IndexerError::PoolNotFound(ev.pool))?;
        let mut pair = self.load_pair(pool.pair)?;
        let (mut token0, mut token1) = self.load_pair_tokens(&pair)?;
        let snapshot = self.chain.pool_snapshot(pool.id)?;

        pair.total_supply = snapshot.cfmm_total_supply;

        let mut totals = self.load_totals();
        totals.revalue_pair(&mut token0, &mut token1, |t0, t1| {
            let (before, after) = pool.apply_snapshot(&snapshot, stamp.block);
            for (side, token) in [t0, t1].into_iter().enumerate() {
                token.shift_pool_held(before.token_balances[side], after.token_balances[side]);
                token.shift_borrowed(before.borrowed_split[side], after.borrowed_split[side]);
            }
        });
        pool.revalue(&PricingContext::new(&pair, &token0, &token1));

        tracing::debug!(
            pool = ?pool.id,
            supplied_eth = %pool.valuation.supplied.eth,
            borrowed_eth = %pool.valuation.borrowed.eth,
            utilization = %pool.rates.utilization,
            "pool updated"
        );

        self.store.save_token(token0);
        self.store.save_token(token1);
        self.store.save_pair(pair);
        self.store.save_pool(pool);
        self.store.save_totals(totals);
        Ok(ProcessOutcome::Applied)
    }
}
