//! Pool share transfers.

use super::core::Indexer;
use super::results::{IndexerError, ProcessOutcome};
use crate::balance::{AccountBalance, AccountBalanceId};
use crate::chain::ChainReader;
use crate::events::ShareTransferEvent;
use crate::loan::BlockStamp;
use crate::pool::LendingPool;
use crate::store::Store;
use crate::types::Address;

impl<S: Store, C: ChainReader> Indexer<S, C> {
    /// Moves shares between accounts and revalues both balances at the pool's current supplied
    /// value. The zero address is the mint source and burn sink and keeps no balance.
    pub(super) fn on_share_transfer(
        &mut self,
        ev: &ShareTransferEvent,
        stamp: BlockStamp,
    ) -> Result<ProcessOutcome, IndexerError> {
        let pool = self.store.load_pool(&ev.pool).ok_or(IndexerError::PoolNotFound(ev.pool))?;
        if ev.amount.is_zero() || ev.from == ev.to {
            return Ok(ProcessOutcome::Unchanged);
        }

        let share_decimals = self.config.share_decimals;
        let mut touched = Vec::with_capacity(2);
        if !ev.from.is_zero() {
            let mut balance = self.account_balance(&pool, ev.from, stamp);
            balance.debit(ev.amount);
            touched.push(balance);
        }
        if !ev.to.is_zero() {
            let mut balance = self.account_balance(&pool, ev.to, stamp);
            balance.credit(ev.amount);
            touched.push(balance);
        }

        for mut balance in touched {
            balance.value = pool.share_value(balance.shares, share_decimals);
            balance.last_updated = stamp.block;
            self.store.save_account_balance(balance);
        }
        Ok(ProcessOutcome::Applied)
    }

    // balances are created lazily on the first transfer that touches them
    fn account_balance(&self, pool: &LendingPool, account: Address, stamp: BlockStamp) -> AccountBalance {
        let id = AccountBalanceId::new(pool.id, account);
        self.store
            .load_account_balance(&id)
            .unwrap_or_else(|| AccountBalance::new(id, stamp.block))
    }
}

