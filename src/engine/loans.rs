//! Loan notifications: creation, updates driving the status machine, liquidations.

use super::core::Indexer;
use super::results::{IndexerError, ProcessOutcome};
use crate::chain::ChainReader;
use crate::events::{LiquidationEvent, LoanCreatedEvent, LoanUpdatedEvent};
use crate::fixed_point::to_decimal;
use crate::loan::{BlockStamp, LiquidationDetails, Loan, LoanFigures, StatusChange, TxKind, TxType};
use crate::pool::LendingPool;
use crate::store::Store;
use crate::totals::AggregateTotals;
use crate::valuation::PricingContext;

// rate indices are 18-decimal fixed point
const RATE_INDEX_DECIMALS: u32 = 18;

impl<S: Store, C: ChainReader> Indexer<S, C> {
    pub(super) fn on_loan_created(
        &mut self,
        ev: &LoanCreatedEvent,
        stamp: BlockStamp,
    ) -> Result<ProcessOutcome, IndexerError> {
        if self.store.load_loan(&ev.loan).is_some() {
            return Err(IndexerError::DuplicateLoan(ev.loan));
        }
        let mut pool = self.store.load_pool(&ev.pool).ok_or(IndexerError::PoolNotFound(ev.pool))?;

        let loan = Loan::new(ev.loan, ev.pool, ev.owner, stamp);
        let mut totals = self.load_totals();
        pool.record_loan_opened();
        totals.record_loan_opened();

        tracing::info!(loan = %loan.id, pool = ?pool.id, owner = ?ev.owner, "loan opened");

        self.store.save_loan(loan);
        self.store.save_pool(pool);
        self.store.save_totals(totals);
        Ok(ProcessOutcome::Applied)
    }

    pub(super) fn on_loan_updated(
        &mut self,
        ev: &LoanUpdatedEvent,
        stamp: BlockStamp,
    ) -> Result<ProcessOutcome, IndexerError> {
        let mut loan = self.store.load_loan(&ev.loan).ok_or(IndexerError::LoanNotFound(ev.loan))?;
        if loan.pool != ev.pool {
            tracing::warn!(loan = %loan.id, stored = ?loan.pool, reported = ?ev.pool, "loan update from another pool");
        }
        let mut pool = self.store.load_pool(&loan.pool).ok_or(IndexerError::PoolNotFound(loan.pool))?;
        let pricing = self.pool_pricing(&pool)?;

        let figures = LoanFigures {
            tokens_held: ev.tokens_held,
            liquidity: ev.liquidity,
            initial_liquidity: ev.initial_liquidity,
            lp_tokens: ev.lp_tokens,
            rate_index: ev.rate_index,
        };
        loan.set_figures(figures, to_decimal(ev.rate_index, RATE_INDEX_DECIMALS));
        let tx = TxType::from_code(ev.tx_type);
        if let TxType::Unknown(code) = tx {
            tracing::warn!(loan = %loan.id, code, "unknown transaction type, status held");
        }
        let change = loan.apply_tx(tx, stamp);
        loan.revalue(&pricing);

        let mut totals = self.load_totals();
        record_transition(&loan, change, &mut pool, &mut totals);

        let status = loan.status;
        self.store.save_loan(loan);
        self.store.save_pool(pool);
        self.store.save_totals(totals);
        Ok(ProcessOutcome::LoanTransition { status, change })
    }

    pub(super) fn on_liquidation(
        &mut self,
        ev: &LiquidationEvent,
        stamp: BlockStamp,
    ) -> Result<ProcessOutcome, IndexerError> {
        let mut loan = self.store.load_loan(&ev.loan).ok_or(IndexerError::LoanNotFound(ev.loan))?;
        let mut pool = self.store.load_pool(&loan.pool).ok_or(IndexerError::PoolNotFound(loan.pool))?;
        let pricing = self.pool_pricing(&pool)?;

        let tx = match TxType::from_code(ev.tx_type) {
            tx if tx.kind() == TxKind::Liquidation => tx,
            other => {
                tracing::warn!(loan = %loan.id, ?other, "liquidation carried a non-liquidation type");
                TxType::Liquidate
            }
        };
        loan.record_liquidation(LiquidationDetails {
            collateral: ev.collateral,
            liquidity: ev.liquidity,
            write_down: ev.write_down,
            stamp,
        });
        let change = loan.apply_tx(tx, stamp);
        // terminal loans keep the valuation taken at liquidation prices
        loan.revalue(&pricing);

        let mut totals = self.load_totals();
        record_transition(&loan, change, &mut pool, &mut totals);

        let status = loan.status;
        self.store.save_loan(loan);
        self.store.save_pool(pool);
        self.store.save_totals(totals);
        Ok(ProcessOutcome::LoanTransition { status, change })
    }

    fn pool_pricing(&self, pool: &LendingPool) -> Result<PricingContext, IndexerError> {
        let pair = self.load_pair(pool.pair)?;
        let (token0, token1) = self.load_pair_tokens(&pair)?;
        Ok(PricingContext::new(&pair, &token0, &token1))
    }
}

// CLOSED and LIQUIDATED both leave the active counters
fn record_transition(loan: &Loan, change: StatusChange, pool: &mut LendingPool, totals: &mut AggregateTotals) {
    if !change.terminates() {
        return;
    }
    pool.record_loan_terminated();
    totals.record_loan_terminated();
    match change {
        StatusChange::Liquidated => tracing::info!(loan = %loan.id, pool = ?pool.id, "loan liquidated"),
        _ => tracing::info!(loan = %loan.id, pool = ?pool.id, "loan closed"),
    }
}
