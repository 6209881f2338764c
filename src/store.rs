//! Entity storage.
//!
//! The core only needs `load(id) -> Option<Entity>` and `save(Entity)` per entity kind.
//! Entities reference each other by id and are resolved through the store, so any of them
//! can be loaded and saved on its own.

use crate::balance::{AccountBalance, AccountBalanceId};
use crate::loan::Loan;
use crate::pair::TradingPair;
use crate::pool::LendingPool;
use crate::token::Token;
use crate::totals::AggregateTotals;
use crate::types::{Address, LoanId};
use std::collections::HashMap;

pub trait Store {
    fn load_token(&self, id: &Address) -> Option<Token>;
    fn save_token(&mut self, token: Token);

    fn load_pair(&self, id: &Address) -> Option<TradingPair>;
    fn save_pair(&mut self, pair: TradingPair);

    fn load_pool(&self, id: &Address) -> Option<LendingPool>;
    fn save_pool(&mut self, pool: LendingPool);

    fn load_loan(&self, id: &LoanId) -> Option<Loan>;
    fn save_loan(&mut self, loan: Loan);

    fn load_account_balance(&self, id: &AccountBalanceId) -> Option<AccountBalance>;
    fn save_account_balance(&mut self, balance: AccountBalance);

    /// The process-wide totals singleton, `None` until first saved.
    fn load_totals(&self) -> Option<AggregateTotals>;
    fn save_totals(&mut self, totals: AggregateTotals);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tokens: HashMap<Address, Token>,
    pairs: HashMap<Address, TradingPair>,
    pools: HashMap<Address, LendingPool>,
    loans: HashMap<LoanId, Loan>,
    balances: HashMap<AccountBalanceId, AccountBalance>,
    totals: Option<AggregateTotals>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &TradingPair> {
        self.pairs.values()
    }

    pub fn pools(&self) -> impl Iterator<Item = &LendingPool> {
        self.pools.values()
    }

    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values()
    }

    pub fn account_balances(&self) -> impl Iterator<Item = &AccountBalance> {
        self.balances.values()
    }
}

impl Store for MemoryStore {
    fn load_token(&self, id: &Address) -> Option<Token> {
        self.tokens.get(id).cloned()
    }

    fn save_token(&mut self, token: Token) {
        self.tokens.insert(token.id, token);
    }

    fn load_pair(&self, id: &Address) -> Option<TradingPair> {
        self.pairs.get(id).cloned()
    }

    fn save_pair(&mut self, pair: TradingPair) {
        self.pairs.insert(pair.id, pair);
    }

    fn load_pool(&self, id: &Address) -> Option<LendingPool> {
        self.pools.get(id).cloned()
    }

    fn save_pool(&mut self, pool: LendingPool) {
        self.pools.insert(pool.id, pool);
    }

    fn load_loan(&self, id: &LoanId) -> Option<Loan> {
        self.loans.get(id).cloned()
    }

    fn save_loan(&mut self, loan: Loan) {
        self.loans.insert(loan.id, loan);
    }

    fn load_account_balance(&self, id: &AccountBalanceId) -> Option<AccountBalance> {
        self.balances.get(id).cloned()
    }

    fn save_account_balance(&mut self, balance: AccountBalance) {
        self.balances.insert(balance.id, balance);
    }

    fn load_totals(&self) -> Option<AggregateTotals> {
        self.totals.clone()
    }

    fn save_totals(&mut self, totals: AggregateTotals) {
        self.totals = Some(totals);
    }
}
