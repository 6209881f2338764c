//! End-to-end notification streams through the indexer.
//!
//! Every test drives an in-memory store and a static chain reader and checks the persisted
//! entities, including the aggregate ledger against the sum of token contributions.

use lending_index_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const REFERENCE_PAIR: u8 = 0x50;
const TOKEN_PAIR: u8 = 0x60;
const POOL: u8 = 0x70;

fn e18(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

struct Harness {
    indexer: Indexer<MemoryStore, StaticChainReader>,
    block: u64,
    log_index: u32,
    native: Address,
    stable: Address,
    token: Address,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(Network::Arbitrum.config())
    }

    fn with_config(mut config: IndexerConfig) -> Self {
        config.network.reference_pair = Some(Address::repeat_byte(REFERENCE_PAIR));
        let native = config.network.native_token;
        let stable = config.network.stable_tokens[0];
        // below every preset native address, so it is always token0 against the native token
        let token = Address::repeat_byte(0x11);

        let mut chain = StaticChainReader::new();
        chain.set_token(native, "WETH", 18);
        chain.set_token(stable, "USDC", 6);
        chain.set_token(token, "TKN", 18);

        Self {
            indexer: Indexer::new(config, MemoryStore::new(), chain).unwrap(),
            block: 10,
            log_index: 0,
            native,
            stable,
            token,
        }
    }

    fn send(&mut self, payload: NotificationPayload) -> ProcessOutcome {
        let n = self.notification(payload);
        self.indexer.process(&n)
    }

    fn apply(&mut self, payload: NotificationPayload) -> Result<ProcessOutcome, IndexerError> {
        let n = self.notification(payload);
        self.indexer.apply(&n)
    }

    fn notification(&mut self, payload: NotificationPayload) -> Notification {
        let position = LogPosition::new(self.block, self.log_index);
        self.log_index += 1;
        Notification::new(position, Timestamp::from_secs(self.block as i64 * 12), payload)
    }

    fn next_block(&mut self) {
        self.block += 1;
        self.log_index = 0;
    }

    fn create_pair(&mut self, pair: Address, token0: Address, token1: Address, protocol: u16) -> ProcessOutcome {
        self.send(NotificationPayload::PairCreated(PairCreatedEvent {
            pair,
            token0,
            token1,
            protocol: ProtocolId(protocol),
        }))
    }

    fn sync(&mut self, pair: Address, reserve0: U256, reserve1: U256) -> ProcessOutcome {
        self.send(NotificationPayload::ReserveSync(ReserveSyncEvent {
            pair,
            reserve0,
            reserve1,
        }))
    }

    /// Reference pair at 3000 USDC per WETH, and a TKN/WETH pair at the given reserves.
    fn bootstrap(&mut self, token_reserve: U256, native_reserve: U256) {
        self.create_pair(Address::repeat_byte(REFERENCE_PAIR), self.native, self.stable, 1);
        self.create_pair(Address::repeat_byte(TOKEN_PAIR), self.token, self.native, 1);
        self.next_block();
        self.sync(Address::repeat_byte(REFERENCE_PAIR), e18(1), U256::from(3_000_000_000u64));
        self.sync(Address::repeat_byte(TOKEN_PAIR), token_reserve, native_reserve);
    }

    /// TKN/WETH at 4 WETH per TKN with a pool on top. Pair invariant 20.
    fn bootstrap_pool(&mut self) {
        self.bootstrap(e18(10), e18(40));
        self.next_block();
        self.send(NotificationPayload::PoolCreated(PoolCreatedEvent {
            pool: Address::repeat_byte(POOL),
            pair: Address::repeat_byte(TOKEN_PAIR),
            protocol: ProtocolId(1),
            tokens: [self.token, self.native],
        }));
        self.set_snapshot([e18(10), e18(40)]);
        self.send(NotificationPayload::PoolUpdated(PoolUpdatedEvent {
            pool: Address::repeat_byte(POOL),
        }));
    }

    // half the pair's liquidity deposited, a quarter of the invariant borrowed with interest
    fn set_snapshot(&mut self, reserves: Sided<U256>) {
        let snapshot = PoolSnapshot {
            token_balances: [e18(1), e18(2)],
            lp_tokens_held: e18(10),
            lp_tokens_borrowed: e18(4),
            lp_tokens_borrowed_plus_interest: e18(5),
            lp_invariant: e18(10),
            borrowed_invariant: e18(5),
            cfmm_reserves: reserves,
            cfmm_invariant: fixed_point::invariant_of(reserves[0], reserves[1]),
            cfmm_total_supply: e18(20),
            total_supply: e18(15),
            ..PoolSnapshot::default()
        };
        self.indexer
            .chain_mut()
            .set_pool_snapshot(Address::repeat_byte(POOL), snapshot);
    }

    fn open_loan(&mut self, id: u64) {
        self.send(NotificationPayload::LoanCreated(LoanCreatedEvent {
            pool: Address::repeat_byte(POOL),
            loan: LoanId::from_u64(id),
            owner: Address::repeat_byte(0xa1),
        }));
    }

    fn update_loan(&mut self, id: u64, tx_type: u8, liquidity: U256) -> ProcessOutcome {
        self.send(NotificationPayload::LoanUpdated(LoanUpdatedEvent {
            pool: Address::repeat_byte(POOL),
            loan: LoanId::from_u64(id),
            tx_type,
            tokens_held: [e18(1), U256::zero()],
            liquidity,
            initial_liquidity: e18(5),
            lp_tokens: e18(5),
            rate_index: U256::exp10(18),
        }))
    }

    fn token(&self, id: Address) -> Token {
        self.indexer.store().load_token(&id).unwrap()
    }

    fn pool(&self) -> LendingPool {
        self.indexer.store().load_pool(&Address::repeat_byte(POOL)).unwrap()
    }

    fn loan(&self, id: u64) -> Loan {
        self.indexer.store().load_loan(&LoanId::from_u64(id)).unwrap()
    }

    fn assert_ledger_consistent(&self) {
        let totals = self.indexer.totals();
        let sum = |f: fn(&Token) -> Decimal| self.indexer.store().tokens().map(f).sum::<Decimal>();
        assert_eq!(totals.total_value_locked().usd, sum(|t| t.values().balance.usd));
        assert_eq!(totals.total_value_locked().eth, sum(|t| t.values().balance.eth));
        assert_eq!(totals.lp_value().usd, sum(|t| t.values().lp_held.usd));
        assert_eq!(totals.pool_held_value().usd, sum(|t| t.values().pool_held.usd));
        assert_eq!(totals.borrowed_value().usd, sum(|t| t.values().borrowed.usd));
    }
}

#[test]
fn native_pair_prices_token_from_reference_rate() {
    let mut h = Harness::new();
    h.bootstrap(e18(2000), e18(1));

    let quote = h.indexer.eth_usd();
    assert_eq!(quote.eth_usd, dec!(3000));
    assert_eq!(quote.source, PriceSource::ReferencePair);

    let native = h.token(h.native);
    assert_eq!(native.price_eth(), Decimal::ONE);
    assert_eq!(native.price_usd(), dec!(3000.000000));

    let token = h.token(h.token);
    assert_eq!(token.price_eth(), dec!(0.000500000000000000));
    assert_eq!(token.price_usd(), dec!(1.500000));
    assert_eq!(token.values().balance.eth, dec!(1));
    assert_eq!(token.values().balance.usd, dec!(3000));

    h.assert_ledger_consistent();
    assert_eq!(h.indexer.totals().pair_count(), 2);
}

#[test]
fn native_rule_outranks_stable_on_reference_pair() {
    let mut h = Harness::new();
    h.bootstrap(e18(2000), e18(1));

    // USDC is priced off WETH, so its USD price carries the truncation of 1/3000
    let stable = h.token(h.stable);
    assert_eq!(stable.price_eth(), dec!(0.000333333333333333));
    assert_eq!(stable.price_usd(), dec!(0.999999));
}

#[test]
fn sync_reports_selected_rule() {
    let mut h = Harness::new();
    h.bootstrap(e18(2000), e18(1));
    let outcome = h.sync(Address::repeat_byte(TOKEN_PAIR), e18(1000), e18(1));
    assert_eq!(
        outcome,
        ProcessOutcome::Priced {
            rule: PriceRule::Token1Native,
            source: PriceSource::ReferencePair
        }
    );
    assert_eq!(h.token(h.token).price_usd(), dec!(3));
    h.assert_ledger_consistent();
}

#[test]
fn unknown_reference_rate_keeps_cached_usd_prices() {
    let mut config = Network::Arbitrum.config();
    config.network.fallback_pool = None;
    let mut h = Harness::with_config(config);

    // no reference pair yet: native prices move, USD prices stay unset
    h.create_pair(Address::repeat_byte(TOKEN_PAIR), h.token, h.native, 1);
    h.sync(Address::repeat_byte(TOKEN_PAIR), e18(2000), e18(1));
    let token = h.token(h.token);
    assert_eq!(token.price_eth(), dec!(0.0005));
    assert_eq!(token.price_usd(), Decimal::ZERO);
    h.assert_ledger_consistent();
}

#[test]
fn fallback_pool_used_until_reference_pair_indexed() {
    let mut h = Harness::new();
    let fallback = h.indexer.config().network.fallback_pool.unwrap();
    let (native, stable) = (h.native, h.stable);
    h.indexer.chain_mut().set_reserves(
        fallback,
        ReservesSnapshot {
            tokens: [native, stable],
            reserves: [e18(2), U256::from(5_000_000_000u64)],
        },
    );

    h.create_pair(Address::repeat_byte(TOKEN_PAIR), h.token, h.native, 1);
    let outcome = h.sync(Address::repeat_byte(TOKEN_PAIR), e18(1000), e18(1));
    assert_eq!(
        outcome,
        ProcessOutcome::Priced {
            rule: PriceRule::Token1Native,
            source: PriceSource::FallbackPool
        }
    );
    assert_eq!(h.token(h.native).price_usd(), dec!(2500));
    assert_eq!(h.token(h.token).price_usd(), dec!(2.5));
}

#[test]
fn pool_update_values_positions_wholesale() {
    let mut h = Harness::new();
    h.bootstrap_pool();

    let pool = h.pool();
    // invariant I is worth 4 * I WETH at 4 WETH per TKN
    assert_eq!(pool.valuation.supplied.eth, dec!(60));
    assert_eq!(pool.valuation.supplied.usd, dec!(180000));
    assert_eq!(pool.valuation.borrowed.eth, dec!(20));
    assert_eq!(pool.valuation.collateral.eth, dec!(6));
    assert_eq!(pool.valuation.value_locked.eth, dec!(46));
    assert_eq!(pool.valuation.value_locked.usd, dec!(138000));
    assert_eq!(pool.borrowed_invariant, e18(4));
    assert_eq!(pool.last_updated, Some(BlockNumber(12)));

    let token = h.token(h.token);
    assert_eq!(token.raw().pool_held, e18(1));
    assert_eq!(token.raw().lp_held, e18(10));
    assert_eq!(token.raw().total, e18(11));
    assert_eq!(token.raw().borrowed, U256::exp10(17) * U256::from(25u8));

    let pair = h.indexer.store().load_pair(&Address::repeat_byte(TOKEN_PAIR)).unwrap();
    assert_eq!(pair.pool, Some(Address::repeat_byte(POOL)));
    assert_eq!(pair.total_supply, e18(20));

    h.assert_ledger_consistent();
    assert_eq!(h.indexer.totals().pool_count(), 1);
}

#[test]
fn repeated_pool_update_is_idempotent() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    let totals = h.indexer.totals();
    let pool = h.pool();

    h.send(NotificationPayload::PoolUpdated(PoolUpdatedEvent {
        pool: Address::repeat_byte(POOL),
    }));
    assert_eq!(h.indexer.totals(), totals);
    assert_eq!(h.pool().valuation, pool.valuation);
}

#[test]
fn reserve_sync_before_pool_update_heals_on_update() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    assert_eq!(h.token(h.token).raw().borrowed, U256::exp10(17) * U256::from(25u8));

    // same invariant, price drops to 1
    h.next_block();
    h.sync(Address::repeat_byte(TOKEN_PAIR), e18(20), e18(20));
    assert_eq!(h.token(h.token).raw().borrowed, U256::exp10(17) * U256::from(25u8));
    h.assert_ledger_consistent();

    h.set_snapshot([e18(20), e18(20)]);
    h.send(NotificationPayload::PoolUpdated(PoolUpdatedEvent {
        pool: Address::repeat_byte(POOL),
    }));
    assert_eq!(h.token(h.token).raw().borrowed, e18(5));
    h.assert_ledger_consistent();
}

#[test]
fn sync_revalues_linked_pool() {
    let mut h = Harness::new();
    h.bootstrap_pool();

    // price 1: I is worth 2 * I WETH
    h.next_block();
    h.sync(Address::repeat_byte(TOKEN_PAIR), e18(20), e18(20));
    assert_eq!(h.pool().valuation.supplied.eth, dec!(30));
}

#[test]
fn borrow_leaving_zero_liquidity_stays_open() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    h.open_loan(1);
    assert_eq!(h.indexer.totals().active_loan_count(), 1);

    let outcome = h.update_loan(1, 7, U256::zero());
    assert_eq!(
        outcome,
        ProcessOutcome::LoanTransition {
            status: LoanStatus::Open,
            change: StatusChange::Unchanged
        }
    );
    let loan = h.loan(1);
    assert_eq!(loan.status, LoanStatus::Open);
    assert!(loan.opened.is_some());
    assert_eq!(h.indexer.totals().active_loan_count(), 1);
    assert_eq!(h.pool().active_loan_count, 1);
}

#[test]
fn full_repay_closes_once() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    h.open_loan(1);
    h.open_loan(2);

    h.update_loan(1, 7, e18(5));
    let loan = h.loan(1);
    assert_eq!(loan.liquidity_value.eth, dec!(20));
    assert_eq!(loan.liquidity_value.usd, dec!(60000));
    assert_eq!(loan.collateral_value.eth, dec!(4));
    assert_eq!(loan.rate_index, Decimal::ONE);

    h.update_loan(1, 8, e18(2));
    assert!(h.loan(1).is_open());

    h.next_block();
    h.update_loan(1, 10, U256::zero());
    let loan = h.loan(1);
    assert_eq!(loan.status, LoanStatus::Closed);
    assert_eq!(loan.closed.map(|s| s.block), Some(BlockNumber(13)));

    // a terminal loan never leaves its state or counts twice
    h.update_loan(1, 8, U256::zero());
    h.update_loan(1, 7, e18(5));
    assert_eq!(h.loan(1).status, LoanStatus::Closed);

    let totals = h.indexer.totals();
    assert_eq!(totals.loan_count(), 2);
    assert_eq!(totals.active_loan_count(), 1);
    assert_eq!(h.pool().active_loan_count, 1);
    assert_eq!(h.pool().loan_count, 2);
}

#[test]
fn liquidation_records_details_and_terminates() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    h.open_loan(1);
    h.update_loan(1, 7, e18(5));

    h.next_block();
    let outcome = h.send(NotificationPayload::Liquidation(LiquidationEvent {
        pool: Address::repeat_byte(POOL),
        loan: LoanId::from_u64(1),
        collateral: e18(1),
        liquidity: e18(5),
        write_down: e18(1),
        tx_type: 12,
    }));
    assert_eq!(
        outcome,
        ProcessOutcome::LoanTransition {
            status: LoanStatus::Liquidated,
            change: StatusChange::Liquidated
        }
    );

    // the matching loan update follows in the same transaction
    h.update_loan(1, 12, U256::zero());

    let loan = h.loan(1);
    assert_eq!(loan.status, LoanStatus::Liquidated);
    let details = loan.liquidation.unwrap();
    assert_eq!(details.write_down, e18(1));
    assert_eq!(details.stamp.block, BlockNumber(13));
    assert_eq!(h.indexer.totals().active_loan_count(), 0);
    assert_eq!(h.pool().active_loan_count, 0);
}

#[test]
fn liquidation_values_loan_at_current_prices() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    h.open_loan(1);
    h.update_loan(1, 7, e18(5));
    // I = 5 at 4 WETH per TKN: 2 * 5 * 2
    assert_eq!(h.loan(1).liquidity_value.eth, dec!(20));

    h.next_block();
    h.sync(Address::repeat_byte(TOKEN_PAIR), e18(10), e18(90));
    h.send(NotificationPayload::Liquidation(LiquidationEvent {
        pool: Address::repeat_byte(POOL),
        loan: LoanId::from_u64(1),
        collateral: e18(1),
        liquidity: e18(5),
        write_down: U256::zero(),
        tx_type: 12,
    }));

    // 9 WETH per TKN: 2 * 5 * 3, and the 1 TKN held is worth 9
    let loan = h.loan(1);
    assert_eq!(loan.status, LoanStatus::Liquidated);
    assert_eq!(loan.liquidity_value.eth, dec!(30));
    assert_eq!(loan.collateral_value.eth, dec!(9));
}

#[test]
fn share_transfers_value_balances_pro_rata() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    let pool = Address::repeat_byte(POOL);
    let (alice, bob) = (Address::repeat_byte(0xa1), Address::repeat_byte(0xb2));

    h.send(NotificationPayload::ShareTransfer(ShareTransferEvent {
        pool,
        from: Address::zero(),
        to: alice,
        amount: e18(3),
    }));
    h.send(NotificationPayload::ShareTransfer(ShareTransferEvent {
        pool,
        from: alice,
        to: bob,
        amount: e18(1),
    }));

    let store = h.indexer.store();
    let alice_balance = store.load_account_balance(&AccountBalanceId::new(pool, alice)).unwrap();
    let bob_balance = store.load_account_balance(&AccountBalanceId::new(pool, bob)).unwrap();
    assert_eq!(alice_balance.shares, e18(2));
    // 2 of 15 shares of a pool supplying 60 ETH
    assert_eq!(alice_balance.value.eth, dec!(8));
    assert_eq!(bob_balance.value.usd, dec!(12000));
    assert!(store
        .load_account_balance(&AccountBalanceId::new(pool, Address::zero()))
        .is_none());
}

#[test]
fn zero_transfer_creates_nothing() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    let outcome = h.send(NotificationPayload::ShareTransfer(ShareTransferEvent {
        pool: Address::repeat_byte(POOL),
        from: Address::zero(),
        to: Address::repeat_byte(0xa1),
        amount: U256::zero(),
    }));
    assert_eq!(outcome, ProcessOutcome::Unchanged);
    assert_eq!(h.indexer.store().account_balances().count(), 0);
}

#[test]
fn missing_entities_skip_without_side_effects() {
    let mut h = Harness::new();
    h.bootstrap_pool();
    let totals = h.indexer.totals();

    let result = h.apply(NotificationPayload::LoanUpdated(LoanUpdatedEvent {
        pool: Address::repeat_byte(POOL),
        loan: LoanId::from_u64(404),
        tx_type: 7,
        tokens_held: [U256::zero(); 2],
        liquidity: U256::zero(),
        initial_liquidity: U256::zero(),
        lp_tokens: U256::zero(),
        rate_index: U256::zero(),
    }));
    assert_eq!(result, Err(IndexerError::LoanNotFound(LoanId::from_u64(404))));

    let outcome = h.sync(Address::repeat_byte(0x61), e18(1), e18(1));
    assert_eq!(outcome, ProcessOutcome::Skipped);
    let outcome = h.send(NotificationPayload::LoanCreated(LoanCreatedEvent {
        pool: Address::repeat_byte(0x71),
        loan: LoanId::from_u64(1),
        owner: Address::repeat_byte(0xa1),
    }));
    assert_eq!(outcome, ProcessOutcome::Skipped);

    assert_eq!(h.indexer.totals(), totals);
    assert!(h.indexer.store().load_loan(&LoanId::from_u64(1)).is_none());
    assert_eq!(h.indexer.skipped_count(), 2);
}

#[test]
fn reverted_pool_read_skips_update() {
    let mut h = Harness::new();
    h.bootstrap(e18(10), e18(40));
    h.send(NotificationPayload::PoolCreated(PoolCreatedEvent {
        pool: Address::repeat_byte(POOL),
        pair: Address::repeat_byte(TOKEN_PAIR),
        protocol: ProtocolId(1),
        tokens: [h.token, h.native],
    }));
    let totals = h.indexer.totals();

    let result = h.apply(NotificationPayload::PoolUpdated(PoolUpdatedEvent {
        pool: Address::repeat_byte(POOL),
    }));
    assert!(matches!(result, Err(IndexerError::Chain(ChainError::Reverted { .. }))));
    assert_eq!(h.pool().last_updated, None);
    assert_eq!(h.indexer.totals(), totals);
}

#[test]
fn duplicate_discovery_is_rejected() {
    let mut h = Harness::new();
    h.bootstrap(e18(2000), e18(1));
    let result = h.apply(NotificationPayload::PairCreated(PairCreatedEvent {
        pair: Address::repeat_byte(TOKEN_PAIR),
        token0: h.token,
        token1: h.native,
        protocol: ProtocolId(1),
    }));
    assert_eq!(result, Err(IndexerError::DuplicatePair(Address::repeat_byte(TOKEN_PAIR))));
    assert_eq!(h.indexer.totals().pair_count(), 2);
}

#[test]
fn discovery_with_unreadable_token_is_skipped() {
    let mut h = Harness::new();
    let outcome = h.create_pair(Address::repeat_byte(0x61), Address::repeat_byte(0x01), h.native, 1);
    assert_eq!(outcome, ProcessOutcome::Skipped);
    assert!(h.indexer.store().load_pair(&Address::repeat_byte(0x61)).is_none());
    assert_eq!(h.indexer.store().tokens().count(), 0);
}

#[test]
fn untracking_removes_pair_contribution() {
    let mut h = Harness::new();
    h.bootstrap(e18(2000), e18(1));
    let before = h.indexer.totals().total_value_locked().usd;

    h.send(NotificationPayload::PairUntracked(PairUntrackedEvent {
        pair: Address::repeat_byte(TOKEN_PAIR),
    }));
    // 2000 TKN at 1.5 and 1 WETH at 3000
    assert_eq!(h.indexer.totals().total_value_locked().usd, before - dec!(6000));
    assert!(h.token(h.token).raw().total.is_zero());
    h.assert_ledger_consistent();

    // reserves still recorded, nothing priced or counted
    let outcome = h.sync(Address::repeat_byte(TOKEN_PAIR), e18(1000), e18(1));
    assert_eq!(outcome, ProcessOutcome::Unchanged);
    let pair = h.indexer.store().load_pair(&Address::repeat_byte(TOKEN_PAIR)).unwrap();
    assert_eq!(pair.reserves, [e18(1000), e18(1)]);
    assert_eq!(h.token(h.token).price_usd(), dec!(1.5));
    assert_eq!(h.indexer.totals().total_value_locked().usd, before - dec!(6000));
}

#[test]
fn untracked_protocols_do_not_count() {
    let mut config = Network::Arbitrum.config();
    config.tracked_protocols = vec![ProtocolId(1)];
    let mut h = Harness::with_config(config);
    h.bootstrap(e18(2000), e18(1));

    h.create_pair(Address::repeat_byte(0x61), h.token, h.stable, 2);
    let pair = h.indexer.store().load_pair(&Address::repeat_byte(0x61)).unwrap();
    assert!(!pair.tracked);
    assert_eq!(h.sync(Address::repeat_byte(0x61), e18(1), U256::from(1_000_000u64)), ProcessOutcome::Unchanged);
    assert_eq!(h.token(h.token).price_usd(), dec!(1.5));
    assert_eq!(h.indexer.totals().pair_count(), 3);
}

#[test]
fn out_of_order_notifications_are_still_applied() {
    let mut h = Harness::new();
    h.bootstrap(e18(2000), e18(1));
    let latest = h.indexer.last_position();

    let late = Notification::new(
        LogPosition::new(1, 0),
        Timestamp::from_secs(12),
        NotificationPayload::ReserveSync(ReserveSyncEvent {
            pair: Address::repeat_byte(TOKEN_PAIR),
            reserve0: e18(1000),
            reserve1: e18(1),
        }),
    );
    assert!(matches!(h.indexer.process(&late), ProcessOutcome::Priced { .. }));
    assert_eq!(h.indexer.last_position(), latest);
    assert_eq!(h.token(h.token).price_usd(), dec!(3));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = Network::Arbitrum.config();
    config.network.native_token = Address::zero();
    let result = Indexer::new(config, MemoryStore::new(), StaticChainReader::new());
    assert!(matches!(result, Err(IndexerError::Config(ConfigError::InvalidNativeToken))));
}

#[test]
fn manipulated_junk_pairs_do_not_halt_the_indexer() {
    let mut h = Harness::new();
    h.bootstrap(e18(2000), e18(1));
    let before = h.indexer.totals().total_value_locked();

    for (junk, other, pair) in [(0x21u8, 0x22u8, 0x81u8), (0x23, 0x24, 0x83)] {
        let (junk, other) = (Address::repeat_byte(junk), Address::repeat_byte(other));
        h.indexer.chain_mut().set_token(junk, "JUNK", 18);
        h.indexer.chain_mut().set_token(other, "OTHER", 18);
        let native_pair = Address::repeat_byte(pair);
        let junk_pair = Address::repeat_byte(pair + 1);
        h.create_pair(native_pair, junk, h.native, 1);
        h.create_pair(junk_pair, junk, other, 1);

        // one wei against 1e13 wei prices the junk token at 1e13 ETH
        let outcome = h.sync(native_pair, U256::one(), U256::exp10(13));
        assert!(matches!(outcome, ProcessOutcome::Priced { .. }));
        assert_eq!(h.token(junk).price_eth(), dec!(10000000000000));

        // 5e15 junk tokens at that price is past any sane balance
        let outcome = h.sync(junk_pair, U256::exp10(18) * U256::from(5_000_000_000_000_000u64), U256::one());
        assert_eq!(outcome, ProcessOutcome::Priced { rule: PriceRule::Unpriced, source: PriceSource::ReferencePair });
        assert_eq!(h.token(junk).values().balance, NumeraireValue::ZERO);
    }

    assert_eq!(h.indexer.skipped_count(), 0);
    // only the wei-sized native pair reserves were added
    let after = h.indexer.totals().total_value_locked();
    assert!(after.eth - before.eth < dec!(0.001));
    assert!(after.usd - before.usd < dec!(1));
    h.assert_ledger_consistent();
}
