//! Lending index core simulation.
//!
//! Feeds hand-built notification streams through the indexer: price bootstrap from the
//! reference pair, a pool and loan lifecycle, the reserve-sync-before-pool-update inversion,
//! and notifications that get skipped.

use lending_index_core::*;
use std::error::Error;
use tracing::Level;

const NETWORK_VAR: &str = "INDEXER_NETWORK";
const CONFIG_VAR: &str = "INDEXER_CONFIG";

fn main() -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    println!("Lending Index Core Simulation");
    println!("Network: {:?}\n", config.network.network);

    scenario_1_price_bootstrap(&config)?;
    scenario_2_pool_and_loan_lifecycle(&config)?;
    scenario_3_sync_before_pool_update(&config)?;
    scenario_4_skipped_notifications(&config)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn load_config() -> Result<IndexerConfig, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_VAR) {
        let json = std::fs::read_to_string(&path).map_err(|e| ConfigError::Parse(format!("{path}: {e}")))?;
        return IndexerConfig::from_json(&json);
    }
    let network: Network = match std::env::var(NETWORK_VAR) {
        Ok(name) => name.parse()?,
        Err(_) => Network::Arbitrum,
    };
    Ok(network.config())
}

fn e18(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

/// Drives an indexer over an in-memory store, stamping each notification with the next log
/// position.
struct Simulation {
    indexer: Indexer<MemoryStore, StaticChainReader>,
    block: u64,
    log_index: u32,
    native: Address,
    stable: Address,
    token: Address,
    reference_pair: Address,
    token_pair: Address,
}

impl Simulation {
    fn new(base: &IndexerConfig) -> Result<Self, IndexerError> {
        let mut config = base.clone();
        let reference_pair = Address::repeat_byte(0x50);
        config.network.reference_pair = Some(reference_pair);

        let native = config.network.native_token;
        let stable = config.network.stable_tokens.first().copied().ok_or(IndexerError::Config(
            ConfigError::Parse("network has no stable token".to_string()),
        ))?;
        let token = Address::repeat_byte(0x11);

        let mut chain = StaticChainReader::new();
        chain.set_token(native, "WETH", 18);
        chain.set_token(stable, "USDC", 6);
        chain.set_token(token, "TKN", 18);

        Ok(Self {
            indexer: Indexer::new(config, MemoryStore::new(), chain)?,
            block: 100,
            log_index: 0,
            native,
            stable,
            token,
            reference_pair,
            token_pair: Address::repeat_byte(0x60),
        })
    }

    fn send(&mut self, payload: NotificationPayload) -> ProcessOutcome {
        let position = LogPosition::new(self.block, self.log_index);
        self.log_index += 1;
        let timestamp = Timestamp::from_secs(1_700_000_000 + self.block as i64 * 12);
        self.indexer.process(&Notification::new(position, timestamp, payload))
    }

    fn next_block(&mut self) {
        self.block += 1;
        self.log_index = 0;
    }

    fn sorted(a: Address, b: Address) -> (Address, Address) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn create_pair(&mut self, pair: Address, a: Address, b: Address) -> ProcessOutcome {
        let (token0, token1) = Self::sorted(a, b);
        self.send(NotificationPayload::PairCreated(PairCreatedEvent {
            pair,
            token0,
            token1,
            protocol: ProtocolId(1),
        }))
    }

    // reserves given per token, mapped onto the pair's sides
    fn sync(&mut self, pair: Address, a: (Address, U256), b: (Address, U256)) -> ProcessOutcome {
        let (reserve0, reserve1) = if a.0 < b.0 { (a.1, b.1) } else { (b.1, a.1) };
        self.send(NotificationPayload::ReserveSync(ReserveSyncEvent {
            pair,
            reserve0,
            reserve1,
        }))
    }

    fn bootstrap(&mut self) {
        self.create_pair(self.reference_pair, self.native, self.stable);
        self.create_pair(self.token_pair, self.token, self.native);
        self.next_block();
        // 1000 WETH against 3,000,000 USDC
        self.sync(
            self.reference_pair,
            (self.native, e18(1000)),
            (self.stable, U256::from(3_000_000_000_000u64)),
        );
        // 2000 TKN against 1 WETH
        self.sync(self.token_pair, (self.token, e18(2000)), (self.native, e18(1)));
    }

    fn load_token(&self, id: Address) -> Option<Token> {
        self.indexer.store().load_token(&id)
    }
}

fn print_token(token: &Token) {
    println!(
        "  {}: {} ETH, ${}, balance {} ETH / ${}",
        token.symbol,
        token.price_eth(),
        token.price_usd(),
        token.values().balance.eth,
        token.values().balance.usd
    );
}

fn print_totals(totals: &AggregateTotals) {
    println!(
        "  Totals: TVL {} ETH / ${}, borrowed ${}, pairs {}, pools {}, loans {} ({} active)",
        totals.total_value_locked().eth,
        totals.total_value_locked().usd,
        totals.borrowed_value().usd,
        totals.pair_count(),
        totals.pool_count(),
        totals.loan_count(),
        totals.active_loan_count()
    );
}

/// Reference pair prices the native token, which prices everything paired with it.
fn scenario_1_price_bootstrap(config: &IndexerConfig) -> Result<(), Box<dyn Error>> {
    println!("Scenario 1: Price Bootstrap\n");

    let mut sim = Simulation::new(config)?;
    sim.bootstrap();

    let quote = sim.indexer.eth_usd();
    println!("  Reference rate: ${} per ETH ({:?})", quote.eth_usd, quote.source);
    for id in [sim.native, sim.stable, sim.token] {
        if let Some(token) = sim.load_token(id) {
            print_token(&token);
        }
    }
    print_totals(&sim.indexer.totals());
    println!();
    Ok(())
}

fn pool_snapshot(reserves: Sided<U256>, borrowed_invariant: U256, balances: Sided<U256>) -> PoolSnapshot {
    let cfmm_invariant = lending_index_core::fixed_point::invariant_of(reserves[0], reserves[1]);
    PoolSnapshot {
        token_balances: balances,
        lp_tokens_held: cfmm_invariant / U256::from(2u8),
        lp_tokens_borrowed: borrowed_invariant,
        lp_tokens_borrowed_plus_interest: borrowed_invariant,
        lp_invariant: cfmm_invariant / U256::from(2u8),
        borrowed_invariant,
        cfmm_reserves: reserves,
        cfmm_invariant,
        cfmm_total_supply: cfmm_invariant,
        total_supply: cfmm_invariant,
        utilization_rate: U256::exp10(17),
        ..PoolSnapshot::default()
    }
}

/// Pool creation, a metric update, then one loan repaid in full and one liquidated.
fn scenario_2_pool_and_loan_lifecycle(config: &IndexerConfig) -> Result<(), Box<dyn Error>> {
    println!("Scenario 2: Pool and Loan Lifecycle\n");

    let mut sim = Simulation::new(config)?;
    sim.bootstrap();
    let pool = Address::repeat_byte(0x70);
    let (token0, token1) = Simulation::sorted(sim.token, sim.native);

    sim.next_block();
    sim.send(NotificationPayload::PoolCreated(PoolCreatedEvent {
        pool,
        pair: sim.token_pair,
        protocol: ProtocolId(1),
        tokens: [token0, token1],
    }));
    let reserves = [e18(2000), e18(1)];
    let borrowed = lending_index_core::fixed_point::invariant_of(reserves[0], reserves[1]) / U256::from(10u8);
    sim.indexer
        .chain_mut()
        .set_pool_snapshot(pool, pool_snapshot(reserves, borrowed, [e18(100), e18(1) / U256::from(20u8)]));
    sim.send(NotificationPayload::PoolUpdated(PoolUpdatedEvent { pool }));

    if let Some(p) = sim.indexer.store().load_pool(&pool) {
        println!(
            "  Pool supplied ${}, borrowed ${}, value locked ${}",
            p.valuation.supplied.usd, p.valuation.borrowed.usd, p.valuation.value_locked.usd
        );
    }

    let owner = Address::repeat_byte(0xa1);
    for id in [1u64, 2] {
        sim.send(NotificationPayload::LoanCreated(LoanCreatedEvent {
            pool,
            loan: LoanId::from_u64(id),
            owner,
        }));
    }

    let update = |loan: u64, tx_type: u8, liquidity: U256| {
        NotificationPayload::LoanUpdated(LoanUpdatedEvent {
            pool,
            loan: LoanId::from_u64(loan),
            tx_type,
            tokens_held: [e18(50), e18(1) / U256::from(40u8)],
            liquidity,
            initial_liquidity: e18(5),
            lp_tokens: e18(5),
            rate_index: U256::exp10(18),
        })
    };

    sim.next_block();
    let steps = [
        ("loan 1 borrows", update(1, 7, e18(5))),
        ("loan 1 repays half", update(1, 8, e18(2))),
        ("loan 1 repays the rest", update(1, 8, U256::zero())),
        ("loan 2 borrows", update(2, 7, e18(5))),
    ];
    for (label, payload) in steps {
        let outcome = sim.send(payload);
        println!("  {label}: {outcome:?}");
    }

    sim.next_block();
    let outcome = sim.send(NotificationPayload::Liquidation(LiquidationEvent {
        pool,
        loan: LoanId::from_u64(2),
        collateral: e18(50),
        liquidity: e18(5),
        write_down: U256::zero(),
        tx_type: 11,
    }));
    println!("  loan 2 liquidated: {outcome:?}");

    if let Some(loan) = sim.indexer.store().load_loan(&LoanId::from_u64(1)) {
        println!("  Loan 1 status {:?}, closed at {:?}", loan.status, loan.closed.map(|s| s.block));
    }
    print_totals(&sim.indexer.totals());
    println!();
    Ok(())
}

/// A reserve sync can land before the pool update of the same block. The token borrowed
/// balances lag until the pool update arrives.
fn scenario_3_sync_before_pool_update(config: &IndexerConfig) -> Result<(), Box<dyn Error>> {
    println!("Scenario 3: Sync Before Pool Update\n");

    let mut sim = Simulation::new(config)?;
    sim.bootstrap();
    let pool = Address::repeat_byte(0x70);
    let (token0, token1) = Simulation::sorted(sim.token, sim.native);
    sim.send(NotificationPayload::PoolCreated(PoolCreatedEvent {
        pool,
        pair: sim.token_pair,
        protocol: ProtocolId(1),
        tokens: [token0, token1],
    }));

    let reserves = [e18(2000), e18(1)];
    let borrowed = lending_index_core::fixed_point::invariant_of(reserves[0], reserves[1]) / U256::from(4u8);
    sim.indexer
        .chain_mut()
        .set_pool_snapshot(pool, pool_snapshot(reserves, borrowed, [U256::zero(); 2]));
    sim.send(NotificationPayload::PoolUpdated(PoolUpdatedEvent { pool }));
    let before = sim.load_token(sim.token).map(|t| t.raw().borrowed).unwrap_or_default();

    // price doubles: half the TKN for the same WETH
    sim.next_block();
    sim.sync(sim.token_pair, (sim.token, e18(1000)), (sim.native, e18(1)));
    let stale = sim.load_token(sim.token).map(|t| t.raw().borrowed).unwrap_or_default();

    let reserves = [e18(1000), e18(1)];
    sim.indexer
        .chain_mut()
        .set_pool_snapshot(pool, pool_snapshot(reserves, borrowed, [U256::zero(); 2]));
    sim.send(NotificationPayload::PoolUpdated(PoolUpdatedEvent { pool }));
    let healed = sim.load_token(sim.token).map(|t| t.raw().borrowed).unwrap_or_default();

    println!("  TKN borrowed raw before sync: {before}");
    println!("  after sync, before update:    {stale} (stale)");
    println!("  after pool update:            {healed}");
    print_totals(&sim.indexer.totals());
    println!();
    Ok(())
}

/// Notifications referencing unknown entities or failing chain reads change nothing.
fn scenario_4_skipped_notifications(config: &IndexerConfig) -> Result<(), Box<dyn Error>> {
    println!("Scenario 4: Skipped Notifications\n");

    let mut sim = Simulation::new(config)?;
    sim.bootstrap();
    let before = sim.indexer.totals();

    let outcomes = [
        sim.send(NotificationPayload::LoanUpdated(LoanUpdatedEvent {
            pool: Address::repeat_byte(0x71),
            loan: LoanId::from_u64(99),
            tx_type: 7,
            tokens_held: [U256::zero(); 2],
            liquidity: U256::zero(),
            initial_liquidity: U256::zero(),
            lp_tokens: U256::zero(),
            rate_index: U256::zero(),
        })),
        sim.send(NotificationPayload::ReserveSync(ReserveSyncEvent {
            pair: Address::repeat_byte(0x61),
            reserve0: e18(1),
            reserve1: e18(1),
        })),
        sim.send(NotificationPayload::PoolCreated(PoolCreatedEvent {
            pool: Address::repeat_byte(0x72),
            pair: sim.token_pair,
            protocol: ProtocolId(1),
            tokens: [sim.token, sim.native],
        })),
        // no snapshot registered: the read reverts
        sim.send(NotificationPayload::PoolUpdated(PoolUpdatedEvent {
            pool: Address::repeat_byte(0x72),
        })),
    ];
    for outcome in outcomes {
        println!("  {outcome:?}");
    }

    let after = sim.indexer.totals();
    println!(
        "  TVL unchanged: {}, skipped {} of {}",
        before.total_value_locked() == after.total_value_locked(),
        sim.indexer.skipped_count(),
        sim.indexer.processed_count() + sim.indexer.skipped_count()
    );
    Ok(())
}
