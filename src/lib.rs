// lending-index-core: valuation layer for an AMM + lending protocol indexer.
// consumes chain notifications in order and keeps token prices, pool and loan valuations and
// protocol-wide totals consistent. all computation is deterministic; the only I/O goes through
// the Store and ChainReader collaborators.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: LoanId, ProtocolId, BlockNumber, Timestamp, LogPosition
//   2.x  fixed_point.rs: truncating decimal math, raw integer scaling
//   3.x  token.rs: token entity, custody partitions, contributions
//   3.1  pair.rs: trading pair entity, pair price
//   3.2  pool.rs: lending pool entity, snapshot application, revaluation
//   3.3  loan.rs: loan entity + status machine
//   3.4  balance.rs: per-account pool share balances
//   4.x  resolver.rs: native/USD reference price
//   5.x  cascade.rs: token price propagation rules
//   6.x  valuation.rs: invariant-based position valuation
//   7.x  totals.rs: aggregate totals ledger
//   8.x  config.rs: network presets, indexer settings
//   9.x  store.rs: entity load/save
//   10.x chain.rs: read-only contract calls
//   11.x events.rs: notification shapes
//   12.x engine/: indexer: pairs, pools, loans, transfers

// entities
pub mod balance;
pub mod loan;
pub mod pair;
pub mod pool;
pub mod token;
pub mod types;

// pricing and valuation
pub mod cascade;
pub mod fixed_point;
pub mod resolver;
pub mod totals;
pub mod valuation;

// integration
pub mod chain;
pub mod config;
pub mod engine;
pub mod events;
pub mod store;

// re exports for convenience
pub use balance::{AccountBalance, AccountBalanceId};
pub use cascade::{propagate, PriceRule, TokenRole};
pub use chain::{ChainError, ChainReader, PoolSnapshot, ReservesSnapshot, StaticChainReader, Strategies, TokenMetadata};
pub use config::{ConfigError, IndexerConfig, Network, NetworkConfig};
pub use engine::*;
pub use events::*;
pub use loan::{BlockStamp, LiquidationDetails, Loan, LoanFigures, LoanStatus, StatusChange, TxKind, TxType};
pub use pair::TradingPair;
pub use pool::{LendingPool, PoolHoldings, PoolRates, PoolValuation};
pub use resolver::{resolve_eth_usd, PriceSource, ReferenceQuote};
pub use store::{MemoryStore, Store};
pub use token::{Contribution, NumeraireValue, RawBalances, Token};
pub use totals::AggregateTotals;
pub use types::*;
pub use valuation::{InvariantValue, PricingContext};
