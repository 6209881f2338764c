// 12.1 engine/core.rs: the indexer. owns the config and its two collaborators, the entity
// store and the chain reader. all entity state lives in the store.

use super::results::{IndexerError, ProcessOutcome};
use crate::chain::ChainReader;
use crate::config::IndexerConfig;
use crate::events::{Notification, NotificationPayload};
use crate::loan::BlockStamp;
use crate::pair::TradingPair;
use crate::resolver::{resolve_eth_usd, ReferenceQuote};
use crate::store::Store;
use crate::token::Token;
use crate::totals::AggregateTotals;
use crate::types::{Address, LogPosition};

/** 12.1.1: main indexer struct */
#[derive(Debug)]
pub struct Indexer<S: Store, C: ChainReader> {
    pub(super) config: IndexerConfig,
    pub(super) store: S,
    pub(super) chain: C,
    pub(super) last_position: Option<LogPosition>,
    pub(super) processed: u64,
    pub(super) skipped: u64,
}

impl<S: Store, C: ChainReader> Indexer<S, C> {
    pub fn new(config: IndexerConfig, store: S, chain: C) -> Result<Self, IndexerError> {
        config.validate()?;
        if config.network.reference_pair.is_none() {
            tracing::warn!(
                network = ?config.network.network,
                fallback = ?config.network.fallback_pool,
                "no reference pair configured, native/USD rate comes from the fallback pool only"
            );
        }
        Ok(Self {
            config,
            store,
            chain,
            last_position: None,
            processed: 0,
            skipped: 0,
        })
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut C {
        &mut self.chain
    }

    pub fn last_position(&self) -> Option<LogPosition> {
        self.last_position
    }

    pub fn processed_count(&self) -> u64 {
        self.processed
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }

    /// Current protocol-wide totals. Empty until the first notification touches them.
    pub fn totals(&self) -> AggregateTotals {
        self.load_totals()
    }

    /// Current native/USD reference rate.
    pub fn eth_usd(&self) -> ReferenceQuote {
        resolve_eth_usd(&self.config.network, &self.store, &self.chain)
    }

    /// Stream entry point. A notification that cannot be applied is logged and skipped; the
    /// store is left exactly as it was.
    pub fn process(&mut self, notification: &Notification) -> ProcessOutcome {
        match self.apply(notification) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(
                    position = %notification.position,
                    kind = notification.kind(),
                    error = %e,
                    "notification skipped"
                );
                ProcessOutcome::Skipped
            }
        }
    }

    /// Applies one notification, surfacing why it could not be applied.
    pub fn apply(&mut self, notification: &Notification) -> Result<ProcessOutcome, IndexerError> {
        self.observe_position(notification.position);
        if self.config.verbose {
            tracing::debug!(position = %notification.position, payload = ?notification.payload, "notification");
        }

        let stamp = BlockStamp {
            block: notification.position.block,
            timestamp: notification.timestamp,
        };

        let outcome = match &notification.payload {
            NotificationPayload::PairCreated(ev) => self.on_pair_created(ev, stamp)?,
            NotificationPayload::ReserveSync(ev) => self.on_reserve_sync(ev)?,
            NotificationPayload::PairUntracked(ev) => self.on_pair_untracked(ev)?,
            NotificationPayload::PoolCreated(ev) => self.on_pool_created(ev, stamp)?,
            NotificationPayload::PoolUpdated(ev) => self.on_pool_updated(ev, stamp)?,
            NotificationPayload::LoanCreated(ev) => self.on_loan_created(ev, stamp)?,
            NotificationPayload::LoanUpdated(ev) => self.on_loan_updated(ev, stamp)?,
            NotificationPayload::Liquidation(ev) => self.on_liquidation(ev, stamp)?,
            NotificationPayload::ShareTransfer(ev) => self.on_share_transfer(ev, stamp)?,
        };
        self.processed += 1;
        Ok(outcome)
    }

    // delivery is expected in chain order. a regression is still processed
    fn observe_position(&mut self, position: LogPosition) {
        if let Some(last) = self.last_position {
            if position <= last {
                tracing::warn!(%position, %last, "notification delivered out of order");
                return;
            }
        }
        self.last_position = Some(position);
    }

    pub(super) fn load_totals(&self) -> AggregateTotals {
        self.store.load_totals().unwrap_or_default()
    }

    pub(super) fn load_token(&self, id: Address) -> Result<Token, IndexerError> {
        self.store.load_token(&id).ok_or(IndexerError::TokenNotFound(id))
    }

    pub(super) fn load_pair(&self, id: Address) -> Result<TradingPair, IndexerError> {
        self.store.load_pair(&id).ok_or(IndexerError::PairNotFound(id))
    }

    pub(super) fn load_pair_tokens(&self, pair: &TradingPair) -> Result<(Token, Token), IndexerError> {
        Ok((self.load_token(pair.token0)?, self.load_token(pair.token1)?))
    }

    /// Stored token, or a new one built from its chain metadata.
    pub(super) fn resolve_token(&self, id: Address) -> Result<Token, IndexerError> {
        if let Some(token) = self.store.load_token(&id) {
            return Ok(token);
        }
        let meta = self.chain.token_metadata(id)?;
        Ok(Token::new(id, meta.symbol, meta.name, meta.decimals))
    }
}
