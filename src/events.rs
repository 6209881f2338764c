// 11.0: notifications the core consumes. each one carries its position in the chain's total
// order (block, log index) and the block timestamp. decoding raw logs into these shapes is the
// ingestion layer's job.

use crate::types::{Address, LogPosition, LoanId, ProtocolId, Sided, Timestamp, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub position: LogPosition,
    pub timestamp: Timestamp,
    pub payload: NotificationPayload,
}

impl Notification {
    pub fn new(position: LogPosition, timestamp: Timestamp, payload: NotificationPayload) -> Self {
        Self {
            position,
            timestamp,
            payload,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.payload {
            NotificationPayload::PairCreated(_) => "pair_created",
            NotificationPayload::ReserveSync(_) => "reserve_sync",
            NotificationPayload::PairUntracked(_) => "pair_untracked",
            NotificationPayload::PoolCreated(_) => "pool_created",
            NotificationPayload::PoolUpdated(_) => "pool_updated",
            NotificationPayload::LoanCreated(_) => "loan_created",
            NotificationPayload::LoanUpdated(_) => "loan_updated",
            NotificationPayload::Liquidation(_) => "liquidation",
            NotificationPayload::ShareTransfer(_) => "share_transfer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationPayload {
    // Pair events
    PairCreated(PairCreatedEvent),
    ReserveSync(ReserveSyncEvent),
    PairUntracked(PairUntrackedEvent),

    // Pool events
    PoolCreated(PoolCreatedEvent),
    PoolUpdated(PoolUpdatedEvent),

    // Loan events
    LoanCreated(LoanCreatedEvent),
    LoanUpdated(LoanUpdatedEvent),
    Liquidation(LiquidationEvent),

    // Share events
    ShareTransfer(ShareTransferEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCreatedEvent {
    pub pair: Address,
    pub token0: Address,
    pub token1: Address,
    pub protocol: ProtocolId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSyncEvent {
    pub pair: Address,
    pub reserve0: U256,
    pub reserve1: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairUntrackedEvent {
    pub pair: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCreatedEvent {
    pub pool: Address,
    pub pair: Address,
    pub protocol: ProtocolId,
    pub tokens: Sided<Address>,
}

// the pool's metrics are read from the chain when this arrives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolUpdatedEvent {
    pub pool: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCreatedEvent {
    pub pool: Address,
    pub loan: LoanId,
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanUpdatedEvent {
    pub pool: Address,
    pub loan: LoanId,
    /// Raw transaction type code.
    pub tx_type: u8,
    pub tokens_held: Sided<U256>,
    pub liquidity: U256,
    pub initial_liquidity: U256,
    pub lp_tokens: U256,
    pub rate_index: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub pool: Address,
    pub loan: LoanId,
    pub collateral: U256,
    pub liquidity: U256,
    pub write_down: U256,
    /// Raw transaction type code of the liquidation flavor.
    pub tx_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTransferEvent {
    pub pool: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}
