// 7.0: loans and their status machine.
// OPEN is the only live state. CLOSED and LIQUIDATED are terminal: a terminal loan still records
// the figures its updates carry, but no transaction moves it out again.
//
// 7.1 transition table
//   OPEN + borrow                      -> OPEN, stamps open block/time
//   OPEN + repay, liquidity == 0       -> CLOSED, stamps close block/time
//   OPEN + repay, liquidity > 0        -> OPEN
//   OPEN + liquidation                 -> LIQUIDATED, stamps close block/time
//   OPEN + anything else               -> OPEN
//   CLOSED | LIQUIDATED + anything     -> unchanged

use crate::token::NumeraireValue;
use crate::types::{Address, BlockNumber, LoanId, Sided, Timestamp, U256};
use crate::valuation::PricingContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    Open,
    Closed,
    Liquidated,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Closed | LoanStatus::Liquidated)
    }

    /// Next status after a transaction of `kind` leaves the loan with `liquidity`.
    pub fn next(self, kind: TxKind, liquidity: U256) -> LoanStatus {
        match (self, kind) {
            (LoanStatus::Open, TxKind::Repay) if liquidity.is_zero() => LoanStatus::Closed,
            (LoanStatus::Open, TxKind::Liquidation) => LoanStatus::Liquidated,
            (LoanStatus::Open, _) => LoanStatus::Open,
            (terminal, _) => terminal,
        }
    }
}

/// Transaction type codes emitted by pool loan updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    DepositLiquidity,
    WithdrawLiquidity,
    DepositReserves,
    WithdrawReserves,
    IncreaseCollateral,
    DecreaseCollateral,
    RebalanceCollateral,
    BorrowLiquidity,
    RepayLiquidity,
    RepayLiquiditySetRatio,
    RepayLiquidityWithLp,
    Liquidate,
    LiquidateWithLp,
    BatchLiquidation,
    Sync,
    ExternalRebalance,
    ExternalLiquidation,
    UpdatePool,
    Unknown(u8),
}

impl TxType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => TxType::DepositLiquidity,
            1 => TxType::WithdrawLiquidity,
            2 => TxType::DepositReserves,
            3 => TxType::WithdrawReserves,
            4 => TxType::IncreaseCollateral,
            5 => TxType::DecreaseCollateral,
            6 => TxType::RebalanceCollateral,
            7 => TxType::BorrowLiquidity,
            8 => TxType::RepayLiquidity,
            9 => TxType::RepayLiquiditySetRatio,
            10 => TxType::RepayLiquidityWithLp,
            11 => TxType::Liquidate,
            12 => TxType::LiquidateWithLp,
            13 => TxType::BatchLiquidation,
            14 => TxType::Sync,
            15 => TxType::ExternalRebalance,
            16 => TxType::ExternalLiquidation,
            17 => TxType::UpdatePool,
            other => TxType::Unknown(other),
        }
    }

    pub fn kind(&self) -> TxKind {
        match self {
            TxType::BorrowLiquidity => TxKind::Borrow,
            TxType::RepayLiquidity | TxType::RepayLiquiditySetRatio | TxType::RepayLiquidityWithLp => {
                TxKind::Repay
            }
            TxType::Liquidate
            | TxType::LiquidateWithLp
            | TxType::BatchLiquidation
            | TxType::ExternalLiquidation => TxKind::Liquidation,
            _ => TxKind::Other,
        }
    }
}

/// Which branch of the status machine a transaction drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    Borrow,
    Repay,
    Liquidation,
    Other,
}

/// Block coordinates stamped onto a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStamp {
    pub block: BlockNumber,
    pub timestamp: Timestamp,
}

/// Figures carried by a loan update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoanFigures {
    pub tokens_held: Sided<U256>,
    pub liquidity: U256,
    pub initial_liquidity: U256,
    pub lp_tokens: U256,
    /// Raw 18-decimal borrow rate index.
    pub rate_index: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationDetails {
    pub collateral: U256,
    pub liquidity: U256,
    pub write_down: U256,
    pub stamp: BlockStamp,
}

/// What a status transition means for the active-loan counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusChange {
    Unchanged,
    Closed,
    Liquidated,
}

impl StatusChange {
    pub fn terminates(&self) -> bool {
        !matches!(self, StatusChange::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub pool: Address,
    pub owner: Address,
    pub status: LoanStatus,
    pub figures: LoanFigures,
    pub rate_index: Decimal,
    pub last_tx: Option<TxType>,
    pub created: BlockStamp,
    pub opened: Option<BlockStamp>,
    pub closed: Option<BlockStamp>,
    pub liquidation: Option<LiquidationDetails>,
    pub collateral_value: NumeraireValue,
    pub liquidity_value: NumeraireValue,
    pub initial_liquidity_value: NumeraireValue,
}

impl Loan {
    pub fn new(id: LoanId, pool: Address, owner: Address, created: BlockStamp) -> Self {
        Self {
            id,
            pool,
            owner,
            status: LoanStatus::Open,
            figures: LoanFigures::default(),
            rate_index: Decimal::ZERO,
            last_tx: None,
            created,
            opened: None,
            closed: None,
            liquidation: None,
            collateral_value: NumeraireValue::ZERO,
            liquidity_value: NumeraireValue::ZERO,
            initial_liquidity_value: NumeraireValue::ZERO,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == LoanStatus::Open
    }

    pub fn set_figures(&mut self, figures: LoanFigures, rate_index: Decimal) {
        self.figures = figures;
        self.rate_index = rate_index;
    }

    /// Drives the status machine with a transaction applied at `stamp`.
    pub fn apply_tx(&mut self, tx: TxType, stamp: BlockStamp) -> StatusChange {
        self.last_tx = Some(tx);
        if self.status.is_terminal() {
            return StatusChange::Unchanged;
        }

        let kind = tx.kind();
        if kind == TxKind::Borrow {
            self.opened = Some(stamp);
        }

        let next = self.status.next(kind, self.figures.liquidity);
        if next == self.status {
            return StatusChange::Unchanged;
        }
        self.status = next;
        self.closed = Some(stamp);
        match next {
            LoanStatus::Closed => StatusChange::Closed,
            LoanStatus::Liquidated => StatusChange::Liquidated,
            LoanStatus::Open => StatusChange::Unchanged,
        }
    }

    pub fn record_liquidation(&mut self, details: LiquidationDetails) {
        self.liquidation = Some(details);
    }

    /// Recomputes every cached valuation from the loan's figures.
    pub fn revalue(&mut self, ctx: &PricingContext) {
        self.collateral_value = ctx.value_amounts(self.figures.tokens_held);
        self.liquidity_value = ctx.value_invariant(self.figures.liquidity).value;
        self.initial_liquidity_value = ctx.value_invariant(self.figures.initial_liquidity).value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(block: u64) -> BlockStamp {
        BlockStamp {
            block: BlockNumber(block),
            timestamp: Timestamp::from_secs(block as i64 * 12),
        }
    }

    fn open_loan() -> Loan {
        Loan::new(LoanId::from_u64(1), Address::repeat_byte(1), Address::repeat_byte(2), stamp(1))
    }

    #[test]
    fn borrow_with_zero_liquidity_stays_open() {
        let mut loan = open_loan();
        let change = loan.apply_tx(TxType::BorrowLiquidity, stamp(2));
        assert_eq!(change, StatusChange::Unchanged);
        assert_eq!(loan.status, LoanStatus::Open);
        assert_eq!(loan.opened, Some(stamp(2)));
    }

    #[test]
    fn partial_repay_holds_open() {
        let mut loan = open_loan();
        loan.figures.liquidity = U256::from(10u8);
        assert_eq!(loan.apply_tx(TxType::RepayLiquidity, stamp(2)), StatusChange::Unchanged);
        assert!(loan.is_open());
    }

    #[test]
    fn full_repay_closes() {
        let mut loan = open_loan();
        assert_eq!(loan.apply_tx(TxType::RepayLiquidityWithLp, stamp(3)), StatusChange::Closed);
        assert_eq!(loan.status, LoanStatus::Closed);
        assert_eq!(loan.closed, Some(stamp(3)));
    }

    #[test]
    fn liquidation_is_unconditional_and_terminal() {
        let mut loan = open_loan();
        loan.figures.liquidity = U256::from(10u8);
        assert_eq!(loan.apply_tx(TxType::Liquidate, stamp(4)), StatusChange::Liquidated);

        // no exit from a terminal state
        assert_eq!(loan.apply_tx(TxType::BorrowLiquidity, stamp(5)), StatusChange::Unchanged);
        assert_eq!(loan.apply_tx(TxType::RepayLiquidity, stamp(6)), StatusChange::Unchanged);
        assert_eq!(loan.status, LoanStatus::Liquidated);
        assert_eq!(loan.closed, Some(stamp(4)));
        assert_eq!(loan.opened, None);
    }

    #[test]
    fn unknown_codes_hold_status() {
        let tx = TxType::from_code(200);
        assert_eq!(tx, TxType::Unknown(200));
        assert_eq!(tx.kind(), TxKind::Other);
        assert_eq!(LoanStatus::Open.next(tx.kind(), U256::zero()), LoanStatus::Open);
    }

    #[test]
    fn code_mapping() {
        assert_eq!(TxType::from_code(7).kind(), TxKind::Borrow);
        assert_eq!(TxType::from_code(9).kind(), TxKind::Repay);
        assert_eq!(TxType::from_code(16).kind(), TxKind::Liquidation);
        assert_eq!(TxType::from_code(4).kind(), TxKind::Other);
    }
}
