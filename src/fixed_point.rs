// 2.0: fixed-point arithmetic shared by every valuation path.
// every division and product that produces a stored value truncates (never rounds) to a fixed
// digit count. both run on the exact integer mantissas, so no intermediate rounding happens past
// 28 significant digits and the same inputs produce bit-identical outputs on every path.
// zero divisors and overflow degrade to zero instead of failing.

use crate::types::U256;
use ethers::types::U512;
use rust_decimal::prelude::MathematicalOps;
use rust_decimal::{Decimal, RoundingStrategy};

/// Digits kept for native-asset (ETH) prices and values.
pub const ETH_DIGITS: u32 = 18;
/// Digits kept for USD prices, including the reference native/USD rate.
pub const USD_PRICE_DIGITS: u32 = 6;
/// Digits kept for USD balances and position values.
pub const USD_VALUE_DIGITS: u32 = 2;

// rust_decimal carries at most 28 fractional digits in a 96-bit mantissa
const MAX_SCALE: u32 = 28;
const MANTISSA_BITS: usize = 96;

/// Drops every digit past `digits`, toward zero.
pub fn truncate(value: Decimal, digits: u32) -> Decimal {
    value.round_dp_with_strategy(digits.min(MAX_SCALE), RoundingStrategy::ToZero)
}

/// `numerator / denominator` truncated to `digits`. Zero denominator yields zero.
pub fn div_trunc(numerator: Decimal, denominator: Decimal, digits: u32) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    let digits = digits.min(MAX_SCALE);
    let (num, num_scale, num_negative) = parts(numerator);
    let (den, den_scale, den_negative) = parts(denominator);

    // quotient * 10^digits = num * 10^(digits + den_scale - num_scale) / den
    let shift = i64::from(digits) + i64::from(den_scale) - i64::from(num_scale);
    let quotient = if shift >= 0 {
        U512::from(num) * U512::exp10(shift as usize) / U512::from(den)
    } else {
        U512::from(num) / (U512::from(den) * U512::exp10((-shift) as usize))
    };
    U256::try_from(quotient)
        .ok()
        .and_then(|q| from_parts(q, digits, num_negative != den_negative))
        .unwrap_or(Decimal::ZERO)
}

/// `a * b` truncated to `digits`. Overflow yields zero.
pub fn mul_trunc(a: Decimal, b: Decimal, digits: u32) -> Decimal {
    let digits = digits.min(MAX_SCALE);
    let (ma, sa, na) = parts(a);
    let (mb, sb, nb) = parts(b);

    // both mantissas fit 96 bits, so the full product fits 192
    let product = ma * mb;
    let scale = sa + sb;
    let (mantissa, scale) = if scale > digits {
        (product / U256::exp10((scale - digits) as usize), digits)
    } else {
        (product, scale)
    };
    from_parts(mantissa, scale, na != nb).unwrap_or(Decimal::ZERO)
}

// exact integer form of a decimal: |mantissa|, scale, sign
fn parts(value: Decimal) -> (U256, u32, bool) {
    (
        U256::from(value.mantissa().unsigned_abs()),
        value.scale(),
        value.is_sign_negative(),
    )
}

fn from_parts(mantissa: U256, scale: u32, negative: bool) -> Option<Decimal> {
    let magnitude = try_to_decimal(mantissa, scale)?;
    Some(if negative && !magnitude.is_zero() { -magnitude } else { magnitude })
}

/// Square root, zero for negative input.
pub fn sqrt(value: Decimal) -> Decimal {
    value.sqrt().unwrap_or(Decimal::ZERO)
}

/// 10^exp, `None` past the decimal range.
pub fn pow10(exp: u32) -> Option<Decimal> {
    (0..exp).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(Decimal::TEN))
}

/// Scales a raw on-chain integer down by `decimals`.
///
/// Exact when the raw amount fits a 96-bit mantissa. Larger amounts lose their
/// lowest digits by truncation; amounts whose integer part exceeds the decimal
/// range yield `None`.
pub fn try_to_decimal(raw: U256, decimals: u32) -> Option<Decimal> {
    let ten = U256::from(10u8);
    let mut mantissa = raw;
    let mut scale = i64::from(decimals);

    while mantissa.bits() > MANTISSA_BITS || scale > i64::from(MAX_SCALE) {
        mantissa /= ten;
        scale -= 1;
    }

    // fits: bits() <= 96
    let m = mantissa.as_u128() as i128;
    if scale >= 0 {
        Decimal::try_from_i128_with_scale(m, scale as u32).ok()
    } else {
        Decimal::from_i128_with_scale(m, 0).checked_mul(pow10((-scale) as u32)?)
    }
}

/// [`try_to_decimal`] with out-of-range amounts mapped to zero.
pub fn to_decimal(raw: U256, decimals: u32) -> Decimal {
    try_to_decimal(raw, decimals).unwrap_or(Decimal::ZERO)
}

/// `a * b / denom` on raw integers with a 512-bit intermediate, floored.
/// Zero denominator or a quotient past 256 bits yields zero.
pub fn mul_div(a: U256, b: U256, denom: U256) -> U256 {
    if denom.is_zero() || a.is_zero() || b.is_zero() {
        return U256::zero();
    }
    let quotient = a.full_mul(b) / U512::from(denom);
    U256::try_from(quotient).unwrap_or_default()
}

/// Constant-product invariant `sqrt(r0 * r1)`, floored.
pub fn invariant_of(reserve0: U256, reserve1: U256) -> U256 {
    let root = reserve0.full_mul(reserve1).integer_sqrt();
    U256::try_from(root).unwrap_or_default()
}

/// `current - removed + added` on raw balances, floored at zero.
pub fn rebalance(current: U256, removed: U256, added: U256) -> U256 {
    current.saturating_sub(removed).saturating_add(added)
}
