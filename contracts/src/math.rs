//! Integer arithmetic shared by the ledger, pool and pricing modules.
//!
//! All divisions floor. Dividend dust and pool rounding depend on it, so
//! callers must not reorder the multiplications and divisions here.
//! Overflow is an error, never a silent zero: a zero price would make
//! every loan liquidable.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::ProtocolError;

/// Fixed-point scale for pool prices and TWAP averages (1e18)
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u64 = 10_000;

/// Pool swap fee in basis points (0.25%)
pub const SWAP_FEE_BPS: u64 = 25;

/// Decimals every price is normalised to
pub const PRICE_DECIMALS: u8 = 18;

pub type MathResult = Result<U256, ProtocolError>;

/// How an incoming rent payment is split.
#[odra::odra_type]
#[derive(Default)]
pub struct PaymentSplit {
    /// Sent to the burn vault
    pub vault_amount: U256,
    /// Distributed to AMT holders
    pub holder_portion: U256,
    /// Distributed to liqAMT holders
    pub liquidity_portion: U256,
}

fn checked_mul(a: U256, b: U256) -> MathResult {
    a.checked_mul(b).ok_or(ProtocolError::ArithmeticOverflow)
}

fn checked_add(a: U256, b: U256) -> MathResult {
    a.checked_add(b).ok_or(ProtocolError::ArithmeticOverflow)
}

fn pow10(exponent: u8) -> MathResult {
    U256::from(10u8)
        .checked_pow(U256::from(exponent))
        .ok_or(ProtocolError::ArithmeticOverflow)
}

/// `a * b / c`, zero when `c` is zero
pub fn mul_div(a: U256, b: U256, c: U256) -> MathResult {
    if c.is_zero() {
        return Ok(U256::zero());
    }
    Ok(checked_mul(a, b)? / c)
}

/// Share of `portion` owed to a holder of `balance` out of `supply`.
pub fn dividend_share(balance: U256, portion: U256, supply: U256) -> MathResult {
    mul_div(balance, portion, supply)
}

/// Split a payment between the burn vault, AMT holders and liquidity providers.
///
/// The liquidity share tracks how much of the AMT supply sits in the pool.
/// Without any liqAMT outstanding nobody could claim it, so it stays with
/// the holders.
pub fn split_payment(
    amount: U256,
    vault_participation: u8,
    pool_amt_balance: U256,
    amt_total_supply: U256,
    liquidity_total_supply: U256,
) -> Result<PaymentSplit, ProtocolError> {
    let vault_amount = mul_div(amount, U256::from(vault_participation), U256::from(100u8))?;
    let remainder = amount - vault_amount;

    let liquidity_portion = if liquidity_total_supply.is_zero() {
        U256::zero()
    } else {
        mul_div(remainder, pool_amt_balance, amt_total_supply)?
    };

    Ok(PaymentSplit {
        vault_amount,
        holder_portion: remainder - liquidity_portion,
        liquidity_portion,
    })
}

/// Constant-product output for `amount_in`, after the swap fee.
pub fn get_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> MathResult {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return Ok(U256::zero());
    }
    let amount_in_with_fee = checked_mul(amount_in, U256::from(BPS_SCALE - SWAP_FEE_BPS))?;
    let numerator = checked_mul(amount_in_with_fee, reserve_out)?;
    let denominator = checked_add(checked_mul(reserve_in, U256::from(BPS_SCALE))?, amount_in_with_fee)?;
    Ok(numerator / denominator)
}

/// Amount of the other asset matching `amount_a` at the current reserve ratio.
pub fn quote(amount_a: U256, reserve_a: U256, reserve_b: U256) -> MathResult {
    mul_div(amount_a, reserve_b, reserve_a)
}

/// Price of one unit of the `reserve_base` asset in units of `reserve_quote`,
/// scaled by `PRICE_SCALE`.
pub fn spot_price(reserve_base: U256, reserve_quote: U256) -> MathResult {
    mul_div(reserve_quote, U256::from(PRICE_SCALE), reserve_base)
}

/// Liquidity minted for a deposit into a pool with `total_liquidity` outstanding.
pub fn liquidity_for_deposit(
    amount_a: U256,
    amount_b: U256,
    reserve_a: U256,
    reserve_b: U256,
    total_liquidity: U256,
) -> MathResult {
    if total_liquidity.is_zero() {
        return Ok(checked_mul(amount_a, amount_b)?.integer_sqrt());
    }
    let by_a = mul_div(amount_a, total_liquidity, reserve_a)?;
    let by_b = mul_div(amount_b, total_liquidity, reserve_b)?;
    Ok(by_a.min(by_b))
}

/// Rescale a price with `decimals` places to `PRICE_DECIMALS` places.
pub fn normalize_price(answer: U256, decimals: u8) -> MathResult {
    if decimals <= PRICE_DECIMALS {
        checked_mul(answer, pow10(PRICE_DECIMALS - decimals)?)
    } else {
        Ok(answer / pow10(decimals - PRICE_DECIMALS)?)
    }
}

/// Value of `amount` priced at `price` (both 18 decimals).
pub fn value_at_price(amount: U256, price: U256) -> MathResult {
    mul_div(amount, price, U256::from(PRICE_SCALE))
}

/// Collateral released when `repay` of `borrowed` is paid back.
pub fn collateral_for_repayment(collateral: U256, repay: U256, borrowed: U256) -> MathResult {
    if repay == borrowed {
        return Ok(collateral);
    }
    mul_div(collateral, repay, borrowed)
}
