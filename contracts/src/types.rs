//! Common types used across the AMT protocol.

use odra::prelude::*;
use odra::casper_types::account::AccountHash;
use odra::casper_types::U256;

/// The all-zero account address, used as the "unset" sentinel in configuration.
pub fn zero_address() -> Address {
    Address::Account(AccountHash::default())
}

/// Returns true for the all-zero account address.
pub fn is_zero_address(address: &Address) -> bool {
    *address == zero_address()
}

/// A rent payment registered in the dividend ledger.
///
/// The payment id is also the snapshot id taken on both the AMT and the
/// liqAMT ledgers when the payment was made.
#[odra::odra_type]
pub struct Payment {
    /// Snapshot id the payment is bound to
    pub id: u32,
    /// Amount pulled from the payer wallet
    pub total_amount: U256,
    /// Share diverted to the burn vault
    pub vault_amount: U256,
    /// Share distributed to AMT holders
    pub holder_portion: U256,
    /// Share distributed to liqAMT holders
    pub liquidity_portion: U256,
    /// Amount already paid out of `holder_portion`
    pub claimed_by_holders: U256,
    /// Amount already paid out of `liquidity_portion`
    pub claimed_by_liquidity_providers: U256,
}

impl Payment {
    pub fn unclaimed_holder_portion(&self) -> U256 {
        self.holder_portion.saturating_sub(self.claimed_by_holders)
    }

    pub fn unclaimed_liquidity_portion(&self) -> U256 {
        self.liquidity_portion
            .saturating_sub(self.claimed_by_liquidity_providers)
    }
}

/// Which dividend stream a charge draws from.
#[odra::odra_type]
#[derive(Copy)]
pub enum DividendStream {
    /// AMT holders, paid from `holder_portion`
    Holders,
    /// liqAMT holders, paid from `liquidity_portion`
    LiquidityProviders,
}

/// Time-locked liquidity escrow held by the Master contract.
#[odra::odra_type]
pub struct LiquidityLock {
    /// Receiver of the locked liqAMT and its dividends
    pub beneficiary: Address,
    /// Block time (ms) from which the liquidity can be released
    pub release_time: u64,
    /// liqAMT still held in escrow
    pub liquidity: U256,
    /// AMT deposited into the pool when the lock was created
    pub amt_amount: U256,
    /// Settlement asset deposited into the pool when the lock was created
    pub settlement_amount: U256,
    /// First payment id whose snapshot includes the locked liqAMT
    pub first_payment_id: u32,
    /// Last such payment id, set on release
    pub last_payment_id: Option<u32>,
}

impl LiquidityLock {
    /// True when payments `from..=to` were all taken while this lock held liquidity
    pub fn covers(&self, from: u32, to: u32) -> bool {
        from >= self.first_payment_id && self.last_payment_id.map_or(true, |last| to <= last)
    }
}

/// A collateralized loan.
#[odra::odra_type]
pub struct Loan {
    /// Borrower address
    pub borrower: Address,
    /// Outstanding loan asset amount
    pub amount_borrowed: U256,
    /// AMT held as collateral
    pub collateral_locked: U256,
    /// Fair price of the collateral at origination
    pub loan_price: U256,
    /// Divisor applied to `loan_price` at origination
    pub loan_ratio: u32,
}

/// Index key for a borrower's loan list.
#[odra::odra_type]
#[derive(Copy)]
pub struct UserLoanIndex {
    /// Borrower address
    pub borrower: Address,
    /// 0-based index into the borrower's active loans
    pub index: u32,
}

/// Historical value recorded by a snapshot ledger.
#[odra::odra_type]
#[derive(Copy)]
pub struct SnapshotEntry {
    /// Snapshot id current when the value was recorded
    pub id: u32,
    /// Balance or total supply as of that snapshot
    pub value: U256,
}

/// Pool reserves in `token0`/`token1` order.
#[odra::odra_type]
pub struct PoolReserves {
    pub reserve0: U256,
    pub reserve1: U256,
    /// Block time (ms) of the last reserve change
    pub block_timestamp_last: u64,
}

/// Cumulative price accumulators of a pool at a point in time.
#[odra::odra_type]
pub struct CumulativePrices {
    /// Σ price0 × elapsed, price0 scaled by `PRICE_SCALE`
    pub price0_cumulative: U256,
    /// Σ price1 × elapsed, price1 scaled by `PRICE_SCALE`
    pub price1_cumulative: U256,
    /// Block time (ms) the accumulators are valid for
    pub timestamp: u64,
}

/// TWAP oracle observation.
#[odra::odra_type]
pub struct PriceObservation {
    pub price0_cumulative: U256,
    pub price1_cumulative: U256,
    pub timestamp: u64,
}

/// Amounts moved by a liquidity operation, in the caller's token order.
#[odra::odra_type]
pub struct LiquidityReceipt {
    pub amount_a: U256,
    pub amount_b: U256,
    pub liquidity: U256,
}

/// Latest reference price round.
#[odra::odra_type]
pub struct RoundData {
    pub round_id: u64,
    /// Price scaled by the feed's `decimals()`
    pub answer: U256,
    /// Block time (ms) of the answer
    pub updated_at: u64,
}
