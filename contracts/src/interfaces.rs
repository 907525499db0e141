//! Cross-contract interfaces of the AMT protocol.
//!
//! Every collaborator a module talks to is reached through one of these
//! entry-point sets, so any contract exposing the same entry points can
//! stand in for it (pool, feed and token test doubles included).

use odra::prelude::*;
use odra::casper_types::U256;
use crate::types::{CumulativePrices, LiquidityReceipt, PoolReserves, RoundData};

/// CEP-18 token interface
#[odra::external_contract]
pub trait Cep18Token {
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool;
    fn approve(&mut self, spender: Address, amount: U256) -> bool;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn balance_of(&self, account: Address) -> U256;
    fn total_supply(&self) -> U256;
}

/// Snapshot ledger consumed by the Master contract
#[odra::external_contract]
pub trait SnapshotLedger {
    fn mint(&mut self, to: Address, amount: U256);
    fn burn(&mut self, from: Address, amount: U256);
    fn snapshot(&mut self) -> u32;
    fn balance_of_at(&self, account: Address, snapshot_id: u32) -> U256;
    fn total_supply_at(&self, snapshot_id: u32) -> U256;
    fn transfer_ownership(&mut self, new_owner: Address);
}

/// Market pool and router surface
#[odra::external_contract]
pub trait MarketPoolRouter {
    fn get_pair(&self, token_a: Address, token_b: Address) -> Option<Address>;
    fn token0(&self) -> Address;
    fn token1(&self) -> Address;
    fn get_reserves(&self) -> PoolReserves;
    fn current_cumulative_prices(&self) -> CumulativePrices;
    fn get_amount_out(&self, amount_in: U256, token_in: Address) -> U256;
    fn add_liquidity(
        &mut self,
        token_a: Address,
        token_b: Address,
        amount_a_desired: U256,
        amount_b_desired: U256,
        to: Address,
    ) -> LiquidityReceipt;
    fn remove_liquidity(
        &mut self,
        token_a: Address,
        token_b: Address,
        liquidity: U256,
        to: Address,
    ) -> LiquidityReceipt;
    fn swap_exact_tokens_for_tokens(
        &mut self,
        amount_in: U256,
        amount_out_min: U256,
        token_in: Address,
        to: Address,
    ) -> U256;
}

/// TWAP oracle
#[odra::external_contract]
pub trait PriceOracle {
    fn consult(&self, token: Address, amount_in: U256) -> U256;
}

/// External reference price source
#[odra::external_contract]
pub trait ReferencePriceSource {
    fn latest_round_data(&self) -> RoundData;
    fn decimals(&self) -> u8;
}

/// Bounded fair price used by the loan protocol
#[odra::external_contract]
pub trait FairPriceSource {
    fn get_price(&self, amount_in: U256) -> U256;
}

/// Holder side of the dividend ledger
#[odra::external_contract]
pub trait DividendLedger {
    fn charge(&mut self, id: u32) -> U256;
}
