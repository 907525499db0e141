//! Market Pool
//!
//! Two-asset constant-product pool exposing the pair and router entry points
//! the protocol consumes:
//! - reserves and time-weighted cumulative prices (read by the TWAP oracle)
//! - fee-inclusive spot quotes (read by the price feeder)
//! - liquidity add/remove with pool liquidity issuance (used by Master)
//! - exact-input swaps
//!
//! Prices are `PRICE_SCALE` fixed point: `price0 = reserve1 / reserve0` is the
//! value of one unit of `token0` in `token1`. Accumulators add
//! `price * elapsed` on every reserve change, using block time.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::ProtocolError;
use crate::interfaces::Cep18TokenContractRef;
use crate::math;
use crate::types::{is_zero_address, CumulativePrices, LiquidityReceipt, PoolReserves};

/// Emitted after every reserve change
#[odra::event]
pub struct Sync {
    pub reserve0: U256,
    pub reserve1: U256,
}

#[odra::event]
pub struct Swap {
    pub sender: Address,
    pub token_in: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub to: Address,
}

#[odra::event]
pub struct LiquidityMinted {
    pub provider: Address,
    pub to: Address,
    pub amount0: U256,
    pub amount1: U256,
    pub liquidity: U256,
}

#[odra::event]
pub struct LiquidityBurned {
    pub provider: Address,
    pub to: Address,
    pub amount0: U256,
    pub amount1: U256,
    pub liquidity: U256,
}

#[odra::module(events = [Sync, Swap, LiquidityMinted, LiquidityBurned])]
pub struct MarketPool {
    token0: Var<Address>,
    token1: Var<Address>,
    reserve0: Var<U256>,
    reserve1: Var<U256>,
    /// Block time (ms) of the last reserve change
    block_timestamp_last: Var<u64>,
    price0_cumulative_last: Var<U256>,
    price1_cumulative_last: Var<U256>,
    total_liquidity: Var<U256>,
    liquidity: Mapping<Address, U256>,
}

#[odra::module]
impl MarketPool {
    pub fn init(&mut self, token0: Address, token1: Address) {
        if is_zero_address(&token0) || is_zero_address(&token1) {
            self.env().revert(ProtocolError::InvalidToken);
        }
        if token0 == token1 {
            self.env().revert(ProtocolError::PoolIdenticalTokens);
        }
        self.token0.set(token0);
        self.token1.set(token1);
        self.reserve0.set(U256::zero());
        self.reserve1.set(U256::zero());
        self.block_timestamp_last.set(self.env().get_block_time());
        self.price0_cumulative_last.set(U256::zero());
        self.price1_cumulative_last.set(U256::zero());
        self.total_liquidity.set(U256::zero());
    }

    // ========== Pair Views ==========

    pub fn token0(&self) -> Address {
        self.token0.get_or_revert_with(ProtocolError::InvalidToken)
    }

    pub fn token1(&self) -> Address {
        self.token1.get_or_revert_with(ProtocolError::InvalidToken)
    }

    /// This pool's address when it trades exactly `token_a`/`token_b`
    pub fn get_pair(&self, token_a: Address, token_b: Address) -> Option<Address> {
        let (token0, token1) = (self.token0(), self.token1());
        if (token_a == token0 && token_b == token1) || (token_a == token1 && token_b == token0) {
            Some(self.env().self_address())
        } else {
            None
        }
    }

    pub fn get_reserves(&self) -> PoolReserves {
        PoolReserves {
            reserve0: self.reserve0.get().unwrap_or(U256::zero()),
            reserve1: self.reserve1.get().unwrap_or(U256::zero()),
            block_timestamp_last: self.block_timestamp_last.get().unwrap_or(0),
        }
    }

    pub fn price0_cumulative_last(&self) -> U256 {
        self.price0_cumulative_last.get().unwrap_or(U256::zero())
    }

    pub fn price1_cumulative_last(&self) -> U256 {
        self.price1_cumulative_last.get().unwrap_or(U256::zero())
    }

    /// Accumulators as they would read if the reserves were touched now
    pub fn current_cumulative_prices(&self) -> CumulativePrices {
        let now = self.env().get_block_time();
        let reserves = self.get_reserves();
        let elapsed = now.saturating_sub(reserves.block_timestamp_last);
        let (price0_cumulative, price1_cumulative) = accumulate(
            self.price0_cumulative_last(),
            self.price1_cumulative_last(),
            reserves.reserve0,
            reserves.reserve1,
            elapsed,
        )
        .unwrap_or_revert(&self.env());
        CumulativePrices { price0_cumulative, price1_cumulative, timestamp: now }
    }

    pub fn get_amount_out(&self, amount_in: U256, token_in: Address) -> U256 {
        let (reserve_in, reserve_out) = self.reserves_for(token_in);
        math::get_amount_out(amount_in, reserve_in, reserve_out).unwrap_or_revert(&self.env())
    }

    /// Amount of the other asset matching `amount_a` of `token_a` at the current ratio
    pub fn quote(&self, amount_a: U256, token_a: Address) -> U256 {
        let (reserve_a, reserve_b) = self.reserves_for(token_a);
        math::quote(amount_a, reserve_a, reserve_b).unwrap_or_revert(&self.env())
    }

    pub fn total_liquidity(&self) -> U256 {
        self.total_liquidity.get().unwrap_or(U256::zero())
    }

    pub fn liquidity_of(&self, owner: Address) -> U256 {
        self.liquidity.get(&owner).unwrap_or(U256::zero())
    }

    // ========== Router Functions ==========

    /// Deposit up to the desired amounts at the current ratio and mint pool
    /// liquidity to `to`. Only the amounts actually used are pulled.
    pub fn add_liquidity(
        &mut self,
        token_a: Address,
        token_b: Address,
        amount_a_desired: U256,
        amount_b_desired: U256,
        to: Address,
    ) -> LiquidityReceipt {
        let a_is_token0 = self.resolve_order(token_a, token_b);
        let reserves = self.get_reserves();
        let (reserve_a, reserve_b) = if a_is_token0 {
            (reserves.reserve0, reserves.reserve1)
        } else {
            (reserves.reserve1, reserves.reserve0)
        };

        let (amount_a, amount_b) = if reserve_a.is_zero() && reserve_b.is_zero() {
            (amount_a_desired, amount_b_desired)
        } else {
            let amount_b_optimal =
                math::quote(amount_a_desired, reserve_a, reserve_b).unwrap_or_revert(&self.env());
            if amount_b_optimal <= amount_b_desired {
                (amount_a_desired, amount_b_optimal)
            } else {
                let amount_a_optimal =
                    math::quote(amount_b_desired, reserve_b, reserve_a).unwrap_or_revert(&self.env());
                (amount_a_optimal, amount_b_desired)
            }
        };

        let minted = math::liquidity_for_deposit(
            amount_a,
            amount_b,
            reserve_a,
            reserve_b,
            self.total_liquidity(),
        )
        .unwrap_or_revert(&self.env());
        if minted.is_zero() {
            self.env().revert(ProtocolError::PoolInsufficientLiquidityMinted);
        }

        let provider = self.env().caller();
        let pool = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), token_a).transfer_from(provider, pool, amount_a);
        Cep18TokenContractRef::new(self.env(), token_b).transfer_from(provider, pool, amount_b);

        self.liquidity.set(&to, self.liquidity_of(to) + minted);
        self.total_liquidity.set(self.total_liquidity() + minted);

        let (amount0, amount1) = if a_is_token0 { (amount_a, amount_b) } else { (amount_b, amount_a) };
        self.update_reserves(reserves.reserve0 + amount0, reserves.reserve1 + amount1, &reserves);

        self.env().emit_event(LiquidityMinted { provider, to, amount0, amount1, liquidity: minted });

        LiquidityReceipt { amount_a, amount_b, liquidity: minted }
    }

    /// Burn `liquidity` held by the caller and pay both assets to `to`
    pub fn remove_liquidity(
        &mut self,
        token_a: Address,
        token_b: Address,
        liquidity: U256,
        to: Address,
    ) -> LiquidityReceipt {
        let a_is_token0 = self.resolve_order(token_a, token_b);
        let provider = self.env().caller();
        let held = self.liquidity_of(provider);
        if held < liquidity {
            self.env().revert(ProtocolError::PoolInsufficientLiquidity);
        }

        let reserves = self.get_reserves();
        let total = self.total_liquidity();
        let amount0 = math::mul_div(liquidity, reserves.reserve0, total).unwrap_or_revert(&self.env());
        let amount1 = math::mul_div(liquidity, reserves.reserve1, total).unwrap_or_revert(&self.env());
        if amount0.is_zero() || amount1.is_zero() {
            self.env().revert(ProtocolError::PoolInsufficientLiquidityBurned);
        }

        self.liquidity.set(&provider, held - liquidity);
        self.total_liquidity.set(total - liquidity);
        self.update_reserves(reserves.reserve0 - amount0, reserves.reserve1 - amount1, &reserves);

        Cep18TokenContractRef::new(self.env(), self.token0()).transfer(to, amount0);
        Cep18TokenContractRef::new(self.env(), self.token1()).transfer(to, amount1);

        self.env().emit_event(LiquidityBurned { provider, to, amount0, amount1, liquidity });

        let (amount_a, amount_b) = if a_is_token0 { (amount0, amount1) } else { (amount1, amount0) };
        LiquidityReceipt { amount_a, amount_b, liquidity }
    }

    pub fn swap_exact_tokens_for_tokens(
        &mut self,
        amount_in: U256,
        amount_out_min: U256,
        token_in: Address,
        to: Address,
    ) -> U256 {
        if amount_in.is_zero() {
            self.env().revert(ProtocolError::PoolInsufficientInput);
        }
        let token0 = self.token0();
        let token1 = self.token1();
        let in_is_token0 = if token_in == token0 {
            true
        } else if token_in == token1 {
            false
        } else {
            self.env().revert(ProtocolError::InvalidToken)
        };

        let reserves = self.get_reserves();
        let (reserve_in, reserve_out) = if in_is_token0 {
            (reserves.reserve0, reserves.reserve1)
        } else {
            (reserves.reserve1, reserves.reserve0)
        };
        if reserve_in.is_zero() || reserve_out.is_zero() {
            self.env().revert(ProtocolError::PoolInsufficientLiquidity);
        }

        let amount_out =
            math::get_amount_out(amount_in, reserve_in, reserve_out).unwrap_or_revert(&self.env());
        if amount_out.is_zero() || amount_out < amount_out_min {
            self.env().revert(ProtocolError::PoolInsufficientOutput);
        }

        let sender = self.env().caller();
        let pool = self.env().self_address();
        let token_out = if in_is_token0 { token1 } else { token0 };
        Cep18TokenContractRef::new(self.env(), token_in).transfer_from(sender, pool, amount_in);

        if in_is_token0 {
            self.update_reserves(reserves.reserve0 + amount_in, reserves.reserve1 - amount_out, &reserves);
        } else {
            self.update_reserves(reserves.reserve0 - amount_out, reserves.reserve1 + amount_in, &reserves);
        }

        Cep18TokenContractRef::new(self.env(), token_out).transfer(to, amount_out);

        self.env().emit_event(Swap { sender, token_in, amount_in, amount_out, to });
        amount_out
    }

    // ========== Internal ==========

    /// True when `token_a` is `token0`; reverts unless the pair matches this pool
    fn resolve_order(&self, token_a: Address, token_b: Address) -> bool {
        let token0 = self.token0();
        let token1 = self.token1();
        if token_a == token0 && token_b == token1 {
            true
        } else if token_a == token1 && token_b == token0 {
            false
        } else {
            self.env().revert(ProtocolError::InvalidToken)
        }
    }

    fn reserves_for(&self, token_in: Address) -> (U256, U256) {
        let reserves = self.get_reserves();
        if token_in == self.token0() {
            (reserves.reserve0, reserves.reserve1)
        } else if token_in == self.token1() {
            (reserves.reserve1, reserves.reserve0)
        } else {
            self.env().revert(ProtocolError::InvalidToken)
        }
    }

    /// Accrue the accumulators over the old reserves, then store the new ones
    fn update_reserves(&mut self, reserve0: U256, reserve1: U256, previous: &PoolReserves) {
        let now = self.env().get_block_time();
        let elapsed = now.saturating_sub(previous.block_timestamp_last);
        let (price0, price1) = accumulate(
            self.price0_cumulative_last(),
            self.price1_cumulative_last(),
            previous.reserve0,
            previous.reserve1,
            elapsed,
        )
        .unwrap_or_revert(&self.env());
        self.price0_cumulative_last.set(price0);
        self.price1_cumulative_last.set(price1);
        self.reserve0.set(reserve0);
        self.reserve1.set(reserve1);
        self.block_timestamp_last.set(now);
        self.env().emit_event(Sync { reserve0, reserve1 });
    }
}

/// Add `price * elapsed` for both directions. Accumulators wrap on overflow;
/// readers only ever use differences. The spot price itself must not overflow.
fn accumulate(
    price0_cumulative: U256,
    price1_cumulative: U256,
    reserve0: U256,
    reserve1: U256,
    elapsed: u64,
) -> Result<(U256, U256), ProtocolError> {
    if elapsed == 0 || reserve0.is_zero() || reserve1.is_zero() {
        return Ok((price0_cumulative, price1_cumulative));
    }
    let elapsed = U256::from(elapsed);
    let price0 = math::spot_price(reserve0, reserve1)?.overflowing_mul(elapsed).0;
    let price1 = math::spot_price(reserve1, reserve0)?.overflowing_mul(elapsed).0;
    Ok((
        price0_cumulative.overflowing_add(price0).0,
        price1_cumulative.overflowing_add(price1).0,
    ))
}
