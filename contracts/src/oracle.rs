//! TWAP Oracle
//!
//! Fixed-window time-weighted average price over a market pool pair.
//! The pool keeps `price * elapsed` accumulators; every `update()` takes the
//! difference to the previous observation and divides by the elapsed block
//! time, giving an average that a single-block trade cannot move much.
//!
//! Averages are zero until the first successful `update()`.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::ProtocolError;
use crate::interfaces::MarketPoolRouterContractRef;
use crate::math;
use crate::types::{is_zero_address, PriceObservation};

/// Minimum block time between updates (one hour, in milliseconds)
pub const MIN_UPDATE_PERIOD: u64 = 3_600_000;

/// Emitted on every accepted update
#[odra::event]
pub struct TwapUpdated {
    pub price0_average: U256,
    pub price1_average: U256,
    pub timestamp: u64,
}

#[odra::module(events = [TwapUpdated])]
pub struct TwapOracle {
    owner: Var<Address>,
    pool: Var<Address>,
    token0: Var<Address>,
    token1: Var<Address>,
    observation: Var<PriceObservation>,
    /// Average token0 price in token1, `PRICE_SCALE` fixed point
    price0_average: Var<U256>,
    /// Average token1 price in token0, `PRICE_SCALE` fixed point
    price1_average: Var<U256>,
}

#[odra::module]
impl TwapOracle {
    pub fn init(&mut self, pool: Address, token_a: Address, token_b: Address) {
        if is_zero_address(&pool) {
            self.env().revert(ProtocolError::ZeroPool);
        }
        let pool_ref = MarketPoolRouterContractRef::new(self.env(), pool);
        if pool_ref.get_pair(token_a, token_b) != Some(pool) {
            self.env().revert(ProtocolError::InvalidToken);
        }

        let reserves = pool_ref.get_reserves();
        if reserves.reserve0.is_zero() || reserves.reserve1.is_zero() {
            self.env().revert(ProtocolError::NoReserves);
        }

        let cumulative = pool_ref.current_cumulative_prices();
        self.owner.set(self.env().caller());
        self.pool.set(pool);
        self.token0.set(pool_ref.token0());
        self.token1.set(pool_ref.token1());
        self.observation.set(PriceObservation {
            price0_cumulative: cumulative.price0_cumulative,
            price1_cumulative: cumulative.price1_cumulative,
            timestamp: cumulative.timestamp,
        });
        self.price0_average.set(U256::zero());
        self.price1_average.set(U256::zero());
    }

    /// Roll the averages forward (owner only, at most once per period)
    pub fn update(&mut self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotOwner);
        }

        let last = self.get_observation();
        let current = MarketPoolRouterContractRef::new(self.env(), self.get_pool())
            .current_cumulative_prices();
        let elapsed = current.timestamp.saturating_sub(last.timestamp);
        if elapsed < MIN_UPDATE_PERIOD {
            self.env().revert(ProtocolError::PeriodNotElapsed);
        }

        let elapsed = U256::from(elapsed);
        let price0_average = current
            .price0_cumulative
            .overflowing_sub(last.price0_cumulative)
            .0
            / elapsed;
        let price1_average = current
            .price1_cumulative
            .overflowing_sub(last.price1_cumulative)
            .0
            / elapsed;

        self.price0_average.set(price0_average);
        self.price1_average.set(price1_average);
        self.observation.set(PriceObservation {
            price0_cumulative: current.price0_cumulative,
            price1_cumulative: current.price1_cumulative,
            timestamp: current.timestamp,
        });

        self.env().emit_event(TwapUpdated {
            price0_average,
            price1_average,
            timestamp: current.timestamp,
        });
    }

    /// Amount of the other pair token worth `amount_in` of `token` at the TWAP
    pub fn consult(&self, token: Address, amount_in: U256) -> U256 {
        let average = if Some(token) == self.token0.get() {
            self.get_price0_average()
        } else if Some(token) == self.token1.get() {
            self.get_price1_average()
        } else {
            self.env().revert(ProtocolError::InvalidToken)
        };
        math::value_at_price(amount_in, average).unwrap_or_revert(&self.env())
    }

    // ========== Views ==========

    pub fn get_pool(&self) -> Address {
        self.pool.get_or_revert_with(ProtocolError::ZeroPool)
    }

    pub fn get_token0(&self) -> Option<Address> {
        self.token0.get()
    }

    pub fn get_token1(&self) -> Option<Address> {
        self.token1.get()
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    pub fn get_observation(&self) -> PriceObservation {
        self.observation.get_or_revert_with(ProtocolError::NoReserves)
    }

    pub fn get_price0_average(&self) -> U256 {
        self.price0_average.get().unwrap_or(U256::zero())
    }

    pub fn get_price1_average(&self) -> U256 {
        self.price1_average.get().unwrap_or(U256::zero())
    }
}
