//! Price Feeder
//!
//! Bounded "fair price" of AMT in the loan asset, used to size and liquidate
//! loans. Three sources are combined:
//! - the TWAP oracle quote for `amount_in` AMT (settlement asset units)
//! - the pool's fee- and impact-inclusive spot quote for the same amount
//! - the external reference price of the settlement asset
//!
//! A spot quote above the TWAP (buy pressure, possibly a single-block pump)
//! is capped at the TWAP. A spot quote at or below the TWAP already carries
//! the sell's price impact and is used as is, so the result never values
//! the collateral above either market view.
//!
//! The bound applies to every size, not only large trades. When spot has
//! drifted even slightly above the TWAP in ordinary trading, the lagging
//! TWAP quote is returned until the next oracle update catches up.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::ProtocolError;
use crate::interfaces::{
    MarketPoolRouterContractRef, PriceOracleContractRef, ReferencePriceSourceContractRef,
};
use crate::math;
use crate::types::is_zero_address;

#[odra::module]
pub struct PriceFeeder {
    oracle: Var<Address>,
    amt: Var<Address>,
    settlement: Var<Address>,
    reference_feed: Var<Address>,
    pool: Var<Address>,
}

#[odra::module]
impl PriceFeeder {
    pub fn init(
        &mut self,
        oracle: Address,
        amt: Address,
        settlement: Address,
        reference_feed: Address,
        pool: Address,
    ) {
        if is_zero_address(&oracle) {
            self.env().revert(ProtocolError::ZeroOracle);
        }
        if is_zero_address(&amt) {
            self.env().revert(ProtocolError::ZeroAmt);
        }
        if is_zero_address(&settlement) {
            self.env().revert(ProtocolError::ZeroSettlement);
        }
        if is_zero_address(&reference_feed) {
            self.env().revert(ProtocolError::ZeroReferenceFeed);
        }
        if is_zero_address(&pool) {
            self.env().revert(ProtocolError::ZeroPool);
        }
        self.oracle.set(oracle);
        self.amt.set(amt);
        self.settlement.set(settlement);
        self.reference_feed.set(reference_feed);
        self.pool.set(pool);
    }

    /// Loan-asset value of `amount_in` AMT
    pub fn get_price(&self, amount_in: U256) -> U256 {
        if amount_in.is_zero() {
            self.env().revert(ProtocolError::InvalidAmountIn);
        }
        let amt = self.get_amt();

        let twap_quote = PriceOracleContractRef::new(self.env(), self.get_oracle())
            .consult(amt, amount_in);
        let spot_quote = MarketPoolRouterContractRef::new(self.env(), self.get_pool())
            .get_amount_out(amount_in, amt);

        let bounded_quote = bounded_quote(spot_quote, twap_quote);
        math::value_at_price(bounded_quote, self.get_latest_reference_price())
            .unwrap_or_revert(&self.env())
    }

    /// Reference price of the settlement asset, 18 decimals
    pub fn get_latest_reference_price(&self) -> U256 {
        let feed = ReferencePriceSourceContractRef::new(self.env(), self.get_reference_feed());
        let round = feed.latest_round_data();
        if round.answer.is_zero() {
            self.env().revert(ProtocolError::ReferencePriceUnavailable);
        }
        math::normalize_price(round.answer, feed.decimals()).unwrap_or_revert(&self.env())
    }

    // ========== Views ==========

    pub fn get_oracle(&self) -> Address {
        self.oracle.get_or_revert_with(ProtocolError::ZeroOracle)
    }

    pub fn get_amt(&self) -> Address {
        self.amt.get_or_revert_with(ProtocolError::ZeroAmt)
    }

    pub fn get_settlement(&self) -> Address {
        self.settlement.get_or_revert_with(ProtocolError::ZeroSettlement)
    }

    pub fn get_reference_feed(&self) -> Address {
        self.reference_feed.get_or_revert_with(ProtocolError::ZeroReferenceFeed)
    }

    pub fn get_pool(&self) -> Address {
        self.pool.get_or_revert_with(ProtocolError::ZeroPool)
    }
}

/// Spot quote capped by the TWAP quote
pub fn bounded_quote(spot_quote: U256, twap_quote: U256) -> U256 {
    spot_quote.min(twap_quote)
}
