//! Reference Price Feed
//!
//! Pushed price source for the settlement asset, read the way an
//! aggregator's latest round is read. A single feeder account publishes
//! answers scaled by `decimals()`; the admin can rotate the feeder.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::ProtocolError;
use crate::types::{is_zero_address, RoundData};

/// Emitted on every published answer
#[odra::event]
pub struct AnswerUpdated {
    pub round_id: u64,
    pub answer: U256,
    pub updated_at: u64,
}

#[odra::module(events = [AnswerUpdated])]
pub struct ReferenceFeed {
    admin: Var<Address>,
    /// Account allowed to publish answers
    feeder: Var<Address>,
    decimals: Var<u8>,
    latest: Var<RoundData>,
}

#[odra::module]
impl ReferenceFeed {
    pub fn init(&mut self, decimals: u8, initial_answer: U256) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.feeder.set(caller);
        self.decimals.set(decimals);
        self.publish(initial_answer, 1);
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(8)
    }

    pub fn latest_round_data(&self) -> RoundData {
        self.latest.get_or_revert_with(ProtocolError::ReferencePriceUnavailable)
    }

    pub fn latest_answer(&self) -> U256 {
        self.latest_round_data().answer
    }

    /// Publish a new answer (feeder only)
    pub fn set_answer(&mut self, answer: U256) {
        if self.feeder.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotFeeder);
        }
        let next_round = self.latest.get().map(|round| round.round_id + 1).unwrap_or(1);
        self.publish(answer, next_round);
    }

    /// Rotate the feeder account (admin only)
    pub fn set_feeder(&mut self, feeder: Address) {
        if self.admin.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotOwner);
        }
        if is_zero_address(&feeder) {
            self.env().revert(ProtocolError::ZeroReferenceFeed);
        }
        self.feeder.set(feeder);
    }

    pub fn get_feeder(&self) -> Option<Address> {
        self.feeder.get()
    }

    fn publish(&mut self, answer: U256, round_id: u64) {
        if answer.is_zero() {
            self.env().revert(ProtocolError::ReferencePriceUnavailable);
        }
        let updated_at = self.env().get_block_time();
        self.latest.set(RoundData { round_id, answer, updated_at });
        self.env().emit_event(AnswerUpdated { round_id, answer, updated_at });
    }
}
