//! Loan Protocol
//!
//! AMT-collateralized loans paid out in the loan asset. The loan size is
//! `price_feeder.get_price(collateral) / loan_ratio`, with the ratio chosen
//! by the borrower inside the configured `[min, max]` band.
//!
//! Loans are stored per borrower in a dense list; closing or liquidating a
//! loan swap-removes it, so a borrower's loan indices are not stable across
//! removals.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::ProtocolError;
use crate::interfaces::{Cep18TokenContractRef, DividendLedgerContractRef, FairPriceSourceContractRef};
use crate::math;
use crate::types::{is_zero_address, Loan, UserLoanIndex};

#[odra::event]
pub struct LoanCreated {
    pub borrower: Address,
    pub index: u32,
    pub amount_borrowed: U256,
    pub collateral_locked: U256,
}

#[odra::event]
pub struct LoanPartialClosed {
    pub borrower: Address,
    pub index: u32,
    pub amount_repaid: U256,
    pub collateral_returned: U256,
}

#[odra::event]
pub struct LoanClosed {
    pub borrower: Address,
    pub index: u32,
    pub amount_repaid: U256,
    pub collateral_returned: U256,
}

#[odra::event]
pub struct LoanLiquidated {
    pub borrower: Address,
    pub liquidator: Address,
    pub amount_borrowed: U256,
    pub collateral_seized: U256,
}

#[odra::event]
pub struct OperationsPaused {
    pub by: Address,
}

#[odra::event]
pub struct OperationsResumed {
    pub by: Address,
}

#[odra::module(events = [
    LoanCreated,
    LoanPartialClosed,
    LoanClosed,
    LoanLiquidated,
    OperationsPaused,
    OperationsResumed
])]
pub struct LoanProtocol {
    owner: Var<Address>,
    pause_admin: Var<Address>,
    paused: Var<bool>,
    settlement: Var<Address>,
    loan_asset: Var<Address>,
    amt: Var<Address>,
    master: Var<Address>,
    price_feeder: Var<Address>,
    loan_ratio_min: Var<u32>,
    loan_ratio_max: Var<u32>,
    /// (borrower, index) -> loan
    loans: Mapping<UserLoanIndex, Loan>,
    user_loan_count: Mapping<Address, u32>,
    total_borrowed: Var<U256>,
    total_collateral: Var<U256>,
}

#[odra::module]
impl LoanProtocol {
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        &mut self,
        settlement: Address,
        loan_asset: Address,
        amt: Address,
        master: Address,
        price_feeder: Address,
        loan_ratio_min: u32,
        loan_ratio_max: u32,
    ) {
        if is_zero_address(&settlement) {
            self.env().revert(ProtocolError::ZeroSettlement);
        }
        if is_zero_address(&loan_asset) {
            self.env().revert(ProtocolError::ZeroLoanAsset);
        }
        if is_zero_address(&amt) {
            self.env().revert(ProtocolError::ZeroAmt);
        }
        if is_zero_address(&master) {
            self.env().revert(ProtocolError::ZeroMaster);
        }
        if is_zero_address(&price_feeder) {
            self.env().revert(ProtocolError::ZeroPriceFeeder);
        }
        self.validate_loan_ratio(loan_ratio_min, loan_ratio_max);

        let caller = self.env().caller();
        self.owner.set(caller);
        self.pause_admin.set(caller);
        self.paused.set(false);
        self.settlement.set(settlement);
        self.loan_asset.set(loan_asset);
        self.amt.set(amt);
        self.master.set(master);
        self.price_feeder.set(price_feeder);
        self.loan_ratio_min.set(loan_ratio_min);
        self.loan_ratio_max.set(loan_ratio_max);
        self.total_borrowed.set(U256::zero());
        self.total_collateral.set(U256::zero());
    }

    // ========== Loans ==========

    /// Lock `amt_amount` AMT and borrow `price(amt_amount) / loan_ratio` loan asset
    #[odra(non_reentrant)]
    pub fn create_loan(&mut self, amt_amount: U256, loan_ratio: u32) {
        self.require_not_paused();
        if amt_amount.is_zero() {
            self.env().revert(ProtocolError::CollateralAmountZero);
        }
        if loan_ratio < self.loan_ratio_min() || loan_ratio > self.loan_ratio_max() {
            self.env().revert(ProtocolError::InvalidLoanRatio);
        }

        let borrower = self.env().caller();
        let mut amt_token = Cep18TokenContractRef::new(self.env(), self.get_amt());
        if amt_token.balance_of(borrower) < amt_amount {
            self.env().revert(ProtocolError::NotEnoughCollateral);
        }

        let loan_price = FairPriceSourceContractRef::new(self.env(), self.get_price_feeder())
            .get_price(amt_amount);
        let amount_borrowed = loan_price / U256::from(loan_ratio);
        if amount_borrowed.is_zero() {
            self.env().revert(ProtocolError::LoanAmountTooSmall);
        }

        let mut loan_asset = Cep18TokenContractRef::new(self.env(), self.get_loan_asset());
        if loan_asset.balance_of(self.env().self_address()) < amount_borrowed {
            self.env().revert(ProtocolError::ProtocolBalanceTooLow);
        }

        let index = self.get_user_loan_count(borrower);
        self.loans.set(
            &UserLoanIndex { borrower, index },
            Loan {
                borrower,
                amount_borrowed,
                collateral_locked: amt_amount,
                loan_price,
                loan_ratio,
            },
        );
        self.user_loan_count.set(&borrower, index + 1);
        self.total_borrowed.set(self.get_total_borrowed() + amount_borrowed);
        self.total_collateral.set(self.get_total_collateral() + amt_amount);

        amt_token.transfer_from(borrower, self.env().self_address(), amt_amount);
        loan_asset.transfer(borrower, amount_borrowed);

        self.env().emit_event(LoanCreated {
            borrower,
            index,
            amount_borrowed,
            collateral_locked: amt_amount,
        });
    }

    /// Repay `repay_amount` of the caller's loan at `index`.
    ///
    /// Collateral is returned pro rata; a full repayment returns all of it
    /// and removes the loan.
    #[odra(non_reentrant)]
    pub fn close_loan(&mut self, index: u32, repay_amount: U256) {
        self.require_not_paused();
        let borrower = self.env().caller();
        let key = UserLoanIndex { borrower, index };
        let mut loan = self.require_loan(&key);

        if repay_amount.is_zero() {
            self.env().revert(ProtocolError::RepayAmountZero);
        }
        if repay_amount > loan.amount_borrowed {
            self.env().revert(ProtocolError::RepayExceedsBorrowed);
        }
        let mut loan_asset = Cep18TokenContractRef::new(self.env(), self.get_loan_asset());
        if loan_asset.balance_of(borrower) < repay_amount {
            self.env().revert(ProtocolError::InsufficientRepayBalance);
        }

        let collateral_returned =
            math::collateral_for_repayment(loan.collateral_locked, repay_amount, loan.amount_borrowed)
                .unwrap_or_revert(&self.env());
        let fully_repaid = repay_amount == loan.amount_borrowed;

        self.total_borrowed.set(self.get_total_borrowed().saturating_sub(repay_amount));
        self.total_collateral.set(self.get_total_collateral().saturating_sub(collateral_returned));
        if fully_repaid {
            self.remove_loan(key);
        } else {
            loan.amount_borrowed -= repay_amount;
            loan.collateral_locked -= collateral_returned;
            self.loans.set(&key, loan);
        }

        loan_asset.transfer_from(borrower, self.env().self_address(), repay_amount);
        if !collateral_returned.is_zero() {
            Cep18TokenContractRef::new(self.env(), self.get_amt()).transfer(borrower, collateral_returned);
        }

        if fully_repaid {
            self.env().emit_event(LoanClosed {
                borrower,
                index,
                amount_repaid: repay_amount,
                collateral_returned,
            });
        } else {
            self.env().emit_event(LoanPartialClosed {
                borrower,
                index,
                amount_repaid: repay_amount,
                collateral_returned,
            });
        }
    }

    /// True when the collateral is worth no more than the outstanding debt
    pub fn is_loan_liquidable(&self, index: u32, borrower: Address) -> bool {
        let loan = self.require_loan(&UserLoanIndex { borrower, index });
        let collateral_value = FairPriceSourceContractRef::new(self.env(), self.get_price_feeder())
            .get_price(loan.collateral_locked);
        collateral_value <= loan.amount_borrowed
    }

    /// Seize the collateral of a liquidable loan (owner only)
    #[odra(non_reentrant)]
    pub fn liquidate_loan(&mut self, index: u32, borrower: Address) {
        self.require_owner();
        self.require_not_paused();
        if !self.is_loan_liquidable(index, borrower) {
            self.env().revert(ProtocolError::LoanNotLiquidable);
        }

        let key = UserLoanIndex { borrower, index };
        let loan = self.require_loan(&key);
        self.total_borrowed.set(self.get_total_borrowed().saturating_sub(loan.amount_borrowed));
        self.total_collateral.set(self.get_total_collateral().saturating_sub(loan.collateral_locked));
        self.remove_loan(key);

        let liquidator = self.env().caller();
        Cep18TokenContractRef::new(self.env(), self.get_amt()).transfer(liquidator, loan.collateral_locked);

        self.env().emit_event(LoanLiquidated {
            borrower,
            liquidator,
            amount_borrowed: loan.amount_borrowed,
            collateral_seized: loan.collateral_locked,
        });
    }

    // ========== Dividends & Treasury ==========

    /// Claim the holder dividend earned by the locked collateral and forward it to the owner
    #[odra(non_reentrant)]
    pub fn charge(&mut self, id: u32) -> U256 {
        self.require_owner();
        // Master reverts when the share is zero
        let amount = DividendLedgerContractRef::new(self.env(), self.get_master()).charge(id);
        Cep18TokenContractRef::new(self.env(), self.get_settlement())
            .transfer(self.env().caller(), amount);
        amount
    }

    /// Withdraw loan asset liquidity to the owner
    #[odra(non_reentrant)]
    pub fn withdraw_usdt(&mut self, amount: U256) {
        self.require_owner();
        let mut loan_asset = Cep18TokenContractRef::new(self.env(), self.get_loan_asset());
        if loan_asset.balance_of(self.env().self_address()) < amount {
            self.env().revert(ProtocolError::NotEnoughLoanAsset);
        }
        loan_asset.transfer(self.env().caller(), amount);
    }

    // ========== Admin Functions ==========

    pub fn set_price_feeder(&mut self, price_feeder: Address) {
        self.require_owner();
        if is_zero_address(&price_feeder) {
            self.env().revert(ProtocolError::ZeroPriceFeeder);
        }
        self.price_feeder.set(price_feeder);
    }

    pub fn set_loan_ratio(&mut self, loan_ratio_min: u32, loan_ratio_max: u32) {
        self.require_owner();
        self.validate_loan_ratio(loan_ratio_min, loan_ratio_max);
        self.loan_ratio_min.set(loan_ratio_min);
        self.loan_ratio_max.set(loan_ratio_max);
    }

    pub fn set_pause_admin(&mut self, pause_admin: Address) {
        self.require_owner();
        if is_zero_address(&pause_admin) {
            self.env().revert(ProtocolError::ZeroPauseAdmin);
        }
        self.pause_admin.set(pause_admin);
    }

    /// Block loan creation, repayment and liquidation (pause admin only)
    pub fn emergency_stop(&mut self) {
        self.require_pause_admin();
        self.paused.set(true);
        self.env().emit_event(OperationsPaused { by: self.env().caller() });
    }

    pub fn resume_operations(&mut self) {
        self.require_pause_admin();
        self.paused.set(false);
        self.env().emit_event(OperationsResumed { by: self.env().caller() });
    }

    // ========== Views ==========

    pub fn get_user_loans(&self, user: Address) -> Vec<Loan> {
        (0..self.get_user_loan_count(user))
            .filter_map(|index| self.loans.get(&UserLoanIndex { borrower: user, index }))
            .collect()
    }

    pub fn get_loan(&self, user: Address, index: u32) -> Option<Loan> {
        if index >= self.get_user_loan_count(user) {
            return None;
        }
        self.loans.get(&UserLoanIndex { borrower: user, index })
    }

    pub fn get_user_loan_count(&self, user: Address) -> u32 {
        self.user_loan_count.get(&user).unwrap_or(0)
    }

    pub fn loan_ratio_min(&self) -> u32 {
        self.loan_ratio_min.get().unwrap_or(0)
    }

    pub fn loan_ratio_max(&self) -> u32 {
        self.loan_ratio_max.get().unwrap_or(0)
    }

    pub fn get_price_feeder(&self) -> Address {
        self.price_feeder.get_or_revert_with(ProtocolError::ZeroPriceFeeder)
    }

    pub fn get_pause_admin(&self) -> Option<Address> {
        self.pause_admin.get()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get().unwrap_or(false)
    }

    pub fn get_total_borrowed(&self) -> U256 {
        self.total_borrowed.get().unwrap_or(U256::zero())
    }

    pub fn get_total_collateral(&self) -> U256 {
        self.total_collateral.get().unwrap_or(U256::zero())
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    pub fn get_settlement(&self) -> Address {
        self.settlement.get_or_revert_with(ProtocolError::ZeroSettlement)
    }

    pub fn get_loan_asset(&self) -> Address {
        self.loan_asset.get_or_revert_with(ProtocolError::ZeroLoanAsset)
    }

    pub fn get_amt(&self) -> Address {
        self.amt.get_or_revert_with(ProtocolError::ZeroAmt)
    }

    pub fn get_master(&self) -> Address {
        self.master.get_or_revert_with(ProtocolError::ZeroMaster)
    }

    // ========== Internal helpers ==========

    fn require_loan(&self, key: &UserLoanIndex) -> Loan {
        match self.get_loan(key.borrower, key.index) {
            Some(loan) => loan,
            None => self.env().revert(ProtocolError::InvalidLoanIndex),
        }
    }

    /// Swap-remove: the last loan moves into the removed slot
    fn remove_loan(&mut self, key: UserLoanIndex) {
        let borrower = key.borrower;
        let count = self.get_user_loan_count(borrower);
        if count == 0 || key.index >= count {
            return;
        }

        let last_index = count - 1;
        if key.index != last_index {
            let last_key = UserLoanIndex { borrower, index: last_index };
            if let Some(last_loan) = self.loans.get(&last_key) {
                self.loans.set(&key, last_loan);
            }
        }
        self.user_loan_count.set(&borrower, last_index);
    }

    fn validate_loan_ratio(&self, loan_ratio_min: u32, loan_ratio_max: u32) {
        if loan_ratio_min == 0 || loan_ratio_max == 0 {
            self.env().revert(ProtocolError::ZeroLoanRatio);
        }
        if loan_ratio_min > loan_ratio_max {
            self.env().revert(ProtocolError::LoanRatioRange);
        }
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotOwner);
        }
    }

    fn require_pause_admin(&self) {
        if self.pause_admin.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotPauseAdmin);
        }
    }

    fn require_not_paused(&self) {
        if self.is_paused() {
            self.env().revert(ProtocolError::Paused);
        }
    }
}
