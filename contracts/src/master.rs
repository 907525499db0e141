//! Master Contract
//!
//! Dividend ledger and liquidity manager of the AMT system. Master owns
//! the mint authority of both snapshot ledgers:
//! - AMT: holders are paid out of each payment's `holder_portion`
//! - liqAMT: liquidity providers are paid out of `liquidity_portion`
//!
//! Every rent payment takes one snapshot on each ledger; the payment id is
//! that snapshot id. A holder's share of payment `i` is
//! `balance_of_at(holder, i) * portion(i) / total_supply_at(i)`, floored.
//! The flooring leaves dust, which the owner collects once per payment.
//!
//! Master also holds the pool liquidity backing liqAMT one to one, and can
//! keep a single time-locked liquidity position on behalf of a beneficiary.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::ProtocolError;
use crate::interfaces::{Cep18TokenContractRef, MarketPoolRouterContractRef, SnapshotLedgerContractRef};
use crate::math;
use crate::types::{is_zero_address, DividendStream, LiquidityLock, LiquidityReceipt, Payment};

/// Payments must be strictly larger than this
pub const MIN_PAYMENT: u64 = 100;

/// Maximum vault participation, in percent
pub const MAX_VAULT_PARTICIPATION: u8 = 100;

/// Smallest amount of either asset accepted for a liquidity deposit
pub const MIN_LIQUIDITY_AMOUNT: u64 = 2;

#[odra::event]
pub struct RentPaid {
    pub id: u32,
    pub amount: U256,
    pub vault_amount: U256,
    pub holder_portion: U256,
    pub liquidity_portion: U256,
}

#[odra::event]
pub struct DividendCharged {
    pub holder: Address,
    pub recipient: Address,
    pub stream: DividendStream,
    pub from_id: u32,
    pub to_id: u32,
    pub amount: U256,
}

#[odra::event]
pub struct DustCollected {
    pub id: u32,
    pub stream: DividendStream,
    pub amount: U256,
}

#[odra::event]
pub struct LiquidityAdded {
    pub provider: Address,
    pub amt_amount: U256,
    pub settlement_amount: U256,
    pub liquidity: U256,
}

#[odra::event]
pub struct LiquidityRemoved {
    pub provider: Address,
    pub amt_amount: U256,
    pub settlement_amount: U256,
    pub liquidity: U256,
}

#[odra::event]
pub struct LiquidityLocked {
    pub beneficiary: Address,
    pub liquidity: U256,
    pub release_time: u64,
}

#[odra::event]
pub struct LockReleased {
    pub beneficiary: Address,
    pub liquidity: U256,
}

#[odra::module(events = [
    RentPaid,
    DividendCharged,
    DustCollected,
    LiquidityAdded,
    LiquidityRemoved,
    LiquidityLocked,
    LockReleased
])]
pub struct Master {
    owner: Var<Address>,
    /// AMT snapshot ledger
    amt: Var<Address>,
    /// Asset payments are made in
    settlement: Var<Address>,
    /// Receiver of the vault participation share
    burn_vault: Var<Address>,
    /// liqAMT snapshot ledger
    liquidity_token: Var<Address>,
    /// Only account allowed to pay rent
    payer_wallet: Var<Address>,
    /// AMT/settlement market pool
    pool: Var<Address>,
    /// Payments by id (== snapshot id)
    payments: Mapping<u32, Payment>,
    /// Last payment id, 0 before the first payment
    payment_count: Var<u32>,
    /// (holder, payment id) -> charged from holder_portion
    holder_charged: Mapping<(Address, u32), bool>,
    /// (provider, payment id) -> charged from liquidity_portion
    liquidity_charged: Mapping<(Address, u32), bool>,
    /// Every lock ever created, 1-based; the last one is the current lock
    liquidity_locks: Mapping<u32, LiquidityLock>,
    lock_count: Var<u32>,
}

#[odra::module]
impl Master {
    pub fn init(
        &mut self,
        amt: Address,
        settlement: Address,
        burn_vault: Address,
        liquidity_token: Address,
        payer_wallet: Address,
        pool: Address,
    ) {
        if is_zero_address(&amt) {
            self.env().revert(ProtocolError::ZeroAmt);
        }
        if is_zero_address(&settlement) {
            self.env().revert(ProtocolError::ZeroSettlement);
        }
        if is_zero_address(&burn_vault) {
            self.env().revert(ProtocolError::ZeroBurnVault);
        }
        if is_zero_address(&liquidity_token) {
            self.env().revert(ProtocolError::ZeroLiquidityToken);
        }
        if is_zero_address(&payer_wallet) {
            self.env().revert(ProtocolError::ZeroPayerWallet);
        }
        if is_zero_address(&pool) {
            self.env().revert(ProtocolError::ZeroPool);
        }

        self.owner.set(self.env().caller());
        self.amt.set(amt);
        self.settlement.set(settlement);
        self.burn_vault.set(burn_vault);
        self.liquidity_token.set(liquidity_token);
        self.payer_wallet.set(payer_wallet);
        self.pool.set(pool);
        self.payment_count.set(0);
    }

    // ========== Payments ==========

    /// Register a rent payment of `amount` settlement asset from the payer wallet.
    ///
    /// `vault_participation` percent goes to the burn vault; the rest is
    /// split between liquidity providers (by the pool's share of the AMT
    /// supply) and holders. Returns the new payment id.
    #[odra(non_reentrant)]
    pub fn pay_rent(&mut self, amount: U256, vault_participation: u8) -> u32 {
        let payer = self.env().caller();
        if Some(payer) != self.payer_wallet.get() {
            self.env().revert(ProtocolError::NotPayerWallet);
        }
        if amount <= U256::from(MIN_PAYMENT) {
            self.env().revert(ProtocolError::AmountTooSmall);
        }
        if vault_participation > MAX_VAULT_PARTICIPATION {
            self.env().revert(ProtocolError::ParticipationTooHigh);
        }

        let settlement = self.get_settlement();
        if Cep18TokenContractRef::new(self.env(), settlement).balance_of(payer) < amount {
            self.env().revert(ProtocolError::InsufficientSettlementBalance);
        }

        let amt_token = Cep18TokenContractRef::new(self.env(), self.get_amt());
        let liquidity_token = Cep18TokenContractRef::new(self.env(), self.get_liquidity_token());
        let split = math::split_payment(
            amount,
            vault_participation,
            amt_token.balance_of(self.get_pool()),
            amt_token.total_supply(),
            liquidity_token.total_supply(),
        )
        .unwrap_or_revert(&self.env());

        let id = self.get_current_snapshot_id() + 1;
        let amt_snapshot = SnapshotLedgerContractRef::new(self.env(), self.get_amt()).snapshot();
        let liquidity_snapshot =
            SnapshotLedgerContractRef::new(self.env(), self.get_liquidity_token()).snapshot();
        if amt_snapshot != id || liquidity_snapshot != id {
            self.env().revert(ProtocolError::SnapshotOutOfSync);
        }

        self.payments.set(
            &id,
            Payment {
                id,
                total_amount: amount,
                vault_amount: split.vault_amount,
                holder_portion: split.holder_portion,
                liquidity_portion: split.liquidity_portion,
                claimed_by_holders: U256::zero(),
                claimed_by_liquidity_providers: U256::zero(),
            },
        );
        self.payment_count.set(id);

        let master = self.env().self_address();
        let mut settlement_token = Cep18TokenContractRef::new(self.env(), settlement);
        settlement_token.transfer_from(payer, master, amount);
        if !split.vault_amount.is_zero() {
            settlement_token.transfer(self.get_burn_vault(), split.vault_amount);
        }

        self.env().emit_event(RentPaid {
            id,
            amount,
            vault_amount: split.vault_amount,
            holder_portion: split.holder_portion,
            liquidity_portion: split.liquidity_portion,
        });
        id
    }

    // ========== Holder Dividends ==========

    /// Claim the caller's AMT dividend for payment `id`
    #[odra(non_reentrant)]
    pub fn charge(&mut self, id: u32) -> U256 {
        let holder = self.env().caller();
        let amount = self.charge_range(DividendStream::Holders, holder, id, id);
        if amount.is_zero() {
            self.env().revert(ProtocolError::NothingToCharge);
        }
        self.pay_dividend(DividendStream::Holders, holder, holder, id, id, amount);
        amount
    }

    /// Claim the caller's AMT dividends for payments `from..=to`
    #[odra(non_reentrant)]
    pub fn charge_from_to(&mut self, from: u32, to: u32) -> U256 {
        let holder = self.env().caller();
        let amount = self.charge_range(DividendStream::Holders, holder, from, to);
        if amount.is_zero() {
            self.env().revert(ProtocolError::NothingToTransfer);
        }
        self.pay_dividend(DividendStream::Holders, holder, holder, from, to, amount);
        amount
    }

    /// Collect what holders left unclaimed on payment `id` (owner only)
    #[odra(non_reentrant)]
    pub fn handle_dust(&mut self, id: u32) -> U256 {
        self.collect_dust(DividendStream::Holders, id)
    }

    // ========== Liquidity Dividends ==========

    /// Claim the caller's liqAMT dividend for payment `id`
    #[odra(non_reentrant)]
    pub fn liq_charge(&mut self, id: u32) -> U256 {
        let provider = self.env().caller();
        let amount = self.charge_range(DividendStream::LiquidityProviders, provider, id, id);
        if amount.is_zero() {
            self.env().revert(ProtocolError::NothingToCharge);
        }
        self.pay_dividend(DividendStream::LiquidityProviders, provider, provider, id, id, amount);
        amount
    }

    /// Claim the caller's liqAMT dividends for payments `from..=to`
    #[odra(non_reentrant)]
    pub fn liq_charge_from_to(&mut self, from: u32, to: u32) -> U256 {
        let provider = self.env().caller();
        let amount = self.charge_range(DividendStream::LiquidityProviders, provider, from, to);
        if amount.is_zero() {
            self.env().revert(ProtocolError::NothingToTransfer);
        }
        self.pay_dividend(DividendStream::LiquidityProviders, provider, provider, from, to, amount);
        amount
    }

    /// Collect what liquidity providers left unclaimed on payment `id` (owner only)
    #[odra(non_reentrant)]
    pub fn liq_handle_dust(&mut self, id: u32) -> U256 {
        self.collect_dust(DividendStream::LiquidityProviders, id)
    }

    // ========== Liquidity ==========

    /// Deposit AMT and settlement asset into the pool and receive liqAMT.
    ///
    /// The caller must have approved Master for both amounts. Amounts the
    /// pool does not take at its current ratio are refunded.
    #[odra(non_reentrant)]
    pub fn add_liquidity(&mut self, amt_amount: U256, settlement_amount: U256) -> U256 {
        let provider = self.env().caller();
        let receipt = self.provide_liquidity(provider, amt_amount, settlement_amount);
        SnapshotLedgerContractRef::new(self.env(), self.get_liquidity_token())
            .mint(provider, receipt.liquidity);

        self.env().emit_event(LiquidityAdded {
            provider,
            amt_amount: receipt.amount_a,
            settlement_amount: receipt.amount_b,
            liquidity: receipt.liquidity,
        });
        receipt.liquidity
    }

    /// Burn `liquidity` liqAMT and withdraw the matching pool share
    #[odra(non_reentrant)]
    pub fn remove_liquidity(&mut self, liquidity: U256) -> LiquidityReceipt {
        let provider = self.env().caller();
        let liquidity_token = self.get_liquidity_token();
        let held = Cep18TokenContractRef::new(self.env(), liquidity_token).balance_of(provider);
        if liquidity.is_zero() || held < liquidity {
            self.env().revert(ProtocolError::NotEnoughLiquidityTokens);
        }

        SnapshotLedgerContractRef::new(self.env(), liquidity_token).burn(provider, liquidity);
        let receipt = MarketPoolRouterContractRef::new(self.env(), self.get_pool()).remove_liquidity(
            self.get_amt(),
            self.get_settlement(),
            liquidity,
            provider,
        );

        self.env().emit_event(LiquidityRemoved {
            provider,
            amt_amount: receipt.amount_a,
            settlement_amount: receipt.amount_b,
            liquidity,
        });
        receipt
    }

    /// Add liquidity from the owner's funds and keep the liqAMT in escrow
    /// for `beneficiary` until `lock_duration` of block time has passed.
    #[odra(non_reentrant)]
    pub fn add_liquidity_locking(
        &mut self,
        amt_amount: U256,
        settlement_amount: U256,
        beneficiary: Address,
        lock_duration: u64,
    ) -> U256 {
        self.require_owner();
        if is_zero_address(&beneficiary) {
            self.env().revert(ProtocolError::ZeroBeneficiary);
        }
        if let Some(lock) = self.get_liquidity_lock() {
            if !lock.liquidity.is_zero() {
                self.env().revert(ProtocolError::LiquidityAlreadyLocked);
            }
        }

        let depositor = self.env().caller();
        let receipt = self.provide_liquidity(depositor, amt_amount, settlement_amount);
        let release_time = self.env().get_block_time() + lock_duration;
        let lock_id = self.get_lock_count() + 1;
        self.liquidity_locks.set(
            &lock_id,
            LiquidityLock {
                beneficiary,
                release_time,
                liquidity: receipt.liquidity,
                amt_amount: receipt.amount_a,
                settlement_amount: receipt.amount_b,
                first_payment_id: self.get_current_snapshot_id() + 1,
                last_payment_id: None,
            },
        );
        self.lock_count.set(lock_id);
        SnapshotLedgerContractRef::new(self.env(), self.get_liquidity_token())
            .mint(self.env().self_address(), receipt.liquidity);

        self.env().emit_event(LiquidityLocked {
            beneficiary,
            liquidity: receipt.liquidity,
            release_time,
        });
        receipt.liquidity
    }

    /// Hand the locked liqAMT to the beneficiary once the lock has matured
    #[odra(non_reentrant)]
    pub fn release_locked_liquidity(&mut self) {
        let lock_id = self.get_lock_count();
        let mut lock = self.require_lock(lock_id);
        if self.env().get_block_time() < lock.release_time {
            self.env().revert(ProtocolError::LockNotMatured);
        }
        if lock.liquidity.is_zero() {
            self.env().revert(ProtocolError::NoTokensToRelease);
        }

        let liquidity = lock.liquidity;
        lock.liquidity = U256::zero();
        lock.last_payment_id = Some(self.get_current_snapshot_id());
        let beneficiary = lock.beneficiary;
        self.liquidity_locks.set(&lock_id, lock);

        Cep18TokenContractRef::new(self.env(), self.get_liquidity_token())
            .transfer(beneficiary, liquidity);
        self.env().emit_event(LockReleased { beneficiary, liquidity });
    }

    /// Forward the liquidity dividends earned by a locked position over
    /// payments `from..=to` to its beneficiary.
    ///
    /// The range must fall within a single lock's lifetime; those ids are
    /// paid to that lock's beneficiary even after it was released.
    #[odra(non_reentrant)]
    pub fn lock_charge_from_to(&mut self, from: u32, to: u32) -> U256 {
        let lock = self.lock_covering(from, to);
        let master = self.env().self_address();
        let amount = self.charge_range(DividendStream::LiquidityProviders, master, from, to);
        if amount.is_zero() {
            self.env().revert(ProtocolError::NothingToTransfer);
        }
        self.pay_dividend(
            DividendStream::LiquidityProviders,
            master,
            lock.beneficiary,
            from,
            to,
            amount,
        );
        amount
    }

    // ========== Admin Functions ==========

    /// Set Master's AMT and settlement allowance for the pool (owner only)
    pub fn extend_approve(&mut self, amount: U256) {
        self.require_owner();
        let pool = self.get_pool();
        Cep18TokenContractRef::new(self.env(), self.get_amt()).approve(pool, amount);
        Cep18TokenContractRef::new(self.env(), self.get_settlement()).approve(pool, amount);
    }

    pub fn set_payer_wallet(&mut self, payer_wallet: Address) {
        self.require_owner();
        if is_zero_address(&payer_wallet) {
            self.env().revert(ProtocolError::ZeroPayerWallet);
        }
        self.payer_wallet.set(payer_wallet);
    }

    /// Mint AMT (owner only)
    pub fn mint_master(&mut self, to: Address, amount: U256) {
        self.require_owner();
        if is_zero_address(&to) {
            self.env().revert(ProtocolError::MintToZeroAddress);
        }
        SnapshotLedgerContractRef::new(self.env(), self.get_amt()).mint(to, amount);
    }

    // ========== Views ==========

    pub fn get_payment(&self, id: u32) -> Option<Payment> {
        self.payments.get(&id)
    }

    pub fn get_current_snapshot_id(&self) -> u32 {
        self.payment_count.get().unwrap_or(0)
    }

    pub fn is_charged(&self, holder: Address, id: u32) -> bool {
        self.holder_charged.get(&(holder, id)).unwrap_or(false)
    }

    pub fn is_liq_charged(&self, provider: Address, id: u32) -> bool {
        self.liquidity_charged.get(&(provider, id)).unwrap_or(false)
    }

    /// The most recent lock
    pub fn get_liquidity_lock(&self) -> Option<LiquidityLock> {
        self.liquidity_locks.get(&self.get_lock_count())
    }

    pub fn get_liquidity_lock_at(&self, lock_id: u32) -> Option<LiquidityLock> {
        self.liquidity_locks.get(&lock_id)
    }

    pub fn get_lock_count(&self) -> u32 {
        self.lock_count.get().unwrap_or(0)
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    pub fn get_payer_wallet(&self) -> Option<Address> {
        self.payer_wallet.get()
    }

    pub fn get_amt(&self) -> Address {
        self.amt.get_or_revert_with(ProtocolError::ZeroAmt)
    }

    pub fn get_settlement(&self) -> Address {
        self.settlement.get_or_revert_with(ProtocolError::ZeroSettlement)
    }

    pub fn get_liquidity_token(&self) -> Address {
        self.liquidity_token.get_or_revert_with(ProtocolError::ZeroLiquidityToken)
    }

    pub fn get_pool(&self) -> Address {
        self.pool.get_or_revert_with(ProtocolError::ZeroPool)
    }

    pub fn get_burn_vault(&self) -> Address {
        self.burn_vault.get_or_revert_with(ProtocolError::ZeroBurnVault)
    }

    // ========== Internal helpers ==========

    /// Book `holder`'s share of payments `from..=to` on `stream` and return the total
    fn charge_range(&mut self, stream: DividendStream, holder: Address, from: u32, to: u32) -> U256 {
        if from == 0 || from > to || to > self.get_current_snapshot_id() {
            self.env().revert(ProtocolError::InvalidSnapshotRange);
        }

        let ledger = match stream {
            DividendStream::Holders => self.get_amt(),
            DividendStream::LiquidityProviders => self.get_liquidity_token(),
        };
        let ledger = SnapshotLedgerContractRef::new(self.env(), ledger);

        let mut total = U256::zero();
        for id in from..=to {
            if self.charged(stream, holder, id) {
                self.env().revert(ProtocolError::AlreadyCharged);
            }

            let mut payment = self.require_payment(id);
            let (portion, claimed) = match stream {
                DividendStream::Holders => (payment.holder_portion, payment.claimed_by_holders),
                DividendStream::LiquidityProviders => {
                    (payment.liquidity_portion, payment.claimed_by_liquidity_providers)
                }
            };
            let share = math::dividend_share(
                ledger.balance_of_at(holder, id),
                portion,
                ledger.total_supply_at(id),
            )
            .unwrap_or_revert(&self.env());
            if claimed + share > portion {
                self.env().revert(ProtocolError::PaymentOverclaimed);
            }

            match stream {
                DividendStream::Holders => payment.claimed_by_holders = claimed + share,
                DividendStream::LiquidityProviders => {
                    payment.claimed_by_liquidity_providers = claimed + share
                }
            }
            self.payments.set(&id, payment);
            self.mark_charged(stream, holder, id);
            total += share;
        }
        total
    }

    fn pay_dividend(
        &mut self,
        stream: DividendStream,
        holder: Address,
        recipient: Address,
        from_id: u32,
        to_id: u32,
        amount: U256,
    ) {
        Cep18TokenContractRef::new(self.env(), self.get_settlement()).transfer(recipient, amount);
        self.env().emit_event(DividendCharged {
            holder,
            recipient,
            stream,
            from_id,
            to_id,
            amount,
        });
    }

    fn collect_dust(&mut self, stream: DividendStream, id: u32) -> U256 {
        self.require_owner();
        let mut payment = self.require_payment(id);
        let remainder = match stream {
            DividendStream::Holders => payment.unclaimed_holder_portion(),
            DividendStream::LiquidityProviders => payment.unclaimed_liquidity_portion(),
        };
        if remainder.is_zero() {
            self.env().revert(ProtocolError::NothingToCollect);
        }

        match stream {
            DividendStream::Holders => payment.claimed_by_holders += remainder,
            DividendStream::LiquidityProviders => payment.claimed_by_liquidity_providers += remainder,
        }
        self.payments.set(&id, payment);

        let owner = self.env().caller();
        Cep18TokenContractRef::new(self.env(), self.get_settlement()).transfer(owner, remainder);
        self.env().emit_event(DustCollected { id, stream, amount: remainder });
        remainder
    }

    /// Pull both assets from `depositor`, add them to the pool on Master's
    /// behalf and refund whatever the pool did not take
    fn provide_liquidity(
        &mut self,
        depositor: Address,
        amt_amount: U256,
        settlement_amount: U256,
    ) -> LiquidityReceipt {
        if amt_amount < U256::from(MIN_LIQUIDITY_AMOUNT) {
            self.env().revert(ProtocolError::AmtAmountTooSmall);
        }
        if settlement_amount < U256::from(MIN_LIQUIDITY_AMOUNT) {
            self.env().revert(ProtocolError::SettlementAmountTooSmall);
        }

        let amt = self.get_amt();
        let settlement = self.get_settlement();
        let pool = self.get_pool();
        let master = self.env().self_address();
        let mut amt_token = Cep18TokenContractRef::new(self.env(), amt);
        let mut settlement_token = Cep18TokenContractRef::new(self.env(), settlement);

        if amt_token.balance_of(depositor) < amt_amount {
            self.env().revert(ProtocolError::NotEnoughAmt);
        }
        if settlement_token.balance_of(depositor) < settlement_amount {
            self.env().revert(ProtocolError::NotEnoughSettlement);
        }

        amt_token.transfer_from(depositor, master, amt_amount);
        settlement_token.transfer_from(depositor, master, settlement_amount);
        amt_token.approve(pool, amt_amount);
        settlement_token.approve(pool, settlement_amount);

        let receipt = MarketPoolRouterContractRef::new(self.env(), pool).add_liquidity(
            amt,
            settlement,
            amt_amount,
            settlement_amount,
            master,
        );

        if receipt.amount_a < amt_amount {
            amt_token.transfer(depositor, amt_amount - receipt.amount_a);
            amt_token.approve(pool, U256::zero());
        }
        if receipt.amount_b < settlement_amount {
            settlement_token.transfer(depositor, settlement_amount - receipt.amount_b);
            settlement_token.approve(pool, U256::zero());
        }
        receipt
    }

    fn charged(&self, stream: DividendStream, holder: Address, id: u32) -> bool {
        match stream {
            DividendStream::Holders => self.is_charged(holder, id),
            DividendStream::LiquidityProviders => self.is_liq_charged(holder, id),
        }
    }

    fn mark_charged(&mut self, stream: DividendStream, holder: Address, id: u32) {
        match stream {
            DividendStream::Holders => self.holder_charged.set(&(holder, id), true),
            DividendStream::LiquidityProviders => self.liquidity_charged.set(&(holder, id), true),
        }
    }

    fn require_payment(&self, id: u32) -> Payment {
        match self.payments.get(&id) {
            Some(payment) => payment,
            None => self.env().revert(ProtocolError::PaymentNotFound),
        }
    }

    fn require_lock(&self, lock_id: u32) -> LiquidityLock {
        match self.liquidity_locks.get(&lock_id) {
            Some(lock) => lock,
            None => self.env().revert(ProtocolError::NoLiquidityLock),
        }
    }

    /// The lock that held Master's liqAMT over payments `from..=to`
    fn lock_covering(&self, from: u32, to: u32) -> LiquidityLock {
        let count = self.get_lock_count();
        if count == 0 {
            self.env().revert(ProtocolError::NoLiquidityLock);
        }
        for lock_id in (1..=count).rev() {
            let lock = self.require_lock(lock_id);
            if lock.covers(from, to) {
                return lock;
            }
            if lock.first_payment_id <= from {
                break;
            }
        }
        self.env().revert(ProtocolError::InvalidSnapshotRange)
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotOwner);
        }
    }
}
