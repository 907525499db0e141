//! Snapshot ledger token.
//!
//! CEP-18 compatible token whose balances and total supply can be read as of
//! any earlier snapshot. Used for AMT (holder dividends) and liqAMT
//! (liquidity-provider dividends); the settlement and loan assets in tests
//! are plain instances that are never snapshotted.
//!
//! History is recorded lazily: the first balance change after a snapshot
//! stores the pre-change value under the current snapshot id. Reading a
//! past id finds the first record with `record.id >= id`, falling back to
//! the live value when the account has not moved since.

use odra::prelude::*;
use odra::casper_types::{U256, Key};
use odra::casper_types::bytesrepr::ToBytes;
use crate::errors::ProtocolError;
use crate::types::{is_zero_address, SnapshotEntry};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

const CEP18_NAME_KEY: &str = "name";
const CEP18_SYMBOL_KEY: &str = "symbol";
const CEP18_DECIMALS_KEY: &str = "decimals";
const CEP18_TOTAL_SUPPLY_KEY: &str = "total_supply";
const CEP18_BALANCES_DICT: &str = "balances";
const CEP18_ALLOWANCES_DICT: &str = "allowances";

/// Emitted when tokens move, are minted (`from: None`) or burned (`to: None`)
#[odra::event]
pub struct Transfer {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub amount: U256,
}

/// Emitted on `approve` and allowance consumption
#[odra::event]
pub struct Approval {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Emitted when a new snapshot id is taken
#[odra::event]
pub struct Snapshot {
    pub id: u32,
}

#[odra::module(events = [Transfer, Approval, Snapshot])]
pub struct SnapshotToken {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    /// Allowance mapping (owner, spender) -> amount
    allowances: Mapping<(Address, Address), U256>,
    /// Mint, burn and snapshot authority
    owner: Var<Address>,
    /// Last snapshot id handed out, 0 before the first snapshot
    current_snapshot_id: Var<u32>,
    account_snapshot_count: Mapping<Address, u32>,
    account_snapshots: Mapping<(Address, u32), SnapshotEntry>,
    supply_snapshot_count: Var<u32>,
    supply_snapshots: Mapping<u32, SnapshotEntry>,
}

#[odra::module]
impl SnapshotToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name.clone());
        self.symbol.set(symbol.clone());
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.owner.set(self.env().caller());
        self.current_snapshot_id.set(0);
        self.env().init_dictionary(CEP18_BALANCES_DICT);
        self.env().init_dictionary(CEP18_ALLOWANCES_DICT);
        self.env().set_named_value(CEP18_NAME_KEY, name);
        self.env().set_named_value(CEP18_SYMBOL_KEY, symbol);
        self.env().set_named_value(CEP18_DECIMALS_KEY, decimals);
        self.env().set_named_value(CEP18_TOTAL_SUPPLY_KEY, U256::zero());
    }

    // ========== CEP-18 ==========

    pub fn name(&self) -> String {
        self.name.get().unwrap_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get().unwrap_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(18)
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get().unwrap_or(U256::zero())
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or(U256::zero())
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.approve_internal(owner, spender, amount);
        true
    }

    /// Transfer on behalf of `owner`, consuming the caller's allowance
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();

        let current_allowance = self.allowance(owner, spender);
        if current_allowance < amount {
            self.env().revert(ProtocolError::InsufficientAllowance);
        }

        self.transfer_internal(owner, recipient, amount);
        self.approve_internal(owner, spender, current_allowance - amount);
        true
    }

    // ========== Owner Functions ==========

    pub fn mint(&mut self, to: Address, amount: U256) {
        self.require_owner();
        if is_zero_address(&to) {
            self.env().revert(ProtocolError::MintToZeroAddress);
        }

        self.update_account_snapshot(to);
        self.update_supply_snapshot();

        let new_balance = self.balance_of(to) + amount;
        self.balances.set(&to, new_balance);
        self.set_balance_cep18(to, new_balance);

        let new_supply = self.total_supply() + amount;
        self.total_supply.set(new_supply);
        self.set_total_supply_cep18(new_supply);

        self.env().emit_event(Transfer { from: None, to: Some(to), amount });
    }

    pub fn burn(&mut self, from: Address, amount: U256) {
        self.require_owner();

        let current_balance = self.balance_of(from);
        if current_balance < amount {
            self.env().revert(ProtocolError::InsufficientBalance);
        }

        self.update_account_snapshot(from);
        self.update_supply_snapshot();

        let new_balance = current_balance - amount;
        self.balances.set(&from, new_balance);
        self.set_balance_cep18(from, new_balance);

        let new_supply = self.total_supply() - amount;
        self.total_supply.set(new_supply);
        self.set_total_supply_cep18(new_supply);

        self.env().emit_event(Transfer { from: Some(from), to: None, amount });
    }

    /// Take a new snapshot and return its id (1-based)
    pub fn snapshot(&mut self) -> u32 {
        self.require_owner();
        let id = self.get_current_snapshot_id() + 1;
        self.current_snapshot_id.set(id);
        self.env().emit_event(Snapshot { id });
        id
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.require_owner();
        if is_zero_address(&new_owner) {
            self.env().revert(ProtocolError::ZeroNewOwner);
        }
        self.owner.set(new_owner);
    }

    // ========== Snapshot Queries ==========

    pub fn get_current_snapshot_id(&self) -> u32 {
        self.current_snapshot_id.get().unwrap_or(0)
    }

    pub fn balance_of_at(&self, account: Address, snapshot_id: u32) -> U256 {
        self.require_valid_snapshot(snapshot_id);
        let count = self.account_snapshot_count.get(&account).unwrap_or(0);
        let recorded = find_recorded(count, snapshot_id, |i| {
            self.account_snapshots.get(&(account, i))
        });
        recorded.unwrap_or_else(|| self.balance_of(account))
    }

    pub fn total_supply_at(&self, snapshot_id: u32) -> U256 {
        self.require_valid_snapshot(snapshot_id);
        let count = self.supply_snapshot_count.get().unwrap_or(0);
        let recorded = find_recorded(count, snapshot_id, |i| self.supply_snapshots.get(&i));
        recorded.unwrap_or_else(|| self.total_supply())
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    // ========== Internal Functions ==========

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(ProtocolError::InsufficientBalance);
        }

        self.update_account_snapshot(from);
        self.update_account_snapshot(to);

        let new_from_balance = from_balance - amount;
        self.balances.set(&from, new_from_balance);
        self.set_balance_cep18(from, new_from_balance);

        let new_to_balance = self.balance_of(to) + amount;
        self.balances.set(&to, new_to_balance);
        self.set_balance_cep18(to, new_to_balance);

        self.env().emit_event(Transfer { from: Some(from), to: Some(to), amount });
    }

    fn approve_internal(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);
        self.set_allowance_cep18(owner, spender, amount);
        self.env().emit_event(Approval { owner, spender, amount });
    }

    fn update_account_snapshot(&mut self, account: Address) {
        let current_id = self.get_current_snapshot_id();
        if current_id == 0 {
            return;
        }
        let count = self.account_snapshot_count.get(&account).unwrap_or(0);
        if count > 0 {
            if let Some(last) = self.account_snapshots.get(&(account, count - 1)) {
                if last.id >= current_id {
                    return;
                }
            }
        }
        let entry = SnapshotEntry { id: current_id, value: self.balance_of(account) };
        self.account_snapshots.set(&(account, count), entry);
        self.account_snapshot_count.set(&account, count + 1);
    }

    fn update_supply_snapshot(&mut self) {
        let current_id = self.get_current_snapshot_id();
        if current_id == 0 {
            return;
        }
        let count = self.supply_snapshot_count.get().unwrap_or(0);
        if count > 0 {
            if let Some(last) = self.supply_snapshots.get(&(count - 1)) {
                if last.id >= current_id {
                    return;
                }
            }
        }
        let entry = SnapshotEntry { id: current_id, value: self.total_supply() };
        self.supply_snapshots.set(&count, entry);
        self.supply_snapshot_count.set(count + 1);
    }

    fn require_valid_snapshot(&self, snapshot_id: u32) {
        if snapshot_id == 0 || snapshot_id > self.get_current_snapshot_id() {
            self.env().revert(ProtocolError::InvalidSnapshotId);
        }
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotOwner);
        }
    }

    fn set_balance_cep18(&self, owner: Address, amount: U256) {
        let key = Self::cep18_balance_key(owner);
        self.env().set_dictionary_value(CEP18_BALANCES_DICT, key.as_bytes(), amount);
    }

    fn set_allowance_cep18(&self, owner: Address, spender: Address, amount: U256) {
        let key = Self::cep18_allowance_key(owner, spender);
        self.env().set_dictionary_value(CEP18_ALLOWANCES_DICT, key.as_bytes(), amount);
    }

    fn set_total_supply_cep18(&self, amount: U256) {
        self.env().set_named_value(CEP18_TOTAL_SUPPLY_KEY, amount);
    }

    fn cep18_balance_key(owner: Address) -> String {
        let key = Key::from(owner);
        let bytes = key.to_bytes().unwrap_or_default();
        BASE64_STANDARD.encode(bytes)
    }

    fn cep18_allowance_key(owner: Address, spender: Address) -> String {
        let owner_key = Key::from(owner);
        let spender_key = Key::from(spender);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&owner_key.to_bytes().unwrap_or_default());
        bytes.extend_from_slice(&spender_key.to_bytes().unwrap_or_default());
        BASE64_STANDARD.encode(bytes)
    }
}

/// Binary search over `count` ascending records for the first with id >= `snapshot_id`
fn find_recorded<F>(count: u32, snapshot_id: u32, entry_at: F) -> Option<U256>
where
    F: Fn(u32) -> Option<SnapshotEntry>,
{
    let mut low = 0u32;
    let mut high = count;
    while low < high {
        let mid = low + (high - low) / 2;
        match entry_at(mid) {
            Some(entry) if entry.id < snapshot_id => low = mid + 1,
            _ => high = mid,
        }
    }
    if low == count {
        return None;
    }
    entry_at(low).map(|entry| entry.value)
}
