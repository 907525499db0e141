use crate::fixtures::deploy_protocol;
use amt_protocol_contracts::errors::ProtocolError;
use amt_protocol_contracts::master::{LiquidityAdded, LiquidityLocked, LockReleased};
use amt_protocol_contracts::types::LiquidityLock;
use odra::casper_types::U256;
use odra::prelude::Addressable;
use odra::host::HostRef;
use pretty_assertions::assert_eq;

const LOCK_DURATION: u64 = 86_400_000;

fn units(n: u64) -> U256 {
    U256::from(n)
}

#[test]
fn test_add_liquidity_mints_pool_share() {
    let mut protocol = deploy_protocol();
    let alice = protocol.alice;

    let liquidity = protocol.provide_liquidity(alice, units(10_000), units(10_000));
    assert_eq!(liquidity, units(10_000));
    assert_eq!(protocol.liquidity_token.balance_of(alice), units(10_000));
    assert_eq!(protocol.pool.liquidity_of(protocol.master_address()), units(10_000));
    assert_eq!(protocol.amt.balance_of(protocol.pool.address().clone()), units(10_000));
    assert!(protocol.env.emitted_event(
        &protocol.master,
        LiquidityAdded {
            provider: alice,
            amt_amount: units(10_000),
            settlement_amount: units(10_000),
            liquidity: units(10_000),
        }
    ));
}

#[test]
fn test_add_liquidity_refunds_unused_amount() {
    let mut protocol = deploy_protocol();
    let (alice, bob) = (protocol.alice, protocol.bob);
    protocol.provide_liquidity(alice, units(10_000), units(1_000));

    // pool ratio is 10:1, so only 500 of bob's 700 settlement units are taken
    let liquidity = protocol.provide_liquidity(bob, units(5_000), units(700));
    assert_eq!(liquidity, protocol.liquidity_token.balance_of(bob));
    assert_eq!(protocol.amt.balance_of(bob), U256::zero());
    assert_eq!(protocol.settlement.balance_of(bob), units(200));
    assert_eq!(protocol.settlement.balance_of(protocol.master_address()), U256::zero());
}

#[test]
fn test_add_liquidity_preconditions() {
    let mut protocol = deploy_protocol();
    let alice = protocol.alice;
    protocol.mint_amt(alice, units(10));
    protocol.mint_settlement(alice, units(10));
    protocol.approve_master(alice, units(100), units(100));
    protocol.env.set_caller(alice);

    assert_eq!(
        protocol.master.try_add_liquidity(units(1), units(10)),
        Err(ProtocolError::AmtAmountTooSmall.into())
    );
    assert_eq!(
        protocol.master.try_add_liquidity(units(10), units(1)),
        Err(ProtocolError::SettlementAmountTooSmall.into())
    );
    assert_eq!(
        protocol.master.try_add_liquidity(units(11), units(10)),
        Err(ProtocolError::NotEnoughAmt.into())
    );
    assert_eq!(
        protocol.master.try_add_liquidity(units(10), units(11)),
        Err(ProtocolError::NotEnoughSettlement.into())
    );
}

#[test]
fn test_remove_liquidity_pays_both_assets() {
    let mut protocol = deploy_protocol();
    let alice = protocol.alice;
    protocol.provide_liquidity(alice, units(10_000), units(1_000));
    let liquidity = protocol.liquidity_token.balance_of(alice);

    protocol.env.set_caller(alice);
    assert_eq!(
        protocol.master.try_remove_liquidity(liquidity + U256::one()),
        Err(ProtocolError::NotEnoughLiquidityTokens.into())
    );

    let receipt = protocol.master.remove_liquidity(liquidity / U256::from(2u8));
    assert_eq!(receipt.amount_a, units(5_000));
    assert_eq!(receipt.amount_b, units(500));
    assert_eq!(protocol.amt.balance_of(alice), units(5_000));
    assert_eq!(protocol.settlement.balance_of(alice), units(500));
    assert_eq!(protocol.liquidity_token.balance_of(alice), liquidity - liquidity / U256::from(2u8));
    assert_eq!(
        protocol.pool.liquidity_of(protocol.master_address()),
        protocol.liquidity_token.total_supply()
    );
}

#[test]
fn test_payment_split_follows_pool_share() {
    let mut protocol = deploy_protocol();
    let alice = protocol.alice;
    protocol.mint_amt(alice, units(20_000));
    protocol.provide_liquidity(alice, units(10_000), units(10_000));

    // a third of the AMT supply sits in the pool
    protocol.pay_rent(units(1_000), 10);
    let payment = protocol.master.get_payment(1).unwrap();
    assert_eq!(payment.vault_amount, units(100));
    assert_eq!(payment.liquidity_portion, units(300));
    assert_eq!(payment.holder_portion, units(600));

    protocol.env.set_caller(alice);
    assert_eq!(protocol.master.liq_charge(1), units(300));
    assert_eq!(protocol.master.charge(1), units(400));
    assert!(protocol.master.is_liq_charged(alice, 1));
    assert_eq!(protocol.master.try_liq_charge(1), Err(ProtocolError::AlreadyCharged.into()));

    // the pool's AMT never claims, so its share ends up as dust
    protocol.env.set_caller(protocol.owner);
    assert_eq!(protocol.master.handle_dust(1), units(200));
    assert_eq!(
        protocol.master.try_liq_handle_dust(1),
        Err(ProtocolError::NothingToCollect.into())
    );
}

#[test]
fn test_liquidity_providers_share_pro_rata() {
    let mut protocol = deploy_protocol();
    let (alice, bob) = (protocol.alice, protocol.bob);
    protocol.provide_liquidity(alice, units(1_000), units(1_000));
    protocol.provide_liquidity(bob, units(2_000), units(2_000));

    // all AMT is in the pool
    protocol.pay_rent(units(1_000), 0);

    protocol.env.set_caller(alice);
    assert_eq!(protocol.master.liq_charge_from_to(1, 1), units(333));
    protocol.env.set_caller(bob);
    assert_eq!(protocol.master.liq_charge(1), units(666));

    protocol.env.set_caller(protocol.owner);
    assert_eq!(protocol.master.liq_handle_dust(1), units(1));
}

#[test]
fn test_liquidity_lock_lifecycle() {
    let mut protocol = deploy_protocol();
    let (owner, carol) = (protocol.owner, protocol.carol);
    protocol.mint_amt(owner, units(2_000));
    protocol.mint_settlement(owner, units(2_000));
    protocol.approve_master(owner, units(2_000), units(2_000));

    protocol.env.set_caller(owner);
    let liquidity = protocol
        .master
        .add_liquidity_locking(units(1_000), units(1_000), carol, LOCK_DURATION);
    assert_eq!(liquidity, units(1_000));

    let lock = protocol.master.get_liquidity_lock().unwrap();
    assert_eq!(
        lock,
        LiquidityLock {
            beneficiary: carol,
            release_time: lock.release_time,
            liquidity: units(1_000),
            amt_amount: units(1_000),
            settlement_amount: units(1_000),
            first_payment_id: 1,
            last_payment_id: None,
        }
    );
    assert_eq!(protocol.liquidity_token.balance_of(protocol.master_address()), units(1_000));
    assert!(protocol.env.emitted_event(
        &protocol.master,
        LiquidityLocked {
            beneficiary: carol,
            liquidity: units(1_000),
            release_time: lock.release_time,
        }
    ));

    assert_eq!(
        protocol
            .master
            .try_add_liquidity_locking(units(500), units(500), carol, LOCK_DURATION),
        Err(ProtocolError::LiquidityAlreadyLocked.into())
    );
    assert_eq!(
        protocol.master.try_release_locked_liquidity(),
        Err(ProtocolError::LockNotMatured.into())
    );

    protocol.env.advance_block_time(LOCK_DURATION);
    protocol.master.release_locked_liquidity();
    assert_eq!(protocol.liquidity_token.balance_of(carol), units(1_000));
    assert_eq!(protocol.liquidity_token.balance_of(protocol.master_address()), U256::zero());
    assert!(protocol.env.emitted_event(
        &protocol.master,
        LockReleased {
            beneficiary: carol,
            liquidity: units(1_000),
        }
    ));
    assert_eq!(
        protocol.master.try_release_locked_liquidity(),
        Err(ProtocolError::NoTokensToRelease.into())
    );

    // a released lock can be replaced
    protocol.master.add_liquidity_locking(units(500), units(500), carol, LOCK_DURATION);
    assert_eq!(protocol.master.get_liquidity_lock().unwrap().liquidity, units(500));
    assert_eq!(protocol.master.get_lock_count(), 2);
    assert_eq!(protocol.master.get_liquidity_lock_at(1).unwrap().last_payment_id, Some(0));
}

#[test]
fn test_locked_position_dividends_go_to_beneficiary() {
    let mut protocol = deploy_protocol();
    let (owner, carol) = (protocol.owner, protocol.carol);
    protocol.mint_amt(owner, units(2_000));
    protocol.mint_settlement(owner, units(1_000));
    protocol.approve_master(owner, units(1_000), units(1_000));

    protocol.env.set_caller(owner);
    assert_eq!(
        protocol.master.try_lock_charge_from_to(1, 1),
        Err(ProtocolError::NoLiquidityLock.into())
    );
    protocol
        .master
        .add_liquidity_locking(units(1_000), units(1_000), carol, LOCK_DURATION);

    // half the AMT supply is in the pool
    protocol.pay_rent(units(1_000), 0);
    assert_eq!(protocol.master.get_payment(1).unwrap().liquidity_portion, units(500));

    protocol.env.set_caller(protocol.alice);
    assert_eq!(protocol.master.lock_charge_from_to(1, 1), units(500));
    assert_eq!(protocol.settlement.balance_of(carol), units(500));
    assert!(protocol.master.is_liq_charged(protocol.master_address(), 1));
    assert_eq!(
        protocol.master.try_lock_charge_from_to(1, 1),
        Err(ProtocolError::AlreadyCharged.into())
    );
}

#[test]
fn test_released_lock_keeps_dividends_of_its_payments() {
    let mut protocol = deploy_protocol();
    let (owner, bob, carol) = (protocol.owner, protocol.bob, protocol.carol);
    protocol.mint_amt(owner, units(2_000));
    protocol.mint_settlement(owner, units(1_500));
    protocol.approve_master(owner, units(1_500), units(1_500));

    protocol.env.set_caller(owner);
    protocol
        .master
        .add_liquidity_locking(units(1_000), units(1_000), carol, LOCK_DURATION);
    protocol.pay_rent(units(1_000), 0);
    assert_eq!(protocol.master.get_payment(1).unwrap().liquidity_portion, units(500));

    protocol.env.advance_block_time(LOCK_DURATION);
    protocol.env.set_caller(owner);
    protocol.master.release_locked_liquidity();
    protocol
        .master
        .add_liquidity_locking(units(500), units(500), bob, LOCK_DURATION);
    let second = protocol.master.get_liquidity_lock().unwrap();
    assert_eq!(second.beneficiary, bob);
    assert_eq!(second.first_payment_id, 2);

    // payment 1 was earned while carol's lock held the liquidity
    assert_eq!(protocol.master.lock_charge_from_to(1, 1), units(500));
    assert_eq!(protocol.settlement.balance_of(carol), units(500));
    assert_eq!(protocol.settlement.balance_of(bob), U256::zero());

    protocol.pay_rent(units(1_000), 0);
    protocol.env.set_caller(owner);
    assert_eq!(
        protocol.master.try_lock_charge_from_to(1, 2),
        Err(ProtocolError::InvalidSnapshotRange.into())
    );
    let forwarded = protocol.master.lock_charge_from_to(2, 2);
    assert!(!forwarded.is_zero());
    assert_eq!(protocol.settlement.balance_of(bob), forwarded);
    assert_eq!(protocol.settlement.balance_of(carol), units(500));
}

#[test]
fn test_liquidity_lock_is_owner_only() {
    let mut protocol = deploy_protocol();
    let carol = protocol.carol;
    protocol.env.set_caller(protocol.alice);
    assert_eq!(
        protocol
            .master
            .try_add_liquidity_locking(units(1_000), units(1_000), carol, LOCK_DURATION),
        Err(ProtocolError::NotOwner.into())
    );

    protocol.env.set_caller(protocol.owner);
    assert_eq!(
        protocol.master.try_add_liquidity_locking(
            units(1_000),
            units(1_000),
            amt_protocol_contracts::types::zero_address(),
            LOCK_DURATION
        ),
        Err(ProtocolError::ZeroBeneficiary.into())
    );
}
