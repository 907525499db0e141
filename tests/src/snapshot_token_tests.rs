use amt_protocol_contracts::errors::ProtocolError;
use amt_protocol_contracts::snapshot_token::{Snapshot, SnapshotToken, SnapshotTokenInitArgs, Transfer};
use odra::casper_types::U256;
use odra::host::Deployer;
use pretty_assertions::assert_eq;

fn deploy() -> (odra::host::HostEnv, amt_protocol_contracts::snapshot_token::SnapshotTokenHostRef) {
    let env = odra_test::env();
    let token = SnapshotToken::deploy(
        &env,
        SnapshotTokenInitArgs {
            name: "AMT".to_string(),
            symbol: "AMT".to_string(),
            decimals: 18,
        },
    );
    (env, token)
}

#[test]
fn test_metadata() {
    let (env, token) = deploy();
    assert_eq!(token.name(), "AMT".to_string());
    assert_eq!(token.symbol(), "AMT".to_string());
    assert_eq!(token.decimals(), 18);
    assert_eq!(token.total_supply(), U256::zero());
    assert_eq!(token.get_owner(), Some(env.get_account(0)));
    assert_eq!(token.get_current_snapshot_id(), 0);
}

#[test]
fn test_history_ignores_later_changes() {
    let (env, mut token) = deploy();
    let alice = env.get_account(1);
    let bob = env.get_account(2);

    token.mint(alice, U256::from(100u64));
    assert_eq!(token.snapshot(), 1);

    token.mint(alice, U256::from(50u64));
    env.set_caller(alice);
    token.transfer(bob, U256::from(30u64));

    env.set_caller(env.get_account(0));
    assert_eq!(token.snapshot(), 2);
    token.burn(bob, U256::from(10u64));

    assert_eq!(token.balance_of_at(alice, 1), U256::from(100u64));
    assert_eq!(token.balance_of_at(bob, 1), U256::zero());
    assert_eq!(token.total_supply_at(1), U256::from(100u64));

    assert_eq!(token.balance_of_at(alice, 2), U256::from(120u64));
    assert_eq!(token.balance_of_at(bob, 2), U256::from(30u64));
    assert_eq!(token.total_supply_at(2), U256::from(150u64));

    assert_eq!(token.balance_of(bob), U256::from(20u64));
    assert_eq!(token.total_supply(), U256::from(140u64));
    assert!(env.emitted_event(&token, Snapshot { id: 2 }));
}

#[test]
fn test_untouched_account_reads_live_balance() {
    let (env, mut token) = deploy();
    let alice = env.get_account(1);

    token.mint(alice, U256::from(7u64));
    token.snapshot();
    token.snapshot();
    token.snapshot();

    assert_eq!(token.balance_of_at(alice, 1), U256::from(7u64));
    assert_eq!(token.balance_of_at(alice, 3), U256::from(7u64));
}

#[test]
fn test_snapshot_id_bounds() {
    let (_env, mut token) = deploy();
    assert_eq!(token.try_total_supply_at(1), Err(ProtocolError::InvalidSnapshotId.into()));

    token.snapshot();
    assert_eq!(token.try_total_supply_at(0), Err(ProtocolError::InvalidSnapshotId.into()));
    assert_eq!(token.try_total_supply_at(2), Err(ProtocolError::InvalidSnapshotId.into()));
    assert_eq!(token.try_total_supply_at(1), Ok(U256::zero()));
}

#[test]
fn test_owner_gated_supply() {
    let (env, mut token) = deploy();
    let alice = env.get_account(1);

    env.set_caller(alice);
    assert_eq!(token.try_mint(alice, U256::one()), Err(ProtocolError::NotOwner.into()));
    assert_eq!(token.try_snapshot(), Err(ProtocolError::NotOwner.into()));

    env.set_caller(env.get_account(0));
    token.transfer_ownership(alice);
    assert_eq!(token.try_mint(alice, U256::one()), Err(ProtocolError::NotOwner.into()));

    env.set_caller(alice);
    token.mint(alice, U256::one());
    assert!(env.emitted_event(
        &token,
        Transfer {
            from: None,
            to: Some(alice),
            amount: U256::one(),
        }
    ));
}

#[test]
fn test_transfer_from_spends_allowance() {
    let (env, mut token) = deploy();
    let alice = env.get_account(1);
    let bob = env.get_account(2);
    token.mint(alice, U256::from(100u64));

    env.set_caller(alice);
    token.approve(bob, U256::from(40u64));

    env.set_caller(bob);
    assert_eq!(
        token.try_transfer_from(alice, bob, U256::from(41u64)),
        Err(ProtocolError::InsufficientAllowance.into())
    );
    token.transfer_from(alice, bob, U256::from(40u64));

    assert_eq!(token.allowance(alice, bob), U256::zero());
    assert_eq!(token.balance_of(bob), U256::from(40u64));
    assert_eq!(
        token.try_transfer(alice, U256::from(41u64)),
        Err(ProtocolError::InsufficientBalance.into())
    );
}
