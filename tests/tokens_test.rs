//! mCSPR token tests: metadata, controlled mint/burn, allowances.

use odra::prelude::*;
use odra::host::{Deployer, HostRef};
use odra::casper_types::U256;

use magni_vault::tokens::{MCSPRToken, MCSPRTokenHostRef, MCSPRTokenInitArgs};

fn wad(tokens: u64) -> U256 {
    U256::from(tokens) * U256::from(1_000_000_000_000_000_000u128)
}

fn deploy_token(env: &odra::host::HostEnv) -> MCSPRTokenHostRef {
    let minter = env.get_account(0);
    env.set_caller(minter);
    MCSPRToken::deploy(env, MCSPRTokenInitArgs { minter })
}

#[test]
fn test_token_metadata() {
    let env = odra_test::env();
    let token = deploy_token(&env);

    assert_eq!(token.name(), "Magni CSPR");
    assert_eq!(token.symbol(), "mCSPR");
    assert_eq!(token.decimals(), 18);
    assert_eq!(token.total_supply(), U256::zero());
    assert_eq!(token.minter(), Some(env.get_account(0)));
}

#[test]
fn test_mint_by_minter() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let minter = env.get_account(0);
    let user = env.get_account(1);

    env.set_caller(minter);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.mint(user, wad(100));

    assert_eq!(token_mut.balance_of(user), wad(100));
    assert_eq!(token_mut.total_supply(), wad(100));
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_mint_by_non_minter_reverts() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.mint(user, wad(100));
}

#[test]
fn test_burn_by_minter() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let minter = env.get_account(0);
    let user = env.get_account(1);

    env.set_caller(minter);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.mint(user, wad(100));
    token_mut.burn(user, wad(40));

    assert_eq!(token_mut.balance_of(user), wad(60));
    assert_eq!(token_mut.total_supply(), wad(60));
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_burn_by_non_minter_reverts() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let minter = env.get_account(0);
    let user = env.get_account(1);

    env.set_caller(minter);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.mint(user, wad(100));

    env.set_caller(user);
    token_mut.burn(user, wad(100));
}

#[test]
fn test_transfer() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let minter = env.get_account(0);
    let user = env.get_account(1);
    let recipient = env.get_account(2);

    env.set_caller(minter);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.mint(user, wad(100));

    env.set_caller(user);
    token_mut.transfer(recipient, wad(30));

    assert_eq!(token_mut.balance_of(user), wad(70));
    assert_eq!(token_mut.balance_of(recipient), wad(30));
}

#[test]
fn test_approve_and_transfer_from() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let minter = env.get_account(0);
    let user = env.get_account(1);
    let spender = env.get_account(2);

    env.set_caller(minter);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.mint(user, wad(100));

    env.set_caller(user);
    token_mut.approve(spender, wad(50));
    assert_eq!(token_mut.allowance(user, spender), wad(50));

    env.set_caller(spender);
    token_mut.transfer_from(user, spender, wad(50));

    assert_eq!(token_mut.balance_of(user), wad(50));
    assert_eq!(token_mut.balance_of(spender), wad(50));
    assert_eq!(token_mut.allowance(user, spender), U256::zero());
}

#[test]
#[should_panic(expected = "InsufficientAllowance")]
fn test_transfer_from_beyond_allowance_reverts() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let minter = env.get_account(0);
    let user = env.get_account(1);
    let spender = env.get_account(2);

    env.set_caller(minter);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.mint(user, wad(100));

    env.set_caller(user);
    token_mut.approve(spender, wad(10));

    env.set_caller(spender);
    token_mut.transfer_from(user, spender, wad(50));
}

#[test]
fn test_increase_and_decrease_allowance() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let user = env.get_account(1);
    let spender = env.get_account(2);

    env.set_caller(user);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.approve(spender, wad(50));
    token_mut.increase_allowance(spender, wad(25));
    assert_eq!(token_mut.allowance(user, spender), wad(75));

    token_mut.decrease_allowance(spender, wad(25));
    assert_eq!(token_mut.allowance(user, spender), wad(50));
}

#[test]
fn test_set_minter_hands_over_control() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let old_minter = env.get_account(0);
    let new_minter = env.get_account(1);
    let user = env.get_account(2);

    env.set_caller(old_minter);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.set_minter(new_minter);
    assert_eq!(token_mut.minter(), Some(new_minter));

    env.set_caller(new_minter);
    token_mut.mint(user, wad(10));
    assert_eq!(token_mut.balance_of(user), wad(10));
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_set_minter_by_non_minter_reverts() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let user = env.get_account(1);

    env.set_caller(user);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.set_minter(user);
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_old_minter_loses_mint_rights() {
    let env = odra_test::env();
    let token = deploy_token(&env);
    let old_minter = env.get_account(0);
    let new_minter = env.get_account(1);

    env.set_caller(old_minter);
    let mut token_mut = MCSPRTokenHostRef::new(token.address(), env.clone());
    token_mut.set_minter(new_minter);

    token_mut.mint(old_minter, wad(10));
}
