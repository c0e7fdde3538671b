#![cfg(test)]
use super::*;
use soroban_sdk::testutils::Address as _;

fn setup(env: &Env) -> (Address, Address, TokenRegistryContractClient<'static>) {
    let admin = Address::generate(env);
    let native = Address::generate(env);
    let contract_id = env.register(TokenRegistryContract, ());
    let client = TokenRegistryContractClient::new(env, &contract_id);
    client.initialize(&admin, &native, &String::from_str(env, "NATIVE"), &1_000_000);
    (admin, native, client)
}

#[test]
fn native_asset_is_supported_after_init() {
    let env = Env::default();
    env.mock_all_auths();
    let (_admin, native, client) = setup(&env);
    assert!(client.is_supported(&Token::Native));
    let info = client.token_info(&Token::Native);
    assert_eq!(info.symbol, String::from_str(&env, "NATIVE"));
    assert_eq!(info.decimals, 18);
    assert_eq!(client.resolve_address(&Token::Native), native);
}

#[test]
fn add_and_query_fungible_token() {
    let env = Env::default();
    env.mock_all_auths();
    let (_admin, _native, client) = setup(&env);
    let token = Address::generate(&env);

    client.add_token(&token, &String::from_str(&env, "USDC"), &6, &1_000_000);
    let key = Token::Fungible(token.clone());
    assert!(client.is_supported(&key));
    assert_eq!(client.token_price(&key), 1_000_000);

    let all = client.all_tokens();
    assert_eq!(all.len(), 2);
}

#[test]
fn re_adding_active_token_fails() {
    let env = Env::default();
    env.mock_all_auths();
    let (_admin, _native, client) = setup(&env);
    let token = Address::generate(&env);
    client.add_token(&token, &String::from_str(&env, "USDC"), &6, &1);
    let err = client
        .try_add_token(&token, &String::from_str(&env, "USDC"), &6, &1)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::TokenAlreadyActive);
}

#[test]
fn remove_then_price_read_fails() {
    let env = Env::default();
    env.mock_all_auths();
    let (_admin, _native, client) = setup(&env);
    let token = Address::generate(&env);
    let key = Token::Fungible(token.clone());
    client.add_token(&token, &String::from_str(&env, "USDC"), &6, &1);
    client.remove_token(&key);
    assert!(!client.is_supported(&key));
    let err = client.try_token_price(&key).unwrap_err().unwrap();
    assert_eq!(err, Error::InactiveToken);
}

#[test]
fn cannot_remove_native() {
    let env = Env::default();
    env.mock_all_auths();
    let (_admin, _native, client) = setup(&env);
    let err = client.try_remove_token(&Token::Native).unwrap_err().unwrap();
    assert_eq!(err, Error::CannotRemoveNative);
}
