#![cfg(test)]
use super::*;
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::String as SorobanString;
use veritasor_agent_registry::{AgentRegistryContract, AgentRegistryContractClient};
use veritasor_common::AgentState;
use veritasor_bond_ledger::{BondLedgerContract, BondLedgerContractClient};
use veritasor_controller::{ControllerContract, ControllerContractClient};
use veritasor_tranching_engine::{TranchingEngineContract, TranchingEngineContractClient};
use veritasor_token_registry::{TokenRegistryContract, TokenRegistryContractClient};

struct Fixture {
    env: Env,
    receiver: AttestedReceiverContractClient<'static>,
    controller: ControllerContractClient<'static>,
    ledger: BondLedgerContractClient<'static>,
    agents: AgentRegistryContractClient<'static>,
    token: token::Client<'static>,
    sac: token::StellarAssetClient<'static>,
}

fn setup() -> Fixture {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let token_admin = Address::generate(&env);
    let sac_obj = env.register_stellar_asset_contract_v2(token_admin.clone());
    let native = sac_obj.address();

    let registry_id = env.register(TokenRegistryContract, ());
    let registry = TokenRegistryContractClient::new(&env, &registry_id);
    registry.initialize(&admin, &native, &SorobanString::from_str(&env, "NATIVE"), &1);

    let ledger_id = env.register(BondLedgerContract, ());
    let ledger = BondLedgerContractClient::new(&env, &ledger_id);
    ledger.initialize(&admin, &registry_id);

    let agents_id = env.register(AgentRegistryContract, ());
    let agents = AgentRegistryContractClient::new(&env, &agents_id);
    agents.initialize(&admin);

    let engine_id = env.register(TranchingEngineContract, ());
    let engine = TranchingEngineContractClient::new(&env, &engine_id);
    engine.initialize(&admin, &ledger_id);

    let controller_id = env.register(ControllerContract, ());
    let controller = ControllerContractClient::new(&env, &controller_id);
    controller.initialize(&admin, &ledger_id, &agents_id, &registry_id);
    controller.set_tranching_engine(&engine_id);

    ledger.set_controller(&controller_id);
    ledger.set_class_creator(&engine_id);
    agents.set_controller(&controller_id);
    engine.set_controller(&controller_id);

    let receiver_id = env.register(AttestedReceiverContract, ());
    let receiver = AttestedReceiverContractClient::new(&env, &receiver_id);
    receiver.initialize(&admin, &controller_id, &registry_id);
    controller.set_attested_receiver(&receiver_id);

    Fixture {
        env: env.clone(),
        receiver,
        controller,
        ledger,
        agents,
        token: token::Client::new(&env, &native),
        sac: token::StellarAssetClient::new(&env, &native),
    }
}

fn mk_active_agent(f: &Fixture, owner: &Address) -> u64 {
    let agent_id = f.agents.register_agent(
        &f.controller.address,
        owner,
        &SorobanString::from_str(&f.env, "Agent"),
        &SorobanString::from_str(&f.env, "d"),
        &BytesN::from_array(&f.env, &[1u8; 32]),
        &SorobanString::from_str(&f.env, "e"),
    );
    f.agents.update_state(&f.controller.address, &agent_id, &AgentState::Active);
    agent_id
}

#[test]
fn pay_native_forwards_net_revenue_to_controller() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);

    let record_id = f.receiver.pay_native(&payer, &agent_id, &10_000, &SorobanString::from_str(&f.env, "https://x"));
    assert_eq!(record_id, 1);

    assert_eq!(f.controller.revenue_pool(&agent_id, &Token::Native), 7_000);
    assert_eq!(f.token.balance(&owner), 3_000);
    let agent = f.agents.get_agent(&agent_id).unwrap();
    assert_eq!(agent.cumulative_earned, 10_000);
}

#[test]
fn configured_submission_fee_is_charged_separately_from_revenue() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let collector = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);

    f.receiver.configure_fees(&Token::Native, &collector, &500, &true);
    f.receiver.pay_native(&payer, &agent_id, &9_000, &SorobanString::from_str(&f.env, "e"));

    assert_eq!(f.token.balance(&collector), 500);
    assert_eq!(f.controller.revenue_pool(&agent_id, &Token::Native), 6_300);
    assert_eq!(f.token.balance(&payer), 10_000 - 500 - 9_000);
}

#[test]
fn submission_fee_disabled_by_default_charges_nothing() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);

    f.receiver.pay_native(&payer, &agent_id, &9_000, &SorobanString::from_str(&f.env, "e"));
    assert_eq!(f.token.balance(&payer), 10_000 - 9_000);
}

#[test]
fn pay_token_rejects_unsupported_token() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    let bogus = Token::Fungible(Address::generate(&f.env));

    let err = f
        .receiver
        .try_pay_token(&payer, &agent_id, &bogus, &1_000, &SorobanString::from_str(&f.env, "e"))
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::UnsupportedToken);
}

#[test]
fn pay_with_signature_relay_replay_is_rejected() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let relayer = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);

    let deadline = f.env.ledger().timestamp() + 1000;
    f.receiver.pay_with_signature(
        &relayer, &payer, &agent_id, &Token::Native, &1_000,
        &SorobanString::from_str(&f.env, "e"), &deadline, &0,
    );
    assert_eq!(f.receiver.payer_nonce(&payer), 1);

    let err = f
        .receiver
        .try_pay_with_signature(
            &relayer, &payer, &agent_id, &Token::Native, &1_000,
            &SorobanString::from_str(&f.env, "e"), &deadline, &0,
        )
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::NonceReplay);
}

#[test]
fn pay_with_signature_rejects_expired_deadline() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let relayer = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);

    f.env.ledger().with_mut(|l| l.timestamp = 10_000);
    let err = f
        .receiver
        .try_pay_with_signature(
            &relayer, &payer, &agent_id, &Token::Native, &1_000,
            &SorobanString::from_str(&f.env, "e"), &1, &0,
        )
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::SignatureExpired);
}

#[test]
fn pay_with_signature_rejects_disallowed_relayer_when_restricted() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let relayer = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);
    f.receiver.set_relay_restricted(&true);

    let deadline = f.env.ledger().timestamp() + 1000;
    let err = f
        .receiver
        .try_pay_with_signature(
            &relayer, &payer, &agent_id, &Token::Native, &1_000,
            &SorobanString::from_str(&f.env, "e"), &deadline, &0,
        )
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::RelayNotAllowed);

    f.receiver.set_relay_allowed(&relayer, &true);
    f.receiver.pay_with_signature(
        &relayer, &payer, &agent_id, &Token::Native, &1_000,
        &SorobanString::from_str(&f.env, "e"), &deadline, &0,
    );
    assert_eq!(f.controller.revenue_pool(&agent_id, &Token::Native), 700);
}

#[test]
fn attested_payment_accepts_registered_signer_and_rejects_mismatch() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let operator = Address::generate(&f.env);
    let stranger = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);
    f.receiver.set_attested_signer(&agent_id, &operator);

    let now = f.env.ledger().timestamp();
    let logic_hash = BytesN::from_array(&f.env, &[7u8; 32]);
    let record_id = f.receiver.pay_native_attested(
        &payer, &operator, &agent_id, &1_000,
        &SorobanString::from_str(&f.env, "e"), &now, &logic_hash,
    );
    assert_eq!(record_id, 1);
    assert_eq!(f.receiver.verified_revenue(&agent_id), 1_000);

    let err = f
        .receiver
        .try_pay_native_attested(
            &payer, &stranger, &agent_id, &1_000,
            &SorobanString::from_str(&f.env, "e"), &now, &BytesN::from_array(&f.env, &[8u8; 32]),
        )
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::AttestorMismatch);
}

#[test]
fn attested_payment_rejects_duplicate_receipt() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let operator = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);
    f.receiver.set_attested_signer(&agent_id, &operator);

    let now = f.env.ledger().timestamp();
    let logic_hash = BytesN::from_array(&f.env, &[7u8; 32]);
    f.receiver.pay_native_attested(
        &payer, &operator, &agent_id, &1_000,
        &SorobanString::from_str(&f.env, "e"), &now, &logic_hash,
    );

    let err = f
        .receiver
        .try_pay_native_attested(
            &payer, &operator, &agent_id, &1_000,
            &SorobanString::from_str(&f.env, "e"), &now, &logic_hash,
        )
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::NonceReplay);
}

#[test]
fn attested_payment_rejects_timestamp_outside_replay_window() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let payer = Address::generate(&f.env);
    let operator = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.sac.mint(&payer, &10_000);
    f.receiver.set_attested_signer(&agent_id, &operator);

    let now = f.env.ledger().timestamp();
    let stale = now.saturating_sub(DEFAULT_REPLAY_WINDOW_SECONDS + 10);
    let err = f
        .receiver
        .try_pay_native_attested(
            &payer, &operator, &agent_id, &1_000,
            &SorobanString::from_str(&f.env, "e"), &stale, &BytesN::from_array(&f.env, &[9u8; 32]),
        )
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::SignatureExpired);
}
