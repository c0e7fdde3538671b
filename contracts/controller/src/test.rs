#![cfg(test)]
use super::*;
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::String as SorobanString;
use veritasor_common::FP_SCALE;
use veritasor_agent_registry::{AgentRegistryContract, AgentRegistryContractClient};
use veritasor_bond_ledger::{BondLedgerContract, BondLedgerContractClient};
use veritasor_tranching_engine::{TranchingEngineContract, TranchingEngineContractClient};
use veritasor_token_registry::{TokenRegistryContract, TokenRegistryContractClient};

struct Fixture {
    env: Env,
    controller: ControllerContractClient<'static>,
    ledger: BondLedgerContractClient<'static>,
    agents: AgentRegistryContractClient<'static>,
    engine: TranchingEngineContractClient<'static>,
    registry: TokenRegistryContractClient<'static>,
    native: Address,
    token: token::Client<'static>,
    admin: Address,
}

fn setup() -> Fixture {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let token_admin = Address::generate(&env);
    let sac = env.register_stellar_asset_contract_v2(token_admin.clone());
    let native = sac.address();
    let sac_client = token::StellarAssetClient::new(&env, &native);

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

    Fixture {
        env: env.clone(),
        controller,
        ledger,
        agents,
        engine,
        registry,
        native: native.clone(),
        token: token::Client::new(&env, &native),
        admin,
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
fn initiate_ipo_and_purchase_round_trip() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let buyer = Address::generate(&f.env);
    token::StellarAssetClient::new(&f.env, &f.native).mint(&buyer, &1_000_000);

    let agent_id = mk_active_agent(&f, &owner);
    let (class_id, nonce_id) = f.controller.initiate_ipo(&owner, &agent_id, &500, &(365 * 86400), &100, &1000, &Token::Native);
    assert_eq!(f.controller.active_nonce(&class_id), nonce_id);

    let cost = f.controller.purchase_bonds(&buyer, &class_id, &10, &Token::Native);
    assert_eq!(cost, 1_000);
    assert_eq!(f.ledger.balance_of(&buyer, &class_id, &nonce_id), 10);
    assert_eq!(f.controller.ipo_capital(&agent_id, &Token::Native), 1_000);

    let agent = f.agents.get_agent(&agent_id).unwrap();
    assert_eq!(agent.capital_raised, 1_000);
}

#[test]
fn initiate_ipo_rejects_non_owner() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let stranger = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);

    let err = f
        .controller
        .try_initiate_ipo(&stranger, &agent_id, &500, &(365 * 86400), &100, &1000, &Token::Native)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::NotOwner);
}

#[test]
fn redeem_fails_with_insufficient_capital_when_pool_drained() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let buyer = Address::generate(&f.env);
    token::StellarAssetClient::new(&f.env, &f.native).mint(&buyer, &1_000_000);

    let agent_id = mk_active_agent(&f, &owner);
    let (class_id, nonce_id) = f.controller.initiate_ipo(&owner, &agent_id, &500, &(365 * 86400), &100, &1000, &Token::Native);
    f.controller.purchase_bonds(&buyer, &class_id, &10, &Token::Native);

    // Owner releases all raised capital before maturity, draining the pool.
    f.agents.set_attested_operator(&f.controller.address, &agent_id, &owner);
    f.controller.release_ipo_capital(&owner, &agent_id, &Token::Native, &1_000, &owner);

    f.env.ledger().with_mut(|l| {
        l.timestamp += 365 * 86400 + 1;
    });
    f.controller.mark_bonds_redeemable(&owner, &class_id, &nonce_id);

    let err = f
        .controller
        .try_redeem_bonds(&buyer, &class_id, &nonce_id, &10)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::InsufficientCapital);
}

#[test]
fn on_revenue_splits_bondholder_and_owner_share() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let receiver = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);

    f.controller.set_attested_receiver(&receiver);
    token::StellarAssetClient::new(&f.env, &f.native).mint(&f.controller.address, &10_000);

    f.controller.on_revenue(&receiver, &agent_id, &Token::Native, &10_000);

    assert_eq!(f.controller.revenue_pool(&agent_id, &Token::Native), 7_000);
    assert_eq!(f.token.balance(&owner), 3_000);

    let agent = f.agents.get_agent(&agent_id).unwrap();
    assert_eq!(agent.cumulative_earned, 10_000);
}

#[test]
fn on_revenue_rejects_non_receiver_caller() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let stranger = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.controller.set_attested_receiver(&Address::generate(&f.env));

    let err = f
        .controller
        .try_on_revenue(&stranger, &agent_id, &Token::Native, &1_000)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, Error::NotAttestedOperator);
}

/// Scenario S4-adjacent: a tranched class's distribution routes senior
/// entitlement first, remainder to junior.
#[test]
fn distribute_dividends_waterfalls_to_senior_then_junior() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let receiver = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    f.controller.set_attested_receiver(&receiver);

    let (senior_class, junior_class) = f.controller.initiate_tranched_ipo(
        &owner, &agent_id, &500, &800, &(90 * 86400), &500, &500, &Token::Native, &10, &10,
    );
    let senior_nonce = f.controller.active_nonce(&senior_class);
    let junior_nonce = f.controller.active_nonce(&junior_class);

    let senior_holder = Address::generate(&f.env);
    let junior_holder = Address::generate(&f.env);
    let buyer_funds = 100_000i128;
    token::StellarAssetClient::new(&f.env, &f.native).mint(&senior_holder, &buyer_funds);
    token::StellarAssetClient::new(&f.env, &f.native).mint(&junior_holder, &buyer_funds);
    f.controller.purchase_bonds(&senior_holder, &senior_class, &500, &Token::Native);
    f.controller.purchase_bonds(&junior_holder, &junior_class, &500, &Token::Native);

    token::StellarAssetClient::new(&f.env, &f.native).mint(&f.controller.address, &1_000);
    f.controller.on_revenue(&receiver, &agent_id, &Token::Native, &1_000);

    f.env.ledger().with_mut(|l| {
        l.timestamp += 30 * 86400;
    });

    let distributed = f.controller.distribute_dividends(&senior_class, &senior_nonce);
    assert_eq!(distributed, 700);

    let senior_claimable = f.ledger.claimable(&senior_holder, &senior_class, &senior_nonce, &Token::Native);
    assert!(senior_claimable > 0);
    let junior_claimable = f.ledger.claimable(&senior_holder, &junior_class, &junior_nonce, &Token::Native);
    assert_eq!(junior_claimable, 0);
}

#[test]
fn calculate_dynamic_coupon_decreases_with_credit_score() {
    let f = setup();
    let owner = Address::generate(&f.env);
    let agent_id = mk_active_agent(&f, &owner);
    let (class_id, _nonce_id) = f.controller.initiate_ipo(&owner, &agent_id, &2000, &(365 * 86400), &10, &1000, &Token::Native);

    let no_score_coupon = f.controller.calculate_dynamic_coupon(&class_id);
    assert_eq!(no_score_coupon, 3000);

    f.agents.update_sharpe(&f.controller.address, &agent_id, &(3 * FP_SCALE), &BytesN::from_array(&f.env, &[2u8; 32]));
    f.env.ledger().with_mut(|l| {
        l.timestamp += 365 * 86400;
    });
    f.agents.record_revenue(&f.controller.address, &agent_id, &(100 * FP_SCALE));
    f.agents.recalc_credit(&f.controller.address, &agent_id, &10_000, &10_000);

    let full_score_coupon = f.controller.calculate_dynamic_coupon(&class_id);
    assert_eq!(full_score_coupon, 100);
}
