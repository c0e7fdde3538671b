//! # Controller
//!
//! Orchestrates multi-component state changes across the bond ledger, the
//! agent registry, the tranching engine, and the token registry. This is
//! the only component any of those four trust to call their
//! controller-gated entry points; it holds no bond or dividend state of
//! its own beyond per-agent IPO capital and revenue-pool counters, and the
//! reentrancy barrier required of every state-mutating entry point here
//! since every one of them crosses into at least one other contract.

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Bytes, BytesN, Env, Vec};
use veritasor_common::{bps_of, AgentState, Error, Token, Tranche};

#[cfg(target_arch = "wasm32")]
mod bond_ledger_import {
    soroban_sdk::contractimport!(
        file = "../../target/wasm32-unknown-unknown/release/veritasor_bond_ledger.wasm"
    );
    pub use Client as BondLedgerClient;
}
#[cfg(not(target_arch = "wasm32"))]
mod bond_ledger_import {
    pub use veritasor_bond_ledger::{BondClass, BondNonce, BondTuple};
    pub use veritasor_bond_ledger::BondLedgerContractClient as BondLedgerClient;
}

#[cfg(target_arch = "wasm32")]
mod agent_registry_import {
    soroban_sdk::contractimport!(
        file = "../../target/wasm32-unknown-unknown/release/veritasor_agent_registry.wasm"
    );
    pub use Client as AgentRegistryClient;
}
#[cfg(not(target_arch = "wasm32"))]
mod agent_registry_import {
    pub use veritasor_agent_registry::Agent;
    pub use veritasor_agent_registry::AgentRegistryContractClient as AgentRegistryClient;
}

#[cfg(target_arch = "wasm32")]
mod tranching_engine_import {
    soroban_sdk::contractimport!(
        file = "../../target/wasm32-unknown-unknown/release/veritasor_tranching_engine.wasm"
    );
    pub use Client as TranchingEngineClient;
}
#[cfg(not(target_arch = "wasm32"))]
mod tranching_engine_import {
    pub use veritasor_tranching_engine::TrancheGroup;
    pub use veritasor_tranching_engine::TranchingEngineContractClient as TranchingEngineClient;
}

#[cfg(target_arch = "wasm32")]
mod token_registry_import {
    soroban_sdk::contractimport!(
        file = "../../target/wasm32-unknown-unknown/release/veritasor_token_registry.wasm"
    );
    pub use Client as TokenRegistryClient;
}
#[cfg(not(target_arch = "wasm32"))]
mod token_registry_import {
    pub use veritasor_token_registry::TokenRegistryContractClient as TokenRegistryClient;
}

#[cfg(test)]
mod test;

#[contracttype]
#[derive(Clone, Debug)]
enum DataKey {
    Admin,
    BondLedger,
    AgentRegistry,
    TranchingEngine,
    TokenRegistry,
    AttestedReceiver,
    Verifier,
    BondholderShareBps,
    RevenueStabilityBps,
    PaymentFrequencyBps,
    Reentrancy,
    ActiveNonce(u32),
    HasIPO(u64),
    IPOCapital(u64, Token),
    RevenuePool(u64, Token),
}

const DEFAULT_BONDHOLDER_SHARE_BPS: u32 = 7000;
const DEFAULT_CREDIT_FACTOR_BPS: u32 = 10_000;

/// RAII reentrancy barrier. Every state-mutating entry point below holds
/// one for its whole body; the flag clears on drop so an early `?` return
/// can't leave the contract permanently locked.
struct ReentrancyGuard<'a> {
    env: &'a Env,
}

impl<'a> ReentrancyGuard<'a> {
    fn enter(env: &'a Env) -> Result<Self, Error> {
        let locked: bool = env.storage().instance().get(&DataKey::Reentrancy).unwrap_or(false);
        if locked {
            return Err(Error::Reentrancy);
        }
        env.storage().instance().set(&DataKey::Reentrancy, &true);
        Ok(Self { env })
    }
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        self.env.storage().instance().set(&DataKey::Reentrancy, &false);
    }
}

#[contract]
pub struct ControllerContract;

#[contractimpl]
impl ControllerContract {
    pub fn initialize(
        env: Env,
        admin: Address,
        bond_ledger: Address,
        agent_registry: Address,
        token_registry: Address,
    ) {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::BondLedger, &bond_ledger);
        env.storage().instance().set(&DataKey::AgentRegistry, &agent_registry);
        env.storage().instance().set(&DataKey::TokenRegistry, &token_registry);
        env.storage()
            .instance()
            .set(&DataKey::BondholderShareBps, &DEFAULT_BONDHOLDER_SHARE_BPS);
    }

    fn require_admin(env: &Env) {
        let admin: Address = env.storage().instance().get(&DataKey::Admin).expect("not initialized");
        admin.require_auth();
    }

    pub fn set_tranching_engine(env: Env, tranching_engine: Address) {
        Self::require_admin(&env);
        if env.storage().instance().has(&DataKey::TranchingEngine) {
            panic!("tranching engine already set");
        }
        env.storage().instance().set(&DataKey::TranchingEngine, &tranching_engine);
    }

    pub fn set_attested_receiver(env: Env, attested_receiver: Address) {
        Self::require_admin(&env);
        if env.storage().instance().has(&DataKey::AttestedReceiver) {
            panic!("attested receiver already set");
        }
        env.storage().instance().set(&DataKey::AttestedReceiver, &attested_receiver);
    }

    pub fn set_verifier(env: Env, verifier: Address) {
        Self::require_admin(&env);
        if env.storage().instance().has(&DataKey::Verifier) {
            panic!("verifier already set");
        }
        env.storage().instance().set(&DataKey::Verifier, &verifier);
    }

    pub fn set_bondholder_share_bps(env: Env, bps: u32) {
        Self::require_admin(&env);
        assert!(bps <= 10_000, "bps out of range");
        env.storage().instance().set(&DataKey::BondholderShareBps, &bps);
    }

    /// Sets the global revenue-stability and payment-frequency inputs fed
    /// into every `recalcCredit` call this contract makes. The source
    /// derives these per-agent from off-chain statistics (the buffer's
    /// coefficient of variation and payment cadence); this component has
    /// no off-chain oracle, so they are carried as admin-configurable
    /// defaults instead of being recomputed on-chain per agent.
    pub fn set_credit_defaults(env: Env, revenue_stability_bps: u32, payment_frequency_bps: u32) {
        Self::require_admin(&env);
        assert!(revenue_stability_bps <= 10_000 && payment_frequency_bps <= 10_000, "bps out of range");
        env.storage().instance().set(&DataKey::RevenueStabilityBps, &revenue_stability_bps);
        env.storage().instance().set(&DataKey::PaymentFrequencyBps, &payment_frequency_bps);
    }

    fn default_credit_inputs(env: &Env) -> (u32, u32) {
        let stability = env
            .storage()
            .instance()
            .get(&DataKey::RevenueStabilityBps)
            .unwrap_or(DEFAULT_CREDIT_FACTOR_BPS);
        let frequency = env
            .storage()
            .instance()
            .get(&DataKey::PaymentFrequencyBps)
            .unwrap_or(DEFAULT_CREDIT_FACTOR_BPS);
        (stability, frequency)
    }

    fn bond_ledger_client(env: &Env) -> bond_ledger_import::BondLedgerClient<'static> {
        let addr: Address = env.storage().instance().get(&DataKey::BondLedger).unwrap();
        bond_ledger_import::BondLedgerClient::new(env, &addr)
    }

    fn agent_registry_client(env: &Env) -> agent_registry_import::AgentRegistryClient<'static> {
        let addr: Address = env.storage().instance().get(&DataKey::AgentRegistry).unwrap();
        agent_registry_import::AgentRegistryClient::new(env, &addr)
    }

    fn tranching_engine_client(env: &Env) -> Result<tranching_engine_import::TranchingEngineClient<'static>, Error> {
        let addr: Address = env
            .storage()
            .instance()
            .get(&DataKey::TranchingEngine)
            .ok_or(Error::NotInitialized)?;
        Ok(tranching_engine_import::TranchingEngineClient::new(env, &addr))
    }

    fn token_registry_client(env: &Env) -> token_registry_import::TokenRegistryClient<'static> {
        let addr: Address = env.storage().instance().get(&DataKey::TokenRegistry).unwrap();
        token_registry_import::TokenRegistryClient::new(env, &addr)
    }

    fn resolve_token(env: &Env, token: &Token) -> Result<Address, Error> {
        let client = Self::token_registry_client(env);
        if !client.is_supported(token) {
            return Err(Error::UnsupportedToken);
        }
        Ok(client.resolve_address(token))
    }

    fn require_attested_receiver(env: &Env, caller: &Address) -> Result<(), Error> {
        let receiver: Address = env
            .storage()
            .instance()
            .get(&DataKey::AttestedReceiver)
            .ok_or(Error::NotInitialized)?;
        if *caller != receiver {
            return Err(Error::NotAttestedOperator);
        }
        caller.require_auth();
        Ok(())
    }

    // -----------------------------------------------------------------
    // IPO issuance
    // -----------------------------------------------------------------

    pub fn initiate_ipo(
        env: Env,
        caller: Address,
        agent_id: u64,
        coupon_bps: u32,
        maturity_period: u64,
        price_per_bond: i128,
        max_supply: i128,
        payment_token: Token,
    ) -> Result<(u32, u32), Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        caller.require_auth();

        let agent = Self::agent_registry_client(&env)
            .get_agent(&agent_id)
            .ok_or(Error::NotFound)?;
        if agent.owner != caller {
            return Err(Error::NotOwner);
        }
        if agent.state != AgentState::Active {
            return Err(Error::AgentNotActive);
        }
        if !Self::token_registry_client(&env).is_supported(&payment_token) {
            return Err(Error::UnsupportedToken);
        }
        if env.storage().instance().get(&DataKey::HasIPO(agent_id)).unwrap_or(false) {
            return Err(Error::AlreadyExists);
        }

        let this = env.current_contract_address();
        let ledger = Self::bond_ledger_client(&env);
        let class_id = ledger.create_class(
            &this,
            &agent_id,
            &coupon_bps,
            &maturity_period,
            &agent.sharpe_scaled,
            &max_supply,
            &Tranche::Standard,
            &payment_token,
        );
        let nonce_id = ledger.create_nonce(&this, &class_id, &price_per_bond);

        env.storage().instance().set(&DataKey::ActiveNonce(class_id), &nonce_id);
        env.storage().instance().set(&DataKey::HasIPO(agent_id), &true);
        env.events().publish(("IPOInitiated", agent_id), (class_id, nonce_id));
        Ok((class_id, nonce_id))
    }

    pub fn initiate_tranched_ipo(
        env: Env,
        caller: Address,
        agent_id: u64,
        senior_coupon_bps: u32,
        junior_coupon_bps: u32,
        maturity_period: u64,
        senior_max_supply: i128,
        junior_max_supply: i128,
        payment_token: Token,
        senior_price: i128,
        junior_price: i128,
    ) -> Result<(u32, u32), Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        caller.require_auth();

        let agent = Self::agent_registry_client(&env)
            .get_agent(&agent_id)
            .ok_or(Error::NotFound)?;
        if agent.owner != caller {
            return Err(Error::NotOwner);
        }
        if agent.state != AgentState::Active {
            return Err(Error::AgentNotActive);
        }
        if !Self::token_registry_client(&env).is_supported(&payment_token) {
            return Err(Error::UnsupportedToken);
        }
        if env.storage().instance().get(&DataKey::HasIPO(agent_id)).unwrap_or(false) {
            return Err(Error::AlreadyExists);
        }

        let this = env.current_contract_address();
        let engine = Self::tranching_engine_client(&env)?;
        let group_id = engine.create_group(
            &this,
            &agent_id,
            &senior_coupon_bps,
            &junior_coupon_bps,
            &maturity_period,
            &senior_max_supply,
            &junior_max_supply,
            &agent.sharpe_scaled,
            &payment_token,
            &senior_price,
            &junior_price,
        );
        let group = engine.get_group(&group_id).ok_or(Error::GroupMissing)?;

        env.storage()
            .instance()
            .set(&DataKey::ActiveNonce(group.senior_class_id), &group.senior_nonce_id);
        env.storage()
            .instance()
            .set(&DataKey::ActiveNonce(group.junior_class_id), &group.junior_nonce_id);
        env.storage().instance().set(&DataKey::HasIPO(agent_id), &true);
        env.events()
            .publish(("IPOInitiated", agent_id), (group.senior_class_id, group.junior_class_id));
        Ok((group.senior_class_id, group.junior_class_id))
    }

    // -----------------------------------------------------------------
    // Secondary-market-free purchase / transfer / redemption
    // -----------------------------------------------------------------

    pub fn purchase_bonds(env: Env, caller: Address, class_id: u32, amount: i128, token: Token) -> Result<i128, Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        caller.require_auth();
        if amount <= 0 {
            return Err(Error::ZeroAmount);
        }

        let ledger = Self::bond_ledger_client(&env);
        let class = ledger.get_class(&class_id).ok_or(Error::BondClassMissing)?;
        if class.token != token {
            return Err(Error::UnsupportedToken);
        }
        let nonce_id: u32 = env
            .storage()
            .instance()
            .get(&DataKey::ActiveNonce(class_id))
            .ok_or(Error::BondNonceMissing)?;
        let nonce = ledger.get_nonce(&class_id, &nonce_id).ok_or(Error::BondNonceMissing)?;
        let cost = amount.saturating_mul(nonce.price_per_bond);

        let token_addr = Self::resolve_token(&env, &token)?;
        token::Client::new(&env, &token_addr).transfer(&caller, &env.current_contract_address(), &cost);

        let this = env.current_contract_address();
        let tuples = Vec::from_array(&env, [bond_ledger_import::BondTuple { class_id, nonce_id, amount }]);
        ledger.issue(&this, &caller, &tuples);

        let key = DataKey::IPOCapital(class.agent_id, token);
        let prior: i128 = env.storage().instance().get(&key).unwrap_or(0);
        env.storage().instance().set(&key, &(prior + cost));

        Self::agent_registry_client(&env).record_capital_raised(&this, &class.agent_id, &cost);

        env.events()
            .publish(("BondsPurchased", caller), (class_id, nonce_id, amount, cost));
        Ok(cost)
    }

    pub fn transfer_bonds(env: Env, caller: Address, to: Address, class_id: u32, nonce_id: u32, amount: i128) -> Result<(), Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        let tuples = Vec::from_array(&env, [bond_ledger_import::BondTuple { class_id, nonce_id, amount }]);
        Self::bond_ledger_client(&env).transfer_from(&caller, &caller, &to, &tuples);
        Ok(())
    }

    pub fn redeem_bonds(env: Env, caller: Address, class_id: u32, nonce_id: u32, amount: i128) -> Result<i128, Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        caller.require_auth();
        if amount <= 0 {
            return Err(Error::ZeroAmount);
        }

        let ledger = Self::bond_ledger_client(&env);
        let nonce = ledger.get_nonce(&class_id, &nonce_id).ok_or(Error::BondNonceMissing)?;
        if !nonce.redeemable {
            return Err(Error::NonceNotRedeemable);
        }
        let class = ledger.get_class(&class_id).ok_or(Error::BondClassMissing)?;
        let payout = amount.saturating_mul(nonce.price_per_bond);

        let key = DataKey::IPOCapital(class.agent_id, class.token.clone());
        let capital: i128 = env.storage().instance().get(&key).unwrap_or(0);
        if capital < payout {
            return Err(Error::InsufficientCapital);
        }

        let this = env.current_contract_address();
        ledger.burn(&this, &caller, &class_id, &nonce_id, &amount);
        env.storage().instance().set(&key, &(capital - payout));

        let token_addr = Self::resolve_token(&env, &class.token)?;
        token::Client::new(&env, &token_addr).transfer(&this, &caller, &payout);

        env.events()
            .publish(("BondsRedeemed", caller), (class_id, nonce_id, amount, payout));
        Ok(payout)
    }

    pub fn mark_bonds_redeemable(env: Env, caller: Address, class_id: u32, nonce_id: u32) -> Result<(), Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        let ledger = Self::bond_ledger_client(&env);
        let class = ledger.get_class(&class_id).ok_or(Error::BondClassMissing)?;
        let nonce = ledger.get_nonce(&class_id, &nonce_id).ok_or(Error::BondNonceMissing)?;

        let agent_registry = Self::agent_registry_client(&env);
        let agent = agent_registry.get_agent(&class.agent_id).ok_or(Error::NotFound)?;
        let attested = agent_registry.attested_operator(&class.agent_id);
        let authorised = caller == agent.owner || attested.as_ref() == Some(&caller);
        if !authorised {
            return Err(Error::NotOwner);
        }
        caller.require_auth();
        if env.ledger().timestamp() < nonce.maturity_timestamp {
            return Err(Error::NonceNotMatured);
        }

        let this = env.current_contract_address();
        ledger.mark_redeemable(&this, &class_id, &nonce_id);
        Ok(())
    }

    pub fn release_ipo_capital(env: Env, caller: Address, agent_id: u64, token: Token, amount: i128, recipient: Address) -> Result<(), Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        caller.require_auth();
        if amount <= 0 {
            return Err(Error::ZeroAmount);
        }

        let attested = Self::agent_registry_client(&env).attested_operator(&agent_id);
        if attested.as_ref() != Some(&caller) {
            return Err(Error::NotAttestedOperator);
        }

        let key = DataKey::IPOCapital(agent_id, token.clone());
        let capital: i128 = env.storage().instance().get(&key).unwrap_or(0);
        if capital < amount {
            return Err(Error::InsufficientCapital);
        }
        env.storage().instance().set(&key, &(capital - amount));

        let token_addr = Self::resolve_token(&env, &token)?;
        token::Client::new(&env, &token_addr).transfer(&env.current_contract_address(), &recipient, &amount);

        env.events().publish(("IPOCapitalReleased", agent_id), (token, amount, recipient));
        Ok(())
    }

    // -----------------------------------------------------------------
    // Revenue intake and distribution
    // -----------------------------------------------------------------

    /// Entry point for the attested receiver. Assumes the caller has
    /// already moved `amount` of `token` into this contract's own
    /// balance; this call only books the split.
    pub fn on_revenue(env: Env, caller: Address, agent_id: u64, token: Token, amount: i128) -> Result<(), Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        Self::require_attested_receiver(&env, &caller)?;
        if amount <= 0 {
            return Err(Error::ZeroAmount);
        }

        let bondholder_share_bps: u32 = env
            .storage()
            .instance()
            .get(&DataKey::BondholderShareBps)
            .unwrap_or(DEFAULT_BONDHOLDER_SHARE_BPS);
        let bondholder_share = bps_of(amount, bondholder_share_bps);
        let owner_share = amount - bondholder_share;

        let key = DataKey::RevenuePool(agent_id, token.clone());
        let prior: i128 = env.storage().instance().get(&key).unwrap_or(0);
        env.storage().instance().set(&key, &(prior + bondholder_share));

        let agent_registry = Self::agent_registry_client(&env);
        if owner_share > 0 {
            let agent = agent_registry.get_agent(&agent_id).ok_or(Error::NotFound)?;
            let token_addr = Self::resolve_token(&env, &token)?;
            token::Client::new(&env, &token_addr).transfer(&env.current_contract_address(), &agent.owner, &owner_share);
        }

        let this = env.current_contract_address();
        agent_registry.record_revenue(&this, &agent_id, &amount);
        let (stability_bps, frequency_bps) = Self::default_credit_inputs(&env);
        agent_registry.recalc_credit(&this, &agent_id, &stability_bps, &frequency_bps);

        env.events().publish(("RevenueReceived", agent_id), (token, amount));
        Ok(())
    }

    /// Routes the agent/token's accumulated revenue pool into the bond
    /// ledger's dividend accumulator. Senior-first if the class belongs to
    /// a tranche group, otherwise the whole pool goes to the one class.
    pub fn distribute_dividends(env: Env, class_id: u32, nonce_id: u32) -> Result<i128, Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        let ledger = Self::bond_ledger_client(&env);
        let class = ledger.get_class(&class_id).ok_or(Error::BondClassMissing)?;

        let key = DataKey::RevenuePool(class.agent_id, class.token.clone());
        let pool: i128 = env.storage().instance().get(&key).unwrap_or(0);
        if pool == 0 {
            return Err(Error::ZeroAmount);
        }

        let this = env.current_contract_address();
        let group_id = Self::tranching_engine_client(&env)
            .ok()
            .map(|engine| engine.class_to_group(&class_id))
            .unwrap_or(0);

        if group_id != 0 {
            let engine = Self::tranching_engine_client(&env)?;
            let group = engine.get_group(&group_id).ok_or(Error::GroupMissing)?;
            let senior_nonce = ledger
                .get_nonce(&group.senior_class_id, &group.senior_nonce_id)
                .ok_or(Error::BondNonceMissing)?;
            let time_delta = env.ledger().timestamp().saturating_sub(senior_nonce.issue_timestamp);
            let entitlement = engine.senior_entitlement(&group_id, &time_delta);
            let senior_amount = if entitlement > pool { pool } else { entitlement };
            let junior_amount = pool - senior_amount;

            if senior_amount > 0 {
                ledger.deposit(&this, &this, &group.senior_class_id, &group.senior_nonce_id, &class.token, &senior_amount);
            }
            if junior_amount > 0 {
                ledger.deposit(&this, &this, &group.junior_class_id, &group.junior_nonce_id, &class.token, &junior_amount);
            }
        } else {
            ledger.deposit(&this, &this, &class_id, &nonce_id, &class.token, &pool);
        }

        env.storage().instance().set(&key, &0i128);
        env.events()
            .publish(("DividendsDistributed", class.agent_id), (class_id, nonce_id, pool));
        Ok(pool)
    }

    /// `verifier` must be the contract's registered (opaque, externally
    /// operated) proof verifier and must co-authorize the call; this
    /// component has no proving system of its own and treats the
    /// verifier's authorization as the pass/fail signal the source gets
    /// from an actual zero-knowledge verifier.
    pub fn submit_sharpe_proof(env: Env, verifier: Address, agent_id: u64, proof: Bytes, instances: Vec<i128>) -> Result<(), Error> {
        let _guard = ReentrancyGuard::enter(&env)?;
        let stored_verifier: Address = env.storage().instance().get(&DataKey::Verifier).ok_or(Error::NotInitialized)?;
        if verifier != stored_verifier {
            return Err(Error::ProofInvalid);
        }
        verifier.require_auth();
        if instances.is_empty() {
            return Err(Error::ProofInvalid);
        }

        let digest: BytesN<32> = env.crypto().sha256(&proof).to_bytes();
        let sharpe_scaled = instances.get(0).unwrap();

        let this = env.current_contract_address();
        let agent_registry = Self::agent_registry_client(&env);
        agent_registry.update_sharpe(&this, &agent_id, &sharpe_scaled, &digest);
        let (stability_bps, frequency_bps) = Self::default_credit_inputs(&env);
        agent_registry.recalc_credit(&this, &agent_id, &stability_bps, &frequency_bps);

        env.events().publish(("SharpeProofAccepted", agent_id), sharpe_scaled);
        Ok(())
    }

    pub fn calculate_dynamic_coupon(env: Env, class_id: u32) -> Result<u32, Error> {
        let ledger = Self::bond_ledger_client(&env);
        let class = ledger.get_class(&class_id).ok_or(Error::BondClassMissing)?;
        let agent = Self::agent_registry_client(&env)
            .get_agent(&class.agent_id)
            .ok_or(Error::NotFound)?;

        let base = class.coupon_bps as i128;
        let score = agent.credit_score;
        let raw = base.saturating_mul(10_000 - score) / 5_000;
        Ok(raw.max(100).min(3000) as u32)
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    pub fn active_nonce(env: Env, class_id: u32) -> u32 {
        env.storage().instance().get(&DataKey::ActiveNonce(class_id)).unwrap_or(0)
    }

    pub fn has_ipo(env: Env, agent_id: u64) -> bool {
        env.storage().instance().get(&DataKey::HasIPO(agent_id)).unwrap_or(false)
    }

    pub fn ipo_capital(env: Env, agent_id: u64, token: Token) -> i128 {
        env.storage().instance().get(&DataKey::IPOCapital(agent_id, token)).unwrap_or(0)
    }

    pub fn revenue_pool(env: Env, agent_id: u64, token: Token) -> i128 {
        env.storage().instance().get(&DataKey::RevenuePool(agent_id, token)).unwrap_or(0)
    }
}
