//! # Agent Registry
//!
//! Authoritative record for each autonomous agent: ownership, lifecycle
//! state, the rolling revenue buffer that feeds the credit model, and the
//! capital-raised counter that drives evolution milestones. Every mutating
//! entrypoint is restricted to the Controller, which is itself the only
//! party trusted to have already checked agent-owner or governance auth
//! before calling in.

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, Address, BytesN, Env, String, Vec};
use veritasor_common::{rating_from_score, AgentState, Error, RatingTier, FP_SCALE};


const REVENUE_SLOTS: u32 = 12;
const SLOT_PERIOD_SECONDS: u64 = 30 * 86_400;
const SECONDS_PER_YEAR: i128 = 365 * 86_400;

/// Ascending cumulative capital-raised thresholds mapping to evolution
/// levels 1..5. Denominated in the raw units of whatever token(s) funded
/// the agent's IPOs.
const EVOLUTION_THRESHOLDS: [i128; 5] = [
    10_000_0000000,
    100_000_0000000,
    1_000_000_0000000,
    10_000_000_0000000,
    100_000_000_0000000,
];

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Admin,
    Controller,
    NextAgentId,
    Agent(u64),
    AttestedOperator(u64),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Agent {
    pub owner: Address,
    pub name: String,
    pub description: String,
    pub model_hash: BytesN<32>,
    pub endpoint: String,
    pub state: AgentState,
    pub registered_at: u64,
    pub cumulative_earned: i128,
    pub payment_count: u64,
    pub last_payment_time: u64,
    pub revenue_buffer: Vec<i128>,
    pub last_slot_index: u32,
    pub sharpe_scaled: i128,
    pub last_proof_hash: BytesN<32>,
    pub credit_score: i128,
    pub rating: RatingTier,
    pub capital_raised: i128,
    pub evolution_level: u32,
}

#[contract]
pub struct AgentRegistryContract;

#[contractimpl]
impl AgentRegistryContract {
    pub fn initialize(env: Env, admin: Address) {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::NextAgentId, &1u64);
    }

    pub fn set_controller(env: Env, controller: Address) {
        let admin: Address = env.storage().instance().get(&DataKey::Admin).expect("not initialized");
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Controller) {
            panic!("controller already set");
        }
        env.storage().instance().set(&DataKey::Controller, &controller);
    }

    fn require_controller(env: &Env, caller: &Address) -> Result<(), Error> {
        let controller: Address = env
            .storage()
            .instance()
            .get(&DataKey::Controller)
            .ok_or(Error::NotInitialized)?;
        if *caller != controller {
            return Err(Error::NotController);
        }
        caller.require_auth();
        Ok(())
    }

    fn load(env: &Env, agent_id: u64) -> Result<Agent, Error> {
        env.storage().instance().get(&DataKey::Agent(agent_id)).ok_or(Error::NotFound)
    }

    pub fn register_agent(
        env: Env,
        caller: Address,
        owner: Address,
        name: String,
        description: String,
        model_hash: BytesN<32>,
        endpoint: String,
    ) -> Result<u64, Error> {
        Self::require_controller(&env, &caller)?;

        let agent_id: u64 = env.storage().instance().get(&DataKey::NextAgentId).unwrap_or(1);
        let mut revenue_buffer = Vec::new(&env);
        for _ in 0..REVENUE_SLOTS {
            revenue_buffer.push_back(0i128);
        }
        let agent = Agent {
            owner,
            name,
            description,
            model_hash,
            endpoint,
            state: AgentState::Registered,
            registered_at: env.ledger().timestamp(),
            cumulative_earned: 0,
            payment_count: 0,
            last_payment_time: 0,
            revenue_buffer,
            last_slot_index: 0,
            sharpe_scaled: 0,
            last_proof_hash: BytesN::from_array(&env, &[0u8; 32]),
            credit_score: 0,
            rating: RatingTier::Unrated,
            capital_raised: 0,
            evolution_level: 0,
        };
        env.storage().instance().set(&DataKey::Agent(agent_id), &agent);
        env.storage().instance().set(&DataKey::NextAgentId, &(agent_id + 1));
        env.events().publish(("AgentRegistered",), (agent_id, agent.state));
        Ok(agent_id)
    }

    pub fn update_state(env: Env, caller: Address, agent_id: u64, new_state: AgentState) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        let mut agent = Self::load(&env, agent_id)?;
        if agent.state == AgentState::Deregistered {
            return Err(Error::AgentNotActive);
        }
        agent.state = new_state;
        env.storage().instance().set(&DataKey::Agent(agent_id), &agent);
        env.events().publish(("AgentStateChanged", agent_id), new_state);
        Ok(())
    }

    /// Slot is `(now_days / 30) mod 12`; a slot is zeroed the first time a
    /// newer period rolls into it, so the buffer always holds the trailing
    /// year's worth of 30-day revenue buckets.
    pub fn record_revenue(env: Env, caller: Address, agent_id: u64, amount: i128) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        let mut agent = Self::load(&env, agent_id)?;
        let now = env.ledger().timestamp();
        let slot = ((now / SLOT_PERIOD_SECONDS) % REVENUE_SLOTS as u64) as u32;
        if slot != agent.last_slot_index {
            agent.revenue_buffer.set(slot, 0);
            agent.last_slot_index = slot;
        }
        let prior = agent.revenue_buffer.get(slot).unwrap_or(0);
        agent.revenue_buffer.set(slot, prior + amount);
        agent.cumulative_earned = agent.cumulative_earned.saturating_add(amount);
        agent.payment_count += 1;
        agent.last_payment_time = now;
        env.storage().instance().set(&DataKey::Agent(agent_id), &agent);
        env.events().publish(("RevenueRecorded", agent_id), amount);
        Ok(())
    }

    pub fn update_sharpe(
        env: Env,
        caller: Address,
        agent_id: u64,
        sharpe_scaled: i128,
        proof_hash: BytesN<32>,
    ) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        let mut agent = Self::load(&env, agent_id)?;
        agent.sharpe_scaled = sharpe_scaled;
        agent.last_proof_hash = proof_hash;
        env.storage().instance().set(&DataKey::Agent(agent_id), &agent);
        Ok(())
    }

    /// Recomputes the composite credit score from the current profile plus
    /// two externally-supplied normalised factors (revenue stability and
    /// payment frequency, 0..=10000) that the Controller derives off-chain
    /// and passes in on every call. Emits `CreditRatingUpdated` only when
    /// the rating letter actually changes.
    pub fn recalc_credit(
        env: Env,
        caller: Address,
        agent_id: u64,
        revenue_stability_bps: u32,
        payment_frequency_bps: u32,
    ) -> Result<RatingTier, Error> {
        Self::require_controller(&env, &caller)?;
        let mut agent = Self::load(&env, agent_id)?;

        let sharpe_factor = clamp_bps(agent.sharpe_scaled * 10_000 / (3 * FP_SCALE));
        let stability_factor = clamp_bps(revenue_stability_bps as i128);
        let frequency_factor = clamp_bps(payment_frequency_bps as i128);
        let age = (env.ledger().timestamp().saturating_sub(agent.registered_at)) as i128;
        let age_factor = clamp_bps(age * 10_000 / SECONDS_PER_YEAR);
        let revenue_factor = clamp_bps(agent.cumulative_earned * 10_000 / (100 * FP_SCALE));

        let weighted = sharpe_factor * 3500
            + stability_factor * 2500
            + frequency_factor * 1500
            + age_factor * 1000
            + revenue_factor * 1500;
        let composite = weighted / 10_000;

        let new_rating = rating_from_score(composite);
        let rating_changed = new_rating != agent.rating;
        agent.credit_score = composite;
        agent.rating = new_rating;
        env.storage().instance().set(&DataKey::Agent(agent_id), &agent);
        if rating_changed {
            env.events().publish(("CreditRatingUpdated", agent_id), new_rating);
        }
        Ok(new_rating)
    }

    pub fn record_capital_raised(env: Env, caller: Address, agent_id: u64, amount: i128) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        let mut agent = Self::load(&env, agent_id)?;
        agent.capital_raised = agent.capital_raised.saturating_add(amount);

        let mut level = agent.evolution_level;
        while (level as usize) < EVOLUTION_THRESHOLDS.len()
            && agent.capital_raised >= EVOLUTION_THRESHOLDS[level as usize]
        {
            level += 1;
        }
        let changed = level != agent.evolution_level;
        agent.evolution_level = level;
        env.storage().instance().set(&DataKey::Agent(agent_id), &agent);
        if changed {
            env.events().publish(("CapitalEvolution", agent_id), level);
        }
        Ok(())
    }

    pub fn set_attested_operator(env: Env, caller: Address, agent_id: u64, operator: Address) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        env.storage().instance().set(&DataKey::AttestedOperator(agent_id), &operator);
        Ok(())
    }

    pub fn attested_operator(env: Env, agent_id: u64) -> Option<Address> {
        env.storage().instance().get(&DataKey::AttestedOperator(agent_id))
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    pub fn get_agent(env: Env, agent_id: u64) -> Option<Agent> {
        env.storage().instance().get(&DataKey::Agent(agent_id))
    }

    pub fn is_active(env: Env, agent_id: u64) -> bool {
        match Self::load(&env, agent_id) {
            Ok(agent) => agent.state == AgentState::Active,
            Err(_) => false,
        }
    }

    pub fn agent_count(env: Env) -> u64 {
        env.storage().instance().get(&DataKey::NextAgentId).unwrap_or(1) - 1
    }
}

fn clamp_bps(x: i128) -> i128 {
    if x < 0 {
        0
    } else if x > 10_000 {
        10_000
    } else {
        x
    }
}
