//! # Tranching Engine
//!
//! Optional overlay that pairs a senior and a junior bond class for one
//! agent and computes the senior's time-weighted entitlement so the
//! Controller can route a revenue distribution waterfall-first. Holds a
//! distinct "class creator" capability on the bond ledger so it can create
//! the two paired classes without inheriting the Controller's full
//! authority over issuance, transfers, and burns.

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env};
use veritasor_common::{Error, Token, Tranche, BPS_DENOM, SECONDS_PER_YEAR};

#[cfg(target_arch = "wasm32")]
mod bond_ledger_import {
    soroban_sdk::contractimport!(
        file = "../../target/wasm32-unknown-unknown/release/veritasor_bond_ledger.wasm"
    );
    pub use Client as BondLedgerClient;
}
#[cfg(not(target_arch = "wasm32"))]
mod bond_ledger_import {
    pub use veritasor_bond_ledger::BondLedgerContractClient as BondLedgerClient;
    pub use veritasor_bond_ledger::BondClass;
}


#[contracttype]
#[derive(Clone, Debug)]
enum DataKey {
    Admin,
    Controller,
    BondLedger,
    NextGroupId,
    Group(u64),
    ClassToGroup(u32),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrancheGroup {
    pub agent_id: u64,
    pub senior_class_id: u32,
    pub senior_nonce_id: u32,
    pub junior_class_id: u32,
    pub junior_nonce_id: u32,
    pub senior_coupon_bps: u32,
    pub junior_coupon_bps: u32,
    pub payment_token: Token,
}

#[contract]
pub struct TranchingEngineContract;

#[contractimpl]
impl TranchingEngineContract {
    pub fn initialize(env: Env, admin: Address, bond_ledger: Address) {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::BondLedger, &bond_ledger);
        env.storage().instance().set(&DataKey::NextGroupId, &1u64);
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

    fn ledger_client(env: &Env) -> bond_ledger_import::BondLedgerClient<'static> {
        let addr: Address = env.storage().instance().get(&DataKey::BondLedger).unwrap();
        bond_ledger_import::BondLedgerClient::new(env, &addr)
    }

    /// Operator-only. Pairs a senior and junior class for `agent_id`,
    /// creating both via the bond ledger (under this contract's own
    /// class-creator capability) and a single nonce for each. Fails on any
    /// zero-valued parameter, matching the source's test fixtures.
    pub fn create_group(
        env: Env,
        caller: Address,
        agent_id: u64,
        senior_coupon_bps: u32,
        junior_coupon_bps: u32,
        maturity_period: u64,
        senior_max_supply: i128,
        junior_max_supply: i128,
        sharpe_at_issue: i128,
        payment_token: Token,
        senior_price: i128,
        junior_price: i128,
    ) -> Result<u64, Error> {
        Self::require_controller(&env, &caller)?;
        if senior_coupon_bps == 0
            || junior_coupon_bps == 0
            || maturity_period == 0
            || senior_max_supply == 0
            || junior_max_supply == 0
            || senior_price == 0
            || junior_price == 0
        {
            return Err(Error::ZeroAmount);
        }

        let ledger = Self::ledger_client(&env);
        let this = env.current_contract_address();

        let senior_class_id = ledger.create_class(
            &this,
            &agent_id,
            &senior_coupon_bps,
            &maturity_period,
            &sharpe_at_issue,
            &senior_max_supply,
            &Tranche::Senior,
            &payment_token,
        );
        let senior_nonce_id = ledger.create_nonce(&this, &senior_class_id, &senior_price);

        let junior_class_id = ledger.create_class(
            &this,
            &agent_id,
            &junior_coupon_bps,
            &maturity_period,
            &sharpe_at_issue,
            &junior_max_supply,
            &Tranche::Junior,
            &payment_token,
        );
        let junior_nonce_id = ledger.create_nonce(&this, &junior_class_id, &junior_price);

        let group_id: u64 = env.storage().instance().get(&DataKey::NextGroupId).unwrap_or(1);
        let group = TrancheGroup {
            agent_id,
            senior_class_id,
            senior_nonce_id,
            junior_class_id,
            junior_nonce_id,
            senior_coupon_bps,
            junior_coupon_bps,
            payment_token,
        };
        env.storage().instance().set(&DataKey::Group(group_id), &group);
        env.storage().instance().set(&DataKey::ClassToGroup(senior_class_id), &group_id);
        env.storage().instance().set(&DataKey::ClassToGroup(junior_class_id), &group_id);
        env.storage().instance().set(&DataKey::NextGroupId, &(group_id + 1));

        env.events()
            .publish(("TrancheGroupCreated", agent_id), (group_id, senior_class_id, junior_class_id));
        Ok(group_id)
    }

    /// `seniorSupply × seniorCouponBps × timeDelta / (10000 × SECONDS_PER_YEAR)`.
    /// Zero supply yields zero entitlement.
    pub fn senior_entitlement(env: Env, group_id: u64, time_delta: u64) -> Result<i128, Error> {
        let group: TrancheGroup = env
            .storage()
            .instance()
            .get(&DataKey::Group(group_id))
            .ok_or(Error::GroupMissing)?;
        let ledger = Self::ledger_client(&env);
        let supply = ledger.total_supply(&group.senior_class_id, &group.senior_nonce_id);
        if supply == 0 {
            return Ok(0);
        }
        let numerator = supply
            .saturating_mul(group.senior_coupon_bps as i128)
            .saturating_mul(time_delta as i128);
        let denom = BPS_DENOM.saturating_mul(SECONDS_PER_YEAR as i128);
        Ok(numerator / denom)
    }

    pub fn get_group(env: Env, group_id: u64) -> Option<TrancheGroup> {
        env.storage().instance().get(&DataKey::Group(group_id))
    }

    pub fn class_to_group(env: Env, class_id: u32) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::ClassToGroup(class_id))
            .unwrap_or(0)
    }

    pub fn is_tranched(env: Env, class_id: u32) -> bool {
        Self::class_to_group(env, class_id) != 0
    }

    pub fn counterpart(env: Env, class_id: u32) -> u32 {
        let group_id = Self::class_to_group(env.clone(), class_id);
        if group_id == 0 {
            return 0;
        }
        let group: TrancheGroup = env.storage().instance().get(&DataKey::Group(group_id)).unwrap();
        if group.senior_class_id == class_id {
            group.junior_class_id
        } else {
            group.senior_class_id
        }
    }

    pub fn group_count(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::NextGroupId)
            .unwrap_or(1)
            - 1
    }
}
