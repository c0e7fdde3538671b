//! # Bond Ledger
//!
//! Semi-fungible bond accounting (`BondRegistry`) fused with the
//! MasterChef-style pull-dividend accumulator (`DividendVault`). The two
//! are merged into one contract per the licence in the design notes: the
//! pre-transfer settlement hook becomes a private function call instead of
//! a cross-contract round trip, which removes an entire class of
//! reentrancy surface while preserving the exact same accounting.
//!
//! Every mutating entry point here is gated to a single "controller"
//! capability set once at wiring time, plus an optional second
//! "class creator" capability (the tranching engine, which needs to call
//! `create_class`/`create_nonce` on an agent's behalf but must never touch
//! balances or dividends).

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env, Vec};
use veritasor_common::{accrued, acc_per_bond_delta, Error, Token, Tranche};

/// Token-registry client: wasm import for wasm32, the real generated
/// client (same pattern the teacher uses for cross-contract calls) for
/// host-side tests.
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


#[contracttype]
#[derive(Clone, Debug)]
enum DataKey {
    Admin,
    Controller,
    ClassCreator,
    TokenRegistry,
    NextClassId,
    NextNonceId(u32),
    Class(u32),
    Nonce(u32, u32),
    Balance(u32, u32, Address),
    Approval(Address, Address),
    AgentClasses(u64),
    AgentTrancheClasses(u64, Tranche),
    AccPerBond(u32, u32, Token),
    TotalDeposited(u32, u32, Token),
    DepositedTokens(u32, u32),
    RewardDebt(Address, u32, u32, Token),
    PendingRealised(Address, u32, u32, Token),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondClass {
    pub agent_id: u64,
    pub coupon_bps: u32,
    pub maturity_period: u64,
    pub sharpe_at_issue: i128,
    pub max_supply: i128,
    pub total_issued: i128,
    pub tranche: Tranche,
    pub token: Token,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondNonce {
    pub issue_timestamp: u64,
    pub maturity_timestamp: u64,
    pub total_issued: i128,
    pub burned: i128,
    pub price_per_bond: i128,
    pub redeemable: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondTuple {
    pub class_id: u32,
    pub nonce_id: u32,
    pub amount: i128,
}

#[contract]
pub struct BondLedgerContract;

#[contractimpl]
impl BondLedgerContract {
    /// One-time setup. `admin` may later bind `controller` and
    /// `class_creator` exactly once each (the cyclic-reference break-out
    /// from the design notes: leaves are constructed with no controller
    /// bound, then handed the controller's identity in a one-shot call).
    pub fn initialize(env: Env, admin: Address, token_registry: Address) {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::TokenRegistry, &token_registry);
        env.storage().instance().set(&DataKey::NextClassId, &1u32);
    }

    fn require_admin(env: &Env) {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized");
        admin.require_auth();
    }

    /// Admin-only, once. Binds the Controller capability.
    pub fn set_controller(env: Env, controller: Address) {
        Self::require_admin(&env);
        if env.storage().instance().has(&DataKey::Controller) {
            panic!("controller already set");
        }
        env.storage().instance().set(&DataKey::Controller, &controller);
    }

    /// Admin-only, once. Binds the TranchingEngine's class-creator
    /// capability (open question in design notes §9: resolved here as a
    /// distinct role rather than toggling the Controller's own role).
    pub fn set_class_creator(env: Env, class_creator: Address) {
        Self::require_admin(&env);
        if env.storage().instance().has(&DataKey::ClassCreator) {
            panic!("class creator already set");
        }
        env.storage()
            .instance()
            .set(&DataKey::ClassCreator, &class_creator);
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

    fn require_class_creator(env: &Env, caller: &Address) -> Result<(), Error> {
        let controller: Option<Address> = env.storage().instance().get(&DataKey::Controller);
        let creator: Option<Address> = env.storage().instance().get(&DataKey::ClassCreator);
        let ok = controller.as_ref() == Some(caller) || creator.as_ref() == Some(caller);
        if !ok {
            return Err(Error::NotController);
        }
        caller.require_auth();
        Ok(())
    }

    fn token_registry_client(env: &Env) -> token_registry_import::TokenRegistryClient<'static> {
        let addr: Address = env.storage().instance().get(&DataKey::TokenRegistry).unwrap();
        token_registry_import::TokenRegistryClient::new(env, &addr)
    }

    fn resolve_token(env: &Env, token: &Token) -> Result<Address, Error> {
        let client = Self::token_registry_client(env);
        let supported = client.is_supported(token);
        if !supported {
            return Err(Error::UnsupportedToken);
        }
        Ok(client.resolve_address(token))
    }

    // ---------------------------------------------------------------
    // Class / nonce lifecycle
    // ---------------------------------------------------------------

    pub fn create_class(
        env: Env,
        caller: Address,
        agent_id: u64,
        coupon_bps: u32,
        maturity_period: u64,
        sharpe_at_issue: i128,
        max_supply: i128,
        tranche: Tranche,
        payment_token: Token,
    ) -> Result<u32, Error> {
        Self::require_class_creator(&env, &caller)?;
        if coupon_bps == 0 || coupon_bps > 10_000 {
            return Err(Error::CouponOutOfRange);
        }
        if maturity_period == 0 {
            return Err(Error::MaturityZero);
        }
        if max_supply <= 0 {
            return Err(Error::ZeroAmount);
        }
        if !Self::token_registry_client(&env).is_supported(&payment_token) {
            return Err(Error::UnsupportedToken);
        }

        let class_id: u32 = env.storage().instance().get(&DataKey::NextClassId).unwrap_or(1);
        let class = BondClass {
            agent_id,
            coupon_bps,
            maturity_period,
            sharpe_at_issue,
            max_supply,
            total_issued: 0,
            tranche,
            token: payment_token,
        };
        env.storage().instance().set(&DataKey::Class(class_id), &class);
        env.storage()
            .instance()
            .set(&DataKey::NextClassId, &(class_id + 1));
        env.storage().instance().set(&DataKey::NextNonceId(class_id), &0u32);

        let mut classes: Vec<u32> = env
            .storage()
            .instance()
            .get(&DataKey::AgentClasses(agent_id))
            .unwrap_or_else(|| Vec::new(&env));
        classes.push_back(class_id);
        env.storage()
            .instance()
            .set(&DataKey::AgentClasses(agent_id), &classes);

        let mut by_tranche: Vec<u32> = env
            .storage()
            .instance()
            .get(&DataKey::AgentTrancheClasses(agent_id, tranche))
            .unwrap_or_else(|| Vec::new(&env));
        by_tranche.push_back(class_id);
        env.storage()
            .instance()
            .set(&DataKey::AgentTrancheClasses(agent_id, tranche), &by_tranche);

        env.events().publish(("BondClassCreated", agent_id), class_id);
        Ok(class_id)
    }

    pub fn create_nonce(
        env: Env,
        caller: Address,
        class_id: u32,
        price_per_bond: i128,
    ) -> Result<u32, Error> {
        Self::require_class_creator(&env, &caller)?;
        let class: BondClass = env
            .storage()
            .instance()
            .get(&DataKey::Class(class_id))
            .ok_or(Error::BondClassMissing)?;
        if price_per_bond <= 0 {
            return Err(Error::ZeroAmount);
        }

        let nonce_id: u32 = env
            .storage()
            .instance()
            .get(&DataKey::NextNonceId(class_id))
            .unwrap_or(0);
        let issue_timestamp = env.ledger().timestamp();
        let nonce = BondNonce {
            issue_timestamp,
            maturity_timestamp: issue_timestamp + class.maturity_period,
            total_issued: 0,
            burned: 0,
            price_per_bond,
            redeemable: false,
        };
        env.storage()
            .instance()
            .set(&DataKey::Nonce(class_id, nonce_id), &nonce);
        env.storage()
            .instance()
            .set(&DataKey::NextNonceId(class_id), &(nonce_id + 1));

        env.events()
            .publish(("BondNonceCreated", class_id), (nonce_id, price_per_bond));
        Ok(nonce_id)
    }

    pub fn mark_redeemable(env: Env, caller: Address, class_id: u32, nonce_id: u32) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        let mut nonce: BondNonce = env
            .storage()
            .instance()
            .get(&DataKey::Nonce(class_id, nonce_id))
            .ok_or(Error::BondNonceMissing)?;
        nonce.redeemable = true;
        env.storage().instance().set(&DataKey::Nonce(class_id, nonce_id), &nonce);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Balance mutation: issue / transfer / burn
    // ---------------------------------------------------------------

    pub fn issue(env: Env, caller: Address, to: Address, tuples: Vec<BondTuple>) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        for t in tuples.iter() {
            if t.amount <= 0 {
                return Err(Error::ZeroAmount);
            }
            let mut class: BondClass = env
                .storage()
                .instance()
                .get(&DataKey::Class(t.class_id))
                .ok_or(Error::BondClassMissing)?;
            let mut nonce: BondNonce = env
                .storage()
                .instance()
                .get(&DataKey::Nonce(t.class_id, t.nonce_id))
                .ok_or(Error::BondNonceMissing)?;
            if class.total_issued + t.amount > class.max_supply {
                return Err(Error::SupplyExceeded);
            }

            let old_balance = Self::balance_of(env.clone(), to.clone(), t.class_id, t.nonce_id);
            let new_balance = old_balance + t.amount;
            Self::settle_holder(&env, &to, t.class_id, t.nonce_id, old_balance, new_balance);
            env.storage()
                .instance()
                .set(&DataKey::Balance(t.class_id, t.nonce_id, to.clone()), &new_balance);

            nonce.total_issued += t.amount;
            class.total_issued += t.amount;
            env.storage()
                .instance()
                .set(&DataKey::Nonce(t.class_id, t.nonce_id), &nonce);
            env.storage().instance().set(&DataKey::Class(t.class_id), &class);
        }
        env.events().publish(("Issue", to), tuples);
        Ok(())
    }

    pub fn transfer_from(
        env: Env,
        caller: Address,
        from: Address,
        to: Address,
        tuples: Vec<BondTuple>,
    ) -> Result<(), Error> {
        caller.require_auth();
        if caller != from && !Self::is_approved(env.clone(), from.clone(), caller.clone()) {
            return Err(Error::NotOperator);
        }
        for t in tuples.iter() {
            if t.amount <= 0 {
                return Err(Error::ZeroAmount);
            }
            let from_balance = Self::balance_of(env.clone(), from.clone(), t.class_id, t.nonce_id);
            if from_balance < t.amount {
                return Err(Error::InsufficientBalance);
            }
            let to_balance = Self::balance_of(env.clone(), to.clone(), t.class_id, t.nonce_id);

            let new_from = from_balance - t.amount;
            let new_to = to_balance + t.amount;
            Self::settle_holder(&env, &from, t.class_id, t.nonce_id, from_balance, new_from);
            Self::settle_holder(&env, &to, t.class_id, t.nonce_id, to_balance, new_to);

            env.storage()
                .instance()
                .set(&DataKey::Balance(t.class_id, t.nonce_id, from.clone()), &new_from);
            env.storage()
                .instance()
                .set(&DataKey::Balance(t.class_id, t.nonce_id, to.clone()), &new_to);
        }
        env.events().publish(("Transfer", from, to), tuples);
        Ok(())
    }

    pub fn burn(env: Env, caller: Address, from: Address, class_id: u32, nonce_id: u32, amount: i128) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        if amount <= 0 {
            return Err(Error::ZeroAmount);
        }
        let from_balance = Self::balance_of(env.clone(), from.clone(), class_id, nonce_id);
        if from_balance < amount {
            return Err(Error::InsufficientBalance);
        }
        let mut nonce: BondNonce = env
            .storage()
            .instance()
            .get(&DataKey::Nonce(class_id, nonce_id))
            .ok_or(Error::BondNonceMissing)?;

        let new_balance = from_balance - amount;
        Self::settle_holder(&env, &from, class_id, nonce_id, from_balance, new_balance);
        env.storage()
            .instance()
            .set(&DataKey::Balance(class_id, nonce_id, from.clone()), &new_balance);

        nonce.burned += amount;
        env.storage().instance().set(&DataKey::Nonce(class_id, nonce_id), &nonce);

        env.events().publish(("Burn", from), (class_id, nonce_id, amount));
        Ok(())
    }

    pub fn set_approval(env: Env, owner: Address, operator: Address, approved: bool) {
        owner.require_auth();
        env.storage()
            .instance()
            .set(&DataKey::Approval(owner, operator), &approved);
    }

    pub fn is_approved(env: Env, owner: Address, operator: Address) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::Approval(owner, operator))
            .unwrap_or(false)
    }

    // ---------------------------------------------------------------
    // Dividend accumulator (MasterChef pattern)
    // ---------------------------------------------------------------

    /// Settles `holder`'s pending accrual into `pendingRealised` across
    /// every token ever deposited for `(class_id, nonce_id)`, then resets
    /// `rewardDebt` against `new_balance`. Called before every balance
    /// mutation in `issue`/`transfer_from`/`burn` (the pre-change hook from
    /// spec §4.3, inlined as a private call since BondRegistry and
    /// DividendVault are fused into one contract).
    fn settle_holder(env: &Env, holder: &Address, class_id: u32, nonce_id: u32, old_balance: i128, new_balance: i128) {
        let tokens: Vec<Token> = env
            .storage()
            .instance()
            .get(&DataKey::DepositedTokens(class_id, nonce_id))
            .unwrap_or_else(|| Vec::new(env));
        for token in tokens.iter() {
            let acc: i128 = env
                .storage()
                .instance()
                .get(&DataKey::AccPerBond(class_id, nonce_id, token.clone()))
                .unwrap_or(0);
            let debt: i128 = env
                .storage()
                .instance()
                .get(&DataKey::RewardDebt(holder.clone(), class_id, nonce_id, token.clone()))
                .unwrap_or(0);
            let pending = accrued(old_balance, acc) - debt;
            let prior_realised: i128 = env
                .storage()
                .instance()
                .get(&DataKey::PendingRealised(holder.clone(), class_id, nonce_id, token.clone()))
                .unwrap_or(0);
            env.storage().instance().set(
                &DataKey::PendingRealised(holder.clone(), class_id, nonce_id, token.clone()),
                &(prior_realised + pending),
            );
            env.storage().instance().set(
                &DataKey::RewardDebt(holder.clone(), class_id, nonce_id, token.clone()),
                &accrued(new_balance, acc),
            );
        }
    }

    /// Operator-only. Deposits `amount` of `token` (pulled from `from`,
    /// normally the Controller, which already holds the revenue) into the
    /// accumulator for `(class_id, nonce_id)`. Fails with `ZeroSupply` if
    /// the nonce has no circulating bonds.
    pub fn deposit(
        env: Env,
        caller: Address,
        from: Address,
        class_id: u32,
        nonce_id: u32,
        token: Token,
        amount: i128,
    ) -> Result<(), Error> {
        Self::require_controller(&env, &caller)?;
        if amount <= 0 {
            return Err(Error::ZeroAmount);
        }
        let supply = Self::total_supply(env.clone(), class_id, nonce_id);
        if supply == 0 {
            return Err(Error::ZeroSupply);
        }

        let token_addr = Self::resolve_token(&env, &token)?;
        let token_client = soroban_sdk::token::Client::new(&env, &token_addr);
        token_client.transfer(&from, &env.current_contract_address(), &amount);

        let acc: i128 = env
            .storage()
            .instance()
            .get(&DataKey::AccPerBond(class_id, nonce_id, token.clone()))
            .unwrap_or(0);
        env.storage().instance().set(
            &DataKey::AccPerBond(class_id, nonce_id, token.clone()),
            &(acc + acc_per_bond_delta(amount, supply)),
        );
        let total: i128 = env
            .storage()
            .instance()
            .get(&DataKey::TotalDeposited(class_id, nonce_id, token.clone()))
            .unwrap_or(0);
        env.storage().instance().set(
            &DataKey::TotalDeposited(class_id, nonce_id, token.clone()),
            &(total + amount),
        );

        let mut tokens: Vec<Token> = env
            .storage()
            .instance()
            .get(&DataKey::DepositedTokens(class_id, nonce_id))
            .unwrap_or_else(|| Vec::new(&env));
        if !tokens.contains(&token) {
            tokens.push_back(token.clone());
            env.storage()
                .instance()
                .set(&DataKey::DepositedTokens(class_id, nonce_id), &tokens);
        }

        env.events()
            .publish(("DividendDeposited", class_id, nonce_id), (token, amount));
        Ok(())
    }

    pub fn claimable(env: Env, holder: Address, class_id: u32, nonce_id: u32, token: Token) -> i128 {
        let balance = Self::balance_of(env.clone(), holder.clone(), class_id, nonce_id);
        let acc: i128 = env
            .storage()
            .instance()
            .get(&DataKey::AccPerBond(class_id, nonce_id, token.clone()))
            .unwrap_or(0);
        let debt: i128 = env
            .storage()
            .instance()
            .get(&DataKey::RewardDebt(holder.clone(), class_id, nonce_id, token.clone()))
            .unwrap_or(0);
        let pending_realised: i128 = env
            .storage()
            .instance()
            .get(&DataKey::PendingRealised(holder, class_id, nonce_id, token))
            .unwrap_or(0);
        accrued(balance, acc) - debt + pending_realised
    }

    pub fn claim(env: Env, holder: Address, class_id: u32, nonce_id: u32, token: Token) -> Result<i128, Error> {
        holder.require_auth();
        let pending = Self::claimable(env.clone(), holder.clone(), class_id, nonce_id, token.clone());
        if pending == 0 {
            return Err(Error::NothingToClaim);
        }
        let balance = Self::balance_of(env.clone(), holder.clone(), class_id, nonce_id);
        let acc: i128 = env
            .storage()
            .instance()
            .get(&DataKey::AccPerBond(class_id, nonce_id, token.clone()))
            .unwrap_or(0);
        env.storage().instance().set(
            &DataKey::RewardDebt(holder.clone(), class_id, nonce_id, token.clone()),
            &accrued(balance, acc),
        );
        env.storage().instance().set(
            &DataKey::PendingRealised(holder.clone(), class_id, nonce_id, token.clone()),
            &0i128,
        );

        let token_addr = Self::resolve_token(&env, &token)?;
        let token_client = soroban_sdk::token::Client::new(&env, &token_addr);
        token_client.transfer(&env.current_contract_address(), &holder, &pending);

        env.events()
            .publish(("DividendClaimed", holder, class_id, nonce_id), (token, pending));
        Ok(pending)
    }

    // ---------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------

    pub fn balance_of(env: Env, holder: Address, class_id: u32, nonce_id: u32) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::Balance(class_id, nonce_id, holder))
            .unwrap_or(0)
    }

    pub fn total_supply(env: Env, class_id: u32, nonce_id: u32) -> i128 {
        match env
            .storage()
            .instance()
            .get::<_, BondNonce>(&DataKey::Nonce(class_id, nonce_id))
        {
            Some(n) => n.total_issued - n.burned,
            None => 0,
        }
    }

    pub fn get_class(env: Env, class_id: u32) -> Option<BondClass> {
        env.storage().instance().get(&DataKey::Class(class_id))
    }

    pub fn get_nonce(env: Env, class_id: u32, nonce_id: u32) -> Option<BondNonce> {
        env.storage().instance().get(&DataKey::Nonce(class_id, nonce_id))
    }

    pub fn agent_classes(env: Env, agent_id: u64) -> Vec<u32> {
        env.storage()
            .instance()
            .get(&DataKey::AgentClasses(agent_id))
            .unwrap_or_else(|| Vec::new(&env))
    }

    pub fn classes_by_tranche(env: Env, agent_id: u64, tranche: Tranche) -> Vec<u32> {
        env.storage()
            .instance()
            .get(&DataKey::AgentTrancheClasses(agent_id, tranche))
            .unwrap_or_else(|| Vec::new(&env))
    }

    pub fn next_nonce_id(env: Env, class_id: u32) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::NextNonceId(class_id))
            .unwrap_or(0)
    }
}
