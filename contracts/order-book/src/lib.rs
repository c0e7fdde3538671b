//! # Order Book
//!
//! Maker/taker secondary market for bonds, sitting beside the Controller
//! rather than under it: it only ever touches BondLedger and
//! TokenRegistry, never the Controller, AgentRegistry, or
//! TranchingEngine. A sell order escrows bonds; a buy order escrows cash;
//! `fill_order` settles one side against the other and takes a protocol
//! fee out of whichever cash leg exists.

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Env};
use veritasor_common::{bps_of, Error, Token};

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
    pub use veritasor_bond_ledger::BondTuple;
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

use bond_ledger_import::BondTuple;


#[contracttype]
#[derive(Clone, Debug)]
enum DataKey {
    Admin,
    BondLedger,
    TokenRegistry,
    FeeBps,
    FeeCollector,
    NextOrderId,
    Order(u64),
    LenderAccessRequired(u32),
    LenderAllowed(u32, Address),
}

const DEFAULT_FEE_BPS: u32 = 30;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Order {
    pub maker: Address,
    pub class_id: u32,
    pub nonce_id: u32,
    pub remaining: i128,
    pub price_per_bond: i128,
    pub token: Token,
    pub is_sell: bool,
    pub expiry: u64,
    pub active: bool,
}

#[contract]
pub struct OrderBookContract;

#[contractimpl]
impl OrderBookContract {
    pub fn initialize(env: Env, admin: Address, bond_ledger: Address, token_registry: Address, fee_collector: Address) {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::BondLedger, &bond_ledger);
        env.storage().instance().set(&DataKey::TokenRegistry, &token_registry);
        env.storage().instance().set(&DataKey::FeeCollector, &fee_collector);
        env.storage().instance().set(&DataKey::FeeBps, &DEFAULT_FEE_BPS);
        env.storage().instance().set(&DataKey::NextOrderId, &1u64);
    }

    fn require_admin(env: &Env) -> Result<(), Error> {
        let admin: Address = env.storage().instance().get(&DataKey::Admin).ok_or(Error::NotInitialized)?;
        admin.require_auth();
        Ok(())
    }

    fn ledger_client(env: &Env) -> bond_ledger_import::BondLedgerClient<'static> {
        let addr: Address = env.storage().instance().get(&DataKey::BondLedger).expect("not initialized");
        bond_ledger_import::BondLedgerClient::new(env, &addr)
    }

    fn registry_client(env: &Env) -> token_registry_import::TokenRegistryClient<'static> {
        let addr: Address = env.storage().instance().get(&DataKey::TokenRegistry).expect("not initialized");
        token_registry_import::TokenRegistryClient::new(env, &addr)
    }

    fn resolve_token(env: &Env, token: &Token) -> Result<Address, Error> {
        let registry = Self::registry_client(env);
        if !registry.is_supported(token) {
            return Err(Error::UnsupportedToken);
        }
        Ok(registry.resolve_address(token))
    }

    fn next_order_id(env: &Env) -> u64 {
        let id: u64 = env.storage().instance().get(&DataKey::NextOrderId).unwrap_or(1);
        env.storage().instance().set(&DataKey::NextOrderId, &(id + 1));
        id
    }

    fn load_order(env: &Env, order_id: u64) -> Result<Order, Error> {
        env.storage().instance().get(&DataKey::Order(order_id)).ok_or(Error::NotFound)
    }

    // -----------------------------------------------------------------
    // Lender/holder allow-list (supplementary, off by default)
    // -----------------------------------------------------------------

    pub fn set_lender_access_required(env: Env, class_id: u32, required: bool) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::LenderAccessRequired(class_id), &required);
        Ok(())
    }

    pub fn set_lender_allowed(env: Env, class_id: u32, counterparty: Address, allowed: bool) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::LenderAllowed(class_id, counterparty), &allowed);
        Ok(())
    }

    fn check_counterparty(env: &Env, class_id: u32, party: &Address) -> Result<(), Error> {
        let required: bool = env
            .storage()
            .instance()
            .get(&DataKey::LenderAccessRequired(class_id))
            .unwrap_or(false);
        if !required {
            return Ok(());
        }
        let allowed: bool = env
            .storage()
            .instance()
            .get(&DataKey::LenderAllowed(class_id, party.clone()))
            .unwrap_or(false);
        if allowed {
            Ok(())
        } else {
            Err(Error::RelayNotAllowed)
        }
    }

    pub fn set_fee_bps(env: Env, bps: u32) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::FeeBps, &bps);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Order creation
    // -----------------------------------------------------------------

    pub fn create_sell_order(
        env: Env,
        maker: Address,
        class_id: u32,
        nonce_id: u32,
        amount: i128,
        price_per_bond: i128,
        token: Token,
        expiry: u64,
    ) -> Result<u64, Error> {
        maker.require_auth();
        if amount <= 0 || price_per_bond <= 0 {
            return Err(Error::ZeroAmount);
        }
        Self::resolve_token(&env, &token)?;
        Self::check_counterparty(&env, class_id, &maker)?;

        let this = env.current_contract_address();
        let mut tuples = soroban_sdk::Vec::new(&env);
        tuples.push_back(BondTuple { class_id, nonce_id, amount });
        Self::ledger_client(&env).transfer_from(&maker, &maker, &this, &tuples);

        let order_id = Self::next_order_id(&env);
        let order = Order {
            maker: maker.clone(),
            class_id,
            nonce_id,
            remaining: amount,
            price_per_bond,
            token,
            is_sell: true,
            expiry,
            active: true,
        };
        env.storage().instance().set(&DataKey::Order(order_id), &order);
        env.events().publish(("OrderCreated", order_id), (maker, class_id, nonce_id, amount, true));
        Ok(order_id)
    }

    pub fn create_buy_order(
        env: Env,
        maker: Address,
        class_id: u32,
        nonce_id: u32,
        amount: i128,
        price_per_bond: i128,
        token: Token,
        expiry: u64,
    ) -> Result<u64, Error> {
        maker.require_auth();
        if amount <= 0 || price_per_bond <= 0 {
            return Err(Error::ZeroAmount);
        }
        Self::check_counterparty(&env, class_id, &maker)?;
        let resolved = Self::resolve_token(&env, &token)?;

        let this = env.current_contract_address();
        let total_cost = amount.saturating_mul(price_per_bond);
        token::Client::new(&env, &resolved).transfer(&maker, &this, &total_cost);

        let order_id = Self::next_order_id(&env);
        let order = Order {
            maker: maker.clone(),
            class_id,
            nonce_id,
            remaining: amount,
            price_per_bond,
            token,
            is_sell: false,
            expiry,
            active: true,
        };
        env.storage().instance().set(&DataKey::Order(order_id), &order);
        env.events().publish(("OrderCreated", order_id), (maker, class_id, nonce_id, amount, false));
        Ok(order_id)
    }

    // -----------------------------------------------------------------
    // Fill / cancel
    // -----------------------------------------------------------------

    pub fn fill_order(env: Env, taker: Address, order_id: u64, fill_amount: i128) -> Result<(), Error> {
        taker.require_auth();
        let mut order = Self::load_order(&env, order_id)?;
        if !order.active {
            return Err(Error::OrderInactive);
        }
        if order.expiry != 0 && env.ledger().timestamp() > order.expiry {
            return Err(Error::OrderExpired);
        }
        if fill_amount <= 0 || fill_amount > order.remaining {
            return Err(Error::OrderOverfill);
        }
        Self::check_counterparty(&env, order.class_id, &taker)?;

        let this = env.current_contract_address();
        let resolved = Self::resolve_token(&env, &order.token)?;
        let cash_client = token::Client::new(&env, &resolved);
        let fee_bps: u32 = env.storage().instance().get(&DataKey::FeeBps).unwrap_or(DEFAULT_FEE_BPS);
        let collector: Address = env.storage().instance().get(&DataKey::FeeCollector).expect("not initialized");
        let cost = fill_amount.saturating_mul(order.price_per_bond);
        let fee = bps_of(cost, fee_bps);
        let net = cost - fee;

        let mut tuples = soroban_sdk::Vec::new(&env);
        tuples.push_back(BondTuple { class_id: order.class_id, nonce_id: order.nonce_id, amount: fill_amount });

        if order.is_sell {
            cash_client.transfer(&taker, &order.maker, &net);
            if fee > 0 {
                cash_client.transfer(&taker, &collector, &fee);
            }
            Self::ledger_client(&env).transfer_from(&this, &this, &taker, &tuples);
        } else {
            Self::ledger_client(&env).transfer_from(&taker, &taker, &order.maker, &tuples);
            cash_client.transfer(&this, &taker, &net);
            if fee > 0 {
                cash_client.transfer(&this, &collector, &fee);
            }
        }

        order.remaining -= fill_amount;
        if order.remaining == 0 {
            order.active = false;
        }
        env.storage().instance().set(&DataKey::Order(order_id), &order);
        env.events().publish(("OrderFilled", order_id), (taker, fill_amount, order.remaining));
        Ok(())
    }

    pub fn cancel_order(env: Env, caller: Address, order_id: u64) -> Result<(), Error> {
        caller.require_auth();
        let mut order = Self::load_order(&env, order_id)?;
        if caller != order.maker {
            return Err(Error::NotOwner);
        }
        if !order.active {
            return Err(Error::OrderInactive);
        }

        let this = env.current_contract_address();
        if order.remaining > 0 {
            if order.is_sell {
                let mut tuples = soroban_sdk::Vec::new(&env);
                tuples.push_back(BondTuple { class_id: order.class_id, nonce_id: order.nonce_id, amount: order.remaining });
                Self::ledger_client(&env).transfer_from(&this, &this, &order.maker, &tuples);
            } else {
                let resolved = Self::resolve_token(&env, &order.token)?;
                let refund = order.remaining.saturating_mul(order.price_per_bond);
                token::Client::new(&env, &resolved).transfer(&this, &order.maker, &refund);
            }
        }

        order.remaining = 0;
        order.active = false;
        env.storage().instance().set(&DataKey::Order(order_id), &order);
        env.events().publish(("OrderCancelled", order_id), caller);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    pub fn get_order(env: Env, order_id: u64) -> Option<Order> {
        env.storage().instance().get(&DataKey::Order(order_id))
    }

    pub fn order_count(env: Env) -> u64 {
        env.storage().instance().get(&DataKey::NextOrderId).unwrap_or(1) - 1
    }
}
