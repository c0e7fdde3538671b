//! # Token Registry
//!
//! Whitelists the payment assets the rest of the suite is allowed to move:
//! the chain's native asset (implicitly, at `initialize`) plus an
//! open-ended set of fungible tokens. Every cash-handling contract
//! (bond-ledger, attested-receiver, controller, order-book) consults this
//! registry before accepting a `Token` argument.

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env, String, Vec};
use veritasor_common::{Error, Token};

#[contracttype]
#[derive(Clone, Debug)]
enum DataKey {
    Admin,
    Info(Token),
    AllTokens,
    NativeAddress,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u32,
    pub price_unit: i128,
    pub active: bool,
}

#[contract]
pub struct TokenRegistryContract;

#[contractimpl]
impl TokenRegistryContract {
    /// One-time setup. Registers the native asset (its concrete Stellar
    /// Asset Contract address, since Soroban has no separate "value sent
    /// with call" channel the way an EVM chain does — the native asset is
    /// moved through the same `token::Client` interface as any other
    /// asset) with the given initial price. The source hardcodes symbol
    /// "BNB" / 18 decimals; we keep the symbol configurable since the
    /// native asset differs per deployment.
    pub fn initialize(
        env: Env,
        admin: Address,
        native_token: Address,
        native_symbol: String,
        native_price_unit: i128,
    ) {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::NativeAddress, &native_token);

        let native = Token::Native;
        env.storage().instance().set(
            &DataKey::Info(native.clone()),
            &TokenInfo {
                symbol: native_symbol,
                decimals: 18,
                price_unit: native_price_unit,
                active: true,
            },
        );
        let mut all: Vec<Token> = Vec::new(&env);
        all.push_back(native);
        env.storage().instance().set(&DataKey::AllTokens, &all);

        env.events().publish((String::from_str(&env, "init"),), admin);
    }

    fn require_admin(env: &Env) {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized");
        admin.require_auth();
    }

    /// Admin-only. Adds a fungible token to the whitelist. Rejects the
    /// native sentinel (added implicitly at `initialize`) and re-adding an
    /// already-active token.
    pub fn add_token(
        env: Env,
        token: Address,
        symbol: String,
        decimals: u32,
        price_unit: i128,
    ) -> Result<(), Error> {
        Self::require_admin(&env);
        let key = Token::Fungible(token);
        if let Some(existing) = env
            .storage()
            .instance()
            .get::<_, TokenInfo>(&DataKey::Info(key.clone()))
        {
            if existing.active {
                return Err(Error::TokenAlreadyActive);
            }
        }
        let info = TokenInfo {
            symbol,
            decimals,
            price_unit,
            active: true,
        };
        env.storage().instance().set(&DataKey::Info(key.clone()), &info);

        let mut all: Vec<Token> = env
            .storage()
            .instance()
            .get(&DataKey::AllTokens)
            .unwrap_or_else(|| Vec::new(&env));
        if !all.contains(&key) {
            all.push_back(key.clone());
            env.storage().instance().set(&DataKey::AllTokens, &all);
        }

        env.events()
            .publish((String::from_str(&env, "token_added"),), key);
        Ok(())
    }

    /// Admin-only. Marks a fungible token inactive; history (its `TokenInfo`
    /// record) is preserved. Rejects the native sentinel.
    pub fn remove_token(env: Env, token: Token) -> Result<(), Error> {
        Self::require_admin(&env);
        if token.is_native() {
            return Err(Error::CannotRemoveNative);
        }
        let mut info: TokenInfo = env
            .storage()
            .instance()
            .get(&DataKey::Info(token.clone()))
            .ok_or(Error::UnsupportedToken)?;
        info.active = false;
        env.storage().instance().set(&DataKey::Info(token), &info);
        Ok(())
    }

    /// Admin-only. Updates the last-known unit price of an active token.
    pub fn update_price(env: Env, token: Token, new_price_unit: i128) -> Result<(), Error> {
        Self::require_admin(&env);
        let mut info: TokenInfo = env
            .storage()
            .instance()
            .get(&DataKey::Info(token.clone()))
            .ok_or(Error::UnsupportedToken)?;
        if !info.active {
            return Err(Error::InactiveToken);
        }
        info.price_unit = new_price_unit;
        env.storage().instance().set(&DataKey::Info(token), &info);
        Ok(())
    }

    pub fn is_supported(env: Env, token: Token) -> bool {
        env.storage()
            .instance()
            .get::<_, TokenInfo>(&DataKey::Info(token))
            .map(|i| i.active)
            .unwrap_or(false)
    }

    pub fn token_info(env: Env, token: Token) -> Result<TokenInfo, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Info(token))
            .ok_or(Error::UnsupportedToken)
    }

    pub fn token_price(env: Env, token: Token) -> Result<i128, Error> {
        let info: TokenInfo = env
            .storage()
            .instance()
            .get(&DataKey::Info(token))
            .ok_or(Error::UnsupportedToken)?;
        if !info.active {
            return Err(Error::InactiveToken);
        }
        Ok(info.price_unit)
    }

    /// Insertion-ordered list of every token ever added, including inactive
    /// ones; callers filter by `TokenInfo::active`.
    pub fn all_tokens(env: Env) -> Vec<Token> {
        env.storage()
            .instance()
            .get(&DataKey::AllTokens)
            .unwrap_or_else(|| Vec::new(&env))
    }

    /// Resolves a `Token` to the concrete `Address` a `token::Client` can
    /// move funds through (the native asset's own SAC address for
    /// `Token::Native`, the wrapped address for `Token::Fungible`).
    pub fn resolve_address(env: Env, token: Token) -> Result<Address, Error> {
        if !Self::is_supported(env.clone(), token.clone()) {
            return Err(Error::UnsupportedToken);
        }
        match token {
            Token::Native => env
                .storage()
                .instance()
                .get(&DataKey::NativeAddress)
                .ok_or(Error::UnsupportedToken),
            Token::Fungible(addr) => Ok(addr),
        }
    }
}

#[cfg(test)]
mod test;
