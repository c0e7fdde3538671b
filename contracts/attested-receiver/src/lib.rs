//! # Attested Receiver
//!
//! The suite's only entry point from the outside world: agents and their
//! operators push revenue in here, never directly into the Controller.
//! Three paths differ only in how the payer's identity is authorised —
//! a direct caller, a relayed meta-transaction, or an attested operator
//! vouching for off-chain execution — but all three end the same way,
//! forwarding a real token transfer into the Controller's balance and
//! then calling `Controller::on_revenue` for bookkeeping.

#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Bytes, BytesN, Env, String};
use veritasor_common::{Error, Token};

#[cfg(target_arch = "wasm32")]
mod controller_import {
    soroban_sdk::contractimport!(
        file = "../../target/wasm32-unknown-unknown/release/veritasor_controller.wasm"
    );
    pub use Client as ControllerClient;
}
#[cfg(not(target_arch = "wasm32"))]
mod controller_import {
    pub use veritasor_controller::ControllerContractClient as ControllerClient;
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
    Controller,
    TokenRegistry,
    NextRecordId,
    PayerNonce(Address),
    RelayRestricted,
    RelayAllowed(Address),
    AttestedSigner(u64),
    VerifiedRevenue(u64),
    SeenReceipt(BytesN<32>),
    ReplayWindowSeconds,
    FeeConfig,
    Anomaly(u64),
}

const DEFAULT_REPLAY_WINDOW_SECONDS: u64 = 3600;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentRecord {
    pub payer: Address,
    pub agent_id: u64,
    pub token: Token,
    pub amount: i128,
    pub endpoint: String,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifiedPaymentRecord {
    pub payer: Address,
    pub agent_id: u64,
    pub token: Token,
    pub endpoint: String,
    pub amount: i128,
    pub timestamp: u64,
    pub logic_hash: BytesN<32>,
    pub signer: Address,
}

/// Flat per-submission fee, off by default (`FeeConfig.enabled`). When
/// enabled, `base_fee` of `token` is charged to the payer and sent to
/// `collector` on every payment path call, separately from the revenue
/// amount itself.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeConfig {
    pub token: Token,
    pub collector: Address,
    pub base_fee: i128,
    pub enabled: bool,
}

#[contract]
pub struct AttestedReceiverContract;

#[contractimpl]
impl AttestedReceiverContract {
    pub fn initialize(env: Env, admin: Address, controller: Address, token_registry: Address) {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Controller, &controller);
        env.storage().instance().set(&DataKey::TokenRegistry, &token_registry);
        env.storage().instance().set(&DataKey::NextRecordId, &1u64);
        env.storage()
            .instance()
            .set(&DataKey::ReplayWindowSeconds, &DEFAULT_REPLAY_WINDOW_SECONDS);
    }

    fn require_admin(env: &Env) -> Result<Address, Error> {
        let admin: Address = env.storage().instance().get(&DataKey::Admin).ok_or(Error::NotInitialized)?;
        admin.require_auth();
        Ok(admin)
    }

    fn controller_client(env: &Env) -> controller_import::ControllerClient<'static> {
        let addr: Address = env.storage().instance().get(&DataKey::Controller).expect("not initialized");
        controller_import::ControllerClient::new(env, &addr)
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

    fn next_record_id(env: &Env) -> u64 {
        let id: u64 = env.storage().instance().get(&DataKey::NextRecordId).unwrap_or(1);
        env.storage().instance().set(&DataKey::NextRecordId, &(id + 1));
        id
    }

    /// Pulls `amount` of `token` from `payer` into the Controller's
    /// balance then calls `on_revenue` for bookkeeping. `Token::Native`
    /// resolves to the chain's native asset contract the same way any
    /// other token does — Soroban has no separate "value sent with call"
    /// channel.
    fn collect_and_forward(
        env: &Env,
        payer: &Address,
        agent_id: u64,
        token: &Token,
        amount: i128,
    ) -> Result<(), Error> {
        if amount <= 0 {
            return Err(Error::ZeroAmount);
        }
        let resolved = Self::resolve_token(env, token)?;
        let client = token::Client::new(env, &resolved);
        let controller_addr: Address = env.storage().instance().get(&DataKey::Controller).expect("not initialized");
        client.transfer(payer, &controller_addr, &amount);

        let controller = Self::controller_client(env);
        controller.on_revenue(&env.current_contract_address(), &agent_id, token, &amount);
        Ok(())
    }

    /// Charges `payer` the configured flat submission fee, if enabled, in
    /// `FeeConfig.token`, separately from whatever is being paid through
    /// `collect_and_forward`. A no-op when fees are disabled (the default)
    /// or unconfigured. `payer` must already have `require_auth()`'d in
    /// this invocation.
    fn apply_submission_fee(env: &Env, payer: &Address) -> Result<(), Error> {
        let config: Option<FeeConfig> = env.storage().instance().get(&DataKey::FeeConfig);
        let config = match config {
            Some(c) if c.enabled => c,
            _ => return Ok(()),
        };
        if config.base_fee <= 0 {
            return Ok(());
        }
        let resolved = Self::resolve_token(env, &config.token)?;
        token::Client::new(env, &resolved).transfer(payer, &config.collector, &config.base_fee);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Plain paths
    // -----------------------------------------------------------------

    pub fn pay_native(env: Env, payer: Address, agent_id: u64, amount: i128, endpoint: String) -> Result<u64, Error> {
        payer.require_auth();
        Self::apply_submission_fee(&env, &payer)?;
        Self::collect_and_forward(&env, &payer, agent_id, &Token::Native, amount)?;
        let record_id = Self::next_record_id(&env);
        env.events().publish(
            ("PaymentRecord", agent_id),
            PaymentRecord {
                payer,
                agent_id,
                token: Token::Native,
                amount,
                endpoint,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(record_id)
    }

    pub fn pay_token(
        env: Env,
        payer: Address,
        agent_id: u64,
        token: Token,
        amount: i128,
        endpoint: String,
    ) -> Result<u64, Error> {
        payer.require_auth();
        Self::apply_submission_fee(&env, &payer)?;
        Self::collect_and_forward(&env, &payer, agent_id, &token, amount)?;
        let record_id = Self::next_record_id(&env);
        env.events().publish(
            ("PaymentRecord", agent_id),
            PaymentRecord {
                payer,
                agent_id,
                token,
                amount,
                endpoint,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(record_id)
    }

    // -----------------------------------------------------------------
    // Gasless relay
    // -----------------------------------------------------------------

    pub fn set_relay_restricted(env: Env, restricted: bool) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::RelayRestricted, &restricted);
        Ok(())
    }

    pub fn set_relay_allowed(env: Env, relayer: Address, allowed: bool) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::RelayAllowed(relayer), &allowed);
        Ok(())
    }

    pub fn payer_nonce(env: Env, payer: Address) -> u64 {
        env.storage().instance().get(&DataKey::PayerNonce(payer)).unwrap_or(0)
    }

    /// Gasless relay path. The caller (the relayer) submits the call, but
    /// the authorisation that actually moves `payer`'s funds is `payer`'s
    /// own, carried as a Soroban authorization entry the relayer attaches
    /// to the transaction — the chain-native equivalent of an off-chain
    /// signature over `(payer, agentId, token, amount, endpoint, nonce,
    /// deadline)`. `deadline` and the monotonic per-payer `nonce` are
    /// still checked explicitly so a stale or already-consumed relay
    /// request is rejected before `payer.require_auth()` is even reached.
    pub fn pay_with_signature(
        env: Env,
        caller: Address,
        payer: Address,
        agent_id: u64,
        token: Token,
        amount: i128,
        endpoint: String,
        deadline: u64,
        nonce: u64,
    ) -> Result<u64, Error> {
        caller.require_auth();
        let restricted: bool = env.storage().instance().get(&DataKey::RelayRestricted).unwrap_or(false);
        if restricted {
            let allowed: bool = env
                .storage()
                .instance()
                .get(&DataKey::RelayAllowed(caller.clone()))
                .unwrap_or(false);
            if !allowed {
                return Err(Error::RelayNotAllowed);
            }
        }
        if env.ledger().timestamp() > deadline {
            return Err(Error::SignatureExpired);
        }
        let expected_nonce: u64 = env.storage().instance().get(&DataKey::PayerNonce(payer.clone())).unwrap_or(0);
        if nonce != expected_nonce {
            return Err(Error::NonceReplay);
        }
        payer.require_auth();
        env.storage()
            .instance()
            .set(&DataKey::PayerNonce(payer.clone()), &(expected_nonce + 1));

        Self::apply_submission_fee(&env, &payer)?;
        Self::collect_and_forward(&env, &payer, agent_id, &token, amount)?;
        let record_id = Self::next_record_id(&env);
        env.events().publish(
            ("PaymentRecord", agent_id),
            PaymentRecord {
                payer,
                agent_id,
                token,
                amount,
                endpoint,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(record_id)
    }

    // -----------------------------------------------------------------
    // Attested path
    // -----------------------------------------------------------------

    /// Registers the address authorised to co-sign attested receipts for
    /// `agent_id`. Mirrors `AgentRegistry::set_attested_operator` but kept
    /// local since this contract must check it on every attested call
    /// without a cross-contract round trip.
    pub fn set_attested_signer(env: Env, agent_id: u64, signer: Address) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::AttestedSigner(agent_id), &signer);
        Ok(())
    }

    pub fn attested_signer(env: Env, agent_id: u64) -> Option<Address> {
        env.storage().instance().get(&DataKey::AttestedSigner(agent_id))
    }

    pub fn set_replay_window(env: Env, seconds: u64) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::ReplayWindowSeconds, &seconds);
        Ok(())
    }

    pub fn verified_revenue(env: Env, agent_id: u64) -> i128 {
        env.storage().instance().get(&DataKey::VerifiedRevenue(agent_id)).unwrap_or(0)
    }

    /// Accepts an operator-attested receipt proving `amount` of native
    /// revenue genuinely originates from agent execution. `signer` must
    /// `require_auth()` and match the currently registered attested
    /// signer for `agent_id` — the chain-native stand-in for recovering
    /// and checking an off-chain signature, since the payload already
    /// carries everything a verifier would otherwise need to re-derive.
    /// `timestamp` must fall within the configured replay window of the
    /// current ledger time, and the `(agent_id, timestamp, logic_hash)`
    /// tuple may only be accepted once.
    pub fn pay_native_attested(
        env: Env,
        payer: Address,
        signer: Address,
        agent_id: u64,
        amount: i128,
        endpoint: String,
        timestamp: u64,
        logic_hash: BytesN<32>,
    ) -> Result<u64, Error> {
        let expected: Address = env
            .storage()
            .instance()
            .get(&DataKey::AttestedSigner(agent_id))
            .ok_or(Error::NotAttestedOperator)?;
        if signer != expected {
            return Err(Error::AttestorMismatch);
        }
        signer.require_auth();
        payer.require_auth();

        let now = env.ledger().timestamp();
        let window: u64 = env
            .storage()
            .instance()
            .get(&DataKey::ReplayWindowSeconds)
            .unwrap_or(DEFAULT_REPLAY_WINDOW_SECONDS);
        let delta = if now > timestamp { now - timestamp } else { timestamp - now };
        if delta > window {
            return Err(Error::SignatureExpired);
        }

        let mut digest_input = Bytes::new(&env);
        digest_input.append(&Bytes::from_array(&env, &agent_id.to_be_bytes()));
        digest_input.append(&Bytes::from_array(&env, &timestamp.to_be_bytes()));
        digest_input.append(&Bytes::from_array(&env, &logic_hash.to_array()));
        let receipt_key: BytesN<32> = env.crypto().sha256(&digest_input).to_bytes();
        if env.storage().instance().has(&DataKey::SeenReceipt(receipt_key.clone())) {
            return Err(Error::NonceReplay);
        }
        env.storage().instance().set(&DataKey::SeenReceipt(receipt_key), &true);

        Self::apply_submission_fee(&env, &payer)?;
        Self::collect_and_forward(&env, &payer, agent_id, &Token::Native, amount)?;

        let verified: i128 = env.storage().instance().get(&DataKey::VerifiedRevenue(agent_id)).unwrap_or(0);
        env.storage()
            .instance()
            .set(&DataKey::VerifiedRevenue(agent_id), &(verified + amount));

        let record_id = Self::next_record_id(&env);
        env.events().publish(
            ("VerifiedPaymentReceived", agent_id),
            VerifiedPaymentRecord {
                payer,
                agent_id,
                token: Token::Native,
                endpoint,
                amount,
                timestamp: now,
                logic_hash,
                signer,
            },
        );
        Ok(record_id)
    }

    // -----------------------------------------------------------------
    // Fee tiering (supplementary, disabled by default)
    // -----------------------------------------------------------------

    pub fn configure_fees(env: Env, token: Token, collector: Address, base_fee: i128, enabled: bool) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(
            &DataKey::FeeConfig,
            &FeeConfig { token, collector, base_fee, enabled },
        );
        Ok(())
    }

    pub fn fee_config(env: Env) -> Option<FeeConfig> {
        env.storage().instance().get(&DataKey::FeeConfig)
    }

    // -----------------------------------------------------------------
    // Anomaly scoring (supplementary, advisory only)
    // -----------------------------------------------------------------

    pub fn set_anomaly(env: Env, record_id: u64, flags: u32, score: u32) -> Result<(), Error> {
        Self::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Anomaly(record_id), &(flags, score));
        Ok(())
    }

    pub fn get_anomaly(env: Env, record_id: u64) -> Option<(u32, u32)> {
        env.storage().instance().get(&DataKey::Anomaly(record_id))
    }
}
