//! Shared types, error codes, and fixed-point helpers for the Sovereign
//! Intelligence Bonds contract suite.
//!
//! Every contract in the workspace depends on this crate for the handful of
//! enums and numeric helpers that have to agree bit-for-bit across contract
//! boundaries (tokens, tranches, bps math). Nothing here holds storage of
//! its own.

#![no_std]

use soroban_sdk::{contracterror, contracttype, Address};

/// Fixed-point scale for dividend accumulators ("units per bond"), matching
/// the source's `accPerBond` scaling.
pub const FP_SCALE: i128 = 1_000_000_000_000_000_000;

/// Basis-point denominator: 10_000 bps = 100%.
pub const BPS_DENOM: i128 = 10_000;

pub const SECONDS_PER_YEAR: u64 = 365 * 86_400;

/// A payment asset: either the chain's native asset or a fungible token
/// contract. Represented as a tagged variant so every cash-handling
/// contract branches once instead of propagating a `bool` through every
/// call, per the Design Notes' "dynamic dispatch over payment tokens"
/// guidance.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    Native,
    Fungible(Address),
}

impl Token {
    pub fn is_native(&self) -> bool {
        matches!(self, Token::Native)
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Tranche {
    Standard = 0,
    Senior = 1,
    Junior = 2,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum AgentState {
    Registered = 0,
    Active = 1,
    Suspended = 2,
    Deregistered = 3,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u32)]
pub enum RatingTier {
    Unrated = 0,
    C = 1,
    B = 2,
    A = 3,
    AA = 4,
    AAA = 5,
}

/// Rating bands from the composite credit score (0..=10000).
pub fn rating_from_score(score: i128) -> RatingTier {
    if score < 2000 {
        RatingTier::C
    } else if score < 4000 {
        RatingTier::B
    } else if score < 6000 {
        RatingTier::A
    } else if score < 8000 {
        RatingTier::AA
    } else {
        RatingTier::AAA
    }
}

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Error {
    // Validation
    ZeroAmount = 1,
    ZeroAddress = 2,
    CouponOutOfRange = 3,
    MaturityZero = 4,
    SupplyExceeded = 5,
    UnsupportedToken = 6,
    InactiveToken = 7,
    TokenAlreadyActive = 8,
    CannotRemoveNative = 9,

    // State
    AgentNotActive = 20,
    BondClassMissing = 21,
    BondNonceMissing = 22,
    NonceNotRedeemable = 23,
    NonceNotMatured = 24,
    OrderExpired = 25,
    OrderInactive = 26,
    OrderOverfill = 27,

    // Authorisation
    NotOwner = 40,
    NotController = 41,
    NotOperator = 42,
    NotAttestedOperator = 43,
    RelayNotAllowed = 44,

    // Correctness
    ZeroSupply = 60,
    NothingToClaim = 61,
    InsufficientBalance = 62,
    InsufficientEscrow = 63,
    InsufficientCapital = 64,

    // Cryptographic
    ProofInvalid = 80,
    SignatureInvalid = 81,
    SignatureExpired = 82,
    NonceReplay = 83,
    AttestorMismatch = 84,

    // Consistency
    Paused = 100,
    Reentrancy = 101,
    AlreadyInitialized = 102,
    NotInitialized = 103,
    NotFound = 104,
    AlreadyExists = 105,
    GroupMissing = 106,
    NotTranched = 107,
}

/// `amount * bps / BPS_DENOM`, rounding toward zero. Used for coupon, fee,
/// and revenue-share calculations throughout the suite.
pub fn bps_of(amount: i128, bps: u32) -> i128 {
    mul_div(amount, bps as i128, BPS_DENOM)
}

/// `a * b / c`, rounding toward zero, using i256-free saturating
/// arithmetic. All three operands stay within i128's domain for the
/// amounts this suite deals with (token amounts, bps, second counts).
pub fn mul_div(a: i128, b: i128, c: i128) -> i128 {
    if c == 0 {
        return 0;
    }
    (a.saturating_mul(b)) / c
}

/// Scales a raw deposit into "accumulator units per bond", matching the
/// source's `amount * 10^18 / supply` MasterChef step.
pub fn acc_per_bond_delta(amount: i128, supply: i128) -> i128 {
    mul_div(amount, FP_SCALE, supply)
}

/// `balance * acc_per_bond / FP_SCALE`, the inverse of the above, used to
/// read out a holder's raw accrued amount from the scaled accumulator.
pub fn accrued(balance: i128, acc_per_bond: i128) -> i128 {
    mul_div(balance, acc_per_bond, FP_SCALE)
}
