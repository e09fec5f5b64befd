//! Error Types for the ETHPool Ledger
//!
//! Every rejection is detected before state is touched, so an error always
//! means "the whole operation had no effect". Variants carry enough context
//! for the caller to decide whether to retry (e.g. after the reward gate opens).

use crate::access_control::Capability;
use crate::types::Identity;

/// Result type alias for ledger operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Main error enum for all ledger errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    // ============ Amount Errors ============
    /// Zero or otherwise malformed quantity
    #[error("invalid amount {amount}: {reason:?}")]
    InvalidAmount { amount: u64, reason: AmountErrorReason },

    /// Ledger cannot cover a requested outflow
    #[error("insufficient pool balance: available {available}, required {required}")]
    InsufficientPoolBalance { available: u64, required: u64 },

    /// Requested withdrawal or transfer exceeds the account's entitlement
    #[error("insufficient user balance: available {available}, requested {requested}")]
    InsufficientUserBalance { available: u64, requested: u64 },

    /// Delegated transfer exceeds what the owner approved
    #[error("insufficient allowance: available {available}, requested {requested}")]
    InsufficientAllowance { available: u64, requested: u64 },

    // ============ Reward Errors ============
    /// Reward injection with no depositors
    #[error("nothing to distribute: pool has no deposits")]
    NothingToDistribute,

    /// Reward interval has not elapsed
    #[error("reward interval not elapsed: now {now}, next reward at {next_reward_time}")]
    TooSoon { now: u64, next_reward_time: u64 },

    // ============ Authorization Errors ============
    /// Capability check failed
    #[error("identity {identity:02x?} is missing capability {capability:?}")]
    Unauthorized { identity: Identity, capability: Capability },

    /// Only the role admin can manage grants
    #[error("only the role admin can perform this action")]
    AdminOnly,

    // ============ Call Errors ============
    /// Conflicting or unexpected call shape
    #[error("malformed call: {reason}")]
    MalformedCall { reason: &'static str },

    /// Reserved or otherwise unusable identity
    #[error("invalid identity: {reason}")]
    InvalidIdentity { reason: &'static str },

    /// The asset collaborator refused an outbound transfer
    #[error("asset transfer of {amount} to {to:02x?} failed")]
    TransferFailed { to: Identity, amount: u64 },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    // ============ State Errors ============
    /// Persisted state could not be decoded or failed validation
    #[error("corrupt snapshot: {reason}")]
    CorruptSnapshot { reason: &'static str },

    /// A ledger invariant does not hold
    #[error("invariant violated: {name}")]
    InvariantViolation { name: &'static str },

    /// A concurrent host lost its lock to a panicking writer
    #[error("ledger lock poisoned")]
    LockPoisoned,
}

/// Reasons for amount-related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountErrorReason {
    /// Amount is zero when non-zero required
    Zero,
    /// Amount exceeds what the arithmetic can represent
    TooLarge,
}

impl PoolError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "E010_INVALID_AMOUNT",
            Self::InsufficientPoolBalance { .. } => "E011_POOL_INSUFFICIENT",
            Self::InsufficientUserBalance { .. } => "E012_USER_INSUFFICIENT",
            Self::InsufficientAllowance { .. } => "E013_ALLOWANCE_INSUFFICIENT",
            Self::NothingToDistribute => "E020_NOTHING_TO_DISTRIBUTE",
            Self::TooSoon { .. } => "E021_TOO_SOON",
            Self::Unauthorized { .. } => "E030_UNAUTHORIZED",
            Self::AdminOnly => "E031_ADMIN_ONLY",
            Self::MalformedCall { .. } => "E040_MALFORMED_CALL",
            Self::InvalidIdentity { .. } => "E041_INVALID_IDENTITY",
            Self::TransferFailed { .. } => "E050_TRANSFER_FAILED",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::CorruptSnapshot { .. } => "E090_CORRUPT_SNAPSHOT",
            Self::InvariantViolation { .. } => "E091_INVARIANT",
            Self::LockPoisoned => "E100_LOCK_POISONED",
        }
    }

    /// Returns true if the caller can fix the condition and retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::TooSoon { .. } => true,                 // Wait for the gate
            Self::InsufficientPoolBalance { .. } => true, // Pool gets refilled
            Self::InsufficientUserBalance { .. } => true, // Ask for less
            Self::InsufficientAllowance { .. } => true,   // Owner approves more
            Self::NothingToDistribute => true,            // Wait for depositors
            Self::TransferFailed { .. } => true,
            _ => false,
        }
    }
}
