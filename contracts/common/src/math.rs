//! Mathematical Functions for the ETHPool Ledger
//!
//! All reward math is fixed-point with `SCALE_FACTOR` precision and uses
//! checked arithmetic: a result that does not fit is an error, never a
//! silently clamped value.

use crate::constants::rewards::SCALE_FACTOR;
use crate::{PoolError, PoolResult};

/// Calculate the accumulator increase for a reward injection
///
/// `delta = amount * SCALE_FACTOR / total_deposited`
///
/// # Arguments
/// * `amount` - Reward being injected
/// * `total_deposited` - Pool total at injection time (must be > 0)
///
/// # Returns
/// Scaled rewards-per-share increment. The truncated remainder is dust that
/// no depositor can claim.
pub fn calculate_reward_per_share_delta(amount: u64, total_deposited: u64) -> PoolResult<u128> {
    if total_deposited == 0 {
        return Err(PoolError::DivisionByZero);
    }

    (amount as u128)
        .checked_mul(SCALE_FACTOR)
        .ok_or(PoolError::Overflow)
        .map(|scaled| scaled / total_deposited as u128)
}

/// Calculate rewards earned since the last checkpoint
///
/// `earned = deposit * (accumulator - checkpoint) / SCALE_FACTOR`
///
/// # Arguments
/// * `deposit` - Stake held unchanged since the checkpoint
/// * `checkpoint` - Accumulator value at the last settlement
/// * `accumulator` - Current accumulator value
pub fn calculate_earned(deposit: u64, checkpoint: u128, accumulator: u128) -> PoolResult<u64> {
    let delta = accumulator
        .checked_sub(checkpoint)
        .ok_or(PoolError::Underflow)?;

    let earned = (deposit as u128)
        .checked_mul(delta)
        .ok_or(PoolError::Overflow)?
        / SCALE_FACTOR;

    u64::try_from(earned).map_err(|_| PoolError::Overflow)
}

/// Rounding dust left behind by one injection
///
/// `dust = amount - delta * total_deposited / SCALE_FACTOR`
pub fn calculate_dust(amount: u64, delta: u128, total_deposited: u64) -> PoolResult<u64> {
    let distributed = delta
        .checked_mul(total_deposited as u128)
        .ok_or(PoolError::Overflow)?
        / SCALE_FACTOR;

    (amount as u128)
        .checked_sub(distributed)
        .ok_or(PoolError::Underflow)
        .map(|dust| dust as u64)
}

/// Safe addition with overflow check
pub fn safe_add(a: u64, b: u64) -> PoolResult<u64> {
    a.checked_add(b).ok_or(PoolError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u64, b: u64) -> PoolResult<u64> {
    a.checked_sub(b).ok_or(PoolError::Underflow)
}
