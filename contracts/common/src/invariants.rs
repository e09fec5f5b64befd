//! Ledger Invariants
//!
//! Whole-ledger consistency checks. These are O(accounts) and are run when a
//! snapshot is restored and throughout the test suites; the operations
//! themselves maintain the invariants incrementally.

use crate::constants::identity;
use crate::pool::Ledger;
use crate::{PoolError, PoolResult};

/// Check every invariant, returning the first violation
pub fn check_invariants(ledger: &Ledger) -> PoolResult<()> {
    check_conservation(ledger)?;
    check_accounts(ledger)?;
    check_reward_history(ledger)?;
    check_reward_backing(ledger)?;
    check_allowances(ledger)?;
    Ok(())
}

/// `total_deposited` equals the sum of all account deposits
pub fn check_conservation(ledger: &Ledger) -> PoolResult<()> {
    let sum: u128 = ledger
        .accounts()
        .values()
        .map(|a| a.deposit as u128)
        .sum();

    if sum != ledger.pool().total_deposited as u128 {
        return Err(violation("conservation"));
    }
    Ok(())
}

/// Per-account bounds: checkpoint not ahead, no empty or reserved entries
pub fn check_accounts(ledger: &Ledger) -> PoolResult<()> {
    let pool = ledger.pool();

    for (id, account) in ledger.accounts() {
        if *id == identity::ZERO {
            return Err(violation("reserved identity holds an account"));
        }
        if account.rewards_per_share_checkpoint > pool.rewards_per_share {
            return Err(violation("checkpoint ahead of accumulator"));
        }
        if account.deposit > pool.total_deposited {
            return Err(violation("deposit exceeds pool total"));
        }
        if account.is_empty() {
            return Err(violation("empty account retained"));
        }
    }
    Ok(())
}

/// The accumulator is exactly the sum of logged deltas, in time order
pub fn check_reward_history(ledger: &Ledger) -> PoolResult<()> {
    let pool = ledger.pool();

    let mut accumulated: u128 = 0;
    let mut last_timestamp = 0u64;
    for event in &pool.reward_history {
        if event.timestamp < last_timestamp {
            return Err(violation("reward history out of order"));
        }
        if event.total_deposited == 0 || event.amount == 0 {
            return Err(violation("empty reward event"));
        }
        last_timestamp = event.timestamp;
        accumulated = accumulated
            .checked_add(event.rewards_per_share_delta)
            .ok_or(violation("accumulator overflow"))?;
    }

    if accumulated != pool.rewards_per_share {
        return Err(violation("accumulator does not match history"));
    }

    match (pool.reward_history.last(), pool.next_reward_time) {
        (None, None) => Ok(()),
        (Some(last), Some(next)) if next >= last.timestamp => Ok(()),
        _ => Err(violation("reward gate inconsistent with history")),
    }
}

/// Every unit a depositor can claim is backed by `outstanding_rewards`
pub fn check_reward_backing(ledger: &Ledger) -> PoolResult<()> {
    let accumulator = ledger.pool().rewards_per_share;

    let mut claimable: u128 = 0;
    for account in ledger.accounts().values() {
        claimable += account.claimable_rewards(accumulator)? as u128;
    }

    if claimable > ledger.pool().outstanding_rewards as u128 {
        return Err(violation("claimable rewards exceed outstanding rewards"));
    }
    if ledger.pool().outstanding_rewards as u128 > ledger.pool().total_rewards_injected() {
        return Err(violation("outstanding rewards exceed injected rewards"));
    }
    Ok(())
}

/// Allowances are non-zero and never involve the reserved identity
pub fn check_allowances(ledger: &Ledger) -> PoolResult<()> {
    for ((owner, spender), amount) in ledger.allowances() {
        if *owner == identity::ZERO || *spender == identity::ZERO {
            return Err(violation("reserved identity in allowance"));
        }
        if *amount == 0 {
            return Err(violation("zero allowance retained"));
        }
    }
    Ok(())
}

/// The host's asset balance covers everything owed to depositors
pub fn check_solvency(ledger: &Ledger, asset_balance: u64) -> PoolResult<()> {
    let owed = ledger.pool().total_deposited as u128 + ledger.pool().outstanding_rewards as u128;
    if (asset_balance as u128) < owed {
        return Err(violation("asset balance below liabilities"));
    }
    Ok(())
}

fn violation(name: &'static str) -> PoolError {
    PoolError::InvariantViolation { name }
}
