//! Account Ledger
//!
//! Per-depositor settlement against the pool accumulator.
//!
//! ## Settlement
//!
//! ```text
//! earned     = deposit * (accumulator - checkpoint) / SCALE_FACTOR
//! banked    += earned
//! checkpoint = accumulator
//! ```
//!
//! Settlement must run before `deposit` changes so that the stake held since
//! the last checkpoint is credited at its old size. Running it twice with no
//! accumulator change in between credits zero the second time.

use crate::math::{calculate_earned, safe_add, safe_sub};
use crate::types::AccountState;
use crate::{AmountErrorReason, PoolError, PoolResult};

/// Split of a withdrawal between stake and rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Debit {
    /// Portion taken from the deposit
    pub from_deposit: u64,
    /// Portion taken from banked rewards
    pub from_rewards: u64,
}

impl Debit {
    /// Total amount debited
    pub fn total(&self) -> u64 {
        self.from_deposit.saturating_add(self.from_rewards)
    }
}

impl AccountState {
    /// Fresh account checkpointed at the current accumulator
    pub fn new(accumulator: u128) -> Self {
        Self {
            deposit: 0,
            rewards_per_share_checkpoint: accumulator,
            banked_rewards: 0,
        }
    }

    /// Rewards accrued since the last settlement, without settling
    pub fn pending_rewards(&self, accumulator: u128) -> PoolResult<u64> {
        calculate_earned(self.deposit, self.rewards_per_share_checkpoint, accumulator)
    }

    /// Credit accrued rewards and move the checkpoint forward
    ///
    /// Returns the amount credited by this call.
    pub fn settle(&mut self, accumulator: u128) -> PoolResult<u64> {
        let earned = self.pending_rewards(accumulator)?;
        self.banked_rewards = safe_add(self.banked_rewards, earned)?;
        self.rewards_per_share_checkpoint = accumulator;
        Ok(earned)
    }

    /// Settled copy of this account; `self` is left untouched
    pub fn settled(&self, accumulator: u128) -> PoolResult<Self> {
        let mut copy = *self;
        copy.settle(accumulator)?;
        Ok(copy)
    }

    /// Banked plus pending rewards
    pub fn claimable_rewards(&self, accumulator: u128) -> PoolResult<u64> {
        safe_add(self.banked_rewards, self.pending_rewards(accumulator)?)
    }

    /// Everything the account could withdraw right now
    pub fn entitlement(&self, accumulator: u128) -> PoolResult<u64> {
        safe_add(self.deposit, self.claimable_rewards(accumulator)?)
    }

    /// Plan a withdrawal of `amount` from a settled account
    ///
    /// The deposit is drained first, then banked rewards.
    pub fn plan_debit(&self, amount: u64) -> PoolResult<Debit> {
        if amount == 0 {
            return Err(PoolError::InvalidAmount {
                amount,
                reason: AmountErrorReason::Zero,
            });
        }

        let available = safe_add(self.deposit, self.banked_rewards)?;
        if amount > available {
            return Err(PoolError::InsufficientUserBalance {
                available,
                requested: amount,
            });
        }

        let from_deposit = amount.min(self.deposit);
        Ok(Debit {
            from_deposit,
            from_rewards: amount - from_deposit,
        })
    }

    /// Apply a planned debit
    pub fn apply_debit(&mut self, debit: &Debit) -> PoolResult<()> {
        self.deposit = safe_sub(self.deposit, debit.from_deposit)?;
        self.banked_rewards = safe_sub(self.banked_rewards, debit.from_rewards)?;
        Ok(())
    }

    /// True when the account holds nothing and can be dropped
    pub fn is_empty(&self) -> bool {
        self.deposit == 0 && self.banked_rewards == 0
    }
}
