//! Pool Ledger
//!
//! Owns the pool aggregate and every account entry. Each mutating operation
//! follows the same two phases:
//!
//! 1. **Prepare**: settle the touched accounts on copies, check every
//!    precondition, and compute the post-state. Nothing is written.
//! 2. **Commit**: write the staged post-state in one step.
//!
//! A [`Staged`] transition holds the ledger's only mutable borrow, so the
//! host can run an external side effect (an asset transfer) between the two
//! phases and simply drop the transition if that side effect fails. No other
//! operation can interleave, and a dropped transition leaves no trace.
//!
//! Reward distribution is O(1): an injection bumps `rewards_per_share` once
//! and accounts pull their share on their next interaction.

use crate::account::Debit;
use crate::constants::identity;
use crate::math::{calculate_dust, calculate_reward_per_share_delta, safe_add, safe_sub};
use crate::types::{AccountState, Identity, PoolState, RewardEvent, WithdrawAmount};
use crate::{AmountErrorReason, PoolError, PoolResult, Vec};

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::BTreeMap;

// ============================================================================
// Staging
// ============================================================================

/// A fully validated change waiting to be written
pub trait Transition {
    /// What the commit reports back
    type Output;

    /// Write the change; preconditions were checked at prepare time
    fn apply(self, ledger: &mut Ledger) -> Self::Output;
}

/// Validated transition bound to the ledger it was prepared against
#[must_use = "a staged transition does nothing until committed"]
pub struct Staged<'a, T: Transition> {
    ledger: &'a mut Ledger,
    transition: T,
}

impl<'a, T: Transition> Staged<'a, T> {
    /// Inspect the staged change
    pub fn transition(&self) -> &T {
        &self.transition
    }

    /// Write the staged change
    pub fn commit(self) -> T::Output {
        self.transition.apply(self.ledger)
    }
}

// ============================================================================
// Transitions
// ============================================================================

/// Staged deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositTransition {
    pub depositor: Identity,
    pub amount: u64,
    /// Rewards credited by settlement
    pub credited: u64,
    /// Account after settlement and deposit
    pub account: AccountState,
    pub new_total: u64,
}

/// Result of a deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositResult {
    pub account: AccountState,
    pub credited: u64,
    pub pool_total: u64,
}

impl Transition for DepositTransition {
    type Output = DepositResult;

    fn apply(self, ledger: &mut Ledger) -> DepositResult {
        ledger.accounts.insert(self.depositor, self.account);
        ledger.pool.total_deposited = self.new_total;

        DepositResult {
            account: self.account,
            credited: self.credited,
            pool_total: self.new_total,
        }
    }
}

/// Staged withdrawal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawTransition {
    pub depositor: Identity,
    pub debit: Debit,
    pub credited: u64,
    /// Account after settlement and debit
    pub account: AccountState,
    pub new_total: u64,
    pub new_outstanding: u64,
}

/// Result of a withdrawal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawResult {
    pub debit: Debit,
    pub credited: u64,
    /// `None` when the account was emptied and dropped
    pub remaining: Option<AccountState>,
    pub pool_total: u64,
}

impl WithdrawTransition {
    /// Amount leaving the pool
    pub fn amount(&self) -> u64 {
        self.debit.total()
    }
}

impl Transition for WithdrawTransition {
    type Output = WithdrawResult;

    fn apply(self, ledger: &mut Ledger) -> WithdrawResult {
        let remaining = if self.account.is_empty() {
            ledger.accounts.remove(&self.depositor);
            None
        } else {
            ledger.accounts.insert(self.depositor, self.account);
            Some(self.account)
        };
        ledger.pool.total_deposited = self.new_total;
        ledger.pool.outstanding_rewards = self.new_outstanding;

        WithdrawResult {
            debit: self.debit,
            credited: self.credited,
            remaining,
            pool_total: self.new_total,
        }
    }
}

/// Allowance left after a delegated transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceUpdate {
    pub owner: Identity,
    pub spender: Identity,
    pub remaining: u64,
}

/// Staged share transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTransferTransition {
    pub from: Identity,
    pub to: Identity,
    pub amount: u64,
    pub from_account: AccountState,
    pub to_account: AccountState,
    /// Set when a spender moves shares on the owner's behalf
    pub allowance: Option<AllowanceUpdate>,
}

/// Result of a share transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTransferResult {
    pub from_account: AccountState,
    pub to_account: AccountState,
}

impl Transition for ShareTransferTransition {
    type Output = ShareTransferResult;

    fn apply(self, ledger: &mut Ledger) -> ShareTransferResult {
        // Receiver first so a self-transfer ends with the sender's view
        ledger.put_account(self.to, self.to_account);
        ledger.put_account(self.from, self.from_account);
        if let Some(update) = self.allowance {
            ledger.put_allowance(update.owner, update.spender, update.remaining);
        }

        ShareTransferResult {
            from_account: self.from_account,
            to_account: self.to_account,
        }
    }
}

/// Staged reward injection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardTransition {
    pub event: RewardEvent,
    pub new_accumulator: u128,
    pub new_outstanding: u64,
    pub next_reward_time: u64,
    /// Part of the reward no depositor can claim
    pub dust: u64,
}

/// Result of a reward injection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardResult {
    pub event: RewardEvent,
    pub rewards_per_share: u128,
    pub next_reward_time: u64,
    pub dust: u64,
}

impl Transition for RewardTransition {
    type Output = RewardResult;

    fn apply(self, ledger: &mut Ledger) -> RewardResult {
        ledger.pool.rewards_per_share = self.new_accumulator;
        ledger.pool.outstanding_rewards = self.new_outstanding;
        ledger.pool.next_reward_time = Some(self.next_reward_time);
        ledger.pool.reward_history.push(self.event.clone());

        RewardResult {
            event: self.event,
            rewards_per_share: self.new_accumulator,
            next_reward_time: self.next_reward_time,
            dust: self.dust,
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Spending limits keyed by `(owner, spender)`
pub type Allowances = BTreeMap<(Identity, Identity), u64>;

/// Pool aggregate plus every account entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ledger {
    pool: PoolState,
    accounts: BTreeMap<Identity, AccountState>,
    allowances: Allowances,
}

impl Ledger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted parts (no validation)
    pub(crate) fn from_parts(
        pool: PoolState,
        accounts: BTreeMap<Identity, AccountState>,
        allowances: Allowances,
    ) -> Self {
        Self {
            pool,
            accounts,
            allowances,
        }
    }

    /// Pool aggregate
    pub fn pool(&self) -> &PoolState {
        &self.pool
    }

    /// All account entries
    pub fn accounts(&self) -> &BTreeMap<Identity, AccountState> {
        &self.accounts
    }

    /// All non-zero allowances
    pub fn allowances(&self) -> &Allowances {
        &self.allowances
    }

    /// Shares `spender` may still move out of `owner`'s account
    pub fn allowance(&self, owner: &Identity, spender: &Identity) -> u64 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Stored (unsettled) account entry
    pub fn account(&self, identity: &Identity) -> Option<&AccountState> {
        self.accounts.get(identity)
    }

    /// Number of accounts with a non-zero balance
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // ============ Read-only projections ============

    /// Account as it would look after settling now
    pub fn projected_account(&self, identity: &Identity) -> PoolResult<AccountState> {
        self.load_settled(identity).map(|(account, _)| account)
    }

    /// Deposit plus banked plus pending rewards
    pub fn entitlement(&self, identity: &Identity) -> PoolResult<u64> {
        match self.accounts.get(identity) {
            Some(account) => account.entitlement(self.pool.rewards_per_share),
            None => Ok(0),
        }
    }

    /// Banked plus pending rewards
    pub fn claimable_rewards(&self, identity: &Identity) -> PoolResult<u64> {
        match self.accounts.get(identity) {
            Some(account) => account.claimable_rewards(self.pool.rewards_per_share),
            None => Ok(0),
        }
    }

    /// Share balance of an identity
    pub fn share_balance(&self, identity: &Identity) -> u64 {
        self.accounts.get(identity).map_or(0, |a| a.deposit)
    }

    /// Total shares outstanding
    pub fn total_shares(&self) -> u64 {
        self.pool.total_deposited
    }

    /// Asset balance not owed to depositors
    pub fn free_balance(&self, asset_balance: u64) -> u64 {
        asset_balance.saturating_sub(self.pool.liabilities())
    }

    // ============ Deposit ============

    /// Validate a deposit and stage it
    pub fn prepare_deposit(
        &mut self,
        depositor: Identity,
        amount: u64,
    ) -> PoolResult<Staged<'_, DepositTransition>> {
        require_participant(&depositor)?;
        require_non_zero(amount)?;

        let too_large = |_: PoolError| PoolError::InvalidAmount {
            amount,
            reason: AmountErrorReason::TooLarge,
        };
        let (mut account, credited) = self.load_settled(&depositor)?;
        account.deposit = safe_add(account.deposit, amount).map_err(too_large)?;
        let new_total = safe_add(self.pool.total_deposited, amount).map_err(too_large)?;

        Ok(self.stage(DepositTransition {
            depositor,
            amount,
            credited,
            account,
            new_total,
        }))
    }

    /// Deposit with no external side effect between validation and commit
    pub fn deposit(&mut self, depositor: Identity, amount: u64) -> PoolResult<DepositResult> {
        Ok(self.prepare_deposit(depositor, amount)?.commit())
    }

    // ============ Withdraw ============

    /// Validate a withdrawal against the account and the pool's asset balance
    pub fn prepare_withdraw(
        &mut self,
        depositor: Identity,
        amount: WithdrawAmount,
        asset_balance: u64,
    ) -> PoolResult<Staged<'_, WithdrawTransition>> {
        require_participant(&depositor)?;

        let (mut account, credited) = self.load_settled(&depositor)?;
        let requested = match amount {
            WithdrawAmount::Exact(value) => value,
            WithdrawAmount::All => safe_add(account.deposit, account.banked_rewards)?,
        };

        let debit = account.plan_debit(requested)?;

        if asset_balance < requested {
            return Err(PoolError::InsufficientPoolBalance {
                available: asset_balance,
                required: requested,
            });
        }

        account.apply_debit(&debit)?;
        let new_total = safe_sub(self.pool.total_deposited, debit.from_deposit)?;
        let new_outstanding = safe_sub(self.pool.outstanding_rewards, debit.from_rewards)?;

        Ok(self.stage(WithdrawTransition {
            depositor,
            debit,
            credited,
            account,
            new_total,
            new_outstanding,
        }))
    }

    /// Withdraw with no external side effect between validation and commit
    pub fn withdraw(
        &mut self,
        depositor: Identity,
        amount: WithdrawAmount,
        asset_balance: u64,
    ) -> PoolResult<WithdrawResult> {
        Ok(self.prepare_withdraw(depositor, amount, asset_balance)?.commit())
    }

    // ============ Share transfer ============

    /// Validate a share transfer; both parties are settled first
    pub fn prepare_transfer(
        &mut self,
        from: Identity,
        to: Identity,
        amount: u64,
    ) -> PoolResult<Staged<'_, ShareTransferTransition>> {
        let transition = self.plan_transfer(from, to, amount)?;
        Ok(self.stage(transition))
    }

    /// Validate a transfer made by `spender` against `from`'s allowance
    pub fn prepare_transfer_from(
        &mut self,
        spender: Identity,
        from: Identity,
        to: Identity,
        amount: u64,
    ) -> PoolResult<Staged<'_, ShareTransferTransition>> {
        require_participant(&spender)?;
        require_non_zero(amount)?;

        let available = self.allowance(&from, &spender);
        if amount > available {
            return Err(PoolError::InsufficientAllowance {
                available,
                requested: amount,
            });
        }

        let mut transition = self.plan_transfer(from, to, amount)?;
        transition.allowance = Some(AllowanceUpdate {
            owner: from,
            spender,
            remaining: available - amount,
        });
        Ok(self.stage(transition))
    }

    fn plan_transfer(
        &self,
        from: Identity,
        to: Identity,
        amount: u64,
    ) -> PoolResult<ShareTransferTransition> {
        require_participant(&from)?;
        require_participant(&to)?;
        require_non_zero(amount)?;

        let (mut from_account, _) = self.load_settled(&from)?;
        if amount > from_account.deposit {
            return Err(PoolError::InsufficientUserBalance {
                available: from_account.deposit,
                requested: amount,
            });
        }

        let to_account = if from == to {
            from_account
        } else {
            let (mut to_account, _) = self.load_settled(&to)?;
            from_account.deposit -= amount;
            to_account.deposit = safe_add(to_account.deposit, amount)?;
            to_account
        };

        Ok(ShareTransferTransition {
            from,
            to,
            amount,
            from_account,
            to_account,
            allowance: None,
        })
    }

    /// Transfer shares with no external side effect
    pub fn transfer(
        &mut self,
        from: Identity,
        to: Identity,
        amount: u64,
    ) -> PoolResult<ShareTransferResult> {
        Ok(self.prepare_transfer(from, to, amount)?.commit())
    }

    /// Delegated transfer with no external side effect
    pub fn transfer_from(
        &mut self,
        spender: Identity,
        from: Identity,
        to: Identity,
        amount: u64,
    ) -> PoolResult<ShareTransferResult> {
        Ok(self.prepare_transfer_from(spender, from, to, amount)?.commit())
    }

    /// Set how many shares `spender` may move out of `owner`'s account
    ///
    /// Overwrites any previous allowance; zero clears it.
    pub fn approve(&mut self, owner: Identity, spender: Identity, amount: u64) -> PoolResult<()> {
        require_participant(&owner)?;
        require_participant(&spender)?;
        self.put_allowance(owner, spender, amount);
        Ok(())
    }

    // ============ Reward injection ============

    /// Validate a reward injection at `now`
    ///
    /// Authorization is the host's concern and must be checked before this.
    pub fn prepare_reward(
        &mut self,
        amount: u64,
        now: u64,
        reward_interval: u64,
    ) -> PoolResult<Staged<'_, RewardTransition>> {
        require_non_zero(amount)?;

        let total = self.pool.total_deposited;
        if total == 0 {
            return Err(PoolError::NothingToDistribute);
        }

        if let Some(next) = self.pool.next_reward_time {
            if now < next {
                return Err(PoolError::TooSoon {
                    now,
                    next_reward_time: next,
                });
            }
        }

        let delta = calculate_reward_per_share_delta(amount, total)?;
        let new_accumulator = self
            .pool
            .rewards_per_share
            .checked_add(delta)
            .ok_or(PoolError::Overflow)?;
        let new_outstanding = safe_add(self.pool.outstanding_rewards, amount)?;
        let next_reward_time = safe_add(now, reward_interval)?;
        let dust = calculate_dust(amount, delta, total)?;

        Ok(self.stage(RewardTransition {
            event: RewardEvent {
                total_deposited: total,
                amount,
                rewards_per_share_delta: delta,
                timestamp: now,
            },
            new_accumulator,
            new_outstanding,
            next_reward_time,
            dust,
        }))
    }

    /// Inject a reward with no external side effect
    pub fn inject_reward(
        &mut self,
        amount: u64,
        now: u64,
        reward_interval: u64,
    ) -> PoolResult<RewardResult> {
        Ok(self.prepare_reward(amount, now, reward_interval)?.commit())
    }

    // ============ Operator balance ============

    /// Check an operator sweep; returns the free balance left afterwards
    ///
    /// The ledger itself does not change: only assets above the pool's
    /// liabilities can leave this way.
    pub fn check_operator_withdrawal(&self, amount: u64, asset_balance: u64) -> PoolResult<u64> {
        require_non_zero(amount)?;

        let free = self.free_balance(asset_balance);
        if amount > free {
            return Err(PoolError::InsufficientPoolBalance {
                available: free,
                required: amount,
            });
        }

        Ok(free - amount)
    }

    // ============ Internals ============

    fn stage<T: Transition>(&mut self, transition: T) -> Staged<'_, T> {
        Staged {
            ledger: self,
            transition,
        }
    }

    /// Settled copy of an account (fresh entry when unknown) and the credit
    fn load_settled(&self, identity: &Identity) -> PoolResult<(AccountState, u64)> {
        let accumulator = self.pool.rewards_per_share;
        let mut account = self
            .accounts
            .get(identity)
            .copied()
            .unwrap_or_else(|| AccountState::new(accumulator));
        let credited = account.settle(accumulator)?;
        Ok((account, credited))
    }

    fn put_account(&mut self, identity: Identity, account: AccountState) {
        if account.is_empty() {
            self.accounts.remove(&identity);
        } else {
            self.accounts.insert(identity, account);
        }
    }

    fn put_allowance(&mut self, owner: Identity, spender: Identity, amount: u64) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// Identities currently holding a balance
    pub fn identities(&self) -> Vec<Identity> {
        self.accounts.keys().copied().collect()
    }
}

fn require_non_zero(amount: u64) -> PoolResult<()> {
    if amount == 0 {
        return Err(PoolError::InvalidAmount {
            amount,
            reason: AmountErrorReason::Zero,
        });
    }
    Ok(())
}

fn require_participant(id: &Identity) -> PoolResult<()> {
    if *id == identity::ZERO {
        return Err(PoolError::InvalidIdentity {
            reason: "zero identity cannot hold shares",
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::rewards::{REWARD_INTERVAL_SECS, SCALE_FACTOR};

    const WEEK: u64 = REWARD_INTERVAL_SECS;

    fn alice() -> Identity {
        [1u8; 32]
    }

    fn bob() -> Identity {
        [2u8; 32]
    }

    #[test]
    fn test_new_ledger() {
        let ledger = Ledger::new();
        assert_eq!(ledger.pool().total_deposited, 0);
        assert_eq!(ledger.pool().rewards_per_share, 0);
        assert_eq!(ledger.pool().next_reward_time, None);
        assert_eq!(ledger.account_count(), 0);
    }

    #[test]
    fn test_deposit() {
        let mut ledger = Ledger::new();
        let result = ledger.deposit(alice(), 1_000_000).unwrap();

        assert_eq!(result.account.deposit, 1_000_000);
        assert_eq!(result.pool_total, 1_000_000);
        assert_eq!(ledger.share_balance(&alice()), 1_000_000);
        assert_eq!(ledger.total_shares(), 1_000_000);
    }

    #[test]
    fn test_deposit_zero() {
        let mut ledger = Ledger::new();
        let result = ledger.deposit(alice(), 0);
        assert!(matches!(result, Err(PoolError::InvalidAmount { .. })));
        assert_eq!(ledger, Ledger::new());
    }

    #[test]
    fn test_deposit_zero_identity() {
        let mut ledger = Ledger::new();
        let result = ledger.deposit(identity::ZERO, 10);
        assert!(matches!(result, Err(PoolError::InvalidIdentity { .. })));
    }

    #[test]
    fn test_reward_on_empty_pool() {
        let mut ledger = Ledger::new();
        let result = ledger.inject_reward(1_000, 0, WEEK);
        assert_eq!(result, Err(PoolError::NothingToDistribute));
    }

    #[test]
    fn test_single_depositor_reward() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000_000).unwrap();
        ledger.inject_reward(1_000, 100, WEEK).unwrap();

        assert_eq!(ledger.entitlement(&alice()).unwrap(), 1_001_000);
        assert_eq!(ledger.claimable_rewards(&alice()).unwrap(), 1_000);
    }

    #[test]
    fn test_two_depositors_proportional() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 100).unwrap();
        ledger.deposit(bob(), 300).unwrap();
        let reward = ledger.inject_reward(200, 0, WEEK).unwrap();

        assert_eq!(reward.event.total_deposited, 400);
        assert_eq!(reward.rewards_per_share, SCALE_FACTOR / 2);
        assert_eq!(ledger.claimable_rewards(&alice()).unwrap(), 50);
        assert_eq!(ledger.claimable_rewards(&bob()).unwrap(), 150);
        assert_eq!(reward.dust, 0);
    }

    #[test]
    fn test_reward_time_gate() {
        let t0 = 1_700_000_000;
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000_000).unwrap();
        ledger.inject_reward(1_000, t0, WEEK).unwrap();

        assert_eq!(
            ledger.inject_reward(1_000, t0 + 1, WEEK),
            Err(PoolError::TooSoon {
                now: t0 + 1,
                next_reward_time: t0 + WEEK
            })
        );
        assert!(ledger.inject_reward(1_000, t0 + WEEK, WEEK).is_ok());
        assert_eq!(ledger.pool().reward_history.len(), 2);
        assert_eq!(ledger.pool().next_reward_time, Some(t0 + 2 * WEEK));
    }

    #[test]
    fn test_over_withdrawal_leaves_state() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        ledger.inject_reward(100, 0, WEEK).unwrap();
        let before = ledger.clone();

        let result = ledger.withdraw(alice(), WithdrawAmount::Exact(1_101), u64::MAX);
        assert_eq!(
            result,
            Err(PoolError::InsufficientUserBalance {
                available: 1_100,
                requested: 1_101
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_withdraw_all_removes_account() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000_000).unwrap();
        ledger.inject_reward(1_000, 0, WEEK).unwrap();

        let result = ledger
            .withdraw(alice(), WithdrawAmount::All, 1_001_000)
            .unwrap();

        assert_eq!(result.debit.from_deposit, 1_000_000);
        assert_eq!(result.debit.from_rewards, 1_000);
        assert_eq!(result.remaining, None);
        assert_eq!(ledger.account(&alice()), None);
        assert_eq!(ledger.pool().total_deposited, 0);
        assert_eq!(ledger.pool().outstanding_rewards, 0);
    }

    #[test]
    fn test_withdraw_all_with_nothing() {
        let mut ledger = Ledger::new();
        let result = ledger.withdraw(alice(), WithdrawAmount::All, 0);
        assert!(matches!(result, Err(PoolError::InvalidAmount { .. })));
    }

    #[test]
    fn test_withdraw_pool_short() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        let before = ledger.clone();

        let result = ledger.withdraw(alice(), WithdrawAmount::All, 10);
        assert_eq!(
            result,
            Err(PoolError::InsufficientPoolBalance {
                available: 10,
                required: 1_000
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_partial_withdraw_keeps_rewards_banked() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        ledger.inject_reward(100, 0, WEEK).unwrap();

        let result = ledger
            .withdraw(alice(), WithdrawAmount::Exact(400), u64::MAX)
            .unwrap();

        assert_eq!(result.credited, 100);
        let remaining = result.remaining.unwrap();
        assert_eq!(remaining.deposit, 600);
        assert_eq!(remaining.banked_rewards, 100);
        assert_eq!(ledger.pool().total_deposited, 600);
    }

    #[test]
    fn test_late_depositor_gets_no_earlier_rewards() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        ledger.inject_reward(1_000, 0, WEEK).unwrap();

        ledger.deposit(bob(), 1_000).unwrap();
        assert_eq!(ledger.claimable_rewards(&bob()).unwrap(), 0);

        ledger.inject_reward(1_000, WEEK, WEEK).unwrap();
        assert_eq!(ledger.claimable_rewards(&bob()).unwrap(), 500);
        assert_eq!(ledger.claimable_rewards(&alice()).unwrap(), 1_500);
    }

    #[test]
    fn test_redeposit_credits_old_share() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000_000).unwrap();
        ledger.inject_reward(1_000, 0, WEEK).unwrap();
        let before = ledger.claimable_rewards(&alice()).unwrap();

        let result = ledger.deposit(alice(), 1_000_000).unwrap();

        assert_eq!(result.credited, before);
        assert_eq!(result.account.banked_rewards, before);
        assert_eq!(
            result.account.rewards_per_share_checkpoint,
            ledger.pool().rewards_per_share
        );
    }

    #[test]
    fn test_transfer_settles_both_parties() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000_000).unwrap();
        ledger.deposit(bob(), 1_000_000).unwrap();
        ledger.inject_reward(2_000, 0, WEEK).unwrap();

        let result = ledger.transfer(alice(), bob(), 100).unwrap();

        assert_eq!(result.from_account.banked_rewards, 1_000);
        assert_eq!(result.to_account.banked_rewards, 1_000);
        assert_eq!(result.from_account.deposit, 999_900);
        assert_eq!(result.to_account.deposit, 1_000_100);
        assert_eq!(ledger.total_shares(), 2_000_000);
    }

    #[test]
    fn test_transfer_to_self() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 500).unwrap();
        ledger.transfer(alice(), alice(), 200).unwrap();
        assert_eq!(ledger.share_balance(&alice()), 500);
    }

    #[test]
    fn test_transfer_exceeding_shares() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 500).unwrap();
        let result = ledger.transfer(alice(), bob(), 501);
        assert!(matches!(result, Err(PoolError::InsufficientUserBalance { .. })));
    }

    #[test]
    fn test_dropped_stage_has_no_effect() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        let before = ledger.clone();

        {
            let staged = ledger
                .prepare_withdraw(alice(), WithdrawAmount::All, 1_000)
                .unwrap();
            assert_eq!(staged.transition().amount(), 1_000);
        }

        assert_eq!(ledger, before);
    }

    #[test]
    fn test_operator_cannot_sweep_liabilities() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        ledger.inject_reward(100, 0, WEEK).unwrap();

        // 1_100 owed; 50 extra is protocol-owned
        assert_eq!(ledger.free_balance(1_150), 50);
        assert_eq!(ledger.check_operator_withdrawal(50, 1_150).unwrap(), 0);
        assert_eq!(
            ledger.check_operator_withdrawal(51, 1_150),
            Err(PoolError::InsufficientPoolBalance {
                available: 50,
                required: 51
            })
        );
    }

    #[test]
    fn test_deposit_overflow_is_too_large() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), u64::MAX).unwrap();
        let before = ledger.clone();

        assert_eq!(
            ledger.deposit(bob(), 1),
            Err(PoolError::InvalidAmount {
                amount: 1,
                reason: AmountErrorReason::TooLarge
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_approve_and_clear() {
        let mut ledger = Ledger::new();
        ledger.approve(alice(), bob(), 300).unwrap();
        assert_eq!(ledger.allowance(&alice(), &bob()), 300);
        assert_eq!(ledger.allowance(&bob(), &alice()), 0);

        ledger.approve(alice(), bob(), 0).unwrap();
        assert!(ledger.allowances().is_empty());
    }

    #[test]
    fn test_approve_zero_identity() {
        let mut ledger = Ledger::new();
        let result = ledger.approve(alice(), identity::ZERO, 5);
        assert!(matches!(result, Err(PoolError::InvalidIdentity { .. })));
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let carol = [3u8; 32];
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        ledger.deposit(carol, 1_000).unwrap();
        ledger.inject_reward(200, 0, WEEK).unwrap();
        ledger.approve(alice(), bob(), 400).unwrap();

        let result = ledger.transfer_from(bob(), alice(), carol, 250).unwrap();

        assert_eq!(result.from_account.deposit, 750);
        assert_eq!(result.from_account.banked_rewards, 100);
        assert_eq!(result.to_account.deposit, 1_250);
        assert_eq!(result.to_account.banked_rewards, 100);
        assert_eq!(ledger.allowance(&alice(), &bob()), 150);
        assert_eq!(ledger.share_balance(&bob()), 0);
    }

    #[test]
    fn test_transfer_from_exhausts_allowance() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        ledger.approve(alice(), bob(), 100).unwrap();

        ledger.transfer_from(bob(), alice(), bob(), 100).unwrap();

        assert_eq!(ledger.allowance(&alice(), &bob()), 0);
        assert!(ledger.allowances().is_empty());
        assert_eq!(ledger.share_balance(&bob()), 100);
    }

    #[test]
    fn test_transfer_from_over_allowance() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 1_000).unwrap();
        ledger.approve(alice(), bob(), 100).unwrap();
        let before = ledger.clone();

        assert_eq!(
            ledger.transfer_from(bob(), alice(), bob(), 101),
            Err(PoolError::InsufficientAllowance {
                available: 100,
                requested: 101
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_transfer_from_over_balance_keeps_allowance() {
        let mut ledger = Ledger::new();
        ledger.deposit(alice(), 50).unwrap();
        ledger.approve(alice(), bob(), 100).unwrap();

        let result = ledger.transfer_from(bob(), alice(), bob(), 80);
        assert!(matches!(result, Err(PoolError::InsufficientUserBalance { .. })));
        assert_eq!(ledger.allowance(&alice(), &bob()), 100);
    }
}
