//! ETHPool Reward Pool
//!
//! Host for the [`ethpool_common::Ledger`]. The ledger is pure accounting;
//! this crate wires it to its collaborators (asset custody, authorization,
//! time, event sink), checks capabilities, and logs every decision.
//!
//! ## Operation shape
//!
//! ```text
//! authorize -> ledger.prepare_*  -> asset transfer -> commit -> emit event
//! ```
//!
//! A failure at any step before `commit` drops the staged transition, so the
//! ledger, the asset balance and the event log are all left as they were.

pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod shared;


pub use collaborators::{AssetTransfer, Authorizer, Clock, EventSink, InMemoryVault, ManualClock, SystemClock};
pub use config::{ConfigError, PoolConfig};
pub use dispatch::{decode_envelope, Envelope, PoolCall};
pub use shared::SharedPool;

use ethpool_common::constants::token;
use ethpool_common::{
    check_invariants, Capability, DepositResult, Identity, Ledger, LedgerSnapshot, PoolAction,
    PoolError, PoolEvent, PoolResult, RewardResult, ShareTransferResult, WithdrawAmount,
    WithdrawResult,
};
use tracing::{debug, info, warn};

// ============ Outcomes ============

/// What a dispatched action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deposited(DepositResult),
    Withdrawn(WithdrawResult),
    SharesTransferred(ShareTransferResult),
    Approved { amount: u64 },
    RewardInjected(RewardResult),
    OperatorFunded { amount: u64 },
    OperatorWithdrawn { remaining_free_balance: u64 },
}

// ============ Reward Pool ============

/// Ledger plus its collaborators
pub struct RewardPool<A, Z, C, E> {
    ledger: Ledger,
    config: PoolConfig,
    assets: A,
    authorizer: Z,
    clock: C,
    events: E,
}

impl<A, Z, C, E> RewardPool<A, Z, C, E>
where
    A: AssetTransfer,
    Z: Authorizer,
    C: Clock,
    E: EventSink,
{
    /// Fresh pool with an empty ledger
    pub fn new(
        config: PoolConfig,
        assets: A,
        authorizer: Z,
        clock: C,
        events: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            interval = config.reward_interval_secs,
            symbol = %config.share_symbol,
            "reward pool initialized"
        );

        Ok(Self {
            ledger: Ledger::new(),
            config,
            assets,
            authorizer,
            clock,
            events,
        })
    }

    // ============ Depositor operations ============

    /// Stake `amount`; the value is taken in through the asset collaborator
    pub fn deposit(&mut self, depositor: Identity, amount: u64) -> PoolResult<DepositResult> {
        self.try_deposit(depositor, amount)
            .inspect_err(|err| rejected("deposit", &depositor, err))
    }

    fn try_deposit(&mut self, depositor: Identity, amount: u64) -> PoolResult<DepositResult> {
        let now = self.clock.now();
        let staged = self.ledger.prepare_deposit(depositor, amount)?;
        self.assets.receive(depositor, amount)?;
        let result = staged.commit();

        settled(&depositor, result.credited);
        info!(
            depositor = %short_id(&depositor),
            amount,
            pool_total = result.pool_total,
            "deposit"
        );
        self.events.record(PoolEvent::Deposited {
            depositor,
            amount,
            new_deposit: result.account.deposit,
            pool_total: result.pool_total,
            timestamp: now,
        });
        Ok(result)
    }

    /// Withdraw stake and rewards, deposit first
    pub fn withdraw(&mut self, depositor: Identity, amount: WithdrawAmount) -> PoolResult<WithdrawResult> {
        self.try_withdraw(depositor, amount)
            .inspect_err(|err| rejected("withdraw", &depositor, err))
    }

    fn try_withdraw(&mut self, depositor: Identity, amount: WithdrawAmount) -> PoolResult<WithdrawResult> {
        let now = self.clock.now();
        let balance = self.assets.balance();
        let staged = self.ledger.prepare_withdraw(depositor, amount, balance)?;
        self.assets.send(depositor, staged.transition().amount())?;
        let result = staged.commit();

        settled(&depositor, result.credited);
        info!(
            depositor = %short_id(&depositor),
            amount = result.debit.total(),
            from_deposit = result.debit.from_deposit,
            from_rewards = result.debit.from_rewards,
            pool_total = result.pool_total,
            "withdraw"
        );
        self.events.record(PoolEvent::Withdrawn {
            depositor,
            amount: result.debit.total(),
            from_deposit: result.debit.from_deposit,
            from_rewards: result.debit.from_rewards,
            pool_total: result.pool_total,
            timestamp: now,
        });
        Ok(result)
    }

    /// Move shares; banked rewards stay with their owner
    pub fn transfer_shares(
        &mut self,
        from: Identity,
        to: Identity,
        amount: u64,
    ) -> PoolResult<ShareTransferResult> {
        let now = self.clock.now();
        let result = self
            .ledger
            .transfer(from, to, amount)
            .inspect_err(|err| rejected("transfer", &from, err))?;

        info!(
            from = %short_id(&from),
            to = %short_id(&to),
            amount,
            "shares transferred"
        );
        self.events.record(PoolEvent::SharesTransferred {
            from,
            to,
            amount,
            timestamp: now,
        });
        Ok(result)
    }

    /// Move shares out of `from` against the allowance it granted `spender`
    pub fn transfer_shares_from(
        &mut self,
        spender: Identity,
        from: Identity,
        to: Identity,
        amount: u64,
    ) -> PoolResult<ShareTransferResult> {
        let now = self.clock.now();
        let result = self
            .ledger
            .transfer_from(spender, from, to, amount)
            .inspect_err(|err| rejected("transfer_from", &spender, err))?;

        info!(
            spender = %short_id(&spender),
            from = %short_id(&from),
            to = %short_id(&to),
            amount,
            remaining_allowance = self.ledger.allowance(&from, &spender),
            "shares transferred on behalf"
        );
        self.events.record(PoolEvent::SharesTransferred {
            from,
            to,
            amount,
            timestamp: now,
        });
        Ok(result)
    }

    /// Let `spender` move up to `amount` of `owner`'s shares; zero revokes
    pub fn approve(&mut self, owner: Identity, spender: Identity, amount: u64) -> PoolResult<()> {
        let now = self.clock.now();
        self.ledger
            .approve(owner, spender, amount)
            .inspect_err(|err| rejected("approve", &owner, err))?;

        info!(owner = %short_id(&owner), spender = %short_id(&spender), amount, "allowance set");
        self.events.record(PoolEvent::Approval {
            owner,
            spender,
            amount,
            timestamp: now,
        });
        Ok(())
    }

    // ============ Privileged operations ============

    /// Distribute `amount` across current depositors
    pub fn inject_reward(&mut self, caller: Identity, amount: u64) -> PoolResult<RewardResult> {
        self.try_inject_reward(caller, amount)
            .inspect_err(|err| rejected("inject_reward", &caller, err))
    }

    fn try_inject_reward(&mut self, caller: Identity, amount: u64) -> PoolResult<RewardResult> {
        self.require(&caller, Capability::RewardAuthority)?;

        let now = self.clock.now();
        let staged = self
            .ledger
            .prepare_reward(amount, now, self.config.reward_interval_secs)?;
        self.assets.receive(caller, amount)?;
        let result = staged.commit();

        if result.dust > 0 {
            debug!(dust = result.dust, "reward rounding dust retained");
        }
        info!(
            operator = %short_id(&caller),
            amount,
            pool_total = result.event.total_deposited,
            next_reward_time = result.next_reward_time,
            "reward injected"
        );
        self.events.record(PoolEvent::RewardInjected {
            operator: caller,
            amount,
            pool_total: result.event.total_deposited,
            rewards_per_share: result.rewards_per_share,
            next_reward_time: result.next_reward_time,
            timestamp: now,
        });
        Ok(result)
    }

    /// Send protocol-owned funds into the pool
    pub fn fund_operator(&mut self, caller: Identity, amount: u64) -> PoolResult<()> {
        self.try_fund_operator(caller, amount)
            .inspect_err(|err| rejected("fund_operator", &caller, err))
    }

    fn try_fund_operator(&mut self, caller: Identity, amount: u64) -> PoolResult<()> {
        self.require(&caller, Capability::Operator)?;
        if amount == 0 {
            return Err(PoolError::InvalidAmount {
                amount,
                reason: ethpool_common::AmountErrorReason::Zero,
            });
        }

        let now = self.clock.now();
        self.assets.receive(caller, amount)?;

        info!(operator = %short_id(&caller), amount, "operator funded");
        self.events.record(PoolEvent::OperatorFunded {
            operator: caller,
            amount,
            timestamp: now,
        });
        Ok(())
    }

    /// Sweep protocol-owned funds; returns the free balance left
    pub fn withdraw_operator_funds(&mut self, caller: Identity, amount: u64) -> PoolResult<u64> {
        self.try_withdraw_operator_funds(caller, amount)
            .inspect_err(|err| rejected("withdraw_operator_funds", &caller, err))
    }

    fn try_withdraw_operator_funds(&mut self, caller: Identity, amount: u64) -> PoolResult<u64> {
        self.require(&caller, Capability::Operator)?;

        let now = self.clock.now();
        let remaining = self
            .ledger
            .check_operator_withdrawal(amount, self.assets.balance())?;
        self.assets.send(caller, amount)?;

        info!(operator = %short_id(&caller), amount, remaining, "operator withdrawal");
        self.events.record(PoolEvent::OperatorWithdrawn {
            operator: caller,
            amount,
            remaining_free_balance: remaining,
            timestamp: now,
        });
        Ok(remaining)
    }

    // ============ Dispatch ============

    /// Run a decoded action on behalf of `caller`
    pub fn execute(&mut self, caller: Identity, action: &PoolAction) -> PoolResult<Outcome> {
        match *action {
            PoolAction::Deposit { amount } => self.deposit(caller, amount).map(Outcome::Deposited),
            PoolAction::Withdraw { amount } => self.withdraw(caller, amount).map(Outcome::Withdrawn),
            PoolAction::TransferShares { to, amount } => self
                .transfer_shares(caller, to, amount)
                .map(Outcome::SharesTransferred),
            PoolAction::TransferSharesFrom { from, to, amount } => self
                .transfer_shares_from(caller, from, to, amount)
                .map(Outcome::SharesTransferred),
            PoolAction::Approve { spender, amount } => self
                .approve(caller, spender, amount)
                .map(|()| Outcome::Approved { amount }),
            PoolAction::InjectReward { amount } => {
                self.inject_reward(caller, amount).map(Outcome::RewardInjected)
            }
            PoolAction::FundOperator { amount } => self
                .fund_operator(caller, amount)
                .map(|()| Outcome::OperatorFunded { amount }),
            PoolAction::WithdrawOperatorFunds { amount } => self
                .withdraw_operator_funds(caller, amount)
                .map(|remaining_free_balance| Outcome::OperatorWithdrawn {
                    remaining_free_balance,
                }),
        }
    }

    /// Decode and run a raw call
    pub fn dispatch(&mut self, envelope: &Envelope) -> PoolResult<Outcome> {
        let action = decode_envelope(envelope)
            .inspect_err(|err| rejected("dispatch", &envelope.caller, err))?;
        self.execute(envelope.caller, &action)
    }

    // ============ Queries ============

    /// Deposit plus banked plus pending rewards
    pub fn entitlement(&self, identity: &Identity) -> PoolResult<u64> {
        self.ledger.entitlement(identity)
    }

    /// Banked plus pending rewards
    pub fn pending_rewards(&self, identity: &Identity) -> PoolResult<u64> {
        self.ledger.claimable_rewards(identity)
    }

    /// Share token balance
    pub fn share_balance(&self, identity: &Identity) -> u64 {
        self.ledger.share_balance(identity)
    }

    /// Share token supply
    pub fn total_shares(&self) -> u64 {
        self.ledger.total_shares()
    }

    /// Shares `owner` has let `spender` move
    pub fn allowance(&self, owner: &Identity, spender: &Identity) -> u64 {
        self.ledger.allowance(owner, spender)
    }

    /// Asset balance not owed to depositors
    pub fn team_balance(&self) -> u64 {
        self.ledger.free_balance(self.assets.balance())
    }

    pub fn share_name(&self) -> &str {
        &self.config.share_name
    }

    pub fn share_symbol(&self) -> &str {
        &self.config.share_symbol
    }

    /// Shares are denominated one-to-one in the asset's base unit
    pub fn share_decimals(&self) -> u8 {
        token::DECIMALS
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn authorizer(&self) -> &Z {
        &self.authorizer
    }

    /// Mutable access for grant management
    pub fn authorizer_mut(&mut self) -> &mut Z {
        &mut self.authorizer
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    // ============ Persistence ============

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    /// Replace the ledger with a validated snapshot
    pub fn restore(&mut self, bytes: &[u8]) -> PoolResult<()> {
        let ledger = Ledger::restore_from_bytes(bytes)
            .inspect_err(|err| warn!(code = err.code(), %err, "snapshot rejected"))?;
        info!(
            accounts = ledger.account_count(),
            pool_total = ledger.total_shares(),
            "ledger restored"
        );
        self.ledger = ledger;
        Ok(())
    }

    /// Run the full invariant set against the live ledger
    pub fn verify(&self) -> PoolResult<()> {
        check_invariants(&self.ledger)?;
        ethpool_common::invariants::check_solvency(&self.ledger, self.assets.balance())
    }

    fn require(&self, caller: &Identity, capability: Capability) -> PoolResult<()> {
        if !self.authorizer.has_capability(caller, capability) {
            return Err(PoolError::Unauthorized {
                identity: *caller,
                capability,
            });
        }
        Ok(())
    }
}

// ============ Logging helpers ============

fn rejected(operation: &'static str, identity: &Identity, err: &PoolError) {
    warn!(
        operation,
        identity = %short_id(identity),
        code = err.code(),
        %err,
        "operation rejected"
    );
}

fn settled(identity: &Identity, credited: u64) {
    if credited > 0 {
        debug!(identity = %short_id(identity), credited, "rewards settled");
    }
}

/// First four bytes of an identity as hex
fn short_id(identity: &Identity) -> String {
    identity[..4].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethpool_common::{EventLog, EventType, RoleTable};

    const T0: u64 = 1_700_000_000;
    const WEEK: u64 = 604_800;

    type TestPool = RewardPool<InMemoryVault, RoleTable, ManualClock, EventLog>;

    fn team() -> Identity {
        [0xEE; 32]
    }

    fn alice() -> Identity {
        [0xA1; 32]
    }

    fn bob() -> Identity {
        [0xB0; 32]
    }

    fn test_pool() -> (TestPool, ManualClock) {
        let clock = ManualClock::new(T0);
        let pool = RewardPool::new(
            PoolConfig::default(),
            InMemoryVault::new(),
            RoleTable::new(team(), T0),
            clock.clone(),
            EventLog::new(),
        )
        .unwrap();
        (pool, clock)
    }

    #[test]
    fn test_share_metadata() {
        let (pool, _) = test_pool();
        assert_eq!(pool.share_name(), "Pooled ETH");
        assert_eq!(pool.share_symbol(), "pETH");
        assert_eq!(pool.share_decimals(), 9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PoolConfig {
            reward_interval_secs: 0,
            ..PoolConfig::default()
        };
        let result = RewardPool::new(
            config,
            InMemoryVault::new(),
            RoleTable::new(team(), 0),
            ManualClock::new(0),
            EventLog::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_deposit_reward_withdraw_flow() {
        let (mut pool, _) = test_pool();

        pool.deposit(alice(), 1_000_000).unwrap();
        pool.inject_reward(team(), 1_000).unwrap();
        assert_eq!(pool.entitlement(&alice()).unwrap(), 1_001_000);
        assert_eq!(pool.pending_rewards(&alice()).unwrap(), 1_000);

        let result = pool.withdraw(alice(), WithdrawAmount::All).unwrap();
        assert_eq!(result.debit.total(), 1_001_000);
        assert_eq!(pool.assets().balance(), 0);
        assert_eq!(pool.events().len(), 3);
        pool.verify().unwrap();
    }

    #[test]
    fn test_events_carry_clock_time() {
        let (mut pool, clock) = test_pool();
        pool.deposit(alice(), 10).unwrap();
        clock.advance(30);
        pool.deposit(alice(), 10).unwrap();

        let deposits = pool.events().filter_by_type(EventType::Deposited);
        assert_eq!(deposits[0].timestamp(), T0);
        assert_eq!(deposits[1].timestamp(), T0 + 30);
    }

    #[test]
    fn test_reward_requires_capability() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();

        let result = pool.inject_reward(alice(), 100);
        assert_eq!(
            result,
            Err(PoolError::Unauthorized {
                identity: alice(),
                capability: Capability::RewardAuthority
            })
        );
        assert_eq!(pool.assets().balance(), 1_000);
    }

    #[test]
    fn test_authorization_checked_before_amount() {
        let (mut pool, _) = test_pool();
        let result = pool.inject_reward(alice(), 0);
        assert!(matches!(result, Err(PoolError::Unauthorized { .. })));
    }

    #[test]
    fn test_granted_reward_authority() {
        let (mut pool, _) = test_pool();
        pool.authorizer_mut()
            .grant(team(), bob(), Capability::RewardAuthority, T0)
            .unwrap();
        pool.deposit(alice(), 1_000).unwrap();

        assert!(pool.inject_reward(bob(), 100).is_ok());
    }

    #[test]
    fn test_reward_gate_uses_clock() {
        let (mut pool, clock) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        pool.inject_reward(team(), 10).unwrap();

        clock.advance(1);
        assert!(matches!(
            pool.inject_reward(team(), 10),
            Err(PoolError::TooSoon { .. })
        ));

        clock.set(T0 + WEEK);
        assert!(pool.inject_reward(team(), 10).is_ok());
    }

    #[test]
    fn test_failed_transfer_leaves_everything() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        let before = pool.ledger().clone();
        let events_before = pool.events().len();

        pool.assets().set_fail_sends(true);
        let result = pool.withdraw(alice(), WithdrawAmount::All);

        assert!(matches!(result, Err(PoolError::TransferFailed { .. })));
        assert_eq!(pool.ledger(), &before);
        assert_eq!(pool.assets().balance(), 1_000);
        assert_eq!(pool.events().len(), events_before);
    }

    #[test]
    fn test_sweep_then_full_exit() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        pool.fund_operator(team(), 500).unwrap();
        pool.withdraw_operator_funds(team(), 500).unwrap();

        let result = pool.withdraw(alice(), WithdrawAmount::Exact(1_000));
        assert!(result.is_ok());
        assert_eq!(pool.team_balance(), 0);
        assert_eq!(pool.assets().balance(), 0);
    }

    #[test]
    fn test_custody_short_of_liabilities() {
        // Custody seeded below what the restored ledger owes
        let (mut source, _) = test_pool();
        source.deposit(alice(), 1_000).unwrap();
        let bytes = source.snapshot().to_bytes().unwrap();

        let mut pool = RewardPool::new(
            PoolConfig::default(),
            InMemoryVault::with_balance(400),
            RoleTable::new(team(), T0),
            ManualClock::new(T0),
            EventLog::new(),
        )
        .unwrap();
        pool.restore(&bytes).unwrap();
        let before = pool.ledger().clone();

        let result = pool.withdraw(alice(), WithdrawAmount::All);
        assert_eq!(
            result,
            Err(PoolError::InsufficientPoolBalance {
                available: 400,
                required: 1_000
            })
        );
        assert_eq!(pool.ledger(), &before);
        assert_eq!(pool.assets().balance(), 400);
        assert!(pool.verify().is_err());
    }

    #[test]
    fn test_operator_balance() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        pool.fund_operator(team(), 300).unwrap();
        assert_eq!(pool.team_balance(), 300);

        let err = pool.withdraw_operator_funds(team(), 301).unwrap_err();
        assert_eq!(
            err,
            PoolError::InsufficientPoolBalance {
                available: 300,
                required: 301
            }
        );

        assert_eq!(pool.withdraw_operator_funds(team(), 100).unwrap(), 200);
        assert_eq!(pool.assets().balance(), 1_200);
    }

    #[test]
    fn test_operator_funding_requires_operator() {
        let (mut pool, _) = test_pool();
        let result = pool.fund_operator(alice(), 100);
        assert!(matches!(result, Err(PoolError::Unauthorized { .. })));
        assert_eq!(pool.assets().balance(), 0);
    }

    #[test]
    fn test_operator_withdrawal_requires_operator() {
        let (mut pool, _) = test_pool();
        pool.fund_operator(team(), 300).unwrap();

        let result = pool.withdraw_operator_funds(alice(), 100);
        assert_eq!(
            result,
            Err(PoolError::Unauthorized {
                identity: alice(),
                capability: Capability::Operator
            })
        );
        assert_eq!(pool.assets().balance(), 300);
        assert_eq!(pool.team_balance(), 300);
    }

    #[test]
    fn test_operator_cannot_touch_rewards() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        pool.inject_reward(team(), 100).unwrap();

        assert_eq!(pool.team_balance(), 0);
        assert!(pool.withdraw_operator_funds(team(), 1).is_err());
    }

    #[test]
    fn test_dispatch_round() {
        let (mut pool, _) = test_pool();

        let deposit = Envelope::call(alice(), 700, &PoolCall::deposit()).unwrap();
        let outcome = pool.dispatch(&deposit).unwrap();
        assert!(matches!(outcome, Outcome::Deposited(_)));

        let reward = Envelope::call(team(), 70, &PoolCall::inject_reward()).unwrap();
        pool.dispatch(&reward).unwrap();

        let funding = Envelope::plain(team(), 5);
        assert_eq!(
            pool.dispatch(&funding).unwrap(),
            Outcome::OperatorFunded { amount: 5 }
        );

        let exit = Envelope::call(alice(), 0, &PoolCall::withdraw_all()).unwrap();
        let Outcome::Withdrawn(result) = pool.dispatch(&exit).unwrap() else {
            panic!("expected withdrawal");
        };
        assert_eq!(result.debit.total(), 770);
        assert_eq!(pool.team_balance(), 5);
    }

    #[test]
    fn test_dispatch_transfer() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();

        let transfer = Envelope::call(alice(), 0, &PoolCall::transfer(bob(), 250)).unwrap();
        let Outcome::SharesTransferred(result) = pool.dispatch(&transfer).unwrap() else {
            panic!("expected share transfer");
        };
        assert_eq!(result.from_account.deposit, 750);
        assert_eq!(result.to_account.deposit, 250);
        assert_eq!(pool.share_balance(&bob()), 250);

        let paid = Envelope::call(alice(), 1, &PoolCall::transfer(bob(), 10)).unwrap();
        assert!(matches!(pool.dispatch(&paid), Err(PoolError::MalformedCall { .. })));
        assert_eq!(pool.share_balance(&alice()), 750);
    }

    #[test]
    fn test_dispatch_operator_withdrawal() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        pool.dispatch(&Envelope::plain(team(), 200)).unwrap();

        let sweep = Envelope::call(team(), 0, &PoolCall::withdraw_operator(150)).unwrap();
        assert_eq!(
            pool.dispatch(&sweep).unwrap(),
            Outcome::OperatorWithdrawn {
                remaining_free_balance: 50
            }
        );
        assert_eq!(pool.assets().balance(), 1_050);

        let by_depositor = Envelope::call(alice(), 0, &PoolCall::withdraw_operator(50)).unwrap();
        assert!(matches!(
            pool.dispatch(&by_depositor),
            Err(PoolError::Unauthorized { .. })
        ));
        assert_eq!(pool.team_balance(), 50);
    }

    #[test]
    fn test_dispatch_approve_and_transfer_from() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();

        let approve = Envelope::call(alice(), 0, &PoolCall::approve(bob(), 300)).unwrap();
        assert_eq!(pool.dispatch(&approve).unwrap(), Outcome::Approved { amount: 300 });
        assert_eq!(pool.allowance(&alice(), &bob()), 300);
        assert_eq!(pool.events().filter_by_type(EventType::Approval).len(), 1);

        let pull = PoolCall::transfer_from(alice(), bob(), 200);
        let outcome = pool.dispatch(&Envelope::call(bob(), 0, &pull).unwrap()).unwrap();
        assert!(matches!(outcome, Outcome::SharesTransferred(_)));
        assert_eq!(pool.share_balance(&bob()), 200);
        assert_eq!(pool.allowance(&alice(), &bob()), 100);

        let over = PoolCall::transfer_from(alice(), bob(), 101);
        let result = pool.dispatch(&Envelope::call(bob(), 0, &over).unwrap());
        assert_eq!(
            result,
            Err(PoolError::InsufficientAllowance {
                available: 100,
                requested: 101
            })
        );
        assert_eq!(pool.share_balance(&alice()), 800);
        pool.verify().unwrap();
    }

    #[test]
    fn test_transfer_from_settles_both_parties() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        pool.deposit(bob(), 1_000).unwrap();
        pool.inject_reward(team(), 200).unwrap();
        pool.approve(alice(), bob(), 500).unwrap();

        pool.transfer_shares_from(bob(), alice(), bob(), 500).unwrap();

        assert_eq!(pool.pending_rewards(&alice()).unwrap(), 100);
        assert_eq!(pool.pending_rewards(&bob()).unwrap(), 100);
        assert_eq!(pool.entitlement(&alice()).unwrap(), 600);
        assert_eq!(pool.entitlement(&bob()).unwrap(), 1_600);
        pool.verify().unwrap();
    }

    #[test]
    fn test_dispatch_rejects_plain_value_from_depositor() {
        let (mut pool, _) = test_pool();
        let result = pool.dispatch(&Envelope::plain(alice(), 5));
        assert!(matches!(result, Err(PoolError::Unauthorized { .. })));
    }

    #[test]
    fn test_dispatch_rejects_malformed() {
        let (mut pool, _) = test_pool();
        let env = Envelope {
            caller: alice(),
            value: 3,
            data: vec![1, 2, 3],
        };
        assert!(matches!(pool.dispatch(&env), Err(PoolError::MalformedCall { .. })));
        assert_eq!(pool.assets().balance(), 0);
    }

    #[test]
    fn test_transfer_shares_event() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        pool.transfer_shares(alice(), bob(), 400).unwrap();

        assert_eq!(pool.share_balance(&bob()), 400);
        assert_eq!(pool.total_shares(), 1_000);
        assert_eq!(pool.events().filter_by_type(EventType::SharesTransferred).len(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let (mut pool, _) = test_pool();
        pool.deposit(alice(), 1_000).unwrap();
        pool.inject_reward(team(), 50).unwrap();
        let bytes = pool.snapshot().to_bytes().unwrap();

        let (mut fresh, _) = test_pool();
        fresh.restore(&bytes).unwrap();
        assert_eq!(fresh.ledger(), pool.ledger());
        assert_eq!(fresh.entitlement(&alice()).unwrap(), 1_050);

        assert!(fresh.restore(&bytes[..4]).is_err());
        assert_eq!(fresh.ledger(), pool.ledger());
    }
}
