//! Core Types for the ETHPool Ledger
//!
//! Pool-wide and per-account state, reward history entries, and the action
//! shapes accepted by the ledger.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Opaque depositor/operator identifier (32-byte hash)
pub type Identity = [u8; 32];

// ============ Pool Types ============

/// One entry of the append-only reward log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RewardEvent {
    /// Pool total at the time of the injection
    pub total_deposited: u64,
    /// Reward amount injected
    pub amount: u64,
    /// Accumulator increase produced by this injection
    pub rewards_per_share_delta: u128,
    /// Injection timestamp (seconds)
    pub timestamp: u64,
}

/// Global pool state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolState {
    /// Sum of every account deposit
    pub total_deposited: u64,
    /// Cumulative rewards per share, scaled by `SCALE_FACTOR`
    pub rewards_per_share: u128,
    /// Earliest time the next reward may be injected (`None` before the first)
    pub next_reward_time: Option<u64>,
    /// Every reward ever injected, oldest first
    pub reward_history: Vec<RewardEvent>,
    /// Rewards injected but not yet paid out, rounding dust included
    pub outstanding_rewards: u64,
}

impl PoolState {
    /// Creates the initial pool state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a reward may be injected at `now`
    pub fn reward_gate_open(&self, now: u64) -> bool {
        self.next_reward_time.map_or(true, |next| now >= next)
    }

    /// Total amount ever injected as rewards
    pub fn total_rewards_injected(&self) -> u128 {
        self.reward_history.iter().map(|r| r.amount as u128).sum()
    }

    /// Assets the pool owes to depositors (stake plus unpaid rewards)
    pub fn liabilities(&self) -> u64 {
        self.total_deposited.saturating_add(self.outstanding_rewards)
    }
}

// ============ Account Types ============

/// Per-depositor ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccountState {
    /// Current stake (share balance)
    pub deposit: u64,
    /// Accumulator value at the last settlement
    pub rewards_per_share_checkpoint: u128,
    /// Settled rewards not yet withdrawn
    pub banked_rewards: u64,
}

// ============ Actions ============

/// Amount selector for withdrawals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum WithdrawAmount {
    /// Withdraw exactly this many base units
    Exact(u64),
    /// Withdraw the whole entitlement
    All,
}

/// Operations the ledger accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolAction {
    /// Depositor adds stake
    Deposit { amount: u64 },
    /// Depositor withdraws stake and/or rewards
    Withdraw { amount: WithdrawAmount },
    /// Depositor moves shares to another identity
    TransferShares { to: Identity, amount: u64 },
    /// Depositor lets `spender` move up to `amount` of its shares
    Approve { spender: Identity, amount: u64 },
    /// Spender moves shares out of an account that approved it
    TransferSharesFrom { from: Identity, to: Identity, amount: u64 },
    /// Reward authority injects a reward
    InjectReward { amount: u64 },
    /// Operator sends protocol-owned funds in
    FundOperator { amount: u64 },
    /// Operator sweeps protocol-owned funds out
    WithdrawOperatorFunds { amount: u64 },
}
