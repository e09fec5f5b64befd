//! Ledger Events
//!
//! One event is emitted per successful mutating operation. Each carries the
//! identity, amounts, resulting totals and timestamp, so the operation can be
//! reconstructed without replaying ledger state.

use crate::types::Identity;
use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Depositor Events (0x10 - 0x1F)
    Deposited = 0x10,
    Withdrawn = 0x11,
    SharesTransferred = 0x12,
    Approval = 0x13,

    // Reward Events (0x20 - 0x2F)
    RewardInjected = 0x20,

    // Operator Events (0x30 - 0x3F)
    OperatorFunded = 0x30,
    OperatorWithdrawn = 0x31,
}

/// Main event enum containing all ledger events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolEvent {
    /// Emitted when a depositor adds stake
    Deposited {
        depositor: Identity,
        amount: u64,
        new_deposit: u64,
        pool_total: u64,
        timestamp: u64,
    },

    /// Emitted when a depositor withdraws
    Withdrawn {
        depositor: Identity,
        amount: u64,
        from_deposit: u64,
        from_rewards: u64,
        pool_total: u64,
        timestamp: u64,
    },

    /// Emitted when shares move between identities
    SharesTransferred {
        from: Identity,
        to: Identity,
        amount: u64,
        timestamp: u64,
    },

    /// Emitted when an owner sets a spender's allowance
    Approval {
        owner: Identity,
        spender: Identity,
        amount: u64,
        timestamp: u64,
    },

    /// Emitted when a reward is injected
    RewardInjected {
        operator: Identity,
        amount: u64,
        pool_total: u64,
        rewards_per_share: u128,
        next_reward_time: u64,
        timestamp: u64,
    },

    /// Emitted when an operator sends protocol-owned funds in
    OperatorFunded {
        operator: Identity,
        amount: u64,
        timestamp: u64,
    },

    /// Emitted when an operator sweeps protocol-owned funds out
    OperatorWithdrawn {
        operator: Identity,
        amount: u64,
        remaining_free_balance: u64,
        timestamp: u64,
    },
}

impl PoolEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Deposited { .. } => EventType::Deposited,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::SharesTransferred { .. } => EventType::SharesTransferred,
            Self::Approval { .. } => EventType::Approval,
            Self::RewardInjected { .. } => EventType::RewardInjected,
            Self::OperatorFunded { .. } => EventType::OperatorFunded,
            Self::OperatorWithdrawn { .. } => EventType::OperatorWithdrawn,
        }
    }

    /// Get the time the event occurred
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Deposited { timestamp, .. }
            | Self::Withdrawn { timestamp, .. }
            | Self::SharesTransferred { timestamp, .. }
            | Self::Approval { timestamp, .. }
            | Self::RewardInjected { timestamp, .. }
            | Self::OperatorFunded { timestamp, .. }
            | Self::OperatorWithdrawn { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<PoolEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Most recent event
    pub fn last(&self) -> Option<&PoolEvent> {
        self.events.last()
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&PoolEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
