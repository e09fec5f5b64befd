//! Collaborator seams
//!
//! The ledger never moves assets, reads a clock, or decides who may do what
//! on its own. Each of those concerns is a trait with an in-process default:
//!
//! | Trait           | Default                          |
//! |-----------------|----------------------------------|
//! | `AssetTransfer` | `InMemoryVault`                  |
//! | `Authorizer`    | `RoleTable`                      |
//! | `Clock`         | `SystemClock`, `ManualClock`     |
//! | `EventSink`     | `EventLog`                       |

use ethpool_common::{Capability, EventLog, Identity, PoolError, PoolEvent, PoolResult, RoleTable};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// ============ Traits ============

/// Custody of the pooled base asset
pub trait AssetTransfer {
    /// Assets currently held by the pool
    fn balance(&self) -> u64;

    /// Take `amount` in from `from`
    fn receive(&mut self, from: Identity, amount: u64) -> PoolResult<()>;

    /// Pay `amount` out to `to`; failure must leave the balance unchanged
    fn send(&mut self, to: Identity, amount: u64) -> PoolResult<()>;
}

/// Capability checks for privileged operations
pub trait Authorizer {
    fn has_capability(&self, identity: &Identity, capability: Capability) -> bool;
}

/// Seconds since the Unix epoch
pub trait Clock {
    fn now(&self) -> u64;
}

/// Receiver of ledger events
pub trait EventSink {
    fn record(&mut self, event: PoolEvent);
}

// ============ Assets ============

/// Asset custody held in memory
#[derive(Debug, Default)]
pub struct InMemoryVault {
    balance: u64,
    fail_sends: AtomicBool,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vault seeded with an opening balance
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance,
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `send` fail (or succeed again)
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

impl AssetTransfer for InMemoryVault {
    fn balance(&self) -> u64 {
        self.balance
    }

    fn receive(&mut self, _from: Identity, amount: u64) -> PoolResult<()> {
        self.balance = self.balance.checked_add(amount).ok_or(PoolError::Overflow)?;
        Ok(())
    }

    fn send(&mut self, to: Identity, amount: u64) -> PoolResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) || amount > self.balance {
            return Err(PoolError::TransferFailed { to, amount });
        }
        self.balance -= amount;
        Ok(())
    }
}

// ============ Authorization ============

impl Authorizer for RoleTable {
    fn has_capability(&self, identity: &Identity, capability: Capability) -> bool {
        RoleTable::has_capability(self, identity, capability)
    }
}

// ============ Clocks ============

/// Wall clock that never runs backwards
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let previous = self.last.fetch_max(wall, Ordering::SeqCst);
        previous.max(wall)
    }
}

/// Hand-driven clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move time forward by `secs`
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ============ Events ============

impl EventSink for EventLog {
    fn record(&mut self, event: PoolEvent) {
        self.emit(event);
    }
}
