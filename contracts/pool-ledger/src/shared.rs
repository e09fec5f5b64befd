//! Thread-shared pool handle.
//!
//! Every mutating call holds the write lock for the whole operation, so two
//! callers can never interleave inside one ledger transition. Queries take
//! the read lock and see a consistent ledger.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ethpool_common::{Identity, PoolError, PoolResult, WithdrawAmount};

use crate::{AssetTransfer, Authorizer, Clock, Envelope, EventSink, Outcome, RewardPool};

/// Cloneable handle to a [`RewardPool`] behind an `RwLock`
pub struct SharedPool<A, Z, C, E> {
    inner: Arc<RwLock<RewardPool<A, Z, C, E>>>,
}

impl<A, Z, C, E> Clone for SharedPool<A, Z, C, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, Z, C, E> SharedPool<A, Z, C, E>
where
    A: AssetTransfer,
    Z: Authorizer,
    C: Clock,
    E: EventSink,
{
    pub fn new(pool: RewardPool<A, Z, C, E>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pool)),
        }
    }

    /// Run `f` under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut RewardPool<A, Z, C, E>) -> PoolResult<R>) -> PoolResult<R> {
        let mut guard = self.write_guard()?;
        f(&mut guard)
    }

    /// Run `f` under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&RewardPool<A, Z, C, E>) -> R) -> PoolResult<R> {
        let guard = self.read_guard()?;
        Ok(f(&guard))
    }

    pub fn deposit(&self, depositor: Identity, amount: u64) -> PoolResult<()> {
        self.write(|pool| pool.deposit(depositor, amount).map(|_| ()))
    }

    pub fn withdraw(&self, depositor: Identity, amount: WithdrawAmount) -> PoolResult<u64> {
        self.write(|pool| pool.withdraw(depositor, amount).map(|r| r.debit.total()))
    }

    pub fn inject_reward(&self, caller: Identity, amount: u64) -> PoolResult<()> {
        self.write(|pool| pool.inject_reward(caller, amount).map(|_| ()))
    }

    pub fn dispatch(&self, envelope: &Envelope) -> PoolResult<Outcome> {
        self.write(|pool| pool.dispatch(envelope))
    }

    pub fn entitlement(&self, identity: &Identity) -> PoolResult<u64> {
        self.read(|pool| pool.entitlement(identity))?
    }

    pub fn team_balance(&self) -> PoolResult<u64> {
        self.read(|pool| pool.team_balance())
    }

    pub fn total_shares(&self) -> PoolResult<u64> {
        self.read(|pool| pool.total_shares())
    }

    fn write_guard(&self) -> PoolResult<RwLockWriteGuard<'_, RewardPool<A, Z, C, E>>> {
        self.inner.write().map_err(|_| PoolError::LockPoisoned)
    }

    fn read_guard(&self) -> PoolResult<RwLockReadGuard<'_, RewardPool<A, Z, C, E>>> {
        self.inner.read().map_err(|_| PoolError::LockPoisoned)
    }
}
