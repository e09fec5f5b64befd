//! Ledger Snapshots
//!
//! Borsh-encoded copy of the full ledger plus a SHA-256 state root. Restoring
//! re-runs every invariant check so a tampered or truncated snapshot never
//! becomes a live ledger.

use crate::invariants::check_invariants;
use crate::pool::{Allowances, Ledger};
use crate::types::{AccountState, Identity, PoolState};
use crate::{PoolError, PoolResult, Vec};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::BTreeMap;

/// Persisted ledger layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LedgerSnapshot {
    pub pool: PoolState,
    pub accounts: BTreeMap<Identity, AccountState>,
    pub allowances: Allowances,
}

impl LedgerSnapshot {
    /// Capture the current ledger
    pub fn capture(ledger: &Ledger) -> Self {
        Self {
            pool: ledger.pool().clone(),
            accounts: ledger.accounts().clone(),
            allowances: ledger.allowances().clone(),
        }
    }

    /// Borsh encoding of the snapshot
    pub fn to_bytes(&self) -> PoolResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|_| PoolError::CorruptSnapshot {
            reason: "snapshot encoding failed",
        })
    }

    /// Decode a snapshot; no invariant checks yet
    pub fn from_bytes(bytes: &[u8]) -> PoolResult<Self> {
        borsh::from_slice(bytes).map_err(|_| PoolError::CorruptSnapshot {
            reason: "snapshot bytes do not decode",
        })
    }

    /// SHA-256 of the borsh encoding
    pub fn state_root(&self) -> PoolResult<[u8; 32]> {
        use sha2::{Digest, Sha256};

        let bytes = self.to_bytes()?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let result = hasher.finalize();
        let mut root = [0u8; 32];
        root.copy_from_slice(&result);
        Ok(root)
    }

    /// Turn the snapshot back into a live ledger after validating it
    pub fn restore(self) -> PoolResult<Ledger> {
        let ledger = Ledger::from_parts(self.pool, self.accounts, self.allowances);
        check_invariants(&ledger).map_err(|err| match err {
            PoolError::InvariantViolation { name } => PoolError::CorruptSnapshot { reason: name },
            _ => PoolError::CorruptSnapshot {
                reason: "snapshot arithmetic out of range",
            },
        })?;
        Ok(ledger)
    }
}

impl Ledger {
    /// Snapshot of the current state
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(self)
    }

    /// State root of the current state
    pub fn state_root(&self) -> PoolResult<[u8; 32]> {
        self.snapshot().state_root()
    }

    /// Decode and validate a ledger from snapshot bytes
    pub fn restore_from_bytes(bytes: &[u8]) -> PoolResult<Self> {
        LedgerSnapshot::from_bytes(bytes)?.restore()
    }
}
