//! ETHPool Common Library
//!
//! Accounting core of the ETHPool reward ledger: depositors pool a base
//! asset, a reward authority periodically injects rewards, and every
//! depositor is entitled to a share proportional to its stake at injection
//! time.
//!
//! Distribution is lazy. An injection only bumps a global reward-per-share
//! accumulator; each account records the accumulator value it last settled
//! at and pulls the difference on its next interaction.
//!
//! ## Modules
//!
//! - **pool**: the `Ledger` state machine (prepare / commit transitions)
//! - **account**: per-account settlement and withdrawal debits
//! - **math**: fixed-point accumulator arithmetic
//! - **access_control**: capability table (`Admin`, `RewardAuthority`, `Operator`)
//! - **events**: ledger events and the append-only `EventLog`
//! - **invariants**: whole-ledger consistency checks
//! - **snapshot**: borsh snapshots with a SHA-256 state root
//!
//! Nothing here performs I/O or reads a clock; hosts pass `now` and the
//! asset balance in. The crate is `no_std` compatible when built without the
//! default `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export Vec for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::vec::Vec;
#[cfg(feature = "std")]
pub use std::vec::Vec;

pub mod access_control;
pub mod account;
pub mod constants;
pub mod errors;
pub mod events;
pub mod invariants;
pub mod math;
pub mod pool;
pub mod snapshot;
pub mod types;



// Re-exports for convenience
pub use access_control::{Capability, RoleAssignment, RoleTable};
pub use account::Debit;
pub use constants::*;
pub use errors::*;
pub use events::*;
pub use invariants::check_invariants;
pub use math::*;
pub use pool::*;
pub use snapshot::LedgerSnapshot;
pub use types::*;
