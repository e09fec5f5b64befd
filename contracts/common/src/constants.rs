//! Protocol Constants
//!
//! All magic numbers and configuration defaults for the ETHPool ledger.
//! Hosts may override the reward interval through `PoolConfig`; everything
//! else here is fixed by the accounting model.

/// Share Token Metadata
pub mod token {
    /// Share token name
    pub const NAME: &str = "Pooled ETH";
    /// Share token symbol
    pub const SYMBOL: &str = "pETH";
    /// Decimal places of the base unit (gwei denominated)
    pub const DECIMALS: u8 = 9;
    /// One whole unit in base units
    pub const ONE: u64 = 1_000_000_000;
}

/// Reward Accumulator Configuration
pub mod rewards {
    /// Fixed-point scale of the reward-per-share accumulator (1e18)
    ///
    /// `amount * SCALE_FACTOR / total_deposited` only truncates to zero when
    /// the pool holds more than 1e18 base units per unit of reward.
    pub const SCALE_FACTOR: u128 = 1_000_000_000_000_000_000;

    /// Minimum time between two reward injections (7 days)
    pub const REWARD_INTERVAL_SECS: u64 = 7 * super::time::SECONDS_PER_DAY;
}

/// Time-related constants
pub mod time {
    /// Seconds per hour
    pub const SECONDS_PER_HOUR: u64 = 3_600;

    /// Seconds per day
    pub const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
}

/// Identity Constants
pub mod identity {
    /// Reserved identity, never a valid participant
    pub const ZERO: [u8; 32] = [0u8; 32];
}
