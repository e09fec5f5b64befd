//! Pool configuration.
//!
//! Loaded from TOML; every field is optional and falls back to the protocol
//! constants in [`ethpool_common::constants`].

use borsh::{BorshDeserialize, BorshSerialize};
use ethpool_common::constants::{rewards, token};
use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating a [`PoolConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse pool config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the ledger cannot run with.
    #[error("invalid pool config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Host-level settings for a [`RewardPool`](crate::RewardPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Minimum seconds between two reward injections.
    pub reward_interval_secs: u64,
    /// Display name of the share token.
    pub share_name: String,
    /// Ticker of the share token.
    pub share_symbol: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            reward_interval_secs: rewards::REWARD_INTERVAL_SECS,
            share_name: token::NAME.to_string(),
            share_symbol: token::SYMBOL.to_string(),
        }
    }
}

impl PoolConfig {
    /// Parse a TOML document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PoolConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reward_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "reward_interval_secs",
                reason: "must be greater than zero",
            });
        }
        if self.share_symbol.is_empty() {
            return Err(ConfigError::Invalid {
                field: "share_symbol",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}
