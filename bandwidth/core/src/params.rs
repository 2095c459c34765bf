// Copyright (c) 2024 Botho Foundation

//! Chain-wide bandwidth parameters.
//!
//! These values are immutable within a run and must match across all
//! validators; changing any of them is a hard fork. The usage window is
//! measured in slots (block-height-derived time units), not wall clock.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Divisor converting frozen stake into net weight.
///
/// An account's share of the system bandwidth is
/// `(frozen_balance / STAKE_DIVISOR) * total_net_limit / total_net_weight`.
pub const STAKE_DIVISOR: u64 = 1_000_000;

/// Bandwidth accounting parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Fixed-point scale factor for the decay computation.
    #[serde(default = "default_precision")]
    pub precision: u64,

    /// Width of the usage window in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Nominal slot duration in milliseconds.
    #[serde(default = "default_block_interval_ms")]
    pub block_interval_ms: u64,

    /// Synthetic byte surcharge charged to a sender whose transfer
    /// materializes a previously unseen recipient.
    #[serde(default)]
    pub create_account_cost: u64,

    /// Wall-clock timestamp of the genesis block in milliseconds.
    /// Slot numbers count block intervals elapsed since this instant.
    #[serde(default)]
    pub genesis_timestamp_ms: u64,
}

fn default_precision() -> u64 {
    1_000_000
}

fn default_window_ms() -> u64 {
    86_400_000 // 24 hours
}

fn default_block_interval_ms() -> u64 {
    3_000
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ChainParams {
    /// Mainnet parameters: a 24-hour window of 28 800 three-second slots.
    pub fn mainnet() -> Self {
        Self {
            precision: default_precision(),
            window_ms: default_window_ms(),
            block_interval_ms: default_block_interval_ms(),
            create_account_cost: 1_000,
            genesis_timestamp_ms: 0,
        }
    }

    /// Test/development parameters: a 10-minute window and no surcharge.
    pub fn testnet() -> Self {
        Self {
            precision: default_precision(),
            window_ms: 600_000,
            block_interval_ms: default_block_interval_ms(),
            create_account_cost: 0,
            genesis_timestamp_ms: 0,
        }
    }

    /// Window width in slots (integer division).
    pub fn window_slots(&self) -> u64 {
        self.window_ms / self.block_interval_ms
    }

    /// Load parameters from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read chain params from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse chain params from {}", path.display()))
    }

    /// Save parameters to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize chain params")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write chain params to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mainnet_window_is_28800_slots() {
        let params = ChainParams::mainnet();
        assert_eq!(params.window_slots(), 28_800);
    }

    #[test]
    fn test_testnet_window_is_shorter() {
        let params = ChainParams::testnet();
        assert_eq!(params.window_slots(), 200);
        assert!(params.window_slots() < ChainParams::mainnet().window_slots());
        assert_eq!(params.create_account_cost, 0);
    }

    #[test]
    fn test_default_is_mainnet() {
        assert_eq!(ChainParams::default(), ChainParams::mainnet());
    }

    #[test]
    fn test_params_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bandwidth.toml");

        let params = ChainParams {
            create_account_cost: 42,
            ..ChainParams::mainnet()
        };
        params.save(&path).unwrap();

        let loaded = ChainParams::load(&path).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bandwidth.toml");
        fs::write(&path, "create_account_cost = 7\n").unwrap();

        let loaded = ChainParams::load(&path).unwrap();
        assert_eq!(loaded.create_account_cost, 7);
        assert_eq!(loaded.precision, 1_000_000);
        assert_eq!(loaded.window_slots(), 28_800);
    }
}
