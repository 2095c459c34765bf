// Copyright (c) 2024 Botho Foundation

//! Per-account bandwidth state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;

/// One per-asset free bandwidth bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeAssetNet {
    /// Recorded usage in bytes.
    pub usage: u64,
    /// Slot of the last charge against this bucket.
    pub latest_slot: u64,
}

/// Bandwidth-relevant account state.
///
/// Each `(usage, time)` pair is a bucket read and written by the bandwidth
/// processor; the usage figure is meaningful only together with its paired
/// slot, because the effective value decays as slots pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account's address.
    pub address: Address,

    /// Stake backing the staked bandwidth bucket.
    pub frozen_balance: u64,

    /// Staked-bucket usage in bytes.
    pub net_usage: u64,
    /// Slot of the last staked-bucket charge.
    pub latest_consume_time: u64,

    /// Free-bucket usage in bytes.
    pub free_net_usage: u64,
    /// Slot of the last free-bucket charge.
    pub latest_consume_free_time: u64,

    /// Per-asset free buckets, keyed by asset name.
    ///
    /// BTreeMap keeps the serialized form deterministic across validators.
    pub free_asset_net: BTreeMap<String, FreeAssetNet>,

    /// Block timestamp (ms) of the last charge touching this account.
    pub latest_operation_time: u64,
}

impl Account {
    /// A fresh account with zeroed buckets.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    /// Recorded usage of the free bucket for `asset`; zero when the asset
    /// has never been charged.
    pub fn free_asset_net_usage(&self, asset: &str) -> u64 {
        self.free_asset_net
            .get(asset)
            .map(|b| b.usage)
            .unwrap_or(0)
    }

    /// Slot of the last charge against the free bucket for `asset`.
    pub fn latest_asset_operation_time(&self, asset: &str) -> u64 {
        self.free_asset_net
            .get(asset)
            .map(|b| b.latest_slot)
            .unwrap_or(0)
    }

    /// Overwrite the free bucket for `asset`.
    pub fn set_free_asset_net(&mut self, asset: &str, usage: u64, latest_slot: u64) {
        self.free_asset_net
            .insert(asset.to_string(), FreeAssetNet { usage, latest_slot });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_asset_bucket_is_zeroed() {
        let account = Account::new(Address([1; 32]));
        assert_eq!(account.free_asset_net_usage("btx"), 0);
        assert_eq!(account.latest_asset_operation_time("btx"), 0);
    }

    #[test]
    fn test_set_and_read_asset_bucket() {
        let mut account = Account::new(Address([1; 32]));
        account.set_free_asset_net("btx", 500, 42);

        assert_eq!(account.free_asset_net_usage("btx"), 500);
        assert_eq!(account.latest_asset_operation_time("btx"), 42);
        // Other assets stay untouched.
        assert_eq!(account.free_asset_net_usage("other"), 0);
    }
}
