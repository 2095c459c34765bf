// Copyright (c) 2024 Botho Foundation

//! Asset issue records.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Bandwidth-relevant state of an issued asset.
///
/// Third-party transfers of an asset may be charged against the issuer
/// rather than the sender: each asset carries a per-holder free allowance
/// and an asset-wide public pool, both funded by the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIssue {
    /// Asset name; the store key.
    pub name: String,

    /// Address of the issuing account.
    pub owner: Address,

    /// Per-holder cap on the asset's free bucket.
    pub free_asset_net_limit: u64,

    /// Size of the asset-wide free pool shared by all holders.
    pub public_free_asset_net_limit: u64,
    /// Current usage of the asset-wide free pool.
    pub public_free_asset_net_usage: u64,
    /// Slot of the last charge against the asset-wide free pool.
    pub public_latest_free_net_time: u64,
}
