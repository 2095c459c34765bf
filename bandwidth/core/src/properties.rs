// Copyright (c) 2024 Botho Foundation

//! System-wide dynamic properties.

use serde::{Deserialize, Serialize};

/// The dynamic-properties singleton read and written by the bandwidth
/// processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicProperties {
    /// System-wide bandwidth limit shared by all stakers.
    pub total_net_limit: u64,
    /// Sum of net weight across all frozen balances.
    pub total_net_weight: u64,

    /// Per-account free allowance in bytes.
    pub free_net_limit: u64,

    /// Size of the system-wide free pool.
    pub public_net_limit: u64,
    /// Current usage of the system-wide free pool.
    pub public_net_usage: u64,
    /// Slot of the last charge against the public pool.
    pub public_net_time: u64,

    /// Wall-clock time (ms) of the current head block.
    pub head_block_timestamp_ms: u64,
}

impl Default for DynamicProperties {
    /// Genesis values. `total_net_weight` starts at zero and grows as
    /// accounts freeze balance.
    fn default() -> Self {
        Self {
            total_net_limit: 43_200_000_000,
            total_net_weight: 0,
            free_net_limit: 5_000,
            public_net_limit: 14_400_000_000,
            public_net_usage: 0,
            public_net_time: 0,
            head_block_timestamp_ms: 0,
        }
    }
}
