// Copyright (c) 2024 Botho Foundation

//! Slot clock derived from block timestamps.

use crate::params::ChainParams;

/// Read-only clock interface consumed by the bandwidth processor.
pub trait ChainClock {
    /// Current slot, the block-height-derived time unit usage windows are
    /// measured in.
    fn head_slot(&self) -> u64;

    /// Wall-clock timestamp of the head block in milliseconds.
    fn head_block_timestamp_ms(&self) -> u64;
}

/// Clock mapping head-block timestamps onto slots.
///
/// A slot is the number of whole block intervals elapsed since genesis, so
/// it never decreases while block timestamps advance.
#[derive(Debug, Clone)]
pub struct SlotClock {
    genesis_ms: u64,
    block_interval_ms: u64,
    head_ms: u64,
}

impl SlotClock {
    /// A clock positioned at `head_timestamp_ms`.
    pub fn new(params: &ChainParams, head_timestamp_ms: u64) -> Self {
        debug_assert!(params.block_interval_ms > 0, "zero block interval");
        Self {
            genesis_ms: params.genesis_timestamp_ms,
            block_interval_ms: params.block_interval_ms,
            head_ms: head_timestamp_ms,
        }
    }

    /// A clock positioned exactly at `slot`. Used when replaying by height.
    pub fn at_slot(params: &ChainParams, slot: u64) -> Self {
        let head_ms = params
            .genesis_timestamp_ms
            .saturating_add(slot.saturating_mul(params.block_interval_ms));
        Self::new(params, head_ms)
    }

    /// Advance the clock to a newer head-block timestamp.
    pub fn set_head_timestamp_ms(&mut self, head_timestamp_ms: u64) {
        self.head_ms = head_timestamp_ms;
    }
}

impl ChainClock for SlotClock {
    fn head_slot(&self) -> u64 {
        self.head_ms.saturating_sub(self.genesis_ms) / self.block_interval_ms
    }

    fn head_block_timestamp_ms(&self) -> u64 {
        self.head_ms
    }
}
