// Copyright (c) 2024 Botho Foundation

//! Store interfaces consumed by the bandwidth processor.
//!
//! The account store, the asset-issue store and the dynamic-properties
//! singleton are external collaborators; the processor only ever sees the
//! traits below. [`MemoryStore`] backs tests and simulation, and
//! [`OverlayStore`] buffers writes so a block processor can roll back a
//! whole transaction at once.

mod memory;
mod overlay;

pub use memory::MemoryStore;
pub use overlay::OverlayStore;

use thiserror::Error;

use crate::account::Account;
use crate::address::Address;
use crate::asset::AssetIssue;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Keyed account records.
pub trait AccountStore {
    fn account(&self, address: &Address) -> Result<Option<Account>, StoreError>;
    fn put_account(&mut self, account: &Account) -> Result<(), StoreError>;
}

/// Keyed asset-issue records.
pub trait AssetIssueStore {
    fn asset_issue(&self, name: &str) -> Result<Option<AssetIssue>, StoreError>;
    fn put_asset_issue(&mut self, asset: &AssetIssue) -> Result<(), StoreError>;
}

/// Typed access to the dynamic-properties singleton.
pub trait PropertyStore {
    fn total_net_limit(&self) -> Result<u64, StoreError>;
    fn set_total_net_limit(&mut self, value: u64) -> Result<(), StoreError>;

    fn total_net_weight(&self) -> Result<u64, StoreError>;
    fn set_total_net_weight(&mut self, value: u64) -> Result<(), StoreError>;

    fn free_net_limit(&self) -> Result<u64, StoreError>;
    fn set_free_net_limit(&mut self, value: u64) -> Result<(), StoreError>;

    fn public_net_limit(&self) -> Result<u64, StoreError>;
    fn set_public_net_limit(&mut self, value: u64) -> Result<(), StoreError>;

    fn public_net_usage(&self) -> Result<u64, StoreError>;
    fn set_public_net_usage(&mut self, value: u64) -> Result<(), StoreError>;

    fn public_net_time(&self) -> Result<u64, StoreError>;
    fn set_public_net_time(&mut self, value: u64) -> Result<(), StoreError>;

    fn head_block_timestamp_ms(&self) -> Result<u64, StoreError>;
    fn set_head_block_timestamp_ms(&mut self, value: u64) -> Result<(), StoreError>;
}
