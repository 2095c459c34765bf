// Copyright (c) 2024 Botho Foundation

//! In-memory store for tests and simulation.

use std::collections::BTreeMap;

use crate::account::Account;
use crate::address::Address;
use crate::asset::AssetIssue;
use crate::properties::DynamicProperties;

use super::{AccountStore, AssetIssueStore, PropertyStore, StoreError};

/// A store holding everything in memory.
///
/// `Clone` gives callers a cheap snapshot and `PartialEq` lets consensus
/// tests compare whole post-states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    accounts: BTreeMap<Address, Account>,
    assets: BTreeMap<String, AssetIssue>,
    properties: DynamicProperties,
}

impl MemoryStore {
    /// An empty store with genesis dynamic properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store with the given dynamic properties.
    pub fn with_properties(properties: DynamicProperties) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    pub fn insert_account(&mut self, account: Account) {
        self.accounts.insert(account.address, account);
    }

    pub fn insert_asset_issue(&mut self, asset: AssetIssue) {
        self.assets.insert(asset.name.clone(), asset);
    }

    pub fn properties(&self) -> &DynamicProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut DynamicProperties {
        &mut self.properties
    }
}

impl AccountStore for MemoryStore {
    fn account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(address).cloned())
    }

    fn put_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.accounts.insert(account.address, account.clone());
        Ok(())
    }
}

impl AssetIssueStore for MemoryStore {
    fn asset_issue(&self, name: &str) -> Result<Option<AssetIssue>, StoreError> {
        Ok(self.assets.get(name).cloned())
    }

    fn put_asset_issue(&mut self, asset: &AssetIssue) -> Result<(), StoreError> {
        self.assets.insert(asset.name.clone(), asset.clone());
        Ok(())
    }
}

impl PropertyStore for MemoryStore {
    fn total_net_limit(&self) -> Result<u64, StoreError> {
        Ok(self.properties.total_net_limit)
    }

    fn set_total_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.total_net_limit = value;
        Ok(())
    }

    fn total_net_weight(&self) -> Result<u64, StoreError> {
        Ok(self.properties.total_net_weight)
    }

    fn set_total_net_weight(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.total_net_weight = value;
        Ok(())
    }

    fn free_net_limit(&self) -> Result<u64, StoreError> {
        Ok(self.properties.free_net_limit)
    }

    fn set_free_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.free_net_limit = value;
        Ok(())
    }

    fn public_net_limit(&self) -> Result<u64, StoreError> {
        Ok(self.properties.public_net_limit)
    }

    fn set_public_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.public_net_limit = value;
        Ok(())
    }

    fn public_net_usage(&self) -> Result<u64, StoreError> {
        Ok(self.properties.public_net_usage)
    }

    fn set_public_net_usage(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.public_net_usage = value;
        Ok(())
    }

    fn public_net_time(&self) -> Result<u64, StoreError> {
        Ok(self.properties.public_net_time)
    }

    fn set_public_net_time(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.public_net_time = value;
        Ok(())
    }

    fn head_block_timestamp_ms(&self) -> Result<u64, StoreError> {
        Ok(self.properties.head_block_timestamp_ms)
    }

    fn set_head_block_timestamp_ms(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.head_block_timestamp_ms = value;
        Ok(())
    }
}
