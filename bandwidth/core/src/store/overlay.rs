// Copyright (c) 2024 Botho Foundation

//! Write-buffering overlay over a base store.
//!
//! The bandwidth processor commits tier by tier as it walks a transaction's
//! contracts, so a failure partway through leaves earlier writes in place.
//! A block processor that needs the whole transaction to apply atomically
//! runs the processor against an overlay and commits it only on success;
//! dropping the overlay discards every buffered write.

use std::collections::BTreeMap;

use crate::account::Account;
use crate::address::Address;
use crate::asset::AssetIssue;

use super::{AccountStore, AssetIssueStore, PropertyStore, StoreError};

/// Buffered dynamic-property writes. `None` means "not written, read the
/// base store".
#[derive(Debug, Clone, Default)]
struct PropertyOverlay {
    total_net_limit: Option<u64>,
    total_net_weight: Option<u64>,
    free_net_limit: Option<u64>,
    public_net_limit: Option<u64>,
    public_net_usage: Option<u64>,
    public_net_time: Option<u64>,
    head_block_timestamp_ms: Option<u64>,
}

/// A change-set buffer over any base store.
pub struct OverlayStore<'a, S> {
    base: &'a mut S,
    accounts: BTreeMap<Address, Account>,
    assets: BTreeMap<String, AssetIssue>,
    properties: PropertyOverlay,
}

impl<'a, S> OverlayStore<'a, S>
where
    S: AccountStore + AssetIssueStore + PropertyStore,
{
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            accounts: BTreeMap::new(),
            assets: BTreeMap::new(),
            properties: PropertyOverlay::default(),
        }
    }

    /// True when nothing has been written through this overlay.
    pub fn is_clean(&self) -> bool {
        self.accounts.is_empty()
            && self.assets.is_empty()
            && self.properties.total_net_limit.is_none()
            && self.properties.total_net_weight.is_none()
            && self.properties.free_net_limit.is_none()
            && self.properties.public_net_limit.is_none()
            && self.properties.public_net_usage.is_none()
            && self.properties.public_net_time.is_none()
            && self.properties.head_block_timestamp_ms.is_none()
    }

    /// Flush every buffered write to the base store.
    pub fn commit(self) -> Result<(), StoreError> {
        let Self {
            base,
            accounts,
            assets,
            properties,
        } = self;

        for account in accounts.values() {
            base.put_account(account)?;
        }
        for asset in assets.values() {
            base.put_asset_issue(asset)?;
        }
        if let Some(value) = properties.total_net_limit {
            base.set_total_net_limit(value)?;
        }
        if let Some(value) = properties.total_net_weight {
            base.set_total_net_weight(value)?;
        }
        if let Some(value) = properties.free_net_limit {
            base.set_free_net_limit(value)?;
        }
        if let Some(value) = properties.public_net_limit {
            base.set_public_net_limit(value)?;
        }
        if let Some(value) = properties.public_net_usage {
            base.set_public_net_usage(value)?;
        }
        if let Some(value) = properties.public_net_time {
            base.set_public_net_time(value)?;
        }
        if let Some(value) = properties.head_block_timestamp_ms {
            base.set_head_block_timestamp_ms(value)?;
        }
        Ok(())
    }

    /// Drop every buffered write, leaving the base store untouched.
    pub fn discard(self) {}
}

impl<S> AccountStore for OverlayStore<'_, S>
where
    S: AccountStore + AssetIssueStore + PropertyStore,
{
    fn account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        if let Some(account) = self.accounts.get(address) {
            return Ok(Some(account.clone()));
        }
        self.base.account(address)
    }

    fn put_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.accounts.insert(account.address, account.clone());
        Ok(())
    }
}

impl<S> AssetIssueStore for OverlayStore<'_, S>
where
    S: AccountStore + AssetIssueStore + PropertyStore,
{
    fn asset_issue(&self, name: &str) -> Result<Option<AssetIssue>, StoreError> {
        if let Some(asset) = self.assets.get(name) {
            return Ok(Some(asset.clone()));
        }
        self.base.asset_issue(name)
    }

    fn put_asset_issue(&mut self, asset: &AssetIssue) -> Result<(), StoreError> {
        self.assets.insert(asset.name.clone(), asset.clone());
        Ok(())
    }
}

impl<S> PropertyStore for OverlayStore<'_, S>
where
    S: AccountStore + AssetIssueStore + PropertyStore,
{
    fn total_net_limit(&self) -> Result<u64, StoreError> {
        match self.properties.total_net_limit {
            Some(value) => Ok(value),
            None => self.base.total_net_limit(),
        }
    }

    fn set_total_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.total_net_limit = Some(value);
        Ok(())
    }

    fn total_net_weight(&self) -> Result<u64, StoreError> {
        match self.properties.total_net_weight {
            Some(value) => Ok(value),
            None => self.base.total_net_weight(),
        }
    }

    fn set_total_net_weight(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.total_net_weight = Some(value);
        Ok(())
    }

    fn free_net_limit(&self) -> Result<u64, StoreError> {
        match self.properties.free_net_limit {
            Some(value) => Ok(value),
            None => self.base.free_net_limit(),
        }
    }

    fn set_free_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.free_net_limit = Some(value);
        Ok(())
    }

    fn public_net_limit(&self) -> Result<u64, StoreError> {
        match self.properties.public_net_limit {
            Some(value) => Ok(value),
            None => self.base.public_net_limit(),
        }
    }

    fn set_public_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.public_net_limit = Some(value);
        Ok(())
    }

    fn public_net_usage(&self) -> Result<u64, StoreError> {
        match self.properties.public_net_usage {
            Some(value) => Ok(value),
            None => self.base.public_net_usage(),
        }
    }

    fn set_public_net_usage(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.public_net_usage = Some(value);
        Ok(())
    }

    fn public_net_time(&self) -> Result<u64, StoreError> {
        match self.properties.public_net_time {
            Some(value) => Ok(value),
            None => self.base.public_net_time(),
        }
    }

    fn set_public_net_time(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.public_net_time = Some(value);
        Ok(())
    }

    fn head_block_timestamp_ms(&self) -> Result<u64, StoreError> {
        match self.properties.head_block_timestamp_ms {
            Some(value) => Ok(value),
            None => self.base.head_block_timestamp_ms(),
        }
    }

    fn set_head_block_timestamp_ms(&mut self, value: u64) -> Result<(), StoreError> {
        self.properties.head_block_timestamp_ms = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_reads_fall_through_to_base() {
        let mut base = MemoryStore::new();
        let mut account = Account::new(Address([1; 32]));
        account.frozen_balance = 9;
        base.insert_account(account.clone());

        let overlay = OverlayStore::new(&mut base);
        assert_eq!(overlay.account(&account.address).unwrap(), Some(account));
        assert_eq!(overlay.free_net_limit().unwrap(), 5_000);
        assert!(overlay.is_clean());
    }

    #[test]
    fn test_buffered_writes_are_invisible_until_commit() {
        let mut base = MemoryStore::new();
        let address = Address([2; 32]);

        let mut overlay = OverlayStore::new(&mut base);
        overlay.put_account(&Account::new(address)).unwrap();
        overlay.set_public_net_usage(777).unwrap();

        // The overlay sees its own writes.
        assert!(overlay.account(&address).unwrap().is_some());
        assert_eq!(overlay.public_net_usage().unwrap(), 777);
        assert!(!overlay.is_clean());

        overlay.commit().unwrap();
        assert!(base.account(&address).unwrap().is_some());
        assert_eq!(base.public_net_usage().unwrap(), 777);
    }

    #[test]
    fn test_discard_leaves_base_untouched() {
        let mut base = MemoryStore::new();
        let snapshot = base.clone();
        let address = Address([3; 32]);

        let mut overlay = OverlayStore::new(&mut base);
        overlay.put_account(&Account::new(address)).unwrap();
        overlay.set_public_net_time(55).unwrap();
        overlay.discard();

        assert_eq!(base, snapshot);
    }
}
