// Copyright (c) 2024 Botho Foundation

//! LMDB-backed stores for the bandwidth accounting core.
//!
//! Three named databases inside one environment:
//!
//! - `accounts`: address (32 bytes) -> Account (bincode)
//! - `assets`: asset name (bytes) -> AssetIssue (bincode)
//! - `meta`: property key (bytes) -> u64 (LE bytes)
//!
//! Dynamic properties that were never written read as their genesis
//! defaults, so a fresh store behaves like a fresh chain.

#![deny(clippy::print_stdout)]

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use std::fs;
use std::path::Path;
use tracing::info;

use bth_bandwidth_core::{
    Account, AccountStore, Address, AssetIssue, AssetIssueStore, DynamicProperties, PropertyStore,
    StoreError,
};

// Property keys in the meta database.
const PROP_TOTAL_NET_LIMIT: &[u8] = b"total_net_limit";
const PROP_TOTAL_NET_WEIGHT: &[u8] = b"total_net_weight";
const PROP_FREE_NET_LIMIT: &[u8] = b"free_net_limit";
const PROP_PUBLIC_NET_LIMIT: &[u8] = b"public_net_limit";
const PROP_PUBLIC_NET_USAGE: &[u8] = b"public_net_usage";
const PROP_PUBLIC_NET_TIME: &[u8] = b"public_net_time";
const PROP_HEAD_BLOCK_TIMESTAMP: &[u8] = b"head_block_timestamp";

/// LMDB-backed bandwidth store using heed.
pub struct BandwidthDb {
    env: Env,
    accounts_db: Database<Bytes, Bytes>,
    assets_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
    genesis: DynamicProperties,
}

impl BandwidthDb {
    /// Open or create a bandwidth store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(path)
            .map_err(|e| StoreError::Database(format!("Failed to create directory: {}", e)))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(3)
                .map_size(256 * 1024 * 1024) // 256MB
                .open(path)
        }
        .map_err(|e| StoreError::Database(format!("Failed to open environment: {}", e)))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| StoreError::Database(format!("Failed to start write txn: {}", e)))?;

        let accounts_db = env
            .create_database(&mut wtxn, Some("accounts"))
            .map_err(|e| StoreError::Database(format!("Failed to create accounts db: {}", e)))?;
        let assets_db = env
            .create_database(&mut wtxn, Some("assets"))
            .map_err(|e| StoreError::Database(format!("Failed to create assets db: {}", e)))?;
        let meta_db = env
            .create_database(&mut wtxn, Some("meta"))
            .map_err(|e| StoreError::Database(format!("Failed to create meta db: {}", e)))?;

        wtxn.commit()
            .map_err(|e| StoreError::Database(format!("Failed to commit: {}", e)))?;

        info!("Opened bandwidth store at {}", path.display());

        Ok(Self {
            env,
            accounts_db,
            assets_db,
            meta_db,
            genesis: DynamicProperties::default(),
        })
    }

    fn meta_u64(&self, key: &[u8], default: u64) -> Result<u64, StoreError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StoreError::Database(format!("Failed to start read txn: {}", e)))?;

        Ok(self
            .meta_db
            .get(&rtxn, key)
            .map_err(|e| StoreError::Database(format!("Failed to get property: {}", e)))?
            .map(|b| u64::from_le_bytes(b.try_into().unwrap_or([0; 8])))
            .unwrap_or(default))
    }

    fn put_meta_u64(&self, key: &[u8], value: u64) -> Result<(), StoreError> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StoreError::Database(format!("Failed to start write txn: {}", e)))?;
        self.meta_db
            .put(&mut wtxn, key, &value.to_le_bytes())
            .map_err(|e| StoreError::Database(format!("Failed to put property: {}", e)))?;
        wtxn.commit()
            .map_err(|e| StoreError::Database(format!("Failed to commit: {}", e)))
    }
}

impl AccountStore for BandwidthDb {
    fn account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StoreError::Database(format!("Failed to start read txn: {}", e)))?;

        match self
            .accounts_db
            .get(&rtxn, address.as_bytes())
            .map_err(|e| StoreError::Database(format!("Failed to get account: {}", e)))?
        {
            Some(bytes) => Ok(Some(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn put_account(&mut self, account: &Account) -> Result<(), StoreError> {
        let bytes =
            bincode::serialize(account).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StoreError::Database(format!("Failed to start write txn: {}", e)))?;
        self.accounts_db
            .put(&mut wtxn, account.address.as_bytes(), &bytes)
            .map_err(|e| StoreError::Database(format!("Failed to put account: {}", e)))?;
        wtxn.commit()
            .map_err(|e| StoreError::Database(format!("Failed to commit: {}", e)))
    }
}

impl AssetIssueStore for BandwidthDb {
    fn asset_issue(&self, name: &str) -> Result<Option<AssetIssue>, StoreError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StoreError::Database(format!("Failed to start read txn: {}", e)))?;

        match self
            .assets_db
            .get(&rtxn, name.as_bytes())
            .map_err(|e| StoreError::Database(format!("Failed to get asset issue: {}", e)))?
        {
            Some(bytes) => Ok(Some(
                bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn put_asset_issue(&mut self, asset: &AssetIssue) -> Result<(), StoreError> {
        let bytes =
            bincode::serialize(asset).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StoreError::Database(format!("Failed to start write txn: {}", e)))?;
        self.assets_db
            .put(&mut wtxn, asset.name.as_bytes(), &bytes)
            .map_err(|e| StoreError::Database(format!("Failed to put asset issue: {}", e)))?;
        wtxn.commit()
            .map_err(|e| StoreError::Database(format!("Failed to commit: {}", e)))
    }
}

impl PropertyStore for BandwidthDb {
    fn total_net_limit(&self) -> Result<u64, StoreError> {
        self.meta_u64(PROP_TOTAL_NET_LIMIT, self.genesis.total_net_limit)
    }

    fn set_total_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.put_meta_u64(PROP_TOTAL_NET_LIMIT, value)
    }

    fn total_net_weight(&self) -> Result<u64, StoreError> {
        self.meta_u64(PROP_TOTAL_NET_WEIGHT, self.genesis.total_net_weight)
    }

    fn set_total_net_weight(&mut self, value: u64) -> Result<(), StoreError> {
        self.put_meta_u64(PROP_TOTAL_NET_WEIGHT, value)
    }

    fn free_net_limit(&self) -> Result<u64, StoreError> {
        self.meta_u64(PROP_FREE_NET_LIMIT, self.genesis.free_net_limit)
    }

    fn set_free_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.put_meta_u64(PROP_FREE_NET_LIMIT, value)
    }

    fn public_net_limit(&self) -> Result<u64, StoreError> {
        self.meta_u64(PROP_PUBLIC_NET_LIMIT, self.genesis.public_net_limit)
    }

    fn set_public_net_limit(&mut self, value: u64) -> Result<(), StoreError> {
        self.put_meta_u64(PROP_PUBLIC_NET_LIMIT, value)
    }

    fn public_net_usage(&self) -> Result<u64, StoreError> {
        self.meta_u64(PROP_PUBLIC_NET_USAGE, self.genesis.public_net_usage)
    }

    fn set_public_net_usage(&mut self, value: u64) -> Result<(), StoreError> {
        self.put_meta_u64(PROP_PUBLIC_NET_USAGE, value)
    }

    fn public_net_time(&self) -> Result<u64, StoreError> {
        self.meta_u64(PROP_PUBLIC_NET_TIME, self.genesis.public_net_time)
    }

    fn set_public_net_time(&mut self, value: u64) -> Result<(), StoreError> {
        self.put_meta_u64(PROP_PUBLIC_NET_TIME, value)
    }

    fn head_block_timestamp_ms(&self) -> Result<u64, StoreError> {
        self.meta_u64(
            PROP_HEAD_BLOCK_TIMESTAMP,
            self.genesis.head_block_timestamp_ms,
        )
    }

    fn set_head_block_timestamp_ms(&mut self, value: u64) -> Result<(), StoreError> {
        self.put_meta_u64(PROP_HEAD_BLOCK_TIMESTAMP, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bth_bandwidth_core::{BandwidthProcessor, ChainParams, Contract, SlotClock, Transaction};
    use tempfile::tempdir;

    #[test]
    fn test_open_reads_genesis_defaults() {
        let dir = tempdir().unwrap();
        let db = BandwidthDb::open(dir.path()).unwrap();

        let genesis = DynamicProperties::default();
        assert_eq!(db.total_net_limit().unwrap(), genesis.total_net_limit);
        assert_eq!(db.total_net_weight().unwrap(), 0);
        assert_eq!(db.free_net_limit().unwrap(), genesis.free_net_limit);
        assert_eq!(db.public_net_usage().unwrap(), 0);
    }

    #[test]
    fn test_property_write_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut db = BandwidthDb::open(dir.path()).unwrap();
            db.set_total_net_weight(777).unwrap();
        }
        let db = BandwidthDb::open(dir.path()).unwrap();
        assert_eq!(db.total_net_weight().unwrap(), 777);
    }

    #[test]
    fn test_account_roundtrip() {
        let dir = tempdir().unwrap();
        let mut db = BandwidthDb::open(dir.path()).unwrap();

        let address = Address([9; 32]);
        assert!(db.account(&address).unwrap().is_none());

        let mut account = Account::new(address);
        account.frozen_balance = 5_000_000;
        account.net_usage = 321;
        account.set_free_asset_net("btx", 42, 7);
        db.put_account(&account).unwrap();

        assert_eq!(db.account(&address).unwrap(), Some(account));
    }

    #[test]
    fn test_asset_issue_roundtrip() {
        let dir = tempdir().unwrap();
        let mut db = BandwidthDb::open(dir.path()).unwrap();

        assert!(db.asset_issue("btx").unwrap().is_none());

        let asset = AssetIssue {
            name: "btx".to_string(),
            owner: Address([3; 32]),
            free_asset_net_limit: 2_000,
            public_free_asset_net_limit: 10_000,
            ..Default::default()
        };
        db.put_asset_issue(&asset).unwrap();

        assert_eq!(db.asset_issue("btx").unwrap(), Some(asset));
    }

    #[test]
    fn test_consume_against_persistent_store() {
        let dir = tempdir().unwrap();
        let mut db = BandwidthDb::open(dir.path()).unwrap();

        let sender = Address([1; 32]);
        let recipient = Address([2; 32]);
        db.set_total_net_weight(1_000).unwrap();
        let mut account = Account::new(sender);
        account.frozen_balance = 1_000_000_000;
        db.put_account(&account).unwrap();
        db.put_account(&Account::new(recipient)).unwrap();

        let params = ChainParams {
            create_account_cost: 0,
            ..ChainParams::mainnet()
        };
        let processor = BandwidthProcessor::new(&params);
        let clock = SlotClock::at_slot(&params, 1_000);
        let tx = Transaction::new(vec![Contract::Transfer {
            owner: sender,
            to: recipient,
            amount: 100,
        }]);

        processor.consume(&mut db, &clock, &tx).unwrap();

        let account = db.account(&sender).unwrap().unwrap();
        assert_eq!(account.net_usage, tx.serialized_size());
        assert_eq!(account.latest_consume_time, 1_000);
    }
}
