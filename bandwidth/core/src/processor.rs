// Copyright (c) 2024 Botho Foundation

//! Bandwidth charging for transaction admission.
//!
//! Each contract in a transaction is charged the transaction's full
//! serialized size against the first source with headroom, in fixed order:
//!
//! 1. a staked-bucket surcharge when a transfer materializes a new
//!    recipient (on top of the tiers below, and mandatory),
//! 2. the asset issuer's pools, for asset transfers where the issuer is not
//!    the sender,
//! 3. the sender's staked bucket,
//! 4. the sender's free bucket backed by the system-wide public pool.
//!
//! Admission always compares against the decayed usage at the current slot,
//! never the raw stored value. Charges commit per tier; see
//! [`OverlayStore`](crate::store::OverlayStore) for the rollback seam.

use thiserror::Error;
use tracing::debug;

use crate::account::Account;
use crate::clock::ChainClock;
use crate::meter::WindowMeter;
use crate::params::{ChainParams, STAKE_DIVISOR};
use crate::store::{AccountStore, AssetIssueStore, PropertyStore, StoreError};
use crate::transaction::{Contract, Transaction};

/// Errors raised while charging bandwidth.
#[derive(Debug, Error)]
pub enum BandwidthError {
    /// Sender address is not in the account store.
    #[error("account not found")]
    AccountMissing,

    /// Asset transfer references an unknown asset issue.
    #[error("asset {0} not found")]
    AssetMissing(String),

    /// No charging source can admit the contract.
    #[error("bandwidth is not enough")]
    InsufficientBandwidth,

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// State that must exist or hold an invariant does not.
    #[error("corrupted chain state: {0}")]
    Corrupted(String),
}

impl BandwidthError {
    /// Fatal errors abort block application; the rest reject only the
    /// offending transaction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Corrupted(_))
    }
}

/// Charges transaction bandwidth against account and asset state.
pub struct BandwidthProcessor<'a> {
    params: &'a ChainParams,
    meter: WindowMeter,
}

impl<'a> BandwidthProcessor<'a> {
    pub fn new(params: &'a ChainParams) -> Self {
        Self {
            params,
            meter: WindowMeter::new(params),
        }
    }

    /// Charge bandwidth for every contract in `tx`.
    ///
    /// Contracts are processed in list order and each one's charge commits
    /// before the next is examined, so on error the commits already made
    /// for earlier contracts remain in the store. Callers needing whole-
    /// transaction atomicity run this against an
    /// [`OverlayStore`](crate::store::OverlayStore).
    pub fn consume<S, C>(
        &self,
        store: &mut S,
        clock: &C,
        tx: &Transaction,
    ) -> Result<(), BandwidthError>
    where
        S: AccountStore + AssetIssueStore + PropertyStore,
        C: ChainClock,
    {
        for contract in &tx.contracts {
            // The full transaction size is charged to every contract.
            let bytes = tx.serialized_size();
            let owner = *contract.owner();
            let mut account = store
                .account(&owner)?
                .ok_or(BandwidthError::AccountMissing)?;
            let now = clock.head_slot();

            if self.creates_new_account(store, contract)? {
                self.charge_new_account(store, &mut account, now)?;
            }

            if let Contract::TransferAsset { asset, .. } = contract {
                if self.charge_asset_net(store, clock, &mut account, asset, bytes, now)? {
                    continue;
                }
            }

            if self.charge_account_net(store, clock, &mut account, bytes, now)? {
                continue;
            }

            if self.charge_free_net(store, clock, &mut account, bytes, now)? {
                continue;
            }

            return Err(BandwidthError::InsufficientBandwidth);
        }
        Ok(())
    }

    /// Decay every usage bucket on `account` to `now` without charging.
    ///
    /// Operates on the in-memory record only: time fields are left alone
    /// and nothing is persisted. Used by read paths that need the current
    /// effective usage.
    pub fn refresh_usage(&self, account: &mut Account, now: u64) {
        account.net_usage =
            self.meter
                .increase(account.net_usage, 0, account.latest_consume_time, now);
        account.free_net_usage = self.meter.increase(
            account.free_net_usage,
            0,
            account.latest_consume_free_time,
            now,
        );
        for bucket in account.free_asset_net.values_mut() {
            bucket.usage = self.meter.increase(bucket.usage, 0, bucket.latest_slot, now);
        }
    }

    /// Per-account bandwidth limit derived from frozen stake.
    ///
    /// Zero stake participation yields a zero limit without reading the
    /// system-wide weight. A positive weight combined with a zero total
    /// weight means the weight accounting is broken: fatal.
    pub fn global_net_limit<S: PropertyStore>(
        &self,
        store: &S,
        frozen_balance: u64,
    ) -> Result<u64, BandwidthError> {
        let net_weight = frozen_balance / STAKE_DIVISOR;
        if net_weight == 0 {
            return Ok(0);
        }
        let total_net_limit = store.total_net_limit()?;
        let total_net_weight = store.total_net_weight()?;
        if total_net_weight == 0 {
            return Err(BandwidthError::Corrupted(
                "positive net weight with zero total net weight".to_string(),
            ));
        }
        let limit =
            u128::from(net_weight) * u128::from(total_net_limit) / u128::from(total_net_weight);
        Ok(u64::try_from(limit).unwrap_or(u64::MAX))
    }

    /// True when `contract` transfers value to a recipient that does not
    /// yet exist in the account store.
    fn creates_new_account<S: AccountStore>(
        &self,
        store: &S,
        contract: &Contract,
    ) -> Result<bool, StoreError> {
        match contract {
            Contract::Transfer { to, .. } | Contract::TransferAsset { to, .. } => {
                Ok(store.account(to)?.is_none())
            }
            _ => Ok(false),
        }
    }

    /// Step 1: surcharge for materializing a new recipient, charged to the
    /// sender's staked bucket. Must admit, or the whole contract fails.
    ///
    /// The write here stays committed even if every later tier rejects the
    /// contract. Observed behavior of the reference chain; kept as is.
    fn charge_new_account<S>(
        &self,
        store: &mut S,
        account: &mut Account,
        now: u64,
    ) -> Result<(), BandwidthError>
    where
        S: AccountStore + PropertyStore,
    {
        let cost = self.params.create_account_cost;
        let net_limit = self.global_net_limit(store, account.frozen_balance)?;
        let new_net_usage =
            self.meter
                .increase(account.net_usage, 0, account.latest_consume_time, now);

        if i128::from(cost) > i128::from(net_limit) - i128::from(new_net_usage) {
            debug!(
                "sender {} lacks bandwidth for the new-account surcharge",
                account.address.short()
            );
            return Err(BandwidthError::InsufficientBandwidth);
        }

        account.net_usage = self.meter.increase(new_net_usage, cost, now, now);
        account.latest_consume_time = now;
        store.put_account(account)?;
        Ok(())
    }

    /// Step 2: third-party asset transfer charged against the asset's
    /// public pool, the sender's per-asset free bucket, and the issuer's
    /// staked bucket.
    ///
    /// All three decayed values are computed and all three predicates
    /// checked before anything is written, so a single step never commits
    /// partially.
    fn charge_asset_net<S, C>(
        &self,
        store: &mut S,
        clock: &C,
        account: &mut Account,
        asset_name: &str,
        bytes: u64,
        now: u64,
    ) -> Result<bool, BandwidthError>
    where
        S: AccountStore + AssetIssueStore + PropertyStore,
        C: ChainClock,
    {
        let mut asset = store
            .asset_issue(asset_name)?
            .ok_or_else(|| BandwidthError::AssetMissing(asset_name.to_string()))?;

        // Transfers of one's own asset fall through to the staked bucket.
        if asset.owner == account.address {
            return Ok(false);
        }

        let new_public_usage = self.meter.increase(
            asset.public_free_asset_net_usage,
            0,
            asset.public_latest_free_net_time,
            now,
        );
        if i128::from(bytes)
            > i128::from(asset.public_free_asset_net_limit) - i128::from(new_public_usage)
        {
            debug!("asset {asset_name} public free bandwidth is not enough");
            return Ok(false);
        }

        let new_free_asset_usage = self.meter.increase(
            account.free_asset_net_usage(asset_name),
            0,
            account.latest_asset_operation_time(asset_name),
            now,
        );
        if i128::from(bytes)
            > i128::from(asset.free_asset_net_limit) - i128::from(new_free_asset_usage)
        {
            debug!(
                "asset {asset_name} free bandwidth of sender {} is not enough",
                account.address.short()
            );
            return Ok(false);
        }

        let mut issuer = store.account(&asset.owner)?.ok_or_else(|| {
            BandwidthError::Corrupted(format!(
                "issuer account {} missing for asset {asset_name}",
                asset.owner
            ))
        })?;
        let issuer_net_limit = self.global_net_limit(store, issuer.frozen_balance)?;
        let new_issuer_usage =
            self.meter
                .increase(issuer.net_usage, 0, issuer.latest_consume_time, now);
        if i128::from(bytes) > i128::from(issuer_net_limit) - i128::from(new_issuer_usage) {
            debug!(
                "asset {asset_name} issuer {} bandwidth is not enough",
                issuer.address.short()
            );
            return Ok(false);
        }

        // All three admitted; recompute with the charge and write together.
        let latest_operation_time = clock.head_block_timestamp_ms();

        issuer.net_usage = self.meter.increase(new_issuer_usage, bytes, now, now);
        issuer.latest_consume_time = now;

        account.set_free_asset_net(
            asset_name,
            self.meter.increase(new_free_asset_usage, bytes, now, now),
            now,
        );
        account.latest_operation_time = latest_operation_time;

        asset.public_free_asset_net_usage =
            self.meter.increase(new_public_usage, bytes, now, now);
        asset.public_latest_free_net_time = now;

        store.put_account(account)?;
        store.put_account(&issuer)?;
        store.put_asset_issue(&asset)?;
        Ok(true)
    }

    /// Step 3: the sender's staked bucket.
    fn charge_account_net<S, C>(
        &self,
        store: &mut S,
        clock: &C,
        account: &mut Account,
        bytes: u64,
        now: u64,
    ) -> Result<bool, BandwidthError>
    where
        S: AccountStore + PropertyStore,
        C: ChainClock,
    {
        let net_limit = self.global_net_limit(store, account.frozen_balance)?;
        let new_net_usage =
            self.meter
                .increase(account.net_usage, 0, account.latest_consume_time, now);

        if i128::from(bytes) > i128::from(net_limit) - i128::from(new_net_usage) {
            debug!(
                "staked bandwidth of {} is running out, trying the free bucket",
                account.address.short()
            );
            return Ok(false);
        }

        account.net_usage = self.meter.increase(new_net_usage, bytes, now, now);
        account.latest_consume_time = now;
        account.latest_operation_time = clock.head_block_timestamp_ms();
        store.put_account(account)?;
        Ok(true)
    }

    /// Step 4: the sender's free bucket backed by the system public pool.
    /// Both must have headroom.
    fn charge_free_net<S, C>(
        &self,
        store: &mut S,
        clock: &C,
        account: &mut Account,
        bytes: u64,
        now: u64,
    ) -> Result<bool, BandwidthError>
    where
        S: AccountStore + PropertyStore,
        C: ChainClock,
    {
        let free_net_limit = store.free_net_limit()?;
        let new_free_usage = self.meter.increase(
            account.free_net_usage,
            0,
            account.latest_consume_free_time,
            now,
        );
        if i128::from(bytes) > i128::from(free_net_limit) - i128::from(new_free_usage) {
            debug!(
                "free bandwidth of {} is running out",
                account.address.short()
            );
            return Ok(false);
        }

        let public_net_limit = store.public_net_limit()?;
        let new_public_usage =
            self.meter
                .increase(store.public_net_usage()?, 0, store.public_net_time()?, now);
        if i128::from(bytes) > i128::from(public_net_limit) - i128::from(new_public_usage) {
            debug!("public free bandwidth is running out");
            return Ok(false);
        }

        account.free_net_usage = self.meter.increase(new_free_usage, bytes, now, now);
        account.latest_consume_free_time = now;
        account.latest_operation_time = clock.head_block_timestamp_ms();

        store.set_public_net_usage(self.meter.increase(new_public_usage, bytes, now, now))?;
        store.set_public_net_time(now)?;
        store.put_account(account)?;
        Ok(true)
    }
}
