// Copyright (c) 2024 Botho Foundation

//! Bandwidth accounting core for transaction admission.
//!
//! Every contract carried by a submitted transaction consumes bandwidth — a
//! rate-limited resource measured in serialized bytes — charged against the
//! first of four sources with headroom: a surcharge path for transfers that
//! materialize a new recipient, the asset issuer's pools for third-party
//! asset transfers, the sender's staked bucket, and the sender's free bucket
//! backed by the system-wide public pool.
//!
//! Every validator re-executes this logic when replaying blocks, so its
//! outputs are part of state consensus. All consensus paths use pure integer
//! arithmetic with fixed rounding rules; see [`meter`] for the decay math
//! and [`processor`] for the charging cascade.

#![deny(clippy::print_stdout)]

pub mod account;
pub mod address;
pub mod asset;
pub mod clock;
pub mod meter;
pub mod params;
pub mod processor;
pub mod properties;
pub mod store;
pub mod transaction;

pub use account::{Account, FreeAssetNet};
pub use address::Address;
pub use asset::AssetIssue;
pub use clock::{ChainClock, SlotClock};
pub use meter::WindowMeter;
pub use params::{ChainParams, STAKE_DIVISOR};
pub use processor::{BandwidthError, BandwidthProcessor};
pub use properties::DynamicProperties;
pub use store::{
    AccountStore, AssetIssueStore, MemoryStore, OverlayStore, PropertyStore, StoreError,
};
pub use transaction::{Contract, Transaction};
