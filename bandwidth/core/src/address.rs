// Copyright (c) 2024 Botho Foundation

//! Raw account addresses.
//!
//! Addresses are opaque 32-byte identifiers assigned by the account
//! subsystem. The accounting core never derives or validates them; it only
//! uses them as store keys and compares them byte-wise.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a raw address in bytes.
pub const ADDRESS_LEN: usize = 32;

/// A raw account address.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The raw bytes of this address.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Shortened hex form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}…)", self.short())
    }
}
