// Copyright (c) 2024 Botho Foundation

//! Transaction container and contract payloads.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A typed contract carried by a transaction.
///
/// The bandwidth processor recognizes the two transfer kinds, which can
/// materialize a new recipient and select the asset charging path; every
/// other contract type is charged against the sender's staked or free
/// bucket only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contract {
    /// Plain value transfer.
    Transfer {
        owner: Address,
        to: Address,
        amount: u64,
    },
    /// Transfer of an issued asset.
    TransferAsset {
        owner: Address,
        asset: String,
        to: Address,
        amount: u64,
    },
    /// Stake tokens for bandwidth weight.
    FreezeBalance {
        owner: Address,
        amount: u64,
        duration_days: u64,
    },
    /// Release previously staked tokens.
    UnfreezeBalance { owner: Address },
}

impl Contract {
    /// The account charged for this contract's bandwidth.
    pub fn owner(&self) -> &Address {
        match self {
            Contract::Transfer { owner, .. }
            | Contract::TransferAsset { owner, .. }
            | Contract::FreezeBalance { owner, .. }
            | Contract::UnfreezeBalance { owner } => owner,
        }
    }
}

/// An ordered list of contracts plus replay metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub contracts: Vec<Contract>,

    /// Client-side creation time in milliseconds.
    pub timestamp_ms: u64,
    /// Time (ms) past which the transaction may no longer be included.
    pub expiration_ms: u64,
}

impl Transaction {
    pub fn new(contracts: Vec<Contract>) -> Self {
        Self {
            contracts,
            timestamp_ms: 0,
            expiration_ms: 0,
        }
    }

    /// Serialized size in bytes; the figure bandwidth is charged in.
    pub fn serialized_size(&self) -> u64 {
        bincode::serialize(self).map(|b| b.len() as u64).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_per_contract_kind() {
        let owner = Address([1; 32]);
        let to = Address([2; 32]);
        assert_eq!(
            Contract::Transfer {
                owner,
                to,
                amount: 5
            }
            .owner(),
            &owner
        );
        assert_eq!(Contract::UnfreezeBalance { owner }.owner(), &owner);
    }

    #[test]
    fn test_serialized_size_grows_with_contracts() {
        let owner = Address([1; 32]);
        let to = Address([2; 32]);
        let contract = Contract::Transfer {
            owner,
            to,
            amount: 100,
        };

        let one = Transaction::new(vec![contract.clone()]);
        let two = Transaction::new(vec![contract.clone(), contract]);
        assert!(one.serialized_size() > 0);
        assert!(two.serialized_size() > one.serialized_size());
    }
}
