//! Multisig configuration and approval settings

use crate::error::ApprovalError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use zenopay_core::{AccountId, Amount, WalletAddress};

/// Settings for the approval gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Hours before an open signature proposal expires
    #[serde(default = "default_proposal_expiry_hours")]
    pub proposal_expiry_hours: i64,
}

fn default_proposal_expiry_hours() -> i64 {
    24
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            proposal_expiry_hours: default_proposal_expiry_hours(),
        }
    }
}

/// Global, admin-set multisig routing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigConfig {
    pub multisig_address: WalletAddress,
    /// Requests with `amount >= high_value_threshold` need multisig approval
    pub high_value_threshold: Amount,
}

impl MultisigConfig {
    pub fn is_high_value(&self, amount: Amount) -> bool {
        amount >= self.high_value_threshold
    }
}

/// One owner of the multisig wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigOwner {
    pub signer_id: AccountId,
    /// Ed25519 public key, hex encoded
    pub public_key: String,
}

/// N-of-M multisig wallet: `required_signatures` of `owners`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigWallet {
    pub address: WalletAddress,
    pub owners: Vec<MultisigOwner>,
    pub required_signatures: u8,
}

impl MultisigWallet {
    /// Validated constructor: unique owners, 32-byte keys, 1 <= N <= M
    pub fn new(
        address: WalletAddress,
        owners: Vec<MultisigOwner>,
        required_signatures: u8,
    ) -> Result<Self, ApprovalError> {
        if owners.is_empty() {
            return Err(ApprovalError::InvalidMultisig(
                "multisig needs at least one owner".to_string(),
            ));
        }

        if required_signatures == 0 || required_signatures as usize > owners.len() {
            return Err(ApprovalError::InvalidMultisig(format!(
                "required signatures must be between 1 and {}, got {}",
                owners.len(),
                required_signatures
            )));
        }

        let mut seen = HashSet::new();
        for owner in &owners {
            if !seen.insert(&owner.signer_id) {
                return Err(ApprovalError::InvalidMultisig(format!(
                    "duplicate owner {}",
                    owner.signer_id
                )));
            }
            let key_ok = hex::decode(&owner.public_key)
                .map(|bytes| bytes.len() == 32)
                .unwrap_or(false);
            if !key_ok {
                return Err(ApprovalError::InvalidMultisig(format!(
                    "owner {} has a malformed public key",
                    owner.signer_id
                )));
            }
        }

        Ok(Self {
            address,
            owners,
            required_signatures,
        })
    }

    pub fn owner(&self, signer_id: &AccountId) -> Option<&MultisigOwner> {
        self.owners.iter().find(|o| &o.signer_id == signer_id)
    }

    pub fn is_owner(&self, signer_id: &AccountId) -> bool {
        self.owner(signer_id).is_some()
    }

    /// Total possible signers (M in N-of-M)
    pub fn total_signers(&self) -> usize {
        self.owners.len()
    }
}
