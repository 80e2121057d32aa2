//! Multisig signatures over payout requests
//!
//! Each owner of the multisig signs the canonical payload of a request
//! with its Ed25519 key. The gate verifies every signature against the
//! public key registered for that owner.

use crate::error::SignatureError;
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer as DalekSigner, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use zenopay_core::hash::sha256_hex;
use zenopay_core::{AccountId, WalletAddress};
use zenopay_ledger::{PayoutRequest, RequestId};

/// Signature collected from a multisig owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedSignature {
    pub signer_id: AccountId,

    /// Public key (hex-encoded)
    pub public_key: String,

    /// Signature bytes (hex-encoded)
    pub signature: String,

    pub signed_at: DateTime<Utc>,
}

impl CollectedSignature {
    /// Verify this signature against a payload
    pub fn verify(&self, payload: &[u8]) -> Result<(), SignatureError> {
        let signer = self.signer_id.to_string();

        let pk_bytes = hex::decode(&self.public_key).map_err(|e| SignatureError::Malformed {
            signer: signer.clone(),
            reason: format!("Invalid public key hex: {}", e),
        })?;

        let sig_bytes = hex::decode(&self.signature).map_err(|e| SignatureError::Malformed {
            signer: signer.clone(),
            reason: format!("Invalid signature hex: {}", e),
        })?;

        let pk_array: [u8; 32] = pk_bytes.try_into().map_err(|_| SignatureError::Malformed {
            signer: signer.clone(),
            reason: "Public key must be 32 bytes".to_string(),
        })?;

        let sig_array: [u8; 64] = sig_bytes.try_into().map_err(|_| SignatureError::Malformed {
            signer: signer.clone(),
            reason: "Signature must be 64 bytes".to_string(),
        })?;

        let verifying_key =
            VerifyingKey::from_bytes(&pk_array).map_err(|e| SignatureError::Malformed {
                signer: signer.clone(),
                reason: format!("Invalid public key: {}", e),
            })?;

        let signature = Signature::from_bytes(&sig_array);

        verifying_key
            .verify(payload, &signature)
            .map_err(|e| SignatureError::VerificationFailed {
                signer,
                reason: e.to_string(),
            })
    }
}

/// The request fields a multisig owner commits to.
///
/// Status and version are left out: they change while signatures are
/// being collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignablePayload {
    pub multisig_address: WalletAddress,
    pub request_id: RequestId,
    pub requester: AccountId,
    pub amount: String,
    pub target_chain: u64,
    pub target_wallet: WalletAddress,
    pub timestamp: DateTime<Utc>,
}

impl SignablePayload {
    pub fn from_request(request: &PayoutRequest, multisig_address: &WalletAddress) -> Self {
        Self {
            multisig_address: multisig_address.clone(),
            request_id: request.id,
            requester: request.requester.clone(),
            amount: request.amount.to_string(),
            target_chain: request.target_chain.id(),
            target_wallet: request.target_wallet.clone(),
            timestamp: request.timestamp,
        }
    }

    /// Canonical bytes for signing, one field per line in fixed order
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "zenopay-payout-v1\n{}\n{}\n{}\n{}\n{}\n{}\n{}",
            self.multisig_address,
            self.request_id,
            self.requester,
            self.amount,
            self.target_chain,
            self.target_wallet,
            self.timestamp.to_rfc3339(),
        )
        .into_bytes()
    }

    /// SHA256 of the canonical bytes (hex)
    pub fn digest(&self) -> String {
        sha256_hex(&self.to_bytes())
    }
}

/// Trait for multisig signers
pub trait RequestSigner: Send + Sync {
    fn signer_id(&self) -> &AccountId;

    /// Public key (hex-encoded)
    fn public_key_hex(&self) -> String;

    fn sign(&self, payload: &SignablePayload) -> CollectedSignature;
}

/// Ed25519 keypair held by one multisig owner
pub struct KeypairSigner {
    signer_id: AccountId,
    signing_key: SigningKey,
}

impl KeypairSigner {
    /// Create from a 32-byte seed (hex-encoded)
    pub fn from_hex(signer_id: AccountId, hex_seed: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(hex_seed.trim()).map_err(|e| SignatureError::Malformed {
            signer: signer_id.to_string(),
            reason: format!("Invalid key hex: {}", e),
        })?;

        let seed: [u8; 32] = bytes.try_into().map_err(|_| SignatureError::Malformed {
            signer: signer_id.to_string(),
            reason: "Key must be 32 bytes".to_string(),
        })?;

        Ok(Self {
            signer_id,
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Generate a new random signing key
    pub fn generate(signer_id: AccountId) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signer_id,
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Export the seed as hex (for storage)
    pub fn seed_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

impl RequestSigner for KeypairSigner {
    fn signer_id(&self) -> &AccountId {
        &self.signer_id
    }

    fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    fn sign(&self, payload: &SignablePayload) -> CollectedSignature {
        let signature = self.signing_key.sign(&payload.to_bytes());

        CollectedSignature {
            signer_id: self.signer_id.clone(),
            public_key: self.public_key_hex(),
            signature: hex::encode(signature.to_bytes()),
            signed_at: Utc::now(),
        }
    }
}
