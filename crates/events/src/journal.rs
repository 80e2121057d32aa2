//! Journal entries - one committed vault change per line

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zenopay_approval::{MultisigConfig, MultisigWallet};
use zenopay_core::hash::chain_hash;
use zenopay_core::AccountId;
use zenopay_ledger::{PayoutRequest, RequestId};

use crate::error::EventError;

/// A committed change to vault state.
///
/// Replaying every record in order rebuilds the request ledger and the
/// multisig configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultRecord {
    RequestSubmitted {
        request: PayoutRequest,
    },
    ContributorRegistered {
        account: AccountId,
        tier: u8,
        at: DateTime<Utc>,
    },
    MultisigConfigured {
        config: MultisigConfig,
        wallet: MultisigWallet,
    },
    AwaitingSignatures {
        request_id: RequestId,
        at: DateTime<Utc>,
    },
    SignatureCollected {
        request_id: RequestId,
        signer: AccountId,
        at: DateTime<Utc>,
    },
    RequestApproved {
        request_id: RequestId,
        approver: AccountId,
        at: DateTime<Utc>,
    },
    RequestRejected {
        request_id: RequestId,
        actor: AccountId,
        reason: Option<String>,
        at: DateTime<Utc>,
    },
    /// Written before the bridge is called; a payout with no matching
    /// `PayoutExecuted` or `PayoutFailed` is in doubt
    PayoutDispatched {
        request_id: RequestId,
        bridge: String,
        at: DateTime<Utc>,
    },
    PayoutFailed {
        request_id: RequestId,
        reason: String,
        at: DateTime<Utc>,
    },
    PayoutExecuted {
        request_id: RequestId,
        tx_hash: String,
        bridge: String,
        at: DateTime<Utc>,
    },
}

impl VaultRecord {
    /// Request the record refers to, if any
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            VaultRecord::RequestSubmitted { request } => Some(request.id),
            VaultRecord::AwaitingSignatures { request_id, .. }
            | VaultRecord::SignatureCollected { request_id, .. }
            | VaultRecord::RequestApproved { request_id, .. }
            | VaultRecord::RequestRejected { request_id, .. }
            | VaultRecord::PayoutDispatched { request_id, .. }
            | VaultRecord::PayoutFailed { request_id, .. }
            | VaultRecord::PayoutExecuted { request_id, .. } => Some(*request_id),
            VaultRecord::ContributorRegistered { .. } | VaultRecord::MultisigConfigured { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VaultRecord::RequestSubmitted { .. } => "request_submitted",
            VaultRecord::ContributorRegistered { .. } => "contributor_registered",
            VaultRecord::MultisigConfigured { .. } => "multisig_configured",
            VaultRecord::AwaitingSignatures { .. } => "awaiting_signatures",
            VaultRecord::SignatureCollected { .. } => "signature_collected",
            VaultRecord::RequestApproved { .. } => "request_approved",
            VaultRecord::RequestRejected { .. } => "request_rejected",
            VaultRecord::PayoutDispatched { .. } => "payout_dispatched",
            VaultRecord::PayoutFailed { .. } => "payout_failed",
            VaultRecord::PayoutExecuted { .. } => "payout_executed",
        }
    }
}

/// A journal line: the record plus its place in the hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub prev_hash: String,
    pub hash: String,
    pub record: VaultRecord,
}

impl JournalEntry {
    pub fn new(
        sequence: u64,
        prev_hash: String,
        record: VaultRecord,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, EventError> {
        let hash = compute_hash(sequence, &prev_hash, &record)?;
        Ok(Self {
            sequence,
            timestamp,
            prev_hash,
            hash,
            record,
        })
    }

    pub fn compute_hash(&self) -> Result<String, EventError> {
        compute_hash(self.sequence, &self.prev_hash, &self.record)
    }
}

fn compute_hash(sequence: u64, prev_hash: &str, record: &VaultRecord) -> Result<String, EventError> {
    let body = serde_json::to_vec(record)?;
    Ok(chain_hash(sequence, prev_hash, &body))
}
