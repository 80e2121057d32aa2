//! Vault notifications for pub/sub distribution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zenopay_core::{AccountId, Amount, ChainId, WalletAddress};
use zenopay_ledger::{PayoutRequest, RequestId};

/// Events emitted after a vault change is committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// A contributor submitted a payout request
    PaymentRequested {
        request_id: RequestId,
        requester: AccountId,
        amount: Amount,
        target_chain: ChainId,
        target_wallet: WalletAddress,
        timestamp: DateTime<Utc>,
    },

    RequestApproved {
        request_id: RequestId,
        approver: AccountId,
        timestamp: DateTime<Utc>,
    },

    /// A multisig owner signed a high-value request
    SignatureCollected {
        request_id: RequestId,
        signer: AccountId,
        collected: usize,
        required: usize,
        timestamp: DateTime<Utc>,
    },

    RequestRejected {
        request_id: RequestId,
        actor: AccountId,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Funds left through the bridge
    PayoutSent {
        request_id: RequestId,
        tx_hash: String,
        dest_chain: ChainId,
        amount: Amount,
        timestamp: DateTime<Utc>,
    },

    /// A request was approved from a spoken command
    VoiceApproved {
        request_id: RequestId,
        actor: AccountId,
        transcript: String,
        timestamp: DateTime<Utc>,
    },
}

impl VaultEvent {
    /// Create a PaymentRequested event from a freshly submitted request
    pub fn payment_requested(request: &PayoutRequest) -> Self {
        Self::PaymentRequested {
            request_id: request.id,
            requester: request.requester.clone(),
            amount: request.amount,
            target_chain: request.target_chain,
            target_wallet: request.target_wallet.clone(),
            timestamp: request.timestamp,
        }
    }

    pub fn request_id(&self) -> RequestId {
        match self {
            Self::PaymentRequested { request_id, .. }
            | Self::RequestApproved { request_id, .. }
            | Self::SignatureCollected { request_id, .. }
            | Self::RequestRejected { request_id, .. }
            | Self::PayoutSent { request_id, .. }
            | Self::VoiceApproved { request_id, .. } => *request_id,
        }
    }

    /// Event name as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::PaymentRequested { .. } => "PaymentRequested",
            Self::RequestApproved { .. } => "RequestApproved",
            Self::SignatureCollected { .. } => "SignatureCollected",
            Self::RequestRejected { .. } => "RequestRejected",
            Self::PayoutSent { .. } => "PayoutSent",
            Self::VoiceApproved { .. } => "VoiceApproved",
        }
    }
}
