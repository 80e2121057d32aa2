//! Payout request and its lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use zenopay_core::{AccountId, Amount, ChainId, WalletAddress};

/// Sequential request identifier, starting at 1
pub type RequestId = u64;

/// Lifecycle of a payout request
///
/// ```text
/// Pending ──approve──────────────────────────► Approved ──forward──► Executed
///    │  └─approve (high value)─► AwaitingSignatures ─threshold─┘
///    └──────────reject─────────────┴──────────────► Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted, nobody has acted yet
    Pending,
    /// High-value request waiting for multisig signatures
    AwaitingSignatures,
    /// May be forwarded to payout
    Approved,
    /// Paid out (terminal)
    Executed,
    /// Rejected by an admin (terminal)
    Rejected,
}

impl RequestStatus {
    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Executed | RequestStatus::Rejected)
    }

    /// Still waiting for an approval decision
    pub fn is_open(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::AwaitingSignatures)
    }
}

/// A contributor's ask to be paid `amount` on `target_chain` / `target_wallet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub id: RequestId,
    pub requester: AccountId,
    pub amount: Amount,
    pub target_chain: ChainId,
    pub target_wallet: WalletAddress,
    pub status: RequestStatus,
    /// Set once the request was routed to the multisig flow
    pub requires_multisig: bool,
    pub rejection_reason: Option<String>,
    /// Bridge transaction hash once executed
    pub payout_tx: Option<String>,
    /// Incremented on every committed transition
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayoutRequest {
    pub fn new(
        id: RequestId,
        requester: AccountId,
        amount: Amount,
        target_chain: ChainId,
        target_wallet: WalletAddress,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            requester,
            amount,
            target_chain,
            target_wallet,
            status: RequestStatus::Pending,
            requires_multisig: false,
            rejection_reason: None,
            payout_tx: None,
            version: 1,
            timestamp,
            updated_at: timestamp,
        }
    }

    /// Approved at some point (stays true once executed)
    pub fn approved(&self) -> bool {
        matches!(self.status, RequestStatus::Approved | RequestStatus::Executed)
    }

    pub fn executed(&self) -> bool {
        self.status == RequestStatus::Executed
    }

    pub(crate) fn transition(&mut self, status: RequestStatus, at: DateTime<Utc>) {
        self.status = status;
        self.version += 1;
        self.updated_at = at;
    }
}
