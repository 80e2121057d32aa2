//! Dispatch error types

use thiserror::Error;
use zenopay_approval::ApprovalError;
use zenopay_core::{AccessError, ChainId};
use zenopay_ledger::{LedgerError, RequestId};

/// Bridge-level failures
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge has no route to this chain
    #[error("Unsupported destination chain: {0}")]
    UnsupportedChain(ChainId),

    /// Bridge endpoint unreachable
    #[error("Bridge offline: {0}")]
    Offline(String),

    /// The bridge refused the instruction
    #[error("Payout rejected by bridge: {reason}")]
    Rejected { reason: String },

    /// Transport failure talking to the bridge
    #[error("Bridge transport failed: {source}")]
    Transport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors from `forward_to_payout`
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Request not found: {0}")]
    NotFound(RequestId),

    #[error("Request {0} is not approved")]
    NotApproved(RequestId),

    #[error("Request {0} already executed")]
    AlreadyExecuted(RequestId),

    /// Sent to the bridge earlier with no recorded outcome
    #[error("Payout of request {0} is in doubt: dispatched but never confirmed")]
    InDoubt(RequestId),

    #[error("Request {id} has {collected} of {required} required signatures")]
    InsufficientSignatures {
        id: RequestId,
        collected: usize,
        required: usize,
    },

    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    /// The transfer failed; the request stays Approved and may be retried
    #[error("Payout of request {id} failed: {source}")]
    Transport {
        id: RequestId,
        #[source]
        source: BridgeError,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Approval error: {0}")]
    Approval(ApprovalError),
}

impl From<ApprovalError> for DispatchError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::InsufficientSignatures {
                id,
                collected,
                required,
            } => DispatchError::InsufficientSignatures {
                id,
                collected,
                required,
            },
            ApprovalError::Unauthorized(e) => DispatchError::Unauthorized(e),
            other => DispatchError::Approval(other),
        }
    }
}
