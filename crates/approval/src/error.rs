//! Approval gate errors

use crate::store::StoreError;
use thiserror::Error;
use zenopay_core::{AccessError, AccountId};
use zenopay_ledger::{LedgerError, RequestId, RequestStatus};

/// Signature decoding / verification failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Malformed signature from {signer}: {reason}")]
    Malformed { signer: String, reason: String },

    #[error("Signature from {signer} failed verification: {reason}")]
    VerificationFailed { signer: String, reason: String },
}

/// Errors from the approval gate
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    #[error("Request {id} already processed (status: {status})")]
    AlreadyProcessed { id: RequestId, status: RequestStatus },

    #[error("No multisig configured")]
    MultisigNotConfigured,

    #[error("Invalid multisig: {0}")]
    InvalidMultisig(String),

    #[error("No open signature proposal for request {0}")]
    NoOpenProposal(RequestId),

    #[error("{0} is not a multisig owner")]
    NotAnOwner(AccountId),

    #[error("Caller {caller} cannot submit a signature made by {signer}")]
    SignerMismatch { caller: AccountId, signer: AccountId },

    #[error("Duplicate signature from signer: {0}")]
    DuplicateSignature(AccountId),

    #[error("Invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("Signature proposal for request {0} has expired")]
    Expired(RequestId),

    #[error("Request {id} has {collected} of {required} required signatures")]
    InsufficientSignatures {
        id: RequestId,
        collected: usize,
        required: usize,
    },
}
