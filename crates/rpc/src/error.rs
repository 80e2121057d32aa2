//! Vault-level error taxonomy

use thiserror::Error;
use zenopay_approval::ApprovalError;
use zenopay_audit::{AuditError, VoiceError};
use zenopay_core::{AccessError, AmountError};
use zenopay_dispatch::{BridgeError, DispatchError};
use zenopay_events::EventError;
use zenopay_ledger::{LedgerError, RequestId, RequestStatus};

use crate::config::ConfigError;

/// Every error a vault operation can surface.
///
/// The workflow errors are lifted to top-level variants whichever crate
/// raised them, so callers match on one taxonomy.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request not found: {0}")]
    NotFound(RequestId),

    #[error("Request {id} already processed (status: {status})")]
    AlreadyProcessed { id: RequestId, status: RequestStatus },

    #[error("Request {0} is not approved")]
    NotApproved(RequestId),

    #[error("Request {0} already executed")]
    AlreadyExecuted(RequestId),

    #[error("Payout of request {0} is in doubt: dispatched but never confirmed")]
    InDoubt(RequestId),

    #[error("Payout of request {0} is not in doubt")]
    NotInDoubt(RequestId),

    #[error("Payout of request {id} sent as {tx_hash} but not journaled: {source}")]
    PayoutNotJournaled {
        id: RequestId,
        tx_hash: String,
        #[source]
        source: EventError,
    },

    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    #[error("Request {id} has {collected} of {required} required signatures")]
    InsufficientSignatures {
        id: RequestId,
        collected: usize,
        required: usize,
    },

    #[error("Invalid audit entry: {0}")]
    InvalidEntry(String),

    #[error("Voice command does not match request {id}: spoken {field} {spoken}, request has {expected}")]
    VoiceMismatch {
        id: RequestId,
        field: &'static str,
        spoken: String,
        expected: String,
    },

    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error("Payout of request {id} failed: {source}")]
    Transport {
        id: RequestId,
        #[source]
        source: BridgeError,
    },

    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("Approval error: {0}")]
    Approval(ApprovalError),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    #[error("Audit error: {0}")]
    Audit(AuditError),

    #[error("Journal error: {0}")]
    Event(#[from] EventError),

    #[error("Journal replay failed at sequence {sequence}: {source}")]
    Replay {
        sequence: u64,
        #[source]
        source: LedgerError,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LedgerError> for VaultError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidRequest(msg) => VaultError::InvalidRequest(msg),
            LedgerError::NotFound(id) => VaultError::NotFound(id),
            LedgerError::AlreadyProcessed { id, status } => VaultError::AlreadyProcessed { id, status },
            LedgerError::NotApproved(id) => VaultError::NotApproved(id),
            LedgerError::AlreadyExecuted(id) => VaultError::AlreadyExecuted(id),
            LedgerError::Unauthorized(e) => VaultError::Unauthorized(e),
            other => VaultError::Ledger(other),
        }
    }
}

impl From<ApprovalError> for VaultError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::Ledger(e) => e.into(),
            ApprovalError::Unauthorized(e) => VaultError::Unauthorized(e),
            ApprovalError::AlreadyProcessed { id, status } => VaultError::AlreadyProcessed { id, status },
            ApprovalError::InsufficientSignatures {
                id,
                collected,
                required,
            } => VaultError::InsufficientSignatures {
                id,
                collected,
                required,
            },
            other => VaultError::Approval(other),
        }
    }
}

impl From<DispatchError> for VaultError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound(id) => VaultError::NotFound(id),
            DispatchError::NotApproved(id) => VaultError::NotApproved(id),
            DispatchError::AlreadyExecuted(id) => VaultError::AlreadyExecuted(id),
            DispatchError::InDoubt(id) => VaultError::InDoubt(id),
            DispatchError::InsufficientSignatures {
                id,
                collected,
                required,
            } => VaultError::InsufficientSignatures {
                id,
                collected,
                required,
            },
            DispatchError::Unauthorized(e) => VaultError::Unauthorized(e),
            DispatchError::Transport { id, source } => VaultError::Transport { id, source },
            DispatchError::Ledger(e) => e.into(),
            DispatchError::Approval(e) => e.into(),
        }
    }
}

impl From<AuditError> for VaultError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::InvalidEntry(msg) => VaultError::InvalidEntry(msg),
            other => VaultError::Audit(other),
        }
    }
}
