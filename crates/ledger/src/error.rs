//! Ledger errors

use crate::request::{RequestId, RequestStatus};
use thiserror::Error;
use zenopay_core::AccessError;

/// Errors that can occur in request ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
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

    #[error("Request id {id} out of order: next id is {expected}")]
    OutOfOrder { id: RequestId, expected: RequestId },

    #[error(transparent)]
    Unauthorized(#[from] AccessError),
}
