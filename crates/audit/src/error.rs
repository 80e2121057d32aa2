//! Audit errors

use thiserror::Error;

/// Errors from the audit trail
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid audit entry: {0}")]
    InvalidEntry(String),

    #[error("Audit log corrupt at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("Audit chain broken at sequence {sequence}: expected {expected}, found {found}")]
    ChainBroken {
        sequence: u64,
        expected: String,
        found: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;
