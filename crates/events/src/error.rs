//! Event store errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid event file: {0}")]
    InvalidFile(String),

    #[error("Journal chain broken at sequence {sequence}: {reason}")]
    ChainBroken { sequence: u64, reason: String },
}
