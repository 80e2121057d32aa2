//! Zenopay Audit Trail
//!
//! Append-only record of who approved, signed or rejected which payout
//! request, optionally with the voice transcript that triggered it.
//!
//! ## Key Components
//!
//! - [`trail::AuditTrail`] - hash-chained JSONL log (`audit.jsonl`)
//! - [`entry::AuditEntry`] - one logged action
//! - [`voice::VoiceCommand`] - parser for spoken approval commands

pub mod entry;
pub mod error;
pub mod trail;
pub mod voice;

pub use entry::{AuditAction, AuditEntry, MAX_TRANSCRIPT_CHARS};
pub use error::{AuditError, AuditResult};
pub use trail::{verify_entries, AuditTrail};
pub use voice::{VoiceCommand, VoiceError};
