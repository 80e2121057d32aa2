//! Audit entries and input validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use zenopay_core::hash::chain_hash;
use zenopay_ledger::RequestId;

use crate::error::{AuditError, AuditResult};

/// Longest transcript accepted, in characters
pub const MAX_TRANSCRIPT_CHARS: usize = 2048;

/// What the actor did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Approve,
    Reject,
    /// A multisig owner's signature was collected
    Sign,
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 1-based position in the chain
    pub sequence: u64,
    pub request_id: RequestId,
    pub actor: String,
    pub action: AuditAction,
    /// Voice transcript or free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub prev_hash: String,
    pub hash: String,
}

/// The hashed part of an entry
#[derive(Serialize)]
struct EntryBody<'a> {
    request_id: RequestId,
    actor: &'a str,
    action: AuditAction,
    transcript: Option<&'a str>,
    timestamp: &'a DateTime<Utc>,
}

impl AuditEntry {
    pub(crate) fn new(
        sequence: u64,
        prev_hash: String,
        request_id: RequestId,
        actor: &str,
        action: AuditAction,
        transcript: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> AuditResult<Self> {
        let mut entry = Self {
            sequence,
            request_id,
            actor: actor.trim().to_string(),
            action,
            transcript: transcript.map(|t| t.trim().to_string()),
            timestamp,
            prev_hash,
            hash: String::new(),
        };
        entry.hash = entry.compute_hash()?;
        Ok(entry)
    }

    /// Recompute the hash from the entry contents
    pub fn compute_hash(&self) -> AuditResult<String> {
        let body = serde_json::to_vec(&EntryBody {
            request_id: self.request_id,
            actor: &self.actor,
            action: self.action,
            transcript: self.transcript.as_deref(),
            timestamp: &self.timestamp,
        })?;
        Ok(chain_hash(self.sequence, &self.prev_hash, &body))
    }
}

/// Reject malformed input before anything is written
pub fn validate(request_id: RequestId, actor: &str, transcript: Option<&str>) -> AuditResult<()> {
    if request_id == 0 {
        return Err(AuditError::InvalidEntry("request id must be positive".to_string()));
    }

    if actor.trim().is_empty() {
        return Err(AuditError::InvalidEntry("actor is required".to_string()));
    }

    if actor.chars().any(char::is_control) {
        return Err(AuditError::InvalidEntry("actor contains control characters".to_string()));
    }

    if let Some(text) = transcript {
        if text.trim().is_empty() {
            return Err(AuditError::InvalidEntry("transcript is blank".to_string()));
        }

        let len = text.chars().count();
        if len > MAX_TRANSCRIPT_CHARS {
            return Err(AuditError::InvalidEntry(format!(
                "transcript is {} characters, limit is {}",
                len, MAX_TRANSCRIPT_CHARS
            )));
        }

        if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
            return Err(AuditError::InvalidEntry(
                "transcript contains control characters".to_string(),
            ));
        }
    }

    Ok(())
}
