//! Audit trail - append-only, hash-chained JSONL log
//!
//! Each line is one `AuditEntry`. Entries are never rewritten; the
//! `prev_hash` / `hash` chain makes any edit to an earlier line visible
//! to `verify()`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use zenopay_core::hash::GENESIS_HASH;
use zenopay_ledger::RequestId;

use crate::entry::{validate, AuditAction, AuditEntry};
use crate::error::{AuditError, AuditResult};

pub struct AuditTrail {
    path: Option<PathBuf>,
    file: Option<File>,
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    /// Open (or create) the trail at `path`, loading and verifying existing entries
    pub fn new(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            read_entries(&path)?
        } else {
            Vec::new()
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let trail = Self {
            path: Some(path),
            file: Some(file),
            entries,
        };
        trail.verify()?;

        info!(entries = trail.entries.len(), "Audit trail loaded");
        Ok(trail)
    }

    /// Create an in-memory trail (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            file: None,
            entries: Vec::new(),
        }
    }

    /// Append one action. Fails only on malformed input or I/O.
    pub fn log_action(
        &mut self,
        request_id: RequestId,
        actor: &str,
        action: AuditAction,
        transcript: Option<&str>,
        at: DateTime<Utc>,
    ) -> AuditResult<&AuditEntry> {
        validate(request_id, actor, transcript)?;

        let entry = AuditEntry::new(
            self.entries.len() as u64 + 1,
            self.last_hash().to_string(),
            request_id,
            actor,
            action,
            transcript,
            at,
        )?;

        if let Some(ref mut file) = self.file {
            let json = serde_json::to_string(&entry)?;
            writeln!(file, "{}", json)?;
            file.flush()?;
        }

        debug!(
            sequence = entry.sequence,
            request_id,
            action = %entry.action,
            "Audit entry appended"
        );

        self.entries.push(entry);
        self.entries
            .last()
            .ok_or_else(|| AuditError::InvalidEntry("entry was not appended".to_string()))
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn entries_for(&self, request_id: RequestId) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.request_id == request_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the newest entry, `GENESIS` when empty
    pub fn last_hash(&self) -> &str {
        self.entries
            .last()
            .map(|e| e.hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    /// Recompute every hash and link in the chain
    pub fn verify(&self) -> AuditResult<()> {
        verify_entries(&self.entries)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }
}

fn read_entries(path: &Path) -> AuditResult<Vec<AuditEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| AuditError::Corrupt {
            line: i + 1,
            reason: e.to_string(),
        })?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Check sequence numbers, links and hashes of a run of entries
pub fn verify_entries(entries: &[AuditEntry]) -> AuditResult<()> {
    let mut prev_hash = GENESIS_HASH.to_string();

    for (i, entry) in entries.iter().enumerate() {
        let expected_sequence = i as u64 + 1;
        if entry.sequence != expected_sequence {
            return Err(AuditError::ChainBroken {
                sequence: entry.sequence,
                expected: format!("sequence {}", expected_sequence),
                found: format!("sequence {}", entry.sequence),
            });
        }

        if entry.prev_hash != prev_hash {
            return Err(AuditError::ChainBroken {
                sequence: entry.sequence,
                expected: prev_hash,
                found: entry.prev_hash.clone(),
            });
        }

        let computed = entry.compute_hash()?;
        if computed != entry.hash {
            return Err(AuditError::ChainBroken {
                sequence: entry.sequence,
                expected: computed,
                found: entry.hash.clone(),
            });
        }

        prev_hash = entry.hash.clone();
    }

    Ok(())
}
