//! JSONL event reader - sequential reader for replay

use crate::error::EventError;
use crate::journal::JournalEntry;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use zenopay_core::hash::GENESIS_HASH;

/// Sequential event reader for replay
pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    /// Create a new reader from a directory
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if file_path.extension().map_or(false, |ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        files.sort();

        Ok(Self { files })
    }

    /// Read all entries from all files in order
    pub fn read_all(&self) -> Result<Vec<JournalEntry>, EventError> {
        let mut entries = Vec::new();

        for file_path in &self.files {
            let reader = BufReader::new(File::open(file_path)?);

            for (i, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: JournalEntry = serde_json::from_str(&line).map_err(|e| {
                    EventError::InvalidFile(format!("{}:{}: {}", file_path.display(), i + 1, e))
                })?;
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Read every entry and check the hash chain
    pub fn read_verified(&self) -> Result<Vec<JournalEntry>, EventError> {
        let entries = self.read_all()?;
        verify_chain(&entries)?;
        Ok(entries)
    }

    /// Get the last entry (for prev_hash)
    pub fn last_entry(&self) -> Result<Option<JournalEntry>, EventError> {
        let entries = self.read_all()?;
        Ok(entries.into_iter().last())
    }

    /// Count total entries across all files
    pub fn count(&self) -> Result<usize, EventError> {
        let mut count = 0;

        for file_path in &self.files {
            let reader = BufReader::new(File::open(file_path)?);
            for line in reader.lines() {
                if !line?.trim().is_empty() {
                    count += 1;
                }
            }
        }

        Ok(count)
    }
}

/// Check sequence numbers, links and hashes
pub fn verify_chain(entries: &[JournalEntry]) -> Result<(), EventError> {
    let mut prev_hash = GENESIS_HASH.to_string();

    for (i, entry) in entries.iter().enumerate() {
        let expected = i as u64 + 1;
        if entry.sequence != expected {
            return Err(EventError::ChainBroken {
                sequence: entry.sequence,
                reason: format!("expected sequence {}", expected),
            });
        }

        if entry.prev_hash != prev_hash {
            return Err(EventError::ChainBroken {
                sequence: entry.sequence,
                reason: "prev_hash does not match previous entry".to_string(),
            });
        }

        if entry.compute_hash()? != entry.hash {
            return Err(EventError::ChainBroken {
                sequence: entry.sequence,
                reason: "hash does not match contents".to_string(),
            });
        }

        prev_hash = entry.hash.clone();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::VaultRecord;
    use crate::store::EventStore;
    use chrono::Utc;
    use tempfile::TempDir;
    use zenopay_core::{AccountId, Amount, ChainId, WalletAddress};
    use zenopay_ledger::PayoutRequest;

    fn submitted(id: u64) -> VaultRecord {
        VaultRecord::RequestSubmitted {
            request: PayoutRequest::new(
                id,
                AccountId::new("alice").unwrap(),
                Amount::new(100_000_000_000_000_000),
                ChainId::Ethereum,
                WalletAddress::parse("0xabc0000000000000000000000000000000000001").unwrap(),
                Utc::now(),
            ),
        }
    }

    #[test]
    fn test_read_back_and_verify() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = EventStore::new(dir.path()).unwrap();
            store.append(submitted(1), Utc::now()).unwrap();
            store
                .append(
                    VaultRecord::RequestApproved {
                        request_id: 1,
                        approver: AccountId::new("admin").unwrap(),
                        at: Utc::now(),
                    },
                    Utc::now(),
                )
                .unwrap();
        }

        let reader = EventReader::from_directory(dir.path()).unwrap();
        let entries = reader.read_verified().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(reader.count().unwrap(), 2);
        assert!(matches!(entries[0].record, VaultRecord::RequestSubmitted { .. }));
        assert_eq!(entries[1].record.request_id(), Some(1));
    }

    #[test]
    fn test_tampered_entry_detected() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = EventStore::new(dir.path()).unwrap();
            store.append(submitted(1), Utc::now()).unwrap();
        }

        let file = EventReader::from_directory(dir.path()).unwrap().files[0].clone();
        let content = std::fs::read_to_string(&file).unwrap();
        std::fs::write(&file, content.replace("100000000000000000", "900000000000000000")).unwrap();

        let result = EventReader::from_directory(dir.path()).unwrap().read_verified();
        assert!(matches!(result, Err(EventError::ChainBroken { sequence: 1, .. })));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let reader = EventReader::from_directory(dir.path().join("missing")).unwrap();
        assert!(reader.read_all().unwrap().is_empty());
        assert!(reader.last_entry().unwrap().is_none());
    }
}
