//! JSONL event store - append-only, daily-rotated journal writer

use crate::error::EventError;
use crate::journal::{JournalEntry, VaultRecord};
use crate::reader::EventReader;
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zenopay_core::hash::GENESIS_HASH;

/// Append-only JSONL journal
///
/// Files are named `YYYY-MM-DD.jsonl`; the chain (sequence, prev_hash)
/// runs across files.
pub struct EventStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
    last_sequence: u64,
    last_hash: String,
}

impl EventStore {
    /// Open the journal at `base_path`, continuing its existing chain
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let (last_sequence, last_hash) = match EventReader::from_directory(&base_path)?.last_entry()? {
            Some(entry) => (entry.sequence, entry.hash),
            None => (0, GENESIS_HASH.to_string()),
        };

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
            last_sequence,
            last_hash,
        })
    }

    /// Chain `record` onto the journal and write it
    pub fn append(&mut self, record: VaultRecord, at: DateTime<Utc>) -> Result<JournalEntry, EventError> {
        let entry = JournalEntry::new(self.last_sequence + 1, self.last_hash.clone(), record, at)?;
        self.write(&entry)?;

        self.last_sequence = entry.sequence;
        self.last_hash = entry.hash.clone();

        debug!(sequence = entry.sequence, kind = entry.record.kind(), "Journal entry appended");
        Ok(entry)
    }

    fn write(&mut self, entry: &JournalEntry) -> Result<(), EventError> {
        let date = entry.timestamp.format("%Y-%m-%d").to_string();

        // Rotate file if date changed
        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        let writer = self
            .current_file
            .as_mut()
            .ok_or_else(|| EventError::InvalidFile(format!("{}.jsonl", date)))?;
        let json = serde_json::to_string(entry)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }

    /// Rotate to a new file for the given date
    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// List all JSONL files in the store
    pub fn list_files(&self) -> Result<Vec<PathBuf>, EventError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zenopay_core::AccountId;

    fn registered(name: &str) -> VaultRecord {
        VaultRecord::ContributorRegistered {
            account: AccountId::new(name).unwrap(),
            tier: 1,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_append_chains_entries() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();

        let first = store.append(registered("alice"), Utc::now()).unwrap();
        let second = store.append(registered("bob"), Utc::now()).unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(first.prev_hash, GENESIS_HASH);
        assert_eq!(second.sequence, 2);
        assert_eq!(second.prev_hash, first.hash);
        assert_eq!(store.list_files().unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_continues_chain() {
        let dir = TempDir::new().unwrap();
        let last_hash = {
            let mut store = EventStore::new(dir.path()).unwrap();
            store.append(registered("alice"), Utc::now()).unwrap().hash
        };

        let mut store = EventStore::new(dir.path()).unwrap();
        assert_eq!(store.last_sequence(), 1);

        let entry = store.append(registered("bob"), Utc::now()).unwrap();
        assert_eq!(entry.sequence, 2);
        assert_eq!(entry.prev_hash, last_hash);
    }

    #[test]
    fn test_rotates_by_entry_date() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();

        let yesterday = Utc::now() - chrono::Duration::days(1);
        store.append(registered("alice"), yesterday).unwrap();
        store.append(registered("bob"), Utc::now()).unwrap();

        assert_eq!(store.list_files().unwrap().len(), 2);
    }
}
