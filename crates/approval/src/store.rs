//! SQLite storage for signature proposals

use crate::proposal::{ProposalStatus, SignatureProposal};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use zenopay_ledger::RequestId;

/// Errors from the proposal store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Proposal not found: {0}")]
    NotFound(String),

    #[error("Corrupt proposal row {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

const SELECT_COLUMNS: &str = "SELECT id, request_id, payload_hash, required_signatures,
        collected_signatures_json, created_at, expires_at, status, rejection_reason
     FROM signature_proposals";

/// SQLite storage for signature proposals
pub struct ProposalStore {
    conn: Connection,
}

impl ProposalStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS signature_proposals (
                id TEXT PRIMARY KEY,
                request_id INTEGER NOT NULL,
                payload_hash TEXT NOT NULL,
                required_signatures INTEGER NOT NULL,
                collected_signatures_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                status TEXT NOT NULL,
                rejection_reason TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signature_proposals_request
             ON signature_proposals(request_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signature_proposals_status
             ON signature_proposals(status)",
            [],
        )?;

        Ok(())
    }

    /// Insert or update a proposal
    pub fn save(&self, proposal: &SignatureProposal) -> Result<(), StoreError> {
        let collected_signatures_json = serde_json::to_string(&proposal.collected_signatures)?;

        self.conn.execute(
            "INSERT INTO signature_proposals
             (id, request_id, payload_hash, required_signatures,
              collected_signatures_json, created_at, expires_at, status, rejection_reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                collected_signatures_json = excluded.collected_signatures_json,
                status = excluded.status,
                rejection_reason = excluded.rejection_reason",
            params![
                proposal.id,
                proposal.request_id as i64,
                proposal.payload_hash,
                proposal.required_signatures,
                collected_signatures_json,
                proposal.created_at.to_rfc3339(),
                proposal.expires_at.to_rfc3339(),
                proposal.status.as_str(),
                proposal.rejection_reason,
            ],
        )?;

        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<SignatureProposal, StoreError> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let raw = self
            .conn
            .query_row(&sql, params![id], RawProposal::from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        raw.into_proposal()
    }

    /// Most recently opened proposal for a request
    pub fn latest_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<SignatureProposal>, StoreError> {
        let sql = format!(
            "{} WHERE request_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let raw = self
            .conn
            .query_row(&sql, params![request_id as i64], RawProposal::from_row)
            .optional()?;

        raw.map(RawProposal::into_proposal).transpose()
    }

    pub fn list_for_request(&self, request_id: RequestId) -> Result<Vec<SignatureProposal>, StoreError> {
        let sql = format!("{} WHERE request_id = ?1 ORDER BY created_at ASC", SELECT_COLUMNS);
        self.query_list(&sql, params![request_id as i64])
    }

    /// Make the stored proposals of `request_id` exactly `proposals`
    pub fn replace_for_request(
        &self,
        request_id: RequestId,
        proposals: &[SignatureProposal],
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM signature_proposals WHERE request_id = ?1",
            params![request_id as i64],
        )?;
        for proposal in proposals {
            self.save(proposal)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_by_status(&self, status: ProposalStatus) -> Result<Vec<SignatureProposal>, StoreError> {
        let sql = format!("{} WHERE status = ?1 ORDER BY created_at DESC", SELECT_COLUMNS);
        self.query_list(&sql, params![status.as_str()])
    }

    pub fn count_by_status(&self, status: ProposalStatus) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM signature_proposals WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    /// Mark expired proposals, returning how many were updated
    pub fn expire_old_proposals(&self) -> Result<usize, StoreError> {
        let now = Utc::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE signature_proposals
             SET status = 'expired'
             WHERE status = 'open' AND expires_at <= ?1",
            params![now],
        )?;

        Ok(rows)
    }

    fn query_list(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<SignatureProposal>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let raws = stmt
            .query_map(params, RawProposal::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(RawProposal::into_proposal).collect()
    }
}

/// Row as stored, before parsing dates, status and signatures
struct RawProposal {
    id: String,
    request_id: i64,
    payload_hash: String,
    required_signatures: u8,
    collected_signatures_json: String,
    created_at: String,
    expires_at: String,
    status: String,
    rejection_reason: Option<String>,
}

impl RawProposal {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            request_id: row.get(1)?,
            payload_hash: row.get(2)?,
            required_signatures: row.get(3)?,
            collected_signatures_json: row.get(4)?,
            created_at: row.get(5)?,
            expires_at: row.get(6)?,
            status: row.get(7)?,
            rejection_reason: row.get(8)?,
        })
    }

    fn into_proposal(self) -> Result<SignatureProposal, StoreError> {
        let collected_signatures = serde_json::from_str(&self.collected_signatures_json)?;
        let created_at = parse_time(&self.id, &self.created_at)?;
        let expires_at = parse_time(&self.id, &self.expires_at)?;
        let status = ProposalStatus::parse(&self.status).ok_or_else(|| StoreError::Corrupt {
            id: self.id.clone(),
            reason: format!("invalid status '{}'", self.status),
        })?;

        Ok(SignatureProposal {
            id: self.id,
            request_id: self.request_id as RequestId,
            payload_hash: self.payload_hash,
            required_signatures: self.required_signatures,
            collected_signatures,
            created_at,
            expires_at,
            status,
            rejection_reason: self.rejection_reason,
        })
    }
}

fn parse_time(id: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            reason: format!("invalid date '{}': {}", value, e),
        })
}
