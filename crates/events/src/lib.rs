//! Zenopay Events - JSONL journal
//!
//! Every committed vault change is appended here as a hash-chained
//! `JournalEntry`. The journal is the source of truth: the request
//! ledger and multisig configuration are rebuilt from it on startup.

pub mod error;
pub mod journal;
pub mod reader;
pub mod store;

pub use error::EventError;
pub use journal::{JournalEntry, VaultRecord};
pub use reader::{verify_chain, EventReader};
pub use store::EventStore;
