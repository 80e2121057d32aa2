//! Zenopay Ledger - Payout request table
//!
//! Every payout request lives here and every status change goes through
//! the guarded `mark_*` transitions of `RequestLedger`.
//!
//! # Key Types
//! - `PayoutRequest`: a contributor's payout ask
//! - `RequestStatus`: Pending → (AwaitingSignatures) → Approved → Executed, or Rejected
//! - `RequestLedger`: owner of the request table and contributor registry

pub mod book;
pub mod error;
pub mod request;

pub use book::{ContributorProfile, RequestLedger};
pub use error::LedgerError;
pub use request::{PayoutRequest, RequestId, RequestStatus};
