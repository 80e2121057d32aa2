//! Zenopay Approval - admin and N-of-M multisig approval gate
//!
//! Standard requests are approved by an admin. Requests at or above the
//! high-value threshold open a `SignatureProposal` that multisig owners
//! sign with their Ed25519 keys; the request is approved once the
//! required number of valid signatures has been collected.
//!
//! # Example
//!
//! ```ignore
//! let gate = ApprovalGate::with_store(ProposalStore::new("approvals.db")?);
//! gate.approve(&mut ledger, &admin, request_id, Utc::now())?;
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod proposal;
pub mod signature;
pub mod store;

pub use config::{ApprovalConfig, MultisigConfig, MultisigOwner, MultisigWallet};
pub use error::{ApprovalError, SignatureError};
pub use gate::{ApprovalGate, ApprovalOutcome, ApprovalStats, SignOutcome};
pub use proposal::{ProposalStatus, SignatureProposal};
pub use signature::{CollectedSignature, KeypairSigner, RequestSigner, SignablePayload};
pub use store::{ProposalStore, StoreError};
