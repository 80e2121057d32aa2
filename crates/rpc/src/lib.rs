//! Zenopay RPC - vault context and CLI orchestrator
//!
//! This crate wires the ledger, approval gate, dispatcher, audit trail,
//! journal and event bus together and provides the CLI binary.

pub mod commands;
pub mod config;
pub mod context;
pub mod error;

pub use config::VaultConfig;
pub use context::AppContext;
pub use error::VaultError;
