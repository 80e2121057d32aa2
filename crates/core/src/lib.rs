//! Zenopay Core - Domain types
//!
//! This crate contains the fundamental types used across the vault:
//! - `Amount`: integer amounts in the smallest on-chain unit
//! - `ChainId`: destination chain identifiers
//! - `WalletAddress` / `AccountId`: payout targets and callers
//! - `Role` / `Caller`: capabilities checked at gated operations

pub mod address;
pub mod amount;
pub mod chain;
pub mod hash;
pub mod role;

pub use address::{AccountId, AddressError, WalletAddress};
pub use amount::{Amount, AmountError, NATIVE_DECIMALS};
pub use chain::{ChainError, ChainId};
pub use role::{AccessError, Caller, Role};
