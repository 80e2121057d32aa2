//! Mock bridge for testing
//!
//! Accepts payouts to a configurable set of chains, records every
//! instruction it was handed and can be told to fail.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use zenopay_core::hash::sha256_hex;
use zenopay_core::ChainId;

use crate::error::BridgeError;
use crate::types::{PayoutBridge, PayoutInstruction, TxHandle};

/// In-process bridge that never touches a network
pub struct MockBridge {
    name: String,
    chains: Mutex<BTreeSet<ChainId>>,
    sent: Mutex<Vec<PayoutInstruction>>,
    fail_next: Mutex<Option<BridgeError>>,
    offline: AtomicBool,
    nonce: AtomicU64,
}

impl MockBridge {
    /// A bridge with no supported chains
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chains: Mutex::new(BTreeSet::new()),
            sent: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            offline: AtomicBool::new(false),
            nonce: AtomicU64::new(0),
        }
    }

    /// A bridge reaching every well-known chain
    pub fn with_defaults() -> Self {
        let bridge = Self::new("mock-bridge");
        for chain in [
            ChainId::Ethereum,
            ChainId::Optimism,
            ChainId::Bnb,
            ChainId::Polygon,
            ChainId::Base,
            ChainId::Arbitrum,
            ChainId::Sepolia,
        ] {
            bridge.add_chain(chain);
        }
        bridge
    }

    pub fn add_chain(&self, chain: ChainId) {
        lock(&self.chains).insert(chain);
    }

    pub fn remove_chain(&self, chain: ChainId) {
        lock(&self.chains).remove(&chain);
    }

    /// Make the next `send_payout` fail with `error`
    pub fn fail_next(&self, error: BridgeError) {
        *lock(&self.fail_next) = Some(error);
    }

    /// While offline every send fails with `BridgeError::Offline`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Instructions accepted so far, in order
    pub fn sent(&self) -> Vec<PayoutInstruction> {
        lock(&self.sent).clone()
    }

    pub fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }
}

impl Default for MockBridge {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl PayoutBridge for MockBridge {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_payout(&self, instruction: &PayoutInstruction) -> Result<TxHandle, BridgeError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BridgeError::Offline(self.name.clone()));
        }

        if let Some(error) = lock(&self.fail_next).take() {
            return Err(error);
        }

        if !lock(&self.chains).contains(&instruction.dest_chain) {
            return Err(BridgeError::UnsupportedChain(instruction.dest_chain));
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut preimage = instruction.encode_payload();
        preimage.extend_from_slice(self.name.as_bytes());
        preimage.extend_from_slice(&nonce.to_be_bytes());

        lock(&self.sent).push(instruction.clone());

        Ok(TxHandle {
            tx_hash: format!("0x{}", sha256_hex(&preimage)),
            bridge: self.name.clone(),
            dest_chain: instruction.dest_chain,
            amount: instruction.amount,
            submitted_at: Utc::now(),
        })
    }

    async fn supported_chains(&self) -> Vec<ChainId> {
        lock(&self.chains).iter().copied().collect()
    }
}
