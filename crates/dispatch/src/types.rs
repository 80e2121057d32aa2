//! Payout instructions and the bridge abstraction

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zenopay_core::{Amount, ChainId, WalletAddress};
use zenopay_ledger::{PayoutRequest, RequestId};

use crate::BridgeError;

/// What gets sent over the bridge for one approved request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutInstruction {
    pub request_id: RequestId,
    pub amount: Amount,
    pub dest_chain: ChainId,
    pub wallet: WalletAddress,
}

impl PayoutInstruction {
    pub fn from_request(request: &PayoutRequest) -> Self {
        Self {
            request_id: request.id,
            amount: request.amount,
            dest_chain: request.target_chain,
            wallet: request.target_wallet.clone(),
        }
    }

    /// Bridge payload: three 32-byte big-endian words (request id, amount,
    /// destination chain id) followed by the raw wallet bytes
    pub fn encode_payload(&self) -> Vec<u8> {
        let wallet = self.wallet.to_bytes();
        let mut payload = Vec::with_capacity(96 + wallet.len());
        payload.extend_from_slice(&u64_word(self.request_id));
        payload.extend_from_slice(&self.amount.to_word());
        payload.extend_from_slice(&u64_word(self.dest_chain.id()));
        payload.extend_from_slice(&wallet);
        payload
    }
}

fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Receipt for a payout accepted by a bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle {
    /// `0x`-prefixed transaction hash
    pub tx_hash: String,
    /// Name of the bridge that carried the payout
    pub bridge: String,
    pub dest_chain: ChainId,
    pub amount: Amount,
    pub submitted_at: DateTime<Utc>,
}

/// Cross-chain payout transport
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait PayoutBridge: Send + Sync {
    /// Short identifier used in receipts and logs
    fn name(&self) -> &str;

    /// Send one payout to its destination chain
    async fn send_payout(&self, instruction: &PayoutInstruction) -> Result<TxHandle, BridgeError>;

    /// Chains this bridge can reach
    async fn supported_chains(&self) -> Vec<ChainId>;

    async fn supports(&self, chain: ChainId) -> bool {
        self.supported_chains().await.contains(&chain)
    }
}
