//! Hash chain helpers shared by the journal and the audit trail

use sha2::{Digest, Sha256};

/// `prev_hash` of the first record in any chain
pub const GENESIS_HASH: &str = "GENESIS";

/// SHA256 of arbitrary bytes, hex encoded
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash of a chained record: H(sequence || prev_hash || body)
pub fn chain_hash(sequence: u64, prev_hash: &str, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(body);
    hex::encode(hasher.finalize())
}
