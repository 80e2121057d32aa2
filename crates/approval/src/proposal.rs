//! Signature proposals for high-value requests

use crate::signature::CollectedSignature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zenopay_core::AccountId;
use zenopay_ledger::RequestId;

/// Status of a signature proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Collecting signatures
    Open,
    /// Required signatures collected, request approved
    Approved,
    /// Request rejected by an admin while collecting
    Rejected,
    /// Expired due to timeout (24h default)
    Expired,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Open => "open",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ProposalStatus::Open),
            "approved" => Some(ProposalStatus::Approved),
            "rejected" => Some(ProposalStatus::Rejected),
            "expired" => Some(ProposalStatus::Expired),
            _ => None,
        }
    }
}

/// Signatures being gathered for one high-value request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureProposal {
    /// Unique identifier, `MSIG-XXXXXXXX`
    pub id: String,

    pub request_id: RequestId,

    /// Digest of the signable payload owners commit to
    pub payload_hash: String,

    /// N in N-of-M
    pub required_signatures: u8,

    pub collected_signatures: Vec<CollectedSignature>,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    pub status: ProposalStatus,

    pub rejection_reason: Option<String>,
}

impl SignatureProposal {
    pub fn new(
        request_id: RequestId,
        payload_hash: String,
        required_signatures: u8,
        expiry_hours: i64,
    ) -> Self {
        let id = format!("MSIG-{}", uuid::Uuid::new_v4().to_string()[..8].to_uppercase());
        let now = Utc::now();

        Self {
            id,
            request_id,
            payload_hash,
            required_signatures,
            collected_signatures: Vec::new(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(expiry_hours),
            status: ProposalStatus::Open,
            rejection_reason: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Open and not yet past its expiry
    pub fn is_live(&self) -> bool {
        self.status == ProposalStatus::Open && !self.is_expired()
    }

    pub fn has_enough_signatures(&self) -> bool {
        self.collected_signatures.len() >= self.required_signatures as usize
    }

    pub fn signatures_collected(&self) -> usize {
        self.collected_signatures.len()
    }

    pub fn signatures_remaining(&self) -> usize {
        (self.required_signatures as usize).saturating_sub(self.collected_signatures.len())
    }

    /// Add a signature (returns false if already signed by this signer)
    pub fn add_signature(&mut self, signature: CollectedSignature) -> bool {
        if self.has_signed(&signature.signer_id) {
            return false;
        }

        self.collected_signatures.push(signature);
        true
    }

    pub fn has_signed(&self, signer_id: &AccountId) -> bool {
        self.collected_signatures.iter().any(|s| &s.signer_id == signer_id)
    }

    /// Signer ids that have signed so far
    pub fn signers(&self) -> Vec<&AccountId> {
        self.collected_signatures.iter().map(|s| &s.signer_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(signer: &str) -> CollectedSignature {
        CollectedSignature {
            signer_id: AccountId::new(signer).unwrap(),
            public_key: format!("pk_{}", signer),
            signature: format!("sig_{}", signer),
            signed_at: Utc::now(),
        }
    }

    #[test]
    fn test_proposal_creation() {
        let proposal = SignatureProposal::new(1, "hash".to_string(), 2, 24);

        assert!(proposal.id.starts_with("MSIG-"));
        assert_eq!(proposal.required_signatures, 2);
        assert_eq!(proposal.status, ProposalStatus::Open);
        assert_eq!(proposal.signatures_collected(), 0);
        assert!(proposal.is_live());
    }

    #[test]
    fn test_signatures_remaining() {
        let mut proposal = SignatureProposal::new(1, "hash".to_string(), 2, 24);

        assert_eq!(proposal.signatures_remaining(), 2);
        assert!(!proposal.has_enough_signatures());

        assert!(proposal.add_signature(sig("operator1")));
        assert_eq!(proposal.signatures_remaining(), 1);

        assert!(proposal.add_signature(sig("operator2")));
        assert_eq!(proposal.signatures_remaining(), 0);
        assert!(proposal.has_enough_signatures());
    }

    #[test]
    fn test_duplicate_signature_rejected() {
        let mut proposal = SignatureProposal::new(1, "hash".to_string(), 2, 24);

        assert!(proposal.add_signature(sig("operator1")));
        assert!(!proposal.add_signature(sig("operator1")));
        assert_eq!(proposal.signatures_collected(), 1);
    }

    #[test]
    fn test_zero_hour_expiry_is_expired() {
        let proposal = SignatureProposal::new(1, "hash".to_string(), 1, 0);
        assert!(proposal.is_expired());
        assert!(!proposal.is_live());
    }

    #[test]
    fn test_signers_list() {
        let mut proposal = SignatureProposal::new(1, "hash".to_string(), 3, 24);
        proposal.add_signature(sig("alice"));
        proposal.add_signature(sig("bob"));

        let signers: Vec<&str> = proposal.signers().iter().map(|s| s.as_str()).collect();
        assert_eq!(signers, vec!["alice", "bob"]);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(ProposalStatus::Open.as_str(), "open");
        assert_eq!(ProposalStatus::parse("expired"), Some(ProposalStatus::Expired));
        assert_eq!(ProposalStatus::parse("invalid"), None);
    }
}
