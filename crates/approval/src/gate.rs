//! Approval gate - decides whether a request may be forwarded to payout

use crate::config::{ApprovalConfig, MultisigConfig, MultisigWallet};
use crate::error::{ApprovalError, SignatureError};
use crate::proposal::{ProposalStatus, SignatureProposal};
use crate::signature::{CollectedSignature, SignablePayload};
use crate::store::ProposalStore;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use zenopay_core::{Amount, Caller, Role};
use zenopay_ledger::{PayoutRequest, RequestId, RequestLedger, RequestStatus};

/// Result of an `approve` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Request moved to Approved
    Approved,
    /// High-value request routed to the multisig; still not approved
    AwaitingSignatures {
        proposal_id: String,
        collected: usize,
        required: usize,
    },
}

/// Result of a `sign` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    pub proposal_id: String,
    pub collected: usize,
    pub required: usize,
    /// The threshold was reached and the request is now Approved
    pub approved: bool,
}

/// Admin and N-of-M multisig approval of payout requests.
///
/// The gate never owns requests: every status change is applied through
/// the guarded transitions of the `RequestLedger` it is handed.
pub struct ApprovalGate {
    store: ProposalStore,
    config: ApprovalConfig,
    multisig: Option<(MultisigConfig, MultisigWallet)>,
}

impl ApprovalGate {
    pub fn new(store: ProposalStore, config: ApprovalConfig) -> Self {
        Self {
            store,
            config,
            multisig: None,
        }
    }

    pub fn with_store(store: ProposalStore) -> Self {
        Self::new(store, ApprovalConfig::default())
    }

    pub fn config(&self) -> &ApprovalConfig {
        &self.config
    }

    // === Multisig configuration ===

    /// Admin-only: install the multisig wallet and high-value threshold
    pub fn configure_multisig(
        &mut self,
        caller: &Caller,
        wallet: MultisigWallet,
        high_value_threshold: Amount,
    ) -> Result<&MultisigConfig, ApprovalError> {
        caller.require(Role::Admin)?;

        if high_value_threshold.is_zero() {
            return Err(ApprovalError::InvalidMultisig(
                "high value threshold must be positive".to_string(),
            ));
        }

        let config = MultisigConfig {
            multisig_address: wallet.address.clone(),
            high_value_threshold,
        };

        info!(
            multisig = %config.multisig_address,
            threshold = %config.high_value_threshold,
            required = wallet.required_signatures,
            owners = wallet.total_signers(),
            "Multisig configured"
        );

        self.set_multisig(config, wallet);
        self.multisig_config().ok_or(ApprovalError::MultisigNotConfigured)
    }

    /// Install a multisig without an access check (journal replay)
    pub fn set_multisig(&mut self, config: MultisigConfig, wallet: MultisigWallet) {
        self.multisig = Some((config, wallet));
    }

    /// Current multisig, kept by callers that may need to roll back
    pub fn snapshot_multisig(&self) -> Option<(MultisigConfig, MultisigWallet)> {
        self.multisig.clone()
    }

    pub fn restore_multisig(&mut self, multisig: Option<(MultisigConfig, MultisigWallet)>) {
        self.multisig = multisig;
    }

    pub fn multisig_config(&self) -> Option<&MultisigConfig> {
        self.multisig.as_ref().map(|(config, _)| config)
    }

    pub fn multisig_wallet(&self) -> Option<&MultisigWallet> {
        self.multisig.as_ref().map(|(_, wallet)| wallet)
    }

    /// High value: already routed to the multisig, or at/above the threshold
    pub fn requires_multisig(&self, request: &PayoutRequest) -> bool {
        request.requires_multisig
            || self
                .multisig_config()
                .map(|config| config.is_high_value(request.amount))
                .unwrap_or(false)
    }

    /// The payload multisig owners sign for `request`
    pub fn signable_payload(&self, request: &PayoutRequest) -> Result<SignablePayload, ApprovalError> {
        let config = self.multisig_config().ok_or(ApprovalError::MultisigNotConfigured)?;
        Ok(SignablePayload::from_request(request, &config.multisig_address))
    }

    // === Transitions ===

    /// Approve a request.
    ///
    /// Standard requests need `Admin` and move straight to Approved.
    /// High-value requests need `Admin` or `Signer` and open a signature
    /// proposal instead; the request stays unapproved until the owners sign.
    /// A request approved without signatures that has since become high
    /// value is moved back to AwaitingSignatures the same way.
    pub fn approve(
        &self,
        ledger: &mut RequestLedger,
        caller: &Caller,
        id: RequestId,
        at: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        let request = ledger.get(id)?.clone();

        if self.requires_multisig(&request) {
            return self.open_proposal(ledger, caller, &request, at);
        }

        caller.require(Role::Admin)?;
        if !request.status.is_open() {
            return Err(ApprovalError::AlreadyProcessed {
                id,
                status: request.status,
            });
        }

        ledger.mark_approved(id, at)?;
        info!(request_id = id, approver = %caller.account, "Request approved");

        Ok(ApprovalOutcome::Approved)
    }

    fn open_proposal(
        &self,
        ledger: &mut RequestLedger,
        caller: &Caller,
        request: &PayoutRequest,
        at: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        caller.require_any(&[Role::Admin, Role::Signer])?;
        let id = request.id;

        match request.status {
            RequestStatus::Pending => {}
            RequestStatus::AwaitingSignatures => {
                // Only an expired proposal may be replaced
                match self.store.latest_for_request(id)? {
                    Some(previous) if previous.is_live() => {
                        debug!(request_id = id, proposal = %previous.id, "Proposal still open");
                        return Err(ApprovalError::AlreadyProcessed {
                            id,
                            status: request.status,
                        });
                    }
                    Some(mut previous) if previous.status == ProposalStatus::Open => {
                        previous.status = ProposalStatus::Expired;
                        self.store.save(&previous)?;
                        warn!(request_id = id, proposal = %previous.id, "Proposal expired, reopening");
                    }
                    _ => {}
                }
            }
            // Approved before the threshold covered it; signatures still needed
            RequestStatus::Approved if !request.requires_multisig => {
                warn!(request_id = id, "Approved request now above threshold, routing to multisig");
            }
            status => return Err(ApprovalError::AlreadyProcessed { id, status }),
        }

        let wallet = self.multisig_wallet().ok_or(ApprovalError::MultisigNotConfigured)?;
        let payload = self.signable_payload(request)?;
        let proposal = SignatureProposal::new(
            id,
            payload.digest(),
            wallet.required_signatures,
            self.config.proposal_expiry_hours,
        );

        self.store.save(&proposal)?;
        ledger.mark_awaiting_signatures(id, at)?;

        info!(
            request_id = id,
            proposal = %proposal.id,
            required = proposal.required_signatures,
            caller = %caller.account,
            "High-value request routed to multisig"
        );

        Ok(ApprovalOutcome::AwaitingSignatures {
            proposal_id: proposal.id,
            collected: 0,
            required: proposal.required_signatures as usize,
        })
    }

    /// Record one owner's signature; approves the request at the threshold
    pub fn sign(
        &self,
        ledger: &mut RequestLedger,
        caller: &Caller,
        id: RequestId,
        signature: CollectedSignature,
        at: DateTime<Utc>,
    ) -> Result<SignOutcome, ApprovalError> {
        caller.require(Role::Signer)?;

        if signature.signer_id != caller.account {
            return Err(ApprovalError::SignerMismatch {
                caller: caller.account.clone(),
                signer: signature.signer_id,
            });
        }

        let request = ledger.get(id)?.clone();
        match request.status {
            RequestStatus::AwaitingSignatures => {}
            RequestStatus::Pending => return Err(ApprovalError::NoOpenProposal(id)),
            status => return Err(ApprovalError::AlreadyProcessed { id, status }),
        }

        let wallet = self.multisig_wallet().ok_or(ApprovalError::MultisigNotConfigured)?;
        let owner = wallet
            .owner(&signature.signer_id)
            .ok_or_else(|| ApprovalError::NotAnOwner(signature.signer_id.clone()))?;

        if !owner.public_key.eq_ignore_ascii_case(&signature.public_key) {
            return Err(SignatureError::VerificationFailed {
                signer: signature.signer_id.to_string(),
                reason: "public key does not match the registered owner key".to_string(),
            }
            .into());
        }

        let mut proposal = self
            .store
            .latest_for_request(id)?
            .filter(|p| p.status == ProposalStatus::Open)
            .ok_or(ApprovalError::NoOpenProposal(id))?;

        if proposal.is_expired() {
            proposal.status = ProposalStatus::Expired;
            self.store.save(&proposal)?;
            return Err(ApprovalError::Expired(id));
        }

        let payload = self.signable_payload(&request)?;
        signature.verify(&payload.to_bytes())?;

        let signer = signature.signer_id.clone();
        if !proposal.add_signature(signature) {
            return Err(ApprovalError::DuplicateSignature(signer));
        }

        let approved = proposal.has_enough_signatures();
        if approved {
            proposal.status = ProposalStatus::Approved;
        }
        self.store.save(&proposal)?;

        info!(
            request_id = id,
            signer = %signer,
            collected = proposal.signatures_collected(),
            required = proposal.required_signatures,
            "Signature collected"
        );

        if approved {
            ledger.mark_approved(id, at)?;
            info!(request_id = id, proposal = %proposal.id, "Multisig threshold reached");
        }

        Ok(SignOutcome {
            collected: proposal.signatures_collected(),
            required: proposal.required_signatures as usize,
            proposal_id: proposal.id,
            approved,
        })
    }

    /// Admin-only: reject an open request and close its proposal
    pub fn reject(
        &self,
        ledger: &mut RequestLedger,
        caller: &Caller,
        id: RequestId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), ApprovalError> {
        caller.require(Role::Admin)?;

        let status = ledger.get(id)?.status;
        if !status.is_open() {
            return Err(ApprovalError::AlreadyProcessed { id, status });
        }

        if let Some(mut proposal) = self.store.latest_for_request(id)? {
            if proposal.status == ProposalStatus::Open {
                proposal.status = ProposalStatus::Rejected;
                proposal.rejection_reason = reason.clone();
                self.store.save(&proposal)?;
            }
        }

        ledger.mark_rejected(id, reason, at)?;
        info!(request_id = id, actor = %caller.account, "Request rejected");

        Ok(())
    }

    /// Fails for a high-value request whose signatures are not complete
    pub fn ensure_executable(&self, request: &PayoutRequest) -> Result<(), ApprovalError> {
        if !self.requires_multisig(request) {
            return Ok(());
        }

        let proposal = self.store.latest_for_request(request.id)?;
        match proposal {
            Some(p) if p.status == ProposalStatus::Approved && p.has_enough_signatures() => Ok(()),
            Some(p) => Err(ApprovalError::InsufficientSignatures {
                id: request.id,
                collected: p.signatures_collected(),
                required: p.required_signatures as usize,
            }),
            None => Err(ApprovalError::InsufficientSignatures {
                id: request.id,
                collected: 0,
                required: self
                    .multisig_wallet()
                    .map(|w| w.required_signatures as usize)
                    .unwrap_or(1),
            }),
        }
    }

    // === Queries ===

    pub fn proposal_for(&self, id: RequestId) -> Result<Option<SignatureProposal>, ApprovalError> {
        Ok(self.store.latest_for_request(id)?)
    }

    /// Every stored proposal of a request, kept by callers that may need to roll back
    pub fn snapshot_proposals(&self, id: RequestId) -> Result<Vec<SignatureProposal>, ApprovalError> {
        Ok(self.store.list_for_request(id)?)
    }

    /// Put the proposals of a request back to a snapshot
    pub fn restore_proposals(
        &self,
        id: RequestId,
        proposals: &[SignatureProposal],
    ) -> Result<(), ApprovalError> {
        Ok(self.store.replace_for_request(id, proposals)?)
    }

    pub fn list_open_proposals(&self) -> Result<Vec<SignatureProposal>, ApprovalError> {
        self.store.expire_old_proposals()?;
        Ok(self.store.list_by_status(ProposalStatus::Open)?)
    }

    pub fn get_stats(&self) -> Result<ApprovalStats, ApprovalError> {
        Ok(ApprovalStats {
            open: self.store.count_by_status(ProposalStatus::Open)?,
            approved: self.store.count_by_status(ProposalStatus::Approved)?,
            rejected: self.store.count_by_status(ProposalStatus::Rejected)?,
            expired: self.store.count_by_status(ProposalStatus::Expired)?,
        })
    }
}

/// Proposal counts by status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalStats {
    pub open: usize,
    pub approved: usize,
    pub rejected: usize,
    pub expired: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MultisigOwner;
    use crate::signature::{KeypairSigner, RequestSigner};
    use zenopay_core::{AccessError, AccountId, WalletAddress};

    const ETH: u128 = 1_000_000_000_000_000_000;
    const WALLET: &str = "0xabc0000000000000000000000000000000000001";

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    fn admin() -> Caller {
        Caller::new(account("admin"), [Role::Admin])
    }

    fn signer_caller(signer: &KeypairSigner) -> Caller {
        Caller::new(signer.signer_id().clone(), [Role::Signer])
    }

    fn owners(n: usize) -> Vec<KeypairSigner> {
        (1..=n)
            .map(|i| KeypairSigner::generate(account(&format!("owner{}", i))))
            .collect()
    }

    fn wallet(signers: &[KeypairSigner], required: u8) -> MultisigWallet {
        let owners = signers
            .iter()
            .map(|s| MultisigOwner {
                signer_id: s.signer_id().clone(),
                public_key: s.public_key_hex(),
            })
            .collect();
        MultisigWallet::new(
            WalletAddress::parse("0x5150000000000000000000000000000000000001").unwrap(),
            owners,
            required,
        )
        .unwrap()
    }

    fn gate() -> ApprovalGate {
        ApprovalGate::with_store(ProposalStore::in_memory().unwrap())
    }

    fn multisig_gate(signers: &[KeypairSigner], required: u8) -> ApprovalGate {
        let mut gate = gate();
        gate.configure_multisig(&admin(), wallet(signers, required), Amount::new(ETH))
            .unwrap();
        gate
    }

    fn submit(ledger: &mut RequestLedger, amount: u128) -> RequestId {
        ledger
            .submit(account("alice"), Amount::new(amount), 1, WALLET, Utc::now())
            .unwrap()
    }

    fn sign(
        gate: &ApprovalGate,
        ledger: &mut RequestLedger,
        signer: &KeypairSigner,
        id: RequestId,
    ) -> Result<SignOutcome, ApprovalError> {
        let payload = gate.signable_payload(ledger.get(id).unwrap()).unwrap();
        gate.sign(ledger, &signer_caller(signer), id, signer.sign(&payload), Utc::now())
    }

    #[test]
    fn test_standard_approval() {
        let gate = gate();
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, ETH / 10);

        let outcome = gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        assert_eq!(outcome, ApprovalOutcome::Approved);
        assert!(ledger.get(id).unwrap().approved());
        assert!(gate.ensure_executable(ledger.get(id).unwrap()).is_ok());
    }

    #[test]
    fn test_double_approval_fails() {
        let gate = gate();
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, ETH / 10);

        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();
        let result = gate.approve(&mut ledger, &admin(), id, Utc::now());

        assert!(matches!(
            result,
            Err(ApprovalError::AlreadyProcessed {
                status: RequestStatus::Approved,
                ..
            })
        ));
    }

    #[test]
    fn test_standard_approval_requires_admin() {
        let gate = gate();
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, ETH / 10);
        let signer = Caller::new(account("owner1"), [Role::Signer]);

        let result = gate.approve(&mut ledger, &signer, id, Utc::now());

        assert!(matches!(
            result,
            Err(ApprovalError::Unauthorized(AccessError::Unauthorized { .. }))
        ));
        assert_eq!(ledger.get(id).unwrap().status, RequestStatus::Pending);
    }

    #[test]
    fn test_unknown_request() {
        let gate = gate();
        let mut ledger = RequestLedger::new();
        let result = gate.approve(&mut ledger, &admin(), 42, Utc::now());
        assert!(matches!(result, Err(ApprovalError::Ledger(_))));
    }

    #[test]
    fn test_high_value_routes_to_multisig() {
        let signers = owners(3);
        let gate = multisig_gate(&signers, 2);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);

        let outcome = gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        assert!(matches!(
            outcome,
            ApprovalOutcome::AwaitingSignatures {
                collected: 0,
                required: 2,
                ..
            }
        ));
        let request = ledger.get(id).unwrap();
        assert_eq!(request.status, RequestStatus::AwaitingSignatures);
        assert!(!request.approved());
        assert!(matches!(
            gate.ensure_executable(request),
            Err(ApprovalError::InsufficientSignatures {
                collected: 0,
                required: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let signers = owners(1);
        let gate = multisig_gate(&signers, 1);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, ETH);

        assert!(gate.requires_multisig(ledger.get(id).unwrap()));
    }

    #[test]
    fn test_signatures_reach_threshold() {
        let signers = owners(3);
        let gate = multisig_gate(&signers, 2);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);
        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        let first = sign(&gate, &mut ledger, &signers[0], id).unwrap();
        assert!(!first.approved);
        assert_eq!(first.collected, 1);
        assert_eq!(ledger.get(id).unwrap().status, RequestStatus::AwaitingSignatures);

        let second = sign(&gate, &mut ledger, &signers[2], id).unwrap();
        assert!(second.approved);
        assert_eq!(ledger.get(id).unwrap().status, RequestStatus::Approved);
        assert!(gate.ensure_executable(ledger.get(id).unwrap()).is_ok());

        let stats = gate.get_stats().unwrap();
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.open, 0);
    }

    #[test]
    fn test_duplicate_signature_rejected() {
        let signers = owners(3);
        let gate = multisig_gate(&signers, 2);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);
        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        sign(&gate, &mut ledger, &signers[0], id).unwrap();
        let result = sign(&gate, &mut ledger, &signers[0], id);

        assert!(matches!(result, Err(ApprovalError::DuplicateSignature(_))));
    }

    #[test]
    fn test_non_owner_cannot_sign() {
        let signers = owners(2);
        let gate = multisig_gate(&signers, 1);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);
        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        let outsider = KeypairSigner::generate(account("mallory"));
        let result = sign(&gate, &mut ledger, &outsider, id);

        assert!(matches!(result, Err(ApprovalError::NotAnOwner(_))));
    }

    #[test]
    fn test_signature_for_other_caller_rejected() {
        let signers = owners(2);
        let gate = multisig_gate(&signers, 1);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);
        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        let payload = gate.signable_payload(ledger.get(id).unwrap()).unwrap();
        let signature = signers[0].sign(&payload);
        let result = gate.sign(&mut ledger, &signer_caller(&signers[1]), id, signature, Utc::now());

        assert!(matches!(result, Err(ApprovalError::SignerMismatch { .. })));
    }

    #[test]
    fn test_forged_signature_rejected() {
        let signers = owners(2);
        let gate = multisig_gate(&signers, 1);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);
        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        // Correct owner key, signature over a different request
        let mut other = ledger.get(id).unwrap().clone();
        other.amount = Amount::new(1);
        let forged = signers[0].sign(&gate.signable_payload(&other).unwrap());
        let result = gate.sign(&mut ledger, &signer_caller(&signers[0]), id, forged, Utc::now());

        assert!(matches!(result, Err(ApprovalError::InvalidSignature(_))));
        assert_eq!(ledger.get(id).unwrap().status, RequestStatus::AwaitingSignatures);
    }

    #[test]
    fn test_sign_before_proposal() {
        let signers = owners(1);
        let gate = multisig_gate(&signers, 1);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);

        let result = sign(&gate, &mut ledger, &signers[0], id);
        assert!(matches!(result, Err(ApprovalError::NoOpenProposal(_))));
    }

    #[test]
    fn test_reapprove_while_awaiting_fails() {
        let signers = owners(2);
        let gate = multisig_gate(&signers, 2);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);

        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();
        let result = gate.approve(&mut ledger, &admin(), id, Utc::now());

        assert!(matches!(result, Err(ApprovalError::AlreadyProcessed { .. })));
    }

    #[test]
    fn test_expired_proposal_can_be_reopened() {
        let signers = owners(1);
        let mut gate = ApprovalGate::new(
            ProposalStore::in_memory().unwrap(),
            ApprovalConfig {
                proposal_expiry_hours: 0,
            },
        );
        gate.configure_multisig(&admin(), wallet(&signers, 1), Amount::new(ETH))
            .unwrap();
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);

        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();
        let result = sign(&gate, &mut ledger, &signers[0], id);
        assert!(matches!(result, Err(ApprovalError::Expired(_))));

        let outcome = gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();
        assert!(matches!(outcome, ApprovalOutcome::AwaitingSignatures { .. }));
        assert_eq!(gate.get_stats().unwrap().expired, 1);
    }

    #[test]
    fn test_threshold_installed_after_standard_approval() {
        let signers = owners(2);
        let mut gate = gate();
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);
        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        gate.configure_multisig(&admin(), wallet(&signers, 2), Amount::new(ETH))
            .unwrap();
        assert!(matches!(
            gate.ensure_executable(ledger.get(id).unwrap()),
            Err(ApprovalError::InsufficientSignatures { collected: 0, required: 2, .. })
        ));

        let outcome = gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();
        assert!(matches!(outcome, ApprovalOutcome::AwaitingSignatures { required: 2, .. }));
        assert_eq!(ledger.get(id).unwrap().status, RequestStatus::AwaitingSignatures);

        sign(&gate, &mut ledger, &signers[0], id).unwrap();
        assert!(sign(&gate, &mut ledger, &signers[1], id).unwrap().approved);
        assert!(gate.ensure_executable(ledger.get(id).unwrap()).is_ok());

        // Once signed, approving again is a no-op error
        assert!(matches!(
            gate.approve(&mut ledger, &admin(), id, Utc::now()),
            Err(ApprovalError::AlreadyProcessed { status: RequestStatus::Approved, .. })
        ));
    }

    #[test]
    fn test_reject_pending() {
        let gate = gate();
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, ETH / 10);

        gate.reject(&mut ledger, &admin(), id, Some("insufficient docs".to_string()), Utc::now())
            .unwrap();

        let request = ledger.get(id).unwrap();
        assert_eq!(request.status, RequestStatus::Rejected);
        assert!(!request.approved());
        assert!(matches!(
            gate.approve(&mut ledger, &admin(), id, Utc::now()),
            Err(ApprovalError::AlreadyProcessed { .. })
        ));
    }

    #[test]
    fn test_reject_closes_proposal() {
        let signers = owners(2);
        let gate = multisig_gate(&signers, 2);
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 5 * ETH);
        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        gate.reject(&mut ledger, &admin(), id, None, Utc::now()).unwrap();

        let proposal = gate.proposal_for(id).unwrap().unwrap();
        assert_eq!(proposal.status, ProposalStatus::Rejected);
        assert!(matches!(
            sign(&gate, &mut ledger, &signers[0], id),
            Err(ApprovalError::AlreadyProcessed { .. })
        ));
    }

    #[test]
    fn test_cannot_reject_after_approval() {
        let gate = gate();
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, ETH / 10);
        gate.approve(&mut ledger, &admin(), id, Utc::now()).unwrap();

        let result = gate.reject(&mut ledger, &admin(), id, None, Utc::now());
        assert!(matches!(result, Err(ApprovalError::AlreadyProcessed { .. })));
    }

    #[test]
    fn test_configure_multisig_requires_admin() {
        let signers = owners(1);
        let mut gate = gate();
        let caller = Caller::new(account("owner1"), [Role::Signer]);

        let result = gate.configure_multisig(&caller, wallet(&signers, 1), Amount::new(ETH));
        assert!(matches!(result, Err(ApprovalError::Unauthorized(_))));
        assert!(gate.multisig_config().is_none());

        let result = gate.configure_multisig(&admin(), wallet(&signers, 1), Amount::ZERO);
        assert!(matches!(result, Err(ApprovalError::InvalidMultisig(_))));
    }
}
