//! Application context - wires everything together

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use zenopay_approval::{
    ApprovalConfig, ApprovalGate, ApprovalOutcome, ApprovalStats, CollectedSignature, MultisigConfig,
    MultisigWallet, ProposalStore, SignOutcome, SignablePayload, SignatureProposal,
};
use zenopay_audit::{entry, AuditAction, AuditEntry, AuditTrail, VoiceCommand};
use zenopay_bus::{EventBus, VaultEvent};
use zenopay_core::{AccountId, Amount, Caller, Role, NATIVE_DECIMALS};
use zenopay_dispatch::{MockBridge, PayoutBridge, PayoutDispatcher, TxHandle};
use zenopay_events::{EventReader, EventStore, JournalEntry, VaultRecord};
use zenopay_ledger::{
    ContributorProfile, LedgerError, PayoutRequest, RequestId, RequestLedger, RequestStatus,
};

use crate::config::VaultConfig;
use crate::error::VaultError;

/// Application context - owns the vault state and every component around it
pub struct AppContext {
    config: VaultConfig,
    ledger: RequestLedger,
    gate: ApprovalGate,
    dispatcher: PayoutDispatcher,
    audit: AuditTrail,
    event_store: EventStore,
    bus: EventBus,
    data_path: PathBuf,
    journal_path: PathBuf,
}

/// State restored when a journal append fails
struct Checkpoint {
    ledger: RequestLedger,
    /// Proposal rows of one request, when the operation may touch them
    proposals: Option<(RequestId, Vec<SignatureProposal>)>,
}

/// Mock bridge accepting exactly the configured chains
pub fn bridge_from_config(config: &VaultConfig) -> MockBridge {
    let bridge = MockBridge::new("mock-bridge");
    for chain in &config.supported_chains {
        bridge.add_chain(*chain);
    }
    bridge
}

impl AppContext {
    /// Open the vault at `data_path` with the default configuration
    pub fn new(data_path: impl AsRef<Path>) -> Result<Self, VaultError> {
        let config = VaultConfig::default();
        let bridge = Arc::new(bridge_from_config(&config));
        Self::with_config(data_path, config, bridge)
    }

    /// Open the vault, replaying the journal to rebuild state
    pub fn with_config(
        data_path: impl AsRef<Path>,
        config: VaultConfig,
        bridge: Arc<dyn PayoutBridge>,
    ) -> Result<Self, VaultError> {
        let data_path = data_path.as_ref().to_path_buf();
        let journal_path = data_path.join("journal");
        std::fs::create_dir_all(&journal_path)?;

        let store = ProposalStore::new(data_path.join("approvals.db"))
            .map_err(zenopay_approval::ApprovalError::from)?;
        let mut gate = ApprovalGate::new(
            store,
            ApprovalConfig {
                proposal_expiry_hours: config.proposal_expiry_hours,
            },
        );
        let mut ledger =
            RequestLedger::new().with_registration_required(config.require_registered_contributors);
        let mut dispatcher = PayoutDispatcher::new(bridge);

        // Journal is the source of truth
        let entries = EventReader::from_directory(&journal_path)?.read_verified()?;
        for entry in &entries {
            apply_entry(&mut ledger, &mut gate, &mut dispatcher, entry)?;
        }
        for id in dispatcher.in_doubt() {
            warn!(request_id = id, "Payout dispatched but never confirmed, resolve before forwarding");
        }

        let event_store = EventStore::new(&journal_path)?;
        let audit = AuditTrail::new(data_path.join("audit.jsonl"))?;
        let bus = EventBus::new(config.bus_capacity);

        info!(
            path = %data_path.display(),
            journal_entries = entries.len(),
            requests = ledger.len(),
            audit_entries = audit.len(),
            bridge = dispatcher.bridge().name(),
            "Vault opened"
        );

        Ok(Self {
            config,
            ledger,
            gate,
            dispatcher,
            audit,
            event_store,
            bus,
            data_path,
            journal_path,
        })
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            ledger: self.ledger.clone(),
            proposals: None,
        }
    }

    fn checkpoint_with_proposals(&self, id: RequestId) -> Result<Checkpoint, VaultError> {
        Ok(Checkpoint {
            ledger: self.ledger.clone(),
            proposals: Some((id, self.gate.snapshot_proposals(id)?)),
        })
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.ledger = checkpoint.ledger;
        if let Some((id, proposals)) = checkpoint.proposals {
            if let Err(e) = self.gate.restore_proposals(id, &proposals) {
                error!(request_id = id, error = %e, "Proposal rollback failed");
            }
        }
    }

    /// Journal `records`, restoring `checkpoint` if any append fails.
    ///
    /// State changes are applied to the ledger and proposal store first;
    /// nothing is visible to later calls unless the records made it to disk.
    fn commit(
        &mut self,
        records: Vec<VaultRecord>,
        checkpoint: Checkpoint,
        at: DateTime<Utc>,
    ) -> Result<(), VaultError> {
        for record in records {
            let kind = record.kind();
            if let Err(e) = self.event_store.append(record, at) {
                warn!(record = kind, error = %e, "Journal append failed, rolling back");
                self.rollback(checkpoint);
                return Err(e.into());
            }
        }
        Ok(())
    }

    // === Workflow ===

    /// Record a new payout request
    pub fn submit_request(
        &mut self,
        caller: &Caller,
        amount: Amount,
        target_chain_id: u64,
        target_wallet: &str,
    ) -> Result<RequestId, VaultError> {
        let now = Utc::now();
        let checkpoint = self.checkpoint();

        let id = self
            .ledger
            .submit(caller.account.clone(), amount, target_chain_id, target_wallet, now)?;
        let request = self.ledger.get(id)?.clone();

        self.commit(
            vec![VaultRecord::RequestSubmitted {
                request: request.clone(),
            }],
            checkpoint,
            now,
        )?;

        info!(
            request_id = id,
            requester = %request.requester,
            amount = %request.amount,
            chain = %request.target_chain,
            wallet = %request.target_wallet.short(),
            "Payout requested"
        );
        self.bus.publish(VaultEvent::payment_requested(&request));

        Ok(id)
    }

    /// Approve a request; high-value requests are routed to the multisig
    pub fn approve(&mut self, caller: &Caller, id: RequestId) -> Result<ApprovalOutcome, VaultError> {
        self.approve_with(caller, id, None)
    }

    fn approve_with(
        &mut self,
        caller: &Caller,
        id: RequestId,
        transcript: Option<&str>,
    ) -> Result<ApprovalOutcome, VaultError> {
        entry::validate(id, caller.account.as_str(), transcript)?;

        let now = Utc::now();
        let checkpoint = self.checkpoint_with_proposals(id)?;
        let outcome = self.gate.approve(&mut self.ledger, caller, id, now)?;

        let record = match &outcome {
            ApprovalOutcome::Approved => VaultRecord::RequestApproved {
                request_id: id,
                approver: caller.account.clone(),
                at: now,
            },
            ApprovalOutcome::AwaitingSignatures { .. } => {
                VaultRecord::AwaitingSignatures { request_id: id, at: now }
            }
        };
        self.commit(vec![record], checkpoint, now)?;

        self.audit
            .log_action(id, caller.account.as_str(), AuditAction::Approve, transcript, now)?;

        match &outcome {
            ApprovalOutcome::Approved => {
                info!(request_id = id, approver = %caller.account, "Request approved");
                self.bus.publish(VaultEvent::RequestApproved {
                    request_id: id,
                    approver: caller.account.clone(),
                    timestamp: now,
                });
            }
            ApprovalOutcome::AwaitingSignatures {
                proposal_id,
                collected,
                required,
            } => {
                info!(
                    request_id = id,
                    proposal = %proposal_id,
                    collected,
                    required,
                    "Request awaiting multisig signatures"
                );
            }
        }

        Ok(outcome)
    }

    /// Add a multisig owner's signature to a high-value request
    pub fn sign_request(
        &mut self,
        caller: &Caller,
        id: RequestId,
        signature: CollectedSignature,
    ) -> Result<SignOutcome, VaultError> {
        entry::validate(id, caller.account.as_str(), None)?;

        let now = Utc::now();
        let checkpoint = self.checkpoint_with_proposals(id)?;
        let outcome = self.gate.sign(&mut self.ledger, caller, id, signature, now)?;

        let mut records = vec![VaultRecord::SignatureCollected {
            request_id: id,
            signer: caller.account.clone(),
            at: now,
        }];
        if outcome.approved {
            records.push(VaultRecord::RequestApproved {
                request_id: id,
                approver: caller.account.clone(),
                at: now,
            });
        }
        self.commit(records, checkpoint, now)?;

        self.audit
            .log_action(id, caller.account.as_str(), AuditAction::Sign, None, now)?;

        self.bus.publish(VaultEvent::SignatureCollected {
            request_id: id,
            signer: caller.account.clone(),
            collected: outcome.collected,
            required: outcome.required,
            timestamp: now,
        });
        if outcome.approved {
            info!(request_id = id, proposal = %outcome.proposal_id, "Multisig threshold reached");
            self.bus.publish(VaultEvent::RequestApproved {
                request_id: id,
                approver: caller.account.clone(),
                timestamp: now,
            });
        }

        Ok(outcome)
    }

    /// Reject an open request; a blank reason is treated as none
    pub fn reject(
        &mut self,
        caller: &Caller,
        id: RequestId,
        reason: Option<&str>,
    ) -> Result<(), VaultError> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        entry::validate(id, caller.account.as_str(), reason)?;

        let now = Utc::now();
        let checkpoint = self.checkpoint_with_proposals(id)?;
        self.gate
            .reject(&mut self.ledger, caller, id, reason.map(String::from), now)?;

        self.commit(
            vec![VaultRecord::RequestRejected {
                request_id: id,
                actor: caller.account.clone(),
                reason: reason.map(String::from),
                at: now,
            }],
            checkpoint,
            now,
        )?;

        self.audit
            .log_action(id, caller.account.as_str(), AuditAction::Reject, reason, now)?;

        info!(request_id = id, actor = %caller.account, reason = reason.unwrap_or("-"), "Request rejected");
        self.bus.publish(VaultEvent::RequestRejected {
            request_id: id,
            actor: caller.account.clone(),
            reason: reason.map(String::from),
            timestamp: now,
        });

        Ok(())
    }

    /// Send an approved request through the bridge and mark it executed.
    ///
    /// A `PayoutDispatched` record is journaled before the bridge is
    /// called, so a payout whose outcome never reached the journal is in
    /// doubt after a restart and is not sent again until resolved.
    pub async fn forward_to_payout(
        &mut self,
        caller: &Caller,
        id: RequestId,
    ) -> Result<TxHandle, VaultError> {
        let instruction = self.dispatcher.prepare(&self.ledger, &self.gate, caller, id)?;

        let now = Utc::now();
        let intent = VaultRecord::PayoutDispatched {
            request_id: id,
            bridge: self.dispatcher.bridge().name().to_string(),
            at: now,
        };
        self.event_store.append(intent, now)?;
        self.dispatcher.begin(id);

        let handle = match self.dispatcher.send(&instruction).await {
            Ok(handle) => handle,
            Err(e) => {
                let now = Utc::now();
                let record = VaultRecord::PayoutFailed {
                    request_id: id,
                    reason: e.to_string(),
                    at: now,
                };
                match self.event_store.append(record, now) {
                    Ok(_) => {
                        self.dispatcher.settle(id);
                    }
                    Err(journal) => {
                        error!(request_id = id, error = %journal, "Payout failure not journaled; payout left in doubt");
                    }
                }
                return Err(e.into());
            }
        };

        let now = Utc::now();
        self.dispatcher.commit(&mut self.ledger, &handle, id, now)?;
        self.dispatcher.settle(id);

        let record = VaultRecord::PayoutExecuted {
            request_id: id,
            tx_hash: handle.tx_hash.clone(),
            bridge: handle.bridge.clone(),
            at: now,
        };
        if let Err(source) = self.event_store.append(record, now) {
            // Funds moved: the request stays executed here and in doubt on restart
            error!(
                request_id = id,
                tx_hash = %handle.tx_hash,
                error = %source,
                "Payout sent but not journaled"
            );
            return Err(VaultError::PayoutNotJournaled {
                id,
                tx_hash: handle.tx_hash,
                source,
            });
        }

        self.bus.publish(VaultEvent::PayoutSent {
            request_id: id,
            tx_hash: handle.tx_hash.clone(),
            dest_chain: handle.dest_chain,
            amount: handle.amount,
            timestamp: now,
        });

        Ok(handle)
    }

    /// Admin-only: settle a payout left in doubt.
    ///
    /// With the bridge transaction hash the request is recorded as
    /// executed; without one the payout is recorded as not sent and the
    /// request may be forwarded again.
    pub fn resolve_payout(
        &mut self,
        caller: &Caller,
        id: RequestId,
        tx_hash: Option<&str>,
    ) -> Result<RequestStatus, VaultError> {
        caller.require(Role::Admin)?;
        if !self.dispatcher.is_in_doubt(id) {
            return Err(VaultError::NotInDoubt(id));
        }

        let now = Utc::now();
        match tx_hash.map(str::trim).filter(|tx| !tx.is_empty()) {
            Some(tx_hash) => {
                let checkpoint = self.checkpoint();
                let request = self.ledger.mark_executed(id, tx_hash.to_string(), now)?.clone();
                self.commit(
                    vec![VaultRecord::PayoutExecuted {
                        request_id: id,
                        tx_hash: tx_hash.to_string(),
                        bridge: "manual".to_string(),
                        at: now,
                    }],
                    checkpoint,
                    now,
                )?;

                info!(request_id = id, tx_hash, actor = %caller.account, "Payout resolved as executed");
                self.bus.publish(VaultEvent::PayoutSent {
                    request_id: id,
                    tx_hash: tx_hash.to_string(),
                    dest_chain: request.target_chain,
                    amount: request.amount,
                    timestamp: now,
                });
            }
            None => {
                self.event_store.append(
                    VaultRecord::PayoutFailed {
                        request_id: id,
                        reason: format!("resolved as not sent by {}", caller.account),
                        at: now,
                    },
                    now,
                )?;
                info!(request_id = id, actor = %caller.account, "Payout resolved as not sent");
            }
        }

        self.dispatcher.settle(id);
        Ok(self.ledger.get(id)?.status)
    }

    /// Append a free-form action to the audit trail
    pub fn log_action(
        &mut self,
        request_id: RequestId,
        actor: &str,
        action: AuditAction,
        transcript: Option<&str>,
    ) -> Result<AuditEntry, VaultError> {
        let entry = self
            .audit
            .log_action(request_id, actor, action, transcript, Utc::now())?;
        Ok(entry.clone())
    }

    /// Approve from a spoken command such as "approve 0.5 eth to alice on base".
    ///
    /// The spoken token, amount and chain must match the request.
    pub fn voice_approve(
        &mut self,
        caller: &Caller,
        id: RequestId,
        transcript: &str,
    ) -> Result<ApprovalOutcome, VaultError> {
        let command = VoiceCommand::parse(transcript)?;
        let spoken_amount = command.amount_units()?;
        let spoken_chain = command.chain_id()?;

        let request = self.ledger.get(id)?;
        if !command.token_matches(request.target_chain) {
            return Err(VaultError::VoiceMismatch {
                id,
                field: "token",
                spoken: command.token.clone(),
                expected: request
                    .target_chain
                    .native_symbol()
                    .unwrap_or("native token")
                    .to_string(),
            });
        }
        if spoken_amount != request.amount {
            let expected = request
                .amount
                .to_units(NATIVE_DECIMALS)
                .map(|d| d.to_string())
                .unwrap_or_else(|| request.amount.to_string());
            return Err(VaultError::VoiceMismatch {
                id,
                field: "amount",
                spoken: format!("{} {}", command.amount, command.token),
                expected,
            });
        }
        if let Some(chain) = spoken_chain {
            if chain != request.target_chain {
                return Err(VaultError::VoiceMismatch {
                    id,
                    field: "chain",
                    spoken: chain.name(),
                    expected: request.target_chain.name(),
                });
            }
        }

        let transcript = transcript.trim();
        let outcome = self.approve_with(caller, id, Some(transcript))?;

        info!(request_id = id, actor = %caller.account, recipient = %command.recipient, "Voice approval");
        self.bus.publish(VaultEvent::VoiceApproved {
            request_id: id,
            actor: caller.account.clone(),
            transcript: transcript.to_string(),
            timestamp: Utc::now(),
        });

        Ok(outcome)
    }

    // === Administration ===

    /// Admin-only: register or re-tier a contributor
    pub fn register_contributor(
        &mut self,
        caller: &Caller,
        account: AccountId,
        tier: u8,
    ) -> Result<ContributorProfile, VaultError> {
        caller.require(Role::Admin)?;

        let now = Utc::now();
        let checkpoint = self.checkpoint();
        let profile = self.ledger.register_contributor(account.clone(), tier, now).clone();

        self.commit(
            vec![VaultRecord::ContributorRegistered { account, tier, at: now }],
            checkpoint,
            now,
        )?;

        info!(account = %profile.account, tier, "Contributor registered");
        Ok(profile)
    }

    /// Admin-only: install the multisig wallet and high-value threshold
    pub fn configure_multisig(
        &mut self,
        caller: &Caller,
        wallet: MultisigWallet,
        high_value_threshold: Amount,
    ) -> Result<MultisigConfig, VaultError> {
        let previous = self.gate.snapshot_multisig();
        let config = self
            .gate
            .configure_multisig(caller, wallet.clone(), high_value_threshold)?
            .clone();

        let record = VaultRecord::MultisigConfigured {
            config: config.clone(),
            wallet,
        };
        if let Err(e) = self.event_store.append(record, Utc::now()) {
            warn!(error = %e, "Journal append failed, restoring previous multisig");
            self.gate.restore_multisig(previous);
            return Err(e.into());
        }

        Ok(config)
    }

    /// Resolve the roles `account` holds in this vault
    pub fn caller_for(&self, account: AccountId) -> Caller {
        let mut roles = Vec::new();
        if self.config.is_admin(&account) {
            roles.push(Role::Admin);
        }
        let owner = self
            .gate
            .multisig_wallet()
            .map(|w| w.is_owner(&account))
            .unwrap_or(false);
        if owner || self.config.is_signer(&account) {
            roles.push(Role::Signer);
        }
        if self.ledger.is_contributor(&account) {
            roles.push(Role::Contributor);
        }
        Caller::new(account, roles)
    }

    // === Queries ===

    pub fn get_request(&self, id: RequestId) -> Result<&PayoutRequest, VaultError> {
        Ok(self.ledger.get(id)?)
    }

    pub fn list_requests(&self, status: Option<RequestStatus>) -> Vec<&PayoutRequest> {
        match status {
            Some(status) => self.ledger.list_by_status(status),
            None => self.ledger.list(),
        }
    }

    /// Requests dispatched to the bridge with no recorded outcome
    pub fn payouts_in_doubt(&self) -> Vec<RequestId> {
        self.dispatcher.in_doubt()
    }

    pub fn contributors(&self) -> Vec<&ContributorProfile> {
        self.ledger.contributors()
    }

    pub fn multisig_config(&self) -> Option<&MultisigConfig> {
        self.gate.multisig_config()
    }

    pub fn multisig_wallet(&self) -> Option<&MultisigWallet> {
        self.gate.multisig_wallet()
    }

    /// What multisig owners sign for request `id`
    pub fn signable_payload(&self, id: RequestId) -> Result<SignablePayload, VaultError> {
        let request = self.ledger.get(id)?;
        Ok(self.gate.signable_payload(request)?)
    }

    /// Latest signature proposal for a request
    pub fn proposal_for(&self, id: RequestId) -> Result<Option<SignatureProposal>, VaultError> {
        Ok(self.gate.proposal_for(id)?)
    }

    pub fn open_proposals(&self) -> Result<Vec<SignatureProposal>, VaultError> {
        Ok(self.gate.list_open_proposals()?)
    }

    pub fn approval_stats(&self) -> Result<ApprovalStats, VaultError> {
        Ok(self.gate.get_stats()?)
    }

    pub fn audit_entries(&self) -> &[AuditEntry] {
        self.audit.entries()
    }

    pub fn audit_entries_for(&self, id: RequestId) -> Vec<&AuditEntry> {
        self.audit.entries_for(id)
    }

    /// Re-verify the audit hash chain, returning the entry count
    pub fn verify_audit(&self) -> Result<usize, VaultError> {
        self.audit.verify()?;
        Ok(self.audit.len())
    }

    /// Re-read and verify the journal, returning the entry count
    pub fn verify_journal(&self) -> Result<usize, VaultError> {
        let entries = EventReader::from_directory(&self.journal_path)?.read_verified()?;
        Ok(entries.len())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn last_sequence(&self) -> u64 {
        self.event_store.last_sequence()
    }
}

/// Apply one journal entry to the in-memory state
fn apply_entry(
    ledger: &mut RequestLedger,
    gate: &mut ApprovalGate,
    dispatcher: &mut PayoutDispatcher,
    entry: &JournalEntry,
) -> Result<(), VaultError> {
    let result: Result<(), LedgerError> = match &entry.record {
        VaultRecord::RequestSubmitted { request } => ledger.restore(request.clone()),
        VaultRecord::ContributorRegistered { account, tier, at } => {
            ledger.register_contributor(account.clone(), *tier, *at);
            Ok(())
        }
        VaultRecord::MultisigConfigured { config, wallet } => {
            gate.set_multisig(config.clone(), wallet.clone());
            Ok(())
        }
        VaultRecord::AwaitingSignatures { request_id, at } => {
            ledger.mark_awaiting_signatures(*request_id, *at).map(|_| ())
        }
        // Signatures live in the proposal store
        VaultRecord::SignatureCollected { .. } => Ok(()),
        VaultRecord::RequestApproved { request_id, at, .. } => {
            ledger.mark_approved(*request_id, *at).map(|_| ())
        }
        VaultRecord::RequestRejected {
            request_id,
            reason,
            at,
            ..
        } => ledger.mark_rejected(*request_id, reason.clone(), *at).map(|_| ()),
        VaultRecord::PayoutDispatched { request_id, .. } => ledger.get(*request_id).map(|_| {
            dispatcher.begin(*request_id);
        }),
        VaultRecord::PayoutFailed { request_id, .. } => {
            dispatcher.settle(*request_id);
            Ok(())
        }
        VaultRecord::PayoutExecuted {
            request_id,
            tx_hash,
            at,
            ..
        } => ledger.mark_executed(*request_id, tx_hash.clone(), *at).map(|_| {
            dispatcher.settle(*request_id);
        }),
    };

    result.map_err(|source| VaultError::Replay {
        sequence: entry.sequence,
        source,
    })
}
