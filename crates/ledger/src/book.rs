//! Request ledger - owns every payout request and guards its transitions

use crate::error::LedgerError;
use crate::request::{PayoutRequest, RequestId, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use zenopay_core::{AccessError, AccountId, Amount, ChainId, Role, WalletAddress};

/// A registered contributor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorProfile {
    pub account: AccountId,
    /// Payroll tier assigned by the admin
    pub tier: u8,
    pub registered_at: DateTime<Utc>,
}

/// In-memory request table.
///
/// Every mutation goes through one of the `mark_*` methods so that the
/// state machine is enforced in a single place.
#[derive(Debug, Clone)]
pub struct RequestLedger {
    requests: BTreeMap<RequestId, PayoutRequest>,
    contributors: HashMap<AccountId, ContributorProfile>,
    next_id: RequestId,
    require_registration: bool,
}

impl RequestLedger {
    pub fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            contributors: HashMap::new(),
            next_id: 1,
            require_registration: false,
        }
    }

    /// Only registered contributors may submit
    pub fn with_registration_required(mut self, required: bool) -> Self {
        self.require_registration = required;
        self
    }

    pub fn registration_required(&self) -> bool {
        self.require_registration
    }

    // === Contributors ===

    /// Register (or re-tier) a contributor
    pub fn register_contributor(
        &mut self,
        account: AccountId,
        tier: u8,
        at: DateTime<Utc>,
    ) -> &ContributorProfile {
        let profile = self
            .contributors
            .entry(account.clone())
            .or_insert_with(|| ContributorProfile {
                account,
                tier,
                registered_at: at,
            });
        profile.tier = tier;
        profile
    }

    pub fn is_contributor(&self, account: &AccountId) -> bool {
        self.contributors.contains_key(account)
    }

    pub fn contributor(&self, account: &AccountId) -> Option<&ContributorProfile> {
        self.contributors.get(account)
    }

    pub fn contributors(&self) -> Vec<&ContributorProfile> {
        let mut list: Vec<_> = self.contributors.values().collect();
        list.sort_by(|a, b| a.account.cmp(&b.account));
        list
    }

    // === Requests ===

    /// Record a new payout request and return its id
    pub fn submit(
        &mut self,
        requester: AccountId,
        amount: Amount,
        target_chain_id: u64,
        target_wallet: &str,
        at: DateTime<Utc>,
    ) -> Result<RequestId, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }

        let target_chain = ChainId::try_from(target_chain_id)
            .map_err(|e| LedgerError::InvalidRequest(e.to_string()))?;

        let target_wallet = WalletAddress::parse(target_wallet)
            .map_err(|e| LedgerError::InvalidRequest(format!("target wallet: {}", e)))?;

        if self.require_registration && !self.is_contributor(&requester) {
            return Err(AccessError::Unauthorized {
                account: requester,
                required: Role::Contributor.to_string(),
            }
            .into());
        }

        let id = self.next_id;
        let request = PayoutRequest::new(id, requester, amount, target_chain, target_wallet, at);
        self.requests.insert(id, request);
        self.next_id += 1;

        Ok(id)
    }

    /// Re-insert a request read back from the journal
    pub fn restore(&mut self, request: PayoutRequest) -> Result<(), LedgerError> {
        if request.id != self.next_id {
            return Err(LedgerError::OutOfOrder {
                id: request.id,
                expected: self.next_id,
            });
        }
        self.next_id = request.id + 1;
        self.requests.insert(request.id, request);
        Ok(())
    }

    pub fn get(&self, id: RequestId) -> Result<&PayoutRequest, LedgerError> {
        self.requests.get(&id).ok_or(LedgerError::NotFound(id))
    }

    pub fn list(&self) -> Vec<&PayoutRequest> {
        self.requests.values().collect()
    }

    pub fn list_by_status(&self, status: RequestStatus) -> Vec<&PayoutRequest> {
        self.requests
            .values()
            .filter(|r| r.status == status)
            .collect()
    }

    pub fn requests_by(&self, requester: &AccountId) -> Vec<&PayoutRequest> {
        self.requests
            .values()
            .filter(|r| &r.requester == requester)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Id the next submission will receive
    pub fn next_id(&self) -> RequestId {
        self.next_id
    }

    // === Transitions ===

    /// Route a high-value request to the multisig flow.
    ///
    /// Also accepted while already awaiting signatures (proposal re-opened)
    /// and for a request approved without signatures that is not yet paid
    /// out (a multisig threshold was installed after the approval).
    pub fn mark_awaiting_signatures(
        &mut self,
        id: RequestId,
        at: DateTime<Utc>,
    ) -> Result<&PayoutRequest, LedgerError> {
        let request = self.get_mut(id)?;
        let reroute = request.status == RequestStatus::Approved && !request.requires_multisig;
        if !request.status.is_open() && !reroute {
            return Err(LedgerError::AlreadyProcessed {
                id,
                status: request.status,
            });
        }
        request.requires_multisig = true;
        request.transition(RequestStatus::AwaitingSignatures, at);
        Ok(request)
    }

    pub fn mark_approved(
        &mut self,
        id: RequestId,
        at: DateTime<Utc>,
    ) -> Result<&PayoutRequest, LedgerError> {
        let request = self.get_mut(id)?;
        if !request.status.is_open() {
            return Err(LedgerError::AlreadyProcessed {
                id,
                status: request.status,
            });
        }
        request.transition(RequestStatus::Approved, at);
        Ok(request)
    }

    pub fn mark_rejected(
        &mut self,
        id: RequestId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<&PayoutRequest, LedgerError> {
        let request = self.get_mut(id)?;
        if !request.status.is_open() {
            return Err(LedgerError::AlreadyProcessed {
                id,
                status: request.status,
            });
        }
        request.rejection_reason = reason;
        request.transition(RequestStatus::Rejected, at);
        Ok(request)
    }

    pub fn mark_executed(
        &mut self,
        id: RequestId,
        payout_tx: String,
        at: DateTime<Utc>,
    ) -> Result<&PayoutRequest, LedgerError> {
        let request = self.get_mut(id)?;
        match request.status {
            RequestStatus::Approved => {}
            RequestStatus::Executed => return Err(LedgerError::AlreadyExecuted(id)),
            _ => return Err(LedgerError::NotApproved(id)),
        }
        request.payout_tx = Some(payout_tx);
        request.transition(RequestStatus::Executed, at);
        Ok(request)
    }

    fn get_mut(&mut self, id: RequestId) -> Result<&mut PayoutRequest, LedgerError> {
        self.requests.get_mut(&id).ok_or(LedgerError::NotFound(id))
    }
}

impl Default for RequestLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xabc0000000000000000000000000000000000001";

    fn alice() -> AccountId {
        AccountId::new("0xalice").unwrap()
    }

    fn submit(ledger: &mut RequestLedger, amount: u128) -> RequestId {
        ledger
            .submit(alice(), Amount::new(amount), 1, WALLET, Utc::now())
            .unwrap()
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut ledger = RequestLedger::new();
        assert_eq!(submit(&mut ledger, 10), 1);
        assert_eq!(submit(&mut ledger, 20), 2);
        assert_eq!(submit(&mut ledger, 30), 3);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.next_id(), 4);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut ledger = RequestLedger::new();
        let result = ledger.submit(alice(), Amount::ZERO, 1, WALLET, Utc::now());
        assert!(matches!(result, Err(LedgerError::InvalidRequest(_))));
        assert!(ledger.is_empty());
        assert_eq!(ledger.next_id(), 1);
    }

    #[test]
    fn test_empty_wallet_rejected() {
        let mut ledger = RequestLedger::new();
        let result = ledger.submit(alice(), Amount::new(1), 1, "  ", Utc::now());
        assert!(matches!(result, Err(LedgerError::InvalidRequest(_))));
    }

    #[test]
    fn test_zero_chain_rejected() {
        let mut ledger = RequestLedger::new();
        let result = ledger.submit(alice(), Amount::new(1), 0, WALLET, Utc::now());
        assert!(matches!(result, Err(LedgerError::InvalidRequest(_))));
    }

    #[test]
    fn test_registration_required() {
        let mut ledger = RequestLedger::new().with_registration_required(true);
        let result = ledger.submit(alice(), Amount::new(1), 1, WALLET, Utc::now());
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));

        ledger.register_contributor(alice(), 1, Utc::now());
        assert!(ledger.submit(alice(), Amount::new(1), 1, WALLET, Utc::now()).is_ok());
    }

    #[test]
    fn test_register_contributor_updates_tier() {
        let mut ledger = RequestLedger::new();
        ledger.register_contributor(alice(), 1, Utc::now());
        ledger.register_contributor(alice(), 3, Utc::now());
        assert_eq!(ledger.contributor(&alice()).unwrap().tier, 3);
        assert_eq!(ledger.contributors().len(), 1);
    }

    #[test]
    fn test_get_unknown() {
        let ledger = RequestLedger::new();
        assert_eq!(ledger.get(42).unwrap_err(), LedgerError::NotFound(42));
    }

    #[test]
    fn test_approve_then_execute() {
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 100);

        ledger.mark_approved(id, Utc::now()).unwrap();
        let req = ledger.mark_executed(id, "0xtx".to_string(), Utc::now()).unwrap();

        assert!(req.executed());
        assert!(req.approved());
        assert_eq!(req.payout_tx.as_deref(), Some("0xtx"));
    }

    #[test]
    fn test_double_approval_rejected() {
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 100);

        ledger.mark_approved(id, Utc::now()).unwrap();
        let err = ledger.mark_approved(id, Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyProcessed { status: RequestStatus::Approved, .. }));
    }

    #[test]
    fn test_reject_after_approval_fails() {
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 100);

        ledger.mark_approved(id, Utc::now()).unwrap();
        let err = ledger.mark_rejected(id, None, Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyProcessed { .. }));
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 100);

        ledger
            .mark_rejected(id, Some("insufficient docs".to_string()), Utc::now())
            .unwrap();

        assert!(matches!(
            ledger.mark_approved(id, Utc::now()),
            Err(LedgerError::AlreadyProcessed { status: RequestStatus::Rejected, .. })
        ));
        assert!(matches!(
            ledger.mark_executed(id, "0xtx".to_string(), Utc::now()),
            Err(LedgerError::NotApproved(_))
        ));
        let req = ledger.get(id).unwrap();
        assert!(!req.approved());
        assert_eq!(req.rejection_reason.as_deref(), Some("insufficient docs"));
    }

    #[test]
    fn test_execute_twice_fails() {
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 100);
        ledger.mark_approved(id, Utc::now()).unwrap();
        ledger.mark_executed(id, "0xtx".to_string(), Utc::now()).unwrap();

        assert_eq!(
            ledger.mark_executed(id, "0xtx2".to_string(), Utc::now()).unwrap_err(),
            LedgerError::AlreadyExecuted(id)
        );
    }

    #[test]
    fn test_awaiting_signatures_flow() {
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 100);

        let req = ledger.mark_awaiting_signatures(id, Utc::now()).unwrap();
        assert!(req.requires_multisig);
        assert!(!req.approved());

        // Not executable while awaiting signatures
        assert!(matches!(
            ledger.mark_executed(id, "0xtx".to_string(), Utc::now()),
            Err(LedgerError::NotApproved(_))
        ));

        ledger.mark_approved(id, Utc::now()).unwrap();
        assert!(ledger.get(id).unwrap().approved());
    }

    #[test]
    fn test_reroute_standard_approval_to_multisig() {
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 100);
        ledger.mark_approved(id, Utc::now()).unwrap();

        let req = ledger.mark_awaiting_signatures(id, Utc::now()).unwrap();
        assert_eq!(req.status, RequestStatus::AwaitingSignatures);
        assert!(req.requires_multisig);

        // A multisig approval is never routed again
        ledger.mark_approved(id, Utc::now()).unwrap();
        assert!(matches!(
            ledger.mark_awaiting_signatures(id, Utc::now()),
            Err(LedgerError::AlreadyProcessed { status: RequestStatus::Approved, .. })
        ));

        ledger.mark_executed(id, "0xtx".to_string(), Utc::now()).unwrap();
        assert!(matches!(
            ledger.mark_awaiting_signatures(id, Utc::now()),
            Err(LedgerError::AlreadyProcessed { status: RequestStatus::Executed, .. })
        ));
    }

    #[test]
    fn test_version_increments_per_transition() {
        let mut ledger = RequestLedger::new();
        let id = submit(&mut ledger, 100);
        assert_eq!(ledger.get(id).unwrap().version, 1);

        ledger.mark_awaiting_signatures(id, Utc::now()).unwrap();
        ledger.mark_approved(id, Utc::now()).unwrap();
        ledger.mark_executed(id, "0xtx".to_string(), Utc::now()).unwrap();
        assert_eq!(ledger.get(id).unwrap().version, 4);
    }

    #[test]
    fn test_restore_in_order() {
        let mut source = RequestLedger::new();
        let id = submit(&mut source, 100);
        let request = source.get(id).unwrap().clone();

        let mut replica = RequestLedger::new();
        replica.restore(request.clone()).unwrap();
        assert_eq!(replica.get(id).unwrap(), &request);
        assert_eq!(replica.next_id(), 2);

        assert!(matches!(
            replica.restore(request),
            Err(LedgerError::OutOfOrder { id: 1, expected: 2 })
        ));
    }

    #[test]
    fn test_filters() {
        let mut ledger = RequestLedger::new();
        let a = submit(&mut ledger, 1);
        submit(&mut ledger, 2);
        ledger
            .submit(AccountId::new("0xbob").unwrap(), Amount::new(3), 56, WALLET, Utc::now())
            .unwrap();

        ledger.mark_approved(a, Utc::now()).unwrap();

        assert_eq!(ledger.list_by_status(RequestStatus::Approved).len(), 1);
        assert_eq!(ledger.list_by_status(RequestStatus::Pending).len(), 2);
        assert_eq!(ledger.requests_by(&alice()).len(), 2);
        assert_eq!(ledger.list().len(), 3);
    }
}
