//! Payout dispatcher - the only path from Approved to Executed

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use zenopay_approval::ApprovalGate;
use zenopay_core::{Caller, Role};
use zenopay_ledger::{LedgerError, PayoutRequest, RequestId, RequestLedger, RequestStatus};

use crate::error::DispatchError;
use crate::types::{PayoutBridge, PayoutInstruction, TxHandle};

/// Forwards approved requests to a `PayoutBridge`.
///
/// Forwarding is split in three steps so callers can hold the ledger
/// mutably only around the checks and the commit:
/// 1. `prepare` - access and precondition checks, builds the instruction
/// 2. `send` - hands the instruction to the bridge
/// 3. `commit` - marks the request Executed with the bridge receipt
///
/// A failed `send` leaves the request Approved.
///
/// Payouts handed to the bridge whose outcome was never recorded are
/// tracked as in doubt; `prepare` refuses them until they are settled.
pub struct PayoutDispatcher {
    bridge: Arc<dyn PayoutBridge>,
    in_doubt: BTreeSet<RequestId>,
}

impl PayoutDispatcher {
    pub fn new(bridge: Arc<dyn PayoutBridge>) -> Self {
        Self {
            bridge,
            in_doubt: BTreeSet::new(),
        }
    }

    pub fn bridge(&self) -> &Arc<dyn PayoutBridge> {
        &self.bridge
    }

    /// Check that `id` may be forwarded by `caller`
    pub fn prepare(
        &self,
        ledger: &RequestLedger,
        gate: &ApprovalGate,
        caller: &Caller,
        id: RequestId,
    ) -> Result<PayoutInstruction, DispatchError> {
        caller.require_any(&[Role::Admin, Role::Signer])?;

        let request = ledger.get(id).map_err(|_| DispatchError::NotFound(id))?;

        if request.executed() {
            return Err(DispatchError::AlreadyExecuted(id));
        }

        if self.in_doubt.contains(&id) {
            return Err(DispatchError::InDoubt(id));
        }

        gate.ensure_executable(request)?;

        if request.status != RequestStatus::Approved {
            return Err(DispatchError::NotApproved(id));
        }

        Ok(PayoutInstruction::from_request(request))
    }

    /// Mark `id` as handed to the bridge with no recorded outcome yet
    pub fn begin(&mut self, id: RequestId) {
        self.in_doubt.insert(id);
    }

    /// Clear the in-doubt mark once the outcome is known
    pub fn settle(&mut self, id: RequestId) -> bool {
        self.in_doubt.remove(&id)
    }

    pub fn is_in_doubt(&self, id: RequestId) -> bool {
        self.in_doubt.contains(&id)
    }

    pub fn in_doubt(&self) -> Vec<RequestId> {
        self.in_doubt.iter().copied().collect()
    }

    /// Hand the instruction to the bridge
    pub async fn send(&self, instruction: &PayoutInstruction) -> Result<TxHandle, DispatchError> {
        let id = instruction.request_id;

        match self.bridge.send_payout(instruction).await {
            Ok(handle) => {
                info!(
                    request_id = id,
                    tx_hash = %handle.tx_hash,
                    dest_chain = %handle.dest_chain,
                    amount = %handle.amount,
                    bridge = %handle.bridge,
                    "Payout sent"
                );
                Ok(handle)
            }
            Err(source) => {
                warn!(request_id = id, error = %source, "Payout failed, request stays approved");
                Err(DispatchError::Transport { id, source })
            }
        }
    }

    /// Record the bridge receipt on the request
    pub fn commit<'a>(
        &self,
        ledger: &'a mut RequestLedger,
        handle: &TxHandle,
        id: RequestId,
        at: DateTime<Utc>,
    ) -> Result<&'a PayoutRequest, DispatchError> {
        ledger
            .mark_executed(id, handle.tx_hash.clone(), at)
            .map_err(|e| match e {
                LedgerError::NotFound(id) => DispatchError::NotFound(id),
                LedgerError::AlreadyExecuted(id) => DispatchError::AlreadyExecuted(id),
                LedgerError::NotApproved(id) => DispatchError::NotApproved(id),
                other => DispatchError::Ledger(other),
            })
    }

    /// `prepare`, `send` and `commit` in one call
    pub async fn forward(
        &self,
        ledger: &mut RequestLedger,
        gate: &ApprovalGate,
        caller: &Caller,
        id: RequestId,
    ) -> Result<TxHandle, DispatchError> {
        let instruction = self.prepare(ledger, gate, caller, id)?;
        let handle = self.send(&instruction).await?;
        self.commit(ledger, &handle, id, Utc::now())?;
        Ok(handle)
    }
}
