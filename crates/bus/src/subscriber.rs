//! Event subscriber trait for async event handling

use crate::error::BusError;
use crate::event::VaultEvent;
use async_trait::async_trait;
use tracing::info;

/// Trait for event subscribers
///
/// Subscribers observe committed changes; they never feed back into the
/// vault.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Get the subscriber name (for logging)
    fn name(&self) -> &str;

    async fn handle(&self, event: &VaultEvent) -> Result<(), BusError>;
}

/// Writes every event to the tracing log
pub struct LogSubscriber;

#[async_trait]
impl EventSubscriber for LogSubscriber {
    fn name(&self) -> &str {
        "log"
    }

    async fn handle(&self, event: &VaultEvent) -> Result<(), BusError> {
        match event {
            VaultEvent::PayoutSent {
                request_id,
                tx_hash,
                dest_chain,
                amount,
                ..
            } => info!(request_id, %tx_hash, %dest_chain, %amount, "PayoutSent"),
            VaultEvent::VoiceApproved {
                request_id,
                actor,
                transcript,
                ..
            } => info!(request_id, %actor, %transcript, "VoiceApproved"),
            other => info!(request_id = other.request_id(), "{}", other.name()),
        }
        Ok(())
    }
}
