//! Broadcast event bus
//!
//! Publishing never blocks and never fails the caller: a slow subscriber
//! lags and skips events, it does not hold up vault operations.

use crate::event::VaultEvent;
use crate::subscriber::EventSubscriber;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default channel capacity
pub const DEFAULT_CAPACITY: usize = 256;

/// In-process pub/sub for `VaultEvent`s
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<VaultEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send to every current subscriber; returns how many received it
    pub fn publish(&self, event: VaultEvent) -> usize {
        let name = event.name();
        let request_id = event.request_id();

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event = name, request_id, receivers, "Event published");
                receivers
            }
            Err(_) => {
                debug!(event = name, request_id, "Event published with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Run `subscriber` on a tokio task until the bus is dropped
    pub fn spawn(&self, subscriber: Arc<dyn EventSubscriber>) -> JoinHandle<()> {
        let mut receiver = self.subscribe();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Err(e) = subscriber.handle(&event).await {
                            warn!(subscriber = subscriber.name(), error = %e, "Subscriber failed");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(subscriber = subscriber.name(), skipped, "Subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!(subscriber = subscriber.name(), "Subscriber stopped");
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use zenopay_core::AccountId;

    fn approved(id: u64) -> VaultEvent {
        VaultEvent::RequestApproved {
            request_id: id,
            approver: AccountId::new("admin").unwrap(),
            timestamp: Utc::now(),
        }
    }

    struct Collector {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl EventSubscriber for Collector {
        fn name(&self) -> &str {
            "collector"
        }

        async fn handle(&self, event: &VaultEvent) -> Result<(), BusError> {
            self.seen.lock().unwrap().push(event.request_id());
            Ok(())
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(approved(1)), 0);
    }

    #[tokio::test]
    async fn test_subscribe_receives_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        assert_eq!(bus.publish(approved(1)), 1);
        assert_eq!(bus.publish(approved(2)), 1);

        assert_eq!(rx.recv().await.unwrap().request_id(), 1);
        assert_eq!(rx.recv().await.unwrap().request_id(), 2);
    }

    #[tokio::test]
    async fn test_spawned_subscriber_runs_until_closed() {
        let bus = EventBus::new(8);
        let collector = Arc::new(Collector {
            seen: Mutex::new(Vec::new()),
        });

        let handle = bus.spawn(collector.clone());
        bus.publish(approved(1));
        bus.publish(approved(2));
        drop(bus);

        handle.await.unwrap();
        assert_eq!(*collector.seen.lock().unwrap(), vec![1, 2]);
    }
}
