//! Zenopay Event Bus - In-process async event distribution
//!
//! Delivers `PaymentRequested`, `PayoutSent`, `VoiceApproved` and the
//! approval lifecycle events to subscribers running on tokio tasks.
//! Events are notifications only; the journal remains the record.

pub mod channel;
pub mod error;
pub mod event;
pub mod subscriber;

pub use channel::{EventBus, DEFAULT_CAPACITY};
pub use error::BusError;
pub use event::VaultEvent;
pub use subscriber::{EventSubscriber, LogSubscriber};
