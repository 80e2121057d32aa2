//! Zenopay Payout Dispatcher
//!
//! Sends approved payout requests to their destination chain through a
//! `PayoutBridge`. Ships a `MockBridge` for tests and local runs; real
//! bridges implement the same trait.

mod dispatcher;
mod error;
mod mock;
mod types;

pub use dispatcher::PayoutDispatcher;
pub use error::{BridgeError, DispatchError};
pub use mock::MockBridge;
pub use types::{PayoutBridge, PayoutInstruction, TxHandle};
