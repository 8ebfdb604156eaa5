//! Economy and chance-resolution engine.
//!
//! This crate contains the rules that move coins between accounts: the
//! wallet ledger, the randomized payout resolvers (slots, prize wheel,
//! lucky gifts), the gift-combo aggregator, the gift dispatch orchestrator,
//! and the agency bulk-recharge protocol. Everything here is in-process;
//! durability is delegated to a [`store::Store`] collaborator and writes
//! are optimistic (apply locally, confirm or compensate remotely).

pub mod agency;
pub mod combo;
pub mod dispatch;
pub mod ledger;
pub mod resolver;
pub mod store;

mod error;

pub use agency::TransferResult;
pub use combo::{Combo, ComboSnapshot, ComboTicker};
pub use dispatch::{DispatchResult, Dispatcher, RoomContext};
pub use error::{EngineError, Result};
pub use ledger::Ledger;
pub use resolver::{SlotSpin, SpinOutcome, WheelSpin};
pub use store::{Store, StoreError};

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
