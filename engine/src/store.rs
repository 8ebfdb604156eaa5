//! Abstract remote persistence collaborator.
//!
//! The engine treats the backing document store as shared mutable state
//! with no cross-client locking: every write is best effort, confirm or
//! compensate, and last-write-wins races between clients are an accepted
//! limitation. Change notifications arrive as full account snapshots.

use std::future::Future;

use sahra_types::{Account, AccountDelta, AccountId, TransferIntent};
use thiserror::Error;
use tokio::sync::broadcast;

/// Error surfaced by a store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable")]
    Unavailable,
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),
    #[error("commit rejected: {0}")]
    Rejected(&'static str),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Remote document store contract.
///
/// Futures are `Send` so commits can be driven from spawned tasks. None of
/// the methods implies synchronous durability.
pub trait Store: Clone + Send + Sync + 'static {
    /// Fetch one account document, `None` when absent.
    fn read_account(
        &self,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send;

    /// Persist a full account record (registration, cosmetic purchases).
    fn commit_account(&self, account: &Account)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Apply a balance delta to one account document.
    fn commit_delta(
        &self,
        id: &AccountId,
        delta: &AccountDelta,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Apply both legs of an agency transfer as a single all-or-nothing
    /// commit; either account untouched implies the other is too.
    fn commit_transfer(
        &self,
        intent: &TransferIntent,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribe to account snapshots pushed on every committed change.
    fn subscribe(&self) -> broadcast::Receiver<Account>;
}
