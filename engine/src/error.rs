use sahra_types::AccountId;
use thiserror::Error;

use crate::store::StoreError;

/// Error taxonomy for engine operations.
///
/// `InsufficientFunds` and `InsufficientAgencyFunds` are recoverable and
/// user-facing; both guarantee that no balance was mutated. `Config` is
/// fatal to the triggering operation only and is raised before any debit.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },
    #[error("insufficient agency funds: need {required}, have {available}")]
    InsufficientAgencyFunds { required: u64, available: u64 },
    #[error("account {0} has no agent privilege")]
    NotAnAgent(AccountId),
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),
    #[error("invalid configuration: {0}")]
    Config(&'static str),
    #[error("invalid bet: {0}")]
    InvalidBet(&'static str),
    #[error("invalid transfer: {0}")]
    InvalidTransfer(&'static str),
    #[error("item already owned: {0}")]
    AlreadyOwned(String),
    #[error("remote persistence failed: {0}")]
    Remote(#[from] StoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
