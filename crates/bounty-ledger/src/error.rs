use crate::types::RecordKind;
use bounty_types::{AccountAddress, ContentId, TokenAmount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BountyError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BountyError {
    #[error("Zero identifier supplied for {0}")]
    ZeroId(RecordKind),

    #[error("Invalid bounty amount: {0}")]
    InvalidAmount(TokenAmount),

    #[error("Insufficient funds for {account}: has {available}, needs {needed}")]
    InsufficientFunds {
        account: AccountAddress,
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("{kind} already exists: {id}")]
    DuplicateId { kind: RecordKind, id: ContentId },

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: ContentId },

    #[error("Unauthorized: {caller} does not own bounty {bounty_id}")]
    Unauthorized {
        caller: AccountAddress,
        bounty_id: ContentId,
    },

    #[error("Invalid {kind} state for {id}: expected {expected}, got {actual}")]
    InvalidState {
        kind: RecordKind,
        id: ContentId,
        expected: String,
        actual: String,
    },

    #[error("Balance overflow: {0}")]
    Overflow(String),

    #[error("Genesis error: {0}")]
    Genesis(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

/// Fieldless classification of [`BountyError`], stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ZeroId,
    InvalidAmount,
    InsufficientFunds,
    DuplicateId,
    NotFound,
    Unauthorized,
    InvalidState,
    Overflow,
    Genesis,
    Invariant,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ZeroId => "zero_id",
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::DuplicateId => "duplicate_id",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Overflow => "overflow",
            ErrorKind::Genesis => "genesis",
            ErrorKind::Invariant => "invariant",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BountyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BountyError::ZeroId(_) => ErrorKind::ZeroId,
            BountyError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            BountyError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            BountyError::DuplicateId { .. } => ErrorKind::DuplicateId,
            BountyError::NotFound { .. } => ErrorKind::NotFound,
            BountyError::Unauthorized { .. } => ErrorKind::Unauthorized,
            BountyError::InvalidState { .. } => ErrorKind::InvalidState,
            BountyError::Overflow(_) => ErrorKind::Overflow,
            BountyError::Genesis(_) => ErrorKind::Genesis,
            BountyError::Invariant(_) => ErrorKind::Invariant,
        }
    }

    /// Failures that come from caller input or authority rather than from a broken ledger.
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Overflow | ErrorKind::Genesis | ErrorKind::Invariant
        )
    }
}
