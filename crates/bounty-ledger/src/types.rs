use bounty_types::{AccountAddress, BountyId, SubmissionId, TokenAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which record family an id refers to; used in error context and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Bounty,
    Submission,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Bounty => f.write_str("bounty"),
            RecordKind::Submission => f.write_str("submission"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BountyStatus {
    Open,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounty {
    pub id: BountyId,
    pub owner: AccountAddress,
    /// Fixed at creation; held in escrow while the bounty is open.
    pub escrowed_amount: TokenAmount,
    pub status: BountyStatus,
    pub accepted_submission: Option<SubmissionId>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Bounty {
    pub fn new(id: BountyId, owner: AccountAddress, escrowed_amount: TokenAmount) -> Self {
        Self {
            id,
            owner,
            escrowed_amount,
            status: BountyStatus::Open,
            accepted_submission: None,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == BountyStatus::Open
    }

    /// Amount still locked for this bounty: the full escrow while open, nothing once settled.
    pub fn held_escrow(&self) -> TokenAmount {
        match self.status {
            BountyStatus::Open => self.escrowed_amount,
            BountyStatus::Settled => TokenAmount::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub bounty_id: BountyId,
    pub submitter: AccountAddress,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn new(id: SubmissionId, bounty_id: BountyId, submitter: AccountAddress) -> Self {
        Self {
            id,
            bounty_id,
            submitter,
            status: SubmissionStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }
}
