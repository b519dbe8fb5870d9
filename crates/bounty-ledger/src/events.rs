//! Journal of committed ledger transitions.
//!
//! Events are appended while the contract's write guard is held, so sequence numbers
//! follow commit order exactly. The journal keeps a bounded tail for polling clients;
//! live subscribers use the broadcast channel exposed by the contract.

use bounty_types::{AccountAddress, BountyId, SubmissionId, TokenAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LedgerEventKind {
    BountyCreated {
        bounty_id: BountyId,
        owner: AccountAddress,
        amount: TokenAmount,
    },
    SubmissionCreated {
        submission_id: SubmissionId,
        bounty_id: BountyId,
        submitter: AccountAddress,
    },
    SubmissionAccepted {
        submission_id: SubmissionId,
        bounty_id: BountyId,
        winner: AccountAddress,
        amount: TokenAmount,
    },
    SubmissionRejected {
        submission_id: SubmissionId,
        bounty_id: BountyId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: LedgerEventKind,
}

#[derive(Debug, Clone)]
pub struct EventJournal {
    events: VecDeque<LedgerEvent>,
    next_seq: u64,
    retention: usize,
}

impl EventJournal {
    pub fn new(retention: usize) -> Self {
        Self::starting_at(1, retention)
    }

    /// Resume numbering after a restore so sequence numbers never repeat.
    pub fn starting_at(next_seq: u64, retention: usize) -> Self {
        Self {
            events: VecDeque::new(),
            next_seq: next_seq.max(1),
            retention: retention.max(1),
        }
    }

    pub fn append(&mut self, kind: LedgerEventKind) -> LedgerEvent {
        let event = LedgerEvent {
            seq: self.next_seq,
            timestamp: Utc::now(),
            kind,
        };
        self.next_seq += 1;

        if self.events.len() == self.retention {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());
        event
    }

    /// Retained events with `seq > since`, oldest first.
    pub fn since(&self, since: u64) -> Vec<LedgerEvent> {
        self.events
            .iter()
            .filter(|e| e.seq > since)
            .cloned()
            .collect()
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
