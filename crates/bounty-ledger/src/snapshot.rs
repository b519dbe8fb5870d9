use crate::error::{BountyError, Result};
use crate::genesis::GenesisConfig;
use crate::ledger::Ledger;
use crate::store::{BountyStore, SubmissionStore};
use crate::supply::SupplyMetrics;
use crate::types::{Bounty, BountyStatus, Submission, SubmissionStatus};
use bounty_types::{AccountAddress, TokenAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serializable image of the full contract state.
///
/// Records are kept in creation order so that restoring rebuilds every index with the
/// same ordering the live contract had.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSnapshot {
    pub version: u32,
    pub total_supply: TokenAmount,
    pub balances: Vec<(AccountAddress, TokenAmount)>,
    pub bounties: Vec<Bounty>,
    pub submissions: Vec<Submission>,
    pub next_event_seq: u64,
    pub taken_at: DateTime<Utc>,
}

impl ContractSnapshot {
    pub const VERSION: u32 = 1;
}

/// Stores and ledger rebuilt from a snapshot, already checked for consistency.
pub(crate) struct RestoredState {
    pub ledger: Ledger,
    pub bounties: BountyStore,
    pub submissions: SubmissionStore,
    pub total_supply: TokenAmount,
}

pub(crate) fn restore(snapshot: &ContractSnapshot) -> Result<RestoredState> {
    if snapshot.version != ContractSnapshot::VERSION {
        return Err(BountyError::Invariant(format!(
            "unsupported snapshot version {} (expected {})",
            snapshot.version,
            ContractSnapshot::VERSION
        )));
    }

    let mut ledger = Ledger::new();
    GenesisConfig::new(snapshot.balances.clone())
        .seed(&mut ledger)
        .map_err(|e| BountyError::Invariant(format!("snapshot balances: {}", e)))?;

    let mut bounties = BountyStore::new();
    for bounty in &snapshot.bounties {
        if bounty.id.is_zero() || bounty.escrowed_amount.is_zero() {
            return Err(BountyError::Invariant(format!(
                "snapshot bounty {} has a zero id or amount",
                bounty.id
            )));
        }
        bounties
            .insert(bounty.clone())
            .map_err(|e| BountyError::Invariant(format!("snapshot bounties: {}", e)))?;
    }

    let mut submissions = SubmissionStore::new();
    for submission in &snapshot.submissions {
        if submission.id.is_zero() || !bounties.contains(&submission.bounty_id) {
            return Err(BountyError::Invariant(format!(
                "snapshot submission {} has a zero id or unknown bounty {}",
                submission.id, submission.bounty_id
            )));
        }
        submissions
            .insert(submission.clone())
            .map_err(|e| BountyError::Invariant(format!("snapshot submissions: {}", e)))?;
    }

    check_settlements(&bounties, &submissions)?;

    SupplyMetrics::compute(snapshot.total_supply, &ledger, &bounties)?.check_conservation()?;

    Ok(RestoredState {
        ledger,
        bounties,
        submissions,
        total_supply: snapshot.total_supply,
    })
}

/// Every settled bounty names exactly one accepted submission of its own, and every
/// open bounty has none.
fn check_settlements(bounties: &BountyStore, submissions: &SubmissionStore) -> Result<()> {
    for bounty in bounties.iter() {
        let accepted: Vec<_> = submissions
            .records_for_bounty(&bounty.id)
            .filter(|s| s.status == SubmissionStatus::Accepted)
            .map(|s| s.id)
            .collect();

        let consistent = match (bounty.status, bounty.accepted_submission) {
            (BountyStatus::Open, None) => accepted.is_empty(),
            (BountyStatus::Settled, Some(winner)) => accepted == [winner],
            _ => false,
        };

        if !consistent {
            return Err(BountyError::Invariant(format!(
                "bounty {} is {:?} with accepted submission {:?} but {} accepted records",
                bounty.id,
                bounty.status,
                bounty.accepted_submission,
                accepted.len()
            )));
        }
    }
    Ok(())
}
