use crate::error::{BountyError, Result};
use crate::events::{EventJournal, LedgerEvent, LedgerEventKind};
use crate::genesis::GenesisConfig;
use crate::ledger::Ledger;
use crate::snapshot::{self, ContractSnapshot};
use crate::store::{BountyStore, SubmissionStore};
use crate::supply::SupplyMetrics;
use crate::types::{Bounty, BountyStatus, RecordKind, Submission, SubmissionStatus};
use bounty_types::{AccountAddress, BountyId, ContentId, SubmissionId, TokenAmount};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ContractConfig {
    /// Capacity of the live event channel; slow subscribers lag past this.
    pub event_channel_capacity: usize,
    /// Number of events kept for `events_since` polling.
    pub event_retention: usize,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: 1000,
            event_retention: 10_000,
        }
    }
}

/// Everything the contract owns. Only ever touched through the contract's lock.
struct ContractState {
    ledger: Ledger,
    bounties: BountyStore,
    submissions: SubmissionStore,
    journal: EventJournal,
    total_supply: TokenAmount,
}

/// The bounty escrow state machine.
///
/// One instance owns the ledger and both stores behind a single `RwLock`. Every mutating
/// entry point holds the write guard across its whole validate-then-commit step, so
/// transitions are linearizable and a failed call leaves no trace. Queries share the read
/// guard and always see a fully applied state. Cloning is cheap and shares the instance.
#[derive(Clone)]
pub struct BountyContract {
    state: Arc<RwLock<ContractState>>,
    events: broadcast::Sender<LedgerEvent>,
    config: ContractConfig,
}

impl Default for BountyContract {
    fn default() -> Self {
        Self::new()
    }
}

impl BountyContract {
    /// Empty contract with no seeded balances.
    pub fn new() -> Self {
        Self::with_config(ContractConfig::default())
    }

    pub fn with_config(config: ContractConfig) -> Self {
        Self::from_parts(
            Ledger::new(),
            BountyStore::new(),
            SubmissionStore::new(),
            TokenAmount::ZERO,
            1,
            config,
        )
    }

    pub fn with_genesis(genesis: &GenesisConfig) -> Result<Self> {
        Self::with_genesis_and_config(genesis, ContractConfig::default())
    }

    pub fn with_genesis_and_config(genesis: &GenesisConfig, config: ContractConfig) -> Result<Self> {
        let mut ledger = Ledger::new();
        let total_supply = genesis.apply(&mut ledger)?;
        Ok(Self::from_parts(
            ledger,
            BountyStore::new(),
            SubmissionStore::new(),
            total_supply,
            1,
            config,
        ))
    }

    /// Rebuild a contract from a snapshot, refusing inconsistent state.
    pub fn from_snapshot(snapshot: &ContractSnapshot, config: ContractConfig) -> Result<Self> {
        let restored = snapshot::restore(snapshot)?;

        info!(
            bounties = restored.bounties.len(),
            submissions = restored.submissions.len(),
            accounts = restored.ledger.account_count(),
            total_supply = restored.total_supply.units(),
            "📦 Contract restored from snapshot"
        );

        Ok(Self::from_parts(
            restored.ledger,
            restored.bounties,
            restored.submissions,
            restored.total_supply,
            snapshot.next_event_seq,
            config,
        ))
    }

    fn from_parts(
        ledger: Ledger,
        bounties: BountyStore,
        submissions: SubmissionStore,
        total_supply: TokenAmount,
        next_event_seq: u64,
        config: ContractConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let state = ContractState {
            ledger,
            bounties,
            submissions,
            journal: EventJournal::starting_at(next_event_seq, config.event_retention),
            total_supply,
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            events,
            config,
        }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    // ----------------------------------------------------------------------------------
    // Mutating entry points
    // ----------------------------------------------------------------------------------

    /// Escrow `amount` from `caller` under a new bounty `id`.
    pub async fn create_bounty(
        &self,
        id: BountyId,
        amount: TokenAmount,
        caller: AccountAddress,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        let result = state.create_bounty(id, amount, caller);
        match &result {
            Ok(()) => {
                info!(
                    bounty_id = %id.short(),
                    owner = %caller,
                    amount = amount.units(),
                    owner_balance = state.ledger.balance_of(&caller).units(),
                    "🔒 Bounty created, escrow locked"
                );
                self.emit(
                    &mut state,
                    LedgerEventKind::BountyCreated {
                        bounty_id: id,
                        owner: caller,
                        amount,
                    },
                );
            }
            Err(e) => debug!(
                bounty_id = %id.short(),
                caller = %caller,
                kind = %e.kind(),
                error = %e,
                "❌ create_bounty rejected"
            ),
        }
        result
    }

    pub async fn create_submission(
        &self,
        bounty_id: BountyId,
        submission_id: SubmissionId,
        caller: AccountAddress,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        let result = state.create_submission(bounty_id, submission_id, caller);
        match &result {
            Ok(()) => {
                info!(
                    bounty_id = %bounty_id.short(),
                    submission_id = %submission_id.short(),
                    submitter = %caller,
                    "📝 Submission created"
                );
                self.emit(
                    &mut state,
                    LedgerEventKind::SubmissionCreated {
                        submission_id,
                        bounty_id,
                        submitter: caller,
                    },
                );
            }
            Err(e) => debug!(
                bounty_id = %bounty_id.short(),
                submission_id = %submission_id.short(),
                caller = %caller,
                kind = %e.kind(),
                error = %e,
                "❌ create_submission rejected"
            ),
        }
        result
    }

    /// Settle the submission's bounty in its favour, releasing the escrow to the submitter.
    pub async fn accept_submission(
        &self,
        submission_id: SubmissionId,
        caller: AccountAddress,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        match state.accept_submission(submission_id, caller) {
            Ok(settlement) => {
                info!(
                    bounty_id = %settlement.bounty_id.short(),
                    submission_id = %submission_id.short(),
                    winner = %settlement.winner,
                    amount = settlement.amount.units(),
                    winner_balance = state.ledger.balance_of(&settlement.winner).units(),
                    "✅ Submission accepted, escrow released"
                );
                self.emit(
                    &mut state,
                    LedgerEventKind::SubmissionAccepted {
                        submission_id,
                        bounty_id: settlement.bounty_id,
                        winner: settlement.winner,
                        amount: settlement.amount,
                    },
                );
                Ok(())
            }
            Err(e) => {
                debug!(
                    submission_id = %submission_id.short(),
                    caller = %caller,
                    kind = %e.kind(),
                    error = %e,
                    "❌ accept_submission rejected"
                );
                Err(e)
            }
        }
    }

    pub async fn reject_submission(
        &self,
        submission_id: SubmissionId,
        caller: AccountAddress,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        match state.reject_submission(submission_id, caller) {
            Ok(bounty_id) => {
                info!(
                    bounty_id = %bounty_id.short(),
                    submission_id = %submission_id.short(),
                    "🚫 Submission rejected"
                );
                self.emit(
                    &mut state,
                    LedgerEventKind::SubmissionRejected {
                        submission_id,
                        bounty_id,
                    },
                );
                Ok(())
            }
            Err(e) => {
                debug!(
                    submission_id = %submission_id.short(),
                    caller = %caller,
                    kind = %e.kind(),
                    error = %e,
                    "❌ reject_submission rejected"
                );
                Err(e)
            }
        }
    }

    // ----------------------------------------------------------------------------------
    // Owner-gated queries
    // ----------------------------------------------------------------------------------

    /// Every submission of the bounty, in creation order, whatever its status.
    pub async fn list_bounty_submissions(
        &self,
        bounty_id: BountyId,
        caller: AccountAddress,
    ) -> Result<Vec<SubmissionId>> {
        let state = self.state.read().await;
        state.owned_bounty(&bounty_id, &caller)?;
        Ok(state.submissions.for_bounty(&bounty_id).to_vec())
    }

    pub async fn list_bounty_rejected_submissions(
        &self,
        bounty_id: BountyId,
        caller: AccountAddress,
    ) -> Result<Vec<SubmissionId>> {
        let state = self.state.read().await;
        state.owned_bounty(&bounty_id, &caller)?;
        Ok(state
            .submissions
            .records_for_bounty(&bounty_id)
            .filter(|s| s.status == SubmissionStatus::Rejected)
            .map(|s| s.id)
            .collect())
    }

    /// The winning submission, or [`ContentId::ZERO`] while the bounty is open.
    pub async fn get_bounty_accepted_submission(
        &self,
        bounty_id: BountyId,
        caller: AccountAddress,
    ) -> Result<SubmissionId> {
        let state = self.state.read().await;
        let bounty = state.owned_bounty(&bounty_id, &caller)?;
        Ok(bounty.accepted_submission.unwrap_or(ContentId::ZERO))
    }

    // ----------------------------------------------------------------------------------
    // Caller-scoped and public queries
    // ----------------------------------------------------------------------------------

    pub async fn list_my_bounties(&self, caller: AccountAddress) -> Vec<BountyId> {
        let state = self.state.read().await;
        state.bounties.owned_by(&caller).to_vec()
    }

    pub async fn list_my_submissions(&self, caller: AccountAddress) -> Vec<SubmissionId> {
        let state = self.state.read().await;
        state.submissions.by_submitter(&caller).to_vec()
    }

    /// All bounty ids in creation order.
    pub async fn list_bounties(&self) -> Vec<BountyId> {
        let state = self.state.read().await;
        state.bounties.ids().to_vec()
    }

    pub async fn get_bounty(&self, bounty_id: BountyId) -> Result<Bounty> {
        let state = self.state.read().await;
        state.bounties.get(&bounty_id).cloned()
    }

    pub async fn get_submission(&self, submission_id: SubmissionId) -> Result<Submission> {
        let state = self.state.read().await;
        state.submissions.get(&submission_id).cloned()
    }

    pub async fn balance_of(&self, account: AccountAddress) -> TokenAmount {
        let state = self.state.read().await;
        state.ledger.balance_of(&account)
    }

    pub async fn supply_metrics(&self) -> Result<SupplyMetrics> {
        let state = self.state.read().await;
        SupplyMetrics::compute(state.total_supply, &state.ledger, &state.bounties)
    }

    /// Fails with [`BountyError::Invariant`] if balances plus open escrow differ from the
    /// seeded supply.
    pub async fn check_conservation(&self) -> Result<SupplyMetrics> {
        let metrics = self.supply_metrics().await?;
        metrics.check_conservation()?;
        debug!(
            total_supply = metrics.total_supply.units(),
            circulating = metrics.circulating.units(),
            escrowed = metrics.escrowed.units(),
            "🔍 Conservation check passed"
        );
        Ok(metrics)
    }

    pub async fn snapshot(&self) -> ContractSnapshot {
        let state = self.state.read().await;
        ContractSnapshot {
            version: ContractSnapshot::VERSION,
            total_supply: state.total_supply,
            balances: state.ledger.accounts(),
            bounties: state.bounties.iter().cloned().collect(),
            submissions: state.submissions.iter().cloned().collect(),
            next_event_seq: state.journal.next_seq(),
            taken_at: Utc::now(),
        }
    }

    /// Retained events with a sequence number greater than `since`.
    pub async fn events_since(&self, since: u64) -> Vec<LedgerEvent> {
        let state = self.state.read().await;
        state.journal.since(since)
    }

    /// Live feed of committed transitions, in commit order.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn emit(&self, state: &mut ContractState, kind: LedgerEventKind) {
        let event = state.journal.append(kind);
        // no receivers is fine
        let _ = self.events.send(event);
    }
}

struct Settlement {
    bounty_id: BountyId,
    winner: AccountAddress,
    amount: TokenAmount,
}

impl ContractState {
    fn create_bounty(
        &mut self,
        id: BountyId,
        amount: TokenAmount,
        caller: AccountAddress,
    ) -> Result<()> {
        if id.is_zero() {
            return Err(BountyError::ZeroId(RecordKind::Bounty));
        }
        if amount.is_zero() {
            return Err(BountyError::InvalidAmount(amount));
        }
        self.ledger.ensure_funds(&caller, amount)?;
        if self.bounties.contains(&id) {
            return Err(BountyError::DuplicateId {
                kind: RecordKind::Bounty,
                id,
            });
        }

        self.ledger.debit(&caller, amount)?;
        self.bounties.insert(Bounty::new(id, caller, amount))
    }

    fn create_submission(
        &mut self,
        bounty_id: BountyId,
        submission_id: SubmissionId,
        caller: AccountAddress,
    ) -> Result<()> {
        if bounty_id.is_zero() {
            return Err(BountyError::ZeroId(RecordKind::Bounty));
        }
        if submission_id.is_zero() {
            return Err(BountyError::ZeroId(RecordKind::Submission));
        }
        self.bounties.get(&bounty_id)?;

        self.submissions
            .insert(Submission::new(submission_id, bounty_id, caller))
    }

    fn accept_submission(
        &mut self,
        submission_id: SubmissionId,
        caller: AccountAddress,
    ) -> Result<Settlement> {
        let submission = self.submissions.get(&submission_id)?;
        let bounty = self.owned_bounty(&submission.bounty_id, &caller)?;
        ensure_open(bounty)?;
        ensure_pending(submission)?;

        let settlement = Settlement {
            bounty_id: bounty.id,
            winner: submission.submitter,
            amount: bounty.escrowed_amount,
        };
        self.ledger
            .ensure_credit(&settlement.winner, settlement.amount)?;

        let now = Utc::now();
        let submission = self.submissions.get_mut(&submission_id)?;
        submission.status = SubmissionStatus::Accepted;
        submission.resolved_at = Some(now);

        let bounty = self.bounties.get_mut(&settlement.bounty_id)?;
        bounty.status = BountyStatus::Settled;
        bounty.accepted_submission = Some(submission_id);
        bounty.settled_at = Some(now);

        self.ledger.credit(&settlement.winner, settlement.amount)?;
        Ok(settlement)
    }

    fn reject_submission(
        &mut self,
        submission_id: SubmissionId,
        caller: AccountAddress,
    ) -> Result<BountyId> {
        let submission = self.submissions.get(&submission_id)?;
        let bounty = self.owned_bounty(&submission.bounty_id, &caller)?;
        ensure_open(bounty)?;
        ensure_pending(submission)?;
        let bounty_id = bounty.id;

        let submission = self.submissions.get_mut(&submission_id)?;
        submission.status = SubmissionStatus::Rejected;
        submission.resolved_at = Some(Utc::now());
        Ok(bounty_id)
    }

    /// Looks up a bounty and checks `caller` owns it: `NotFound` first, then `Unauthorized`.
    fn owned_bounty(&self, bounty_id: &BountyId, caller: &AccountAddress) -> Result<&Bounty> {
        let bounty = self.bounties.get(bounty_id)?;
        if bounty.owner != *caller {
            return Err(BountyError::Unauthorized {
                caller: *caller,
                bounty_id: *bounty_id,
            });
        }
        Ok(bounty)
    }
}

fn ensure_open(bounty: &Bounty) -> Result<()> {
    if !bounty.is_open() {
        return Err(BountyError::InvalidState {
            kind: RecordKind::Bounty,
            id: bounty.id,
            expected: "Open".to_string(),
            actual: format!("{:?}", bounty.status),
        });
    }
    Ok(())
}

fn ensure_pending(submission: &Submission) -> Result<()> {
    if !submission.is_pending() {
        return Err(BountyError::InvalidState {
            kind: RecordKind::Submission,
            id: submission.id,
            expected: "Pending".to_string(),
            actual: format!("{:?}", submission.status),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> AccountAddress {
        AccountAddress::from_bytes([b; 32])
    }

    fn contract() -> BountyContract {
        let genesis = GenesisConfig::default()
            .with_allocation(addr(1), TokenAmount::new(10))
            .with_allocation(addr(2), TokenAmount::new(20));
        BountyContract::with_genesis(&genesis).unwrap()
    }

    #[tokio::test]
    async fn test_subscribers_see_commits_in_order() {
        let contract = contract();
        let mut rx = contract.subscribe();

        contract
            .create_bounty(ContentId::from_u64(1), TokenAmount::new(3), addr(1))
            .await
            .unwrap();
        contract
            .create_submission(ContentId::from_u64(1), ContentId::from_u64(4), addr(2))
            .await
            .unwrap();
        contract
            .accept_submission(ContentId::from_u64(4), addr(1))
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        let third = rx.recv().await.unwrap();
        assert_eq!((first.seq, second.seq, third.seq), (1, 2, 3));
        assert!(matches!(first.kind, LedgerEventKind::BountyCreated { .. }));
        assert!(matches!(second.kind, LedgerEventKind::SubmissionCreated { .. }));
        assert_eq!(
            third.kind,
            LedgerEventKind::SubmissionAccepted {
                submission_id: ContentId::from_u64(4),
                bounty_id: ContentId::from_u64(1),
                winner: addr(2),
                amount: TokenAmount::new(3),
            }
        );
    }

    #[tokio::test]
    async fn test_failed_calls_emit_nothing() {
        let contract = contract();

        assert!(contract
            .create_bounty(ContentId::from_u64(1), TokenAmount::new(50), addr(1))
            .await
            .is_err());
        assert!(contract
            .accept_submission(ContentId::from_u64(4), addr(1))
            .await
            .is_err());

        assert!(contract.events_since(0).await.is_empty());
        assert_eq!(contract.snapshot().await.next_event_seq, 1);
    }

    #[tokio::test]
    async fn test_events_since_is_exclusive() {
        let contract = contract();
        for n in 1..=3 {
            contract
                .create_bounty(ContentId::from_u64(n), TokenAmount::new(1), addr(2))
                .await
                .unwrap();
        }

        let tail: Vec<u64> = contract
            .events_since(1)
            .await
            .into_iter()
            .map(|e| e.seq)
            .collect();
        assert_eq!(tail, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_empty_contract_has_no_supply() {
        let contract = BountyContract::new();
        let err = contract
            .create_bounty(ContentId::from_u64(1), TokenAmount::new(1), addr(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InsufficientFunds);
        assert_eq!(
            contract.check_conservation().await.unwrap(),
            SupplyMetrics::default()
        );
    }
}
