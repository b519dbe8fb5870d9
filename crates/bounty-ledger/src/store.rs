use crate::error::{BountyError, Result};
use crate::types::{Bounty, RecordKind, Submission};
use bounty_types::{AccountAddress, BountyId, SubmissionId};
use std::collections::HashMap;

/// Bounty records keyed by id, with creation order and a per-owner index kept up to date
/// on insert so owner queries never scan the whole store.
#[derive(Debug, Clone, Default)]
pub struct BountyStore {
    records: HashMap<BountyId, Bounty>,
    order: Vec<BountyId>,
    by_owner: HashMap<AccountAddress, Vec<BountyId>>,
}

impl BountyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bounty: Bounty) -> Result<()> {
        if self.records.contains_key(&bounty.id) {
            return Err(BountyError::DuplicateId {
                kind: RecordKind::Bounty,
                id: bounty.id,
            });
        }

        self.order.push(bounty.id);
        self.by_owner.entry(bounty.owner).or_default().push(bounty.id);
        self.records.insert(bounty.id, bounty);
        Ok(())
    }

    pub fn contains(&self, id: &BountyId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &BountyId) -> Result<&Bounty> {
        self.records.get(id).ok_or(BountyError::NotFound {
            kind: RecordKind::Bounty,
            id: *id,
        })
    }

    pub(crate) fn get_mut(&mut self, id: &BountyId) -> Result<&mut Bounty> {
        self.records.get_mut(id).ok_or(BountyError::NotFound {
            kind: RecordKind::Bounty,
            id: *id,
        })
    }

    /// All bounty ids in creation order.
    pub fn ids(&self) -> &[BountyId] {
        &self.order
    }

    pub fn owned_by(&self, owner: &AccountAddress) -> &[BountyId] {
        self.by_owner.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Bounty> + '_ {
        self.order.iter().filter_map(move |id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Submission records keyed by id. Ids are unique across all bounties.
#[derive(Debug, Clone, Default)]
pub struct SubmissionStore {
    records: HashMap<SubmissionId, Submission>,
    order: Vec<SubmissionId>,
    by_bounty: HashMap<BountyId, Vec<SubmissionId>>,
    by_submitter: HashMap<AccountAddress, Vec<SubmissionId>>,
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, submission: Submission) -> Result<()> {
        if self.records.contains_key(&submission.id) {
            return Err(BountyError::DuplicateId {
                kind: RecordKind::Submission,
                id: submission.id,
            });
        }

        self.order.push(submission.id);
        self.by_bounty
            .entry(submission.bounty_id)
            .or_default()
            .push(submission.id);
        self.by_submitter
            .entry(submission.submitter)
            .or_default()
            .push(submission.id);
        self.records.insert(submission.id, submission);
        Ok(())
    }

    pub fn contains(&self, id: &SubmissionId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &SubmissionId) -> Result<&Submission> {
        self.records.get(id).ok_or(BountyError::NotFound {
            kind: RecordKind::Submission,
            id: *id,
        })
    }

    pub(crate) fn get_mut(&mut self, id: &SubmissionId) -> Result<&mut Submission> {
        self.records.get_mut(id).ok_or(BountyError::NotFound {
            kind: RecordKind::Submission,
            id: *id,
        })
    }

    pub fn for_bounty(&self, bounty_id: &BountyId) -> &[SubmissionId] {
        self.by_bounty
            .get(bounty_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn by_submitter(&self, submitter: &AccountAddress) -> &[SubmissionId] {
        self.by_submitter
            .get(submitter)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Submissions of one bounty, in creation order.
    pub fn records_for_bounty<'a>(
        &'a self,
        bounty_id: &BountyId,
    ) -> impl Iterator<Item = &'a Submission> + 'a {
        self.for_bounty(bounty_id)
            .iter()
            .filter_map(move |id| self.records.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Submission> + '_ {
        self.order.iter().filter_map(move |id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounty_types::{ContentId, TokenAmount};

    fn addr(b: u8) -> AccountAddress {
        AccountAddress::from_bytes([b; 32])
    }

    fn id(n: u64) -> ContentId {
        ContentId::from_u64(n)
    }

    #[test]
    fn test_bounty_insert_and_lookup() {
        let mut store = BountyStore::new();
        store
            .insert(Bounty::new(id(1), addr(1), TokenAmount::new(3)))
            .unwrap();

        assert!(store.contains(&id(1)));
        assert_eq!(store.get(&id(1)).unwrap().owner, addr(1));
        assert_eq!(
            store.get(&id(2)).unwrap_err(),
            BountyError::NotFound {
                kind: RecordKind::Bounty,
                id: id(2)
            }
        );
    }

    #[test]
    fn test_bounty_duplicate_rejected_without_touching_indexes() {
        let mut store = BountyStore::new();
        store
            .insert(Bounty::new(id(1), addr(1), TokenAmount::new(3)))
            .unwrap();

        let err = store
            .insert(Bounty::new(id(1), addr(2), TokenAmount::new(9)))
            .unwrap_err();
        assert_eq!(
            err,
            BountyError::DuplicateId {
                kind: RecordKind::Bounty,
                id: id(1)
            }
        );
        assert_eq!(store.len(), 1);
        assert!(store.owned_by(&addr(2)).is_empty());
        assert_eq!(store.get(&id(1)).unwrap().escrowed_amount, TokenAmount::new(3));
    }

    #[test]
    fn test_owner_index_keeps_creation_order() {
        let mut store = BountyStore::new();
        for (n, owner) in [(7, 1), (3, 2), (5, 1), (1, 1)] {
            store
                .insert(Bounty::new(id(n), addr(owner), TokenAmount::new(1)))
                .unwrap();
        }

        assert_eq!(store.owned_by(&addr(1)), &[id(7), id(5), id(1)]);
        assert_eq!(store.owned_by(&addr(2)), &[id(3)]);
        assert_eq!(store.ids(), &[id(7), id(3), id(5), id(1)]);
        let iterated: Vec<_> = store.iter().map(|b| b.id).collect();
        assert_eq!(iterated, store.ids());
    }

    #[test]
    fn test_submission_indexes() {
        let mut store = SubmissionStore::new();
        store.insert(Submission::new(id(5), id(1), addr(3))).unwrap();
        store.insert(Submission::new(id(4), id(1), addr(2))).unwrap();
        store.insert(Submission::new(id(6), id(2), addr(2))).unwrap();

        assert_eq!(store.for_bounty(&id(1)), &[id(5), id(4)]);
        assert_eq!(store.for_bounty(&id(2)), &[id(6)]);
        assert!(store.for_bounty(&id(9)).is_empty());
        assert_eq!(store.by_submitter(&addr(2)), &[id(4), id(6)]);

        let statuses: Vec<_> = store.records_for_bounty(&id(1)).map(|s| s.id).collect();
        assert_eq!(statuses, vec![id(5), id(4)]);
    }

    #[test]
    fn test_submission_ids_unique_across_bounties() {
        let mut store = SubmissionStore::new();
        store.insert(Submission::new(id(4), id(1), addr(2))).unwrap();

        let err = store
            .insert(Submission::new(id(4), id(2), addr(3)))
            .unwrap_err();
        assert_eq!(
            err,
            BountyError::DuplicateId {
                kind: RecordKind::Submission,
                id: id(4)
            }
        );
        assert!(store.for_bounty(&id(2)).is_empty());
    }
}
