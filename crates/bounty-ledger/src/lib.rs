//! Bounty escrow contract.
//!
//! Owners lock tokens from their balance into a bounty, anyone may attach submissions to
//! it, and the owner settles the bounty by accepting exactly one submission, which moves
//! the escrow to the submitter. Tokens are only created at genesis and the sum of all
//! balances plus open escrow stays equal to the seeded supply.

pub mod contract;
pub mod error;
pub mod events;
pub mod genesis;
pub mod ledger;
pub mod snapshot;
pub mod store;
pub mod supply;
pub mod types;

pub use contract::{BountyContract, ContractConfig};
pub use error::{BountyError, ErrorKind, Result};
pub use events::{EventJournal, LedgerEvent, LedgerEventKind};
pub use genesis::GenesisConfig;
pub use ledger::Ledger;
pub use snapshot::ContractSnapshot;
pub use store::{BountyStore, SubmissionStore};
pub use supply::SupplyMetrics;
pub use types::{Bounty, BountyStatus, RecordKind, Submission, SubmissionStatus};

pub use bounty_types::{AccountAddress, BountyId, ContentId, SubmissionId, TokenAmount};
