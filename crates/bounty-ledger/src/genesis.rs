use crate::error::{BountyError, Result};
use crate::ledger::Ledger;
use bounty_types::{AccountAddress, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Initial balance seeding. This is the only place tokens come into existence; the sum
/// of the allocations becomes the conserved total supply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub allocations: Vec<(AccountAddress, TokenAmount)>,
}

impl GenesisConfig {
    pub fn new(allocations: Vec<(AccountAddress, TokenAmount)>) -> Self {
        Self { allocations }
    }

    pub fn with_allocation(mut self, account: AccountAddress, amount: TokenAmount) -> Self {
        self.allocations.push((account, amount));
        self
    }

    /// Merges repeated addresses and checks the grand total fits in a `u64`.
    pub fn merged(&self) -> Result<BTreeMap<AccountAddress, TokenAmount>> {
        let mut merged: BTreeMap<AccountAddress, TokenAmount> = BTreeMap::new();
        let mut total = TokenAmount::ZERO;

        for (account, amount) in &self.allocations {
            if amount.is_zero() {
                return Err(BountyError::Genesis(format!(
                    "allocation for {} is zero",
                    account
                )));
            }

            total = total.checked_add(*amount).ok_or_else(|| {
                BountyError::Overflow("genesis allocations exceed u64".to_string())
            })?;

            let entry = merged.entry(*account).or_insert(TokenAmount::ZERO);
            *entry = entry.checked_add(*amount).ok_or_else(|| {
                BountyError::Overflow(format!("genesis allocation for {} exceeds u64", account))
            })?;
        }

        Ok(merged)
    }

    pub fn total(&self) -> Result<TokenAmount> {
        self.merged()?
            .values()
            .try_fold(TokenAmount::ZERO, |acc, a| acc.checked_add(*a))
            .ok_or_else(|| BountyError::Overflow("genesis allocations exceed u64".to_string()))
    }

    /// Credits every allocation into an empty ledger and returns the seeded total.
    pub fn apply(&self, ledger: &mut Ledger) -> Result<TokenAmount> {
        let total = self.seed(ledger)?;
        info!(
            accounts = ledger.account_count(),
            total_supply = total.units(),
            "🧬 Genesis balances seeded"
        );
        Ok(total)
    }

    /// Same checks and credits as [`GenesisConfig::apply`] without announcing
    /// a genesis. Used when balances come back from a snapshot.
    pub(crate) fn seed(&self, ledger: &mut Ledger) -> Result<TokenAmount> {
        if ledger.account_count() != 0 {
            return Err(BountyError::Genesis(
                "genesis can only seed an empty ledger".to_string(),
            ));
        }

        let merged = self.merged()?;
        let mut total = TokenAmount::ZERO;
        for (account, amount) in &merged {
            ledger.credit(account, *amount)?;
            total = total.checked_add(*amount).ok_or_else(|| {
                BountyError::Overflow("genesis allocations exceed u64".to_string())
            })?;
        }
        Ok(total)
    }
}
