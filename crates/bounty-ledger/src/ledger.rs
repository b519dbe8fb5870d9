use crate::error::{BountyError, Result};
use bounty_types::{AccountAddress, TokenAmount};
use std::collections::HashMap;
use tracing::debug;

/// Per-account balances.
///
/// There is no transfer primitive. Value only moves through the contract's
/// escrow paths, which pair every `debit` with an escrow lock and every `credit` with an
/// escrow release. Zero balances are not stored, so unknown and empty accounts look the same.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<AccountAddress, TokenAmount>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &AccountAddress) -> TokenAmount {
        self.balances
            .get(account)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Checks that `debit(account, amount)` would succeed, without mutating anything.
    pub fn ensure_funds(&self, account: &AccountAddress, amount: TokenAmount) -> Result<()> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(BountyError::InsufficientFunds {
                account: *account,
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Checks that `credit(account, amount)` would succeed, without mutating anything.
    pub fn ensure_credit(&self, account: &AccountAddress, amount: TokenAmount) -> Result<()> {
        self.balance_of(account)
            .checked_add(amount)
            .map(|_| ())
            .ok_or_else(|| BountyError::Overflow(format!("crediting {} to {}", amount, account)))
    }

    pub fn debit(&mut self, account: &AccountAddress, amount: TokenAmount) -> Result<()> {
        self.ensure_funds(account, amount)?;
        let before = self.balance_of(account);
        let after = before.saturating_sub(amount);
        self.set_balance(*account, after);

        debug!(
            account = %account,
            amount = amount.units(),
            balance_before = before.units(),
            balance_after = after.units(),
            "💸 Balance debited"
        );
        Ok(())
    }

    pub fn credit(&mut self, account: &AccountAddress, amount: TokenAmount) -> Result<()> {
        let before = self.balance_of(account);
        let after = before
            .checked_add(amount)
            .ok_or_else(|| BountyError::Overflow(format!("crediting {} to {}", amount, account)))?;
        self.set_balance(*account, after);

        debug!(
            account = %account,
            amount = amount.units(),
            balance_before = before.units(),
            balance_after = after.units(),
            "💰 Balance credited"
        );
        Ok(())
    }

    /// Sum of every balance.
    pub fn total(&self) -> Result<TokenAmount> {
        self.balances
            .values()
            .try_fold(TokenAmount::ZERO, |acc, b| acc.checked_add(*b))
            .ok_or_else(|| BountyError::Overflow("ledger total exceeds u64".to_string()))
    }

    /// Non-zero balances sorted by address.
    pub fn accounts(&self) -> Vec<(AccountAddress, TokenAmount)> {
        let mut accounts: Vec<_> = self.balances.iter().map(|(a, b)| (*a, *b)).collect();
        accounts.sort_by(|a, b| a.0.cmp(&b.0));
        accounts
    }

    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    fn set_balance(&mut self, account: AccountAddress, balance: TokenAmount) {
        if balance.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }
}
