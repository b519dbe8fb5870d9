use crate::error::{BountyError, Result};
use crate::ledger::Ledger;
use crate::store::BountyStore;
use bounty_types::TokenAmount;
use serde::{Deserialize, Serialize};

/// Point-in-time view of where the seeded supply currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupplyMetrics {
    /// Seeded at genesis; never changes afterwards.
    pub total_supply: TokenAmount,
    /// Sum of all account balances.
    pub circulating: TokenAmount,
    /// Sum of the escrow held by open bounties.
    pub escrowed: TokenAmount,
    pub open_bounties: usize,
    pub settled_bounties: usize,
}

impl SupplyMetrics {
    pub fn compute(
        total_supply: TokenAmount,
        ledger: &Ledger,
        bounties: &BountyStore,
    ) -> Result<Self> {
        let circulating = ledger.total()?;

        let mut escrowed = TokenAmount::ZERO;
        let mut open_bounties = 0;
        let mut settled_bounties = 0;
        for bounty in bounties.iter() {
            if bounty.is_open() {
                open_bounties += 1;
            } else {
                settled_bounties += 1;
            }
            escrowed = escrowed
                .checked_add(bounty.held_escrow())
                .ok_or_else(|| BountyError::Overflow("escrow total exceeds u64".to_string()))?;
        }

        Ok(Self {
            total_supply,
            circulating,
            escrowed,
            open_bounties,
            settled_bounties,
        })
    }

    /// `circulating + escrowed == total_supply`.
    pub fn check_conservation(&self) -> Result<()> {
        let accounted = self.circulating.checked_add(self.escrowed);
        if accounted != Some(self.total_supply) {
            return Err(BountyError::Invariant(format!(
                "balances {} + escrow {} != total supply {}",
                self.circulating, self.escrowed, self.total_supply
            )));
        }
        Ok(())
    }
}
