use crate::api::{self, AppState};
use crate::config::NodeConfig;
use crate::storage::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
use anyhow::{Context, Result};
use axum::Router;
use bounty_ledger::{BountyContract, ContractConfig};
use std::sync::Arc;
use tracing::info;

/// Restore the contract from the configured store, or seed it from genesis on first start.
pub async fn open_contract(config: &NodeConfig, store: &dyn SnapshotStore) -> Result<BountyContract> {
    match store.load().await? {
        Some(snapshot) => BountyContract::from_snapshot(&snapshot, ContractConfig::default())
            .context("snapshot failed consistency checks"),
        None => {
            info!(
                allocations = config.genesis.allocations.len(),
                "🧬 No snapshot found, seeding from genesis"
            );
            BountyContract::with_genesis(&config.genesis).context("invalid [genesis] section")
        }
    }
}

pub fn snapshot_store(config: &NodeConfig) -> Arc<dyn SnapshotStore> {
    match &config.storage.snapshot_path {
        Some(path) => Arc::new(FileSnapshotStore::new(path)),
        None => Arc::new(MemorySnapshotStore::new()),
    }
}

/// Everything `start` needs: the restored contract wired into the HTTP router.
pub async fn build(config: &NodeConfig) -> Result<(Arc<AppState>, Router)> {
    let store = snapshot_store(config);
    let contract = open_contract(config, store.as_ref()).await?;

    let metrics = contract.check_conservation().await?;
    info!(
        total_supply = metrics.total_supply.units(),
        circulating = metrics.circulating.units(),
        escrowed = metrics.escrowed.units(),
        open_bounties = metrics.open_bounties,
        "✅ Contract ready"
    );

    let state = Arc::new(AppState::new(config.node.name.clone(), contract, store));
    // make the seeded state durable before the first request
    state.persist().await;

    let router = api::routes(state.clone());
    Ok((state, router))
}
