use anyhow::{Context, Result};
use async_trait::async_trait;
use bounty_ledger::ContractSnapshot;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Where the node keeps the contract between restarts.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<ContractSnapshot>>;
    async fn save(&self, snapshot: &ContractSnapshot) -> Result<()>;
}

/// JSON file, replaced atomically through a sibling temp file.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Option<ContractSnapshot>> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!(path = %self.path.display(), "📂 No snapshot on disk");
            return Ok(None);
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("reading snapshot {}", self.path.display()))?;
        let snapshot: ContractSnapshot = serde_json::from_slice(&bytes)
            .with_context(|| format!("decoding snapshot {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            bounties = snapshot.bounties.len(),
            submissions = snapshot.submissions.len(),
            taken_at = %snapshot.taken_at,
            "📂 Snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &ContractSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .with_context(|| format!("writing snapshot {}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            next_event_seq = snapshot.next_event_seq,
            "💾 Snapshot saved"
        );
        Ok(())
    }
}

/// Keeps the latest snapshot in memory. Used when no snapshot path is configured.
#[derive(Default, Clone)]
pub struct MemorySnapshotStore {
    latest: Arc<RwLock<Option<ContractSnapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<ContractSnapshot>> {
        Ok(self.latest.read().await.clone())
    }

    async fn save(&self, snapshot: &ContractSnapshot) -> Result<()> {
        *self.latest.write().await = Some(snapshot.clone());
        Ok(())
    }
}
