//! Flat JSON snapshot of the club state.
//!
//! Read once at startup, overwritten wholesale after every dispatched request.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bookclub_kernel::{ClubState, SnapshotSink};
use tokio::sync::Mutex;

pub struct SnapshotFile {
    path: PathBuf,
    /// Held from temp-file write through rename; one writer at a time.
    write_lock: Mutex<()>,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing or unreadable file yields an empty state.
    pub async fn load(&self) -> ClubState {
        match self.read().await {
            Ok(state) => {
                tracing::info!(
                    path = %self.path.display(),
                    shortlist = state.shortlist.len(),
                    events = state.events.len(),
                    "loaded club state"
                );
                state
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = ?err,
                    "error loading state, starting blank"
                );
                ClubState::default()
            }
        }
    }

    /// Read the snapshot, surfacing any failure.
    pub async fn read(&self) -> anyhow::Result<ClubState> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// Overwrite the snapshot through a sibling temp file and rename.
    pub async fn write(&self, state: &ClubState) -> anyhow::Result<()> {
        let json = serde_json::to_vec(state).context("failed to serialize club state")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let _guard = self.write_lock.lock().await;
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), bytes = json.len(), "persisted club state");
        Ok(())
    }
}

#[async_trait]
impl SnapshotSink for SnapshotFile {
    async fn save(&self, state: &ClubState) -> anyhow::Result<()> {
        self.write(state).await
    }
}
