//! Shared ownership of the club state and the snapshot seam.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use crate::club::ClubState;

/// Handle to the one live `ClubState`. Cloning shares the same state.
///
/// Each read-modify-write holds the lock for its synchronous segment only;
/// no lock is held across a metadata lookup.
#[derive(Clone, Default)]
pub struct ClubStore {
    inner: Arc<Mutex<ClubState>>,
}

impl ClubStore {
    pub fn new(state: ClubState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ClubState> {
        self.inner.lock().await
    }

    /// Clone of the current state, for persistence and inspection.
    pub async fn snapshot(&self) -> ClubState {
        self.inner.lock().await.clone()
    }
}

/// Destination for whole-state snapshots written after each request.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn save(&self, state: &ClubState) -> anyhow::Result<()>;
}
