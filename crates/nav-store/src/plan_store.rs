//! [`PlanStore`] backends: in-memory and JSON file.
//!
//! The SQLite backend lives in [`crate::sqlite`] behind the `sqlite` feature.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;

use nav_route::PlanSnapshot;
use nav_session::{PlanStore, StoreFailure};

use crate::StoreResult;

// ── MemoryPlanStore ───────────────────────────────────────────────────────────

/// Keeps the snapshot in process memory.  Survives a session, not a process.
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    slot: Mutex<Option<PlanSnapshot>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `snapshot`.
    pub fn with_snapshot(snapshot: PlanSnapshot) -> Self {
        Self { slot: Mutex::new(Some(snapshot)) }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<PlanSnapshot>>, StoreFailure> {
        self.slot.lock().map_err(|_| StoreFailure("memory store poisoned".into()))
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn save(&self, snapshot: &PlanSnapshot) -> Result<(), StoreFailure> {
        *self.lock()? = Some(snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PlanSnapshot>, StoreFailure> {
        Ok(self.lock()?.clone())
    }
}

// ── JsonFilePlanStore ─────────────────────────────────────────────────────────

/// Stores the snapshot as a JSON document at a fixed path.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the target,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFilePlanStore {
    path: PathBuf,
}

impl JsonFilePlanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, snapshot: &PlanSnapshot) -> StoreResult<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("plan snapshot written to {}", self.path.display());
        Ok(())
    }

    async fn read(&self) -> StoreResult<Option<PlanSnapshot>> {
        let body = match tokio::fs::read(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

#[async_trait]
impl PlanStore for JsonFilePlanStore {
    async fn save(&self, snapshot: &PlanSnapshot) -> Result<(), StoreFailure> {
        Ok(self.write(snapshot).await?)
    }

    async fn load(&self) -> Result<Option<PlanSnapshot>, StoreFailure> {
        Ok(self.read().await?)
    }
}
