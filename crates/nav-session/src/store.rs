//! Plan persistence port.
//!
//! The session saves a [`PlanSnapshot`] after every plan change and loads it
//! back once when the application returns to the foreground, so a process
//! suspended mid-trip resumes without a network round-trip.  Backends live in
//! `nav-store`.

use async_trait::async_trait;

use nav_route::PlanSnapshot;

/// Key/value store holding the latest plan snapshot of a session.
#[async_trait]
pub trait PlanStore: Send + Sync + 'static {
    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &PlanSnapshot) -> Result<(), StoreFailure>;

    /// The last saved snapshot, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<PlanSnapshot>, StoreFailure>;
}

/// Backend-agnostic persistence failure.  Backends convert their own error
/// types into this at the trait boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("plan store failure: {0}")]
pub struct StoreFailure(pub String);
