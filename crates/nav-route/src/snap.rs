//! Road-snap (map-matching) port.

use async_trait::async_trait;

use nav_core::GeoPoint;

use crate::SnapError;

/// Snaps a raw GPS point onto the road network.
///
/// Must be idempotent and free of caller-visible side effects.  Debouncing is
/// the caller's job (see [`PositionTracker`][crate::PositionTracker]).
#[async_trait]
pub trait RoadSnapClient: Send + Sync + 'static {
    /// Match the two-point trace `previous → current` and return where
    /// `current` lies on the road.
    async fn snap_to_road(&self, previous: GeoPoint, current: GeoPoint) -> Result<GeoPoint, SnapError>;
}
