//! `PositionTracker` — turns raw fixes into the session's tracked position.
//!
//! # Snap flow
//!
//! ```text
//! fix ──► moved > threshold? ──no──► keep last snapped, drop waiting input
//!              │yes
//!              ▼
//!        SingleFlight::submit(raw) ──gate closed──► keep last snapped
//!              │started                            (raw kept as waiting input)
//!              ▼
//!        SnapRequest { previous: snapped, current: raw }
//!              ⋮  (caller performs the network call)
//!        resolve_snap(id, Ok(p))  ──► snapped = p
//!        resolve_snap(id, Err(_)) ──► snapped = latest raw fix
//! ```
//!
//! The tracker never performs I/O.  It hands out [`SnapRequest`]s and expects
//! the owner to report each outcome through [`PositionTracker::resolve_snap`].

use log::{debug, warn};

use nav_core::units::mps_to_kmh;
use nav_core::{GeoPoint, NavConfig, RequestId, SingleFlight, Timestamp};

use crate::{LocationFix, RoutePlan, RouteSplit, SnapError, TrackedPosition};

/// A road-snap call the owner must perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapRequest {
    pub id:       RequestId,
    pub previous: GeoPoint,
    pub current:  GeoPoint,
}

/// Result of feeding the tracker.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub position: TrackedPosition,
    /// Active plan cut at `position.snapped`; `None` without a plan.
    pub split:    Option<RouteSplit>,
    /// A snap call to start now, if the gate opened.
    pub snap:     Option<SnapRequest>,
}

pub struct PositionTracker {
    movement_threshold_m: f64,
    snapping:             bool,
    gate:                 SingleFlight<GeoPoint>,
    position:             Option<TrackedPosition>,
}

impl PositionTracker {
    /// A tracker that road-snaps through the owner's snap collaborator.
    pub fn new(config: &NavConfig) -> Self {
        Self {
            movement_threshold_m: config.movement_threshold_m,
            snapping:             true,
            gate:                 SingleFlight::new(config.snap_window_ms),
            position:             None,
        }
    }

    /// A tracker for sessions without a snap collaborator: every finite fix
    /// is adopted as the snapped position directly.
    pub fn without_snapping(config: &NavConfig) -> Self {
        Self { snapping: false, ..Self::new(config) }
    }

    pub fn position(&self) -> Option<&TrackedPosition> {
        self.position.as_ref()
    }

    /// `true` while a snap request is outstanding.
    pub fn snap_in_flight(&self) -> bool {
        self.gate.is_in_flight()
    }

    /// Process one fix.
    ///
    /// Returns `None` only when no position exists yet and the fix itself is
    /// unusable (non-finite coordinates).
    pub fn ingest(
        &mut self,
        fix:  LocationFix,
        plan: Option<&RoutePlan>,
        now:  Timestamp,
    ) -> Option<Ingested> {
        let speed_kmh = mps_to_kmh(fix.speed_mps);

        if self.position.is_none() {
            if !fix.position.is_finite() {
                warn!("ignoring non-finite first fix {}", fix.position);
                return None;
            }
            let first = TrackedPosition::first(fix, speed_kmh, now);
            self.position = Some(first);
            return Some(Self::ingested(first, plan, None));
        }
        let pos = self.position.as_mut()?;

        pos.raw = fix;
        pos.speed_kmh = speed_kmh;

        let mut snap = None;
        if !fix.position.is_finite() {
            debug!("non-finite fix {}; holding {}", fix.position, pos.snapped);
        } else if !self.snapping {
            pos.adopt(fix.position, now);
        } else if fix.position.distance_m(pos.snapped) > self.movement_threshold_m {
            let previous = pos.snapped;
            snap = self.gate.submit(fix.position, now).map(|(id, current)| SnapRequest {
                id,
                previous,
                current,
            });
        } else {
            // A fix near the snapped position supersedes any waiting input.
            self.gate.discard_waiting();
        }

        let position = *pos;
        Some(Self::ingested(position, plan, snap))
    }

    /// Apply the outcome of snap request `id`.
    ///
    /// Returns `None` when the result is stale (unknown id) and was dropped.
    /// On failure the snapped position falls back to the latest raw fix.
    pub fn resolve_snap(
        &mut self,
        id:     RequestId,
        result: Result<GeoPoint, SnapError>,
        plan:   Option<&RoutePlan>,
        now:    Timestamp,
    ) -> Option<Ingested> {
        if !self.gate.complete(id) {
            debug!("discarding stale snap result {id}");
            return None;
        }
        let pos = self.position.as_mut()?;

        match result {
            Ok(point) if point.is_finite() => pos.adopt(point, now),
            Ok(point) => {
                warn!("snap returned non-finite point {point}; using raw fix");
                pos.adopt(pos.raw.position, now);
            }
            Err(e) => {
                warn!("road snap failed ({e}); using raw fix");
                pos.adopt(pos.raw.position, now);
            }
        }

        let snap = self.next_request(now);
        let position = self.position.as_ref().copied()?;
        Some(Self::ingested(position, plan, snap))
    }

    /// Start the coalesced snap input if the gate has opened.
    pub fn poll(&mut self, now: Timestamp) -> Option<SnapRequest> {
        self.next_request(now)
    }

    /// Forget any outstanding or waiting snap; the position is kept.
    pub fn reset_snaps(&mut self) {
        self.gate.reset();
    }

    fn next_request(&mut self, now: Timestamp) -> Option<SnapRequest> {
        let previous = self.position.as_ref()?.snapped;
        if let Some(waiting) = self.gate.waiting() {
            if waiting.distance_m(previous) <= self.movement_threshold_m {
                debug!("dropping waiting snap input {waiting}; within threshold of {previous}");
                self.gate.discard_waiting();
                return None;
            }
        }
        self.gate
            .poll(now)
            .map(|(id, current)| SnapRequest { id, previous, current })
    }

    fn ingested(
        position: TrackedPosition,
        plan:     Option<&RoutePlan>,
        snap:     Option<SnapRequest>,
    ) -> Ingested {
        let split = plan.and_then(|p| p.split_at(position.snapped));
        Ingested { position, split, snap }
    }
}
