//! Location fixes and the tracked position derived from them.

use nav_core::{GeoPoint, Timestamp};

/// One emission of the location source.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationFix {
    pub position:    GeoPoint,
    /// Measured ground speed; may be negative or NaN on some devices.
    pub speed_mps:   f64,
    pub heading_deg: Option<f64>,
    pub timestamp:   Timestamp,
}

impl LocationFix {
    pub fn new(position: GeoPoint, speed_mps: f64, timestamp: Timestamp) -> Self {
        Self { position, speed_mps, heading_deg: None, timestamp }
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }
}

/// The single authoritative position of a navigation session.
///
/// `snapped` is never empty: until a road-snap succeeds it is the raw fix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackedPosition {
    /// Last fix received from the location source.
    pub raw:              LocationFix,
    /// Last position after road-snapping, or the raw fix when snapping is
    /// unavailable or failed.
    pub snapped:          GeoPoint,
    /// Value of `snapped` before the most recent change; the origin of the
    /// rendered transition and the anchor of the next snap request.
    pub previous_snapped: GeoPoint,
    /// Display speed, clamped to `>= 0`.
    pub speed_kmh:        f64,
    /// When `snapped` last changed.
    pub updated_at:       Timestamp,
}

impl TrackedPosition {
    /// The position right after the first fix of a session.
    pub fn first(fix: LocationFix, speed_kmh: f64, now: Timestamp) -> Self {
        Self {
            raw:              fix,
            snapped:          fix.position,
            previous_snapped: fix.position,
            speed_kmh,
            updated_at:       now,
        }
    }

    /// Replace the snapped position, remembering the old one.
    pub(crate) fn adopt(&mut self, snapped: GeoPoint, now: Timestamp) {
        if !snapped.is_finite() {
            return;
        }
        self.previous_snapped = self.snapped;
        self.snapped = snapped;
        self.updated_at = now;
    }

    /// The rendered move from `previous_snapped` to `snapped`.
    pub fn transition(&self, duration_ms: i64) -> Transition {
        Transition {
            from:        self.previous_snapped,
            to:          self.snapped,
            started_at:  self.updated_at,
            duration_ms: duration_ms.max(0),
        }
    }
}

/// Linear animation between two positions, exposed for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from:        GeoPoint,
    pub to:          GeoPoint,
    pub started_at:  Timestamp,
    pub duration_ms: i64,
}

impl Transition {
    /// Fraction of the transition completed at `now`, in `[0.0, 1.0]`.
    ///
    /// Returns `1.0` for a zero-length transition or once `now` is past the end.
    pub fn progress(&self, now: Timestamp) -> f64 {
        if self.duration_ms <= 0 {
            return 1.0;
        }
        let elapsed = now.millis_since(self.started_at).max(0) as f64;
        (elapsed / self.duration_ms as f64).min(1.0)
    }

    /// Interpolated position at `now`, in longitude/latitude space.
    pub fn position_at(&self, now: Timestamp) -> GeoPoint {
        self.from.lerp(self.to, self.progress(now))
    }
}
