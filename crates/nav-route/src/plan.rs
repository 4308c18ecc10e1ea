//! Route plans: geometry, maneuvers, congestion and provider totals.
//!
//! A [`RoutePlan`] is immutable once built.  Replacing the active route means
//! swapping in a whole new plan; nothing ever patches one in place.

use log::warn;

use nav_core::{GeoPoint, Timestamp};
use nav_geometry::{Projection, RouteLine};

use crate::{RouteError, RouteResult};

// ── Step ──────────────────────────────────────────────────────────────────────

/// One maneuver of a route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    /// Where the maneuver happens.
    pub location:      GeoPoint,
    /// Human-readable instruction, e.g. "Turn left onto Dauphin Street".
    pub instruction:   String,
    /// Heading after the maneuver, degrees `[0, 360)`.
    pub bearing_after: f64,
    /// Length of the road stretch that follows the maneuver.
    pub distance_m:    f64,
    /// Expected time to drive that stretch.
    pub duration_s:    f64,
    pub road_name:     String,
}

// ── Congestion ────────────────────────────────────────────────────────────────

/// Traffic severity of one geometry edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Congestion {
    /// No data for this edge; drawn without an overlay.
    #[default]
    Unknown,
    Low,
    Moderate,
    Heavy,
    Severe,
}

impl Congestion {
    /// Parse a provider label.  Anything unrecognised maps to `Unknown`
    /// rather than failing.
    pub fn parse(label: &str) -> Self {
        match label {
            "low"      => Congestion::Low,
            "moderate" => Congestion::Moderate,
            "heavy"    => Congestion::Heavy,
            "severe"   => Congestion::Severe,
            _          => Congestion::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Congestion::Unknown  => "unknown",
            Congestion::Low      => "low",
            Congestion::Moderate => "moderate",
            Congestion::Heavy    => "heavy",
            Congestion::Severe   => "severe",
        }
    }

    #[inline]
    pub fn has_overlay(self) -> bool {
        self != Congestion::Unknown
    }
}

/// A run of consecutive edges sharing one severity, ready to draw as a
/// single colored line.
#[derive(Debug, Clone, PartialEq)]
pub struct CongestionSegment {
    pub severity: Congestion,
    pub points:   Vec<GeoPoint>,
}

// ── RouteSplit ────────────────────────────────────────────────────────────────

/// A plan's geometry cut at the traveler's position.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSplit {
    /// Where the position projects onto the plan line.
    pub projection: Projection,
    /// From the plan origin up to and including the cut point.
    pub traversed:  Vec<GeoPoint>,
    /// From the cut point to the destination.
    pub remaining:  Vec<GeoPoint>,
}

impl RouteSplit {
    /// Perpendicular distance from the position to the plan line.
    #[inline]
    pub fn deviation_m(&self) -> f64 {
        self.projection.distance_m
    }
}

// ── RoutePlan ─────────────────────────────────────────────────────────────────

/// The route currently being followed.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    line:             RouteLine,
    steps:            Vec<Step>,
    congestion:       Vec<Congestion>,
    total_distance_m: f64,
    total_duration_s: f64,
}

impl RoutePlan {
    /// Build a plan from provider output.
    ///
    /// - Fewer than two finite geometry points is an error.
    /// - `congestion` must hold exactly one entry per geometry edge; any other
    ///   length (or a geometry with dropped non-finite vertices) makes the
    ///   congestion data unavailable instead of failing.
    /// - Non-finite or non-positive totals fall back to the geometry length
    ///   and the sum of step durations.
    pub fn new(
        geometry:         Vec<GeoPoint>,
        steps:            Vec<Step>,
        congestion:       Vec<Congestion>,
        total_distance_m: f64,
        total_duration_s: f64,
    ) -> RouteResult<Self> {
        let raw_len = geometry.len();
        let line = RouteLine::new(geometry);
        if line.is_degenerate() {
            return Err(RouteError::DegenerateGeometry { points: line.len() });
        }

        for (index, step) in steps.iter().enumerate() {
            if !step.location.is_finite() {
                return Err(RouteError::InvalidStep {
                    index,
                    reason: "maneuver location is not a finite coordinate".into(),
                });
            }
        }

        let congestion = if congestion.is_empty() {
            congestion
        } else if line.len() == raw_len && congestion.len() == raw_len - 1 {
            congestion
        } else {
            warn!(
                "congestion annotations unavailable: {} entries for {} geometry edges",
                congestion.len(),
                raw_len.saturating_sub(1),
            );
            Vec::new()
        };

        let total_distance_m = if total_distance_m.is_finite() && total_distance_m > 0.0 {
            total_distance_m
        } else {
            line.total_m()
        };
        let total_duration_s = if total_duration_s.is_finite() && total_duration_s >= 0.0 {
            total_duration_s
        } else {
            steps.iter().map(|s| s.duration_s.max(0.0)).sum()
        };

        Ok(Self { line, steps, congestion, total_distance_m, total_duration_s })
    }

    /// Rebuild a plan from a persisted snapshot.
    ///
    /// Snapshots carry no congestion or provider totals, so the distance is
    /// the geometry length and the duration is the sum of step durations.
    pub fn from_snapshot(snapshot: &PlanSnapshot) -> RouteResult<Self> {
        Self::new(
            snapshot.route_geometry.clone(),
            snapshot.steps.clone(),
            Vec::new(),
            f64::NAN,
            f64::NAN,
        )
    }

    /// The persistence record for this plan.
    pub fn to_snapshot(&self, eta: Timestamp, current_road_name: impl Into<String>) -> PlanSnapshot {
        PlanSnapshot {
            route_geometry:    self.line.points().to_vec(),
            steps:             self.steps.clone(),
            eta,
            current_road_name: current_road_name.into(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn geometry(&self) -> &[GeoPoint] {
        self.line.points()
    }

    pub fn line(&self) -> &RouteLine {
        &self.line
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Per-edge congestion; empty when unavailable.
    pub fn congestion(&self) -> &[Congestion] {
        &self.congestion
    }

    pub fn has_congestion(&self) -> bool {
        !self.congestion.is_empty()
    }

    pub fn total_distance_m(&self) -> f64 {
        self.total_distance_m
    }

    pub fn total_duration_s(&self) -> f64 {
        self.total_duration_s
    }

    pub fn origin(&self) -> GeoPoint {
        // Non-degenerate by construction.
        self.line.first().unwrap_or_default()
    }

    pub fn destination(&self) -> GeoPoint {
        self.line.last().unwrap_or_default()
    }

    // ── Derived geometry ──────────────────────────────────────────────────

    /// Cut the geometry at the projection of `position`.
    ///
    /// Returns `None` only for a non-finite position.
    pub fn split_at(&self, position: GeoPoint) -> Option<RouteSplit> {
        let projection = self.line.project(position)?;
        let (traversed, remaining) = self.line.split_at(&projection);
        Some(RouteSplit { projection, traversed, remaining })
    }

    /// Merge consecutive edges of equal severity into drawable segments.
    /// Edges without data are skipped.
    pub fn congestion_segments(&self) -> Vec<CongestionSegment> {
        let points = self.line.points();
        let mut out: Vec<CongestionSegment> = Vec::new();
        let mut prev: Option<Congestion> = None;

        for (edge, &severity) in self.congestion.iter().enumerate() {
            if !severity.has_overlay() {
                prev = None;
                continue;
            }
            match out.last_mut() {
                Some(seg) if prev == Some(severity) => seg.points.push(points[edge + 1]),
                _ => out.push(CongestionSegment {
                    severity,
                    points: vec![points[edge], points[edge + 1]],
                }),
            };
            prev = Some(severity);
        }
        out
    }
}

// ── PlanSnapshot ──────────────────────────────────────────────────────────────

/// What the persistence collaborator stores after each plan change, and reads
/// back when a suspended session resumes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanSnapshot {
    pub route_geometry:    Vec<GeoPoint>,
    pub steps:             Vec<Step>,
    pub eta:               Timestamp,
    pub current_road_name: String,
}
