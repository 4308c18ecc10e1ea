//! Arrival detection and the trip-completion summary.

use nav_core::{GeoPoint, NavConfig, PlanRevision, Timestamp};

/// Outcome of one [`ArrivalDetector::evaluate`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct ArrivalCheck {
    pub arrived:       bool,
    /// `arrived` flipped from `false` to `true` on this evaluation.
    pub newly_arrived: bool,
    /// A summary should be produced now.
    pub summary_due:   bool,
}

/// Proximity-based arrival flag with hysteresis.
///
/// Arrival is not sticky: if the remaining distance climbs back over the
/// threshold (for example after a re-route) the flag clears.  A summary is
/// due once per plan revision.
#[derive(Debug, Clone)]
pub struct ArrivalDetector {
    threshold_m: f64,
    arrived:     bool,
    summarized:  Option<PlanRevision>,
}

impl ArrivalDetector {
    pub fn new(config: &NavConfig) -> Self {
        Self::with_threshold(config.arrival_threshold_m)
    }

    pub fn with_threshold(threshold_m: f64) -> Self {
        Self { threshold_m, arrived: false, summarized: None }
    }

    pub fn is_arrived(&self) -> bool {
        self.arrived
    }

    pub fn evaluate(&mut self, remaining_m: f64, revision: PlanRevision) -> ArrivalCheck {
        let was = self.arrived;
        self.arrived = remaining_m.is_finite() && remaining_m < self.threshold_m;

        let summary_due = self.arrived && self.summarized != Some(revision);
        if summary_due {
            self.summarized = Some(revision);
        }

        ArrivalCheck {
            arrived:       self.arrived,
            newly_arrived: self.arrived && !was,
            summary_due,
        }
    }
}

/// Trip-completion figures, produced once on arrival.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrivalSummary {
    pub destination:      GeoPoint,
    /// Distance actually driven.
    pub total_distance_m: f64,
    /// Wall-clock time from session start to arrival.
    pub total_duration_s: f64,
    /// `None` when no consumption rate is configured.
    pub fuel_used_liters: Option<f64>,
    pub eta_planned:      Timestamp,
    pub arrival_actual:   Timestamp,
    pub time_saved_s:     f64,
}

impl ArrivalSummary {
    pub fn new(
        destination:      GeoPoint,
        total_distance_m: f64,
        started_at:       Timestamp,
        arrival_actual:   Timestamp,
        fuel_used_liters: Option<f64>,
        eta_planned:      Timestamp,
    ) -> Self {
        Self {
            destination,
            total_distance_m,
            total_duration_s: arrival_actual.secs_since(started_at).max(0.0),
            fuel_used_liters,
            eta_planned,
            arrival_actual,
            time_saved_s: eta_planned.secs_since(arrival_actual).max(0.0),
        }
    }
}
