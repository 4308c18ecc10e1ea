//! `TripLogObserver<W>` — bridges `SessionObserver` to a `TripLogWriter`.

use log::warn;

use nav_core::PlanRevision;
use nav_route::{ArrivalSummary, RoutePlan, RouteState, TrackedPosition, Transition};
use nav_session::{PlanSource, SessionObserver};

use crate::row::{ArrivalRow, PlanRow, PositionRow};
use crate::writer::TripLogWriter;
use crate::{StoreError, StoreResult};

/// A [`SessionObserver`] that records positions, plan changes and arrival
/// summaries to any [`TripLogWriter`] backend (CSV, SQLite).
///
/// Errors from the writer are stored internally because `SessionObserver`
/// methods have no return value.  After the session ends, check for errors
/// with [`take_error`][Self::take_error].
pub struct TripLogObserver<W: TripLogWriter> {
    writer:     W,
    last_error: Option<StoreError>,
}

impl<W: TripLogWriter> TripLogObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<StoreError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the session).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: StoreResult<()>) {
        if let Err(e) = result {
            warn!("trip log write failed: {e}");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: TripLogWriter> SessionObserver for TripLogObserver<W> {
    fn on_position(&mut self, position: &TrackedPosition, _: &Transition, state: Option<&RouteState>) {
        let row = PositionRow {
            timestamp_ms: position.updated_at.0,
            raw_lon:      position.raw.position.lon,
            raw_lat:      position.raw.position.lat,
            snapped_lon:  position.snapped.lon,
            snapped_lat:  position.snapped.lat,
            speed_kmh:    position.speed_kmh,
            deviation_m:  state.map(|s| s.deviation_m),
            remaining_m:  state.map(|s| s.remaining_m),
            eta_ms:       state.map(|s| s.eta.0),
            step:         state.map(|s| s.current_step as u32),
        };
        let result = self.writer.write_position(&row);
        self.store_err(result);
    }

    fn on_plan_replaced(&mut self, revision: PlanRevision, plan: &RoutePlan, source: PlanSource) {
        let row = PlanRow {
            revision:         revision.0,
            source:           source.to_string(),
            total_distance_m: plan.total_distance_m(),
            total_duration_s: plan.total_duration_s(),
            step_count:       plan.steps().len() as u32,
        };
        let result = self.writer.write_plan(&row);
        self.store_err(result);
    }

    fn on_arrival(&mut self, summary: &ArrivalSummary) {
        let row = ArrivalRow {
            arrival_ms:       summary.arrival_actual.0,
            eta_planned_ms:   summary.eta_planned.0,
            total_distance_m: summary.total_distance_m,
            total_duration_s: summary.total_duration_s,
            time_saved_s:     summary.time_saved_s,
            fuel_used_liters: summary.fuel_used_liters,
        };
        let result = self.writer.write_arrival(&row);
        self.store_err(result);
    }

    fn on_session_end(&mut self, _odometer_m: f64) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
