//! Flat row types written by every trip-log backend.
//!
//! Optional columns are `None` while no plan is active.

/// One tracked-position update.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub timestamp_ms: i64,
    pub raw_lon:      f64,
    pub raw_lat:      f64,
    pub snapped_lon:  f64,
    pub snapped_lat:  f64,
    pub speed_kmh:    f64,
    pub deviation_m:  Option<f64>,
    pub remaining_m:  Option<f64>,
    pub eta_ms:       Option<i64>,
    pub step:         Option<u32>,
}

/// One plan change.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRow {
    pub revision:         u32,
    pub source:           String,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub step_count:       u32,
}

/// One arrival summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalRow {
    pub arrival_ms:       i64,
    pub eta_planned_ms:   i64,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub time_saved_s:     f64,
    pub fuel_used_liters: Option<f64>,
}
