//! Route progress: traveled/remaining metrics, ETA, and the current step.
//!
//! [`recompute`] is the pure derivation from a plan and a split.
//! [`RouteProgress`] wraps it with the two pieces of state that must survive
//! between fixes: the current step index and the memoized ETA.

use nav_core::{GeoPoint, NavConfig, Timestamp};
use nav_geometry::length;

use crate::{RoutePlan, RouteSplit, Step};

/// Which estimate produced `remaining_duration_s`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DurationMode {
    /// `remaining_km / speed_kmh * 3600`.
    MeasuredSpeed,
    /// Sum of the unconsumed steps' provider durations.
    StepDurations,
}

/// Progress along the active plan at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteState {
    pub traversed:                   Vec<GeoPoint>,
    pub remaining:                   Vec<GeoPoint>,
    pub traveled_m:                  f64,
    pub remaining_m:                 f64,
    pub remaining_duration_s:        f64,
    /// `traveled_m / total_distance_m`, clamped to `[0, 1]`.
    pub progress:                    f64,
    pub eta:                         Timestamp,
    /// Distance from the tracked position to the plan line.
    pub deviation_m:                 f64,
    pub current_step:                usize,
    /// Instruction of the next pending maneuver, if any.
    pub next_instruction:            Option<String>,
    pub distance_to_next_maneuver_m: Option<f64>,
    pub current_road_name:           String,
    pub duration_mode:               DurationMode,
}

/// Remaining duration from measured speed, or from unconsumed step durations
/// when the traveler is at or below `min_speed_kmh`.
pub fn remaining_duration(
    steps:         &[Step],
    remaining_m:   f64,
    speed_kmh:     f64,
    current_step:  usize,
    min_speed_kmh: f64,
) -> (f64, DurationMode) {
    if speed_kmh.is_finite() && speed_kmh > min_speed_kmh {
        let secs = (remaining_m / 1_000.0) / speed_kmh * 3_600.0;
        (secs, DurationMode::MeasuredSpeed)
    } else {
        let secs = steps
            .iter()
            .skip(current_step)
            .map(|s| if s.duration_s.is_finite() { s.duration_s.max(0.0) } else { 0.0 })
            .sum();
        (secs, DurationMode::StepDurations)
    }
}

/// Derive the route state for a plan split at the tracked position.
///
/// `eta` is always `now + remaining_duration_s`; memoization is the job of
/// [`RouteProgress`].
pub fn recompute(
    plan:          &RoutePlan,
    split:         &RouteSplit,
    snapped:       GeoPoint,
    speed_kmh:     f64,
    current_step:  usize,
    min_speed_kmh: f64,
    now:           Timestamp,
) -> RouteState {
    let traveled_m = length(&split.traversed);
    let remaining_m = length(&split.remaining);

    let (remaining_duration_s, duration_mode) =
        remaining_duration(plan.steps(), remaining_m, speed_kmh, current_step, min_speed_kmh);

    let total = plan.total_distance_m();
    let progress = if total > 0.0 { (traveled_m / total).clamp(0.0, 1.0) } else { 0.0 };

    let steps = plan.steps();
    let next = steps.get(current_step + 1);

    RouteState {
        traversed: split.traversed.clone(),
        remaining: split.remaining.clone(),
        traveled_m,
        remaining_m,
        remaining_duration_s,
        progress,
        eta: now.offset_secs(remaining_duration_s),
        deviation_m: split.deviation_m(),
        current_step,
        next_instruction: next.map(|s| s.instruction.clone()),
        distance_to_next_maneuver_m: next.map(|s| snapped.distance_m(s.location)),
        current_road_name: steps
            .get(current_step)
            .map(|s| s.road_name.clone())
            .unwrap_or_default(),
        duration_mode,
    }
}

// ── RouteProgress ─────────────────────────────────────────────────────────────

/// Per-plan progress bookkeeping.  Reset whenever the plan is replaced.
#[derive(Debug, Clone)]
pub struct RouteProgress {
    step_advance_m: f64,
    min_speed_kmh:  f64,
    current_step:   usize,
    /// Remaining duration (whole seconds) the current ETA was computed from.
    eta_memo:       Option<(i64, Timestamp)>,
}

impl RouteProgress {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            step_advance_m: config.step_advance_m,
            min_speed_kmh:  config.min_speed_for_eta_kmh,
            current_step:   0,
            eta_memo:       None,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Forget step and ETA state for a fresh plan.
    pub fn reset(&mut self) {
        self.current_step = 0;
        self.eta_memo = None;
    }

    /// Advance the step index, derive the state, and refresh the ETA only
    /// if the remaining duration changed.
    pub fn update(
        &mut self,
        plan:      &RoutePlan,
        split:     &RouteSplit,
        snapped:   GeoPoint,
        speed_kmh: f64,
        now:       Timestamp,
    ) -> RouteState {
        self.advance_steps(plan.steps(), snapped);

        let mut state = recompute(
            plan,
            split,
            snapped,
            speed_kmh,
            self.current_step,
            self.min_speed_kmh,
            now,
        );

        let key = state.remaining_duration_s.round() as i64;
        match self.eta_memo {
            Some((memo_key, eta)) if memo_key == key => state.eta = eta,
            _ => self.eta_memo = Some((key, state.eta)),
        }
        state
    }

    fn advance_steps(&mut self, steps: &[Step], snapped: GeoPoint) {
        while let Some(next) = steps.get(self.current_step + 1) {
            if snapped.distance_m(next.location) >= self.step_advance_m {
                break;
            }
            self.current_step += 1;
        }
    }
}
