//! Engine configuration.
//!
//! Every threshold and time window the engine uses lives here so applications
//! can tune them (for example, scale the off-route tolerance with GPS
//! accuracy) without touching engine code.  Typically loaded from a TOML file
//! by the application and handed to the session builder.

use crate::{NavError, NavResult};

/// Top-level engine configuration.
///
/// `Default` yields the production constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavConfig {
    /// Minimum raw movement (metres) since the last tracked position before a
    /// road-snap is requested.
    pub movement_threshold_m: f64,

    /// At most one road-snap request is started per window of this length.
    pub snap_window_ms: i64,

    /// Perpendicular distance from the plan line beyond which a moving
    /// traveler counts as off-route.
    pub off_route_threshold_m: f64,

    /// Minimum spacing between recalculation attempts, and the cooldown after
    /// a failed one.
    pub recalc_cooldown_ms: i64,

    /// Remaining distance below which the traveler counts as arrived.
    pub arrival_threshold_m: f64,

    /// Distance to the upcoming maneuver at which the step index advances.
    pub step_advance_m: f64,

    /// Above this speed the remaining duration is derived from measured
    /// speed; at or below it, from the remaining steps' durations.
    pub min_speed_for_eta_kmh: f64,

    /// Upper bound on any collaborator network call.
    pub request_timeout_ms: u64,

    /// Length of the rendered position transition.
    pub transition_ms: i64,

    /// Period of the session timer that expires cooldowns and flushes
    /// coalesced snap input.
    pub tick_interval_ms: u64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            movement_threshold_m:  10.0,
            snap_window_ms:        3_000,
            off_route_threshold_m: 30.0,
            recalc_cooldown_ms:    10_000,
            arrival_threshold_m:   70.0,
            step_advance_m:        10.0,
            min_speed_for_eta_kmh: 5.0,
            request_timeout_ms:    15_000,
            transition_ms:         500,
            tick_interval_ms:      1_000,
        }
    }
}

impl NavConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> NavResult<()> {
        let positive = [
            ("movement_threshold_m",  self.movement_threshold_m),
            ("off_route_threshold_m", self.off_route_threshold_m),
            ("arrival_threshold_m",   self.arrival_threshold_m),
            ("step_advance_m",        self.step_advance_m),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(NavError::Config(format!("{name} must be > 0, got {value}")));
            }
        }
        if !self.min_speed_for_eta_kmh.is_finite() || self.min_speed_for_eta_kmh < 0.0 {
            return Err(NavError::Config(format!(
                "min_speed_for_eta_kmh must be >= 0, got {}",
                self.min_speed_for_eta_kmh
            )));
        }
        let windows = [
            ("snap_window_ms",     self.snap_window_ms),
            ("recalc_cooldown_ms", self.recalc_cooldown_ms),
            ("transition_ms",      self.transition_ms),
        ];
        for (name, value) in windows {
            if value < 0 {
                return Err(NavError::Config(format!("{name} must be >= 0, got {value}")));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(NavError::Config("request_timeout_ms must be > 0".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(NavError::Config("tick_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}
