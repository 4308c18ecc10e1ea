//! Session observer trait for UI updates and trip recording.

use std::fmt;

use nav_core::PlanRevision;
use nav_route::{ArrivalSummary, DirectionsError, RoutePlan, RouteState, TrackedPosition, Transition};

use crate::RecalcReason;

/// Callbacks invoked by the session at key points of the per-event pipeline.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — console printer
///
/// ```rust,ignore
/// struct Printer;
///
/// impl SessionObserver for Printer {
///     fn on_position(&mut self, _: &TrackedPosition, _: &Transition, state: Option<&RouteState>) {
///         if let Some(s) = state {
///             println!("{:.0} m left, eta {}", s.remaining_m, s.eta);
///         }
///     }
/// }
/// ```
pub trait SessionObserver {
    /// Called after every change of the tracked position.
    ///
    /// `state` is `None` while no plan is active.
    fn on_position(
        &mut self,
        _position:   &TrackedPosition,
        _transition: &Transition,
        _state:      Option<&RouteState>,
    ) {}

    /// Called whenever a new plan becomes active.
    fn on_plan_replaced(&mut self, _revision: PlanRevision, _plan: &RoutePlan, _reason: PlanSource) {}

    /// A recalculation failed; the previous plan stays active.  Not meant to
    /// interrupt the traveler.
    fn on_recalculation_failed(&mut self, _reason: RecalcReason, _error: &DirectionsError) {}

    /// The session has no plan because the first route request failed.  The
    /// UI should offer a retry (see `SessionHandle::retry_initial_route`).
    fn on_initial_route_failed(&mut self, _error: &DirectionsError) {}

    /// The arrival flag flipped.
    fn on_arrival_changed(&mut self, _arrived: bool) {}

    /// Trip summary, produced once per plan revision on arrival.
    fn on_arrival(&mut self, _summary: &ArrivalSummary) {}

    /// Called once when the session ends.
    fn on_session_end(&mut self, _odometer_m: f64) {}
}

/// Where an active plan came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlanSource {
    /// Supplied by the caller when the session started.
    Provided,
    /// Computed by the directions provider.
    Computed(RecalcReason),
    /// Reloaded from the plan store on resume.
    Restored,
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanSource::Provided         => f.write_str("provided"),
            PlanSource::Computed(reason) => write!(f, "computed:{reason}"),
            PlanSource::Restored         => f.write_str("restored"),
        }
    }
}

/// A [`SessionObserver`] that does nothing.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
