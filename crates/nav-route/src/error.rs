use thiserror::Error;

/// Errors building or restoring a [`RoutePlan`][crate::RoutePlan].
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route geometry needs at least 2 finite points, got {points}")]
    DegenerateGeometry { points: usize },

    #[error("step {index} is invalid: {reason}")]
    InvalidStep { index: usize, reason: String },
}

pub type RouteResult<T> = Result<T, RouteError>;

/// Failure of a [`DirectionsClient`][crate::DirectionsClient] call.
///
/// The recalculation coordinator keeps the previous plan for every variant;
/// they differ only in whether an automatic retry is allowed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectionsError {
    /// Transport failure or timeout.  Retryable after the cooldown.
    #[error("network error: {0}")]
    Network(String),

    /// The provider could not route between the waypoints.  Not retried
    /// until the trip inputs change.
    #[error("no route found: {0}")]
    NoRouteFound(String),

    /// The response could not be interpreted.  Retried like `Network`.
    #[error("malformed directions response: {0}")]
    MalformedResponse(String),
}

impl DirectionsError {
    /// `true` if an identical request may succeed later.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DirectionsError::NoRouteFound(_))
    }

    /// Short machine-readable label, used in logs and trip records.
    pub fn kind(&self) -> &'static str {
        match self {
            DirectionsError::Network(_)           => "network",
            DirectionsError::NoRouteFound(_)      => "no_route_found",
            DirectionsError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Failure of a [`RoadSnapClient`][crate::RoadSnapClient] call.  Always
/// non-fatal: the tracker falls back to the raw fix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapError {
    #[error("road snap network error: {0}")]
    Network(String),

    #[error("no road match for the requested points")]
    NoMatch,

    #[error("road snap timed out")]
    Timeout,
}
