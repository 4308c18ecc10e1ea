//! Directions-provider port.
//!
//! # Pluggability
//!
//! The session calls routing through the [`DirectionsClient`] trait, so the
//! HTTP adapter in `nav-directions` can be swapped for a scripted client in
//! tests and replays, or for another provider, without touching the engine.
//!
//! # Timeouts
//!
//! Implementations need not bound their own latency; the session wraps every
//! call in its configured timeout and treats expiry as
//! [`DirectionsError::Network`].

use async_trait::async_trait;

use nav_core::{AvoidSet, GeoPoint, RoutingProfile};

use crate::{DirectionsError, RoutePlan};

// ── RouteRequest ──────────────────────────────────────────────────────────────

/// Everything the provider needs to compute one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin:      GeoPoint,
    /// Intermediate stops, visited in order.
    pub stops:       Vec<GeoPoint>,
    pub destination: GeoPoint,
    pub avoid:       AvoidSet,
    pub profile:     RoutingProfile,
}

impl RouteRequest {
    pub fn new(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin,
            stops:   Vec::new(),
            destination,
            avoid:   AvoidSet::EMPTY,
            profile: RoutingProfile::default(),
        }
    }

    pub fn with_stops(mut self, stops: Vec<GeoPoint>) -> Self {
        self.stops = stops;
        self
    }

    pub fn with_avoid(mut self, avoid: AvoidSet) -> Self {
        self.avoid = avoid;
        self
    }

    pub fn with_profile(mut self, profile: RoutingProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Ordered waypoints: origin, stops, destination.  Always at least two.
    pub fn waypoints(&self) -> Vec<GeoPoint> {
        let mut out = Vec::with_capacity(self.stops.len() + 2);
        out.push(self.origin);
        out.extend_from_slice(&self.stops);
        out.push(self.destination);
        out
    }
}

// ── DirectionsClient ──────────────────────────────────────────────────────────

/// Computes routes between waypoints.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync + 'static`: the session shares one
/// client behind an `Arc` and calls it from spawned tasks.
#[async_trait]
pub trait DirectionsClient: Send + Sync + 'static {
    /// Compute a route through `request.waypoints()`.
    ///
    /// An empty provider answer is [`DirectionsError::NoRouteFound`];
    /// missing or inconsistent congestion data is not an error.
    async fn compute_route(&self, request: &RouteRequest) -> Result<RoutePlan, DirectionsError>;
}
