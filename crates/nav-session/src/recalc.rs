//! Off-route detection and the recalculation coordinator.
//!
//! # State machine
//!
//! ```text
//!            off-route (deviation > threshold, moving),
//!            nothing pending, rate window elapsed
//!   OnRoute ───────────────────────────────────────────► Pending
//!      ▲  ▲                                                │  │
//!      │  └──────────────── success ───────────────────────┘  │
//!      │                                                       │ failure
//!      └──── window elapsed (tick or next off-route) ── Cooldown ◄┘
//! ```
//!
//! Forced requests (avoid options or profile changed, initial route, retry)
//! skip the off-route test and the rate window but still respect
//! single-flight: a force while `Pending` only marks the coordinator dirty,
//! and exactly one follow-up is issued once the in-flight request resolves.
//!
//! The coordinator performs no I/O.  It hands out [`RecalculationRequest`]s
//! and is told about their outcome through [`resolve`][RecalculationCoordinator::resolve].

use std::fmt;

use log::{debug, info, warn};

use nav_core::{AvoidSet, GeoPoint, NavConfig, RequestId, RoutingProfile, Timestamp};
use nav_route::{DirectionsError, RouteRequest};

// ── Trip ──────────────────────────────────────────────────────────────────────

/// The traveler's intent: where to go and how.  Changes to `avoid` or
/// `profile` force a recalculation.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub destination: GeoPoint,
    /// Intermediate stops still ahead, in visiting order.
    pub stops:       Vec<GeoPoint>,
    pub avoid:       AvoidSet,
    pub profile:     RoutingProfile,
}

impl Trip {
    pub fn new(destination: GeoPoint) -> Self {
        Self {
            destination,
            stops:   Vec::new(),
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

    /// Drop leading stops within `radius_m` of `position`.  Returns how many
    /// were removed.
    pub fn drop_reached_stops(&mut self, position: GeoPoint, radius_m: f64) -> usize {
        let reached = self
            .stops
            .iter()
            .take_while(|s| position.distance_m(**s) < radius_m)
            .count();
        self.stops.drain(..reached);
        reached
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// Why a route computation was started.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecalcReason {
    /// First route of a session started without one.
    Initial,
    /// The traveler left the active plan.
    OffRoute,
    /// Avoid options or routing profile changed.
    OptionsChanged,
    /// The caller retried after an initial-route failure.
    Retry,
}

impl RecalcReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RecalcReason::Initial        => "initial",
            RecalcReason::OffRoute       => "off_route",
            RecalcReason::OptionsChanged => "options_changed",
            RecalcReason::Retry          => "retry",
        }
    }
}

impl fmt::Display for RecalcReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One route computation.  At most one is outstanding per session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalculationRequest {
    pub id:          RequestId,
    /// Snapped position when the request was created; never updated.
    pub origin:      GeoPoint,
    pub destination: GeoPoint,
    pub stops:       Vec<GeoPoint>,
    pub avoid:       AvoidSet,
    pub profile:     RoutingProfile,
    pub reason:      RecalcReason,
    pub issued_at:   Timestamp,
}

impl RecalculationRequest {
    /// The directions-provider call for this request.
    pub fn route_request(&self) -> RouteRequest {
        RouteRequest::new(self.origin, self.destination)
            .with_stops(self.stops.clone())
            .with_avoid(self.avoid)
            .with_profile(self.profile)
    }
}

// ── Coordinator ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecalcPhase {
    OnRoute,
    Pending,
    Cooldown { until: Timestamp },
}

/// What [`RecalculationCoordinator::resolve`] made of a result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Not the pending request; the result must be dropped.
    Stale,
    Succeeded { reason: RecalcReason },
    Failed { reason: RecalcReason, retryable: bool },
}

#[derive(Debug)]
pub struct RecalculationCoordinator {
    off_route_threshold_m: f64,
    cooldown_ms:           i64,
    phase:                 RecalcPhase,
    pending:               Option<RecalculationRequest>,
    last_attempt:          Option<Timestamp>,
    /// A forced request arrived while one was pending.
    dirty:                 Option<RecalcReason>,
    /// The provider found no route; automatic retries wait for new inputs.
    no_route_hold:         bool,
    next_id:               RequestId,
}

impl RecalculationCoordinator {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            off_route_threshold_m: config.off_route_threshold_m,
            cooldown_ms:           config.recalc_cooldown_ms,
            phase:                 RecalcPhase::OnRoute,
            pending:               None,
            last_attempt:          None,
            dirty:                 None,
            no_route_hold:         false,
            next_id:               RequestId(0),
        }
    }

    pub fn phase(&self) -> RecalcPhase {
        self.phase
    }

    pub fn pending(&self) -> Option<&RecalculationRequest> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_follow_up(&self) -> bool {
        self.dirty.is_some()
    }

    /// Off-route test: beyond the tolerance while moving.  Stationary
    /// divergence is GPS noise, not a departure from the route.
    pub fn is_off_route(&self, deviation_m: f64, speed_kmh: f64) -> bool {
        deviation_m.is_finite() && deviation_m > self.off_route_threshold_m && speed_kmh > 0.0
    }

    /// Evaluate a fresh position.  Returns a request to start, if any.
    pub fn on_position(
        &mut self,
        deviation_m: f64,
        speed_kmh:   f64,
        origin:      GeoPoint,
        trip:        &Trip,
        now:         Timestamp,
    ) -> Option<RecalculationRequest> {
        if !self.is_off_route(deviation_m, speed_kmh) {
            return None;
        }
        self.tick(now);

        if self.pending.is_some() {
            debug!("off-route by {deviation_m:.1} m; recalculation already pending");
            return None;
        }
        if self.no_route_hold {
            debug!("off-route by {deviation_m:.1} m; holding after no-route answer");
            return None;
        }
        if !self.window_elapsed(now) {
            debug!("off-route by {deviation_m:.1} m; inside rate window");
            return None;
        }

        info!("off-route by {deviation_m:.1} m at {speed_kmh:.1} km/h; recalculating");
        Some(self.issue(origin, trip, RecalcReason::OffRoute, now))
    }

    /// Request a route regardless of position and rate window.
    ///
    /// While a request is pending this only records that one follow-up is
    /// owed; repeated forces still yield a single follow-up.
    pub fn force(
        &mut self,
        origin: GeoPoint,
        trip:   &Trip,
        reason: RecalcReason,
        now:    Timestamp,
    ) -> Option<RecalculationRequest> {
        self.no_route_hold = false;
        if self.pending.is_some() {
            debug!("{reason} recalculation queued behind the pending request");
            self.dirty = Some(reason);
            return None;
        }
        Some(self.issue(origin, trip, reason, now))
    }

    /// Record the outcome of request `id`.
    pub fn resolve(
        &mut self,
        id:      RequestId,
        outcome: Result<(), &DirectionsError>,
        now:     Timestamp,
    ) -> Resolution {
        let Some(request) = self.pending.take_if(|r| r.id == id) else {
            debug!("discarding stale route result {id}");
            return Resolution::Stale;
        };

        match outcome {
            Ok(()) => {
                self.phase = RecalcPhase::OnRoute;
                Resolution::Succeeded { reason: request.reason }
            }
            Err(e) => {
                let until = now.offset_ms(self.cooldown_ms);
                warn!("{} recalculation failed ({e}); cooling down until {until}", request.reason);
                self.phase = RecalcPhase::Cooldown { until };
                let retryable = e.is_retryable();
                if !retryable {
                    self.no_route_hold = true;
                }
                Resolution::Failed { reason: request.reason, retryable }
            }
        }
    }

    /// Issue the follow-up owed by a force that arrived while pending.
    pub fn follow_up(
        &mut self,
        origin: GeoPoint,
        trip:   &Trip,
        now:    Timestamp,
    ) -> Option<RecalculationRequest> {
        if self.pending.is_some() {
            return None;
        }
        let reason = self.dirty.take()?;
        Some(self.issue(origin, trip, reason, now))
    }

    /// Expire the cooldown.  Returns `true` if the phase changed.
    pub fn tick(&mut self, now: Timestamp) -> bool {
        match self.phase {
            RecalcPhase::Cooldown { until } if now >= until => {
                self.phase = RecalcPhase::OnRoute;
                true
            }
            _ => false,
        }
    }

    /// Forget the pending request and any owed follow-up.  A late result for
    /// the forgotten request resolves as stale.
    pub fn abandon(&mut self) {
        if let Some(req) = self.pending.take() {
            debug!("abandoning pending recalculation {}", req.id);
        }
        self.dirty = None;
        if self.phase == RecalcPhase::Pending {
            self.phase = RecalcPhase::OnRoute;
        }
    }

    fn window_elapsed(&self, now: Timestamp) -> bool {
        let cooled = match self.phase {
            RecalcPhase::Cooldown { until } => now >= until,
            _ => true,
        };
        let spaced = match self.last_attempt {
            None       => true,
            Some(last) => now.millis_since(last) >= self.cooldown_ms,
        };
        cooled && spaced
    }

    fn issue(
        &mut self,
        origin: GeoPoint,
        trip:   &Trip,
        reason: RecalcReason,
        now:    Timestamp,
    ) -> RecalculationRequest {
        let id = self.next_id;
        self.next_id = id.next();
        self.last_attempt = Some(now);
        self.phase = RecalcPhase::Pending;

        let request = RecalculationRequest {
            id,
            origin,
            destination: trip.destination,
            stops:       trip.stops.clone(),
            avoid:       trip.avoid,
            profile:     trip.profile,
            reason,
            issued_at:   now,
        };
        self.pending = Some(request.clone());
        request
    }
}
