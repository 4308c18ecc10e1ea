//! `Navigator` — all mutable state of one navigation session.
//!
//! # Event pipeline
//!
//! ```text
//! fix / snap result ─► PositionTracker ─► split plan ─► RouteProgress
//!                                                          │
//!                        RecalculationCoordinator ◄────────┤ deviation, speed
//!                        ArrivalDetector          ◄────────┘ remaining
//! route result ─► coordinator.resolve ─► install plan | keep plan
//! ```
//!
//! The navigator performs no I/O.  Every handler returns the [`Effect`]s the
//! owner must carry out (network calls, persistence); their outcomes come
//! back as further events.  Observer hooks are called inline, in event order.
//!
//! All handlers are no-ops after [`finish`][Navigator::finish], which is how
//! results that arrive after the session ended are discarded.

use std::sync::Arc;

use log::{debug, info, warn};

use nav_core::{AvoidSet, GeoPoint, NavConfig, PlanRevision, RequestId, RoutingProfile, Timestamp};
use nav_route::{
    ArrivalDetector, ArrivalSummary, DirectionsError, Ingested, LocationFix, PlanSnapshot,
    PositionTracker, RoutePlan, RouteProgress, RouteState, SnapError, SnapRequest,
    TrackedPosition, fuel,
};

use crate::{
    PlanSource, RecalcPhase, RecalcReason, RecalculationCoordinator, RecalculationRequest,
    Resolution, SessionObserver, Trip,
};

// ── Effects ───────────────────────────────────────────────────────────────────

/// Work the navigator asks its owner to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call the road-snap collaborator; report via `on_snap_resolved`.
    SnapRoad(SnapRequest),
    /// Call the directions collaborator; report via `on_route_resolved`.
    ComputeRoute(RecalculationRequest),
    /// Save the snapshot to the plan store.
    PersistPlan(PlanSnapshot),
    /// Read the plan store; report via `on_plan_loaded`.
    LoadPlan,
}

// ── Preferences ───────────────────────────────────────────────────────────────

/// Traveler preferences supplied by the profile collaborator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preferences {
    pub consumption_km_per_liter: Option<f64>,
    pub avoid:                    AvoidSet,
    pub profile:                  RoutingProfile,
}

// ── Navigator ─────────────────────────────────────────────────────────────────

pub struct Navigator {
    config:         NavConfig,
    trip:           Trip,
    consumption:    Option<f64>,
    tracker:        PositionTracker,
    progress:       RouteProgress,
    arrival:        ArrivalDetector,
    coordinator:    RecalculationCoordinator,
    plan:           Option<Arc<RoutePlan>>,
    revision:       Option<PlanRevision>,
    state:          Option<RouteState>,
    odometer_m:     f64,
    odometer_at:    Option<GeoPoint>,
    started_at:     Option<Timestamp>,
    eta_planned:    Option<Timestamp>,
    summary:        Option<ArrivalSummary>,
    /// The initial route failed; wait for an explicit retry.
    awaiting_retry: bool,
    ended:          bool,
}

impl Navigator {
    /// A navigator for `trip`.  `snapping` selects whether fixes go through
    /// the road-snap collaborator.
    pub fn new(config: NavConfig, trip: Trip, snapping: bool) -> Self {
        let tracker = if snapping {
            PositionTracker::new(&config)
        } else {
            PositionTracker::without_snapping(&config)
        };
        Self {
            tracker,
            progress:       RouteProgress::new(&config),
            arrival:        ArrivalDetector::new(&config),
            coordinator:    RecalculationCoordinator::new(&config),
            config,
            trip,
            consumption:    None,
            plan:           None,
            revision:       None,
            state:          None,
            odometer_m:     0.0,
            odometer_at:    None,
            started_at:     None,
            eta_planned:    None,
            summary:        None,
            awaiting_retry: false,
            ended:          false,
        }
    }

    pub fn with_consumption(mut self, km_per_liter: Option<f64>) -> Self {
        self.consumption = km_per_liter;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn plan(&self) -> Option<&Arc<RoutePlan>> {
        self.plan.as_ref()
    }

    pub fn revision(&self) -> Option<PlanRevision> {
        self.revision
    }

    pub fn state(&self) -> Option<&RouteState> {
        self.state.as_ref()
    }

    pub fn position(&self) -> Option<&TrackedPosition> {
        self.tracker.position()
    }

    pub fn recalc_phase(&self) -> RecalcPhase {
        self.coordinator.phase()
    }

    pub fn pending_recalculation(&self) -> Option<&RecalculationRequest> {
        self.coordinator.pending()
    }

    pub fn is_arrived(&self) -> bool {
        self.arrival.is_arrived()
    }

    pub fn summary(&self) -> Option<&ArrivalSummary> {
        self.summary.as_ref()
    }

    /// Distance actually driven, summed over successive snapped positions.
    pub fn odometer_m(&self) -> f64 {
        self.odometer_m
    }

    /// Fuel burnt so far; `None` without a consumption rate or for profiles
    /// that burn no fuel.
    pub fn fuel_used_liters(&self) -> Option<f64> {
        if !self.trip.profile.burns_fuel() {
            return None;
        }
        fuel::estimate(self.odometer_m, self.consumption)
    }

    pub fn is_awaiting_retry(&self) -> bool {
        self.awaiting_retry
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    // ── Events ────────────────────────────────────────────────────────────

    /// Begin the session, optionally with a plan computed beforehand.
    /// Without one, the first fix requests the initial route.
    pub fn start<O: SessionObserver + ?Sized>(
        &mut self,
        plan: Option<RoutePlan>,
        now:  Timestamp,
        obs:  &mut O,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.started_at.get_or_insert(now);
        if let Some(plan) = plan {
            self.install_plan(plan, PlanSource::Provided, now, obs, &mut effects);
        }
        effects
    }

    pub fn on_fix<O: SessionObserver + ?Sized>(
        &mut self,
        fix: LocationFix,
        now: Timestamp,
        obs: &mut O,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.ended {
            return effects;
        }
        self.started_at.get_or_insert(now);

        let Some(ingested) = self.tracker.ingest(fix, self.plan.as_deref(), now) else {
            return effects;
        };
        self.apply_position(ingested, now, obs, &mut effects);
        effects
    }

    pub fn on_snap_resolved<O: SessionObserver + ?Sized>(
        &mut self,
        id:     RequestId,
        result: Result<GeoPoint, SnapError>,
        now:    Timestamp,
        obs:    &mut O,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.ended {
            return effects;
        }
        if let Some(ingested) = self.tracker.resolve_snap(id, result, self.plan.as_deref(), now) {
            self.apply_position(ingested, now, obs, &mut effects);
        }
        effects
    }

    pub fn on_route_resolved<O: SessionObserver + ?Sized>(
        &mut self,
        id:     RequestId,
        result: Result<RoutePlan, DirectionsError>,
        now:    Timestamp,
        obs:    &mut O,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.ended {
            return effects;
        }

        let reason = match self.coordinator.resolve(id, result.as_ref().map(|_| ()), now) {
            Resolution::Stale => return effects,
            Resolution::Succeeded { reason } | Resolution::Failed { reason, .. } => reason,
        };

        match result {
            Ok(plan) => {
                self.awaiting_retry = false;
                self.install_plan(plan, PlanSource::Computed(reason), now, obs, &mut effects);
            }
            Err(e) if self.plan.is_none() => {
                warn!("initial route failed: {e}");
                self.awaiting_retry = true;
                obs.on_initial_route_failed(&e);
            }
            Err(e) => obs.on_recalculation_failed(reason, &e),
        }

        if let Some(origin) = self.tracker.position().map(|p| p.snapped) {
            if let Some(req) = self.coordinator.follow_up(origin, &self.trip, now) {
                effects.push(Effect::ComputeRoute(req));
            }
        }
        effects
    }

    /// New preferences.  A changed avoid set or profile forces a
    /// recalculation; a changed consumption rate only affects fuel figures.
    pub fn on_preferences<O: SessionObserver + ?Sized>(
        &mut self,
        prefs: Preferences,
        now:   Timestamp,
        _obs:  &mut O,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.ended {
            return effects;
        }
        self.consumption = prefs.consumption_km_per_liter;

        if prefs.avoid == self.trip.avoid && prefs.profile == self.trip.profile {
            return effects;
        }
        info!(
            "routing options changed: avoid [{}] -> [{}], profile {} -> {}",
            self.trip.avoid, prefs.avoid, self.trip.profile, prefs.profile,
        );
        self.trip.avoid = prefs.avoid;
        self.trip.profile = prefs.profile;

        // Without a position the first fix will request with the new options.
        let Some(origin) = self.tracker.position().map(|p| p.snapped) else {
            return effects;
        };
        self.awaiting_retry = false;
        if let Some(req) = self.coordinator.force(origin, &self.trip, RecalcReason::OptionsChanged, now) {
            effects.push(Effect::ComputeRoute(req));
        }
        effects
    }

    /// Periodic timer: expire the recalculation cooldown and flush coalesced
    /// snap input.
    pub fn on_tick<O: SessionObserver + ?Sized>(&mut self, now: Timestamp, _obs: &mut O) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.ended {
            return effects;
        }
        if self.coordinator.tick(now) {
            debug!("recalculation cooldown over");
        }
        if let Some(req) = self.tracker.poll(now) {
            effects.push(Effect::SnapRoad(req));
        }
        effects
    }

    /// The application returned to the foreground.
    pub fn on_resume(&mut self) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        vec![Effect::LoadPlan]
    }

    /// Result of an `Effect::LoadPlan`.  A usable snapshot replaces the
    /// active plan; anything else keeps it.
    pub fn on_plan_loaded<O: SessionObserver + ?Sized>(
        &mut self,
        snapshot: Option<PlanSnapshot>,
        now:      Timestamp,
        obs:      &mut O,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.ended {
            return effects;
        }
        let Some(snapshot) = snapshot else {
            debug!("no persisted plan; keeping the active one");
            return effects;
        };
        match RoutePlan::from_snapshot(&snapshot) {
            Ok(plan) => {
                self.coordinator.abandon();
                self.tracker.reset_snaps();
                self.awaiting_retry = false;
                self.install_plan(plan, PlanSource::Restored, now, obs, &mut effects);
            }
            Err(e) => warn!("persisted plan unusable: {e}"),
        }
        effects
    }

    /// Retry the initial route after `on_initial_route_failed`.
    pub fn retry_initial_route<O: SessionObserver + ?Sized>(
        &mut self,
        now:  Timestamp,
        _obs: &mut O,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.ended || self.plan.is_some() {
            return effects;
        }
        self.awaiting_retry = false;
        let Some(origin) = self.tracker.position().map(|p| p.snapped) else {
            return effects;
        };
        if let Some(req) = self.coordinator.force(origin, &self.trip, RecalcReason::Retry, now) {
            effects.push(Effect::ComputeRoute(req));
        }
        effects
    }

    /// End the session.  Later events and late results are ignored.
    pub fn finish<O: SessionObserver + ?Sized>(&mut self, obs: &mut O) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.coordinator.abandon();
        self.tracker.reset_snaps();
        info!("session ended after {:.0} m", self.odometer_m);
        obs.on_session_end(self.odometer_m);
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn apply_position<O: SessionObserver + ?Sized>(
        &mut self,
        ingested: Ingested,
        now:      Timestamp,
        obs:      &mut O,
        effects:  &mut Vec<Effect>,
    ) {
        if let Some(req) = ingested.snap {
            effects.push(Effect::SnapRoad(req));
        }
        let position = ingested.position;
        self.advance_odometer(position.snapped);
        let transition = position.transition(self.config.transition_ms);

        let (Some(plan), Some(split)) = (self.plan.clone(), ingested.split) else {
            obs.on_position(&position, &transition, None);
            if self.plan.is_none() && !self.awaiting_retry && !self.coordinator.is_pending() {
                if let Some(req) =
                    self.coordinator.force(position.snapped, &self.trip, RecalcReason::Initial, now)
                {
                    effects.push(Effect::ComputeRoute(req));
                }
            }
            return;
        };

        let dropped = self.trip.drop_reached_stops(position.snapped, self.config.arrival_threshold_m);
        if dropped > 0 {
            info!("reached {dropped} stop(s); {} remaining", self.trip.stops.len());
        }

        let state = self.progress.update(&plan, &split, position.snapped, position.speed_kmh, now);
        obs.on_position(&position, &transition, Some(&state));

        if let Some(req) = self.coordinator.on_position(
            state.deviation_m,
            position.speed_kmh,
            position.snapped,
            &self.trip,
            now,
        ) {
            effects.push(Effect::ComputeRoute(req));
        }

        self.evaluate_arrival(&state, now, obs);
        self.state = Some(state);
    }

    fn evaluate_arrival<O: SessionObserver + ?Sized>(
        &mut self,
        state: &RouteState,
        now:   Timestamp,
        obs:   &mut O,
    ) {
        let was = self.arrival.is_arrived();
        let check = self.arrival.evaluate(state.remaining_m, self.revision.unwrap_or_default());
        if check.arrived != was {
            info!("arrived: {} ({:.0} m remaining)", check.arrived, state.remaining_m);
            obs.on_arrival_changed(check.arrived);
        }
        if !check.summary_due {
            return;
        }

        let started_at = self.started_at.unwrap_or(now);
        let summary = ArrivalSummary::new(
            self.trip.destination,
            self.odometer_m,
            started_at,
            now,
            self.fuel_used_liters(),
            self.eta_planned.unwrap_or(state.eta),
        );
        info!(
            "trip summary: {:.0} m in {:.0} s, {:.0} s saved",
            summary.total_distance_m, summary.total_duration_s, summary.time_saved_s,
        );
        obs.on_arrival(&summary);
        self.summary = Some(summary);
    }

    fn install_plan<O: SessionObserver + ?Sized>(
        &mut self,
        plan:    RoutePlan,
        source:  PlanSource,
        now:     Timestamp,
        obs:     &mut O,
        effects: &mut Vec<Effect>,
    ) {
        let revision = self.revision.map_or(PlanRevision(0), PlanRevision::next);
        self.revision = Some(revision);
        self.eta_planned.get_or_insert(now.offset_secs(plan.total_duration_s()));
        info!(
            "{revision} active ({source:?}): {:.0} m, {:.0} s, {} steps",
            plan.total_distance_m(),
            plan.total_duration_s(),
            plan.steps().len(),
        );

        let plan = Arc::new(plan);
        self.plan = Some(Arc::clone(&plan));
        self.progress.reset();
        self.state = None;
        obs.on_plan_replaced(revision, &plan, source);

        // Re-derive the split against the new plan from the current position.
        if let Some(position) = self.tracker.position().copied() {
            let ingested = Ingested { split: plan.split_at(position.snapped), position, snap: None };
            self.apply_position(ingested, now, obs, effects);
        }

        if source != PlanSource::Restored {
            let (eta, road) = match &self.state {
                Some(s) => (s.eta, s.current_road_name.clone()),
                None => (
                    now.offset_secs(plan.total_duration_s()),
                    plan.steps().first().map(|s| s.road_name.clone()).unwrap_or_default(),
                ),
            };
            effects.push(Effect::PersistPlan(plan.to_snapshot(eta, road)));
        }
    }

    fn advance_odometer(&mut self, snapped: GeoPoint) {
        if let Some(prev) = self.odometer_at {
            self.odometer_m += prev.distance_m(snapped);
        }
        self.odometer_at = Some(snapped);
    }
}
