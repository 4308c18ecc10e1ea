//! Unit tests for nav-session.
//!
//! Fixtures sit on the equator, where 0.001° of longitude is ~111 m.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use nav_core::{GeoPoint, NavConfig, PlanRevision, Timestamp};
use nav_route::{
    ArrivalSummary, DirectionsClient, DirectionsError, LocationFix, PlanSnapshot, RoadSnapClient,
    RoutePlan, RouteRequest, RouteState, SnapError, Step, TrackedPosition, Transition,
};

use crate::{PlanSource, PlanStore, RecalcReason, SessionObserver, StoreFailure};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Metres per degree of longitude on the equator.
const M_PER_DEG: f64 = 111_194.926_644_558_7;

fn at(ms: i64) -> Timestamp {
    Timestamp(ms)
}

fn destination() -> GeoPoint {
    GeoPoint::new(0.02, 0.0)
}

/// A point 45 m north of the plan line, beside its first segment.
fn off_route() -> GeoPoint {
    GeoPoint::new(0.005, 45.0 / M_PER_DEG)
}

fn step(location: GeoPoint, instruction: &str, road: &str, duration_s: f64) -> Step {
    Step {
        location,
        instruction:   instruction.into(),
        bearing_after: 90.0,
        distance_m:    0.0,
        duration_s,
        road_name:     road.into(),
    }
}

/// Straight ~2.2 km route east to `destination()`, 120 s.
fn main_plan() -> RoutePlan {
    RoutePlan::new(
        vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.01, 0.0), destination()],
        vec![
            step(GeoPoint::new(0.0, 0.0), "Head east on Main Street", "Main Street", 60.0),
            step(GeoPoint::new(0.01, 0.0), "Continue onto Harbor Road", "Harbor Road", 60.0),
            step(destination(), "You have arrived", "Harbor Road", 0.0),
        ],
        Vec::new(),
        f64::NAN,
        120.0,
    )
    .unwrap()
}

/// Route from `off_route()` straight to `destination()`.
fn detour_plan() -> RoutePlan {
    RoutePlan::new(
        vec![off_route(), destination()],
        vec![
            step(off_route(), "Head east on Dock Lane", "Dock Lane", 100.0),
            step(destination(), "You have arrived", "Dock Lane", 0.0),
        ],
        Vec::new(),
        f64::NAN,
        100.0,
    )
    .unwrap()
}

/// 20 km/h.
const MOVING_MPS: f64 = 20.0 / 3.6;

fn fix(position: GeoPoint, speed_mps: f64, t: i64) -> LocationFix {
    LocationFix::new(position, speed_mps, at(t))
}

#[derive(Debug, Clone, PartialEq)]
enum Signal {
    Plan(PlanSource),
    InitialFailed(DirectionsError),
    Summary,
    Snapped(GeoPoint),
}

/// Observer that records every callback and optionally reports the
/// interesting ones over a channel.
#[derive(Default)]
struct Recorder {
    positions:        usize,
    last_state:       Option<RouteState>,
    plans:            Vec<(PlanRevision, PlanSource)>,
    recalc_failures:  Vec<(RecalcReason, DirectionsError)>,
    initial_failures: Vec<DirectionsError>,
    arrivals:         Vec<bool>,
    summaries:        Vec<ArrivalSummary>,
    ended:            Option<f64>,
    snapped:          Vec<GeoPoint>,
    signals:          Option<mpsc::UnboundedSender<Signal>>,
    /// Also report every position over `signals`.
    signal_positions: bool,
}

impl Recorder {
    fn signalling() -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { signals: Some(tx), ..Self::default() }, rx)
    }

    fn signal(&self, s: Signal) {
        if let Some(tx) = &self.signals {
            let _ = tx.send(s);
        }
    }
}

impl SessionObserver for Recorder {
    fn on_position(&mut self, position: &TrackedPosition, _: &Transition, state: Option<&RouteState>) {
        self.positions += 1;
        self.last_state = state.cloned();
        self.snapped.push(position.snapped);
        if self.signal_positions {
            self.signal(Signal::Snapped(position.snapped));
        }
    }

    fn on_plan_replaced(&mut self, revision: PlanRevision, _: &RoutePlan, source: PlanSource) {
        self.plans.push((revision, source));
        self.signal(Signal::Plan(source));
    }

    fn on_recalculation_failed(&mut self, reason: RecalcReason, error: &DirectionsError) {
        self.recalc_failures.push((reason, error.clone()));
    }

    fn on_initial_route_failed(&mut self, error: &DirectionsError) {
        self.initial_failures.push(error.clone());
        self.signal(Signal::InitialFailed(error.clone()));
    }

    fn on_arrival_changed(&mut self, arrived: bool) {
        self.arrivals.push(arrived);
    }

    fn on_arrival(&mut self, summary: &ArrivalSummary) {
        self.summaries.push(summary.clone());
        self.signal(Signal::Summary);
    }

    fn on_session_end(&mut self, odometer_m: f64) {
        self.ended = Some(odometer_m);
    }
}

/// Directions client answering from a script, in order.
struct Scripted {
    answers: Mutex<VecDeque<Result<RoutePlan, DirectionsError>>>,
    calls:   AtomicUsize,
}

impl Scripted {
    fn new(answers: Vec<Result<RoutePlan, DirectionsError>>) -> Self {
        Self { answers: Mutex::new(answers.into()), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl DirectionsClient for Scripted {
    async fn compute_route(&self, _: &RouteRequest) -> Result<RoutePlan, DirectionsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DirectionsError::Network("script exhausted".into())))
    }
}

/// Collaborator that never answers, for directions and road snapping.
struct Silent;

#[async_trait]
impl DirectionsClient for Silent {
    async fn compute_route(&self, _: &RouteRequest) -> Result<RoutePlan, DirectionsError> {
        std::future::pending().await
    }
}

#[async_trait]
impl RoadSnapClient for Silent {
    async fn snap_to_road(&self, _: GeoPoint, _: GeoPoint) -> Result<GeoPoint, SnapError> {
        std::future::pending().await
    }
}

#[derive(Default)]
struct MemStore(Mutex<Option<PlanSnapshot>>);

#[async_trait]
impl PlanStore for MemStore {
    async fn save(&self, snapshot: &PlanSnapshot) -> Result<(), StoreFailure> {
        *self.0.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PlanSnapshot>, StoreFailure> {
        Ok(self.0.lock().unwrap().clone())
    }
}

// ── RecalculationCoordinator ──────────────────────────────────────────────────

#[cfg(test)]
mod coordinator {
    use nav_core::{Avoid, AvoidSet, RequestId};

    use super::*;
    use crate::{RecalcPhase, RecalculationCoordinator, Resolution, Trip};

    fn coordinator() -> (RecalculationCoordinator, Trip) {
        (RecalculationCoordinator::new(&NavConfig::default()), Trip::new(destination()))
    }

    #[test]
    fn off_route_needs_distance_and_motion() {
        let (c, _) = coordinator();
        assert!(c.is_off_route(45.0, 20.0));
        assert!(!c.is_off_route(45.0, 0.0));
        assert!(!c.is_off_route(30.0, 20.0));
        assert!(!c.is_off_route(f64::NAN, 20.0));
    }

    #[test]
    fn single_request_while_pending() {
        let (mut c, trip) = coordinator();
        let req = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();
        assert_eq!(req.reason, RecalcReason::OffRoute);
        assert_eq!(req.origin, off_route());
        assert_eq!(c.phase(), RecalcPhase::Pending);

        for t in (1..120).map(|s| s * 500) {
            assert!(c.on_position(60.0, 30.0, off_route(), &trip, at(t)).is_none(), "issued at {t} ms");
        }
    }

    #[test]
    fn failure_cools_down_then_allows_retry() {
        let (mut c, trip) = coordinator();
        let req = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();
        let r = c.resolve(req.id, Err(&DirectionsError::Network("reset".into())), at(2_000));
        assert_eq!(r, Resolution::Failed { reason: RecalcReason::OffRoute, retryable: true });
        assert_eq!(c.phase(), RecalcPhase::Cooldown { until: at(12_000) });

        assert!(c.on_position(45.0, 20.0, off_route(), &trip, at(11_999)).is_none());
        assert!(c.on_position(45.0, 20.0, off_route(), &trip, at(12_000)).is_some());
    }

    #[test]
    fn cooldown_expires_on_tick() {
        let (mut c, trip) = coordinator();
        let req = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();
        c.resolve(req.id, Err(&DirectionsError::MalformedResponse("{}".into())), at(0));
        assert!(!c.tick(at(9_999)));
        assert!(c.tick(at(10_000)));
        assert_eq!(c.phase(), RecalcPhase::OnRoute);
    }

    #[test]
    fn resolved_request_is_released() {
        let (mut c, trip) = coordinator();
        let req = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();
        assert!(c.is_pending());
        c.resolve(req.id, Ok(()), at(500));
        assert!(!c.is_pending());
        // The same id cannot resolve twice.
        assert_eq!(c.resolve(req.id, Ok(()), at(600)), Resolution::Stale);
    }

    #[test]
    fn success_rate_limits_the_next_attempt() {
        let (mut c, trip) = coordinator();
        let req = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();
        assert_eq!(c.resolve(req.id, Ok(()), at(1_000)), Resolution::Succeeded { reason: RecalcReason::OffRoute });
        assert_eq!(c.phase(), RecalcPhase::OnRoute);

        assert!(c.on_position(45.0, 20.0, off_route(), &trip, at(5_000)).is_none());
        assert!(c.on_position(45.0, 20.0, off_route(), &trip, at(10_000)).is_some());
    }

    #[test]
    fn forces_while_pending_collapse_into_one_follow_up() {
        let (mut c, mut trip) = coordinator();
        let first = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();

        trip.avoid = AvoidSet::new().with(Avoid::Toll);
        assert!(c.force(off_route(), &trip, RecalcReason::OptionsChanged, at(100)).is_none());
        trip.avoid.insert(Avoid::Ferry);
        assert!(c.force(off_route(), &trip, RecalcReason::OptionsChanged, at(200)).is_none());
        assert!(c.has_follow_up());

        c.resolve(first.id, Ok(()), at(300));
        let next = c.follow_up(off_route(), &trip, at(300)).unwrap();
        assert_eq!(next.reason, RecalcReason::OptionsChanged);
        assert!(next.avoid.contains(Avoid::Ferry));
        assert!(c.follow_up(off_route(), &trip, at(300)).is_none());

        c.resolve(next.id, Ok(()), at(400));
        assert!(c.follow_up(off_route(), &trip, at(400)).is_none());
    }

    #[test]
    fn force_skips_the_rate_window() {
        let (mut c, trip) = coordinator();
        let req = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();
        c.resolve(req.id, Err(&DirectionsError::Network("down".into())), at(1_000));
        assert!(c.force(off_route(), &trip, RecalcReason::OptionsChanged, at(2_000)).is_some());
    }

    #[test]
    fn no_route_found_waits_for_new_inputs() {
        let (mut c, trip) = coordinator();
        let req = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();
        let r = c.resolve(req.id, Err(&DirectionsError::NoRouteFound("NoRoute".into())), at(0));
        assert_eq!(r, Resolution::Failed { reason: RecalcReason::OffRoute, retryable: false });

        assert!(c.on_position(45.0, 20.0, off_route(), &trip, at(60_000)).is_none());
        assert!(c.force(off_route(), &trip, RecalcReason::OptionsChanged, at(61_000)).is_some());
    }

    #[test]
    fn stale_and_abandoned_results() {
        let (mut c, trip) = coordinator();
        let req = c.on_position(45.0, 20.0, off_route(), &trip, at(0)).unwrap();
        assert_eq!(c.resolve(RequestId(77), Ok(()), at(1)), Resolution::Stale);
        assert!(c.is_pending());

        c.abandon();
        assert!(!c.is_pending());
        assert_eq!(c.phase(), RecalcPhase::OnRoute);
        assert_eq!(c.resolve(req.id, Ok(()), at(2)), Resolution::Stale);
    }

    #[test]
    fn trip_drops_reached_stops_in_order() {
        let mut trip = Trip::new(destination())
            .with_stops(vec![GeoPoint::new(0.005, 0.0), GeoPoint::new(0.015, 0.0)]);
        assert_eq!(trip.drop_reached_stops(GeoPoint::new(0.015, 0.0), 70.0), 0);
        assert_eq!(trip.drop_reached_stops(GeoPoint::new(0.0052, 0.0), 70.0), 1);
        assert_eq!(trip.stops, vec![GeoPoint::new(0.015, 0.0)]);
    }
}

// ── Navigator ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod navigator {
    use nav_core::{Avoid, AvoidSet, RequestId, RoutingProfile};

    use super::*;
    use crate::{Effect, Navigator, Preferences, RecalcPhase, RecalculationRequest, Trip};

    fn navigator() -> Navigator {
        Navigator::new(NavConfig::default(), Trip::new(destination()), false)
    }

    fn started() -> (Navigator, Recorder) {
        let mut nav = navigator();
        let mut rec = Recorder::default();
        let effects = nav.start(Some(main_plan()), at(0), &mut rec);
        assert!(matches!(effects.as_slice(), [Effect::PersistPlan(_)]));
        (nav, rec)
    }

    fn compute_requests(effects: &[Effect]) -> Vec<RecalculationRequest> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::ComputeRoute(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    fn go_off_route(nav: &mut Navigator, rec: &mut Recorder) -> RecalculationRequest {
        let effects = nav.on_fix(fix(off_route(), MOVING_MPS, 0), at(0), rec);
        let mut reqs = compute_requests(&effects);
        assert_eq!(reqs.len(), 1);
        reqs.remove(0)
    }

    #[test]
    fn off_route_fix_starts_exactly_one_recalculation() {
        let (mut nav, mut rec) = started();
        let req = go_off_route(&mut nav, &mut rec);
        assert_eq!(req.reason, RecalcReason::OffRoute);
        assert_eq!(req.origin, off_route());
        assert_eq!(req.destination, destination());
        assert_eq!(nav.recalc_phase(), RecalcPhase::Pending);
        assert!(approx(rec.last_state.as_ref().unwrap().deviation_m, 45.0, 0.5));

        // One second later, still off-route: no second call.
        let effects = nav.on_fix(fix(off_route(), MOVING_MPS, 1_000), at(1_000), &mut rec);
        assert!(compute_requests(&effects).is_empty());

        // Nor for any later fix while the first is unresolved.
        for s in 2..40 {
            let p = GeoPoint::new(0.005 + s as f64 * 0.0001, 60.0 / M_PER_DEG);
            let effects = nav.on_fix(fix(p, MOVING_MPS, s * 1_000), at(s * 1_000), &mut rec);
            assert!(compute_requests(&effects).is_empty(), "second call at {s} s");
        }
    }

    #[test]
    fn network_failure_keeps_plan_and_suppresses_retry_for_cooldown() {
        let (mut nav, mut rec) = started();
        let req = go_off_route(&mut nav, &mut rec);

        nav.on_route_resolved(req.id, Err(DirectionsError::Network("timeout".into())), at(1_000), &mut rec);
        assert_eq!(rec.recalc_failures.len(), 1);
        assert_eq!(nav.revision(), Some(PlanRevision(0)));
        assert_eq!(nav.plan().unwrap().geometry(), main_plan().geometry());

        let effects = nav.on_fix(fix(off_route(), MOVING_MPS, 6_000), at(6_000), &mut rec);
        assert!(compute_requests(&effects).is_empty());

        let effects = nav.on_fix(fix(off_route(), MOVING_MPS, 11_000), at(11_000), &mut rec);
        assert_eq!(compute_requests(&effects).len(), 1);
    }

    #[test]
    fn success_replaces_plan_and_persists_it() {
        let (mut nav, mut rec) = started();
        let req = go_off_route(&mut nav, &mut rec);

        let effects = nav.on_route_resolved(req.id, Ok(detour_plan()), at(2_000), &mut rec);
        assert!(effects.iter().any(|e| matches!(e, Effect::PersistPlan(s) if s.route_geometry == detour_plan().geometry())));
        assert_eq!(rec.plans.last(), Some(&(PlanRevision(1), PlanSource::Computed(RecalcReason::OffRoute))));
        assert_eq!(nav.recalc_phase(), RecalcPhase::OnRoute);

        // The split restarts at the new plan's origin.
        let state = nav.state().unwrap();
        assert!(state.traveled_m < 1.0);
        assert!(state.deviation_m < 1.0);
        assert_eq!(state.current_road_name, "Dock Lane");
    }

    #[test]
    fn stale_route_result_is_dropped() {
        let (mut nav, mut rec) = started();
        go_off_route(&mut nav, &mut rec);
        let effects = nav.on_route_resolved(RequestId(99), Ok(detour_plan()), at(500), &mut rec);
        assert!(effects.is_empty());
        assert_eq!(nav.revision(), Some(PlanRevision(0)));
        assert!(nav.pending_recalculation().is_some());
    }

    #[test]
    fn options_change_during_pending_yields_one_follow_up() {
        let (mut nav, mut rec) = started();
        let req = go_off_route(&mut nav, &mut rec);

        let prefs = |avoid: AvoidSet| Preferences { consumption_km_per_liter: None, avoid, profile: RoutingProfile::Driving };
        assert!(nav.on_preferences(prefs(AvoidSet::new().with(Avoid::Toll)), at(100), &mut rec).is_empty());
        let both = AvoidSet::new().with(Avoid::Toll).with(Avoid::Ferry);
        assert!(nav.on_preferences(prefs(both), at(200), &mut rec).is_empty());

        let effects = nav.on_route_resolved(req.id, Ok(detour_plan()), at(300), &mut rec);
        let reqs = compute_requests(&effects);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].reason, RecalcReason::OptionsChanged);
        assert_eq!(reqs[0].avoid, both);

        let effects = nav.on_route_resolved(reqs[0].id, Ok(detour_plan()), at(400), &mut rec);
        assert!(compute_requests(&effects).is_empty());
    }

    #[test]
    fn options_change_when_idle_recalculates_immediately() {
        let (mut nav, mut rec) = started();
        nav.on_fix(fix(GeoPoint::new(0.0, 0.0), MOVING_MPS, 0), at(0), &mut rec);

        let prefs = Preferences {
            consumption_km_per_liter: Some(12.0),
            avoid:                    AvoidSet::EMPTY,
            profile:                  RoutingProfile::DrivingTraffic,
        };
        let reqs = compute_requests(&nav.on_preferences(prefs.clone(), at(1_000), &mut rec));
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].profile, RoutingProfile::DrivingTraffic);

        // Same options again: consumption only, no request.
        assert!(nav.on_preferences(prefs, at(2_000), &mut rec).is_empty());
    }

    #[test]
    fn parked_divergence_is_ignored() {
        let (mut nav, mut rec) = started();
        let effects = nav.on_fix(fix(off_route(), 0.0, 0), at(0), &mut rec);
        assert!(compute_requests(&effects).is_empty());
        assert_eq!(nav.recalc_phase(), RecalcPhase::OnRoute);
    }

    #[test]
    fn no_route_found_is_not_retried_automatically() {
        let (mut nav, mut rec) = started();
        let req = go_off_route(&mut nav, &mut rec);
        nav.on_route_resolved(req.id, Err(DirectionsError::NoRouteFound("NoRoute".into())), at(0), &mut rec);

        let effects = nav.on_fix(fix(off_route(), MOVING_MPS, 30_000), at(30_000), &mut rec);
        assert!(compute_requests(&effects).is_empty());
        assert_eq!(nav.revision(), Some(PlanRevision(0)));
    }

    #[test]
    fn initial_route_failure_waits_for_retry() {
        let mut nav = navigator();
        let mut rec = Recorder::default();
        assert!(nav.start(None, at(0), &mut rec).is_empty());

        let origin = GeoPoint::new(0.0, 0.0);
        let reqs = compute_requests(&nav.on_fix(fix(origin, 0.0, 0), at(0), &mut rec));
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].reason, RecalcReason::Initial);
        assert!(rec.last_state.is_none());

        nav.on_route_resolved(reqs[0].id, Err(DirectionsError::Network("offline".into())), at(500), &mut rec);
        assert_eq!(rec.initial_failures.len(), 1);
        assert!(rec.recalc_failures.is_empty());
        assert!(nav.is_awaiting_retry());

        // No automatic request while waiting.
        assert!(compute_requests(&nav.on_fix(fix(origin, 0.0, 1_000), at(1_000), &mut rec)).is_empty());

        let reqs = compute_requests(&nav.retry_initial_route(at(2_000), &mut rec));
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].reason, RecalcReason::Retry);

        let effects = nav.on_route_resolved(reqs[0].id, Ok(main_plan()), at(2_500), &mut rec);
        assert!(effects.iter().any(|e| matches!(e, Effect::PersistPlan(_))));
        assert_eq!(rec.plans, vec![(PlanRevision(0), PlanSource::Computed(RecalcReason::Retry))]);
        assert!(rec.last_state.is_some());
    }

    #[test]
    fn arrival_produces_one_summary() {
        let mut nav = navigator().with_consumption(Some(10.0));
        let mut rec = Recorder::default();
        nav.start(Some(main_plan()), at(0), &mut rec);

        nav.on_fix(fix(GeoPoint::new(0.0, 0.0), 20.0, 0), at(0), &mut rec);
        nav.on_fix(fix(GeoPoint::new(0.01, 0.0), 20.0, 60_000), at(60_000), &mut rec);
        assert_eq!(rec.last_state.as_ref().unwrap().current_step, 1);
        assert!(rec.summaries.is_empty());

        nav.on_fix(fix(GeoPoint::new(0.0199, 0.0), 20.0, 110_000), at(110_000), &mut rec);
        nav.on_fix(fix(GeoPoint::new(0.01995, 0.0), 2.0, 112_000), at(112_000), &mut rec);

        assert_eq!(rec.arrivals, vec![true]);
        assert_eq!(rec.summaries.len(), 1);
        let s = &rec.summaries[0];
        assert_eq!(s.destination, destination());
        assert!(approx(s.total_distance_m, 0.0199 * M_PER_DEG, 1.0));
        assert!(approx(s.fuel_used_liters.unwrap(), 0.0199 * M_PER_DEG / 10_000.0, 1e-3));
        assert_eq!(s.eta_planned, Timestamp::from_secs(120));
        assert_eq!(s.time_saved_s, 10.0);
        assert_eq!(s.total_duration_s, 110.0);
    }

    #[test]
    fn resume_installs_the_persisted_plan() {
        let (mut nav, mut rec) = started();
        nav.on_fix(fix(off_route(), 0.0, 0), at(0), &mut rec);

        assert_eq!(nav.on_resume(), vec![Effect::LoadPlan]);
        let snapshot = detour_plan().to_snapshot(Timestamp::from_secs(100), "Dock Lane");
        let effects = nav.on_plan_loaded(Some(snapshot), at(1_000), &mut rec);
        assert!(!effects.iter().any(|e| matches!(e, Effect::PersistPlan(_))));
        assert_eq!(rec.plans.last(), Some(&(PlanRevision(1), PlanSource::Restored)));
        assert_eq!(nav.plan().unwrap().geometry(), detour_plan().geometry());

        assert!(nav.on_plan_loaded(None, at(2_000), &mut rec).is_empty());
        assert_eq!(nav.revision(), Some(PlanRevision(1)));
    }

    #[test]
    fn finished_session_ignores_late_results() {
        let (mut nav, mut rec) = started();
        let req = go_off_route(&mut nav, &mut rec);

        nav.finish(&mut rec);
        assert!(rec.ended.is_some());
        assert!(nav.on_route_resolved(req.id, Ok(detour_plan()), at(1_000), &mut rec).is_empty());
        assert!(nav.on_fix(fix(off_route(), MOVING_MPS, 2_000), at(2_000), &mut rec).is_empty());
        assert_eq!(nav.revision(), Some(PlanRevision(0)));
    }

    #[test]
    fn snap_failure_falls_back_to_raw() {
        let mut nav = Navigator::new(NavConfig::default(), Trip::new(destination()), true);
        let mut rec = Recorder::default();
        nav.start(Some(main_plan()), at(0), &mut rec);
        nav.on_fix(fix(GeoPoint::new(0.0, 0.0), 10.0, 0), at(0), &mut rec);

        let raw = GeoPoint::new(0.001, 0.0001);
        let effects = nav.on_fix(fix(raw, 10.0, 1_000), at(1_000), &mut rec);
        let [Effect::SnapRoad(req)] = effects.as_slice() else {
            panic!("expected one snap request, got {effects:?}");
        };
        assert_eq!(nav.position().unwrap().snapped, GeoPoint::new(0.0, 0.0));

        nav.on_snap_resolved(req.id, Err(SnapError::Timeout), at(1_500), &mut rec);
        assert_eq!(nav.position().unwrap().snapped, raw);
        assert!(nav.odometer_m() > 100.0);
    }

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }
}

// ── Session actor ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod actor {
    use std::sync::Arc;
    use std::time::Duration;

    use nav_core::ManualClock;

    use super::*;
    use crate::{SessionBuilder, SessionError, Trip};

    async fn next_signal(rx: &mut mpsc::UnboundedReceiver<Signal>) -> Signal {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no signal within 5 s")
            .expect("observer dropped")
    }

    /// Next reported snapped position, skipping other signals.
    async fn next_snapped(rx: &mut mpsc::UnboundedReceiver<Signal>) -> GeoPoint {
        loop {
            if let Signal::Snapped(p) = next_signal(rx).await {
                return p;
            }
        }
    }

    #[tokio::test]
    async fn initial_route_then_arrival() {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = ManualClock::new(at(0));
        let directions = Arc::new(Scripted::new(vec![Ok(main_plan())]));
        let (rec, mut signals) = Recorder::signalling();

        let (handle, task) = SessionBuilder::new(NavConfig::default(), Trip::new(destination()), directions.clone())
            .clock(Arc::new(clock.clone()))
            .spawn(rec)
            .unwrap();

        handle.push_fix(fix(GeoPoint::new(0.0, 0.0), 10.0, 0)).unwrap();
        assert_eq!(next_signal(&mut signals).await, Signal::Plan(PlanSource::Computed(RecalcReason::Initial)));

        clock.set(Timestamp::from_secs(100));
        handle.push_fix(fix(GeoPoint::new(0.0199, 0.0), 10.0, 100_000)).unwrap();
        assert_eq!(next_signal(&mut signals).await, Signal::Summary);

        handle.finish().unwrap();
        let rec = task.await.unwrap();
        assert_eq!(rec.summaries.len(), 1);
        assert!(rec.ended.is_some());
        assert_eq!(directions.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unanswered_route_times_out_as_network_failure() {
        let config = NavConfig { request_timeout_ms: 50, ..NavConfig::default() };
        let (rec, mut signals) = Recorder::signalling();
        let (handle, task) = SessionBuilder::new(config, Trip::new(destination()), Arc::new(Silent))
            .spawn(rec)
            .unwrap();

        handle.push_fix(fix(GeoPoint::new(0.0, 0.0), 0.0, 0)).unwrap();
        match next_signal(&mut signals).await {
            Signal::InitialFailed(DirectionsError::Network(_)) => {}
            other => panic!("unexpected {other:?}"),
        }

        handle.finish().unwrap();
        let rec = task.await.unwrap();
        assert_eq!(rec.initial_failures.len(), 1);
    }

    #[tokio::test]
    async fn unanswered_snap_times_out_to_raw_fix() {
        let config = NavConfig { request_timeout_ms: 50, ..NavConfig::default() };
        let (mut rec, mut signals) = Recorder::signalling();
        rec.signal_positions = true;
        let (handle, task) = SessionBuilder::new(config, Trip::new(destination()), Arc::new(Silent))
            .initial_plan(main_plan())
            .snapper(Arc::new(Silent))
            .spawn(rec)
            .unwrap();

        let origin = GeoPoint::new(0.0, 0.0);
        let raw = GeoPoint::new(0.001, 0.0);
        handle.push_fix(fix(origin, MOVING_MPS, 0)).unwrap();
        assert_eq!(next_snapped(&mut signals).await, origin);

        // ~111 m: starts a snap that never answers; the last snapped is held.
        handle.push_fix(fix(raw, MOVING_MPS, 1_000)).unwrap();
        assert_eq!(next_snapped(&mut signals).await, origin);

        // The timeout resolves the snap as failed and the raw fix is adopted.
        while next_snapped(&mut signals).await != raw {}

        handle.finish().unwrap();
        let rec = task.await.unwrap();
        assert_eq!(rec.snapped.last(), Some(&raw));
        assert!(rec.recalc_failures.is_empty());
    }

    #[tokio::test]
    async fn resume_reloads_plan_from_store() {
        let store = Arc::new(MemStore::default());
        store.save(&detour_plan().to_snapshot(Timestamp::from_secs(100), "Dock Lane")).await.unwrap();

        let (rec, mut signals) = Recorder::signalling();
        let (handle, task) = SessionBuilder::new(
            NavConfig::default(),
            Trip::new(destination()),
            Arc::new(Scripted::new(Vec::new())),
        )
        .store(store)
        .spawn(rec)
        .unwrap();

        handle.resume().unwrap();
        assert_eq!(next_signal(&mut signals).await, Signal::Plan(PlanSource::Restored));

        handle.finish().unwrap();
        let rec = task.await.unwrap();
        assert_eq!(rec.plans, vec![(PlanRevision(0), PlanSource::Restored)]);
    }

    #[tokio::test]
    async fn handle_reports_closed_after_finish() {
        let (handle, task) = SessionBuilder::new(
            NavConfig::default(),
            Trip::new(destination()),
            Arc::new(Scripted::new(Vec::new())),
        )
        .initial_plan(main_plan())
        .spawn(Recorder::default())
        .unwrap();

        handle.finish().unwrap();
        let rec = task.await.unwrap();
        assert_eq!(rec.plans, vec![(PlanRevision(0), PlanSource::Provided)]);
        assert!(matches!(handle.push_fix(fix(GeoPoint::new(0.0, 0.0), 0.0, 0)), Err(SessionError::Closed)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = NavConfig { off_route_threshold_m: -1.0, ..NavConfig::default() };
        let result = SessionBuilder::new(config, Trip::new(destination()), Arc::new(Silent))
            .build(Recorder::default());
        assert!(matches!(result, Err(SessionError::Config(_))));
    }
}
