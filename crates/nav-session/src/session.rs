//! The session actor: one tokio task that owns the [`Navigator`].
//!
//! # Message flow
//!
//! ```text
//!  SessionHandle ──┐
//!  timer task ─────┼──► mpsc ──► actor loop ──► Navigator ──► Vec<Effect>
//!  spawned calls ──┘                 ▲                             │
//!                                    └──── result events ◄── spawn ┘
//! ```
//!
//! Every mutation happens on the actor task, in channel order.  Network and
//! persistence calls run on spawned tasks bounded by the configured timeout
//! and post their outcome back as events.  Those tasks hold only a weak
//! sender, so once every handle is dropped or `finish` is processed the loop
//! ends and late results go nowhere.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use nav_core::{Clock, GeoPoint, RequestId};
use nav_route::{
    DirectionsClient, DirectionsError, LocationFix, PlanSnapshot, RoadSnapClient, RoutePlan,
    SnapError,
};

use crate::{Effect, Navigator, PlanStore, Preferences, SessionError, SessionObserver, SessionResult};

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) enum Event {
    Fix(LocationFix),
    Preferences(Preferences),
    Resume,
    RetryInitialRoute,
    Tick,
    Finish,
    SnapResolved { id: RequestId, result: Result<GeoPoint, SnapError> },
    RouteResolved { id: RequestId, result: Result<RoutePlan, DirectionsError> },
    PlanLoaded(Option<PlanSnapshot>),
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cheap, cloneable sender side of a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    pub(crate) tx: mpsc::UnboundedSender<Event>,
}

impl SessionHandle {
    /// Deliver one location fix.
    pub fn push_fix(&self, fix: LocationFix) -> SessionResult<()> {
        self.send(Event::Fix(fix))
    }

    /// Deliver updated traveler preferences.
    pub fn set_preferences(&self, prefs: Preferences) -> SessionResult<()> {
        self.send(Event::Preferences(prefs))
    }

    /// The application returned to the foreground; reload the persisted plan.
    pub fn resume(&self) -> SessionResult<()> {
        self.send(Event::Resume)
    }

    /// Retry the initial route after the observer reported its failure.
    pub fn retry_initial_route(&self) -> SessionResult<()> {
        self.send(Event::RetryInitialRoute)
    }

    /// End the session.  The actor task completes after processing this.
    pub fn finish(&self) -> SessionResult<()> {
        self.send(Event::Finish)
    }

    /// `true` once the actor task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, event: Event) -> SessionResult<()> {
        self.tx.send(event).map_err(|_| SessionError::Closed)
    }
}

// ── Actor ─────────────────────────────────────────────────────────────────────

/// The owning task of one navigation session.
///
/// Create via [`SessionBuilder`][crate::SessionBuilder].
pub struct Session<O> {
    pub(crate) navigator:    Navigator,
    pub(crate) initial_plan: Option<RoutePlan>,
    pub(crate) observer:     O,
    pub(crate) directions:   Arc<dyn DirectionsClient>,
    pub(crate) snapper:      Option<Arc<dyn RoadSnapClient>>,
    pub(crate) store:        Option<Arc<dyn PlanStore>>,
    pub(crate) clock:        Arc<dyn Clock>,
    pub(crate) tx:           mpsc::WeakUnboundedSender<Event>,
    pub(crate) rx:           mpsc::UnboundedReceiver<Event>,
}

impl<O: SessionObserver + Send + 'static> Session<O> {
    /// Run until `finish` or until every handle is dropped.  Returns the
    /// observer so callers can inspect what it collected.
    pub async fn run(mut self) -> O {
        let ticker = self.spawn_ticker();

        let now = self.clock.now();
        let plan = self.initial_plan.take();
        let effects = self.navigator.start(plan, now, &mut self.observer);
        self.execute(effects);

        while let Some(event) = self.rx.recv().await {
            let now = self.clock.now();
            let nav = &mut self.navigator;
            let obs = &mut self.observer;

            let effects = match event {
                Event::Fix(fix)             => nav.on_fix(fix, now, obs),
                Event::Preferences(prefs)   => nav.on_preferences(prefs, now, obs),
                Event::Resume               => nav.on_resume(),
                Event::RetryInitialRoute    => nav.retry_initial_route(now, obs),
                Event::Tick                 => nav.on_tick(now, obs),
                Event::SnapResolved { id, result }  => nav.on_snap_resolved(id, result, now, obs),
                Event::RouteResolved { id, result } => nav.on_route_resolved(id, result, now, obs),
                Event::PlanLoaded(snapshot) => nav.on_plan_loaded(snapshot, now, obs),
                Event::Finish => {
                    nav.finish(obs);
                    break;
                }
            };
            self.execute(effects);
        }

        if !self.navigator.is_ended() {
            self.navigator.finish(&mut self.observer);
        }
        ticker.abort();
        self.observer
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.navigator.config().request_timeout_ms)
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SnapRoad(req)        => self.spawn_snap(req.id, req.previous, req.current),
                Effect::ComputeRoute(req)    => self.spawn_route(req.id, req.route_request()),
                Effect::PersistPlan(snap)    => self.spawn_persist(snap),
                Effect::LoadPlan             => self.spawn_load(),
            }
        }
    }

    fn spawn_snap(&self, id: RequestId, previous: GeoPoint, current: GeoPoint) {
        let Some(snapper) = self.snapper.clone() else {
            post(&self.tx, Event::SnapResolved { id, result: Err(SnapError::NoMatch) });
            return;
        };
        let tx = self.tx.clone();
        let limit = self.timeout();
        tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, snapper.snap_to_road(previous, current)).await {
                Ok(result) => result,
                Err(_)     => Err(SnapError::Timeout),
            };
            post(&tx, Event::SnapResolved { id, result });
        });
    }

    fn spawn_route(&self, id: RequestId, request: nav_route::RouteRequest) {
        let directions = Arc::clone(&self.directions);
        let tx = self.tx.clone();
        let limit = self.timeout();
        tokio::spawn(async move {
            debug!("computing route {id} through {} waypoints", request.waypoints().len());
            let result = match tokio::time::timeout(limit, directions.compute_route(&request)).await {
                Ok(result) => result,
                Err(_) => Err(DirectionsError::Network(format!(
                    "no answer within {} ms",
                    limit.as_millis()
                ))),
            };
            post(&tx, Event::RouteResolved { id, result });
        });
    }

    fn spawn_persist(&self, snapshot: PlanSnapshot) {
        let Some(store) = self.store.clone() else { return };
        let limit = self.timeout();
        tokio::spawn(async move {
            match tokio::time::timeout(limit, store.save(&snapshot)).await {
                Ok(Ok(()))  => debug!("plan persisted"),
                Ok(Err(e))  => warn!("persisting plan failed: {e}"),
                Err(_)      => warn!("persisting plan timed out"),
            }
        });
    }

    fn spawn_load(&self) {
        let Some(store) = self.store.clone() else {
            post(&self.tx, Event::PlanLoaded(None));
            return;
        };
        let tx = self.tx.clone();
        let limit = self.timeout();
        tokio::spawn(async move {
            let snapshot = match tokio::time::timeout(limit, store.load()).await {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(e)) => {
                    warn!("loading persisted plan failed: {e}");
                    None
                }
                Err(_) => {
                    warn!("loading persisted plan timed out");
                    None
                }
            };
            post(&tx, Event::PlanLoaded(snapshot));
        });
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let period = Duration::from_millis(self.navigator.config().tick_interval_ms);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !post(&tx, Event::Tick) {
                    break;
                }
            }
        })
    }
}

/// Send `event` if the session is still alive.  Returns `false` otherwise.
fn post(tx: &mpsc::WeakUnboundedSender<Event>, event: Event) -> bool {
    match tx.upgrade() {
        Some(tx) => tx.send(event).is_ok(),
        None => {
            debug!("session gone; dropping {event:?}");
            false
        }
    }
}
