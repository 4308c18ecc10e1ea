//! Fluent builder for constructing a [`Session`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use nav_core::{Clock, NavConfig, SystemClock};
use nav_route::{DirectionsClient, PlanSnapshot, RoadSnapClient, RoutePlan};

use crate::{Navigator, PlanStore, Session, SessionHandle, SessionObserver, SessionResult, Trip};

/// Fluent builder for [`Session<O>`].
///
/// # Required inputs
///
/// - [`NavConfig`] — thresholds and windows (validated in `build`)
/// - [`Trip`] — destination, stops, avoid options, profile
/// - a [`DirectionsClient`]
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                      |
/// |------------------------|----------------------------------------------|
/// | `.snapper(c)`          | none: raw fixes are used as snapped points   |
/// | `.store(s)`            | none: plans are not persisted                |
/// | `.clock(c)`            | [`SystemClock`]                              |
/// | `.initial_plan(p)`     | none: the first fix requests the route       |
/// | `.initial_snapshot(s)` | none                                         |
/// | `.consumption(r)`      | none: fuel figures unavailable               |
///
/// # Example
///
/// ```rust,ignore
/// let (handle, task) = SessionBuilder::new(NavConfig::default(), trip, directions)
///     .snapper(map_matching)
///     .store(plan_store)
///     .consumption(Some(14.0))
///     .spawn(NoopObserver)?;
/// handle.push_fix(fix)?;
/// ```
pub struct SessionBuilder {
    config:      NavConfig,
    trip:        Trip,
    directions:  Arc<dyn DirectionsClient>,
    snapper:     Option<Arc<dyn RoadSnapClient>>,
    store:       Option<Arc<dyn PlanStore>>,
    clock:       Option<Arc<dyn Clock>>,
    plan:        Option<RoutePlan>,
    snapshot:    Option<PlanSnapshot>,
    consumption: Option<f64>,
}

impl SessionBuilder {
    pub fn new(config: NavConfig, trip: Trip, directions: Arc<dyn DirectionsClient>) -> Self {
        Self {
            config,
            trip,
            directions,
            snapper:     None,
            store:       None,
            clock:       None,
            plan:        None,
            snapshot:    None,
            consumption: None,
        }
    }

    pub fn snapper(mut self, snapper: Arc<dyn RoadSnapClient>) -> Self {
        self.snapper = Some(snapper);
        self
    }

    pub fn store(mut self, store: Arc<dyn PlanStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Start with a plan computed before navigation began.
    pub fn initial_plan(mut self, plan: RoutePlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Start from a persisted snapshot, e.g. after the process was killed
    /// mid-trip.  Ignored when `initial_plan` is also given.
    pub fn initial_snapshot(mut self, snapshot: PlanSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn consumption(mut self, km_per_liter: Option<f64>) -> Self {
        self.consumption = km_per_liter;
        self
    }

    /// Validate inputs and return the actor with its handle.  The actor does
    /// nothing until [`Session::run`] is awaited.
    pub fn build<O: SessionObserver>(self, observer: O) -> SessionResult<(Session<O>, SessionHandle)> {
        self.config.validate()?;

        let initial_plan = match (self.plan, self.snapshot) {
            (Some(plan), _)        => Some(plan),
            (None, Some(snapshot)) => Some(RoutePlan::from_snapshot(&snapshot)?),
            (None, None)           => None,
        };

        let navigator = Navigator::new(self.config, self.trip, self.snapper.is_some())
            .with_consumption(self.consumption);

        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session {
            navigator,
            initial_plan,
            observer,
            directions: self.directions,
            snapper:    self.snapper,
            store:      self.store,
            clock:      self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            tx:         tx.downgrade(),
            rx,
        };
        Ok((session, SessionHandle { tx }))
    }

    /// Build and spawn the actor on the current tokio runtime.
    pub fn spawn<O>(self, observer: O) -> SessionResult<(SessionHandle, JoinHandle<O>)>
    where
        O: SessionObserver + Send + 'static,
    {
        let (session, handle) = self.build(observer)?;
        Ok((handle, tokio::spawn(session.run())))
    }
}
