//! `nav-route` — route plans, position tracking, progress and arrival.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                       |
//! |----------------|----------------------------------------------------------------|
//! | [`plan`]       | `RoutePlan`, `Step`, `Congestion`, `RouteSplit`, `PlanSnapshot` |
//! | [`fix`]        | `LocationFix`, `TrackedPosition`, `Transition`                 |
//! | [`tracker`]    | `PositionTracker` — debounced single-flight road snapping      |
//! | [`state`]      | `RouteState`, `RouteProgress` — traveled/remaining, ETA, steps |
//! | [`arrival`]    | `ArrivalDetector`, `ArrivalSummary`                            |
//! | [`fuel`]       | `estimate` — distance and consumption rate to litres           |
//! | [`directions`] | `DirectionsClient` port, `RouteRequest`                        |
//! | [`snap`]       | `RoadSnapClient` port                                          |
//! | [`error`]      | `RouteError`, `DirectionsError`, `SnapError`                   |
//!
//! # Per-fix pipeline
//!
//! Everything in this crate is synchronous and free of I/O.  The session
//! (in `nav-session`) drives it once per event:
//!
//! 1. `PositionTracker::ingest` updates the tracked position and may hand
//!    back a `SnapRequest` for the owner to perform.
//! 2. The active `RoutePlan` is split at the snapped position.
//! 3. `RouteProgress::update` derives a `RouteState` (progress, ETA, step).
//! 4. `ArrivalDetector::evaluate` checks the remaining distance.

pub mod arrival;
pub mod directions;
pub mod error;
pub mod fix;
pub mod fuel;
pub mod plan;
pub mod snap;
pub mod state;
pub mod tracker;


pub use arrival::{ArrivalCheck, ArrivalDetector, ArrivalSummary};
pub use directions::{DirectionsClient, RouteRequest};
pub use error::{DirectionsError, RouteError, RouteResult, SnapError};
pub use fix::{LocationFix, TrackedPosition, Transition};
pub use plan::{Congestion, CongestionSegment, PlanSnapshot, RoutePlan, RouteSplit, Step};
pub use snap::RoadSnapClient;
pub use state::{DurationMode, RouteProgress, RouteState, recompute, remaining_duration};
pub use tracker::{Ingested, PositionTracker, SnapRequest};
