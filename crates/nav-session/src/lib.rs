//! `nav-session` — off-route detection, recalculation, and the session actor.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`recalc`]    | `RecalculationCoordinator`, `Trip`, `RecalculationRequest`      |
//! | [`navigator`] | `Navigator` — sans-IO session state, returns `Effect`s          |
//! | [`session`]   | `Session` actor (tokio task) and `SessionHandle`                |
//! | [`builder`]   | `SessionBuilder`                                                |
//! | [`observer`]  | `SessionObserver` callbacks, `NoopObserver`                     |
//! | [`store`]     | `PlanStore` persistence port                                    |
//! | [`error`]     | `SessionError`, `SessionResult<T>`                              |
//!
//! # Concurrency model
//!
//! A session is a single tokio task owning all mutable state.  Location
//! fixes, collaborator results, preference changes and timer ticks are
//! messages on one channel and are applied strictly in arrival order, so
//! nothing is shared and nothing is locked.  At most one route computation
//! and one road-snap are in flight per session.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use nav_core::{GeoPoint, NavConfig};
//! use nav_session::{NoopObserver, SessionBuilder, Trip};
//!
//! let trip = Trip::new(GeoPoint::new(-88.04, 30.69));
//! let (handle, task) = SessionBuilder::new(NavConfig::default(), trip, directions)
//!     .spawn(NoopObserver)?;
//! handle.push_fix(fix)?;
//! handle.finish()?;
//! task.await?;
//! ```

pub mod builder;
pub mod error;
pub mod navigator;
pub mod observer;
pub mod recalc;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use builder::SessionBuilder;
pub use error::{SessionError, SessionResult};
pub use navigator::{Effect, Navigator, Preferences};
pub use observer::{NoopObserver, PlanSource, SessionObserver};
pub use recalc::{
    RecalcPhase, RecalcReason, RecalculationCoordinator, RecalculationRequest, Resolution, Trip,
};
pub use session::{Session, SessionHandle};
pub use store::{PlanStore, StoreFailure};
