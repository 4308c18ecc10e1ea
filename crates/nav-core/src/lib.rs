//! `nav-core` — foundational types for the `nav_engine` route tracker.
//!
//! This crate is a dependency of every other `nav-*` crate.  It intentionally
//! has no `nav-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                 |
//! |-------------|----------------------------------------------------------|
//! | [`geo`]     | `GeoPoint`, haversine distance, bearing, lerp            |
//! | [`time`]    | `Timestamp`, `Clock`, `SystemClock`, `ManualClock`       |
//! | [`ids`]     | `RequestId`, `PlanRevision`                              |
//! | [`profile`] | `RoutingProfile`, `Avoid`, `AvoidSet`                    |
//! | [`config`]  | `NavConfig` — every threshold and window                 |
//! | [`flight`]  | `SingleFlight<T>` — coalescing request gate              |
//! | [`units`]   | speed conversions                                        |
//! | [`error`]   | `NavError`, `NavResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod config;
pub mod error;
pub mod flight;
pub mod geo;
pub mod ids;
pub mod profile;
pub mod time;
pub mod units;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::NavConfig;
pub use error::{NavError, NavResult};
pub use flight::SingleFlight;
pub use geo::GeoPoint;
pub use ids::{PlanRevision, RequestId};
pub use profile::{Avoid, AvoidSet, RoutingProfile};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
