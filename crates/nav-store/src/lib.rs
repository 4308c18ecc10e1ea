//! `nav-store` — plan persistence and trip logging for nav_engine.
//!
//! Plan stores implement `nav_session::PlanStore`:
//!
//! | Type                | Feature   | Storage                                 |
//! |---------------------|-----------|-----------------------------------------|
//! | `MemoryPlanStore`   | *(none)*  | process memory                          |
//! | `JsonFilePlanStore` | *(none)*  | one JSON document, atomically replaced  |
//! | `SqlitePlanStore`   | `sqlite`  | single-row `plan_snapshot` table        |
//!
//! Trip-log backends implement [`TripLogWriter`] and are driven by
//! [`TripLogObserver`], which implements `nav_session::SessionObserver`:
//!
//! | Feature   | Backend     | Files created                                 |
//! |-----------|-------------|-----------------------------------------------|
//! | *(none)*  | CSV         | `positions.csv`, `plans.csv`, `arrivals.csv`  |
//! | `sqlite`  | SQLite      | `trip_log.db`                                 |
//!
//! # Usage
//!
//! ```rust,ignore
//! use nav_store::{CsvTripLog, JsonFilePlanStore, TripLogObserver};
//!
//! let log = TripLogObserver::new(CsvTripLog::new(Path::new("./trip"))?);
//! let (handle, task) = SessionBuilder::new(config, trip, directions)
//!     .store(Arc::new(JsonFilePlanStore::new("./trip/plan.json")))
//!     .spawn(log)?;
//! // ...
//! let mut log = task.await?;
//! log.take_error().map(|e| eprintln!("trip log error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod plan_store;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvTripLog;
pub use error::{StoreError, StoreResult};
pub use observer::TripLogObserver;
pub use plan_store::{JsonFilePlanStore, MemoryPlanStore};
pub use row::{ArrivalRow, PlanRow, PositionRow};
pub use writer::TripLogWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqlitePlanStore, SqliteTripLog};
