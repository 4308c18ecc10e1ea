//! SQLite backends (feature `sqlite`).
//!
//! - [`SqliteTripLog`] writes `trip_log.db` with three tables: `positions`,
//!   `plans` and `arrivals`.
//! - [`SqlitePlanStore`] keeps the latest [`PlanSnapshot`] in a single-row
//!   `plan_snapshot` table.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};

use nav_route::PlanSnapshot;
use nav_session::{PlanStore, StoreFailure};

use crate::{ArrivalRow, PlanRow, PositionRow, StoreResult};
use crate::writer::TripLogWriter;

// ── SqliteTripLog ─────────────────────────────────────────────────────────────

/// Writes the trip log to an SQLite database.
pub struct SqliteTripLog {
    conn:     Connection,
    finished: bool,
}

impl SqliteTripLog {
    /// Open (or create) `trip_log.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> StoreResult<Self> {
        let conn = Connection::open(dir.join("trip_log.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS positions (
                 timestamp_ms INTEGER NOT NULL,
                 raw_lon      REAL    NOT NULL,
                 raw_lat      REAL    NOT NULL,
                 snapped_lon  REAL    NOT NULL,
                 snapped_lat  REAL    NOT NULL,
                 speed_kmh    REAL    NOT NULL,
                 deviation_m  REAL,
                 remaining_m  REAL,
                 eta_ms       INTEGER,
                 step         INTEGER
             );
             CREATE TABLE IF NOT EXISTS plans (
                 revision         INTEGER NOT NULL,
                 source           TEXT    NOT NULL,
                 total_distance_m REAL    NOT NULL,
                 total_duration_s REAL    NOT NULL,
                 step_count       INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS arrivals (
                 arrival_ms       INTEGER NOT NULL,
                 eta_planned_ms   INTEGER NOT NULL,
                 total_distance_m REAL    NOT NULL,
                 total_duration_s REAL    NOT NULL,
                 time_saved_s     REAL    NOT NULL,
                 fuel_used_liters REAL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl TripLogWriter for SqliteTripLog {
    fn write_position(&mut self, row: &PositionRow) -> StoreResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO positions \
             (timestamp_ms, raw_lon, raw_lat, snapped_lon, snapped_lat, speed_kmh, \
              deviation_m, remaining_m, eta_ms, step) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        stmt.execute(rusqlite::params![
            row.timestamp_ms,
            row.raw_lon,
            row.raw_lat,
            row.snapped_lon,
            row.snapped_lat,
            row.speed_kmh,
            row.deviation_m,
            row.remaining_m,
            row.eta_ms,
            row.step,
        ])?;
        Ok(())
    }

    fn write_plan(&mut self, row: &PlanRow) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO plans (revision, source, total_distance_m, total_duration_s, step_count) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                row.revision,
                row.source,
                row.total_distance_m,
                row.total_duration_s,
                row.step_count,
            ],
        )?;
        Ok(())
    }

    fn write_arrival(&mut self, row: &ArrivalRow) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO arrivals \
             (arrival_ms, eta_planned_ms, total_distance_m, total_duration_s, time_saved_s, fuel_used_liters) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                row.arrival_ms,
                row.eta_planned_ms,
                row.total_distance_m,
                row.total_duration_s,
                row.time_saved_s,
                row.fuel_used_liters,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> StoreResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}

// ── SqlitePlanStore ───────────────────────────────────────────────────────────

/// Keeps the latest plan snapshot in SQLite.
///
/// Queries run on tokio's blocking pool; the connection is shared behind a
/// mutex so the store can be handed to the session as `Arc<dyn PlanStore>`.
#[derive(Clone)]
pub struct SqlitePlanStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlanStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// An in-memory database, for tests and ephemeral sessions.
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS plan_snapshot (
                 id                INTEGER PRIMARY KEY CHECK (id = 1),
                 eta_ms            INTEGER NOT NULL,
                 current_road_name TEXT    NOT NULL,
                 body              TEXT    NOT NULL
             );",
        )?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreFailure>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let joined = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreFailure("sqlite connection poisoned".into()))?;
            f(&conn).map_err(StoreFailure::from)
        })
        .await;
        match joined {
            Ok(result) => result,
            Err(e) => Err(crate::StoreError::from(e).into()),
        }
    }
}

#[async_trait]
impl PlanStore for SqlitePlanStore {
    async fn save(&self, snapshot: &PlanSnapshot) -> Result<(), StoreFailure> {
        let body = serde_json::to_string(snapshot).map_err(|e| StoreFailure(e.to_string()))?;
        let eta_ms = snapshot.eta.0;
        let road = snapshot.current_road_name.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO plan_snapshot (id, eta_ms, current_road_name, body) \
                 VALUES (1, ?1, ?2, ?3)",
                rusqlite::params![eta_ms, road, body],
            )?;
            Ok(())
        })
        .await
    }

    async fn load(&self) -> Result<Option<PlanSnapshot>, StoreFailure> {
        self.blocking(|conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM plan_snapshot WHERE id = 1", [], |row| row.get(0))
                .optional()?;
            match body {
                Some(body) => Ok(Some(serde_json::from_str(&body)?)),
                None => Ok(None),
            }
        })
        .await
    }
}
