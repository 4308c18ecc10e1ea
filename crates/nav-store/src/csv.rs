//! CSV trip-log backend.
//!
//! Creates three files in the configured output directory:
//! - `positions.csv`
//! - `plans.csv`
//! - `arrivals.csv`
//!
//! Empty cells mark values that were unavailable (no active plan, no fuel
//! figure).

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::{ArrivalRow, PlanRow, PositionRow, StoreResult};
use crate::writer::TripLogWriter;

/// Writes the trip log to three CSV files.
pub struct CsvTripLog {
    positions: Writer<File>,
    plans:     Writer<File>,
    arrivals:  Writer<File>,
    finished:  bool,
}

impl CsvTripLog {
    /// Create the three CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> StoreResult<Self> {
        let mut positions = Writer::from_path(dir.join("positions.csv"))?;
        positions.write_record([
            "timestamp_ms", "raw_lon", "raw_lat", "snapped_lon", "snapped_lat",
            "speed_kmh", "deviation_m", "remaining_m", "eta_ms", "step",
        ])?;

        let mut plans = Writer::from_path(dir.join("plans.csv"))?;
        plans.write_record(["revision", "source", "total_distance_m", "total_duration_s", "step_count"])?;

        let mut arrivals = Writer::from_path(dir.join("arrivals.csv"))?;
        arrivals.write_record([
            "arrival_ms", "eta_planned_ms", "total_distance_m", "total_duration_s",
            "time_saved_s", "fuel_used_liters",
        ])?;

        Ok(Self { positions, plans, arrivals, finished: false })
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl TripLogWriter for CsvTripLog {
    fn write_position(&mut self, row: &PositionRow) -> StoreResult<()> {
        self.positions.write_record(&[
            row.timestamp_ms.to_string(),
            row.raw_lon.to_string(),
            row.raw_lat.to_string(),
            row.snapped_lon.to_string(),
            row.snapped_lat.to_string(),
            format!("{:.1}", row.speed_kmh),
            opt(row.deviation_m.map(|d| format!("{d:.1}"))),
            opt(row.remaining_m.map(|r| format!("{r:.1}"))),
            opt(row.eta_ms),
            opt(row.step),
        ])?;
        Ok(())
    }

    fn write_plan(&mut self, row: &PlanRow) -> StoreResult<()> {
        self.plans.write_record(&[
            row.revision.to_string(),
            row.source.clone(),
            format!("{:.1}", row.total_distance_m),
            format!("{:.1}", row.total_duration_s),
            row.step_count.to_string(),
        ])?;
        // Plan changes are rare; keep them visible to readers mid-trip.
        self.plans.flush()?;
        Ok(())
    }

    fn write_arrival(&mut self, row: &ArrivalRow) -> StoreResult<()> {
        self.arrivals.write_record(&[
            row.arrival_ms.to_string(),
            row.eta_planned_ms.to_string(),
            format!("{:.1}", row.total_distance_m),
            format!("{:.1}", row.total_duration_s),
            format!("{:.1}", row.time_saved_s),
            opt(row.fuel_used_liters.map(|f| format!("{f:.3}"))),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> StoreResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.positions.flush()?;
        self.plans.flush()?;
        self.arrivals.flush()?;
        Ok(())
    }
}
