//! The `TripLogWriter` trait implemented by every trip-log backend.

use crate::{ArrivalRow, PlanRow, PositionRow, StoreResult};

/// Backend-agnostic sink for trip-log rows.
pub trait TripLogWriter {
    /// Append one position update.
    fn write_position(&mut self, row: &PositionRow) -> StoreResult<()>;

    /// Append one plan change.
    fn write_plan(&mut self, row: &PlanRow) -> StoreResult<()>;

    /// Append one arrival summary.
    fn write_arrival(&mut self, row: &ArrivalRow) -> StoreResult<()>;

    /// Flush and close.  Called once when the session ends.
    fn finish(&mut self) -> StoreResult<()>;
}
