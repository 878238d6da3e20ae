//! The `OutputWriter` trait implemented by backend writers.

use crate::{DoorFlowRow, OutputResult, TrajectoryRow};

/// Backend-agnostic sink for simulation output rows.
pub trait OutputWriter {
    /// Write a batch of trajectory rows (one tick's worth).
    fn write_trajectories(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()>;

    /// Write one door-flow row.
    fn write_door_flow(&mut self, row: &DoorFlowRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
