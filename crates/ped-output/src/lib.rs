//! `ped-output` — file output for simulation runs.
//!
//! The engine hands plain records to a [`SimObserver`][ped_sim::SimObserver];
//! this crate bridges that stream to an [`OutputWriter`] backend.  The one
//! backend provided is CSV ([`CsvWriter`]): `trajectories.csv` and
//! `door_flow.csv` in a configured directory.

mod csv_writer;
mod observer;
mod row;
mod writer;

mod error;

#[cfg(test)]
mod tests;

pub use csv_writer::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimulationWriter;
pub use row::{DoorFlowRow, TrajectoryRow};
pub use writer::OutputWriter;
