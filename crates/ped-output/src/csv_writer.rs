//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `trajectories.csv`
//! - `door_flow.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{DoorFlowRow, OutputResult, TrajectoryRow};

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    trajectories: Writer<File>,
    door_flow: Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the headers.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut trajectories = Writer::from_path(dir.join("trajectories.csv"))?;
        trajectories.write_record(["agent", "iteration", "time", "x", "y", "ox", "oy", "speed"])?;

        let mut door_flow = Writer::from_path(dir.join("door_flow.csv"))?;
        door_flow.write_record(["time", "door", "cumulative", "agent"])?;

        Ok(Self {
            trajectories,
            door_flow,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_trajectories(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()> {
        for row in rows {
            self.trajectories.write_record(&[
                row.agent.to_string(),
                row.iteration.to_string(),
                format!("{:.3}", row.time),
                format!("{:.6}", row.x),
                format!("{:.6}", row.y),
                format!("{:.6}", row.ox),
                format!("{:.6}", row.oy),
                format!("{:.6}", row.speed),
            ])?;
        }
        Ok(())
    }

    fn write_door_flow(&mut self, row: &DoorFlowRow) -> OutputResult<()> {
        self.door_flow.write_record(&[
            format!("{:.3}", row.time),
            row.door.to_string(),
            row.cumulative.to_string(),
            row.agent.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trajectories.flush()?;
        self.door_flow.flush()?;
        Ok(())
    }
}
