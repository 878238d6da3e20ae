//! `SimulationWriter<W>` — bridges `SimObserver` to an `OutputWriter`.

use ped_core::{AgentId, TransitionId};
use ped_sim::{SimObserver, TrajectoryRecord};

use crate::row::{DoorFlowRow, TrajectoryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes trajectories and door-flow rows to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  After the run, check with
/// [`take_error`][Self::take_error].
pub struct SimulationWriter<W: OutputWriter> {
    writer: W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimulationWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after the run completes.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Flush the backend and unwrap it (e.g. to inspect files afterwards).
    pub fn finish(mut self) -> OutputResult<W> {
        self.writer.finish()?;
        Ok(self.writer)
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimulationWriter<W> {
    fn on_tick_end(&mut self, _iteration: u64, _time: f64, trajectories: &[TrajectoryRecord]) {
        let rows: Vec<TrajectoryRow> = trajectories
            .iter()
            .map(|r| TrajectoryRow {
                agent: r.agent.raw(),
                iteration: r.iteration,
                time: r.time,
                x: r.x,
                y: r.y,
                ox: r.ox,
                oy: r.oy,
                speed: r.speed,
            })
            .collect();
        if !rows.is_empty() {
            let result = self.writer.write_trajectories(&rows);
            self.store_err(result);
        }
    }

    fn on_door_crossing(&mut self, time: f64, door: TransitionId, agent: AgentId, cumulative: u64) {
        let row = DoorFlowRow {
            time,
            door: door.raw(),
            cumulative,
            agent: agent.raw(),
        };
        let result = self.writer.write_door_flow(&row);
        self.store_err(result);
    }
}
