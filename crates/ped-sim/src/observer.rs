//! Observer hooks for trajectory and flow consumers.

use ped_core::{AgentId, TransitionId};

/// One agent's state at the end of a tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrajectoryRecord {
    pub agent: AgentId,
    pub iteration: u64,
    pub time: f64,
    pub x: f64,
    pub y: f64,
    /// Unit orientation components.
    pub ox: f64,
    pub oy: f64,
    pub speed: f64,
}

/// Callbacks invoked by [`Simulation::iterate_with`][crate::Simulation::iterate_with]
/// at key points in the tick.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  File formatting lives outside the
/// engine; these hooks hand over plain records.
pub trait SimObserver {
    /// Called at the end of each tick with the post-step trajectories of all
    /// agents still in the simulation.
    fn on_tick_end(&mut self, _iteration: u64, _time: f64, _trajectories: &[TrajectoryRecord]) {}

    /// Called once per agent-door crossing detected this tick.
    /// `cumulative` is the door's usage count including this crossing.
    fn on_door_crossing(
        &mut self,
        _time: f64,
        _door: TransitionId,
        _agent: AgentId,
        _cumulative: u64,
    ) {
    }

    /// Called when agents were removed this tick (exit reached or out of
    /// bounds).
    fn on_agents_removed(&mut self, _time: f64, _removed: &[AgentId]) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
