//! `ped-sim` — the clock-driven simulation loop.
//!
//! Wires the components into the fixed per-tick sequence:
//!
//! 1. Apply due events; rebuild the routing caches if flagged.
//! 2. Rebuild the neighbor index from the agent list.
//! 3. Strategic → tactical → operational decision passes (once the earliest
//!    premovement window has passed).
//! 4. Remove agents that reached an exit or left the geometry.
//! 5. Update door-flow counters and outflow regulation.
//! 6. Advance the clock.
//!
//! Shared mutable state (door states, stage occupancy, the router flag) is
//! touched only in the serial phases 1, 4, and 5; the operational pass in
//! phase 3 reads a pre-tick snapshot and stages its writes, which is what
//! the optional `parallel` feature (Rayon over the agent array) relies on.

mod builder;
mod events;
mod observer;
mod simulation;
mod stats;
mod systems;

mod error;

#[cfg(test)]
mod tests;

pub use builder::SimulationBuilder;
pub use error::{SimulationError, SimulationResult};
pub use events::{Event, EventKind, EventQueue};
pub use observer::{NoopObserver, SimObserver, TrajectoryRecord};
pub use simulation::{AgentDescription, Simulation};
pub use stats::{DoorStatistics, RoomStatistics, SimulationStatistics};
