//! `ped-model` — the operational decision layer.
//!
//! Implements a first-order velocity model: each tick an agent's movement
//! direction is the sum of its desired direction and exponential repulsion
//! from nearby pedestrians and walls; its speed is throttled by the free
//! spacing ahead.  The computation for one agent reads only the pre-tick
//! snapshot, so the per-agent steps are independent within a tick.
//!
//! Pathological inputs (coincident agents, non-finite arithmetic) are bugs
//! or broken spawns, not recoverable conditions — they surface as errors and
//! the simulation loop refuses to advance.

mod builder;
mod parameters;
mod velocity;

mod error;


pub use builder::VelocityModelBuilder;
pub use error::{ModelError, ModelResult};
pub use parameters::AgentParameters;
pub use velocity::{VelocityModel, EPS, EPS_GOAL, EPS_V};
