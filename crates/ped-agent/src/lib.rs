//! `ped-agent` — the mobile entity record and its staged per-tick update.
//!
//! Agents are plain structs owned by the simulation loop.  During the
//! operational pass the model reads a *pre-tick snapshot* of every agent and
//! produces one [`AgentUpdate`] per agent; updates are applied sequentially
//! after the pass completes.  That calc/apply split is the sole basis for
//! safe parallelism over the agent array.

mod agent;


pub use agent::{Agent, AgentUpdate};
