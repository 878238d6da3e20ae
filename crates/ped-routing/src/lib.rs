//! `ped-routing` — from (position, stage target) to a navigation line.
//!
//! The engine offers two strategies:
//!
//! - **Door graph**: transitions and crossings become graph nodes, connected
//!   where they share a subroom; Dijkstra picks the first door on the
//!   shortest path to the target's subroom.  CLOSE doors are excluded from
//!   the graph; TEMP_CLOSE doors are routable (agents approach and wait).
//! - **Floor field**: a per-target-stage grid distance field descended by
//!   gradient, for geometries where door-to-door steering is too coarse.
//!
//! # Cache discipline
//!
//! Precomputed data (the graph, the fields) is invalidated by a single
//! `needs_update` flag, set by door events, train splices, and flow
//! regulation.  The simulation loop observes the flag at the top of each
//! tick, rebuilds, and clears it; between two ticks with the flag clear the
//! mapping (position, target) → nav line is pure.

mod door_graph;
mod engine;
mod floorfield;

mod error;


pub use engine::{NavTarget, RoutingEngine, RoutingStrategy};
pub use error::{RoutingError, RoutingResult};
