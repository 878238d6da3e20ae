//! `ped-core` — foundational types for the `rust_ped` pedestrian-dynamics
//! framework.
//!
//! This crate is a dependency of every other `ped-*` crate.  It intentionally
//! has no `ped-*` dependencies and minimal external ones (only `rand`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `StageId`, `JourneyId`, `TransitionId`, …      |
//! | [`geo`]    | `Point` (2-D vector math), `LineSegment`                  |
//! | [`time`]   | `SimulationClock` (fixed-dT tick counter)                 |
//! | [`rng`]    | `SimRng` (seeded, reproducible)                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use geo::{LineSegment, Point};
pub use ids::{
    AgentId, CrossingId, JourneyId, ProfileId, RoomId, StageId, SubRoomId, TrackId, TrainId,
    TransitionId,
};
pub use rng::SimRng;
pub use time::SimulationClock;
