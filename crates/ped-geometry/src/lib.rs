//! `ped-geometry` — the walkable 2-D geometry of a simulation.
//!
//! A [`Building`] is a collection of [`Room`]s, each a collection of
//! [`SubRoom`]s.  A subroom owns its walls, [`Obstacle`]s, and references to
//! the [`Transition`]s (doors) and [`Crossing`]s (internal passages) on its
//! boundary.  The building answers the queries the engine needs every tick:
//!
//! - containment: [`Building::get_room_and_subroom`]
//! - line of sight: [`Building::is_visible`]
//! - door lookup and state mutation (events)
//! - train activation/deactivation as exactly invertible wall/door splices
//!
//! All mutation happens between ticks, in the serial event phase; reads
//! during a tick observe a consistent snapshot.

mod builder;
mod building;
mod polygon;
mod subroom;
mod train;
mod transition;

mod error;


pub use builder::BuildingBuilder;
pub use building::{Building, Room};
pub use error::{GeometryError, GeometryResult};
pub use polygon::Polygon;
pub use subroom::{Obstacle, SubRoom};
pub use train::{TrainDoor, TrainType};
pub use transition::{Crossing, DoorState, FlowRecord, Transition};
