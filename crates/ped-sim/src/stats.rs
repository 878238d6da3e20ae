//! Summary statistics exposed to the host for formatting.

use ped_core::{RoomId, TransitionId};

/// Egress summary for one room.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomStatistics {
    pub room: RoomId,
    pub caption: String,
    /// Elapsed time at which the room first became empty, or `None` while
    /// agents remain.
    pub egress_time: Option<f64>,
}

/// Usage summary for one door.
#[derive(Clone, Debug, PartialEq)]
pub struct DoorStatistics {
    pub door: TransitionId,
    pub usage: u64,
    /// Elapsed time of the last crossing; `None` if never crossed.
    pub last_passing_time: Option<f64>,
}

/// Snapshot of all summary statistics.
#[derive(Clone, Debug, Default)]
pub struct SimulationStatistics {
    pub rooms: Vec<RoomStatistics>,
    pub doors: Vec<DoorStatistics>,
}
