//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Unlike dense array indices, these
//! are *stable handles*: agents, stages, and journeys are allocated from
//! monotonic counters and keep their id for their whole lifetime, even as
//! other entities are removed around them.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// The raw integer value, e.g. for output rows.
            #[inline(always)]
            pub fn raw(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }
    };
}

typed_id! {
    /// Handle of a simulated agent.  Allocated monotonically; never reused.
    pub struct AgentId(u64);
}

typed_id! {
    /// Handle of a journey (a directed graph of stages).
    pub struct JourneyId(u64);
}

typed_id! {
    /// Handle of a stage (waypoint, exit, waiting set, queue).
    pub struct StageId(u64);
}

typed_id! {
    /// Handle of an operational-model parameter profile.
    pub struct ProfileId(u32);
}

typed_id! {
    /// Handle of a transition (door between subrooms or to outside).
    pub struct TransitionId(u32);
}

typed_id! {
    /// Handle of a crossing (internal passage between subrooms of one room).
    pub struct CrossingId(u32);
}

typed_id! {
    /// Handle of a room.
    pub struct RoomId(u32);
}

typed_id! {
    /// Handle of a subroom within its room.
    pub struct SubRoomId(u32);
}

typed_id! {
    /// Handle of an activated train.
    pub struct TrainId(u32);
}

typed_id! {
    /// Handle of a track (the subroom edge a train docks against).
    pub struct TrackId(u32);
}
