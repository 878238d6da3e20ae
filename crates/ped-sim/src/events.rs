//! Timestamped geometry-mutation commands.
//!
//! Events are applied at tick boundaries: at the top of the tick whose
//! elapsed time has passed the event time, strictly ordered by timestamp
//! with ties broken by submission order.  Every successful application
//! flags the router dirty.  Unknown ids are reported (logged) but do not
//! abort the run; failed train splices roll back cleanly inside
//! `ped-geometry`.

use ped_core::{TrackId, TrainId, TransitionId};
use ped_geometry::{Building, GeometryResult, TrainType};

// ── Event ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub enum EventKind {
    OpenDoor(TransitionId),
    TempCloseDoor(TransitionId),
    CloseDoor(TransitionId),
    ResetDoor(TransitionId),
    ActivateTrain {
        train: TrainId,
        track: TrackId,
        train_type: TrainType,
        start_offset: f64,
        reversed: bool,
    },
    DeactivateTrain {
        train: TrainId,
        track: TrackId,
    },
}

/// A command scheduled for simulated second `time`.
#[derive(Clone, Debug)]
pub struct Event {
    pub time: f64,
    pub kind: EventKind,
}

impl Event {
    pub fn new(time: f64, kind: EventKind) -> Self {
        Self { time, kind }
    }

    /// Apply this event's mutation to the building.
    pub(crate) fn apply(&self, building: &mut Building) -> GeometryResult<()> {
        match &self.kind {
            EventKind::OpenDoor(id) => building.open_door(*id),
            EventKind::TempCloseDoor(id) => building.temp_close_door(*id),
            EventKind::CloseDoor(id) => building.close_door(*id),
            EventKind::ResetDoor(id) => building.reset_door(*id),
            EventKind::ActivateTrain {
                train,
                track,
                train_type,
                start_offset,
                reversed,
            } => building.add_train_doors(*train, *track, train_type, *start_offset, *reversed),
            EventKind::DeactivateTrain { train, track } => {
                building.remove_train_doors(*train, *track)
            }
        }
    }
}

// ── EventQueue ────────────────────────────────────────────────────────────────

/// Events ordered by `(time, submission order)`.
///
/// Kept sorted on insert: new events go after all events with time ≤ theirs,
/// so equal timestamps preserve submission order.
#[derive(Default)]
pub struct EventQueue {
    inner: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        let at = self.inner.partition_point(|e| e.time <= event.time);
        self.inner.insert(at, event);
    }

    /// Remove and return all events with `time ≤ elapsed`, in order.
    pub fn drain_due(&mut self, elapsed: f64) -> Vec<Event> {
        let n = self.inner.partition_point(|e| e.time <= elapsed);
        self.inner.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
