//! Train activation and deactivation as exactly invertible geometry splices.
//!
//! A docking train replaces one platform-edge wall with shorter wall pieces
//! and a set of doors.  The splice stores the three change sets (walls
//! removed, walls added, doors added); deactivation replays them in reverse,
//! restoring the subroom's wall and transition multisets to their
//! pre-activation state.

use ped_core::{LineSegment, Point, RoomId, SubRoomId, TrackId, TrainId, TransitionId};

use crate::building::Building;
use crate::error::{GeometryError, GeometryResult};
use crate::transition::Transition;

// ── Track ─────────────────────────────────────────────────────────────────────

/// A platform edge a train can dock against: one wall of one subroom.
#[derive(Clone, Debug)]
pub struct Track {
    pub room: RoomId,
    pub subroom: SubRoomId,
    /// The wall that is removed while a train is docked.
    pub wall: LineSegment,
}

// ── TrainType ─────────────────────────────────────────────────────────────────

/// A door of a train type, measured from the train's head.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrainDoor {
    /// Distance of the door's leading edge from the train head.
    pub distance: f64,
    pub width: f64,
}

/// Door layout of a train model.
#[derive(Clone, Debug)]
pub struct TrainType {
    pub length: f64,
    pub doors: Vec<TrainDoor>,
}

// ── TrainSplice ───────────────────────────────────────────────────────────────

/// The recorded change sets of one train activation.
#[derive(Clone, Debug)]
pub(crate) struct TrainSplice {
    pub track: TrackId,
    pub room: RoomId,
    pub subroom: SubRoomId,
    pub walls_removed: Vec<LineSegment>,
    pub walls_added: Vec<LineSegment>,
    pub doors_added: Vec<TransitionId>,
}

// ── Splice operations ─────────────────────────────────────────────────────────

impl Building {
    /// Splice the doors of a docking train into the track's subroom.
    ///
    /// Everything is validated before the first mutation, so a failure never
    /// leaves a partial splice behind.
    pub fn add_train_doors(
        &mut self,
        train: TrainId,
        track: TrackId,
        train_type: &TrainType,
        start_offset: f64,
        reversed: bool,
    ) -> GeometryResult<()> {
        if self.active_trains.contains_key(&train) {
            return Err(GeometryError::TrainAlreadyActive(train));
        }
        let track_info = self
            .tracks
            .get(&track)
            .ok_or(GeometryError::UnknownTrack(track))?
            .clone();
        let (room, subroom) = (track_info.room, track_info.subroom);
        let wall = track_info.wall;
        let wall_length = wall.length();

        {
            let sr = self.subroom(room, subroom)?;
            if !sr.walls().contains(&wall) {
                // Another train is already docked at this platform edge.
                return Err(GeometryError::WallNotFound(room, subroom));
            }
        }

        // Door intervals in metres from wall.p1, independent of direction.
        let mut intervals: Vec<(f64, f64)> = Vec::with_capacity(train_type.doors.len());
        for door in &train_type.doors {
            let a = start_offset + door.distance;
            let b = a + door.width;
            if a < -1e-9 || b > wall_length + 1e-9 {
                return Err(GeometryError::DoorOutsideTrack {
                    offset: door.distance,
                    width: door.width,
                    wall_length,
                });
            }
            let (a, b) = if reversed {
                (wall_length - b, wall_length - a)
            } else {
                (a, b)
            };
            intervals.push((a, b));
        }
        intervals.sort_by(|x, y| x.0.total_cmp(&y.0));

        let at = |t: f64| -> Point {
            let dir = (wall.p2 - wall.p1) * (1.0 / wall_length);
            wall.p1 + dir * t
        };

        // Wall pieces between and around the door intervals.
        let mut walls_added = Vec::new();
        let mut cursor = 0.0;
        for &(a, b) in &intervals {
            if a - cursor > 1e-9 {
                walls_added.push(LineSegment::new(at(cursor), at(a)));
            }
            cursor = b;
        }
        if wall_length - cursor > 1e-9 {
            walls_added.push(LineSegment::new(at(cursor), at(wall_length)));
        }

        // ── Apply (validated above; cannot fail past this point) ──────────
        let sr = self
            .rooms
            .get_mut(&room)
            .and_then(|r| r.subrooms.get_mut(&subroom))
            .expect("track subroom validated above");
        sr.remove_wall(&wall);
        for piece in &walls_added {
            sr.add_wall(*piece);
        }

        let mut doors_added = Vec::with_capacity(intervals.len());
        for &(a, b) in &intervals {
            let id = TransitionId(self.next_train_door_id);
            self.next_train_door_id += 1;
            let segment = LineSegment::new(at(a), at(b));
            let door = Transition::new(id, segment, (room, subroom), None);
            self.transitions.insert(id, door);
            self.rooms
                .get_mut(&room)
                .unwrap()
                .subrooms
                .get_mut(&subroom)
                .unwrap()
                .transitions
                .push(id);
            doors_added.push(id);
        }

        self.active_trains.insert(
            train,
            TrainSplice {
                track,
                room,
                subroom,
                walls_removed: vec![wall],
                walls_added,
                doors_added,
            },
        );
        Ok(())
    }

    /// Exactly invert a prior [`add_train_doors`](Self::add_train_doors):
    /// replay the stored change sets in reverse.
    pub fn remove_train_doors(&mut self, train: TrainId, track: TrackId) -> GeometryResult<()> {
        let splice = match self.active_trains.get(&train) {
            Some(s) if s.track == track => self.active_trains.remove(&train).unwrap(),
            _ => return Err(GeometryError::UnknownTrain(train)),
        };

        let sr = self
            .rooms
            .get_mut(&splice.room)
            .and_then(|r| r.subrooms.get_mut(&splice.subroom))
            .ok_or(GeometryError::UnknownSubRoom(splice.subroom, splice.room))?;

        for id in &splice.doors_added {
            sr.remove_transition_ref(*id);
            self.transitions.remove(id);
        }
        let sr = self
            .rooms
            .get_mut(&splice.room)
            .and_then(|r| r.subrooms.get_mut(&splice.subroom))
            .unwrap();
        for piece in &splice.walls_added {
            if !sr.remove_wall(piece) {
                return Err(GeometryError::WallNotFound(splice.room, splice.subroom));
            }
        }
        for wall in &splice.walls_removed {
            sr.add_wall(*wall);
        }
        Ok(())
    }

    /// `true` while `train` is docked.
    pub fn is_train_active(&self, train: TrainId) -> bool {
        self.active_trains.contains_key(&train)
    }

    /// Door ids added by an active train (empty if the train is unknown).
    pub fn train_door_ids(&self, train: TrainId) -> &[TransitionId] {
        self.active_trains
            .get(&train)
            .map(|s| s.doors_added.as_slice())
            .unwrap_or(&[])
    }
}
