//! The `Building`: rooms, doors, containment, visibility, flow regulation.

use std::collections::{BTreeMap, HashMap};

use ped_core::{CrossingId, LineSegment, Point, RoomId, SubRoomId, TrackId, TrainId, TransitionId};

use crate::error::{GeometryError, GeometryResult};
use crate::subroom::SubRoom;
use crate::train::{TrainSplice, Track};
use crate::transition::{Crossing, DoorState, Transition};

// ── Room ──────────────────────────────────────────────────────────────────────

/// A named collection of subrooms.
#[derive(Clone, Debug)]
pub struct Room {
    pub id: RoomId,
    pub caption: String,
    pub subrooms: BTreeMap<SubRoomId, SubRoom>,
}

// ── Building ──────────────────────────────────────────────────────────────────

/// The complete walkable geometry.
///
/// Built once by [`BuildingBuilder`](crate::BuildingBuilder); mutated only by
/// door events, train splices, and the outflow regulator — all of which run
/// in the serial phase between ticks.
pub struct Building {
    pub(crate) rooms: BTreeMap<RoomId, Room>,
    pub(crate) transitions: BTreeMap<TransitionId, Transition>,
    pub(crate) crossings: BTreeMap<CrossingId, Crossing>,
    pub(crate) tracks: BTreeMap<TrackId, Track>,
    pub(crate) active_trains: BTreeMap<TrainId, TrainSplice>,
    /// Door ids for train doors are allocated from here, above all static ids.
    pub(crate) next_train_door_id: u32,

    // ── Containment index ─────────────────────────────────────────────────
    /// Coarse grid cell → candidate subrooms, by bounding-box overlap.
    pub(crate) lookup_grid: HashMap<(i32, i32), Vec<(RoomId, SubRoomId)>>,
    pub(crate) lookup_origin: Point,
    pub(crate) lookup_cell: f64,
}

impl Building {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room(&self, id: RoomId) -> GeometryResult<&Room> {
        self.rooms.get(&id).ok_or(GeometryError::UnknownRoom(id))
    }

    pub fn subroom(&self, room: RoomId, subroom: SubRoomId) -> GeometryResult<&SubRoom> {
        self.room(room)?
            .subrooms
            .get(&subroom)
            .ok_or(GeometryError::UnknownSubRoom(subroom, room))
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn transition(&self, id: TransitionId) -> GeometryResult<&Transition> {
        self.transitions
            .get(&id)
            .ok_or(GeometryError::UnknownTransition(id))
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> GeometryResult<&mut Transition> {
        self.transitions
            .get_mut(&id)
            .ok_or(GeometryError::UnknownTransition(id))
    }

    pub fn crossings(&self) -> impl Iterator<Item = &Crossing> {
        self.crossings.values()
    }

    pub fn crossing(&self, id: CrossingId) -> GeometryResult<&Crossing> {
        self.crossings
            .get(&id)
            .ok_or(GeometryError::UnknownCrossing(id))
    }

    pub fn crossing_mut(&mut self, id: CrossingId) -> GeometryResult<&mut Crossing> {
        self.crossings
            .get_mut(&id)
            .ok_or(GeometryError::UnknownCrossing(id))
    }

    // ── Containment ───────────────────────────────────────────────────────

    /// The room and subroom containing `p`, or `None` if `p` is outside the
    /// walkable geometry.
    ///
    /// Candidates come from a coarse grid of subroom bounding boxes, so the
    /// exact point-in-polygon test runs against a handful of subrooms, not
    /// all of them.
    pub fn get_room_and_subroom(&self, p: Point) -> Option<(RoomId, SubRoomId)> {
        let cell = self.lookup_cell_of(p);
        let candidates = self.lookup_grid.get(&cell)?;
        for &(room, subroom) in candidates {
            let sr = &self.rooms[&room].subrooms[&subroom];
            if sr.is_inside(p) {
                return Some((room, subroom));
            }
        }
        None
    }

    #[inline]
    pub(crate) fn lookup_cell_of(&self, p: Point) -> (i32, i32) {
        (
            ((p.x - self.lookup_origin.x) / self.lookup_cell).floor() as i32,
            ((p.y - self.lookup_origin.y) / self.lookup_cell).floor() as i32,
        )
    }

    /// Bounding box of the whole walkable area, `(min, max)`.
    pub fn bounding_box(&self) -> (Point, Point) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for room in self.rooms.values() {
            for sr in room.subrooms.values() {
                let (lo, hi) = sr.polygon.bounding_box();
                min.x = min.x.min(lo.x);
                min.y = min.y.min(lo.y);
                max.x = max.x.max(hi.x);
                max.y = max.y.max(hi.y);
            }
        }
        (min, max)
    }

    // ── Visibility ────────────────────────────────────────────────────────

    /// Line of sight from `p1` to `p2`, checked against the walls,
    /// obstacles, and non-open doors of the hinted subrooms.
    ///
    /// OPEN transitions and crossings never block.  Callers pass the
    /// subrooms of both endpoints; for adjacent subrooms that covers every
    /// segment the sight line can touch.
    pub fn is_visible(&self, p1: Point, p2: Point, hints: &[(RoomId, SubRoomId)]) -> bool {
        for &(room, subroom) in hints {
            let Some(sr) = self
                .rooms
                .get(&room)
                .and_then(|r| r.subrooms.get(&subroom))
            else {
                continue;
            };
            for wall in sr.walls() {
                if wall.crosses(p1, p2) {
                    return false;
                }
            }
            for obstacle in sr.obstacles() {
                for edge in obstacle.edges() {
                    if edge.crosses(p1, p2) {
                        return false;
                    }
                }
            }
            for &tid in &sr.transitions {
                let door = &self.transitions[&tid];
                if !door.is_open() && door.segment.crosses(p1, p2) {
                    return false;
                }
            }
        }
        true
    }

    // ── Door events ───────────────────────────────────────────────────────

    pub fn open_door(&mut self, id: TransitionId) -> GeometryResult<()> {
        self.transition_mut(id)?.open();
        Ok(())
    }

    pub fn temp_close_door(&mut self, id: TransitionId) -> GeometryResult<()> {
        self.transition_mut(id)?.temp_close();
        Ok(())
    }

    pub fn close_door(&mut self, id: TransitionId) -> GeometryResult<()> {
        self.transition_mut(id)?.close();
        Ok(())
    }

    pub fn reset_door(&mut self, id: TransitionId) -> GeometryResult<()> {
        self.transition_mut(id)?.reset();
        Ok(())
    }

    // ── Outflow regulation ────────────────────────────────────────────────

    /// Enforce per-door outflow rates and usage maxima.
    ///
    /// A door whose observed flow runs ahead of `outflow_rate * elapsed` is
    /// temp-closed until the allowance catches up; a door that has reached
    /// `max_door_usage` is closed for good.  Returns `true` if any door
    /// state changed (the router cache must then be rebuilt).
    pub fn update_flow_regulation(&mut self, elapsed_time: f64) -> bool {
        let mut changed = false;
        for door in self.transitions.values_mut() {
            if let Some(max) = door.max_door_usage {
                if door.door_usage() >= max && !door.is_closed() {
                    door.close();
                    changed = true;
                    continue;
                }
            }
            if let Some(rate) = door.outflow_rate {
                let allowed = rate * elapsed_time;
                let ahead = door.door_usage() as f64 > allowed;
                match door.state() {
                    DoorState::Open if ahead => {
                        door.temp_close();
                        door.regulator_closed = true;
                        changed = true;
                    }
                    DoorState::TempClose if !ahead && door.regulator_closed => {
                        door.open();
                        changed = true;
                    }
                    _ => {}
                }
            }
        }
        changed
    }

    // ── Statistics helpers ────────────────────────────────────────────────

    /// All walls and obstacle edges of one subroom plus the segments of its
    /// non-open doors — exactly the set the wall-repulsion sum runs over.
    pub fn repelling_segments(&self, room: RoomId, subroom: SubRoomId) -> Vec<LineSegment> {
        let Ok(sr) = self.subroom(room, subroom) else {
            return Vec::new();
        };
        let mut segments: Vec<LineSegment> = sr.walls().to_vec();
        for obstacle in sr.obstacles() {
            segments.extend(obstacle.edges());
        }
        for &tid in &sr.transitions {
            let door = &self.transitions[&tid];
            if !door.is_open() {
                segments.push(door.segment);
            }
        }
        segments
    }
}
