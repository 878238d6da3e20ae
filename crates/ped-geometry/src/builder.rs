//! Incremental construction of a [`Building`], validated at `build()`.

use std::collections::{BTreeMap, HashMap};

use ped_core::{CrossingId, LineSegment, Point, RoomId, SubRoomId, TrackId, TransitionId};

use crate::building::{Building, Room};
use crate::error::{GeometryError, GeometryResult};
use crate::polygon::Polygon;
use crate::subroom::{Obstacle, SubRoom};
use crate::train::Track;
use crate::transition::{Crossing, Transition};

/// Assemble rooms, subrooms, doors, and tracks in any order, then call
/// [`build`](Self::build) to validate cross-references and finalise the
/// containment index and adjacency sets.
pub struct BuildingBuilder {
    rooms: BTreeMap<RoomId, Room>,
    transitions: BTreeMap<TransitionId, Transition>,
    crossings: BTreeMap<CrossingId, Crossing>,
    tracks: BTreeMap<TrackId, Track>,
    errors: Vec<String>,
}

impl BuildingBuilder {
    pub fn new() -> Self {
        Self {
            rooms: BTreeMap::new(),
            transitions: BTreeMap::new(),
            crossings: BTreeMap::new(),
            tracks: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_room(&mut self, id: RoomId, caption: &str) -> &mut Self {
        if self.rooms.contains_key(&id) {
            self.errors.push(format!("duplicate room {id}"));
        } else {
            self.rooms.insert(
                id,
                Room {
                    id,
                    caption: caption.to_owned(),
                    subrooms: BTreeMap::new(),
                },
            );
        }
        self
    }

    /// Add a subroom with its walkable polygon and explicit wall segments
    /// (the boundary minus door openings).
    pub fn add_subroom(
        &mut self,
        room: RoomId,
        id: SubRoomId,
        polygon: Polygon,
        walls: Vec<LineSegment>,
    ) -> &mut Self {
        match self.rooms.get_mut(&room) {
            None => self.errors.push(format!("subroom {id} references unknown room {room}")),
            Some(r) => {
                if r.subrooms.contains_key(&id) {
                    self.errors.push(format!("duplicate subroom {id} in room {room}"));
                } else {
                    r.subrooms.insert(id, SubRoom::new(room, id, polygon, walls));
                }
            }
        }
        self
    }

    pub fn add_obstacle(&mut self, room: RoomId, subroom: SubRoomId, polygon: Polygon) -> &mut Self {
        match self
            .rooms
            .get_mut(&room)
            .and_then(|r| r.subrooms.get_mut(&subroom))
        {
            None => self
                .errors
                .push(format!("obstacle references unknown subroom {subroom} in room {room}")),
            Some(sr) => sr.add_obstacle(Obstacle::new(polygon)),
        }
        self
    }

    /// Add a door.  `to = None` leads outside the walkable area.
    pub fn add_transition(
        &mut self,
        id: TransitionId,
        segment: LineSegment,
        from: (RoomId, SubRoomId),
        to: Option<(RoomId, SubRoomId)>,
    ) -> &mut Self {
        if self.transitions.contains_key(&id) {
            self.errors.push(format!("duplicate transition {id}"));
        } else {
            self.transitions.insert(id, Transition::new(id, segment, from, to));
        }
        self
    }

    /// Limit a door's throughput: `rate` passings per second and/or an
    /// absolute usage maximum after which the door closes for good.
    pub fn set_outflow(
        &mut self,
        id: TransitionId,
        rate: Option<f64>,
        max_usage: Option<u64>,
    ) -> &mut Self {
        match self.transitions.get_mut(&id) {
            None => self.errors.push(format!("outflow set on unknown transition {id}")),
            Some(t) => {
                t.outflow_rate = rate;
                t.max_door_usage = max_usage;
            }
        }
        self
    }

    pub fn add_crossing(
        &mut self,
        id: CrossingId,
        segment: LineSegment,
        room: RoomId,
        subroom1: SubRoomId,
        subroom2: SubRoomId,
    ) -> &mut Self {
        if self.crossings.contains_key(&id) {
            self.errors.push(format!("duplicate crossing {id}"));
        } else {
            self.crossings
                .insert(id, Crossing::new(id, segment, room, subroom1, subroom2));
        }
        self
    }

    /// Register a platform edge a train can dock against.  `wall` must be
    /// one of the subroom's wall segments.
    pub fn add_track(
        &mut self,
        id: TrackId,
        room: RoomId,
        subroom: SubRoomId,
        wall: LineSegment,
    ) -> &mut Self {
        if self.tracks.contains_key(&id) {
            self.errors.push(format!("duplicate track {id}"));
        } else {
            self.tracks.insert(id, Track { room, subroom, wall });
        }
        self
    }

    /// Validate all cross-references, wire doors into their subrooms,
    /// compute adjacency, and build the containment grid.
    pub fn build(mut self) -> GeometryResult<Building> {
        // ── Reference validation ──────────────────────────────────────────
        for t in self.transitions.values() {
            let mut sides = vec![t.from];
            if let Some(to) = t.to {
                sides.push(to);
            }
            for (room, subroom) in sides {
                if self
                    .rooms
                    .get(&room)
                    .and_then(|r| r.subrooms.get(&subroom))
                    .is_none()
                {
                    self.errors.push(format!(
                        "transition {} references unknown subroom {subroom} in room {room}",
                        t.id
                    ));
                }
            }
        }
        for c in self.crossings.values() {
            for subroom in [c.subroom1, c.subroom2] {
                if self
                    .rooms
                    .get(&c.room)
                    .and_then(|r| r.subrooms.get(&subroom))
                    .is_none()
                {
                    self.errors.push(format!(
                        "crossing {} references unknown subroom {subroom} in room {}",
                        c.id, c.room
                    ));
                }
            }
        }
        for (id, track) in &self.tracks {
            let known_wall = self
                .rooms
                .get(&track.room)
                .and_then(|r| r.subrooms.get(&track.subroom))
                .map(|sr| sr.walls().contains(&track.wall))
                .unwrap_or(false);
            if !known_wall {
                self.errors
                    .push(format!("track {id} wall is not a wall of its subroom"));
            }
        }
        if !self.errors.is_empty() {
            return Err(GeometryError::Definition(self.errors.join("; ")));
        }

        // ── Wire doors into subrooms and collect adjacency ────────────────
        for t in self.transitions.values() {
            let mut sides = vec![t.from];
            if let Some(to) = t.to {
                sides.push(to);
            }
            for (room, subroom) in &sides {
                let sr = self
                    .rooms
                    .get_mut(room)
                    .unwrap()
                    .subrooms
                    .get_mut(subroom)
                    .unwrap();
                sr.transitions.push(t.id);
            }
            if let Some(to) = t.to {
                Self::link(&mut self.rooms, t.from, to);
            }
        }
        for c in self.crossings.values() {
            for subroom in [c.subroom1, c.subroom2] {
                self.rooms
                    .get_mut(&c.room)
                    .unwrap()
                    .subrooms
                    .get_mut(&subroom)
                    .unwrap()
                    .crossings
                    .push(c.id);
            }
            Self::link(
                &mut self.rooms,
                (c.room, c.subroom1),
                (c.room, c.subroom2),
            );
        }

        // ── Containment grid ──────────────────────────────────────────────
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max_extent = 1.0_f64;
        let mut boxes = Vec::new();
        for room in self.rooms.values() {
            for sr in room.subrooms.values() {
                let (lo, hi) = sr.polygon.bounding_box();
                min.x = min.x.min(lo.x);
                min.y = min.y.min(lo.y);
                max_extent = max_extent.max((hi.x - lo.x).max(hi.y - lo.y));
                boxes.push((room.id, sr.id, lo, hi));
            }
        }
        // Cell side = the largest subroom extent, so every subroom overlaps
        // only a handful of cells and every query hits a short candidate list.
        let cell = max_extent;
        let mut lookup_grid: HashMap<(i32, i32), Vec<(RoomId, SubRoomId)>> = HashMap::new();
        for (room, subroom, lo, hi) in boxes {
            let cx0 = ((lo.x - min.x) / cell).floor() as i32;
            let cy0 = ((lo.y - min.y) / cell).floor() as i32;
            let cx1 = ((hi.x - min.x) / cell).floor() as i32;
            let cy1 = ((hi.y - min.y) / cell).floor() as i32;
            for cx in cx0..=cx1 {
                for cy in cy0..=cy1 {
                    lookup_grid.entry((cx, cy)).or_default().push((room, subroom));
                }
            }
        }

        let next_train_door_id = self
            .transitions
            .keys()
            .map(|t| t.0 + 1)
            .max()
            .unwrap_or(0)
            .max(10_000);

        Ok(Building {
            rooms: self.rooms,
            transitions: self.transitions,
            crossings: self.crossings,
            tracks: self.tracks,
            active_trains: BTreeMap::new(),
            next_train_door_id,
            lookup_grid,
            lookup_origin: min,
            lookup_cell: cell,
        })
    }

    fn link(
        rooms: &mut BTreeMap<RoomId, Room>,
        a: (RoomId, SubRoomId),
        b: (RoomId, SubRoomId),
    ) {
        let sa = rooms.get_mut(&a.0).unwrap().subrooms.get_mut(&a.1).unwrap();
        if !sa.neighbors.contains(&b) {
            sa.neighbors.push(b);
        }
        let sb = rooms.get_mut(&b.0).unwrap().subrooms.get_mut(&b.1).unwrap();
        if !sb.neighbors.contains(&a) {
            sb.neighbors.push(a);
        }
    }
}

impl Default for BuildingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
