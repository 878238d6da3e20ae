//! Subrooms — the unit of local containment and adjacency.

use ped_core::{CrossingId, LineSegment, Point, RoomId, SubRoomId, TransitionId};

use crate::Polygon;

// ── Obstacle ──────────────────────────────────────────────────────────────────

/// A closed polyline fully inside a subroom.  Agents cannot enter it; its
/// edges repel like walls and block visibility.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub polygon: Polygon,
}

impl Obstacle {
    pub fn new(polygon: Polygon) -> Self {
        Self { polygon }
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.polygon.contains(p)
    }

    pub fn edges(&self) -> impl Iterator<Item = LineSegment> + '_ {
        self.polygon.edges()
    }
}

// ── SubRoom ───────────────────────────────────────────────────────────────────

/// The smallest walkable polygon; owns walls and obstacles and references
/// the doors on its boundary.
///
/// Walls are a multiset: train activation removes the platform wall and adds
/// shorter pieces, deactivation replays the change in reverse, and equality
/// of the wall lists before and after is the reversibility invariant.
#[derive(Clone, Debug)]
pub struct SubRoom {
    pub room: RoomId,
    pub id: SubRoomId,
    /// The walkable area.  Containment is tested against this polygon minus
    /// the obstacles.
    pub polygon: Polygon,
    walls: Vec<LineSegment>,
    obstacles: Vec<Obstacle>,
    pub transitions: Vec<TransitionId>,
    pub crossings: Vec<CrossingId>,
    /// Subrooms reachable through one transition or crossing.  Computed by
    /// `BuildingBuilder::build`.
    pub(crate) neighbors: Vec<(RoomId, SubRoomId)>,
    centroid: Point,
}

impl SubRoom {
    pub fn new(room: RoomId, id: SubRoomId, polygon: Polygon, walls: Vec<LineSegment>) -> Self {
        let centroid = polygon.centroid();
        Self {
            room,
            id,
            polygon,
            walls,
            obstacles: Vec::new(),
            transitions: Vec::new(),
            crossings: Vec::new(),
            neighbors: Vec::new(),
            centroid,
        }
    }

    /// Cached area centroid of the walkable polygon.
    #[inline]
    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn walls(&self) -> &[LineSegment] {
        &self.walls
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// `true` if `p` lies in the walkable polygon and outside all obstacles.
    pub fn is_inside(&self, p: Point) -> bool {
        self.polygon.contains(p) && !self.obstacles.iter().any(|o| o.contains(p))
    }

    /// `true` if `other` shares a transition or crossing with this subroom.
    pub fn is_directly_connected_with(&self, other: (RoomId, SubRoomId)) -> bool {
        self.neighbors.contains(&other)
    }

    pub fn neighbors(&self) -> &[(RoomId, SubRoomId)] {
        &self.neighbors
    }

    // ── Wall multiset mutation (train splices) ────────────────────────────

    pub(crate) fn add_wall(&mut self, wall: LineSegment) {
        self.walls.push(wall);
    }

    /// Remove one wall equal to `wall`.  Returns `false` if absent.
    pub(crate) fn remove_wall(&mut self, wall: &LineSegment) -> bool {
        match self.walls.iter().position(|w| w == wall) {
            Some(i) => {
                self.walls.remove(i);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_transition_ref(&mut self, id: TransitionId) {
        self.transitions.retain(|&t| t != id);
    }
}
