//! Stage variants and their completion predicates.

use std::collections::VecDeque;

use ped_core::{AgentId, Point, StageId};
use ped_geometry::Polygon;

use crate::error::{StageError, StageResult};

// ── StageDescription ──────────────────────────────────────────────────────────

/// What the caller supplies to `AddStage`.
#[derive(Clone, Debug)]
pub enum StageDescription {
    /// A point with an arrival radius.
    Waypoint { position: Point, distance: f64 },
    /// A polygon; reaching it removes the agent from the simulation.
    Exit { polygon: Polygon },
    /// Fixed waiting positions released together by `notify`.
    WaitingSet { slots: Vec<Point> },
    /// Fixed waiting positions released head-first by `pop`.
    Queue { slots: Vec<Point> },
}

// ── Stage ─────────────────────────────────────────────────────────────────────

/// A stage plus its interior state.
pub struct Stage {
    pub id: StageId,
    kind: Kind,
}

enum Kind {
    Waypoint {
        position: Point,
        distance: f64,
    },
    Exit {
        polygon: Polygon,
        centroid: Point,
    },
    WaitingSet {
        slots: Vec<Point>,
        occupants: Vec<AgentId>,
        released: bool,
    },
    Queue {
        slots: Vec<Point>,
        occupants: VecDeque<AgentId>,
        /// Head occupants released by `pop` but not yet transitioned.
        pending_pops: usize,
    },
}

impl Stage {
    pub fn new(id: StageId, desc: StageDescription) -> StageResult<Self> {
        let kind = match desc {
            StageDescription::Waypoint { position, distance } => Kind::Waypoint { position, distance },
            StageDescription::Exit { polygon } => {
                if polygon.points().len() < 3 {
                    return Err(StageError::DegenerateExit);
                }
                let centroid = polygon.centroid();
                Kind::Exit { polygon, centroid }
            }
            StageDescription::WaitingSet { slots } => {
                if slots.is_empty() {
                    return Err(StageError::NoSlots);
                }
                Kind::WaitingSet { slots, occupants: Vec::new(), released: false }
            }
            StageDescription::Queue { slots } => {
                if slots.is_empty() {
                    return Err(StageError::NoSlots);
                }
                Kind::Queue { slots, occupants: VecDeque::new(), pending_pops: 0 }
            }
        };
        Ok(Self { id, kind })
    }

    /// `true` if this is an Exit stage (reaching it removes the agent).
    pub fn is_exit(&self) -> bool {
        matches!(self.kind, Kind::Exit { .. })
    }

    /// The exit polygon, for the removal scan.
    pub fn exit_polygon(&self) -> Option<&Polygon> {
        match &self.kind {
            Kind::Exit { polygon, .. } => Some(polygon),
            _ => None,
        }
    }

    // ── Targets ───────────────────────────────────────────────────────────

    /// The point the tactical layer steers `agent` toward.
    ///
    /// Waiting sets and queues hand out their slot positions by occupancy
    /// order; agents beyond the slot count aim for the last slot.
    pub fn target_for(&self, agent: AgentId) -> Point {
        match &self.kind {
            Kind::Waypoint { position, .. } => *position,
            Kind::Exit { centroid, .. } => *centroid,
            Kind::WaitingSet { slots, occupants, .. } => {
                match occupants.iter().position(|&a| a == agent) {
                    Some(i) if i < slots.len() => slots[i],
                    _ => *slots.last().expect("validated non-empty"),
                }
            }
            Kind::Queue { slots, occupants, .. } => {
                match occupants.iter().position(|&a| a == agent) {
                    Some(i) if i < slots.len() => slots[i],
                    _ => *slots.last().expect("validated non-empty"),
                }
            }
        }
    }

    // ── Completion ────────────────────────────────────────────────────────

    /// The completion predicate of the stage for one agent.
    pub fn completed_by(&self, agent: AgentId, pos: Point) -> bool {
        match &self.kind {
            Kind::Waypoint { position, distance } => pos.distance_to(*position) <= *distance,
            Kind::Exit { polygon, .. } => polygon.contains(pos),
            Kind::WaitingSet { occupants, released, .. } => {
                *released && occupants.contains(&agent)
            }
            Kind::Queue { occupants, pending_pops, .. } => {
                *pending_pops > 0 && occupants.front() == Some(&agent)
            }
        }
    }

    /// `true` while the stage itself holds `agent` in waiting (a gate that
    /// the routing layer must respect even when all doors are open).
    pub fn holds(&self, agent: AgentId) -> bool {
        match &self.kind {
            Kind::Waypoint { .. } | Kind::Exit { .. } => false,
            Kind::WaitingSet { occupants, released, .. } => {
                !released && occupants.contains(&agent)
            }
            Kind::Queue { occupants, pending_pops, .. } => {
                match occupants.iter().position(|&a| a == agent) {
                    Some(0) => *pending_pops == 0,
                    Some(_) => true,
                    None => false,
                }
            }
        }
    }

    // ── Occupancy (serial strategic phase only) ───────────────────────────

    /// Register `agent` as pursuing this stage.
    ///
    /// Waiting sets admit at most `slots.len()` occupants; surplus agents
    /// are not registered (they keep approaching the last slot and are
    /// admitted as space frees up).  Queues admit in FIFO order.
    pub fn enter(&mut self, agent: AgentId) {
        match &mut self.kind {
            Kind::Waypoint { .. } | Kind::Exit { .. } => {}
            Kind::WaitingSet { slots, occupants, .. } => {
                if occupants.len() < slots.len() && !occupants.contains(&agent) {
                    occupants.push(agent);
                }
            }
            Kind::Queue { occupants, .. } => {
                if !occupants.contains(&agent) {
                    occupants.push_back(agent);
                }
            }
        }
    }

    /// Unregister `agent` (it transitioned to another stage or was removed).
    pub fn leave(&mut self, agent: AgentId) {
        match &mut self.kind {
            Kind::Waypoint { .. } | Kind::Exit { .. } => {}
            Kind::WaitingSet { occupants, released, .. } => {
                occupants.retain(|&a| a != agent);
                if occupants.is_empty() {
                    // All released agents are gone; re-arm the gate.
                    *released = false;
                }
            }
            Kind::Queue { occupants, pending_pops, .. } => {
                if occupants.front() == Some(&agent) {
                    occupants.pop_front();
                    *pending_pops = pending_pops.saturating_sub(1);
                } else {
                    occupants.retain(|&a| a != agent);
                }
            }
        }
    }

    /// Release a waiting set's gate.  No-op on other stage kinds.
    pub fn notify(&mut self) {
        if let Kind::WaitingSet { released, .. } = &mut self.kind {
            *released = true;
        }
    }

    /// Release up to `count` agents from the head of a queue.  No-op on
    /// other stage kinds.
    pub fn pop(&mut self, count: usize) {
        if let Kind::Queue { occupants, pending_pops, .. } = &mut self.kind {
            *pending_pops = (*pending_pops + count).min(occupants.len());
        }
    }

    /// Current occupant count (0 for waypoint and exit stages).
    pub fn occupancy(&self) -> usize {
        match &self.kind {
            Kind::Waypoint { .. } | Kind::Exit { .. } => 0,
            Kind::WaitingSet { occupants, .. } => occupants.len(),
            Kind::Queue { occupants, .. } => occupants.len(),
        }
    }
}
