//! The routing engine: strategy dispatch, cache discipline, nav targets.

use std::collections::HashMap;

use log::debug;
use ped_core::{LineSegment, Point, StageId, TransitionId};
use ped_geometry::Building;

use crate::door_graph::{DoorGraph, DoorRef};
use crate::error::{RoutingError, RoutingResult};
use crate::floorfield::FloorField;

/// Half-length of the synthetic nav line laid across a same-subroom target.
const DIRECT_NAV_HALF_WIDTH: f64 = 0.2;
/// How far ahead of the agent a floor-field nav target is placed.
const FIELD_LOOKAHEAD: f64 = 1.0;

// ── Strategy and result types ─────────────────────────────────────────────────

/// Which precomputation backs nav-line resolution.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RoutingStrategy {
    /// Shortest path over the door graph.
    DoorGraph,
    /// Per-stage grid distance fields of the given resolution.
    FloorField { cell_size: f64 },
}

/// The outcome of resolving one agent's target.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NavTarget {
    /// Steer toward this line.  `door` is set when the line is a door
    /// segment, so the caller can apply temp-close waiting semantics.
    Line {
        line: LineSegment,
        door: Option<TransitionId>,
    },
    /// No exit is reachable from the agent's position; the agent must wait.
    FinalDestOut,
}

// ── RoutingEngine ─────────────────────────────────────────────────────────────

/// Owns the routing caches and the `needs_update` invalidation flag.
///
/// Resolution runs in the serial tactical phase (`&mut self` for lazy field
/// computation); the parallel operational phase never touches the router.
pub struct RoutingEngine {
    strategy: RoutingStrategy,
    needs_update: bool,
    graph: Option<DoorGraph>,
    fields: HashMap<StageId, FloorField>,
}

impl RoutingEngine {
    pub fn new(strategy: RoutingStrategy) -> RoutingResult<Self> {
        if let RoutingStrategy::FloorField { cell_size } = strategy {
            if cell_size <= 0.0 {
                return Err(RoutingError::InvalidCellSize(cell_size));
            }
        }
        Ok(Self {
            strategy,
            needs_update: true,
            graph: None,
            fields: HashMap::new(),
        })
    }

    #[inline]
    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    /// `true` when the active strategy is a floor field (selects the
    /// operational model's desired-direction variant).
    #[inline]
    pub fn is_floorfield(&self) -> bool {
        matches!(self.strategy, RoutingStrategy::FloorField { .. })
    }

    // ── Cache discipline ──────────────────────────────────────────────────

    /// Flag the caches stale (door event, train splice, wall mutation).
    pub fn set_needs_update(&mut self) {
        self.needs_update = true;
    }

    #[inline]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Observe the flag, rebuild if set, clear it.  Called at the top of
    /// each tick before any decision pass.
    pub fn update_if_needed(&mut self, building: &Building) {
        if !self.needs_update && self.graph.is_some() {
            return;
        }
        debug!("rebuilding routing caches");
        self.graph = Some(DoorGraph::build(building));
        self.fields.clear();
        self.needs_update = false;
    }

    // ── Resolution ────────────────────────────────────────────────────────

    /// Resolve the nav line for an agent at `pos` pursuing `target` (the
    /// characteristic point of stage `stage`).
    pub fn resolve(
        &mut self,
        building: &Building,
        pos: Point,
        target: Point,
        stage: StageId,
    ) -> NavTarget {
        let Some(here) = building.get_room_and_subroom(pos) else {
            // Outside the geometry; the loop will remove this agent.
            return NavTarget::FinalDestOut;
        };
        let Some(there) = building.get_room_and_subroom(target) else {
            return NavTarget::FinalDestOut;
        };

        match self.strategy {
            RoutingStrategy::DoorGraph => {
                if here == there {
                    return NavTarget::Line {
                        line: direct_line(pos, target),
                        door: None,
                    };
                }
                let graph = self.graph.as_ref().expect("update_if_needed precedes resolve");
                match graph.route(pos, here, there, target) {
                    None => NavTarget::FinalDestOut,
                    Some(first) => {
                        let node = &graph.nodes[first];
                        let door = match node.door {
                            DoorRef::Transition(id) => Some(id),
                            DoorRef::Crossing(_) => None,
                        };
                        NavTarget::Line {
                            line: node.segment,
                            door,
                        }
                    }
                }
            }
            RoutingStrategy::FloorField { cell_size } => {
                let field = self
                    .fields
                    .entry(stage)
                    .or_insert_with(|| FloorField::compute(building, target, cell_size));
                if !field.distance_at(pos).is_finite() {
                    return NavTarget::FinalDestOut;
                }
                match field.direction_at(pos) {
                    None => NavTarget::Line {
                        line: direct_line(pos, target),
                        door: None,
                    },
                    Some(dir) => {
                        let ahead = pos + dir * FIELD_LOOKAHEAD;
                        NavTarget::Line {
                            line: LineSegment::new(ahead, ahead),
                            door: None,
                        }
                    }
                }
            }
        }
    }
}

/// A short line laid across the target, perpendicular to the approach, so
/// distance-to-nav-line behaves like distance-to-target.
fn direct_line(pos: Point, target: Point) -> LineSegment {
    let across = (target - pos).normalized().rotate90() * DIRECT_NAV_HALF_WIDTH;
    LineSegment::new(target - across, target + across)
}
