//! Dijkstra over the door graph.
//!
//! Costs are quantized to integer micrometres so the heap ordering is total
//! and tie-breaking (by node index) is deterministic across runs.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use ped_core::{CrossingId, LineSegment, Point, RoomId, SubRoomId, TransitionId};
use ped_geometry::Building;

// ── Nodes ─────────────────────────────────────────────────────────────────────

/// A routable door: an open/temp-closed transition or a crossing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DoorRef {
    Transition(TransitionId),
    Crossing(CrossingId),
}

pub(crate) struct DoorNode {
    pub door: DoorRef,
    pub segment: LineSegment,
    /// The subrooms this door touches (one for doors leading outside).
    pub sides: Vec<(RoomId, SubRoomId)>,
}

// ── Graph ─────────────────────────────────────────────────────────────────────

pub(crate) struct DoorGraph {
    pub nodes: Vec<DoorNode>,
    by_subroom: HashMap<(RoomId, SubRoomId), Vec<usize>>,
}

#[inline]
fn quantize(meters: f64) -> u64 {
    (meters * 1e6) as u64
}

impl DoorGraph {
    /// Snapshot the building's current door states into a graph.
    ///
    /// Node order follows the id-ordered crossing and transition maps, so a
    /// rebuild of unchanged geometry yields an identical graph.
    pub fn build(building: &Building) -> Self {
        let mut nodes = Vec::new();
        for crossing in building.crossings() {
            nodes.push(DoorNode {
                door: DoorRef::Crossing(crossing.id),
                segment: crossing.segment,
                sides: vec![
                    (crossing.room, crossing.subroom1),
                    (crossing.room, crossing.subroom2),
                ],
            });
        }
        for transition in building.transitions() {
            if transition.is_closed() {
                continue;
            }
            let mut sides = vec![transition.from];
            if let Some(to) = transition.to {
                sides.push(to);
            }
            nodes.push(DoorNode {
                door: DoorRef::Transition(transition.id),
                segment: transition.segment,
                sides,
            });
        }

        let mut by_subroom: HashMap<(RoomId, SubRoomId), Vec<usize>> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            for &side in &node.sides {
                by_subroom.entry(side).or_default().push(i);
            }
        }
        Self { nodes, by_subroom }
    }

    pub fn doors_of(&self, subroom: (RoomId, SubRoomId)) -> &[usize] {
        self.by_subroom
            .get(&subroom)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Shortest door path from `from_pos` (in `from`) to `to_pos` (in `to`).
    ///
    /// Returns the index of the *first* door to walk through, or `None` if
    /// the target subroom is unreachable.  `from == to` is the caller's
    /// direct-steering case and never reaches this function.
    pub fn route(
        &self,
        from_pos: Point,
        from: (RoomId, SubRoomId),
        to: (RoomId, SubRoomId),
        to_pos: Point,
    ) -> Option<usize> {
        let n = self.nodes.len();
        let mut dist = vec![u64::MAX; n];
        // The first door of the best-known path reaching each node.
        let mut first = vec![usize::MAX; n];

        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
        for &i in self.doors_of(from) {
            let cost = quantize(from_pos.distance_to(self.nodes[i].segment.center()));
            if cost < dist[i] {
                dist[i] = cost;
                first[i] = i;
                heap.push(Reverse((cost, i)));
            }
        }

        let mut best_goal: Option<(u64, usize)> = None;
        while let Some(Reverse((cost, i))) = heap.pop() {
            // Nothing left can beat the best complete route.
            if let Some((goal_cost, _)) = best_goal {
                if cost >= goal_cost {
                    break;
                }
            }
            if cost > dist[i] {
                continue;
            }

            let center = self.nodes[i].segment.center();
            if self.nodes[i].sides.contains(&to) {
                let total = cost + quantize(center.distance_to(to_pos));
                let candidate = (total, first[i]);
                if best_goal.map(|b| candidate < b).unwrap_or(true) {
                    best_goal = Some(candidate);
                }
            }

            for &side in &self.nodes[i].sides {
                for &j in self.doors_of(side) {
                    if j == i {
                        continue;
                    }
                    let weight =
                        quantize(center.distance_to(self.nodes[j].segment.center()));
                    let next = cost.saturating_add(weight);
                    if next < dist[j] {
                        dist[j] = next;
                        first[j] = first[i];
                        heap.push(Reverse((next, j)));
                    }
                }
            }
        }

        best_goal.map(|(_, first_door)| first_door)
    }
}
