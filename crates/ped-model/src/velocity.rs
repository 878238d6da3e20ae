//! The velocity model: desired direction, repulsion, spacing, optimal speed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;
use ped_agent::{Agent, AgentUpdate};
use ped_core::{LineSegment, Point, ProfileId, SimRng};
use ped_geometry::Building;

use crate::error::{ModelError, ModelResult};
use crate::parameters::AgentParameters;

/// Minimum resolvable distance between two agents.
pub const EPS: f64 = 1e-3;
/// Goal region radius: within this distance of the exit line the desired
/// direction freezes and wall forces vanish.
pub const EPS_GOAL: f64 = 5e-3;
/// Orientation is only updated while the speed is above this.
pub const EPS_V: f64 = 0.1;
/// Below this wall distance the shortest-point direction is numerically
/// useless; fall back to the subroom centroid.
const MIN_WALL_DISTANCE: f64 = 1e-3;
/// Spacing reported when no neighbor constrains the agent.
const EMPTY_SPACING: f64 = 100.0;
/// After this many too-close-to-wall warnings, only every 1000th is logged.
const WALL_WARN_VERBOSE: u64 = 10;

/// The first-order velocity operational model.
///
/// Global repulsion coefficients plus a set of per-profile parameters.
/// Construct via [`VelocityModelBuilder`](crate::VelocityModelBuilder).
pub struct VelocityModel {
    pub(crate) a_ped: f64,
    pub(crate) d_ped: f64,
    pub(crate) a_wall: f64,
    pub(crate) d_wall: f64,
    /// Perception range added on top of the body diameter when collecting
    /// neighbors.
    pub(crate) cutoff: f64,
    /// Seed for the (deterministic) fallback direction of an agent that has
    /// no navigation line yet.
    pub(crate) seed: u64,
    pub(crate) profiles: BTreeMap<ProfileId, AgentParameters>,
    wall_warnings: AtomicU64,
}

impl VelocityModel {
    pub(crate) fn new(
        a_ped: f64,
        d_ped: f64,
        a_wall: f64,
        d_wall: f64,
        cutoff: f64,
        seed: u64,
        profiles: BTreeMap<ProfileId, AgentParameters>,
    ) -> Self {
        Self {
            a_ped,
            d_ped,
            a_wall,
            d_wall,
            cutoff,
            seed,
            profiles,
            wall_warnings: AtomicU64::new(0),
        }
    }

    pub fn profile(&self, id: ProfileId) -> ModelResult<&AgentParameters> {
        self.profiles.get(&id).ok_or(ModelError::UnknownProfile(id))
    }

    pub fn has_profile(&self, id: ProfileId) -> bool {
        self.profiles.contains_key(&id)
    }

    /// The largest radius any profile queries neighbors with.  The
    /// neighborhood grid's cell size must be at least this.
    pub fn interaction_range(&self) -> f64 {
        let max_l = self
            .profiles
            .values()
            .map(|p| p.collision_distance())
            .fold(0.0, f64::max);
        max_l + self.cutoff
    }

    // ── Placement validation ──────────────────────────────────────────────

    /// Validate a new agent before insertion: known profile, inside the
    /// geometry, not overlapping any existing agent.
    pub fn validate_placement(
        &self,
        pos: Point,
        profile: ProfileId,
        neighbors: &[&Agent],
        building: &Building,
    ) -> ModelResult<()> {
        let params = self.profile(profile)?;
        if building.get_room_and_subroom(pos).is_none() {
            return Err(ModelError::PlacementOutside { x: pos.x, y: pos.y });
        }
        for other in neighbors {
            let other_params = self.profile(other.profile)?;
            let min_distance = params.b_max + other_params.b_max;
            let distance = pos.distance_to(other.pos);
            if distance < min_distance {
                return Err(ModelError::PlacementCollision {
                    other: other.id,
                    distance,
                    min_distance,
                });
            }
        }
        Ok(())
    }

    // ── The per-agent operational step ────────────────────────────────────

    /// Compute one agent's staged update from the pre-tick snapshot.
    ///
    /// `neighbors` is the radius query result (may contain agents in other,
    /// unconnected subrooms; they are filtered here).  `floorfield` selects
    /// the desired-direction variant of the active routing strategy.
    pub fn step(
        &self,
        agent: &Agent,
        neighbors: &[&Agent],
        building: &Building,
        dt: f64,
        elapsed_time: f64,
        floorfield: bool,
    ) -> ModelResult<AgentUpdate> {
        let params = self.profile(agent.profile)?;
        let here = building
            .get_room_and_subroom(agent.pos)
            .ok_or(ModelError::OutsideGeometry(agent.id))?;
        let subroom = building
            .subroom(here.0, here.1)
            .map_err(|_| ModelError::OutsideGeometry(agent.id))?;

        // Neighbors that can actually influence this agent: same subroom or
        // a directly connected one, with line of sight through open doors.
        let relevant: Vec<&Agent> = neighbors
            .iter()
            .filter(|other| other.id != agent.id)
            .filter(|other| {
                let Some(there) = building.get_room_and_subroom(other.pos) else {
                    return false;
                };
                (there == here || subroom.is_directly_connected_with(there))
                    && building.is_visible(agent.pos, other.pos, &[here, there])
            })
            .copied()
            .collect();

        // ── 1. Desired direction ──────────────────────────────────────────
        let (e0, mut smooth_turning) = self.desired_direction(agent, floorfield)?;

        // ── 2–3. Pedestrian repulsion ─────────────────────────────────────
        let l = params.collision_distance();
        let mut rep_ped = Point::ZERO;
        for other in &relevant {
            rep_ped += self.force_rep_ped(agent, other, l)?;
        }

        // ── 4. Wall repulsion ─────────────────────────────────────────────
        let at_goal = agent
            .nav_line
            .map(|line| line.dist_to_square(agent.pos) < EPS_GOAL * EPS_GOAL)
            .unwrap_or(false);
        let rep_wall = if at_goal {
            Point::ZERO
        } else {
            let centroid = subroom.centroid();
            let inside = subroom.is_inside(centroid);
            let mut f = Point::ZERO;
            for segment in building.repelling_segments(here.0, here.1) {
                f += self.force_rep_wall(agent, &segment, params.b_max, centroid, inside);
            }
            f
        };

        // ── 5. Candidate direction ────────────────────────────────────────
        let direction = e0 + rep_ped + rep_wall;

        // ── 6. Spacing ────────────────────────────────────────────────────
        let mut spacing = EMPTY_SPACING;
        for other in &relevant {
            if let Some(s) = spacing_to(agent, other, direction, l) {
                spacing = spacing.min(s);
            }
        }

        // ── 7–8. Optimal speed and staged write ───────────────────────────
        let speed = ((spacing - l) / params.time_gap).clamp(0.0, params.v0);
        let velocity = direction.normalized() * speed;
        if !velocity.is_finite() {
            return Err(ModelError::NonFinite(agent.id));
        }

        let (pos, velocity) = if agent.in_premovement(elapsed_time) {
            (agent.pos, Point::ZERO)
        } else {
            (agent.pos + velocity * dt, velocity)
        };
        if !pos.is_finite() {
            return Err(ModelError::NonFinite(agent.id));
        }

        let orientation = if velocity.norm() >= EPS_V {
            Some(velocity.normalized())
        } else {
            None
        };
        if smooth_turning > 0 {
            smooth_turning = smooth_turning.saturating_add(1);
        }

        Ok(AgentUpdate {
            pos,
            velocity,
            e0,
            orientation,
            smooth_turning,
        })
    }

    // ── Desired direction ─────────────────────────────────────────────────

    /// The desired direction `e0` and the updated smooth-turning counter.
    ///
    /// Floor-field strategies steer by the raw offset to the target with an
    /// oscillation guard near the goal; exit-line strategies use the unit
    /// direction while the goal is further than `EPS_GOAL`, then freeze `e0`
    /// and begin smooth turning.
    fn desired_direction(&self, agent: &Agent, floorfield: bool) -> ModelResult<(Point, u32)> {
        if agent.waiting {
            return Ok((Point::ZERO, 0));
        }
        let Some(nav_line) = agent.nav_line else {
            // No tactical target yet.  Deterministic jitter, same as a fresh
            // seeded generator every call.
            warn!("agent {} has no navigation line", agent.id);
            let mut rng = SimRng::new(self.seed);
            let dx: f64 = rng.gen_range(-1.0..1.0);
            let dy: f64 = rng.gen_range(-1.0..1.0);
            return Ok((Point::new(dx, dy).normalized(), 0));
        };

        let target = nav_line.shortest_point(agent.pos);
        if floorfield {
            let e0 = target - agent.pos;
            if e0.norm_square() < 0.25 {
                // Nearly there: reuse last tick's direction so the agent does
                // not oscillate across the target.
                return Ok((agent.e0, agent.smooth_turning));
            }
            return Ok((e0, 0));
        }

        let dist = nav_line.dist_to(agent.pos);
        if dist > EPS_GOAL {
            Ok(((target - agent.pos).normalized(), 0))
        } else {
            // On the exit line: keep the previous direction and turn smoothly.
            Ok((agent.e0, agent.smooth_turning.max(1)))
        }
    }

    // ── Forces ────────────────────────────────────────────────────────────

    fn force_rep_ped(&self, agent: &Agent, other: &Agent, l: f64) -> ModelResult<Point> {
        let offset = other.pos - agent.pos;
        let distance = offset.norm();
        if distance < EPS {
            return Err(ModelError::AgentsTooClose {
                a: agent.id,
                b: other.id,
                distance,
            });
        }
        let e_ij = offset * (1.0 / distance);
        let strength = -self.a_ped * ((l - distance) / self.d_ped).exp();
        Ok(e_ij * strength)
    }

    fn force_rep_wall(
        &self,
        agent: &Agent,
        segment: &LineSegment,
        b_max: f64,
        centroid: Point,
        inside: bool,
    ) -> Point {
        let pt = segment.shortest_point(agent.pos);
        let offset = pt - agent.pos;
        let distance = offset.norm();

        let e_iw = if distance > MIN_WALL_DISTANCE {
            offset * (1.0 / distance)
        } else {
            let n = self.wall_warnings.fetch_add(1, Ordering::Relaxed);
            if n < WALL_WARN_VERBOSE || n % 1000 == 0 {
                warn!(
                    "agent {} at {} is too close to wall {} (dist={distance:e})",
                    agent.id, agent.pos, segment
                );
            }
            let to_centroid = (centroid - agent.pos).normalized();
            if inside {
                to_centroid
            } else {
                -to_centroid
            }
        };

        let strength = -self.a_wall * ((b_max - distance) / self.d_wall).exp();
        e_iw * strength
    }
}

/// Free distance toward `other` along `direction`, if `other` is ahead and
/// inside the swept corridor of width `l`.
fn spacing_to(agent: &Agent, other: &Agent, direction: Point, l: f64) -> Option<f64> {
    let offset = other.pos - agent.pos;
    let distance = offset.norm();
    if distance <= 1e-12 {
        return None;
    }
    let e_ij = offset * (1.0 / distance);
    let ahead = direction.dot(e_ij) >= 0.0;
    let lateral = direction.rotate90().dot(e_ij).abs();
    if ahead && lateral <= l / distance {
        Some(distance)
    } else {
        None
    }
}
