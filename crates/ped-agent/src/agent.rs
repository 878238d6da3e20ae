//! The `Agent` record.

use ped_core::{AgentId, JourneyId, LineSegment, Point, ProfileId, StageId};

/// One simulated pedestrian.
///
/// Field groups mirror the three decision layers: `journey`/`stage` are
/// evaluated strategically, `destination`/`nav_line` tactically, and the
/// physics fields (`pos`, `orientation`, `speed`, `e0`) operationally.
///
/// Invariants upheld by the simulation loop:
/// - `orientation` is a unit vector whenever `speed` is above the velocity
///   epsilon;
/// - `pos` lies inside some subroom between ticks (agents detected outside
///   are removed the same tick);
/// - `id` is stable for the agent's lifetime.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: AgentId,

    // ── Strategic state ───────────────────────────────────────────────────
    pub journey: JourneyId,
    pub stage: StageId,

    // ── Tactical state ────────────────────────────────────────────────────
    /// The characteristic point of the current stage.
    pub destination: Point,
    /// Last-assigned navigation line; `None` until the first tactical pass.
    pub nav_line: Option<LineSegment>,
    /// Set while the agent is held (unreachable goal, temp-closed door, or a
    /// waiting-area gate).
    pub waiting: bool,

    // ── Operational state ─────────────────────────────────────────────────
    pub pos: Point,
    /// Position at the end of the previous tick; the door-crossing test
    /// compares `prev_pos` → `pos` against transition segments.
    pub prev_pos: Point,
    /// Unit orientation (kept from the last tick while standing still).
    pub orientation: Point,
    /// Scalar speed ‖v‖ of the last tick.
    pub speed: f64,
    /// Desired direction of the last tick; reused by the oscillation guard.
    pub e0: Point,
    /// Ticks remaining of smooth turning after reaching the goal region.
    pub smooth_turning: u32,

    /// Selects the operational-model parameter set.
    pub profile: ProfileId,
    /// Simulated seconds before the agent starts to move.  The agent
    /// occupies space from insertion but its position is frozen until then.
    pub premovement_time: f64,
}

impl Agent {
    /// A freshly inserted agent: stationary, not waiting, no nav line yet.
    pub fn new(
        id: AgentId,
        pos: Point,
        orientation: Point,
        journey: JourneyId,
        stage: StageId,
        profile: ProfileId,
        premovement_time: f64,
    ) -> Self {
        Self {
            id,
            journey,
            stage,
            destination: pos,
            nav_line: None,
            waiting: false,
            pos,
            prev_pos: pos,
            orientation: orientation.normalized(),
            speed: 0.0,
            e0: Point::ZERO,
            smooth_turning: 0,
            profile,
            premovement_time,
        }
    }

    /// `true` while the agent's premovement delay has not yet elapsed.
    #[inline]
    pub fn in_premovement(&self, elapsed_time: f64) -> bool {
        elapsed_time < self.premovement_time
    }

    /// Apply a staged update produced by the operational pass.
    pub fn apply(&mut self, update: &AgentUpdate) {
        self.prev_pos = self.pos;
        self.pos = update.pos;
        self.speed = update.velocity.norm();
        self.e0 = update.e0;
        self.smooth_turning = update.smooth_turning;
        if let Some(orientation) = update.orientation {
            self.orientation = orientation;
        }
    }
}

/// The staged result of one agent's operational step.
///
/// Produced against the pre-tick snapshot, applied after the whole pass;
/// no agent observes another agent's same-tick movement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AgentUpdate {
    pub pos: Point,
    pub velocity: Point,
    pub e0: Point,
    /// New unit orientation, or `None` if the speed stayed below the
    /// velocity epsilon (orientation is then kept).
    pub orientation: Option<Point>,
    pub smooth_turning: u32,
}
