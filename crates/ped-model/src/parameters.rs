//! Per-profile agent parameters.

/// Operational parameters selected by an agent's profile id.
///
/// `b_max` is the larger semi-axis of the body ellipse; the collision
/// distance between two agents is `2 * b_max`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AgentParameters {
    /// Free walking speed (m/s).
    pub v0: f64,
    /// Time gap T of the speed function (s): how much headway the agent
    /// keeps per metre of closing speed.
    pub time_gap: f64,
    /// Body radius (m).
    pub b_max: f64,
}

impl AgentParameters {
    /// Collision distance `l = 2 * b_max`.
    #[inline]
    pub fn collision_distance(&self) -> f64 {
        2.0 * self.b_max
    }
}
