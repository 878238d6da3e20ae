use ped_core::{AgentId, ProfileId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("agents {a} and {b} are too close to each other (dist={distance:e}); cannot compute a repulsion direction")]
    AgentsTooClose {
        a: AgentId,
        b: AgentId,
        distance: f64,
    },

    #[error("non-finite result while stepping agent {0}")]
    NonFinite(AgentId),

    #[error("agent {0} is outside the walkable geometry")]
    OutsideGeometry(AgentId),

    #[error("unknown parameter profile {0}")]
    UnknownProfile(ProfileId),

    #[error("new agent would collide with agent {other} (dist={distance:.4} < {min_distance:.4})")]
    PlacementCollision {
        other: AgentId,
        distance: f64,
        min_distance: f64,
    },

    #[error("agent placement ({x:.3}, {y:.3}) is outside the walkable geometry")]
    PlacementOutside { x: f64, y: f64 },

    #[error("model definition error: {0}")]
    Definition(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
