//! The aggregated engine error type.
//!
//! Sub-crate errors convert in via `From`; the variants group into the four
//! failure kinds the engine distinguishes: configuration, invariant
//! violation (fatal mid-tick), event application, and query errors.

use ped_core::{AgentId, JourneyId, ProfileId, StageId};
use ped_geometry::GeometryError;
use ped_model::ModelError;
use ped_routing::RoutingError;
use ped_spatial::SpatialError;
use ped_stages::StageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    // ── Configuration ─────────────────────────────────────────────────────
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("unknown journey {0}")]
    UnknownJourney(JourneyId),

    #[error("unknown stage {0}")]
    UnknownStage(StageId),

    #[error("stage {stage} is not part of journey {journey}")]
    StageNotInJourney { stage: StageId, journey: JourneyId },

    #[error("unknown parameter profile {0}")]
    UnknownProfile(ProfileId),

    // ── Invariant violations (fatal inside a tick) ────────────────────────
    #[error(transparent)]
    Model(#[from] ModelError),

    // ── Setup / geometry ──────────────────────────────────────────────────
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Stage(#[from] StageError),

    // ── Queries ───────────────────────────────────────────────────────────
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),

    #[error("polygon must be simple and convex")]
    NonConvexPolygon,
}

pub type SimulationResult<T> = Result<T, SimulationError>;
