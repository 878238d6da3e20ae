//! Fluent builder for constructing a [`Simulation`].

use ped_geometry::Building;
use ped_model::VelocityModel;
use ped_routing::RoutingEngine;
use ped_spatial::NeighborhoodSearch;

use crate::error::{SimulationError, SimulationResult};
use crate::simulation::Simulation;

/// Wire the three pre-built components and the step length into a
/// ready-to-run [`Simulation`].
///
/// # Required inputs
///
/// - [`VelocityModel`] — from `VelocityModelBuilder`
/// - [`Building`] — from `BuildingBuilder`
/// - [`RoutingEngine`] — bound to the same geometry
/// - `dt` — the fixed step length in seconds
///
/// # Optional inputs
///
/// | Method          | Default                                      |
/// |-----------------|----------------------------------------------|
/// | `.cell_size(s)` | The model's interaction range                |
///
/// `build()` validates the wiring: `dt` must be positive and the neighbor
/// grid's cell size must cover the model's interaction range (fail fast —
/// a too-small cell would silently drop repulsion partners).
pub struct SimulationBuilder {
    model: VelocityModel,
    building: Building,
    router: RoutingEngine,
    dt: f64,
    cell_size: Option<f64>,
}

impl SimulationBuilder {
    pub fn new(model: VelocityModel, building: Building, router: RoutingEngine, dt: f64) -> Self {
        Self {
            model,
            building,
            router,
            dt,
            cell_size: None,
        }
    }

    /// Override the neighbor-grid cell size (must still cover the model's
    /// interaction range).
    pub fn cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = Some(cell_size);
        self
    }

    pub fn build(self) -> SimulationResult<Simulation> {
        if self.dt <= 0.0 || !self.dt.is_finite() {
            return Err(SimulationError::Config(format!(
                "dt must be a positive, finite number of seconds, got {}",
                self.dt
            )));
        }
        let range = self.model.interaction_range();
        let cell_size = self.cell_size.unwrap_or(range);
        let neighborhood = NeighborhoodSearch::new(cell_size, range)?;
        Ok(Simulation::new(
            self.model,
            self.building,
            self.router,
            neighborhood,
            self.dt,
        ))
    }
}
