//! Fluent builder for [`VelocityModel`].

use std::collections::BTreeMap;

use ped_core::ProfileId;

use crate::error::{ModelError, ModelResult};
use crate::parameters::AgentParameters;
use crate::velocity::VelocityModel;

/// Build a [`VelocityModel`] from the four repulsion coefficients plus at
/// least one parameter profile.
///
/// # Example
///
/// ```rust,ignore
/// let model = VelocityModelBuilder::new(5.0, 0.1, 5.0, 0.02)
///     .add_profile(ProfileId(0), AgentParameters { v0: 1.2, time_gap: 0.5, b_max: 0.15 })
///     .build()?;
/// ```
pub struct VelocityModelBuilder {
    a_ped: f64,
    d_ped: f64,
    a_wall: f64,
    d_wall: f64,
    cutoff: f64,
    seed: u64,
    profiles: BTreeMap<ProfileId, AgentParameters>,
    errors: Vec<String>,
}

impl VelocityModelBuilder {
    pub fn new(a_ped: f64, d_ped: f64, a_wall: f64, d_wall: f64) -> Self {
        Self {
            a_ped,
            d_ped,
            a_wall,
            d_wall,
            cutoff: 2.0,
            seed: 0,
            profiles: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// Perception range added on top of the body diameter (default 2 m).
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Seed for the fallback direction of agents without a navigation line.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn add_profile(mut self, id: ProfileId, params: AgentParameters) -> Self {
        if self.profiles.contains_key(&id) {
            self.errors.push(format!("duplicate profile {id}"));
        }
        if params.v0 < 0.0 {
            self.errors.push(format!("profile {id}: v0 must be >= 0"));
        }
        if params.time_gap <= 0.0 {
            self.errors.push(format!("profile {id}: time_gap must be > 0"));
        }
        if params.b_max <= 0.0 {
            self.errors.push(format!("profile {id}: b_max must be > 0"));
        }
        self.profiles.insert(id, params);
        self
    }

    pub fn build(self) -> ModelResult<VelocityModel> {
        let mut errors = self.errors;
        if self.profiles.is_empty() {
            errors.push("at least one parameter profile is required".to_owned());
        }
        if self.d_ped <= 0.0 {
            errors.push("d_ped must be > 0".to_owned());
        }
        if self.d_wall <= 0.0 {
            errors.push("d_wall must be > 0".to_owned());
        }
        if self.cutoff <= 0.0 {
            errors.push("cutoff must be > 0".to_owned());
        }
        if !errors.is_empty() {
            return Err(ModelError::Definition(errors.join("; ")));
        }
        Ok(VelocityModel::new(
            self.a_ped,
            self.d_ped,
            self.a_wall,
            self.d_wall,
            self.cutoff,
            self.seed,
            self.profiles,
        ))
    }
}
