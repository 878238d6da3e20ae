//! The three decision passes, as free functions.
//!
//! The loop hands geometry, router, and neighbor index in explicitly —
//! no component holds a back-pointer to the simulation.  Strategic and
//! tactical run serially; the operational pass reads the pre-tick snapshot
//! and stages its writes, which is what allows the optional `parallel`
//! fan-out over the agent array.

use std::collections::{BTreeMap, HashMap};

use ped_agent::{Agent, AgentUpdate};
use ped_core::{AgentId, JourneyId, StageId};
use ped_geometry::Building;
use ped_model::{ModelResult, VelocityModel};
use ped_routing::{NavTarget, RoutingEngine};
use ped_spatial::NeighborhoodSearch;
use ped_stages::{Journey, Stage};

// ── Strategic ─────────────────────────────────────────────────────────────────

/// Advance each agent's journey: register pursuers with slot-keeping stages
/// and move completed agents to their rule's next stage.
pub(crate) fn strategic_pass(
    journeys: &mut BTreeMap<JourneyId, Journey>,
    stages: &mut BTreeMap<StageId, Stage>,
    agents: &mut [Agent],
) {
    for agent in agents {
        strategic_step(journeys, stages, agent);
    }
}

/// One agent's strategic decision (also run for a freshly added agent).
pub(crate) fn strategic_step(
    journeys: &mut BTreeMap<JourneyId, Journey>,
    stages: &mut BTreeMap<StageId, Stage>,
    agent: &mut Agent,
) {
    let Some(stage) = stages.get_mut(&agent.stage) else {
        return;
    };
    stage.enter(agent.id);
    if !stage.completed_by(agent.id, agent.pos) {
        return;
    }
    let Some(journey) = journeys.get_mut(&agent.journey) else {
        return;
    };
    let Some(next) = journey.next_stage(agent.stage) else {
        return;
    };
    stage.leave(agent.id);
    agent.stage = next;
    if let Some(next_stage) = stages.get_mut(&next) {
        next_stage.enter(agent.id);
    }
}

// ── Tactical ──────────────────────────────────────────────────────────────────

/// Resolve each agent's stage target into a navigation line and update the
/// waiting flag.
pub(crate) fn tactical_pass(
    router: &mut RoutingEngine,
    building: &Building,
    stages: &BTreeMap<StageId, Stage>,
    agents: &mut [Agent],
) {
    for agent in agents {
        tactical_step(router, building, stages, agent);
    }
}

/// One agent's tactical decision.
///
/// Waiting semantics: an unreachable goal or a temp-closed target door puts
/// the agent into waiting; it leaves waiting only once the route is clear
/// *and* its stage's gate (waiting set, queue) does not hold it.
pub(crate) fn tactical_step(
    router: &mut RoutingEngine,
    building: &Building,
    stages: &BTreeMap<StageId, Stage>,
    agent: &mut Agent,
) {
    let Some(stage) = stages.get(&agent.stage) else {
        return;
    };
    let target = stage.target_for(agent.id);
    agent.destination = target;

    match router.resolve(building, agent.pos, target, agent.stage) {
        NavTarget::FinalDestOut => {
            agent.waiting = true;
        }
        NavTarget::Line { line, door } => {
            agent.nav_line = Some(line);
            let door_blocked = door
                .and_then(|id| building.transition(id).ok())
                .map(|t| t.is_temp_closed())
                .unwrap_or(false);
            agent.waiting = door_blocked || stage.holds(agent.id);
        }
    }
}

// ── Operational ───────────────────────────────────────────────────────────────

/// Compute the staged updates for all agents against the pre-tick snapshot.
///
/// With the `parallel` feature the per-agent model steps run on Rayon's
/// thread pool; the neighbor index, geometry, and router caches are all
/// read-only here, so no locks are needed.
pub(crate) fn operational_pass(
    model: &VelocityModel,
    building: &Building,
    neighborhood: &NeighborhoodSearch,
    agents: &[Agent],
    dt: f64,
    elapsed_time: f64,
    floorfield: bool,
) -> ModelResult<Vec<AgentUpdate>> {
    let by_id: HashMap<AgentId, &Agent> = agents.iter().map(|a| (a.id, a)).collect();
    let range = model.interaction_range();

    let step = |agent: &Agent| -> ModelResult<AgentUpdate> {
        let neighbors: Vec<&Agent> = neighborhood
            .neighbours(agent.pos, range)
            .into_iter()
            .filter_map(|(id, _)| by_id.get(&id).copied())
            .collect();
        model.step(agent, &neighbors, building, dt, elapsed_time, floorfield)
    };

    #[cfg(not(feature = "parallel"))]
    {
        agents.iter().map(step).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        agents.par_iter().map(step).collect()
    }
}
