//! The `Simulation`: tick orchestration and the runtime API.

use std::collections::BTreeMap;

use log::warn;
use ped_agent::Agent;
use ped_core::{
    AgentId, CrossingId, JourneyId, Point, ProfileId, RoomId, SimulationClock, StageId,
    TransitionId,
};
use ped_geometry::{Building, Polygon};
use ped_model::VelocityModel;
use ped_routing::RoutingEngine;
use ped_spatial::NeighborhoodSearch;
use ped_stages::{Journey, Stage, StageDescription, TransitionRule};

use crate::error::{SimulationError, SimulationResult};
use crate::events::{Event, EventQueue};
use crate::observer::{NoopObserver, SimObserver, TrajectoryRecord};
use crate::stats::{DoorStatistics, RoomStatistics, SimulationStatistics};
use crate::systems;

// ── AgentDescription ──────────────────────────────────────────────────────────

/// What a caller supplies to [`Simulation::add_agent`].
#[derive(Clone, Debug)]
pub struct AgentDescription {
    pub pos: Point,
    pub orientation: Point,
    pub journey: JourneyId,
    pub stage: StageId,
    pub profile: ProfileId,
    pub premovement_time: f64,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// The per-tick engine: owns all state, wires the components together, and
/// exposes the runtime API.
///
/// Construct via [`SimulationBuilder`](crate::SimulationBuilder).
pub struct Simulation {
    pub(crate) clock: SimulationClock,
    pub(crate) model: VelocityModel,
    pub(crate) building: Building,
    pub(crate) router: RoutingEngine,
    pub(crate) neighborhood: NeighborhoodSearch,

    pub(crate) agents: Vec<Agent>,
    pub(crate) stages: BTreeMap<StageId, Stage>,
    pub(crate) journeys: BTreeMap<JourneyId, Journey>,
    pub(crate) events: EventQueue,

    pub(crate) removed_last_iteration: Vec<AgentId>,
    next_agent_id: u64,
    next_stage_id: u64,
    next_journey_id: u64,

    /// Room → whether it has ever been occupied, and when it first emptied.
    room_egress: BTreeMap<RoomId, (bool, Option<f64>)>,
}

impl Simulation {
    pub(crate) fn new(
        model: VelocityModel,
        building: Building,
        mut router: RoutingEngine,
        neighborhood: NeighborhoodSearch,
        dt: f64,
    ) -> Self {
        router.update_if_needed(&building);
        Self {
            clock: SimulationClock::new(dt),
            model,
            building,
            router,
            neighborhood,
            agents: Vec::new(),
            stages: BTreeMap::new(),
            journeys: BTreeMap::new(),
            events: EventQueue::new(),
            removed_last_iteration: Vec::new(),
            next_agent_id: 0,
            next_stage_id: 0,
            next_journey_id: 0,
            room_egress: BTreeMap::new(),
        }
    }

    // ── Setup API ─────────────────────────────────────────────────────────

    /// Register a stage and return its id.
    pub fn add_stage(&mut self, desc: StageDescription) -> SimulationResult<StageId> {
        let id = StageId(self.next_stage_id);
        let stage = Stage::new(id, desc)?;
        self.next_stage_id += 1;
        self.stages.insert(id, stage);
        Ok(id)
    }

    /// Register a journey over existing stages and return its id.
    pub fn add_journey(
        &mut self,
        rules: BTreeMap<StageId, TransitionRule>,
    ) -> SimulationResult<JourneyId> {
        let id = JourneyId(self.next_journey_id);
        let journey = Journey::new(id, rules)?;
        for stage in journey.referenced_stages() {
            if !self.stages.contains_key(&stage) {
                return Err(SimulationError::UnknownStage(stage));
            }
        }
        self.next_journey_id += 1;
        self.journeys.insert(id, journey);
        Ok(id)
    }

    // ── Agent lifecycle ───────────────────────────────────────────────────

    /// Validate and insert an agent; runs its first strategic and tactical
    /// decision immediately so it has a navigation line before the next tick.
    pub fn add_agent(&mut self, desc: AgentDescription) -> SimulationResult<AgentId> {
        let journey = self
            .journeys
            .get(&desc.journey)
            .ok_or(SimulationError::UnknownJourney(desc.journey))?;
        if !journey.contains_stage(desc.stage) {
            return Err(SimulationError::StageNotInJourney {
                stage: desc.stage,
                journey: desc.journey,
            });
        }

        let existing: Vec<&Agent> = self.agents.iter().collect();
        self.model
            .validate_placement(desc.pos, desc.profile, &existing, &self.building)?;

        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        let mut agent = Agent::new(
            id,
            desc.pos,
            desc.orientation,
            desc.journey,
            desc.stage,
            desc.profile,
            desc.premovement_time,
        );

        self.router.update_if_needed(&self.building);
        systems::strategic_step(&mut self.journeys, &mut self.stages, &mut agent);
        systems::tactical_step(&mut self.router, &self.building, &self.stages, &mut agent);

        self.neighborhood.add(id, agent.pos);
        if let Some((room, _)) = self.building.get_room_and_subroom(agent.pos) {
            self.room_egress.insert(room, (true, None));
        }
        self.agents.push(agent);
        Ok(id)
    }

    /// Remove an agent explicitly.  Errors on unknown id.
    pub fn remove_agent(&mut self, id: AgentId) -> SimulationResult<()> {
        let idx = self
            .agents
            .iter()
            .position(|a| a.id == id)
            .ok_or(SimulationError::UnknownAgent(id))?;
        let agent = self.agents.remove(idx);
        if let Some(stage) = self.stages.get_mut(&agent.stage) {
            stage.leave(id);
        }
        self.neighborhood
            .update(self.agents.iter().map(|a| (a.id, a.pos)));
        Ok(())
    }

    // ── The tick ──────────────────────────────────────────────────────────

    /// Advance one tick.
    pub fn iterate(&mut self) -> SimulationResult<()> {
        self.iterate_with(&mut NoopObserver)
    }

    /// Advance one tick, reporting records through `observer`.
    ///
    /// Order (fixed): apply due events and rebuild the router cache →
    /// rebuild the neighbor index → strategic → tactical → operational
    /// (gated on the minimum premovement time) → remove exited and
    /// out-of-bounds agents → update door-flow counters and outflow
    /// regulation → advance the clock.  A fatal error leaves the clock
    /// unadvanced; the loop refuses to continue.
    pub fn iterate_with<O: SimObserver>(&mut self, observer: &mut O) -> SimulationResult<()> {
        let elapsed = self.clock.elapsed_time();
        self.removed_last_iteration.clear();

        // ── 1. Events, then router cache ──────────────────────────────────
        for event in self.events.drain_due(elapsed) {
            match event.apply(&mut self.building) {
                Ok(()) => self.router.set_needs_update(),
                Err(e) => warn!("event at t={:.3} failed: {e}", event.time),
            }
        }
        self.router.update_if_needed(&self.building);

        // ── 2. Neighbor index ─────────────────────────────────────────────
        self.neighborhood
            .update(self.agents.iter().map(|a| (a.id, a.pos)));

        // ── 3. Decision passes ────────────────────────────────────────────
        if elapsed > self.min_premovement_time() {
            systems::strategic_pass(&mut self.journeys, &mut self.stages, &mut self.agents);
            systems::tactical_pass(
                &mut self.router,
                &self.building,
                &self.stages,
                &mut self.agents,
            );
            let updates = systems::operational_pass(
                &self.model,
                &self.building,
                &self.neighborhood,
                &self.agents,
                self.clock.dt(),
                elapsed,
                self.router.is_floorfield(),
            )?;
            for (agent, update) in self.agents.iter_mut().zip(&updates) {
                agent.apply(update);
            }
        } else {
            // No movement this tick; keep prev_pos in sync so the crossing
            // test below never re-counts an old movement segment.
            for agent in &mut self.agents {
                agent.prev_pos = agent.pos;
            }
        }

        // ── 4. Removal scan ───────────────────────────────────────────────
        let (door_passings, crossing_passings) = self.detect_crossings();
        self.remove_done_agents();
        if !self.removed_last_iteration.is_empty() {
            observer.on_agents_removed(elapsed, &self.removed_last_iteration);
        }

        // ── 5. Door flow and regulation ───────────────────────────────────
        for (door, agent) in door_passings {
            if let Ok(t) = self.building.transition_mut(door) {
                t.record_passing(elapsed, agent);
                observer.on_door_crossing(elapsed, door, agent, t.door_usage());
            }
        }
        for id in crossing_passings {
            if let Ok(c) = self.building.crossing_mut(id) {
                c.record_passing(elapsed);
            }
        }
        if self.building.update_flow_regulation(elapsed) {
            self.router.set_needs_update();
        }
        self.update_room_egress(elapsed);

        let trajectories: Vec<TrajectoryRecord> = self
            .agents
            .iter()
            .map(|a| TrajectoryRecord {
                agent: a.id,
                iteration: self.clock.iteration(),
                time: elapsed,
                x: a.pos.x,
                y: a.pos.y,
                ox: a.orientation.x,
                oy: a.orientation.y,
                speed: a.speed,
            })
            .collect();
        observer.on_tick_end(self.clock.iteration(), elapsed, &trajectories);

        // ── 6. Clock ──────────────────────────────────────────────────────
        self.clock.advance();
        Ok(())
    }

    /// Agents only start deciding once the earliest premovement window in
    /// the population has passed.
    fn min_premovement_time(&self) -> f64 {
        self.agents
            .iter()
            .map(|a| a.premovement_time)
            .fold(f64::INFINITY, f64::min)
    }

    /// Movement segments (`prev_pos → pos`) crossing door or crossing
    /// segments this tick.
    fn detect_crossings(&self) -> (Vec<(TransitionId, AgentId)>, Vec<CrossingId>) {
        let mut doors = Vec::new();
        let mut crossings = Vec::new();
        for agent in &self.agents {
            if agent.prev_pos == agent.pos {
                continue;
            }
            for transition in self.building.transitions() {
                if transition.segment.crosses(agent.prev_pos, agent.pos) {
                    doors.push((transition.id, agent.id));
                }
            }
            for crossing in self.building.crossings() {
                if crossing.segment.crosses(agent.prev_pos, agent.pos) {
                    crossings.push(crossing.id);
                }
            }
        }
        (doors, crossings)
    }

    /// Remove agents outside the geometry or inside their Exit polygon.
    fn remove_done_agents(&mut self) {
        let building = &self.building;
        let stages = &self.stages;
        let removed: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| {
                let exited = stages
                    .get(&a.stage)
                    .and_then(|s| s.exit_polygon())
                    .map(|poly| poly.contains(a.pos))
                    .unwrap_or(false);
                exited || building.get_room_and_subroom(a.pos).is_none()
            })
            .map(|a| a.id)
            .collect();

        for &id in &removed {
            if let Some(idx) = self.agents.iter().position(|a| a.id == id) {
                let agent = self.agents.remove(idx);
                if let Some(stage) = self.stages.get_mut(&agent.stage) {
                    stage.leave(id);
                }
            }
        }
        self.removed_last_iteration.extend(removed);
    }

    fn update_room_egress(&mut self, elapsed: f64) {
        let mut occupied: BTreeMap<RoomId, usize> = BTreeMap::new();
        for agent in &self.agents {
            if let Some((room, _)) = self.building.get_room_and_subroom(agent.pos) {
                *occupied.entry(room).or_insert(0) += 1;
            }
        }
        for &room in occupied.keys() {
            self.room_egress.entry(room).or_insert((false, None));
        }
        for (room, (had_agents, egress)) in self.room_egress.iter_mut() {
            let now = occupied.get(room).copied().unwrap_or(0);
            if now > 0 {
                *had_agents = true;
                *egress = None;
            } else if *had_agents && egress.is_none() {
                *egress = Some(elapsed);
            }
        }
    }

    // ── Events ────────────────────────────────────────────────────────────

    /// Schedule a door or train event.
    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }

    // ── Stage control ─────────────────────────────────────────────────────

    /// Release a waiting set's gate.
    pub fn notify_waiting_set(&mut self, stage: StageId) -> SimulationResult<()> {
        self.stages
            .get_mut(&stage)
            .ok_or(SimulationError::UnknownStage(stage))?
            .notify();
        Ok(())
    }

    /// Release up to `count` agents from the head of a queue stage.
    pub fn pop_queue(&mut self, stage: StageId, count: usize) -> SimulationResult<()> {
        self.stages
            .get_mut(&stage)
            .ok_or(SimulationError::UnknownStage(stage))?
            .pop(count);
        Ok(())
    }

    // ── Agent control ─────────────────────────────────────────────────────

    /// Move an agent to a different journey/stage pair.
    pub fn switch_agent_journey(
        &mut self,
        id: AgentId,
        journey: JourneyId,
        stage: StageId,
    ) -> SimulationResult<()> {
        let target = self
            .journeys
            .get(&journey)
            .ok_or(SimulationError::UnknownJourney(journey))?;
        if !target.contains_stage(stage) {
            return Err(SimulationError::StageNotInJourney { stage, journey });
        }
        let agent = self.agent_index(id)?;
        let old_stage = self.agents[agent].stage;
        if let Some(s) = self.stages.get_mut(&old_stage) {
            s.leave(id);
        }
        self.agents[agent].journey = journey;
        self.agents[agent].stage = stage;
        Ok(())
    }

    /// Switch an agent's operational parameter profile.
    pub fn switch_agent_profile(&mut self, id: AgentId, profile: ProfileId) -> SimulationResult<()> {
        if !self.model.has_profile(profile) {
            return Err(SimulationError::UnknownProfile(profile));
        }
        let agent = self.agent_index(id)?;
        self.agents[agent].profile = profile;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Ids of all agents within `distance` of `pos`.
    pub fn agents_in_range(&self, pos: Point, distance: f64) -> Vec<AgentId> {
        self.neighborhood
            .neighbours(pos, distance)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    /// Ids of all agents inside the convex polygon.
    pub fn agents_in_polygon(&self, polygon: &Polygon) -> SimulationResult<Vec<AgentId>> {
        if !polygon.is_convex() {
            return Err(SimulationError::NonConvexPolygon);
        }
        let (center, radius) = polygon.containing_circle();
        Ok(self
            .neighborhood
            .neighbours(center, radius)
            .into_iter()
            .filter(|&(_, pos)| polygon.contains(pos))
            .map(|(id, _)| id)
            .collect())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn agent(&self, id: AgentId) -> SimulationResult<&Agent> {
        self.agents
            .iter()
            .find(|a| a.id == id)
            .ok_or(SimulationError::UnknownAgent(id))
    }

    fn agent_index(&self, id: AgentId) -> SimulationResult<usize> {
        self.agents
            .iter()
            .position(|a| a.id == id)
            .ok_or(SimulationError::UnknownAgent(id))
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Agents removed during the most recent tick.
    pub fn removed_agents(&self) -> &[AgentId] {
        &self.removed_last_iteration
    }

    pub fn elapsed_time(&self) -> f64 {
        self.clock.elapsed_time()
    }

    pub fn iteration(&self) -> u64 {
        self.clock.iteration()
    }

    pub fn dt(&self) -> f64 {
        self.clock.dt()
    }

    pub fn building(&self) -> &Building {
        &self.building
    }

    pub fn router(&self) -> &RoutingEngine {
        &self.router
    }

    /// Current egress and door-usage summaries.
    pub fn statistics(&self) -> SimulationStatistics {
        let rooms = self
            .room_egress
            .iter()
            .filter_map(|(&room, &(_, egress))| {
                self.building.room(room).ok().map(|r| RoomStatistics {
                    room,
                    caption: r.caption.clone(),
                    egress_time: egress,
                })
            })
            .collect();
        let doors = self
            .building
            .transitions()
            .map(|t| DoorStatistics {
                door: t.id,
                usage: t.door_usage(),
                last_passing_time: (t.last_passing_time() >= 0.0)
                    .then(|| t.last_passing_time()),
            })
            .collect();
        SimulationStatistics { rooms, doors }
    }
}
