//! Integration tests: the scenario suite and the engine's universal
//! properties (determinism, containment, mass conservation, waiting safety,
//! speed bound).

use std::collections::BTreeMap;

use ped_core::{
    AgentId, JourneyId, LineSegment, Point, ProfileId, RoomId, StageId, SubRoomId, TrackId,
    TrainId, TransitionId,
};
use ped_geometry::{BuildingBuilder, Polygon, TrainDoor, TrainType};
use ped_model::{AgentParameters, ModelError, VelocityModelBuilder};
use ped_routing::{RoutingEngine, RoutingStrategy};
use ped_stages::{StageDescription, TransitionRule};

use crate::{
    AgentDescription, Event, EventKind, SimObserver, Simulation, SimulationBuilder,
    SimulationError,
};

const DT: f64 = 0.05;
const B_MAX: f64 = 0.15;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> LineSegment {
    LineSegment::new(pt(x1, y1), pt(x2, y2))
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
    Polygon::new(vec![pt(x0, y0), pt(x1, y0), pt(x1, y1), pt(x0, y1)])
}

fn model() -> ped_model::VelocityModel {
    VelocityModelBuilder::new(5.0, 0.1, 5.0, 0.02)
        .add_profile(ProfileId(0), AgentParameters { v0: 1.2, time_gap: 0.5, b_max: B_MAX })
        .build()
        .unwrap()
}

fn router() -> RoutingEngine {
    RoutingEngine::new(RoutingStrategy::DoorGraph).unwrap()
}

/// One 10×2 corridor with an exit door at x=10.
fn corridor_sim() -> Simulation {
    let mut b = BuildingBuilder::new();
    b.add_room(RoomId(0), "corridor");
    b.add_subroom(
        RoomId(0),
        SubRoomId(0),
        rect(0.0, 0.0, 10.0, 2.0),
        vec![seg(0.0, 0.0, 10.0, 0.0), seg(0.0, 2.0, 10.0, 2.0), seg(0.0, 0.0, 0.0, 2.0)],
    );
    b.add_transition(
        TransitionId(0),
        seg(10.0, 0.0, 10.0, 2.0),
        (RoomId(0), SubRoomId(0)),
        None,
    );
    SimulationBuilder::new(model(), b.build().unwrap(), router(), DT)
        .build()
        .unwrap()
}

/// Two 5×2 rooms joined by door A (id 0) at x=5, exit door (id 1) at x=10.
fn two_room_sim() -> Simulation {
    let mut b = BuildingBuilder::new();
    b.add_room(RoomId(0), "west");
    b.add_room(RoomId(1), "east");
    b.add_subroom(
        RoomId(0),
        SubRoomId(0),
        rect(0.0, 0.0, 5.0, 2.0),
        vec![seg(0.0, 0.0, 5.0, 0.0), seg(0.0, 2.0, 5.0, 2.0), seg(0.0, 0.0, 0.0, 2.0)],
    );
    b.add_subroom(
        RoomId(1),
        SubRoomId(0),
        rect(5.0, 0.0, 10.0, 2.0),
        vec![seg(5.0, 0.0, 10.0, 0.0), seg(5.0, 2.0, 10.0, 2.0)],
    );
    b.add_transition(
        TransitionId(0),
        seg(5.0, 0.0, 5.0, 2.0),
        (RoomId(0), SubRoomId(0)),
        Some((RoomId(1), SubRoomId(0))),
    );
    b.add_transition(
        TransitionId(1),
        seg(10.0, 0.0, 10.0, 2.0),
        (RoomId(1), SubRoomId(0)),
        None,
    );
    SimulationBuilder::new(model(), b.build().unwrap(), router(), DT)
        .build()
        .unwrap()
}

/// A 20×20 hall with no doors, for journey-logic tests.
fn hall_sim() -> Simulation {
    let mut b = BuildingBuilder::new();
    b.add_room(RoomId(0), "hall");
    b.add_subroom(
        RoomId(0),
        SubRoomId(0),
        rect(0.0, 0.0, 20.0, 20.0),
        vec![
            seg(0.0, 0.0, 20.0, 0.0),
            seg(20.0, 0.0, 20.0, 20.0),
            seg(20.0, 20.0, 0.0, 20.0),
            seg(0.0, 20.0, 0.0, 0.0),
        ],
    );
    SimulationBuilder::new(model(), b.build().unwrap(), router(), DT)
        .build()
        .unwrap()
}

/// Exit stage over `polygon` plus a single-node terminal journey.
fn exit_journey(sim: &mut Simulation, polygon: Polygon) -> (JourneyId, StageId) {
    let exit = sim.add_stage(StageDescription::Exit { polygon }).unwrap();
    let mut rules = BTreeMap::new();
    rules.insert(exit, TransitionRule::NonTransition);
    let journey = sim.add_journey(rules).unwrap();
    (journey, exit)
}

fn walker(pos: Point, journey: JourneyId, stage: StageId) -> AgentDescription {
    AgentDescription {
        pos,
        orientation: pt(1.0, 0.0),
        journey,
        stage,
        profile: ProfileId(0),
        premovement_time: 0.0,
    }
}

fn run_seconds(sim: &mut Simulation, seconds: f64) {
    let ticks = (seconds / sim.dt()).round() as u64;
    for _ in 0..ticks {
        sim.iterate().unwrap();
    }
}

// ── Scenario 1: single corridor ───────────────────────────────────────────────

#[test]
fn corridor_agents_reach_exit_and_keep_distance() {
    let mut sim = corridor_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    sim.add_agent(walker(pt(1.5, 1.0), journey, exit)).unwrap();
    sim.add_agent(walker(pt(3.0, 1.0), journey, exit)).unwrap();

    let mut removed = 0;
    for _ in 0..(8.0 / DT) as u64 {
        sim.iterate().unwrap();
        removed += sim.removed_agents().len();
        if sim.agent_count() == 2 {
            let d = sim.agents()[0].pos.distance_to(sim.agents()[1].pos);
            assert!(d >= 2.0 * B_MAX - 1e-4, "agents overlapped: d={d}");
        }
        for agent in sim.agents() {
            assert!(agent.speed <= 1.2 + 1e-9, "speed bound violated");
        }
    }
    assert_eq!(removed, 2, "both agents must exit within 8 s");
    assert_eq!(sim.agent_count(), 0);
}

// ── Scenario 2: door toggles ──────────────────────────────────────────────────

#[derive(Default)]
struct FlowCollector {
    crossings: Vec<(f64, TransitionId, AgentId)>,
}

impl SimObserver for FlowCollector {
    fn on_door_crossing(&mut self, time: f64, door: TransitionId, agent: AgentId, _cum: u64) {
        self.crossings.push((time, door, agent));
    }
}

#[test]
fn door_toggle_makes_agents_wait_and_resume() {
    let mut sim = two_room_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(8.5, 0.0, 10.0, 2.0));

    // Two columns west of door A so nobody reaches x=5 before t=2.
    let spawns = [
        pt(1.0, 0.5),
        pt(1.0, 1.0),
        pt(1.0, 1.5),
        pt(1.6, 0.75),
        pt(1.6, 1.25),
    ];
    for &pos in &spawns {
        sim.add_agent(walker(pos, journey, exit)).unwrap();
    }

    sim.add_event(Event::new(2.0, EventKind::TempCloseDoor(TransitionId(0))));
    sim.add_event(Event::new(4.0, EventKind::OpenDoor(TransitionId(0))));

    let mut observer = FlowCollector::default();
    let total_added = 5;
    let mut total_removed = 0;

    let mut all_waiting_after_close = false;
    while sim.elapsed_time() < 9.0 && sim.agent_count() > 0 {
        sim.iterate_with(&mut observer).unwrap();
        total_removed += sim.removed_agents().len();

        // Mass conservation at every observable point.
        assert_eq!(total_added, sim.agent_count() + total_removed);

        let t = sim.elapsed_time();
        if t > 2.0 + DT && t < 4.0 {
            assert!(
                sim.agents().iter().all(|a| a.waiting),
                "all agents must wait while door A is temp-closed (t={t:.2})"
            );
            all_waiting_after_close = true;
            // Waiting safety: nobody passes the temp-closed door.
            assert!(sim.agents().iter().all(|a| a.pos.x < 5.0));
        }
    }

    assert!(all_waiting_after_close);
    assert_eq!(sim.agent_count(), 0, "all agents must exit by t=9 s");
    // Every agent crossed door A exactly once.
    let door_a: Vec<_> = observer
        .crossings
        .iter()
        .filter(|(_, d, _)| *d == TransitionId(0))
        .collect();
    assert_eq!(door_a.len(), 5);
    let stats = sim.statistics();
    let a = stats.doors.iter().find(|d| d.door == TransitionId(0)).unwrap();
    assert_eq!(a.usage, 5);
    assert!(a.last_passing_time.is_some());
}

#[test]
fn closed_door_is_never_crossed() {
    let mut sim = two_room_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    for y in [0.6, 1.0, 1.4] {
        sim.add_agent(walker(pt(1.0, y), journey, exit)).unwrap();
    }
    sim.add_event(Event::new(0.5, EventKind::CloseDoor(TransitionId(0))));

    run_seconds(&mut sim, 6.0);
    assert_eq!(sim.agent_count(), 3, "nobody can exit through a closed door");
    assert!(sim.agents().iter().all(|a| a.pos.x < 5.0));
    assert!(
        sim.agents().iter().all(|a| a.waiting),
        "unreachable goal must put agents into waiting"
    );
}

// ── Scenario 3: train activation ──────────────────────────────────────────────

#[test]
fn train_splice_reroutes_and_restores_geometry() {
    // Platform room with a track along the south wall and an exit east.
    let mut b = BuildingBuilder::new();
    b.add_room(RoomId(0), "platform");
    b.add_subroom(
        RoomId(0),
        SubRoomId(0),
        rect(0.0, 0.0, 10.0, 4.0),
        vec![
            seg(0.0, 0.0, 10.0, 0.0),
            seg(0.0, 4.0, 10.0, 4.0),
            seg(0.0, 0.0, 0.0, 4.0),
        ],
    );
    b.add_transition(
        TransitionId(0),
        seg(10.0, 0.0, 10.0, 4.0),
        (RoomId(0), SubRoomId(0)),
        None,
    );
    b.add_track(TrackId(1), RoomId(0), SubRoomId(0), seg(0.0, 0.0, 10.0, 0.0));
    let mut sim = SimulationBuilder::new(model(), b.build().unwrap(), router(), DT)
        .build()
        .unwrap();

    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 4.0));
    sim.add_agent(walker(pt(1.0, 2.0), journey, exit)).unwrap();
    sim.add_agent(walker(pt(2.0, 3.0), journey, exit)).unwrap();

    let walls_before = {
        let mut w: Vec<_> = sim
            .building()
            .subroom(RoomId(0), SubRoomId(0))
            .unwrap()
            .walls()
            .to_vec();
        w.sort_by(|a, b| a.p1.x.total_cmp(&b.p1.x).then(a.p1.y.total_cmp(&b.p1.y)));
        w
    };

    let train = TrainType {
        length: 8.0,
        doors: vec![TrainDoor { distance: 1.0, width: 1.0 }, TrainDoor { distance: 5.0, width: 1.0 }],
    };
    sim.add_event(Event::new(
        1.0,
        EventKind::ActivateTrain {
            train: TrainId(1),
            track: TrackId(1),
            train_type: train,
            start_offset: 0.5,
            reversed: false,
        },
    ));
    sim.add_event(Event::new(
        5.0,
        EventKind::DeactivateTrain { train: TrainId(1), track: TrackId(1) },
    ));

    run_seconds(&mut sim, 2.0);
    assert!(sim.building().is_train_active(TrainId(1)));
    assert_eq!(sim.building().train_door_ids(TrainId(1)).len(), 2);
    assert!(!sim.router().needs_update(), "router rebuilt after the splice");

    run_seconds(&mut sim, 4.0);
    assert!(!sim.building().is_train_active(TrainId(1)));
    let walls_after = {
        let mut w: Vec<_> = sim
            .building()
            .subroom(RoomId(0), SubRoomId(0))
            .unwrap()
            .walls()
            .to_vec();
        w.sort_by(|a, b| a.p1.x.total_cmp(&b.p1.x).then(a.p1.y.total_cmp(&b.p1.y)));
        w
    };
    assert_eq!(walls_before, walls_after, "train deactivation must restore walls exactly");

    // The run itself stays healthy: both agents exit through the east door.
    run_seconds(&mut sim, 6.0);
    assert_eq!(sim.agent_count(), 0);
}

// ── Scenario 4: round-robin journey ───────────────────────────────────────────

#[test]
fn round_robin_splits_agents_evenly() {
    let mut sim = hall_sim();
    let w1 = sim
        .add_stage(StageDescription::Waypoint { position: pt(10.0, 10.0), distance: 15.0 })
        .unwrap();
    let w2 = sim
        .add_stage(StageDescription::Waypoint { position: pt(2.0, 2.0), distance: 0.5 })
        .unwrap();
    let w3 = sim
        .add_stage(StageDescription::Waypoint { position: pt(18.0, 18.0), distance: 0.5 })
        .unwrap();
    let mut rules = BTreeMap::new();
    rules.insert(w1, TransitionRule::RoundRobin(vec![(w2, 1), (w3, 1)]));
    rules.insert(w2, TransitionRule::NonTransition);
    rules.insert(w3, TransitionRule::NonTransition);
    let journey = sim.add_journey(rules).unwrap();

    // 100 agents on a 10×10 grid, all inside W1's (huge) arrival radius.
    for i in 0..10 {
        for j in 0..10 {
            let pos = pt(5.0 + i as f64 * 0.5, 5.0 + j as f64 * 0.5);
            sim.add_agent(walker(pos, journey, w1)).unwrap();
        }
    }

    // One decided tick is enough: every agent completes W1 and is assigned.
    sim.iterate().unwrap();
    sim.iterate().unwrap();

    let at_w2 = sim.agents().iter().filter(|a| a.stage == w2).count();
    let at_w3 = sim.agents().iter().filter(|a| a.stage == w3).count();
    assert_eq!(at_w2 + at_w3, 100);
    assert!(at_w2.abs_diff(at_w3) <= 1, "split was {at_w2}/{at_w3}");
}

// ── Scenario 5: overcrowded room ──────────────────────────────────────────────

#[test]
fn overcrowded_room_never_overlaps_and_drains() {
    let mut b = BuildingBuilder::new();
    b.add_room(RoomId(0), "room");
    b.add_subroom(
        RoomId(0),
        SubRoomId(0),
        rect(0.0, 0.0, 5.0, 5.0),
        vec![
            seg(0.0, 0.0, 5.0, 0.0),
            seg(0.0, 5.0, 5.0, 5.0),
            seg(0.0, 0.0, 0.0, 5.0),
            seg(5.0, 0.0, 5.0, 2.0),
            seg(5.0, 3.0, 5.0, 5.0),
        ],
    );
    // A 1 m exit door.
    b.add_transition(
        TransitionId(0),
        seg(5.0, 2.0, 5.0, 3.0),
        (RoomId(0), SubRoomId(0)),
        None,
    );
    let model = VelocityModelBuilder::new(5.0, 0.1, 5.0, 0.02)
        .cutoff(1.0)
        .add_profile(ProfileId(0), AgentParameters { v0: 1.2, time_gap: 0.5, b_max: B_MAX })
        .build()
        .unwrap();
    let mut sim = SimulationBuilder::new(model, b.build().unwrap(), router(), DT)
        .build()
        .unwrap();

    let (journey, exit) = exit_journey(&mut sim, rect(4.6, 1.9, 5.0, 3.1));

    // A dense 11×11 grid (minus one) of 120 agents.
    let mut added = 0;
    'outer: for i in 0..11 {
        for j in 0..11 {
            if added == 120 {
                break 'outer;
            }
            let pos = pt(0.5 + i as f64 * 0.4, 0.5 + j as f64 * 0.4);
            sim.add_agent(walker(pos, journey, exit)).unwrap();
            added += 1;
        }
    }

    let min_distance = 2.0 * B_MAX - 1e-4;
    while sim.elapsed_time() < 150.0 && sim.agent_count() > 0 {
        sim.iterate().unwrap();
        let agents = sim.agents();
        for i in 0..agents.len() {
            for j in (i + 1)..agents.len() {
                let d = agents[i].pos.distance_to(agents[j].pos);
                assert!(
                    d >= min_distance,
                    "overlap at t={:.2}: {} vs {} (d={d})",
                    sim.elapsed_time(),
                    agents[i].id,
                    agents[j].id
                );
            }
        }
    }
    assert_eq!(sim.agent_count(), 0, "room must drain within the envelope");
}

// ── Scenario 6: invariant violation on insert ─────────────────────────────────

#[test]
fn coincident_spawn_is_rejected_and_state_unchanged() {
    let mut sim = corridor_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    sim.add_agent(walker(pt(2.0, 1.0), journey, exit)).unwrap();

    let result = sim.add_agent(walker(pt(2.0, 1.0), journey, exit));
    assert!(matches!(
        result,
        Err(SimulationError::Model(ModelError::PlacementCollision { .. }))
    ));
    assert_eq!(sim.agent_count(), 1, "failed insert must not change state");
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[test]
fn runs_are_bit_identical() {
    let build = || {
        let mut sim = two_room_sim();
        let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
        for y in [0.5, 1.0, 1.5] {
            sim.add_agent(walker(pt(1.0, y), journey, exit)).unwrap();
        }
        sim.add_event(Event::new(1.0, EventKind::TempCloseDoor(TransitionId(0))));
        sim.add_event(Event::new(2.0, EventKind::OpenDoor(TransitionId(0))));
        sim
    };

    let mut a = build();
    let mut b = build();
    for _ in 0..100 {
        a.iterate().unwrap();
        b.iterate().unwrap();
        assert_eq!(a.agent_count(), b.agent_count());
        for (x, y) in a.agents().iter().zip(b.agents()) {
            assert!(x.pos.x == y.pos.x && x.pos.y == y.pos.y, "positions diverged");
            assert!(x.speed == y.speed);
        }
    }
}

// ── Containment ───────────────────────────────────────────────────────────────

#[test]
fn agents_stay_inside_the_geometry() {
    let mut sim = two_room_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    for y in [0.5, 1.0, 1.5] {
        sim.add_agent(walker(pt(0.5, y), journey, exit)).unwrap();
    }
    for _ in 0..200 {
        sim.iterate().unwrap();
        for agent in sim.agents() {
            assert!(
                sim.building().get_room_and_subroom(agent.pos).is_some(),
                "agent {} left the geometry at {}",
                agent.id,
                agent.pos
            );
        }
    }
}

// ── Premovement ───────────────────────────────────────────────────────────────

#[test]
fn premovement_holds_agents_in_place() {
    let mut sim = corridor_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    let mut desc = walker(pt(1.0, 1.0), journey, exit);
    desc.premovement_time = 1.0;
    let id = sim.add_agent(desc).unwrap();

    run_seconds(&mut sim, 1.0);
    let held = sim.agent(id).unwrap().pos;
    assert_eq!(held, pt(1.0, 1.0), "position frozen during premovement");

    run_seconds(&mut sim, 1.0);
    assert!(sim.agent(id).unwrap().pos.x > 1.0, "agent moves after premovement");
}

// ── Waiting set and queue stages ──────────────────────────────────────────────

#[test]
fn waiting_set_gates_until_notified() {
    let mut sim = hall_sim();
    let slots = vec![pt(10.0, 10.0), pt(10.6, 10.0), pt(11.2, 10.0)];
    let ws = sim.add_stage(StageDescription::WaitingSet { slots }).unwrap();
    let w2 = sim
        .add_stage(StageDescription::Waypoint { position: pt(2.0, 2.0), distance: 0.5 })
        .unwrap();
    let mut rules = BTreeMap::new();
    rules.insert(ws, TransitionRule::Fixed(w2));
    rules.insert(w2, TransitionRule::NonTransition);
    let journey = sim.add_journey(rules).unwrap();

    for i in 0..5 {
        sim.add_agent(walker(pt(8.0 + i as f64 * 0.5, 8.0), journey, ws)).unwrap();
    }

    run_seconds(&mut sim, 3.0);
    // Occupancy stays bounded by the slot count; occupants are held.
    assert!(sim.agents().iter().filter(|a| a.stage == ws && a.waiting).count() <= 3);
    assert!(sim.agents().iter().all(|a| a.stage == ws));

    sim.notify_waiting_set(ws).unwrap();
    run_seconds(&mut sim, 1.0);
    let moved_on = sim.agents().iter().filter(|a| a.stage == w2).count();
    assert!(moved_on >= 3, "released occupants must transition, got {moved_on}");

    sim.notify_waiting_set(ws).unwrap();
    run_seconds(&mut sim, 1.0);
    assert!(sim.agents().iter().all(|a| a.stage == w2));
}

#[test]
fn queue_releases_in_fifo_order() {
    let mut sim = hall_sim();
    let slots = vec![pt(10.0, 10.0), pt(10.6, 10.0), pt(11.2, 10.0)];
    let queue = sim.add_stage(StageDescription::Queue { slots }).unwrap();
    let w2 = sim
        .add_stage(StageDescription::Waypoint { position: pt(2.0, 2.0), distance: 0.5 })
        .unwrap();
    let mut rules = BTreeMap::new();
    rules.insert(queue, TransitionRule::Fixed(w2));
    rules.insert(w2, TransitionRule::NonTransition);
    let journey = sim.add_journey(rules).unwrap();

    let first = sim.add_agent(walker(pt(8.0, 8.0), journey, queue)).unwrap();
    let second = sim.add_agent(walker(pt(8.5, 8.0), journey, queue)).unwrap();
    let third = sim.add_agent(walker(pt(9.0, 8.0), journey, queue)).unwrap();

    run_seconds(&mut sim, 1.0);
    assert!(sim.agents().iter().all(|a| a.stage == queue));

    sim.pop_queue(queue, 1).unwrap();
    run_seconds(&mut sim, 0.5);
    assert_eq!(sim.agent(first).unwrap().stage, w2, "head leaves first");
    assert_eq!(sim.agent(second).unwrap().stage, queue);
    assert_eq!(sim.agent(third).unwrap().stage, queue);

    sim.pop_queue(queue, 2).unwrap();
    run_seconds(&mut sim, 0.5);
    assert_eq!(sim.agent(second).unwrap().stage, w2);
    assert_eq!(sim.agent(third).unwrap().stage, w2);
}

// ── Events ────────────────────────────────────────────────────────────────────

#[test]
fn unknown_event_ids_do_not_crash_the_run() {
    let mut sim = corridor_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    sim.add_agent(walker(pt(1.0, 1.0), journey, exit)).unwrap();

    sim.add_event(Event::new(0.1, EventKind::OpenDoor(TransitionId(99))));
    sim.add_event(Event::new(
        0.1,
        EventKind::DeactivateTrain { train: TrainId(7), track: TrackId(7) },
    ));

    run_seconds(&mut sim, 1.0);
    assert_eq!(sim.agent_count(), 1, "run continues past bad events");
}

#[test]
fn events_apply_in_timestamp_then_submission_order() {
    let mut sim = two_room_sim();
    // Same timestamp: Close then Open, submitted in that order → door ends open.
    sim.add_event(Event::new(0.2, EventKind::CloseDoor(TransitionId(0))));
    sim.add_event(Event::new(0.2, EventKind::OpenDoor(TransitionId(0))));
    run_seconds(&mut sim, 0.5);
    assert!(sim.building().transition(TransitionId(0)).unwrap().is_open());
}

// ── Queries and agent control ─────────────────────────────────────────────────

#[test]
fn range_and_polygon_queries() {
    let mut sim = hall_sim();
    let (journey, stage) = {
        let w = sim
            .add_stage(StageDescription::Waypoint { position: pt(10.0, 10.0), distance: 0.5 })
            .unwrap();
        let mut rules = BTreeMap::new();
        rules.insert(w, TransitionRule::NonTransition);
        (sim.add_journey(rules).unwrap(), w)
    };
    let a = sim.add_agent(walker(pt(5.0, 5.0), journey, stage)).unwrap();
    let b = sim.add_agent(walker(pt(5.5, 5.0), journey, stage)).unwrap();
    let c = sim.add_agent(walker(pt(15.0, 15.0), journey, stage)).unwrap();

    let mut near = sim.agents_in_range(pt(5.0, 5.0), 1.0);
    near.sort_unstable();
    assert_eq!(near, vec![a, b]);

    let inside = sim
        .agents_in_polygon(&rect(4.0, 4.0, 6.0, 6.0))
        .unwrap();
    assert!(inside.contains(&a) && inside.contains(&b) && !inside.contains(&c));

    let hourglass = Polygon::new(vec![
        pt(0.0, 0.0),
        pt(2.0, 2.0),
        pt(2.0, 0.0),
        pt(0.0, 2.0),
    ]);
    assert!(matches!(
        sim.agents_in_polygon(&hourglass),
        Err(SimulationError::NonConvexPolygon)
    ));
}

#[test]
fn switch_journey_and_profile_validation() {
    let mut sim = corridor_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    let (other_journey, other_exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 1.0));
    let id = sim.add_agent(walker(pt(1.0, 1.0), journey, exit)).unwrap();

    sim.switch_agent_journey(id, other_journey, other_exit).unwrap();
    assert_eq!(sim.agent(id).unwrap().journey, other_journey);

    assert!(matches!(
        sim.switch_agent_journey(id, JourneyId(99), other_exit),
        Err(SimulationError::UnknownJourney(JourneyId(99)))
    ));
    assert!(matches!(
        sim.switch_agent_journey(id, other_journey, exit),
        Err(SimulationError::StageNotInJourney { .. })
    ));
    assert!(matches!(
        sim.switch_agent_profile(id, ProfileId(9)),
        Err(SimulationError::UnknownProfile(ProfileId(9)))
    ));
    assert!(matches!(
        sim.remove_agent(AgentId(999)),
        Err(SimulationError::UnknownAgent(AgentId(999)))
    ));

    sim.remove_agent(id).unwrap();
    assert_eq!(sim.agent_count(), 0);
}

// ── Observer stream ───────────────────────────────────────────────────────────

#[test]
fn observer_receives_trajectories_every_tick() {
    struct CountRows {
        ticks: usize,
        rows: usize,
        removed: usize,
    }
    impl SimObserver for CountRows {
        fn on_tick_end(&mut self, _i: u64, _t: f64, rows: &[crate::TrajectoryRecord]) {
            self.ticks += 1;
            self.rows += rows.len();
        }
        fn on_agents_removed(&mut self, _t: f64, removed: &[AgentId]) {
            self.removed += removed.len();
        }
    }

    let mut sim = corridor_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    sim.add_agent(walker(pt(8.0, 1.0), journey, exit)).unwrap();

    let mut obs = CountRows { ticks: 0, rows: 0, removed: 0 };
    for _ in 0..40 {
        sim.iterate_with(&mut obs).unwrap();
    }
    assert_eq!(obs.ticks, 40);
    assert!(obs.rows > 0);
    assert_eq!(obs.removed, 1, "the agent exits within 2 s from x=8");
}

// ── Statistics ────────────────────────────────────────────────────────────────

#[test]
fn room_egress_time_recorded_when_room_empties() {
    let mut sim = corridor_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));
    sim.add_agent(walker(pt(8.0, 1.0), journey, exit)).unwrap();

    run_seconds(&mut sim, 3.0);
    assert_eq!(sim.agent_count(), 0);
    let stats = sim.statistics();
    let room = stats.rooms.iter().find(|r| r.room == RoomId(0)).unwrap();
    let egress = room.egress_time.expect("room emptied");
    assert!(egress > 0.0 && egress < 3.0);
    assert_eq!(room.caption, "corridor");
}

// ── Wiring validation ─────────────────────────────────────────────────────────

#[test]
fn builder_rejects_bad_dt() {
    let mut b = BuildingBuilder::new();
    b.add_room(RoomId(0), "r");
    b.add_subroom(
        RoomId(0),
        SubRoomId(0),
        rect(0.0, 0.0, 1.0, 1.0),
        vec![seg(0.0, 0.0, 1.0, 0.0)],
    );
    let result = SimulationBuilder::new(model(), b.build().unwrap(), router(), 0.0).build();
    assert!(matches!(result, Err(SimulationError::Config(_))));
}

#[test]
fn builder_rejects_undersized_cells() {
    let mut b = BuildingBuilder::new();
    b.add_room(RoomId(0), "r");
    b.add_subroom(
        RoomId(0),
        SubRoomId(0),
        rect(0.0, 0.0, 1.0, 1.0),
        vec![seg(0.0, 0.0, 1.0, 0.0)],
    );
    let result = SimulationBuilder::new(model(), b.build().unwrap(), router(), DT)
        .cell_size(0.5)
        .build();
    assert!(matches!(result, Err(SimulationError::Spatial(_))));
}

#[test]
fn add_journey_rejects_unknown_stage_refs() {
    let mut sim = corridor_sim();
    let mut rules = BTreeMap::new();
    rules.insert(StageId(42), TransitionRule::NonTransition);
    assert!(matches!(
        sim.add_journey(rules),
        Err(SimulationError::UnknownStage(StageId(42)))
    ));
}

#[test]
fn add_agent_validates_journey_and_stage() {
    let mut sim = corridor_sim();
    let (journey, exit) = exit_journey(&mut sim, rect(9.0, 0.0, 10.0, 2.0));

    let mut desc = walker(pt(1.0, 1.0), JourneyId(9), exit);
    assert!(matches!(
        sim.add_agent(desc.clone()),
        Err(SimulationError::UnknownJourney(JourneyId(9)))
    ));

    desc.journey = journey;
    desc.stage = StageId(55);
    assert!(matches!(
        sim.add_agent(desc.clone()),
        Err(SimulationError::StageNotInJourney { .. })
    ));

    desc.stage = exit;
    desc.pos = pt(-3.0, 1.0);
    assert!(matches!(
        sim.add_agent(desc),
        Err(SimulationError::Model(ModelError::PlacementOutside { .. }))
    ));
}
