//! Tests for the CSV backend and the observer bridge.

use std::collections::BTreeMap;

use ped_core::{LineSegment, Point, ProfileId, RoomId, SubRoomId, TransitionId};
use ped_geometry::{BuildingBuilder, Polygon};
use ped_model::{AgentParameters, VelocityModelBuilder};
use ped_routing::{RoutingEngine, RoutingStrategy};
use ped_sim::{AgentDescription, Simulation, SimulationBuilder};
use ped_stages::{StageDescription, TransitionRule};

use crate::writer::OutputWriter;
use crate::{CsvWriter, DoorFlowRow, SimulationWriter, TrajectoryRow};

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn corridor_sim() -> Simulation {
    let mut b = BuildingBuilder::new();
    b.add_room(RoomId(0), "corridor");
    b.add_subroom(
        RoomId(0),
        SubRoomId(0),
        Polygon::new(vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 2.0), pt(0.0, 2.0)]),
        vec![
            LineSegment::new(pt(0.0, 0.0), pt(10.0, 0.0)),
            LineSegment::new(pt(0.0, 2.0), pt(10.0, 2.0)),
            LineSegment::new(pt(0.0, 0.0), pt(0.0, 2.0)),
        ],
    );
    b.add_transition(
        TransitionId(0),
        LineSegment::new(pt(10.0, 0.0), pt(10.0, 2.0)),
        (RoomId(0), SubRoomId(0)),
        None,
    );
    let model = VelocityModelBuilder::new(5.0, 0.1, 5.0, 0.02)
        .add_profile(ProfileId(0), AgentParameters { v0: 1.2, time_gap: 0.5, b_max: 0.15 })
        .build()
        .unwrap();
    let router = RoutingEngine::new(RoutingStrategy::DoorGraph).unwrap();
    SimulationBuilder::new(model, b.build().unwrap(), router, 0.05)
        .build()
        .unwrap()
}

#[test]
fn csv_files_created_with_headers() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CsvWriter::new(dir.path()).unwrap();
    writer.finish().unwrap();

    let trajectories = std::fs::read_to_string(dir.path().join("trajectories.csv")).unwrap();
    assert!(trajectories.starts_with("agent,iteration,time,x,y,ox,oy,speed"));
    let flow = std::fs::read_to_string(dir.path().join("door_flow.csv")).unwrap();
    assert!(flow.starts_with("time,door,cumulative,agent"));
}

#[test]
fn rows_round_trip_through_csv() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CsvWriter::new(dir.path()).unwrap();
    writer
        .write_trajectories(&[TrajectoryRow {
            agent: 3,
            iteration: 7,
            time: 0.35,
            x: 1.25,
            y: 0.5,
            ox: 1.0,
            oy: 0.0,
            speed: 1.2,
        }])
        .unwrap();
    writer
        .write_door_flow(&DoorFlowRow { time: 0.35, door: 0, cumulative: 1, agent: 3 })
        .unwrap();
    writer.finish().unwrap();

    let trajectories = std::fs::read_to_string(dir.path().join("trajectories.csv")).unwrap();
    let mut lines = trajectories.lines();
    lines.next(); // header
    assert_eq!(lines.next().unwrap(), "3,7,0.350,1.250000,0.500000,1.000000,0.000000,1.200000");

    let flow = std::fs::read_to_string(dir.path().join("door_flow.csv")).unwrap();
    assert_eq!(flow.lines().nth(1).unwrap(), "0.350,0,1,3");
}

#[test]
fn finish_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CsvWriter::new(dir.path()).unwrap();
    writer.finish().unwrap();
    writer.finish().unwrap();
}

#[test]
fn simulation_writer_records_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let writer = CsvWriter::new(dir.path()).unwrap();
    let mut observer = SimulationWriter::new(writer);

    let mut sim = corridor_sim();
    let exit = sim
        .add_stage(StageDescription::Exit {
            polygon: Polygon::new(vec![pt(9.0, 0.0), pt(10.0, 0.0), pt(10.0, 2.0), pt(9.0, 2.0)]),
        })
        .unwrap();
    let mut rules = BTreeMap::new();
    rules.insert(exit, TransitionRule::NonTransition);
    let journey = sim.add_journey(rules).unwrap();
    sim.add_agent(AgentDescription {
        pos: pt(7.0, 1.0),
        orientation: pt(1.0, 0.0),
        journey,
        stage: exit,
        profile: ProfileId(0),
        premovement_time: 0.0,
    })
    .unwrap();

    for _ in 0..60 {
        sim.iterate_with(&mut observer).unwrap();
    }
    assert_eq!(sim.agent_count(), 0, "agent exits within 3 s from x=7");
    assert!(observer.take_error().is_none());
    observer.finish().unwrap();

    let trajectories = std::fs::read_to_string(dir.path().join("trajectories.csv")).unwrap();
    // Header plus one row per tick while the agent was present.
    assert!(trajectories.lines().count() > 10);
    let first_row = trajectories.lines().nth(1).unwrap();
    assert!(first_row.starts_with("0,0,0.000,7.0"));
}
