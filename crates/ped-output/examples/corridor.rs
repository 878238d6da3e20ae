//! corridor — smallest end-to-end run of the rust_ped engine.
//!
//! Eight agents walk a 10×2 m corridor and leave through the exit on the
//! right; trajectories and door flow land in `output/corridor/`.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use ped_core::{LineSegment, Point, ProfileId, RoomId, SubRoomId, TransitionId};
use ped_geometry::{BuildingBuilder, Polygon};
use ped_model::{AgentParameters, VelocityModelBuilder};
use ped_output::{CsvWriter, SimulationWriter};
use ped_routing::{RoutingEngine, RoutingStrategy};
use ped_sim::{AgentDescription, SimulationBuilder};
use ped_stages::{StageDescription, TransitionRule};

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT: usize = 8;
const DT: f64 = 0.05;
const MAX_SECONDS: f64 = 30.0;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn main() -> Result<()> {
    println!("=== corridor — rust_ped pedestrian dynamics ===");
    println!("Agents: {AGENT_COUNT}  |  dT: {DT} s");
    println!();

    // 1. Build the geometry: one corridor subroom, exit door at x=10.
    let mut builder = BuildingBuilder::new();
    builder.add_room(RoomId(0), "corridor");
    builder.add_subroom(
        RoomId(0),
        SubRoomId(0),
        Polygon::new(vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 2.0), pt(0.0, 2.0)]),
        vec![
            LineSegment::new(pt(0.0, 0.0), pt(10.0, 0.0)),
            LineSegment::new(pt(0.0, 2.0), pt(10.0, 2.0)),
            LineSegment::new(pt(0.0, 0.0), pt(0.0, 2.0)),
        ],
    );
    builder.add_transition(
        TransitionId(0),
        LineSegment::new(pt(10.0, 0.0), pt(10.0, 2.0)),
        (RoomId(0), SubRoomId(0)),
        None,
    );
    let building = builder.build()?;

    // 2. Operational model: one profile, textbook coefficients.
    let model = VelocityModelBuilder::new(5.0, 0.1, 5.0, 0.02)
        .add_profile(ProfileId(0), AgentParameters { v0: 1.2, time_gap: 0.5, b_max: 0.15 })
        .build()?;

    // 3. Router and simulation.
    let router = RoutingEngine::new(RoutingStrategy::DoorGraph)?;
    let mut sim = SimulationBuilder::new(model, building, router, DT).build()?;

    // 4. One exit stage, one terminal journey.
    let exit = sim.add_stage(StageDescription::Exit {
        polygon: Polygon::new(vec![pt(9.0, 0.0), pt(10.0, 0.0), pt(10.0, 2.0), pt(9.0, 2.0)]),
    })?;
    let mut rules = BTreeMap::new();
    rules.insert(exit, TransitionRule::NonTransition);
    let journey = sim.add_journey(rules)?;

    // 5. Agents in two staggered columns.
    for i in 0..AGENT_COUNT {
        let col = (i % 2) as f64;
        let row = (i / 2) as f64;
        sim.add_agent(AgentDescription {
            pos: pt(0.6 + col * 0.6, 0.4 + row * 0.4),
            orientation: pt(1.0, 0.0),
            journey,
            stage: exit,
            profile: ProfileId(0),
            premovement_time: 0.0,
        })?;
    }

    // 6. Output.
    std::fs::create_dir_all("output/corridor")?;
    let writer = CsvWriter::new(Path::new("output/corridor"))?;
    let mut observer = SimulationWriter::new(writer);

    // 7. Run until the corridor is empty.
    let t0 = Instant::now();
    while sim.agent_count() > 0 && sim.elapsed_time() < MAX_SECONDS {
        sim.iterate_with(&mut observer)?;
    }
    let wall = t0.elapsed();

    if let Some(e) = observer.take_error() {
        eprintln!("output error: {e}");
    }
    observer.finish()?;

    // 8. Summary.
    println!(
        "Simulated {:.2} s in {} ticks ({:.3} s wall clock)",
        sim.elapsed_time(),
        sim.iteration(),
        wall.as_secs_f64()
    );
    for room in sim.statistics().rooms {
        match room.egress_time {
            Some(t) => println!("  room '{}' empty after {t:.2} s", room.caption),
            None => println!("  room '{}' still occupied", room.caption),
        }
    }
    println!("  trajectories: output/corridor/trajectories.csv");
    println!("  door flow:    output/corridor/door_flow.csv");

    Ok(())
}
