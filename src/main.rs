//! Barnacle Simulation Demo
//!
//! Spawns a creature above a few victims, runs a scripted session and
//! verifies that replaying the same inputs reproduces the same state hash.
//!
//! Usage: `barnacle-sim [config.json]`

use anyhow::{bail, Context, Result};
use glam::Vec3;
use tracing::info;
use tracing_subscriber::EnvFilter;

use barnacle_sim::{
    barnacle::{
        controllers::{HumanoidController, PlayerController, PropController},
        damage::PhysicsImpact,
        events::BarnacleEventData,
        tick::replay,
        victim::{VictimBody, VictimKind},
    },
    Barnacle, BarnacleCommand, BarnacleConfig, CreatureId, Simulation, TickInput, VictimWorld, TICK_RATE,
    VERSION,
};

/// Length of the demo session.
const DEMO_SECONDS: u32 = 45;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Barnacle Sim v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => BarnacleConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => BarnacleConfig::default(),
    };

    demo_session(config)
}

/// Scripted inputs: a faster reel-out late on, a drop, then a sawblade.
fn scripted_inputs() -> Vec<TickInput> {
    let ticks = DEMO_SECONDS * TICK_RATE;
    (0..ticks)
        .map(|t| {
            let input = TickInput::default();
            match t / TICK_RATE {
                25 if t % TICK_RATE == 0 => input.with_command(BarnacleCommand::SetDropTongueSpeed(120.0)),
                30 if t % TICK_RATE == 0 => input.with_command(BarnacleCommand::DropTongue),
                40 if t % TICK_RATE == 0 => input.with_impact(PhysicsImpact {
                    linear_speed_sq: 0.0,
                    angular_speed_sq: 400.0 * 400.0,
                    mass: 25.0,
                    falling: false,
                }),
                _ => input,
            }
        })
        .collect()
}

/// Run the demo and verify determinism.
fn demo_session(config: BarnacleConfig) -> Result<()> {
    info!("=== Starting Demo Session ===");

    let id = CreatureId::random();
    let root = Vec3::new(0.0, 0.0, 300.0);
    let barnacle = Barnacle::spawn(id, root, 0.0, 40.0, &config);
    info!("Creature {} anchored at {:?}, altitude {:.1}", id.to_uuid_string(), root, barnacle.altitude);

    let mut world = VictimWorld::new();
    world.spawn(
        VictimBody::new(VictimKind::Humanoid, Vec3::new(6.0, 4.0, 0.0), 72.0, 60.0).with_head_bone(6),
        Box::new(HumanoidController::new()),
    );
    world.spawn(
        VictimBody::new(VictimKind::Debris, Vec3::new(-10.0, 0.0, 0.0), 48.0, 30.0),
        Box::new(PropController::new()),
    );
    world.spawn(
        VictimBody::new(VictimKind::Player, Vec3::new(16.0, -3.0, 0.0), 72.0, 75.0).with_head_bone(0),
        Box::new(PlayerController::new()),
    );

    let mut sim = Simulation::new(barnacle, world, config);
    let initial = sim.clone();
    let inputs = scripted_inputs();

    info!("Running {} ticks...", inputs.len());

    let mut total_events = 0;
    for input in &inputs {
        let result = sim.step(input.clone());
        total_events += result.events.len();

        // Log important events
        for event in &result.events {
            let seconds = event.tick as f32 / TICK_RATE as f32;
            match &event.data {
                BarnacleEventData::OnGrab { victim } => {
                    info!("[{:6.2}s] grabbed victim {}", seconds, victim.0);
                }
                BarnacleEventData::OnRelease { victim, reason } => {
                    info!("[{:6.2}s] released victim {} ({:?})", seconds, victim.0, reason);
                }
                BarnacleEventData::ForcefulPull { victim } => {
                    info!("[{:6.2}s] forceful pull on victim {}", seconds, victim.0);
                }
                BarnacleEventData::VictimConsumed { victim } => {
                    info!("[{:6.2}s] consumed victim {}", seconds, victim.0);
                }
                BarnacleEventData::Killed { cause } => {
                    info!("[{:6.2}s] creature killed ({:?})", seconds, cause);
                }
                BarnacleEventData::CorpseCleanup { gib_count, spawn_gibs } => {
                    info!("[{:6.2}s] corpse cleanup, {} gibs (spawn: {})", seconds, gib_count, spawn_gibs);
                }
                _ => {}
            }
        }
    }

    // Print final results
    info!("=== Session Results ===");
    let hash = sim.barnacle.compute_hash();
    info!("Final phase: {:?}", sim.barnacle.phase);
    info!("Kills: {}", sim.barnacle.gib_count);
    info!("Victims left: {}", sim.world.len());
    info!("Total events: {}", total_events);
    info!("Final State Hash: {}", hex::encode(hash));

    let snapshot = sim.barnacle.snapshot().context("failed to snapshot creature")?;
    info!("Snapshot size: {} bytes", snapshot.len());

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replayed, _) = replay(initial, &inputs);
    let replay_hash = replayed.barnacle.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: replay hash differs");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
