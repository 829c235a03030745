//! Creature Simulation Tick
//!
//! The fixed-order step that advances one creature. Every step runs the
//! same sequence regardless of phase, so a replay of the same inputs
//! reproduces the same state hash.

use glam::Vec3;

use crate::barnacle::animation::TimedAnimator;
use crate::barnacle::capture;
use crate::barnacle::config::BarnacleConfig;
use crate::barnacle::events::BarnacleEvent;
use crate::barnacle::input::TickInput;
use crate::barnacle::physics::{EulerSolver, PhysicsSolver};
use crate::barnacle::state::{Barnacle, CapturePhase, SnapshotError};
use crate::barnacle::victim::VictimWorld;
use crate::TICK_RATE;

/// Most tongue integration steps a single tick is split into.
pub const MAX_SUBSTEPS: u32 = 60;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, ordered by priority
    pub events: Vec<BarnacleEvent>,
    /// Phase after the tick
    pub phase: CapturePhase,
    /// Whether the phase changed this tick
    pub transitioned: bool,
}

/// Run one simulation step.
///
/// # Order
///
/// 1. advance the clock
/// 2. impacts, direct damage and scripted kills
/// 3. re-validate the held victim
/// 4. tongue commands
/// 5. spring force and integration of the tip, sub-stepped for long `dt`
/// 6. stall tracking and forceful pull
/// 7. pin the held victim under the tip
/// 8. at most one phase transition, if none happened yet
/// 9. replicated fields
pub fn tick(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    input: &TickInput,
    config: &BarnacleConfig,
) -> TickResult {
    let dt = input.dt.max(0.0);

    // 1. Advance clock
    barnacle.tick += 1;
    barnacle.time += f64::from(dt);
    let phase_at_start = barnacle.phase;

    // 2. Damage
    capture::apply_damage_inputs(barnacle, world, solver, input, config);

    // 3. Victim validity
    capture::check_victim(barnacle, world, solver, config);

    // 4. Commands
    capture::apply_commands(barnacle, world, solver, input);

    // 5. Tongue
    capture::update_tongue_targets(barnacle, config, dt);
    let root = barnacle.root;
    let substeps = substep_count(dt);
    let h = dt / substeps as f32;
    for _ in 0..substeps {
        barnacle.tongue.tick(h, root, config, solver);
    }

    // 6. Stall
    capture::handle_stall(barnacle, config, dt);

    // 7. Victim pose
    capture::pose_victim(barnacle, world);

    // 8. Transition
    if barnacle.phase == phase_at_start {
        capture::advance_phase(barnacle, world, solver, input, config);
    }

    // 9. Replicated fields
    update_replicated(barnacle, config);

    debug_assert!(barnacle.grip_consistent(), "grip does not match phase {:?}", barnacle.phase);

    let mut events = barnacle.take_events();
    events.sort_by_key(BarnacleEvent::sort_key);

    TickResult {
        events,
        phase: barnacle.phase,
        transitioned: barnacle.phase != phase_at_start,
    }
}

/// Integration steps for `dt`: one per nominal tick, capped at [`MAX_SUBSTEPS`].
fn substep_count(dt: f32) -> u32 {
    let ticks = (dt * TICK_RATE as f32 - 1e-3).ceil();
    (ticks as u32).clamp(1, MAX_SUBSTEPS)
}

fn update_replicated(barnacle: &mut Barnacle, config: &BarnacleConfig) {
    barnacle.tip = barnacle.tongue.position;
    barnacle.tip_draw_offset = match barnacle.phase {
        CapturePhase::Idle | CapturePhase::Sensing => {
            let angle = std::f64::consts::TAU * f64::from(config.sway_frequency) * barnacle.time
                + f64::from(barnacle.sway_phase);
            Vec3::new(angle.sin() as f32, angle.cos() as f32, 0.0) * config.sway_amplitude
        }
        _ => Vec3::ZERO,
    };
}

// =============================================================================
// SIMULATION HARNESS
// =============================================================================

/// Creature, victims, solver and animator stepped together.
#[derive(Clone, Debug)]
pub struct Simulation<S = EulerSolver> {
    /// The creature
    pub barnacle: Barnacle,
    /// Victims it can see
    pub world: VictimWorld,
    /// Tip integrator
    pub solver: S,
    /// Animation stand-in
    pub animator: TimedAnimator,
    /// Configuration
    pub config: BarnacleConfig,
}

impl Simulation<EulerSolver> {
    /// Harness with the built-in solver on the creature's floor.
    pub fn new(barnacle: Barnacle, world: VictimWorld, config: BarnacleConfig) -> Self {
        let solver = EulerSolver::new(config.gravity, barnacle.ground_z);
        Self::with_solver(barnacle, world, solver, config)
    }

    /// Harness around a creature decoded from a snapshot.
    pub fn restore(bytes: &[u8], world: VictimWorld, config: BarnacleConfig) -> Result<Self, SnapshotError> {
        Ok(Self::new(Barnacle::restore(bytes)?, world, config))
    }
}

impl<S: PhysicsSolver> Simulation<S> {
    /// Harness with a host-supplied solver.
    ///
    /// The solver picks up the creature's tether constraint, so a creature
    /// restored mid-capture keeps its victim's footing.
    pub fn with_solver(barnacle: Barnacle, world: VictimWorld, mut solver: S, config: BarnacleConfig) -> Self {
        barnacle.tongue.sync_constraint(&mut solver);
        Self { barnacle, world, solver, animator: TimedAnimator::new(), config }
    }

    /// Advance the animator, tick the creature, start requested activities.
    pub fn step(&mut self, mut input: TickInput) -> TickResult {
        input.triggers.extend(self.animator.advance(input.dt));

        let result = tick(&mut self.barnacle, &mut self.world, &mut self.solver, &input, &self.config);

        for activity in result.events.iter().filter_map(BarnacleEvent::requested_activity) {
            self.animator.play(activity);
        }
        result
    }

    /// Step `ticks` times with no commands.
    pub fn run(&mut self, ticks: u32) -> Vec<BarnacleEvent> {
        (0..ticks).flat_map(|_| self.step(TickInput::default()).events).collect()
    }
}

/// Replay recorded inputs from a starting simulation.
///
/// Returns the final simulation and all events.
pub fn replay<S: PhysicsSolver>(initial: Simulation<S>, inputs: &[TickInput]) -> (Simulation<S>, Vec<BarnacleEvent>) {
    let mut sim = initial;
    let mut all_events = Vec::new();

    for input in inputs {
        let result = sim.step(input.clone());
        all_events.extend(result.events);
    }

    (sim, all_events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barnacle::controllers::{HumanoidController, PlayerController, PropController};
    use crate::barnacle::damage::PhysicsImpact;
    use crate::barnacle::events::{BarnacleEventData, DeathCause, ReleaseReason};
    use crate::barnacle::input::BarnacleCommand;
    use crate::barnacle::state::CreatureId;
    use crate::barnacle::victim::{VictimBody, VictimId, VictimKind};
    use proptest::prelude::*;

    const ROOT: Vec3 = Vec3::new(0.0, 0.0, 300.0);

    fn sim() -> Simulation {
        let config = BarnacleConfig::default();
        let barnacle = Barnacle::spawn(CreatureId::new([5; 16]), ROOT, 0.0, 40.0, &config);
        Simulation::new(barnacle, VictimWorld::new(), config)
    }

    fn player() -> VictimBody {
        VictimBody::new(VictimKind::Player, Vec3::ZERO, 72.0, 60.0).with_head_bone(0)
    }

    fn humanoid(mass: f32) -> VictimBody {
        VictimBody::new(VictimKind::Humanoid, Vec3::ZERO, 72.0, mass).with_head_bone(6)
    }

    /// Step until `phase` is reached; panics after `limit` ticks.
    fn run_until(sim: &mut Simulation, phase: CapturePhase, limit: u32) -> Vec<BarnacleEvent> {
        let mut events = Vec::new();
        for _ in 0..limit {
            events.extend(sim.step(TickInput::default()).events);
            if sim.barnacle.phase == phase {
                return events;
            }
        }
        panic!("never reached {phase:?}, stuck in {:?}", sim.barnacle.phase);
    }

    fn count(events: &[BarnacleEvent], pred: impl Fn(&BarnacleEventData) -> bool) -> usize {
        events.iter().filter(|e| pred(&e.data)).count()
    }

    fn entered(events: &[BarnacleEvent], phase: CapturePhase) -> bool {
        events
            .iter()
            .any(|e| matches!(e.data, BarnacleEventData::PhaseChanged { to, .. } if to == phase))
    }

    #[test]
    fn test_victim_grabbed_after_dwell() {
        let mut sim = sim();
        let id = sim.world.spawn(player(), Box::new(PlayerController::new()));

        // dwell of one second, well past the minimum
        let events = sim.run(60);

        assert!(entered(&events, CapturePhase::Grabbing));
        assert_eq!(count(&events, |d| matches!(d, BarnacleEventData::OnGrab { .. })), 1);
        let player = sim.world.get(id).unwrap().controller_as::<PlayerController>().unwrap();
        assert_eq!(player.grabs, 1);
        assert!(player.input_suspended);
    }

    #[test]
    fn test_no_grab_before_dwell() {
        let mut sim = sim();
        sim.world.spawn(player(), Box::new(PlayerController::new()));
        let events = sim.run(20);
        assert!(entered(&events, CapturePhase::Sensing));
        assert!(!entered(&events, CapturePhase::Grabbing));
    }

    #[test]
    fn test_heavy_victim_never_reaches_mouth() {
        let mut sim = sim();
        let id = sim.world.spawn(humanoid(80.0), Box::new(HumanoidController::new()));
        run_until(&mut sim, CapturePhase::Lifting, 120);

        let mut events = Vec::new();
        for _ in 0..1200 {
            events.extend(sim.step(TickInput::default()).events);
            assert_eq!(sim.barnacle.phase, CapturePhase::Lifting);
            assert!(sim.barnacle.tongue.length(ROOT) > sim.config.capture.bite_reach);
        }

        assert!(!entered(&events, CapturePhase::Biting));
        assert_eq!(count(&events, |d| matches!(d, BarnacleEventData::ForcefulPull { .. })), 1);
        assert_eq!(sim.barnacle.stuck_yanks, 1);
        assert!(sim.barnacle.stuck_timer.elapsed() < sim.config.capture.stall_time);
        // settled back on its feet
        assert!((sim.barnacle.tip.z - 72.0).abs() < 1e-3);
        assert!(!sim.world.body(id).unwrap().is_dangling);
    }

    #[test]
    fn test_drop_tongue_while_chewing() {
        let mut sim = sim();
        let id = sim.world.spawn(humanoid(60.0), Box::new(HumanoidController::new()));
        run_until(&mut sim, CapturePhase::Chewing, 1200);

        let result = sim.step(TickInput::default().with_command(BarnacleCommand::DropTongue));
        assert_eq!(result.phase, CapturePhase::Releasing);
        assert!(result.events.iter().any(|e| e.data
            == BarnacleEventData::OnRelease { victim: id, reason: ReleaseReason::DropTongue }));

        let body = sim.world.body(id).unwrap();
        assert_eq!(body.held_by, None);
        assert!(!body.is_dangling);
        let npc = sim.world.get(id).unwrap().controller_as::<HumanoidController>().unwrap();
        assert!(!npc.struggling);

        let events = run_until(&mut sim, CapturePhase::Idle, 600);
        assert!(!entered(&events, CapturePhase::Digesting));
        assert_eq!(sim.barnacle.gib_count, 0);
    }

    #[test]
    fn test_victim_removed_while_lifting() {
        let mut sim = sim();
        let id = sim.world.spawn(player(), Box::new(PlayerController::new()));
        run_until(&mut sim, CapturePhase::Lifting, 120);

        sim.world.remove(id);
        let result = sim.step(TickInput::default());
        assert_eq!(result.phase, CapturePhase::Releasing);
        assert!(result.events.iter().any(|e| e.data
            == BarnacleEventData::OnRelease { victim: id, reason: ReleaseReason::Lost }));
        assert!(!sim.barnacle.tongue.is_attached());

        run_until(&mut sim, CapturePhase::Idle, 600);
        assert!(sim.barnacle.cooldown_until > sim.barnacle.time - 1.0 / 60.0);
    }

    #[test]
    fn test_player_eaten_full_cycle() {
        let mut sim = sim();
        let id = sim.world.spawn(player(), Box::new(PlayerController::new()));
        let events = run_until(&mut sim, CapturePhase::Idle, 60 * 30);

        let bites = count(&events, |d| matches!(d, BarnacleEventData::VictimBitten { .. }));
        assert_eq!(bites, 7);
        for phase in [CapturePhase::Biting, CapturePhase::Chewing, CapturePhase::Digesting] {
            assert!(entered(&events, phase), "missed {phase:?}");
        }
        assert!(events.iter().any(|e| e.data == BarnacleEventData::VictimConsumed { victim: id }));
        assert!(events.iter().any(|e| e.data == BarnacleEventData::RemainsSpawned { victim: id, gib_count: 1 }));
        assert!(!sim.world.contains(id));
        assert_eq!(sim.barnacle.gib_count, 1);
        assert!(sim.barnacle.grip.is_none());

        // cooldown then quiet: nothing left to sense
        let later = sim.run(300);
        assert!(!entered(&later, CapturePhase::Sensing));
    }

    #[test]
    fn test_victim_killed_mid_lift_is_chewed_without_bite() {
        let mut sim = sim();
        let id = sim.world.spawn(humanoid(60.0), Box::new(HumanoidController::new()));
        run_until(&mut sim, CapturePhase::Lifting, 120);

        assert!(sim.world.destroy(id));
        let events = run_until(&mut sim, CapturePhase::Chewing, 1200);
        assert!(!entered(&events, CapturePhase::Biting));
        assert_eq!(count(&events, |d| matches!(d, BarnacleEventData::VictimBitten { .. })), 0);
        assert!(sim.barnacle.grip.is_some_and(|g| g.victim_killed));
    }

    #[test]
    fn test_poisonous_meal_kills_creature() {
        let mut sim = sim();
        sim.world.spawn(humanoid(60.0).poisonous(), Box::new(HumanoidController::new()));
        let events = run_until(&mut sim, CapturePhase::Dead, 1200);

        assert!(events.iter().any(|e| e.data == BarnacleEventData::Killed { cause: DeathCause::Poison }));
        assert!(events.iter().any(|e| matches!(
            e.data,
            BarnacleEventData::OnRelease { reason: ReleaseReason::CreatureDied, .. }
        )));
        assert!(sim.barnacle.grip.is_none());

        let later = sim.run(180);
        let cleanups: Vec<_> = later
            .iter()
            .filter(|e| matches!(e.data, BarnacleEventData::CorpseCleanup { .. }))
            .collect();
        assert_eq!(cleanups.len(), 1);
        assert_eq!(cleanups[0].data, BarnacleEventData::CorpseCleanup { gib_count: 0, spawn_gibs: false });

        // tongue lowers toward the dead altitude
        let dead_altitude = sim.barnacle.dead_altitude(&sim.config);
        assert_eq!(sim.barnacle.tongue.rest_length, dead_altitude);
    }

    #[test]
    fn test_poison_tolerant_creature_eats_anything() {
        let mut sim = sim();
        sim.config.poison_sensitive = false;
        sim.world.spawn(humanoid(60.0).poisonous(), Box::new(HumanoidController::new()));
        let events = run_until(&mut sim, CapturePhase::Chewing, 1200);
        assert!(!entered(&events, CapturePhase::Dead));
    }

    #[test]
    fn test_inedible_victim_spat_out() {
        let mut sim = sim();
        let id = sim.world.spawn(
            VictimBody::new(VictimKind::Debris, Vec3::ZERO, 48.0, 30.0),
            Box::new(PropController::new()),
        );
        let events = run_until(&mut sim, CapturePhase::Releasing, 1200);

        assert!(events.iter().any(|e| e.data
            == BarnacleEventData::OnRelease { victim: id, reason: ReleaseReason::Spat }));
        assert_eq!(sim.barnacle.activity, Some(crate::barnacle::animation::Activity::TasteSpit));
        assert!(!entered(&events, CapturePhase::Biting));
        let prop = sim.world.get(id).unwrap().controller_as::<PropController>().unwrap();
        assert!(!prop.held);
    }

    #[test]
    fn test_sawblade_impact_kills() {
        let mut sim = sim();
        let impact = PhysicsImpact { linear_speed_sq: 0.0, angular_speed_sq: 400.0 * 400.0, mass: 20.0, falling: false };
        let result = sim.step(TickInput::default().with_impact(impact));

        assert_eq!(result.phase, CapturePhase::Dead);
        assert_eq!(sim.barnacle.death.map(|d| d.cause), Some(DeathCause::Damage));
        assert!(result.events.iter().any(|e| matches!(e.data, BarnacleEventData::DamageTaken { amount, .. } if amount == 500.0)));
    }

    #[test]
    fn test_kill_while_holding_releases_first() {
        let mut sim = sim();
        let id = sim.world.spawn(player(), Box::new(PlayerController::new()));
        run_until(&mut sim, CapturePhase::Lifting, 120);

        let result = sim.step(TickInput::default().with_command(BarnacleCommand::Kill));
        assert_eq!(result.phase, CapturePhase::Dead);
        assert!(result.transitioned);
        assert_eq!(sim.world.body(id).unwrap().held_by, None);

        // death first in priority order
        assert_eq!(result.events[0].data, BarnacleEventData::Killed { cause: DeathCause::Scripted });

        // dead is terminal
        let later = sim.run(600);
        assert!(later
            .iter()
            .all(|e| !matches!(e.data, BarnacleEventData::PhaseChanged { .. })));
    }

    #[test]
    fn test_idle_sway_replicated() {
        let mut sim = sim();
        sim.run(30);
        let replicated = sim.barnacle.replicated();
        assert_eq!(replicated.altitude, 260.0);
        assert_eq!(replicated.tip, sim.barnacle.tongue.position);
        let sway = replicated.tip_draw_offset.truncate().length();
        assert!((sway - sim.config.sway_amplitude).abs() < 1e-3);
    }

    #[test]
    fn test_snapshot_restore_reproduces_outputs() {
        let mut original = sim();
        original.world.spawn(player(), Box::new(PlayerController::new()));
        original.run(150);

        let bytes = original.barnacle.snapshot().unwrap();
        let mut restored = Simulation::restore(&bytes, original.world.clone(), original.config.clone()).unwrap();
        // animation playback belongs to the host, not the creature
        restored.animator = original.animator.clone();

        let inputs: Vec<TickInput> = (0..600)
            .map(|t| {
                let input = TickInput::default();
                if t == 400 {
                    input.with_command(BarnacleCommand::TakeDamage(5.0))
                } else {
                    input
                }
            })
            .collect();

        let (a, events_a) = replay(original, &inputs);
        let (b, events_b) = replay(restored.clone(), &inputs);
        assert_eq!(events_a, events_b);
        assert_eq!(a.barnacle.compute_hash(), b.barnacle.compute_hash());

        restored.run(1);
        assert_ne!(restored.barnacle.compute_hash(), b.barnacle.compute_hash());
    }

    #[test]
    fn test_restore_mid_lift_keeps_victim_footing() {
        let mut original = sim();
        original.world.spawn(humanoid(80.0), Box::new(HumanoidController::new()));
        run_until(&mut original, CapturePhase::Lifting, 120);
        original.run(30);

        let bytes = original.barnacle.snapshot().unwrap();
        let mut restored = Simulation::restore(&bytes, original.world.clone(), original.config.clone()).unwrap();
        assert_eq!(restored.solver.constraint(), original.solver.constraint());

        original.run(60);
        restored.run(60);
        assert_eq!(restored.barnacle.tip, original.barnacle.tip);
        // tether support keeps the tip on the victim's footing
        assert!(restored.barnacle.tip.z >= 72.0 - 1e-3);
        assert_eq!(restored.barnacle.compute_hash(), original.barnacle.compute_hash());
    }

    #[test]
    fn test_restore_idle_clears_stale_constraint() {
        let mut original = sim();
        original.world.spawn(player(), Box::new(PlayerController::new()));
        run_until(&mut original, CapturePhase::Lifting, 120);
        let bytes = sim().barnacle.snapshot().unwrap();

        let restored = Simulation::with_solver(
            Barnacle::restore(&bytes).unwrap(),
            VictimWorld::new(),
            original.solver.clone(),
            BarnacleConfig::default(),
        );
        assert!(original.solver.constraint().is_some());
        assert!(restored.solver.constraint().is_none());
    }

    #[test]
    fn test_long_step_is_substepped() {
        let mut coarse = sim();
        for _ in 0..5 {
            coarse.step(TickInput::new(1.0));
        }
        let mut fine = sim();
        fine.run(300);

        let tip = coarse.barnacle.tip;
        assert!(tip.is_finite());
        assert!(tip.z > 0.0 && tip.z < ROOT.z);
        assert!((tip.z - fine.barnacle.tip.z).abs() < 1.0);
        assert!(coarse.barnacle.tongue.velocity.length() < 1.0);
        assert_eq!(substep_count(1.0 / 60.0), 1);
        assert_eq!(substep_count(0.0), 1);
        assert_eq!(substep_count(10.0), MAX_SUBSTEPS);
    }

    #[test]
    fn test_drop_speed_changes_release_time() {
        let ticks_to_idle = |speed: f32| {
            let mut sim = sim();
            sim.world.spawn(player(), Box::new(PlayerController::new()));
            run_until(&mut sim, CapturePhase::Lifting, 120);
            run_until(&mut sim, CapturePhase::Biting, 1200);
            sim.step(
                TickInput::default()
                    .with_command(BarnacleCommand::SetDropTongueSpeed(speed))
                    .with_command(BarnacleCommand::DropTongue),
            );
            assert_eq!(sim.barnacle.phase, CapturePhase::Releasing);
            let start = sim.barnacle.tick;
            run_until(&mut sim, CapturePhase::Idle, 60 * 30);
            sim.barnacle.tick - start
        };

        let slow = ticks_to_idle(40.0);
        let fast = ticks_to_idle(160.0);
        assert!(fast < slow, "fast {fast} slow {slow}");
        // roughly 230 units of tongue at 40 u/s
        assert!(slow > 5 * 60);
    }

    #[test]
    fn test_poisonous_victim_killed_mid_lift_kills_creature() {
        let mut sim = sim();
        let id = sim.world.spawn(humanoid(60.0).poisonous(), Box::new(HumanoidController::new()));
        run_until(&mut sim, CapturePhase::Lifting, 120);

        sim.world.destroy(id);
        let events = run_until(&mut sim, CapturePhase::Dead, 1200);
        assert!(!entered(&events, CapturePhase::Chewing));
        assert!(events.iter().any(|e| e.data == BarnacleEventData::Killed { cause: DeathCause::Poison }));
        assert_eq!(sim.barnacle.gib_count, 0);
    }

    #[test]
    fn test_spat_victim_grabbed_once() {
        let mut sim = sim();
        let id = sim.world.spawn(
            VictimBody::new(VictimKind::Debris, Vec3::ZERO, 48.0, 30.0),
            Box::new(PropController::new()),
        );
        let events = sim.run(60 * 60);

        assert_eq!(count(&events, |d| matches!(d, BarnacleEventData::OnGrab { .. })), 1);
        assert_eq!(
            count(&events, |d| matches!(d, BarnacleEventData::OnRelease { reason: ReleaseReason::Spat, .. })),
            1
        );
        assert_eq!(sim.barnacle.last_spat, Some(id));
        assert_eq!(sim.barnacle.phase, CapturePhase::Idle);

        // something new still gets sensed
        let other = sim.world.spawn(player(), Box::new(PlayerController::new()));
        run_until(&mut sim, CapturePhase::Grabbing, 120);
        assert_eq!(sim.barnacle.held_victim(), Some(other));
    }

    #[test]
    fn test_tick_determinism() {
        let build = || {
            let mut s = sim();
            s.world.spawn(humanoid(60.0), Box::new(HumanoidController::new()));
            s.world.spawn(
                VictimBody::new(VictimKind::SmallCreature, Vec3::new(15.0, 0.0, 0.0), 40.0, 8.0),
                Box::new(HumanoidController::new()),
            );
            s
        };
        let (a, events_a) = replay(build(), &vec![TickInput::default(); 900]);
        let (b, events_b) = replay(build(), &vec![TickInput::default(); 900]);
        assert_eq!(events_a, events_b);
        assert_eq!(a.barnacle.compute_hash(), b.barnacle.compute_hash());
    }

    fn command() -> impl Strategy<Value = Option<BarnacleCommand>> {
        prop_oneof![
            20 => Just(None),
            1 => Just(Some(BarnacleCommand::DropTongue)),
            1 => Just(Some(BarnacleCommand::LetGo)),
            1 => (10.0f32..200.0).prop_map(|s| Some(BarnacleCommand::SetDropTongueSpeed(s))),
            1 => (0.0f32..3.0).prop_map(|d| Some(BarnacleCommand::TakeDamage(d))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_grip_matches_phase(
            commands in proptest::collection::vec(command(), 900),
            remove_at in proptest::option::of(0usize..900),
        ) {
            let mut sim = sim();
            let victim = sim.world.spawn(player(), Box::new(PlayerController::new()));

            for (t, command) in commands.into_iter().enumerate() {
                if remove_at == Some(t) {
                    sim.world.remove(victim);
                }
                let mut input = TickInput::default();
                input.commands.extend(command);
                sim.step(input);

                let b = &sim.barnacle;
                prop_assert_eq!(b.phase.holds_victim(), b.grip.is_some());
                prop_assert_eq!(b.grip.is_some(), b.tongue.is_attached());
                if matches!(b.phase, CapturePhase::Idle | CapturePhase::Dead) {
                    prop_assert!(b.grip.is_none());
                }
                let held = sim.world.body(victim).and_then(|body| body.held_by).is_some();
                prop_assert_eq!(held, b.held_victim() == Some(victim));
            }
        }
    }

    #[test]
    fn test_stale_id_never_reattached() {
        let mut sim = sim();
        let first = sim.world.spawn(player(), Box::new(PlayerController::new()));
        run_until(&mut sim, CapturePhase::Lifting, 120);
        sim.world.remove(first);
        let second = sim.world.spawn(player(), Box::new(PlayerController::new()));
        assert_eq!(second, VictimId(1));

        run_until(&mut sim, CapturePhase::Releasing, 5);
        run_until(&mut sim, CapturePhase::Grabbing, 60 * 10);
        assert_eq!(sim.barnacle.held_victim(), Some(second));
    }
}
