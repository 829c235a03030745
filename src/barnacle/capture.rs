//! Capture State Machine
//!
//! Phase transitions of the creature and the side effects that go with
//! them. [`tick`](crate::barnacle::tick::tick) calls these in a fixed order;
//! [`advance_phase`] performs at most one transition per call.

use glam::Vec3;
use tracing::{debug, info, warn};

use crate::barnacle::animation::Activity;
use crate::barnacle::config::BarnacleConfig;
use crate::barnacle::events::{BarnacleEvent, DeathCause, ReleaseReason};
use crate::barnacle::input::{BarnacleCommand, TickInput};
use crate::barnacle::physics::PhysicsSolver;
use crate::barnacle::spring::SpringRegime;
use crate::barnacle::state::{Barnacle, CapturePhase, DeathRecord, Grip, Sensed};
use crate::barnacle::victim::{
    DanglePose, InteractionOutcome, VictimBody, VictimId, VictimInteraction, VictimKind, VictimWorld,
};

/// Height the tip must rise above its footing before the victim counts as lifted.
const LIFT_EPSILON: f32 = 0.5;

// =============================================================================
// HELPERS
// =============================================================================

/// Switch phase and record it.
pub fn set_phase(barnacle: &mut Barnacle, to: CapturePhase) {
    let from = barnacle.phase;
    if from == to {
        return;
    }
    debug!(tick = barnacle.tick, ?from, ?to, "phase change");
    barnacle.phase = to;
    barnacle.push_event(BarnacleEvent::phase_changed(barnacle.tick, from, to));
}

/// Ask the animation driver for `activity`.
pub fn request_activity(barnacle: &mut Barnacle, activity: Activity) {
    barnacle.activity = Some(activity);
    barnacle.push_event(BarnacleEvent::activity_requested(barnacle.tick, activity));
}

fn bite_activity(kind: VictimKind) -> Activity {
    match kind {
        VictimKind::Player => Activity::BitePlayer,
        VictimKind::Humanoid => Activity::BiteHuman,
        VictimKind::SmallCreature | VictimKind::Debris => Activity::BiteSmallThings,
    }
}

fn chew_activity(kind: VictimKind) -> Activity {
    if kind.is_humanoid() {
        Activity::ChewHuman
    } else {
        Activity::ChewSmallThings
    }
}

fn reset_stall(barnacle: &mut Barnacle) {
    barnacle.stuck_timer.reset();
    barnacle.stuck_yanks = 0;
}

/// Victim may be grabbed: alive, simulated, free and inside the capture
/// volume below the anchor.
pub fn is_eligible(barnacle: &Barnacle, body: &VictimBody, alive: bool, config: &BarnacleConfig) -> bool {
    if !alive || !body.simulated || body.held_by.is_some() {
        return false;
    }

    let horizontal = (body.position - barnacle.root).truncate().length();
    horizontal <= config.capture.capture_radius
        && body.position.z < barnacle.root.z
        && body.top() >= barnacle.tongue.position.z
}

/// Closest eligible victim; ties go to the lower id.
pub fn find_candidate(barnacle: &Barnacle, world: &VictimWorld, config: &BarnacleConfig) -> Option<VictimId> {
    world
        .iter()
        .filter(|(id, _)| barnacle.last_spat != Some(*id))
        .filter(|(_, v)| is_eligible(barnacle, &v.body, v.is_alive(), config))
        .map(|(id, v)| (id, (v.body.position - barnacle.root).truncate().length_squared()))
        .min_by(|(a_id, a), (b_id, b)| a.total_cmp(b).then(a_id.cmp(b_id)))
        .map(|(id, _)| id)
}

fn candidate_still_eligible(barnacle: &Barnacle, world: &VictimWorld, config: &BarnacleConfig, id: VictimId) -> bool {
    world
        .get(id)
        .is_some_and(|v| is_eligible(barnacle, &v.body, v.is_alive(), config))
}

// =============================================================================
// RELEASE / DEATH
// =============================================================================

/// Let go of the held victim, if any, without changing phase.
pub fn release_victim(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    reason: ReleaseReason,
) -> Option<VictimId> {
    let grip = barnacle.grip.take()?;
    let creature = barnacle.id;
    world.deliver(
        grip.victim,
        &VictimInteraction::Release { creature, restore_standing: grip.was_standing_before_grab },
    );
    barnacle.tongue.detach(solver);
    reset_stall(barnacle);

    debug!(tick = barnacle.tick, victim = ?grip.victim, ?reason, "victim released");
    barnacle.push_event(BarnacleEvent::on_release(barnacle.tick, grip.victim, reason));
    Some(grip.victim)
}

/// Release whatever is held and start lowering the tongue.
pub fn begin_releasing(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    reason: ReleaseReason,
) {
    release_victim(barnacle, world, solver, reason);
    barnacle.sensed = None;
    barnacle.tongue.regime = SpringRegime::Lowering;
    set_phase(barnacle, CapturePhase::Releasing);
}

/// Kill the creature. A held victim is released first.
pub fn die(barnacle: &mut Barnacle, world: &mut VictimWorld, solver: &mut dyn PhysicsSolver, cause: DeathCause) {
    if !barnacle.is_alive() {
        return;
    }

    release_victim(barnacle, world, solver, ReleaseReason::CreatureDied);
    barnacle.sensed = None;
    barnacle.tongue.regime = SpringRegime::Lowering;
    barnacle.death = Some(DeathRecord { time: barnacle.time, cause, cleaned_up: false });

    info!(tick = barnacle.tick, ?cause, gibs = barnacle.gib_count, "creature died");
    set_phase(barnacle, CapturePhase::Dead);
    barnacle.push_event(BarnacleEvent::killed(barnacle.tick, cause));
    request_activity(barnacle, Activity::Die);
}

/// Subtract `amount` from health; dies at zero. Ignored once dead.
pub fn apply_damage(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    amount: f32,
) {
    if !barnacle.is_alive() || amount.is_nan() || amount <= 0.0 {
        return;
    }

    barnacle.health -= amount;
    barnacle.push_event(BarnacleEvent::damage_taken(barnacle.tick, amount, barnacle.health));
    if barnacle.health <= 0.0 {
        die(barnacle, world, solver, DeathCause::Damage);
    }
}

// =============================================================================
// PER-TICK STEPS
// =============================================================================

/// Impacts, direct damage and scripted kills.
pub fn apply_damage_inputs(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    input: &TickInput,
    config: &BarnacleConfig,
) {
    for impact in &input.impacts {
        let damage = config.damage.impact_damage(impact);
        apply_damage(barnacle, world, solver, damage);
    }

    for command in &input.commands {
        match *command {
            BarnacleCommand::TakeDamage(amount) => apply_damage(barnacle, world, solver, amount),
            BarnacleCommand::Kill => die(barnacle, world, solver, DeathCause::Scripted),
            _ => {}
        }
    }
}

/// Drop a victim that no longer exists or was moved away from the tip.
pub fn check_victim(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    config: &BarnacleConfig,
) {
    let Some(grip) = barnacle.grip else {
        return;
    };

    let reason = match world.body(grip.victim) {
        None => ReleaseReason::Lost,
        Some(body) => {
            let drift = body.attach_point().distance(barnacle.tongue.position);
            if drift <= config.capture.teleport_tolerance {
                return;
            }
            ReleaseReason::Teleported
        }
    };

    warn!(tick = barnacle.tick, victim = ?grip.victim, ?reason, "lost hold of victim");
    begin_releasing(barnacle, world, solver, reason);
}

/// Scripted tongue commands.
pub fn apply_commands(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    input: &TickInput,
) {
    for command in &input.commands {
        match *command {
            BarnacleCommand::DropTongue => match barnacle.phase {
                CapturePhase::Idle | CapturePhase::Releasing | CapturePhase::Dead => {}
                _ => begin_releasing(barnacle, world, solver, ReleaseReason::DropTongue),
            },
            BarnacleCommand::LetGo => {
                if barnacle.grip.is_some() {
                    begin_releasing(barnacle, world, solver, ReleaseReason::LetGo);
                }
            }
            BarnacleCommand::SetDropTongueSpeed(speed) => {
                if speed.is_finite() && speed > 0.0 {
                    barnacle.drop_tongue_speed = speed;
                } else {
                    warn!(speed, "ignoring invalid drop tongue speed");
                }
            }
            BarnacleCommand::Kill | BarnacleCommand::TakeDamage(_) => {}
        }
    }
}

/// Regime and rest length for the current phase.
pub fn update_tongue_targets(barnacle: &mut Barnacle, config: &BarnacleConfig, dt: f32) {
    let lower_step = barnacle.drop_tongue_speed * dt;
    let altitude = barnacle.altitude;

    match barnacle.phase {
        CapturePhase::Idle | CapturePhase::Sensing => {
            barnacle.tongue.regime = SpringRegime::Hanging;
            barnacle.tongue.reel_toward(altitude, lower_step);
        }
        CapturePhase::Grabbing => {
            barnacle.tongue.regime = SpringRegime::Hanging;
        }
        CapturePhase::Lifting => {
            barnacle.tongue.regime = SpringRegime::Lifting;
            barnacle.tongue.reel_toward(0.0, config.capture.pull_speed * dt);
        }
        CapturePhase::Biting | CapturePhase::Chewing | CapturePhase::Digesting => {
            barnacle.tongue.regime = SpringRegime::Lifting;
        }
        CapturePhase::Releasing => {
            barnacle.tongue.regime = SpringRegime::Lowering;
            barnacle.tongue.reel_toward(altitude, lower_step);
        }
        CapturePhase::Dead => {
            let target = barnacle.dead_altitude(config);
            barnacle.tongue.regime = SpringRegime::Lowering;
            barnacle.tongue.reel_toward(target, lower_step);
        }
    }
}

/// Track the reel-in rate and yank a stalled lift once the stall lasts.
pub fn handle_stall(barnacle: &mut Barnacle, config: &BarnacleConfig, dt: f32) {
    barnacle.last_pull = barnacle.pull_speed;
    barnacle.pull_speed = barnacle.tongue.closing_speed(barnacle.root);

    if barnacle.phase != CapturePhase::Lifting {
        barnacle.stuck_timer.reset();
        return;
    }

    let capture = &config.capture;
    if barnacle.pull_speed < capture.stall_speed {
        barnacle.stuck_timer.accumulate(dt);
    } else {
        barnacle.stuck_timer.reset();
    }

    if !barnacle.stuck_timer.expired(capture.stall_time) {
        return;
    }
    barnacle.stuck_timer.reset();

    if barnacle.stuck_yanks >= capture.max_stuck_yanks {
        return;
    }
    let Some(victim) = barnacle.held_victim() else {
        return;
    };

    let axis = barnacle.tongue.axis(barnacle.root);
    barnacle.tongue.apply_impulse(axis * capture.yank_speed);
    barnacle.stuck_yanks += 1;
    debug!(tick = barnacle.tick, ?victim, yanks = barnacle.stuck_yanks, "forceful pull");
    barnacle.push_event(BarnacleEvent::forceful_pull(barnacle.tick, victim));
}

/// Pin the held victim under the tip.
pub fn pose_victim(barnacle: &Barnacle, world: &mut VictimWorld) {
    let (Some(grip), Some(attachment)) = (barnacle.grip, barnacle.tongue.attachment) else {
        return;
    };

    let tip = barnacle.tongue.position;
    let pose = DanglePose {
        position: tip - Vec3::Z * attachment.attach_offset,
        tether_axis: barnacle.tongue.axis(barnacle.root),
        lifted: tip.z > attachment.support_z + LIFT_EPSILON,
    };
    world.deliver(grip.victim, &VictimInteraction::Dangle { creature: barnacle.id, pose });
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Check the current phase's exit conditions and take at most one transition.
pub fn advance_phase(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    input: &TickInput,
    config: &BarnacleConfig,
) {
    match barnacle.phase {
        CapturePhase::Idle => {
            if barnacle.time < barnacle.cooldown_until {
                return;
            }
            if let Some(victim) = find_candidate(barnacle, world, config) {
                barnacle.sensed = Some(Sensed { victim, since: barnacle.time });
                set_phase(barnacle, CapturePhase::Sensing);
            }
        }

        CapturePhase::Sensing => {
            let Some(sensed) = barnacle.sensed else {
                set_phase(barnacle, CapturePhase::Idle);
                return;
            };
            if !candidate_still_eligible(barnacle, world, config, sensed.victim) {
                barnacle.sensed = None;
                set_phase(barnacle, CapturePhase::Idle);
                return;
            }
            if barnacle.time - sensed.since >= f64::from(config.capture.dwell_time) {
                grab(barnacle, world, solver, sensed.victim);
            }
        }

        CapturePhase::Grabbing => {
            set_phase(barnacle, CapturePhase::Lifting);
            request_activity(barnacle, Activity::Slurp);
        }

        CapturePhase::Lifting => lifting(barnacle, world, solver, config),

        CapturePhase::Biting => biting(barnacle, world, solver, input, config),

        CapturePhase::Chewing => {
            if !input.finished(Activity::is_chew) {
                return;
            }
            let Some(grip) = barnacle.grip else {
                return;
            };
            barnacle.gib_count += 1;
            let humanoid = world.body(grip.victim).is_some_and(|b| b.kind.is_humanoid());

            set_phase(barnacle, CapturePhase::Digesting);
            barnacle.push_event(BarnacleEvent::remains_spawned(barnacle.tick, grip.victim, barnacle.gib_count));
            if humanoid {
                request_activity(barnacle, Activity::BarfHuman);
            }
        }

        CapturePhase::Digesting => {
            if barnacle.time < barnacle.digest_finish_time {
                return;
            }
            let Some(grip) = barnacle.grip.take() else {
                return;
            };
            world.remove(grip.victim);
            barnacle.tongue.detach(solver);
            barnacle.tongue.regime = SpringRegime::Hanging;
            reset_stall(barnacle);
            barnacle.cooldown_until = barnacle.time + f64::from(config.capture.regrab_cooldown);

            info!(tick = barnacle.tick, victim = ?grip.victim, "victim consumed");
            set_phase(barnacle, CapturePhase::Idle);
            barnacle.push_event(BarnacleEvent::victim_consumed(barnacle.tick, grip.victim));
            request_activity(barnacle, Activity::Idle);
        }

        CapturePhase::Releasing => {
            let tongue = &barnacle.tongue;
            let lowered = tongue.rest_length >= barnacle.altitude
                && tongue.length(barnacle.root) >= barnacle.altitude - config.capture.settle_tolerance;
            if lowered {
                barnacle.tongue.regime = SpringRegime::Hanging;
                barnacle.cooldown_until = barnacle.time + f64::from(config.capture.regrab_cooldown);
                set_phase(barnacle, CapturePhase::Idle);
                request_activity(barnacle, Activity::Idle);
            }
        }

        CapturePhase::Dead => {
            let Some(death) = barnacle.death.as_mut() else {
                return;
            };
            if death.cleaned_up || barnacle.time - death.time < f64::from(config.death_settle_time) {
                return;
            }
            death.cleaned_up = true;
            let gibs = barnacle.gib_count;
            barnacle.push_event(BarnacleEvent::corpse_cleanup(barnacle.tick, gibs));
        }
    }
}

fn grab(barnacle: &mut Barnacle, world: &mut VictimWorld, solver: &mut dyn PhysicsSolver, victim: VictimId) {
    let Some(body) = world.body(victim) else {
        return;
    };
    let grip = Grip {
        victim,
        bone_index: body.head_bone,
        height_when_grabbed: body.position.z,
        was_standing_before_grab: body.standing,
        victim_killed: false,
    };
    if !barnacle.tongue.attach_to(victim, body, solver) {
        return;
    }

    barnacle.tongue.rest_length = barnacle.tongue.length(barnacle.root);
    barnacle.grip = Some(grip);
    barnacle.sensed = None;
    reset_stall(barnacle);
    world.deliver(victim, &VictimInteraction::Grab { creature: barnacle.id });

    info!(tick = barnacle.tick, ?victim, "victim grabbed");
    set_phase(barnacle, CapturePhase::Grabbing);
    barnacle.push_event(BarnacleEvent::on_grab(barnacle.tick, victim));
    request_activity(barnacle, Activity::TongueWrap);
}

fn lifting(barnacle: &mut Barnacle, world: &mut VictimWorld, solver: &mut dyn PhysicsSolver, config: &BarnacleConfig) {
    let Some(grip) = barnacle.grip else {
        return;
    };
    if barnacle.tongue.length(barnacle.root) > config.capture.bite_reach {
        return;
    }
    let Some(victim) = world.get(grip.victim) else {
        return;
    };
    let (kind, edible, alive) = (victim.body.kind, victim.body.edible, victim.is_alive());
    let poisonous = victim.body.poisonous;

    if !edible {
        debug!(tick = barnacle.tick, victim = ?grip.victim, "inedible victim, spitting");
        request_activity(barnacle, Activity::TasteSpit);
        begin_releasing(barnacle, world, solver, ReleaseReason::Spat);
        barnacle.last_spat = Some(grip.victim);
    } else if alive {
        set_phase(barnacle, CapturePhase::Biting);
        request_activity(barnacle, bite_activity(kind));
    } else {
        if let Some(grip) = barnacle.grip.as_mut() {
            grip.victim_killed = true;
        }
        if poisonous && config.poison_sensitive {
            die(barnacle, world, solver, DeathCause::Poison);
        } else {
            start_chewing(barnacle, config, kind);
        }
    }
}

fn biting(
    barnacle: &mut Barnacle,
    world: &mut VictimWorld,
    solver: &mut dyn PhysicsSolver,
    input: &TickInput,
    config: &BarnacleConfig,
) {
    let Some(grip) = barnacle.grip else {
        return;
    };
    let Some(body) = world.body(grip.victim) else {
        return;
    };
    let kind = body.kind;
    let poisonous = body.poisonous;

    if input.bite_struck() && world.is_alive(grip.victim) {
        let (damage, lethal) = if kind == VictimKind::Player {
            (config.capture.bite_damage_to_player, false)
        } else {
            (0.0, true)
        };
        let bite = VictimInteraction::Bite { creature: barnacle.id, damage, lethal };
        let outcome = world.deliver(grip.victim, &bite).unwrap_or(InteractionOutcome::Killed);
        if outcome == InteractionOutcome::Killed {
            if let Some(grip) = barnacle.grip.as_mut() {
                grip.victim_killed = true;
            }
        }
        barnacle.push_event(BarnacleEvent::victim_bitten(barnacle.tick, grip.victim, damage, outcome));
    }

    let victim_alive = world.is_alive(grip.victim);
    if !victim_alive && poisonous && config.poison_sensitive {
        die(barnacle, world, solver, DeathCause::Poison);
        return;
    }

    if input.finished(Activity::is_bite) {
        if victim_alive {
            request_activity(barnacle, bite_activity(kind));
        } else {
            start_chewing(barnacle, config, kind);
        }
    }
}

fn start_chewing(barnacle: &mut Barnacle, config: &BarnacleConfig, kind: VictimKind) {
    let jitter = barnacle.rng.next_f32_range(0.0, config.capture.chew_jitter);
    barnacle.digest_finish_time = barnacle.time + f64::from(config.capture.chew_duration + jitter);
    set_phase(barnacle, CapturePhase::Chewing);
    request_activity(barnacle, chew_activity(kind));
}
