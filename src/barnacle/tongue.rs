//! Tongue Tip
//!
//! The mobile end of the tether. It owns the spring state (rest length and
//! regime) and at most one victim attachment, and is ticked exactly once per
//! simulation step in every phase. The tip is created with the creature and
//! reset between victims, never recreated.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::barnacle::config::{BarnacleConfig, SpringConfig};
use crate::barnacle::physics::{PhysicsSolver, TetherConstraint, TipBody};
use crate::barnacle::spring::{closing_speed, LiftLoad, SpringModel, SpringRegime};
use crate::barnacle::victim::{VictimBody, VictimId};

/// Victim bound to the tip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TipAttachment {
    /// Held victim.
    pub victim: VictimId,
    /// Skeletal bone the tongue wraps; `None` for the centre of mass.
    pub bone_index: Option<u32>,
    /// Victim mass added to the load.
    pub victim_mass: f32,
    /// Height of the attachment above the victim's feet.
    pub attach_offset: f32,
    /// Tip height while the victim still stands on its footing.
    pub support_z: f32,
}

/// Mobile tether endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TongueTip {
    /// World position.
    pub position: Vec3,
    /// World velocity.
    pub velocity: Vec3,
    /// Spring rest length.
    pub rest_length: f32,
    /// Active stiffness regime.
    pub regime: SpringRegime,
    /// Attached victim.
    pub attachment: Option<TipAttachment>,
}

impl TongueTip {
    /// Detached, hanging tip at `position`.
    pub fn new(position: Vec3, rest_length: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            rest_length,
            regime: SpringRegime::Hanging,
            attachment: None,
        }
    }

    /// A victim is attached.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Bind the tip to `victim`.
    ///
    /// The tip jumps to the victim's attachment point (head bone, or centre
    /// of mass without a skeleton) and the tether constraint is registered
    /// with the solver. Returns `false` without changes if already attached.
    pub fn attach_to(
        &mut self,
        victim: VictimId,
        body: &VictimBody,
        solver: &mut dyn PhysicsSolver,
    ) -> bool {
        if let Some(current) = self.attachment {
            warn!(?victim, held = ?current.victim, "tongue already attached, ignoring attach");
            return false;
        }

        let attach_offset = body.attach_offset();
        self.position = body.attach_point();
        self.velocity = Vec3::ZERO;

        let attachment = TipAttachment {
            victim,
            bone_index: body.head_bone,
            victim_mass: body.mass,
            attach_offset,
            support_z: self.position.z,
        };
        solver.attach_constraint(TetherConstraint { victim, support_z: attachment.support_z });
        self.attachment = Some(attachment);
        true
    }

    /// Register the current attachment with `solver`, replacing whatever it
    /// held. Needed after restoring a snapshot into a fresh solver.
    pub fn sync_constraint(&self, solver: &mut dyn PhysicsSolver) {
        match self.attachment {
            Some(a) => solver.attach_constraint(TetherConstraint { victim: a.victim, support_z: a.support_z }),
            None => solver.remove_constraint(),
        }
    }

    /// Unbind the victim. Safe to call when nothing is attached.
    pub fn detach(&mut self, solver: &mut dyn PhysicsSolver) -> Option<TipAttachment> {
        let attachment = self.attachment.take()?;
        solver.remove_constraint();
        Some(attachment)
    }

    /// What the spring is moving.
    pub fn load(&self, spring: &SpringConfig) -> LiftLoad {
        LiftLoad {
            tip_mass: spring.tip_mass,
            victim_mass: self.attachment.map_or(0.0, |a| a.victim_mass),
            max_lift_mass: spring.max_lift_mass,
        }
    }

    /// Current tether length.
    #[inline]
    pub fn length(&self, root: Vec3) -> f32 {
        root.distance(self.position)
    }

    /// Speed at which the tip approaches the root.
    #[inline]
    pub fn closing_speed(&self, root: Vec3) -> f32 {
        closing_speed(root, self.position, self.velocity)
    }

    /// Unit vector from the tip toward the root.
    #[inline]
    pub fn axis(&self, root: Vec3) -> Vec3 {
        (root - self.position).normalize_or_zero()
    }

    /// Move the rest length toward `target` by at most `step`.
    pub fn reel_toward(&mut self, target: f32, step: f32) {
        let delta = target - self.rest_length;
        if delta.abs() <= step {
            self.rest_length = target;
        } else {
            self.rest_length += step.copysign(delta);
        }
        self.rest_length = self.rest_length.max(0.0);
    }

    /// Instant velocity change that bypasses the spring.
    pub fn apply_impulse(&mut self, delta_velocity: Vec3) {
        self.velocity += delta_velocity;
    }

    /// Compute the spring force for the active regime and integrate it.
    pub fn tick(&mut self, dt: f32, root: Vec3, config: &BarnacleConfig, solver: &mut dyn PhysicsSolver) {
        let load = self.load(&config.spring);
        let spring = SpringModel::for_regime(self.regime, &config.spring, load.total_mass());
        let force = spring.force(
            root,
            self.position,
            self.velocity,
            self.rest_length,
            load.max_tension(config.gravity),
        );

        let mut body = TipBody {
            position: self.position,
            velocity: self.velocity,
            mass: load.total_mass(),
        };
        solver.integrate(&mut body, force, dt);

        self.position = body.position;
        self.velocity = body.velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barnacle::physics::EulerSolver;
    use crate::barnacle::victim::VictimKind;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;
    const ROOT: Vec3 = Vec3::new(0.0, 0.0, 400.0);

    fn solver() -> EulerSolver {
        EulerSolver::new(600.0, 0.0)
    }

    fn victim(mass: f32) -> VictimBody {
        VictimBody::new(VictimKind::Humanoid, Vec3::ZERO, 72.0, mass).with_head_bone(1)
    }

    /// Attach a victim standing on the floor and reel for `ticks` steps.
    fn lift(mass: f32, ticks: u32) -> TongueTip {
        let config = BarnacleConfig::default();
        let mut solver = solver();
        let mut tip = TongueTip::new(Vec3::new(0.0, 0.0, 100.0), 300.0);
        assert!(tip.attach_to(VictimId(0), &victim(mass), &mut solver));
        tip.regime = SpringRegime::Lifting;
        tip.rest_length = tip.length(ROOT);
        for _ in 0..ticks {
            tip.reel_toward(0.0, config.capture.pull_speed * DT);
            tip.tick(DT, ROOT, &config, &mut solver);
        }
        tip
    }

    #[test]
    fn test_hanging_tip_settles_below_rest() {
        let config = BarnacleConfig::default();
        let mut solver = solver();
        let mut tip = TongueTip::new(ROOT - Vec3::Z * 200.0, 200.0);
        for _ in 0..600 {
            tip.tick(DT, ROOT, &config, &mut solver);
        }
        // sag = m·g / k
        let sag = config.spring.tip_mass * config.gravity / config.spring.hanging_stiffness;
        assert!((tip.length(ROOT) - (200.0 + sag)).abs() < 0.5);
        assert!(tip.velocity.length() < 0.5);
    }

    #[test]
    fn test_double_attach_is_noop() {
        let mut solver = solver();
        let mut tip = TongueTip::new(Vec3::new(0.0, 0.0, 100.0), 300.0);
        assert!(tip.attach_to(VictimId(0), &victim(50.0), &mut solver));
        let before = tip.clone();
        assert!(!tip.attach_to(VictimId(1), &victim(20.0), &mut solver));
        assert_eq!(tip, before);
        assert_eq!(solver.constraint().map(|c| c.victim), Some(VictimId(0)));
    }

    #[test]
    fn test_detach_is_idempotent() {
        let mut solver = solver();
        let mut tip = TongueTip::new(Vec3::new(0.0, 0.0, 100.0), 300.0);
        tip.attach_to(VictimId(0), &victim(50.0), &mut solver);

        assert!(tip.detach(&mut solver).is_some());
        let after_first = tip.clone();
        assert!(tip.detach(&mut solver).is_none());
        assert_eq!(tip, after_first);
        assert!(solver.constraint().is_none());
        assert_eq!(tip.load(&SpringConfig::default()).victim_mass, 0.0);
    }

    #[test]
    fn test_sync_constraint_into_fresh_solver() {
        let mut solver = solver();
        let mut tip = TongueTip::new(Vec3::new(0.0, 0.0, 100.0), 300.0);
        tip.attach_to(VictimId(4), &victim(50.0), &mut solver);

        let mut fresh = EulerSolver::new(600.0, 0.0);
        tip.sync_constraint(&mut fresh);
        assert_eq!(fresh.constraint(), solver.constraint());

        tip.detach(&mut solver);
        tip.sync_constraint(&mut fresh);
        assert!(fresh.constraint().is_none());
    }

    #[test]
    fn test_light_victim_is_lifted() {
        let tip = lift(60.0, 240);
        assert!(tip.position.z > 72.0 + 100.0);
    }

    #[test]
    fn test_heavy_victim_stays_on_floor() {
        let tip = lift(80.0, 600);
        assert_eq!(tip.position.z, 72.0);
    }

    #[test]
    fn test_reel_toward_clamps() {
        let mut tip = TongueTip::new(Vec3::ZERO, 10.0);
        tip.reel_toward(0.0, 4.0);
        assert_eq!(tip.rest_length, 6.0);
        tip.reel_toward(0.0, 40.0);
        assert_eq!(tip.rest_length, 0.0);
        tip.reel_toward(12.0, 5.0);
        assert_eq!(tip.rest_length, 5.0);
        tip.reel_toward(-3.0, 100.0);
        assert_eq!(tip.rest_length, 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_capped_lift_never_beats_max_lift_mass(mass in 70.5f32..400.0, ticks in 1u32..300) {
            let reference = lift(70.0, ticks);
            let heavy = lift(mass, ticks);
            prop_assert!(heavy.position.z <= reference.position.z);
        }
    }
}
