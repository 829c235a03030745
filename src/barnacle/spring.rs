//! Tongue Spring Model
//!
//! Damped spring between the fixed root and the mobile tip. The scalar
//! tension is `k·(d − L) − c·v`, where `v` is the closing speed of the tip
//! toward the root. The force points from the tip to the root; a tongue can
//! pull but never push, so tension is clamped at zero.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::barnacle::config::SpringConfig;

/// Below this length the tether axis is undefined and no force is applied.
const MIN_TETHER_LENGTH: f32 = 1e-4;

/// Stiffness regime of the tongue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpringRegime {
    /// Idle, holding the tip at rest altitude.
    #[default]
    Hanging = 0,
    /// Reeling prey in; stiffest, must carry tip and victim weight.
    Lifting = 1,
    /// Controlled descent after release or death.
    Lowering = 2,
}

impl SpringRegime {
    /// Stiffness of this regime.
    #[inline]
    pub fn stiffness(self, config: &SpringConfig) -> f32 {
        match self {
            SpringRegime::Hanging => config.hanging_stiffness,
            SpringRegime::Lifting => config.lifting_stiffness,
            SpringRegime::Lowering => config.lowering_stiffness,
        }
    }
}

/// Spring constants for one evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringModel {
    /// `k`.
    pub stiffness: f32,
    /// `c`.
    pub damping: f32,
}

impl SpringModel {
    /// Model for `regime`, damping scaled by the load it moves.
    pub fn for_regime(regime: SpringRegime, config: &SpringConfig, load_mass: f32) -> Self {
        Self {
            stiffness: regime.stiffness(config),
            damping: config.damping * load_mass,
        }
    }

    /// Scalar tension for length `length`, rest length `rest_length` and
    /// closing speed `closing_speed` (positive while the tip approaches the
    /// root). Unclamped.
    #[inline]
    pub fn tension(&self, length: f32, rest_length: f32, closing_speed: f32) -> f32 {
        self.stiffness * (length - rest_length) - self.damping * closing_speed
    }

    /// Force on the tip, pointing at the root.
    ///
    /// Tension is clamped to `[0, max_tension]`; `None` leaves it unbounded.
    pub fn force(
        &self,
        root: Vec3,
        tip: Vec3,
        tip_velocity: Vec3,
        rest_length: f32,
        max_tension: Option<f32>,
    ) -> Vec3 {
        let offset = root - tip;
        let length = offset.length();
        if length < MIN_TETHER_LENGTH {
            return Vec3::ZERO;
        }

        let axis = offset / length;
        let closing = tip_velocity.dot(axis);
        let mut tension = self.tension(length, rest_length, closing).max(0.0);
        if let Some(cap) = max_tension {
            tension = tension.min(cap);
        }

        axis * tension
    }
}

/// Speed at which `tip` moves toward `root`.
#[inline]
pub fn closing_speed(root: Vec3, tip: Vec3, velocity: Vec3) -> f32 {
    velocity.dot((root - tip).normalize_or_zero())
}

/// What hangs on the end of the tongue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiftLoad {
    /// Tip body mass.
    pub tip_mass: f32,
    /// Attached victim mass (zero when detached).
    pub victim_mass: f32,
    /// Heaviest liftable victim.
    pub max_lift_mass: f32,
}

impl LiftLoad {
    /// Mass the solver integrates.
    #[inline]
    pub fn total_mass(&self) -> f32 {
        self.tip_mass + self.victim_mass
    }

    /// Victim mass as far as the lift effort is concerned.
    #[inline]
    pub fn effective_victim_mass(&self) -> f32 {
        self.victim_mass.min(self.max_lift_mass)
    }

    /// Whether the tongue can lift this load at all.
    #[inline]
    pub fn is_liftable(&self) -> bool {
        self.victim_mass <= self.max_lift_mass
    }

    /// Tension cap for an over-heavy load.
    ///
    /// The tongue strains only as hard as holding the tip plus the
    /// maximum liftable mass requires, which never overcomes the real
    /// weight, so the victim stays put while the tether stretches.
    pub fn max_tension(&self, gravity: f32) -> Option<f32> {
        if self.is_liftable() {
            None
        } else {
            Some((self.tip_mass + self.effective_victim_mass()) * gravity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn model() -> SpringModel {
        SpringModel { stiffness: 100.0, damping: 10.0 }
    }

    #[test]
    fn test_tension_formula() {
        let spring = model();
        // stretched by 2, not moving
        assert_eq!(spring.tension(12.0, 10.0, 0.0), 200.0);
        // closing at 5 units/s reduces tension
        assert_eq!(spring.tension(12.0, 10.0, 5.0), 150.0);
    }

    #[test]
    fn test_force_points_at_root() {
        let root = Vec3::new(0.0, 0.0, 100.0);
        let tip = Vec3::new(0.0, 0.0, 80.0);
        let force = model().force(root, tip, Vec3::ZERO, 10.0, None);
        assert_eq!(force, Vec3::new(0.0, 0.0, 1000.0));
    }

    #[test]
    fn test_slack_tongue_does_not_push() {
        let root = Vec3::new(0.0, 0.0, 100.0);
        let tip = Vec3::new(0.0, 0.0, 95.0);
        let force = model().force(root, tip, Vec3::ZERO, 10.0, None);
        assert_eq!(force, Vec3::ZERO);
    }

    #[test]
    fn test_tension_cap() {
        let root = Vec3::new(0.0, 0.0, 100.0);
        let tip = Vec3::ZERO;
        let force = model().force(root, tip, Vec3::ZERO, 0.0, Some(50.0));
        assert_eq!(force.z, 50.0);
    }

    #[test]
    fn test_regime_stiffness() {
        let config = SpringConfig::default();
        assert!(SpringRegime::Lowering.stiffness(&config) < SpringRegime::Lifting.stiffness(&config));
        assert_eq!(SpringRegime::Hanging.stiffness(&config), config.hanging_stiffness);
    }

    #[test]
    fn test_heavy_load_is_capped() {
        let light = LiftLoad { tip_mass: 100.0, victim_mass: 60.0, max_lift_mass: 70.0 };
        assert!(light.is_liftable());
        assert_eq!(light.max_tension(600.0), None);

        let heavy = LiftLoad { victim_mass: 80.0, ..light };
        assert!(!heavy.is_liftable());
        assert_eq!(heavy.effective_victim_mass(), 70.0);
        let cap = heavy.max_tension(600.0).unwrap();
        assert!(cap < heavy.total_mass() * 600.0);
    }

    #[test]
    fn test_closing_speed_sign() {
        let root = Vec3::new(0.0, 0.0, 10.0);
        assert_eq!(closing_speed(root, Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0)), 3.0);
        assert_eq!(closing_speed(root, Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0)), -3.0);
    }

    proptest! {
        #[test]
        fn prop_force_never_pushes(
            tip_z in -500.0f32..499.0,
            rest in 0.0f32..600.0,
            vz in -300.0f32..300.0,
        ) {
            let root = Vec3::new(0.0, 0.0, 500.0);
            let tip = Vec3::new(0.0, 0.0, tip_z);
            let force = model().force(root, tip, Vec3::new(0.0, 0.0, vz), rest, None);
            prop_assert!(force.z >= 0.0);
        }
    }
}
