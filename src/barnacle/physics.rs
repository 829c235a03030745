//! Physics Solver Seam
//!
//! The tongue computes its spring force; a solver turns that force into
//! motion of the tip body. Hosts with a physics engine implement
//! [`PhysicsSolver`] against it. [`EulerSolver`] is the built-in
//! deterministic integrator used by the simulation harness and tests.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::barnacle::victim::VictimId;

/// Smallest acceptable mass to avoid numerically unstable accelerations.
const MIN_MASS: f32 = 1e-6;

/// Point mass at the end of the tongue (tip plus any attached victim).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TipBody {
    /// World position.
    pub position: Vec3,
    /// World velocity.
    pub velocity: Vec3,
    /// Total mass moved by the spring.
    pub mass: f32,
}

/// Binding of a victim to the tip, registered with the solver on attach.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TetherConstraint {
    /// Victim held by the tether.
    pub victim: VictimId,
    /// Lowest height the tip may reach while the victim stands on the floor.
    pub support_z: f32,
}

/// Integrates the tether force onto the tip body.
pub trait PhysicsSolver {
    /// Advance `body` by `dt` under `force` plus gravity and floor support.
    fn integrate(&mut self, body: &mut TipBody, force: Vec3, dt: f32);

    /// Register the victim binding.
    fn attach_constraint(&mut self, constraint: TetherConstraint);

    /// Drop the victim binding, if any.
    fn remove_constraint(&mut self);

    /// Currently registered binding.
    fn constraint(&self) -> Option<&TetherConstraint>;
}

/// Semi-implicit Euler integrator with a flat floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EulerSolver {
    gravity: f32,
    ground_z: f32,
    constraint: Option<TetherConstraint>,
}

impl EulerSolver {
    /// Solver with gravity `gravity` along -Z and a floor at `ground_z`.
    pub fn new(gravity: f32, ground_z: f32) -> Self {
        Self { gravity, ground_z, constraint: None }
    }

    /// Height below which the tip is supported.
    pub fn floor(&self) -> f32 {
        self.constraint.map_or(self.ground_z, |c| c.support_z)
    }
}

impl PhysicsSolver for EulerSolver {
    fn integrate(&mut self, body: &mut TipBody, force: Vec3, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        let mass = body.mass.max(MIN_MASS);
        let acceleration = force / mass - Vec3::Z * self.gravity;

        body.velocity += acceleration * dt;
        body.position += body.velocity * dt;

        let floor = self.floor();
        if body.position.z < floor {
            body.position.z = floor;
            body.velocity.z = body.velocity.z.max(0.0);
        }
    }

    fn attach_constraint(&mut self, constraint: TetherConstraint) {
        self.constraint = Some(constraint);
    }

    fn remove_constraint(&mut self) {
        self.constraint = None;
    }

    fn constraint(&self) -> Option<&TetherConstraint> {
        self.constraint.as_ref()
    }
}
