//! Creature Module
//!
//! The tongue tether and the capture state machine built on it.
//!
//! ## Module Structure
//!
//! - `config`: Tunables and their defaults
//! - `spring`: Damped tongue spring and lift cap
//! - `physics`: Solver seam and the built-in Euler integrator
//! - `tongue`: Tongue tip body and victim attachment
//! - `victim`: Victim world and interaction protocol
//! - `controllers`: Built-in player, humanoid and prop controllers
//! - `damage`: Impact damage tables
//! - `animation`: Activity requests and playback triggers
//! - `input`: Per-tick commands, impacts and triggers
//! - `state`: Creature state, snapshot and hash
//! - `capture`: Phase transitions
//! - `events`: Events for hosts and replay
//! - `tick`: Fixed-order step and simulation harness

pub mod animation;
pub mod capture;
pub mod config;
pub mod controllers;
pub mod damage;
pub mod events;
pub mod input;
pub mod physics;
pub mod spring;
pub mod state;
pub mod tick;
pub mod tongue;
pub mod victim;

// Re-export key types
pub use animation::{Activity, AnimationTrigger, TimedAnimator};
pub use config::{BarnacleConfig, CaptureConfig, ConfigError, SpringConfig};
pub use damage::{DamageTable, PhysicsImpact};
pub use events::{BarnacleEvent, BarnacleEventData};
pub use input::{BarnacleCommand, TickInput};
pub use physics::{EulerSolver, PhysicsSolver};
pub use state::{Barnacle, CapturePhase, CreatureId, SnapshotError};
pub use tick::{tick, Simulation, TickResult};
pub use tongue::TongueTip;
pub use victim::{VictimController, VictimId, VictimInteraction, VictimWorld};
