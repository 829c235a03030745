//! # Barnacle Simulation
//!
//! Deterministic simulation of a ceiling-mounted predator that catches
//! prey with an elastic tongue, reels it up and eats it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BARNACLE SIM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Deterministic primitives                │
//! │  ├── rng.rs        - Deterministic Xorshift128+ PRNG         │
//! │  ├── timer.rs      - Accumulating step timer                 │
//! │  └── hash.rs       - State hashing for verification          │
//! │                                                              │
//! │  barnacle/         - Creature logic (deterministic)          │
//! │  ├── spring.rs     - Damped tongue spring, lift cap          │
//! │  ├── physics.rs    - Solver seam, Euler integrator           │
//! │  ├── tongue.rs     - Tongue tip and attachment               │
//! │  ├── victim.rs     - Victim world, interaction protocol      │
//! │  ├── damage.rs     - Impact damage tables                    │
//! │  ├── capture.rs    - Capture state machine                   │
//! │  ├── state.rs      - Creature state, snapshot, hash          │
//! │  └── tick.rs       - Fixed-order step, harness               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same spawn, configuration and input stream:
//! - Victims are visited in id order (BTreeMap)
//! - Every step runs the same fixed sequence
//! - All randomness comes from the creature's seeded Xorshift128+
//! - No system time dependencies
//!
//! the simulation produces **identical state hashes** on replay.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod barnacle;
pub mod core;

// Re-export commonly used types
pub use barnacle::{
    Barnacle, BarnacleCommand, BarnacleConfig, BarnacleEvent, CapturePhase, CreatureId, Simulation,
    TickInput, VictimWorld,
};
pub use crate::core::rng::DeterministicRng;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
