//! Core deterministic primitives.
//!
//! Everything the creature simulation needs to be replayable: a seeded PRNG,
//! a step timer, and SHA-256 state hashing for snapshot/replay verification.

pub mod hash;
pub mod rng;
pub mod timer;

// Re-export core types
pub use hash::{compute_state_hash, StateHash, StateHasher};
pub use rng::DeterministicRng;
pub use timer::SimTimer;
