//! Creature Configuration
//!
//! Every tunable of the tether and capture cycle. Defaults carry the
//! creature's shipped constants; hosts may override any subset from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::barnacle::damage::DamageTable;

// =============================================================================
// TONGUE CONSTANTS
// =============================================================================

/// Spring constant while the tongue hangs idle.
pub const TONGUE_SPRING_CONSTANT_HANGING: f32 = 10_000.0;
/// Spring constant while reeling prey in.
pub const TONGUE_SPRING_CONSTANT_LIFTING: f32 = 10_000.0;
/// Spring constant while letting the tongue back down.
pub const TONGUE_SPRING_CONSTANT_LOWERING: f32 = 7_000.0;
/// Damping per unit of load mass.
pub const TONGUE_SPRING_DAMPING: f32 = 20.0;
/// Mass of the tongue tip itself.
pub const TONGUE_TIP_MASS: f32 = 100.0;
/// Heaviest victim the tongue can lift.
pub const TONGUE_MAX_LIFT_MASS: f32 = 70.0;

/// Damage of one bite against the controlled player.
pub const BITE_DAMAGE_TO_PLAYER: f32 = 15.0;
/// Tongue length once the creature is dead.
pub const DEAD_TONGUE_ALTITUDE: f32 = 164.0;
/// Minimum clearance between a dead tongue and the floor.
pub const MIN_DEAD_TONGUE_CLEARANCE: f32 = 78.0;

/// World gravity, units per second squared.
pub const DEFAULT_GRAVITY: f32 = 600.0;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}

/// Spring and tip-body parameters of the tongue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    /// Stiffness of the hanging regime.
    pub hanging_stiffness: f32,
    /// Stiffness of the lifting regime.
    pub lifting_stiffness: f32,
    /// Stiffness of the lowering regime.
    pub lowering_stiffness: f32,
    /// Damping, multiplied by the load mass.
    pub damping: f32,
    /// Mass of the tip body.
    pub tip_mass: f32,
    /// Victims heavier than this cannot be lifted.
    pub max_lift_mass: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            hanging_stiffness: TONGUE_SPRING_CONSTANT_HANGING,
            lifting_stiffness: TONGUE_SPRING_CONSTANT_LIFTING,
            lowering_stiffness: TONGUE_SPRING_CONSTANT_LOWERING,
            damping: TONGUE_SPRING_DAMPING,
            tip_mass: TONGUE_TIP_MASS,
            max_lift_mass: TONGUE_MAX_LIFT_MASS,
        }
    }
}

/// Thresholds and timings of the capture cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Horizontal reach of the capture volume around the anchor axis.
    pub capture_radius: f32,
    /// Seconds a candidate must stay eligible before the grab.
    pub dwell_time: f32,
    /// Reel-in speed while lifting (units/s).
    pub pull_speed: f32,
    /// Default reel-out speed while lowering (units/s).
    pub drop_tongue_speed: f32,
    /// Tip distance from the anchor at which the creature bites.
    pub bite_reach: f32,
    /// Seconds from swallow to the end of digestion.
    pub chew_duration: f32,
    /// Random extra chew time, uniformly in `[0, chew_jitter)`.
    pub chew_jitter: f32,
    /// Seconds after a capture ends before sensing resumes.
    pub regrab_cooldown: f32,
    /// Pull speed below which lifting counts as stalled.
    pub stall_speed: f32,
    /// Seconds of stall before a forceful pull.
    pub stall_time: f32,
    /// Forceful pulls allowed per capture.
    pub max_stuck_yanks: u32,
    /// Velocity change of a forceful pull, toward the anchor.
    pub yank_speed: f32,
    /// Victim drift from the tip that counts as losing it.
    pub teleport_tolerance: f32,
    /// How close to rest length the tip must be to finish lowering.
    pub settle_tolerance: f32,
    /// Damage of one bite against the controlled player.
    pub bite_damage_to_player: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_radius: 24.0,
            dwell_time: 0.5,
            pull_speed: 80.0,
            drop_tongue_speed: 80.0,
            bite_reach: 32.0,
            chew_duration: 5.0,
            chew_jitter: 0.0,
            regrab_cooldown: 2.0,
            stall_speed: 4.0,
            stall_time: 1.5,
            max_stuck_yanks: 1,
            yank_speed: 60.0,
            teleport_tolerance: 64.0,
            settle_tolerance: 4.0,
            bite_damage_to_player: BITE_DAMAGE_TO_PLAYER,
        }
    }
}

/// Complete creature configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarnacleConfig {
    /// Gravity magnitude (acts along -Z).
    pub gravity: f32,
    /// Starting health.
    pub health: f32,
    /// Dies after swallowing a poisonous victim.
    pub poison_sensitive: bool,
    /// Tongue length once dead.
    pub dead_tongue_altitude: f32,
    /// Minimum floor clearance of a dead tongue.
    pub min_dead_tongue_clearance: f32,
    /// Seconds between death and corpse cleanup.
    pub death_settle_time: f32,
    /// Amplitude of the idle tip draw-offset sway.
    pub sway_amplitude: f32,
    /// Frequency of the idle sway (Hz).
    pub sway_frequency: f32,
    /// Tongue spring.
    pub spring: SpringConfig,
    /// Capture cycle.
    pub capture: CaptureConfig,
    /// Physical impact damage table.
    pub damage: DamageTable,
}

impl Default for BarnacleConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            health: 35.0,
            poison_sensitive: true,
            dead_tongue_altitude: DEAD_TONGUE_ALTITUDE,
            min_dead_tongue_clearance: MIN_DEAD_TONGUE_CLEARANCE,
            death_settle_time: 2.0,
            sway_amplitude: 1.5,
            sway_frequency: 0.4,
            spring: SpringConfig::default(),
            capture: CaptureConfig::default(),
            damage: DamageTable::default(),
        }
    }
}

impl BarnacleConfig {
    /// Parse and validate a JSON config; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("gravity", self.gravity)?;
        positive("health", self.health)?;
        non_negative("dead_tongue_altitude", self.dead_tongue_altitude)?;
        non_negative("min_dead_tongue_clearance", self.min_dead_tongue_clearance)?;
        non_negative("death_settle_time", self.death_settle_time)?;
        non_negative("sway_amplitude", self.sway_amplitude)?;
        non_negative("sway_frequency", self.sway_frequency)?;

        let spring = &self.spring;
        positive("spring.hanging_stiffness", spring.hanging_stiffness)?;
        positive("spring.lifting_stiffness", spring.lifting_stiffness)?;
        positive("spring.lowering_stiffness", spring.lowering_stiffness)?;
        non_negative("spring.damping", spring.damping)?;
        positive("spring.tip_mass", spring.tip_mass)?;
        non_negative("spring.max_lift_mass", spring.max_lift_mass)?;

        let capture = &self.capture;
        positive("capture.capture_radius", capture.capture_radius)?;
        non_negative("capture.dwell_time", capture.dwell_time)?;
        positive("capture.pull_speed", capture.pull_speed)?;
        positive("capture.drop_tongue_speed", capture.drop_tongue_speed)?;
        positive("capture.bite_reach", capture.bite_reach)?;
        non_negative("capture.chew_duration", capture.chew_duration)?;
        non_negative("capture.chew_jitter", capture.chew_jitter)?;
        non_negative("capture.regrab_cooldown", capture.regrab_cooldown)?;
        non_negative("capture.stall_speed", capture.stall_speed)?;
        positive("capture.stall_time", capture.stall_time)?;
        non_negative("capture.yank_speed", capture.yank_speed)?;
        positive("capture.teleport_tolerance", capture.teleport_tolerance)?;
        positive("capture.settle_tolerance", capture.settle_tolerance)?;
        non_negative("capture.bite_damage_to_player", capture.bite_damage_to_player)?;

        self.damage.validate()
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be a positive number, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be zero or more, got {value}")))
    }
}
