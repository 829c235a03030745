//! Creature State
//!
//! One explicit serializable structure holds everything the creature
//! remembers between ticks. It doubles as the persistence snapshot and is
//! the input of the determinism hash.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::barnacle::animation::Activity;
use crate::barnacle::config::BarnacleConfig;
use crate::barnacle::events::{BarnacleEvent, DeathCause};
use crate::barnacle::tongue::TongueTip;
use crate::barnacle::victim::VictimId;
use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::core::timer::SimTimer;

/// Snapshot format version, written ahead of the encoded creature.
pub const SNAPSHOT_VERSION: u32 = 1;

// =============================================================================
// CREATURE ID
// =============================================================================

/// Unique creature identifier (UUID as bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CreatureId(pub [u8; 16]);

impl CreatureId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// =============================================================================
// CAPTURE PHASE
// =============================================================================

/// Capture lifecycle phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CapturePhase {
    /// Hanging, waiting for prey.
    #[default]
    Idle = 0,
    /// Prey in the capture volume, dwelling.
    Sensing = 1,
    /// Tongue just wrapped the victim.
    Grabbing = 2,
    /// Reeling the victim up.
    Lifting = 3,
    /// Victim at the mouth, biting.
    Biting = 4,
    /// Chewing a dead victim.
    Chewing = 5,
    /// Digesting until the victim is consumed.
    Digesting = 6,
    /// Tongue lowering back to rest after letting go.
    Releasing = 7,
    /// Terminal.
    Dead = 8,
}

impl CapturePhase {
    /// Phases in which a victim is held.
    #[inline]
    pub fn holds_victim(self) -> bool {
        matches!(
            self,
            CapturePhase::Grabbing
                | CapturePhase::Lifting
                | CapturePhase::Biting
                | CapturePhase::Chewing
                | CapturePhase::Digesting
        )
    }
}

// =============================================================================
// CAPTURE RECORDS
// =============================================================================

/// Record of the victim currently held.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grip {
    /// Weak reference to the victim.
    pub victim: VictimId,
    /// Skeletal attachment; `None` when grabbed by the centre of mass.
    pub bone_index: Option<u32>,
    /// Feet height at the moment of the grab.
    pub height_when_grabbed: f32,
    /// Stance to restore on release.
    pub was_standing_before_grab: bool,
    /// The victim died in the creature's grip.
    pub victim_killed: bool,
}

/// Candidate under observation while sensing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sensed {
    /// Candidate victim.
    pub victim: VictimId,
    /// Time sensing began.
    pub since: f64,
}

/// How and when the creature died.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeathRecord {
    /// Time of death.
    pub time: f64,
    /// Cause.
    pub cause: DeathCause,
    /// Corpse cleanup already fired.
    pub cleaned_up: bool,
}

/// Fields mirrored to clients every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedTongue {
    /// Rest tongue length.
    pub altitude: f32,
    /// Anchor.
    pub root: Vec3,
    /// Tip.
    pub tip: Vec3,
    /// Cosmetic sway of the idle tip.
    pub tip_draw_offset: Vec3,
}

// =============================================================================
// SNAPSHOT ERRORS
// =============================================================================

/// Errors raised while saving or loading a creature snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Encoding failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] bincode::Error),

    /// Decoding failed.
    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] bincode::Error),

    /// Snapshot written by an incompatible version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version {
        /// Version in the snapshot.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}

// =============================================================================
// BARNACLE
// =============================================================================

/// Complete state of one creature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Barnacle {
    /// Creature identifier
    pub id: CreatureId,

    /// Steps simulated
    pub tick: u32,

    /// Simulated seconds
    pub time: f64,

    /// Rest tongue length from the anchor to the idle tip
    pub altitude: f32,

    /// Anchor point on the ceiling
    pub root: Vec3,

    /// Tongue tip (replicated copy of the tip body position)
    pub tip: Vec3,

    /// Cosmetic sway of the idle tip
    pub tip_draw_offset: Vec3,

    /// Floor height below the anchor
    pub ground_z: f32,

    /// Clearance of the idle tip above the floor
    pub rest_units_above_ground: f32,

    /// Current capture phase
    pub phase: CapturePhase,

    /// Held victim
    pub grip: Option<Grip>,

    /// Candidate while sensing
    pub sensed: Option<Sensed>,

    /// Last victim spat out; never sensed again
    pub last_spat: Option<VictimId>,

    /// Successful kills
    pub gib_count: u32,

    /// Time digestion ends
    pub digest_finish_time: f64,

    /// Closing speed of the tip toward the anchor this tick
    pub pull_speed: f32,

    /// Closing speed last tick
    pub last_pull: f32,

    /// Time spent lifting below the stall speed
    pub stuck_timer: SimTimer,

    /// Forceful pulls spent on the current capture
    pub stuck_yanks: u32,

    /// No sensing before this time
    pub cooldown_until: f64,

    /// Tongue reel-out speed
    pub drop_tongue_speed: f32,

    /// Remaining health
    pub health: f32,

    /// Last requested activity
    pub activity: Option<Activity>,

    /// Set once dead
    pub death: Option<DeathRecord>,

    /// Cosmetic randomness (sway phase, chew jitter)
    pub rng: DeterministicRng,

    /// Sway phase offset in radians
    pub sway_phase: f32,

    /// Tongue tip body and spring state
    pub tongue: TongueTip,

    /// Events generated this tick (cleared each tick)
    #[serde(skip)]
    pub pending_events: Vec<BarnacleEvent>,
}

impl Barnacle {
    /// Spawn a creature anchored at `root` above a floor at `ground_z`.
    pub fn spawn(
        id: CreatureId,
        root: Vec3,
        ground_z: f32,
        rest_units_above_ground: f32,
        config: &BarnacleConfig,
    ) -> Self {
        let altitude = ((root.z - ground_z) - rest_units_above_ground).max(0.0);
        let mut rng = DeterministicRng::for_creature(id.as_bytes());
        let sway_phase = rng.next_f32() * std::f32::consts::TAU;
        let tongue = TongueTip::new(root - Vec3::Z * altitude, altitude);

        Self {
            id,
            tick: 0,
            time: 0.0,
            altitude,
            root,
            tip: tongue.position,
            tip_draw_offset: Vec3::ZERO,
            ground_z,
            rest_units_above_ground,
            phase: CapturePhase::Idle,
            grip: None,
            sensed: None,
            last_spat: None,
            gib_count: 0,
            digest_finish_time: 0.0,
            pull_speed: 0.0,
            last_pull: 0.0,
            stuck_timer: SimTimer::new(),
            stuck_yanks: 0,
            cooldown_until: 0.0,
            drop_tongue_speed: config.capture.drop_tongue_speed,
            health: config.health,
            activity: None,
            death: None,
            rng,
            sway_phase,
            tongue,
            pending_events: Vec::new(),
        }
    }

    /// Not dead.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.phase != CapturePhase::Dead
    }

    /// Victim currently held.
    #[inline]
    pub fn held_victim(&self) -> Option<VictimId> {
        self.grip.map(|g| g.victim)
    }

    /// Phase and grip agree.
    #[inline]
    pub fn grip_consistent(&self) -> bool {
        self.phase.holds_victim() == self.grip.is_some()
    }

    /// Tongue length once dead: the configured dead altitude, shortened to
    /// keep the minimum clearance above the floor.
    pub fn dead_altitude(&self, config: &BarnacleConfig) -> f32 {
        let ground_distance = self.root.z - self.ground_z;
        config
            .dead_tongue_altitude
            .min(ground_distance - config.min_dead_tongue_clearance)
            .max(0.0)
    }

    /// Fields mirrored to clients.
    pub fn replicated(&self) -> ReplicatedTongue {
        ReplicatedTongue {
            altitude: self.altitude,
            root: self.root,
            tip: self.tip,
            tip_draw_offset: self.tip_draw_offset,
        }
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<BarnacleEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push an event.
    pub fn push_event(&mut self, event: BarnacleEvent) {
        self.pending_events.push(event);
    }

    /// Encode the creature for persistence.
    pub fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(&(SNAPSHOT_VERSION, self)).map_err(SnapshotError::Encode)
    }

    /// Decode a creature written by [`snapshot`](Self::snapshot).
    pub fn restore(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let (version, creature): (u32, Self) =
            bincode::deserialize(bytes).map_err(SnapshotError::Decode)?;
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version { found: version, expected: SNAPSHOT_VERSION });
        }
        Ok(creature)
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.time, |hasher| {
            hasher.update_id(self.id.as_bytes());
            hasher.update_f32(self.altitude);
            hasher.update_vec3(self.root);
            hasher.update_vec3(self.tip);
            hasher.update_vec3(self.tip_draw_offset);
            hasher.update_f32(self.ground_z);
            hasher.update_f32(self.rest_units_above_ground);
            hasher.update_u8(self.phase as u8);

            hasher.update_bool(self.grip.is_some());
            if let Some(grip) = &self.grip {
                hasher.update_u32(grip.victim.0);
                hasher.update_opt_u32(grip.bone_index);
                hasher.update_f32(grip.height_when_grabbed);
                hasher.update_bool(grip.was_standing_before_grab);
                hasher.update_bool(grip.victim_killed);
            }

            hasher.update_bool(self.sensed.is_some());
            if let Some(sensed) = &self.sensed {
                hasher.update_u32(sensed.victim.0);
                hasher.update_f64(sensed.since);
            }
            hasher.update_opt_u32(self.last_spat.map(|v| v.0));

            hasher.update_u32(self.gib_count);
            hasher.update_f64(self.digest_finish_time);
            hasher.update_f32(self.pull_speed);
            hasher.update_f32(self.last_pull);
            hasher.update_f32(self.stuck_timer.elapsed());
            hasher.update_u32(self.stuck_yanks);
            hasher.update_f64(self.cooldown_until);
            hasher.update_f32(self.drop_tongue_speed);
            hasher.update_f32(self.health);
            hasher.update_u8(self.activity.map_or(u8::MAX, |a| a as u8));

            hasher.update_bool(self.death.is_some());
            if let Some(death) = &self.death {
                hasher.update_f64(death.time);
                hasher.update_u8(death.cause as u8);
                hasher.update_bool(death.cleaned_up);
            }

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
            hasher.update_f32(self.sway_phase);

            hash_tongue(hasher, &self.tongue);
        })
    }
}

fn hash_tongue(hasher: &mut StateHasher, tongue: &TongueTip) {
    hasher.update_vec3(tongue.position);
    hasher.update_vec3(tongue.velocity);
    hasher.update_f32(tongue.rest_length);
    hasher.update_u8(tongue.regime as u8);
    hasher.update_bool(tongue.attachment.is_some());
    if let Some(a) = &tongue.attachment {
        hasher.update_u32(a.victim.0);
        hasher.update_opt_u32(a.bone_index);
        hasher.update_f32(a.victim_mass);
        hasher.update_f32(a.attach_offset);
        hasher.update_f32(a.support_z);
    }
}

// =============================================================================
// TESTS
// =============================================================================
