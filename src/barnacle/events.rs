//! Creature Events
//!
//! Events generated during a tick for hosts, replay and tests.

use serde::{Deserialize, Serialize};

use crate::barnacle::animation::Activity;
use crate::barnacle::state::CapturePhase;
use crate::barnacle::victim::{InteractionOutcome, VictimId};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Creature death first
    Death = 0,
    /// Then grabs, releases and consumption
    Capture = 1,
    /// Then damage either way
    Damage = 2,
    /// Then animation requests
    Animation = 3,
    /// Lowest priority
    Other = 255,
}

/// Why a held victim was let go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseReason {
    /// `DropTongue` command.
    DropTongue,
    /// `LetGo` command.
    LetGo,
    /// Victim reference went stale.
    Lost,
    /// Victim moved too far from the tip.
    Teleported,
    /// Tasted and spat out.
    Spat,
    /// The creature died.
    CreatureDied,
}

/// What killed the creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Health ran out.
    Damage,
    /// Ate something poisonous.
    Poison,
    /// `Kill` command.
    Scripted,
}

/// Event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BarnacleEventData {
    /// Capture phase changed
    PhaseChanged {
        from: CapturePhase,
        to: CapturePhase,
    },

    /// Tongue wrapped around a victim
    OnGrab {
        victim: VictimId,
    },

    /// Victim let go
    OnRelease {
        victim: VictimId,
        reason: ReleaseReason,
    },

    /// Jaws closed on the victim
    VictimBitten {
        victim: VictimId,
        damage: f32,
        outcome: InteractionOutcome,
    },

    /// Animation activity requested
    ActivityRequested {
        activity: Activity,
    },

    /// Stalled lift got a forceful pull
    ForcefulPull {
        victim: VictimId,
    },

    /// Remains of a kill should be spawned
    RemainsSpawned {
        victim: VictimId,
        gib_count: u32,
    },

    /// Victim fully digested and removed
    VictimConsumed {
        victim: VictimId,
    },

    /// Creature died
    Killed {
        cause: DeathCause,
    },

    /// Corpse settled; host may clean up
    CorpseCleanup {
        gib_count: u32,
        spawn_gibs: bool,
    },

    /// Creature took damage
    DamageTaken {
        amount: f32,
        health: f32,
    },
}

/// An event with timing and priority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarnacleEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Victim involved (for tie-breaking)
    pub victim: Option<VictimId>,

    /// Event data
    pub data: BarnacleEventData,
}

impl BarnacleEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: BarnacleEventData) -> Self {
        let victim = match &data {
            BarnacleEventData::OnGrab { victim }
            | BarnacleEventData::OnRelease { victim, .. }
            | BarnacleEventData::VictimBitten { victim, .. }
            | BarnacleEventData::ForcefulPull { victim }
            | BarnacleEventData::RemainsSpawned { victim, .. }
            | BarnacleEventData::VictimConsumed { victim } => Some(*victim),
            _ => None,
        };

        Self { tick, priority, victim, data }
    }

    /// Ordering key: tick, then priority, then victim.
    pub fn sort_key(&self) -> (u32, EventPriority, Option<VictimId>) {
        (self.tick, self.priority, self.victim)
    }

    /// Create phase changed event.
    pub fn phase_changed(tick: u32, from: CapturePhase, to: CapturePhase) -> Self {
        Self::new(tick, EventPriority::Other, BarnacleEventData::PhaseChanged { from, to })
    }

    /// Create grab event.
    pub fn on_grab(tick: u32, victim: VictimId) -> Self {
        Self::new(tick, EventPriority::Capture, BarnacleEventData::OnGrab { victim })
    }

    /// Create release event.
    pub fn on_release(tick: u32, victim: VictimId, reason: ReleaseReason) -> Self {
        Self::new(tick, EventPriority::Capture, BarnacleEventData::OnRelease { victim, reason })
    }

    /// Create bite event.
    pub fn victim_bitten(tick: u32, victim: VictimId, damage: f32, outcome: InteractionOutcome) -> Self {
        Self::new(
            tick,
            EventPriority::Damage,
            BarnacleEventData::VictimBitten { victim, damage, outcome },
        )
    }

    /// Create activity request event.
    pub fn activity_requested(tick: u32, activity: Activity) -> Self {
        Self::new(tick, EventPriority::Animation, BarnacleEventData::ActivityRequested { activity })
    }

    /// Create forceful pull event.
    pub fn forceful_pull(tick: u32, victim: VictimId) -> Self {
        Self::new(tick, EventPriority::Other, BarnacleEventData::ForcefulPull { victim })
    }

    /// Create remains spawned event.
    pub fn remains_spawned(tick: u32, victim: VictimId, gib_count: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Capture,
            BarnacleEventData::RemainsSpawned { victim, gib_count },
        )
    }

    /// Create victim consumed event.
    pub fn victim_consumed(tick: u32, victim: VictimId) -> Self {
        Self::new(tick, EventPriority::Capture, BarnacleEventData::VictimConsumed { victim })
    }

    /// Create creature killed event.
    pub fn killed(tick: u32, cause: DeathCause) -> Self {
        Self::new(tick, EventPriority::Death, BarnacleEventData::Killed { cause })
    }

    /// Create corpse cleanup event.
    pub fn corpse_cleanup(tick: u32, gib_count: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            BarnacleEventData::CorpseCleanup { gib_count, spawn_gibs: gib_count > 0 },
        )
    }

    /// Create damage taken event.
    pub fn damage_taken(tick: u32, amount: f32, health: f32) -> Self {
        Self::new(tick, EventPriority::Damage, BarnacleEventData::DamageTaken { amount, health })
    }

    /// Activity carried by an activity request.
    pub fn requested_activity(&self) -> Option<Activity> {
        match self.data {
            BarnacleEventData::ActivityRequested { activity } => Some(activity),
            _ => None,
        }
    }
}
