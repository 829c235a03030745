//! Victim Interaction Protocol
//!
//! Victims live in a [`VictimWorld`] keyed by monotonic [`VictimId`]s. The
//! creature never owns a victim: it holds the id and re-validates it every
//! tick, so a removed victim reads as a stale reference instead of a
//! dangling one.
//!
//! Every message the creature sends goes through [`VictimWorld::deliver`],
//! which applies the positional part of the interaction itself and then
//! hands the message to the victim's [`VictimController`] if the controller
//! declared that kind in its [`InteractionKinds`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::barnacle::state::CreatureId;

// =============================================================================
// VICTIM ID / BODY
// =============================================================================

/// Weak reference to a victim. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VictimId(pub u32);

/// Broad victim category; selects bite and chew activities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VictimKind {
    /// The controlled player.
    Player = 0,
    /// Humanoid NPC.
    Humanoid = 1,
    /// Headcrab-sized creature.
    SmallCreature = 2,
    /// Loose physics prop.
    Debris = 3,
}

impl VictimKind {
    /// Player or humanoid NPC.
    #[inline]
    pub fn is_humanoid(self) -> bool {
        matches!(self, VictimKind::Player | VictimKind::Humanoid)
    }
}

/// Physical state of a victim that the creature reads and moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VictimBody {
    /// Feet origin in world space.
    pub position: Vec3,
    /// Standing height.
    pub height: f32,
    /// Physics mass.
    pub mass: f32,
    /// Category.
    pub kind: VictimKind,
    /// Bone the tongue wraps, if the victim has a skeleton.
    pub head_bone: Option<u32>,
    /// Takes part in physics at all.
    pub simulated: bool,
    /// Eating it kills a poison-sensitive creature.
    pub poisonous: bool,
    /// Can be eaten; inedible victims are spat out.
    pub edible: bool,
    /// Upright stance.
    pub standing: bool,
    /// Hanging off a tongue, feet off the floor.
    pub is_dangling: bool,
    /// Creature currently holding it.
    pub held_by: Option<CreatureId>,
}

impl VictimBody {
    /// Standing, simulated victim of `kind`. Debris is inedible.
    pub fn new(kind: VictimKind, position: Vec3, height: f32, mass: f32) -> Self {
        Self {
            position,
            height,
            mass,
            kind,
            head_bone: None,
            simulated: true,
            poisonous: false,
            edible: kind != VictimKind::Debris,
            standing: true,
            is_dangling: false,
            held_by: None,
        }
    }

    /// Attach the tongue to skeletal bone `bone`.
    pub fn with_head_bone(mut self, bone: u32) -> Self {
        self.head_bone = Some(bone);
        self
    }

    /// Mark as poisonous.
    pub fn poisonous(mut self) -> Self {
        self.poisonous = true;
        self
    }

    /// Mark as inedible.
    pub fn inedible(mut self) -> Self {
        self.edible = false;
        self
    }

    /// Height of the top of the victim.
    #[inline]
    pub fn top(&self) -> f32 {
        self.position.z + self.height
    }

    /// Height of the tongue attachment above the feet: the head for
    /// skeletal victims, the centre of mass otherwise.
    #[inline]
    pub fn attach_offset(&self) -> f32 {
        if self.head_bone.is_some() {
            self.height
        } else {
            self.height * 0.5
        }
    }

    /// World-space tongue attachment point.
    #[inline]
    pub fn attach_point(&self) -> Vec3 {
        self.position + Vec3::Z * self.attach_offset()
    }
}

// =============================================================================
// INTERACTIONS
// =============================================================================

/// Set of interaction kinds a controller handles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionKinds(u8);

impl InteractionKinds {
    /// Nothing.
    pub const NONE: Self = Self(0);
    /// Grab bit.
    pub const GRAB: Self = Self(0x01);
    /// Dangle bit.
    pub const DANGLE: Self = Self(0x02);
    /// Bite bit.
    pub const BITE: Self = Self(0x04);
    /// Release bit.
    pub const RELEASE: Self = Self(0x08);
    /// All four kinds.
    pub const ALL: Self = Self(0x0F);

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Both sets combined.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Every kind in `other` is also in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for InteractionKinds {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Where a dangling victim is pinned this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DanglePose {
    /// Feet origin the victim is moved to.
    pub position: Vec3,
    /// Unit vector from the tip up to the anchor.
    pub tether_axis: Vec3,
    /// Feet are off the floor.
    pub lifted: bool,
}

/// Message from the creature to a victim.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum VictimInteraction {
    /// Tongue wrapped around the victim.
    Grab {
        /// Grabbing creature.
        creature: CreatureId,
    },
    /// Per-tick pose while held.
    Dangle {
        /// Holding creature.
        creature: CreatureId,
        /// Pinned pose.
        pose: DanglePose,
    },
    /// Jaws closed on the victim.
    Bite {
        /// Biting creature.
        creature: CreatureId,
        /// Damage dealt.
        damage: f32,
        /// Bite kills regardless of health.
        lethal: bool,
    },
    /// Tongue let go.
    Release {
        /// Releasing creature.
        creature: CreatureId,
        /// Stance to restore.
        restore_standing: bool,
    },
}

impl VictimInteraction {
    /// Capability bit of this message.
    pub fn kind(&self) -> InteractionKinds {
        match self {
            VictimInteraction::Grab { .. } => InteractionKinds::GRAB,
            VictimInteraction::Dangle { .. } => InteractionKinds::DANGLE,
            VictimInteraction::Bite { .. } => InteractionKinds::BITE,
            VictimInteraction::Release { .. } => InteractionKinds::RELEASE,
        }
    }
}

/// Victim's answer to an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionOutcome {
    /// Controller does not handle this kind.
    Ignored,
    /// Handled, nothing to report.
    Acknowledged,
    /// Bitten and still alive.
    Survived,
    /// Bitten to death (or destroyed).
    Killed,
}

/// Behaviour of a victim under the tongue.
pub trait VictimController: fmt::Debug {
    /// Kinds this controller wants delivered.
    fn interactions(&self) -> InteractionKinds;

    /// React to `interaction`. Only called for declared kinds, after the
    /// world has already applied the positional part to `body`.
    fn handle(&mut self, body: &mut VictimBody, interaction: &VictimInteraction) -> InteractionOutcome;

    /// Still alive.
    fn is_alive(&self) -> bool;

    /// Clone behind the trait object.
    fn clone_box(&self) -> Box<dyn VictimController>;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn VictimController> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// =============================================================================
// VICTIM WORLD
// =============================================================================

/// A victim: body plus behaviour.
#[derive(Clone, Debug)]
pub struct Victim {
    /// Physical state.
    pub body: VictimBody,
    controller: Box<dyn VictimController>,
    destroyed: bool,
}

impl Victim {
    /// Alive and not destroyed.
    pub fn is_alive(&self) -> bool {
        !self.destroyed && self.controller.is_alive()
    }

    /// The controller.
    pub fn controller(&self) -> &dyn VictimController {
        self.controller.as_ref()
    }

    /// The controller as its concrete type.
    pub fn controller_as<T: 'static>(&self) -> Option<&T> {
        self.controller.as_any().downcast_ref::<T>()
    }

    /// The controller as its concrete type, mutably.
    pub fn controller_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.controller.as_any_mut().downcast_mut::<T>()
    }
}

/// All victims the creature can see, ordered by id.
#[derive(Clone, Debug, Default)]
pub struct VictimWorld {
    victims: BTreeMap<VictimId, Victim>,
    next_id: u32,
}

impl VictimWorld {
    /// Empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a victim; returns its fresh id.
    pub fn spawn(&mut self, body: VictimBody, controller: Box<dyn VictimController>) -> VictimId {
        let id = VictimId(self.next_id);
        self.next_id += 1;
        self.victims.insert(id, Victim { body, controller, destroyed: false });
        id
    }

    /// Remove a victim. Its id stays unused forever.
    pub fn remove(&mut self, id: VictimId) -> Option<Victim> {
        self.victims.remove(&id)
    }

    /// Mark a victim destroyed without removing it.
    pub fn destroy(&mut self, id: VictimId) -> bool {
        match self.victims.get_mut(&id) {
            Some(victim) => {
                victim.destroyed = true;
                true
            }
            None => false,
        }
    }

    /// Look up a victim.
    pub fn get(&self, id: VictimId) -> Option<&Victim> {
        self.victims.get(&id)
    }

    /// Look up a victim mutably.
    pub fn get_mut(&mut self, id: VictimId) -> Option<&mut Victim> {
        self.victims.get_mut(&id)
    }

    /// Body of a victim.
    pub fn body(&self, id: VictimId) -> Option<&VictimBody> {
        self.victims.get(&id).map(|v| &v.body)
    }

    /// Body of a victim, mutably.
    pub fn body_mut(&mut self, id: VictimId) -> Option<&mut VictimBody> {
        self.victims.get_mut(&id).map(|v| &mut v.body)
    }

    /// `id` still refers to a victim.
    pub fn contains(&self, id: VictimId) -> bool {
        self.victims.contains_key(&id)
    }

    /// Victim exists and is alive.
    pub fn is_alive(&self, id: VictimId) -> bool {
        self.victims.get(&id).is_some_and(Victim::is_alive)
    }

    /// Number of victims.
    pub fn len(&self) -> usize {
        self.victims.len()
    }

    /// No victims.
    pub fn is_empty(&self) -> bool {
        self.victims.is_empty()
    }

    /// Victims in id order.
    pub fn iter(&self) -> impl Iterator<Item = (VictimId, &Victim)> {
        self.victims.iter().map(|(id, v)| (*id, v))
    }

    /// Deliver `interaction` to victim `id`.
    ///
    /// Returns `None` for a stale id. Positional effects are applied for
    /// every victim; the controller only sees declared kinds. A bite the
    /// controller does not handle destroys the victim.
    pub fn deliver(&mut self, id: VictimId, interaction: &VictimInteraction) -> Option<InteractionOutcome> {
        let victim = self.victims.get_mut(&id)?;
        let body = &mut victim.body;

        match *interaction {
            VictimInteraction::Grab { creature } => {
                body.held_by = Some(creature);
            }
            VictimInteraction::Dangle { pose, .. } => {
                body.position = pose.position;
                body.is_dangling = pose.lifted;
                if pose.lifted {
                    body.standing = false;
                }
            }
            VictimInteraction::Bite { .. } => {}
            VictimInteraction::Release { restore_standing, .. } => {
                body.held_by = None;
                body.is_dangling = false;
                body.standing = restore_standing;
            }
        }

        let outcome = if victim.controller.interactions().contains(interaction.kind()) {
            victim.controller.handle(&mut victim.body, interaction)
        } else if interaction.kind() == InteractionKinds::BITE {
            InteractionOutcome::Killed
        } else {
            InteractionOutcome::Ignored
        };

        if outcome == InteractionOutcome::Killed {
            victim.destroyed = true;
        }

        Some(outcome)
    }
}
