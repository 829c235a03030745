//! Built-in victim controllers.

use std::any::Any;

use crate::barnacle::victim::{
    InteractionKinds, InteractionOutcome, VictimBody, VictimController, VictimInteraction,
};

/// Starting health of the controlled player.
pub const PLAYER_HEALTH: f32 = 100.0;

// =============================================================================
// PLAYER
// =============================================================================

/// The controlled player: loses input while held, takes bite damage.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerController {
    /// Remaining health.
    pub health: f32,
    /// Movement input is ignored while held.
    pub input_suspended: bool,
    /// Times grabbed.
    pub grabs: u32,
    /// Times bitten.
    pub bites: u32,
    /// Ticks spent dangling.
    pub dangle_ticks: u32,
}

impl PlayerController {
    /// Healthy, free player.
    pub fn new() -> Self {
        Self {
            health: PLAYER_HEALTH,
            input_suspended: false,
            grabs: 0,
            bites: 0,
            dangle_ticks: 0,
        }
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new()
    }
}

impl VictimController for PlayerController {
    fn interactions(&self) -> InteractionKinds {
        InteractionKinds::ALL
    }

    fn handle(&mut self, _body: &mut VictimBody, interaction: &VictimInteraction) -> InteractionOutcome {
        match *interaction {
            VictimInteraction::Grab { .. } => {
                self.input_suspended = true;
                self.grabs += 1;
            }
            VictimInteraction::Dangle { .. } => {
                self.dangle_ticks += 1;
            }
            VictimInteraction::Bite { damage, lethal, .. } => {
                self.bites += 1;
                self.health = if lethal { 0.0 } else { self.health - damage };
                return if self.health <= 0.0 {
                    InteractionOutcome::Killed
                } else {
                    InteractionOutcome::Survived
                };
            }
            VictimInteraction::Release { .. } => {
                self.input_suspended = false;
            }
        }
        InteractionOutcome::Acknowledged
    }

    fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    fn clone_box(&self) -> Box<dyn VictimController> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// HUMANOID NPC
// =============================================================================

/// Humanoid NPC: struggles while held, ragdolls on a lethal bite.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HumanoidController {
    /// Killed.
    pub dead: bool,
    /// Turned into a ragdoll.
    pub ragdolled: bool,
    /// Struggling in the tongue.
    pub struggling: bool,
}

impl HumanoidController {
    /// Living NPC.
    pub fn new() -> Self {
        Self::default()
    }

    /// NPC that is already a corpse.
    pub fn corpse() -> Self {
        Self { dead: true, ragdolled: true, struggling: false }
    }
}

impl VictimController for HumanoidController {
    fn interactions(&self) -> InteractionKinds {
        InteractionKinds::ALL
    }

    fn handle(&mut self, body: &mut VictimBody, interaction: &VictimInteraction) -> InteractionOutcome {
        match *interaction {
            VictimInteraction::Grab { .. } => {
                self.struggling = !self.dead;
            }
            VictimInteraction::Dangle { .. } => {}
            VictimInteraction::Bite { lethal, .. } => {
                if !lethal {
                    return InteractionOutcome::Survived;
                }
                self.dead = true;
                self.ragdolled = true;
                self.struggling = false;
                body.standing = false;
                return InteractionOutcome::Killed;
            }
            VictimInteraction::Release { .. } => {
                self.struggling = false;
                if self.dead {
                    body.standing = false;
                }
            }
        }
        InteractionOutcome::Acknowledged
    }

    fn is_alive(&self) -> bool {
        !self.dead
    }

    fn clone_box(&self) -> Box<dyn VictimController> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// PROP / DEBRIS
// =============================================================================

/// Physics prop: only notices being grabbed and dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropController {
    /// Currently held.
    pub held: bool,
}

impl PropController {
    /// Free prop.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VictimController for PropController {
    fn interactions(&self) -> InteractionKinds {
        InteractionKinds::GRAB | InteractionKinds::RELEASE
    }

    fn handle(&mut self, _body: &mut VictimBody, interaction: &VictimInteraction) -> InteractionOutcome {
        match interaction {
            VictimInteraction::Grab { .. } => self.held = true,
            VictimInteraction::Release { .. } => self.held = false,
            _ => return InteractionOutcome::Ignored,
        }
        InteractionOutcome::Acknowledged
    }

    fn is_alive(&self) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn VictimController> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
