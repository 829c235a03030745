//! Tick Inputs
//!
//! Everything from outside the creature that can affect one step: scripted
//! commands, physical impacts and animation triggers. Inputs are applied in
//! the order they are listed.

use serde::{Deserialize, Serialize};

use crate::barnacle::animation::{Activity, AnimationTrigger};
use crate::barnacle::damage::PhysicsImpact;

/// Scripted control of the creature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BarnacleCommand {
    /// Let go of whatever is held and lower the tongue.
    DropTongue,
    /// Override the tongue's reel-out speed (units/s).
    SetDropTongueSpeed(f32),
    /// Release a held victim; no effect when nothing is held.
    LetGo,
    /// Kill the creature outright.
    Kill,
    /// Apply direct damage.
    TakeDamage(f32),
}

/// Inputs for one simulation step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Step length in seconds. Steps longer than one tick are integrated in
    /// tick-sized pieces, up to one second per step.
    pub dt: f32,
    /// Scripted commands.
    pub commands: Vec<BarnacleCommand>,
    /// Collisions against the creature's body.
    pub impacts: Vec<PhysicsImpact>,
    /// Animation playback triggers.
    pub triggers: Vec<AnimationTrigger>,
}

impl TickInput {
    /// Empty input for a step of `dt` seconds.
    pub fn new(dt: f32) -> Self {
        Self { dt, commands: Vec::new(), impacts: Vec::new(), triggers: Vec::new() }
    }

    /// Add a command.
    pub fn with_command(mut self, command: BarnacleCommand) -> Self {
        self.commands.push(command);
        self
    }

    /// Add an impact.
    pub fn with_impact(mut self, impact: PhysicsImpact) -> Self {
        self.impacts.push(impact);
        self
    }

    /// Add an animation trigger.
    pub fn with_trigger(mut self, trigger: AnimationTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// A bite-strike trigger arrived this step.
    pub fn bite_struck(&self) -> bool {
        self.triggers.contains(&AnimationTrigger::BiteStrike)
    }

    /// An activity matching `activity_matches` finished this step.
    pub fn finished(&self, activity_matches: impl Fn(Activity) -> bool) -> bool {
        self.triggers.iter().any(|t| matches!(t, AnimationTrigger::Finished(a) if activity_matches(*a)))
    }
}

impl Default for TickInput {
    fn default() -> Self {
        Self::new(1.0 / crate::TICK_RATE as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let input = TickInput::new(0.1)
            .with_command(BarnacleCommand::SetDropTongueSpeed(20.0))
            .with_command(BarnacleCommand::DropTongue);
        assert_eq!(
            input.commands,
            vec![BarnacleCommand::SetDropTongueSpeed(20.0), BarnacleCommand::DropTongue]
        );
    }

    #[test]
    fn test_trigger_queries() {
        let input = TickInput::default()
            .with_trigger(AnimationTrigger::BiteStrike)
            .with_trigger(AnimationTrigger::Finished(Activity::ChewHuman));
        assert!(input.bite_struck());
        assert!(input.finished(Activity::is_chew));
        assert!(!input.finished(Activity::is_bite));
    }

    #[test]
    fn test_default_is_one_tick() {
        assert!((TickInput::default().dt - 1.0 / 60.0).abs() < 1e-9);
    }
}
