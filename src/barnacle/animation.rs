//! Animation Seam
//!
//! The creature asks for activities through
//! [`BarnacleEvent::ActivityRequested`](crate::barnacle::events::BarnacleEvent)
//! and learns about playback through [`AnimationTrigger`] tick inputs. Hosts
//! wire these to their own animation system; [`TimedAnimator`] is a
//! deterministic stand-in with fixed clip lengths.

use serde::{Deserialize, Serialize};

/// Animation activity the creature can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Activity {
    /// Idle hang.
    Idle = 0,
    /// Reeling the tongue in.
    Slurp = 1,
    /// Biting a humanoid NPC.
    BiteHuman = 2,
    /// Biting the player.
    BitePlayer = 3,
    /// Biting something small.
    BiteSmallThings = 4,
    /// Chewing a humanoid.
    ChewHuman = 5,
    /// Chewing something small.
    ChewSmallThings = 6,
    /// Spitting humanoid remains.
    BarfHuman = 7,
    /// Tongue wrapping around a victim.
    TongueWrap = 8,
    /// Spitting out something inedible.
    TasteSpit = 9,
    /// Death.
    Die = 10,
}

impl Activity {
    /// One of the bite activities.
    #[inline]
    pub fn is_bite(self) -> bool {
        matches!(self, Activity::BiteHuman | Activity::BitePlayer | Activity::BiteSmallThings)
    }

    /// One of the chew activities.
    #[inline]
    pub fn is_chew(self) -> bool {
        matches!(self, Activity::ChewHuman | Activity::ChewSmallThings)
    }

    /// Plays until replaced instead of finishing.
    #[inline]
    pub fn loops(self) -> bool {
        matches!(self, Activity::Idle | Activity::Slurp)
    }

    /// Clip length in seconds used by [`TimedAnimator`].
    pub fn duration(self) -> f32 {
        match self {
            Activity::Idle => 2.0,
            Activity::Slurp => 1.0,
            Activity::BiteHuman => 1.2,
            Activity::BitePlayer | Activity::BiteSmallThings => 0.8,
            Activity::ChewHuman => 2.0,
            Activity::ChewSmallThings => 1.0,
            Activity::BarfHuman => 1.5,
            Activity::TongueWrap => 0.5,
            Activity::TasteSpit => 1.2,
            Activity::Die => 1.5,
        }
    }

    /// Seconds into the clip at which the jaws close.
    pub fn strike_point(self) -> Option<f32> {
        match self {
            Activity::BiteHuman => Some(0.5),
            Activity::BitePlayer | Activity::BiteSmallThings => Some(0.3),
            _ => None,
        }
    }
}

/// Playback notification fed back into the creature's tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationTrigger {
    /// Jaws closed mid-bite.
    BiteStrike,
    /// A non-looping activity reached its end.
    Finished(Activity),
}

/// Fixed-length clip player.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimedAnimator {
    current: Option<Activity>,
    elapsed: f32,
    struck: bool,
}

impl TimedAnimator {
    /// Nothing playing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activity being played.
    pub fn current(&self) -> Option<Activity> {
        self.current
    }

    /// Start `activity` from the beginning, replacing whatever was playing.
    pub fn play(&mut self, activity: Activity) {
        self.current = Some(activity);
        self.elapsed = 0.0;
        self.struck = false;
    }

    /// Advance playback by `dt` and report what happened.
    pub fn advance(&mut self, dt: f32) -> Vec<AnimationTrigger> {
        let mut triggers = Vec::new();
        let Some(activity) = self.current else {
            return triggers;
        };

        self.elapsed += dt.max(0.0);

        if let Some(strike) = activity.strike_point() {
            if !self.struck && self.elapsed >= strike {
                self.struck = true;
                triggers.push(AnimationTrigger::BiteStrike);
            }
        }

        let duration = activity.duration();
        if self.elapsed >= duration {
            if activity.loops() {
                self.elapsed %= duration;
            } else {
                triggers.push(AnimationTrigger::Finished(activity));
                self.current = None;
            }
        }

        triggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn run(animator: &mut TimedAnimator, seconds: f32) -> Vec<AnimationTrigger> {
        let steps = (seconds / DT).ceil() as u32;
        (0..steps).flat_map(|_| animator.advance(DT)).collect()
    }

    #[test]
    fn test_bite_strikes_then_finishes() {
        let mut animator = TimedAnimator::new();
        animator.play(Activity::BitePlayer);

        let triggers = run(&mut animator, 1.0);
        assert_eq!(
            triggers,
            vec![AnimationTrigger::BiteStrike, AnimationTrigger::Finished(Activity::BitePlayer)]
        );
        assert_eq!(animator.current(), None);
    }

    #[test]
    fn test_looping_activity_never_finishes() {
        let mut animator = TimedAnimator::new();
        animator.play(Activity::Slurp);
        assert!(run(&mut animator, 5.0).is_empty());
        assert_eq!(animator.current(), Some(Activity::Slurp));
    }

    #[test]
    fn test_replay_restarts_clip() {
        let mut animator = TimedAnimator::new();
        animator.play(Activity::ChewHuman);
        run(&mut animator, 1.5);
        animator.play(Activity::ChewHuman);
        assert!(run(&mut animator, 1.5).is_empty());
        assert_eq!(run(&mut animator, 1.0), vec![AnimationTrigger::Finished(Activity::ChewHuman)]);
    }

    #[test]
    fn test_idle_animator_is_silent() {
        let mut animator = TimedAnimator::new();
        assert!(animator.advance(DT).is_empty());
    }

    #[test]
    fn test_activity_groups() {
        assert!(Activity::BiteSmallThings.is_bite());
        assert!(Activity::ChewSmallThings.is_chew());
        assert!(!Activity::TasteSpit.is_bite());
        assert!(Activity::Slurp.loops());
    }
}
