//! Death and success bookkeeping shared by the three levels
//!
//! Every death costs exactly one life whatever its cause; the cause is only
//! shown to the player.

use glam::Vec2;

use super::fsm::{Ctx, StateId};
use super::level2::EnemyKind;
use crate::audio::SoundEffect;

/// What killed the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Level 1: ran into the head
    WormHead,
    /// Level 1: pressed the wrong hook symbol
    WrongSymbol,
    /// Level 1: hook challenge ran out of time
    TooSlow,
    /// Level 2: hit a large enemy
    Devoured(EnemyKind),
    /// Level 3: stayed on a segment that went under
    Swallowed,
    /// Level 3: landed in quicksand
    Quicksand,
    /// Level 3: landed on an erupting geyser
    Geyser,
    /// Level 3: landed on open sand
    MissedLanding,
}

impl DeathCause {
    pub fn label(&self) -> &'static str {
        match self {
            DeathCause::WormHead => "Crushed by the worm",
            DeathCause::WrongSymbol => "The hook slipped",
            DeathCause::TooSlow => "Too slow to hook on",
            DeathCause::Devoured(EnemyKind::Soldier) => "Cut down by soldiers",
            DeathCause::Devoured(EnemyKind::Harvester) => "Smashed into a harvester",
            DeathCause::Devoured(EnemyKind::Ornithopter) => "Shot down by an ornithopter",
            DeathCause::Swallowed => "Swallowed by the sand",
            DeathCause::Quicksand => "Sank in quicksand",
            DeathCause::Geyser => "Caught by a spice geyser",
            DeathCause::MissedLanding => "Missed the rocks",
        }
    }
}

/// Countdown used for the death and success pauses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pause {
    remaining: f32,
}

impl Pause {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// Advance; true once the pause has run out
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }
}

/// Where a finished death pause leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterDeath {
    Retry,
    GameOver,
}

/// Apply a death: one life, feedback, and the retry decision
pub fn register_death(ctx: &mut Ctx<'_>, cause: DeathCause, at: Vec2) -> AfterDeath {
    log::info!("Death on loop {}: {}", ctx.session.loop_count, cause.label());
    ctx.session.last_death = Some(cause);
    ctx.audio.play(SoundEffect::Death);
    ctx.effects.death_burst(at);
    if ctx.session.lose_life() {
        AfterDeath::Retry
    } else {
        AfterDeath::GameOver
    }
}

/// Resolve a finished death pause; returns true when the level should retry
pub fn finish_death(ctx: &mut Ctx<'_>, after: AfterDeath) -> bool {
    match after {
        AfterDeath::Retry => true,
        AfterDeath::GameOver => {
            ctx.switch_to(StateId::GameOver);
            false
        }
    }
}

/// Success feedback shared by the levels
pub fn register_success(ctx: &mut Ctx<'_>, at: Vec2) {
    ctx.audio.play(SoundEffect::Success);
    ctx.effects.success_burst(at);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_counts_down() {
        let mut p = Pause::new(0.1);
        assert!(!p.tick(0.05));
        assert!(p.tick(0.05));
        assert_eq!(p.remaining(), 0.0);
    }

    #[test]
    fn test_every_cause_has_a_label() {
        let causes = [
            DeathCause::WormHead,
            DeathCause::WrongSymbol,
            DeathCause::TooSlow,
            DeathCause::Devoured(EnemyKind::Harvester),
            DeathCause::Swallowed,
            DeathCause::Quicksand,
            DeathCause::Geyser,
            DeathCause::MissedLanding,
        ];
        assert!(causes.iter().all(|c| !c.label().is_empty()));
        assert_eq!(DeathCause::WormHead.label(), "Crushed by the worm");
    }
}
