//! Cosmetic effect intents - screen shake, flash, particles
//!
//! Fired at simulation events (death, kill, success, near-miss). The host
//! decides how they look; nothing here feeds back into gameplay.

use glam::Vec2;
use serde::Serialize;

use crate::renderer::{palette, Color};
use crate::settings::Settings;

/// Fire-and-forget cosmetic request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EffectCommand {
    Shake { intensity: f32, duration: f32 },
    Flash { color: Color, duration: f32 },
    Particles { pos: Vec2, count: u32, color: Color, speed: f32 },
}

/// Queue of cosmetic requests, filtered by the player's settings
#[derive(Debug)]
pub struct Effects {
    shake_enabled: bool,
    flash_enabled: bool,
    particles_enabled: bool,
    queue: Vec<EffectCommand>,
}

impl Effects {
    pub fn new(settings: &Settings) -> Self {
        Self {
            shake_enabled: settings.effective_screen_shake(),
            flash_enabled: settings.effective_flashes(),
            particles_enabled: settings.particles,
            queue: Vec::new(),
        }
    }

    pub fn trigger_shake(&mut self, intensity: f32, duration: f32) {
        if self.shake_enabled {
            self.queue.push(EffectCommand::Shake { intensity, duration });
        }
    }

    pub fn trigger_flash(&mut self, color: Color, duration: f32) {
        if self.flash_enabled {
            self.queue.push(EffectCommand::Flash { color, duration });
        }
    }

    pub fn spawn_particles(&mut self, pos: Vec2, count: u32, color: Color, speed: f32) {
        if self.particles_enabled && count > 0 {
            self.queue.push(EffectCommand::Particles {
                pos,
                count,
                color,
                speed,
            });
        }
    }

    /// Standard death feedback
    pub fn death_burst(&mut self, pos: Vec2) {
        self.trigger_shake(5.0, 0.3);
        self.trigger_flash(palette::BURNT_ORANGE, 0.15);
        self.spawn_particles(pos, 24, palette::BURNT_ORANGE, 80.0);
    }

    /// Standard success feedback
    pub fn success_burst(&mut self, pos: Vec2) {
        self.trigger_flash(palette::BONE, 0.15);
        self.spawn_particles(pos, 16, palette::SAND, 60.0);
    }

    /// Take everything queued since the last drain
    pub fn drain(&mut self) -> Vec<EffectCommand> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_keeps_particles_only() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        let mut fx = Effects::new(&settings);
        fx.death_burst(Vec2::ZERO);
        let cmds = fx.drain();
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], EffectCommand::Particles { count: 24, .. }));
    }

    #[test]
    fn test_default_settings_emit_all() {
        let mut fx = Effects::new(&Settings::default());
        fx.death_burst(Vec2::new(10.0, 10.0));
        assert_eq!(fx.drain().len(), 3);
        assert!(fx.drain().is_empty());
    }
}
