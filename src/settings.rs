//! Player preferences
//!
//! Persisted separately from high scores through the same `Storage` backend.

use serde::{Deserialize, Serialize};

use crate::persistence::{read_json, write_json, Storage};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Start muted
    pub muted: bool,

    // === Visual Effects ===
    /// Screen shake on deaths/impacts
    pub screen_shake: bool,
    /// Full-screen color flashes
    pub flashes: bool,
    /// Particle bursts
    pub particles: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses shake and flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.3,
            sfx_volume: 0.6,
            music_volume: 0.4,
            muted: false,

            screen_shake: true,
            flashes: true,
            particles: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "shaiHulud_settings";

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective flash (respects reduced_motion)
    pub fn effective_flashes(&self) -> bool {
        self.flashes && !self.reduced_motion
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load(storage: &dyn Storage) -> Self {
        match read_json::<Settings>(storage, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unreadable ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Save settings; failures are logged and swallowed
    pub fn save(&self, storage: &mut dyn Storage) {
        match write_json(storage, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {e}"),
        }
    }

    fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self
    }
}
