//! Audio intents
//!
//! The simulation never synthesizes sound. It queues `AudioCommand`s which
//! the host drains each frame and hands to whatever synth the platform has.

use serde::Serialize;

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SoundEffect {
    /// Player leaves the ground
    Jump,
    /// A hook symbol was entered correctly
    HookPlant,
    /// Worm swallows an enemy
    Eat,
    /// Player died
    Death,
    /// Level completed
    Success,
    /// Worm surfaces nearby
    WormRumble,
    /// Screen change
    Transition,
    /// Survived a cluster of large enemies
    CloseCall,
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MusicTrack {
    Title,
    Mount,
    Ride,
    Dismount,
}

/// Fire-and-forget audio request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AudioCommand {
    PlayMusic { track: MusicTrack, volume: f32 },
    StopMusic,
    Sfx { effect: SoundEffect, volume: f32 },
    /// Music intensity in 0..=1 (e.g. how many threats are close)
    SetMusicIntensity(f32),
}

/// Audio manager for the game
///
/// Tracks mute/volume state and the current track so redundant requests are
/// dropped before they reach the host.
#[derive(Debug)]
pub struct AudioManager {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    current_track: Option<MusicTrack>,
    intensity: f32,
    queue: Vec<AudioCommand>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            music_volume: settings.music_volume.clamp(0.0, 1.0),
            muted: settings.muted,
            current_track: None,
            intensity: 0.0,
            queue: Vec::new(),
        }
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    fn music_command(&self, track: MusicTrack) -> AudioCommand {
        AudioCommand::PlayMusic {
            track,
            volume: self.master_volume * self.music_volume,
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let volume = self.effective_volume();
        if volume <= 0.0 {
            return;
        }
        self.queue.push(AudioCommand::Sfx { effect, volume });
    }

    /// Start a track (no-op if it is already the current one)
    pub fn play_music(&mut self, track: MusicTrack) {
        if self.current_track == Some(track) {
            return;
        }
        self.current_track = Some(track);
        self.intensity = 0.0;
        if !self.muted {
            self.queue.push(self.music_command(track));
        }
    }

    pub fn stop_music(&mut self) {
        if self.current_track.take().is_some() && !self.muted {
            self.queue.push(AudioCommand::StopMusic);
        }
    }

    /// Set music intensity; changes smaller than 5% are ignored
    pub fn set_music_intensity(&mut self, intensity: f32) {
        let intensity = intensity.clamp(0.0, 1.0);
        if (intensity - self.intensity).abs() < 0.05 {
            return;
        }
        self.intensity = intensity;
        if !self.muted {
            self.queue.push(AudioCommand::SetMusicIntensity(intensity));
        }
    }

    /// Toggle mute; returns the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if self.muted {
            self.queue.push(AudioCommand::StopMusic);
        } else if let Some(track) = self.current_track {
            self.queue.push(self.music_command(track));
        }
        log::info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Take everything queued since the last drain
    pub fn drain(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.queue)
    }
}
