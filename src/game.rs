//! Host-facing game context
//!
//! `Game` owns the session, the screen registry, and the intent queues. A
//! host calls [`Game::frame`] once per display frame with that frame's input
//! snapshot and wall-clock delta, then consumes the returned intents.

use serde::Serialize;

use crate::audio::{AudioCommand, AudioManager};
use crate::effects::{EffectCommand, Effects};
use crate::error::GameError;
use crate::persistence::Storage;
use crate::platform::{InputSnapshot, Key};
use crate::renderer::hud::draw_hud;
use crate::renderer::{DrawCommand, DrawList};
use crate::settings::Settings;
use crate::sim::{
    Ctx, DismountLevel, GameOverScreen, MountLevel, RideLevel, SessionState, StateId,
    StateMachine, TitleScreen,
};
use crate::tuning::Tuning;

/// Transitions requested from inside `enter()` are followed at most this deep
const MAX_CHAINED_TRANSITIONS: usize = 4;

/// Everything one frame produced for the host
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameOutput {
    pub draw: Vec<DrawCommand>,
    pub audio: Vec<AudioCommand>,
    pub effects: Vec<EffectCommand>,
    /// Active screen after this frame's transition (if any) was applied
    pub state: Option<StateId>,
}

/// State screens share through `Ctx`
struct Shared {
    session: SessionState,
    tuning: Tuning,
    audio: AudioManager,
    effects: Effects,
    storage: Box<dyn Storage>,
}

impl Shared {
    fn ctx<'a>(&'a mut self, input: &'a InputSnapshot) -> Ctx<'a> {
        Ctx::new(
            &mut self.session,
            input,
            &self.tuning,
            &mut self.audio,
            &mut self.effects,
            &mut *self.storage,
        )
    }
}

pub struct Game {
    fsm: StateMachine,
    shared: Shared,
    settings: Settings,
    draw: DrawList,
    frame_count: u64,
}

impl Game {
    /// Build the level graph and enter the title screen
    pub fn new(
        seed: u64,
        tuning: Tuning,
        settings: Settings,
        storage: Box<dyn Storage>,
    ) -> Result<Self, GameError> {
        let mut session = SessionState::new(seed, tuning.session.initial_lives);
        session.load_high_scores(&*storage);

        let mut fsm = StateMachine::new();
        fsm.register_state(StateId::Title, Box::new(TitleScreen));
        fsm.register_state(StateId::Level1, Box::new(MountLevel::new()));
        fsm.register_state(StateId::Level2, Box::new(RideLevel::new()));
        fsm.register_state(StateId::Level3, Box::new(DismountLevel::new()));
        fsm.register_state(StateId::GameOver, Box::new(GameOverScreen::default()));

        let mut game = Self {
            fsm,
            shared: Shared {
                session,
                audio: AudioManager::new(&settings),
                effects: Effects::new(&settings),
                tuning,
                storage,
            },
            settings,
            draw: DrawList::new(),
            frame_count: 0,
        };
        game.apply_transition(StateId::Title)?;

        log::info!("Game created with seed {seed}");
        Ok(game)
    }

    /// Advance one frame: update, render, HUD, then the queued transition
    pub fn frame(&mut self, input: &InputSnapshot, dt: f32) -> Result<FrameOutput, GameError> {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.shared.tuning.session.max_dt)
        } else {
            0.0
        };
        self.frame_count += 1;

        if input.was_pressed(Key::M) {
            self.toggle_mute();
        }

        let next = {
            let mut ctx = self.shared.ctx(input);
            self.fsm.update(&mut ctx, dt)?;
            ctx.take_transition()
        };

        self.fsm.render(&self.shared.session, &mut self.draw)?;
        if self.fsm.shows_hud() {
            draw_hud(&self.shared.session, self.shared.audio.is_muted(), &mut self.draw);
        }

        if let Some(id) = next {
            self.apply_transition(id)?;
        }

        Ok(FrameOutput {
            draw: self.draw.take(),
            audio: self.shared.audio.drain(),
            effects: self.shared.effects.drain(),
            state: self.fsm.active(),
        })
    }

    /// Switch to `id`, following any switch the new screen asks for on entry
    fn apply_transition(&mut self, id: StateId) -> Result<(), GameError> {
        let input = InputSnapshot::empty();
        let mut next = Some(id);
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            let Some(id) = next else {
                return Ok(());
            };
            let mut ctx = self.shared.ctx(&input);
            self.fsm.switch_state(id, &mut ctx)?;
            next = ctx.take_transition();
        }
        if let Some(id) = next {
            log::warn!("Dropping transition to {id}: too many chained switches");
        }
        Ok(())
    }

    fn toggle_mute(&mut self) {
        let muted = self.shared.audio.toggle_mute();
        self.settings.muted = muted;
        self.settings.save(&mut *self.shared.storage);
    }

    pub fn session(&self) -> &SessionState {
        &self.shared.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.shared.tuning
    }

    pub fn state(&self) -> Option<StateId> {
        self.fsm.active()
    }

    pub fn is_muted(&self) -> bool {
        self.shared.audio.is_muted()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MusicTrack;
    use crate::highscores::HighScores;
    use crate::persistence::MemoryStorage;
    use crate::renderer::palette;

    const DT: f32 = 1.0 / 60.0;

    fn new_game() -> Game {
        Game::new(
            42,
            Tuning::default(),
            Settings::default(),
            Box::new(MemoryStorage::new()),
        )
        .unwrap()
    }

    fn texts(out: &FrameOutput) -> Vec<String> {
        out.draw
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_starts_on_title() {
        let mut game = new_game();
        assert_eq!(game.state(), Some(StateId::Title));

        let out = game.frame(&InputSnapshot::empty(), DT).unwrap();
        assert!(out.audio.iter().any(|c| matches!(
            c,
            AudioCommand::PlayMusic { track: MusicTrack::Title, .. }
        )));
        assert!(texts(&out).iter().any(|t| t == "SHAI-HULUD"));
        // no HUD on the title screen
        assert!(!texts(&out).iter().any(|t| t.starts_with("Loop")));
    }

    #[test]
    fn test_transition_applies_after_render() {
        let mut game = new_game();
        let out = game
            .frame(&InputSnapshot::pressing(&[Key::Enter]), DT)
            .unwrap();
        // the title finished its frame; the switch is visible afterwards
        assert_eq!(out.draw.first(), Some(&DrawCommand::Clear(palette::DEEP_BROWN)));
        assert_eq!(out.state, Some(StateId::Level1));
        assert!(out.audio.iter().any(|c| matches!(
            c,
            AudioCommand::PlayMusic { track: MusicTrack::Mount, .. }
        )));

        let out = game.frame(&InputSnapshot::empty(), DT).unwrap();
        let texts = texts(&out);
        assert!(texts.iter().any(|t| t == "Loop 1"));
        assert!(texts.iter().any(|t| t == "0"));
    }

    #[test]
    fn test_mute_toggle_persists() {
        let mut game = new_game();
        game.frame(&InputSnapshot::pressing(&[Key::Enter]), DT).unwrap();

        let out = game.frame(&InputSnapshot::pressing(&[Key::M]), DT).unwrap();
        assert!(game.is_muted());
        assert!(game.settings().muted);
        assert!(texts(&out).iter().any(|t| t.ends_with("[M]")));
        assert_eq!(game.state(), Some(StateId::Level1));

        let out = game.frame(&InputSnapshot::pressing(&[Key::M]), DT).unwrap();
        assert!(!game.is_muted());
        // unmuting resumes the level's track at the configured music volume
        let settings = Settings::default();
        let expected = settings.master_volume * settings.music_volume;
        assert!(out.audio.iter().any(|c| matches!(
            c,
            AudioCommand::PlayMusic { track: MusicTrack::Mount, volume } if (volume - expected).abs() < 1e-6
        )));
    }

    #[test]
    fn test_oversized_dt_is_clamped() {
        let mut game = new_game();
        game.frame(&InputSnapshot::pressing(&[Key::Enter]), DT).unwrap();
        // a multi-second hitch must not skip through the level
        game.frame(&InputSnapshot::empty(), 10.0).unwrap();
        game.frame(&InputSnapshot::empty(), f32::NAN).unwrap();
        assert_eq!(game.state(), Some(StateId::Level1));
        assert_eq!(game.session().lives, game.tuning().session.initial_lives);
        assert_eq!(game.frame_count(), 3);
    }

    #[test]
    fn test_loads_high_scores() {
        let mut storage = MemoryStorage::new();
        let mut scores = HighScores::new();
        scores.add_score(5000, Some(3), "ABC");
        scores.save(&mut storage);

        let mut game = Game::new(1, Tuning::default(), Settings::default(), Box::new(storage)).unwrap();
        assert_eq!(game.session().high_score, 5000);
        let out = game.frame(&InputSnapshot::empty(), DT).unwrap();
        assert!(texts(&out).iter().any(|t| t.contains("ABC") && t.contains("5000")));
    }

    #[test]
    fn test_frame_output_serializes() {
        let mut game = new_game();
        let out = game.frame(&InputSnapshot::empty(), DT).unwrap();
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"state\":\"Title\""));
    }
}
