//! Title and game-over screens that bracket the loop

use glam::Vec2;

use super::fsm::{Ctx, GameScreen, StateId};
use super::state::SessionState;
use crate::audio::{MusicTrack, SoundEffect};
use crate::consts::{GAME_HEIGHT, GAME_WIDTH};
use crate::highscores::DEFAULT_INITIALS;
use crate::platform::{InputSnapshot, Key};
use crate::renderer::{palette, DrawList};

/// "Press any key", except the mute toggle
fn continue_pressed(input: &InputSnapshot) -> bool {
    input.presses().iter().any(|k| *k != Key::M)
}

#[derive(Debug, Default)]
pub struct TitleScreen;

impl GameScreen for TitleScreen {
    fn enter(&mut self, ctx: &mut Ctx<'_>) {
        ctx.audio.play_music(MusicTrack::Title);
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, _dt: f32) {
        if continue_pressed(ctx.input) {
            ctx.session.reset_game();
            ctx.audio.play(SoundEffect::Transition);
            ctx.switch_to(StateId::Level1);
        }
    }

    fn render(&self, session: &SessionState, draw: &mut DrawList) {
        let cx = GAME_WIDTH / 2.0;
        let cy = GAME_HEIGHT / 2.0;
        draw.clear(palette::DEEP_BROWN);
        draw.text("SHAI-HULUD", Vec2::new(cx, cy - 60.0), palette::SAND, 48.0);
        draw.text("Press any key to start", Vec2::new(cx, cy), palette::BONE, 16.0);

        for (i, entry) in session.high_scores.entries.iter().enumerate() {
            let loop_label = entry
                .loop_reached
                .map(|l| format!("L{l}"))
                .unwrap_or_else(|| "--".to_string());
            draw.text(
                format!("{}. {:<3} {:>7} {}", i + 1, entry.initials, entry.score, loop_label),
                Vec2::new(cx, cy + 40.0 + 16.0 * i as f32),
                palette::OCHRE,
                12.0,
            );
        }
    }
}

/// Final score, leaderboard placement, back to title on any key
#[derive(Debug, Default)]
pub struct GameOverScreen {
    rank: Option<usize>,
}

impl GameScreen for GameOverScreen {
    fn enter(&mut self, ctx: &mut Ctx<'_>) {
        ctx.audio.stop_music();
        self.rank = None;
        if ctx.session.score_qualifies() {
            self.rank = ctx.session.record_score(DEFAULT_INITIALS);
            ctx.session.save_high_scores(ctx.storage);
        }
        log::info!(
            "Game over: score {} on loop {} (rank {:?})",
            ctx.session.score,
            ctx.session.loop_count,
            self.rank
        );
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, _dt: f32) {
        if continue_pressed(ctx.input) {
            ctx.audio.play(SoundEffect::Transition);
            ctx.switch_to(StateId::Title);
        }
    }

    fn render(&self, session: &SessionState, draw: &mut DrawList) {
        let cx = GAME_WIDTH / 2.0;
        let cy = GAME_HEIGHT / 2.0;
        draw.clear(palette::GAME_OVER_RED);
        draw.text("GAME OVER", Vec2::new(cx, cy - 60.0), palette::BURNT_ORANGE, 48.0);
        if let Some(cause) = session.last_death {
            draw.text(cause.label(), Vec2::new(cx, cy - 25.0), palette::OCHRE, 14.0);
        }
        draw.text(
            format!("Score {}   Loop {}", session.score, session.loop_count),
            Vec2::new(cx, cy + 5.0),
            palette::SAND,
            16.0,
        );
        if let Some(rank) = self.rank {
            draw.text(format!("New high score #{rank}"), Vec2::new(cx, cy + 28.0), palette::BONE, 14.0);
        }
        draw.text("Press any key to restart", Vec2::new(cx, cy + 60.0), palette::BONE, 16.0);
    }
}
