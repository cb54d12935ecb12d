//! In-game overlay: lives, loop, score and the mute marker

use glam::Vec2;

use super::{palette, DrawList, TextAlign};
use crate::consts::GAME_WIDTH;
use crate::sim::SessionState;

pub const HUD_HEIGHT: f32 = 18.0;

pub fn draw_hud(session: &SessionState, muted: bool, draw: &mut DrawList) {
    draw.rect_alpha(Vec2::ZERO, Vec2::new(GAME_WIDTH, HUD_HEIGHT), palette::BLACK, 0.35);

    let y = HUD_HEIGHT / 2.0 + 1.0;
    let lives = if session.lives > 0 {
        "\u{2665} ".repeat(session.lives as usize).trim_end().to_string()
    } else {
        "\u{2665} 0".to_string()
    };
    draw.text_aligned(lives, Vec2::new(8.0, y), palette::BONE, 12.0, TextAlign::Left);
    draw.text_aligned(
        format!("Loop {}", session.loop_count),
        Vec2::new(GAME_WIDTH / 2.0, y),
        palette::SAND,
        12.0,
        TextAlign::Center,
    );
    let mute = if muted { " [M]" } else { "" };
    draw.text_aligned(
        format!("{}{}", session.score, mute),
        Vec2::new(GAME_WIDTH - 8.0, y),
        palette::BONE,
        12.0,
        TextAlign::Right,
    );
}
