//! Desert palette

use super::Color;

pub const SAND: Color = Color::rgb(0xFF, 0xBF, 0x00);
pub const OCHRE: Color = Color::rgb(0xCC, 0x77, 0x22);
pub const BURNT_ORANGE: Color = Color::rgb(0xCC, 0x55, 0x00);
pub const DEEP_BROWN: Color = Color::rgb(0x3B, 0x22, 0x00);
pub const BONE: Color = Color::rgb(0xF5, 0xF0, 0xDC);
pub const SPICE_BLUE: Color = Color::rgb(0x34, 0x98, 0xDB);
pub const BLACK: Color = Color::rgb(0x0A, 0x08, 0x00);
pub const GAME_OVER_RED: Color = Color::rgb(0x1A, 0x05, 0x00);
pub const ROCK_GREY: Color = Color::rgb(0x7A, 0x70, 0x66);
pub const SAFE_GREEN: Color = Color::rgb(0x5E, 0x9E, 0x4A);
pub const QUICKSAND: Color = Color::rgb(0x9C, 0x6B, 0x30);
pub const GEYSER: Color = Color::rgb(0xE8, 0xE0, 0xC0);
pub const WORM: Color = Color::rgb(0x8B, 0x5A, 0x2B);
