//! Shai-Hulud - a looped three-stage desert worm arcade game
//!
//! Core modules:
//! - `sim`: Gameplay simulation (session, state machine, the three levels)
//! - `game`: Host-owned context that drives one frame at a time
//! - `platform`: Input snapshots built from raw key events
//! - `renderer`: Abstract draw intents (no pixels)
//! - `audio` / `effects`: Fire-and-forget audio and cosmetic intents
//! - `persistence`: Key-value storage with a versioned JSON envelope
//! - `tuning`: Data-driven game balance
//! - `web`: wasm-bindgen bridge for the browser host

pub mod audio;
pub mod effects;
pub mod error;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{GameError, StorageError};
pub use game::{FrameOutput, Game};
pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (all levels share one logical screen)
    pub const GAME_WIDTH: f32 = 640.0;
    pub const GAME_HEIGHT: f32 = 360.0;

    /// Largest frame delta the core will integrate (seconds)
    pub const MAX_DT: f32 = 0.05;
    /// Nominal host frame rate
    pub const TARGET_FPS: u32 = 60;

    /// Lives at the start of a run
    pub const INITIAL_LIVES: i32 = 3;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Shortest signed offset from `b` to `a` on an axis of length `size`.
///
/// Result lies in [-size/2, size/2).
#[inline]
pub fn wrap_axis_delta(a: f32, b: f32, size: f32) -> f32 {
    (a - b + size / 2.0).rem_euclid(size) - size / 2.0
}

/// Shortest offset from `b` to `a` on a torus of the given size
#[inline]
pub fn wrap_delta(a: Vec2, b: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(
        wrap_axis_delta(a.x, b.x, size.x),
        wrap_axis_delta(a.y, b.y, size.y),
    )
}

/// Wrap-aware distance between two points on a torus
#[inline]
pub fn wrap_distance(a: Vec2, b: Vec2, size: Vec2) -> f32 {
    wrap_delta(a, b, size).length()
}

/// Bring a position back inside [0, size) on both axes
#[inline]
pub fn wrap_position(p: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(p.x.rem_euclid(size.x), p.y.rem_euclid(size.y))
}

/// Value that grows by `per_loop` each loop after the first, capped at `max`
#[inline]
pub fn ramp_up(base: f32, per_loop: f32, loop_count: u32, max: f32) -> f32 {
    (base + per_loop * loop_count.saturating_sub(1) as f32).min(max)
}

/// Value that shrinks by `per_loop` each loop after the first, floored at `min`
#[inline]
pub fn ramp_down(base: f32, per_loop: f32, loop_count: u32, min: f32) -> f32 {
    (base - per_loop * loop_count.saturating_sub(1) as f32).max(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WORLD: Vec2 = Vec2::new(640.0, 360.0);

    #[test]
    fn test_wrap_distance_across_seam() {
        let a = Vec2::new(2.0, 100.0);
        let b = Vec2::new(WORLD.x - 2.0, 100.0);
        assert!((a - b).length() > 600.0);
        assert!((wrap_distance(a, b, WORLD) - 4.0).abs() < 1e-3);

        let c = Vec2::new(300.0, 1.0);
        let d = Vec2::new(300.0, WORLD.y - 1.0);
        assert!((wrap_distance(c, d, WORLD) - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_wrap_delta_points_the_short_way() {
        let a = Vec2::new(2.0, 0.0);
        let b = Vec2::new(WORLD.x - 2.0, 0.0);
        // a sits just past the seam to the right of b
        assert!((wrap_delta(a, b, WORLD).x - 4.0).abs() < 1e-3);
        assert!((wrap_delta(b, a, WORLD).x + 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_wrap_position() {
        let p = wrap_position(Vec2::new(-5.0, 365.0), WORLD);
        assert!((p.x - 635.0).abs() < 1e-3);
        assert!((p.y - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_ramps_clamp() {
        assert_eq!(ramp_up(3.0, 1.0, 1, 7.0), 3.0);
        assert_eq!(ramp_up(3.0, 1.0, 2, 7.0), 4.0);
        assert_eq!(ramp_up(3.0, 1.0, 50, 7.0), 7.0);
        assert_eq!(ramp_down(3.5, 0.3, 1, 1.5), 3.5);
        assert_eq!(ramp_down(3.5, 0.3, 100, 1.5), 1.5);
    }

    proptest! {
        #[test]
        fn prop_wrap_distance_symmetric(
            ax in 0.0f32..640.0, ay in 0.0f32..360.0,
            bx in 0.0f32..640.0, by in 0.0f32..360.0,
        ) {
            let a = Vec2::new(ax, ay);
            let b = Vec2::new(bx, by);
            let d1 = wrap_distance(a, b, WORLD);
            let d2 = wrap_distance(b, a, WORLD);
            prop_assert!((d1 - d2).abs() < 1e-2);
            prop_assert!(d1 <= (a - b).length() + 1e-2);
            prop_assert!(d1 <= (WORLD / 2.0).length() + 1e-2);
        }
    }
}
