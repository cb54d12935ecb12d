//! Data-driven game balance
//!
//! Every gameplay constant lives here so a run can be re-tuned from JSON
//! without a rebuild. Loop scaling is always monotone and clamped.

use serde::{Deserialize, Serialize};

use crate::consts::{INITIAL_LIVES, MAX_DT};
use crate::{ramp_down, ramp_up};

/// Top-level balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub session: SessionTuning,
    pub mount: MountTuning,
    pub ride: RideTuning,
    pub dismount: DismountTuning,
}

impl Tuning {
    /// Parse a (possibly partial) tuning file; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    pub initial_lives: i32,
    /// Frame deltas above this are clamped before integration
    pub max_dt: f32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            initial_lives: INITIAL_LIVES,
            max_dt: MAX_DT,
        }
    }
}

/// Level 1: jump onto the passing worm, then plant the hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountTuning {
    pub ground_y: f32,
    pub player_start_x: f32,
    pub player_width: f32,
    pub player_height: f32,
    /// Torso box as fractions of player height above the feet
    pub torso_top: f32,
    pub torso_bottom: f32,
    pub player_speed: f32,
    pub gravity: f32,
    pub jump_velocity: f32,

    pub worm_segments: usize,
    pub segment_spacing: f32,
    pub head_radius: f32,
    pub segment_radius: f32,
    /// Segments past this index never surface
    pub tail_cutoff: usize,
    /// Height the worm rises at the middle of the surfaced zone
    pub rise_height: f32,
    /// Pause between passes (seconds)
    pub pass_gap: f32,
    pub worm_speed_base: f32,
    pub worm_speed_per_loop: f32,
    pub worm_speed_max: f32,

    pub zone_half_width_base: f32,
    pub zone_shrink_per_loop: f32,
    pub zone_half_width_min: f32,

    pub mount_radius: f32,

    pub challenge_len_base: u32,
    pub challenge_len_per_loop: u32,
    pub challenge_len_max: u32,
    pub challenge_time_base: f32,
    pub challenge_time_decay: f32,
    pub challenge_time_min: f32,
    /// Points per loop for completing the challenge
    pub challenge_points: u64,

    pub death_pause: f32,
    pub success_pause: f32,
}

impl Default for MountTuning {
    fn default() -> Self {
        Self {
            ground_y: 300.0,
            player_start_x: 80.0,
            player_width: 12.0,
            player_height: 24.0,
            torso_top: 0.85,
            torso_bottom: 0.35,
            player_speed: 120.0,
            gravity: 900.0,
            jump_velocity: 420.0,

            worm_segments: 10,
            segment_spacing: 16.0,
            head_radius: 12.0,
            segment_radius: 10.0,
            tail_cutoff: 7,
            rise_height: 28.0,
            pass_gap: 1.0,
            worm_speed_base: 110.0,
            worm_speed_per_loop: 15.0,
            worm_speed_max: 220.0,

            zone_half_width_base: 150.0,
            zone_shrink_per_loop: 15.0,
            zone_half_width_min: 60.0,

            mount_radius: 16.0,

            challenge_len_base: 3,
            challenge_len_per_loop: 1,
            challenge_len_max: 7,
            challenge_time_base: 3.5,
            challenge_time_decay: 0.3,
            challenge_time_min: 1.5,
            challenge_points: 100,

            death_pause: 1.5,
            success_pause: 1.0,
        }
    }
}

impl MountTuning {
    /// Number of symbols in the hook challenge
    pub fn challenge_length(&self, loop_count: u32) -> u32 {
        let grown = self
            .challenge_len_base
            .saturating_add(self.challenge_len_per_loop.saturating_mul(loop_count.saturating_sub(1)));
        grown.min(self.challenge_len_max)
    }

    /// Seconds allowed for the hook challenge
    pub fn challenge_time(&self, loop_count: u32) -> f32 {
        ramp_down(
            self.challenge_time_base,
            self.challenge_time_decay,
            loop_count,
            self.challenge_time_min,
        )
    }

    pub fn worm_speed(&self, loop_count: u32) -> f32 {
        ramp_up(
            self.worm_speed_base,
            self.worm_speed_per_loop,
            loop_count,
            self.worm_speed_max,
        )
    }

    pub fn zone_half_width(&self, loop_count: u32) -> f32 {
        ramp_down(
            self.zone_half_width_base,
            self.zone_shrink_per_loop,
            loop_count,
            self.zone_half_width_min,
        )
    }
}

/// Per-wave enemy counts: how many large (deadly) and small (edible)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveSpec {
    pub large: u32,
    pub small: u32,
}

impl WaveSpec {
    pub const fn new(large: u32, small: u32) -> Self {
        Self { large, small }
    }
}

/// Level 2: steer the worm around a wrapping desert and eat the small ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideTuning {
    pub head_radius: f32,
    pub segment_spacing: f32,
    pub initial_segments: usize,
    pub max_segments: usize,
    pub base_speed: f32,
    pub speed_min_mult: f32,
    pub speed_max_mult: f32,
    /// Multiplier change per second while Up/Down is held
    pub speed_change_rate: f32,
    pub base_turn_rate: f32,
    pub turn_penalty_per_segment: f32,
    pub min_turn_rate: f32,

    pub small_radius: f32,
    pub large_radius: f32,
    pub soldier_speed: f32,
    pub harvester_speed: f32,
    pub ornithopter_speed: f32,
    /// Fractional enemy speed increase per loop
    pub enemy_speed_per_loop: f32,
    pub enemy_speed_max_mult: f32,
    pub flee_radius: f32,
    pub flee_speed: f32,
    /// Velocity jitter applied to the initial drift toward the centre
    pub drift_jitter: f32,
    /// Enemies never spawn closer than this to the head
    pub spawn_clearance: f32,

    /// Wave tables indexed by loop (last table repeats)
    pub waves: Vec<Vec<WaveSpec>>,
    pub wave_interval: f32,

    pub soldier_points: u32,
    pub harvester_points: u32,
    pub ornithopter_points: u32,
    pub combo_window: f32,
    pub combo_multiplier: f32,
    pub danger_radius: f32,
    /// Base of the exponential near-threat bonus
    pub danger_base: f32,
    pub close_call_points: u64,

    /// Radius around the centre cleared of enemies when the worm respawns
    pub respawn_clearance: f32,
    pub death_pause: f32,
    pub success_pause: f32,
}

impl Default for RideTuning {
    fn default() -> Self {
        Self {
            head_radius: 10.0,
            segment_spacing: 8.0,
            initial_segments: 12,
            max_segments: 40,
            base_speed: 90.0,
            speed_min_mult: 0.5,
            speed_max_mult: 1.5,
            speed_change_rate: 1.0,
            base_turn_rate: 3.5,
            turn_penalty_per_segment: 0.05,
            min_turn_rate: 1.5,

            small_radius: 5.0,
            large_radius: 12.0,
            soldier_speed: 30.0,
            harvester_speed: 14.0,
            ornithopter_speed: 45.0,
            enemy_speed_per_loop: 0.1,
            enemy_speed_max_mult: 2.0,
            flee_radius: 90.0,
            flee_speed: 55.0,
            drift_jitter: 8.0,
            spawn_clearance: 120.0,

            waves: vec![
                vec![WaveSpec::new(2, 3), WaveSpec::new(1, 2), WaveSpec::new(1, 2)],
                vec![
                    WaveSpec::new(2, 3),
                    WaveSpec::new(2, 3),
                    WaveSpec::new(2, 2),
                    WaveSpec::new(1, 3),
                ],
                vec![
                    WaveSpec::new(3, 3),
                    WaveSpec::new(2, 3),
                    WaveSpec::new(3, 3),
                    WaveSpec::new(2, 4),
                ],
            ],
            wave_interval: 12.0,

            soldier_points: 10,
            harvester_points: 25,
            ornithopter_points: 15,
            combo_window: 1.5,
            combo_multiplier: 0.5,
            danger_radius: 80.0,
            danger_base: 4.0,
            close_call_points: 50,

            respawn_clearance: 100.0,
            death_pause: 1.5,
            success_pause: 1.0,
        }
    }
}

impl RideTuning {
    /// Wave table for a loop; loops past the last table reuse it
    pub fn waves_for_loop(&self, loop_count: u32) -> &[WaveSpec] {
        if self.waves.is_empty() {
            return &[];
        }
        let idx = (loop_count.saturating_sub(1) as usize).min(self.waves.len() - 1);
        &self.waves[idx]
    }

    pub fn enemy_speed_mult(&self, loop_count: u32) -> f32 {
        ramp_up(
            1.0,
            self.enemy_speed_per_loop,
            loop_count,
            self.enemy_speed_max_mult,
        )
    }

    /// Steering rate for a worm of the given length
    pub fn turn_rate(&self, segments: usize) -> f32 {
        let extra = segments.saturating_sub(self.initial_segments) as f32;
        (self.base_turn_rate - self.turn_penalty_per_segment * extra).max(self.min_turn_rate)
    }
}

/// Level 3: leap off the diving worm onto a rock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DismountTuning {
    pub path_y: f32,
    pub worm_segments: usize,
    pub segment_spacing: f32,
    pub segment_radius: f32,
    pub worm_start_x: f32,
    pub worm_speed: f32,
    /// Segment index the player rides on
    pub ride_index: f32,

    pub dive_start_delay: f32,
    pub dive_speed_base: f32,
    pub dive_speed_per_loop: f32,
    pub dive_speed_max: f32,
    pub segment_delay_base: f32,
    pub segment_delay_decay: f32,
    pub segment_delay_min: f32,
    pub submersion_threshold: f32,

    pub full_charge_time: f32,
    pub max_jump_power: f32,
    pub aim_turn_rate: f32,
    pub jump_duration: f32,
    pub arc_height: f32,
    pub bounds_margin: f32,

    pub rock_count: usize,
    pub rock_radius_base: f32,
    pub rock_shrink_per_loop: f32,
    pub rock_radius_min: f32,
    pub hit_radius_fixed: f32,
    pub hit_radius_fraction: f32,
    pub walk_range_base: f32,
    pub walk_shrink_per_loop: f32,
    pub walk_range_min: f32,
    pub walk_speed: f32,

    pub quicksand_base: u32,
    pub quicksand_per_loop: u32,
    pub quicksand_max: u32,
    pub quicksand_radius: f32,
    pub geyser_base: u32,
    pub geyser_per_loop: u32,
    pub geyser_max: u32,
    pub geyser_radius: f32,
    pub geyser_period: f32,
    pub geyser_active: f32,

    pub max_points: f32,
    pub death_pause: f32,
    pub success_pause: f32,
}

impl Default for DismountTuning {
    fn default() -> Self {
        Self {
            path_y: 200.0,
            worm_segments: 10,
            segment_spacing: 18.0,
            segment_radius: 9.0,
            worm_start_x: 60.0,
            worm_speed: 40.0,
            ride_index: 4.0,

            dive_start_delay: 2.0,
            dive_speed_base: 0.35,
            dive_speed_per_loop: 0.08,
            dive_speed_max: 1.0,
            segment_delay_base: 0.6,
            segment_delay_decay: 0.06,
            segment_delay_min: 0.2,
            submersion_threshold: 0.6,

            full_charge_time: 1.2,
            max_jump_power: 220.0,
            aim_turn_rate: 2.5,
            jump_duration: 0.6,
            arc_height: 40.0,
            bounds_margin: 10.0,

            rock_count: 3,
            rock_radius_base: 26.0,
            rock_shrink_per_loop: 3.0,
            rock_radius_min: 12.0,
            hit_radius_fixed: 6.0,
            hit_radius_fraction: 0.8,
            walk_range_base: 40.0,
            walk_shrink_per_loop: 4.0,
            walk_range_min: 16.0,
            walk_speed: 70.0,

            quicksand_base: 1,
            quicksand_per_loop: 1,
            quicksand_max: 4,
            quicksand_radius: 24.0,
            geyser_base: 1,
            geyser_per_loop: 1,
            geyser_max: 3,
            geyser_radius: 18.0,
            geyser_period: 2.5,
            geyser_active: 0.9,

            max_points: 1000.0,
            death_pause: 1.5,
            success_pause: 1.2,
        }
    }
}

impl DismountTuning {
    /// Submersion gained per second once a segment starts diving
    pub fn dive_speed(&self, loop_count: u32) -> f32 {
        ramp_up(
            self.dive_speed_base,
            self.dive_speed_per_loop,
            loop_count,
            self.dive_speed_max,
        )
    }

    /// Stagger between consecutive segments starting their dive
    pub fn segment_delay(&self, loop_count: u32) -> f32 {
        ramp_down(
            self.segment_delay_base,
            self.segment_delay_decay,
            loop_count,
            self.segment_delay_min,
        )
    }

    /// Rock (safe zone) radius
    pub fn rock_radius(&self, loop_count: u32) -> f32 {
        ramp_down(
            self.rock_radius_base,
            self.rock_shrink_per_loop,
            loop_count,
            self.rock_radius_min,
        )
    }

    /// Distance from the player to a rock's edge that still allows walking off
    pub fn walk_range(&self, loop_count: u32) -> f32 {
        ramp_down(
            self.walk_range_base,
            self.walk_shrink_per_loop,
            loop_count,
            self.walk_range_min,
        )
    }

    pub fn quicksand_count(&self, loop_count: u32) -> u32 {
        scaled_count(self.quicksand_base, self.quicksand_per_loop, loop_count, self.quicksand_max)
    }

    pub fn geyser_count(&self, loop_count: u32) -> u32 {
        scaled_count(self.geyser_base, self.geyser_per_loop, loop_count, self.geyser_max)
    }
}

fn scaled_count(base: u32, per_loop: u32, loop_count: u32, max: u32) -> u32 {
    base.saturating_add(per_loop.saturating_mul(loop_count.saturating_sub(1)))
        .min(max)
}
