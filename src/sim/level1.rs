//! Level 1 - Mount the worm
//!
//! The worm crosses the screen over and over, surfacing only inside a
//! randomized zone. The player dodges the head, drops onto the body, then
//! plants the hooks by entering an arrow sequence before time runs out.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{head_hits_torso, nearest, Band};
use super::fsm::{Ctx, GameScreen, StateId};
use super::outcome::{finish_death, register_death, register_success, AfterDeath, DeathCause, Pause};
use super::qte::{QteChallenge, QteStatus};
use super::state::{LayoutStream, SessionState};
use super::worm::Worm;
use crate::audio::{MusicTrack, SoundEffect};
use crate::consts::{GAME_HEIGHT, GAME_WIDTH};
use crate::platform::Key;
use crate::renderer::{palette, DrawList};
use crate::tuning::MountTuning;

/// Gap between the screen edge and the surfaced zone
const ZONE_EDGE_MARGIN: f32 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub enum MountPhase {
    /// On the ground, free to walk
    Wait,
    /// Airborne
    Jump,
    /// Riding a body segment, entering the hook sequence
    Challenge { qte: QteChallenge, segment: usize },
    Success(Pause),
    Death {
        pause: Pause,
        after: AfterDeath,
        cause: DeathCause,
    },
}

/// Player body; `pos` is the feet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountPlayer {
    pub pos: Vec2,
    pub vel_y: f32,
}

impl MountPlayer {
    fn grounded(&self, ground_y: f32) -> bool {
        self.pos.y >= ground_y && self.vel_y >= 0.0
    }

    fn torso(&self, t: &MountTuning) -> Band {
        Band::new(
            self.pos.y - t.player_height * t.torso_top,
            self.pos.y - t.player_height * t.torso_bottom,
        )
    }
}

/// Everything that lives for one attempt
#[derive(Debug, Clone)]
pub struct MountState {
    pub attempt: u32,
    pub phase: MountPhase,
    pub player: MountPlayer,
    pub worm: Worm,
    /// Head x along the current pass
    pub head_x: f32,
    pub worm_speed: f32,
    /// Seconds until the next pass starts (0 while crossing)
    pub pass_wait: f32,
    pub zone_center: f32,
    pub zone_half_width: f32,
    head_was_surfaced: bool,
    challenge_len: u32,
    challenge_time: f32,
    rng: Pcg32,
    /// Balance snapshot for rendering
    tuning: MountTuning,
}

impl MountState {
    pub fn new(session: &SessionState, t: &MountTuning, attempt: u32) -> Self {
        let loop_count = session.loop_count;
        let mut rng = session.layout_rng(LayoutStream::Mount, attempt);

        let zone_half_width = t.zone_half_width(loop_count);
        let lo = zone_half_width + ZONE_EDGE_MARGIN;
        let hi = (GAME_WIDTH - zone_half_width - ZONE_EDGE_MARGIN).max(lo);
        let zone_center = if hi > lo { rng.random_range(lo..hi) } else { GAME_WIDTH / 2.0 };

        let start_x = pass_start(t);
        let mut worm = Worm::straight(
            Vec2::new(start_x, t.ground_y),
            Vec2::NEG_X,
            t.worm_segments,
            t.segment_spacing,
            t.head_radius,
            t.segment_radius,
        );
        worm.place_trailing_x(start_x, t.segment_spacing, |_| t.ground_y + t.rise_height);

        log::debug!(
            "Mount attempt {}: zone {:.0}±{:.0}",
            attempt,
            zone_center,
            zone_half_width
        );

        Self {
            attempt,
            phase: MountPhase::Wait,
            player: MountPlayer {
                pos: Vec2::new(t.player_start_x, t.ground_y),
                vel_y: 0.0,
            },
            worm,
            head_x: start_x,
            worm_speed: t.worm_speed(loop_count),
            pass_wait: 0.0,
            zone_center,
            zone_half_width,
            head_was_surfaced: false,
            challenge_len: t.challenge_length(loop_count),
            challenge_time: t.challenge_time(loop_count),
            rng,
            tuning: t.clone(),
        }
    }

    /// Height of the worm's back at `x`, and whether it is above the sand there
    pub fn profile(&self, x: f32, t: &MountTuning) -> (f32, bool) {
        let d = x - self.zone_center;
        if d.abs() < self.zone_half_width {
            let rise = t.rise_height * (FRAC_PI_2 * d / self.zone_half_width).cos();
            (t.ground_y - rise, true)
        } else {
            (t.ground_y + t.rise_height, false)
        }
    }

    /// Is segment `index` above ground (and so collidable)?
    pub fn segment_surfaced(&self, index: usize, t: &MountTuning) -> bool {
        index <= t.tail_cutoff
            && self
                .worm
                .segments
                .get(index)
                .is_some_and(|s| self.profile(s.pos.x, t).1)
    }

    pub fn head_surfaced(&self, t: &MountTuning) -> bool {
        self.segment_surfaced(0, t)
    }

    fn advance_worm(&mut self, t: &MountTuning, dt: f32) {
        if self.pass_wait > 0.0 {
            self.pass_wait -= dt;
            if self.pass_wait <= 0.0 {
                self.pass_wait = 0.0;
                self.head_x = pass_start(t);
            }
        } else {
            self.head_x += self.worm_speed * dt;
            let tail_clear = self.head_x - t.segment_spacing * self.worm.len() as f32;
            if tail_clear > GAME_WIDTH + t.head_radius {
                self.pass_wait = t.pass_gap;
            }
        }
        self.layout_worm(t);
    }

    fn layout_worm(&mut self, t: &MountTuning) {
        let cutoff = t.tail_cutoff;
        let underground = t.ground_y + t.rise_height;
        let head_x = self.head_x;
        let spacing = t.segment_spacing;
        for i in 0..self.worm.len() {
            let x = head_x - spacing * i as f32;
            let y = if i <= cutoff { self.profile(x, t).0 } else { underground };
            self.worm.segments[i].pos = Vec2::new(x, y);
        }
    }

    /// Nearest surfaced body segment (never the head) to the player's feet
    fn mount_target(&self, t: &MountTuning) -> Option<(usize, f32)> {
        let last = t.tail_cutoff.min(self.worm.len().saturating_sub(1));
        nearest(
            (1..=last)
                .filter(|&i| self.segment_surfaced(i, t))
                .map(|i| (i, self.worm.segments[i].pos)),
            self.player.pos,
        )
    }

    fn seat_on(&mut self, segment: usize) {
        if let Some(seg) = self.worm.segments.get(segment) {
            self.player.pos = Vec2::new(seg.pos.x, seg.pos.y - seg.radius);
            self.player.vel_y = 0.0;
        }
    }

    fn start_challenge(&mut self, segment: usize) {
        self.seat_on(segment);
        let qte = QteChallenge::random(&mut self.rng, self.challenge_len, self.challenge_time);
        log::info!(
            "Mounted segment {}; hook sequence of {} in {:.2}s",
            segment,
            self.challenge_len,
            self.challenge_time
        );
        self.phase = MountPhase::Challenge { qte, segment };
    }
}

fn pass_start(t: &MountTuning) -> f32 {
    -t.head_radius * 2.0
}

/// The Level 1 screen
#[derive(Debug, Default)]
pub struct MountLevel {
    state: Option<MountState>,
}

impl MountLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&MountState> {
        self.state.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> Option<&mut MountState> {
        self.state.as_mut()
    }

    fn die(st: &mut MountState, ctx: &mut Ctx<'_>, cause: DeathCause, t: &MountTuning) {
        let after = register_death(ctx, cause, st.player.pos);
        st.phase = MountPhase::Death {
            pause: Pause::new(t.death_pause),
            after,
            cause,
        };
    }

    fn update_on_foot(st: &mut MountState, ctx: &mut Ctx<'_>, t: &MountTuning, dt: f32) {
        let input = ctx.input;
        let half_w = t.player_width / 2.0;

        st.player.pos.x = (st.player.pos.x + input.horizontal_axis() * t.player_speed * dt)
            .clamp(half_w, GAME_WIDTH - half_w);

        if st.phase == MountPhase::Wait && input.was_pressed(Key::Space) && st.player.grounded(t.ground_y) {
            st.player.vel_y = -t.jump_velocity;
            st.phase = MountPhase::Jump;
            ctx.audio.play(SoundEffect::Jump);
        }

        if st.phase == MountPhase::Jump {
            // semi-implicit Euler
            st.player.vel_y += t.gravity * dt;
            st.player.pos.y += st.player.vel_y * dt;
            if st.player.pos.y >= t.ground_y {
                st.player.pos.y = t.ground_y;
                st.player.vel_y = 0.0;
                st.phase = MountPhase::Wait;
            }
        }

        let head_up = st.head_surfaced(t);
        if head_up && !st.head_was_surfaced {
            ctx.audio.play(SoundEffect::WormRumble);
            ctx.effects.trigger_shake(2.0, 0.2);
        }
        st.head_was_surfaced = head_up;

        if head_up
            && head_hits_torso(
                st.worm.head(),
                st.worm.head_radius(),
                st.player.pos.x,
                half_w,
                st.player.torso(t),
            )
        {
            Self::die(st, ctx, DeathCause::WormHead, t);
            return;
        }

        if st.phase == MountPhase::Jump && st.player.vel_y > 0.0 {
            if let Some((segment, dist)) = st.mount_target(t) {
                if dist < t.mount_radius {
                    st.start_challenge(segment);
                    ctx.audio.play(SoundEffect::HookPlant);
                }
            }
        }
    }
}

impl GameScreen for MountLevel {
    fn enter(&mut self, ctx: &mut Ctx<'_>) {
        self.state = Some(MountState::new(ctx.session, &ctx.tuning.mount, 0));
        ctx.audio.play_music(MusicTrack::Mount);
        ctx.audio.set_music_intensity(0.0);
        log::info!(
            "Level 1 (loop {}): challenge {} symbols / {:.2}s",
            ctx.session.loop_count,
            ctx.tuning.mount.challenge_length(ctx.session.loop_count),
            ctx.tuning.mount.challenge_time(ctx.session.loop_count)
        );
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) {
        let tuning = ctx.tuning;
        let t = &tuning.mount;
        let Some(st) = self.state.as_mut() else {
            return;
        };

        match &mut st.phase {
            MountPhase::Wait | MountPhase::Jump => {
                st.advance_worm(t, dt);
                Self::update_on_foot(st, ctx, t, dt);
            }
            MountPhase::Challenge { qte, segment } => {
                let segment = *segment;
                let before = qte.progress();
                let status = qte.update(ctx.input, dt);
                if qte.progress() > before && status == QteStatus::InProgress {
                    ctx.audio.play(SoundEffect::HookPlant);
                }
                match status {
                    QteStatus::InProgress => st.seat_on(segment),
                    QteStatus::Complete => {
                        let points = t.challenge_points * u64::from(ctx.session.loop_count);
                        ctx.session.add_score(points);
                        log::info!("Hooks planted: +{}", points);
                        register_success(ctx, st.player.pos);
                        st.phase = MountPhase::Success(Pause::new(t.success_pause));
                    }
                    QteStatus::WrongSymbol => Self::die(st, ctx, DeathCause::WrongSymbol, t),
                    QteStatus::TimedOut => Self::die(st, ctx, DeathCause::TooSlow, t),
                }
            }
            MountPhase::Success(pause) => {
                if pause.tick(dt) {
                    ctx.switch_to(StateId::Level2);
                }
            }
            MountPhase::Death { pause, after, .. } => {
                let after = *after;
                if pause.tick(dt) && finish_death(ctx, after) {
                    let attempt = st.attempt + 1;
                    *st = MountState::new(ctx.session, t, attempt);
                }
            }
        }
    }

    fn render(&self, session: &SessionState, draw: &mut DrawList) {
        draw.clear(palette::OCHRE);
        let Some(st) = &self.state else {
            return;
        };
        let t = &st.tuning;
        let ground_y = t.ground_y;

        // sand below the surface line
        draw.rect(
            Vec2::new(0.0, ground_y),
            Vec2::new(GAME_WIDTH, GAME_HEIGHT - ground_y),
            palette::SAND,
        );
        // surfaced zone hint
        draw.rect_alpha(
            Vec2::new(st.zone_center - st.zone_half_width, ground_y - 2.0),
            Vec2::new(st.zone_half_width * 2.0, 4.0),
            palette::BURNT_ORANGE,
            0.4,
        );

        for (i, seg) in st.worm.segments.iter().enumerate().rev() {
            let (_, up) = st.profile(seg.pos.x, t);
            let alpha = if up && i <= t.tail_cutoff { 1.0 } else { 0.15 };
            let color = if i == 0 { palette::DEEP_BROWN } else { palette::WORM };
            draw.circle_alpha(seg.pos, seg.radius, color, alpha);
        }

        let p = st.player.pos;
        draw.rect(
            Vec2::new(p.x - t.player_width / 2.0, p.y - t.player_height),
            Vec2::new(t.player_width, t.player_height),
            palette::SPICE_BLUE,
        );

        let center_x = GAME_WIDTH / 2.0;
        match &st.phase {
            MountPhase::Wait => {
                draw.text("MOUNT THE WORM", Vec2::new(center_x, 40.0), palette::DEEP_BROWN, 20.0);
                draw.text(
                    "\u{2190} \u{2192} move   SPACE jump onto its back",
                    Vec2::new(center_x, 62.0),
                    palette::DEEP_BROWN,
                    11.0,
                );
            }
            MountPhase::Jump => {}
            MountPhase::Challenge { qte, .. } => {
                let labels = qte.sequence();
                let step = 36.0;
                let start = center_x - step * (labels.len() as f32 - 1.0) / 2.0;
                for (i, key) in labels.iter().enumerate() {
                    let color = if i < qte.progress() { palette::SAND } else { palette::BONE };
                    draw.text(key.label(), Vec2::new(start + step * i as f32, 80.0), color, 24.0);
                }
                let bar_w = 200.0 * qte.time_fraction();
                draw.rect(Vec2::new(center_x - 100.0, 100.0), Vec2::new(bar_w, 6.0), palette::BURNT_ORANGE);
                draw.text("PLANT THE HOOKS!", Vec2::new(center_x, 44.0), palette::BONE, 18.0);
            }
            MountPhase::Success(_) => {
                let points = t.challenge_points * u64::from(session.loop_count);
                draw.text("HOOKED!", Vec2::new(center_x, 80.0), palette::BONE, 28.0);
                draw.text(format!("+{points}"), Vec2::new(center_x, 110.0), palette::SAND, 16.0);
            }
            MountPhase::Death { cause, .. } => {
                draw.text(cause.label(), Vec2::new(center_x, 80.0), palette::BURNT_ORANGE, 22.0);
            }
        }
    }

    fn shows_hud(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::InputSnapshot;
    use crate::sim::testbed::TestBed;

    const DT: f32 = 1.0 / 60.0;

    fn entered(bed: &mut TestBed) -> MountLevel {
        let mut level = MountLevel::new();
        bed.enter(&mut level);
        level
    }

    /// Park the worm so segment `index` sits mid-zone, player falling onto it
    fn drop_onto_segment(level: &mut MountLevel, t: &MountTuning, index: usize) {
        let st = level.state_mut().unwrap();
        st.head_x = st.zone_center + t.segment_spacing * index as f32;
        st.layout_worm(t);
        let seg = st.worm.segments[index].pos;
        st.player.pos = Vec2::new(seg.x, seg.y - 4.0);
        st.player.vel_y = 50.0;
        st.phase = MountPhase::Jump;
        st.worm_speed = 0.0;
    }

    #[test]
    fn test_zone_profile_and_cutoff() {
        let bed = TestBed::new();
        let t = &bed.tuning.mount;
        let st = MountState::new(&bed.session, t, 0);
        let (peak, up) = st.profile(st.zone_center, t);
        assert!(up);
        assert!((peak - (t.ground_y - t.rise_height)).abs() < 1e-3);
        assert!(!st.profile(st.zone_center + st.zone_half_width + 1.0, t).1);
        assert!(!st.segment_surfaced(t.tail_cutoff + 1, t));
    }

    #[test]
    fn test_jump_is_semi_implicit_euler() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.mount.clone();
        level.state_mut().unwrap().worm_speed = 0.0;

        bed.step(&mut level, &InputSnapshot::pressing(&[Key::Space]), DT);
        let st = level.state().unwrap();
        assert_eq!(st.phase, MountPhase::Jump);
        let expected_v = -t.jump_velocity + t.gravity * DT;
        assert!((st.player.vel_y - expected_v).abs() < 1e-3);
        assert!((st.player.pos.y - (t.ground_y + expected_v * DT)).abs() < 1e-3);

        // lands again eventually
        for _ in 0..200 {
            bed.step(&mut level, &InputSnapshot::empty(), DT);
        }
        assert_eq!(level.state().unwrap().phase, MountPhase::Wait);
    }

    #[test]
    fn test_falling_onto_body_starts_challenge() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.mount.clone();
        drop_onto_segment(&mut level, &t, 3);

        bed.step(&mut level, &InputSnapshot::empty(), DT);
        match &level.state().unwrap().phase {
            MountPhase::Challenge { qte, segment } => {
                assert_eq!(*segment, 3);
                assert_eq!(qte.sequence().len(), 3);
            }
            other => panic!("expected challenge, got {other:?}"),
        }
    }

    #[test]
    fn test_walking_into_head_kills() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        {
            let st = level.state_mut().unwrap();
            st.head_x = st.zone_center;
            st.worm_speed = 0.0;
            st.player.pos.x = st.zone_center;
        }
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        assert!(matches!(
            level.state().unwrap().phase,
            MountPhase::Death { cause: DeathCause::WormHead, .. }
        ));
        assert_eq!(bed.session.lives, bed.tuning.session.initial_lives - 1);
    }

    #[test]
    fn test_exact_sequence_scores_and_advances() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.mount.clone();
        drop_onto_segment(&mut level, &t, 2);
        bed.step(&mut level, &InputSnapshot::empty(), DT);

        let seq = match &level.state().unwrap().phase {
            MountPhase::Challenge { qte, .. } => qte.sequence().to_vec(),
            other => panic!("expected challenge, got {other:?}"),
        };
        for key in seq {
            assert_eq!(bed.step(&mut level, &InputSnapshot::pressing(&[key]), DT), None);
        }
        assert_eq!(bed.session.score, 100);
        assert!(matches!(level.state().unwrap().phase, MountPhase::Success(_)));

        let mut next = None;
        for _ in 0..120 {
            next = next.or(bed.step(&mut level, &InputSnapshot::empty(), DT));
        }
        assert_eq!(next, Some(StateId::Level2));
    }

    #[test]
    fn test_wrong_symbol_is_immediate_death_then_retry() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.mount.clone();
        drop_onto_segment(&mut level, &t, 2);
        bed.step(&mut level, &InputSnapshot::empty(), DT);

        let first = match &level.state().unwrap().phase {
            MountPhase::Challenge { qte, .. } => qte.sequence()[0],
            other => panic!("expected challenge, got {other:?}"),
        };
        let wrong = Key::ARROWS.into_iter().find(|k| *k != first).unwrap();
        bed.step(&mut level, &InputSnapshot::pressing(&[wrong]), DT);
        assert!(matches!(
            level.state().unwrap().phase,
            MountPhase::Death { cause: DeathCause::WrongSymbol, .. }
        ));
        assert_eq!(bed.session.score, 0);

        for _ in 0..120 {
            assert_eq!(bed.step(&mut level, &InputSnapshot::empty(), DT), None);
        }
        let st = level.state().unwrap();
        assert_eq!(st.attempt, 1);
        assert_eq!(st.phase, MountPhase::Wait);
    }

    #[test]
    fn test_last_life_goes_to_game_over() {
        let mut bed = TestBed::new();
        bed.session.lives = 0;
        let mut level = entered(&mut bed);
        let t = bed.tuning.mount.clone();
        drop_onto_segment(&mut level, &t, 2);
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        // let the clock run out
        let mut next = None;
        for _ in 0..400 {
            next = next.or(bed.step(&mut level, &InputSnapshot::empty(), DT));
        }
        assert_eq!(bed.session.lives, -1);
        assert_eq!(next, Some(StateId::GameOver));
    }
}
