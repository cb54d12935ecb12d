//! Level 3 - Dismount
//!
//! The worm dives head first. Before the sand reaches the rider, either walk
//! off onto a nearby rock (safe, no points) or charge and aim a leap at one
//! (points scale with the square of the charge).

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use super::collision::clamp_to_bounds;
use super::fsm::{Ctx, GameScreen, StateId};
use super::outcome::{finish_death, register_death, register_success, AfterDeath, DeathCause, Pause};
use super::state::{layout_rng, LayoutStream, SessionState};
use super::worm::Worm;
use crate::audio::{MusicTrack, SoundEffect};
use crate::consts::{GAME_HEIGHT, GAME_WIDTH};
use crate::platform::Key;
use crate::renderer::{palette, DrawList};
use crate::tuning::DismountTuning;

const WORLD: Vec2 = Vec2::new(GAME_WIDTH, GAME_HEIGHT);

/// Placement attempts per rock or hazard
const PLACE_TRIES: usize = 32;

/// Uniform draw in `lo..hi`, or `lo` when the span has collapsed
fn draw_span(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}

/// Ease-in charge curve: hold time to charge in 0..=1
pub fn charge_for(held: f32, full_charge_time: f32) -> f32 {
    if full_charge_time <= 0.0 {
        return 1.0;
    }
    let x = (held / full_charge_time).clamp(0.0, 1.0);
    x * x
}

/// Landing score: floor(charge^2 * max_points * loop)
pub fn jump_points(charge: f32, max_points: f32, loop_count: u32) -> u64 {
    let charge = charge.clamp(0.0, 1.0);
    (charge * charge * max_points * loop_count as f32).floor() as u64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rock {
    pub pos: Vec2,
    pub radius: f32,
}

impl Rock {
    /// Landing tolerance around the centre
    pub fn hit_radius(&self, t: &DismountTuning) -> f32 {
        t.hit_radius_fixed + t.hit_radius_fraction * self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HazardKind {
    Quicksand,
    /// Erupts for part of every period, offset by `phase`
    Geyser { phase: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hazard {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: HazardKind,
}

impl Hazard {
    pub fn is_active(&self, time: f32, t: &DismountTuning) -> bool {
        match self.kind {
            HazardKind::Quicksand => true,
            HazardKind::Geyser { phase } => {
                t.geyser_period > 0.0 && (time + phase).rem_euclid(t.geyser_period) < t.geyser_active
            }
        }
    }

    fn death_cause(&self) -> DeathCause {
        match self.kind {
            HazardKind::Quicksand => DeathCause::Quicksand,
            HazardKind::Geyser { .. } => DeathCause::Geyser,
        }
    }
}

/// Where the rider starts, before the worm moves
pub fn rider_start(t: &DismountTuning) -> Vec2 {
    let head_x = t.worm_start_x + t.segment_spacing * t.worm_segments.saturating_sub(1) as f32;
    Vec2::new(head_x - t.segment_spacing * t.ride_index, t.path_y - t.segment_radius)
}

/// Rocks and hazards for one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct DismountLayout {
    pub rocks: Vec<Rock>,
    pub hazards: Vec<Hazard>,
}

impl DismountLayout {
    /// Pure function of (seed, loop, attempt) and the balance table
    pub fn generate(seed: u64, loop_count: u32, attempt: u32, t: &DismountTuning) -> Self {
        let mut rng = layout_rng(seed, LayoutStream::Dismount, loop_count, attempt);
        let radius = t.rock_radius(loop_count);
        let walk = t.walk_range(loop_count);
        let start = rider_start(t);
        let path_clear = t.segment_radius + 10.0;

        let mut rocks: Vec<Rock> = Vec::with_capacity(t.rock_count);
        if t.rock_count > 0 {
            // always one within walking distance of the starting seat
            rocks.push(Rock {
                pos: start - Vec2::new(0.0, walk * 0.5 + radius),
                radius,
            });
        }
        while rocks.len() < t.rock_count {
            let mut pos = Vec2::ZERO;
            for _ in 0..PLACE_TRIES {
                let above = rng.random_bool(0.5);
                let (lo, hi) = if above {
                    (radius + 20.0, t.path_y - radius - path_clear)
                } else {
                    (t.path_y + radius + path_clear, GAME_HEIGHT - radius - 10.0)
                };
                let y = draw_span(&mut rng, lo, hi);
                let x = draw_span(&mut rng, start.x + 60.0, GAME_WIDTH - radius - 10.0);
                pos = Vec2::new(x, y);
                if rocks.iter().all(|r| r.pos.distance(pos) > r.radius + radius + 10.0) {
                    break;
                }
            }
            rocks.push(Rock { pos, radius });
        }

        let mut hazards = Vec::new();
        let kinds = (0..t.quicksand_count(loop_count))
            .map(|_| (HazardKind::Quicksand, t.quicksand_radius))
            .chain((0..t.geyser_count(loop_count)).map(|_| {
                let phase = rng.random_range(0.0..t.geyser_period.max(f32::EPSILON));
                (HazardKind::Geyser { phase }, t.geyser_radius)
            }))
            .collect::<Vec<_>>();
        for (kind, hr) in kinds {
            let mut pos = Vec2::ZERO;
            for _ in 0..PLACE_TRIES {
                pos = Vec2::new(
                    draw_span(&mut rng, hr + 10.0, GAME_WIDTH - hr - 10.0),
                    draw_span(&mut rng, hr + 20.0, GAME_HEIGHT - hr - 10.0),
                );
                let clear_of_rocks = rocks.iter().all(|r| r.pos.distance(pos) > r.radius + hr + 6.0);
                let clear_of_path = (pos.y - t.path_y).abs() > hr + path_clear;
                if clear_of_rocks && clear_of_path {
                    break;
                }
            }
            hazards.push(Hazard { pos, radius: hr, kind });
        }

        Self { rocks, hazards }
    }
}

/// Leap in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpTrajectory {
    pub start: Vec2,
    pub target: Vec2,
    /// 0..=1
    pub progress: f32,
    pub charge: f32,
}

impl JumpTrajectory {
    /// Ground position plus a sine arc for show
    pub fn position(&self, arc_height: f32) -> Vec2 {
        let ground = self.start.lerp(self.target, self.progress);
        ground - Vec2::new(0.0, arc_height * (PI * self.progress).sin())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DismountPhase {
    Ride,
    Charging { held: f32 },
    Jumping(JumpTrajectory),
    Walking { from: Vec2, to: Vec2, progress: f32 },
    Success { pause: Pause, points: u64 },
    Death {
        pause: Pause,
        after: AfterDeath,
        cause: DeathCause,
    },
}

#[derive(Debug, Clone)]
pub struct DismountState {
    pub attempt: u32,
    pub phase: DismountPhase,
    pub layout: DismountLayout,
    pub worm: Worm,
    /// Rider position (feet)
    pub player: Vec2,
    /// Aim angle in radians, screen coordinates
    pub aim: f32,
    /// Seconds since the attempt began
    pub time: f32,
    walk_range: f32,
    dive_speed: f32,
    segment_delay: f32,
    tuning: DismountTuning,
}

impl DismountState {
    pub fn new(session: &SessionState, t: &DismountTuning, attempt: u32) -> Self {
        let loop_count = session.loop_count;
        let layout = DismountLayout::generate(session.run_seed(), loop_count, attempt, t);
        let head = Vec2::new(
            t.worm_start_x + t.segment_spacing * t.worm_segments.saturating_sub(1) as f32,
            t.path_y,
        );
        let worm = Worm::straight(
            head,
            Vec2::NEG_X,
            t.worm_segments,
            t.segment_spacing,
            t.segment_radius * 1.2,
            t.segment_radius,
        );
        log::debug!(
            "Dismount attempt {}: {} rocks, {} hazards",
            attempt,
            layout.rocks.len(),
            layout.hazards.len()
        );
        Self {
            attempt,
            phase: DismountPhase::Ride,
            layout,
            worm,
            player: rider_start(t),
            aim: -PI / 2.0,
            time: 0.0,
            walk_range: t.walk_range(loop_count),
            dive_speed: t.dive_speed(loop_count),
            segment_delay: t.segment_delay(loop_count),
            tuning: t.clone(),
        }
    }

    /// Slide the worm along its path and deepen the dive
    fn advance_worm(&mut self) {
        let t = &self.tuning;
        let head_x = t.worm_start_x
            + t.segment_spacing * t.worm_segments.saturating_sub(1) as f32
            + t.worm_speed * self.time;
        let path_y = t.path_y;
        self.worm.place_trailing_x(head_x, t.segment_spacing, |_| path_y);
        for (i, seg) in self.worm.segments.iter_mut().enumerate() {
            let start = t.dive_start_delay + self.segment_delay * i as f32;
            let depth = ((self.time - start) * self.dive_speed).clamp(0.0, 1.0);
            // never resurfaces
            seg.submersion = seg.submersion.max(depth);
        }
    }

    fn seat(&self) -> Vec2 {
        self.worm.point_at(self.tuning.ride_index) - Vec2::new(0.0, self.tuning.segment_radius)
    }

    pub fn seat_submersion(&self) -> f32 {
        self.worm.submersion_at(self.tuning.ride_index)
    }

    /// First rock whose edge is within walking distance
    pub fn rock_in_walk_range(&self) -> Option<Rock> {
        self.layout
            .rocks
            .iter()
            .find(|r| self.player.distance(r.pos) - r.radius <= self.walk_range)
            .copied()
    }

    fn launch(&self, held: f32) -> JumpTrajectory {
        let t = &self.tuning;
        let charge = charge_for(held, t.full_charge_time);
        let reach = Vec2::from_angle(self.aim) * charge * t.max_jump_power;
        let target = clamp_to_bounds(self.player + reach, WORLD, t.bounds_margin);
        log::info!(
            "Leap: charge {:.2}, aim {:.2} rad, target ({:.0}, {:.0})",
            charge,
            self.aim,
            target.x,
            target.y
        );
        JumpTrajectory {
            start: self.player,
            target,
            progress: 0.0,
            charge,
        }
    }

    /// Rock hit at `target`, else what the player fell into
    fn resolve_landing(&self, target: Vec2) -> Result<Rock, DeathCause> {
        let t = &self.tuning;
        if let Some(rock) = self
            .layout
            .rocks
            .iter()
            .find(|r| target.distance(r.pos) < r.hit_radius(t))
        {
            return Ok(*rock);
        }
        let cause = self
            .layout
            .hazards
            .iter()
            .find(|h| target.distance(h.pos) < h.radius && h.is_active(self.time, t))
            .map(|h| h.death_cause())
            .unwrap_or(DeathCause::MissedLanding);
        Err(cause)
    }
}

/// The Level 3 screen
#[derive(Debug, Default)]
pub struct DismountLevel {
    state: Option<DismountState>,
}

impl DismountLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&DismountState> {
        self.state.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> Option<&mut DismountState> {
        self.state.as_mut()
    }

    fn die(st: &mut DismountState, ctx: &mut Ctx<'_>, cause: DeathCause) {
        let after = register_death(ctx, cause, st.player);
        st.phase = DismountPhase::Death {
            pause: Pause::new(st.tuning.death_pause),
            after,
            cause,
        };
    }

    /// Loop complete: life, next loop and any landing points
    fn succeed(st: &mut DismountState, ctx: &mut Ctx<'_>, points: u64) {
        ctx.session.add_score(points);
        ctx.session.add_life();
        ctx.session.next_loop();
        register_success(ctx, st.player);
        log::info!("Dismounted: +{} points, +1 life", points);
        st.phase = DismountPhase::Success {
            pause: Pause::new(st.tuning.success_pause),
            points,
        };
    }

    fn aim(st: &mut DismountState, ctx: &Ctx<'_>, dt: f32) {
        let turn = ctx.input.horizontal_axis() * st.tuning.aim_turn_rate * dt;
        st.aim = crate::normalize_angle(st.aim + turn);
    }

    /// Ride and Charging: the rider is still on the diving worm
    fn update_on_worm(st: &mut DismountState, ctx: &mut Ctx<'_>, dt: f32) {
        st.player = st.seat();
        let depth = st.seat_submersion();
        ctx.audio.set_music_intensity(depth);
        if depth >= st.tuning.submersion_threshold {
            Self::die(st, ctx, DeathCause::Swallowed);
            return;
        }

        let input = ctx.input;
        match st.phase {
            DismountPhase::Ride => {
                let arrow = Key::ARROWS.iter().any(|k| input.was_pressed(*k));
                if let Some(rock) = st.rock_in_walk_range().filter(|_| arrow) {
                    log::info!("Walking off onto rock at ({:.0}, {:.0})", rock.pos.x, rock.pos.y);
                    st.phase = DismountPhase::Walking {
                        from: st.player,
                        to: rock.pos,
                        progress: 0.0,
                    };
                    return;
                }
                Self::aim(st, ctx, dt);
                if input.was_pressed(Key::Space) {
                    st.phase = DismountPhase::Charging { held: 0.0 };
                }
            }
            DismountPhase::Charging { held } => {
                Self::aim(st, ctx, dt);
                if input.is_down(Key::Space) {
                    st.phase = DismountPhase::Charging { held: held + dt };
                } else {
                    let jump = st.launch(held);
                    ctx.audio.play(SoundEffect::Jump);
                    st.phase = DismountPhase::Jumping(jump);
                }
            }
            _ => {}
        }
    }
}

impl GameScreen for DismountLevel {
    fn enter(&mut self, ctx: &mut Ctx<'_>) {
        self.state = Some(DismountState::new(ctx.session, &ctx.tuning.dismount, 0));
        ctx.audio.play_music(MusicTrack::Dismount);
        log::info!(
            "Level 3 (loop {}): walk range {:.0}, dive speed {:.2}",
            ctx.session.loop_count,
            ctx.tuning.dismount.walk_range(ctx.session.loop_count),
            ctx.tuning.dismount.dive_speed(ctx.session.loop_count)
        );
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) {
        let Some(st) = self.state.as_mut() else {
            return;
        };
        st.time += dt;

        match &mut st.phase {
            DismountPhase::Ride | DismountPhase::Charging { .. } => {
                st.advance_worm();
                Self::update_on_worm(st, ctx, dt);
            }
            DismountPhase::Jumping(jump) => {
                let duration = st.tuning.jump_duration.max(f32::EPSILON);
                jump.progress = (jump.progress + dt / duration).min(1.0);
                let jump = *jump;
                st.advance_worm();
                st.player = jump.position(st.tuning.arc_height);
                if jump.progress >= 1.0 {
                    st.player = jump.target;
                    match st.resolve_landing(jump.target) {
                        Ok(_) => {
                            let points = jump_points(jump.charge, st.tuning.max_points, ctx.session.loop_count);
                            Self::succeed(st, ctx, points);
                        }
                        Err(cause) => Self::die(st, ctx, cause),
                    }
                }
            }
            DismountPhase::Walking { from, to, progress } => {
                let dist = from.distance(*to).max(f32::EPSILON);
                *progress = (*progress + st.tuning.walk_speed * dt / dist).min(1.0);
                let (from, to, progress) = (*from, *to, *progress);
                st.advance_worm();
                st.player = from.lerp(to, progress);
                if progress >= 1.0 {
                    Self::succeed(st, ctx, 0);
                }
            }
            DismountPhase::Success { pause, .. } => {
                if pause.tick(dt) {
                    ctx.switch_to(StateId::Level1);
                }
            }
            DismountPhase::Death { pause, after, .. } => {
                let after = *after;
                if pause.tick(dt) && finish_death(ctx, after) {
                    let tuning = ctx.tuning;
                    let attempt = st.attempt + 1;
                    *st = DismountState::new(ctx.session, &tuning.dismount, attempt);
                }
            }
        }
    }

    fn exit(&mut self, ctx: &mut Ctx<'_>) {
        ctx.audio.set_music_intensity(0.0);
    }

    fn render(&self, _session: &SessionState, draw: &mut DrawList) {
        draw.clear(palette::SAND);
        let Some(st) = &self.state else {
            return;
        };
        let t = &st.tuning;

        draw.line(
            Vec2::new(0.0, t.path_y),
            Vec2::new(GAME_WIDTH, t.path_y),
            palette::OCHRE,
            2.0,
        );

        for rock in &st.layout.rocks {
            draw.circle(rock.pos, rock.radius, palette::ROCK_GREY);
            draw.circle_alpha(rock.pos, rock.hit_radius(t), palette::SAFE_GREEN, 0.3);
        }
        for h in &st.layout.hazards {
            match h.kind {
                HazardKind::Quicksand => draw.circle_alpha(h.pos, h.radius, palette::QUICKSAND, 0.8),
                HazardKind::Geyser { .. } => {
                    let alpha = if h.is_active(st.time, t) { 0.9 } else { 0.25 };
                    draw.circle_alpha(h.pos, h.radius, palette::GEYSER, alpha);
                }
            }
        }

        for (i, seg) in st.worm.segments.iter().enumerate().rev() {
            let color = if i == 0 { palette::DEEP_BROWN } else { palette::WORM };
            draw.circle_alpha(seg.pos, seg.radius, color, 1.0 - seg.submersion);
        }

        draw.rect(
            st.player - Vec2::new(4.0, 14.0),
            Vec2::new(8.0, 14.0),
            palette::SPICE_BLUE,
        );

        let center_x = GAME_WIDTH / 2.0;
        match &st.phase {
            DismountPhase::Ride => {
                let hint = if st.rock_in_walk_range().is_some() {
                    "ARROW to step off   SPACE to leap"
                } else {
                    "\u{2190} \u{2192} aim   hold SPACE to charge"
                };
                draw.text(hint, Vec2::new(center_x, 40.0), palette::DEEP_BROWN, 12.0);
                let tip = st.player + Vec2::from_angle(st.aim) * 20.0;
                draw.line(st.player, tip, palette::DEEP_BROWN, 1.0);
            }
            DismountPhase::Charging { held } => {
                let charge = charge_for(*held, t.full_charge_time);
                let tip = st.player + Vec2::from_angle(st.aim) * (20.0 + charge * t.max_jump_power);
                draw.line(st.player, tip, palette::BURNT_ORANGE, 2.0);
                draw.rect(Vec2::new(center_x - 60.0, 50.0), Vec2::new(120.0 * charge, 6.0), palette::BURNT_ORANGE);
            }
            DismountPhase::Jumping(jump) => {
                draw.circle_alpha(jump.target, 3.0, palette::DEEP_BROWN, 0.6);
            }
            DismountPhase::Walking { .. } => {}
            DismountPhase::Success { points, .. } => {
                draw.text("SAFE!", Vec2::new(center_x, 70.0), palette::DEEP_BROWN, 28.0);
                let detail = if *points == 0 {
                    "+1 life".to_string()
                } else {
                    format!("+{points}   +1 life")
                };
                draw.text(detail, Vec2::new(center_x, 100.0), palette::BURNT_ORANGE, 14.0);
            }
            DismountPhase::Death { cause, .. } => {
                draw.text(cause.label(), Vec2::new(center_x, 70.0), palette::BURNT_ORANGE, 22.0);
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
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn entered(bed: &mut TestBed) -> DismountLevel {
        let mut level = DismountLevel::new();
        bed.enter(&mut level);
        level
    }

    /// Hold Space for `frames`, then release
    fn charge_and_release(bed: &mut TestBed, level: &mut DismountLevel, frames: usize) {
        bed.step(level, &InputSnapshot::pressing(&[Key::Space]), DT);
        for _ in 0..frames {
            bed.step(level, &InputSnapshot::holding(&[Key::Space]), DT);
        }
        bed.step(level, &InputSnapshot::empty(), DT);
    }

    #[test]
    fn test_layout_is_pure_and_scales() {
        let t = DismountTuning::default();
        let a = DismountLayout::generate(11, 1, 0, &t);
        let b = DismountLayout::generate(11, 1, 0, &t);
        let c = DismountLayout::generate(11, 1, 1, &t);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.rocks.len(), t.rock_count);
        assert_eq!(a.hazards.len(), 2);

        let late = DismountLayout::generate(11, 6, 0, &t);
        assert!(late.hazards.len() > a.hazards.len());
        assert!(late.rocks[0].radius < a.rocks[0].radius);
    }

    #[test]
    fn test_charge_curve_is_ease_in() {
        assert_eq!(charge_for(0.0, 1.2), 0.0);
        assert!((charge_for(0.6, 1.2) - 0.25).abs() < 1e-6);
        assert_eq!(charge_for(5.0, 1.2), 1.0);
        assert_eq!(jump_points(1.0, 1000.0, 2), 2000);
        assert_eq!(jump_points(0.5, 1000.0, 1), 250);
    }

    #[test]
    fn test_geyser_window() {
        let t = DismountTuning::default();
        let g = Hazard {
            pos: Vec2::ZERO,
            radius: 10.0,
            kind: HazardKind::Geyser { phase: 0.0 },
        };
        assert!(g.is_active(0.5, &t));
        assert!(!g.is_active(1.0, &t));
        assert!(g.is_active(t.geyser_period + 0.1, &t));
    }

    #[test]
    fn test_walk_off_scores_zero_and_completes_loop() {
        let mut bed = TestBed::new();
        bed.session.add_score(40);
        let mut level = entered(&mut bed);
        bed.step(&mut level, &InputSnapshot::pressing(&[Key::Left]), DT);
        assert!(matches!(level.state().unwrap().phase, DismountPhase::Walking { .. }));

        let mut next = None;
        for _ in 0..300 {
            next = next.or(bed.step(&mut level, &InputSnapshot::empty(), DT));
        }
        assert_eq!(next, Some(StateId::Level1));
        assert_eq!(bed.session.score, 40);
        assert_eq!(bed.session.loop_count, 2);
        assert_eq!(bed.session.lives, bed.tuning.session.initial_lives + 1);
    }

    #[test]
    fn test_full_leap_onto_rock_scores() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.dismount.clone();
        {
            // single rock straight up, exactly one full-power leap away
            let st = level.state_mut().unwrap();
            let seat = st.seat();
            st.layout.rocks = vec![Rock {
                pos: seat - Vec2::new(0.0, t.max_jump_power),
                radius: 20.0,
            }];
            st.layout.rocks[0].pos.y = st.layout.rocks[0].pos.y.max(t.bounds_margin);
            st.layout.hazards.clear();
            st.tuning.worm_speed = 0.0;
        }
        let frames = (t.full_charge_time / DT) as usize + 5;
        charge_and_release(&mut bed, &mut level, frames);
        assert!(matches!(level.state().unwrap().phase, DismountPhase::Jumping(_)));

        for _ in 0..60 {
            bed.step(&mut level, &InputSnapshot::empty(), DT);
        }
        let st = level.state().unwrap();
        assert!(
            matches!(st.phase, DismountPhase::Success { points: 1000, .. }),
            "phase was {:?}",
            st.phase
        );
        assert_eq!(bed.session.score, 1000);
        assert_eq!(bed.session.loop_count, 2);
    }

    #[test]
    fn test_missed_leap_reports_hazard() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        {
            let st = level.state_mut().unwrap();
            let seat = st.seat();
            st.layout.rocks.clear();
            st.layout.hazards = vec![Hazard {
                pos: seat,
                radius: 30.0,
                kind: HazardKind::Quicksand,
            }];
        }
        // zero-charge hop lands where it started
        bed.step(&mut level, &InputSnapshot::pressing(&[Key::Space]), DT);
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        for _ in 0..60 {
            bed.step(&mut level, &InputSnapshot::empty(), DT);
        }
        assert!(matches!(
            level.state().unwrap().phase,
            DismountPhase::Death { cause: DeathCause::Quicksand, .. }
        ));
    }

    #[test]
    fn test_landing_on_dormant_geyser_is_a_plain_miss() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.dismount.clone();
        {
            // phase keeps the geyser quiet for the whole hop
            let st = level.state_mut().unwrap();
            let seat = st.seat();
            st.layout.rocks.clear();
            st.layout.hazards = vec![Hazard {
                pos: seat,
                radius: 30.0,
                kind: HazardKind::Geyser { phase: t.geyser_active + 0.1 },
            }];
        }
        bed.step(&mut level, &InputSnapshot::pressing(&[Key::Space]), DT);
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        for _ in 0..60 {
            bed.step(&mut level, &InputSnapshot::empty(), DT);
        }
        let st = level.state().unwrap();
        assert!(
            matches!(st.phase, DismountPhase::Death { cause: DeathCause::MissedLanding, .. }),
            "phase was {:?}",
            st.phase
        );
    }

    #[test]
    fn test_landing_follows_geyser_cycle() {
        let bed = TestBed::new();
        let t = bed.tuning.dismount.clone();
        let mut st = DismountState::new(&bed.session, &t, 0);
        let target = Vec2::new(300.0, 80.0);
        st.layout.rocks.clear();
        st.layout.hazards = vec![Hazard {
            pos: target,
            radius: 20.0,
            kind: HazardKind::Geyser { phase: 0.0 },
        }];

        st.time = t.geyser_active * 0.5;
        assert_eq!(st.resolve_landing(target), Err(DeathCause::Geyser));
        st.time = t.geyser_active + 0.05;
        assert_eq!(st.resolve_landing(target), Err(DeathCause::MissedLanding));
        st.time = t.geyser_period;
        assert_eq!(st.resolve_landing(target), Err(DeathCause::Geyser));
    }

    #[test]
    fn test_layout_survives_oversized_radii() {
        let t = DismountTuning {
            rock_radius_base: 400.0,
            rock_radius_min: 400.0,
            quicksand_radius: 500.0,
            geyser_radius: 500.0,
            ..DismountTuning::default()
        };
        for loop_count in [1, 6] {
            let layout = DismountLayout::generate(7, loop_count, 0, &t);
            assert_eq!(layout.rocks.len(), t.rock_count);
            let hazards = t.quicksand_count(loop_count) + t.geyser_count(loop_count);
            assert_eq!(layout.hazards.len(), hazards as usize);
            assert!(layout.rocks.iter().all(|r| r.pos.is_finite()));
            assert!(layout.hazards.iter().all(|h| h.pos.is_finite()));
        }
    }

    #[test]
    fn test_staying_too_long_is_swallowed() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        level.state_mut().unwrap().layout.rocks.clear();
        let mut died = false;
        for _ in 0..(20.0 / DT) as usize {
            bed.step(&mut level, &InputSnapshot::empty(), DT);
            if let DismountPhase::Death { cause, .. } = level.state().unwrap().phase {
                assert_eq!(cause, DeathCause::Swallowed);
                died = true;
                break;
            }
        }
        assert!(died);
        assert_eq!(bed.session.lives, bed.tuning.session.initial_lives - 1);
    }

    #[test]
    fn test_submersion_is_head_first_and_monotone() {
        let bed = TestBed::new();
        let mut st = DismountState::new(&bed.session, &bed.tuning.dismount, 0);
        let mut prev: Vec<f32> = st.worm.segments.iter().map(|s| s.submersion).collect();
        for _ in 0..400 {
            st.time += DT;
            st.advance_worm();
            let now: Vec<f32> = st.worm.segments.iter().map(|s| s.submersion).collect();
            assert!(now.iter().zip(&prev).all(|(n, p)| n >= p));
            assert!(now.windows(2).all(|w| w[0] >= w[1]));
            prev = now;
        }
    }

    proptest! {
        #[test]
        fn prop_jump_score_monotone_in_hold(a in 0.0f32..3.0, b in 0.0f32..3.0, loop_count in 1u32..10) {
            let (short, long) = if a <= b { (a, b) } else { (b, a) };
            let t = DismountTuning::default();
            let low = jump_points(charge_for(short, t.full_charge_time), t.max_points, loop_count);
            let high = jump_points(charge_for(long, t.full_charge_time), t.max_points, loop_count);
            prop_assert!(low <= high);
        }
    }
}
