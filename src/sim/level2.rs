//! Level 2 - Ride the worm
//!
//! Steer across a desert that wraps on both axes. Small enemies are food,
//! large ones are fatal. Every proximity test (flee, bite, danger count,
//! close call) goes through the wrap-aware delta, so nothing is missed at the
//! seams.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{circles_overlap_wrapped, count_within_wrapped};
use super::fsm::{Ctx, GameScreen, StateId};
use super::outcome::{finish_death, register_death, register_success, AfterDeath, DeathCause, Pause};
use super::state::{LayoutStream, SessionState};
use super::worm::Worm;
use crate::audio::{MusicTrack, SoundEffect};
use crate::consts::{GAME_HEIGHT, GAME_WIDTH};
use crate::renderer::{palette, Color, DrawList, TextAlign};
use crate::tuning::{RideTuning, WaveSpec};
use crate::{normalize_angle, wrap_delta, wrap_distance, wrap_position};

/// Spawn attempts before accepting a spot closer than the clearance
const SPAWN_TRIES: usize = 32;

/// Large enemies within the danger radius needed for a close call
const CLOSE_CALL_THRESHOLD: u32 = 2;

const WORLD: Vec2 = Vec2::new(GAME_WIDTH, GAME_HEIGHT);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Soldier,
    Harvester,
    Ornithopter,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Soldier, EnemyKind::Harvester, EnemyKind::Ornithopter];

    /// Kinds big enough to come in the deadly size
    pub const LARGE: [EnemyKind; 2] = [EnemyKind::Harvester, EnemyKind::Ornithopter];

    pub fn base_points(&self, t: &RideTuning) -> u32 {
        match self {
            EnemyKind::Soldier => t.soldier_points,
            EnemyKind::Harvester => t.harvester_points,
            EnemyKind::Ornithopter => t.ornithopter_points,
        }
    }

    pub fn speed(&self, t: &RideTuning) -> f32 {
        match self {
            EnemyKind::Soldier => t.soldier_speed,
            EnemyKind::Harvester => t.harvester_speed,
            EnemyKind::Ornithopter => t.ornithopter_speed,
        }
    }

    fn color(&self) -> Color {
        match self {
            EnemyKind::Soldier => palette::BONE,
            EnemyKind::Harvester => palette::ROCK_GREY,
            EnemyKind::Ornithopter => palette::SPICE_BLUE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemySize {
    Small,
    Large,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: EnemyKind,
    pub size: EnemySize,
    pub radius: f32,
    pub alive: bool,
}

impl Enemy {
    pub fn is_large(&self) -> bool {
        self.size == EnemySize::Large
    }
}

/// Rolling kill streak
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Combo {
    pub count: u32,
    timer: f32,
}

impl Combo {
    /// Count down the window; the streak ends when it reaches zero
    pub fn tick(&mut self, dt: f32) {
        if self.count == 0 {
            return;
        }
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.count = 0;
            self.timer = 0.0;
        }
    }

    /// Register a kill and return its multiplier
    pub fn register_kill(&mut self, window: f32, step: f32) -> f32 {
        self.count += 1;
        self.timer = window;
        1.0 + (self.count - 1) as f32 * step
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Score for one kill: base x combo x danger_base^nearby
pub fn kill_points(base: u32, combo_multiplier: f32, danger_base: f32, nearby_large: u32) -> u64 {
    let danger = danger_base.powi(nearby_large as i32);
    (base as f32 * combo_multiplier * danger).round().max(0.0) as u64
}

/// Tracks a stretch spent next to two or more large enemies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloseCall {
    in_danger: bool,
    peak: u32,
}

impl CloseCall {
    /// Feed this tick's danger count; returns the peak when a stretch ends
    pub fn observe(&mut self, nearby_large: u32) -> Option<u32> {
        if nearby_large >= CLOSE_CALL_THRESHOLD {
            self.in_danger = true;
            self.peak = self.peak.max(nearby_large);
            None
        } else if self.in_danger {
            let peak = self.peak;
            *self = Self::default();
            Some(peak)
        } else {
            None
        }
    }

    pub fn in_danger(&self) -> bool {
        self.in_danger
    }
}

/// What survives a death so the ride resumes instead of restarting
#[derive(Debug, Clone, PartialEq)]
pub struct RideSnapshot {
    pub enemies: Vec<Enemy>,
    pub waves_spawned: usize,
    pub wave_timer: f32,
    pub segments: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RidePhase {
    Playing,
    Success(Pause),
    Death {
        pause: Pause,
        after: AfterDeath,
        cause: DeathCause,
        snapshot: RideSnapshot,
    },
}

#[derive(Debug, Clone)]
pub struct RideState {
    pub phase: RidePhase,
    pub worm: Worm,
    /// Radians, 0 = east
    pub heading: f32,
    pub speed_mult: f32,
    pub enemies: Vec<Enemy>,
    pub waves: Vec<WaveSpec>,
    pub waves_spawned: usize,
    pub wave_timer: f32,
    pub combo: Combo,
    pub close_call: CloseCall,
    pub nearby_large: u32,
    pub small_killed: u32,
    /// Last score popup: points and seconds left on screen
    pub popup: Option<(u64, Vec2, f32)>,
    enemy_speed_mult: f32,
    next_id: u32,
    rng: Pcg32,
    tuning: RideTuning,
}

impl RideState {
    pub fn new(session: &SessionState, t: &RideTuning) -> Self {
        let loop_count = session.loop_count;
        let mut state = Self {
            phase: RidePhase::Playing,
            worm: centred_worm(t, t.initial_segments),
            heading: 0.0,
            speed_mult: 1.0,
            enemies: Vec::new(),
            waves: t.waves_for_loop(loop_count).to_vec(),
            waves_spawned: 0,
            wave_timer: 0.0,
            combo: Combo::default(),
            close_call: CloseCall::default(),
            nearby_large: 0,
            small_killed: 0,
            popup: None,
            enemy_speed_mult: t.enemy_speed_mult(loop_count),
            next_id: 1,
            rng: session.layout_rng(LayoutStream::Ride, 0),
            tuning: t.clone(),
        };
        state.spawn_next_wave();
        state
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.phase, RidePhase::Death { .. })
    }

    pub fn all_waves_spawned(&self) -> bool {
        self.waves_spawned >= self.waves.len()
    }

    pub fn small_alive(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive && !e.is_large()).count()
    }

    fn spawn_next_wave(&mut self) {
        let Some(wave) = self.waves.get(self.waves_spawned).copied() else {
            return;
        };
        self.waves_spawned += 1;
        self.wave_timer = 0.0;
        log::info!(
            "Wave {}/{}: {} large, {} small",
            self.waves_spawned,
            self.waves.len(),
            wave.large,
            wave.small
        );

        for _ in 0..wave.large {
            let kind = EnemyKind::LARGE[self.rng.random_range(0..EnemyKind::LARGE.len())];
            self.spawn_enemy(kind, EnemySize::Large);
        }
        for _ in 0..wave.small {
            let kind = EnemyKind::ALL[self.rng.random_range(0..EnemyKind::ALL.len())];
            self.spawn_enemy(kind, EnemySize::Small);
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, size: EnemySize) {
        let t = &self.tuning;
        let head = self.worm.head();
        let mut pos = Vec2::ZERO;
        for _ in 0..SPAWN_TRIES {
            pos = Vec2::new(
                self.rng.random_range(0.0..WORLD.x),
                self.rng.random_range(0.0..WORLD.y),
            );
            if wrap_distance(pos, head, WORLD) >= t.spawn_clearance {
                break;
            }
        }

        let center = WORLD / 2.0;
        let speed = kind.speed(t) * self.enemy_speed_mult;
        let jitter = Vec2::new(
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
        ) * t.drift_jitter;
        let vel = (center - pos).normalize_or(Vec2::X) * speed + jitter;

        let radius = match size {
            EnemySize::Small => t.small_radius,
            EnemySize::Large => t.large_radius,
        };
        let id = self.next_id;
        self.next_id += 1;
        self.enemies.push(Enemy {
            id,
            pos,
            vel,
            kind,
            size,
            radius,
            alive: true,
        });
    }

    fn steer(&mut self, ctx: &Ctx<'_>, dt: f32) {
        let t = &self.tuning;
        let input = ctx.input;
        let turn = t.turn_rate(self.worm.len());
        self.heading = normalize_angle(self.heading + input.horizontal_axis() * turn * dt);
        // Up speeds up, Down slows down
        self.speed_mult = (self.speed_mult - input.vertical_axis() * t.speed_change_rate * dt)
            .clamp(t.speed_min_mult, t.speed_max_mult);

        let dir = Vec2::from_angle(self.heading);
        let head = self.worm.head() + dir * t.base_speed * self.speed_mult * dt;
        self.worm.set_head(wrap_position(head, WORLD));
        self.worm.follow_wrapped(t.segment_spacing, WORLD);
    }

    fn move_enemies(&mut self, dt: f32) {
        let t = &self.tuning;
        let head = self.worm.head();
        let flee_speed = t.flee_speed * self.enemy_speed_mult;
        for e in self.enemies.iter_mut().filter(|e| e.alive) {
            if e.kind == EnemyKind::Soldier && !e.is_large() {
                let away = wrap_delta(e.pos, head, WORLD);
                if away.length() < t.flee_radius {
                    e.vel = away.normalize_or(Vec2::X) * flee_speed;
                }
            }
            e.pos = wrap_position(e.pos + e.vel * dt, WORLD);
        }
    }

    fn count_nearby_large(&self) -> u32 {
        count_within_wrapped(
            self.enemies.iter().filter(|e| e.alive && e.is_large()).map(|e| e.pos),
            self.worm.head(),
            self.tuning.danger_radius,
            WORLD,
        ) as u32
    }

    fn capture_snapshot(&self) -> RideSnapshot {
        RideSnapshot {
            enemies: self.enemies.clone(),
            waves_spawned: self.waves_spawned,
            wave_timer: self.wave_timer,
            segments: self.worm.len(),
        }
    }

    /// Pick up after a death: worm re-centred, enemies and wave progress kept
    pub fn resume_from(&mut self, snapshot: RideSnapshot) {
        let t = &self.tuning;
        let center = WORLD / 2.0;
        self.worm = centred_worm(t, snapshot.segments);
        self.heading = 0.0;
        self.speed_mult = 1.0;
        self.enemies = snapshot.enemies;
        self.waves_spawned = snapshot.waves_spawned;
        self.wave_timer = snapshot.wave_timer;
        self.combo.reset();
        self.close_call = CloseCall::default();
        self.nearby_large = 0;
        self.popup = None;

        let clearance = t.respawn_clearance;
        for e in self.enemies.iter_mut() {
            let offset = wrap_delta(e.pos, center, WORLD);
            if offset.length() < clearance {
                e.pos = wrap_position(center + offset.normalize_or(Vec2::X) * clearance, WORLD);
            }
        }
        self.phase = RidePhase::Playing;
        log::info!(
            "Ride resumed: wave {}/{}, {} enemies left",
            self.waves_spawned,
            self.waves.len(),
            self.enemies.len()
        );
    }
}

fn centred_worm(t: &RideTuning, segments: usize) -> Worm {
    Worm::straight(
        WORLD / 2.0,
        Vec2::NEG_X,
        segments,
        t.segment_spacing,
        t.head_radius,
        t.head_radius * 0.8,
    )
}

/// The Level 2 screen
#[derive(Debug, Default)]
pub struct RideLevel {
    state: Option<RideState>,
}

impl RideLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&RideState> {
        self.state.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> Option<&mut RideState> {
        self.state.as_mut()
    }

    fn update_playing(st: &mut RideState, ctx: &mut Ctx<'_>, dt: f32) {
        let tuning = ctx.tuning;
        let t = &tuning.ride;

        st.steer(ctx, dt);
        st.combo.tick(dt);
        if let Some((_, _, ttl)) = st.popup.as_mut() {
            *ttl -= dt;
        }
        if st.popup.is_some_and(|(_, _, ttl)| ttl <= 0.0) {
            st.popup = None;
        }

        st.wave_timer += dt;
        if !st.all_waves_spawned() && (st.wave_timer >= t.wave_interval || st.small_alive() == 0) {
            st.spawn_next_wave();
            ctx.audio.play(SoundEffect::WormRumble);
        }

        st.move_enemies(dt);
        st.nearby_large = st.count_nearby_large();

        let head = st.worm.head();
        let head_radius = st.worm.head_radius();
        for i in 0..st.enemies.len() {
            let e = &st.enemies[i];
            if !e.alive || !circles_overlap_wrapped(head, head_radius, e.pos, e.radius, WORLD) {
                continue;
            }
            if e.is_large() {
                let cause = DeathCause::Devoured(e.kind);
                let snapshot = st.capture_snapshot();
                let after = register_death(ctx, cause, head);
                st.phase = RidePhase::Death {
                    pause: Pause::new(t.death_pause),
                    after,
                    cause,
                    snapshot,
                };
                return;
            }

            let kind = e.kind;
            let pos = e.pos;
            st.enemies[i].alive = false;
            st.small_killed += 1;
            let mult = st.combo.register_kill(t.combo_window, t.combo_multiplier);
            let points = kill_points(kind.base_points(t), mult, t.danger_base, st.nearby_large);
            ctx.session.add_score(points);
            st.popup = Some((points, pos, 0.8));
            st.worm.grow(t.max_segments);
            ctx.audio.play(SoundEffect::Eat);
            ctx.effects.spawn_particles(pos, 8, palette::SAND, 40.0);
            log::debug!(
                "Ate {:?}: +{} (combo {}, {} large nearby)",
                kind,
                points,
                st.combo.count,
                st.nearby_large
            );
        }
        st.enemies.retain(|e| e.alive);

        if let Some(peak) = st.close_call.observe(st.nearby_large) {
            let bonus = t.close_call_points * u64::from(peak);
            ctx.session.add_score(bonus);
            ctx.audio.play(SoundEffect::CloseCall);
            ctx.effects.trigger_flash(palette::SPICE_BLUE, 0.1);
            st.popup = Some((bonus, head, 1.0));
            log::info!("Close call with {} large: +{}", peak, bonus);
        }

        if st.all_waves_spawned() && st.small_alive() == 0 {
            log::info!("Ride complete: {} eaten", st.small_killed);
            register_success(ctx, head);
            st.phase = RidePhase::Success(Pause::new(t.success_pause));
            return;
        }

        ctx.audio.set_music_intensity(st.nearby_large as f32 / 3.0);
    }
}

impl GameScreen for RideLevel {
    fn enter(&mut self, ctx: &mut Ctx<'_>) {
        self.state = Some(RideState::new(ctx.session, &ctx.tuning.ride));
        ctx.audio.play_music(MusicTrack::Ride);
        log::info!(
            "Level 2 (loop {}): {} waves",
            ctx.session.loop_count,
            ctx.tuning.ride.waves_for_loop(ctx.session.loop_count).len()
        );
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) {
        let Some(st) = self.state.as_mut() else {
            return;
        };
        match &mut st.phase {
            RidePhase::Playing => Self::update_playing(st, ctx, dt),
            RidePhase::Success(pause) => {
                if pause.tick(dt) {
                    ctx.switch_to(StateId::Level3);
                }
            }
            RidePhase::Death {
                pause,
                after,
                snapshot,
                ..
            } => {
                let after = *after;
                if pause.tick(dt) && finish_death(ctx, after) {
                    let snapshot = snapshot.clone();
                    st.resume_from(snapshot);
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

        for e in st.enemies.iter().filter(|e| e.alive) {
            if e.is_large() {
                draw.circle(e.pos, e.radius, palette::DEEP_BROWN);
                draw.circle(e.pos, e.radius * 0.5, e.kind.color());
            } else {
                draw.circle(e.pos, e.radius, e.kind.color());
            }
        }

        let danger = st.close_call.in_danger();
        for (i, seg) in st.worm.segments.iter().enumerate().rev() {
            let color = match (i, danger) {
                (0, true) => palette::BURNT_ORANGE,
                (0, false) => palette::DEEP_BROWN,
                _ => palette::WORM,
            };
            draw.circle(seg.pos, seg.radius, color);
        }

        if let Some((points, pos, _)) = st.popup {
            draw.text(format!("+{points}"), pos - Vec2::new(0.0, 14.0), palette::DEEP_BROWN, 12.0);
        }

        draw.text_aligned(
            format!("Wave {}/{}", st.waves_spawned, st.waves.len()),
            Vec2::new(8.0, 32.0),
            palette::DEEP_BROWN,
            12.0,
            TextAlign::Left,
        );
        if st.combo.count > 1 {
            draw.text_aligned(
                format!("x{} COMBO", st.combo.count),
                Vec2::new(GAME_WIDTH - 8.0, 32.0),
                palette::BURNT_ORANGE,
                12.0,
                TextAlign::Right,
            );
        }

        let center = Vec2::new(GAME_WIDTH / 2.0, GAME_HEIGHT / 2.0);
        match &st.phase {
            RidePhase::Playing => {}
            RidePhase::Success(_) => {
                draw.text("THE DESERT IS YOURS", center, palette::DEEP_BROWN, 24.0);
            }
            RidePhase::Death { cause, .. } => {
                draw.text(cause.label(), center, palette::BURNT_ORANGE, 22.0);
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
    use crate::audio::AudioCommand;
    use crate::platform::{InputSnapshot, Key};
    use crate::sim::testbed::TestBed;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn entered(bed: &mut TestBed) -> RideLevel {
        let mut level = RideLevel::new();
        bed.enter(&mut level);
        level
    }

    fn enemy(id: u32, pos: Vec2, kind: EnemyKind, size: EnemySize, radius: f32) -> Enemy {
        Enemy {
            id,
            pos,
            vel: Vec2::ZERO,
            kind,
            size,
            radius,
            alive: true,
        }
    }

    #[test]
    fn test_combo_window() {
        let mut combo = Combo::default();
        let mut mults = Vec::new();
        mults.push(combo.register_kill(1.5, 0.5));
        combo.tick(1.0);
        mults.push(combo.register_kill(1.5, 0.5));
        combo.tick(1.0);
        mults.push(combo.register_kill(1.5, 0.5));
        combo.tick(2.0);
        mults.push(combo.register_kill(1.5, 0.5));
        assert_eq!(mults, vec![1.0, 1.5, 2.0, 1.0]);
    }

    #[test]
    fn test_kill_points_danger_bonus() {
        assert_eq!(kill_points(10, 1.0, 4.0, 0), 10);
        assert_eq!(kill_points(10, 1.5, 4.0, 0), 15);
        assert_eq!(kill_points(25, 2.0, 4.0, 2), 800);
    }

    #[test]
    fn test_close_call_pays_once_on_exit() {
        let mut cc = CloseCall::default();
        assert_eq!(cc.observe(2), None);
        assert_eq!(cc.observe(3), None);
        assert_eq!(cc.observe(1), Some(3));
        assert_eq!(cc.observe(1), None);
        assert_eq!(cc.observe(0), None);
    }

    #[test]
    fn test_first_wave_spawns_clear_of_head() {
        let bed = TestBed::new();
        let st = RideState::new(&bed.session, &bed.tuning.ride);
        assert_eq!(st.waves_spawned, 1);
        assert_eq!(st.enemies.iter().filter(|e| e.is_large()).count(), 2);
        assert_eq!(st.small_alive(), 3);
        assert!(
            st.enemies
                .iter()
                .filter(|e| e.is_large())
                .all(|e| EnemyKind::LARGE.contains(&e.kind))
        );
    }

    #[test]
    fn test_steering_clamps_speed() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        {
            // one unreachable snack keeps the level running
            let st = level.state_mut().unwrap();
            st.enemies = vec![enemy(1, Vec2::new(600.0, 20.0), EnemyKind::Harvester, EnemySize::Small, 5.0)];
            st.waves_spawned = st.waves.len();
        }
        for _ in 0..300 {
            bed.step(&mut level, &InputSnapshot::holding(&[Key::Up, Key::Left]), DT);
        }
        let st = level.state().unwrap();
        assert!((st.speed_mult - bed.tuning.ride.speed_max_mult).abs() < 1e-4);
        assert!(st.heading.abs() <= std::f32::consts::PI);
    }

    #[test]
    fn test_eat_across_seam_scores_with_danger_bonus() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.ride.clone();
        {
            let st = level.state_mut().unwrap();
            st.worm.set_head(Vec2::new(WORLD.x - 1.0, 100.0));
            st.heading = 0.0;
            st.enemies = vec![
                // just across the seam from the head
                enemy(100, Vec2::new(3.0, 100.0), EnemyKind::Harvester, EnemySize::Small, t.small_radius),
                // one large in danger range, not touching
                enemy(101, Vec2::new(WORLD.x - 60.0, 100.0), EnemyKind::Ornithopter, EnemySize::Large, t.large_radius),
                // keeps the level from finishing
                enemy(102, Vec2::new(300.0, 300.0), EnemyKind::Harvester, EnemySize::Small, t.small_radius),
            ];
        }
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        let st = level.state().unwrap();
        assert_eq!(st.small_killed, 1);
        assert_eq!(bed.session.score, 25 * 4);
        assert_eq!(st.worm.len(), t.initial_segments + 1);
    }

    #[test]
    fn test_large_contact_kills_and_resumes_recentred() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.ride.clone();
        let center = WORLD / 2.0;
        {
            let st = level.state_mut().unwrap();
            st.worm.set_head(Vec2::new(50.0, 50.0));
            st.enemies = vec![
                enemy(200, Vec2::new(55.0, 50.0), EnemyKind::Harvester, EnemySize::Large, t.large_radius),
                enemy(201, center + Vec2::new(10.0, 0.0), EnemyKind::Soldier, EnemySize::Small, t.small_radius),
            ];
        }
        let lives = bed.session.lives;
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        assert!(level.state().unwrap().is_dead());
        assert_eq!(bed.session.lives, lives - 1);

        for _ in 0..((t.death_pause / DT) as usize + 2) {
            assert_eq!(bed.step(&mut level, &InputSnapshot::empty(), DT), None);
            if !level.state().unwrap().is_dead() {
                break;
            }
        }
        let st = level.state().unwrap();
        assert_eq!(st.phase, RidePhase::Playing);
        assert_eq!(st.waves_spawned, 1);
        assert_eq!(st.enemies.len(), 2);
        // the small one was pushed out of the respawn clearance
        let small = st.enemies.iter().find(|e| e.id == 201).unwrap();
        assert!(wrap_distance(small.pos, center, WORLD) >= t.respawn_clearance - 1e-3);
        assert!(wrap_distance(st.worm.head(), center, WORLD) < 1e-3);
    }

    #[test]
    fn test_soldier_flees_head() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        {
            let st = level.state_mut().unwrap();
            st.worm.set_head(Vec2::new(100.0, 100.0));
            st.enemies = vec![
                enemy(1, Vec2::new(140.0, 100.0), EnemyKind::Soldier, EnemySize::Small, 5.0),
                enemy(2, Vec2::new(500.0, 300.0), EnemyKind::Soldier, EnemySize::Small, 5.0),
            ];
        }
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        let st = level.state().unwrap();
        assert!(st.enemies[0].vel.x > 0.0);
        assert_eq!(st.enemies[1].vel, Vec2::ZERO);
    }

    #[test]
    fn test_win_when_waves_done_and_no_small_left() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        {
            let st = level.state_mut().unwrap();
            st.waves_spawned = st.waves.len();
            st.enemies.retain(|e| e.is_large());
            for e in st.enemies.iter_mut() {
                e.pos = Vec2::new(10.0, 10.0);
                e.vel = Vec2::ZERO;
            }
        }
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        assert!(matches!(level.state().unwrap().phase, RidePhase::Success(_)));
        let mut next = None;
        for _ in 0..120 {
            next = next.or(bed.step(&mut level, &InputSnapshot::empty(), DT));
        }
        assert_eq!(next, Some(StateId::Level3));
    }

    #[test]
    fn test_wave_spawns_on_interval_with_smalls_alive() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.ride.clone();
        {
            let st = level.state_mut().unwrap();
            st.enemies = vec![enemy(1, Vec2::new(40.0, 40.0), EnemyKind::Harvester, EnemySize::Small, t.small_radius)];
            st.wave_timer = t.wave_interval - DT * 0.5;
        }
        bed.audio.drain();
        bed.step(&mut level, &InputSnapshot::empty(), DT);

        let st = level.state().unwrap();
        let second = st.waves[1];
        assert_eq!(st.waves_spawned, 2);
        assert_eq!(st.wave_timer, 0.0);
        assert_eq!(st.small_alive(), 1 + second.small as usize);
        assert_eq!(st.enemies.len(), 1 + (second.small + second.large) as usize);
        assert!(bed.audio.drain().iter().any(|c| matches!(
            c,
            AudioCommand::Sfx { effect: SoundEffect::WormRumble, .. }
        )));
    }

    #[test]
    fn test_last_small_eaten_brings_next_wave_early() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.ride.clone();
        {
            let st = level.state_mut().unwrap();
            let head = st.worm.head();
            st.heading = 0.0;
            st.enemies = vec![enemy(1, head + Vec2::new(3.0, 0.0), EnemyKind::Harvester, EnemySize::Small, t.small_radius)];
        }

        bed.step(&mut level, &InputSnapshot::empty(), DT);
        let st = level.state().unwrap();
        assert_eq!(st.small_killed, 1);
        assert_eq!(st.waves_spawned, 1);
        assert_eq!(st.phase, RidePhase::Playing);

        // the next tick sees no food left and brings the wave well before the interval
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        let st = level.state().unwrap();
        assert_eq!(st.waves_spawned, 2);
        assert_eq!(st.wave_timer, 0.0);
        assert_eq!(st.small_alive(), st.waves[1].small as usize);
    }

    #[test]
    fn test_close_call_pays_peak_once_danger_passes() {
        let mut bed = TestBed::new();
        let mut level = entered(&mut bed);
        let t = bed.tuning.ride.clone();
        {
            let st = level.state_mut().unwrap();
            let head = st.worm.head();
            st.heading = 0.0;
            st.waves_spawned = st.waves.len();
            st.enemies = vec![
                enemy(1, head + Vec2::new(0.0, 50.0), EnemyKind::Harvester, EnemySize::Large, t.large_radius),
                enemy(2, head + Vec2::new(0.0, -50.0), EnemyKind::Ornithopter, EnemySize::Large, t.large_radius),
                enemy(3, Vec2::new(40.0, 40.0), EnemyKind::Harvester, EnemySize::Small, t.small_radius),
            ];
        }
        let score = bed.session.score;

        bed.step(&mut level, &InputSnapshot::empty(), DT);
        assert_eq!(level.state().unwrap().nearby_large, 2);
        assert_eq!(bed.session.score, score);

        {
            let st = level.state_mut().unwrap();
            let head = st.worm.head();
            st.enemies[1].pos = head + Vec2::new(0.0, -(t.danger_radius + 40.0));
        }
        bed.step(&mut level, &InputSnapshot::empty(), DT);
        assert_eq!(level.state().unwrap().nearby_large, 1);
        assert_eq!(bed.session.score, score + t.close_call_points * 2);

        bed.step(&mut level, &InputSnapshot::empty(), DT);
        assert_eq!(bed.session.score, score + t.close_call_points * 2);
        assert_eq!(level.state().unwrap().phase, RidePhase::Playing);
    }

    proptest! {
        #[test]
        fn prop_combo_multiplier_grows_within_window(kills in 1u32..20, gap in 0.0f32..1.4) {
            let mut combo = Combo::default();
            let mut last = 0.0;
            for _ in 0..kills {
                let m = combo.register_kill(1.5, 0.5);
                prop_assert!(m > last);
                last = m;
                combo.tick(gap);
            }
        }
    }
}
