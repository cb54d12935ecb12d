//! Gameplay simulation
//!
//! Screens, the state machine that drives them, and the session they share.
//! Nothing here touches a platform API:
//! - Time only advances through `update(dt)`
//! - Randomness comes from seeded `Pcg32` streams
//! - Output is intents (draw lists, audio and effect queues)

pub mod collision;
pub mod fsm;
pub mod level1;
pub mod level2;
pub mod level3;
pub mod outcome;
pub mod qte;
pub mod screens;
pub mod state;
pub mod worm;

pub use fsm::{Ctx, GameScreen, StateId, StateMachine};
pub use level1::MountLevel;
pub use level2::{EnemyKind, RideLevel};
pub use level3::DismountLevel;
pub use outcome::DeathCause;
pub use qte::{QteChallenge, QteStatus};
pub use screens::{GameOverScreen, TitleScreen};
pub use state::{layout_rng, SessionState};
pub use worm::{Segment, Worm};


/// Whole-loop flow across the three levels
#[cfg(test)]
mod flow_tests {
    use glam::Vec2;

    use super::level1::MountPhase;
    use super::level3::DismountPhase;
    use super::testbed::TestBed;
    use super::*;
    use crate::consts::{GAME_HEIGHT, GAME_WIDTH};
    use crate::platform::{InputSnapshot, Key};

    const DT: f32 = 1.0 / 60.0;

    fn run_until(bed: &mut TestBed, screen: &mut dyn GameScreen, frames: usize) -> Option<StateId> {
        for _ in 0..frames {
            if let Some(next) = bed.step(screen, &InputSnapshot::empty(), DT) {
                return Some(next);
            }
        }
        None
    }

    /// Drop the player onto the worm's back mid-zone
    fn mount(bed: &mut TestBed, level: &mut MountLevel) {
        let t = bed.tuning.mount.clone();
        let st = level.state_mut().unwrap();
        st.worm_speed = 0.0;
        st.head_x = st.zone_center + t.segment_spacing * 2.0;
        // one frame so the worm lays itself out
        bed.step(level, &InputSnapshot::empty(), DT);
        let st = level.state_mut().unwrap();
        let seg = st.worm.segments[2].pos;
        st.player.pos = Vec2::new(seg.x, seg.y - 4.0);
        st.player.vel_y = 30.0;
        st.phase = MountPhase::Jump;
        bed.step(level, &InputSnapshot::empty(), DT);
    }

    fn play_level1(bed: &mut TestBed) -> (Option<StateId>, usize) {
        let mut level = MountLevel::new();
        bed.enter(&mut level);
        mount(bed, &mut level);
        let seq = match &level.state().unwrap().phase {
            MountPhase::Challenge { qte, .. } => qte.sequence().to_vec(),
            other => panic!("expected challenge, got {other:?}"),
        };
        for key in &seq {
            bed.step(&mut level, &InputSnapshot::pressing(&[*key]), DT);
        }
        (run_until(bed, &mut level, 300), seq.len())
    }

    fn play_level2(bed: &mut TestBed) -> (Option<StateId>, u32) {
        let mut level = RideLevel::new();
        bed.enter(&mut level);
        let world = Vec2::new(GAME_WIDTH, GAME_HEIGHT);
        let mut eaten = 0;
        for _ in 0..2000 {
            let st = level.state_mut().unwrap();
            // Park the large ones on the far side of the world, then put the
            // head on the first edible one.
            let target = st.enemies.iter().find(|e| e.alive && !e.is_large()).map(|e| e.pos);
            if let Some(target) = target {
                let far = crate::wrap_position(target + world / 2.0, world);
                for e in st.enemies.iter_mut().filter(|e| e.is_large()) {
                    e.pos = far;
                    e.vel = Vec2::ZERO;
                }
                st.worm.set_head(target);
            }
            let before = st.small_killed;
            let next = bed.step(&mut level, &InputSnapshot::empty(), DT);
            eaten += level.state().unwrap().small_killed - before;
            assert!(!level.state().unwrap().is_dead(), "touched a large enemy");
            if next.is_some() {
                return (next, eaten);
            }
        }
        (None, eaten)
    }

    fn play_level3_walk(bed: &mut TestBed) -> Option<StateId> {
        let mut level = DismountLevel::new();
        bed.enter(&mut level);
        bed.step(&mut level, &InputSnapshot::pressing(&[Key::Up]), DT);
        assert!(matches!(
            level.state().unwrap().phase,
            DismountPhase::Walking { .. }
        ));
        run_until(bed, &mut level, 600)
    }

    #[test]
    fn test_full_loop() {
        let mut bed = TestBed::new();
        assert_eq!((bed.session.loop_count, bed.session.score), (1, 0));
        let lives = bed.session.lives;

        let (next, len) = play_level1(&mut bed);
        assert_eq!(len, 3);
        assert_eq!(bed.session.score, 100);
        assert_eq!(next, Some(StateId::Level2));

        assert_eq!(
            bed.tuning.ride.waves_for_loop(1).iter().map(|w| (w.large, w.small)).collect::<Vec<_>>(),
            vec![(2, 3), (1, 2), (1, 2)]
        );
        let before_ride = bed.session.score;
        let (next, eaten) = play_level2(&mut bed);
        assert_eq!(eaten, 7);
        assert_eq!(next, Some(StateId::Level3));
        assert!(bed.session.score > before_ride);
        assert_eq!(bed.session.lives, lives);

        let before_dismount = bed.session.score;
        let next = play_level3_walk(&mut bed);
        assert_eq!(next, Some(StateId::Level1));
        assert_eq!(bed.session.score, before_dismount);
        assert_eq!(bed.session.lives, lives + 1);
        assert_eq!(bed.session.loop_count, 2);

        // loop 2: longer, faster challenge
        assert_eq!(bed.tuning.mount.challenge_length(2), 4);
        assert!(bed.tuning.mount.challenge_time(2) < bed.tuning.mount.challenge_time(1));
        let (next, len) = play_level1(&mut bed);
        assert_eq!(len, 4);
        assert_eq!(next, Some(StateId::Level2));
        assert_eq!(bed.session.score, before_dismount + 200);
    }
}
