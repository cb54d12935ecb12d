//! Session state shared by every screen
//!
//! Lives, score, loop and the leaderboard. Only the active screen mutates it,
//! and only through the methods here.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::outcome::DeathCause;
use crate::consts::INITIAL_LIVES;
use crate::highscores::HighScores;
use crate::persistence::Storage;

/// Salt mixed into layout seeds so each level draws from its own stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStream {
    Mount = 1,
    Ride = 2,
    Dismount = 3,
}

/// Seeded RNG for a level layout; a pure function of its arguments
pub fn layout_rng(seed: u64, stream: LayoutStream, loop_count: u32, attempt: u32) -> Pcg32 {
    let key = (u64::from(loop_count) << 32) | u64::from(attempt);
    let mixed = seed ^ key.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    Pcg32::new(mixed, stream as u64)
}

/// Cross-level session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Remaining retries; negative means the run is over
    pub lives: i32,
    pub score: u64,
    /// Difficulty scalar, starts at 1
    pub loop_count: u32,
    /// Best score seen this process (table top or current run)
    pub high_score: u64,
    #[serde(skip)]
    pub high_scores: HighScores,
    /// Base seed for layouts
    pub seed: u64,
    /// Runs started since launch; varies layouts between runs
    pub run: u32,
    /// Why the player last died (shown on screen)
    #[serde(skip)]
    pub last_death: Option<DeathCause>,
    initial_lives: i32,
}

impl SessionState {
    pub fn new(seed: u64, initial_lives: i32) -> Self {
        Self {
            lives: initial_lives,
            score: 0,
            loop_count: 1,
            high_score: 0,
            high_scores: HighScores::new(),
            seed,
            run: 0,
            last_death: None,
            initial_lives,
        }
    }

    /// Start a fresh run
    pub fn reset_game(&mut self) {
        self.lives = self.initial_lives;
        self.score = 0;
        self.loop_count = 1;
        self.last_death = None;
        self.run = self.run.wrapping_add(1);
        log::info!("New run #{} (lives={})", self.run, self.lives);
    }

    /// Lose one life. Returns false once no retries are left.
    pub fn lose_life(&mut self) -> bool {
        self.lives -= 1;
        log::info!("Life lost, {} remaining", self.lives.max(0));
        self.lives >= 0
    }

    /// Loop-completion reward
    pub fn add_life(&mut self) {
        self.lives += 1;
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
        self.high_score = self.high_score.max(self.score);
    }

    pub fn next_loop(&mut self) {
        self.loop_count = self.loop_count.saturating_add(1);
        log::info!("Loop {} begins", self.loop_count);
    }

    pub fn is_exhausted(&self) -> bool {
        self.lives < 0
    }

    /// Would the current score make the leaderboard?
    pub fn score_qualifies(&self) -> bool {
        self.high_scores.qualifies(self.score)
    }

    /// Insert the current score into the table; returns the rank achieved
    pub fn record_score(&mut self, initials: &str) -> Option<usize> {
        let rank = self
            .high_scores
            .add_score(self.score, Some(self.loop_count), initials);
        if let Some(rank) = rank {
            log::info!("Score {} placed #{}", self.score, rank);
        }
        rank
    }

    pub fn load_high_scores(&mut self, storage: &dyn Storage) {
        self.high_scores = HighScores::load(storage);
        self.high_score = self.high_score.max(self.high_scores.top_score().unwrap_or(0));
    }

    pub fn save_high_scores(&self, storage: &mut dyn Storage) {
        self.high_scores.save(storage);
    }

    /// Layout seed for the current run
    pub fn run_seed(&self) -> u64 {
        self.seed
            .wrapping_add(u64::from(self.run).wrapping_mul(0xD1B5_4A32_D192_ED03))
    }

    pub fn layout_rng(&self, stream: LayoutStream, attempt: u32) -> Pcg32 {
        layout_rng(self.run_seed(), stream, self.loop_count, attempt)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(0, INITIAL_LIVES)
    }
}
