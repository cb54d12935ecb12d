//! Ordered-sequence hook challenge
//!
//! A fixed list of symbols must be pressed in order before a deadline. Any
//! wrong symbol from the pool fails at once. Presses are evaluated before the
//! clock advances, so a correct final press in the same frame as an
//! oversized `dt` still counts, and the deadline cannot be skipped.

use rand::Rng;

use crate::platform::{InputSnapshot, Key};

/// Symbols the challenge draws from
pub const SYMBOL_POOL: [Key; 4] = Key::ARROWS;

/// Current challenge state after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QteStatus {
    InProgress,
    Complete,
    WrongSymbol,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QteChallenge {
    sequence: Vec<Key>,
    cursor: usize,
    time_limit: f32,
    elapsed: f32,
    status: QteStatus,
}

impl QteChallenge {
    pub fn new(sequence: Vec<Key>, time_limit: f32) -> Self {
        let status = if sequence.is_empty() {
            QteStatus::Complete
        } else {
            QteStatus::InProgress
        };
        Self {
            sequence,
            cursor: 0,
            time_limit,
            elapsed: 0.0,
            status,
        }
    }

    /// Random sequence of `len` pool symbols with no symbol repeated back to back
    pub fn random<R: Rng>(rng: &mut R, len: u32, time_limit: f32) -> Self {
        let mut sequence: Vec<Key> = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let key = loop {
                let candidate = SYMBOL_POOL[rng.random_range(0..SYMBOL_POOL.len())];
                if sequence.last() != Some(&candidate) {
                    break candidate;
                }
            };
            sequence.push(key);
        }
        Self::new(sequence, time_limit)
    }

    /// Consume this frame's presses, then advance the clock
    pub fn update(&mut self, input: &InputSnapshot, dt: f32) -> QteStatus {
        if self.status != QteStatus::InProgress {
            return self.status;
        }

        for &key in input.presses() {
            if !SYMBOL_POOL.contains(&key) {
                continue;
            }
            if self.sequence.get(self.cursor) == Some(&key) {
                self.cursor += 1;
                if self.cursor == self.sequence.len() {
                    self.status = QteStatus::Complete;
                    return self.status;
                }
            } else {
                self.status = QteStatus::WrongSymbol;
                return self.status;
            }
        }

        self.elapsed += dt;
        if self.elapsed >= self.time_limit {
            self.status = QteStatus::TimedOut;
        }
        self.status
    }

    pub fn sequence(&self) -> &[Key] {
        &self.sequence
    }

    /// Symbols matched so far
    pub fn progress(&self) -> usize {
        self.cursor
    }

    pub fn time_left(&self) -> f32 {
        (self.time_limit - self.elapsed).max(0.0)
    }

    /// Fraction of the budget still remaining, 0..=1
    pub fn time_fraction(&self) -> f32 {
        if self.time_limit <= 0.0 {
            0.0
        } else {
            self.time_left() / self.time_limit
        }
    }
}
