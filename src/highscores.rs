//! High score leaderboard system
//!
//! Persisted through a `Storage` backend, tracks the top 5 scores.

use serde::{Deserialize, Deserializer, Serialize};

use crate::persistence::{read_json, write_json, Storage};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 5;

/// Initials recorded when the player doesn't enter any
pub const DEFAULT_INITIALS: &str = "---";

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's score
    pub score: u64,
    /// Loop reached (unknown for entries migrated from the legacy key)
    #[serde(rename = "loop", default, deserialize_with = "loop_or_unknown")]
    pub loop_reached: Option<u32>,
    /// Three-letter tag
    #[serde(default = "default_initials")]
    pub initials: String,
}

fn default_initials() -> String {
    DEFAULT_INITIALS.to_string()
}

/// Older tables wrote placeholders such as `"?"` for the loop; those read as
/// unknown instead of failing the whole table.
fn loop_or_unknown<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) | None => None,
    })
}

/// High score leaderboard (stored as a bare JSON array of entries)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Storage key for the table
    pub const STORAGE_KEY: &'static str = "shaiHulud_highScores";
    /// Older builds stored a single best score under this key
    pub const LEGACY_KEY: &'static str = "shaiHulud_highScore";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    ///
    /// Equal scores keep insertion order: the newcomer lands after them.
    /// Returns the rank achieved (1-indexed) or None if didn't qualify.
    pub fn add_score(
        &mut self,
        score: u64,
        loop_reached: Option<u32>,
        initials: &str,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            loop_reached,
            initials: if initials.is_empty() {
                default_initials()
            } else {
                initials.to_string()
            },
        };

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Restore the ordering/size invariants on data read from storage
    fn normalize(&mut self) {
        // Stable sort: ties keep their stored order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
    }

    /// Load high scores; any storage failure yields an empty table
    pub fn load(storage: &dyn Storage) -> Self {
        let mut scores = match read_json::<HighScores>(storage, Self::STORAGE_KEY) {
            Ok(Some(scores)) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("High scores unreadable ({e}), starting fresh");
                Self::new()
            }
        };

        scores.migrate_legacy(storage);
        scores.normalize();
        scores
    }

    /// Fold the old single best score into the table
    fn migrate_legacy(&mut self, storage: &dyn Storage) {
        let Ok(Some(raw)) = storage.get(Self::LEGACY_KEY) else {
            return;
        };
        let value = raw.trim().parse::<u64>().unwrap_or(0);
        if value > 0 && !self.entries.iter().any(|e| e.score == value) {
            log::info!("Migrating legacy high score {}", value);
            self.entries.push(HighScoreEntry {
                score: value,
                loop_reached: None,
                initials: default_initials(),
            });
        }
    }

    /// Save high scores; failures are logged and swallowed
    pub fn save(&self, storage: &mut dyn Storage) {
        if let Err(e) = write_json(storage, Self::STORAGE_KEY, self) {
            log::warn!("Failed to save high scores: {e}");
            return;
        }
        let best = self.top_score().unwrap_or(0).to_string();
        if let Err(e) = storage.set(Self::LEGACY_KEY, &best) {
            log::warn!("Failed to save legacy high score: {e}");
            return;
        }
        log::info!("High scores saved ({} entries)", self.entries.len());
    }
}
