//! Run leaderboard
//!
//! Persisted as JSON, keeps the top 10 runs ranked by distance.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of runs to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Distance travelled before the run ended
    pub distance: f32,
    pub coins: u32,
    /// 1-based tier reached
    pub tier: u8,
    /// Seed the track was generated from
    pub seed: Option<u64>,
}

impl RunRecord {
    /// Ranks ahead of `other`: farther first, then more coins
    fn beats(&self, other: &RunRecord) -> bool {
        self.distance > other.distance
            || (self.distance == other.distance && self.coins > other.coins)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<RunRecord>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a run would make the leaderboard
    pub fn qualifies(&self, run: &RunRecord) -> bool {
        if !(run.distance > 0.0) {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| run.beats(e))
    }

    /// Insert a run, returning its 1-based rank if it qualified
    pub fn add_run(&mut self, run: RunRecord) -> Option<usize> {
        if !self.qualifies(&run) {
            return None;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| run.beats(e))
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, run);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(pos + 1)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top run (if any)
    pub fn best(&self) -> Option<&RunRecord> {
        self.entries.first()
    }

    /// Load from disk; a missing file is an empty board
    pub fn load(path: &Path) -> Result<Self, HighScoresError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let scores: HighScores = serde_json::from_str(&json)?;
                log::info!("Loaded {} high scores", scores.entries.len());
                Ok(scores)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high scores found, starting fresh");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the leaderboard as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), HighScoresError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum HighScoresError {
    #[error("failed to access high scores: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse high scores: {0}")]
    Parse(#[from] serde_json::Error),
}
