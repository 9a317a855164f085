//! Session settings
//!
//! Window distances and the re-base bound. Loaded from a JSON file when one
//! is given, otherwise defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Track streaming settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keep at least this much track generated ahead of the observer
    pub look_ahead: f32,
    /// Reclaim pieces once they are this far behind the observer
    pub look_back: f32,
    /// Shift the world back by this much once the cursor reaches it
    pub rebase_threshold: f32,
    /// RNG seed; a random one is picked when absent
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            look_ahead: 100.0,
            look_back: 10.0,
            rebase_threshold: 50_000.0,
            seed: None,
        }
    }
}

impl Settings {
    /// Parse and validate settings; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from disk, falling back to defaults when the file is
    /// missing
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Check the window distances and the re-base bound
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("look_ahead", self.look_ahead),
            ("look_back", self.look_back),
            ("rebase_threshold", self.rebase_threshold),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(SettingsError::NonPositive { field, value });
            }
        }
        // Re-basing must never pull live track behind the observer's window
        if self.rebase_threshold <= self.look_ahead + self.look_back {
            return Err(SettingsError::RebaseTooShort {
                threshold: self.rebase_threshold,
                window: self.look_ahead + self.look_back,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{field} must be positive and finite (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("rebase threshold {threshold} must exceed the live window {window}")]
    RebaseTooShort { threshold: f32, window: f32 },
    #[error("failed to access settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
