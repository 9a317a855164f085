//! Endless Track - procedural track streaming for a forward-scrolling runner
//!
//! Core modules:
//! - `sim`: Track generation, hazard geometry, coin placement and the tick loop
//! - `scene`: Host instantiation interface plus an in-memory scene graph
//! - `tuning`: Data-driven per-tier difficulty tables
//! - `settings`: Window distances and session configuration
//! - `audio`: Background music shuffle
//! - `highscores`: Finished-run leaderboard

pub mod audio;
pub mod highscores;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::{HighScores, HighScoresError, RunRecord};
pub use settings::{Settings, SettingsError};
pub use tuning::{Tier, Tuning, TuningError};

/// Track geometry constants
pub mod consts {
    /// Side length of a square track piece (x and z)
    pub const PIECE_SIZE: f32 = 4.0;
    /// Half the track width, used everywhere for lateral bounds
    pub const HALF_PIECE_SIZE: f32 = PIECE_SIZE / 2.0;

    /// Height of the floor's top surface
    pub const FLOOR_TOP: f32 = 0.5;
    /// All coins float at this height
    pub const COIN_HEIGHT: f32 = 0.8;
    /// Coin band keeps this far away from the track walls
    pub const COIN_EDGE_MARGIN: f32 = 0.3;
    /// Coin band keeps this far away from a hazard's edge
    pub const COIN_CLEARANCE: f32 = 0.05;
    /// Roll applied per coin index along a coin line (degrees)
    pub const COIN_ROLL_STEP_DEGREES: f32 = 20.0;

    /// Drop volume lets the observer fall through a gap
    pub const DROP_VOLUME_HEIGHT: f32 = 2.0;
    pub const DROP_VOLUME_Y: f32 = 1.5;
    /// Respawn volume sits just under the floor line of a gap
    pub const RESPAWN_VOLUME_HEIGHT: f32 = 0.01;
    pub const RESPAWN_VOLUME_Y: f32 = 0.45;

    /// Ambient light channels never drift below this
    pub const LIGHT_MIN: f32 = 0.3;
    pub const LIGHT_MAX: f32 = 1.0;
    /// Initial light channels are drawn from [LIGHT_START_MIN, LIGHT_MAX]
    pub const LIGHT_START_MIN: f32 = 0.5;
    /// Per-segment light drift bounds
    pub const LIGHT_DRIFT_MIN: f32 = 0.1;
    pub const LIGHT_DRIFT_MAX: f32 = 0.15;
}

