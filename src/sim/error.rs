//! Generation faults
//!
//! None of these are recoverable: they mean the tables or the window
//! bookkeeping broke an invariant and continuing would place hazards the
//! observer cannot pass.

use thiserror::Error;

use crate::settings::SettingsError;
use crate::tuning::TuningError;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("{what} interval is empty: [{lo:.3}, {hi:.3}]")]
    DegenerateInterval { what: &'static str, lo: f32, hi: f32 },
    #[error(
        "hazard offset {offset:.3} drifted more than {allowance:.3} from previous {previous:.3}"
    )]
    ContinuityViolation {
        offset: f32,
        previous: f32,
        allowance: f32,
    },
    #[error("window out of order: entry at z {z:.3} queued after z {last:.3}")]
    WindowOrder { z: f32, last: f32 },
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
