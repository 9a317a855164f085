//! Track generation
//!
//! Everything that decides what the track looks like lives here. Randomness
//! only comes from the RNG handed in by the caller, so a fixed seed replays
//! the same track.

pub mod coins;
pub mod error;
pub mod hazard;
pub mod observer;
pub mod segment;
pub mod state;
pub mod tick;

pub use coins::CoinOutcome;
pub use error::TrackError;
pub use hazard::{Interval, coin_band, hazard_kind, make_hazard, placement_interval};
pub use observer::{Observer, Volume};
pub use segment::TrackGenerator;
pub use state::{
    ContinuityState, Hazard, HazardKind, HazardShape, Piece, PieceKind, PiecePart, Plank,
    RewardMarker, Segment,
};
pub use tick::{TickReport, TrackManager};
