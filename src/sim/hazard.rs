//! Hazard piece geometry
//!
//! A hazard is placed by intersecting two lateral windows:
//! - track bounds: the hazard must fit between the walls
//! - continuity: it may drift at most `allowance` from the previous hazard
//!
//! and drawing uniformly from what is left. The coin anchor is then picked
//! on whichever side of the hazard has more room.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::error::TrackError;
use super::state::{ContinuityState, Hazard, HazardKind, HazardShape, Plank};
use crate::consts::*;
use crate::tuning::TierParams;

/// Slack for float noise when re-checking continuity after a clamp
const CONTINUITY_EPSILON: f32 = 1e-4;

/// Closed lateral interval, never empty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lo: f32,
    pub hi: f32,
}

impl Interval {
    /// Build `[lo, hi]`, failing when it is empty or not finite
    pub fn new(what: &'static str, lo: f32, hi: f32) -> Result<Self, TrackError> {
        if lo <= hi && lo.is_finite() && hi.is_finite() {
            Ok(Self { lo, hi })
        } else {
            Err(TrackError::DegenerateInterval { what, lo, hi })
        }
    }

    /// Check if `x` lies inside, ends included
    pub fn contains(&self, x: f32) -> bool {
        x >= self.lo && x <= self.hi
    }

    /// Uniform draw across the interval
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        rng.random_range(self.lo..=self.hi)
    }
}

/// Pick the hazard kind from the segment's generation seed
pub fn hazard_kind(seed: f32, wall_below: f32) -> HazardKind {
    if seed < wall_below {
        HazardKind::Wall
    } else {
        HazardKind::Gap
    }
}

/// Offsets where a hazard of half-extent `half` fits the track and stays
/// within `allowance` of the previous hazard
pub fn placement_interval(
    half: f32,
    continuity: &ContinuityState,
    allowance: f32,
) -> Result<Interval, TrackError> {
    let anchor = continuity.anchor();
    Interval::new(
        "hazard offset",
        (-HALF_PIECE_SIZE + half).max(anchor - allowance),
        (HALF_PIECE_SIZE - half).min(anchor + allowance),
    )
}

/// Lateral band for coins beside a hazard centred at `offset`
///
/// Uses the left side when the hazard sits right of centre, otherwise the
/// right side.
pub fn coin_band(offset: f32, half: f32) -> Result<Interval, TrackError> {
    let clearance = half + COIN_CLEARANCE;
    let edge = HALF_PIECE_SIZE - COIN_EDGE_MARGIN;
    if offset > 0.0 {
        Interval::new("coin band", -edge, offset - clearance)
    } else {
        Interval::new("coin band", offset + clearance, edge)
    }
}

/// Build one hazard piece centred at `piece_z`
pub fn make_hazard<R: Rng>(
    kind: HazardKind,
    piece_z: f32,
    continuity: &ContinuityState,
    allowance: f32,
    params: &TierParams,
    rng: &mut R,
) -> Result<Hazard, TrackError> {
    let hazard = match kind {
        HazardKind::Wall => make_wall(piece_z, continuity, allowance, params, rng)?,
        HazardKind::Gap => make_gap(piece_z, continuity, allowance, params, rng)?,
    };
    check_continuity(hazard.offset, continuity, allowance)?;
    Ok(hazard)
}

fn make_wall<R: Rng>(
    piece_z: f32,
    continuity: &ContinuityState,
    allowance: f32,
    params: &TierParams,
    rng: &mut R,
) -> Result<Hazard, TrackError> {
    let scale = Vec3::new(
        params.wall.width.sample(rng),
        params.wall.height.sample(rng),
        params.wall.depth.sample(rng),
    );
    let half = scale.x / 2.0;
    let offset = placement_interval(half, continuity, allowance)?.sample(rng);

    // Rests on the floor, anywhere along the piece
    let block = Vec3::new(
        offset,
        FLOOR_TOP + scale.y / 2.0,
        rng.random_range(-HALF_PIECE_SIZE..=HALF_PIECE_SIZE),
    );

    Ok(Hazard {
        z: piece_z,
        offset,
        coin_point: coin_point(offset, half, piece_z, rng)?,
        shape: HazardShape::Wall { scale, block },
    })
}

fn make_gap<R: Rng>(
    piece_z: f32,
    continuity: &ContinuityState,
    allowance: f32,
    params: &TierParams,
    rng: &mut R,
) -> Result<Hazard, TrackError> {
    let width = params.gap_width.sample(rng);
    let half = width / 2.0;
    let anchor = continuity.anchor();
    let candidate = Interval::new(
        "gap centre",
        (-HALF_PIECE_SIZE).max(anchor - allowance),
        HALF_PIECE_SIZE.min(anchor + allowance),
    )?
    .sample(rng);

    let (offset, planks) = if candidate - half <= -HALF_PIECE_SIZE {
        // Flush against the left wall, one plank fills the right
        let plank = PIECE_SIZE - width;
        (
            -HALF_PIECE_SIZE + half,
            vec![Plank {
                center: HALF_PIECE_SIZE - plank / 2.0,
                width: plank,
            }],
        )
    } else if candidate + half >= HALF_PIECE_SIZE {
        let plank = PIECE_SIZE - width;
        (
            HALF_PIECE_SIZE - half,
            vec![Plank {
                center: -HALF_PIECE_SIZE + plank / 2.0,
                width: plank,
            }],
        )
    } else {
        let left = (candidate - half) + HALF_PIECE_SIZE;
        let right = HALF_PIECE_SIZE - (candidate + half);
        (
            candidate,
            vec![
                Plank {
                    center: -HALF_PIECE_SIZE + left / 2.0,
                    width: left,
                },
                Plank {
                    center: HALF_PIECE_SIZE - right / 2.0,
                    width: right,
                },
            ],
        )
    };

    Ok(Hazard {
        z: piece_z,
        offset,
        coin_point: coin_point(offset, half, piece_z, rng)?,
        shape: HazardShape::Gap { width, planks },
    })
}

fn coin_point<R: Rng>(
    offset: f32,
    half: f32,
    piece_z: f32,
    rng: &mut R,
) -> Result<Vec2, TrackError> {
    let x = coin_band(offset, half)?.sample(rng);
    let z = rng.random_range(piece_z - HALF_PIECE_SIZE..=piece_z + HALF_PIECE_SIZE);
    Ok(Vec2::new(x, z))
}

fn check_continuity(
    offset: f32,
    continuity: &ContinuityState,
    allowance: f32,
) -> Result<(), TrackError> {
    let previous = continuity.anchor();
    if (offset - previous).abs() > allowance + CONTINUITY_EPSILON {
        return Err(TrackError::ContinuityViolation {
            offset,
            previous,
            allowance,
        });
    }
    Ok(())
}
