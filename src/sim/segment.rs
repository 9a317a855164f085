//! Segment assembly
//!
//! `TrackGenerator` owns every piece of carry-over state between segments:
//! the continuity offset, the ambient light colour, the forward cursor and
//! the previous hazard (needed to run coins across the gap between two
//! hazards). It only produces data; it never touches the scene.

use rand::Rng;

use super::coins;
use super::error::TrackError;
use super::hazard::{hazard_kind, make_hazard};
use super::state::{ContinuityState, Hazard, Piece, PieceKind, Segment};
use crate::consts::*;
use crate::scene::Rgb;
use crate::tuning::{Tier, Tuning};

#[derive(Debug, Clone)]
pub struct TrackGenerator {
    tuning: Tuning,
    continuity: ContinuityState,
    light: Rgb,
    cursor_z: f32,
    last_hazard: Option<Hazard>,
    segments: u64,
}

impl TrackGenerator {
    /// Start a fresh session at z = 0 with a random starting light
    pub fn new<R: Rng>(tuning: Tuning, rng: &mut R) -> Result<Self, TrackError> {
        tuning.validate()?;
        let light = Rgb::new(
            rng.random_range(LIGHT_START_MIN..=LIGHT_MAX),
            rng.random_range(LIGHT_START_MIN..=LIGHT_MAX),
            rng.random_range(LIGHT_START_MIN..=LIGHT_MAX),
        );
        Ok(Self {
            tuning,
            continuity: ContinuityState::new(),
            light,
            cursor_z: 0.0,
            last_hazard: None,
            segments: 0,
        })
    }

    /// Validated difficulty tables
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Offset of the last hazard placed
    pub fn continuity(&self) -> &ContinuityState {
        &self.continuity
    }

    /// Forward position where the next piece will be placed
    pub fn cursor_z(&self) -> f32 {
        self.cursor_z
    }

    /// Light colour of the most recent segment
    pub fn light(&self) -> Rgb {
        self.light
    }

    /// Most recent hazard, the start of the next coin run
    pub fn last_hazard(&self) -> Option<&Hazard> {
        self.last_hazard.as_ref()
    }

    /// Segments produced this session
    pub fn segments_generated(&self) -> u64 {
        self.segments
    }

    /// Generate the next segment with a fresh generation seed
    pub fn generate<R: Rng>(&mut self, tier: Tier, rng: &mut R) -> Result<Segment, TrackError> {
        let seed: f32 = rng.random();
        self.generate_with_seed(tier, seed, rng)
    }

    /// Generate the next segment from an explicit seed in [0, 1)
    ///
    /// The seed picks the hazard kind, the light channel that drifts and the
    /// coin outcome. Nothing is committed unless the whole segment succeeds.
    pub fn generate_with_seed<R: Rng>(
        &mut self,
        tier: Tier,
        seed: f32,
        rng: &mut R,
    ) -> Result<Segment, TrackError> {
        let params = *self.tuning.row(tier);
        let session_start = self.continuity.is_session_start();
        let (safe_count, allowance) = if session_start {
            (self.tuning.start_safe_pieces, HALF_PIECE_SIZE)
        } else {
            (params.safe_pieces.sample(rng), params.allowance)
        };

        let light = self.drift_light(seed, rng);
        let base_z = self.cursor_z;
        let mut pieces: Vec<Piece> = (0..safe_count)
            .map(|i| Piece {
                z: base_z + i as f32 * PIECE_SIZE,
                light,
                kind: PieceKind::Safe,
            })
            .collect();

        let hazard_z = base_z + safe_count as f32 * PIECE_SIZE;
        let kind = hazard_kind(seed, self.tuning.wall_below);
        let hazard = make_hazard(kind, hazard_z, &self.continuity, allowance, &params, rng)?;

        // The opening segment has nothing to run coins from
        let coins = match &self.last_hazard {
            Some(previous) => coins::populate(previous, &hazard, seed, &params.coins, rng),
            None => Vec::new(),
        };

        if session_start {
            log::info!(
                "Session start: {} safe pieces, {:?} at offset {:.2}",
                safe_count,
                kind,
                hazard.offset
            );
        } else {
            log::debug!(
                "Segment z={:.1} {}: {} safe, {:?} at {:.2} (prev {:.2}), {} coins",
                base_z,
                tier,
                safe_count,
                kind,
                hazard.offset,
                self.continuity.anchor(),
                coins.len()
            );
        }

        self.continuity.record(hazard.offset);
        self.last_hazard = Some(hazard.clone());
        self.light = light;
        self.cursor_z = hazard_z + PIECE_SIZE;
        self.segments += 1;

        pieces.push(Piece {
            z: hazard_z,
            light,
            kind: PieceKind::Hazard(hazard),
        });

        Ok(Segment {
            base_z,
            seed,
            light,
            pieces,
            coins,
        })
    }

    /// Move the cursor and the stored hazard back along the forward axis
    pub(crate) fn shift(&mut self, distance: f32) {
        self.cursor_z -= distance;
        if let Some(hazard) = self.last_hazard.as_mut() {
            hazard.shift(distance);
        }
    }

    /// Perturb one channel of the previous light, chosen by seed thirds
    fn drift_light<R: Rng>(&self, seed: f32, rng: &mut R) -> Rgb {
        let mut color = self.light;
        let change = rng.random_range(LIGHT_DRIFT_MIN..=LIGHT_DRIFT_MAX);
        let channel = ((seed * 3.0) as usize).min(2);
        let current = color.channel(channel);
        let lo = (current - change).max(LIGHT_MIN);
        let hi = (current + change).min(LIGHT_MAX);
        *color.channel_mut(channel) = rng.random_range(lo..=hi);
        color
    }
}
