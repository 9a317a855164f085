//! Data-driven difficulty tables
//!
//! Every per-tier knob lives in one plain data row. The geometry and
//! probability routines in `sim` only ever read the row selected by the
//! current [`Tier`], so balancing never touches code.

use std::fmt;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Number of difficulty tiers
pub const TIER_COUNT: usize = 4;

/// Widest hazard that still leaves a coin band on its roomier side
pub const MAX_HAZARD_EXTENT: f32 = PIECE_SIZE - 2.0 * (COIN_EDGE_MARGIN + COIN_CLEARANCE);

/// Difficulty tier, always in `[0, TIER_COUNT)`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const FIRST: Tier = Tier(0);
    pub const LAST: Tier = Tier(TIER_COUNT as u8 - 1);

    /// Build a tier, rejecting indices with no table row
    pub fn new(index: u8) -> Result<Self, TuningError> {
        if (index as usize) < TIER_COUNT {
            Ok(Self(index))
        } else {
            Err(TuningError::TierOutOfRange { tier: index })
        }
    }

    /// Row index into the per-tier tables
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 1-based tier number for display
    #[inline]
    pub fn formatted(self) -> u8 {
        self.0 + 1
    }

    /// Following tier, None from the last one
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1).ok()
    }

    /// No threshold promotes past this tier
    pub fn is_terminal(self) -> bool {
        self == Self::LAST
    }
}

impl TryFrom<u8> for Tier {
    type Error = TuningError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.formatted())
    }
}

/// Closed float range `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanRange {
    pub min: f32,
    pub max: f32,
}

impl SpanRange {
    /// Closed range from `min` to `max`
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform draw; callers only hold validated ranges
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        rng.random_range(self.min..=self.max)
    }
}

/// Half-open integer range `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    /// Half-open range from `min` up to `max`
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Uniform draw below `max`
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u32 {
        rng.random_range(self.min..self.max)
    }
}

/// Obstacle block scale ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallScale {
    /// Lateral (x) extent
    pub width: SpanRange,
    pub height: SpanRange,
    pub depth: SpanRange,
}

/// Coin outcome thresholds over the generation seed
///
/// `seed < none_below` places nothing, `seed < single_below` places one
/// coin, anything above places a line of `line_len` coins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoinOdds {
    pub none_below: f32,
    pub single_below: f32,
    pub line_len: CountRange,
}

/// One row of the difficulty tables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierParams {
    /// Safe pieces preceding each hazard
    pub safe_pieces: CountRange,
    /// Maximum lateral drift between consecutive hazards
    pub allowance: f32,
    pub wall: WallScale,
    pub gap_width: SpanRange,
    pub coins: CoinOdds,
}

/// Complete difficulty configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Distance travelled at which tier `i` advances to `i + 1`
    pub tier_thresholds: [f32; TIER_COUNT - 1],
    /// Safe run length of the very first segment
    pub start_safe_pieces: u32,
    /// Generation seeds below this produce a wall, the rest a gap
    pub wall_below: f32,
    pub tiers: [TierParams; TIER_COUNT],
}

impl Default for Tuning {
    fn default() -> Self {
        let depth = SpanRange::new(0.5, 3.0);
        Self {
            tier_thresholds: [600.0, 1400.0, 2300.0],
            start_safe_pieces: 5,
            wall_below: 0.5,
            tiers: [
                TierParams {
                    safe_pieces: CountRange::new(2, 6),
                    allowance: PIECE_SIZE * 0.4,
                    wall: WallScale {
                        width: SpanRange::new(0.5, 1.5),
                        height: SpanRange::new(0.2, 0.8),
                        depth,
                    },
                    gap_width: SpanRange::new(1.0, 2.0),
                    coins: CoinOdds {
                        none_below: 0.3,
                        single_below: 0.8,
                        line_len: CountRange::new(3, 8),
                    },
                },
                TierParams {
                    safe_pieces: CountRange::new(2, 5),
                    allowance: PIECE_SIZE * 0.6,
                    wall: WallScale {
                        width: SpanRange::new(0.5, 2.0),
                        height: SpanRange::new(0.2, 1.0),
                        depth,
                    },
                    gap_width: SpanRange::new(1.0, 2.5),
                    coins: CoinOdds {
                        none_below: 0.25,
                        single_below: 0.7,
                        line_len: CountRange::new(4, 8),
                    },
                },
                TierParams {
                    safe_pieces: CountRange::new(2, 4),
                    allowance: PIECE_SIZE * 0.8,
                    wall: WallScale {
                        width: SpanRange::new(0.5, 2.5),
                        height: SpanRange::new(0.2, 1.1),
                        depth,
                    },
                    gap_width: SpanRange::new(1.0, 2.8),
                    coins: CoinOdds {
                        none_below: 0.2,
                        single_below: 0.6,
                        line_len: CountRange::new(5, 8),
                    },
                },
                TierParams {
                    safe_pieces: CountRange::new(2, 3),
                    allowance: PIECE_SIZE,
                    wall: WallScale {
                        width: SpanRange::new(0.5, 3.0),
                        height: SpanRange::new(0.2, 1.2),
                        depth,
                    },
                    gap_width: SpanRange::new(1.0, 3.0),
                    coins: CoinOdds {
                        none_below: 0.0,
                        single_below: 0.4,
                        line_len: CountRange::new(5, 8),
                    },
                },
            ],
        }
    }
}

impl Tuning {
    /// Active row for a tier
    #[inline]
    pub fn row(&self, tier: Tier) -> &TierParams {
        &self.tiers[tier.index()]
    }

    /// Distance that promotes `tier` to the next one (None when terminal)
    pub fn threshold(&self, tier: Tier) -> Option<f32> {
        self.tier_thresholds.get(tier.index()).copied()
    }

    /// Parse and validate a JSON table
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a JSON table from disk, falling back to defaults
    /// when the file is missing
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let tuning = Self::from_json(&json)?;
                log::info!("Loaded tuning from {}", path.display());
                Ok(tuning)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No tuning at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check every table invariant the generator relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        let mut previous = 0.0;
        for (index, &value) in self.tier_thresholds.iter().enumerate() {
            if !(value > previous) {
                return Err(TuningError::ThresholdsNotIncreasing { index, value });
            }
            previous = value;
        }

        if !(0.0..=1.0).contains(&self.wall_below) {
            return Err(TuningError::Probability {
                field: "wall_below",
                value: self.wall_below,
            });
        }

        for (tier, row) in self.tiers.iter().enumerate() {
            row.validate(tier)?;
        }
        Ok(())
    }
}

impl TierParams {
    fn validate(&self, tier: usize) -> Result<(), TuningError> {
        check_count("safe_pieces", tier, self.safe_pieces)?;

        if !(self.allowance > 0.0) {
            return Err(TuningError::NonPositive {
                field: "allowance",
                tier,
                value: self.allowance,
            });
        }

        check_span("wall.width", tier, self.wall.width)?;
        check_span("wall.height", tier, self.wall.height)?;
        check_span("wall.depth", tier, self.wall.depth)?;
        check_span("gap_width", tier, self.gap_width)?;
        check_extent("wall.width", tier, self.wall.width)?;
        check_extent("gap_width", tier, self.gap_width)?;

        let coins = &self.coins;
        if !(0.0 <= coins.none_below
            && coins.none_below <= coins.single_below
            && coins.single_below <= 1.0)
        {
            return Err(TuningError::CoinOdds {
                tier,
                none_below: coins.none_below,
                single_below: coins.single_below,
            });
        }
        check_count("coins.line_len", tier, coins.line_len)?;
        if coins.line_len.min == 0 {
            return Err(TuningError::NonPositive {
                field: "coins.line_len.min",
                tier,
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn check_count(field: &'static str, tier: usize, range: CountRange) -> Result<(), TuningError> {
    if range.min >= range.max {
        return Err(TuningError::EmptyCount {
            field,
            tier,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}

fn check_span(field: &'static str, tier: usize, range: SpanRange) -> Result<(), TuningError> {
    if !(range.min > 0.0) {
        return Err(TuningError::NonPositive {
            field,
            tier,
            value: range.min,
        });
    }
    if !(range.min <= range.max) || !range.max.is_finite() {
        return Err(TuningError::EmptySpan {
            field,
            tier,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}

fn check_extent(field: &'static str, tier: usize, range: SpanRange) -> Result<(), TuningError> {
    if range.max > MAX_HAZARD_EXTENT {
        return Err(TuningError::HazardTooWide {
            field,
            tier,
            value: range.max,
            limit: MAX_HAZARD_EXTENT,
        });
    }
    Ok(())
}

/// Errors raised when difficulty tables violate generator invariants
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tier {tier} has no table row")]
    TierOutOfRange { tier: u8 },
    #[error("tier threshold {index} must exceed the previous one (got {value:.2})")]
    ThresholdsNotIncreasing { index: usize, value: f32 },
    #[error("{field} must be a probability in [0, 1] (got {value:.2})")]
    Probability { field: &'static str, value: f32 },
    #[error("tier {tier}: {field} must be positive (got {value:.2})")]
    NonPositive {
        field: &'static str,
        tier: usize,
        value: f32,
    },
    #[error("tier {tier}: {field} range [{min:.2}, {max:.2}] is empty")]
    EmptySpan {
        field: &'static str,
        tier: usize,
        min: f32,
        max: f32,
    },
    #[error("tier {tier}: {field} range [{min}, {max}) is empty")]
    EmptyCount {
        field: &'static str,
        tier: usize,
        min: u32,
        max: u32,
    },
    #[error("tier {tier}: {field} up to {value:.2} leaves no coin band (limit {limit:.2})")]
    HazardTooWide {
        field: &'static str,
        tier: usize,
        value: f32,
        limit: f32,
    },
    #[error(
        "tier {tier}: coin thresholds invalid (none below {none_below:.2}, single below {single_below:.2})"
    )]
    CoinOdds {
        tier: usize,
        none_below: f32,
        single_below: f32,
    },
    #[error("failed to read tuning: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        Tuning::default().validate().expect("default tables validate");
    }

    #[test]
    fn test_tier_bounds() {
        assert!(Tier::new(3).is_ok());
        assert!(matches!(
            Tier::new(4),
            Err(TuningError::TierOutOfRange { tier: 4 })
        ));
        assert_eq!(Tier::LAST.next(), None);
        assert!(Tier::LAST.is_terminal());
        assert!(!Tier::FIRST.is_terminal());
        assert_eq!(Tier::FIRST.next(), Some(Tier::new(1).unwrap()));
        assert_eq!(Tier::FIRST.formatted(), 1);
        assert_eq!(Tier::LAST.formatted(), 4);
    }

    #[test]
    fn test_thresholds() {
        let tuning = Tuning::default();
        assert_eq!(tuning.threshold(Tier::FIRST), Some(600.0));
        assert_eq!(tuning.threshold(Tier::new(2).unwrap()), Some(2300.0));
        assert_eq!(tuning.threshold(Tier::LAST), None);
    }

    #[test]
    fn test_json_roundtrip_keeps_tables() {
        let tuning = Tuning::default();
        let json = serde_json::to_string(&tuning).unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let mut tuning = Tuning::default();
        tuning.tier_thresholds = [600.0, 500.0, 2300.0];
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::ThresholdsNotIncreasing { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_zero_allowance() {
        let mut tuning = Tuning::default();
        tuning.tiers[2].allowance = 0.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::NonPositive {
                field: "allowance",
                tier: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_hazard_without_coin_band() {
        let mut tuning = Tuning::default();
        tuning.tiers[3].gap_width = SpanRange::new(1.0, 3.9);
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::HazardTooWide { tier: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_coin_odds() {
        let mut tuning = Tuning::default();
        tuning.tiers[0].coins.none_below = 0.9;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::CoinOdds { tier: 0, .. })
        ));
    }

    #[test]
    fn test_tier_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Tier>("2").is_ok());
        assert!(serde_json::from_str::<Tier>("7").is_err());
    }
}
