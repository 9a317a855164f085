//! Coin placement between consecutive hazards

use glam::Vec3;
use rand::Rng;

use super::state::{Hazard, RewardMarker};
use crate::consts::*;
use crate::tuning::CoinOdds;

/// What a generation seed buys in coins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinOutcome {
    None,
    Single,
    Line,
}

impl CoinOutcome {
    /// Outcome for a generation seed in [0, 1)
    pub fn from_seed(seed: f32, odds: &CoinOdds) -> Self {
        if seed < odds.none_below {
            CoinOutcome::None
        } else if seed < odds.single_below {
            CoinOutcome::Single
        } else {
            CoinOutcome::Line
        }
    }
}

/// Markers for the stretch between `previous` and `current`
///
/// A single coin sits on the previous hazard's anchor; a line runs from the
/// previous anchor toward the current one, stopping one step short.
pub fn populate<R: Rng>(
    previous: &Hazard,
    current: &Hazard,
    seed: f32,
    odds: &CoinOdds,
    rng: &mut R,
) -> Vec<RewardMarker> {
    let from = previous.coin_point;
    match CoinOutcome::from_seed(seed, odds) {
        CoinOutcome::None => Vec::new(),
        CoinOutcome::Single => vec![RewardMarker {
            position: Vec3::new(from.x, COIN_HEIGHT, from.y),
            roll_degrees: 0.0,
        }],
        CoinOutcome::Line => {
            let count = odds.line_len.sample(rng);
            let to = current.coin_point;
            (0..count)
                .map(|i| {
                    let p = from.lerp(to, i as f32 / count as f32);
                    RewardMarker {
                        position: Vec3::new(p.x, COIN_HEIGHT, p.y),
                        roll_degrees: i as f32 * COIN_ROLL_STEP_DEGREES,
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::HazardShape;
    use crate::tuning::{Tier, Tuning};
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn hazard_at(x: f32, z: f32) -> Hazard {
        Hazard {
            z,
            offset: -x,
            coin_point: Vec2::new(x, z),
            shape: HazardShape::Wall {
                scale: Vec3::ONE,
                block: Vec3::ZERO,
            },
        }
    }

    fn odds(tier: u8) -> CoinOdds {
        Tuning::default().row(Tier::new(tier).unwrap()).coins
    }

    #[test]
    fn test_tier0_outcomes() {
        let o = odds(0);
        assert_eq!(CoinOutcome::from_seed(0.29, &o), CoinOutcome::None);
        assert_eq!(CoinOutcome::from_seed(0.3, &o), CoinOutcome::Single);
        assert_eq!(CoinOutcome::from_seed(0.79, &o), CoinOutcome::Single);
        assert_eq!(CoinOutcome::from_seed(0.8, &o), CoinOutcome::Line);
    }

    #[test]
    fn test_tier3_never_empty() {
        let o = odds(3);
        assert_eq!(CoinOutcome::from_seed(0.0, &o), CoinOutcome::Single);
        assert_eq!(CoinOutcome::from_seed(0.3, &o), CoinOutcome::Single);
        assert_eq!(CoinOutcome::from_seed(0.4, &o), CoinOutcome::Line);
    }

    #[test]
    fn test_single_coin_on_previous_anchor() {
        let mut rng = Pcg32::seed_from_u64(1);
        let coins = populate(
            &hazard_at(1.0, 10.0),
            &hazard_at(-1.0, 30.0),
            0.5,
            &odds(0),
            &mut rng,
        );
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].position, Vec3::new(1.0, COIN_HEIGHT, 10.0));
    }

    #[test]
    fn test_line_interpolates_and_rolls() {
        let mut rng = Pcg32::seed_from_u64(2);
        let a = hazard_at(1.0, 10.0);
        let b = hazard_at(-1.0, 30.0);
        let coins = populate(&a, &b, 0.95, &odds(3), &mut rng);

        let n = coins.len();
        assert!((5..8).contains(&n));
        assert_eq!(coins[0].position, Vec3::new(1.0, COIN_HEIGHT, 10.0));
        for (i, coin) in coins.iter().enumerate() {
            let t = i as f32 / n as f32;
            assert!((coin.position.z - (10.0 + 20.0 * t)).abs() < 1e-4);
            assert!((coin.position.x - (1.0 - 2.0 * t)).abs() < 1e-4);
            assert_eq!(coin.roll_degrees, i as f32 * 20.0);
        }
        // Last coin stops one step short of the current anchor
        assert!(coins[n - 1].position.z < 30.0);
    }

    #[test]
    fn test_no_coins_below_threshold() {
        let mut rng = Pcg32::seed_from_u64(3);
        let coins = populate(
            &hazard_at(1.0, 10.0),
            &hazard_at(1.0, 20.0),
            0.1,
            &odds(0),
            &mut rng,
        );
        assert!(coins.is_empty());
    }
}
