//! Observer odometer and run stats
//!
//! Distance travelled accumulates forward deltas from a stored reference
//! position. Re-basing moves both the position and the reference, so the
//! distance never jumps.

use serde::{Deserialize, Serialize};

/// Tagged volumes the collision system reports contact with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volume {
    Ground,
    /// Releases the vertical lock above a gap
    DropPlane,
    /// Under a gap, ends the run
    KillPlane,
    /// Obstacle block
    KillCube,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observer {
    z: f32,
    /// Forward position at the previous update
    prev_z: f32,
    /// Summed in f64 so long runs do not lose small steps
    distance: f64,
    coins: u32,
    game_over: bool,
    /// Vertical position is locked while over solid floor
    grounded: bool,
}

impl Observer {
    /// Observer standing at `z`, grounded, with nothing travelled
    pub fn new(z: f32) -> Self {
        Self {
            z,
            prev_z: z,
            grounded: true,
            ..Self::default()
        }
    }

    /// Current forward position
    pub fn z(&self) -> f32 {
        self.z
    }

    /// Position the next distance delta is measured from
    pub fn reference_z(&self) -> f32 {
        self.prev_z
    }

    /// Total forward distance travelled this run
    pub fn distance(&self) -> f32 {
        self.distance as f32
    }

    /// Coins collected this run
    pub fn coins(&self) -> u32 {
        self.coins
    }

    /// True once a kill volume has been touched
    pub fn game_over(&self) -> bool {
        self.game_over
    }

    /// True while standing on solid floor
    pub fn grounded(&self) -> bool {
        self.grounded
    }

    /// Record the observer's new forward position
    pub fn advance_to(&mut self, z: f32) {
        if self.game_over {
            return;
        }
        self.distance += f64::from(z - self.prev_z);
        self.prev_z = z;
        self.z = z;
    }

    /// React to a contact reported by the collision system
    pub fn touch(&mut self, volume: Volume) {
        match volume {
            Volume::Ground => self.grounded = true,
            Volume::DropPlane => self.grounded = false,
            Volume::KillPlane | Volume::KillCube => {
                if !self.game_over {
                    log::info!("Run over at distance {:.1}", self.distance);
                }
                self.game_over = true;
            }
        }
    }

    /// Count one collected coin
    pub(crate) fn credit_coin(&mut self) {
        self.coins += 1;
    }

    /// Move the position and its reference back together
    pub(crate) fn shift(&mut self, distance: f32) {
        self.z -= distance;
        self.prev_z -= distance;
    }
}
