//! Track data model
//!
//! Plain values produced by the generator. Nothing here talks to the scene
//! host; the track manager turns these into spawned instances.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::scene::{Rgb, Template, Transform};

/// Lateral offset of the most recently placed hazard
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContinuityState {
    prev_offset: Option<f32>,
}

impl ContinuityState {
    /// State before the first hazard of a session
    pub fn new() -> Self {
        Self::default()
    }

    /// No hazard has been placed yet this session
    pub fn is_session_start(&self) -> bool {
        self.prev_offset.is_none()
    }

    /// Last recorded offset, if any
    pub fn previous(&self) -> Option<f32> {
        self.prev_offset
    }

    /// Offset the next hazard is measured against (centre before any hazard)
    pub fn anchor(&self) -> f32 {
        self.prev_offset.unwrap_or(0.0)
    }

    /// Remember the offset of a newly placed hazard
    pub fn record(&mut self, offset: f32) {
        self.prev_offset = Some(offset);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    Wall,
    Gap,
}

/// Floor slab beside a gap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plank {
    /// Lateral centre
    pub center: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HazardShape {
    /// Obstacle block resting on a full floor
    Wall {
        scale: Vec3,
        /// Block centre in piece-local space
        block: Vec3,
    },
    /// Missing floor span flanked by one or two planks
    Gap { width: f32, planks: Vec<Plank> },
}

/// The single dangerous piece closing a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Piece centre along the forward axis
    pub z: f32,
    /// Lateral centre of the obstacle or gap
    pub offset: f32,
    /// Where coins may go near this hazard: x is lateral, y is forward z
    pub coin_point: Vec2,
    pub shape: HazardShape,
}

impl Hazard {
    /// Wall or gap
    pub fn kind(&self) -> HazardKind {
        match self.shape {
            HazardShape::Wall { .. } => HazardKind::Wall,
            HazardShape::Gap { .. } => HazardKind::Gap,
        }
    }

    /// Half of the hazard's lateral extent
    pub fn half_extent(&self) -> f32 {
        match &self.shape {
            HazardShape::Wall { scale, .. } => scale.x / 2.0,
            HazardShape::Gap { width, .. } => width / 2.0,
        }
    }

    /// Walkable floor width across the piece
    pub fn floor_coverage(&self) -> f32 {
        match &self.shape {
            HazardShape::Wall { .. } => PIECE_SIZE,
            HazardShape::Gap { planks, .. } => planks.iter().map(|p| p.width).sum(),
        }
    }

    /// Move the hazard and its coin anchor back along the forward axis
    pub(crate) fn shift(&mut self, distance: f32) {
        self.z -= distance;
        self.coin_point.y -= distance;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PieceKind {
    Safe,
    Hazard(Hazard),
}

/// One square cell of track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    /// Centre along the forward axis
    pub z: f32,
    pub light: Rgb,
    pub kind: PieceKind,
}

/// Child instance of a piece in piece-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiecePart {
    pub template: Template,
    pub transform: Transform,
}

impl PiecePart {
    fn new(template: Template, translation: Vec3, scale: Vec3) -> Self {
        Self {
            template,
            transform: Transform::from_translation(translation).with_scale(scale),
        }
    }
}

impl Piece {
    /// Hazard carried by this piece, None for a safe piece
    pub fn hazard(&self) -> Option<&Hazard> {
        match &self.kind {
            PieceKind::Hazard(h) => Some(h),
            PieceKind::Safe => None,
        }
    }

    /// Templates to instantiate under this piece. Walls always come first
    pub fn parts(&self) -> Vec<PiecePart> {
        let mut parts = vec![PiecePart {
            template: Template::Walls,
            transform: Transform::IDENTITY,
        }];

        let hazard = match &self.kind {
            PieceKind::Safe => {
                parts.push(full_ground());
                return parts;
            }
            PieceKind::Hazard(h) => h,
        };

        match &hazard.shape {
            HazardShape::Wall { scale, block } => {
                parts.push(full_ground());
                parts.push(PiecePart::new(Template::KillCube, *block, *scale));
            }
            HazardShape::Gap { width, planks } => {
                for plank in planks {
                    parts.push(PiecePart::new(
                        Template::Ground,
                        Vec3::new(plank.center, 0.0, 0.0),
                        Vec3::new(plank.width, 1.0, PIECE_SIZE),
                    ));
                }
                parts.push(PiecePart::new(
                    Template::DropPlane,
                    Vec3::new(hazard.offset, DROP_VOLUME_Y, 0.0),
                    Vec3::new(*width, DROP_VOLUME_HEIGHT, PIECE_SIZE),
                ));
                parts.push(PiecePart::new(
                    Template::KillPlane,
                    Vec3::new(hazard.offset, RESPAWN_VOLUME_Y, 0.0),
                    Vec3::new(*width, RESPAWN_VOLUME_HEIGHT, PIECE_SIZE),
                ));
            }
        }
        parts
    }
}

fn full_ground() -> PiecePart {
    PiecePart::new(
        Template::Ground,
        Vec3::ZERO,
        Vec3::new(PIECE_SIZE, 1.0, PIECE_SIZE),
    )
}

/// A collectible coin position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardMarker {
    /// World position
    pub position: Vec3,
    /// Cosmetic roll about the forward axis
    pub roll_degrees: f32,
}

impl RewardMarker {
    /// Roll as a rotation about the forward axis
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_z(self.roll_degrees.to_radians())
    }
}

/// Safe run plus one closing hazard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Forward position of the first piece
    pub base_z: f32,
    /// Generation seed shared by hazard kind, light drift and coin outcome
    pub seed: f32,
    pub light: Rgb,
    pub pieces: Vec<Piece>,
    pub coins: Vec<RewardMarker>,
}

impl Segment {
    /// The closing hazard
    pub fn hazard(&self) -> Option<&Hazard> {
        self.pieces.last().and_then(Piece::hazard)
    }

    /// Number of safe pieces before the hazard
    pub fn safe_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| matches!(p.kind, PieceKind::Safe))
            .count()
    }

    /// Forward position one past the last piece
    pub fn end_z(&self) -> f32 {
        self.base_z + self.pieces.len() as f32 * PIECE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap_hazard() -> Hazard {
        Hazard {
            z: 20.0,
            offset: -1.0,
            coin_point: Vec2::new(1.0, 21.0),
            shape: HazardShape::Gap {
                width: 2.0,
                planks: vec![Plank {
                    center: 1.0,
                    width: 2.0,
                }],
            },
        }
    }

    #[test]
    fn test_continuity_starts_centered() {
        let mut c = ContinuityState::new();
        assert!(c.is_session_start());
        assert_eq!(c.anchor(), 0.0);
        c.record(-1.25);
        assert!(!c.is_session_start());
        assert_eq!(c.anchor(), -1.25);
    }

    #[test]
    fn test_safe_piece_parts() {
        let piece = Piece {
            z: 0.0,
            light: Rgb::new(1.0, 1.0, 1.0),
            kind: PieceKind::Safe,
        };
        let parts = piece.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].template, Template::Walls);
        assert_eq!(parts[1].template, Template::Ground);
        assert_eq!(parts[1].transform.scale.x, PIECE_SIZE);
    }

    #[test]
    fn test_gap_piece_parts_span_gap() {
        let piece = Piece {
            z: 20.0,
            light: Rgb::new(1.0, 1.0, 1.0),
            kind: PieceKind::Hazard(gap_hazard()),
        };
        let parts = piece.parts();
        let templates: Vec<Template> = parts.iter().map(|p| p.template).collect();
        assert_eq!(
            templates,
            vec![
                Template::Walls,
                Template::Ground,
                Template::DropPlane,
                Template::KillPlane
            ]
        );
        let drop = parts[2].transform;
        assert_eq!(drop.translation.x, -1.0);
        assert_eq!(drop.scale.x, 2.0);
    }

    #[test]
    fn test_hazard_shift_moves_anchor() {
        let mut h = gap_hazard();
        h.shift(16.0);
        assert_eq!(h.z, 4.0);
        assert_eq!(h.coin_point, Vec2::new(1.0, 5.0));
        assert_eq!(h.floor_coverage() + h.half_extent() * 2.0, PIECE_SIZE);
    }
}
