//! Host instantiation interface
//!
//! The generator never owns renderable objects. It asks a [`SceneHost`] to
//! spawn templates, parent them and place them, and remembers only the
//! returned [`Handle`]s.

mod graph;

pub use graph::{SceneGraph, SceneNode};

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque reference to a spawned instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub u64);

/// Instantiable templates the track is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Template {
    /// Root node every segment hangs off
    Track,
    /// Empty grouping node for one generated segment
    Segment,
    /// Empty node for one square piece
    Piece,
    /// Side walls plus the point light every piece carries
    Walls,
    /// Walkable floor slab (scaled per use)
    Ground,
    /// Protruding obstacle block
    KillCube,
    /// Volume that releases the observer's vertical lock over a gap
    DropPlane,
    /// Volume under a gap that ends the run
    KillPlane,
    /// Empty node grouping a segment's coins
    CoinGroup,
    Coin,
}

/// Local placement relative to the parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
    };

    /// Unscaled, unrotated placement at `translation`
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Replace the scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Replace the rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Local-to-parent matrix (scale, then rotation, then translation)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Ambient light colour, channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Colour from its three channels
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Channel by index (0 = r, 1 = g, 2 = b)
    pub fn channel(&self, index: usize) -> f32 {
        match index {
            0 => self.r,
            1 => self.g,
            _ => self.b,
        }
    }

    /// Mutable channel by index
    pub fn channel_mut(&mut self, index: usize) -> &mut f32 {
        match index {
            0 => &mut self.r,
            1 => &mut self.g,
            _ => &mut self.b,
        }
    }
}

/// Instantiation capability supplied by the host engine
///
/// Destroying a node destroys all of its descendants; the host must forget
/// them so they can never be destroyed a second time.
pub trait SceneHost {
    fn spawn(&mut self, template: Template) -> Handle;
    fn set_parent(&mut self, handle: Handle, parent: Option<Handle>);
    fn set_local_transform(&mut self, handle: Handle, transform: Transform);
    fn set_light_color(&mut self, handle: Handle, color: Rgb);
    fn destroy(&mut self, handle: Handle);
}
