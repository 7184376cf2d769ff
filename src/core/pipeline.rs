use nalgebra::{Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Trait for types that can be linearly interpolated across a triangle's surface.
///
/// `Send + Sync` is required because the pixel loop runs on the rayon pool.
pub trait Interpolatable:
    Copy + Clone + Add<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
}

impl<T> Interpolatable for T where
    T: Copy + Clone + Add<Output = T> + Mul<f32, Output = T> + Send + Sync
{
}

/// The programmable stages of the pipeline as seen by the rasterizer.
pub trait Shader: Send + Sync {
    /// Per-vertex outputs interpolated for each fragment.
    type Varying: Interpolatable;

    /// Fragment stage.
    ///
    /// Returns the RGBA color of the fragment in 0.0..1.0, or `None` to
    /// discard it.
    fn fragment(&self, varying: Self::Varying) -> Option<Vector4<f32>>;
}

/// The varying set shared by every bundled shader program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varyings {
    /// Fragment position in world space (lighting).
    pub world_position: Vector3<f32>,
    /// World space normal, not re-normalized by interpolation.
    pub normal: Vector3<f32>,
    pub color: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Default for Varyings {
    fn default() -> Self {
        Self {
            world_position: Vector3::zeros(),
            normal: Vector3::zeros(),
            color: Vector3::zeros(),
            uv: Vector2::zeros(),
        }
    }
}

impl Add for Varyings {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            world_position: self.world_position + other.world_position,
            normal: self.normal + other.normal,
            color: self.color + other.color,
            uv: self.uv + other.uv,
        }
    }
}

impl Mul<f32> for Varyings {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            world_position: self.world_position * scalar,
            normal: self.normal * scalar,
            color: self.color * scalar,
            uv: self.uv * scalar,
        }
    }
}
