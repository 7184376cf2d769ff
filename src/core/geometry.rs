use bytemuck::{Pod, Zeroable};
use nalgebra::{Vector2, Vector3};

/// A single mesh vertex as it is laid out in a vertex buffer.
///
/// Every mesh generator fills all four attributes so that the byte layout is
/// identical across mesh kinds; each vertex layout picks the subset it needs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Vector3<f32>,
    /// Unit surface normal.
    pub normal: Vector3<f32>,
    /// Per-vertex color, consumed by flat shading.
    pub color: Vector3<f32>,
    /// Texture coordinates (UV).
    pub texture_coordinate: Vector2<f32>,
}

impl Vertex {
    pub fn new(
        position: Vector3<f32>,
        normal: Vector3<f32>,
        color: Vector3<f32>,
        texture_coordinate: Vector2<f32>,
    ) -> Self {
        Self {
            position,
            normal,
            color,
            texture_coordinate,
        }
    }
}
