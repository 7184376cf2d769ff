use crate::core::framebuffer::FrameBuffer;
use crate::core::pipeline::Shader;
use crate::core::rasterizer::Rasterizer;
use nalgebra::{Vector3, Vector4};

/// Owns the render target and the fixed-function rasterizer state.
pub struct Renderer {
    pub rasterizer: Rasterizer,
    pub framebuffer: FrameBuffer,
}

impl Renderer {
    /// `sample_count`: 1 for no AA, 2 for 2x2 SSAA, etc.
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        Self {
            rasterizer: Rasterizer::new(),
            framebuffer: FrameBuffer::new(width, height, sample_count),
        }
    }

    pub fn clear(&mut self, color: Vector3<f32>) {
        self.framebuffer.clear(color);
    }

    /// Assembles a triangle list from already-shaded vertices and rasterizes it.
    ///
    /// `indices.len()` must be a multiple of 3 and every index must address
    /// `vertices`; the device validates both before calling.
    pub fn draw_triangles<S: Shader>(
        &self,
        shader: &S,
        vertices: &[(Vector4<f32>, S::Varying)],
        indices: &[u32],
    ) {
        for triangle in indices.chunks_exact(3) {
            let v0 = vertices[triangle[0] as usize];
            let v1 = vertices[triangle[1] as usize];
            let v2 = vertices[triangle[2] as usize];

            self.rasterizer.rasterize_triangle(
                &self.framebuffer,
                shader,
                &[v0.0, v1.0, v2.0],
                &[v0.1, v1.1, v2.1],
            );
        }
    }
}
