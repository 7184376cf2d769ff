use crate::core::pipeline::Varyings;
use crate::gpu::program::{ShaderProgram, Uniforms, VertexInput};
use crate::gpu::texture::Texture;
use crate::pipeline::shaders::point;
use nalgebra::Vector4;

/// Unlit vertex colors.
///
/// Attributes: 0 position, 1 color. Uniforms: `model`, `view`, `projection`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatProgram;

impl ShaderProgram for FlatProgram {
    fn label(&self) -> &str {
        "flat"
    }

    fn vertex(&self, uniforms: &Uniforms, input: &VertexInput) -> (Vector4<f32>, Varyings) {
        let world = uniforms.mat4("model") * point(input.vec3(0));
        let clip = uniforms.mat4("projection") * uniforms.mat4("view") * world;
        let varying = Varyings {
            world_position: world.xyz(),
            color: input.vec3(1),
            ..Varyings::default()
        };
        (clip, varying)
    }

    fn fragment(
        &self,
        _uniforms: &Uniforms,
        _texture: Option<&Texture>,
        varying: &Varyings,
    ) -> Option<Vector4<f32>> {
        let c = varying.color;
        Some(Vector4::new(c.x, c.y, c.z, 1.0))
    }
}
