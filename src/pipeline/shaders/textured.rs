use crate::core::pipeline::Varyings;
use crate::gpu::program::{ShaderProgram, Uniforms, VertexInput};
use crate::gpu::texture::Texture;
use crate::pipeline::shaders::point;
use nalgebra::Vector4;

/// Unlit textured meshes. Uses the lit-textured layout and `model` / `vp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TexturedProgram;

impl ShaderProgram for TexturedProgram {
    fn label(&self) -> &str {
        "textured"
    }

    fn vertex(&self, uniforms: &Uniforms, input: &VertexInput) -> (Vector4<f32>, Varyings) {
        let world = uniforms.mat4("model") * point(input.vec3(0));
        let varying = Varyings {
            world_position: world.xyz(),
            uv: input.vec2(1),
            ..Varyings::default()
        };
        (uniforms.mat4("vp") * world, varying)
    }

    fn fragment(
        &self,
        _uniforms: &Uniforms,
        texture: Option<&Texture>,
        varying: &Varyings,
    ) -> Option<Vector4<f32>> {
        Some(
            texture
                .map(|t| t.sample(varying.uv.x, varying.uv.y))
                .unwrap_or_else(|| Vector4::new(1.0, 0.0, 1.0, 1.0)),
        )
    }
}
