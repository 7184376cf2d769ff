use crate::core::pipeline::Varyings;
use crate::gpu::program::{ShaderProgram, Uniforms, VertexInput};
use crate::gpu::texture::Texture;
use nalgebra::{Vector2, Vector4};

/// Screen-space glyph quads.
///
/// Attribute 0 packs `(x, y, u, v)`. Uniforms: `projection`, `textColor`.
/// The red channel of the glyph texture is the coverage.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextProgram;

impl ShaderProgram for TextProgram {
    fn label(&self) -> &str {
        "text"
    }

    fn vertex(&self, uniforms: &Uniforms, input: &VertexInput) -> (Vector4<f32>, Varyings) {
        let packed = input.attribute(0);
        let clip = uniforms.mat4("projection") * Vector4::new(packed.x, packed.y, 0.0, 1.0);
        let varying = Varyings {
            uv: Vector2::new(packed.z, packed.w),
            ..Varyings::default()
        };
        (clip, varying)
    }

    fn fragment(
        &self,
        uniforms: &Uniforms,
        texture: Option<&Texture>,
        varying: &Varyings,
    ) -> Option<Vector4<f32>> {
        let coverage = texture?.sample(varying.uv.x, varying.uv.y).x;
        if coverage <= 0.0 {
            return None;
        }
        let color = uniforms.vec3("textColor");
        Some(Vector4::new(color.x, color.y, color.z, coverage))
    }
}
