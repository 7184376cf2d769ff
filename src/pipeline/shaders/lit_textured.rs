use crate::core::pipeline::Varyings;
use crate::gpu::program::{ShaderProgram, Uniforms, VertexInput};
use crate::gpu::texture::Texture;
use crate::pipeline::shaders::point;
use nalgebra::{Matrix3, Vector3, Vector4};

const SHININESS: f32 = 128.0;

/// Phong lighting from one point light, modulated by the bound texture.
///
/// Attributes: 0 position, 1 texture coordinate, 2 normal.
/// Uniforms: `model`, `vp`, `cameraPos`, `lightPos`, `lightColor`,
/// `specularStrength`, `ambientStrength`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LitTexturedProgram;

impl ShaderProgram for LitTexturedProgram {
    fn label(&self) -> &str {
        "lit-textured"
    }

    fn vertex(&self, uniforms: &Uniforms, input: &VertexInput) -> (Vector4<f32>, Varyings) {
        let model = uniforms.mat4("model");
        let world = model * point(input.vec3(0));

        // Inverse-transpose keeps normals perpendicular under non-uniform scale.
        let linear: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or(linear);

        let varying = Varyings {
            world_position: world.xyz(),
            normal: normal_matrix * input.vec3(2),
            uv: input.vec2(1),
            ..Varyings::default()
        };
        (uniforms.mat4("vp") * world, varying)
    }

    fn fragment(
        &self,
        uniforms: &Uniforms,
        texture: Option<&Texture>,
        varying: &Varyings,
    ) -> Option<Vector4<f32>> {
        let object_color = texture
            .map(|t| t.sample(varying.uv.x, varying.uv.y).xyz())
            .unwrap_or_else(|| Vector3::new(1.0, 1.0, 1.0));
        let light_color = uniforms.vec3("lightColor");

        let normal = varying.normal.try_normalize(1e-8).unwrap_or_else(Vector3::zeros);
        let light_dir = (uniforms.vec3("lightPos") - varying.world_position)
            .try_normalize(1e-8)
            .unwrap_or_else(Vector3::zeros);
        let view_dir = (uniforms.vec3("cameraPos") - varying.world_position)
            .try_normalize(1e-8)
            .unwrap_or_else(Vector3::zeros);

        let ambient = light_color * uniforms.float("ambientStrength");

        let facing = normal.dot(&light_dir);
        let diffuse = light_color * facing.max(0.0);

        // No highlight on faces turned away from the light.
        let specular = if facing > 0.0 {
            let reflect_dir = normal * (2.0 * facing) - light_dir;
            let spec = view_dir.dot(&reflect_dir).max(0.0).powf(SHININESS);
            light_color * (uniforms.float("specularStrength") * spec)
        } else {
            Vector3::zeros()
        };

        let color = (ambient + diffuse + specular).component_mul(&object_color);
        Some(Vector4::new(color.x, color.y, color.z, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::program::UniformValue;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Vector2};

    fn lighting(ambient: f32, specular: f32) -> Uniforms {
        let mut uniforms = Uniforms::default();
        uniforms.set("lightPos", UniformValue::Vec3(Vector3::new(0.0, 10.0, 0.0)));
        uniforms.set("lightColor", UniformValue::Vec3(Vector3::new(1.0, 1.0, 1.0)));
        uniforms.set("cameraPos", UniformValue::Vec3(Vector3::new(0.0, 10.0, 0.0)));
        uniforms.set("ambientStrength", UniformValue::Float(ambient));
        uniforms.set("specularStrength", UniformValue::Float(specular));
        uniforms
    }

    fn facing_up() -> Varyings {
        Varyings {
            normal: Vector3::new(0.0, 1.0, 0.0),
            uv: Vector2::new(0.5, 0.5),
            ..Varyings::default()
        }
    }

    #[test]
    fn head_on_light_adds_ambient_diffuse_and_specular() {
        let color = LitTexturedProgram
            .fragment(&lighting(0.5, 0.1), None, &facing_up())
            .unwrap();
        assert_relative_eq!(color.x, 1.6, epsilon = 1e-5);
    }

    #[test]
    fn faces_turned_away_only_get_ambient() {
        let mut varying = facing_up();
        varying.normal = -varying.normal;
        let color = LitTexturedProgram
            .fragment(&lighting(0.5, 0.1), None, &varying)
            .unwrap();
        assert_relative_eq!(color.x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn grazing_light_gets_no_highlight() {
        let mut varying = facing_up();
        varying.normal = Vector3::new(1.0, 0.0, 0.0);
        let color = LitTexturedProgram
            .fragment(&lighting(0.5, 1.0), None, &varying)
            .unwrap();
        assert_relative_eq!(color.x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn normals_use_the_inverse_transpose() {
        let mut uniforms = Uniforms::default();
        uniforms.set(
            "model",
            UniformValue::Mat4(Matrix4::new_nonuniform_scaling(&Vector3::new(4.0, 1.0, 1.0))),
        );
        let mut input = VertexInput::default();
        input.set(2, 0, 1.0);
        input.set(2, 1, 1.0);
        let (_, varying) = LitTexturedProgram.vertex(&uniforms, &input);

        let normal = varying.normal.normalize();
        assert!(normal.y > normal.x);
    }
}
