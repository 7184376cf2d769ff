use crate::core::pipeline::{Shader, Varyings};
use crate::gpu::layout::MAX_ATTRIBUTES;
use crate::gpu::texture::Texture;
use nalgebra::{Matrix4, Vector2, Vector3, Vector4};
use std::collections::HashMap;

/// A value stored under a uniform name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vector3<f32>),
    /// Column-major 4x4 matrix.
    Mat4(Matrix4<f32>),
}

/// Named uniform storage of one program. Values persist between draws.
#[derive(Debug, Clone, Default)]
pub struct Uniforms {
    values: HashMap<String, UniformValue>,
}

impl Uniforms {
    pub fn set(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    /// Unset or mistyped uniforms read as zero.
    pub fn float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(UniformValue::Float(v)) => v,
            _ => 0.0,
        }
    }

    pub fn vec3(&self, name: &str) -> Vector3<f32> {
        match self.get(name) {
            Some(UniformValue::Vec3(v)) => v,
            _ => Vector3::zeros(),
        }
    }

    pub fn mat4(&self, name: &str) -> Matrix4<f32> {
        match self.get(name) {
            Some(UniformValue::Mat4(m)) => m,
            _ => Matrix4::zeros(),
        }
    }
}

/// Attribute values of one vertex, indexed by location.
/// Components a layout does not provide default to `(0, 0, 0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexInput {
    attributes: [Vector4<f32>; MAX_ATTRIBUTES],
}

impl Default for VertexInput {
    fn default() -> Self {
        Self {
            attributes: [Vector4::new(0.0, 0.0, 0.0, 1.0); MAX_ATTRIBUTES],
        }
    }
}

impl VertexInput {
    pub fn set(&mut self, location: usize, component: usize, value: f32) {
        self.attributes[location][component] = value;
    }

    pub fn attribute(&self, location: usize) -> Vector4<f32> {
        self.attributes[location]
    }

    pub fn vec3(&self, location: usize) -> Vector3<f32> {
        self.attributes[location].xyz()
    }

    pub fn vec2(&self, location: usize) -> Vector2<f32> {
        self.attributes[location].xy()
    }
}

/// A linked shader program: vertex and fragment stages reading named uniforms.
pub trait ShaderProgram: Send + Sync {
    fn label(&self) -> &str;

    /// Returns the clip-space position and the varyings of one vertex.
    fn vertex(&self, uniforms: &Uniforms, input: &VertexInput) -> (Vector4<f32>, Varyings);

    /// RGBA output in 0.0..1.0, `None` discards the fragment.
    fn fragment(
        &self,
        uniforms: &Uniforms,
        texture: Option<&Texture>,
        varying: &Varyings,
    ) -> Option<Vector4<f32>>;
}

/// A program together with the state it reads during one draw call.
pub struct BoundProgram<'a> {
    pub program: &'a dyn ShaderProgram,
    pub uniforms: &'a Uniforms,
    pub texture: Option<&'a Texture>,
}

impl Shader for BoundProgram<'_> {
    type Varying = Varyings;

    fn fragment(&self, varying: Varyings) -> Option<Vector4<f32>> {
        self.program.fragment(self.uniforms, self.texture, &varying)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_uniforms_read_as_zero() {
        let mut uniforms = Uniforms::default();
        assert_eq!(uniforms.mat4("model"), Matrix4::zeros());
        uniforms.set("ambientStrength", UniformValue::Float(0.5));
        assert_eq!(uniforms.float("ambientStrength"), 0.5);
        assert_eq!(uniforms.vec3("ambientStrength"), Vector3::zeros());
    }

    #[test]
    fn vertex_input_defaults_w_to_one() {
        let mut input = VertexInput::default();
        input.set(0, 0, 2.0);
        assert_eq!(input.attribute(0), Vector4::new(2.0, 0.0, 0.0, 1.0));
    }
}
