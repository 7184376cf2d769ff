//! Shader programs bundled with the game, one per drawable kind.

pub mod flat;
pub mod lit_textured;
pub mod text;
pub mod textured;

pub use flat::FlatProgram;
pub use lit_textured::LitTexturedProgram;
pub use text::TextProgram;
pub use textured::TexturedProgram;

use nalgebra::{Vector3, Vector4};

/// `position` as a homogeneous point (w = 1).
fn point(position: Vector3<f32>) -> Vector4<f32> {
    Vector4::new(position.x, position.y, position.z, 1.0)
}
