//! Drawables and the per-frame scene they are composed into.

pub mod camera;
pub mod context;
pub mod drawable;
pub mod glyph;
pub mod light;
pub mod lit_mesh;
pub mod mesh;
pub mod renderer;
pub mod text;

pub use camera::Camera;
pub use context::{Programs, Scene};
pub use drawable::{Capabilities, Drawable, FrameContext, MeshState};
pub use glyph::{BlockGlyphs, FontdueRasterizer, Glyph, GlyphRasterizer};
pub use light::LightRenderer;
pub use lit_mesh::LitMeshRenderer;
pub use mesh::{MeshData, MeshKind};
pub use renderer::MeshRenderer;
pub use text::{GlyphQuad, TextRenderer};
