//! The graphics device seam the drawables render through.
//!
//! Drawables only see [`GraphicsDevice`]; [`software::SoftwareDevice`] is the
//! CPU backend built on the rasterizer in [`crate::core`].

pub mod device;
pub mod layout;
pub mod program;
pub mod resource;
pub mod software;
pub mod texture;

pub use device::{
    BufferDescriptor, BufferId, BufferKind, BufferUsage, DeviceCommand, DeviceError,
    GraphicsDevice, ProgramId, ResourceId, SharedDevice, TextureId, VertexArrayId,
};
pub use layout::{VertexAttribute, VertexLayout};
pub use program::{ShaderProgram, UniformValue, Uniforms, VertexInput};
pub use resource::{GpuResource, MeshBuffers, upload_mesh};
pub use software::SoftwareDevice;
pub use texture::{Texture, TextureDescriptor, TextureFormat, WrapMode};
