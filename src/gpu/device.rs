use crate::gpu::layout::VertexLayout;
use crate::gpu::program::{ShaderProgram, UniformValue};
use crate::gpu::texture::TextureDescriptor;
use nalgebra::Vector3;
use std::cell::{RefCell, RefMut};
use std::rc::Rc;
use thiserror::Error;

/// Device shared by every drawable on the render thread.
pub type SharedDevice = Rc<RefCell<dyn GraphicsDevice>>;

/// Mutably borrows `device`, or fails with [`DeviceError::Busy`] if it is already borrowed.
pub fn try_borrow_device(
    device: &SharedDevice,
) -> Result<RefMut<'_, dyn GraphicsDevice + 'static>, DeviceError> {
    device.try_borrow_mut().map_err(|_| DeviceError::Busy)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Any releasable device object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Buffer(BufferId),
    VertexArray(VertexArrayId),
    Texture(TextureId),
    Program(ProgramId),
}

impl From<BufferId> for ResourceId {
    fn from(id: BufferId) -> Self {
        Self::Buffer(id)
    }
}

impl From<VertexArrayId> for ResourceId {
    fn from(id: VertexArrayId) -> Self {
        Self::VertexArray(id)
    }
}

impl From<TextureId> for ResourceId {
    fn from(id: TextureId) -> Self {
        Self::Texture(id)
    }
}

impl From<ProgramId> for ResourceId {
    fn from(id: ProgramId) -> Self {
        Self::Program(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Static buffers are written once at creation; dynamic ones accept `write_buffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDescriptor<'a> {
    pub label: &'a str,
    pub kind: BufferKind,
    pub usage: BufferUsage,
}

#[derive(Debug, Error, PartialEq)]
pub enum DeviceError {
    #[error("graphics device is already borrowed")]
    Busy,
    #[error("unknown {kind} handle {id}")]
    UnknownResource { kind: &'static str, id: u32 },
    #[error("no shader program in use")]
    NoProgramInUse,
    #[error("no vertex array bound")]
    NoVertexArrayBound,
    #[error("the bound vertex array has no index buffer")]
    MissingIndexBuffer,
    #[error("buffer {0:?} is static and cannot be rewritten")]
    ImmutableBuffer(BufferId),
    #[error("buffer {id:?} is a {actual:?} buffer, expected {expected:?}")]
    WrongBufferKind {
        id: BufferId,
        expected: BufferKind,
        actual: BufferKind,
    },
    #[error("draw of {count} elements exceeds the {available} available")]
    DrawOutOfRange { count: usize, available: usize },
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("triangle list needs a multiple of 3 elements, got {0}")]
    IncompleteTriangle(usize),
    #[error("texture data has {actual} bytes, expected {expected}")]
    TextureSize { expected: usize, actual: usize },
    #[error("invalid vertex layout: {0}")]
    InvalidLayout(String),
}

/// One recorded device call, see [`crate::gpu::SoftwareDevice::enable_trace`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    UseProgram(Option<ProgramId>),
    SetUniform {
        program: ProgramId,
        name: String,
        value: UniformValue,
    },
    BindTexture(Option<TextureId>),
    BindVertexArray(Option<VertexArrayId>),
    WriteBuffer { buffer: BufferId, data: Vec<u8> },
    DrawElements { count: usize },
    DrawArrays { count: usize },
    SetDepthTest(bool),
    SetBlending(bool),
    Clear(Vector3<f32>),
}

/// GL-flavoured immediate device: bind state, set named uniforms, draw.
///
/// Handles are plain ids. Ownership lives in [`crate::gpu::GpuResource`],
/// which calls [`GraphicsDevice::release`] on drop.
pub trait GraphicsDevice {
    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, DeviceError>;

    /// Replaces the contents of a dynamic buffer.
    fn write_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), DeviceError>;

    /// Records how `vertex_buffer` feeds shader attributes, plus the optional
    /// index buffer used by [`GraphicsDevice::draw_elements`].
    fn create_vertex_array(
        &mut self,
        layout: &VertexLayout,
        vertex_buffer: BufferId,
        index_buffer: Option<BufferId>,
    ) -> Result<VertexArrayId, DeviceError>;

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<TextureId, DeviceError>;

    fn create_program(
        &mut self,
        program: Box<dyn ShaderProgram>,
    ) -> Result<ProgramId, DeviceError>;

    /// Frees a device object. Unknown handles are ignored.
    fn release(&mut self, resource: ResourceId);

    fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), DeviceError>;

    /// Sets a uniform on the program currently in use.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), DeviceError>;

    fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), DeviceError>;

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>)
    -> Result<(), DeviceError>;

    fn set_depth_test(&mut self, enabled: bool);

    fn depth_test_enabled(&self) -> bool;

    fn set_blending(&mut self, enabled: bool);

    fn blending_enabled(&self) -> bool;

    /// Clears color to `color` and depth to the far plane.
    fn clear(&mut self, color: Vector3<f32>);

    /// Indexed triangle list over the first `count` indices of the bound vertex array.
    fn draw_elements(&mut self, count: usize) -> Result<(), DeviceError>;

    /// Non-indexed triangle list over the first `count` vertices.
    fn draw_arrays(&mut self, count: usize) -> Result<(), DeviceError>;
}
