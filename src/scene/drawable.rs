use crate::error::RenderError;
use crate::gpu::device::{GraphicsDevice, ProgramId, SharedDevice, TextureId};
use crate::gpu::layout::VertexLayout;
use crate::gpu::resource::{GpuResource, MeshBuffers, upload_mesh};
use crate::physics::TransformSource;
use crate::scene::camera::Camera;
use crate::scene::light::LightRenderer;
use crate::scene::mesh::{MeshData, MeshKind};
use log::debug;
use std::cell::RefMut;
use std::fmt;

/// What a drawable binds besides its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub has_texture: bool,
    pub has_lighting: bool,
}

/// Everything a draw reads but does not own, borrowed for one frame.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub camera: &'a Camera,
    pub light: &'a LightRenderer,
    pub bodies: &'a dyn TransformSource,
}

pub trait Drawable {
    fn capabilities(&self) -> Capabilities;

    /// Issues this object's draw calls. Depth and blend state are left as found.
    fn draw(&self, frame: &FrameContext<'_>) -> Result<(), RenderError>;
}

/// Borrows the device for the duration of one draw.
pub(crate) fn borrow_device(
    device: &SharedDevice,
) -> Result<RefMut<'_, dyn GraphicsDevice + 'static>, RenderError> {
    device.try_borrow_mut().map_err(|_| RenderError::DeviceBusy)
}

/// GPU state shared by every mesh-backed drawable: buffers, program and texture.
pub struct MeshState {
    device: SharedDevice,
    kind: MeshKind,
    buffers: MeshBuffers,
    program: Option<ProgramId>,
    texture: Option<GpuResource<TextureId>>,
}

impl fmt::Debug for MeshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshState")
            .field("kind", &self.kind)
            .field("buffers", &self.buffers)
            .field("program", &self.program)
            .field("texture", &self.texture)
            .finish()
    }
}

impl MeshState {
    /// Generates `kind` and uploads it with `layout`.
    pub fn new(
        device: &SharedDevice,
        kind: MeshKind,
        layout: &VertexLayout,
    ) -> Result<Self, RenderError> {
        let mesh = MeshData::generate(kind);
        let buffers = upload_mesh(device, &mesh, layout)?;
        debug!("{:?} mesh ready ({} indices)", kind, buffers.index_count);
        Ok(Self {
            device: device.clone(),
            kind,
            buffers,
            program: None,
            texture: None,
        })
    }

    pub fn kind(&self) -> MeshKind {
        self.kind
    }

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn index_count(&self) -> usize {
        self.buffers.index_count
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn set_program(&mut self, program: ProgramId) {
        self.program = Some(program);
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture.as_ref().map(GpuResource::handle)
    }

    pub fn set_texture(&mut self, texture: GpuResource<TextureId>) {
        self.texture = Some(texture);
    }

    /// The shared draw sequence: use program, upload uniforms, bind texture
    /// (if `capabilities` asks for one), bind vertex array, draw every index,
    /// then unbind in reverse order.
    pub fn draw_with(
        &self,
        owner: &'static str,
        capabilities: Capabilities,
        upload_uniforms: impl FnOnce(&mut dyn GraphicsDevice) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        let program = self.program.ok_or(RenderError::ProgramNotSet(owner))?;
        let mut device = borrow_device(&self.device)?;

        device.use_program(Some(program))?;
        upload_uniforms(&mut *device)?;
        if capabilities.has_texture {
            device.bind_texture(self.texture())?;
        }
        device.bind_vertex_array(Some(self.buffers.vertex_array.handle()))?;
        device.draw_elements(self.buffers.index_count)?;

        device.bind_vertex_array(None)?;
        if capabilities.has_texture {
            device.bind_texture(None)?;
        }
        device.use_program(None)?;
        Ok(())
    }
}
