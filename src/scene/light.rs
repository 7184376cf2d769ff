use crate::error::RenderError;
use crate::gpu::device::{ProgramId, SharedDevice};
use crate::scene::drawable::{Capabilities, Drawable, FrameContext};
use crate::scene::mesh::MeshKind;
use crate::scene::renderer::MeshRenderer;
use nalgebra::{Matrix4, Vector3};

/// A visible proxy for the scene's point light.
///
/// Draws exactly like [`MeshRenderer`]; lit drawables read its position and
/// color from the [`FrameContext`].
#[derive(Debug)]
pub struct LightRenderer {
    body: MeshRenderer,
    color: Vector3<f32>,
}

impl LightRenderer {
    pub fn new(device: &SharedDevice, kind: MeshKind) -> Result<Self, RenderError> {
        Ok(Self {
            body: MeshRenderer::new(device, kind)?,
            color: Vector3::new(1.0, 1.0, 1.0),
        })
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }

    pub fn set_color(&mut self, color: Vector3<f32>) {
        self.color = color;
    }

    pub fn position(&self) -> Vector3<f32> {
        self.body.position()
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.body.set_position(position);
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.body.program()
    }

    pub fn set_program(&mut self, program: ProgramId) {
        self.body.set_program(program);
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.body.model_matrix()
    }
}

impl Drawable for LightRenderer {
    fn capabilities(&self) -> Capabilities {
        self.body.capabilities()
    }

    fn draw(&self, frame: &FrameContext<'_>) -> Result<(), RenderError> {
        self.body.draw_as("light renderer", frame)
    }
}
