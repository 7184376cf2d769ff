use crate::core::math::transform::TransformFactory;
use crate::error::RenderError;
use crate::gpu::device::{ProgramId, SharedDevice};
use crate::gpu::layout::VertexLayout;
use crate::gpu::program::UniformValue;
use crate::scene::drawable::{Capabilities, Drawable, FrameContext, MeshState};
use crate::scene::mesh::MeshKind;
use nalgebra::{Matrix4, Vector3};

/// Flat-colored mesh placed by a translation.
///
/// Uploads `model`, `view` and `projection`; uses [`VertexLayout::flat`].
#[derive(Debug)]
pub struct MeshRenderer {
    mesh: MeshState,
    position: Vector3<f32>,
}

impl MeshRenderer {
    pub fn new(device: &SharedDevice, kind: MeshKind) -> Result<Self, RenderError> {
        Ok(Self {
            mesh: MeshState::new(device, kind, &VertexLayout::flat())?,
            position: Vector3::zeros(),
        })
    }

    pub fn kind(&self) -> MeshKind {
        self.mesh.kind()
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.mesh.program()
    }

    pub fn set_program(&mut self, program: ProgramId) {
        self.mesh.set_program(program);
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        TransformFactory::translation(&self.position)
    }

    pub(crate) fn draw_as(
        &self,
        owner: &'static str,
        frame: &FrameContext<'_>,
    ) -> Result<(), RenderError> {
        let model = self.model_matrix();
        self.mesh.draw_with(owner, self.capabilities(), |device| {
            device.set_uniform("model", UniformValue::Mat4(model))?;
            device.set_uniform("view", UniformValue::Mat4(frame.camera.view_matrix()))?;
            device.set_uniform(
                "projection",
                UniformValue::Mat4(frame.camera.projection_matrix()),
            )?;
            Ok(())
        })
    }
}

impl Drawable for MeshRenderer {
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    fn draw(&self, frame: &FrameContext<'_>) -> Result<(), RenderError> {
        self.draw_as("mesh renderer", frame)
    }
}
