use crate::core::math::transform::TransformFactory;
use crate::error::RenderError;
use crate::gpu::device::{ProgramId, SharedDevice, TextureId};
use crate::gpu::layout::VertexLayout;
use crate::gpu::program::UniformValue;
use crate::gpu::resource::GpuResource;
use crate::physics::{BodyHandle, TransformSource};
use crate::scene::drawable::{Capabilities, Drawable, FrameContext, MeshState};
use crate::scene::mesh::MeshKind;
use nalgebra::{Matrix4, Vector3};

/// A textured, Phong-lit mesh whose placement comes from a rigid body.
///
/// The model matrix is `translate(body + offset) * rotate(body) * scale`.
/// Uniforms: `model`, `vp`, `cameraPos`, `lightPos`, `lightColor`,
/// `specularStrength`, `ambientStrength`.
#[derive(Debug)]
pub struct LitMeshRenderer {
    mesh: MeshState,
    name: String,
    body: BodyHandle,
    offset: Vector3<f32>,
    scale: Vector3<f32>,
    specular_strength: f32,
    ambient_strength: f32,
}

impl LitMeshRenderer {
    pub fn new(
        device: &SharedDevice,
        kind: MeshKind,
        body: BodyHandle,
        name: impl Into<String>,
        specular_strength: f32,
        ambient_strength: f32,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            mesh: MeshState::new(device, kind, &VertexLayout::lit_textured())?,
            name: name.into(),
            body,
            offset: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            specular_strength,
            ambient_strength,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MeshKind {
        self.mesh.kind()
    }

    pub fn rigid_body(&self) -> BodyHandle {
        self.body
    }

    /// World-space offset added to the body's translation. Zero by default.
    pub fn position(&self) -> Vector3<f32> {
        self.offset
    }

    pub fn set_position(&mut self, offset: Vector3<f32>) {
        self.offset = offset;
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
    }

    pub fn specular_strength(&self) -> f32 {
        self.specular_strength
    }

    pub fn ambient_strength(&self) -> f32 {
        self.ambient_strength
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.mesh.program()
    }

    pub fn set_program(&mut self, program: ProgramId) {
        self.mesh.set_program(program);
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.mesh.texture()
    }

    /// Takes ownership of `texture`; it is released with this drawable.
    pub fn set_texture(&mut self, texture: GpuResource<TextureId>) {
        self.mesh.set_texture(texture);
    }

    pub fn model_matrix(&self, bodies: &dyn TransformSource) -> Result<Matrix4<f32>, RenderError> {
        let transform = bodies
            .world_transform(self.body)
            .ok_or(RenderError::UnknownBody(self.body))?;

        let translation = TransformFactory::translation(&(transform.translation + self.offset));
        let rotation = TransformFactory::rotation_from_quaternion(&transform.rotation);
        let scale = TransformFactory::scaling_nonuniform(&self.scale);
        Ok(translation * rotation * scale)
    }
}

impl Drawable for LitMeshRenderer {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_texture: true,
            has_lighting: true,
        }
    }

    fn draw(&self, frame: &FrameContext<'_>) -> Result<(), RenderError> {
        let model = self.model_matrix(frame.bodies)?;
        let camera = frame.camera;
        let light = frame.light;

        self.mesh.draw_with("lit mesh renderer", self.capabilities(), |device| {
            device.set_uniform("model", UniformValue::Mat4(model))?;
            device.set_uniform("vp", UniformValue::Mat4(camera.view_projection()))?;
            device.set_uniform("cameraPos", UniformValue::Vec3(camera.position()))?;
            device.set_uniform("lightPos", UniformValue::Vec3(light.position()))?;
            device.set_uniform("lightColor", UniformValue::Vec3(light.color()))?;
            device.set_uniform(
                "specularStrength",
                UniformValue::Float(self.specular_strength),
            )?;
            device.set_uniform("ambientStrength", UniformValue::Float(self.ambient_strength))?;
            Ok(())
        })
    }
}
