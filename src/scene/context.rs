use crate::error::RenderError;
use crate::gpu::device::{ProgramId, SharedDevice};
use crate::gpu::program::ShaderProgram;
use crate::gpu::resource::GpuResource;
use crate::physics::TransformSource;
use crate::pipeline::shaders::{FlatProgram, LitTexturedProgram, TextProgram, TexturedProgram};
use crate::scene::camera::Camera;
use crate::scene::drawable::{Drawable, FrameContext, borrow_device};
use crate::scene::light::LightRenderer;
use crate::scene::lit_mesh::LitMeshRenderer;
use crate::scene::text::TextRenderer;
use log::{debug, trace};
use nalgebra::Vector3;

/// The bundled shader programs, created once per device.
#[derive(Debug)]
pub struct Programs {
    pub flat: GpuResource<ProgramId>,
    pub lit_textured: GpuResource<ProgramId>,
    pub textured: GpuResource<ProgramId>,
    pub text: GpuResource<ProgramId>,
}

impl Programs {
    pub fn new(device: &SharedDevice) -> Result<Self, RenderError> {
        let create = |program: Box<dyn ShaderProgram>| -> Result<_, RenderError> {
            let id = borrow_device(device)?.create_program(program)?;
            Ok(GpuResource::new(device, id))
        };
        Ok(Self {
            flat: create(Box::new(FlatProgram))?,
            lit_textured: create(Box::new(LitTexturedProgram))?,
            textured: create(Box::new(TexturedProgram))?,
            text: create(Box::new(TextProgram))?,
        })
    }
}

/// Owns everything drawn each frame and enforces the draw order:
/// clear, opaque 3D objects (and optionally the light), then text overlays.
pub struct Scene {
    pub camera: Camera,
    pub light: LightRenderer,
    /// The light proxy is invisible unless this is set.
    pub draw_light: bool,
    pub clear_color: Vector3<f32>,
    objects: Vec<LitMeshRenderer>,
    overlays: Vec<TextRenderer>,
    programs: Programs,
    device: SharedDevice,
}

impl Scene {
    pub fn new(
        device: &SharedDevice,
        camera: Camera,
        light: LightRenderer,
        programs: Programs,
    ) -> Self {
        Self {
            camera,
            light,
            draw_light: false,
            clear_color: Vector3::zeros(),
            objects: Vec::new(),
            overlays: Vec::new(),
            programs,
            device: device.clone(),
        }
    }

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn programs(&self) -> &Programs {
        &self.programs
    }

    /// Adds an opaque object and returns its index.
    pub fn add_object(&mut self, object: LitMeshRenderer) -> usize {
        debug!("scene object '{}' added", object.name());
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn objects(&self) -> &[LitMeshRenderer] {
        &self.objects
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut LitMeshRenderer> {
        self.objects.get_mut(index)
    }

    /// Adds a text overlay and returns its index.
    pub fn add_overlay(&mut self, overlay: TextRenderer) -> usize {
        self.overlays.push(overlay);
        self.overlays.len() - 1
    }

    pub fn overlays(&self) -> &[TextRenderer] {
        &self.overlays
    }

    pub fn overlay_mut(&mut self, index: usize) -> Option<&mut TextRenderer> {
        self.overlays.get_mut(index)
    }

    /// Renders one frame. `bodies` must already reflect this frame's physics step.
    pub fn render(&self, bodies: &dyn TransformSource) -> Result<(), RenderError> {
        {
            let mut device = borrow_device(&self.device)?;
            device.clear(self.clear_color);
            device.set_depth_test(true);
            device.set_blending(false);
        }

        let frame = FrameContext {
            camera: &self.camera,
            light: &self.light,
            bodies,
        };
        if self.draw_light {
            self.light.draw(&frame)?;
        }
        for object in &self.objects {
            object.draw(&frame)?;
        }
        // Overlays blend over the finished 3D image.
        for overlay in &self.overlays {
            overlay.draw(&frame)?;
        }
        trace!(
            "frame: {} objects, {} overlays",
            self.objects.len(),
            self.overlays.len()
        );
        Ok(())
    }
}
