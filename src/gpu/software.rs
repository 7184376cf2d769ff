use crate::core::pipeline::Varyings;
use crate::core::rasterizer::CullMode;
use crate::gpu::device::{
    BufferDescriptor, BufferId, BufferKind, BufferUsage, DeviceCommand, DeviceError,
    GraphicsDevice, ProgramId, ResourceId, TextureId, VertexArrayId,
};
use crate::gpu::layout::VertexLayout;
use crate::gpu::program::{BoundProgram, ShaderProgram, UniformValue, Uniforms, VertexInput};
use crate::gpu::texture::{Texture, TextureDescriptor};
use crate::pipeline::renderer::Renderer;
use image::RgbImage;
use log::{debug, trace};
use nalgebra::{Vector3, Vector4};
use rayon::prelude::*;
use std::collections::HashMap;

/// Id allocator plus storage for one kind of device object. Id 0 is never handed out.
struct ResourceTable<T> {
    next_id: u32,
    entries: HashMap<u32, T>,
}

impl<T> ResourceTable<T> {
    fn new() -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, value: T) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, value);
        id
    }

    fn get(&self, kind: &'static str, id: u32) -> Result<&T, DeviceError> {
        self.entries
            .get(&id)
            .ok_or(DeviceError::UnknownResource { kind, id })
    }

    fn get_mut(&mut self, kind: &'static str, id: u32) -> Result<&mut T, DeviceError> {
        self.entries
            .get_mut(&id)
            .ok_or(DeviceError::UnknownResource { kind, id })
    }

    fn remove(&mut self, id: u32) -> bool {
        self.entries.remove(&id).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

struct BufferEntry {
    kind: BufferKind,
    usage: BufferUsage,
    data: Vec<u8>,
}

struct VertexArrayEntry {
    layout: VertexLayout,
    vertex_buffer: BufferId,
    index_buffer: Option<BufferId>,
}

struct ProgramEntry {
    program: Box<dyn ShaderProgram>,
    uniforms: Uniforms,
}

/// Counters accumulated since the last [`SoftwareDevice::reset_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: usize,
    pub triangles: usize,
}

/// CPU implementation of [`GraphicsDevice`] rendering into an SSAA framebuffer.
pub struct SoftwareDevice {
    renderer: Renderer,
    buffers: ResourceTable<BufferEntry>,
    vertex_arrays: ResourceTable<VertexArrayEntry>,
    textures: ResourceTable<Texture>,
    programs: ResourceTable<ProgramEntry>,
    current_program: Option<ProgramId>,
    bound_texture: Option<TextureId>,
    bound_vertex_array: Option<VertexArrayId>,
    trace: Option<Vec<DeviceCommand>>,
    stats: DrawStats,
}

impl SoftwareDevice {
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        debug!(
            "software device {}x{} ({}x SSAA)",
            width, height, sample_count
        );
        Self {
            renderer: Renderer::new(width, height, sample_count),
            buffers: ResourceTable::new(),
            vertex_arrays: ResourceTable::new(),
            textures: ResourceTable::new(),
            programs: ResourceTable::new(),
            current_program: None,
            bound_texture: None,
            bound_vertex_array: None,
            trace: None,
            stats: DrawStats::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.renderer.framebuffer.width
    }

    pub fn height(&self) -> usize {
        self.renderer.framebuffer.height
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.renderer.rasterizer.cull_mode = mode;
    }

    /// Starts recording every state-changing call.
    pub fn enable_trace(&mut self) {
        self.trace.get_or_insert_with(Vec::new);
    }

    /// Returns the commands recorded so far and keeps recording.
    pub fn take_trace(&mut self) -> Vec<DeviceCommand> {
        self.trace.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Current value of a program's uniform.
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        self.programs
            .entries
            .get(&program.0)
            .and_then(|entry| entry.uniforms.get(name))
    }

    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DrawStats::default();
    }

    /// Number of live buffers, vertex arrays, textures and programs.
    pub fn live_resources(&self) -> usize {
        self.buffers.len() + self.vertex_arrays.len() + self.textures.len() + self.programs.len()
    }

    /// Resolved color at an output pixel.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        self.renderer.framebuffer.get_pixel(x, y)
    }

    /// Resolves the framebuffer into an image.
    pub fn snapshot(&self) -> RgbImage {
        self.renderer.framebuffer.to_image()
    }

    fn record(&mut self, command: impl FnOnce() -> DeviceCommand) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(command());
        }
    }

    /// Decodes every vertex of `buffer` through `layout`.
    fn decode_vertices(layout: &VertexLayout, buffer: &[u8]) -> Vec<VertexInput> {
        buffer
            .chunks_exact(layout.stride)
            .map(|bytes| {
                let mut input = VertexInput::default();
                for attribute in &layout.attributes {
                    for component in 0..attribute.components {
                        let start = attribute.offset + component * 4;
                        let value: f32 = bytemuck::pod_read_unaligned(&bytes[start..start + 4]);
                        input.set(attribute.location, component, value);
                    }
                }
                input
            })
            .collect()
    }

    fn expect_kind(&self, id: BufferId, expected: BufferKind) -> Result<(), DeviceError> {
        let actual = self.buffers.get("buffer", id.0)?.kind;
        if actual == expected {
            Ok(())
        } else {
            Err(DeviceError::WrongBufferKind {
                id,
                expected,
                actual,
            })
        }
    }

    /// Shared tail of `draw_elements` and `draw_arrays`.
    fn submit(&mut self, count: usize, indexed: bool) -> Result<(), DeviceError> {
        if count % 3 != 0 {
            return Err(DeviceError::IncompleteTriangle(count));
        }
        let program_id = self.current_program.ok_or(DeviceError::NoProgramInUse)?;
        let vertex_array_id = self
            .bound_vertex_array
            .ok_or(DeviceError::NoVertexArrayBound)?;

        let entry = self.programs.get("program", program_id.0)?;
        let vertex_array = self.vertex_arrays.get("vertex array", vertex_array_id.0)?;
        let vertex_buffer = self
            .buffers
            .get("buffer", vertex_array.vertex_buffer.0)?;
        let inputs = Self::decode_vertices(&vertex_array.layout, &vertex_buffer.data);

        let indices: Vec<u32> = if indexed {
            let index_id = vertex_array
                .index_buffer
                .ok_or(DeviceError::MissingIndexBuffer)?;
            let index_buffer = self.buffers.get("buffer", index_id.0)?;
            let available = index_buffer.data.len() / 4;
            if count > available {
                return Err(DeviceError::DrawOutOfRange { count, available });
            }
            index_buffer.data[..count * 4]
                .chunks_exact(4)
                .map(bytemuck::pod_read_unaligned::<u32>)
                .collect()
        } else {
            if count > inputs.len() {
                return Err(DeviceError::DrawOutOfRange {
                    count,
                    available: inputs.len(),
                });
            }
            (0..count as u32).collect()
        };
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= inputs.len()) {
            return Err(DeviceError::IndexOutOfRange {
                index,
                vertex_count: inputs.len(),
            });
        }

        let texture = match self.bound_texture {
            Some(id) => Some(self.textures.get("texture", id.0)?),
            None => None,
        };

        let shaded: Vec<(Vector4<f32>, Varyings)> = inputs
            .par_iter()
            .map(|input| entry.program.vertex(&entry.uniforms, input))
            .collect();

        let bound = BoundProgram {
            program: entry.program.as_ref(),
            uniforms: &entry.uniforms,
            texture,
        };
        self.renderer.draw_triangles(&bound, &shaded, &indices);

        trace!(
            "{}: {} triangles from {} vertices",
            entry.program.label(),
            count / 3,
            inputs.len()
        );
        self.stats.draw_calls += 1;
        self.stats.triangles += count / 3;
        Ok(())
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, DeviceError> {
        let id = self.buffers.insert(BufferEntry {
            kind: descriptor.kind,
            usage: descriptor.usage,
            data: data.to_vec(),
        });
        debug!("buffer {} '{}': {} bytes", id, descriptor.label, data.len());
        Ok(BufferId(id))
    }

    fn write_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), DeviceError> {
        let entry = self.buffers.get_mut("buffer", id.0)?;
        if entry.usage == BufferUsage::Static {
            return Err(DeviceError::ImmutableBuffer(id));
        }
        entry.data.clear();
        entry.data.extend_from_slice(data);
        self.record(|| DeviceCommand::WriteBuffer {
            buffer: id,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn create_vertex_array(
        &mut self,
        layout: &VertexLayout,
        vertex_buffer: BufferId,
        index_buffer: Option<BufferId>,
    ) -> Result<VertexArrayId, DeviceError> {
        layout.validate()?;
        self.expect_kind(vertex_buffer, BufferKind::Vertex)?;
        if let Some(index_buffer) = index_buffer {
            self.expect_kind(index_buffer, BufferKind::Index)?;
        }

        let id = self.vertex_arrays.insert(VertexArrayEntry {
            layout: layout.clone(),
            vertex_buffer,
            index_buffer,
        });
        Ok(VertexArrayId(id))
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        data: &[u8],
    ) -> Result<TextureId, DeviceError> {
        let texture = Texture::new(descriptor, data)?;
        let id = self.textures.insert(texture);
        debug!(
            "texture {}: {}x{} {:?}",
            id, descriptor.width, descriptor.height, descriptor.format
        );
        Ok(TextureId(id))
    }

    fn create_program(
        &mut self,
        program: Box<dyn ShaderProgram>,
    ) -> Result<ProgramId, DeviceError> {
        let label = program.label().to_owned();
        let id = self.programs.insert(ProgramEntry {
            program,
            uniforms: Uniforms::default(),
        });
        debug!("program {} '{}'", id, label);
        Ok(ProgramId(id))
    }

    fn release(&mut self, resource: ResourceId) {
        let released = match resource {
            ResourceId::Buffer(id) => self.buffers.remove(id.0),
            ResourceId::VertexArray(id) => {
                if self.bound_vertex_array == Some(id) {
                    self.bound_vertex_array = None;
                }
                self.vertex_arrays.remove(id.0)
            }
            ResourceId::Texture(id) => {
                if self.bound_texture == Some(id) {
                    self.bound_texture = None;
                }
                self.textures.remove(id.0)
            }
            ResourceId::Program(id) => {
                if self.current_program == Some(id) {
                    self.current_program = None;
                }
                self.programs.remove(id.0)
            }
        };
        if released {
            trace!("released {:?}", resource);
        } else {
            debug!("release of unknown {:?} ignored", resource);
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), DeviceError> {
        if let Some(id) = program {
            self.programs.get("program", id.0)?;
        }
        self.current_program = program;
        self.record(|| DeviceCommand::UseProgram(program));
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), DeviceError> {
        let program = self.current_program.ok_or(DeviceError::NoProgramInUse)?;
        self.programs
            .get_mut("program", program.0)?
            .uniforms
            .set(name, value);
        self.record(|| DeviceCommand::SetUniform {
            program,
            name: name.to_owned(),
            value,
        });
        Ok(())
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), DeviceError> {
        if let Some(id) = texture {
            self.textures.get("texture", id.0)?;
        }
        self.bound_texture = texture;
        self.record(|| DeviceCommand::BindTexture(texture));
        Ok(())
    }

    fn bind_vertex_array(
        &mut self,
        vertex_array: Option<VertexArrayId>,
    ) -> Result<(), DeviceError> {
        if let Some(id) = vertex_array {
            self.vertex_arrays.get("vertex array", id.0)?;
        }
        self.bound_vertex_array = vertex_array;
        self.record(|| DeviceCommand::BindVertexArray(vertex_array));
        Ok(())
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.renderer.rasterizer.depth_test = enabled;
        self.record(|| DeviceCommand::SetDepthTest(enabled));
    }

    fn depth_test_enabled(&self) -> bool {
        self.renderer.rasterizer.depth_test
    }

    fn set_blending(&mut self, enabled: bool) {
        self.renderer.rasterizer.blend = enabled;
        self.record(|| DeviceCommand::SetBlending(enabled));
    }

    fn blending_enabled(&self) -> bool {
        self.renderer.rasterizer.blend
    }

    fn clear(&mut self, color: Vector3<f32>) {
        self.renderer.clear(color);
        self.record(|| DeviceCommand::Clear(color));
    }

    fn draw_elements(&mut self, count: usize) -> Result<(), DeviceError> {
        self.submit(count, true)?;
        self.record(|| DeviceCommand::DrawElements { count });
        Ok(())
    }

    fn draw_arrays(&mut self, count: usize) -> Result<(), DeviceError> {
        self.submit(count, false)?;
        self.record(|| DeviceCommand::DrawArrays { count });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::layout::VertexAttribute;
    use nalgebra::Matrix4;

    /// Passes location 0 straight through as clip position, paints uniform "tint".
    struct PassThrough;

    impl ShaderProgram for PassThrough {
        fn label(&self) -> &str {
            "pass-through"
        }

        fn vertex(&self, _: &Uniforms, input: &VertexInput) -> (Vector4<f32>, Varyings) {
            let p = input.vec3(0);
            (Vector4::new(p.x, p.y, p.z, 1.0), Varyings::default())
        }

        fn fragment(
            &self,
            uniforms: &Uniforms,
            _: Option<&Texture>,
            _: &Varyings,
        ) -> Option<Vector4<f32>> {
            let tint = uniforms.vec3("tint");
            Some(Vector4::new(tint.x, tint.y, tint.z, 1.0))
        }
    }

    fn position_layout() -> VertexLayout {
        VertexLayout::new(
            12,
            vec![VertexAttribute {
                location: 0,
                components: 3,
                offset: 0,
            }],
        )
    }

    fn full_screen_quad(device: &mut SoftwareDevice) -> VertexArrayId {
        let positions: [f32; 12] = [
            -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0,
        ];
        let indices: [u32; 6] = [0, 1, 2, 2, 3, 0];
        let vbo = device
            .create_buffer(
                &BufferDescriptor {
                    label: "quad",
                    kind: BufferKind::Vertex,
                    usage: BufferUsage::Static,
                },
                bytemuck::cast_slice(&positions),
            )
            .unwrap();
        let ebo = device
            .create_buffer(
                &BufferDescriptor {
                    label: "quad",
                    kind: BufferKind::Index,
                    usage: BufferUsage::Static,
                },
                bytemuck::cast_slice(&indices),
            )
            .unwrap();
        device
            .create_vertex_array(&position_layout(), vbo, Some(ebo))
            .unwrap()
    }

    #[test]
    fn indexed_draw_fills_the_target_with_the_uniform_color() {
        let mut device = SoftwareDevice::new(4, 4, 1);
        let vao = full_screen_quad(&mut device);
        let program = device.create_program(Box::new(PassThrough)).unwrap();

        device.use_program(Some(program)).unwrap();
        device
            .set_uniform("tint", UniformValue::Vec3(Vector3::new(0.0, 1.0, 0.0)))
            .unwrap();
        device.bind_vertex_array(Some(vao)).unwrap();
        device.draw_elements(6).unwrap();

        assert_eq!(device.pixel(0, 0), Some(Vector3::new(0.0, 1.0, 0.0)));
        assert_eq!(device.pixel(3, 3), Some(Vector3::new(0.0, 1.0, 0.0)));
        assert_eq!(
            device.stats(),
            DrawStats {
                draw_calls: 1,
                triangles: 2
            }
        );
    }

    #[test]
    fn uniforms_persist_per_program() {
        let mut device = SoftwareDevice::new(1, 1, 1);
        let a = device.create_program(Box::new(PassThrough)).unwrap();
        let b = device.create_program(Box::new(PassThrough)).unwrap();
        device.use_program(Some(a)).unwrap();
        device
            .set_uniform("model", UniformValue::Mat4(Matrix4::identity()))
            .unwrap();
        device.use_program(Some(b)).unwrap();

        assert_eq!(
            device.uniform(a, "model"),
            Some(UniformValue::Mat4(Matrix4::identity()))
        );
        assert_eq!(device.uniform(b, "model"), None);
    }

    #[test]
    fn draw_state_errors_are_reported() {
        let mut device = SoftwareDevice::new(1, 1, 1);
        assert_eq!(device.draw_elements(3), Err(DeviceError::NoProgramInUse));
        assert_eq!(
            device.set_uniform("x", UniformValue::Float(1.0)),
            Err(DeviceError::NoProgramInUse)
        );

        let vao = full_screen_quad(&mut device);
        let program = device.create_program(Box::new(PassThrough)).unwrap();
        device.use_program(Some(program)).unwrap();
        assert_eq!(device.draw_elements(3), Err(DeviceError::NoVertexArrayBound));

        device.bind_vertex_array(Some(vao)).unwrap();
        assert_eq!(
            device.draw_elements(9),
            Err(DeviceError::DrawOutOfRange {
                count: 9,
                available: 6
            })
        );
        assert_eq!(device.draw_elements(4), Err(DeviceError::IncompleteTriangle(4)));
    }

    #[test]
    fn static_buffers_reject_rewrites() {
        let mut device = SoftwareDevice::new(1, 1, 1);
        let id = device
            .create_buffer(
                &BufferDescriptor {
                    label: "static",
                    kind: BufferKind::Vertex,
                    usage: BufferUsage::Static,
                },
                &[0; 12],
            )
            .unwrap();
        assert_eq!(
            device.write_buffer(id, &[0; 12]),
            Err(DeviceError::ImmutableBuffer(id))
        );
    }

    #[test]
    fn vertex_array_requires_matching_buffer_kinds() {
        let mut device = SoftwareDevice::new(1, 1, 1);
        let index = device
            .create_buffer(
                &BufferDescriptor {
                    label: "indices",
                    kind: BufferKind::Index,
                    usage: BufferUsage::Static,
                },
                &[0; 12],
            )
            .unwrap();
        assert_eq!(
            device.create_vertex_array(&position_layout(), index, None),
            Err(DeviceError::WrongBufferKind {
                id: index,
                expected: BufferKind::Vertex,
                actual: BufferKind::Index
            })
        );
    }

    #[test]
    fn release_unbinds_and_frees() {
        let mut device = SoftwareDevice::new(1, 1, 1);
        let vao = full_screen_quad(&mut device);
        device.bind_vertex_array(Some(vao)).unwrap();
        assert_eq!(device.live_resources(), 3);

        device.release(vao.into());
        assert_eq!(device.live_resources(), 2);
        assert_eq!(
            device.bind_vertex_array(Some(vao)),
            Err(DeviceError::UnknownResource {
                kind: "vertex array",
                id: vao.0
            })
        );
        device.release(vao.into());
    }
}
