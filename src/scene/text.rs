use crate::core::math::transform::TransformFactory;
use crate::error::RenderError;
use crate::gpu::device::{
    BufferDescriptor, BufferId, BufferKind, BufferUsage, ProgramId, SharedDevice, TextureId,
    VertexArrayId,
};
use crate::gpu::layout::VertexLayout;
use crate::gpu::program::UniformValue;
use crate::gpu::resource::GpuResource;
use crate::gpu::texture::{TextureDescriptor, TextureFormat, WrapMode};
use crate::scene::drawable::{Capabilities, Drawable, FrameContext, borrow_device};
use crate::scene::glyph::GlyphRasterizer;
use log::{debug, warn};
use nalgebra::{Matrix4, Vector2, Vector3};
use std::collections::HashMap;
use std::fmt;

/// Characters baked into the atlas.
const PRINTABLE_ASCII: std::ops::RangeInclusive<char> = ' '..='~';
const QUAD_VERTICES: usize = 6;

struct Character {
    texture: GpuResource<TextureId>,
    size: Vector2<f32>,
    bearing: Vector2<f32>,
    advance: f32,
}

/// Screen-space placement of one character, `y` up from the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub ch: char,
    /// Pen position before this character.
    pub pen_x: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl GlyphQuad {
    /// Two counter-clockwise triangles packed as `(x, y, u, v)`.
    fn vertices(&self) -> [[f32; 4]; QUAD_VERTICES] {
        let (x0, y0) = (self.x, self.y);
        let (x1, y1) = (self.x + self.width, self.y + self.height);
        [
            [x0, y1, 0.0, 0.0],
            [x0, y0, 0.0, 1.0],
            [x1, y0, 1.0, 1.0],
            [x0, y1, 0.0, 0.0],
            [x1, y0, 1.0, 1.0],
            [x1, y1, 1.0, 0.0],
        ]
    }
}

/// Screen-space text drawn from a per-character glyph atlas.
///
/// Every glyph is its own single-channel texture. Drawing uploads one quad
/// per character into a dynamic buffer, with blending on and depth test off.
pub struct TextRenderer {
    device: SharedDevice,
    characters: HashMap<char, Character>,
    quad_array: GpuResource<VertexArrayId>,
    quad_buffer: GpuResource<BufferId>,
    program: Option<ProgramId>,
    text: String,
    position: Vector2<f32>,
    scale: f32,
    color: Vector3<f32>,
    projection: Matrix4<f32>,
}

impl fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextRenderer")
            .field("text", &self.text)
            .field("position", &self.position)
            .field("glyphs", &self.characters.len())
            .finish()
    }
}

impl TextRenderer {
    /// Bakes printable ASCII at `pixel_size` and sets up the quad buffer.
    /// `screen` is the `(width, height)` the orthographic projection spans.
    pub fn new(
        device: &SharedDevice,
        text: impl Into<String>,
        rasterizer: &dyn GlyphRasterizer,
        pixel_size: f32,
        color: Vector3<f32>,
        program: ProgramId,
        screen: (f32, f32),
    ) -> Result<Self, RenderError> {
        let mut characters = HashMap::new();
        for ch in PRINTABLE_ASCII {
            let glyph = rasterizer.rasterize(ch, pixel_size);
            let id = borrow_device(device)?.create_texture(
                &TextureDescriptor {
                    width: glyph.width,
                    height: glyph.height,
                    format: TextureFormat::R8,
                    wrap: WrapMode::ClampToEdge,
                },
                &glyph.coverage,
            )?;
            characters.insert(
                ch,
                Character {
                    texture: GpuResource::new(device, id),
                    size: Vector2::new(glyph.width as f32, glyph.height as f32),
                    bearing: Vector2::new(glyph.bearing_x as f32, glyph.bearing_y as f32),
                    advance: glyph.advance,
                },
            );
        }

        let buffer_id = borrow_device(device)?.create_buffer(
            &BufferDescriptor {
                label: "glyph quad",
                kind: BufferKind::Vertex,
                usage: BufferUsage::Dynamic,
            },
            &[0; QUAD_VERTICES * 4 * size_of::<f32>()],
        )?;
        let quad_buffer = GpuResource::new(device, buffer_id);
        let array_id =
            borrow_device(device)?.create_vertex_array(&VertexLayout::text(), buffer_id, None)?;
        let quad_array = GpuResource::new(device, array_id);
        debug!("glyph atlas: {} characters at {}px", characters.len(), pixel_size);

        let (width, height) = screen;
        let renderer = Self {
            device: device.clone(),
            characters,
            quad_array,
            quad_buffer,
            program: Some(program),
            text: text.into(),
            position: Vector2::zeros(),
            scale: 1.0,
            color,
            projection: TransformFactory::orthographic(0.0, width, 0.0, height, -1.0, 1.0),
        };
        renderer.warn_missing_glyphs();
        Ok(renderer)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the displayed string. Nothing is uploaded until the next draw.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.warn_missing_glyphs();
    }

    fn warn_missing_glyphs(&self) {
        let missing: String = self
            .text
            .chars()
            .filter(|ch| !self.characters.contains_key(ch))
            .collect();
        if !missing.is_empty() {
            warn!("no glyphs for {:?} in {:?}, they will not be drawn", missing, self.text);
        }
    }

    /// Baseline origin of the first character, in pixels from the bottom-left corner.
    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector2<f32>) {
        self.position = position;
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }

    pub fn set_color(&mut self, color: Vector3<f32>) {
        self.color = color;
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn set_program(&mut self, program: ProgramId) {
        self.program = Some(program);
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Lays out the current text left to right. Characters outside the
    /// atlas are skipped without advancing the pen.
    pub fn layout(&self) -> Vec<GlyphQuad> {
        let mut pen_x = self.position.x;
        self.text
            .chars()
            .filter_map(|ch| {
                let glyph = self.characters.get(&ch)?;
                let quad = GlyphQuad {
                    ch,
                    pen_x,
                    x: pen_x + glyph.bearing.x * self.scale,
                    y: self.position.y - (glyph.size.y - glyph.bearing.y) * self.scale,
                    width: glyph.size.x * self.scale,
                    height: glyph.size.y * self.scale,
                };
                pen_x += glyph.advance * self.scale;
                Some(quad)
            })
            .collect()
    }
}

impl Drawable for TextRenderer {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_texture: true,
            has_lighting: false,
        }
    }

    fn draw(&self, _frame: &FrameContext<'_>) -> Result<(), RenderError> {
        let program = self.program.ok_or(RenderError::ProgramNotSet("text renderer"))?;
        let quads = self.layout();
        let mut device = borrow_device(&self.device)?;

        let depth_test = device.depth_test_enabled();
        let blending = device.blending_enabled();
        device.set_blending(true);
        device.set_depth_test(false);

        device.use_program(Some(program))?;
        device.set_uniform("projection", UniformValue::Mat4(self.projection))?;
        device.set_uniform("textColor", UniformValue::Vec3(self.color))?;
        device.bind_vertex_array(Some(self.quad_array.handle()))?;

        for quad in &quads {
            // `layout` only yields characters from the atlas.
            let Some(glyph) = self.characters.get(&quad.ch) else {
                continue;
            };
            device.bind_texture(Some(glyph.texture.handle()))?;
            device.write_buffer(
                self.quad_buffer.handle(),
                bytemuck::cast_slice(&quad.vertices()),
            )?;
            device.draw_arrays(QUAD_VERTICES)?;
        }

        device.bind_vertex_array(None)?;
        device.bind_texture(None)?;
        device.use_program(None)?;
        device.set_depth_test(depth_test);
        device.set_blending(blending);
        Ok(())
    }
}
