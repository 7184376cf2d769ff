use crate::core::geometry::Vertex;
use crate::gpu::device::DeviceError;
use std::mem::{offset_of, size_of};

/// Highest attribute location + 1 a layout may use.
pub const MAX_ATTRIBUTES: usize = 4;

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: usize,
    /// Number of f32 components (1..=4).
    pub components: usize,
    /// Byte offset inside one vertex.
    pub offset: usize,
}

/// Maps raw vertex bytes to shader attribute locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(stride: usize, attributes: Vec<VertexAttribute>) -> Self {
        Self { stride, attributes }
    }

    /// Position (location 0) and color (location 1) of a [`Vertex`].
    pub fn flat() -> Self {
        Self::new(
            size_of::<Vertex>(),
            vec![
                VertexAttribute {
                    location: 0,
                    components: 3,
                    offset: offset_of!(Vertex, position),
                },
                VertexAttribute {
                    location: 1,
                    components: 3,
                    offset: offset_of!(Vertex, color),
                },
            ],
        )
    }

    /// Position (0), texture coordinate (1) and normal (2) of a [`Vertex`].
    pub fn lit_textured() -> Self {
        Self::new(
            size_of::<Vertex>(),
            vec![
                VertexAttribute {
                    location: 0,
                    components: 3,
                    offset: offset_of!(Vertex, position),
                },
                VertexAttribute {
                    location: 1,
                    components: 2,
                    offset: offset_of!(Vertex, texture_coordinate),
                },
                VertexAttribute {
                    location: 2,
                    components: 3,
                    offset: offset_of!(Vertex, normal),
                },
            ],
        )
    }

    /// Screen-space glyph vertices packed as `vec4(x, y, u, v)` at location 0.
    pub fn text() -> Self {
        Self::new(
            4 * size_of::<f32>(),
            vec![VertexAttribute {
                location: 0,
                components: 4,
                offset: 0,
            }],
        )
    }

    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.stride == 0 {
            return Err(DeviceError::InvalidLayout("stride is zero".into()));
        }
        let mut seen = [false; MAX_ATTRIBUTES];
        for attribute in &self.attributes {
            if attribute.location >= MAX_ATTRIBUTES {
                return Err(DeviceError::InvalidLayout(format!(
                    "location {} exceeds {}",
                    attribute.location,
                    MAX_ATTRIBUTES - 1
                )));
            }
            if std::mem::replace(&mut seen[attribute.location], true) {
                return Err(DeviceError::InvalidLayout(format!(
                    "location {} declared twice",
                    attribute.location
                )));
            }
            if !(1..=4).contains(&attribute.components) {
                return Err(DeviceError::InvalidLayout(format!(
                    "location {} has {} components",
                    attribute.location, attribute.components
                )));
            }
            if attribute.offset + attribute.components * size_of::<f32>() > self.stride {
                return Err(DeviceError::InvalidLayout(format!(
                    "location {} reads past the {}-byte stride",
                    attribute.location, self.stride
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_layouts_are_valid() {
        assert_eq!(VertexLayout::flat().validate(), Ok(()));
        assert_eq!(VertexLayout::lit_textured().validate(), Ok(()));
        assert_eq!(VertexLayout::text().validate(), Ok(()));
    }

    #[test]
    fn layouts_span_the_whole_vertex() {
        assert_eq!(VertexLayout::flat().stride, 44);
        let lit = VertexLayout::lit_textured();
        assert_eq!(lit.attributes[1].offset, 36);
        assert_eq!(lit.attributes[2].offset, 12);
    }

    #[test]
    fn overlapping_stride_is_rejected() {
        let layout = VertexLayout::new(
            8,
            vec![VertexAttribute {
                location: 0,
                components: 3,
                offset: 0,
            }],
        );
        assert!(matches!(
            layout.validate(),
            Err(DeviceError::InvalidLayout(_))
        ));
    }
}
