use crate::error::AssetError;
use log::info;
use std::fs;
use std::path::Path;

/// One rasterized character, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    /// Offset from the pen to the left edge of the bitmap.
    pub bearing_x: i32,
    /// Offset from the baseline up to the top row of the bitmap.
    pub bearing_y: i32,
    /// Horizontal pen advance to the next character.
    pub advance: f32,
    /// Row-major coverage, top row first, `width * height` bytes.
    pub coverage: Vec<u8>,
}

/// Turns characters into coverage bitmaps.
pub trait GlyphRasterizer {
    fn rasterize(&self, ch: char, pixel_size: f32) -> Glyph;
}

/// Outline fonts (TTF/OTF) through `fontdue`.
pub struct FontdueRasterizer {
    font: fontdue::Font,
}

impl FontdueRasterizer {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let font = parse_font(bytes).map_err(|message| AssetError::FontData(message.into()))?;
        Ok(Self { font })
    }

    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let bytes = fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = parse_font(&bytes).map_err(|message| AssetError::Font {
            path: path.to_path_buf(),
            message: message.into(),
        })?;
        info!("loaded font {}", path.display());
        Ok(Self { font })
    }
}

fn parse_font(bytes: &[u8]) -> Result<fontdue::Font, &'static str> {
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
}

impl GlyphRasterizer for FontdueRasterizer {
    fn rasterize(&self, ch: char, pixel_size: f32) -> Glyph {
        let (metrics, coverage) = self.font.rasterize(ch, pixel_size);
        Glyph {
            width: metrics.width as u32,
            height: metrics.height as u32,
            bearing_x: metrics.xmin,
            bearing_y: metrics.ymin + metrics.height as i32,
            advance: metrics.advance_width,
            coverage,
        }
    }
}

/// Built-in monospace glyphs: every visible character is an outlined box.
///
/// Used when no font file is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockGlyphs;

impl GlyphRasterizer for BlockGlyphs {
    fn rasterize(&self, ch: char, pixel_size: f32) -> Glyph {
        let advance = (pixel_size * 0.6).round();
        if ch.is_whitespace() || ch.is_control() {
            return Glyph {
                width: 0,
                height: 0,
                bearing_x: 0,
                bearing_y: 0,
                advance,
                coverage: Vec::new(),
            };
        }

        let width = (pixel_size * 0.5).round().max(1.0) as u32;
        let height = (pixel_size * 0.7).round().max(1.0) as u32;
        let stroke = (pixel_size / 16.0).ceil().max(1.0) as u32;
        let coverage = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| {
                let edge = x < stroke || y < stroke || x + stroke >= width || y + stroke >= height;
                if edge { 255 } else { 0 }
            })
            .collect();

        Glyph {
            width,
            height,
            bearing_x: ((advance - width as f32) / 2.0).floor() as i32,
            bearing_y: height as i32,
            advance,
            coverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_glyphs_are_monospace() {
        let a = BlockGlyphs.rasterize('A', 64.0);
        let space = BlockGlyphs.rasterize(' ', 64.0);
        assert_eq!(a.advance, space.advance);
        assert_eq!(a.coverage.len(), (a.width * a.height) as usize);
        assert!(space.coverage.is_empty());
    }

    #[test]
    fn block_glyph_outline_is_hollow() {
        let glyph = BlockGlyphs.rasterize('x', 32.0);
        let center = (glyph.height / 2 * glyph.width + glyph.width / 2) as usize;
        assert_eq!(glyph.coverage[0], 255);
        assert_eq!(glyph.coverage[center], 0);
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        assert!(matches!(
            FontdueRasterizer::from_bytes(b"not a font"),
            Err(AssetError::FontData(_))
        ));
    }
}
