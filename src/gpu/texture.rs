use crate::gpu::device::DeviceError;
use nalgebra::Vector4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single channel, sampled as `(r, 0, 0, 1)`.
    R8,
    Rgb8,
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub wrap: WrapMode,
}

/// A 2D texture resident on the software device.
///
/// Row 0 of `data` is sampled at `v = 0`.
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub wrap: WrapMode,
    data: Vec<u8>,
}

impl Texture {
    pub fn new(descriptor: &TextureDescriptor, data: &[u8]) -> Result<Self, DeviceError> {
        let expected = descriptor.width as usize
            * descriptor.height as usize
            * descriptor.format.bytes_per_pixel();
        if data.len() != expected {
            return Err(DeviceError::TextureSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width: descriptor.width,
            height: descriptor.height,
            format: descriptor.format,
            wrap: descriptor.wrap,
            data: data.to_vec(),
        })
    }

    /// Bilinear sample at UV coordinates.
    pub fn sample(&self, u: f32, v: f32) -> Vector4<f32> {
        if self.width == 0 || self.height == 0 {
            return Vector4::new(0.0, 0.0, 0.0, 1.0);
        }
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;

        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let wx = x - x.floor();
        let wy = y - y.floor();

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let top = c00 * (1.0 - wx) + c10 * wx;
        let bottom = c01 * (1.0 - wx) + c11 * wx;
        top * (1.0 - wy) + bottom * wy
    }

    /// Texel fetch with the texture's wrap mode applied to out-of-range coordinates.
    pub fn texel(&self, x: i64, y: i64) -> Vector4<f32> {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = match self.wrap {
            WrapMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
            WrapMode::ClampToEdge => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        };

        let bpp = self.format.bytes_per_pixel();
        let start = (y as usize * self.width as usize + x as usize) * bpp;
        let px = &self.data[start..start + bpp];
        let channel = |i: usize| px[i] as f32 / 255.0;
        match self.format {
            TextureFormat::R8 => Vector4::new(channel(0), 0.0, 0.0, 1.0),
            TextureFormat::Rgb8 => Vector4::new(channel(0), channel(1), channel(2), 1.0),
            TextureFormat::Rgba8 => Vector4::new(channel(0), channel(1), channel(2), channel(3)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(wrap: WrapMode) -> Texture {
        let descriptor = TextureDescriptor {
            width: 2,
            height: 1,
            format: TextureFormat::R8,
            wrap,
        };
        Texture::new(&descriptor, &[0, 255]).unwrap()
    }

    #[test]
    fn rejects_mismatched_data() {
        let descriptor = TextureDescriptor {
            width: 2,
            height: 2,
            format: TextureFormat::Rgb8,
            wrap: WrapMode::Repeat,
        };
        assert_eq!(
            Texture::new(&descriptor, &[0; 5]).unwrap_err(),
            DeviceError::TextureSize {
                expected: 12,
                actual: 5
            }
        );
    }

    #[test]
    fn repeat_wraps_and_clamp_saturates() {
        assert_eq!(checker(WrapMode::Repeat).texel(2, 0).x, 0.0);
        assert_eq!(checker(WrapMode::ClampToEdge).texel(2, 0).x, 1.0);
    }

    #[test]
    fn texel_centers_sample_exactly() {
        let texture = checker(WrapMode::ClampToEdge);
        assert_eq!(texture.sample(0.25, 0.5).x, 0.0);
        assert_eq!(texture.sample(0.75, 0.5).x, 1.0);
        assert!((texture.sample(0.5, 0.5).x - 0.5).abs() < 1e-6);
    }
}
