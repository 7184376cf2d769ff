use image::{Rgb, RgbImage};
use nalgebra::{Vector3, Vector4};
use std::cell::UnsafeCell;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

const LOCK_STRIPES: usize = 1024;

/// Color and depth storage for one render target.
///
/// Shared across the rayon pixel loop: depth is kept as atomic `f32` bits and
/// color writes are guarded by striped locks.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub sample_count: usize,
    pub buffer_width: usize,
    pub buffer_height: usize,

    /// Color samples. Only touched while holding the stripe lock of the pixel.
    color_buffer: UnsafeCell<Vec<Vector3<f32>>>,

    /// Depth samples stored as atomic bits of f32, cleared to +inf.
    depth_buffer: Vec<AtomicU32>,

    locks: Vec<Mutex<()>>,
}

// Color access is serialized per pixel by `locks`, depth by atomics.
unsafe impl Sync for FrameBuffer {}

impl FrameBuffer {
    /// `sample_count` is the SSAA factor per axis (1 disables supersampling).
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        let sample_count = sample_count.max(1);
        let buffer_width = width * sample_count;
        let buffer_height = height * sample_count;
        let size = buffer_width * buffer_height;

        let inf_bits = f32::INFINITY.to_bits();
        let depth_buffer = (0..size).map(|_| AtomicU32::new(inf_bits)).collect();
        let locks = (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect();

        Self {
            width,
            height,
            sample_count,
            buffer_width,
            buffer_height,
            color_buffer: UnsafeCell::new(vec![Vector3::zeros(); size]),
            depth_buffer,
            locks,
        }
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.buffer_width && y < self.buffer_height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.buffer_width + x
    }

    /// Resets every color sample to `color` and every depth sample to +inf.
    pub fn clear(&mut self, color: Vector3<f32>) {
        self.color_buffer.get_mut().fill(color);
        let inf_bits = f32::INFINITY.to_bits();
        for depth in &self.depth_buffer {
            depth.store(inf_bits, Ordering::Relaxed);
        }
    }

    /// Depth test (LESS) with write on success.
    #[inline]
    pub fn depth_test_and_update(&self, x: usize, y: usize, new_depth: f32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let depth_atomic = &self.depth_buffer[self.index(x, y)];
        let new_bits = new_depth.to_bits();

        let mut current_bits = depth_atomic.load(Ordering::Relaxed);
        loop {
            if new_depth >= f32::from_bits(current_bits) {
                return false;
            }
            match depth_atomic.compare_exchange_weak(
                current_bits,
                new_bits,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(updated_bits) => current_bits = updated_bits,
            }
        }
    }

    /// Depth of one sample, +inf when nothing was drawn there.
    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let bits = self.depth_buffer[self.index(x, y)].load(Ordering::Relaxed);
        Some(f32::from_bits(bits))
    }

    /// Overwrites one sample.
    #[inline]
    pub fn set_pixel_safe(&self, x: usize, y: usize, color: Vector3<f32>) {
        self.with_sample(x, y, |sample| *sample = color);
    }

    /// Source-over blend (`src * a + dst * (1 - a)`) into one sample.
    #[inline]
    pub fn blend_pixel_safe(&self, x: usize, y: usize, rgba: Vector4<f32>) {
        let alpha = rgba.w.clamp(0.0, 1.0);
        self.with_sample(x, y, |sample| {
            *sample = rgba.xyz() * alpha + *sample * (1.0 - alpha);
        });
    }

    fn with_sample(&self, x: usize, y: usize, write: impl FnOnce(&mut Vector3<f32>)) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        let _guard = self.locks[idx % self.locks.len()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // SAFETY: the stripe lock for `idx` is held.
        unsafe {
            let buffer = &mut *self.color_buffer.get();
            write(&mut buffer[idx]);
        }
    }

    /// Resolved (sample-averaged) color of an output pixel.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }

        // Reads happen between draws, never concurrently with the pixel loop.
        let buffer = unsafe { &*self.color_buffer.get() };

        let mut sum_color = Vector3::zeros();
        let start_x = x * self.sample_count;
        let start_y = y * self.sample_count;
        for dy in 0..self.sample_count {
            for dx in 0..self.sample_count {
                sum_color += buffer[self.index(start_x + dx, start_y + dy)];
            }
        }

        let samples = (self.sample_count * self.sample_count) as f32;
        Some(sum_color / samples)
    }

    /// Resolves the whole target into an 8-bit RGB image.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let color = self
                .get_pixel(x as usize, y as usize)
                .unwrap_or_else(Vector3::zeros);
            Rgb([
                (color.x.clamp(0.0, 1.0) * 255.0).round() as u8,
                (color.y.clamp(0.0, 1.0) * 255.0).round() as u8,
                (color.z.clamp(0.0, 1.0) * 255.0).round() as u8,
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_test_keeps_nearest() {
        let fb = FrameBuffer::new(2, 2, 1);
        assert!(fb.depth_test_and_update(0, 0, 0.5));
        assert!(!fb.depth_test_and_update(0, 0, 0.7));
        assert!(fb.depth_test_and_update(0, 0, 0.2));
        assert_eq!(fb.depth(0, 0), Some(0.2));
    }

    #[test]
    fn blending_mixes_with_destination() {
        let mut fb = FrameBuffer::new(1, 1, 1);
        fb.clear(Vector3::new(0.0, 0.0, 1.0));
        fb.blend_pixel_safe(0, 0, Vector4::new(1.0, 0.0, 0.0, 0.25));
        let color = fb.get_pixel(0, 0).unwrap();
        assert!((color.x - 0.25).abs() < 1e-6);
        assert!((color.z - 0.75).abs() < 1e-6);
    }

    #[test]
    fn supersampled_pixels_are_averaged() {
        let fb = FrameBuffer::new(1, 1, 2);
        fb.set_pixel_safe(0, 0, Vector3::new(1.0, 1.0, 1.0));
        fb.set_pixel_safe(1, 1, Vector3::new(1.0, 1.0, 1.0));
        let color = fb.get_pixel(0, 0).unwrap();
        assert!((color.x - 0.5).abs() < 1e-6);
    }
}
