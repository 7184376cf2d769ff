use crate::core::framebuffer::FrameBuffer;
use crate::core::math::transform::{apply_perspective_division, ndc_to_screen};
use crate::core::pipeline::Shader;
use nalgebra::{Point2, Vector3, Vector4};
use rayon::prelude::*;

const EPSILON: f32 = 1e-5;

/// Which triangle facing is discarded. Front faces are counter-clockwise.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub enum CullMode {
    Back,
    Front,
    #[default]
    None,
}

/// Draws clip-space triangles onto a [`FrameBuffer`] with fixed-function state.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    pub cull_mode: CullMode,
    /// Depth test (LESS) with depth writes. Disabling it disables writes too.
    pub depth_test: bool,
    /// Source-over alpha blending of fragment colors.
    pub blend: bool,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

// Clip planes as (axis, sign): sign * p[axis] <= p.w
const CLIP_PLANES: [(usize, f32); 6] = [
    (0, 1.0),
    (0, -1.0),
    (1, 1.0),
    (1, -1.0),
    (2, 1.0),
    (2, -1.0),
];

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            cull_mode: CullMode::None,
            depth_test: true,
            blend: false,
        }
    }

    /// Clips a triangle against the view frustum (Sutherland–Hodgman in
    /// homogeneous clip space) and shades the resulting fan.
    pub fn rasterize_triangle<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        let mut polygon: Vec<(Vector4<f32>, S::Varying)> = Vec::with_capacity(16);
        let mut scratch: Vec<(Vector4<f32>, S::Varying)> = Vec::with_capacity(16);
        polygon.extend(clip_coords.iter().copied().zip(varyings.iter().copied()));

        for &(axis, sign) in &CLIP_PLANES {
            if polygon.is_empty() {
                return;
            }
            clip_against_plane::<S>(&polygon, &mut scratch, axis, sign);
            std::mem::swap(&mut polygon, &mut scratch);
        }

        if polygon.len() < 3 {
            return;
        }
        let anchor = polygon[0];
        for pair in polygon[1..].windows(2) {
            self.rasterize_clipped(
                framebuffer,
                shader,
                &[anchor.0, pair[0].0, pair[1].0],
                &[anchor.1, pair[0].1, pair[1].1],
            );
        }
    }

    /// Perspective division, viewport transform, culling and the pixel loop
    /// for a triangle already inside the frustum.
    fn rasterize_clipped<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        let width = framebuffer.buffer_width as f32;
        let height = framebuffer.buffer_height as f32;

        let mut screen = [Point2::origin(); 3];
        let mut w_values = [0.0; 3];
        for i in 0..3 {
            if clip_coords[i].w.abs() < 1e-6 {
                return;
            }
            let ndc = apply_perspective_division(&clip_coords[i]);
            w_values[i] = clip_coords[i].w;
            screen[i] = ndc_to_screen(ndc.x, ndc.y, width, height);
        }

        // Screen Y points down, so counter-clockwise triangles have negative area here.
        let e1 = screen[1] - screen[0];
        let e2 = screen[2] - screen[1];
        let signed_area = e1.x * e2.y - e1.y * e2.x;
        match self.cull_mode {
            CullMode::Back if signed_area >= 0.0 => return,
            CullMode::Front if signed_area <= 0.0 => return,
            _ => {}
        }

        let min_x = screen.iter().map(|p| p.x).fold(f32::MAX, f32::min).floor() as i32;
        let min_y = screen.iter().map(|p| p.y).fold(f32::MAX, f32::min).floor() as i32;
        let max_x = screen.iter().map(|p| p.x).fold(f32::MIN, f32::max).ceil() as i32;
        let max_y = screen.iter().map(|p| p.y).fold(f32::MIN, f32::max).ceil() as i32;
        if max_x < 0
            || max_y < 0
            || min_x >= framebuffer.buffer_width as i32
            || min_y >= framebuffer.buffer_height as i32
        {
            return;
        }
        let start_x = min_x.max(0) as usize;
        let end_x = max_x.min(framebuffer.buffer_width as i32 - 1) as usize;
        let start_y = min_y.max(0) as usize;
        let end_y = max_y.min(framebuffer.buffer_height as i32 - 1) as usize;

        (start_y..=end_y).into_par_iter().for_each(|y| {
            for x in start_x..=end_x {
                let center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                let Some(bary) = barycentric(center, &screen) else {
                    continue;
                };
                if bary.x < -EPSILON || bary.y < -EPSILON || bary.z < -EPSILON {
                    continue;
                }
                let Some(weights) = perspective_correct(bary, &w_values) else {
                    continue;
                };

                // NDC depth is affine in screen space.
                let z_ndc = bary.x * clip_coords[0].z / w_values[0]
                    + bary.y * clip_coords[1].z / w_values[1]
                    + bary.z * clip_coords[2].z / w_values[2];
                let depth = z_ndc * 0.5 + 0.5;

                if self.depth_test && !framebuffer.depth_test_and_update(x, y, depth) {
                    continue;
                }

                let varying =
                    varyings[0] * weights.x + varyings[1] * weights.y + varyings[2] * weights.z;
                let Some(color) = shader.fragment(varying) else {
                    continue;
                };

                if self.blend {
                    framebuffer.blend_pixel_safe(x, y, color);
                } else {
                    framebuffer.set_pixel_safe(x, y, color.xyz());
                }
            }
        });
    }
}

/// Clips a polygon against one plane, writing the result into `output`.
fn clip_against_plane<S: Shader>(
    input: &[(Vector4<f32>, S::Varying)],
    output: &mut Vec<(Vector4<f32>, S::Varying)>,
    axis: usize,
    sign: f32,
) {
    output.clear();
    let Some(&last) = input.last() else {
        return;
    };
    let inside = |p: &Vector4<f32>| sign * p[axis] <= p.w + 1e-6;

    let mut prev = last;
    let mut prev_inside = inside(&prev.0);
    for &curr in input {
        let curr_inside = inside(&curr.0);
        if curr_inside != prev_inside
            && let Some(hit) = intersect::<S>(prev, curr, axis, sign)
        {
            output.push(hit);
        }
        if curr_inside {
            output.push(curr);
        }
        prev = curr;
        prev_inside = curr_inside;
    }
}

/// Intersection of segment `a -> b` with the plane `sign * p[axis] = p.w`,
/// interpolating position and varyings.
fn intersect<S: Shader>(
    a: (Vector4<f32>, S::Varying),
    b: (Vector4<f32>, S::Varying),
    axis: usize,
    sign: f32,
) -> Option<(Vector4<f32>, S::Varying)> {
    let denom = sign * (b.0[axis] - a.0[axis]) - (b.0.w - a.0.w);
    if denom.abs() < 1e-9 {
        return None;
    }
    let t = (a.0.w - sign * a.0[axis]) / denom;
    if !t.is_finite() {
        return None;
    }
    Some((a.0 + (b.0 - a.0) * t, a.1 * (1.0 - t) + b.1 * t))
}

/// Screen-space barycentric weights of `p`, `None` for degenerate triangles.
fn barycentric(p: Point2<f32>, tri: &[Point2<f32>; 3]) -> Option<Vector3<f32>> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let d = p - tri[0];

    let area_x2 = e1.x * e2.y - e1.y * e2.x;
    if area_x2.abs() < EPSILON {
        return None;
    }
    let beta = (d.x * e2.y - d.y * e2.x) / area_x2;
    let gamma = (e1.x * d.y - e1.y * d.x) / area_x2;
    Some(Vector3::new(1.0 - beta - gamma, beta, gamma))
}

/// Re-weights screen-space barycentrics by 1/w for attribute interpolation.
fn perspective_correct(bary: Vector3<f32>, w: &[f32; 3]) -> Option<Vector3<f32>> {
    let weighted = Vector3::new(bary.x / w[0], bary.y / w[1], bary.z / w[2]);
    let sum = weighted.x + weighted.y + weighted.z;
    if sum.abs() < EPSILON * EPSILON {
        return None;
    }
    Some(weighted / sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Solid;

    impl Shader for Solid {
        type Varying = f32;

        fn fragment(&self, varying: f32) -> Option<Vector4<f32>> {
            Some(Vector4::new(varying, varying, varying, 1.0))
        }
    }

    fn full_screen_triangle(z: f32) -> [Vector4<f32>; 3] {
        [
            Vector4::new(-1.0, -1.0, z, 1.0),
            Vector4::new(3.0, -1.0, z, 1.0),
            Vector4::new(-1.0, 3.0, z, 1.0),
        ]
    }

    #[test]
    fn covers_every_pixel_of_the_target() {
        let fb = FrameBuffer::new(8, 8, 1);
        Rasterizer::new().rasterize_triangle(&fb, &Solid, &full_screen_triangle(0.0), &[1.0; 3]);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(fb.get_pixel(x, y), Some(Vector3::new(1.0, 1.0, 1.0)));
            }
        }
    }

    #[test]
    fn nearer_triangle_wins_depth_test() {
        let fb = FrameBuffer::new(4, 4, 1);
        let rasterizer = Rasterizer::new();
        rasterizer.rasterize_triangle(&fb, &Solid, &full_screen_triangle(-0.5), &[0.25; 3]);
        rasterizer.rasterize_triangle(&fb, &Solid, &full_screen_triangle(0.5), &[1.0; 3]);
        assert_eq!(fb.get_pixel(1, 1), Some(Vector3::new(0.25, 0.25, 0.25)));
    }

    #[test]
    fn back_face_culling_skips_clockwise_triangles() {
        let fb = FrameBuffer::new(4, 4, 1);
        let rasterizer = Rasterizer {
            cull_mode: CullMode::Back,
            ..Rasterizer::new()
        };
        let mut clockwise = full_screen_triangle(0.0);
        clockwise.swap(1, 2);
        rasterizer.rasterize_triangle(&fb, &Solid, &clockwise, &[1.0; 3]);
        assert_eq!(fb.get_pixel(1, 1), Some(Vector3::zeros()));

        rasterizer.rasterize_triangle(&fb, &Solid, &full_screen_triangle(0.0), &[1.0; 3]);
        assert_eq!(fb.get_pixel(1, 1), Some(Vector3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn triangles_behind_the_camera_are_clipped_away() {
        let fb = FrameBuffer::new(4, 4, 1);
        let behind = [
            Vector4::new(-1.0, -1.0, 2.0, -1.0),
            Vector4::new(1.0, -1.0, 2.0, -1.0),
            Vector4::new(0.0, 1.0, 2.0, -1.0),
        ];
        Rasterizer::new().rasterize_triangle(&fb, &Solid, &behind, &[1.0; 3]);
        assert_eq!(fb.get_pixel(2, 2), Some(Vector3::zeros()));
    }
}
