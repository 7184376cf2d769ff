use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

/// Fixed perspective camera looking at the world origin with +Y up.
///
/// Matrices are computed once at construction; there is no runtime camera movement.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vector3<f32>,
    view_matrix: Matrix4<f32>,
    projection_matrix: Matrix4<f32>,
}

impl Camera {
    /// `fov_deg` is the vertical field of view in degrees; `width / height` is the aspect.
    ///
    /// Degenerate inputs (`near >= far`, non-positive size or fov) are not checked.
    pub fn new(
        fov_deg: f32,
        width: f32,
        height: f32,
        near: f32,
        far: f32,
        position: Vector3<f32>,
    ) -> Self {
        let view_matrix = TransformFactory::view(
            &Point3::from(position),
            &Point3::origin(),
            &Vector3::y(),
        );
        let projection_matrix =
            TransformFactory::perspective(width / height, fov_deg.to_radians(), near, far);

        Self {
            position,
            view_matrix,
            projection_matrix,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view_matrix
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix
    }

    /// `projection * view`, the combined matrix uploaded as `vp`.
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix * self.view_matrix
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    fn game_camera() -> Camera {
        Camera::new(45.0, 800.0, 600.0, 0.1, 100.0, Vector3::new(0.0, 4.0, 30.0))
    }

    #[test]
    fn origin_lies_straight_ahead() {
        let camera = game_camera();
        let origin = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(origin.y, 0.0, epsilon = 1e-5);
        assert!(origin.z < 0.0);
    }

    #[test]
    fn projection_uses_the_aspect_ratio() {
        let projection = game_camera().projection_matrix();
        let f = 1.0 / (45.0f32.to_radians() / 2.0).tan();
        assert_relative_eq!(projection[(1, 1)], f, epsilon = 1e-5);
        assert_relative_eq!(projection[(0, 0)], f / (800.0 / 600.0), epsilon = 1e-5);
        assert_relative_eq!(projection[(3, 2)], -1.0);
    }
}
