use crate::core::geometry::Vertex;
use nalgebra::{Vector2, Vector3};
use serde::Deserialize;
use std::f32::consts::PI;

/// Sphere tessellation used by [`MeshKind::Sphere`].
pub const SPHERE_STACKS: u32 = 20;
pub const SPHERE_SLICES: u32 = 20;

/// Canonical primitive selected at drawable construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshKind {
    Triangle,
    Quad,
    Cube,
    Sphere,
}

/// Triangle-list geometry: every index is below `vertices.len()` and
/// `indices.len()` is a multiple of 3.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Deterministic geometry for `kind`. All shapes are centered at the
    /// local origin with counter-clockwise front faces.
    pub fn generate(kind: MeshKind) -> Self {
        match kind {
            MeshKind::Triangle => Self::triangle(),
            MeshKind::Quad => Self::quad(),
            MeshKind::Cube => Self::cube(),
            MeshKind::Sphere => Self::sphere(1.0, SPHERE_STACKS, SPHERE_SLICES),
        }
    }

    pub fn triangle() -> Self {
        let normal = Vector3::z();
        let vertices = vec![
            Vertex::new(
                Vector3::new(-1.0, -1.0, 0.0),
                normal,
                Vector3::new(1.0, 0.0, 0.0),
                Vector2::new(0.0, 0.0),
            ),
            Vertex::new(
                Vector3::new(1.0, -1.0, 0.0),
                normal,
                Vector3::new(0.0, 1.0, 0.0),
                Vector2::new(1.0, 0.0),
            ),
            Vertex::new(
                Vector3::new(0.0, 1.0, 0.0),
                normal,
                Vector3::new(0.0, 0.0, 1.0),
                Vector2::new(0.5, 1.0),
            ),
        ];
        Self::new(vertices, vec![0, 1, 2])
    }

    pub fn quad() -> Self {
        let normal = Vector3::z();
        let corners = [
            ((-1.0, -1.0), Vector3::new(1.0, 0.0, 0.0)),
            ((1.0, -1.0), Vector3::new(0.0, 1.0, 0.0)),
            ((1.0, 1.0), Vector3::new(0.0, 0.0, 1.0)),
            ((-1.0, 1.0), Vector3::new(1.0, 1.0, 1.0)),
        ];
        let vertices = corners
            .iter()
            .map(|&((x, y), color)| {
                Vertex::new(
                    Vector3::new(x, y, 0.0),
                    normal,
                    color,
                    Vector2::new((x + 1.0) * 0.5, (y + 1.0) * 0.5),
                )
            })
            .collect();
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Unit cube spanning -1..1 with four vertices per face so that every
    /// face has its own normal and full 0..1 texture coordinates.
    pub fn cube() -> Self {
        // (normal, u axis, v axis); u x v == normal keeps faces counter-clockwise.
        let faces: [(Vector3<f32>, Vector3<f32>, Vector3<f32>); 6] = [
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), -Vector3::x(), Vector3::y()),
            (Vector3::x(), -Vector3::z(), Vector3::y()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::x(), -Vector3::z()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
        ];
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in faces {
            let base = vertices.len() as u32;
            let color = normal.abs();
            for (u, v) in corners {
                vertices.push(Vertex::new(
                    normal + u_axis * u + v_axis * v,
                    normal,
                    color,
                    Vector2::new((u + 1.0) * 0.5, (v + 1.0) * 0.5),
                ));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    /// UV sphere centered at the origin. Normals are the unit position vectors.
    pub fn sphere(radius: f32, stacks: u32, slices: u32) -> Self {
        let stacks = stacks.max(2);
        let slices = slices.max(3);

        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        for i in 0..=stacks {
            let v = i as f32 / stacks as f32;
            let phi = v * PI;
            for j in 0..=slices {
                let u = j as f32 / slices as f32;
                let theta = u * 2.0 * PI;
                let normal = Vector3::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin());
                vertices.push(Vertex::new(
                    normal * radius,
                    normal,
                    Vector3::new(1.0, 1.0, 1.0),
                    Vector2::new(u, v),
                ));
            }
        }

        let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
        let row = slices + 1;
        for i in 0..stacks {
            for j in 0..slices {
                let current = i * row + j;
                let next = current + row;
                indices.extend_from_slice(&[
                    current,
                    current + 1,
                    next,
                    current + 1,
                    next + 1,
                    next,
                ]);
            }
        }
        Self::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_wind_counter_clockwise_outward() {
        let cube = MeshData::cube();
        for triangle in cube.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| cube.vertices[triangle[i] as usize]);
            let face_normal = (b.position - a.position).cross(&(c.position - a.position));
            assert!(face_normal.dot(&a.normal) > 0.0);
        }
    }

    #[test]
    fn sphere_winding_faces_outward() {
        let sphere = MeshData::sphere(1.0, 8, 8);
        let row = 9;
        // A quad on the equator, away from the degenerate pole rows.
        let start = (4 * row + 2) as u32;
        let a = sphere.vertices[start as usize];
        let b = sphere.vertices[start as usize + 1];
        let c = sphere.vertices[(start + row) as usize];
        let face_normal = (b.position - a.position).cross(&(c.position - a.position));
        assert!(face_normal.dot(&a.normal) > 0.0);
    }

    #[test]
    fn sphere_vertex_count_matches_tessellation() {
        let sphere = MeshData::sphere(2.0, 4, 6);
        assert_eq!(sphere.vertices.len(), 5 * 7);
        assert_eq!(sphere.indices.len(), 4 * 6 * 6);
        assert!((sphere.vertices[0].position.norm() - 2.0).abs() < 1e-5);
    }
}
