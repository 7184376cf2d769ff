use approx::assert_relative_eq;
use hopper::scene::{MeshData, MeshKind};

const ALL_KINDS: [MeshKind; 4] = [
    MeshKind::Triangle,
    MeshKind::Quad,
    MeshKind::Cube,
    MeshKind::Sphere,
];

#[test]
fn every_kind_is_a_valid_triangle_list() {
    for kind in ALL_KINDS {
        let mesh = MeshData::generate(kind);
        assert!(!mesh.vertices.is_empty(), "{:?} has no vertices", kind);
        assert!(!mesh.indices.is_empty(), "{:?} has no indices", kind);
        assert_eq!(mesh.indices.len() % 3, 0, "{:?}", kind);
        assert!(
            mesh.indices
                .iter()
                .all(|&i| (i as usize) < mesh.vertices.len()),
            "{:?} indexes past its vertices",
            kind
        );
    }
}

#[test]
fn generation_is_deterministic() {
    for kind in ALL_KINDS {
        assert_eq!(MeshData::generate(kind), MeshData::generate(kind));
    }
}

#[test]
fn cube_and_quad_are_centered_on_the_origin() {
    for kind in [MeshKind::Cube, MeshKind::Quad] {
        let mesh = MeshData::generate(kind);
        for axis in 0..3 {
            let values = mesh.vertices.iter().map(|v| v.position[axis]);
            let min = values.clone().fold(f32::INFINITY, f32::min);
            let max = values.fold(f32::NEG_INFINITY, f32::max);
            assert_relative_eq!(min, -max, epsilon = 1e-6);
        }
    }
}

#[test]
fn sphere_normals_point_along_positions() {
    let sphere = MeshData::generate(MeshKind::Sphere);
    for vertex in &sphere.vertices {
        let position = vertex.position.normalize();
        assert_relative_eq!(vertex.normal.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(position.cross(&vertex.normal).norm(), 0.0, epsilon = 1e-5);
        assert!(position.dot(&vertex.normal) > 0.0);
    }
}
