//! CPU-side mesh construction. The same `MeshData` feeds the GPU vertex
//! upload and the ray picker, so the hit test always matches what is drawn.

use glam::Vec3;

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of triangle `i` in mesh-local space.
    pub fn triangle(&self, i: usize) -> (Vec3, Vec3, Vec3) {
        let a = self.positions[self.indices[i * 3] as usize];
        let b = self.positions[self.indices[i * 3 + 1] as usize];
        let c = self.positions[self.indices[i * 3 + 2] as usize];
        (Vec3::from(a), Vec3::from(b), Vec3::from(c))
    }
}

/// Faceted icosahedron with radius 1.
///
/// Vertices are duplicated per face and carry the face normal, so the glass
/// shader shades it flat. Winding is counter-clockwise seen from outside.
pub fn icosahedron() -> MeshData {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;

    let corners = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .map(|v| v.normalize());

    const FACES: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    let mut mesh = MeshData::default();
    for face in FACES {
        let (a, b, c) = (corners[face[0]], corners[face[1]], corners[face[2]]);
        let normal = (b - a).cross(c - a).normalize();
        for v in [a, b, c] {
            mesh.indices.push(mesh.positions.len() as u32);
            mesh.positions.push(v.to_array());
            mesh.normals.push(normal.to_array());
            mesh.uvs.push([0.0, 0.0]);
        }
    }
    mesh
}

/// Axis-aligned quad in the XY plane facing +Z, centered at the origin.
/// UVs run left-to-right, top-to-bottom to match image memory order.
pub fn plane(width: f32, height: f32) -> MeshData {
    let hw = width / 2.0;
    let hh = height / 2.0;
    MeshData {
        positions: vec![
            [-hw, hh, 0.0],
            [-hw, -hh, 0.0],
            [hw, -hh, 0.0],
            [hw, hh, 0.0],
        ],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        uvs: vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icosahedron_has_twenty_faceted_faces() {
        let mesh = icosahedron();
        assert_eq!(mesh.triangle_count(), 20);
        assert_eq!(mesh.positions.len(), 60);
        assert_eq!(mesh.normals.len(), 60);
    }

    #[test]
    fn icosahedron_vertices_lie_on_the_unit_sphere() {
        let mesh = icosahedron();
        for p in &mesh.positions {
            let r = Vec3::from(*p).length();
            assert!((r - 1.0).abs() < 1e-5, "radius {r}");
        }
    }

    #[test]
    fn icosahedron_normals_point_outward() {
        let mesh = icosahedron();
        for i in 0..mesh.triangle_count() {
            let (a, b, c) = mesh.triangle(i);
            let centroid = (a + b + c) / 3.0;
            let normal = Vec3::from(mesh.normals[(i * 3) as usize]);
            assert!((normal.length() - 1.0).abs() < 1e-5);
            assert!(normal.dot(centroid) > 0.0, "face {i} winds inward");
        }
    }

    #[test]
    fn plane_spans_requested_size() {
        let mesh = plane(5.0, 5.0);
        assert_eq!(mesh.triangle_count(), 2);
        let xs: Vec<f32> = mesh.positions.iter().map(|p| p[0]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -2.5);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 2.5);
        for uv in &mesh.uvs {
            assert!((0.0..=1.0).contains(&uv[0]));
            assert!((0.0..=1.0).contains(&uv[1]));
        }
    }
}
