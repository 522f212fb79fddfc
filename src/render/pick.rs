//! CPU ray casting against the displayed mesh.
//!
//! A drag start ray-tests the press position against the model so grabs on
//! the background fall through. The mesh is small (tens of triangles), so a
//! straight Möller–Trumbore sweep beats any acceleration structure or GPU
//! id-buffer readback here.

use glam::{Mat4, Vec2, Vec3};

use crate::app::input::HitTest;
use crate::scene::geometry::MeshData;

use super::camera::ViewCamera;

const EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// One ray/mesh intersection in world space.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
}

/// Möller–Trumbore ray/triangle intersection. Returns the distance along the
/// ray, or `None` when the ray is parallel to or misses the triangle.
/// Back faces count as hits so a ray can exit through the far side.
fn intersect_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// Intersect a world-space ray with a transformed mesh. Hits come back
/// nearest first.
pub fn intersect_mesh(ray: &Ray, mesh: &MeshData, model: Mat4) -> Vec<RayHit> {
    let mut hits = Vec::new();
    for i in 0..mesh.triangle_count() {
        let (a, b, c) = mesh.triangle(i);
        let a = model.transform_point3(a);
        let b = model.transform_point3(b);
        let c = model.transform_point3(c);
        if let Some(distance) = intersect_triangle(ray, a, b, c) {
            hits.push(RayHit {
                distance,
                point: ray.origin + ray.direction * distance,
            });
        }
    }
    hits.sort_by(|l, r| l.distance.total_cmp(&r.distance));
    hits
}

/// Bundles the camera and the model's current transform for one hit test.
/// Built fresh per drag start; never cached across frames.
pub struct ScenePicker<'a> {
    pub camera: &'a ViewCamera,
    pub mesh: &'a MeshData,
    pub model: Mat4,
}

impl HitTest for ScenePicker<'_> {
    fn hit_test(&self, ndc: Vec2) -> bool {
        let ray = self.camera.ndc_ray(ndc);
        !intersect_mesh(&ray, self.mesh, self.model).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::geometry::icosahedron;

    fn axis_ray() -> Ray {
        Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::NEG_Z,
        }
    }

    #[test]
    fn triangle_hit_and_miss() {
        let ray = axis_ray();
        let hit = intersect_triangle(
            &ray,
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!((hit.unwrap() - 5.0).abs() < 1e-5);

        let miss = intersect_triangle(
            &ray,
            Vec3::new(10.0, -1.0, 0.0),
            Vec3::new(12.0, -1.0, 0.0),
            Vec3::new(11.0, 1.0, 0.0),
        );
        assert!(miss.is_none());
    }

    #[test]
    fn mesh_hits_are_nearest_first() {
        let mesh = icosahedron();
        let hits = intersect_mesh(&axis_ray(), &mesh, Mat4::IDENTITY);
        // The ray enters the front face and exits the back.
        assert!(hits.len() >= 2);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert!(hits[0].point.z > 0.0);
        assert!(hits[0].point.z > hits[hits.len() - 1].point.z);
    }

    #[test]
    fn model_transform_moves_the_target() {
        let mesh = icosahedron();
        let away = Mat4::from_translation(Vec3::new(50.0, 0.0, 0.0));
        assert!(intersect_mesh(&axis_ray(), &mesh, away).is_empty());

        let doubled = Mat4::from_scale(Vec3::splat(2.0));
        let wide_ray = Ray {
            origin: Vec3::new(1.5, 0.0, 5.0),
            direction: Vec3::NEG_Z,
        };
        assert!(intersect_mesh(&wide_ray, &mesh, Mat4::IDENTITY).is_empty());
        assert!(!intersect_mesh(&wide_ray, &mesh, doubled).is_empty());
    }

    #[test]
    fn picker_gates_on_screen_position() {
        let camera = ViewCamera::front_view(1.0);
        let mesh = icosahedron();
        let picker = ScenePicker {
            camera: &camera,
            mesh: &mesh,
            model: Mat4::IDENTITY,
        };
        assert!(picker.hit_test(Vec2::ZERO));
        assert!(!picker.hit_test(Vec2::new(0.95, 0.95)));
    }
}
