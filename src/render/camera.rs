use glam::{Mat4, Vec2, Vec3, Vec4};

use super::pick::Ray;

/// Fixed perspective camera in front of the model.
#[derive(Debug, Clone, Copy)]
pub struct ViewCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl ViewCamera {
    pub fn front_view(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            fov_y_deg: 45.0,
            aspect,
            near: 0.01,
            far: 100.0,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        // 0..1 depth range, matching the wgpu clip volume.
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Unproject an NDC point into a world-space ray through the frustum.
    pub fn ndc_ray(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = unproject(inverse, ndc, 0.0);
        let far = unproject(inverse, ndc, 1.0);
        Ray {
            origin: near,
            direction: (far - near).normalize(),
        }
    }
}

fn unproject(inverse_view_proj: Mat4, ndc: Vec2, depth: f32) -> Vec3 {
    let clip = Vec4::new(ndc.x, ndc.y, depth, 1.0);
    let world = inverse_view_proj * clip;
    world.truncate() / world.w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_down_the_view_axis() {
        let camera = ViewCamera::front_view(16.0 / 9.0);
        let ray = camera.ndc_ray(Vec2::ZERO);
        assert!(ray.direction.distance(Vec3::NEG_Z) < 1e-4);
        // Ray starts on the near plane in front of the eye.
        assert!(ray.origin.z < camera.position.z);
        assert!(ray.origin.z > 0.0);
    }

    #[test]
    fn off_center_rays_diverge_in_the_matching_direction() {
        let camera = ViewCamera::front_view(1.0);
        let right = camera.ndc_ray(Vec2::new(0.5, 0.0));
        let up = camera.ndc_ray(Vec2::new(0.0, 0.5));
        assert!(right.direction.x > 0.0);
        assert!((right.direction.y).abs() < 1e-4);
        assert!(up.direction.y > 0.0);
    }

    #[test]
    fn set_aspect_rejects_degenerate_values() {
        let mut camera = ViewCamera::front_view(1.5);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 1.5);
        camera.set_aspect(2.0);
        assert_eq!(camera.aspect, 2.0);
    }
}
