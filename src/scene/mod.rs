pub mod geometry;
pub mod serialization;

use glam::Mat4;

/// Baked model orientation and scale. The source model is authored lying
/// flat, so it is tipped once here rather than per frame.
const BASE_ROTATION_Y: f32 = -0.5;
const BASE_ROTATION_Z: f32 = 0.4;
const MODEL_SCALE: f32 = 2.0;

/// Default per-frame spin the viewer opens with, matching one revolution
/// every 50 seconds at 60 fps. The first successful drag replaces it.
pub const IDLE_SPIN: f32 = 0.002;

/// Parameters of the transmissive material, editable from the debug panel.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GlassParams {
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub env_map_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub thickness: f32,
    pub transmission: f32,
}

impl Default for GlassParams {
    fn default() -> Self {
        Self {
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            env_map_intensity: 0.4,
            metalness: 0.0,
            roughness: 0.2,
            thickness: 1.0,
            transmission: 1.0,
        }
    }
}

/// Per-frame model transform state.
///
/// The Y axis integrates the drag controller's angular velocity; the Z sway
/// and vertical bob follow a fixed sinusoidal idle curve evaluated from the
/// scene clock, so they stay phase-stable regardless of frame rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelMotion {
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub position_y: f32,
}

impl ModelMotion {
    pub fn advance(&mut self, now_seconds: f32, rotation_speed_y: f32) {
        self.rotation_y += rotation_speed_y;
        let sway = (1.0 + (now_seconds / 1.5).sin()) / 2.0;
        self.rotation_z = -0.2 - sway / 10.0;
        self.position_y = sway / 5.0;
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(glam::Vec3::new(0.0, self.position_y, 0.0))
            * Mat4::from_rotation_y(self.rotation_y)
            * Mat4::from_rotation_z(self.rotation_z)
            * Mat4::from_scale(glam::Vec3::splat(MODEL_SCALE))
            * Mat4::from_rotation_z(BASE_ROTATION_Z)
            * Mat4::from_rotation_y(BASE_ROTATION_Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_axis_integrates_angular_velocity() {
        let mut motion = ModelMotion::default();
        motion.advance(0.0, 0.01);
        motion.advance(0.016, 0.01);
        assert!((motion.rotation_y - 0.02).abs() < 1e-6);

        // Zero velocity freezes the spin axis but not the idle curve.
        let y = motion.rotation_y;
        motion.advance(1.0, 0.0);
        assert_eq!(motion.rotation_y, y);
    }

    #[test]
    fn idle_curve_stays_in_band() {
        let mut motion = ModelMotion::default();
        for step in 0..600 {
            motion.advance(step as f32 / 60.0, 0.0);
            assert!((-0.3..=-0.2).contains(&motion.rotation_z));
            assert!((0.0..=0.2).contains(&motion.position_y));
        }
    }

    #[test]
    fn model_matrix_lifts_the_origin_by_the_bob() {
        let mut motion = ModelMotion::default();
        motion.advance(0.75, 0.0);
        let origin = motion.model_matrix().transform_point3(glam::Vec3::ZERO);
        assert!((origin.y - motion.position_y).abs() < 1e-6);
        assert!(origin.x.abs() < 1e-6);
        assert!(origin.z.abs() < 1e-6);
    }

    #[test]
    fn glass_defaults_match_the_shipped_material() {
        let params = GlassParams::default();
        assert_eq!(params.transmission, 1.0);
        assert_eq!(params.roughness, 0.2);
        assert_eq!(params.env_map_intensity, 0.4);
        assert_eq!(params.thickness, 1.0);
    }
}
