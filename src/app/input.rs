//! Drag-to-spin interaction.
//!
//! Converts raw pointer/touch samples into an angular velocity around the
//! model's vertical axis. A drag only opens if the press ray-hits the model;
//! every accepted move adds an impulse, and releasing keeps the spin going
//! (flick inertia). The animator consumes `rotation_speed_y` once per frame.

use glam::Vec2;

/// Divisor applied to every velocity impulse. Tuned against typical mouse
/// drag distances in pixels over drag times in seconds.
pub const BASE_DAMPING: f32 = 30_000.0;

/// Touch drags cover fewer pixels than mouse drags for the same gesture, so
/// the touch path halves the damping.
pub const MOUSE_SPEED_UP: f32 = 1.0;
pub const TOUCH_SPEED_UP: f32 = 2.0;

/// One observed pointer/touch position with its capture time in seconds
/// (monotonic, relative to program start).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub time: f32,
}

/// Pixel bounds of the render surface, re-read from the window on every
/// start/move call since layout can change between events.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Map surface pixel coordinates to normalized device coordinates in
    /// `[-1, 1]²`, Y up.
    pub fn to_ndc(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(
            ((x - self.left) / self.width) * 2.0 - 1.0,
            -((y - self.top) / self.height) * 2.0 + 1.0,
        )
    }
}

/// Screen-space hit test against the spin target. Implemented by the scene
/// picker; stubbed in tests.
pub trait HitTest {
    fn hit_test(&self, ndc: Vec2) -> bool;
}

struct DragSession {
    origin: PointerSample,
    last_sample: Option<PointerSample>,
}

impl DragSession {
    /// Reference point for the next delta: the most recent accepted move
    /// sample, or the origin until the first move lands.
    fn reference(&self) -> PointerSample {
        self.last_sample.unwrap_or(self.origin)
    }
}

pub struct DragController {
    rotation_speed_y: f32,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::with_initial_spin(0.0)
    }

    /// Start with a nonzero idle spin; the first successful drag zeroes it
    /// like any other residual inertia.
    pub fn with_initial_spin(rotation_speed_y: f32) -> Self {
        Self {
            rotation_speed_y,
            session: None,
        }
    }

    /// Per-frame rotation increment for the target's Y axis. Persists after
    /// release; only a new successful `start` resets it.
    pub fn rotation_speed_y(&self) -> f32 {
        self.rotation_speed_y
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Attempt to open a drag at surface pixel position `(x, y)`.
    ///
    /// The position is converted to NDC against the current surface rect and
    /// ray-tested against the target. A miss is a complete no-op, so clicks
    /// on the background never grab the model. A hit opens a session and
    /// cancels any residual spin from a prior drag.
    pub fn start<H: HitTest>(
        &mut self,
        x: f32,
        y: f32,
        now: f32,
        surface: SurfaceRect,
        target: &H,
    ) {
        if !target.hit_test(surface.to_ndc(x, y)) {
            return;
        }
        self.rotation_speed_y = 0.0;
        self.session = Some(DragSession {
            origin: PointerSample { x, y, time: now },
            last_sample: None,
        });
    }

    /// Feed a move sample into the open session, accumulating a velocity
    /// impulse. No-op without a session.
    ///
    /// The impulse scales with the pixel distance from the previous sample
    /// but divides by the time elapsed since the drag *started*, so late
    /// samples in a long drag contribute progressively less.
    pub fn move_to(&mut self, x: f32, y: f32, now: f32, speed_up_factor: f32) {
        let Some(session) = &mut self.session else {
            return;
        };

        let current = PointerSample { x, y, time: now };
        let reference = session.reference();

        let drag_time = now - session.origin.time;
        if drag_time <= 0.0 {
            // First sample can land in the same instant as the press.
            return;
        }

        let dx = current.x - reference.x;
        let dy = current.y - reference.y;
        let drag_length = (dx * dx + dy * dy).sqrt();
        // sign(0) must be 0 so pure vertical motion adds nothing;
        // f32::signum(0.0) is 1.0 and would not do.
        let direction = if dx > 0.0 {
            1.0
        } else if dx < 0.0 {
            -1.0
        } else {
            0.0
        };

        let damping = BASE_DAMPING / speed_up_factor;
        self.rotation_speed_y += direction * drag_length / drag_time / damping;
        session.last_sample = Some(current);
    }

    /// Close the session. The accumulated spin is deliberately kept: the
    /// gesture models a flick, not a press-to-hold rotation.
    pub fn end(&mut self) {
        self.session = None;
    }

    pub fn cancel(&mut self) {
        self.end();
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysHit;
    impl HitTest for AlwaysHit {
        fn hit_test(&self, _ndc: Vec2) -> bool {
            true
        }
    }

    struct NeverHit;
    impl HitTest for NeverHit {
        fn hit_test(&self, _ndc: Vec2) -> bool {
            false
        }
    }

    fn rect() -> SurfaceRect {
        SurfaceRect::from_size(800.0, 600.0)
    }

    #[test]
    fn ndc_conversion_spans_the_surface() {
        let rect = rect();
        assert_eq!(rect.to_ndc(400.0, 300.0), Vec2::new(0.0, 0.0));
        assert_eq!(rect.to_ndc(0.0, 0.0), Vec2::new(-1.0, 1.0));
        assert_eq!(rect.to_ndc(800.0, 600.0), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn ndc_conversion_respects_rect_offset() {
        let rect = SurfaceRect {
            left: 100.0,
            top: 50.0,
            width: 200.0,
            height: 100.0,
        };
        assert_eq!(rect.to_ndc(200.0, 100.0), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn move_and_end_without_session_are_noops() {
        let mut drag = DragController::with_initial_spin(0.002);
        drag.move_to(100.0, 100.0, 1.0, MOUSE_SPEED_UP);
        drag.end();
        assert_eq!(drag.rotation_speed_y(), 0.002);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn missed_hit_test_opens_no_session() {
        let mut drag = DragController::with_initial_spin(0.002);
        drag.start(400.0, 300.0, 0.0, rect(), &NeverHit);
        assert!(!drag.is_dragging());
        assert_eq!(drag.rotation_speed_y(), 0.002);

        // The whole gesture stays inert.
        drag.move_to(500.0, 300.0, 1.0, MOUSE_SPEED_UP);
        assert_eq!(drag.rotation_speed_y(), 0.002);
    }

    #[test]
    fn velocity_accumulates_with_elapsed_time_damping() {
        let mut drag = DragController::new();
        drag.start(0.0, 0.0, 0.0, rect(), &AlwaysHit);

        drag.move_to(100.0, 0.0, 1.0, MOUSE_SPEED_UP);
        let first = 100.0 / 1.0 / BASE_DAMPING;
        assert!((drag.rotation_speed_y() - first).abs() < 1e-9);

        // Second step: distance from the previous sample, but time from the
        // drag origin, so the increment shrinks.
        drag.move_to(200.0, 0.0, 2.0, MOUSE_SPEED_UP);
        let second = first + 100.0 / 2.0 / BASE_DAMPING;
        assert!((drag.rotation_speed_y() - second).abs() < 1e-9);

        // A single 0→200 jump at t=1 would have been faster.
        let mut jump = DragController::new();
        jump.start(0.0, 0.0, 0.0, rect(), &AlwaysHit);
        jump.move_to(200.0, 0.0, 1.0, MOUSE_SPEED_UP);
        assert!(jump.rotation_speed_y() > drag.rotation_speed_y());
    }

    #[test]
    fn restart_resets_accumulated_spin_to_zero() {
        let mut drag = DragController::new();
        drag.start(0.0, 0.0, 0.0, rect(), &AlwaysHit);
        drag.move_to(300.0, 0.0, 1.0, MOUSE_SPEED_UP);
        drag.end();
        assert!(drag.rotation_speed_y() > 0.0);

        drag.start(10.0, 10.0, 5.0, rect(), &AlwaysHit);
        assert_eq!(drag.rotation_speed_y(), 0.0);
        assert!(drag.is_dragging());
    }

    #[test]
    fn release_keeps_the_spin() {
        let mut drag = DragController::new();
        drag.start(0.0, 0.0, 0.0, rect(), &AlwaysHit);
        drag.move_to(150.0, 0.0, 0.5, MOUSE_SPEED_UP);
        let before = drag.rotation_speed_y();
        drag.end();
        assert_eq!(drag.rotation_speed_y(), before);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn zero_elapsed_time_is_ignored() {
        let mut drag = DragController::new();
        drag.start(0.0, 0.0, 1.0, rect(), &AlwaysHit);
        drag.move_to(250.0, 0.0, 1.0, MOUSE_SPEED_UP);
        assert_eq!(drag.rotation_speed_y(), 0.0);

        // The rejected sample must not become the reference either.
        drag.move_to(250.0, 0.0, 2.0, MOUSE_SPEED_UP);
        let expected = 250.0 / 1.0 / BASE_DAMPING;
        assert!((drag.rotation_speed_y() - expected).abs() < 1e-9);
    }

    #[test]
    fn touch_speed_up_doubles_the_impulse() {
        let mut mouse = DragController::new();
        mouse.start(0.0, 0.0, 0.0, rect(), &AlwaysHit);
        mouse.move_to(120.0, 0.0, 1.0, MOUSE_SPEED_UP);

        let mut touch = DragController::new();
        touch.start(0.0, 0.0, 0.0, rect(), &AlwaysHit);
        touch.move_to(120.0, 0.0, 1.0, TOUCH_SPEED_UP);

        assert!((touch.rotation_speed_y() - 2.0 * mouse.rotation_speed_y()).abs() < 1e-9);
    }

    #[test]
    fn vertical_motion_carries_no_direction() {
        let mut drag = DragController::new();
        drag.start(100.0, 100.0, 0.0, rect(), &AlwaysHit);
        drag.move_to(100.0, 250.0, 1.0, MOUSE_SPEED_UP);
        assert_eq!(drag.rotation_speed_y(), 0.0);
    }

    #[test]
    fn leftward_drag_spins_negative() {
        let mut drag = DragController::new();
        drag.start(300.0, 0.0, 0.0, rect(), &AlwaysHit);
        drag.move_to(100.0, 0.0, 1.0, MOUSE_SPEED_UP);
        assert!(drag.rotation_speed_y() < 0.0);
    }

    #[test]
    fn flick_scenario_end_to_end() {
        let mut drag = DragController::new();
        drag.start(0.0, 0.0, 0.0, rect(), &AlwaysHit);
        drag.move_to(300.0, 0.0, 1.0, MOUSE_SPEED_UP);
        assert!((drag.rotation_speed_y() - 0.01).abs() < 1e-6);

        // Holding still adds nothing.
        drag.move_to(300.0, 0.0, 2.0, MOUSE_SPEED_UP);
        assert!((drag.rotation_speed_y() - 0.01).abs() < 1e-6);

        drag.end();
        assert!((drag.rotation_speed_y() - 0.01).abs() < 1e-6);
    }
}
