pub mod egui_host;
pub mod input;
mod timing;

use crate::assets::{BackgroundLibrary, WHITE_BACKGROUND};
use crate::render::camera::ViewCamera;
use crate::render::pick::ScenePicker;
use crate::render::RenderContext;
use crate::scene::geometry::{icosahedron, plane, MeshData};
use crate::scene::serialization::{load_settings_from_file, save_settings_to_file, ViewerSettings};
use crate::scene::{GlassParams, ModelMotion, IDLE_SPIN};
use crate::ui::{UiActions, UiState};
use egui_host::PanelHost;
use input::{DragController, SurfaceRect, MOUSE_SPEED_UP, TOUCH_SPEED_UP};
use timing::{FrameStats, SceneClock};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Vitrine";
const BACKGROUNDS_DIR: &str = "backgrounds";

/// Side length of the background plane behind the model.
const BACKGROUND_SIZE: f32 = 5.0;

pub struct App {
    window: Option<Arc<Window>>,
    render: Option<RenderContext>,
    panel_host: Option<PanelHost>,
    camera: ViewCamera,
    model_mesh: MeshData,
    motion: ModelMotion,
    params: GlassParams,
    drag: DragController,
    clock: SceneClock,
    stats: FrameStats,
    ui: UiState,
    backgrounds: BackgroundLibrary,
    applied_background: usize,
    mouse_pos: Option<(f32, f32)>,
    active_touch: Option<u64>,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    close_requested: bool,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            render: None,
            panel_host: None,
            camera: ViewCamera::front_view(16.0 / 9.0),
            model_mesh: icosahedron(),
            motion: ModelMotion::default(),
            params: GlassParams::default(),
            drag: DragController::with_initial_spin(IDLE_SPIN),
            clock: SceneClock::new(),
            stats: FrameStats::new(),
            ui: UiState::new(),
            backgrounds: BackgroundLibrary::scan(Path::new(BACKGROUNDS_DIR)),
            applied_background: 0,
            mouse_pos: None,
            active_touch: None,
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
            close_requested: false,
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(render) = &mut self.render {
            render.resize(new_size);
        }
        self.camera
            .set_aspect(new_size.width as f32 / new_size.height.max(1) as f32);
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    /// Open a drag if the press ray-hits the model. The surface rect and the
    /// model transform are read fresh here, never cached across events.
    fn start_drag(&mut self, x: f32, y: f32) {
        let Some(window) = &self.window else {
            return;
        };
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        let rect = SurfaceRect::from_size(size.width as f32, size.height as f32);
        let picker = ScenePicker {
            camera: &self.camera,
            mesh: &self.model_mesh,
            model: self.motion.model_matrix(),
        };
        self.drag
            .start(x, y, self.clock.elapsed_seconds(), rect, &picker);
    }

    fn handle_touch(&mut self, touch: Touch) {
        let (x, y) = (touch.location.x as f32, touch.location.y as f32);
        match touch.phase {
            TouchPhase::Started => {
                // Only the first finger drives the gesture; later fingers are
                // ignored even after a missed hit test.
                if self.active_touch.is_none() {
                    self.active_touch = Some(touch.id);
                    self.start_drag(x, y);
                }
            }
            TouchPhase::Moved => {
                if self.active_touch == Some(touch.id) {
                    self.drag
                        .move_to(x, y, self.clock.elapsed_seconds(), TOUCH_SPEED_UP);
                }
            }
            TouchPhase::Ended => {
                if self.active_touch == Some(touch.id) {
                    self.active_touch = None;
                    self.drag.end();
                }
            }
            TouchPhase::Cancelled => {
                if self.active_touch == Some(touch.id) {
                    self.active_touch = None;
                    self.drag.cancel();
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let now = self.clock.elapsed_seconds();
        self.motion.advance(now, self.drag.rotation_speed_y());

        let Some(host) = self.panel_host.as_mut() else {
            return;
        };
        let (frame, actions) =
            host.run_panel(&window, &mut self.ui, &mut self.params, &self.backgrounds);

        self.apply_ui_actions(actions);

        let Some(render) = self.render.as_mut() else {
            return;
        };
        let render_start = Instant::now();
        if let Err(err) =
            render.render_frame(&self.camera, self.motion.model_matrix(), &self.params, frame)
        {
            log::error!("Rendering failed: {}", err);
            self.close_requested = true;
            event_loop.exit();
            return;
        }
        let render_ms = render_start.elapsed().as_secs_f32() * 1000.0;
        if let Some(report) = self.stats.record_frame(Instant::now(), render_ms) {
            log::debug!(
                "{:.1} fps, render {:.2} ms avg",
                report.fps,
                report.avg_render_ms
            );
        }
    }

    fn apply_ui_actions(&mut self, actions: UiActions) {
        if let Some(index) = actions.background_selected {
            self.apply_background(index);
        }
        if actions.add_image {
            self.handle_add_image();
        }
        if actions.save_settings {
            self.handle_save_settings();
        }
        if actions.load_settings {
            self.handle_load_settings();
        }
    }

    /// A failed decode keeps the previous background active and snaps the
    /// dropdown back to it.
    fn apply_background(&mut self, index: usize) {
        let Some(render) = &mut self.render else {
            return;
        };
        match self.backgrounds.load_pixels(index) {
            Ok(Some(image)) => {
                render.set_background_image(&image);
                self.applied_background = index;
            }
            Ok(None) => {
                render.set_background_white();
                self.applied_background = index;
            }
            Err(err) => {
                log::warn!("Background unchanged: {}", err);
                self.ui.set_selected_background(self.applied_background);
            }
        }
    }

    fn handle_add_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        else {
            return;
        };
        match self.backgrounds.register_file(path) {
            Ok(index) => {
                self.ui.set_selected_background(index);
                self.apply_background(index);
            }
            Err(err) => log::warn!("Rejected background image: {}", err),
        }
    }

    fn handle_save_settings(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Settings", &["json"])
            .set_file_name("vitrine.json")
            .save_file()
        else {
            return;
        };
        let background = self
            .backgrounds
            .get(self.applied_background)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| WHITE_BACKGROUND.to_string());
        let settings = ViewerSettings {
            material: self.params,
            background,
        };
        match save_settings_to_file(&settings, &path) {
            Ok(()) => log::info!("Settings saved to {:?}", path),
            Err(err) => log::warn!("Failed to save settings: {}", err),
        }
    }

    fn handle_load_settings(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Settings", &["json"])
            .pick_file()
        else {
            return;
        };
        match load_settings_from_file(&path) {
            Ok(settings) => {
                self.params = settings.material;
                let index = match self.backgrounds.index_of(&settings.background) {
                    Some(index) => index,
                    None => {
                        log::warn!(
                            "Background '{}' not in library, falling back to white",
                            settings.background
                        );
                        0
                    }
                };
                self.ui.set_selected_background(index);
                self.apply_background(index);
                log::info!("Settings loaded from {:?}", path);
            }
            Err(err) => log::warn!("Failed to load settings: {}", err),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        self.camera =
            ViewCamera::front_view(size.width as f32 / size.height.max(1) as f32);

        match RenderContext::new(
            window.clone(),
            &self.model_mesh,
            &plane(BACKGROUND_SIZE, BACKGROUND_SIZE),
        ) {
            Ok(render) => {
                self.panel_host = Some(PanelHost::new(&window, render.max_texture_side()));
                self.render = Some(render);
            }
            Err(err) => {
                log::error!("Failed to initialize renderer: {}", err);
                event_loop.exit();
                return;
            }
        }

        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let egui_consumed = match (&self.window, &mut self.panel_host) {
            (Some(window), Some(host)) => host.on_window_event(window, &event),
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    self.close_requested = true;
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = self.window.clone() {
                    self.handle_resize(window.inner_size());
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.mouse_pos = Some((x, y));
                if self.drag.is_dragging() {
                    self.drag
                        .move_to(x, y, self.clock.elapsed_seconds(), MOUSE_SPEED_UP);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_pos = None;
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    if !egui_consumed {
                        if let Some((x, y)) = self.mouse_pos {
                            self.start_drag(x, y);
                        }
                    }
                }
                ElementState::Released => {
                    self.drag.end();
                }
            },
            WindowEvent::Touch(touch) => {
                if !egui_consumed || self.active_touch.is_some() {
                    self.handle_touch(touch);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested {
            return;
        }
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Vitrine viewer starting");
    log::info!("   Drag the model to spin it; press ESC or close the window to exit");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");

    log::info!("Goodbye");
}
