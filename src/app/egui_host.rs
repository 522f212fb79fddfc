//! Bridge between winit events, the debug panel, and the egui-wgpu painter.

use egui_winit::winit::event::WindowEvent;
use winit::window::Window;

use crate::assets::BackgroundLibrary;
use crate::scene::GlassParams;
use crate::ui::{UiActions, UiState};

/// Tessellated panel output plus the screen mapping the painter pass needs.
pub struct PanelFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub screen: egui_wgpu::ScreenDescriptor,
}

/// Owns the egui context and its winit state, specialized to the one panel
/// this viewer has.
pub struct PanelHost {
    context: egui::Context,
    winit_state: egui_winit::State,
}

impl PanelHost {
    pub fn new(window: &Window, max_texture_side: usize) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(max_texture_side),
        );

        Self {
            context,
            winit_state,
        }
    }

    /// Route a window event to egui. A consumed event belongs to the panel,
    /// which is what keeps presses over it from opening a drag.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    /// Run one panel pass and tessellate it for the painter. The background
    /// names are re-read from the library every frame so dialog-added images
    /// show up in the dropdown immediately.
    pub fn run_panel(
        &mut self,
        window: &Window,
        ui: &mut UiState,
        params: &mut GlassParams,
        backgrounds: &BackgroundLibrary,
    ) -> (PanelFrame, UiActions) {
        let names = backgrounds.names();
        let mut actions = UiActions::default();

        let raw_input = self.winit_state.take_egui_input(window);
        let output = self.context.run(raw_input, |ctx| {
            actions = ui.panel(ctx, params, &names);
        });
        self.winit_state
            .handle_platform_output(window, output.platform_output);

        let pixels_per_point = self.context.pixels_per_point();
        let primitives = self.context.tessellate(output.shapes, pixels_per_point);
        let size = window.inner_size();
        let frame = PanelFrame {
            primitives,
            textures_delta: output.textures_delta,
            screen: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [size.width.max(1), size.height.max(1)],
                pixels_per_point,
            },
        };

        (frame, actions)
    }
}
