//! Debug panel: material sliders, background selector, settings buttons.

use crate::scene::GlassParams;

/// What the user did in the panel this frame. Consumed by the app after the
/// egui pass so dialog work happens outside the UI closure.
#[derive(Debug, Default)]
pub struct UiActions {
    pub background_selected: Option<usize>,
    pub add_image: bool,
    pub save_settings: bool,
    pub load_settings: bool,
}

pub struct UiState {
    selected_background: usize,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            selected_background: 0,
        }
    }

    pub fn selected_background(&self) -> usize {
        self.selected_background
    }

    pub fn set_selected_background(&mut self, index: usize) {
        self.selected_background = index;
    }

    pub fn panel(
        &mut self,
        ctx: &egui::Context,
        params: &mut GlassParams,
        backgrounds: &[&str],
    ) -> UiActions {
        let mut actions = UiActions::default();

        egui::SidePanel::left("debug_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Material");
                ui.add(egui::Slider::new(&mut params.clearcoat, 0.0..=1.0).text("clearcoat"));
                ui.add(
                    egui::Slider::new(&mut params.clearcoat_roughness, 0.0..=1.0)
                        .text("clearcoat roughness"),
                );
                ui.add(
                    egui::Slider::new(&mut params.env_map_intensity, 0.0..=1.0)
                        .text("env map intensity"),
                );
                ui.add(egui::Slider::new(&mut params.metalness, 0.0..=1.0).text("metalness"));
                ui.add(egui::Slider::new(&mut params.roughness, 0.0..=1.0).text("roughness"));
                ui.add(egui::Slider::new(&mut params.thickness, 0.0..=10.0).text("thickness"));
                ui.add(
                    egui::Slider::new(&mut params.transmission, 0.0..=1.0).text("transmission"),
                );

                ui.separator();
                ui.heading("Background");
                let current = backgrounds
                    .get(self.selected_background)
                    .copied()
                    .unwrap_or("white")
                    .to_string();
                egui::ComboBox::from_label("image")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for (index, name) in backgrounds.iter().enumerate() {
                            if ui
                                .selectable_value(&mut self.selected_background, index, *name)
                                .changed()
                            {
                                actions.background_selected = Some(index);
                            }
                        }
                    });
                if ui.button("Add image...").clicked() {
                    actions.add_image = true;
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save settings").clicked() {
                        actions.save_settings = true;
                    }
                    if ui.button("Load settings").clicked() {
                        actions.load_settings = true;
                    }
                });
            });

        actions
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_frame_reports_no_actions() {
        let ctx = egui::Context::default();
        let mut state = UiState::new();
        let mut params = GlassParams::default();
        let backgrounds = ["white", "studio.jpg"];

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            let actions = state.panel(ctx, &mut params, &backgrounds);
            assert!(actions.background_selected.is_none());
            assert!(!actions.add_image);
            assert!(!actions.save_settings);
            assert!(!actions.load_settings);
        });

        assert_eq!(state.selected_background(), 0);
        assert_eq!(params, GlassParams::default());
    }

    #[test]
    fn selection_survives_an_empty_library() {
        let ctx = egui::Context::default();
        let mut state = UiState::new();
        state.set_selected_background(3);
        let mut params = GlassParams::default();

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            state.panel(ctx, &mut params, &[]);
        });

        assert_eq!(state.selected_background(), 3);
    }
}
