//! Vitrine - interactive glass-material model viewer.
//!
//! A faceted glass model floats over a swappable background texture. Dragging
//! the model spins it with flick inertia; an egui side panel exposes the
//! material parameters, the background library, and settings save/load.

mod app;
mod assets;
mod render;
mod scene;
mod ui;

fn main() {
    app::run();
}
