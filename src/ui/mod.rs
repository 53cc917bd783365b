//! User interface using egui.
//!
//! Provides the mesh statistics / view settings window.

use egui::Context;

use crate::renderer::camera::Camera;
use crate::renderer::PolygonMode;
use crate::terrain::{DrawMode, TerrainMesh};

/// Summary of the uploaded mesh shown in the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshStats {
    pub vertices: usize,
    pub indices: usize,
    pub strips: u32,
    pub verts_per_strip: u32,
    pub draw_calls: usize,
    pub draw_mode: DrawMode,
}

impl MeshStats {
    pub fn from_mesh(mesh: &TerrainMesh) -> Self {
        Self {
            vertices: mesh.vertices.len(),
            indices: mesh.indices.len(),
            strips: mesh.layout.strip_count,
            verts_per_strip: mesh.layout.verts_per_strip,
            draw_calls: mesh.draw_ranges().len(),
            draw_mode: mesh.draw_mode,
        }
    }
}

/// UI state and rendering.
pub struct Ui {
    /// Whether the settings window is open
    pub window_open: bool,
}

impl Ui {
    pub fn new() -> Self {
        Self { window_open: true }
    }

    /// Draw the settings window and report requested actions.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        ctx: &Context,
        camera: &mut Camera,
        polygon_mode: &mut PolygonMode,
        supported_modes: [bool; 3],
        clear_color: &mut [f32; 3],
        stats: &MeshStats,
        fps: f32,
    ) -> UiResponse {
        let mut response = UiResponse::default();

        // Tab brings the window back after closing it
        if ctx.input(|i| i.key_pressed(egui::Key::Tab)) {
            self.window_open = !self.window_open;
        }
        if !self.window_open {
            return response;
        }

        let mut open = true;
        let mut close_clicked = false;
        egui::Window::new("Terrain")
            .open(&mut open)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", fps));
                ui.separator();

                ui.collapsing("Mesh", |ui| {
                    ui.label(format!("Vertices: {}", stats.vertices));
                    ui.label(format!("Indices: {}", stats.indices));
                    ui.label(format!(
                        "Strips: {} x {} indices",
                        stats.strips, stats.verts_per_strip
                    ));
                    let mode = match stats.draw_mode {
                        DrawMode::PerStrip => "per strip",
                        DrawMode::PrimitiveRestart => "primitive restart",
                    };
                    ui.label(format!("Draw calls: {} ({})", stats.draw_calls, mode));
                    if ui.button("Rebuild mesh").clicked() {
                        response.rebuild_mesh = true;
                    }
                });

                ui.collapsing("View", |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Clear color:");
                        ui.color_edit_button_rgb(clear_color);
                    });

                    ui.add(egui::Slider::new(&mut camera.fov, 1.0..=45.0).text("FOV"));

                    ui.horizontal(|ui| {
                        ui.label("Polygons:");
                        for mode in PolygonMode::ALL {
                            let enabled = supported_modes[mode as usize];
                            ui.add_enabled_ui(enabled, |ui| {
                                ui.radio_value(polygon_mode, mode, mode.label());
                            });
                        }
                    });

                    if ui.button("Reset Camera").clicked() {
                        response.reset_camera = true;
                    }
                });

                ui.separator();

                ui.collapsing("Controls", |ui| {
                    ui.label("Mouse: Look");
                    ui.label("WASD: Move");
                    ui.label("Scroll: Zoom");
                    ui.label("F: Toggle mouse look");
                    ui.label("L: Cycle polygon mode");
                    ui.label("R: Reset Camera");
                    ui.label("Tab: Toggle window");
                    ui.label("ESC: Quit");
                });

                if ui.button("Close").clicked() {
                    close_clicked = true;
                }
            });

        self.window_open = open && !close_clicked;
        response
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from UI indicating what actions to take.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UiResponse {
    pub reset_camera: bool,
    pub rebuild_mesh: bool,
}
