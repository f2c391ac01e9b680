use bevy::prelude::*;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy_egui::{egui, EguiContexts};
use std::path::PathBuf;

use crate::app::{Simulation, ViewMode};
use crate::cache::{HorizonGridCache, PlotMetrics};
use crate::physics::refraction::RefractionPreset;
use crate::plot::PlotState;
use crate::render::egui_surface::EguiSurface;

const NORMAL_VIEW_SIZE: egui::Vec2 = egui::vec2(560.0, 320.0);
const TELESCOPE_VIEW_SIZE: egui::Vec2 = egui::vec2(320.0, 320.0);

/// Orbit camera around the horizon plot.
#[derive(Resource)]
pub struct PlotCamera {
    pub focus: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub rotate_speed: f32,
}

impl Default for PlotCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::new(0.0, 2.0, 0.0),
            yaw: -0.8,
            pitch: 0.6,
            distance: 18.0,
            rotate_speed: 0.005,
        }
    }
}

impl PlotCamera {
    pub fn transform(&self) -> Transform {
        let offset = Vec3::new(
            self.distance * self.pitch.cos() * self.yaw.sin(),
            self.distance * self.pitch.sin(),
            self.distance * self.pitch.cos() * self.yaw.cos(),
        );
        Transform::from_translation(self.focus + offset).looking_at(self.focus, Vec3::Y)
    }
}

#[derive(Resource)]
pub struct UiState {
    pub config_path: PathBuf,
    pub export_path: PathBuf,
    pub status: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("horizon_sight.json"),
            export_path: PathBuf::from("horizon_grid.csv"),
            status: None,
        }
    }
}

pub fn plot_camera_system(
    mut orbit: ResMut<PlotCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    mut query: Query<&mut Transform, With<Camera3d>>,
    mut contexts: EguiContexts,
) {
    let ctx = match contexts.try_ctx_mut() {
        Some(ctx) => ctx,
        None => return,
    };
    if ctx.wants_pointer_input() {
        mouse_motion.clear();
        scroll_evr.clear();
        return;
    }

    let mut scroll_line = 0.0;
    for ev in scroll_evr.read() {
        scroll_line += ev.y;
    }
    if scroll_line != 0.0 {
        let zoom_sensitivity = 0.1;
        orbit.distance = (orbit.distance * (1.0 - scroll_line * zoom_sensitivity)).clamp(4.0, 60.0);
    }

    if mouse_button.pressed(MouseButton::Left) || mouse_button.pressed(MouseButton::Right) {
        let speed = orbit.rotate_speed;
        for ev in mouse_motion.read() {
            orbit.yaw -= ev.delta.x * speed;
            orbit.pitch = (orbit.pitch + ev.delta.y * speed).clamp(0.05, 1.5);
        }
    } else {
        mouse_motion.clear();
    }

    for mut transform in query.iter_mut() {
        *transform = orbit.transform();
    }
}

pub fn ui_panel_system(
    mut contexts: EguiContexts,
    sim: Option<ResMut<Simulation>>,
    plot: Option<ResMut<PlotState>>,
    mut ui_state: ResMut<UiState>,
    metrics: Res<PlotMetrics>,
    cache: Res<HorizonGridCache>,
) {
    let (Some(mut sim), Some(mut plot)) = (sim, plot) else { return };
    let ctx = match contexts.try_ctx_mut() {
        Some(ctx) => ctx,
        None => return,
    };

    egui::Window::new("Horizon Parameters").show(ctx, |ui| {
        ui.heading("Observer & Ship");

        let ranges = *sim.ranges();
        let params = *sim.params();

        let mut observer = params.observer_height_m;
        let (lo, hi) = ranges.observer_height_m;
        if ui.add(egui::Slider::new(&mut observer, lo..=hi).text("Observer height (m)")).changed() {
            if let Err(err) = sim.set_observer_height(observer) {
                warn!("observer height rejected: {}", err);
            }
        }

        let mut ship = params.ship_height_m;
        let (lo, hi) = ranges.ship_height_m;
        if ui.add(egui::Slider::new(&mut ship, lo..=hi).text("Ship height (m)")).changed() {
            if let Err(err) = sim.set_ship_height(ship) {
                warn!("ship height rejected: {}", err);
            }
        }

        match sim.distance_slider_max() {
            Ok(max) => {
                let mut distance = sim.params().ship_distance_km;
                if ui.add(egui::Slider::new(&mut distance, 0.0..=max).text("Ship distance (km)")).changed() {
                    if let Err(err) = sim.set_ship_distance(distance) {
                        warn!("ship distance rejected: {}", err);
                    }
                }
            }
            Err(err) => {
                ui.label(format!("Distance unavailable: {}", err));
            }
        }

        let k = sim.params().refraction_factor;
        let selected = RefractionPreset::from_value(k).map_or("Custom", |p| p.label());
        let mut chosen = RefractionPreset::from_value(k);
        egui::ComboBox::from_label("Refraction")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for preset in RefractionPreset::ALL {
                    ui.selectable_value(&mut chosen, Some(preset), preset.label());
                }
            });
        if let Some(preset) = chosen {
            if preset.value() != k {
                if let Err(err) = sim.set_refraction_factor(preset.value()) {
                    warn!("refraction factor rejected: {}", err);
                }
            }
        }

        ui.separator();
        ui.heading("Views");

        let mut telescope = sim.params().telescope_enabled;
        if ui.checkbox(&mut telescope, "Telescope").changed() {
            sim.set_telescope_enabled(telescope);
        }

        let mut animate = sim.params().animation_enabled;
        if ui.checkbox(&mut animate, "Animate ship").changed() {
            sim.set_animation_enabled(animate);
        }
        let mut speed = sim.animation().speed_km_per_s();
        if ui.add(egui::Slider::new(&mut speed, 0.1..=20.0).text("Speed (km/s)")).changed() {
            sim.set_animation_speed(speed);
        }

        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                if let Err(err) = sim.reset() {
                    warn!("reset failed: {}", err);
                }
            }
            if ui.button("Save config").clicked() {
                let config = sim.scene_config(plot.spec);
                ui_state.status = Some(match crate::io::save_scene_config(&ui_state.config_path, &config) {
                    Ok(()) => format!("Saved config to {}", ui_state.config_path.display()),
                    Err(err) => {
                        warn!("config save failed: {:#}", err);
                        format!("Save failed: {}", err)
                    }
                });
            }
        });

        ui.separator();
        ui.heading("Readout");
        match sim.thresholds() {
            Ok(t) => {
                ui.label(format!("Horizon: {:.2} km", t.horizon_distance));
                ui.label(format!("Max visible: {:.2} km", t.max_visible_distance));
                ui.label(format!("Telescope threshold: {:.2} km", t.telescope_threshold));
            }
            Err(err) => {
                ui.label(format!("Invalid geometry: {}", err));
            }
        }
        if let Ok(status) = sim.visibility_status() {
            ui.label(format!("Visibility: {}", status));
        }

        ui.separator();
        ui.heading("Plot");
        let mut samples = plot.spec.height_samples;
        ui.add(egui::Slider::new(&mut samples, 2..=120).text("Height samples"));
        if samples != plot.spec.height_samples {
            plot.spec.height_samples = samples;
        }
        ui.label(format!("Grids Computed: {}", metrics.grids_computed));
        ui.label(format!("Cache Hits: {} ({} grids cached)", metrics.cache_hits, cache.len()));
        ui.label(format!("Last compute: {} ms", metrics.last_compute_time_ms));

        let grid = plot.grid().cloned();
        ui.add_enabled_ui(grid.is_some(), |ui| {
            if ui.button("Export grid CSV").clicked() {
                if let Some(grid) = &grid {
                    ui_state.status = Some(match crate::io::write_grid_csv(&ui_state.export_path, grid) {
                        Ok(rows) => format!("Wrote {} rows to {}", rows, ui_state.export_path.display()),
                        Err(err) => {
                            warn!("grid export failed: {:#}", err);
                            format!("Export failed: {}", err)
                        }
                    });
                }
            }
        });
        if let Some(status) = &ui_state.status {
            ui.label(status);
        }
    });

    egui::Window::new("Horizon Views").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let (normal_response, normal_painter) = ui.allocate_painter(NORMAL_VIEW_SIZE, egui::Sense::hover());
            let telescope_area = match sim.view_mode() {
                ViewMode::NormalPlusTelescope => Some(ui.allocate_painter(TELESCOPE_VIEW_SIZE, egui::Sense::hover())),
                ViewMode::NormalOnly => None,
            };

            let mut normal = EguiSurface::new(&normal_painter, normal_response.rect);
            let mut telescope = telescope_area
                .as_ref()
                .map(|(response, painter)| EguiSurface::new(painter, response.rect));
            if let Err(err) = sim.render(&mut normal, telescope.as_mut()) {
                warn!("skipping views this frame: {}", err);
            }
        });
    });
}
