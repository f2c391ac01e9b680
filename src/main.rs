use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::EguiPlugin;
use futures_lite::future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use horizon_sight::animation::SystemClock;
use horizon_sight::app::Simulation;
use horizon_sight::cache::{HorizonGridCache, PlotMetrics};
use horizon_sight::config::SceneConfig;
use horizon_sight::io::load_scene_config;
use horizon_sight::physics::GeometryError;
use horizon_sight::plot::{compute_horizon_grid, GridKey, HorizonGrid, PlotMarker, PlotState};
use horizon_sight::render::plot::{create_horizon_mesh, PlotFrame, PLOT_EXTENT};
use horizon_sight::ui::{plot_camera_system, ui_panel_system, PlotCamera, UiState};

const CONFIG_ENV: &str = "HORIZON_SIGHT_CONFIG";
const CONFIG_FILE: &str = "horizon_sight.json";

#[derive(Component)]
struct HorizonSurface(GridKey);

#[derive(Component)]
struct GridTask {
    task: Task<Result<HorizonGrid, GeometryError>>,
    key: GridKey,
    started: Instant,
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(EguiPlugin)
        .init_resource::<HorizonGridCache>()
        .init_resource::<PlotMetrics>()
        .init_resource::<PlotCamera>()
        .init_resource::<UiState>()
        .add_systems(Startup, (setup_scene, setup_simulation))
        .add_systems(Update, (
            advance_simulation,
            plot_camera_system,
            ui_panel_system,
            schedule_grid_task,
            handle_grid_tasks,
            sync_plot_mesh,
            draw_plot_marker,
        ))
        .run();
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

fn load_config(path: &Path) -> SceneConfig {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return SceneConfig::default();
    }
    match load_scene_config(path) {
        Ok(config) => config,
        Err(err) => {
            warn!("Falling back to default config: {:#}", err);
            SceneConfig::default()
        }
    }
}

fn setup_simulation(mut commands: Commands, mut ui_state: ResMut<UiState>) {
    let path = config_path();
    let mut config = load_config(&path);
    ui_state.config_path = path;
    config.plot.earth_radius_km = config.earth_radius_km;

    let sim = match Simulation::new(&config, Box::new(SystemClock::default())) {
        Ok(sim) => sim,
        Err(err) => {
            warn!("Config rejected ({}), using defaults", err);
            config = SceneConfig::default();
            match Simulation::new(&config, Box::new(SystemClock::default())) {
                Ok(sim) => sim,
                Err(err) => {
                    error!("Default scene is invalid: {}", err);
                    return;
                }
            }
        }
    };

    if let Ok(t) = sim.thresholds() {
        info!(
            "Horizon {:.2} km, max visible {:.2} km, telescope threshold {:.2} km",
            t.horizon_distance, t.max_visible_distance, t.telescope_threshold
        );
    }

    commands.insert_resource(PlotState::new(config.plot));
    commands.insert_resource(sim);
}

fn setup_scene(mut commands: Commands, orbit: Res<PlotCamera>) {
    commands.spawn((Camera3d::default(), orbit.transform()));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4)),
    ));
}

fn advance_simulation(time: Res<Time>, sim: Option<ResMut<Simulation>>) {
    let Some(mut sim) = sim else { return };
    if let Err(err) = sim.advance_frame(time.delta_secs_f64()) {
        warn!("Animation step skipped: {}", err);
    }
}

fn schedule_grid_task(
    mut commands: Commands,
    plot: Option<ResMut<PlotState>>,
    cache: Res<HorizonGridCache>,
    mut metrics: ResMut<PlotMetrics>,
    computing: Query<&GridTask>,
) {
    let Some(mut plot) = plot else { return };
    if plot.is_current() {
        return;
    }
    let key = plot.spec.key();
    if computing.iter().any(|t| t.key == key) {
        return;
    }

    if let Some(grid) = cache.get(&key) {
        metrics.cache_hits += 1;
        plot.publish(key, grid);
        return;
    }

    let spec = plot.spec;
    let task_pool = AsyncComputeTaskPool::get();
    let task = task_pool.spawn(async move { compute_horizon_grid(&spec) });
    info!(
        "Computing horizon grid {}x{}",
        spec.height_samples, spec.refraction_samples
    );
    commands.spawn(GridTask { task, key, started: Instant::now() });
}

fn handle_grid_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut GridTask)>,
    plot: Option<ResMut<PlotState>>,
    cache: Res<HorizonGridCache>,
    mut metrics: ResMut<PlotMetrics>,
) {
    let Some(mut plot) = plot else { return };

    for (entity, mut task) in &mut tasks {
        let Some(result) = future::block_on(future::poll_once(&mut task.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        let grid = match result {
            Ok(grid) => Arc::new(grid),
            Err(err) => {
                warn!("Horizon grid failed: {}", err);
                continue;
            }
        };
        metrics.grids_computed += 1;
        metrics.last_compute_time_ms = task.started.elapsed().as_millis() as u64;
        cache.insert(task.key, grid.clone());

        // A newer spec may already be pending; only the matching grid is shown.
        if task.key == plot.spec.key() {
            plot.publish(task.key, grid);
        }
    }
}

fn sync_plot_mesh(
    mut commands: Commands,
    plot: Option<Res<PlotState>>,
    surfaces: Query<(Entity, &HorizonSurface)>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(plot) = plot else { return };
    let (Some(key), Some(grid)) = (plot.shown_key(), plot.grid()) else { return };
    if surfaces.iter().any(|(_, surface)| surface.0 == key) {
        return;
    }

    for (old, _) in surfaces.iter() {
        commands.entity(old).despawn_recursive();
    }
    let mesh_handle = meshes.add(create_horizon_mesh(grid));
    let material_handle = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 1.0,
        cull_mode: None,
        ..default()
    });
    commands.spawn((
        Mesh3d(mesh_handle),
        MeshMaterial3d(material_handle),
        Transform::from_xyz(-PLOT_EXTENT / 2.0, 0.0, -PLOT_EXTENT / 2.0),
        HorizonSurface(key),
    ));
    info!("Plot surface rebuilt with {} samples", grid.x.len() * grid.y.len());
}

fn draw_plot_marker(
    mut gizmos: Gizmos,
    plot: Option<Res<PlotState>>,
    sim: Option<Res<Simulation>>,
) {
    let (Some(plot), Some(sim)) = (plot, sim) else { return };
    let Some(grid) = plot.grid() else { return };

    let params = sim.params();
    let marker = match PlotMarker::new(params.observer_height_m, params.refraction_factor, sim.earth_radius_km()) {
        Ok(marker) => marker,
        Err(_) => return,
    };
    let offset = Vec3::new(-PLOT_EXTENT / 2.0, 0.0, -PLOT_EXTENT / 2.0);
    let position = PlotFrame::for_grid(grid).marker_position(&marker) + offset;

    gizmos.sphere(
        Isometry3d::from_translation(position),
        0.15,
        Color::srgb(1.0, 0.0, 0.0),
    ).resolution(32);
    gizmos.line(
        position,
        Vec3::new(position.x, 0.0, position.z),
        Color::srgb(1.0, 0.0, 0.0),
    );
}
