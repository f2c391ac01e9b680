use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::animation::{AnimationDriver, Heading, ManualClock};
use crate::app::{Simulation, SimulationParameters, ViewMode};
use crate::cache::HorizonGridCache;
use crate::config::{SceneConfig, SimulationConfig};
use crate::geo::{EarthModel, EARTH_RADIUS_KM};
use crate::io::{load_scene_config, save_scene_config, write_grid_csv};
use crate::physics::refraction::{effective_earth_radius, RefractionPreset};
use crate::physics::{
    horizon_distance, max_visible_distance, minimum_visible_height, telescope_visibility_threshold,
    visible_fraction, GeometryError, TelescopeOptics, VisibilityStatus, VisibilityThresholds,
};
use crate::plot::{compute_horizon_grid, GridSpec, PlotMarker, PlotState};
use crate::render::canvas::{CanvasState, ClipRegion};
use crate::render::clip::{clip_polygon, clip_segment, region_polygon, signed_area};
use crate::render::normal::NormalViewLayout;
use crate::render::plot::{create_horizon_mesh, get_color, PlotFrame, PLOT_EXTENT, PLOT_HEIGHT};
use crate::render::recording::{DrawCommand, DrawOp};
use crate::render::ship::SHIP_HEIGHT_UNITS;
use crate::render::telescope::{visibility_factor, TelescopeLayout};
use crate::render::{
    approach_profile, base_scale, draw_ship, pt, Color, NormalView, Rect, RecordingSurface, ShipOptions,
    SmokeAnimation, Surface, TelescopeView,
};

const R: f64 = EARTH_RADIUS_KM;

fn params(observer: f64, ship: f64, distance: f64, k: f64) -> SimulationParameters {
    SimulationParameters {
        observer_height_m: observer,
        ship_height_m: ship,
        ship_distance_km: distance,
        refraction_factor: k,
        ..SimulationParameters::default()
    }
}

fn manual_simulation() -> (Simulation, ManualClock) {
    let clock = ManualClock::default();
    let sim = Simulation::new(&SceneConfig::default(), Box::new(clock.clone())).unwrap();
    (sim, clock)
}

fn clipped(commands: &[DrawCommand], min_clips: usize) -> Vec<&DrawCommand> {
    commands.iter().filter(|c| c.clips.len() >= min_clips).collect()
}

// --- Geometry ---

#[test]
fn test_horizon_one_metre_observer() {
    let d = horizon_distance(1.0, R, 1.0).unwrap();
    assert!((d - 3.82).abs() < 0.01, "got {d}");
}

#[test]
fn test_thirty_metre_ship() {
    let ship = horizon_distance(30.0, R, 1.0).unwrap();
    let max = max_visible_distance(1.0, 30.0, R, 1.0).unwrap();
    assert!((ship - 20.9).abs() < 0.1, "got {ship}");
    assert!((max - 24.7).abs() < 0.1, "got {max}");
}

#[test]
fn test_default_scene_max_visible_distance() {
    let max = max_visible_distance(2.0, 50.0, R, 1.33).unwrap();
    assert!((max - 37.4).abs() < 0.1, "got {max}");
}

#[test]
fn test_fraction_at_max_distance_is_zero() {
    for (observer, ship) in [(1.0, 5.0), (2.0, 50.0), (100.0, 100.0)] {
        let max = max_visible_distance(observer, ship, R, 1.33).unwrap();
        let fraction = visible_fraction(max, observer, ship, R, 1.33).unwrap();
        assert_eq!(fraction, 0.0);

        let horizon = horizon_distance(observer, R, 1.33).unwrap();
        let profile = approach_profile(max, horizon, max, base_scale(ship));
        assert_eq!(profile.sink_fraction, 1.0);
    }
}

#[test]
fn test_tiny_ship_degenerate_range() {
    let horizon = horizon_distance(2.0, R, 1.0).unwrap();
    let max = max_visible_distance(2.0, 0.0, R, 1.0).unwrap();
    assert!((max - horizon).abs() < 1e-12);

    assert_eq!(visible_fraction(horizon, 2.0, 0.0, R, 1.0).unwrap(), 1.0);
    assert_eq!(visible_fraction(horizon + 1e-6, 2.0, 0.0, R, 1.0).unwrap(), 0.0);

    let profile = approach_profile(horizon + 1e-6, horizon, max, base_scale(0.0));
    assert_eq!(profile.sink_fraction, 1.0);
}

#[test]
fn test_horizon_grows_with_height_and_refraction() {
    let mut last = 0.0;
    for h in [0.0, 1.0, 2.0, 10.0, 50.0, 100.0] {
        let d = horizon_distance(h, R, 1.0).unwrap();
        assert!(d >= last);
        last = d;
    }
    let mut last = 0.0;
    for preset in RefractionPreset::ALL {
        let d = horizon_distance(10.0, R, preset.value()).unwrap();
        assert!(d > last);
        last = d;
    }
}

#[test]
fn test_visible_fraction_is_monotone_and_bounded() {
    let max = max_visible_distance(2.0, 50.0, R, 1.33).unwrap();
    let mut last = 1.0;
    for i in 0..=100 {
        let d = max * 1.2 * i as f64 / 100.0;
        let f = visible_fraction(d, 2.0, 50.0, R, 1.33).unwrap();
        assert!((0.0..=1.0).contains(&f));
        assert!(f <= last + 1e-12);
        last = f;
    }
}

#[test]
fn test_minimum_visible_height_inverts_max_distance() {
    for ship in [5.0, 30.0, 50.0, 100.0] {
        let max = max_visible_distance(2.0, ship, R, 1.33).unwrap();
        let needed = minimum_visible_height(max, 2.0, R, 1.33).unwrap();
        assert!((needed - ship).abs() < 1e-6, "{ship} -> {needed}");
    }
    let horizon = horizon_distance(2.0, R, 1.33).unwrap();
    assert_eq!(minimum_visible_height(horizon * 0.5, 2.0, R, 1.33).unwrap(), 0.0);
}

#[test]
fn test_invalid_inputs_are_rejected() {
    assert_eq!(
        horizon_distance(-1.0, R, 1.0),
        Err(GeometryError::InvalidParameter { name: "height_m", value: -1.0 })
    );
    assert!(horizon_distance(f64::NAN, R, 1.0).is_err());
    assert!(horizon_distance(1.0, 0.0, 1.0).is_err());
    assert!(horizon_distance(1.0, R, 0.0).is_err());
    assert!(visible_fraction(-0.5, 2.0, 50.0, R, 1.0).is_err());
    assert!(effective_earth_radius(R, -1.33).is_err());

    let bad_fov = TelescopeOptics { field_of_view_deg: 0.0, ..TelescopeOptics::default() };
    assert!(telescope_visibility_threshold(2.0, 50.0, &bad_fov, R, 1.33).is_err());
    let bad_mag = TelescopeOptics { magnification: -2.0, ..TelescopeOptics::default() };
    assert!(telescope_visibility_threshold(2.0, 50.0, &bad_mag, R, 1.33).is_err());
}

#[test]
fn test_telescope_threshold_below_horizon() {
    let optics = TelescopeOptics::default();
    for (observer, ship) in [(1.0, 5.0), (2.0, 50.0), (50.0, 5.0), (100.0, 100.0)] {
        for preset in RefractionPreset::ALL {
            let k = preset.value();
            let t = VisibilityThresholds::compute(observer, ship, R, k, &optics).unwrap();
            assert!(t.telescope_threshold >= 0.0);
            assert!(t.telescope_threshold <= t.horizon_distance + 1e-12);
            assert!(t.horizon_distance <= t.max_visible_distance);
            assert!(t.sink_range() >= 0.0);
        }
    }

    let default_scene = telescope_visibility_threshold(2.0, 50.0, &optics, R, 1.33).unwrap();
    assert!((default_scene - 4.775).abs() < 0.01, "got {default_scene}");
}

#[test]
fn test_earth_model_defaults() {
    let earth = EarthModel::default();
    assert_eq!(earth.radius_km, 7320.0);
    assert_eq!(earth.refraction, 1.0);
    let d = earth.horizon_distance(1.0).unwrap();
    assert!((d - 3.82).abs() < 0.01);
    let max = EarthModel::with_refraction(1.33).max_visible_distance(2.0, 50.0).unwrap();
    assert!((max - 37.4).abs() < 0.1);
}

#[test]
fn test_visibility_status_labels() {
    assert_eq!(VisibilityStatus::from_fraction(1.0).to_string(), "Fully Visible");
    assert_eq!(VisibilityStatus::from_fraction(0.995).to_string(), "Fully Visible");
    assert_eq!(VisibilityStatus::from_fraction(0.0).to_string(), "Not Visible");
    assert_eq!(VisibilityStatus::from_fraction(0.426).to_string(), "43% Visible");
}

#[test]
fn test_refraction_presets() {
    assert_eq!(RefractionPreset::from_value(1.33), Some(RefractionPreset::Standard));
    assert_eq!(RefractionPreset::from_value(1.25), None);
    assert_eq!(RefractionPreset::Strong.value(), 1.5);
}

// --- Approach profile ---

#[test]
fn test_sink_is_monotone_and_continuous_at_horizon() {
    let horizon = horizon_distance(2.0, R, 1.33).unwrap();
    let max = max_visible_distance(2.0, 50.0, R, 1.33).unwrap();

    let at = approach_profile(horizon, horizon, max, 1.0);
    let past = approach_profile(horizon + 1e-9, horizon, max, 1.0);
    assert!((at.scale - 0.25).abs() < 1e-12);
    assert!((past.scale - 0.25).abs() < 1e-12);
    assert_eq!(at.sink_fraction, 0.0);
    assert!(past.sink_fraction < 1e-6);

    let mut last = 0.0;
    for i in 0..=50 {
        let d = max * 1.1 * i as f64 / 50.0;
        let profile = approach_profile(d, horizon, max, 1.0);
        assert!((0.0..=1.0).contains(&profile.sink_fraction));
        assert!(profile.sink_fraction >= last);
        last = profile.sink_fraction;
    }
    assert_eq!(last, 1.0);
}

#[test]
fn test_scale_shrinks_to_a_quarter() {
    let start = approach_profile(0.0, 6.0, 30.0, 2.0);
    assert_eq!(start.scale, 2.0);
    let half = approach_profile(3.0, 6.0, 30.0, 2.0);
    assert!((half.scale - 1.25).abs() < 1e-12);
    let zero_horizon = approach_profile(0.0, 0.0, 10.0, 1.0);
    assert_eq!(zero_horizon.progress, 0.0);
    assert_eq!(base_scale(50.0), 1.0);
}

// --- Canvas and clipping ---

#[test]
fn test_canvas_transform_and_restore() {
    let mut canvas = CanvasState::default();
    canvas.save();
    canvas.translate(10.0, 20.0);
    canvas.scale(2.0);
    assert_eq!(canvas.to_device(pt(1.0, 1.0)), pt(12.0, 22.0));
    canvas.clip_rect(Rect::from_min_size(pt(0.0, 0.0), 5.0, 5.0));
    assert_eq!(canvas.clips(), &[ClipRegion::Rect(Rect::from_min_size(pt(10.0, 20.0), 10.0, 10.0))]);
    canvas.restore();
    assert_eq!(canvas.to_device(pt(1.0, 1.0)), pt(1.0, 1.0));
    assert!(canvas.clips().is_empty());

    // Unbalanced restore is ignored.
    canvas.restore();
    assert_eq!(canvas.depth(), 0);
}

#[test]
fn test_clip_polygon_against_rect() {
    let square = Rect::from_min_size(pt(0.0, 0.0), 10.0, 10.0).corners();
    let clip = region_polygon(&ClipRegion::Rect(Rect::from_min_size(pt(5.0, 5.0), 10.0, 10.0)));
    let out = clip_polygon(&square, &clip);
    assert!((signed_area(&out).abs() - 25.0).abs() < 1e-3);

    let far = region_polygon(&ClipRegion::Rect(Rect::from_min_size(pt(50.0, 50.0), 1.0, 1.0)));
    assert!(clip_polygon(&square, &far).len() < 3);
}

#[test]
fn test_clip_polygon_against_circle() {
    let big = Rect::from_min_size(pt(-100.0, -100.0), 200.0, 200.0).corners();
    let circle = region_polygon(&ClipRegion::Circle { center: pt(0.0, 0.0), radius: 10.0 });
    let out = clip_polygon(&big, &circle);
    let area = signed_area(&out).abs();
    let expected = std::f32::consts::PI * 100.0;
    assert!((area - expected).abs() / expected < 0.02, "area {area}");
}

#[test]
fn test_clip_segment() {
    let clip = region_polygon(&ClipRegion::Rect(Rect::from_min_size(pt(0.0, 0.0), 10.0, 10.0)));
    let (a, b) = clip_segment(pt(-5.0, 5.0), pt(15.0, 5.0), &clip).unwrap();
    assert!((a.x - 0.0).abs() < 1e-4 && (a.y - 5.0).abs() < 1e-4);
    assert!((b.x - 10.0).abs() < 1e-4 && (b.y - 5.0).abs() < 1e-4);
    assert!(clip_segment(pt(-5.0, -5.0), pt(-1.0, 20.0), &clip).is_none());
}

// --- Ship ---

#[test]
fn test_ship_fully_sunk_draws_nothing() {
    let mut surface = RecordingSurface::new(400.0, 300.0);
    draw_ship(&mut surface, pt(200.0, 150.0), 1.0, 1.0, &ShipOptions::default());
    assert!(surface.commands().is_empty());
    assert_eq!(surface.save_depth(), 0);
}

#[test]
fn test_ship_stays_above_waterline_while_sinking() {
    for sink in [0.0, 0.3, 0.8] {
        let mut surface = RecordingSurface::new(400.0, 300.0);
        draw_ship(&mut surface, pt(200.0, 150.0), 1.5, sink, &ShipOptions::default());
        assert!(!surface.commands().is_empty());
        for cmd in surface.commands() {
            if let Some(bounds) = cmd.visible_bounds() {
                assert!(bounds.max.y <= 150.0 + 1e-3);
            }
        }
        assert_eq!(surface.save_depth(), 0);
    }
}

#[test]
fn test_ship_sinks_from_the_bottom_up() {
    let anchor = pt(200.0, 150.0);
    let scale = 1.5;
    let mut last_hull = f32::INFINITY;
    let mut last_mast = f32::INFINITY;
    let mut hull_gone_while_mast_shows = false;

    for sink in [0.0, 0.2, 0.5, 0.9] {
        let mut surface = RecordingSurface::new(400.0, 300.0);
        draw_ship(&mut surface, anchor, scale, sink, &ShipOptions::default());
        let commands = surface.commands();

        let top = commands
            .iter()
            .filter_map(|c| c.visible_bounds())
            .map(|b| b.min.y)
            .fold(f32::INFINITY, f32::min);
        let expected = anchor.y - (1.0 - sink as f32) * SHIP_HEIGHT_UNITS * scale;
        assert!((top - expected).abs() < 1e-3, "sink {sink}: top {top}, expected {expected}");

        // Hull is the first fill; the mainmast is the stroke reaching the top.
        let hull = commands
            .iter()
            .find(|c| matches!(c.op, DrawOp::Fill { .. }))
            .and_then(|c| c.visible_bounds())
            .map_or(0.0, |b| b.height());
        let mast = commands
            .iter()
            .filter(|c| matches!(c.op, DrawOp::Stroke { .. }))
            .filter_map(|c| c.visible_bounds())
            .filter(|b| (b.min.y - expected).abs() < 1e-3)
            .map(|b| b.height())
            .fold(0.0, f32::max);

        assert!(mast > 0.0, "sink {sink}: mast tip hidden");
        assert!(hull <= last_hull + 1e-3);
        assert!(mast <= last_mast + 1e-3);
        if hull == 0.0 {
            hull_gone_while_mast_shows = true;
        }
        last_hull = hull;
        last_mast = mast;
    }
    assert!(hull_gone_while_mast_shows);
}

#[test]
fn test_ship_opacity_fades_colors() {
    let mut surface = RecordingSurface::new(400.0, 300.0);
    let options = ShipOptions { smoke: None, opacity: 0.5 };
    draw_ship(&mut surface, pt(200.0, 150.0), 1.0, 0.0, &options);
    for cmd in surface.commands() {
        if let DrawOp::Fill { color, .. } = &cmd.op {
            assert!(color.a <= 128);
        }
    }
}

#[test]
fn test_smoke_offset_only_moves_forward() {
    let mut smoke = SmokeAnimation::default();
    smoke.advance(1.0);
    let after = smoke.offset();
    assert!(after > 0.0);
    smoke.advance(-3.0);
    smoke.advance(f64::NAN);
    assert_eq!(smoke.offset(), after);

    let mut with_smoke = RecordingSurface::new(400.0, 300.0);
    let mut without = RecordingSurface::new(400.0, 300.0);
    draw_ship(&mut with_smoke, pt(200.0, 250.0), 1.0, 0.0, &ShipOptions { smoke: Some(smoke), opacity: 1.0 });
    draw_ship(&mut without, pt(200.0, 250.0), 1.0, 0.0, &ShipOptions::default());
    assert!(with_smoke.commands().len() > without.commands().len());
}

// --- Normal view ---

#[test]
fn test_normal_view_readout() {
    let mut surface = RecordingSurface::new(800.0, 400.0);
    NormalView::new(R)
        .render(&mut surface, &params(2.0, 50.0, 0.0, 1.33), None)
        .unwrap();
    let texts = surface.texts();
    assert_eq!(
        texts,
        vec![
            "Observer height: 2.0 m",
            "Horizon distance: 6.24 km",
            "Ship distance: 0.00 km",
            "Ship height: 50 m",
            "Visibility: Fully Visible",
        ]
    );
}

#[test]
fn test_normal_view_ship_at_dock() {
    let mut surface = RecordingSurface::new(800.0, 400.0);
    let state = NormalView::new(R)
        .render(&mut surface, &params(2.0, 50.0, 0.0, 1.33), None)
        .unwrap();
    let layout = NormalViewLayout::for_size(800.0, 400.0);
    assert_eq!(state.anchor, layout.shore_anchor);
    assert_eq!(state.scale, 1.0);
    assert_eq!(state.sink_fraction, 0.0);
    // Ship parts carry only the ship's own clip.
    let ship = clipped(surface.commands(), 1);
    assert!(!ship.is_empty());
    assert!(ship.iter().all(|c| c.clips.len() == 1));
}

#[test]
fn test_normal_view_never_draws_ship_below_horizon() {
    let horizon = horizon_distance(2.0, R, 1.33).unwrap();
    let max = max_visible_distance(2.0, 50.0, R, 1.33).unwrap();
    let layout = NormalViewLayout::for_size(800.0, 400.0);

    for d in [horizon + 0.1, (horizon + max) / 2.0, horizon + 0.75 * (max - horizon)] {
        let mut surface = RecordingSurface::new(800.0, 400.0);
        let state = NormalView::new(R)
            .render(&mut surface, &params(2.0, 50.0, d, 1.33), None)
            .unwrap();
        assert_eq!(state.anchor, layout.horizon_anchor);
        assert!(state.sink_fraction > 0.0 && state.sink_fraction < 1.0);

        let ship = clipped(surface.commands(), 2);
        assert!(ship.iter().any(|c| c.is_visible()));
        for cmd in ship {
            if let Some(bounds) = cmd.visible_bounds() {
                assert!(bounds.max.y <= layout.horizon_y + 1e-3);
            }
        }
        assert_eq!(surface.save_depth(), 0);
    }
}

#[test]
fn test_normal_view_ship_gone_at_max_distance() {
    let max = max_visible_distance(2.0, 50.0, R, 1.33).unwrap();
    let mut surface = RecordingSurface::new(800.0, 400.0);
    let state = NormalView::new(R)
        .render(&mut surface, &params(2.0, 50.0, max, 1.33), None)
        .unwrap();
    assert_eq!(state.sink_fraction, 1.0);
    assert!(clipped(surface.commands(), 1).is_empty());
    assert!(surface.texts().contains(&"Visibility: Not Visible"));
}

#[test]
fn test_normal_view_rejects_bad_parameters() {
    let mut surface = RecordingSurface::new(800.0, 400.0);
    let result = NormalView::new(R).render(&mut surface, &params(-2.0, 50.0, 0.0, 1.33), None);
    assert!(result.is_err());
}

// --- Telescope view ---

#[test]
fn test_visibility_factor_ramp() {
    assert_eq!(visibility_factor(1.0, 4.0, 6.0), 0.0);
    assert_eq!(visibility_factor(4.0, 4.0, 6.0), 0.0);
    assert!((visibility_factor(5.0, 4.0, 6.0) - 0.5).abs() < 1e-12);
    assert_eq!(visibility_factor(6.0, 4.0, 6.0), 1.0);
    assert_eq!(visibility_factor(20.0, 4.0, 6.0), 1.0);
    // Threshold at the horizon: a step.
    assert_eq!(visibility_factor(6.0, 6.0, 6.0), 1.0);
}

#[test]
fn test_telescope_hides_ship_before_threshold() {
    let view = TelescopeView::new(R, SceneConfig::default().telescope);
    let mut surface = RecordingSurface::new(400.0, 400.0);
    let frame = view.render(&mut surface, &params(2.0, 50.0, 1.0, 1.33), None).unwrap();
    assert_eq!(frame.visibility_factor, 0.0);
    assert!(clipped(surface.commands(), 3).is_empty());
}

#[test]
fn test_telescope_reveal_fades_and_rises() {
    let config = SceneConfig::default().telescope;
    let view = TelescopeView::new(R, config);
    let t = VisibilityThresholds::compute(2.0, 50.0, R, 1.33, &config.optics).unwrap();
    let layout = TelescopeLayout::for_size(400.0, 400.0);

    let mid = (t.telescope_threshold + t.horizon_distance) / 2.0;
    let frame = view.frame(&params(2.0, 50.0, mid, 1.33), &layout).unwrap();
    assert!((frame.visibility_factor - 0.5).abs() < 1e-9);
    assert!(frame.rise_offset > 0.0);
    assert!(frame.ship.anchor.y > layout.horizon_y);

    let full = view.frame(&params(2.0, 50.0, t.horizon_distance, 1.33), &layout).unwrap();
    assert_eq!(full.visibility_factor, 1.0);
    assert_eq!(full.rise_offset, 0.0);
    assert_eq!(full.ship.anchor.y, layout.horizon_y);
}

#[test]
fn test_telescope_ship_clipped_to_upper_eyepiece() {
    let config = SceneConfig::default().telescope;
    let view = TelescopeView::new(R, config);
    let t = VisibilityThresholds::compute(2.0, 50.0, R, 1.33, &config.optics).unwrap();
    let layout = TelescopeLayout::for_size(400.0, 400.0);

    for d in [
        (t.telescope_threshold + t.horizon_distance) / 2.0,
        t.horizon_distance,
        (t.horizon_distance + t.max_visible_distance) / 2.0,
    ] {
        let mut surface = RecordingSurface::new(400.0, 400.0);
        view.render(&mut surface, &params(2.0, 50.0, d, 1.33), None).unwrap();
        let ship = clipped(surface.commands(), 3);
        assert!(ship.iter().any(|c| c.is_visible()), "no ship at {d}");
        for cmd in ship {
            assert!(cmd.clips.iter().any(|c| matches!(c, ClipRegion::Circle { .. })));
            if let Some(bounds) = cmd.visible_bounds() {
                assert!(bounds.max.y <= layout.horizon_y + 1e-3);
            }
        }
        assert_eq!(surface.save_depth(), 0);
    }
}

#[test]
fn test_telescope_reticle_drawn_last_and_unclipped() {
    let view = TelescopeView::new(R, SceneConfig::default().telescope);
    let horizon = horizon_distance(2.0, R, 1.33).unwrap();
    let mut surface = RecordingSurface::new(400.0, 400.0);
    view.render(&mut surface, &params(2.0, 50.0, horizon, 1.33), None).unwrap();

    let commands = surface.commands();
    let last_clipped = commands.iter().rposition(|c| !c.clips.is_empty()).unwrap();
    let overlay = &commands[last_clipped + 1..];
    // Two crosshair lines, ticks on four half-arms, two barrel rings, the label.
    assert_eq!(overlay.len(), 2 + 4 * 4 + 2 + 1);
    assert!(overlay.iter().all(|c| c.clips.is_empty()));
    match &overlay[overlay.len() - 1].op {
        DrawOp::Text { text, .. } => assert_eq!(text, "20x"),
        other => panic!("unexpected last op {other:?}"),
    }
}

// --- Animation ---

#[test]
fn test_animation_sails_and_turns_around() {
    let clock = ManualClock::default();
    let mut driver = AnimationDriver::new(Box::new(clock.clone()), 2.0);

    assert_eq!(driver.tick(1.0, 10.0), 1.0);
    driver.start();
    assert!(driver.is_running());

    clock.advance(Duration::from_secs(1));
    let d = driver.tick(0.0, 10.0);
    assert!((d - 2.0).abs() < 1e-9);

    clock.advance(Duration::from_secs(10));
    let d = driver.tick(d, 10.0);
    assert_eq!(d, 10.0);
    assert_eq!(driver.heading(), Heading::Inbound);

    clock.advance(Duration::from_secs(1));
    let d = driver.tick(d, 10.0);
    assert!((d - 8.0).abs() < 1e-9);

    clock.advance(Duration::from_secs(60));
    let d = driver.tick(d, 10.0);
    assert_eq!(d, 0.0);
    assert_eq!(driver.heading(), Heading::Outbound);
}

#[test]
fn test_animation_stop_is_idempotent() {
    let clock = ManualClock::default();
    let mut driver = AnimationDriver::new(Box::new(clock.clone()), 2.0);
    driver.start();
    driver.stop();
    driver.stop();
    assert!(!driver.is_running());
    clock.advance(Duration::from_secs(5));
    assert_eq!(driver.tick(3.0, 10.0), 3.0);

    // Restarting does not replay the time spent stopped.
    driver.start();
    clock.advance(Duration::from_millis(500));
    assert!((driver.tick(3.0, 10.0) - 4.0).abs() < 1e-9);
}

// --- Simulation ---

#[test]
fn test_simulation_clamps_distance_on_threshold_change() {
    let (mut sim, _) = manual_simulation();
    sim.set_ship_distance(1000.0).unwrap();
    let max = sim.thresholds().unwrap().max_visible_distance;
    assert_eq!(sim.params().ship_distance_km, max);

    sim.set_ship_height(5.0).unwrap();
    let smaller = sim.thresholds().unwrap().max_visible_distance;
    assert!(smaller < max);
    assert_eq!(sim.params().ship_distance_km, smaller);
}

#[test]
fn test_simulation_keeps_heights_in_range() {
    let (mut sim, _) = manual_simulation();
    sim.set_observer_height(500.0).unwrap();
    assert_eq!(sim.params().observer_height_m, 100.0);
    sim.set_ship_height(0.0).unwrap();
    assert_eq!(sim.params().ship_height_m, 5.0);
}

#[test]
fn test_simulation_rolls_back_invalid_refraction() {
    let (mut sim, _) = manual_simulation();
    let before = *sim.params();
    assert!(sim.set_refraction_factor(0.0).is_err());
    assert_eq!(*sim.params(), before);
}

#[test]
fn test_simulation_reset_keeps_toggles() {
    let (mut sim, _) = manual_simulation();
    sim.set_telescope_enabled(true);
    sim.set_observer_height(40.0).unwrap();
    sim.set_ship_distance(12.0).unwrap();
    sim.set_refraction_factor(1.5).unwrap();
    sim.reset().unwrap();

    let p = sim.params();
    assert_eq!(p.observer_height_m, 2.0);
    assert_eq!(p.ship_height_m, 50.0);
    assert_eq!(p.ship_distance_km, 0.0);
    assert_eq!(p.refraction_factor, 1.33);
    assert!(p.telescope_enabled);
}

#[test]
fn test_simulation_pulls_out_of_range_config_into_range() {
    let mut config = SceneConfig::default();
    config.simulation = SimulationConfig {
        observer_height_m: 0.2,
        ship_height_m: 400.0,
        ship_distance_km: -3.0,
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(&config, Box::new(ManualClock::default())).unwrap();

    let p = *sim.params();
    assert_eq!(p.observer_height_m, 1.0);
    assert_eq!(p.ship_height_m, 100.0);
    assert_eq!(p.ship_distance_km, 0.0);

    let mut normal = RecordingSurface::new(800.0, 400.0);
    assert!(sim.render::<RecordingSurface, RecordingSurface>(&mut normal, None).is_ok());

    sim.set_ship_distance(10.0).unwrap();
    sim.reset().unwrap();
    assert_eq!(*sim.params(), p);
    assert!(sim.render::<RecordingSurface, RecordingSurface>(&mut normal, None).is_ok());
}

#[test]
fn test_simulation_saves_current_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    let (mut sim, _) = manual_simulation();
    sim.set_observer_height(25.0).unwrap();
    sim.set_ship_distance(12.0).unwrap();
    sim.set_animation_speed(4.0);

    save_scene_config(&path, &sim.scene_config(small_spec())).unwrap();
    let loaded = load_scene_config(&path).unwrap();
    assert_eq!(loaded.simulation.observer_height_m, 25.0);
    assert_eq!(loaded.simulation.ship_distance_km, 12.0);
    assert_eq!(loaded.animation.speed_km_per_s, 4.0);
    assert_eq!(loaded.plot, small_spec());

    let restored = Simulation::new(&loaded, Box::new(ManualClock::default())).unwrap();
    assert_eq!(restored.params().observer_height_m, 25.0);
    assert_eq!(restored.params().ship_distance_km, 12.0);
}

#[test]
fn test_simulation_slider_max_and_view_mode() {
    let (mut sim, _) = manual_simulation();
    assert_eq!(sim.distance_slider_max().unwrap(), 40.0);

    assert_eq!(sim.view_mode(), ViewMode::NormalOnly);
    sim.set_telescope_enabled(true);
    sim.set_ship_distance(30.0).unwrap();
    assert_eq!(sim.view_mode(), ViewMode::NormalPlusTelescope);
}

#[test]
fn test_simulation_renders_telescope_only_when_enabled() {
    let (mut sim, _) = manual_simulation();
    let mut normal = RecordingSurface::new(800.0, 400.0);
    let mut telescope = RecordingSurface::new(400.0, 400.0);

    let report = sim.render(&mut normal, Some(&mut telescope)).unwrap();
    assert!(report.telescope.is_none());
    assert!(telescope.commands().is_empty());
    assert!(!normal.commands().is_empty());

    sim.set_telescope_enabled(true);
    let report = sim.render(&mut normal, Some(&mut telescope)).unwrap();
    assert!(report.telescope.is_some());
    assert!(!telescope.commands().is_empty());

    let report = sim.render::<RecordingSurface, RecordingSurface>(&mut normal, None).unwrap();
    assert!(report.telescope.is_none());
}

#[test]
fn test_simulation_animation_advances_with_clock() {
    let (mut sim, clock) = manual_simulation();
    sim.set_animation_enabled(true);
    clock.advance(Duration::from_secs(1));
    sim.advance_frame(1.0 / 60.0).unwrap();
    assert!((sim.params().ship_distance_km - 2.0).abs() < 1e-9);
    assert!(sim.smoke().offset() > 0.0);

    sim.set_animation_enabled(false);
    sim.set_animation_enabled(false);
    clock.advance(Duration::from_secs(1));
    sim.advance_frame(1.0 / 60.0).unwrap();
    assert!((sim.params().ship_distance_km - 2.0).abs() < 1e-9);
}

// --- Plot grid and cache ---

fn small_spec() -> GridSpec {
    GridSpec {
        height_range_m: (1.0, 100.0),
        height_samples: 3,
        refraction_range: (1.0, 1.5),
        refraction_samples: 2,
        earth_radius_km: R,
    }
}

#[test]
fn test_horizon_grid_shape_and_values() {
    let grid = compute_horizon_grid(&GridSpec::default()).unwrap();
    assert_eq!(grid.x.len(), 40);
    assert_eq!(grid.y.len(), 21);
    assert_eq!(grid.z.len(), 21);
    assert!(grid.z.iter().all(|row| row.len() == 40));
    assert_eq!(grid.x[0], 1.0);
    assert_eq!(grid.x[39], 100.0);

    let expected = horizon_distance(grid.x[7], R, grid.y[5]).unwrap();
    assert_eq!(grid.z[5][7], expected);

    let (lo, hi) = grid.z_range();
    assert_eq!(lo, grid.z[0][0]);
    assert_eq!(hi, grid.z[20][39]);
}

#[test]
fn test_plot_marker_matches_grid_function() {
    let marker = PlotMarker::new(2.0, 1.33, R).unwrap();
    assert_eq!(marker.horizon_distance_km, horizon_distance(2.0, R, 1.33).unwrap());

    let grid = compute_horizon_grid(&small_spec()).unwrap();
    let frame = PlotFrame::for_grid(&grid);
    let corner = PlotMarker::new(100.0, 1.5, R).unwrap();
    let p = frame.marker_position(&corner);
    assert!((p.x - PLOT_EXTENT).abs() < 1e-4);
    assert!((p.z - PLOT_EXTENT).abs() < 1e-4);
    assert!((p.y - PLOT_HEIGHT).abs() < 1e-4);
}

#[test]
fn test_horizon_mesh_vertex_count() {
    let grid = compute_horizon_grid(&small_spec()).unwrap();
    let mesh = create_horizon_mesh(&grid);
    assert_eq!(mesh.count_vertices(), 2 * 6);

    assert_eq!(get_color(0.0, 0.0, 1.0), [0.1, 0.3, 0.9, 1.0]);
    assert_eq!(get_color(5.0, 5.0, 5.0), get_color(0.0, 0.0, 1.0));
}

#[test]
fn test_grid_cache_hits_and_evicts() {
    let cache = HorizonGridCache::with_capacity(NonZeroUsize::new(1).unwrap());
    let spec = small_spec();
    let grid = Arc::new(compute_horizon_grid(&spec).unwrap());

    assert!(cache.get(&spec.key()).is_none());
    cache.insert(spec.key(), grid.clone());
    let hit = cache.get(&small_spec().key()).unwrap();
    assert!(Arc::ptr_eq(&hit, &grid));

    let other = GridSpec { height_samples: 4, ..spec };
    cache.insert(other.key(), Arc::new(compute_horizon_grid(&other).unwrap()));
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&spec.key()).is_none());
}

#[test]
fn test_plot_state_tracks_current_spec() {
    let spec = small_spec();
    let mut state = PlotState::new(spec);
    assert!(!state.is_current());

    state.publish(spec.key(), Arc::new(compute_horizon_grid(&spec).unwrap()));
    assert!(state.is_current());

    state.spec.height_samples = 5;
    assert!(!state.is_current());
    assert!(state.grid().is_some());
}

// --- Config and CSV I/O ---

#[test]
fn test_scene_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");
    let mut config = SceneConfig::default();
    config.simulation.observer_height_m = 12.0;
    config.telescope.optics.magnification = 40.0;

    save_scene_config(&path, &config).unwrap();
    let loaded = load_scene_config(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_scene_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.json");
    std::fs::write(&path, r#"{ "animation": { "speed_km_per_s": 5.0 } }"#).unwrap();

    let loaded = load_scene_config(&path).unwrap();
    assert_eq!(loaded.animation.speed_km_per_s, 5.0);
    assert_eq!(loaded.simulation, SceneConfig::default().simulation);
    assert_eq!(loaded.earth_radius_km, 7320.0);
}

#[test]
fn test_malformed_scene_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_scene_config(&path).is_err());
    assert!(load_scene_config(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_grid_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.csv");
    let grid = compute_horizon_grid(&small_spec()).unwrap();

    let rows = write_grid_csv(&path, &grid).unwrap();
    assert_eq!(rows, 6);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("height_m,refraction,horizon_km"));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let read: Vec<(f64, f64, f64)> = reader.deserialize().map(|r| r.unwrap()).collect();
    let expected: Vec<_> = grid.rows().collect();
    assert_eq!(read.len(), expected.len());
    for (a, b) in read.iter().zip(&expected) {
        assert!((a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9 && (a.2 - b.2).abs() < 1e-9);
    }
}

// --- egui backend ---

#[test]
fn test_egui_surface_clips_fill_to_circle() {
    use crate::render::egui_surface::EguiSurface;
    use bevy_egui::egui;

    let ctx = egui::Context::default();
    let output = ctx.run(egui::RawInput::default(), |ctx| {
        let area = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(200.0, 200.0));
        let painter = egui::Painter::new(ctx.clone(), egui::LayerId::background(), area);
        let mut surface = EguiSurface::new(&painter, area);
        surface.clip_circle(pt(100.0, 100.0), 50.0);
        surface.fill_rect(Rect::from_min_size(pt(0.0, 0.0), 200.0, 200.0), Color::BLACK);
        surface.fill_rect(Rect::from_min_size(pt(0.0, 0.0), 10.0, 10.0), Color::WHITE);
    });

    let meshes: Vec<_> = output
        .shapes
        .iter()
        .filter_map(|clipped| match &clipped.shape {
            egui::Shape::Mesh(mesh) => Some(mesh),
            _ => None,
        })
        .collect();
    // The small corner square lies wholly outside the circle.
    assert_eq!(meshes.len(), 1);
    for v in &meshes[0].vertices {
        let dx = v.pos.x - 100.0;
        let dy = v.pos.y - 100.0;
        assert!((dx * dx + dy * dy).sqrt() <= 50.01);
    }
}
