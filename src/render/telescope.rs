//! Magnified eyepiece view aimed at the horizon.
//!
//! Shares the normal view's size and sink curve but has its own reveal: the
//! ship fades and rises into the eyepiece between the telescope threshold and
//! the horizon.

use super::ship::{draw_ship, ShipOptions, SmokeAnimation, SHIP_HEIGHT_UNITS};
use super::{
    approach_profile, base_scale, pt, Color, LinearGradient, Path, Point, Rect, ShipDrawState, Stroke,
    Surface, TextStyle,
};
use crate::app::SimulationParameters;
use crate::config::TelescopeConfig;
use crate::physics::{GeometryError, VisibilityThresholds};

const SKY_TOP: Color = Color::rgb(150, 190, 232);
const SKY_HORIZON: Color = Color::rgb(214, 232, 248);
const SEA_HORIZON: Color = Color::rgb(70, 128, 176);
const SEA_BOTTOM: Color = Color::rgb(30, 74, 118);
const HORIZON_LINE: Color = Color::rgba(255, 255, 255, 120);
const RETICLE: Color = Color::rgba(10, 10, 10, 200);
const BARREL: Color = Color::rgb(22, 22, 26);
const BARREL_EDGE: Color = Color::rgb(90, 90, 96);

const TICKS_PER_ARM: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelescopeLayout {
    pub center: Point,
    pub radius: f32,
    pub horizon_y: f32,
    /// Pixels per ship unit at scale 1, before magnification.
    pub unit_scale: f32,
}

impl TelescopeLayout {
    pub fn for_size(width: f32, height: f32) -> Self {
        let center = pt(width * 0.5, height * 0.5);
        let radius = width.min(height) * 0.46;
        Self {
            center,
            radius,
            horizon_y: center.y,
            unit_scale: radius / 150.0,
        }
    }

    /// Upper half of the eyepiece's bounding square: the only place a ship may appear.
    pub fn above_horizon(&self) -> Rect {
        Rect {
            min: pt(self.center.x - self.radius, self.center.y - self.radius),
            max: pt(self.center.x + self.radius, self.horizon_y),
        }
    }

    pub fn below_horizon(&self) -> Rect {
        Rect {
            min: pt(self.center.x - self.radius, self.horizon_y),
            max: pt(self.center.x + self.radius, self.center.y + self.radius),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelescopeFrame {
    /// Scale and sink follow the normal view; the anchor is eyepiece space.
    pub ship: ShipDrawState,
    /// 0 = not yet in view, 1 = fully revealed.
    pub visibility_factor: f64,
    /// Downward shift of the waterline while the ship rises into view, pixels.
    pub rise_offset: f32,
    pub pixel_scale: f32,
}

/// Reveal ramp between the telescope threshold and the horizon.
pub fn visibility_factor(distance_km: f64, threshold_km: f64, horizon_km: f64) -> f64 {
    if distance_km < threshold_km {
        0.0
    } else if distance_km >= horizon_km || horizon_km <= threshold_km {
        1.0
    } else {
        ((distance_km - threshold_km) / (horizon_km - threshold_km)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelescopeView {
    pub earth_radius_km: f64,
    pub config: TelescopeConfig,
}

impl TelescopeView {
    pub fn new(earth_radius_km: f64, config: TelescopeConfig) -> Self {
        Self { earth_radius_km, config }
    }

    pub fn frame(
        &self,
        params: &SimulationParameters,
        layout: &TelescopeLayout,
    ) -> Result<TelescopeFrame, GeometryError> {
        let thresholds = VisibilityThresholds::compute(
            params.observer_height_m,
            params.ship_height_m,
            self.earth_radius_km,
            params.refraction_factor,
            &self.config.optics,
        )?;
        let profile = approach_profile(
            params.ship_distance_km,
            thresholds.horizon_distance,
            thresholds.max_visible_distance,
            base_scale(params.ship_height_m),
        );
        let factor = visibility_factor(
            params.ship_distance_km,
            thresholds.telescope_threshold,
            thresholds.horizon_distance,
        );

        let pixel_scale = (profile.scale * self.config.view_magnification) as f32 * layout.unit_scale;
        let ship_pixel_height = SHIP_HEIGHT_UNITS * pixel_scale;
        let rise_offset = (1.0 - factor) as f32 * ship_pixel_height * self.config.rise_factor as f32;

        Ok(TelescopeFrame {
            ship: ShipDrawState {
                anchor: pt(layout.center.x, layout.horizon_y + rise_offset),
                scale: profile.scale,
                sink_fraction: profile.sink_fraction,
            },
            visibility_factor: factor,
            rise_offset,
            pixel_scale,
        })
    }

    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        params: &SimulationParameters,
        smoke: Option<SmokeAnimation>,
    ) -> Result<TelescopeFrame, GeometryError> {
        let (width, height) = surface.size();
        let layout = TelescopeLayout::for_size(width, height);
        let frame = self.frame(params, &layout)?;

        surface.save();
        surface.clip_circle(layout.center, layout.radius);
        draw_backdrop(surface, &layout);

        if frame.visibility_factor > 0.0 {
            surface.save();
            surface.clip_rect(layout.above_horizon());
            let options = ShipOptions {
                smoke,
                opacity: frame.visibility_factor as f32,
            };
            draw_ship(
                surface,
                frame.ship.anchor,
                frame.pixel_scale,
                frame.ship.sink_fraction,
                &options,
            );
            surface.restore();
        }
        surface.restore();

        draw_reticle(surface, &layout);
        draw_barrel(surface, &layout, self.config.optics.magnification);
        Ok(frame)
    }
}

fn draw_backdrop<S: Surface + ?Sized>(surface: &mut S, layout: &TelescopeLayout) {
    let sky = layout.above_horizon();
    surface.fill_rect_gradient(sky, &LinearGradient::vertical(sky.min.y, sky.max.y, SKY_TOP, SKY_HORIZON));
    let sea = layout.below_horizon();
    surface.fill_rect_gradient(sea, &LinearGradient::vertical(sea.min.y, sea.max.y, SEA_HORIZON, SEA_BOTTOM));
    surface.stroke_path(
        &Path::line(
            pt(layout.center.x - layout.radius, layout.horizon_y),
            pt(layout.center.x + layout.radius, layout.horizon_y),
        ),
        Stroke::new(1.0, HORIZON_LINE),
    );
}

fn draw_reticle<S: Surface + ?Sized>(surface: &mut S, layout: &TelescopeLayout) {
    let Point { x: cx, y: cy } = layout.center;
    let r = layout.radius;
    let line = Stroke::new(1.0, RETICLE);

    surface.stroke_path(&Path::line(pt(cx - r, cy), pt(cx + r, cy)), line);
    surface.stroke_path(&Path::line(pt(cx, cy - r), pt(cx, cy + r)), line);

    let spacing = r / (TICKS_PER_ARM + 1) as f32;
    let half = r * 0.03;
    for i in 1..=TICKS_PER_ARM {
        let d = spacing * i as f32;
        for sign in [-1.0f32, 1.0] {
            let x = cx + sign * d;
            surface.stroke_path(&Path::line(pt(x, cy - half), pt(x, cy + half)), line);
            let y = cy + sign * d;
            surface.stroke_path(&Path::line(pt(cx - half, y), pt(cx + half, y)), line);
        }
    }
}

fn draw_barrel<S: Surface + ?Sized>(surface: &mut S, layout: &TelescopeLayout, magnification: f64) {
    let ring = (layout.radius * 0.05).max(3.0);
    surface.stroke_path(
        &Path::circle(layout.center, layout.radius + ring * 0.5),
        Stroke::new(ring, BARREL),
    );
    surface.stroke_path(
        &Path::circle(layout.center, layout.radius),
        Stroke::new(1.5, BARREL_EDGE),
    );
    surface.draw_text(
        pt(layout.center.x - layout.radius, layout.center.y - layout.radius - ring),
        &format!("{magnification:.0}x"),
        &TextStyle::new((layout.radius * 0.09).max(10.0), BARREL),
    );
}
