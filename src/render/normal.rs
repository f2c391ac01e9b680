//! Primary view: a harbour looking out to sea with the ship sailing away.

use super::ship::{draw_ship, ShipOptions, SmokeAnimation};
use super::{
    approach_profile, base_scale, pt, Color, LinearGradient, Path, Point, Rect, ShipDrawState, Stroke,
    Surface, TextStyle,
};
use crate::app::SimulationParameters;
use crate::physics::{horizon_distance, max_visible_distance, visible_fraction, GeometryError, VisibilityStatus};

const SKY_TOP: Color = Color::rgb(96, 156, 220);
const SKY_HORIZON: Color = Color::rgb(206, 228, 246);
const SEA_HORIZON: Color = Color::rgb(64, 120, 170);
const SEA_NEAR: Color = Color::rgb(18, 60, 104);
const HORIZON_LINE: Color = Color::rgba(255, 255, 255, 150);
const DOCK_DECK: Color = Color::rgb(122, 88, 58);
const DOCK_PILING: Color = Color::rgb(84, 60, 40);
const BOLLARD: Color = Color::rgb(40, 40, 44);
const READOUT: Color = Color::rgb(16, 24, 36);

/// Screen geometry of the normal view, derived from the surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalViewLayout {
    pub width: f32,
    pub height: f32,
    pub horizon_y: f32,
    /// Waterline point when the ship is alongside the dock.
    pub shore_anchor: Point,
    /// Waterline point when the ship reaches the horizon.
    pub horizon_anchor: Point,
    /// Pixels per ship unit at scale 1.
    pub unit_scale: f32,
}

impl NormalViewLayout {
    pub fn for_size(width: f32, height: f32) -> Self {
        let horizon_y = height * 0.45;
        Self {
            width,
            height,
            horizon_y,
            shore_anchor: pt(width * 0.24, height * 0.86),
            horizon_anchor: pt(width * 0.78, horizon_y),
            unit_scale: height / 400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalView {
    pub earth_radius_km: f64,
    pub show_dock: bool,
}

impl NormalView {
    pub fn new(earth_radius_km: f64) -> Self {
        Self {
            earth_radius_km,
            show_dock: true,
        }
    }

    /// Where the ship goes for these parameters.
    pub fn ship_state(
        &self,
        params: &SimulationParameters,
        layout: &NormalViewLayout,
    ) -> Result<ShipDrawState, GeometryError> {
        Ok(self.placement(params, layout)?.0)
    }

    fn placement(
        &self,
        params: &SimulationParameters,
        layout: &NormalViewLayout,
    ) -> Result<(ShipDrawState, bool), GeometryError> {
        let horizon = horizon_distance(params.observer_height_m, self.earth_radius_km, params.refraction_factor)?;
        let max = max_visible_distance(
            params.observer_height_m,
            params.ship_height_m,
            self.earth_radius_km,
            params.refraction_factor,
        )?;
        let profile = approach_profile(params.ship_distance_km, horizon, max, base_scale(params.ship_height_m));
        let anchor = if profile.beyond_horizon {
            layout.horizon_anchor
        } else {
            layout
                .shore_anchor
                .lerp(layout.horizon_anchor, profile.progress as f32)
        };
        let state = ShipDrawState {
            anchor,
            scale: profile.scale,
            sink_fraction: profile.sink_fraction,
        };
        Ok((state, profile.beyond_horizon))
    }

    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        params: &SimulationParameters,
        smoke: Option<SmokeAnimation>,
    ) -> Result<ShipDrawState, GeometryError> {
        let (width, height) = surface.size();
        let layout = NormalViewLayout::for_size(width, height);
        let (state, beyond_horizon) = self.placement(params, &layout)?;
        let fraction = visible_fraction(
            params.ship_distance_km,
            params.observer_height_m,
            params.ship_height_m,
            self.earth_radius_km,
            params.refraction_factor,
        )?;
        let horizon = horizon_distance(params.observer_height_m, self.earth_radius_km, params.refraction_factor)?;

        draw_scene(surface, &layout);
        if self.show_dock {
            draw_dock(surface, &layout);
        }

        let options = ShipOptions { smoke, opacity: 1.0 };
        let scale = (state.scale as f32) * layout.unit_scale;
        if beyond_horizon {
            // Nothing of a ship past the horizon may leak below the horizon line.
            surface.save();
            surface.clip_rect(Rect::from_min_size(pt(0.0, 0.0), width, layout.horizon_y));
            draw_ship(surface, state.anchor, scale, state.sink_fraction, &options);
            surface.restore();
        } else {
            draw_ship(surface, state.anchor, scale, state.sink_fraction, &options);
        }

        draw_readout(surface, &layout, params, horizon, VisibilityStatus::from_fraction(fraction));
        Ok(state)
    }
}

fn draw_scene<S: Surface + ?Sized>(surface: &mut S, layout: &NormalViewLayout) {
    let sky = Rect::from_min_size(pt(0.0, 0.0), layout.width, layout.horizon_y);
    surface.fill_rect_gradient(sky, &LinearGradient::vertical(0.0, layout.horizon_y, SKY_TOP, SKY_HORIZON));

    let sea = Rect::from_min_size(pt(0.0, layout.horizon_y), layout.width, layout.height - layout.horizon_y);
    surface.fill_rect_gradient(
        sea,
        &LinearGradient::vertical(layout.horizon_y, layout.height, SEA_HORIZON, SEA_NEAR),
    );

    surface.stroke_path(
        &Path::line(pt(0.0, layout.horizon_y), pt(layout.width, layout.horizon_y)),
        Stroke::new(1.0, HORIZON_LINE),
    );
}

fn draw_dock<S: Surface + ?Sized>(surface: &mut S, layout: &NormalViewLayout) {
    let deck_top = layout.height * 0.80;
    let deck_right = layout.width * 0.14;
    let deck = Rect {
        min: pt(0.0, deck_top),
        max: pt(deck_right, deck_top + layout.height * 0.03),
    };

    let piling_w = layout.width * 0.012;
    let mut x = layout.width * 0.01;
    while x + piling_w <= deck_right {
        surface.fill_rect(
            Rect {
                min: pt(x, deck.max.y),
                max: pt(x + piling_w, layout.height),
            },
            DOCK_PILING,
        );
        x += layout.width * 0.04;
    }
    surface.fill_rect(deck, DOCK_DECK);

    let bollard = layout.height * 0.015;
    surface.fill_path(
        &Path::circle(pt(deck_right - bollard * 2.0, deck_top - bollard * 0.5), bollard),
        BOLLARD,
    );
}

fn draw_readout<S: Surface + ?Sized>(
    surface: &mut S,
    layout: &NormalViewLayout,
    params: &SimulationParameters,
    horizon_km: f64,
    status: VisibilityStatus,
) {
    let style = TextStyle::new((layout.height / 28.0).max(10.0), READOUT);
    let line_height = style.size * 1.3;
    let lines = [
        format!("Observer height: {:.1} m", params.observer_height_m),
        format!("Horizon distance: {:.2} km", horizon_km),
        format!("Ship distance: {:.2} km", params.ship_distance_km),
        format!("Ship height: {:.0} m", params.ship_height_m),
        format!("Visibility: {status}"),
    ];
    for (i, line) in lines.iter().enumerate() {
        surface.draw_text(pt(10.0, 10.0 + i as f32 * line_height), line, &style);
    }
}
