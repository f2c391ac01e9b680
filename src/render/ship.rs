//! Vector silhouette of a small cargo ship.
//!
//! Local space: x runs stern (negative) to bow (positive), the waterline sits
//! at y = 0 and the mainmast tip at y = -[`SHIP_HEIGHT_UNITS`]. Every part is
//! a convex polygon or a line so any backend can fill it directly.

use super::{pt, Color, Path, Point, Rect, Stroke, Surface};

/// Height of the silhouette above the waterline, local units.
pub const SHIP_HEIGHT_UNITS: f32 = 70.0;
pub const SHIP_HALF_LENGTH_UNITS: f32 = 66.0;

const CLIP_MARGIN_UNITS: f32 = 110.0;
const CLIP_HEADROOM_UNITS: f32 = 170.0;

const HULL: Color = Color::rgb(38, 52, 74);
const BOOT_TOP: Color = Color::rgb(168, 40, 36);
const DECK_RAIL: Color = Color::rgb(200, 200, 196);
const SUPERSTRUCTURE: Color = Color::rgb(236, 236, 230);
const SUPERSTRUCTURE_SHADE: Color = Color::rgb(208, 210, 206);
const WINDOW: Color = Color::rgb(40, 58, 80);
const FUNNEL: Color = Color::rgb(222, 120, 36);
const FUNNEL_BAND: Color = Color::rgb(24, 82, 150);
const FUNNEL_CAP: Color = Color::rgb(30, 30, 30);
const MAST: Color = Color::rgb(70, 70, 70);
const SMOKE: Color = Color::rgb(120, 120, 124);
const CONTAINERS: [Color; 4] = [
    Color::rgb(180, 64, 48),
    Color::rgb(52, 120, 168),
    Color::rgb(214, 170, 60),
    Color::rgb(70, 140, 90),
];

const FUNNEL_X: [f32; 2] = [-8.0, 4.0];
const FUNNEL_TOP: f32 = -52.0;

/// Drifting funnel smoke. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmokeAnimation {
    offset: f64,
}

impl SmokeAnimation {
    const PUFFS_PER_FUNNEL: usize = 3;
    const CYCLES_PER_SECOND: f64 = 0.35;

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn advance(&mut self, elapsed_secs: f64) {
        if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
            self.offset += elapsed_secs * Self::CYCLES_PER_SECOND;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipOptions {
    pub smoke: Option<SmokeAnimation>,
    /// Multiplies every color's alpha.
    pub opacity: f32,
}

impl Default for ShipOptions {
    fn default() -> Self {
        Self {
            smoke: None,
            opacity: 1.0,
        }
    }
}

/// Draw the ship with its waterline at `anchor`.
///
/// `sink_fraction` hides that share of the silhouette from the bottom up:
/// the ship is pushed down by the hidden height and everything below the
/// anchor's waterline is clipped away. At 1.0 nothing is drawn.
pub fn draw_ship<S: Surface + ?Sized>(
    surface: &mut S,
    anchor: Point,
    scale: f32,
    sink_fraction: f64,
    options: &ShipOptions,
) {
    let sink = sink_fraction.clamp(0.0, 1.0) as f32;
    if sink >= 1.0 || scale <= 0.0 || options.opacity <= 0.0 {
        return;
    }
    let hidden = sink * SHIP_HEIGHT_UNITS;

    surface.save();
    surface.clip_rect(Rect {
        min: pt(
            anchor.x - CLIP_MARGIN_UNITS * scale,
            anchor.y - CLIP_HEADROOM_UNITS * scale,
        ),
        max: pt(anchor.x + CLIP_MARGIN_UNITS * scale, anchor.y),
    });
    surface.translate(anchor.x, anchor.y + hidden * scale);
    surface.scale(scale);

    let paint = Palette {
        opacity: options.opacity,
    };
    draw_hull(surface, &paint);
    draw_superstructure(surface, &paint);
    draw_funnels(surface, &paint);
    if let Some(smoke) = options.smoke {
        draw_smoke(surface, &paint, &smoke);
    }
    draw_masts(surface, &paint);

    surface.restore();
}

struct Palette {
    opacity: f32,
}

impl Palette {
    fn c(&self, color: Color) -> Color {
        color.faded(self.opacity)
    }
}

fn draw_hull<S: Surface + ?Sized>(surface: &mut S, paint: &Palette) {
    let hull = Path::polygon(vec![
        pt(-62.0, -12.0),
        pt(SHIP_HALF_LENGTH_UNITS, -16.0),
        pt(58.0, 4.0),
        pt(-54.0, 4.0),
    ]);
    surface.fill_path(&hull, paint.c(HULL));

    let boot_top = Path::polygon(vec![pt(-56.0, -3.0), pt(61.0, -3.0), pt(59.0, 0.0), pt(-55.0, 0.0)]);
    surface.fill_path(&boot_top, paint.c(BOOT_TOP));

    surface.stroke_path(
        &Path::line(pt(-62.0, -12.0), pt(SHIP_HALF_LENGTH_UNITS, -16.0)),
        Stroke::new(1.0, paint.c(DECK_RAIL)),
    );

    // Deck cargo forward of the funnels.
    for (i, color) in CONTAINERS.iter().enumerate() {
        let x = 14.0 + i as f32 * 11.0;
        let top = if i % 2 == 0 { -24.0 } else { -21.0 };
        surface.fill_rect(Rect { min: pt(x, top), max: pt(x + 10.0, -12.5) }, paint.c(*color));
    }
}

fn draw_superstructure<S: Surface + ?Sized>(surface: &mut S, paint: &Palette) {
    let tiers = [
        (Rect { min: pt(-48.0, -24.0), max: pt(-14.0, -12.0) }, SUPERSTRUCTURE_SHADE),
        (Rect { min: pt(-44.0, -34.0), max: pt(-18.0, -24.0) }, SUPERSTRUCTURE),
        (Rect { min: pt(-47.0, -42.0), max: pt(-15.0, -34.0) }, SUPERSTRUCTURE),
    ];
    for (rect, color) in tiers {
        surface.fill_rect(rect, paint.c(color));
        let window_y = rect.min.y + 3.0;
        let mut x = rect.min.x + 3.0;
        while x + 3.0 <= rect.max.x - 2.0 {
            surface.fill_rect(
                Rect { min: pt(x, window_y), max: pt(x + 3.0, window_y + 3.0) },
                paint.c(WINDOW),
            );
            x += 5.5;
        }
    }
}

fn draw_funnels<S: Surface + ?Sized>(surface: &mut S, paint: &Palette) {
    for cx in FUNNEL_X {
        let body = Path::polygon(vec![
            pt(cx - 4.0, -12.0),
            pt(cx + 4.0, -12.0),
            pt(cx + 3.0, FUNNEL_TOP),
            pt(cx - 3.0, FUNNEL_TOP),
        ]);
        surface.fill_path(&body, paint.c(FUNNEL));
        surface.fill_rect(
            Rect { min: pt(cx - 3.3, -46.0), max: pt(cx + 3.3, -42.0) },
            paint.c(FUNNEL_BAND),
        );
        surface.fill_rect(
            Rect { min: pt(cx - 3.0, FUNNEL_TOP), max: pt(cx + 3.0, FUNNEL_TOP + 2.0) },
            paint.c(FUNNEL_CAP),
        );
    }
}

fn draw_smoke<S: Surface + ?Sized>(surface: &mut S, paint: &Palette, smoke: &SmokeAnimation) {
    let puffs = SmokeAnimation::PUFFS_PER_FUNNEL;
    for (f, cx) in FUNNEL_X.iter().enumerate() {
        for i in 0..puffs {
            let phase = (smoke.offset + i as f64 / puffs as f64 + f as f64 * 0.17).fract() as f32;
            let center = pt(cx + phase * 20.0, FUNNEL_TOP - 3.0 - phase * 32.0);
            let radius = 2.5 + phase * 6.0;
            let alpha = (1.0 - phase) * 0.6 * paint.opacity;
            surface.fill_path(&Path::circle(center, radius), SMOKE.faded(alpha));
        }
    }
}

fn draw_masts<S: Surface + ?Sized>(surface: &mut S, paint: &Palette) {
    let mast = Stroke::new(1.4, paint.c(MAST));
    let rigging = Stroke::new(0.8, paint.c(MAST));

    // Mainmast on the bridge roof carries the highest point of the ship.
    surface.stroke_path(&Path::line(pt(-31.0, -42.0), pt(-31.0, -SHIP_HEIGHT_UNITS)), mast);
    surface.stroke_path(&Path::line(pt(-37.0, -62.0), pt(-25.0, -62.0)), rigging);
    surface.stroke_path(&Path::line(pt(-24.0, -42.0), pt(-24.0, -54.0)), rigging);

    // Foremast near the bow.
    surface.stroke_path(&Path::line(pt(50.0, -15.0), pt(50.0, -56.0)), mast);
    surface.stroke_path(&Path::line(pt(45.0, -48.0), pt(55.0, -48.0)), rigging);
    surface.stroke_path(
        &Path::polyline(vec![pt(-31.0, -SHIP_HEIGHT_UNITS + 4.0), pt(50.0, -56.0), pt(63.0, -16.0)]),
        rigging,
    );
}
