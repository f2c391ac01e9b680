//! 2D drawing for the two ship views.
//!
//! Renderers only talk to the [`Surface`] trait. `recording` backs it with a
//! command log for headless checks, `egui_surface` with an egui painter.

pub mod canvas;
pub mod clip;
pub mod egui_surface;
pub mod normal;
pub mod plot;
pub mod recording;
pub mod ship;
pub mod telescope;

pub use normal::NormalView;
pub use recording::RecordingSurface;
pub use ship::{draw_ship, ShipOptions, SmokeAnimation};
pub use telescope::TelescopeView;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

pub const fn pt(x: f32, y: f32) -> Point {
    Point { x, y }
}

impl Point {
    pub fn lerp(self, other: Point, t: f32) -> Point {
        pt(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

/// Axis-aligned rectangle, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_min_size(min: Point, width: f32, height: f32) -> Self {
        Self {
            min,
            max: pt(min.x + width, min.y + height),
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = *points.first()?;
        let mut rect = Rect { min: first, max: first };
        for p in &points[1..] {
            rect.min.x = rect.min.x.min(p.x);
            rect.min.y = rect.min.y.min(p.y);
            rect.max.x = rect.max.x.max(p.x);
            rect.max.y = rect.max.y.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            pt(self.max.x, self.min.y),
            self.max,
            pt(self.min.x, self.max.y),
        ]
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let min = pt(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = pt(self.max.x.min(other.max.x), self.max.y.min(other.max.y));
        if min.x < max.x && min.y < max.y {
            Some(Rect { min, max })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn faded(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    pub const fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// Polyline or polygon in the surface's current coordinate space.
///
/// Filled paths are expected to be convex; backends that triangulate fan
/// out from the first vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Path {
    pub fn polygon(points: impl Into<Vec<Point>>) -> Self {
        Self {
            points: points.into(),
            closed: true,
        }
    }

    pub fn line(from: Point, to: Point) -> Self {
        Self {
            points: vec![from, to],
            closed: false,
        }
    }

    pub fn polyline(points: impl Into<Vec<Point>>) -> Self {
        Self {
            points: points.into(),
            closed: false,
        }
    }

    pub fn rect(rect: Rect) -> Self {
        Self::polygon(rect.corners().to_vec())
    }

    pub fn circle(center: Point, radius: f32) -> Self {
        const SEGMENTS: usize = 32;
        let points = (0..SEGMENTS)
            .map(|i| {
                let a = i as f32 / SEGMENTS as f32 * std::f32::consts::TAU;
                pt(center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .collect::<Vec<_>>();
        Self::polygon(points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub from: Color,
    pub to: Color,
}

impl LinearGradient {
    pub fn vertical(top: f32, bottom: f32, from: Color, to: Color) -> Self {
        Self {
            start: pt(0.0, top),
            end: pt(0.0, bottom),
            from,
            to,
        }
    }

    pub fn color_at(&self, p: Point) -> Color {
        let axis = pt(self.end.x - self.start.x, self.end.y - self.start.y);
        let len_sq = axis.x * axis.x + axis.y * axis.y;
        if len_sq <= f32::EPSILON {
            return self.from;
        }
        let t = ((p.x - self.start.x) * axis.x + (p.y - self.start.y) * axis.y) / len_sq;
        self.from.lerp(self.to, t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
}

impl TextStyle {
    pub const fn new(size: f32, color: Color) -> Self {
        Self { size, color }
    }
}

/// Minimal vector-drawing capability set the renderers rely on.
///
/// Coordinates are transformed by the accumulated `translate`/`scale` calls;
/// clips accumulate by intersection. `save`/`restore` bracket both.
pub trait Surface {
    fn size(&self) -> (f32, f32);

    fn save(&mut self);
    fn restore(&mut self);

    fn translate(&mut self, dx: f32, dy: f32);
    /// Uniform scale only.
    fn scale(&mut self, factor: f32);

    fn clip_rect(&mut self, rect: Rect);
    fn clip_circle(&mut self, center: Point, radius: f32);

    fn fill_path(&mut self, path: &Path, color: Color);
    fn stroke_path(&mut self, path: &Path, stroke: Stroke);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_rect_gradient(&mut self, rect: Rect, gradient: &LinearGradient);
    fn draw_text(&mut self, pos: Point, text: &str, style: &TextStyle);
}

/// Where and how big the ship is drawn in one view, for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipDrawState {
    pub anchor: Point,
    pub scale: f64,
    /// 0 = fully visible, 1 = fully below the horizon.
    pub sink_fraction: f64,
}

/// `sqrt(height / 50)`: on-screen size relative to a 50 m reference vessel.
pub fn base_scale(ship_height_m: f64) -> f64 {
    (ship_height_m.max(0.0) / 50.0).sqrt()
}

/// Scale and sink shared by both views.
///
/// Before the horizon the ship shrinks linearly to a quarter of its base
/// size; past it the size is frozen and the ship sinks instead.
pub fn approach_profile(
    ship_distance_km: f64,
    horizon_km: f64,
    max_visible_km: f64,
    base_scale: f64,
) -> ApproachProfile {
    if ship_distance_km <= horizon_km {
        let t = if horizon_km > 0.0 {
            (ship_distance_km / horizon_km).clamp(0.0, 1.0)
        } else {
            0.0
        };
        ApproachProfile {
            progress: t,
            scale: (1.0 - 0.75 * t) * base_scale,
            sink_fraction: 0.0,
            beyond_horizon: false,
        }
    } else {
        let range = max_visible_km - horizon_km;
        let sink = if range > 0.0 {
            ((ship_distance_km - horizon_km) / range).min(1.0)
        } else {
            1.0
        };
        ApproachProfile {
            progress: 1.0,
            scale: 0.25 * base_scale,
            sink_fraction: sink,
            beyond_horizon: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachProfile {
    /// Position along the shore-to-horizon track, `[0, 1]`.
    pub progress: f64,
    pub scale: f64,
    pub sink_fraction: f64,
    pub beyond_horizon: bool,
}
