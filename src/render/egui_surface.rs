use bevy_egui::egui;
use egui::epaint::{Mesh, Vertex, WHITE_UV};

use super::canvas::CanvasState;
use super::clip::{clip_polygon, clip_segment, region_polygon};
use super::{Color, LinearGradient, Path, Point, Rect, Stroke, Surface, TextStyle};

fn color32(c: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// [`Surface`] drawing through an egui painter into a rectangle of the UI.
///
/// egui only clips to rectangles, so fills and strokes are clipped here in
/// software against the canvas clip stack before they reach the painter.
pub struct EguiSurface<'a> {
    painter: &'a egui::Painter,
    area: egui::Rect,
    canvas: CanvasState,
}

impl<'a> EguiSurface<'a> {
    pub fn new(painter: &'a egui::Painter, area: egui::Rect) -> Self {
        Self {
            painter,
            area,
            canvas: CanvasState::default(),
        }
    }

    fn to_screen(&self, p: Point) -> egui::Pos2 {
        egui::pos2(self.area.min.x + p.x, self.area.min.y + p.y)
    }

    fn clip_polygons(&self) -> Vec<Vec<Point>> {
        self.canvas.clips().iter().map(region_polygon).collect()
    }

    fn clipped(&self, points: Vec<Point>) -> Vec<Point> {
        self.clip_polygons()
            .iter()
            .fold(points, |poly, clip| clip_polygon(&poly, clip))
    }

    fn fill_device(&self, points: Vec<Point>, color_at: impl Fn(Point) -> Color) {
        let points = self.clipped(points);
        if points.len() < 3 {
            return;
        }
        let mut mesh = Mesh::default();
        for &p in &points {
            mesh.vertices.push(Vertex {
                pos: self.to_screen(p),
                uv: WHITE_UV,
                color: color32(color_at(p)),
            });
        }
        for i in 1..points.len() as u32 - 1 {
            mesh.add_triangle(0, i, i + 1);
        }
        self.painter.add(egui::Shape::mesh(mesh));
    }
}

impl Surface for EguiSurface<'_> {
    fn size(&self) -> (f32, f32) {
        (self.area.width(), self.area.height())
    }

    fn save(&mut self) {
        self.canvas.save();
    }

    fn restore(&mut self) {
        self.canvas.restore();
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.canvas.translate(dx, dy);
    }

    fn scale(&mut self, factor: f32) {
        self.canvas.scale(factor);
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.canvas.clip_rect(rect);
    }

    fn clip_circle(&mut self, center: Point, radius: f32) {
        self.canvas.clip_circle(center, radius);
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        let points = path.points.iter().map(|&p| self.canvas.to_device(p)).collect();
        self.fill_device(points, |_| color);
    }

    fn stroke_path(&mut self, path: &Path, stroke: Stroke) {
        let points: Vec<Point> = path.points.iter().map(|&p| self.canvas.to_device(p)).collect();
        if points.len() < 2 {
            return;
        }
        let width = stroke.width * self.canvas.current_scale();
        let egui_stroke = egui::Stroke::new(width, color32(stroke.color));
        let clips = self.clip_polygons();

        let mut segments: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
        if path.closed && points.len() > 2 {
            segments.push((points[points.len() - 1], points[0]));
        }
        for (a, b) in segments {
            let visible = clips
                .iter()
                .try_fold((a, b), |(a, b), clip| clip_segment(a, b, clip));
            if let Some((a, b)) = visible {
                self.painter
                    .line_segment([self.to_screen(a), self.to_screen(b)], egui_stroke);
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let points = rect.corners().iter().map(|&p| self.canvas.to_device(p)).collect();
        self.fill_device(points, |_| color);
    }

    fn fill_rect_gradient(&mut self, rect: Rect, gradient: &LinearGradient) {
        let points = rect.corners().iter().map(|&p| self.canvas.to_device(p)).collect();
        let device = LinearGradient {
            start: self.canvas.to_device(gradient.start),
            end: self.canvas.to_device(gradient.end),
            ..*gradient
        };
        self.fill_device(points, |p| device.color_at(p));
    }

    fn draw_text(&mut self, pos: Point, text: &str, style: &TextStyle) {
        let device = self.canvas.to_device(pos);
        if !self.canvas.is_visible(device) {
            return;
        }
        self.painter.text(
            self.to_screen(device),
            egui::Align2::LEFT_TOP,
            text,
            egui::FontId::proportional(style.size * self.canvas.current_scale()),
            color32(style.color),
        );
    }
}
