use super::canvas::{CanvasState, ClipRegion};
use super::{Color, LinearGradient, Path, Point, Rect, Stroke, Surface, TextStyle};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill { points: Vec<Point>, color: Color },
    Stroke { points: Vec<Point>, closed: bool, stroke: Stroke },
    Gradient { rect: Rect, from: Color, to: Color },
    Text { pos: Point, text: String, style: TextStyle },
}

/// One primitive in device space plus the clips that were active for it.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub op: DrawOp,
    pub clips: Vec<ClipRegion>,
}

impl DrawCommand {
    pub fn bounds(&self) -> Option<Rect> {
        match &self.op {
            DrawOp::Fill { points, .. } | DrawOp::Stroke { points, .. } => Rect::from_points(points),
            DrawOp::Gradient { rect, .. } => Some(*rect),
            DrawOp::Text { pos, .. } => Some(Rect { min: *pos, max: *pos }),
        }
    }

    /// Bounding box of what can actually reach the screen, approximating
    /// circular clips by their bounding square.
    pub fn visible_bounds(&self) -> Option<Rect> {
        let mut bounds = self.bounds()?;
        if let DrawOp::Text { pos, .. } = &self.op {
            return self.clips.iter().all(|c| c.contains(*pos)).then_some(bounds);
        }
        for clip in &self.clips {
            bounds = intersect_inclusive(&bounds, &clip.bounds())?;
        }
        let visible = match self.op {
            DrawOp::Stroke { .. } => bounds.width() > 0.0 || bounds.height() > 0.0,
            _ => bounds.width() > 0.0 && bounds.height() > 0.0,
        };
        visible.then_some(bounds)
    }

    pub fn is_visible(&self) -> bool {
        self.visible_bounds().is_some()
    }
}

// Strokes along one axis have a zero-width box; keep them.
fn intersect_inclusive(a: &Rect, b: &Rect) -> Option<Rect> {
    let min = super::pt(a.min.x.max(b.min.x), a.min.y.max(b.min.y));
    let max = super::pt(a.max.x.min(b.max.x), a.max.y.min(b.max.y));
    (min.x <= max.x && min.y <= max.y).then_some(Rect { min, max })
}

/// [`Surface`] that remembers everything drawn on it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    canvas: CanvasState,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match &c.op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Nesting depth of unmatched `save` calls.
    pub fn save_depth(&self) -> usize {
        self.canvas.depth()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.canvas = CanvasState::default();
    }

    fn record(&mut self, op: DrawOp) {
        self.commands.push(DrawCommand {
            op,
            clips: self.canvas.clips().to_vec(),
        });
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
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
        self.record(DrawOp::Fill { points, color });
    }

    fn stroke_path(&mut self, path: &Path, stroke: Stroke) {
        let points = path.points.iter().map(|&p| self.canvas.to_device(p)).collect();
        let stroke = Stroke::new(stroke.width * self.canvas.current_scale(), stroke.color);
        self.record(DrawOp::Stroke {
            points,
            closed: path.closed,
            stroke,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let points = rect.corners().iter().map(|&p| self.canvas.to_device(p)).collect();
        self.record(DrawOp::Fill { points, color });
    }

    fn fill_rect_gradient(&mut self, rect: Rect, gradient: &LinearGradient) {
        let rect = self.canvas.rect_to_device(rect);
        self.record(DrawOp::Gradient {
            rect,
            from: gradient.from,
            to: gradient.to,
        });
    }

    fn draw_text(&mut self, pos: Point, text: &str, style: &TextStyle) {
        let pos = self.canvas.to_device(pos);
        let style = TextStyle::new(style.size * self.canvas.current_scale(), style.color);
        self.record(DrawOp::Text {
            pos,
            text: text.to_string(),
            style,
        });
    }
}
