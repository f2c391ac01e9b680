use super::{pt, Point, Rect};

/// Clip region in device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipRegion {
    Rect(Rect),
    Circle { center: Point, radius: f32 },
}

impl ClipRegion {
    pub fn contains(&self, p: Point) -> bool {
        match *self {
            ClipRegion::Rect(rect) => rect.contains(p),
            ClipRegion::Circle { center, radius } => {
                let dx = p.x - center.x;
                let dy = p.y - center.y;
                dx * dx + dy * dy <= radius * radius
            }
        }
    }

    pub fn bounds(&self) -> Rect {
        match *self {
            ClipRegion::Rect(rect) => rect,
            ClipRegion::Circle { center, radius } => Rect {
                min: pt(center.x - radius, center.y - radius),
                max: pt(center.x + radius, center.y + radius),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Layer {
    offset: Point,
    scale: f32,
    clips: Vec<ClipRegion>,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            offset: Point::default(),
            scale: 1.0,
            clips: Vec::new(),
        }
    }
}

/// Transform and clip bookkeeping shared by every [`super::Surface`] backend.
///
/// The transform is `device = offset + scale * local`, which is all a
/// translate-and-uniform-scale canvas ever needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanvasState {
    current: Layer,
    saved: Vec<Layer>,
}

impl CanvasState {
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Unbalanced restores are ignored.
    pub fn restore(&mut self) {
        if let Some(layer) = self.saved.pop() {
            self.current = layer;
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        let s = self.current.scale;
        self.current.offset.x += s * dx;
        self.current.offset.y += s * dy;
    }

    pub fn scale(&mut self, factor: f32) {
        self.current.scale *= factor;
    }

    pub fn current_scale(&self) -> f32 {
        self.current.scale
    }

    pub fn to_device(&self, p: Point) -> Point {
        let Layer { offset, scale, .. } = self.current;
        pt(offset.x + scale * p.x, offset.y + scale * p.y)
    }

    pub fn rect_to_device(&self, rect: Rect) -> Rect {
        let a = self.to_device(rect.min);
        let b = self.to_device(rect.max);
        Rect {
            min: pt(a.x.min(b.x), a.y.min(b.y)),
            max: pt(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn clip_rect(&mut self, rect: Rect) {
        let device = self.rect_to_device(rect);
        self.current.clips.push(ClipRegion::Rect(device));
    }

    pub fn clip_circle(&mut self, center: Point, radius: f32) {
        let center = self.to_device(center);
        let radius = radius * self.current.scale.abs();
        self.current.clips.push(ClipRegion::Circle { center, radius });
    }

    pub fn clips(&self) -> &[ClipRegion] {
        &self.current.clips
    }

    pub fn is_visible(&self, p: Point) -> bool {
        self.current.clips.iter().all(|c| c.contains(p))
    }
}
