use serde::{Deserialize, Serialize};

/// A point on the stacked-page ribbon. `x` is measured from the horizontal
/// center of the page, `y` grows downward across pages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AbsolutePos {
    pub x: f32,
    pub y: f32,
}

impl AbsolutePos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentPos {
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

impl DocumentPos {
    pub fn new(page: usize, x: f32, y: f32) -> Self {
        Self { page, x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowPos {
    pub x: f32,
    pub y: f32,
}

impl WindowPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Viewport coordinates scaled to `[-1, 1]` on both axes, `y` pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedWindowPos {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            x0: a.0.min(b.0),
            y0: a.1.min(b.1),
            x1: a.0.max(b.0),
            y1: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Closed overlap test, so touching edges and degenerate rectangles
    /// (a click without a drag) still count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quad {
    pub ul: (f32, f32),
    pub ur: (f32, f32),
    pub ll: (f32, f32),
    pub lr: (f32, f32),
}

impl Quad {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            ul: (rect.x0, rect.y0),
            ur: (rect.x1, rect.y0),
            ll: (rect.x0, rect.y1),
            lr: (rect.x1, rect.y1),
        }
    }

    pub fn bounds(&self) -> Rect {
        let xs = [self.ul.0, self.ur.0, self.ll.0, self.lr.0];
        let ys = [self.ul.1, self.ur.1, self.ll.1, self.lr.1];
        Rect {
            x0: xs.iter().copied().fold(f32::INFINITY, f32::min),
            y0: ys.iter().copied().fold(f32::INFINITY, f32::min),
            x1: xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            y1: ys.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }
}

/// Half-open interval overlap: `[a_begin, a_end)` against `[b_begin, b_end)`.
pub fn intervals_intersect(a_begin: f32, a_end: f32, b_begin: f32, b_end: f32) -> bool {
    a_begin < b_end && b_begin < a_end
}
