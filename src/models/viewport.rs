use serde::{Deserialize, Serialize};

/// Current window size in CSS pixels. Zero means not measured yet.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_initialized(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Axis aligned rectangle given by its edges.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Area shared with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let width = (self.right.min(other.right) - self.left.max(other.left)).max(0.0);
        let height = (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0.0);
        width * height
    }

    /// Fraction of this rectangle covered by `other`.
    pub fn overlap_ratio(&self, other: &Rect) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }

    pub fn distance_between_centers(&self, other: &Rect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }
}

/// Where the primary page content sits: a centered column with a fixed top
/// offset that runs to the bottom of the viewport.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct ContentLayout {
    pub max_width: f32,
    pub padding: f32,
    pub top: f32,
}

impl Default for ContentLayout {
    fn default() -> Self {
        Self {
            max_width: 768.0,
            padding: 16.0,
            top: 80.0,
        }
    }
}

impl ContentLayout {
    /// The column itself, before horizontal padding is applied.
    pub fn content_rect(&self, viewport: ViewportSize) -> Rect {
        let left = ((viewport.width - self.max_width) / 2.0).max(0.0);
        Rect::new(left, self.top, left + self.max_width, viewport.height)
    }

    /// The column widened by the horizontal padding, used for overlap checks.
    pub fn reserved_rect(&self, viewport: ViewportSize) -> Rect {
        let content = self.content_rect(viewport);
        Rect::new(
            content.left - self.padding,
            content.top,
            content.right + self.padding,
            content.bottom,
        )
    }
}
