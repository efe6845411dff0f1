use crate::models::catalog::CatalogEntry;
use crate::models::viewport::Rect;
use serde::Serialize;
use std::sync::Arc;

/// Height reserved under every box for the entry name.
pub const TITLE_HEIGHT: f32 = 30.0;

/// height / width used until the real media dimensions are known (16:9).
pub const ESTIMATED_ASPECT_RATIO: f32 = 9.0 / 16.0;

/// Constant velocity of an item in pixels per second.
#[derive(Clone, Copy, Serialize, Debug, Default, PartialEq)]
pub struct DriftVector {
    pub dx: f32,
    pub dy: f32,
}

impl DriftVector {
    pub fn speed(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    /// Displacement accumulated after `elapsed_ms`.
    pub fn offset_after(&self, elapsed_ms: f32) -> (f32, f32) {
        let seconds = elapsed_ms / 1000.0;
        (self.dx * seconds, self.dy * seconds)
    }
}

/// One media box currently on screen. Owned by the scheduler.
#[derive(Clone, Serialize, Debug)]
pub struct ActiveItem {
    pub id: String,
    pub entry: Arc<CatalogEntry>,
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: Option<f32>,
    pub drift: DriftVector,
    pub duration_ms: u64,
    pub created_at: i64,
}

impl ActiveItem {
    pub fn estimated_height(width: u32) -> f32 {
        width as f32 * ESTIMATED_ASPECT_RATIO
    }

    /// Media height, measured if the renderer reported it.
    pub fn media_height(&self) -> f32 {
        self.height
            .unwrap_or_else(|| Self::estimated_height(self.width))
    }

    /// Bounding box at creation time including the title strip.
    pub fn footprint(&self) -> Rect {
        Rect::from_origin_size(
            self.x,
            self.y,
            self.width as f32,
            self.media_height() + TITLE_HEIGHT,
        )
    }

    pub fn total_drift(&self) -> f32 {
        self.drift.speed() * self.duration_ms as f32 / 1000.0
    }
}
