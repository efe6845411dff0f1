use crate::models::active_item::{ActiveItem, TITLE_HEIGHT};
use crate::models::viewport::{ContentLayout, Rect, ViewportSize};
use rand::Rng;
use serde::Serialize;

/// Distance kept from the viewport edges.
pub const EDGE_PADDING: f32 = 50.0;
/// Minimum center to center distance between two active items.
pub const MIN_ITEM_DISTANCE: f32 = 100.0;
pub const MAX_PLACEMENT_ATTEMPTS: usize = 50;
/// Share of an item (title included) allowed on top of the content column.
pub const MAX_CONTENT_OVERLAP: f32 = 0.3;
/// Share of the title strip allowed on top of the content column.
pub const MAX_TITLE_OVERLAP: f32 = 0.5;

#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    /// Set when no random candidate passed and the margin fallback was used.
    pub fallback: bool,
}

/// Uniform sample in `[low, high)`, or `low` when the span is empty.
pub(crate) fn sample_span<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Overlap ratios of a candidate box with the reserved content area:
/// (whole item including title, title strip alone).
pub fn content_overlap(candidate: &Rect, media_height: f32, reserved: &Rect) -> (f32, f32) {
    let title = Rect::new(
        candidate.left,
        candidate.top + media_height,
        candidate.right,
        candidate.top + media_height + TITLE_HEIGHT,
    );
    (
        candidate.overlap_ratio(reserved),
        title.overlap_ratio(reserved),
    )
}

fn too_close(candidate: &Rect, others: &[ActiveItem]) -> bool {
    others.iter().any(|other| {
        let existing = other.footprint();
        candidate.intersects(&existing)
            || candidate.distance_between_centers(&existing) < MIN_ITEM_DISTANCE
    })
}

/// Finds a top-left anchor for a `width` x `height` media box (plus title)
/// that keeps clear of the content column and of `others`.
pub fn find_position<R: Rng + ?Sized>(
    rng: &mut R,
    viewport: ViewportSize,
    layout: &ContentLayout,
    width: f32,
    height: f32,
    others: &[ActiveItem],
) -> Placement {
    let total_height = height + TITLE_HEIGHT;
    let reserved = layout.reserved_rect(viewport);
    let max_x = (viewport.width - width - EDGE_PADDING).max(0.0);
    let max_y = (viewport.height - total_height - EDGE_PADDING).max(0.0);

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let x = sample_span(rng, EDGE_PADDING, max_x);
        let y = sample_span(rng, EDGE_PADDING, max_y);
        let candidate = Rect::from_origin_size(x, y, width, total_height);

        let (overlap, title_overlap) = content_overlap(&candidate, height, &reserved);
        if overlap >= MAX_CONTENT_OVERLAP || title_overlap >= MAX_TITLE_OVERLAP {
            continue;
        }
        if too_close(&candidate, others) {
            continue;
        }

        return Placement {
            x,
            y,
            fallback: false,
        };
    }

    fallback_position(rng, viewport, layout, width, total_height, others)
}

// Outer margin on the side away from the first existing item
fn fallback_position<R: Rng + ?Sized>(
    rng: &mut R,
    viewport: ViewportSize,
    layout: &ContentLayout,
    width: f32,
    total_height: f32,
    others: &[ActiveItem],
) -> Placement {
    let content = layout.content_rect(viewport);
    let half = viewport.width / 2.0;
    let left_band_end = content.left - width - EDGE_PADDING;
    let right_band_start = content.right + layout.padding + EDGE_PADDING;
    let right_band_end = viewport.width - width - EDGE_PADDING;

    let left_band = |rng: &mut R, limit: f32| sample_span(rng, EDGE_PADDING, limit);
    let right_band = |rng: &mut R, start: f32| sample_span(rng, start, right_band_end);

    let x = match others.first() {
        Some(existing) if existing.x < half => right_band(&mut *rng, right_band_start.max(half)),
        Some(_) => left_band(&mut *rng, left_band_end.min(half)),
        None if rng.gen_bool(0.5) => left_band(&mut *rng, left_band_end),
        None => right_band(&mut *rng, right_band_start),
    };
    let y = sample_span(
        rng,
        EDGE_PADDING,
        (viewport.height - total_height - EDGE_PADDING).max(0.0),
    );

    Placement {
        // Narrow viewports leave no margin band at all, stay on screen
        x: x.clamp(0.0, (viewport.width - width).max(0.0)),
        y,
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::active_item::{ActiveItem, DriftVector};
    use crate::models::catalog::CatalogEntry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn item_at(x: f32, y: f32, width: u32) -> ActiveItem {
        ActiveItem {
            id: "existing".into(),
            entry: Arc::new(CatalogEntry {
                id: "existing".into(),
                name: "Existing".into(),
                images: vec!["e.png".into()],
                videos: vec![],
            }),
            x,
            y,
            width,
            height: None,
            drift: DriftVector::default(),
            duration_ms: 5000,
            created_at: 0,
        }
    }

    #[test]
    fn accepted_positions_respect_bounds_and_content() {
        let viewport = ViewportSize::new(1920.0, 1080.0);
        let layout = ContentLayout::default();
        let reserved = layout.reserved_rect(viewport);

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let placement = find_position(&mut rng, viewport, &layout, 180.0, 101.25, &[]);
            assert!(!placement.fallback, "seed {seed} fell back");

            assert!(placement.x >= EDGE_PADDING);
            assert!(placement.x <= viewport.width - 180.0 - EDGE_PADDING);
            assert!(placement.y >= EDGE_PADDING);
            assert!(placement.y <= viewport.height - 131.25 - EDGE_PADDING);

            let candidate = Rect::from_origin_size(placement.x, placement.y, 180.0, 131.25);
            let (overlap, title_overlap) = content_overlap(&candidate, 101.25, &reserved);
            assert!(overlap < MAX_CONTENT_OVERLAP);
            assert!(title_overlap < MAX_TITLE_OVERLAP);
        }
    }

    #[test]
    fn keeps_distance_from_existing_items() {
        let viewport = ViewportSize::new(1920.0, 1080.0);
        let layout = ContentLayout::default();
        let existing = item_at(120.0, 400.0, 200);

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let placement = find_position(
                &mut rng,
                viewport,
                &layout,
                160.0,
                90.0,
                std::slice::from_ref(&existing),
            );
            if placement.fallback {
                continue;
            }
            let candidate = Rect::from_origin_size(placement.x, placement.y, 160.0, 120.0);
            let other = existing.footprint();
            assert!(!candidate.intersects(&other));
            assert!(candidate.distance_between_centers(&other) >= MIN_ITEM_DISTANCE);
        }
    }

    #[test]
    fn narrow_viewport_uses_margin_fallback() {
        // 768 px column centered in 800 px: content spans [16, 784]
        let viewport = ViewportSize::new(800.0, 900.0);
        let layout = ContentLayout::default();
        assert_eq!(layout.content_rect(viewport).left, 16.0);
        assert_eq!(layout.content_rect(viewport).right, 784.0);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let placement = find_position(&mut rng, viewport, &layout, 180.0, 101.0, &[]);

            if placement.fallback {
                assert!(placement.x >= 0.0 && placement.x <= 800.0 - 180.0);
            } else {
                let candidate = Rect::from_origin_size(placement.x, placement.y, 180.0, 131.0);
                let (overlap, title_overlap) =
                    content_overlap(&candidate, 101.0, &layout.reserved_rect(viewport));
                assert!(overlap < MAX_CONTENT_OVERLAP && title_overlap < MAX_TITLE_OVERLAP);
            }
        }
    }

    #[test]
    fn fallback_picks_side_opposite_existing_item() {
        let viewport = ViewportSize::new(1600.0, 900.0);
        let layout = ContentLayout {
            max_width: 1000.0,
            padding: 16.0,
            top: 0.0,
        };
        let on_left = item_at(60.0, 300.0, 150);
        let on_right = item_at(1400.0, 300.0, 150);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let placement = fallback_position(
                &mut rng,
                viewport,
                &layout,
                150.0,
                114.375,
                std::slice::from_ref(&on_left),
            );
            assert!(placement.fallback);
            assert!(placement.x >= 1366.0 && placement.x <= 1400.0);

            let placement = fallback_position(
                &mut rng,
                viewport,
                &layout,
                150.0,
                114.375,
                std::slice::from_ref(&on_right),
            );
            assert!(placement.x >= 50.0 && placement.x <= 100.0);

            let placement = fallback_position(&mut rng, viewport, &layout, 150.0, 114.375, &[]);
            let in_left = placement.x <= 100.0;
            let in_right = placement.x >= 1366.0;
            assert!(in_left || in_right);
        }
    }

    #[test]
    fn fully_covered_viewport_always_falls_back() {
        let viewport = ViewportSize::new(1600.0, 900.0);
        let layout = ContentLayout {
            max_width: 1600.0,
            padding: 16.0,
            top: 0.0,
        };

        let mut rng = StdRng::seed_from_u64(3);
        let placement = find_position(&mut rng, viewport, &layout, 150.0, 84.375, &[]);
        assert!(placement.fallback);
        assert!(placement.x >= 0.0 && placement.x <= 1450.0);
    }

    #[test]
    fn empty_span_returns_lower_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample_span(&mut rng, 50.0, 10.0), 50.0);
        let value = sample_span(&mut rng, 10.0, 20.0);
        assert!((10.0..20.0).contains(&value));
    }
}
