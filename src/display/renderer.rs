use crate::display::easing::FADE_CURVE;
use crate::media::preload::{MediaStatus, PreloadCache};
use crate::models::active_item::ActiveItem;
use crate::models::catalog::MediaKind;
use crate::models::viewport::{Rect, ViewportSize};
use log::debug;
use rand::Rng;
use serde::Serialize;

/// Fade in and fade out time, independent of the item duration.
pub const FADE_MS: f32 = 2000.0;
/// Blur radius of a fully hidden item.
pub const MAX_BLUR_PX: f32 = 8.0;
/// Opacity of the media itself once faded in.
pub const MEDIA_OPACITY: f32 = 0.6;
/// Share of a video box that must be on screen for it to keep playing.
pub const VISIBILITY_THRESHOLD: f32 = 0.1;

/// Which media an item shows. Fixed when the item mounts.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaChoice {
    Image {
        url: String,
        fallback_video: Option<String>,
    },
    Video {
        url: String,
    },
    Empty,
}

impl MediaChoice {
    fn url(&self) -> Option<&str> {
        match self {
            MediaChoice::Image { url, .. } | MediaChoice::Video { url } => Some(url),
            MediaChoice::Empty => None,
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct MediaFrame {
    pub kind: MediaKind,
    pub url: String,
    pub playing: bool,
    pub looped: bool,
    pub muted: bool,
    pub opacity: f32,
}

/// Everything a surface needs to draw one item for the current frame.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ItemFrame {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub blur: f32,
    pub media: Option<MediaFrame>,
}

/// Presentation state of one active item.
pub struct ItemRenderer {
    item: ActiveItem,
    choice: MediaChoice,
    elapsed_ms: f32,
    // (time since removal, visibility when removal started)
    exit: Option<(f32, f32)>,
    height: f32,
    resolved: bool,
    reported: bool,
    playing: bool,
}

impl ItemRenderer {
    pub fn new<R: Rng + ?Sized>(item: ActiveItem, rng: &mut R) -> Self {
        let choice = choose_media(&item, rng);
        let height = ActiveItem::estimated_height(item.width);
        Self {
            item,
            choice,
            elapsed_ms: 0.0,
            exit: None,
            height,
            resolved: false,
            reported: false,
            playing: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn choice(&self) -> &MediaChoice {
        &self.choice
    }

    pub fn is_exiting(&self) -> bool {
        self.exit.is_some()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.exit, Some((elapsed, _)) if elapsed >= FADE_MS)
    }

    pub fn begin_exit(&mut self) {
        if self.exit.is_none() {
            self.exit = Some((0.0, self.visibility()));
        }
    }

    pub fn update(&mut self, dt_ms: f32, cache: &PreloadCache, viewport: ViewportSize) {
        self.elapsed_ms += dt_ms;
        if let Some((elapsed, _)) = &mut self.exit {
            *elapsed += dt_ms;
        }

        self.apply_media_status(cache);

        self.playing = matches!(self.choice, MediaChoice::Video { .. })
            && self.visible_share(viewport) >= VISIBILITY_THRESHOLD;
    }

    fn apply_media_status(&mut self, cache: &PreloadCache) {
        let fallback = match &self.choice {
            MediaChoice::Image {
                url,
                fallback_video: Some(video),
            } if cache.status(url) == Some(MediaStatus::Failed) => {
                debug!("Image {} failed, showing video {} instead", url, video);
                Some(video.clone())
            }
            _ => None,
        };
        if let Some(url) = fallback {
            self.choice = MediaChoice::Video { url };
        }

        if self.resolved {
            return;
        }
        let Some(url) = self.choice.url() else {
            return;
        };

        match cache.status(url) {
            Some(MediaStatus::Loaded(Some(dimensions))) => {
                if let Some(ratio) = dimensions.aspect_ratio() {
                    self.height = self.item.width as f32 * ratio;
                } else {
                    self.height = self.item.width as f32;
                }
                self.resolved = true;
            }
            // Ready, but the size is unknown
            Some(MediaStatus::Loaded(None)) => {
                self.height = self.item.width as f32;
                self.resolved = true;
            }
            Some(MediaStatus::Failed) | None => {}
        }
    }

    /// The measured height, handed out once.
    pub fn take_resolved_height(&mut self) -> Option<f32> {
        if self.resolved && !self.reported {
            self.reported = true;
            return Some(self.height);
        }
        None
    }

    fn visibility(&self) -> f32 {
        let entered = FADE_CURVE.apply(self.elapsed_ms / FADE_MS);
        match self.exit {
            Some((elapsed, from)) => from * (1.0 - FADE_CURVE.apply(elapsed / FADE_MS)),
            None => entered,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        let travel_ms = self.elapsed_ms.min(self.item.duration_ms as f32);
        let (dx, dy) = self.item.drift.offset_after(travel_ms);
        (self.item.x + dx, self.item.y + dy)
    }

    fn visible_share(&self, viewport: ViewportSize) -> f32 {
        let (x, y) = self.position();
        Rect::from_origin_size(x, y, self.item.width as f32, self.height)
            .overlap_ratio(&viewport.bounds())
    }

    pub fn frame(&self) -> ItemFrame {
        let (x, y) = self.position();
        let visibility = self.visibility();
        let media = match &self.choice {
            MediaChoice::Image { url, .. } => Some(MediaFrame {
                kind: MediaKind::Image,
                url: url.clone(),
                playing: false,
                looped: false,
                muted: false,
                opacity: MEDIA_OPACITY,
            }),
            MediaChoice::Video { url } => Some(MediaFrame {
                kind: MediaKind::Video,
                url: url.clone(),
                playing: self.playing,
                looped: true,
                muted: true,
                opacity: MEDIA_OPACITY,
            }),
            MediaChoice::Empty => None,
        };

        ItemFrame {
            id: self.item.id.clone(),
            label: self.item.entry.name.clone(),
            x,
            y,
            width: self.item.width as f32,
            height: self.height,
            opacity: visibility,
            blur: MAX_BLUR_PX * (1.0 - visibility),
            media,
        }
    }
}

fn choose_media<R: Rng + ?Sized>(item: &ActiveItem, rng: &mut R) -> MediaChoice {
    let images = &item.entry.images;
    let videos = &item.entry.videos;
    let use_image = !images.is_empty() && (videos.is_empty() || rng.gen_bool(0.5));

    let video = (!videos.is_empty()).then(|| videos[rng.gen_range(0..videos.len())].clone());
    if use_image {
        let url = images[rng.gen_range(0..images.len())].clone();
        return MediaChoice::Image {
            url,
            fallback_video: video,
        };
    }
    match video {
        Some(url) => MediaChoice::Video { url },
        None => MediaChoice::Empty,
    }
}
