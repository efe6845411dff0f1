use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

// Kind of media asset, decides how readiness is detected
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A project whose media can surface in the background.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    // Accepts "image": "url" as well as "images": ["url", ...]
    #[serde(default, alias = "image", deserialize_with = "one_or_many")]
    pub images: Vec<String>,
    #[serde(default, alias = "video", deserialize_with = "one_or_many")]
    pub videos: Vec<String>,
}

impl CatalogEntry {
    pub fn has_media(&self) -> bool {
        !self.images.is_empty() || !self.videos.is_empty()
    }

    /// All media URLs of this entry tagged with their kind, videos first.
    pub fn media(&self) -> impl Iterator<Item = (&str, MediaKind)> {
        self.videos
            .iter()
            .map(|url| (url.as_str(), MediaKind::Video))
            .chain(self.images.iter().map(|url| (url.as_str(), MediaKind::Image)))
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) if url.is_empty() => Vec::new(),
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls.into_iter().filter(|url| !url.is_empty()).collect(),
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

/// Read-only list of entries shared by the scheduler, preloader and web API.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<Arc<CatalogEntry>>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn entries(&self) -> &[Arc<CatalogEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every distinct (URL, kind) pair in catalog order.
    pub fn unique_media(&self) -> Vec<(String, MediaKind)> {
        let mut seen = std::collections::HashSet::new();
        let mut media = Vec::new();
        for entry in &self.entries {
            for (url, kind) in entry.media() {
                if seen.insert((url, kind)) {
                    media.push((url.to_string(), kind));
                }
            }
        }
        media
    }
}

// Used when no catalog file is present
pub static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(|| {
    Catalog::new(vec![
        CatalogEntry {
            id: "project1".to_string(),
            name: "Motion Primitives Pro".to_string(),
            images: Vec::new(),
            videos: vec![
                "https://res.cloudinary.com/read-cv/video/upload/t_v_b/v1/1/profileItems/W2azTw5BVbMXfj7F53G92hMVIn32/newProfileItem/d898be8a-7037-4c71-af0c-8997239b050d.mp4?_a=DATAdtAAZAA0".to_string(),
            ],
        },
        CatalogEntry {
            id: "project2".to_string(),
            name: "Motion Primitives".to_string(),
            images: Vec::new(),
            videos: vec![
                "https://res.cloudinary.com/read-cv/video/upload/t_v_b/v1/1/profileItems/W2azTw5BVbMXfj7F53G92hMVIn32/XSfIvT7BUWbPRXhrbLed/ee6871c9-8400-49d2-8be9-e32675eabf7e.mp4?_a=DATAdtAAZAA0".to_string(),
            ],
        },
    ])
});
