use crate::media::loader::{LoadError, LoadOutcome, MediaDimensions, MediaLoader, LOAD_TIMEOUT};
use crate::models::catalog::{Catalog, CatalogEntry, MediaKind};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};

/// Pause between two background warm-up loads.
const WARM_GAP: Duration = Duration::from_millis(100);

/// Last known state of a media URL.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MediaStatus {
    Loaded(Option<MediaDimensions>),
    Failed,
}

/// Process-wide record of what has been fetched, shared with the renderer.
#[derive(Default)]
pub struct PreloadCache {
    seen_images: Mutex<HashSet<String>>,
    seen_videos: Mutex<HashSet<String>>,
    statuses: Mutex<HashMap<String, MediaStatus>>,
}

impl PreloadCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn seen(&self, kind: MediaKind) -> &Mutex<HashSet<String>> {
        match kind {
            MediaKind::Image => &self.seen_images,
            MediaKind::Video => &self.seen_videos,
        }
    }

    pub fn is_loaded(&self, url: &str, kind: MediaKind) -> bool {
        self.seen(kind)
            .lock()
            .map(|seen| seen.contains(url))
            .unwrap_or(false)
    }

    pub fn status(&self, url: &str) -> Option<MediaStatus> {
        self.statuses
            .lock()
            .ok()
            .and_then(|statuses| statuses.get(url).copied())
    }

    /// Stores a load result. Failed URLs stay out of the seen sets so a
    /// later preload tries them again.
    pub fn record(&self, url: &str, kind: MediaKind, outcome: &LoadOutcome) -> bool {
        let status = match outcome {
            Ok(dimensions) => {
                if let Ok(mut seen) = self.seen(kind).lock() {
                    seen.insert(url.to_string());
                }
                MediaStatus::Loaded(*dimensions)
            }
            Err(e) => {
                warn!("Failed to preload {:?} {}: {}", kind, url, e);
                MediaStatus::Failed
            }
        };
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.insert(url.to_string(), status);
        }
        outcome.is_ok()
    }
}

/// Result of waiting on every asset of one entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub skipped: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl PreloadReport {
    pub fn requested(&self) -> usize {
        self.loaded + self.failed
    }
}

#[derive(Clone)]
pub struct Preloader {
    loader: Arc<dyn MediaLoader>,
    cache: Arc<PreloadCache>,
    load_timeout: Duration,
}

impl Preloader {
    pub fn new(loader: Arc<dyn MediaLoader>, cache: Arc<PreloadCache>) -> Self {
        Self {
            loader,
            cache,
            load_timeout: LOAD_TIMEOUT,
        }
    }

    /// Loads still pending after `timeout` count as failed.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<PreloadCache> {
        &self.cache
    }

    /// Loads every not yet seen asset of `entry` concurrently and resolves
    /// once each of them either loaded or failed.
    pub async fn preload_entry(&self, entry: &CatalogEntry) -> PreloadReport {
        let mut report = PreloadReport::default();
        let mut requested = HashSet::new();
        let mut pending = JoinSet::new();

        for (url, kind) in entry.media() {
            if !requested.insert((url, kind)) {
                continue;
            }
            if self.cache.is_loaded(url, kind) {
                report.skipped += 1;
                continue;
            }

            let loader = self.loader.clone();
            let url = url.to_string();
            let limit = self.load_timeout;
            pending.spawn(async move {
                let outcome = load_bounded(loader.as_ref(), &url, kind, limit).await;
                (url, kind, outcome)
            });
        }

        if pending.is_empty() {
            return report;
        }

        debug!(
            "Preloading {} assets for entry {}",
            pending.len(),
            entry.id
        );

        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok((url, kind, outcome)) => {
                    if self.cache.record(&url, kind, &outcome) {
                        report.loaded += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    warn!("Preload task for entry {} ended abnormally: {}", entry.id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Warms every remaining catalog asset one at a time after `delay`.
    /// Nothing waits on this; the handle only exists so it can be aborted.
    pub fn warm_catalog(&self, catalog: &Catalog, delay: Duration) -> JoinHandle<()> {
        let media = catalog.unique_media();
        let preloader = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut warmed = 0;
            for (url, kind) in media {
                if preloader.cache.is_loaded(&url, kind) {
                    continue;
                }
                let outcome =
                    load_bounded(preloader.loader.as_ref(), &url, kind, preloader.load_timeout)
                        .await;
                if preloader.cache.record(&url, kind, &outcome) {
                    warmed += 1;
                }

                tokio::task::yield_now().await;
                tokio::time::sleep(WARM_GAP).await;
            }

            info!("Background warm-up finished, {} assets loaded", warmed);
        })
    }
}

async fn load_bounded(
    loader: &dyn MediaLoader,
    url: &str,
    kind: MediaKind,
    limit: Duration,
) -> LoadOutcome {
    tokio::time::timeout(limit, loader.load(url, kind))
        .await
        .unwrap_or_else(|_| {
            Err(LoadError::TimedOut {
                url: url.to_string(),
                after: limit,
            })
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds for every URL except the ones containing "broken".
    #[derive(Default)]
    pub(crate) struct CountingLoader {
        pub calls: AtomicUsize,
        pub urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaLoader for CountingLoader {
        async fn load(&self, url: &str, kind: MediaKind) -> LoadOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                return Err(LoadError::Empty(url.to_string()));
            }
            match kind {
                MediaKind::Image => Ok(Some(MediaDimensions::new(400, 300))),
                MediaKind::Video => Ok(None),
            }
        }
    }

    /// Never answers for URLs containing "stalled", otherwise behaves
    /// like `CountingLoader`.
    #[derive(Default)]
    pub(crate) struct StallingLoader {
        pub inner: CountingLoader,
    }

    #[async_trait]
    impl MediaLoader for StallingLoader {
        async fn load(&self, url: &str, kind: MediaKind) -> LoadOutcome {
            if url.contains("stalled") {
                std::future::pending::<()>().await;
            }
            self.inner.load(url, kind).await
        }
    }

    fn entry(images: &[&str], videos: &[&str]) -> CatalogEntry {
        CatalogEntry {
            id: "entry".into(),
            name: "Entry".into(),
            images: images.iter().map(|s| s.to_string()).collect(),
            videos: videos.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn failures_still_complete_the_entry() {
        let loader = Arc::new(CountingLoader::default());
        let preloader = Preloader::new(loader.clone(), PreloadCache::new());

        let report = preloader
            .preload_entry(&entry(&["a.png", "broken.png"], &["a.mp4"]))
            .await;

        assert_eq!(report.loaded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            preloader.cache().status("a.png"),
            Some(MediaStatus::Loaded(Some(MediaDimensions::new(400, 300))))
        );
        assert_eq!(preloader.cache().status("broken.png"), Some(MediaStatus::Failed));
        assert!(!preloader.cache().is_loaded("broken.png", MediaKind::Image));
    }

    #[tokio::test]
    async fn seen_urls_are_skipped() {
        let loader = Arc::new(CountingLoader::default());
        let preloader = Preloader::new(loader.clone(), PreloadCache::new());
        let entry = entry(&["a.png", "a.png"], &["a.mp4"]);

        preloader.preload_entry(&entry).await;
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);

        let report = preloader.preload_entry(&entry).await;
        assert_eq!(report.skipped, 2);
        assert_eq!(report.requested(), 0);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn entry_without_media_completes_immediately() {
        let loader = Arc::new(CountingLoader::default());
        let preloader = Preloader::new(loader.clone(), PreloadCache::new());

        let report = preloader.preload_entry(&entry(&[], &[])).await;
        assert_eq!(report, PreloadReport::default());
    }

    #[tokio::test]
    async fn stalled_loads_time_out_as_failures() {
        let preloader = Preloader::new(Arc::new(StallingLoader::default()), PreloadCache::new())
            .with_load_timeout(Duration::from_millis(20));

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            preloader.preload_entry(&entry(&["a.png"], &["stalled.mp4"])),
        )
        .await
        .unwrap();

        assert_eq!(report.loaded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(preloader.cache().status("stalled.mp4"), Some(MediaStatus::Failed));
        assert!(!preloader.cache().is_loaded("stalled.mp4", MediaKind::Video));
    }

    #[tokio::test]
    async fn warm_up_loads_only_what_is_left() {
        let loader = Arc::new(CountingLoader::default());
        let preloader = Preloader::new(loader.clone(), PreloadCache::new());
        let catalog = Catalog::new(vec![
            CatalogEntry {
                id: "a".into(),
                name: "A".into(),
                images: vec!["a.png".into()],
                videos: vec![],
            },
            CatalogEntry {
                id: "b".into(),
                name: "B".into(),
                images: vec!["a.png".into(), "b.png".into()],
                videos: vec!["b.mp4".into()],
            },
        ]);

        preloader.preload_entry(&catalog.entries()[0]).await;
        preloader
            .warm_catalog(&catalog, Duration::ZERO)
            .await
            .unwrap();

        let urls = loader.urls.lock().unwrap().clone();
        assert_eq!(urls, vec!["a.png", "b.mp4", "b.png"]);
    }
}
