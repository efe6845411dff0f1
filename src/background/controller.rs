use crate::background::runtime::{BackgroundEngine, EngineSettings};
use crate::background::scheduler::Transition;
use crate::display::renderer::ItemFrame;
use crate::display::surface::FrameStore;
use crate::media::preload::Preloader;
use crate::models::active_item::ActiveItem;
use crate::models::catalog::Catalog;
use crate::models::viewport::ViewportSize;
use log::info;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

pub type SharedController = Arc<tokio::sync::Mutex<BackgroundController>>;

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundStatus {
    Running,
    ReducedMotion,
    WaitingForViewport,
    NoEntries,
}

/// Starts, resizes and stops the background engine as the page reports its
/// viewport and motion preference.
pub struct BackgroundController {
    catalog: Catalog,
    preloader: Preloader,
    settings: EngineSettings,
    events: broadcast::Sender<Transition>,
    frames: FrameStore,
    engine: Option<BackgroundEngine>,
    viewport: ViewportSize,
    reduced_motion: bool,
}

impl BackgroundController {
    pub fn new(
        catalog: Catalog,
        preloader: Preloader,
        settings: EngineSettings,
        reduced_motion: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(100);
        Self {
            catalog,
            preloader,
            settings,
            events,
            frames: FrameStore::new(),
            engine: None,
            viewport: ViewportSize::default(),
            reduced_motion,
        }
    }

    pub fn shared(self) -> SharedController {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn status(&self) -> BackgroundStatus {
        if self.engine.is_some() {
            BackgroundStatus::Running
        } else if self.reduced_motion {
            BackgroundStatus::ReducedMotion
        } else if self.catalog.is_empty() {
            BackgroundStatus::NoEntries
        } else {
            BackgroundStatus::WaitingForViewport
        }
    }

    /// Applies the page's current viewport. `reduced_motion` overrides the
    /// configured preference when given.
    pub async fn update_viewport(
        &mut self,
        viewport: ViewportSize,
        reduced_motion: Option<bool>,
    ) -> BackgroundStatus {
        if let Some(reduced_motion) = reduced_motion {
            self.reduced_motion = reduced_motion;
        }
        self.viewport = viewport;

        if self.reduced_motion || !viewport.is_initialized() {
            self.stop().await;
            return self.status();
        }

        if let Some(engine) = &self.engine {
            engine.resize(viewport);
            return self.status();
        }

        self.engine = BackgroundEngine::start(
            self.catalog.clone(),
            self.preloader.clone(),
            viewport,
            self.reduced_motion,
            &self.settings,
            Box::new(self.frames.clone()),
            self.events.clone(),
        );
        self.status()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn active_items(&self) -> Vec<ActiveItem> {
        self.engine
            .as_ref()
            .map(|engine| engine.items())
            .unwrap_or_default()
    }

    pub fn frame(&self) -> Vec<ItemFrame> {
        self.frames.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.events.subscribe()
    }

    async fn stop(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.shutdown().await;
        }
    }

    /// Drops the engine without waiting, for contexts that cannot await.
    pub fn stop_now(&mut self) {
        if self.engine.take().is_some() {
            info!("Background engine dropped");
        }
    }

    pub async fn shutdown(&mut self) {
        info!("Shutting down background controller");
        self.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::preload::tests::{CountingLoader, StallingLoader};
    use crate::media::preload::PreloadCache;
    use crate::models::catalog::CatalogEntry;
    use std::time::Duration;

    fn controller(entries: usize, reduced_motion: bool) -> BackgroundController {
        let catalog = Catalog::new(
            (0..entries)
                .map(|i| CatalogEntry {
                    id: format!("p{i}"),
                    name: format!("P{i}"),
                    images: vec![],
                    videos: vec![format!("p{i}.mp4")],
                })
                .collect(),
        );
        let settings = EngineSettings {
            initial_delay: Duration::from_millis(5),
            min_interval_ms: 10,
            max_interval_ms: 20,
            frame_interval: Duration::from_millis(5),
            seed: Some(1),
            ..EngineSettings::default()
        };
        BackgroundController::new(
            catalog,
            Preloader::new(Arc::new(CountingLoader::default()), PreloadCache::new()),
            settings,
            reduced_motion,
        )
    }

    #[tokio::test]
    async fn waits_for_a_measured_viewport() {
        let mut controller = controller(3, false);
        assert_eq!(controller.status(), BackgroundStatus::WaitingForViewport);

        let status = controller
            .update_viewport(ViewportSize::new(0.0, 900.0), None)
            .await;
        assert_eq!(status, BackgroundStatus::WaitingForViewport);

        let status = controller
            .update_viewport(ViewportSize::new(1440.0, 900.0), None)
            .await;
        assert_eq!(status, BackgroundStatus::Running);

        let status = controller
            .update_viewport(ViewportSize::new(1280.0, 900.0), None)
            .await;
        assert_eq!(status, BackgroundStatus::Running);
        assert_eq!(controller.viewport(), ViewportSize::new(1280.0, 900.0));

        controller.shutdown().await;
        assert!(controller.active_items().is_empty());
    }

    #[tokio::test]
    async fn reduced_motion_stops_a_running_engine() {
        let mut controller = controller(3, false);
        let mut events = controller.subscribe();
        controller
            .update_viewport(ViewportSize::new(1440.0, 900.0), None)
            .await;

        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!controller.active_items().is_empty());

        let status = controller
            .update_viewport(ViewportSize::new(1440.0, 900.0), Some(true))
            .await;
        assert_eq!(status, BackgroundStatus::ReducedMotion);
        assert!(controller.active_items().is_empty());
        assert!(controller.frame().is_empty());
    }

    #[tokio::test]
    async fn empty_catalog_never_runs() {
        let mut empty = controller(0, false);
        let status = empty
            .update_viewport(ViewportSize::new(1440.0, 900.0), None)
            .await;
        assert_eq!(status, BackgroundStatus::NoEntries);

        let mut reduced = controller(2, true);
        let status = reduced
            .update_viewport(ViewportSize::new(1440.0, 900.0), None)
            .await;
        assert_eq!(status, BackgroundStatus::ReducedMotion);
    }

    #[tokio::test]
    async fn viewport_reports_never_wait_on_a_busy_scheduler() {
        let catalog = Catalog::new(vec![CatalogEntry {
            id: "slow".into(),
            name: "Slow".into(),
            images: vec![],
            videos: vec!["stalled.mp4".into()],
        }]);
        let settings = EngineSettings {
            initial_delay: Duration::from_millis(1),
            seed: Some(3),
            ..EngineSettings::default()
        };
        let shared = BackgroundController::new(
            catalog,
            Preloader::new(Arc::new(StallingLoader::default()), PreloadCache::new()),
            settings,
            false,
        )
        .shared();

        for i in 0..40 {
            let report = async {
                shared
                    .lock()
                    .await
                    .update_viewport(ViewportSize::new(1000.0 + i as f32, 800.0), None)
                    .await
            };
            let status = tokio::time::timeout(Duration::from_millis(500), report)
                .await
                .unwrap();
            assert_eq!(status, BackgroundStatus::Running);
        }

        let mut controller = shared.lock().await;
        assert_eq!(controller.viewport(), ViewportSize::new(1039.0, 800.0));
        controller.shutdown().await;
    }
}
