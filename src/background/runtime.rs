use crate::background::scheduler::{Scheduler, Transition};
use crate::display::render_loop::{render_loop, RenderInputs};
use crate::display::surface::Surface;
use crate::media::preload::Preloader;
use crate::models::active_item::ActiveItem;
use crate::models::catalog::Catalog;
use crate::models::viewport::{ContentLayout, ViewportSize};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Messages handled by the scheduler task between timer firings.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCommand {
    HeightResolved { id: String, height: f32 },
}

/// Timing and layout knobs of one engine run.
#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub layout: ContentLayout,
    pub initial_delay: Duration,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub warm_up_delay: Duration,
    pub frame_interval: Duration,
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            layout: ContentLayout::default(),
            initial_delay: Duration::from_millis(2000),
            min_interval_ms: 4000,
            max_interval_ms: 10000,
            warm_up_delay: Duration::from_millis(2000),
            frame_interval: Duration::from_millis(16),
            seed: None,
        }
    }
}

/// A running scheduler plus its render loop and catalog warm-up.
/// Dropping the engine stops all three and clears the surface.
pub struct BackgroundEngine {
    viewport_tx: watch::Sender<ViewportSize>,
    items: watch::Receiver<Vec<ActiveItem>>,
    tasks: Vec<JoinHandle<()>>,
}

impl BackgroundEngine {
    /// Starts the engine, or returns `None` when there is nothing to run:
    /// reduced motion requested, viewport not measured yet or no entries.
    pub fn start(
        catalog: Catalog,
        preloader: Preloader,
        viewport: ViewportSize,
        reduced_motion: bool,
        settings: &EngineSettings,
        surface: Box<dyn Surface>,
        events: broadcast::Sender<Transition>,
    ) -> Option<Self> {
        if reduced_motion {
            info!("Reduced motion requested, background stays empty");
            return None;
        }
        if !viewport.is_initialized() {
            debug!("Viewport not measured yet, not starting background");
            return None;
        }
        if catalog.is_empty() {
            info!("Catalog is empty, background stays empty");
            return None;
        }

        let mut seeds = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scheduler_rng = StdRng::seed_from_u64(seeds.gen());
        let view_rng = StdRng::seed_from_u64(seeds.gen());

        let warm_task = preloader.warm_catalog(&catalog, settings.warm_up_delay);
        let cache = preloader.cache().clone();

        let scheduler = Scheduler::new(
            catalog,
            preloader,
            settings.layout,
            viewport,
            scheduler_rng,
        );
        let items = scheduler.subscribe();
        let (commands, commands_rx) = mpsc::channel(32);
        let (viewport_tx, viewport_rx) = watch::channel(viewport);

        let render_task = tokio::spawn(render_loop(
            RenderInputs {
                items: scheduler.subscribe(),
                viewport: viewport_tx.subscribe(),
                commands,
                cache,
            },
            surface,
            view_rng,
            settings.frame_interval,
        ));
        let scheduler_task = tokio::spawn(scheduler_loop(
            scheduler,
            commands_rx,
            viewport_rx,
            events,
            settings.clone(),
        ));

        info!(
            "Background started for {}x{} viewport",
            viewport.width, viewport.height
        );

        Some(Self {
            viewport_tx,
            items,
            tasks: vec![scheduler_task, render_task, warm_task],
        })
    }

    /// Current active set as published by the scheduler.
    pub fn items(&self) -> Vec<ActiveItem> {
        self.items.borrow().clone()
    }

    /// New placements use the new size; items already placed stay put.
    /// Never waits on the scheduler, a busy cycle picks the size up once
    /// it is done.
    pub fn resize(&self, viewport: ViewportSize) {
        self.viewport_tx.send_replace(viewport);
    }

    /// Stops every task and waits until they are gone.
    pub async fn shutdown(mut self) {
        for task in std::mem::take(&mut self.tasks) {
            task.abort();
            let _ = task.await;
        }
        info!("Background stopped");
    }
}

impl Drop for BackgroundEngine {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn scheduler_loop(
    mut scheduler: Scheduler,
    mut commands: mpsc::Receiver<SchedulerCommand>,
    mut viewport: watch::Receiver<ViewportSize>,
    events: broadcast::Sender<Transition>,
    settings: EngineSettings,
) {
    let mut deadline = Instant::now() + settings.initial_delay;

    loop {
        tokio::select! {
            _ = sleep_until(deadline) => {
                let duration_ms =
                    scheduler.draw_interval(settings.min_interval_ms, settings.max_interval_ms);
                let transition = scheduler.cycle(duration_ms).await;
                // No subscribers is fine
                let _ = events.send(transition);
                deadline = Instant::now() + Duration::from_millis(duration_ms);
            }
            changed = viewport.changed() => {
                if changed.is_err() {
                    break;
                }
                scheduler.set_viewport(*viewport.borrow_and_update());
                let size = scheduler.viewport();
                debug!("Viewport resized to {}x{}", size.width, size.height);
            }
            command = commands.recv() => {
                match command {
                    Some(SchedulerCommand::HeightResolved { id, height }) => {
                        if scheduler.attach_height(&id, height) {
                            debug!("Item {} measured at {:.1}px", id, height);
                        }
                    }
                    None => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::scheduler::{Action, MAX_ACTIVE_ITEMS};
    use crate::display::surface::FrameStore;
    use crate::media::preload::tests::{CountingLoader, StallingLoader};
    use crate::media::preload::PreloadCache;
    use crate::models::catalog::CatalogEntry;
    use std::sync::Arc;

    fn catalog(count: usize) -> Catalog {
        Catalog::new(
            (0..count)
                .map(|i| CatalogEntry {
                    id: format!("p{i}"),
                    name: format!("P{i}"),
                    images: vec![format!("p{i}.png")],
                    videos: vec![],
                })
                .collect(),
        )
    }

    fn fast_settings() -> EngineSettings {
        EngineSettings {
            initial_delay: Duration::from_millis(10),
            min_interval_ms: 20,
            max_interval_ms: 30,
            warm_up_delay: Duration::from_millis(5),
            frame_interval: Duration::from_millis(5),
            seed: Some(7),
            ..EngineSettings::default()
        }
    }

    fn preloader() -> Preloader {
        Preloader::new(Arc::new(CountingLoader::default()), PreloadCache::new())
    }

    #[tokio::test]
    async fn does_not_start_without_something_to_show() {
        let (events, _) = broadcast::channel(8);
        let viewport = ViewportSize::new(1280.0, 800.0);
        let settings = fast_settings();

        let reduced = BackgroundEngine::start(
            catalog(2),
            preloader(),
            viewport,
            true,
            &settings,
            Box::new(FrameStore::new()),
            events.clone(),
        );
        assert!(reduced.is_none());

        let unmeasured = BackgroundEngine::start(
            catalog(2),
            preloader(),
            ViewportSize::default(),
            false,
            &settings,
            Box::new(FrameStore::new()),
            events.clone(),
        );
        assert!(unmeasured.is_none());

        let empty = BackgroundEngine::start(
            Catalog::default(),
            preloader(),
            viewport,
            false,
            &settings,
            Box::new(FrameStore::new()),
            events,
        );
        assert!(empty.is_none());
    }

    #[tokio::test]
    async fn publishes_transitions_and_frames() {
        let (events, mut events_rx) = broadcast::channel(64);
        let frames = FrameStore::new();
        let engine = BackgroundEngine::start(
            catalog(4),
            preloader(),
            ViewportSize::new(1920.0, 1080.0),
            false,
            &fast_settings(),
            Box::new(frames.clone()),
            events,
        )
        .unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.action, Action::Add);

        for _ in 0..5 {
            tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(engine.items().len() <= MAX_ACTIVE_ITEMS);
        }

        engine.resize(ViewportSize::new(1024.0, 768.0));

        for _ in 0..100 {
            if !frames.snapshot().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!frames.snapshot().is_empty());

        engine.shutdown().await;
        assert!(frames.snapshot().is_empty());
    }

    #[tokio::test]
    async fn stalled_media_does_not_freeze_the_scheduler() {
        let (events, mut events_rx) = broadcast::channel(64);
        let catalog = Catalog::new(vec![CatalogEntry {
            id: "stalled".into(),
            name: "Stalled".into(),
            images: vec![],
            videos: vec!["stalled.mp4".into()],
        }]);
        let preloader = Preloader::new(Arc::new(StallingLoader::default()), PreloadCache::new())
            .with_load_timeout(Duration::from_millis(30));
        let engine = BackgroundEngine::start(
            catalog,
            preloader,
            ViewportSize::new(1280.0, 800.0),
            false,
            &fast_settings(),
            Box::new(FrameStore::new()),
            events,
        )
        .unwrap();

        for i in 0..40 {
            engine.resize(ViewportSize::new(1000.0 + i as f32, 800.0));
        }

        let first = tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.action, Action::Add);
        assert_eq!(first.preload.failed, 1);

        tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
            .await
            .unwrap()
            .unwrap();

        engine.shutdown().await;
    }
}
