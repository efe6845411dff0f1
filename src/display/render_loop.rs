use crate::background::runtime::SchedulerCommand;
use crate::display::surface::Surface;
use crate::display::view::BackgroundView;
use crate::media::preload::PreloadCache;
use crate::models::active_item::ActiveItem;
use crate::models::viewport::ViewportSize;
use log::{debug, info};
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

/// Clears the surface however the loop ends, abort included.
struct SurfaceGuard(Box<dyn Surface>);

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        self.0.clear();
    }
}

pub struct RenderInputs {
    pub items: watch::Receiver<Vec<ActiveItem>>,
    pub viewport: watch::Receiver<ViewportSize>,
    pub commands: mpsc::Sender<SchedulerCommand>,
    pub cache: Arc<PreloadCache>,
}

// Frame loop that keeps the surface in step with the active set
pub async fn render_loop(
    inputs: RenderInputs,
    surface: Box<dyn Surface>,
    rng: StdRng,
    frame_interval: Duration,
) {
    info!("Starting background render loop");
    let RenderInputs {
        mut items,
        viewport,
        commands,
        cache,
    } = inputs;

    let mut surface = SurfaceGuard(surface);
    let mut view = BackgroundView::new(cache, rng);
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut last_time = Instant::now();
    let mut frame_count = 0;
    let mut last_stats_time = Instant::now();

    view.sync(&items.borrow_and_update());

    loop {
        ticker.tick().await;

        match items.has_changed() {
            Ok(true) => view.sync(&items.borrow_and_update()),
            Ok(false) => {}
            Err(_) => {
                debug!("Scheduler went away, stopping render loop");
                break;
            }
        }

        let now = Instant::now();
        let dt_ms = now.duration_since(last_time).as_secs_f32() * 1000.0;
        last_time = now;

        let size = *viewport.borrow();
        view.update(dt_ms, size);

        for (id, height) in view.take_resolved_heights() {
            if commands
                .send(SchedulerCommand::HeightResolved { id, height })
                .await
                .is_err()
            {
                debug!("Scheduler command channel closed");
            }
        }

        view.draw(surface.0.as_mut());

        frame_count += 1;
        if now.duration_since(last_stats_time).as_secs() >= 60 {
            let fps = frame_count as f32 / now.duration_since(last_stats_time).as_secs_f32();
            info!(
                "Background render performance: {:.1} FPS, {} boxes",
                fps,
                view.len()
            );
            frame_count = 0;
            last_stats_time = now;
        }
    }
}
