use crate::display::renderer::ItemRenderer;
use crate::display::surface::Surface;
use crate::media::preload::PreloadCache;
use crate::models::active_item::ActiveItem;
use crate::models::viewport::ViewportSize;
use log::debug;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Arc;

/// All boxes on screen, including the ones still fading out after the
/// scheduler dropped them.
pub struct BackgroundView {
    renderers: Vec<ItemRenderer>,
    finished: Vec<String>,
    cache: Arc<PreloadCache>,
    rng: StdRng,
}

impl BackgroundView {
    pub fn new(cache: Arc<PreloadCache>, rng: StdRng) -> Self {
        Self {
            renderers: Vec::new(),
            finished: Vec::new(),
            cache,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    /// Mounts renderers for new items and starts the exit fade of the ones
    /// that left the active set.
    pub fn sync(&mut self, items: &[ActiveItem]) {
        let active: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();

        for renderer in &mut self.renderers {
            if !renderer.is_exiting() && !active.contains(renderer.id()) {
                debug!("Item {} left the active set, fading out", renderer.id());
                renderer.begin_exit();
            }
        }

        for item in items {
            if self.renderers.iter().any(|r| r.id() == item.id) {
                continue;
            }
            let renderer = ItemRenderer::new(item.clone(), &mut self.rng);
            debug!(
                "Mounting item {} ({}) with {:?}",
                item.id,
                item.entry.name,
                renderer.choice()
            );
            self.renderers.push(renderer);
        }
    }

    pub fn update(&mut self, dt_ms: f32, viewport: ViewportSize) {
        for renderer in &mut self.renderers {
            renderer.update(dt_ms, &self.cache, viewport);
        }

        let (done, alive): (Vec<_>, Vec<_>) = self
            .renderers
            .drain(..)
            .partition(|renderer| renderer.is_finished());
        self.renderers = alive;
        self.finished
            .extend(done.into_iter().map(|renderer| renderer.id().to_string()));
    }

    /// Heights measured since the last call, one report per item.
    pub fn take_resolved_heights(&mut self) -> Vec<(String, f32)> {
        self.renderers
            .iter_mut()
            .filter(|renderer| !renderer.is_exiting())
            .filter_map(|renderer| {
                renderer
                    .take_resolved_height()
                    .map(|height| (renderer.id().to_string(), height))
            })
            .collect()
    }

    pub fn draw(&mut self, surface: &mut dyn Surface) {
        for id in self.finished.drain(..) {
            surface.remove(&id);
        }
        for renderer in &self.renderers {
            surface.place(&renderer.frame());
        }
        surface.present();
    }
}
