use crate::display::renderer::ItemFrame;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Drawing target of the background layer.
pub trait Surface: Debug + Send {
    /// Creates or updates the box for `frame.id`.
    fn place(&mut self, frame: &ItemFrame);
    fn remove(&mut self, id: &str);
    /// Called once per frame after every item was placed.
    fn present(&mut self) {}
    fn clear(&mut self);
}

/// Surface that keeps the latest frame in memory so the web API can hand
/// it to browsers.
#[derive(Clone, Debug, Default)]
pub struct FrameStore {
    pending: Vec<ItemFrame>,
    published: Arc<Mutex<Vec<ItemFrame>>>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames as of the last `present`, in paint order.
    pub fn snapshot(&self) -> Vec<ItemFrame> {
        self.published
            .lock()
            .map(|frames| frames.clone())
            .unwrap_or_default()
    }

    fn publish(&self, frames: Vec<ItemFrame>) {
        if let Ok(mut published) = self.published.lock() {
            *published = frames;
        }
    }
}

impl Surface for FrameStore {
    fn place(&mut self, frame: &ItemFrame) {
        match self.pending.iter_mut().find(|f| f.id == frame.id) {
            Some(existing) => *existing = frame.clone(),
            None => self.pending.push(frame.clone()),
        }
    }

    fn remove(&mut self, id: &str) {
        self.pending.retain(|f| f.id != id);
    }

    fn present(&mut self) {
        self.publish(self.pending.clone());
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.publish(Vec::new());
    }
}
