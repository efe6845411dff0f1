use crate::background::placement::{find_position, Placement};
use crate::media::preload::{PreloadReport, Preloader};
use crate::models::active_item::{ActiveItem, DriftVector};
use crate::models::catalog::{Catalog, CatalogEntry};
use crate::models::viewport::{ContentLayout, ViewportSize};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::f32::consts::TAU;
use std::sync::Arc;
use tokio::sync::watch;

/// Never more than this many items on screen at once.
pub const MAX_ACTIVE_ITEMS: usize = 2;

pub const MIN_ITEM_WIDTH: u32 = 150;
pub const MAX_ITEM_WIDTH: u32 = 200;

/// Total travel of an item over its whole duration, in pixels.
pub const MIN_DRIFT_DISTANCE: f32 = 10.0;
pub const MAX_DRIFT_DISTANCE: f32 = 30.0;

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub enum Phase {
    Empty,
    OneActive,
    TwoActive,
}

impl Phase {
    fn from_count(count: usize) -> Self {
        match count {
            0 => Phase::Empty,
            n if n >= MAX_ACTIVE_ITEMS => Phase::TwoActive,
            _ => Phase::OneActive,
        }
    }
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub enum Action {
    Add,
    Replace,
    Remove,
    RemoveAndAdd,
}

/// What one timer firing is going to do, decided before any loading starts.
#[derive(Clone, Debug)]
pub struct Plan {
    pub action: Action,
    /// Entry to show, `None` for a plain removal.
    pub entry: Option<Arc<CatalogEntry>>,
    /// Items left on screen once the plan is applied, new item excluded.
    pub remaining: Vec<ActiveItem>,
}

/// Outcome of an applied plan, published to listeners.
#[derive(Clone, Serialize, Debug)]
pub struct Transition {
    pub action: Action,
    pub added: Option<ActiveItem>,
    pub removed: Vec<String>,
    pub placement: Option<Placement>,
    #[serde(skip)]
    pub preload: PreloadReport,
}

/// Owns the set of active items and drives it through its states.
pub struct Scheduler {
    catalog: Catalog,
    preloader: Preloader,
    layout: ContentLayout,
    viewport: ViewportSize,
    rng: StdRng,
    items: Vec<ActiveItem>,
    items_tx: watch::Sender<Vec<ActiveItem>>,
}

impl Scheduler {
    pub fn new(
        catalog: Catalog,
        preloader: Preloader,
        layout: ContentLayout,
        viewport: ViewportSize,
        rng: StdRng,
    ) -> Self {
        let (items_tx, _) = watch::channel(Vec::new());
        Self {
            catalog,
            preloader,
            layout,
            viewport,
            rng,
            items: Vec::new(),
            items_tx,
        }
    }

    /// Receives a copy of the active set after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ActiveItem>> {
        self.items_tx.subscribe()
    }

    pub fn items(&self) -> &[ActiveItem] {
        &self.items
    }

    pub fn phase(&self) -> Phase {
        Phase::from_count(self.items.len())
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// New geometry only affects placements made from now on.
    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Stores the measured media height of an item. Only the first report
    /// for an item is kept.
    pub fn attach_height(&mut self, id: &str, height: f32) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        if item.height.is_some() {
            return false;
        }
        item.height = Some(height);
        self.publish();
        true
    }

    /// Timer delay in milliseconds, uniform in `[min_ms, max_ms]`.
    pub fn draw_interval(&mut self, min_ms: u64, max_ms: u64) -> u64 {
        if max_ms <= min_ms {
            return min_ms;
        }
        self.rng.gen_range(min_ms..=max_ms)
    }

    /// Uniform choice among entries not shown by `active`, or among the whole
    /// catalog when every entry is already shown.
    fn pick_entry(&mut self, active: &[ActiveItem]) -> Option<Arc<CatalogEntry>> {
        let active_ids: HashSet<&str> = active.iter().map(|item| item.entry.id.as_str()).collect();
        let available: Vec<&Arc<CatalogEntry>> = self
            .catalog
            .entries()
            .iter()
            .filter(|entry| !active_ids.contains(entry.id.as_str()))
            .collect();

        if available.is_empty() {
            let entries = self.catalog.entries();
            if entries.is_empty() {
                return None;
            }
            return Some(entries[self.rng.gen_range(0..entries.len())].clone());
        }
        Some(available[self.rng.gen_range(0..available.len())].clone())
    }

    /// Plan that adds one more item next to the current ones.
    pub fn plan_add(&mut self) -> Plan {
        let remaining = self.items.clone();
        Plan {
            action: Action::Add,
            entry: self.pick_entry(&remaining),
            remaining,
        }
    }

    /// Decides the next transition from the current phase.
    pub fn plan(&mut self) -> Plan {
        match self.phase() {
            Phase::Empty => self.plan_add(),
            Phase::OneActive => {
                if self.rng.gen_bool(0.5) {
                    self.plan_add()
                } else {
                    Plan {
                        action: Action::Replace,
                        entry: self.pick_entry(&[]),
                        remaining: Vec::new(),
                    }
                }
            }
            Phase::TwoActive => {
                let retired = self.rng.gen_range(0..self.items.len());
                let remaining: Vec<ActiveItem> = self
                    .items
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != retired)
                    .map(|(_, item)| item.clone())
                    .collect();

                if self.rng.gen_bool(0.5) {
                    Plan {
                        action: Action::RemoveAndAdd,
                        entry: self.pick_entry(&remaining),
                        remaining,
                    }
                } else {
                    Plan {
                        action: Action::Remove,
                        entry: None,
                        remaining,
                    }
                }
            }
        }
    }

    /// Runs a plan: waits for the entry's media, places the new item and
    /// swaps the active set in one step.
    pub async fn execute(&mut self, plan: Plan, duration_ms: u64) -> Transition {
        let removed: Vec<String> = self
            .items
            .iter()
            .filter(|item| !plan.remaining.iter().any(|kept| kept.id == item.id))
            .map(|item| item.id.clone())
            .collect();

        let Some(entry) = plan.entry else {
            self.items = plan.remaining;
            self.publish();
            return Transition {
                action: plan.action,
                added: None,
                removed,
                placement: None,
                preload: PreloadReport::default(),
            };
        };

        let preload = self.preloader.preload_entry(&entry).await;
        debug!(
            "Media for {} ready ({} requested, {} failed, {} cached)",
            entry.id,
            preload.requested(),
            preload.failed,
            preload.skipped
        );

        let (item, placement) = self.spawn_item(entry, duration_ms, &plan.remaining);

        let mut items = plan.remaining;
        items.push(item.clone());
        self.items = items;
        self.publish();

        Transition {
            action: plan.action,
            added: Some(item),
            removed,
            placement: Some(placement),
            preload,
        }
    }

    /// One timer firing.
    pub async fn cycle(&mut self, duration_ms: u64) -> Transition {
        let plan = self.plan();
        let transition = self.execute(plan, duration_ms).await;

        match &transition.added {
            Some(item) => info!(
                "{:?}: showing {} at ({:.0}, {:.0}) for {} ms drifting {:.0}px, {} on screen",
                transition.action,
                item.entry.name,
                item.x,
                item.y,
                item.duration_ms,
                item.total_drift(),
                self.items.len()
            ),
            None => info!(
                "{:?}: retired {} item(s), {} on screen",
                transition.action,
                transition.removed.len(),
                self.items.len()
            ),
        }

        transition
    }

    fn spawn_item(
        &mut self,
        entry: Arc<CatalogEntry>,
        duration_ms: u64,
        others: &[ActiveItem],
    ) -> (ActiveItem, Placement) {
        let width = self.rng.gen_range(MIN_ITEM_WIDTH..=MAX_ITEM_WIDTH);
        let placement = find_position(
            &mut self.rng,
            self.viewport,
            &self.layout,
            width as f32,
            ActiveItem::estimated_height(width),
            others,
        );
        let drift = random_drift(&mut self.rng, duration_ms);
        let created_at = chrono::Utc::now().timestamp_millis();
        let tiebreaker: u64 = self.rng.gen();

        let item = ActiveItem {
            id: format!("{}-{}-{:016x}", entry.id, created_at, tiebreaker),
            entry,
            x: placement.x,
            y: placement.y,
            width,
            height: None,
            drift,
            duration_ms,
            created_at,
        };
        (item, placement)
    }

    fn publish(&self) {
        self.items_tx.send_replace(self.items.clone());
    }
}

/// Random direction, total travel in `[MIN_DRIFT_DISTANCE, MAX_DRIFT_DISTANCE]`
/// spread over `duration_ms`.
pub fn random_drift<R: Rng + ?Sized>(rng: &mut R, duration_ms: u64) -> DriftVector {
    let distance = rng.gen_range(MIN_DRIFT_DISTANCE..=MAX_DRIFT_DISTANCE);
    let angle = rng.gen_range(0.0..TAU);
    let seconds = (duration_ms.max(1) as f32) / 1000.0;
    let speed = distance / seconds;
    DriftVector {
        dx: angle.cos() * speed,
        dy: angle.sin() * speed,
    }
}
