//! Board
//!
//! Wires one store, overlay and drag engine over a shared gateway and notifier.

use std::rc::Rc;

use crate::config::BoardConfig;
use crate::drag::{DragEngine, ReorderTicket};
use crate::gateway::{HttpTaskGateway, TaskGateway};
use crate::live::{LiveChannel, Spawner, Subscription};
use crate::models::TaskId;
use crate::notify::Notifier;
use crate::overlay::{BoardView, SearchOverlay};
use crate::session::SessionProvider;
use crate::store::{Placement, TaskStore};

pub struct Board {
    config: BoardConfig,
    notifier: Rc<Notifier>,
    store: Rc<TaskStore>,
    overlay: SearchOverlay,
    drag: DragEngine,
}

impl Board {
    pub fn new(config: BoardConfig, gateway: Rc<dyn TaskGateway>) -> Self {
        let notifier = Rc::new(Notifier::new());
        let store = Rc::new(TaskStore::new(gateway.clone(), notifier.clone(), config.fetch_sort));
        let overlay = SearchOverlay::new(gateway.clone(), notifier.clone(), config.search_debounce());
        let drag = DragEngine::new(store.clone(), gateway);
        Self {
            config,
            notifier,
            store,
            overlay,
            drag,
        }
    }

    /// Board talking to the real API with `session`'s token
    pub fn connect(config: BoardConfig, session: Rc<dyn SessionProvider>) -> Self {
        let gateway = Rc::new(HttpTaskGateway::new(&config, session));
        Self::new(config, gateway)
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn store(&self) -> &Rc<TaskStore> {
        &self.store
    }

    pub fn overlay(&self) -> &SearchOverlay {
        &self.overlay
    }

    pub fn drag(&self) -> &DragEngine {
        &self.drag
    }

    /// Hover reorder, skipped while a due-date sort decides the displayed order
    pub fn hover_card(&self, target_id: TaskId, placement: Placement) -> Option<ReorderTicket> {
        if let Some(sort) = self.overlay.sort() {
            tracing::debug!(target_id, sort = sort.as_str(), "reorder skipped while sorted");
            return None;
        }
        self.drag.hover_card(target_id, placement)
    }

    /// Current per-column view
    pub fn view(&self) -> BoardView {
        self.store.with_tasks(|tasks| self.overlay.derive(tasks))
    }

    /// Called after every store or overlay change
    pub fn on_change(&self, listener: impl Fn() + 'static) {
        self.notifier.subscribe(listener);
    }

    pub fn bind_live_updates(&self, channel: &dyn LiveChannel, spawner: Spawner) -> Vec<Subscription> {
        self.store
            .bind_live_updates(channel, &self.config.live_channel, spawner)
    }
}
