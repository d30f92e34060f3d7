//! Live Update Channel
//!
//! Subscribe/publish notifications. A message only means "something changed";
//! subscribers always refetch instead of trusting pushed data.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;

/// Callback invoked on every pushed event
pub type LiveCallback = Rc<dyn Fn()>;

/// Runs a detached future on the current event loop
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

/// Event names published on the task channel
pub const TASK_EVENTS: [&str; 3] = ["task.created", "task.updated", "task.deleted"];

/// Channel provider
pub trait LiveChannel {
    fn subscribe(&self, channel: &str, event: &str, callback: LiveCallback) -> Subscription;
}

/// Handle returned by `subscribe`; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

struct Listener {
    id: u64,
    channel: String,
    event: String,
    callback: LiveCallback,
}

#[derive(Default)]
struct Registry {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Listener>>,
}

/// In-process channel; a push transport adapter publishes into it
#[derive(Clone, Default)]
pub struct LocalChannel {
    registry: Rc<Registry>,
}

impl LocalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every matching subscriber, returns how many were called
    pub fn publish(&self, channel: &str, event: &str) -> usize {
        // Callbacks may subscribe or unsubscribe, so call them outside the borrow
        let callbacks: Vec<LiveCallback> = self
            .registry
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.channel == channel && l.event == event)
            .map(|l| l.callback.clone())
            .collect();
        tracing::debug!(channel, event, subscribers = callbacks.len(), "live event");
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.listeners.borrow().len()
    }
}

impl LiveChannel for LocalChannel {
    fn subscribe(&self, channel: &str, event: &str, callback: LiveCallback) -> Subscription {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        self.registry.listeners.borrow_mut().push(Listener {
            id,
            channel: channel.to_string(),
            event: event.to_string(),
            callback,
        });

        let registry: Weak<Registry> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.listeners.borrow_mut().retain(|l| l.id != id);
            }
        })
    }
}
