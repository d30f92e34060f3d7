//! Change Notifier
//!
//! Fired whenever store or overlay state changes so the UI can re-derive its view.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub struct Notifier {
    listeners: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn notify(&self) {
        let listeners: Vec<Rc<dyn Fn()>> = self.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }
}
