//! UI State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity. Task data lives in
//! the board engine; this holds only what the components toggle.

use leptos::prelude::*;
use reactive_stores::Store;
use task_board_core::{Task, User};

#[derive(Clone, Debug, Default, Store)]
pub struct UiState {
    /// Signed-in user; `None` shows the sign-in gate
    pub user: Option<User>,
    /// Bumped on every board change so views re-derive
    pub version: u64,
    /// Error or notice shown above the board
    pub banner: Option<String>,
    pub form_open: bool,
    /// Task being edited; `None` while creating
    pub editing: Option<Task>,
    pub intro_open: bool,
}

impl UiState {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user,
            intro_open: true,
            ..Default::default()
        }
    }
}

pub type UiStore = Store<UiState>;

pub fn use_ui_store() -> UiStore {
    expect_context::<UiStore>()
}

// ========================
// Store Helper Functions
// ========================

pub fn store_bump_version(store: &UiStore) {
    store.version().update(|v| *v += 1);
}

pub fn store_open_form(store: &UiStore, editing: Option<Task>) {
    store.editing().set(editing);
    store.form_open().set(true);
}

pub fn store_close_form(store: &UiStore) {
    store.form_open().set(false);
    store.editing().set(None);
}

pub fn store_show_banner(store: &UiStore, message: impl Into<String>) {
    store.banner().set(Some(message.into()));
}
