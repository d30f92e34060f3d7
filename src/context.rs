//! Application Context
//!
//! Board engine, session and UI store provided via Leptos Context API.

use std::rc::Rc;

use leptos::prelude::*;
use task_board_core::{Board, BoardError, SessionProvider, User};

use crate::session::BrowserSession;
use crate::store::{store_show_banner, UiStateStoreFields, UiStore};

/// App-wide handles provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    board: StoredValue<Rc<Board>, LocalStorage>,
    session: StoredValue<Rc<BrowserSession>, LocalStorage>,
    pub ui: UiStore,
}

impl AppContext {
    pub fn new(board: Rc<Board>, session: Rc<BrowserSession>, ui: UiStore) -> Self {
        Self {
            board: StoredValue::new_local(board),
            session: StoredValue::new_local(session),
            ui,
        }
    }

    pub fn board(&self) -> Rc<Board> {
        self.board.get_value()
    }

    pub fn sign_in(&self, token: String, user: User) {
        self.session.get_value().login(token, user.clone());
        self.ui.banner().set(None);
        self.ui.user().set(Some(user));
    }

    pub fn sign_out(&self) {
        self.session.get_value().logout();
        self.ui.user().set(None);
    }

    /// Surface a failed board operation
    ///
    /// A 401 ends the session and returns to the sign-in gate.
    pub fn report(&self, err: BoardError) {
        match err {
            err if err.is_silent() => {}
            BoardError::Unauthorized => {
                tracing::warn!("request unauthorized, signing out");
                self.sign_out();
                store_show_banner(&self.ui, "Your session has expired. Please sign in again.");
            }
            err => store_show_banner(&self.ui, err.to_string()),
        }
    }
}

pub fn use_app_context() -> AppContext {
    expect_context::<AppContext>()
}
