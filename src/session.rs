//! Browser Session
//!
//! Auth session persisted in localStorage so a reload stays signed in.

use std::cell::RefCell;

use task_board_core::{AuthSession, SessionProvider, User};

const STORAGE_KEY: &str = "auth-storage";

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

pub struct BrowserSession {
    current: RefCell<Option<AuthSession>>,
}

impl BrowserSession {
    /// Restore whatever a previous visit stored
    pub fn load() -> Self {
        let current = storage()
            .and_then(|s| s.get_item(STORAGE_KEY).ok().flatten())
            .and_then(|raw| match serde_json::from_str::<AuthSession>(&raw) {
                Ok(session) => Some(session),
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring unreadable stored session");
                    None
                }
            });
        Self {
            current: RefCell::new(current),
        }
    }

    fn persist(&self) {
        let Some(storage) = storage() else {
            tracing::warn!("localStorage unavailable, session kept in memory");
            return;
        };
        let result = match &*self.current.borrow() {
            Some(session) => match serde_json::to_string(session) {
                Ok(raw) => storage.set_item(STORAGE_KEY, &raw),
                Err(err) => {
                    tracing::warn!(error = %err, "could not serialize session");
                    return;
                }
            },
            None => storage.remove_item(STORAGE_KEY),
        };
        if result.is_err() {
            tracing::warn!("writing session to localStorage failed");
        }
    }
}

impl SessionProvider for BrowserSession {
    fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.token.clone())
    }

    fn user(&self) -> Option<User> {
        self.current.borrow().as_ref().map(|s| s.user.clone())
    }

    fn login(&self, token: String, user: User) {
        tracing::info!(email = %user.email, "signed in");
        *self.current.borrow_mut() = Some(AuthSession { token, user });
        self.persist();
    }

    fn logout(&self) {
        tracing::info!("signed out");
        self.current.borrow_mut().take();
        self.persist();
    }
}
