//! Auth Session
//!
//! The session is an explicit object handed to the gateway at construction.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

/// Token plus the user it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Source of the bearer token attached to every gateway request
pub trait SessionProvider {
    fn token(&self) -> Option<String>;

    fn user(&self) -> Option<User>;

    fn login(&self, token: String, user: User);

    fn logout(&self);

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Session kept in memory only
#[derive(Debug, Default)]
pub struct MemorySession {
    current: RefCell<Option<AuthSession>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(token: &str, user: User) -> Self {
        Self {
            current: RefCell::new(Some(AuthSession {
                token: token.to_string(),
                user,
            })),
        }
    }
}

impl SessionProvider for MemorySession {
    fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.token.clone())
    }

    fn user(&self) -> Option<User> {
        self.current.borrow().as_ref().map(|s| s.user.clone())
    }

    fn login(&self, token: String, user: User) {
        tracing::info!(email = %user.email, "session started");
        *self.current.borrow_mut() = Some(AuthSession { token, user });
    }

    fn logout(&self) {
        tracing::info!("session cleared");
        self.current.borrow_mut().take();
    }
}
