//! Board Errors
//!
//! Every gateway failure is converted to one of these kinds at the call site.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Per-field validation messages, keyed by wire field name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message; the first message for a field is kept
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Errors surfaced by the board engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// HTTP 401 from any gateway call
    #[error("unauthorized")]
    Unauthorized,

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Transport failure or a non-2xx, non-401 response
    #[error("network error: {0}")]
    Network(String),

    /// A newer request superseded this one
    #[error("stale response discarded")]
    StaleResponse,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BoardError {
    /// Errors that should never reach the user
    pub fn is_silent(&self) -> bool {
        matches!(self, BoardError::StaleResponse)
    }
}

impl From<reqwest::Error> for BoardError {
    fn from(err: reqwest::Error) -> Self {
        BoardError::Network(err.to_string())
    }
}

/// Common result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;
