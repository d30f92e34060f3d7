//! Task Board Core
//!
//! Client-side engine for a three-column task board: the authoritative task
//! list, the search/sort overlay, drag reordering and the REST gateway.

pub mod board;
pub mod config;
pub mod drag;
pub mod error;
pub mod gateway;
pub mod live;
pub mod models;
pub mod notify;
pub mod overlay;
pub mod session;
pub mod store;
pub mod validation;

#[cfg(test)]
mod testing;

pub use board::Board;
pub use config::BoardConfig;
pub use drag::{DragEngine, DragPhase, DropOutcome, ReorderTicket, StatusChangeTicket};
pub use error::{BoardError, BoardResult, FieldErrors};
pub use validation::{validate_field, validate_new_task, validate_patch};
pub use gateway::{HttpTaskGateway, TaskGateway};
pub use live::{LiveChannel, LocalChannel, Spawner, Subscription, TASK_EVENTS};
pub use models::{parse_due_date, MoveRequest, NewTask, SearchQuery, SortDirection, Task, TaskId, TaskPatch, TaskStatus};
pub use overlay::{BoardView, QueryChange, SearchOverlay, SearchTicket};
pub use session::{AuthSession, MemorySession, SessionProvider, User};
pub use store::{Placement, TaskStore};
