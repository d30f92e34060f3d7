//! Remote Task Gateway
//!
//! Abstract interface over the task API.
//! `HttpTaskGateway` talks to the real server; tests use a scripted in-memory gateway.

mod http;

use async_trait::async_trait;

use crate::error::BoardResult;
use crate::models::{MoveRequest, NewTask, SearchQuery, SortDirection, Task, TaskId, TaskPatch};

pub use http::HttpTaskGateway;

/// Authenticated task API calls
///
/// Futures are `!Send`: the engine runs on the browser event loop.
#[async_trait(?Send)]
pub trait TaskGateway {
    /// `GET /tasks?sort=`
    async fn list(&self, sort: SortDirection) -> BoardResult<Vec<Task>>;

    /// `GET /tasks/search`
    async fn search(&self, query: &SearchQuery) -> BoardResult<Vec<Task>>;

    /// `GET /tasks/global-search?q=`
    async fn global_search(&self, q: &str) -> BoardResult<Vec<Task>>;

    async fn create(&self, task: &NewTask) -> BoardResult<Task>;

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> BoardResult<Task>;

    /// `PUT /tasks/{id}/move`
    async fn move_task(&self, id: TaskId, request: &MoveRequest) -> BoardResult<()>;

    async fn delete(&self, id: TaskId) -> BoardResult<()>;
}
