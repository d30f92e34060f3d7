//! HTTP Gateway
//!
//! reqwest client for the task API. In the browser reqwest goes through `fetch`.

use std::rc::Rc;

use async_trait::async_trait;
use reqwest::header;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::TaskGateway;
use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult, FieldErrors};
use crate::models::{MoveRequest, NewTask, SearchQuery, SortDirection, Task, TaskId, TaskPatch};
use crate::session::SessionProvider;

/// Gateway backed by the real task API
pub struct HttpTaskGateway {
    client: Client,
    base_url: String,
    session: Rc<dyn SessionProvider>,
}

impl HttpTaskGateway {
    pub fn new(config: &BoardConfig, session: Rc<dyn SessionProvider>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> BoardResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = classify_failure(status, &body);
        tracing::debug!(%status, error = %err, "task API request failed");
        Err(err)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(&self, builder: RequestBuilder) -> BoardResult<T> {
        let response = self.send(builder).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait(?Send)]
impl TaskGateway for HttpTaskGateway {
    async fn list(&self, sort: SortDirection) -> BoardResult<Vec<Task>> {
        let builder = self
            .request(Method::GET, "/tasks")
            .query(&[("sort", sort.as_str())]);
        self.send_json(builder).await
    }

    async fn search(&self, query: &SearchQuery) -> BoardResult<Vec<Task>> {
        let builder = self
            .request(Method::GET, "/tasks/search")
            .query(&search_params(query));
        self.send_json(builder).await
    }

    async fn global_search(&self, q: &str) -> BoardResult<Vec<Task>> {
        let builder = self
            .request(Method::GET, "/tasks/global-search")
            .query(&[("q", q)]);
        self.send_json(builder).await
    }

    async fn create(&self, task: &NewTask) -> BoardResult<Task> {
        let builder = self.request(Method::POST, "/tasks").json(task);
        self.send_json(builder).await
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> BoardResult<Task> {
        let builder = self
            .request(Method::PUT, &format!("/tasks/{}", id))
            .json(patch);
        self.send_json(builder).await
    }

    async fn move_task(&self, id: TaskId, request: &MoveRequest) -> BoardResult<()> {
        let builder = self
            .request(Method::PUT, &format!("/tasks/{}/move", id))
            .json(request);
        self.send(builder).await.map(|_| ())
    }

    async fn delete(&self, id: TaskId) -> BoardResult<()> {
        let builder = self.request(Method::DELETE, &format!("/tasks/{}", id));
        self.send(builder).await.map(|_| ())
    }
}

fn search_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.q.clone())];
    if let Some(status) = query.status {
        params.push(("status", status.as_str().to_string()));
    }
    if let Some(sort) = query.sort {
        params.push(("sort", sort.as_str().to_string()));
    }
    params
}

/// Laravel-style 422 body
#[derive(Deserialize)]
struct ValidationBody {
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Map a non-2xx response onto the error taxonomy
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> BoardError {
    match status {
        StatusCode::UNAUTHORIZED => BoardError::Unauthorized,
        StatusCode::UNPROCESSABLE_ENTITY => match parse_validation_body(body) {
            Some(errors) => BoardError::Validation(errors),
            None => BoardError::Network(format!("HTTP {}: {}", status, body)),
        },
        _ => BoardError::Network(format!("HTTP {}: {}", status, body)),
    }
}

fn parse_validation_body(body: &str) -> Option<FieldErrors> {
    let parsed: ValidationBody = serde_json::from_str(body).ok()?;
    let mut errors = FieldErrors::new();
    for (field, messages) in parsed.errors {
        if let Some(first) = messages.into_iter().next() {
            errors.insert(field, first);
        }
    }
    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}
