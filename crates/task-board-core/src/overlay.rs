//! Search/Sort Overlay
//!
//! Query and sort state layered over the task store. The per-column view is
//! always rebuilt from the authoritative list by `derive_view`.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{BoardError, BoardResult};
use crate::gateway::TaskGateway;
use crate::models::{SearchQuery, SortDirection, Task, TaskId, TaskStatus};
use crate::notify::Notifier;

/// Which tasks the view admits
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    /// Search pending: lowercase substring of name or description
    Provisional(String),
    /// Ids returned by the last applied search
    Matches(BTreeSet<TaskId>),
}

impl ViewFilter {
    pub fn admits(&self, task: &Task) -> bool {
        match self {
            ViewFilter::All => true,
            ViewFilter::Provisional(needle) => {
                task.name.to_lowercase().contains(needle.as_str())
                    || task.description.to_lowercase().contains(needle.as_str())
            }
            ViewFilter::Matches(ids) => ids.contains(&task.id),
        }
    }
}

/// Per-column projection ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardView {
    columns: [Vec<Task>; 3],
}

impl BoardView {
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        &self.columns[status.index()]
    }

    pub fn ids(&self, status: TaskStatus) -> Vec<TaskId> {
        self.column(status).iter().map(|t| t.id).collect()
    }
}

/// Build the view from the list, a filter and an optional due-date sort
///
/// Without a sort, columns keep list order. Sorting is stable; tasks with
/// unparseable dates go last in either direction.
pub fn derive_view(tasks: &[Task], filter: &ViewFilter, sort: Option<SortDirection>) -> BoardView {
    let mut columns: [Vec<Task>; 3] = Default::default();
    for task in tasks.iter().filter(|t| filter.admits(t)) {
        columns[task.status.index()].push(task.clone());
    }
    if let Some(direction) = sort {
        for column in columns.iter_mut() {
            column.sort_by(|a, b| compare_due(a, b, direction));
        }
    }
    BoardView { columns }
}

fn compare_due(a: &Task, b: &Task, direction: SortDirection) -> Ordering {
    match (a.due(), b.due()) {
        (Some(x), Some(y)) => match direction {
            SortDirection::Asc => x.cmp(&y),
            SortDirection::Desc => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A debounced search waiting to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    pub query: String,
    pub sort: Option<SortDirection>,
    /// How long to wait before calling `run_search`
    pub delay: Duration,
}

/// Result of `set_query`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryChange {
    /// Query emptied; unfiltered view restored
    Cleared,
    Pending(SearchTicket),
}

#[derive(Default)]
struct OverlayState {
    query: String,
    filter: ViewFilter,
    sort: Option<SortDirection>,
}

pub struct SearchOverlay {
    gateway: Rc<dyn TaskGateway>,
    notifier: Rc<Notifier>,
    debounce: Duration,
    state: RefCell<OverlayState>,
    generation: Cell<u64>,
}

impl SearchOverlay {
    pub fn new(gateway: Rc<dyn TaskGateway>, notifier: Rc<Notifier>, debounce: Duration) -> Self {
        Self {
            gateway,
            notifier,
            debounce,
            state: RefCell::new(OverlayState::default()),
            generation: Cell::new(0),
        }
    }

    pub fn query(&self) -> String {
        self.state.borrow().query.clone()
    }

    pub fn sort(&self) -> Option<SortDirection> {
        self.state.borrow().sort
    }

    pub fn filter(&self) -> ViewFilter {
        self.state.borrow().filter.clone()
    }

    /// View of `tasks` under the current query and sort
    pub fn derive(&self, tasks: &[Task]) -> BoardView {
        let state = self.state.borrow();
        derive_view(tasks, &state.filter, state.sort)
    }

    fn bump(&self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        generation
    }

    /// Every keystroke supersedes the previous one
    pub fn set_query(&self, text: &str) -> QueryChange {
        let trimmed = text.trim();
        let generation = self.bump();

        let change = {
            let mut state = self.state.borrow_mut();
            if trimmed.is_empty() {
                state.query.clear();
                state.filter = ViewFilter::All;
                QueryChange::Cleared
            } else {
                state.query = trimmed.to_string();
                state.filter = ViewFilter::Provisional(trimmed.to_lowercase());
                QueryChange::Pending(SearchTicket {
                    generation,
                    query: trimmed.to_string(),
                    sort: state.sort,
                    delay: self.debounce,
                })
            }
        };
        tracing::debug!(generation, query = trimmed, "search query changed");
        self.notifier.notify();
        change
    }

    /// Re-sort locally; with an active query the search is reissued with the new sort
    pub fn set_sort_direction(&self, sort: Option<SortDirection>) -> Option<SearchTicket> {
        let ticket = {
            let mut state = self.state.borrow_mut();
            if state.sort == sort {
                return None;
            }
            state.sort = sort;
            if state.query.is_empty() {
                None
            } else {
                Some(SearchTicket {
                    generation: self.bump(),
                    query: state.query.clone(),
                    sort,
                    delay: Duration::ZERO,
                })
            }
        };
        self.notifier.notify();
        ticket
    }

    /// Run a ticket once its delay elapsed
    ///
    /// A superseded ticket issues no request. A response that arrives after a
    /// newer query (or a clear) is dropped.
    pub async fn run_search(&self, ticket: SearchTicket) -> BoardResult<usize> {
        if ticket.generation != self.generation.get() {
            return Err(BoardError::StaleResponse);
        }
        tracing::debug!(generation = ticket.generation, query = %ticket.query, "searching tasks");

        let result = match ticket.sort {
            None => self.gateway.global_search(&ticket.query).await,
            Some(sort) => {
                let query = SearchQuery {
                    q: ticket.query.clone(),
                    status: None,
                    sort: Some(sort),
                };
                self.gateway.search(&query).await
            }
        };

        if ticket.generation != self.generation.get() {
            tracing::debug!(generation = ticket.generation, "discarding stale search response");
            return Err(BoardError::StaleResponse);
        }

        match result {
            Ok(tasks) => {
                let ids: BTreeSet<TaskId> = tasks.iter().map(|t| t.id).collect();
                let count = ids.len();
                self.state.borrow_mut().filter = ViewFilter::Matches(ids);
                self.notifier.notify();
                Ok(count)
            }
            Err(err) => {
                // Provisional local filter stays in place
                tracing::warn!(error = %err, "search failed");
                Err(err)
            }
        }
    }
}
