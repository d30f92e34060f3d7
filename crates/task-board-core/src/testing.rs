//! Scripted in-memory gateway for engine tests.
//!
//! Simulates server state, records every call, can fail selected operations
//! and can hold responses until the test releases them.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::error::{BoardError, BoardResult};
use crate::gateway::TaskGateway;
use crate::models::{MoveRequest, NewTask, SearchQuery, SortDirection, Task, TaskId, TaskPatch, TaskStatus};
use crate::store::place_in_column;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(SortDirection),
    Search(SearchQuery),
    GlobalSearch(String),
    Create(NewTask),
    Update(TaskId, TaskPatch),
    Move(TaskId, MoveRequest),
    Delete(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Search,
    Create,
    Update,
    Move,
    Delete,
}

/// How a held call resolves
#[derive(Debug, Clone)]
pub enum Release {
    /// Answer from simulated server state at release time
    Server,
    /// Answer a list/search call with these tasks
    Tasks(Vec<Task>),
    Fail(BoardError),
}

struct Held {
    op: Op,
    nth: usize,
    tx: oneshot::Sender<Release>,
}

#[derive(Default)]
pub struct ScriptedGateway {
    server: RefCell<Vec<Task>>,
    next_id: Cell<TaskId>,
    calls: RefCell<Vec<Call>>,
    failures: RefCell<HashMap<Op, VecDeque<BoardError>>>,
    held_ops: RefCell<HashSet<Op>>,
    held: RefCell<Vec<Held>>,
    counters: RefCell<HashMap<Op, usize>>,
}

pub fn task(id: TaskId, status: TaskStatus, due_date: &str) -> Task {
    Task {
        id,
        name: format!("Task {}", id),
        description: format!("Description of task {}", id),
        status,
        due_date: due_date.to_string(),
        owner: None,
    }
}

pub fn ids(tasks: &[Task]) -> Vec<TaskId> {
    tasks.iter().map(|t| t.id).collect()
}

impl ScriptedGateway {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let gateway = Self::default();
        *gateway.server.borrow_mut() = tasks;
        gateway.next_id.set(next);
        gateway
    }

    pub fn server_tasks(&self) -> Vec<Task> {
        self.server.borrow().clone()
    }

    pub fn set_server_tasks(&self, tasks: Vec<Task>) {
        *self.server.borrow_mut() = tasks;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Next call of `op` fails with `err`
    pub fn fail_next(&self, op: Op, err: BoardError) {
        self.failures.borrow_mut().entry(op).or_default().push_back(err);
    }

    /// Calls of `op` wait until released
    pub fn hold(&self, op: Op) {
        self.held_ops.borrow_mut().insert(op);
    }

    pub fn held_count(&self, op: Op) -> usize {
        self.held.borrow().iter().filter(|h| h.op == op).count()
    }

    /// Resolve the `nth` call (zero-based, counted since construction) of `op`
    pub fn release(&self, op: Op, nth: usize, release: Release) {
        let mut held = self.held.borrow_mut();
        let pos = held
            .iter()
            .position(|h| h.op == op && h.nth == nth)
            .unwrap_or_else(|| panic!("no held {:?} call #{}", op, nth));
        let entry = held.remove(pos);
        let _ = entry.tx.send(release);
    }

    async fn enter(&self, op: Op, call: Call) -> Release {
        self.calls.borrow_mut().push(call);
        let nth = {
            let mut counters = self.counters.borrow_mut();
            let counter = counters.entry(op).or_insert(0);
            let nth = *counter;
            *counter += 1;
            nth
        };

        let release = if self.held_ops.borrow().contains(&op) {
            let (tx, rx) = oneshot::channel();
            self.held.borrow_mut().push(Held { op, nth, tx });
            rx.await.unwrap_or(Release::Server)
        } else {
            Release::Server
        };

        match release {
            Release::Server => match self.failures.borrow_mut().get_mut(&op).and_then(|q| q.pop_front()) {
                Some(err) => Release::Fail(err),
                None => Release::Server,
            },
            other => other,
        }
    }

    fn matching(&self, q: &str, status: Option<TaskStatus>) -> Vec<Task> {
        let needle = q.to_lowercase();
        self.server
            .borrow()
            .iter()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .filter(|t| {
                t.name.to_lowercase().contains(&needle) || t.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}

#[async_trait(?Send)]
impl TaskGateway for ScriptedGateway {
    async fn list(&self, sort: SortDirection) -> BoardResult<Vec<Task>> {
        match self.enter(Op::List, Call::List(sort)).await {
            Release::Server => Ok(self.server_tasks()),
            Release::Tasks(tasks) => Ok(tasks),
            Release::Fail(err) => Err(err),
        }
    }

    async fn search(&self, query: &SearchQuery) -> BoardResult<Vec<Task>> {
        match self.enter(Op::Search, Call::Search(query.clone())).await {
            Release::Server => Ok(self.matching(&query.q, query.status)),
            Release::Tasks(tasks) => Ok(tasks),
            Release::Fail(err) => Err(err),
        }
    }

    async fn global_search(&self, q: &str) -> BoardResult<Vec<Task>> {
        match self.enter(Op::Search, Call::GlobalSearch(q.to_string())).await {
            Release::Server => Ok(self.matching(q, None)),
            Release::Tasks(tasks) => Ok(tasks),
            Release::Fail(err) => Err(err),
        }
    }

    async fn create(&self, new: &NewTask) -> BoardResult<Task> {
        match self.enter(Op::Create, Call::Create(new.clone())).await {
            Release::Fail(err) => Err(err),
            _ => {
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                let created = Task {
                    id,
                    name: new.name.clone(),
                    description: new.description.clone(),
                    status: new.status,
                    due_date: new.due_date.clone(),
                    owner: None,
                };
                self.server.borrow_mut().push(created.clone());
                Ok(created)
            }
        }
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> BoardResult<Task> {
        match self.enter(Op::Update, Call::Update(id, patch.clone())).await {
            Release::Fail(err) => Err(err),
            _ => {
                let mut server = self.server.borrow_mut();
                let task = server
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| BoardError::Network("HTTP 404 Not Found".to_string()))?;
                patch.apply_to(task);
                Ok(task.clone())
            }
        }
    }

    async fn move_task(&self, id: TaskId, request: &MoveRequest) -> BoardResult<()> {
        match self.enter(Op::Move, Call::Move(id, *request)).await {
            Release::Fail(err) => Err(err),
            _ => {
                place_in_column(&mut self.server.borrow_mut(), id, request.status, request.target_position)
                    .map(|_| ())
                    .ok_or_else(|| BoardError::Network("HTTP 404 Not Found".to_string()))
            }
        }
    }

    async fn delete(&self, id: TaskId) -> BoardResult<()> {
        match self.enter(Op::Delete, Call::Delete(id)).await {
            Release::Fail(err) => Err(err),
            _ => {
                self.server.borrow_mut().retain(|t| t.id != id);
                Ok(())
            }
        }
    }
}
