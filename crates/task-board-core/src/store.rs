//! Task Store
//!
//! Owns the authoritative task list. Every write to the list goes through
//! a method here; the last server-confirmed state of each task is kept so a
//! failed request can undo its own patch and nothing else.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::future::Future;
use std::rc::Rc;

use crate::error::{BoardError, BoardResult};
use crate::gateway::TaskGateway;
use crate::live::{LiveChannel, Spawner, Subscription, TASK_EVENTS};
use crate::models::{NewTask, SortDirection, Task, TaskId, TaskPatch, TaskStatus};
use crate::notify::Notifier;

/// Where a dragged card lands relative to the hovered one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

#[derive(Default)]
struct StoreState {
    /// Current list, including optimistic patches
    tasks: Vec<Task>,
    /// Last list the server confirmed
    confirmed: Vec<Task>,
}

pub struct TaskStore {
    gateway: Rc<dyn TaskGateway>,
    notifier: Rc<Notifier>,
    fetch_sort: SortDirection,
    state: RefCell<StoreState>,
    fetch_generation: Cell<u64>,
}

impl TaskStore {
    pub fn new(gateway: Rc<dyn TaskGateway>, notifier: Rc<Notifier>, fetch_sort: SortDirection) -> Self {
        Self {
            gateway,
            notifier,
            fetch_sort,
            state: RefCell::new(StoreState::default()),
            fetch_generation: Cell::new(0),
        }
    }

    // ========================
    // Reads
    // ========================

    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().tasks.clone()
    }

    pub fn with_tasks<R>(&self, f: impl FnOnce(&[Task]) -> R) -> R {
        f(&self.state.borrow().tasks)
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.state.borrow().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Tasks of one status in list order
    pub fn column(&self, status: TaskStatus) -> Vec<Task> {
        self.state
            .borrow()
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    /// Status and zero-based index within that status column
    pub fn column_position(&self, id: TaskId) -> Option<(TaskStatus, usize)> {
        column_index(&self.state.borrow().tasks, id)
    }

    // ========================
    // Server round trips
    // ========================

    /// Replace the list with the server's current set
    ///
    /// The generation is taken when this is called, not when the future is
    /// first polled, so request-start order decides which response wins.
    pub fn fetch_all(&self) -> impl Future<Output = BoardResult<Vec<Task>>> + '_ {
        let generation = self.fetch_generation.get() + 1;
        self.fetch_generation.set(generation);
        tracing::debug!(generation, "fetching tasks");

        async move {
            let result = self.gateway.list(self.fetch_sort).await;

            let latest = self.fetch_generation.get();
            if generation != latest {
                tracing::debug!(generation, latest, "discarding stale task list");
                return Err(BoardError::StaleResponse);
            }

            let tasks = match result {
                Ok(tasks) => dedupe(tasks),
                Err(err) => {
                    tracing::warn!(error = %err, "task fetch failed");
                    return Err(err);
                }
            };

            {
                let mut state = self.state.borrow_mut();
                state.tasks = tasks.clone();
                state.confirmed = tasks.clone();
            }
            tracing::debug!(generation, count = tasks.len(), "task list replaced");
            self.notifier.notify();
            Ok(tasks)
        }
    }

    /// `PUT /tasks/{id}` with only the status; leaves local state alone
    pub async fn change_status(&self, id: TaskId, status: TaskStatus) -> BoardResult<Task> {
        tracing::debug!(id, status = status.as_str(), "changing task status");
        self.gateway
            .update(id, &TaskPatch::status(status))
            .await
            .inspect_err(|err| tracing::warn!(id, error = %err, "status change failed"))
    }

    pub async fn create(&self, new: &NewTask) -> BoardResult<Task> {
        let created = self
            .gateway
            .create(new)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "create failed"))?;
        tracing::info!(id = created.id, "task created");
        self.refresh().await;
        Ok(created)
    }

    pub async fn update(&self, id: TaskId, patch: &TaskPatch) -> BoardResult<Task> {
        let updated = self
            .gateway
            .update(id, patch)
            .await
            .inspect_err(|err| tracing::warn!(id, error = %err, "update failed"))?;
        self.refresh().await;
        Ok(updated)
    }

    /// Removes the task right away; a failed request puts it back
    pub async fn delete(&self, id: TaskId) -> BoardResult<()> {
        self.remove_local(id);
        match self.gateway.delete(id).await {
            Ok(()) => {
                tracing::info!(id, "task deleted");
                self.confirm_task(id);
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(id, error = %err, "delete failed, restoring");
                self.rollback_task(id);
                Err(err)
            }
        }
    }

    async fn refresh(&self) {
        match self.fetch_all().await {
            Err(err) if !err.is_silent() => tracing::warn!(error = %err, "refresh after mutation failed"),
            _ => {}
        }
    }

    /// Refetch on every `task.*` event of `channel_name`
    pub fn bind_live_updates(
        self: &Rc<Self>,
        channel: &dyn LiveChannel,
        channel_name: &str,
        spawner: Spawner,
    ) -> Vec<Subscription> {
        TASK_EVENTS
            .iter()
            .map(|event| {
                let store = Rc::downgrade(self);
                let spawner = spawner.clone();
                let event_name = event.to_string();
                let callback = move || {
                    let Some(store) = store.upgrade() else {
                        return;
                    };
                    tracing::debug!(event = %event_name, "live update, refetching");
                    spawner(Box::pin(async move {
                        if let Err(err) = store.fetch_all().await {
                            if !err.is_silent() {
                                tracing::warn!(error = %err, "live refetch failed");
                            }
                        }
                    }));
                };
                channel.subscribe(channel_name, event, Rc::new(callback))
            })
            .collect()
    }

    // ========================
    // Optimistic patches
    // ========================
    //
    // Each patch below makes fetches already in flight come back stale, so a
    // list read before the patch cannot overwrite it.

    /// Move `dragged` next to `target` within the target's column
    ///
    /// Returns the new zero-based index within the full column, or `None`
    /// when nothing moved.
    pub fn move_relative(&self, dragged: TaskId, target: TaskId, placement: Placement) -> Option<usize> {
        if dragged == target {
            return None;
        }
        let changed = {
            let mut state = self.state.borrow_mut();
            let status = state.tasks.iter().find(|t| t.id == target)?.status;
            let current = state
                .tasks
                .iter()
                .filter(|t| t.status == status)
                .position(|t| t.id == dragged);
            let mut position = state
                .tasks
                .iter()
                .filter(|t| t.status == status && t.id != dragged)
                .position(|t| t.id == target)?;
            if placement == Placement::After {
                position += 1;
            }
            if current == Some(position) {
                None
            } else {
                place_in_column(&mut state.tasks, dragged, status, position)
            }
        };
        if changed.is_some() {
            self.patched();
        }
        changed
    }

    /// Put `id` at `position` of the `status` column
    pub fn place(&self, id: TaskId, status: TaskStatus, position: usize) -> Option<usize> {
        let placed = place_in_column(&mut self.state.borrow_mut().tasks, id, status, position);
        if placed.is_some() {
            self.patched();
        }
        placed
    }

    /// Set a task's status locally, keeping its place in the list
    pub fn patch_status(&self, id: TaskId, status: TaskStatus) -> bool {
        let patched = match self.state.borrow_mut().tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        };
        if patched {
            self.patched();
        }
        patched
    }

    fn remove_local(&self, id: TaskId) {
        self.state.borrow_mut().tasks.retain(|t| t.id != id);
        self.patched();
    }

    /// Put one task back to its last confirmed status and column position
    ///
    /// Other tasks keep their pending patches. A task the server never
    /// confirmed is left alone.
    pub fn rollback_task(&self, id: TaskId) -> bool {
        let restored = {
            let mut state = self.state.borrow_mut();
            let StoreState { tasks, confirmed } = &mut *state;
            match confirmed.iter().find(|t| t.id == id).cloned() {
                Some(task) => {
                    let index = column_index(confirmed, id).map_or(0, |(_, index)| index);
                    tasks.retain(|t| t.id != id);
                    insert_in_column(tasks, task, index);
                    true
                }
                None => false,
            }
        };
        if restored {
            tracing::debug!(id, "rolled back to confirmed task");
            self.patched();
        }
        restored
    }

    /// The server accepted the current local state of one task
    pub fn confirm_task(&self, id: TaskId) {
        let mut state = self.state.borrow_mut();
        let StoreState { tasks, confirmed } = &mut *state;
        confirmed.retain(|t| t.id != id);
        let current = tasks.iter().find(|t| t.id == id).cloned();
        if let (Some(task), Some((_, index))) = (current, column_index(tasks, id)) {
            insert_in_column(confirmed, task, index);
        }
    }

    fn patched(&self) {
        self.fetch_generation.set(self.fetch_generation.get() + 1);
        self.notifier.notify();
    }
}

/// Status and zero-based index of `id` within its status column
fn column_index(tasks: &[Task], id: TaskId) -> Option<(TaskStatus, usize)> {
    let status = tasks.iter().find(|t| t.id == id)?.status;
    let index = tasks.iter().filter(|t| t.status == status).position(|t| t.id == id)?;
    Some((status, index))
}

/// Move `id` to `position` among the tasks of `status`, switching its status if needed
///
/// Positions past the end append to the column. Returns the index actually used.
pub(crate) fn place_in_column(tasks: &mut Vec<Task>, id: TaskId, status: TaskStatus, position: usize) -> Option<usize> {
    let from = tasks.iter().position(|t| t.id == id)?;
    let mut task = tasks.remove(from);
    task.status = status;
    Some(insert_in_column(tasks, task, position))
}

/// Insert `task` at `position` of its status column; an empty column goes last
fn insert_in_column(tasks: &mut Vec<Task>, task: Task, position: usize) -> usize {
    let slots: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.status == task.status)
        .map(|(i, _)| i)
        .collect();
    let position = position.min(slots.len());
    let at = match slots.get(position) {
        Some(&slot) => slot,
        None => slots.last().map_or(tasks.len(), |&last| last + 1),
    };
    tasks.insert(at, task);
    position
}

/// One task per id, first occurrence wins
fn dedupe(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let total = tasks.len();
    let unique: Vec<Task> = tasks.into_iter().filter(|t| seen.insert(t.id)).collect();
    if unique.len() != total {
        tracing::warn!(dropped = total - unique.len(), "server returned duplicate task ids");
    }
    for task in unique.iter().filter(|t| t.due().is_none()) {
        tracing::warn!(id = task.id, due_date = %task.due_date, "unparseable due date");
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::LocalChannel;
    use crate::testing::{ids, task, Call, Op, Release, ScriptedGateway};
    use futures::future::LocalBoxFuture;

    fn setup(tasks: Vec<Task>) -> (Rc<ScriptedGateway>, Rc<TaskStore>) {
        let gateway = Rc::new(ScriptedGateway::with_tasks(tasks));
        let store = Rc::new(TaskStore::new(gateway.clone(), Rc::new(Notifier::new()), SortDirection::Asc));
        (gateway, store)
    }

    fn three() -> Vec<Task> {
        vec![
            task(1, TaskStatus::Todo, "2025-01-01"),
            task(2, TaskStatus::Todo, "2025-02-01"),
            task(3, TaskStatus::Done, "2025-03-01"),
        ]
    }

    #[tokio::test]
    async fn test_fetch_all_replaces_list() {
        let (gateway, store) = setup(three());
        let fetched = store.fetch_all().await.unwrap();
        assert_eq!(ids(&fetched), vec![1, 2, 3]);
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3]);
        assert_eq!(gateway.calls(), vec![Call::List(SortDirection::Asc)]);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_list() {
        let (gateway, store) = setup(three());
        store.fetch_all().await.unwrap();

        gateway.fail_next(Op::List, BoardError::Network("down".into()));
        assert_eq!(store.fetch_all().await, Err(BoardError::Network("down".into())));
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3]);

        gateway.fail_next(Op::List, BoardError::Unauthorized);
        assert_eq!(store.fetch_all().await, Err(BoardError::Unauthorized));
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stale_fetch_response_is_discarded() {
        let (gateway, store) = setup(vec![]);
        gateway.hold(Op::List);

        let older = vec![task(1, TaskStatus::Todo, "2025-01-01")];
        let newer = vec![task(1, TaskStatus::Done, "2025-01-01"), task(2, TaskStatus::Todo, "2025-01-02")];

        let a = store.fetch_all();
        let b = store.fetch_all();
        let driver = async {
            tokio::task::yield_now().await;
            assert_eq!(gateway.held_count(Op::List), 2);
            gateway.release(Op::List, 1, Release::Tasks(newer.clone()));
            tokio::task::yield_now().await;
            gateway.release(Op::List, 0, Release::Tasks(older.clone()));
        };
        let (ra, rb, ()) = futures::join!(a, b, driver);

        assert_eq!(ra, Err(BoardError::StaleResponse));
        assert_eq!(ids(&rb.unwrap()), vec![1, 2]);
        assert_eq!(store.tasks(), newer);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_dropped() {
        let mut tasks = three();
        let mut dup = task(2, TaskStatus::Done, "2025-05-05");
        dup.name = "Duplicate".into();
        tasks.push(dup);
        let (_, store) = setup(tasks);

        store.fetch_all().await.unwrap();
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3]);
        assert_eq!(store.get(2).unwrap().status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_change_status_is_idempotent() {
        for status in TaskStatus::ALL {
            let (once_gw, once) = setup(three());
            once.change_status(1, status).await.unwrap();

            let (twice_gw, twice) = setup(three());
            twice.change_status(1, status).await.unwrap();
            twice.change_status(1, status).await.unwrap();

            assert_eq!(once_gw.server_tasks(), twice_gw.server_tasks());
        }
    }

    #[tokio::test]
    async fn test_change_status_does_not_touch_local_state() {
        let (gateway, store) = setup(three());
        store.fetch_all().await.unwrap();
        store.change_status(1, TaskStatus::Done).await.unwrap();

        assert_eq!(store.get(1).unwrap().status, TaskStatus::Todo);
        assert_eq!(gateway.server_tasks()[0].status, TaskStatus::Done);
        assert_eq!(
            gateway.calls().last(),
            Some(&Call::Update(1, TaskPatch::status(TaskStatus::Done)))
        );
    }

    #[tokio::test]
    async fn test_create_refetches() {
        let (gateway, store) = setup(three());
        let new = NewTask {
            name: "Buy milk".into(),
            description: "Two litres".into(),
            status: TaskStatus::InProgress,
            due_date: "2025-04-01".into(),
        };
        let created = store.create(&new).await.unwrap();

        assert_eq!(created.id, 4);
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3, 4]);
        assert_eq!(gateway.count(|c| matches!(c, Call::List(_))), 1);
    }

    #[tokio::test]
    async fn test_failed_create_keeps_state() {
        let (gateway, store) = setup(three());
        store.fetch_all().await.unwrap();

        let mut errors = crate::error::FieldErrors::new();
        errors.insert("name", "The name has already been taken.");
        gateway.fail_next(Op::Create, BoardError::Validation(errors.clone()));

        let result = store.create(&NewTask::default()).await;
        assert_eq!(result, Err(BoardError::Validation(errors)));
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3]);
        assert_eq!(gateway.count(|c| matches!(c, Call::List(_))), 1);
    }

    #[tokio::test]
    async fn test_update_refetches() {
        let (_, store) = setup(three());
        store.fetch_all().await.unwrap();
        let patch = TaskPatch {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        store.update(3, &patch).await.unwrap();
        assert_eq!(store.get(3).unwrap().name, "Renamed");
    }

    #[tokio::test]
    async fn test_delete_failure_restores_task() {
        let (gateway, store) = setup(three());
        store.fetch_all().await.unwrap();
        gateway.hold(Op::Delete);

        let delete = store.delete(2);
        let driver = async {
            tokio::task::yield_now().await;
            // Removed before the server answers
            assert_eq!(ids(&store.tasks()), vec![1, 3]);
            gateway.release(Op::Delete, 0, Release::Fail(BoardError::Network("HTTP 500".into())));
        };
        let (result, ()) = futures::join!(delete, driver);

        assert!(matches!(result, Err(BoardError::Network(_))));
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delete_success() {
        let (gateway, store) = setup(three());
        store.fetch_all().await.unwrap();
        store.delete(1).await.unwrap();
        assert_eq!(ids(&store.tasks()), vec![2, 3]);
        assert_eq!(ids(&gateway.server_tasks()), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_live_events_trigger_refetch() {
        let (gateway, store) = setup(three());
        let channel = LocalChannel::new();
        let queued: Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>> = Rc::default();
        let queue = queued.clone();
        let spawner: Spawner = Rc::new(move |fut: LocalBoxFuture<'static, ()>| queue.borrow_mut().push(fut));

        let subs = store.bind_live_updates(&channel, "tasks", spawner);
        assert_eq!(subs.len(), 3);

        gateway.set_server_tasks(vec![task(9, TaskStatus::Done, "2025-06-01")]);
        for event in TASK_EVENTS {
            assert_eq!(channel.publish("tasks", event), 1);
        }
        let futures: Vec<_> = queued.borrow_mut().drain(..).collect();
        assert_eq!(futures.len(), 3);
        futures::future::join_all(futures).await;

        assert_eq!(ids(&store.tasks()), vec![9]);
        assert_eq!(gateway.count(|c| matches!(c, Call::List(_))), 3);

        drop(subs);
        assert_eq!(channel.publish("tasks", "task.created"), 0);
    }

    #[test]
    fn test_place_in_column_keeps_other_columns() {
        let mut tasks = vec![
            task(1, TaskStatus::Todo, "2025-01-01"),
            task(2, TaskStatus::Done, "2025-01-01"),
            task(3, TaskStatus::Todo, "2025-01-01"),
            task(4, TaskStatus::Todo, "2025-01-01"),
        ];
        assert_eq!(place_in_column(&mut tasks, 4, TaskStatus::Todo, 0), Some(0));
        assert_eq!(ids(&tasks), vec![4, 1, 2, 3]);

        assert_eq!(place_in_column(&mut tasks, 1, TaskStatus::Done, 99), Some(1));
        assert_eq!(ids(&tasks), vec![4, 2, 1, 3]);
        assert_eq!(tasks[2].status, TaskStatus::Done);

        assert_eq!(place_in_column(&mut tasks, 3, TaskStatus::InProgress, 0), Some(0));
        assert_eq!(tasks.iter().find(|t| t.id == 3).unwrap().status, TaskStatus::InProgress);
        assert_eq!(place_in_column(&mut tasks, 42, TaskStatus::Todo, 0), None);
    }

    #[tokio::test]
    async fn test_move_relative() {
        let (_, store) = setup(vec![
            task(1, TaskStatus::Todo, "2025-01-01"),
            task(2, TaskStatus::Todo, "2025-01-01"),
            task(3, TaskStatus::Todo, "2025-01-01"),
        ]);
        store.fetch_all().await.unwrap();

        assert_eq!(store.move_relative(3, 1, Placement::Before), Some(0));
        assert_eq!(ids(&store.tasks()), vec![3, 1, 2]);

        // Already directly before 1
        assert_eq!(store.move_relative(3, 1, Placement::Before), None);
        assert_eq!(store.move_relative(3, 3, Placement::After), None);

        assert_eq!(store.move_relative(3, 2, Placement::After), Some(2));
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3]);
        assert_eq!(store.column_position(3), Some((TaskStatus::Todo, 2)));
    }

    #[tokio::test]
    async fn test_rollback_only_touches_one_task() {
        let (_, store) = setup(three());
        store.fetch_all().await.unwrap();

        store.patch_status(1, TaskStatus::Done);
        store.patch_status(2, TaskStatus::InProgress);
        store.confirm_task(2);

        assert!(store.rollback_task(1));
        assert_eq!(store.get(1).unwrap().status, TaskStatus::Todo);
        assert_eq!(store.column_position(1), Some((TaskStatus::Todo, 0)));
        assert_eq!(store.get(2).unwrap().status, TaskStatus::InProgress);

        // Confirmed state of 2 is now the patched one
        assert!(store.rollback_task(2));
        assert_eq!(store.get(2).unwrap().status, TaskStatus::InProgress);
        assert!(!store.rollback_task(42));
    }

    #[tokio::test]
    async fn test_rollback_restores_position() {
        let (_, store) = setup(vec![
            task(1, TaskStatus::Todo, "2025-01-01"),
            task(2, TaskStatus::Todo, "2025-01-01"),
            task(3, TaskStatus::Todo, "2025-01-01"),
        ]);
        store.fetch_all().await.unwrap();

        store.move_relative(1, 3, Placement::After);
        assert_eq!(ids(&store.tasks()), vec![2, 3, 1]);
        store.rollback_task(1);
        assert_eq!(ids(&store.tasks()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_optimistic_patch_discards_fetch_in_flight() {
        let (gateway, store) = setup(three());
        store.fetch_all().await.unwrap();
        gateway.hold(Op::List);

        let fetch = store.fetch_all();
        let driver = async {
            tokio::task::yield_now().await;
            store.patch_status(1, TaskStatus::InProgress);
            // Read before the patch reached the server
            gateway.release(Op::List, 1, Release::Tasks(three()));
        };
        let (fetched, ()) = futures::join!(fetch, driver);

        assert_eq!(fetched, Err(BoardError::StaleResponse));
        assert_eq!(store.get(1).unwrap().status, TaskStatus::InProgress);
    }
}
