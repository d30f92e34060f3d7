//! Drag-Reorder Engine
//!
//! Idle -> Dragging -> (dropped in same column | dropped on another column | cancelled) -> Idle.
//!
//! Fed by synthetic events so it does not depend on any input binding.
//! Reorders and status changes are applied to the store before the server
//! answers. Every request carries a sequence number; only the latest request
//! for a task may confirm or roll back that task, and only that task.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{BoardError, BoardResult};
use crate::gateway::TaskGateway;
use crate::models::{MoveRequest, TaskId, TaskStatus};
use crate::store::{Placement, TaskStore};

/// State captured at drag start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub dragged_id: TaskId,
    pub source_status: TaskStatus,
    pub source_index: usize,
    reorders: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// A move request to persist with `DragEngine::persist`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderTicket {
    pub seq: u64,
    pub task_id: TaskId,
    pub request: MoveRequest,
}

/// A status change to commit with `DragEngine::commit_status_change`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChangeTicket {
    pub seq: u64,
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// No drag in progress
    Ignored,
    /// Dropped in its own column; hover reorders already did the work
    SameColumn,
    CrossColumn(StatusChangeTicket),
    /// Drop target or dragged task vanished mid-drag; carries the undo move if one is needed
    Cancelled(Option<ReorderTicket>),
}

pub struct DragEngine {
    store: Rc<TaskStore>,
    gateway: Rc<dyn TaskGateway>,
    phase: RefCell<DragPhase>,
    seq: Cell<u64>,
    /// Latest request sequence per task
    latest: RefCell<HashMap<TaskId, u64>>,
}

impl DragEngine {
    pub fn new(store: Rc<TaskStore>, gateway: Rc<dyn TaskGateway>) -> Self {
        Self {
            store,
            gateway,
            phase: RefCell::new(DragPhase::Idle),
            seq: Cell::new(0),
            latest: RefCell::new(HashMap::new()),
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase.borrow().clone()
    }

    pub fn dragged_id(&self) -> Option<TaskId> {
        match &*self.phase.borrow() {
            DragPhase::Dragging(session) => Some(session.dragged_id),
            DragPhase::Idle => None,
        }
    }

    /// Next sequence number; supersedes every earlier request for `id`
    fn issue(&self, id: TaskId) -> u64 {
        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        self.latest.borrow_mut().insert(id, seq);
        seq
    }

    fn is_latest(&self, id: TaskId, seq: u64) -> bool {
        self.latest.borrow().get(&id) == Some(&seq)
    }

    /// Idle -> Dragging
    pub fn begin(&self, id: TaskId) -> bool {
        let Some((source_status, source_index)) = self.store.column_position(id) else {
            tracing::warn!(id, "drag start on unknown task");
            return false;
        };
        let mut phase = self.phase.borrow_mut();
        if let DragPhase::Dragging(previous) = &*phase {
            tracing::warn!(previous = previous.dragged_id, "drag started without ending the previous one");
        }
        tracing::debug!(id, status = source_status.as_str(), source_index, "drag started");
        *phase = DragPhase::Dragging(DragSession {
            dragged_id: id,
            source_status,
            source_index,
            reorders: 0,
        });
        true
    }

    /// Pointer is over another card
    ///
    /// Only cards of the dragged task's own column reorder. Returns the
    /// request to persist when the order changed.
    pub fn hover_card(&self, target_id: TaskId, placement: Placement) -> Option<ReorderTicket> {
        let dragged_id = self.dragged_id()?;
        let dragged = self.store.get(dragged_id)?;
        let target = self.store.get(target_id)?;
        if target.status != dragged.status {
            return None;
        }

        let target_position = self.store.move_relative(dragged_id, target_id, placement)?;
        let seq = self.issue(dragged_id);
        if let DragPhase::Dragging(session) = &mut *self.phase.borrow_mut() {
            session.reorders += 1;
        }
        tracing::debug!(id = dragged_id, target_id, target_position, seq, "reordered");

        Some(ReorderTicket {
            seq,
            task_id: dragged_id,
            request: MoveRequest {
                target_position,
                status: dragged.status,
            },
        })
    }

    /// Dropped over a column container
    pub fn drop_on_column(&self, status: TaskStatus) -> DropOutcome {
        let session = match std::mem::take(&mut *self.phase.borrow_mut()) {
            DragPhase::Dragging(session) => session,
            DragPhase::Idle => return DropOutcome::Ignored,
        };
        let Some(current) = self.store.get(session.dragged_id) else {
            return DropOutcome::Cancelled(None);
        };
        if current.status == status {
            tracing::debug!(id = session.dragged_id, "dropped in same column");
            return DropOutcome::SameColumn;
        }

        self.store.patch_status(session.dragged_id, status);
        let seq = self.issue(session.dragged_id);
        tracing::debug!(id = session.dragged_id, to = status.as_str(), seq, "dropped on another column");
        DropOutcome::CrossColumn(StatusChangeTicket {
            seq,
            task_id: session.dragged_id,
            from: current.status,
            to: status,
        })
    }

    /// Dropped over a card; behaves like a drop on that card's column
    pub fn drop_on_card(&self, target_id: TaskId) -> DropOutcome {
        match self.store.get(target_id) {
            Some(target) => self.drop_on_column(target.status),
            None => DropOutcome::Cancelled(self.cancel()),
        }
    }

    /// Dropped outside any target: the dragged task goes back to where it started
    ///
    /// Only the dragged task moves; anything fetched during the drag stays.
    /// When reorders were already sent, returns the move that undoes them.
    pub fn cancel(&self) -> Option<ReorderTicket> {
        let session = match std::mem::take(&mut *self.phase.borrow_mut()) {
            DragPhase::Dragging(session) => session,
            DragPhase::Idle => return None,
        };
        tracing::debug!(id = session.dragged_id, reorders = session.reorders, "drag cancelled");
        if session.reorders == 0 {
            return None;
        }
        let target_position = self.store.place(session.dragged_id, session.source_status, session.source_index)?;
        let seq = self.issue(session.dragged_id);
        Some(ReorderTicket {
            seq,
            task_id: session.dragged_id,
            request: MoveRequest {
                target_position,
                status: session.source_status,
            },
        })
    }

    /// Send a reorder to the server
    pub async fn persist(&self, ticket: ReorderTicket) -> BoardResult<()> {
        let result = self.gateway.move_task(ticket.task_id, &ticket.request).await;
        self.settle(ticket.task_id, ticket.seq, result, "move")
    }

    /// Send a cross-column status change
    pub async fn commit_status_change(&self, ticket: StatusChangeTicket) -> BoardResult<()> {
        let result = self.store.change_status(ticket.task_id, ticket.to).await.map(|_| ());
        self.settle(ticket.task_id, ticket.seq, result, "status change")
    }

    /// Confirm or roll back `id` if `seq` is still its latest request
    fn settle(&self, id: TaskId, seq: u64, result: BoardResult<()>, what: &str) -> BoardResult<()> {
        if !self.is_latest(id, seq) {
            tracing::debug!(id, seq, what, "ignoring superseded response");
            return Err(BoardError::StaleResponse);
        }
        match result {
            Ok(()) => {
                self.store.confirm_task(id);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(id, error = %err, what, "request failed, rolling back");
                self.store.rollback_task(id);
                Err(err)
            }
        }
    }
}
