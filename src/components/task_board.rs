//! Task Board Component
//!
//! Three status columns wired to the drag engine through leptos-dragdrop.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::*;
use task_board_core::{Board, DropOutcome, Placement, ReorderTicket, TaskStatus};

use crate::components::BoardColumn;
use crate::context::{use_app_context, AppContext};
use crate::store::UiStateStoreFields;

fn persist_reorder(ctx: AppContext, board: Rc<Board>, ticket: ReorderTicket) {
    spawn_local(async move {
        if let Err(err) = board.drag().persist(ticket).await {
            ctx.report(err);
        }
    });
}

fn finish_drop(ctx: AppContext, dragged_id: u32, target: Option<DropTarget>) {
    let board = ctx.board();
    let outcome = match target {
        Some(DropTarget::Card(card_id, _)) => board.drag().drop_on_card(card_id),
        Some(DropTarget::Column(column)) => match TaskStatus::from_index(column as usize) {
            Some(status) => board.drag().drop_on_column(status),
            None => DropOutcome::Cancelled(board.drag().cancel()),
        },
        None => DropOutcome::Cancelled(board.drag().cancel()),
    };
    tracing::debug!(dragged_id, ?outcome, "drop");

    match outcome {
        DropOutcome::CrossColumn(ticket) => spawn_local(async move {
            if let Err(err) = board.drag().commit_status_change(ticket).await {
                ctx.report(err);
            }
        }),
        DropOutcome::Cancelled(Some(ticket)) => persist_reorder(ctx, board, ticket),
        DropOutcome::Cancelled(None) | DropOutcome::SameColumn | DropOutcome::Ignored => {}
    }
}

#[component]
pub fn TaskBoard() -> impl IntoView {
    let ctx = use_app_context();
    let ui = ctx.ui;

    let board_view = Memo::new(move |_| {
        ui.version().track();
        ctx.board().view()
    });

    let dnd = create_dnd_signals();
    bind_global_mouseup(
        dnd,
        move |id| {
            ctx.board().drag().begin(id);
        },
        move |id, target| finish_drop(ctx, id, target),
    );

    // Hovering a card of the same column reorders right away, unless sorted
    Effect::new(move |_| {
        let Some(DropTarget::Card(card_id, side)) = dnd.drop_target_read.get() else {
            return;
        };
        let placement = match side {
            Side::Before => Placement::Before,
            Side::After => Placement::After,
        };
        let board = ctx.board();
        let ticket = board.hover_card(card_id, placement);
        if let Some(ticket) = ticket {
            persist_reorder(ctx, board, ticket);
        }
    });

    let sorted = move || {
        ui.version().track();
        ctx.board().overlay().sort().is_some()
    };

    view! {
        <Show when=sorted>
            <p class="board-hint">"Reordering is off while sorted by due date; cards can still change column."</p>
        </Show>
        <div class="task-board">
            {TaskStatus::ALL.into_iter().map(|status| view! {
                <BoardColumn status=status board_view=board_view dnd=dnd />
            }).collect_view()}
        </div>
    }
}

/// Drop-target key of a status column
pub fn column_key(status: TaskStatus) -> u32 {
    status.index() as u32
}

