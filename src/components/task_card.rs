//! Task Card Component

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::*;
use task_board_core::{Task, TaskStatus};

use crate::context::use_app_context;
use crate::components::DeleteConfirmButton;
use crate::display::{badge_class, format_due_date};
use crate::store::store_open_form;

#[component]
pub fn StatusBadge(status: TaskStatus) -> impl IntoView {
    view! { <span class=badge_class(status)>{status.label()}</span> }
}

#[component]
pub fn TaskCard(task: Task, dnd: DndSignals) -> impl IntoView {
    let ctx = use_app_context();
    let id = task.id;

    let on_mousedown = make_on_mousedown(dnd, id);
    let on_mousemove = make_on_card_mousemove(dnd, id);
    let is_dragging = move || dnd.dragging_id_read.get() == Some(id);
    let drop_side = move || match dnd.drop_target_read.get() {
        Some(DropTarget::Card(target, side)) if target == id => Some(side),
        _ => None,
    };

    let on_delete = move |_: ()| {
        let board = ctx.board();
        spawn_local(async move {
            if let Err(err) = board.store().delete(id).await {
                ctx.report(err);
            }
        });
    };

    let due = format_due_date(&task.due_date);
    let editing = task.clone();

    view! {
        <article
            class="task-card"
            class:dragging=is_dragging
            class:drop-before=move || drop_side() == Some(Side::Before)
            class:drop-after=move || drop_side() == Some(Side::After)
            on:mousedown=on_mousedown
            on:mousemove=on_mousemove
        >
            <div class="task-card-top">
                <StatusBadge status=task.status />
                <div class="task-actions">
                    <button
                        class="edit-btn"
                        on:click=move |ev| {
                            ev.stop_propagation();
                            store_open_form(&ctx.ui, Some(editing.clone()));
                        }
                    >
                        "Edit"
                    </button>
                    <DeleteConfirmButton button_class="delete-btn" on_confirm=on_delete />
                </div>
            </div>
            <p class="task-name">{task.name}</p>
            <p class="task-description">{task.description}</p>
            <div class="task-due">"Due: " {due}</div>
        </article>
    }
}
