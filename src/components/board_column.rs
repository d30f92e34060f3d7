//! Board Column Component
//!
//! One status column; also the drop target for cross-column moves.

use leptos::prelude::*;
use leptos_dragdrop::*;
use task_board_core::{BoardView, TaskStatus};

use super::task_board::column_key;
use crate::components::TaskCard;

#[component]
pub fn BoardColumn(status: TaskStatus, board_view: Memo<BoardView>, dnd: DndSignals) -> impl IntoView {
    let key = column_key(status);
    let on_mousemove = make_on_column_mousemove(dnd, key);
    let on_mouseleave = make_on_mouseleave(dnd);

    let tasks = move || board_view.with(|v| v.column(status).to_vec());
    let count = move || board_view.with(|v| v.column(status).len());
    let is_drop_target = move || {
        matches!(dnd.drop_target_read.get(), Some(DropTarget::Column(k)) if k == key)
    };

    view! {
        <section
            class="board-column"
            class:drop-target=is_drop_target
            on:mousemove=on_mousemove
            on:mouseleave=on_mouseleave
        >
            <header class="column-header">
                <h2>{status.label()}</h2>
                <span class="column-count">{count}</span>
            </header>
            <Show
                when=move || { count() > 0 }
                fallback=|| view! { <div class="empty-column">"No task here!"</div> }
            >
                // Keyed by the whole task so edits re-render the card
                <For
                    each=tasks
                    key=|task| task.clone()
                    children=move |task| view! { <TaskCard task=task dnd=dnd /> }
                />
            </Show>
        </section>
    }
}
