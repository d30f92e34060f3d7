//! Search Bar Component
//!
//! Query input with debounced server search and the due-date sort selector.

use leptos::prelude::*;
use leptos::task::spawn_local;
use gloo_timers::future::TimeoutFuture;
use task_board_core::{QueryChange, SearchTicket};

use crate::context::{use_app_context, AppContext};
use crate::display::{parse_sort_value, sort_value};

/// Wait out the ticket's delay, then search unless a newer keystroke superseded it
fn schedule_search(ctx: AppContext, ticket: SearchTicket) {
    let board = ctx.board();
    spawn_local(async move {
        if !ticket.delay.is_zero() {
            let millis = u32::try_from(ticket.delay.as_millis()).unwrap_or(u32::MAX);
            TimeoutFuture::new(millis).await;
        }
        if let Err(err) = board.overlay().run_search(ticket).await {
            ctx.report(err);
        }
    });
}

#[component]
pub fn SearchBar() -> impl IntoView {
    let ctx = use_app_context();
    let (query, set_query) = signal(ctx.board().overlay().query());
    let (sort, set_sort) = signal(ctx.board().overlay().sort());

    let apply_query = move |text: String| {
        set_query.set(text.clone());
        match ctx.board().overlay().set_query(&text) {
            QueryChange::Cleared => {}
            QueryChange::Pending(ticket) => schedule_search(ctx, ticket),
        }
    };

    view! {
        <div class="search-bar">
            <input
                type="search"
                placeholder="Search tasks..."
                prop:value=move || query.get()
                on:input=move |ev| apply_query(event_target_value(&ev))
            />
            <Show when=move || !query.get().is_empty()>
                <button class="clear-btn" on:click=move |_| apply_query(String::new())>"Clear"</button>
            </Show>
            <select
                class="sort-select"
                prop:value=move || sort_value(sort.get())
                on:change=move |ev| {
                    let selected = parse_sort_value(&event_target_value(&ev));
                    set_sort.set(selected);
                    if let Some(ticket) = ctx.board().overlay().set_sort_direction(selected) {
                        schedule_search(ctx, ticket);
                    }
                }
            >
                <option value="none">"Board order"</option>
                <option value="asc">"Due date ↑"</option>
                <option value="desc">"Due date ↓"</option>
            </select>
        </div>
    }
}
