//! Feature Intro Component
//!
//! Dismissible panel listing what the board can do.

use leptos::prelude::*;

use crate::store::{use_ui_store, UiStateStoreFields};

const FEATURES: &[(&str, &str)] = &[
    ("Drag and Drop Tasks", "Reorder tasks inside a column or drag them to another column"),
    ("Live Updates", "The board refetches whenever a task is created, updated or deleted"),
    ("Search", "Search across all your tasks and sort them by due date"),
    ("Task Management", "Create, edit and delete tasks with inline validation"),
];

#[component]
pub fn FeatureIntro() -> impl IntoView {
    let ui = use_ui_store();

    view! {
        <Show when=move || ui.intro_open().get()>
            <aside class="feature-intro">
                <div class="feature-intro-header">
                    <h2>"Welcome to Task Board"</h2>
                    <button class="close-btn" on:click=move |_| ui.intro_open().set(false)>"×"</button>
                </div>
                <p>"Here are the key features:"</p>
                <ul class="feature-list">
                    {FEATURES.iter().map(|(title, description)| view! {
                        <li class="feature">
                            <span class="feature-check">"✓"</span>
                            <div>
                                <h5>{*title}</h5>
                                <p>{*description}</p>
                            </div>
                        </li>
                    }).collect_view()}
                </ul>
            </aside>
        </Show>
    }
}
