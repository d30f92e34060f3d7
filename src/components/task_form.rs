//! Task Form Component
//!
//! Create or edit a task. Fields validate as the user types; the submit
//! button stays disabled while any field is invalid.

use std::collections::HashSet;

use leptos::prelude::*;
use leptos::task::spawn_local;
use task_board_core::{
    parse_due_date, validate_field, validate_new_task, validate_patch, BoardError, FieldErrors, NewTask, TaskId,
    TaskPatch, TaskStatus,
};

use crate::context::use_app_context;
use crate::store::{store_close_form, UiStateStoreFields};

const FIELDS: [&str; 3] = ["name", "description", "due_date"];

/// Date input wants `YYYY-MM-DD`; the server may have sent a timestamp
fn date_input_value(raw: &str) -> String {
    parse_due_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

enum Submit {
    Create(NewTask),
    Update(TaskId, TaskPatch),
}

/// Edits send every form field
fn edit_patch(form: NewTask) -> TaskPatch {
    TaskPatch {
        name: Some(form.name),
        description: Some(form.description),
        status: Some(form.status),
        due_date: Some(form.due_date),
    }
}

#[component]
pub fn TaskForm() -> impl IntoView {
    let ctx = use_app_context();
    let ui = ctx.ui;
    let editing = ui.editing().get_untracked();
    let editing_id = editing.as_ref().map(|t| t.id);

    let name = RwSignal::new(editing.as_ref().map(|t| t.name.clone()).unwrap_or_default());
    let description = RwSignal::new(editing.as_ref().map(|t| t.description.clone()).unwrap_or_default());
    let status = RwSignal::new(editing.as_ref().map_or(TaskStatus::Todo, |t| t.status));
    let due_date = RwSignal::new(editing.as_ref().map(|t| date_input_value(&t.due_date)).unwrap_or_default());
    let touched = RwSignal::new(HashSet::<&'static str>::new());
    let server_errors = RwSignal::new(FieldErrors::new());
    let submitting = RwSignal::new(false);

    let value_of = move |field: &str| match field {
        "name" => name.get(),
        "description" => description.get(),
        _ => due_date.get(),
    };
    // Local message first, then whatever the server rejected
    let error_for = move |field: &'static str| {
        if !touched.with(|t| t.contains(field)) {
            return None;
        }
        validate_field(field, &value_of(field))
            .map(str::to_string)
            .or_else(|| server_errors.with(|e| e.get(field).map(str::to_string)))
    };
    let has_errors = move || FIELDS.iter().any(|f| validate_field(f, &value_of(f)).is_some());

    let on_input = move |field: &'static str, signal: RwSignal<String>, value: String| {
        signal.set(value);
        touched.update(|t| {
            t.insert(field);
        });
        server_errors.update(|e| *e = FieldErrors::new());
    };

    let reset = move || {
        name.set(String::new());
        description.set(String::new());
        status.set(TaskStatus::Todo);
        due_date.set(String::new());
        touched.update(|t| t.clear());
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        touched.update(|t| t.extend(FIELDS));
        if submitting.get_untracked() {
            return;
        }
        let new = NewTask {
            name: name.get_untracked().trim().to_string(),
            description: description.get_untracked().trim().to_string(),
            status: status.get_untracked(),
            due_date: due_date.get_untracked(),
        };
        let request = match editing_id {
            None => validate_new_task(&new).map(|()| Submit::Create(new)),
            Some(id) => {
                let patch = edit_patch(new);
                validate_patch(&patch).map(|()| Submit::Update(id, patch))
            }
        };
        let Ok(request) = request else {
            return;
        };

        submitting.set(true);
        let board = ctx.board();
        spawn_local(async move {
            let result = match request {
                Submit::Create(new) => board.store().create(&new).await.map(|_| ()),
                Submit::Update(id, patch) => board.store().update(id, &patch).await.map(|_| ()),
            };
            submitting.set(false);
            match result {
                Ok(()) => {
                    reset();
                    store_close_form(&ui);
                }
                Err(BoardError::Validation(errors)) => server_errors.set(errors),
                Err(err) => ctx.report(err),
            }
        });
    };

    let submit_label = move || match (submitting.get(), editing_id.is_some()) {
        (true, false) => "Creating...",
        (true, true) => "Saving...",
        (false, false) => "Create task",
        (false, true) => "Save changes",
    };

    view! {
        <form class="task-form" on:submit=on_submit>
            <h2>{if editing_id.is_some() { "Edit task" } else { "New task" }}</h2>

            <label>
                "Name"
                <input
                    type="text"
                    prop:value=move || name.get()
                    on:input=move |ev| on_input("name", name, event_target_value(&ev))
                />
            </label>
            {move || error_for("name").map(|message| view! { <p class="field-error">{message}</p> })}

            <label>
                "Description"
                <textarea
                    prop:value=move || description.get()
                    on:input=move |ev| on_input("description", description, event_target_value(&ev))
                />
            </label>
            {move || error_for("description").map(|message| view! { <p class="field-error">{message}</p> })}

            <label>
                "Status"
                <select
                    on:change=move |ev| {
                        if let Some(parsed) = TaskStatus::parse(&event_target_value(&ev)) {
                            status.set(parsed);
                        }
                    }
                >
                    {TaskStatus::ALL.into_iter().map(|s| view! {
                        <option value=s.as_str() selected=move || status.get() == s>{s.label()}</option>
                    }).collect_view()}
                </select>
            </label>

            <label>
                "Due date"
                <input
                    type="date"
                    prop:value=move || due_date.get()
                    on:input=move |ev| on_input("due_date", due_date, event_target_value(&ev))
                />
            </label>
            {move || error_for("due_date").map(|message| view! { <p class="field-error">{message}</p> })}

            <div class="form-actions">
                <button type="submit" disabled=move || submitting.get() || has_errors()>
                    {submit_label}
                </button>
                <button type="button" class="cancel-btn" on:click=move |_| store_close_form(&ui)>
                    "Cancel"
                </button>
            </div>
        </form>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_input_value() {
        assert_eq!(date_input_value("2025-03-15"), "2025-03-15");
        assert_eq!(date_input_value("2025-03-15T10:00:00+00:00"), "2025-03-15");
        assert_eq!(date_input_value("garbage"), "");
    }

    #[test]
    fn test_edit_patch_is_checked_field_by_field() {
        let patch = edit_patch(NewTask {
            name: "ab".into(),
            description: "Long enough description".into(),
            status: TaskStatus::Done,
            due_date: "2025-03-15".into(),
        });
        assert_eq!(patch.status, Some(TaskStatus::Done));
        let errors = validate_patch(&patch).unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("description").is_none());
    }
}
