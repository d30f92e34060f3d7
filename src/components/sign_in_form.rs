//! Sign-In Form Component
//!
//! Collects an API token and the user it belongs to.

use leptos::prelude::*;
use task_board_core::User;

use crate::context::use_app_context;
use crate::store::{use_ui_store, UiStateStoreFields};

fn sign_in_error(token: &str, name: &str, email: &str) -> Option<&'static str> {
    if token.trim().is_empty() {
        Some("API token is required")
    } else if name.trim().is_empty() {
        Some("Name is required")
    } else if !email.contains('@') {
        Some("Enter a valid email address")
    } else {
        None
    }
}

#[component]
pub fn SignInForm() -> impl IntoView {
    let ctx = use_app_context();
    let ui = use_ui_store();
    let token = RwSignal::new(String::new());
    let name = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let error = RwSignal::new(None::<&'static str>);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let (token, name, email) = (token.get(), name.get(), email.get());
        if let Some(message) = sign_in_error(&token, &name, &email) {
            error.set(Some(message));
            return;
        }
        error.set(None);
        let user = User {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        };
        ctx.sign_in(token.trim().to_string(), user);
    };

    view! {
        <div class="sign-in">
            <h1>"Task Board"</h1>
            {move || ui.banner().get().map(|message| view! { <p class="banner">{message}</p> })}
            <form class="sign-in-form" on:submit=on_submit>
                <label>
                    "API token"
                    <input type="password" prop:value=move || token.get() on:input=move |ev| token.set(event_target_value(&ev)) />
                </label>
                <label>
                    "Name"
                    <input type="text" prop:value=move || name.get() on:input=move |ev| name.set(event_target_value(&ev)) />
                </label>
                <label>
                    "Email"
                    <input type="email" prop:value=move || email.get() on:input=move |ev| email.set(event_target_value(&ev)) />
                </label>
                {move || error.get().map(|message| view! { <p class="field-error">{message}</p> })}
                <button type="submit">"Sign in"</button>
            </form>
        </div>
    }
}
