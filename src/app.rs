//! Task Board Frontend App
//!
//! Sign-in gate, header and the three-column board.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;
use task_board_core::{Board, BoardConfig, LocalChannel, SessionProvider, Spawner, TASK_EVENTS};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::components::{FeatureIntro, SearchBar, SignInForm, TaskBoard, TaskForm};
use crate::context::{use_app_context, AppContext};
use crate::session::BrowserSession;
use crate::store::{store_bump_version, store_open_form, UiState, UiStateStoreFields};

/// Settings baked in at build time
///
/// `TASK_BOARD_CONFIG` holds a full JSON config; `TASK_BOARD_API_URL` only
/// overrides the API root, e.g. `https://api.example.com/api`.
fn board_config() -> BoardConfig {
    let json = option_env!("TASK_BOARD_CONFIG");
    let api_base_url = option_env!("TASK_BOARD_API_URL");
    BoardConfig::resolve(json, api_base_url).unwrap_or_else(|err| {
        tracing::error!(error = %err, "invalid TASK_BOARD_CONFIG, using defaults");
        BoardConfig::default()
    })
}

/// Refetch when the tab becomes visible again
fn bind_visibility_refresh(channel: Rc<LocalChannel>, channel_name: String) {
    let Some(doc) = web_sys::window().and_then(|win| win.document()) else {
        return;
    };
    let watched = doc.clone();
    let on_change = Closure::<dyn FnMut()>::new(move || {
        if watched.visibility_state() == web_sys::VisibilityState::Visible {
            channel.publish(&channel_name, TASK_EVENTS[1]);
        }
    });
    let _ = doc.add_event_listener_with_callback("visibilitychange", on_change.as_ref().unchecked_ref());
    on_change.forget();
}

#[component]
pub fn App() -> impl IntoView {
    let config = board_config();
    tracing::info!(api = %config.api_base_url, "starting task board");

    let session = Rc::new(BrowserSession::load());
    let ui = Store::new(UiState::new(session.user()));
    let live_channel = config.live_channel.clone();
    let board = Rc::new(Board::connect(config, session.clone()));
    board.on_change(move || store_bump_version(&ui));

    let ctx = AppContext::new(board.clone(), session, ui);
    provide_context(ctx);
    provide_context(ui);

    // Live updates: events only trigger a refetch
    let channel = Rc::new(LocalChannel::new());
    let spawner: Spawner = Rc::new(|fut: LocalBoxFuture<'static, ()>| spawn_local(fut));
    let subscriptions = board.bind_live_updates(&*channel, spawner);
    StoredValue::new_local(subscriptions);
    bind_visibility_refresh(channel, live_channel);

    // Load tasks whenever someone signs in
    Effect::new(move |_| {
        if ui.user().get().is_none() {
            return;
        }
        let board = ctx.board();
        spawn_local(async move {
            if let Err(err) = board.store().fetch_all().await {
                ctx.report(err);
            }
        });
    });

    view! {
        <Show
            when=move || ui.user().get().is_some()
            fallback=|| view! { <SignInForm /> }
        >
            <Dashboard />
        </Show>
    }
}

#[component]
fn Dashboard() -> impl IntoView {
    let ctx = use_app_context();
    let ui = ctx.ui;
    let user_name = move || ui.user().get().map(|u| u.name).unwrap_or_default();

    view! {
        <div class="app-layout">
            <header class="app-header">
                <h1>"Task Board"</h1>
                <div class="header-actions">
                    <button class="intro-btn" on:click=move |_| ui.intro_open().set(true)>"Features"</button>
                    <button class="new-task-btn" on:click=move |_| store_open_form(&ui, None)>"New task"</button>
                    <span class="user-name">{user_name}</span>
                    <button class="sign-out-btn" on:click=move |_| ctx.sign_out()>"Sign out"</button>
                </div>
            </header>

            {move || ui.banner().get().map(|message| view! {
                <div class="banner" role="alert">
                    <span>{message}</span>
                    <button class="banner-close" on:click=move |_| ui.banner().set(None)>"×"</button>
                </div>
            })}

            <FeatureIntro />
            <SearchBar />
            // Rebuilt whenever a different task is picked for editing
            {move || ui.form_open().get().then(|| {
                ui.editing().track();
                view! { <TaskForm /> }
            })}
            <TaskBoard />
        </div>
    }
}
