//! UI Components
//!
//! Reusable Leptos components.

mod board_column;
mod delete_confirm_button;
mod feature_intro;
mod search_bar;
mod sign_in_form;
mod task_board;
mod task_card;
mod task_form;

pub use board_column::BoardColumn;
pub use delete_confirm_button::DeleteConfirmButton;
pub use feature_intro::FeatureIntro;
pub use search_bar::SearchBar;
pub use sign_in_form::SignInForm;
pub use task_board::TaskBoard;
pub use task_card::{StatusBadge, TaskCard};
pub use task_form::TaskForm;
