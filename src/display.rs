//! Display helpers shared by the card and form components.

use task_board_core::{parse_due_date, SortDirection, TaskStatus};

/// `2025-03-15` -> `Mar 15, 2025`; unparseable input is shown as-is
pub fn format_due_date(raw: &str) -> String {
    match parse_due_date(raw) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn badge_class(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "status-badge todo",
        TaskStatus::InProgress => "status-badge in-progress",
        TaskStatus::Done => "status-badge done",
    }
}

/// Value of the sort `<select>`
pub fn sort_value(sort: Option<SortDirection>) -> &'static str {
    sort.map_or("none", |s| s.as_str())
}

pub fn parse_sort_value(value: &str) -> Option<SortDirection> {
    match value {
        "asc" => Some(SortDirection::Asc),
        "desc" => Some(SortDirection::Desc),
        _ => None,
    }
}
