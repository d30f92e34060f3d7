//! Task Field Validation
//!
//! Checked before create/update requests; the server still validates.

use std::ops::RangeInclusive;

use crate::error::FieldErrors;
use crate::models::{parse_due_date, NewTask, TaskPatch, TaskStatus};

pub const NAME_CHARS: RangeInclusive<usize> = 3..=100;
pub const DESCRIPTION_CHARS: RangeInclusive<usize> = 5..=500;

/// Message for one field, `None` when valid
///
/// Field names are the wire names: `name`, `description`, `status`, `due_date`.
pub fn validate_field(field: &str, value: &str) -> Option<&'static str> {
    match field {
        "name" => {
            let len = value.chars().count();
            if len < *NAME_CHARS.start() {
                Some("Task name must be at least 3 characters")
            } else if len > *NAME_CHARS.end() {
                Some("Task name cannot exceed 100 characters")
            } else {
                None
            }
        }
        "description" => {
            let len = value.chars().count();
            if len < *DESCRIPTION_CHARS.start() {
                Some("Description must be at least 5 characters")
            } else if len > *DESCRIPTION_CHARS.end() {
                Some("Description cannot exceed 500 characters")
            } else {
                None
            }
        }
        "status" => match TaskStatus::parse(value) {
            Some(_) => None,
            None => Some("Status must be TODO, IN_PROGRESS or DONE"),
        },
        "due_date" => {
            if value.is_empty() {
                Some("Due date is required")
            } else if parse_due_date(value).is_none() {
                Some("Invalid date format")
            } else {
                None
            }
        }
        _ => None,
    }
}

fn check(errors: &mut FieldErrors, field: &str, value: &str) {
    if let Some(message) = validate_field(field, value) {
        errors.insert(field, message);
    }
}

pub fn validate_new_task(task: &NewTask) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check(&mut errors, "name", &task.name);
    check(&mut errors, "description", &task.description);
    check(&mut errors, "due_date", &task.due_date);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Only the fields present in the patch are checked
pub fn validate_patch(patch: &TaskPatch) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(name) = &patch.name {
        check(&mut errors, "name", name);
    }
    if let Some(description) = &patch.description {
        check(&mut errors, "description", description);
    }
    if let Some(due_date) = &patch.due_date {
        check(&mut errors, "due_date", due_date);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
