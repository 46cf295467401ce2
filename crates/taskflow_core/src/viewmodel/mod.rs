//! View-models: UI-facing state holders over the use-case services.
//!
//! # Responsibility
//! - Keep screen state and derived projections out of the UI toolkit.
//! - Convert failures into a blocking alert with a readable message.
//!
//! # Invariants
//! - View-models never issue SQL; every store access goes through a service.

use std::fmt::Display;

pub mod settings;
pub mod task_editor;
pub mod task_list;

/// Blocking alert shown when an operation fails. There is no retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub title: String,
    pub message: String,
}

impl AlertMessage {
    /// Builds the generic failure alert for `action`.
    pub fn failure(action: &str, err: &dyn Display) -> Self {
        Self {
            title: format!("Couldn't {action}"),
            message: err.to_string(),
        }
    }
}
