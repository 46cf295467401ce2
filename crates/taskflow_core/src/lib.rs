//! Core domain logic for Taskflow.
//! This crate is the single source of truth for task invariants; UI hosts
//! talk to it through `taskflow_ffi`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod viewmodel;

pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::preferences::{AccentColor, Appearance, Preferences, ThemeMode};
pub use model::query::{
    apply_query, normalize_search, SortDirection, TaskCounts, TaskFilter, TaskQuery, TaskSort,
    TaskSortField,
};
pub use model::task::{now_epoch_ms, Priority, Task, TaskId, TaskValidationError, DAY_MS};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::settings_service::SettingsService;
pub use service::task_service::{
    NewTask, TaskPatch, TaskService, TaskServiceError, TaskServiceResult,
};
pub use viewmodel::settings::SettingsViewModel;
pub use viewmodel::task_editor::TaskEditorViewModel;
pub use viewmodel::task_list::{TaskListState, TaskListViewModel};
pub use viewmodel::AlertMessage;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
