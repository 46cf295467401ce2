//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task and settings use cases to Dart via FRB.
//! - Translate between string labels on the wire and core enums.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures come back inside the response envelope with `ok = false`
//!   and a human-readable `message`; nothing is thrown.
//! - Each call opens its own connection to the configured database.
//! - The Dart host owns the delete undo window. It hides the row and
//!   calls `task_delete` only once the window closes; the delete here
//!   is final and a repeat reports the task as not found.

use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use taskflow_core::db::open_db;
use taskflow_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, normalize_search,
    ping as ping_inner, AccentColor, AppConfig, NewTask, Preferences, Priority, RepoResult,
    SettingsService, SortDirection, SqliteSettingsRepository, SqliteTaskRepository, Task,
    TaskCounts, TaskFilter, TaskId, TaskPatch, TaskQuery, TaskService, TaskServiceResult,
    TaskSort, TaskSortField, ThemeMode,
};
use uuid::Uuid;

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Task projection sent to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// `low|medium|high`.
    pub priority: String,
    /// Epoch milliseconds.
    pub due_date: Option<i64>,
    pub is_completed: bool,
    pub created_at: i64,
    pub order: i64,
}

impl From<Task> for TaskItem {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title,
            description: task.description,
            priority: task.priority.as_str().to_string(),
            due_date: task.due_date,
            is_completed: task.is_completed,
            created_at: task.created_at,
            order: task.order,
        }
    }
}

/// Envelope for single-task commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Stored task after the write, when the command returns one.
    pub task: Option<TaskItem>,
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task: Option<Task>) -> Self {
        Self {
            ok: true,
            task: task.map(TaskItem::from),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task: None,
            message: message.into(),
        }
    }
}

/// Envelope for list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub total: u32,
    pub active: u32,
    pub completed: u32,
    pub overdue: u32,
    /// Drag-to-reorder is valid for this list.
    pub can_reorder: bool,
    pub message: String,
}

impl TaskListResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            total: 0,
            active: 0,
            completed: 0,
            overdue: 0,
            can_reorder: false,
            message: message.into(),
        }
    }
}

/// Envelope carrying every stored preference as wire labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub ok: bool,
    pub theme: String,
    pub accent: String,
    pub filter: String,
    pub sort_field: String,
    pub sort_direction: String,
    pub message: String,
}

impl SettingsResponse {
    fn from_preferences(preferences: Preferences, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            theme: preferences.theme.as_str().to_string(),
            accent: preferences.accent.as_str().to_string(),
            filter: preferences.filter.as_str().to_string(),
            sort_field: preferences.sort.field.as_str().to_string(),
            sort_direction: preferences.sort.direction.as_str().to_string(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            ..Self::from_preferences(Preferences::default(), "")
        }
    }
}

/// Creates a task at the end of the manual order.
///
/// `priority` accepts `low|medium|high`; `None` means medium.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(
    title: String,
    description: Option<String>,
    priority: Option<String>,
    due_date: Option<i64>,
) -> TaskActionResponse {
    let priority = match parse_label("priority", priority, Priority::parse) {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => return TaskActionResponse::failure(err),
    };
    let input = NewTask {
        title,
        description,
        priority,
        due_date,
        is_completed: false,
    };
    match with_task_service(|service| service.create_task(input)) {
        Ok(task) => TaskActionResponse::success("Task created.", Some(task)),
        Err(err) => action_failure("task_create", err),
    }
}

/// Lists tasks for one filter × sort × search combination.
///
/// Every label argument falls back to its default when `None`.
/// `day_start_ms` is the start of the caller's local day for `due_today`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(
    filter: Option<String>,
    sort_field: Option<String>,
    sort_direction: Option<String>,
    search: Option<String>,
    priority: Option<String>,
    day_start_ms: Option<i64>,
) -> TaskListResponse {
    let query = match build_query(
        filter,
        sort_field,
        sort_direction,
        search,
        priority,
        day_start_ms,
    ) {
        Ok(query) => query,
        Err(err) => return TaskListResponse::failure(format!("task_list failed: {err}")),
    };

    let result = with_task_service(|service| {
        let tasks = service.fetch_tasks(&query)?;
        let counts = service.counts(query.now_ms)?;
        Ok((tasks, counts))
    });
    match result {
        Ok((tasks, counts)) => list_response(tasks, counts, &query),
        Err(err) => {
            warn!("event=ffi_call module=ffi call=task_list status=error");
            TaskListResponse::failure(format!("task_list failed: {err}"))
        }
    }
}

/// Applies an edit to one task.
///
/// `None` leaves a field unchanged. A blank `description` clears it;
/// `clear_due_date` removes the due date and wins over `due_date`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    id: String,
    title: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    due_date: Option<i64>,
    clear_due_date: bool,
) -> TaskActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(err) => return TaskActionResponse::failure(err),
    };
    let priority = match parse_label("priority", priority, Priority::parse) {
        Ok(value) => value,
        Err(err) => return TaskActionResponse::failure(err),
    };
    let patch = TaskPatch {
        title,
        description: description.map(Some),
        priority,
        due_date: if clear_due_date {
            Some(None)
        } else {
            due_date.map(Some)
        },
        is_completed: None,
    };
    match with_task_service(|service| service.update_task(task_id, patch)) {
        Ok(task) => TaskActionResponse::success("Task updated.", Some(task)),
        Err(err) => action_failure("task_update", err),
    }
}

/// Flips the completion flag of one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: String) -> TaskActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(err) => return TaskActionResponse::failure(err),
    };
    match with_task_service(|service| service.toggle_completion(task_id)) {
        Ok(task) => TaskActionResponse::success("Task updated.", Some(task)),
        Err(err) => action_failure("task_toggle", err),
    }
}

/// Hard-deletes one task. Undo is the host's concern and must finish
/// before this call.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(err) => return TaskActionResponse::failure(err),
    };
    match with_task_service(|service| service.delete_task(task_id)) {
        Ok(()) => TaskActionResponse::success("Task deleted.", None),
        Err(err) => action_failure("task_delete", err),
    }
}

/// Persists a new relative order for `ids`, which may be a filtered subset.
#[flutter_rust_bridge::frb(sync)]
pub fn task_reorder(ids: Vec<String>) -> TaskActionResponse {
    let task_ids = match ids
        .iter()
        .map(|id| parse_task_id(id))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(task_ids) => task_ids,
        Err(err) => return TaskActionResponse::failure(err),
    };
    match with_task_service(|service| service.reorder_tasks(&task_ids)) {
        Ok(()) => TaskActionResponse::success("Tasks reordered.", None),
        Err(err) => action_failure("task_reorder", err),
    }
}

/// Removes every completed task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_clear_completed() -> TaskActionResponse {
    match with_task_service(|service| service.clear_completed()) {
        Ok(removed) => TaskActionResponse::success(format!("Removed {removed} task(s)."), None),
        Err(err) => action_failure("task_clear_completed", err),
    }
}

/// Reads every preference; unknown stored values come back as defaults.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_get() -> SettingsResponse {
    settings_call("settings_get", |_| Ok(()))
}

/// Stores the theme mode (`system|light|dark`).
#[flutter_rust_bridge::frb(sync)]
pub fn settings_set_theme(theme: String) -> SettingsResponse {
    let Some(theme) = ThemeMode::parse(&theme) else {
        return SettingsResponse::failure(format!("unsupported theme `{}`", theme.trim()));
    };
    settings_call("settings_set_theme", |service| service.set_theme(theme))
}

/// Stores the accent color (`blue|green|orange|purple|red`).
#[flutter_rust_bridge::frb(sync)]
pub fn settings_set_accent(accent: String) -> SettingsResponse {
    let Some(accent) = AccentColor::parse(&accent) else {
        return SettingsResponse::failure(format!("unsupported accent `{}`", accent.trim()));
    };
    settings_call("settings_set_accent", |service| service.set_accent(accent))
}

/// Stores the list filter and sort the user last picked.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_set_list(
    filter: String,
    sort_field: String,
    sort_direction: String,
) -> SettingsResponse {
    let parsed = (
        TaskFilter::parse(&filter),
        TaskSortField::parse(&sort_field),
        SortDirection::parse(&sort_direction),
    );
    let (Some(filter), Some(field), Some(direction)) = parsed else {
        return SettingsResponse::failure("unsupported list filter or sort");
    };
    settings_call("settings_set_list", |service| {
        service.set_list_preferences(filter, TaskSort::new(field, direction))
    })
}

fn build_query(
    filter: Option<String>,
    sort_field: Option<String>,
    sort_direction: Option<String>,
    search: Option<String>,
    priority: Option<String>,
    day_start_ms: Option<i64>,
) -> Result<TaskQuery, String> {
    let sort = TaskSort::new(
        parse_label("sort_field", sort_field, TaskSortField::parse)?.unwrap_or_default(),
        parse_label("sort_direction", sort_direction, SortDirection::parse)?.unwrap_or_default(),
    );
    Ok(TaskQuery {
        filter: parse_label("filter", filter, TaskFilter::parse)?.unwrap_or_default(),
        priority: parse_label("priority", priority, Priority::parse)?,
        search: search.as_deref().and_then(normalize_search),
        sort,
        day_start_ms,
        ..TaskQuery::default()
    })
}

fn list_response(tasks: Vec<Task>, counts: TaskCounts, query: &TaskQuery) -> TaskListResponse {
    let message = if tasks.is_empty() {
        "No tasks.".to_string()
    } else {
        format!("Found {} task(s).", tasks.len())
    };
    TaskListResponse {
        ok: true,
        items: tasks.into_iter().map(TaskItem::from).collect(),
        total: saturating_u32(counts.total),
        active: saturating_u32(counts.active),
        completed: saturating_u32(counts.completed),
        overdue: saturating_u32(counts.overdue),
        can_reorder: query.sort.is_manual() && query.search.is_none(),
        message,
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Parses an optional wire label; blank counts as absent.
fn parse_label<T>(
    name: &str,
    raw: Option<String>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| format!("unsupported {name} `{value}`")),
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid task id `{}`", raw.trim()))
}

fn action_failure(call: &str, err: String) -> TaskActionResponse {
    warn!("event=ffi_call module=ffi call={call} status=error");
    TaskActionResponse::failure(format!("{call} failed: {err}"))
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| AppConfig::from_env().db_path)
        .clone()
}

fn with_task_service<T>(
    f: impl FnOnce(&TaskService<SqliteTaskRepository<'_>>) -> TaskServiceResult<T>,
) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("task DB open failed: {err}"))?;
    let repo = SqliteTaskRepository::try_new(&conn)
        .map_err(|err| format!("task repo init failed: {err}"))?;
    let service = TaskService::new(repo);
    f(&service).map_err(|err| err.to_string())
}

fn settings_call(
    call: &str,
    f: impl FnOnce(&SettingsService<SqliteSettingsRepository<'_>>) -> RepoResult<()>,
) -> SettingsResponse {
    let result = (|| -> Result<Preferences, String> {
        let conn =
            open_db(resolve_db_path()).map_err(|err| format!("settings DB open failed: {err}"))?;
        let repo = SqliteSettingsRepository::try_new(&conn)
            .map_err(|err| format!("settings repo init failed: {err}"))?;
        let service = SettingsService::new(repo);
        f(&service).map_err(|err| err.to_string())?;
        service.load_preferences().map_err(|err| err.to_string())
    })();

    match result {
        Ok(preferences) => SettingsResponse::from_preferences(preferences, "Settings loaded."),
        Err(err) => {
            warn!("event=ffi_call module=ffi call={call} status=error");
            SettingsResponse::failure(format!("{call} failed: {err}"))
        }
    }
}
