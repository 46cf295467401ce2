//! Task domain model.
//!
//! # Responsibility
//! - Define the single persisted entity of the application.
//! - Provide construction helpers that assign identity and creation time.
//!
//! # Invariants
//! - `id` is stable, never nil, and never reused for another task.
//! - `title` is non-blank after trimming.
//! - `order` reflects relative position only; gaps are allowed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for one task.
pub type TaskId = Uuid;

/// Milliseconds in one day, used by day-window filters.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// User-assigned task importance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Numeric rank; higher means more important.
    pub fn rank(self) -> i64 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// Stable label used for storage and FFI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a storage label. Matching is case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Validation errors for task invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::EmptyTitle => write!(f, "task title must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// The single persisted domain entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskWire")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
    pub is_completed: bool,
    /// Unix epoch milliseconds, assigned once at construction.
    pub created_at: i64,
    /// User-defined sort position. Lower sorts first.
    pub order: i64,
}

// Mirror of `Task` so deserialization can run `validate()`.
#[derive(Deserialize)]
struct TaskWire {
    id: TaskId,
    title: String,
    description: Option<String>,
    #[serde(default)]
    priority: Priority,
    due_date: Option<i64>,
    #[serde(default)]
    is_completed: bool,
    created_at: i64,
    #[serde(default)]
    order: i64,
}

impl TryFrom<TaskWire> for Task {
    type Error = TaskValidationError;

    fn try_from(wire: TaskWire) -> Result<Self, Self::Error> {
        let task = Task {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            priority: wire.priority,
            due_date: wire.due_date,
            is_completed: wire.is_completed,
            created_at: wire.created_at,
            order: wire.order,
        };
        task.validate()?;
        Ok(task)
    }
}

impl Task {
    /// Creates a task with a generated id and `created_at = now`.
    ///
    /// The title is stored as given; callers normalize it first.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            is_completed: false,
            created_at: now_epoch_ms(),
            order: 0,
        }
    }

    /// Creates a task with caller-provided identity, for import paths.
    ///
    /// # Errors
    /// - `NilId` when `id` is the nil UUID.
    /// - `EmptyTitle` when the title is blank.
    pub fn with_id(
        id: TaskId,
        title: impl Into<String>,
        created_at: i64,
    ) -> Result<Self, TaskValidationError> {
        let task = Self {
            id,
            created_at,
            ..Self::new(title)
        };
        task.validate()?;
        Ok(task)
    }

    /// Checks the invariants every persisted task must hold.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }

    pub fn toggle_completion(&mut self) {
        self.is_completed = !self.is_completed;
    }

    /// True when the task is open and its due date has passed.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < now_ms)
    }

    /// True when the task is open and due inside `[day_start_ms, day_start_ms + DAY_MS)`.
    ///
    /// The window end saturates at `i64::MAX`.
    pub fn is_due_within_day(&self, day_start_ms: i64) -> bool {
        let day_end_ms = day_start_ms.saturating_add(DAY_MS);
        !self.is_completed
            && self
                .due_date
                .is_some_and(|due| due >= day_start_ms && due < day_end_ms)
    }
}

/// Current wall clock as Unix epoch milliseconds.
///
/// Clamps to 0 if the clock reads earlier than the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
