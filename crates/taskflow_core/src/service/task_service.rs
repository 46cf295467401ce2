//! Task use cases.
//!
//! # Responsibility
//! - Provide one method per use case over a `TaskRepository`.
//! - Normalize user input before it reaches persistence.
//! - Merge partial reorders into the full manual order.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Mutating use cases return the stored task read back after the write.
//! - New tasks are appended after every existing task in manual order.

use crate::model::query::{TaskCounts, TaskQuery};
use crate::model::task::{Priority, Task, TaskId};
use crate::repo::task_repo::{RepoError, TaskRepository};
use log::info;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Title is blank after trimming.
    InvalidTitle,
    TaskNotFound(TaskId),
    /// Reorder input repeats an id.
    DuplicateReorderId(TaskId),
    Repo(RepoError),
    /// Write succeeded but read-back disagrees.
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "task title must not be blank"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::DuplicateReorderId(id) => write!(f, "task listed twice in reorder: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Input for the create-task flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<i64>,
    /// Written by the same insert as the other fields.
    pub is_completed: bool,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Edit set for `update_task`. `None` leaves a field unchanged.
///
/// The nested options on `description` and `due_date` distinguish
/// "unchanged" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<i64>>,
    pub is_completed: Option<bool>,
}

/// Use-case facade over a task repository.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a task at the end of the manual order.
    pub fn create_task(&self, input: NewTask) -> TaskServiceResult<Task> {
        let title = normalize_title(&input.title)?;
        let mut task = Task::new(title);
        task.description = normalize_description(input.description);
        task.priority = input.priority;
        task.due_date = input.due_date;
        task.is_completed = input.is_completed;
        task.order = self.repo.next_order()?;

        let id = self.repo.create_task(&task)?;
        info!(
            "event=task_create module=service status=ok task_id={} priority={} has_due_date={}",
            id,
            task.priority.as_str(),
            task.due_date.is_some()
        );
        self.read_back(id, "created task not found in read-back")
    }

    /// Lists tasks matching `query`, in query order.
    pub fn fetch_tasks(&self, query: &TaskQuery) -> TaskServiceResult<Vec<Task>> {
        Ok(self.repo.list_tasks(query)?)
    }

    pub fn get_task(&self, id: TaskId) -> TaskServiceResult<Option<Task>> {
        Ok(self.repo.get_task(id)?)
    }

    /// Applies an edit set to one stored task.
    pub fn update_task(&self, id: TaskId, patch: TaskPatch) -> TaskServiceResult<Task> {
        let mut task = self.require(id)?;
        if let Some(title) = patch.title {
            task.title = normalize_title(&title)?;
        }
        if let Some(description) = patch.description {
            task.description = normalize_description(description);
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(is_completed) = patch.is_completed {
            task.is_completed = is_completed;
        }

        self.repo.update_task(&task)?;
        info!("event=task_update module=service status=ok task_id={id}");
        self.read_back(id, "updated task not found in read-back")
    }

    pub fn set_completed(&self, id: TaskId, is_completed: bool) -> TaskServiceResult<Task> {
        self.update_task(
            id,
            TaskPatch {
                is_completed: Some(is_completed),
                ..TaskPatch::default()
            },
        )
    }

    pub fn toggle_completion(&self, id: TaskId) -> TaskServiceResult<Task> {
        let current = self.require(id)?;
        self.set_completed(id, !current.is_completed)
    }

    /// Hard-deletes one task.
    pub fn delete_task(&self, id: TaskId) -> TaskServiceResult<()> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Removes every completed task.
    pub fn clear_completed(&self) -> TaskServiceResult<usize> {
        let removed = self.repo.delete_completed()?;
        info!("event=task_clear_completed module=service status=ok removed={removed}");
        Ok(removed)
    }

    /// Persists a new relative order for `ordered_ids`.
    ///
    /// `ordered_ids` may be a subset of all tasks (a filtered list). The
    /// subset is written back into the manual-order slots it already
    /// occupies, so tasks outside it keep their positions.
    pub fn reorder_tasks(&self, ordered_ids: &[TaskId]) -> TaskServiceResult<()> {
        let mut seen = HashSet::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            if !seen.insert(*id) {
                return Err(TaskServiceError::DuplicateReorderId(*id));
            }
        }

        let mut full_order = self.manual_order()?;
        if let Some(missing) = ordered_ids
            .iter()
            .find(|id| !full_order.contains(id))
        {
            return Err(TaskServiceError::TaskNotFound(*missing));
        }

        let mut replacements = ordered_ids.iter();
        for slot in full_order.iter_mut() {
            if seen.contains(slot) {
                if let Some(next) = replacements.next() {
                    *slot = *next;
                }
            }
        }

        self.repo.set_order(&full_order)?;
        info!(
            "event=task_reorder module=service status=ok moved={} total={}",
            ordered_ids.len(),
            full_order.len()
        );
        Ok(())
    }

    /// Moves one task to `target_index` in the full manual order.
    ///
    /// Indexes past the end clamp to the last position.
    pub fn move_task(&self, id: TaskId, target_index: usize) -> TaskServiceResult<()> {
        let mut full_order = self.manual_order()?;
        let current_index = full_order
            .iter()
            .position(|candidate| *candidate == id)
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        full_order.remove(current_index);
        let target_index = target_index.min(full_order.len());
        full_order.insert(target_index, id);

        self.repo.set_order(&full_order)?;
        info!(
            "event=task_move module=service status=ok task_id={id} from={current_index} to={target_index}"
        );
        Ok(())
    }

    pub fn counts(&self, now_ms: i64) -> TaskServiceResult<TaskCounts> {
        Ok(self.repo.counts(now_ms)?)
    }

    fn manual_order(&self) -> TaskServiceResult<Vec<TaskId>> {
        Ok(self
            .repo
            .list_tasks(&TaskQuery::default())?
            .into_iter()
            .map(|task| task.id)
            .collect())
    }

    fn require(&self, id: TaskId) -> TaskServiceResult<Task> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    fn read_back(&self, id: TaskId, details: &'static str) -> TaskServiceResult<Task> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::InconsistentState(details))
    }
}

/// Trims a title and rejects blank input.
pub fn normalize_title(raw: &str) -> TaskServiceResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}

/// Trims a description; blank input becomes `None`.
pub fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{normalize_description, normalize_title, TaskServiceError};

    #[test]
    fn normalize_title_trims_and_rejects_blank() {
        assert_eq!(normalize_title("  Call mom ").unwrap(), "Call mom");
        assert!(matches!(
            normalize_title(" \t"),
            Err(TaskServiceError::InvalidTitle)
        ));
    }

    #[test]
    fn blank_description_becomes_none() {
        assert_eq!(normalize_description(Some("   ".to_string())), None);
        assert_eq!(
            normalize_description(Some(" notes ".to_string())).as_deref(),
            Some("notes")
        );
    }
}
