//! Create/edit form view-model.

use crate::model::task::{Priority, Task, TaskId};
use crate::repo::task_repo::TaskRepository;
use crate::service::task_service::{
    NewTask, TaskPatch, TaskService, TaskServiceError, TaskServiceResult,
};

/// Form state for creating a task or editing an existing one.
pub struct TaskEditorViewModel<R: TaskRepository> {
    service: TaskService<R>,
    editing: Option<TaskId>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<i64>,
    pub is_completed: bool,
}

impl<R: TaskRepository> TaskEditorViewModel<R> {
    /// Empty form for the create-task flow.
    pub fn for_new(service: TaskService<R>) -> Self {
        Self {
            service,
            editing: None,
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            due_date: None,
            is_completed: false,
        }
    }

    /// Form pre-filled from a stored task.
    pub fn for_existing(service: TaskService<R>, id: TaskId) -> TaskServiceResult<Self> {
        let task = service
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))?;
        Ok(Self {
            service,
            editing: Some(task.id),
            title: task.title,
            description: task.description.unwrap_or_default(),
            priority: task.priority,
            due_date: task.due_date,
            is_completed: task.is_completed,
        })
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Save is enabled only for a non-blank title.
    pub fn is_valid(&self) -> bool {
        self.validation_message().is_none()
    }

    pub fn validation_message(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            Some("Title is required")
        } else {
            None
        }
    }

    /// Creates or updates the task and returns the stored result.
    pub fn save(&mut self) -> TaskServiceResult<Task> {
        if !self.is_valid() {
            return Err(TaskServiceError::InvalidTitle);
        }

        let description = Some(self.description.clone());
        let saved = match self.editing {
            None => self.service.create_task(NewTask {
                title: self.title.clone(),
                description,
                priority: self.priority,
                due_date: self.due_date,
                is_completed: self.is_completed,
            })?,
            Some(id) => self.service.update_task(
                id,
                TaskPatch {
                    title: Some(self.title.clone()),
                    description: Some(description),
                    priority: Some(self.priority),
                    due_date: Some(self.due_date),
                    is_completed: Some(self.is_completed),
                },
            )?,
        };

        // Saving again from the same form edits the created task.
        self.editing = Some(saved.id);
        Ok(saved)
    }
}
