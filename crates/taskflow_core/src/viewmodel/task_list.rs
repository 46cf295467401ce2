//! Task list view-model.
//!
//! # Responsibility
//! - Mirror stored tasks and derive the visible list for the current
//!   filter × sort × search combination.
//! - Hold deletes in an in-memory undo window before the real delete.
//! - Turn use-case failures into a blocking alert.
//! - Publish a state snapshot to subscribers after every change.
//!
//! # Invariants
//! - Filter, sort, and search changes never touch the store.
//! - A task pending deletion is hidden from `visible` and from `counts`.
//! - A dropped subscriber receiver is pruned on the next publish.

use crate::model::query::{
    apply_query, normalize_search, TaskCounts, TaskFilter, TaskQuery, TaskSort,
};
use crate::model::task::{now_epoch_ms, Priority, Task, TaskId};
use crate::repo::task_repo::TaskRepository;
use crate::service::task_service::{NewTask, TaskService, TaskServiceError};
use crate::viewmodel::AlertMessage;
use log::{debug, warn};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

/// Snapshot rendered by the list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListState {
    pub visible: Vec<Task>,
    pub counts: TaskCounts,
    pub filter: TaskFilter,
    pub sort: TaskSort,
    pub priority: Option<Priority>,
    /// Raw search text as typed.
    pub search_text: String,
    /// Drag-to-reorder is offered only in manual order without search.
    pub can_reorder: bool,
    /// Ids hidden by the undo window, oldest first.
    pub pending_delete_ids: Vec<TaskId>,
    pub is_loaded: bool,
    pub alert: Option<AlertMessage>,
}

#[derive(Debug, Clone, Copy)]
struct PendingDelete {
    task_id: TaskId,
    deadline: Instant,
}

/// View-model behind the task list screen.
pub struct TaskListViewModel<R: TaskRepository> {
    service: TaskService<R>,
    tasks: Vec<Task>,
    filter: TaskFilter,
    sort: TaskSort,
    priority: Option<Priority>,
    search_text: String,
    day_start_ms: Option<i64>,
    pending: Vec<PendingDelete>,
    undo_window: Duration,
    is_loaded: bool,
    alert: Option<AlertMessage>,
    clock: fn() -> i64,
    state: TaskListState,
    subscribers: Vec<Sender<TaskListState>>,
}

impl<R: TaskRepository> TaskListViewModel<R> {
    pub fn new(service: TaskService<R>, undo_window: Duration) -> Self {
        Self {
            service,
            tasks: Vec::new(),
            filter: TaskFilter::default(),
            sort: TaskSort::default(),
            priority: None,
            search_text: String::new(),
            day_start_ms: None,
            pending: Vec::new(),
            undo_window,
            is_loaded: false,
            alert: None,
            clock: now_epoch_ms,
            state: TaskListState::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the wall clock used for overdue and due-today checks.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &TaskListState {
        &self.state
    }

    /// Registers an observer. The current state is delivered immediately.
    pub fn subscribe(&mut self) -> Receiver<TaskListState> {
        let (tx, rx) = channel();
        if tx.send(self.state.clone()).is_ok() {
            self.subscribers.push(tx);
        }
        rx
    }

    /// Fetches every task from the store.
    pub fn load(&mut self) {
        match self.service.fetch_tasks(&TaskQuery::default()) {
            Ok(tasks) => {
                self.tasks = tasks;
                self.is_loaded = true;
                self.pending
                    .retain(|entry| self.tasks.iter().any(|task| task.id == entry.task_id));
            }
            Err(err) => self.report("load tasks", err),
        }
        self.refresh();
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: TaskSort) {
        self.sort = sort;
        self.refresh();
    }

    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        self.priority = priority;
        self.refresh();
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.refresh();
    }

    /// Sets the start of the user's local day for the due-today filter.
    pub fn set_day_start(&mut self, day_start_ms: Option<i64>) {
        self.day_start_ms = day_start_ms;
        self.refresh();
    }

    /// Applies persisted list preferences.
    pub fn apply_list_preferences(&mut self, filter: TaskFilter, sort: TaskSort) {
        self.filter = filter;
        self.sort = sort;
        self.refresh();
    }

    /// Quick-add from the list's inline field.
    pub fn add_task(&mut self, title: impl Into<String>) -> Option<Task> {
        self.create_task(NewTask::titled(title))
    }

    pub fn create_task(&mut self, input: NewTask) -> Option<Task> {
        let created = match self.service.create_task(input) {
            Ok(task) => task,
            Err(err) => {
                self.report("create task", err);
                self.refresh();
                return None;
            }
        };
        self.tasks.push(created.clone());
        self.refresh();
        Some(created)
    }

    pub fn toggle_completion(&mut self, id: TaskId) {
        match self.service.toggle_completion(id) {
            Ok(task) => self.replace_cached(task),
            Err(err) => self.report("update task", err),
        }
        self.refresh();
    }

    /// Merges a task saved elsewhere (the editor) into the list.
    pub fn task_saved(&mut self, task: Task) {
        self.replace_cached(task);
        self.refresh();
    }

    /// Moves a visible row from `from` to `to` and persists the new order.
    ///
    /// Ignored when reordering is unavailable or `from` is out of range.
    pub fn move_task(&mut self, from: usize, to: usize) {
        if !self.state.can_reorder || from >= self.state.visible.len() {
            debug!(
                "event=task_move module=viewmodel status=skipped from={from} to={to} can_reorder={}",
                self.state.can_reorder
            );
            return;
        }

        let mut ids = self
            .state
            .visible
            .iter()
            .map(|task| task.id)
            .collect::<Vec<_>>();
        let moved = ids.remove(from);
        ids.insert(to.min(ids.len()), moved);

        match self.service.reorder_tasks(&ids) {
            Ok(()) => self.load(),
            Err(err) => {
                self.report("reorder tasks", err);
                self.refresh();
            }
        }
    }

    /// Hides a task and starts its undo window.
    pub fn stage_delete(&mut self, id: TaskId, now: Instant) {
        let known = self.tasks.iter().any(|task| task.id == id);
        let already_pending = self.pending.iter().any(|entry| entry.task_id == id);
        if !known || already_pending {
            return;
        }
        self.pending.push(PendingDelete {
            task_id: id,
            deadline: now + self.undo_window,
        });
        self.refresh();
    }

    /// Restores a task whose undo window is still open.
    ///
    /// Returns `false` when nothing was pending for `id`.
    pub fn undo_delete(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|entry| entry.task_id != id);
        let restored = self.pending.len() != before;
        if restored {
            self.refresh();
        }
        restored
    }

    /// Earliest undo deadline, for scheduling the next commit.
    pub fn next_delete_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|entry| entry.deadline).min()
    }

    /// Issues the real delete for every entry whose window has closed.
    pub fn commit_expired_deletions(&mut self, now: Instant) -> usize {
        let (expired, open): (Vec<_>, Vec<_>) = self
            .pending
            .iter()
            .copied()
            .partition(|entry| entry.deadline <= now);
        self.pending = open;
        self.commit(expired)
    }

    /// Deletes everything pending, regardless of deadline.
    pub fn commit_all_deletions(&mut self) -> usize {
        let all = std::mem::take(&mut self.pending);
        self.commit(all)
    }

    /// Removes every completed task from the store.
    pub fn clear_completed(&mut self) {
        match self.service.clear_completed() {
            Ok(_) => self.load(),
            Err(err) => {
                self.report("clear completed tasks", err);
                self.refresh();
            }
        }
    }

    pub fn dismiss_alert(&mut self) {
        if self.alert.take().is_some() {
            self.refresh();
        }
    }

    fn commit(&mut self, entries: Vec<PendingDelete>) -> usize {
        if entries.is_empty() {
            return 0;
        }
        let mut deleted = 0;
        for entry in entries {
            match self.service.delete_task(entry.task_id) {
                Ok(()) => {
                    deleted += 1;
                    self.tasks.retain(|task| task.id != entry.task_id);
                }
                // Already gone from the store; drop the stale row.
                Err(TaskServiceError::TaskNotFound(id)) => {
                    self.tasks.retain(|task| task.id != id);
                }
                Err(err) => self.report("delete task", err),
            }
        }
        self.refresh();
        deleted
    }

    fn replace_cached(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|cached| cached.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
    }

    fn report(&mut self, action: &str, err: TaskServiceError) {
        warn!("event=viewmodel_error module=viewmodel action=\"{action}\" error={err}");
        self.alert = Some(AlertMessage::failure(action, &err));
    }

    /// Recomputes derived state and notifies subscribers.
    fn refresh(&mut self) {
        let now_ms = (self.clock)();
        let search = normalize_search(&self.search_text);
        let live = self
            .tasks
            .iter()
            .filter(|task| !self.pending.iter().any(|entry| entry.task_id == task.id))
            .cloned()
            .collect::<Vec<_>>();

        let query = TaskQuery {
            filter: self.filter,
            priority: self.priority,
            search: search.clone(),
            sort: self.sort,
            now_ms,
            day_start_ms: self.day_start_ms,
            limit: None,
            offset: 0,
        };

        self.state = TaskListState {
            visible: apply_query(&live, &query),
            counts: TaskCounts::tally(&live, now_ms),
            filter: self.filter,
            sort: self.sort,
            priority: self.priority,
            search_text: self.search_text.clone(),
            can_reorder: self.sort.is_manual() && search.is_none(),
            pending_delete_ids: self.pending.iter().map(|entry| entry.task_id).collect(),
            is_loaded: self.is_loaded,
            alert: self.alert.clone(),
        };

        let snapshot = &self.state;
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
    }
}
