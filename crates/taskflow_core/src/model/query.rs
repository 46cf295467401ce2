//! Filter and sort predicates over tasks.
//!
//! # Responsibility
//! - Describe list queries independently of storage.
//! - Evaluate the same predicates in memory for view-model recomputation.
//!
//! # Invariants
//! - In-memory evaluation yields the same rows and order as the SQL
//!   translation in `repo::task_repo`.
//! - Every sort is total: ties break on `order ASC, created_at ASC, id ASC`.
//! - Tasks without a due date sort last for `DueDate` in both directions.
//! - Text matching is ASCII case-insensitive, matching SQLite `lower()`.

use crate::model::task::{Priority, Task, DAY_MS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Which tasks a list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
    Overdue,
    DueToday,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 5] = [
        TaskFilter::All,
        TaskFilter::Active,
        TaskFilter::Completed,
        TaskFilter::Overdue,
        TaskFilter::DueToday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::DueToday => "due_today",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == value.trim().to_ascii_lowercase())
    }
}

/// Primary sort key for task lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSortField {
    /// User-defined `order`.
    #[default]
    Manual,
    CreatedAt,
    DueDate,
    Priority,
    Title,
}

impl TaskSortField {
    pub const ALL: [TaskSortField; 5] = [
        TaskSortField::Manual,
        TaskSortField::CreatedAt,
        TaskSortField::DueDate,
        TaskSortField::Priority,
        TaskSortField::Title,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::CreatedAt => "created_at",
            Self::DueDate => "due_date",
            Self::Priority => "priority",
            Self::Title => "title",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == value.trim().to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// Sort specification: primary field plus direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSort {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

impl TaskSort {
    pub fn new(field: TaskSortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// True when list position equals the persisted manual order.
    pub fn is_manual(&self) -> bool {
        self.field == TaskSortField::Manual && self.direction == SortDirection::Ascending
    }

    /// Total order over tasks for this sort.
    pub fn compare(&self, left: &Task, right: &Task) -> Ordering {
        let primary = match self.field {
            TaskSortField::Manual => self.directed(left.order.cmp(&right.order)),
            TaskSortField::CreatedAt => self.directed(left.created_at.cmp(&right.created_at)),
            TaskSortField::Priority => {
                self.directed(left.priority.rank().cmp(&right.priority.rank()))
            }
            TaskSortField::Title => self.directed(
                left.title
                    .to_ascii_lowercase()
                    .cmp(&right.title.to_ascii_lowercase()),
            ),
            TaskSortField::DueDate => match (left.due_date, right.due_date) {
                (Some(a), Some(b)) => self.directed(a.cmp(&b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        primary
            .then_with(|| left.order.cmp(&right.order))
            .then_with(|| left.created_at.cmp(&right.created_at))
            .then_with(|| left.id.cmp(&right.id))
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Full list query: filter predicates, sort, and pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub priority: Option<Priority>,
    /// Normalized search needle, see `normalize_search`.
    pub search: Option<String>,
    pub sort: TaskSort,
    /// Reference time for `Overdue`.
    pub now_ms: i64,
    /// Start of the caller's local day for `DueToday`.
    ///
    /// Falls back to the UTC day containing `now_ms` when unset.
    pub day_start_ms: Option<i64>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            filter: TaskFilter::All,
            priority: None,
            search: None,
            sort: TaskSort::default(),
            now_ms: crate::model::task::now_epoch_ms(),
            day_start_ms: None,
            limit: None,
            offset: 0,
        }
    }
}

impl TaskQuery {
    /// Query with the given filter and defaults elsewhere.
    pub fn with_filter(filter: TaskFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Effective day window start for `DueToday`.
    pub fn effective_day_start(&self) -> i64 {
        self.day_start_ms
            .unwrap_or_else(|| self.now_ms - self.now_ms.rem_euclid(DAY_MS))
    }

    /// Whether one task passes every predicate of this query.
    pub fn matches(&self, task: &Task) -> bool {
        let filter_ok = match self.filter {
            TaskFilter::All => true,
            TaskFilter::Active => !task.is_completed,
            TaskFilter::Completed => task.is_completed,
            TaskFilter::Overdue => task.is_overdue(self.now_ms),
            TaskFilter::DueToday => task.is_due_within_day(self.effective_day_start()),
        };
        if !filter_ok {
            return false;
        }

        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }

        match self.search.as_deref() {
            Some(needle) => {
                task.title.to_ascii_lowercase().contains(needle)
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|text| text.to_ascii_lowercase().contains(needle))
            }
            None => true,
        }
    }
}

/// Per-state totals shown in list headers and badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl TaskCounts {
    /// Counts an in-memory task set.
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>, now_ms: i64) -> Self {
        tasks.into_iter().fold(Self::default(), |mut counts, task| {
            counts.total += 1;
            if task.is_completed {
                counts.completed += 1;
            } else {
                counts.active += 1;
            }
            if task.is_overdue(now_ms) {
                counts.overdue += 1;
            }
            counts
        })
    }
}

/// Applies filter, sort, and pagination to an in-memory task set.
pub fn apply_query(tasks: &[Task], query: &TaskQuery) -> Vec<Task> {
    let mut visible = tasks
        .iter()
        .filter(|task| query.matches(task))
        .cloned()
        .collect::<Vec<_>>();
    visible.sort_by(|left, right| query.sort.compare(left, right));

    let skipped = visible.into_iter().skip(query.offset as usize);
    match query.limit {
        Some(limit) => skipped.take(limit as usize).collect(),
        None => skipped.collect(),
    }
}

/// Normalizes free-text search input.
///
/// Trims, collapses inner whitespace, and lowercases ASCII. Blank input
/// yields `None`.
pub fn normalize_search(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_query, normalize_search, SortDirection, TaskQuery, TaskSort, TaskSortField};
    use crate::model::task::{Priority, Task};
    use std::cmp::Ordering;

    fn task(title: &str, order: i64) -> Task {
        let mut task = Task::new(title);
        task.order = order;
        task
    }

    #[test]
    fn normalize_search_collapses_whitespace_and_lowercases() {
        assert_eq!(normalize_search("  Buy \t MILK "), Some("buy milk".to_string()));
        assert_eq!(normalize_search(" \n "), None);
    }

    #[test]
    fn due_date_sort_keeps_undated_last_in_both_directions() {
        let mut dated = task("dated", 1);
        dated.due_date = Some(5);
        let undated = task("undated", 0);

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let sort = TaskSort::new(TaskSortField::DueDate, direction);
            assert_eq!(sort.compare(&dated, &undated), Ordering::Less);
        }
    }

    #[test]
    fn priority_descending_puts_high_first() {
        let mut low = task("low", 0);
        low.priority = Priority::Low;
        let mut high = task("high", 1);
        high.priority = Priority::High;

        let query = TaskQuery {
            sort: TaskSort::new(TaskSortField::Priority, SortDirection::Descending),
            ..TaskQuery::default()
        };
        let sorted = apply_query(&[low, high.clone()], &query);
        assert_eq!(sorted[0].id, high.id);
    }

    #[test]
    fn search_matches_description() {
        let mut item = task("groceries", 0);
        item.description = Some("Oat Milk and bread".to_string());

        let query = TaskQuery {
            search: normalize_search("milk"),
            ..TaskQuery::default()
        };
        assert!(query.matches(&item));
    }

    #[test]
    fn pagination_applies_after_sorting() {
        let tasks = vec![task("c", 2), task("a", 0), task("b", 1)];
        let query = TaskQuery {
            limit: Some(1),
            offset: 1,
            ..TaskQuery::default()
        };
        let page = apply_query(&tasks, &query);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "b");
    }
}
