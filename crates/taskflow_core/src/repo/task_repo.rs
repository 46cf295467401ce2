//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and reorder APIs over the `tasks` table.
//! - Translate `TaskQuery` filter/sort predicates into SQL with bound values.
//! - Map rows back to the `Task` domain struct.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Delete is a hard delete; there is no tombstone column.
//! - `list_tasks` order equals `model::query::apply_query` order.

use crate::db::DbError;
use crate::model::query::{SortDirection, TaskCounts, TaskFilter, TaskQuery, TaskSortField};
use crate::model::task::{Priority, Task, TaskId, TaskValidationError, DAY_MS};
use crate::repo::ensure_schema_ready;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    priority,
    due_date,
    is_completed,
    created_at,
    sort_order
FROM tasks";

const TASK_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "priority",
    "due_date",
    "is_completed",
    "created_at",
    "sort_order",
    "updated_at",
];

// Tiebreak keeping every ORDER BY total.
const TIEBREAK_SQL: &str = "sort_order ASC, created_at ASC, id ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task and settings persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "repository requires column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access abstraction over the task store.
pub trait TaskRepository {
    /// Inserts a new task.
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Replaces every mutable field. `id` and `created_at` are kept.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>>;
    /// Removes the row permanently.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Removes every completed task and returns how many were removed.
    fn delete_completed(&self) -> RepoResult<usize>;
    /// Rewrites `order` of `ordered_ids` to `0..n` in one transaction.
    fn set_order(&self, ordered_ids: &[TaskId]) -> RepoResult<()>;
    /// Order value that places a new task after every existing one.
    fn next_order(&self) -> RepoResult<i64>;
    fn counts(&self, now_ms: i64) -> RepoResult<TaskCounts>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates a repository from a migrated connection.
    ///
    /// # Errors
    /// - Schema version or `tasks` shape does not match this build.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, "tasks", TASK_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                title,
                description,
                priority,
                due_date,
                is_completed,
                created_at,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.priority.as_str(),
                task.due_date,
                task.is_completed,
                task.created_at,
                task.order,
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                priority = ?3,
                due_date = ?4,
                is_completed = ?5,
                sort_order = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?7;",
            params![
                task.title.as_str(),
                task.description.as_deref(),
                task.priority.as_str(),
                task.due_date,
                task.is_completed,
                task.order,
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>> {
        let (sql, bind_values) = build_list_sql(query);
        debug!(
            "event=task_list module=repo filter={} sort={} direction={} binds={}",
            query.filter.as_str(),
            query.sort.field.as_str(),
            query.sort.direction.as_str(),
            bind_values.len()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_completed(&self) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM tasks WHERE is_completed = 1;", [])?;
        Ok(removed)
    }

    fn set_order(&self, ordered_ids: &[TaskId]) -> RepoResult<()> {
        // Dropping `tx` on an early return rolls back partial writes.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (index, id) in ordered_ids.iter().enumerate() {
            let changed = tx.execute(
                "UPDATE tasks
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), index as i64],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(*id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn next_order(&self) -> RepoResult<i64> {
        let next = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM tasks;",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    fn counts(&self, now_ms: i64) -> RepoResult<TaskCounts> {
        let counts = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(is_completed = 0), 0),
                COALESCE(SUM(is_completed = 1), 0),
                COALESCE(SUM(is_completed = 0 AND due_date IS NOT NULL AND due_date < ?1), 0)
             FROM tasks;",
            [now_ms],
            |row| {
                Ok(TaskCounts {
                    total: row.get::<_, i64>(0)? as usize,
                    active: row.get::<_, i64>(1)? as usize,
                    completed: row.get::<_, i64>(2)? as usize,
                    overdue: row.get::<_, i64>(3)? as usize,
                })
            },
        )?;
        Ok(counts)
    }
}

/// Builds the list statement and its positional bind values.
fn build_list_sql(query: &TaskQuery) -> (String, Vec<Value>) {
    let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    match query.filter {
        TaskFilter::All => {}
        TaskFilter::Active => sql.push_str(" AND is_completed = 0"),
        TaskFilter::Completed => sql.push_str(" AND is_completed = 1"),
        TaskFilter::Overdue => {
            sql.push_str(" AND is_completed = 0 AND due_date IS NOT NULL AND due_date < ?");
            bind_values.push(Value::Integer(query.now_ms));
        }
        TaskFilter::DueToday => {
            let day_start = query.effective_day_start();
            sql.push_str(" AND is_completed = 0 AND due_date >= ? AND due_date < ?");
            bind_values.push(Value::Integer(day_start));
            bind_values.push(Value::Integer(day_start.saturating_add(DAY_MS)));
        }
    }

    if let Some(priority) = query.priority {
        sql.push_str(" AND priority = ?");
        bind_values.push(Value::Text(priority.as_str().to_string()));
    }

    if let Some(needle) = query.search.as_deref() {
        sql.push_str(
            " AND (instr(lower(title), ?) > 0 OR instr(lower(COALESCE(description, '')), ?) > 0)",
        );
        bind_values.push(Value::Text(needle.to_string()));
        bind_values.push(Value::Text(needle.to_string()));
    }

    let direction = match query.sort.direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    let primary = match query.sort.field {
        TaskSortField::Manual => format!("sort_order {direction}"),
        TaskSortField::CreatedAt => format!("created_at {direction}"),
        TaskSortField::DueDate => format!("due_date IS NULL ASC, due_date {direction}"),
        TaskSortField::Priority => format!(
            "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END {direction}"
        ),
        TaskSortField::Title => format!("lower(title) {direction}"),
    };
    sql.push_str(&format!(" ORDER BY {primary}, {TIEBREAK_SQL}"));

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }
    } else if query.offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.offset)));
    }

    (sql, bind_values)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{id_text}` in tasks.id")))?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in tasks.priority"
        ))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    let task = Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        due_date: row.get("due_date")?,
        is_completed,
        created_at: row.get("created_at")?,
        order: row.get("sort_order")?,
    };
    task.validate()?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::build_list_sql;
    use crate::model::query::{SortDirection, TaskFilter, TaskQuery, TaskSort, TaskSortField};
    use crate::model::task::Priority;

    #[test]
    fn all_filter_without_search_binds_nothing() {
        let (sql, binds) = build_list_sql(&TaskQuery::default());
        assert!(binds.is_empty());
        assert!(sql.ends_with("ORDER BY sort_order ASC, sort_order ASC, created_at ASC, id ASC"));
    }

    #[test]
    fn combined_predicates_bind_in_placeholder_order() {
        let query = TaskQuery {
            filter: TaskFilter::DueToday,
            priority: Some(Priority::High),
            search: Some("milk".to_string()),
            sort: TaskSort::new(TaskSortField::DueDate, SortDirection::Descending),
            now_ms: 0,
            day_start_ms: Some(1_000),
            limit: Some(5),
            offset: 2,
        };
        let (sql, binds) = build_list_sql(&query);
        assert_eq!(sql.matches('?').count(), binds.len());
        assert_eq!(binds.len(), 7);
        assert!(sql.contains("due_date IS NULL ASC, due_date DESC"));
    }
}
