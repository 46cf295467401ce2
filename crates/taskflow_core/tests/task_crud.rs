use rusqlite::Connection;
use taskflow_core::db::migrations::latest_version;
use taskflow_core::db::open_db_in_memory;
use taskflow_core::{
    Priority, RepoError, SqliteTaskRepository, Task, TaskCounts, TaskFilter, TaskQuery,
    TaskRepository,
};
use uuid::Uuid;

#[test]
fn create_then_fetch_returns_equal_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut task = Task::new("renew passport");
    task.description = Some("bring two photos".to_string());
    task.priority = Priority::High;
    task.due_date = Some(1_700_000_000_000);
    task.order = 7;
    let id = repo.create_task(&task).unwrap();

    let loaded = repo.get_task(id).unwrap().unwrap();
    assert_eq!(loaded, task);
}

#[test]
fn update_existing_task() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut task = Task::new("draft");
    repo.create_task(&task).unwrap();

    task.title = "final".to_string();
    task.priority = Priority::Low;
    task.is_completed = true;
    task.due_date = Some(42);
    repo.update_task(&task).unwrap();

    let loaded = repo.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded.title, "final");
    assert_eq!(loaded.priority, Priority::Low);
    assert!(loaded.is_completed);
    assert_eq!(loaded.due_date, Some(42));
    assert_eq!(loaded.created_at, task.created_at);
}

#[test]
fn update_never_rewrites_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::with_id(Uuid::new_v4(), "quarterly taxes", 1_000).unwrap();
    repo.create_task(&task).unwrap();

    let mut edited = task.clone();
    edited.title = "quarterly taxes (filed)".to_string();
    edited.created_at = 9_999_999;
    repo.update_task(&edited).unwrap();

    let loaded = repo.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded.title, "quarterly taxes (filed)");
    assert_eq!(loaded.created_at, 1_000);
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::new("missing");
    let err = repo.update_task(&task).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == task.id));
}

#[test]
fn delete_then_fetch_returns_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::new("temporary");
    repo.create_task(&task).unwrap();
    repo.delete_task(task.id).unwrap();

    assert!(repo.get_task(task.id).unwrap().is_none());
    assert!(repo.list_tasks(&TaskQuery::default()).unwrap().is_empty());

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0, "delete must remove the row, not tombstone it");
}

#[test]
fn delete_missing_task_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let id = Uuid::new_v4();
    let err = repo.delete_task(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let blank = Task::new("  ");
    let create_err = repo.create_task(&blank).unwrap_err();
    assert!(matches!(create_err, RepoError::Validation(_)));

    let mut valid = Task::new("valid");
    repo.create_task(&valid).unwrap();
    valid.title = String::new();
    let update_err = repo.update_task(&valid).unwrap_err();
    assert!(matches!(update_err, RepoError::Validation(_)));
}

#[test]
fn reorder_updates_order_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let tasks = ["a", "b", "c"]
        .iter()
        .enumerate()
        .map(|(index, title)| {
            let mut task = Task::new(*title);
            task.order = index as i64 * 10;
            repo.create_task(&task).unwrap();
            task
        })
        .collect::<Vec<_>>();

    repo.set_order(&[tasks[2].id, tasks[0].id, tasks[1].id])
        .unwrap();

    assert_eq!(repo.get_task(tasks[2].id).unwrap().unwrap().order, 0);
    assert_eq!(repo.get_task(tasks[0].id).unwrap().unwrap().order, 1);
    assert_eq!(repo.get_task(tasks[1].id).unwrap().unwrap().order, 2);
}

#[test]
fn reorder_with_unknown_id_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut first = Task::new("first");
    first.order = 5;
    repo.create_task(&first).unwrap();

    let unknown = Uuid::new_v4();
    let err = repo.set_order(&[first.id, unknown]).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == unknown));
    assert_eq!(repo.get_task(first.id).unwrap().unwrap().order, 5);
}

#[test]
fn next_order_follows_max_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert_eq!(repo.next_order().unwrap(), 0);

    let mut task = Task::new("gap");
    task.order = 9;
    repo.create_task(&task).unwrap();
    assert_eq!(repo.next_order().unwrap(), 10);
}

#[test]
fn delete_completed_keeps_open_tasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let open = Task::new("open");
    let mut done = Task::new("done");
    done.is_completed = true;
    repo.create_task(&open).unwrap();
    repo.create_task(&done).unwrap();

    assert_eq!(repo.delete_completed().unwrap(), 1);
    let remaining = repo.list_tasks(&TaskQuery::default()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, open.id);
}

#[test]
fn counts_split_by_state() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert_eq!(repo.counts(0).unwrap(), TaskCounts::default());

    let mut overdue = Task::new("overdue");
    overdue.due_date = Some(100);
    let mut done_late = Task::new("done late");
    done_late.due_date = Some(100);
    done_late.is_completed = true;
    let open = Task::new("open");
    for task in [&overdue, &done_late, &open] {
        repo.create_task(task).unwrap();
    }

    let counts = repo.counts(200).unwrap();
    assert_eq!(
        counts,
        TaskCounts {
            total: 3,
            active: 2,
            completed: 1,
            overdue: 1,
        }
    );
}

#[test]
fn list_filters_completed_and_active() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let open = Task::new("open");
    let mut done = Task::new("done");
    done.is_completed = true;
    repo.create_task(&open).unwrap();
    repo.create_task(&done).unwrap();

    let active = repo
        .list_tasks(&TaskQuery::with_filter(TaskFilter::Active))
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, open.id);

    let completed = repo
        .list_tasks(&TaskQuery::with_filter(TaskFilter::Completed))
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, done.id);
}

#[test]
fn list_pagination_with_limit_and_offset_is_stable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let a = task_with_fixed_id("00000000-0000-4000-8000-000000000001", "a");
    let b = task_with_fixed_id("00000000-0000-4000-8000-000000000002", "b");
    let c = task_with_fixed_id("00000000-0000-4000-8000-000000000003", "c");
    repo.create_task(&c).unwrap();
    repo.create_task(&a).unwrap();
    repo.create_task(&b).unwrap();

    let query = TaskQuery {
        limit: Some(2),
        offset: 1,
        ..TaskQuery::default()
    };
    let page = repo.list_tasks(&query).unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, b.id);
    assert_eq!(page[1].id, c.id);

    let offset_only = TaskQuery {
        offset: 2,
        ..TaskQuery::default()
    };
    let tail = repo.list_tasks(&offset_only).unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].id, c.id);
}

#[test]
fn read_rejects_invalid_persisted_priority() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::new("valid at write");
    repo.create_task(&task).unwrap();
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         UPDATE tasks SET priority = 'urgent';",
    )
    .unwrap();

    let err = repo.get_task(task.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("urgent")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTaskRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_tasks_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTaskRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("tasks"))));
}

#[test]
fn repository_rejects_tasks_table_missing_a_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            priority TEXT NOT NULL,
            due_date INTEGER,
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTaskRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "tasks",
            column: "sort_order"
        })
    ));
}

fn task_with_fixed_id(id: &str, title: &str) -> Task {
    Task::with_id(Uuid::parse_str(id).unwrap(), title, 1_000).unwrap()
}
