//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskflow_core` linkage.
//! - Report the configured database and its task counts.

use std::process::ExitCode;
use taskflow_core::db::open_db;
use taskflow_core::{now_epoch_ms, AppConfig, SqliteTaskRepository, TaskRepository};

fn main() -> ExitCode {
    println!("taskflow_core ping={}", taskflow_core::ping());
    println!("taskflow_core version={}", taskflow_core::core_version());

    let config = AppConfig::from_env();
    println!("taskflow db_path={}", config.db_path.display());

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("taskflow db_open failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let counts = match SqliteTaskRepository::try_new(&conn)
        .and_then(|repo| repo.counts(now_epoch_ms()))
    {
        Ok(counts) => counts,
        Err(err) => {
            eprintln!("taskflow counts failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "taskflow tasks total={} active={} completed={} overdue={}",
        counts.total, counts.active, counts.completed, counts.overdue
    );
    ExitCode::SUCCESS
}
