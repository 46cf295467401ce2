//! Domain model for tasks, list queries, and preferences.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep filter/sort semantics storage-independent.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is a hard delete in storage; undo lives in the view-model.

pub mod preferences;
pub mod query;
pub mod task;
