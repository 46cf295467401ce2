//! Core use-case services.
//!
//! # Responsibility
//! - Wrap repository calls into one method per use case.
//! - Keep view-models and the FFI layer decoupled from storage details.

pub mod settings_service;
pub mod task_service;
