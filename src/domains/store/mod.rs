//! Storage backing the handlers.

mod tasks;

pub use tasks::{NewTask, TaskFilter, TaskPatch, TaskStore};
