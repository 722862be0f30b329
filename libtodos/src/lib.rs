//! Todos - state-driven task management for the terminal
//!
//! This library provides the core of a todo application: a single-store
//! action/reducer loop, pluggable SQLite or in-memory persistence, and
//! bindings that connect slices of state to view updates.

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, TodosError};
pub use storage::{MemoryStore, SqliteStore, TaskFilter, TaskStore};
pub use store::{Action, AppState, Binding, Effect, Store, Subscription};
pub use types::{Priority, Project, Task, TaskPatch};
