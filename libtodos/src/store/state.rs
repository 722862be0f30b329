//! Application state
//!
//! A single immutable snapshot of everything consumers can render. State
//! values never change in place; each transition produces a new value and
//! the previous one survives only for the change notification.

use crate::config::DEFAULT_THEME;
use crate::types::Task;

/// Root application state.
///
/// If `current_task_id` is set it should reference a task present in
/// `tasks`; the reducer clears it when the referent disappears. The task
/// list is a cache of storage, only as fresh as the last completed load.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Tasks in listing order.
    pub tasks: Vec<Task>,

    /// Selected task, if any.
    pub current_task_id: Option<i64>,

    /// Active theme identifier.
    pub theme: String,

    /// A load is in flight.
    pub loading: bool,

    /// Last surfaced failure, if any. The only failure channel consumers
    /// see.
    pub error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected task, when the selection references a loaded task.
    pub fn current_task(&self) -> Option<&Task> {
        self.current_task_id
            .and_then(|id| self.tasks.iter().find(|t| t.id == Some(id)))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            current_task_id: None,
            theme: DEFAULT_THEME.to_string(),
            loading: false,
            error: None,
        }
    }
}
