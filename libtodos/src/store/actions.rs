//! Actions for the state engine
//!
//! All state transitions are described by actions. Variants are immutable
//! data; the reducer (see `reducer.rs`) decides what they mean. Constructing
//! an action validates shape only — business rules such as title length
//! belong to the persistence layer.

use crate::types::{Task, TaskPatch};

/// Everything that can happen to application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // === Task edits ===
    /// Append a draft task. Ids are assigned by storage, so the draft keeps
    /// `id: None` until the next load delivers the persisted row.
    AddTask(Task),

    /// Merge fields into the task with the given id.
    UpdateTask { task_id: i64, fields: TaskPatch },

    /// Remove the task with the given id.
    DeleteTask(i64),

    /// Flip completion on the task with the given id.
    ToggleCompletion(i64),

    // === Selection & appearance ===
    /// Change the selected task; `None` clears the selection.
    SelectTask(Option<i64>),

    /// Switch the color theme.
    SetTheme(String),

    // === Loading ===
    /// Start a reload from storage.
    LoadTasks,

    /// A reload finished; replace the task list.
    TasksLoaded(Vec<Task>),

    // === Failures ===
    /// A storage operation failed; the message is surfaced through
    /// `AppState.error`.
    StorageFailed(String),
}
