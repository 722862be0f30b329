//! Pure reducer for state transitions
//!
//! `(AppState, Action) -> (AppState, Option<Effect>)` with no side effects:
//! no I/O, no clocks, no storage calls. Anything external is returned as an
//! [`Effect`] descriptor for the store to run after the commit.
//!
//! The reducer is total. Every action yields a state; actions whose
//! referent is missing (deleting an unknown id, toggling an absent task)
//! leave the task list unchanged instead of failing.

use super::actions::Action;
use super::effect::Effect;
use super::state::AppState;
use crate::types::Task;

/// Compute the next state and an optional effect.
///
/// Timestamps are never fabricated here: a completion toggle flips the flag
/// and leaves `modified_at` for the storage backend to stamp during the
/// effect.
pub fn reduce(state: AppState, action: Action) -> (AppState, Option<Effect>) {
    match action {
        // === Task edits ===
        Action::AddTask(draft) => {
            let mut tasks = state.tasks.clone();
            tasks.push(draft);
            (AppState { tasks, ..state }, Some(Effect::SaveTasks))
        }

        Action::UpdateTask { task_id, fields } => {
            let tasks = state
                .tasks
                .iter()
                .map(|task| {
                    if task.id == Some(task_id) {
                        fields.apply_to(task)
                    } else {
                        task.clone()
                    }
                })
                .collect();
            (AppState { tasks, ..state }, Some(Effect::SaveTasks))
        }

        Action::DeleteTask(task_id) => {
            let tasks: Vec<Task> = state
                .tasks
                .iter()
                .filter(|task| task.id != Some(task_id))
                .cloned()
                .collect();
            let current_task_id = if state.current_task_id == Some(task_id) {
                None
            } else {
                state.current_task_id
            };
            (
                AppState {
                    tasks,
                    current_task_id,
                    ..state
                },
                Some(Effect::SaveTasks),
            )
        }

        Action::ToggleCompletion(task_id) => {
            let tasks = state
                .tasks
                .iter()
                .map(|task| {
                    if task.id == Some(task_id) {
                        let mut toggled = task.clone();
                        toggled.completed = !toggled.completed;
                        toggled
                    } else {
                        task.clone()
                    }
                })
                .collect();
            (
                AppState { tasks, ..state },
                Some(Effect::ToggleCompletion { task_id }),
            )
        }

        // === Selection & appearance ===
        Action::SelectTask(task_id) => (
            AppState {
                current_task_id: task_id,
                ..state
            },
            None,
        ),

        Action::SetTheme(theme) => (AppState { theme, ..state }, None),

        // === Loading ===
        Action::LoadTasks => (
            AppState {
                loading: true,
                error: None,
                ..state
            },
            Some(Effect::LoadTasks),
        ),

        Action::TasksLoaded(tasks) => {
            // Keep the selection when it survived the reload, otherwise
            // fall back to the first task, otherwise clear it.
            let current_task_id = match state.current_task_id {
                Some(id) if tasks.iter().any(|t| t.id == Some(id)) => Some(id),
                _ => tasks.first().and_then(|t| t.id),
            };
            (
                AppState {
                    tasks,
                    current_task_id,
                    loading: false,
                    error: None,
                    ..state
                },
                None,
            )
        }

        // === Failures ===
        Action::StorageFailed(message) => (
            AppState {
                error: Some(message),
                loading: false,
                ..state
            },
            None,
        ),
    }
}
