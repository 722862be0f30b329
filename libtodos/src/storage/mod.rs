//! Persistence layer for tasks and projects
//!
//! The engine never talks to a concrete database; it talks to the
//! [`TaskStore`] trait. The store injects one implementation at construction
//! and the effect runner calls through it. Host applications use the same
//! trait for authoritative writes (add/update/delete) and then refresh engine
//! state with a LoadTasks dispatch.
//!
//! Two implementations ship with the crate:
//! - [`sqlite::SqliteStore`]: the canonical relational backend.
//! - [`memory::MemoryStore`]: an ephemeral backend with failure injection,
//!   used heavily in tests and available to headless embedders.

use async_trait::async_trait;

use crate::error::{Result, ValidationError};
use crate::types::{Priority, Project, Task, TaskPatch};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Longest accepted task title, in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Longest accepted task description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Filters for [`TaskStore::search_tasks`]. All fields are optional and
/// combine with AND; the default filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    /// Substring match against title or description.
    pub text: Option<String>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

/// Contract every persistence backend implements.
///
/// Backends own durable task data and all business validation. The reducer
/// stays total and never validates; anything rejected here surfaces as an
/// error for the caller (or, from the effect runner, as a dispatched
/// StorageFailed action).
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Load every task, incomplete first, then by due date and creation
    /// time.
    ///
    /// An empty backend yields `Ok(vec![])`; absence of data is never an
    /// error.
    async fn load(&self) -> Result<Vec<Task>>;

    /// Persist a draft task and return it with its assigned id.
    ///
    /// Title and description are trimmed before validation.
    ///
    /// # Errors
    ///
    /// `ValidationError` for an empty or oversized title/description,
    /// `NotFoundError::Project` when the draft names an unknown project.
    async fn add_task(&self, draft: &Task) -> Result<Task>;

    /// Merge `patch` into an existing task, stamp `modified_at`, persist,
    /// and return the updated task.
    ///
    /// # Errors
    ///
    /// `NotFoundError::Task` for an unknown id, `ValidationError` when the
    /// merged fields fail validation, `NotFoundError::Project` when the
    /// patch names an unknown project.
    async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> Result<Task>;

    /// Delete a task. Returns `false` for an unknown id rather than an
    /// error.
    async fn delete_task(&self, task_id: i64) -> Result<bool>;

    /// Flip a task's completion flag, stamp `modified_at`, and return the
    /// updated task. This is the authoritative timestamp write the reducer
    /// deliberately leaves to storage.
    ///
    /// # Errors
    ///
    /// `NotFoundError::Task` for an unknown id.
    async fn toggle_completion(&self, task_id: i64) -> Result<Task>;

    /// Fetch one task by id.
    ///
    /// # Errors
    ///
    /// `NotFoundError::Task` for an unknown id.
    async fn get_task(&self, task_id: i64) -> Result<Task>;

    /// Tasks matching `filter`, in the same order as [`TaskStore::load`].
    async fn search_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    /// All projects, ordered by name.
    async fn projects(&self) -> Result<Vec<Project>>;

    /// Create a project, or return the existing one when the name is
    /// already taken. Project names are unique.
    async fn add_project(&self, name: &str) -> Result<Project>;
}

/// Validate trimmed task fields against the shared limits.
pub(crate) fn validate_fields(
    title: &str,
    description: &str,
) -> std::result::Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH,
        });
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LENGTH,
        });
    }
    Ok(())
}
