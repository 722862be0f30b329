//! Side-effect descriptors
//!
//! The reducer never performs I/O. When a transition needs storage work it
//! returns one of these data-only instructions and the store's effect
//! runner carries it out after the commit.

/// An external operation requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Read all tasks from storage; completion dispatches `TasksLoaded`.
    LoadTasks,

    /// Extension point for a future bulk write. Accepted with no observable
    /// effect — per-operation storage calls are the canonical write path.
    SaveTasks,

    /// Persist the completion flip for one task; storage stamps the
    /// authoritative `modified_at`.
    ToggleCompletion { task_id: i64 },
}
