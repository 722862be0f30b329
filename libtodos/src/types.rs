//! Core types for the todos engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PROJECT;

/// A todo item.
///
/// Tasks are owned by the persistence layer; the engine holds them by value.
/// `id` and `project_id` are row ids assigned on insert and stay `None` on
/// drafts that have not been persisted yet. Equality is structural, which is
/// what change detection in bindings relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    /// Unix timestamp (seconds).
    pub created_at: i64,
    /// Unix timestamp (seconds). Authoritative writes happen in storage;
    /// the reducer never fabricates this value.
    pub modified_at: i64,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<i64>,
    pub project_name: String,
}

impl Task {
    /// Create a draft task with default fields, ready to be persisted or
    /// appended optimistically via an AddTask action.
    pub fn new(title: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            completed: false,
            priority: Priority::Medium,
            created_at: now,
            modified_at: now,
            due_date: None,
            project_id: None,
            project_name: DEFAULT_PROJECT.to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project_name = project.into();
        self
    }
}

/// Task priority levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Get the lowercase string representation used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!(
                "Invalid priority: '{}'. Valid options: low, medium, high",
                s
            )),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields to merge into an existing task.
///
/// Absent fields are kept as-is. `due_date` is doubly optional so a patch can
/// distinguish "leave the due date alone" (`None`) from "clear it"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    /// New project name. The reducer applies the name optimistically;
    /// `project_id` stays untouched until storage resolves it and the next
    /// load delivers authoritative values.
    pub project: Option<String>,
}

impl TaskPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.project.is_none()
    }

    /// Return a copy of `task` with the patch fields merged in.
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut merged = task.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(priority) = self.priority {
            merged.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            merged.due_date = due_date;
        }
        if let Some(project) = &self.project {
            merged.project_name = project.clone();
        }
        merged
    }
}

/// A project grouping tasks. Every task belongs to exactly one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("Buy milk");
        assert_eq!(task.id, None);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date, None);
        assert_eq!(task.project_id, None);
        assert_eq!(task.project_name, DEFAULT_PROJECT);
        assert_eq!(task.created_at, task.modified_at);
    }

    #[test]
    fn test_task_builder_helpers() {
        let due = NaiveDate::from_ymd_opt(2025, 12, 24).unwrap();
        let task = Task::new("Ship release")
            .with_description("tag and publish")
            .with_priority(Priority::High)
            .with_due_date(due)
            .with_project("Work");
        assert_eq!(task.description, "tag and publish");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, Some(due));
        assert_eq!(task.project_name, "Work");
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!(Priority::from_str("low").unwrap(), Priority::Low);
        assert_eq!(Priority::from_str("MEDIUM").unwrap(), Priority::Medium);
        assert_eq!(Priority::from_str("High").unwrap(), Priority::High);
        assert!(Priority::from_str("urgent").is_err());
    }

    #[test]
    fn test_priority_display_round_trip() {
        for priority in [Priority::Low, Priority::Medium, Priority::High] {
            let parsed = Priority::from_str(&priority.to_string()).unwrap();
            assert_eq!(parsed, priority);
        }
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let task = Task::new("unchanged").with_priority(Priority::Low);
        let patch = TaskPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.apply_to(&task), task);
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let due = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let task = Task::new("Old title")
            .with_description("old description")
            .with_due_date(due);
        let patch = TaskPatch {
            title: Some("New title".to_string()),
            priority: Some(Priority::High),
            ..Default::default()
        };
        let merged = patch.apply_to(&task);
        assert_eq!(merged.title, "New title");
        assert_eq!(merged.priority, Priority::High);
        // Untouched fields keep their values.
        assert_eq!(merged.description, "old description");
        assert_eq!(merged.due_date, Some(due));
        assert_eq!(merged.created_at, task.created_at);
        assert_eq!(merged.modified_at, task.modified_at);
    }

    #[test]
    fn test_patch_clears_due_date_explicitly() {
        let due = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let task = Task::new("Dated").with_due_date(due);

        let keep = TaskPatch::default();
        assert_eq!(keep.apply_to(&task).due_date, Some(due));

        let clear = TaskPatch {
            due_date: Some(None),
            ..Default::default()
        };
        assert_eq!(clear.apply_to(&task).due_date, None);
    }

    #[test]
    fn test_task_serde_round_trip() {
        let task = Task::new("Serialize me")
            .with_priority(Priority::Low)
            .with_due_date(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"priority\":\"low\""));
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
