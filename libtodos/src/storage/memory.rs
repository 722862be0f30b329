//! In-memory persistence backend
//!
//! Implements the same contract and validation as the SQLite backend on a
//! mutex-guarded vec. Compiled into the library (not test-gated) so
//! integration tests and headless embedders can use it; failure injection
//! lets store tests drive error paths without a database.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::config::DEFAULT_PROJECT;
use crate::error::{NotFoundError, PersistenceError, Result};
use crate::storage::{validate_fields, TaskFilter, TaskStore};
use crate::types::{Project, Task, TaskPatch};

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    next_task_id: i64,
    next_project_id: i64,
    load_calls: usize,
    toggle_calls: usize,
}

/// Ephemeral [`TaskStore`] with configurable failures.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_load: Option<String>,
    fail_toggle: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let inner = Inner {
            tasks: Vec::new(),
            projects: vec![Project {
                id: 1,
                name: DEFAULT_PROJECT.to_string(),
            }],
            next_task_id: 1,
            next_project_id: 2,
            load_calls: 0,
            toggle_calls: 0,
        };
        Self {
            inner: Mutex::new(inner),
            fail_load: None,
            fail_toggle: None,
        }
    }

    /// Seed the store with tasks. Missing ids are assigned, and any project
    /// name the tasks reference is registered.
    pub fn with_tasks(self, tasks: Vec<Task>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            for mut task in tasks {
                if task.id.is_none() {
                    task.id = Some(inner.next_task_id);
                    inner.next_task_id += 1;
                } else if let Some(id) = task.id {
                    inner.next_task_id = inner.next_task_id.max(id + 1);
                }
                let project_id = find_or_add_project(&mut inner, &task.project_name);
                task.project_id = Some(project_id);
                inner.tasks.push(task);
            }
        }
        self
    }

    /// Make every `load` fail with the given message.
    pub fn with_load_error(mut self, message: &str) -> Self {
        self.fail_load = Some(message.to_string());
        self
    }

    /// Make every `toggle_completion` fail with the given message.
    pub fn with_toggle_error(mut self, message: &str) -> Self {
        self.fail_toggle = Some(message.to_string());
        self
    }

    /// Number of times `load` was called (for test assertions).
    pub fn load_call_count(&self) -> usize {
        self.inner.lock().unwrap().load_calls
    }

    /// Number of times `toggle_completion` was called (for test assertions).
    pub fn toggle_call_count(&self) -> usize {
        self.inner.lock().unwrap().toggle_calls
    }

    fn storage_failure(message: &str) -> crate::error::TodosError {
        let io = std::io::Error::new(std::io::ErrorKind::Other, message.to_string());
        PersistenceError::IoError(io).into()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn find_or_add_project(inner: &mut Inner, name: &str) -> i64 {
    if let Some(project) = inner.projects.iter().find(|p| p.name == name) {
        return project.id;
    }
    let id = inner.next_project_id;
    inner.next_project_id += 1;
    inner.projects.push(Project {
        id,
        name: name.to_string(),
    });
    id
}

/// Same ordering as the SQLite backend: incomplete first, then due date
/// (absent dates first), then creation time.
fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| (t.completed, t.due_date, t.created_at));
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Task>> {
        let mut inner = self.inner.lock().unwrap();
        inner.load_calls += 1;
        if let Some(message) = &self.fail_load {
            return Err(Self::storage_failure(message));
        }
        let mut tasks = inner.tasks.clone();
        sort_for_listing(&mut tasks);
        Ok(tasks)
    }

    async fn add_task(&self, draft: &Task) -> Result<Task> {
        let title = draft.title.trim().to_string();
        let description = draft.description.trim().to_string();
        validate_fields(&title, &description)?;

        let mut inner = self.inner.lock().unwrap();
        let project_id = inner
            .projects
            .iter()
            .find(|p| p.name == draft.project_name)
            .map(|p| p.id)
            .ok_or_else(|| NotFoundError::Project(draft.project_name.clone()))?;

        let now = chrono::Utc::now().timestamp();
        let task = Task {
            id: Some(inner.next_task_id),
            title,
            description,
            completed: false,
            priority: draft.priority,
            created_at: now,
            modified_at: now,
            due_date: draft.due_date,
            project_id: Some(project_id),
            project_name: draft.project_name.clone(),
        };
        inner.next_task_id += 1;
        inner.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> Result<Task> {
        let mut inner = self.inner.lock().unwrap();

        let position = inner
            .tasks
            .iter()
            .position(|t| t.id == Some(task_id))
            .ok_or(NotFoundError::Task(task_id))?;

        let mut merged = patch.apply_to(&inner.tasks[position]);
        merged.title = merged.title.trim().to_string();
        merged.description = merged.description.trim().to_string();
        validate_fields(&merged.title, &merged.description)?;

        if let Some(name) = &patch.project {
            let project_id = inner
                .projects
                .iter()
                .find(|p| p.name == *name)
                .map(|p| p.id)
                .ok_or_else(|| NotFoundError::Project(name.clone()))?;
            merged.project_id = Some(project_id);
        }
        merged.modified_at = chrono::Utc::now().timestamp();

        inner.tasks[position] = merged.clone();
        Ok(merged)
    }

    async fn delete_task(&self, task_id: i64) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != Some(task_id));
        Ok(inner.tasks.len() < before)
    }

    async fn toggle_completion(&self, task_id: i64) -> Result<Task> {
        let mut inner = self.inner.lock().unwrap();
        inner.toggle_calls += 1;
        if let Some(message) = &self.fail_toggle {
            return Err(Self::storage_failure(message));
        }

        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == Some(task_id))
            .ok_or(NotFoundError::Task(task_id))?;
        task.completed = !task.completed;
        task.modified_at = chrono::Utc::now().timestamp();
        Ok(task.clone())
    }

    async fn get_task(&self, task_id: i64) -> Result<Task> {
        let inner = self.inner.lock().unwrap();
        inner
            .tasks
            .iter()
            .find(|t| t.id == Some(task_id))
            .cloned()
            .ok_or_else(|| NotFoundError::Task(task_id).into())
    }

    async fn search_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let inner = self.inner.lock().unwrap();
        let needle = filter.text.as_ref().map(|t| t.to_lowercase());

        let mut matches: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|task| {
                let text_ok = match &needle {
                    Some(needle) => {
                        task.title.to_lowercase().contains(needle)
                            || task.description.to_lowercase().contains(needle)
                    }
                    None => true,
                };
                let priority_ok = filter.priority.map_or(true, |p| task.priority == p);
                let completed_ok = filter.completed.map_or(true, |c| task.completed == c);
                text_ok && priority_ok && completed_ok
            })
            .cloned()
            .collect();

        sort_for_listing(&mut matches);
        Ok(matches)
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        let mut projects = self.inner.lock().unwrap().projects.clone();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn add_project(&self, name: &str) -> Result<Project> {
        let mut inner = self.inner.lock().unwrap();
        let id = find_or_add_project(&mut inner, name);
        Ok(Project {
            id,
            name: name.to_string(),
        })
    }
}
