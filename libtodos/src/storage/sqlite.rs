//! SQLite persistence backend
//!
//! The canonical relational backend: tasks joined with their project, unix
//! timestamps, `YYYY-MM-DD` due dates. The schema is created idempotently at
//! open and a default `Inbox` project is seeded, so a fresh path is usable
//! immediately.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::config::DEFAULT_PROJECT;
use crate::error::{NotFoundError, PersistenceError, Result};
use crate::storage::{validate_fields, TaskFilter, TaskStore};
use crate::types::{Priority, Project, Task, TaskPatch};

/// Storage format for due dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

const TASK_COLUMNS: &str = "tasks.id, tasks.title, tasks.description, tasks.completed, \
     tasks.priority, tasks.created_at, tasks.modified_at, tasks.due_date, \
     tasks.project_id, projects.name AS project_name";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and prepare the schema.
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(PersistenceError::IoError)?;
        }

        // Forward slashes keep the SQLite URL valid on Windows too;
        // mode=rwc creates the file when missing.
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(PersistenceError::SqlxError)?
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(PersistenceError::SqlxError)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create tables if they do not exist and seed the default project.
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(PersistenceError::SqlxError)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                completed BOOLEAN NOT NULL DEFAULT 0,
                priority TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                modified_at INTEGER NOT NULL,
                due_date TEXT,
                project_id INTEGER NOT NULL,
                FOREIGN KEY(project_id) REFERENCES projects(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(PersistenceError::SqlxError)?;

        sqlx::query("INSERT OR IGNORE INTO projects (name) VALUES (?)")
            .bind(DEFAULT_PROJECT)
            .execute(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        Ok(())
    }

    /// Look up a project id by name.
    async fn project_id(&self, name: &str) -> Result<i64> {
        let row = sqlx::query("SELECT id FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        match row {
            Some(row) => Ok(row.get("id")),
            None => Err(NotFoundError::Project(name.to_string()).into()),
        }
    }

    fn row_to_task(row: &SqliteRow) -> Task {
        Task {
            id: Some(row.get("id")),
            title: row.get("title"),
            description: row.get::<Option<String>, _>("description").unwrap_or_default(),
            completed: row.get("completed"),
            priority: row
                .get::<String, _>("priority")
                .parse()
                .unwrap_or(Priority::Medium),
            created_at: row.get("created_at"),
            modified_at: row.get("modified_at"),
            due_date: row
                .get::<Option<String>, _>("due_date")
                .and_then(|value| NaiveDate::parse_from_str(&value, DATE_FORMAT).ok()),
            project_id: Some(row.get("project_id")),
            project_name: row.get("project_name"),
        }
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn load(&self) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             JOIN projects ON tasks.project_id = projects.id \
             ORDER BY tasks.completed, tasks.due_date, tasks.created_at"
        );

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        Ok(rows.iter().map(Self::row_to_task).collect())
    }

    async fn add_task(&self, draft: &Task) -> Result<Task> {
        let title = draft.title.trim().to_string();
        let description = draft.description.trim().to_string();
        validate_fields(&title, &description)?;

        let project_id = self.project_id(&draft.project_name).await?;
        let now = chrono::Utc::now().timestamp();
        let due_date = draft.due_date.map(|d| d.format(DATE_FORMAT).to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO tasks (
                title, description, completed, priority,
                created_at, modified_at, due_date, project_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&title)
        .bind(&description)
        .bind(false)
        .bind(draft.priority.as_str())
        .bind(now)
        .bind(now)
        .bind(&due_date)
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map_err(PersistenceError::SqlxError)?;

        tracing::debug!(task_id = result.last_insert_rowid(), "task inserted");

        Ok(Task {
            id: Some(result.last_insert_rowid()),
            title,
            description,
            completed: false,
            priority: draft.priority,
            created_at: now,
            modified_at: now,
            due_date: draft.due_date,
            project_id: Some(project_id),
            project_name: draft.project_name.clone(),
        })
    }

    async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> Result<Task> {
        let current = self.get_task(task_id).await?;

        let mut merged = patch.apply_to(&current);
        merged.title = merged.title.trim().to_string();
        merged.description = merged.description.trim().to_string();
        validate_fields(&merged.title, &merged.description)?;

        // Only resolve the project when the patch actually moves the task.
        let new_project_id = match &patch.project {
            Some(name) if *name != current.project_name => Some(self.project_id(name).await?),
            _ => None,
        };

        merged.modified_at = chrono::Utc::now().timestamp();
        if let Some(project_id) = new_project_id {
            merged.project_id = Some(project_id);
        }
        let due_date = merged.due_date.map(|d| d.format(DATE_FORMAT).to_string());

        sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, due_date = ?, modified_at = ?,
                priority = ?, project_id = COALESCE(?, project_id)
            WHERE id = ?
            "#,
        )
        .bind(&merged.title)
        .bind(&merged.description)
        .bind(&due_date)
        .bind(merged.modified_at)
        .bind(merged.priority.as_str())
        .bind(new_project_id)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(PersistenceError::SqlxError)?;

        Ok(merged)
    }

    async fn delete_task(&self, task_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_completion(&self, task_id: i64) -> Result<Task> {
        let mut task = self.get_task(task_id).await?;
        task.completed = !task.completed;
        task.modified_at = chrono::Utc::now().timestamp();

        sqlx::query("UPDATE tasks SET completed = ?, modified_at = ? WHERE id = ?")
            .bind(task.completed)
            .bind(task.modified_at)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        Ok(task)
    }

    async fn get_task(&self, task_id: i64) -> Result<Task> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             JOIN projects ON tasks.project_id = projects.id \
             WHERE tasks.id = ?"
        );

        let row = sqlx::query(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        match row {
            Some(row) => Ok(Self::row_to_task(&row)),
            None => Err(NotFoundError::Task(task_id).into()),
        }
    }

    async fn search_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.text.is_some() {
            conditions.push("(tasks.title LIKE ? OR tasks.description LIKE ?)");
        }
        if filter.priority.is_some() {
            conditions.push("tasks.priority = ?");
        }
        if filter.completed.is_some() {
            conditions.push("tasks.completed = ?");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             JOIN projects ON tasks.project_id = projects.id \
             {where_clause} \
             ORDER BY tasks.completed, tasks.due_date, tasks.created_at"
        );

        let mut query = sqlx::query(&sql);
        if let Some(text) = &filter.text {
            let pattern = format!("%{}%", text);
            query = query.bind(pattern.clone()).bind(pattern);
        }
        if let Some(priority) = filter.priority {
            query = query.bind(priority.as_str());
        }
        if let Some(completed) = filter.completed {
            query = query.bind(completed);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        Ok(rows.iter().map(Self::row_to_task).collect())
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query("SELECT id, name FROM projects ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        Ok(rows
            .iter()
            .map(|row| Project {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn add_project(&self, name: &str) -> Result<Project> {
        sqlx::query("INSERT OR IGNORE INTO projects (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(PersistenceError::SqlxError)?;

        let id = self.project_id(name).await?;
        Ok(Project {
            id,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let store = SqliteStore { pool };
        store.init_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_schema_init_is_idempotent() {
        let store = memory_store().await;
        store.init_schema().await.unwrap();

        let projects = store.projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, DEFAULT_PROJECT);
    }

    #[tokio::test]
    async fn test_add_task_assigns_id_and_defaults() {
        let store = memory_store().await;
        let saved = store.add_task(&Task::new("  Water plants  ")).await.unwrap();

        assert!(saved.id.is_some());
        assert_eq!(saved.title, "Water plants");
        assert_eq!(saved.project_name, DEFAULT_PROJECT);
        assert!(saved.project_id.is_some());

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, vec![saved]);
    }

    #[tokio::test]
    async fn test_add_task_rejects_invalid_fields() {
        let store = memory_store().await;

        let err = store.add_task(&Task::new("   ")).await.unwrap_err();
        assert!(err.to_string().contains("Title cannot be empty"));

        let long = Task::new("t".repeat(101));
        let err = store.add_task(&long).await.unwrap_err();
        assert!(err.to_string().contains("cannot exceed 100"));
    }

    #[tokio::test]
    async fn test_add_task_unknown_project() {
        let store = memory_store().await;
        let draft = Task::new("Orphan").with_project("Nowhere");
        let err = store.add_task(&draft).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: Project 'Nowhere' not found");
    }

    #[tokio::test]
    async fn test_update_task_merges_and_stamps() {
        let store = memory_store().await;
        let saved = store.add_task(&Task::new("Draft title")).await.unwrap();
        let task_id = saved.id.unwrap();

        let patch = TaskPatch {
            title: Some("Final title".to_string()),
            priority: Some(Priority::High),
            due_date: Some(NaiveDate::from_ymd_opt(2025, 10, 1)),
            ..Default::default()
        };
        let updated = store.update_task(task_id, &patch).await.unwrap();

        assert_eq!(updated.title, "Final title");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(
            updated.due_date,
            Some(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
        );
        assert!(updated.modified_at >= saved.modified_at);

        let fetched = store.get_task(task_id).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_task_moves_between_projects() {
        let store = memory_store().await;
        let work = store.add_project("Work").await.unwrap();
        let saved = store.add_task(&Task::new("Report")).await.unwrap();

        let patch = TaskPatch {
            project: Some("Work".to_string()),
            ..Default::default()
        };
        let updated = store.update_task(saved.id.unwrap(), &patch).await.unwrap();
        assert_eq!(updated.project_id, Some(work.id));
        assert_eq!(updated.project_name, "Work");

        let patch = TaskPatch {
            project: Some("Nowhere".to_string()),
            ..Default::default()
        };
        let err = store
            .update_task(saved.id.unwrap(), &patch)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Project 'Nowhere' not found"));
    }

    #[tokio::test]
    async fn test_update_unknown_task() {
        let store = memory_store().await;
        let err = store
            .update_task(999, &TaskPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not found: Task with ID 999 not found");
    }

    #[tokio::test]
    async fn test_delete_task_reports_absence_as_false() {
        let store = memory_store().await;
        let saved = store.add_task(&Task::new("Ephemeral")).await.unwrap();
        let task_id = saved.id.unwrap();

        assert!(store.delete_task(task_id).await.unwrap());
        assert!(!store.delete_task(task_id).await.unwrap());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_completion_flips_and_stamps() {
        let store = memory_store().await;
        let saved = store.add_task(&Task::new("Flip me")).await.unwrap();
        let task_id = saved.id.unwrap();

        let toggled = store.toggle_completion(task_id).await.unwrap();
        assert!(toggled.completed);
        assert!(toggled.modified_at >= saved.modified_at);

        let back = store.toggle_completion(task_id).await.unwrap();
        assert!(!back.completed);

        let err = store.toggle_completion(999).await.unwrap_err();
        assert!(err.to_string().contains("Task with ID 999 not found"));
    }

    #[tokio::test]
    async fn test_load_orders_incomplete_first() {
        let store = memory_store().await;
        let first = store.add_task(&Task::new("First")).await.unwrap();
        let second = store.add_task(&Task::new("Second")).await.unwrap();
        store.toggle_completion(first.id.unwrap()).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded[0].id, second.id);
        assert_eq!(loaded[1].id, first.id);
        assert!(loaded[1].completed);
    }

    #[tokio::test]
    async fn test_search_combines_filters() {
        let store = memory_store().await;
        store
            .add_task(&Task::new("Buy groceries").with_priority(Priority::High))
            .await
            .unwrap();
        store
            .add_task(&Task::new("Read book").with_description("library due soon"))
            .await
            .unwrap();
        let done = store.add_task(&Task::new("Buy stamps")).await.unwrap();
        store.toggle_completion(done.id.unwrap()).await.unwrap();

        // Substring matches title or description.
        let filter = TaskFilter {
            text: Some("buy".to_string()),
            ..Default::default()
        };
        assert_eq!(store.search_tasks(&filter).await.unwrap().len(), 2);

        let filter = TaskFilter {
            text: Some("library".to_string()),
            ..Default::default()
        };
        assert_eq!(store.search_tasks(&filter).await.unwrap().len(), 1);

        let filter = TaskFilter {
            text: Some("buy".to_string()),
            completed: Some(false),
            ..Default::default()
        };
        let found = store.search_tasks(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Buy groceries");

        let filter = TaskFilter {
            priority: Some(Priority::High),
            ..Default::default()
        };
        let found = store.search_tasks(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Buy groceries");

        // No filters matches everything.
        assert_eq!(
            store.search_tasks(&TaskFilter::default()).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn test_add_project_is_create_or_get() {
        let store = memory_store().await;
        let first = store.add_project("Chores").await.unwrap();
        let again = store.add_project("Chores").await.unwrap();
        assert_eq!(first, again);

        let names: Vec<String> = store
            .projects()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Chores".to_string(), "Inbox".to_string()]);
    }

    #[tokio::test]
    async fn test_due_date_round_trips_as_iso() {
        let store = memory_store().await;
        let due = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let saved = store
            .add_task(&Task::new("Dated").with_due_date(due))
            .await
            .unwrap();

        let fetched = store.get_task(saved.id.unwrap()).await.unwrap();
        assert_eq!(fetched.due_date, Some(due));

        let raw: String = sqlx::query("SELECT due_date FROM tasks WHERE id = ?")
            .bind(saved.id.unwrap())
            .fetch_one(&store.pool)
            .await
            .unwrap()
            .get("due_date");
        assert_eq!(raw, "2026-02-28");
    }
}
