//! Error types for the todos engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TodosError>;

#[derive(Error, Debug)]
pub enum TodosError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Rejected task fields, surfaced by the persistence layer before a write.
///
/// The reducer never validates; it applies whatever the action carries and
/// leaves field rules to the storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title cannot exceed {max} characters")]
    TitleTooLong { max: usize },

    #[error("Description cannot exceed {max} characters")]
    DescriptionTooLong { max: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("Task with ID {0} not found")]
    Task(i64),

    #[error("Project '{0}' not found")]
    Project(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The dispatch loop is gone; no further actions can be processed.
    #[error("Dispatch queue closed")]
    QueueClosed,
}
