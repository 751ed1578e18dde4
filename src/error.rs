use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::model::TaskId;

/// Failures of the key-value store backing the repository.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize value for key `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejected repository operations. None of these leave a partial write behind.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("parent task not found: {0}")]
    ParentNotFound(TaskId),
    #[error("task {task} cannot be nested under {parent}")]
    InvalidParent { task: TaskId, parent: TaskId },
    #[error("end {end} is before start {start}")]
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("there are no tasks to export")]
    NoTasks,
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Validation failures of the task form, shown inline in the dialog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Task name is required")]
    EmptyName,
    #[error("End time must be after the start time")]
    EndBeforeStart,
    #[error("Choose a parent task or untick \"Subtask of\"")]
    MissingParent,
}
