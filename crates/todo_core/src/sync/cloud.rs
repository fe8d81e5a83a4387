//! Remote document collection contract.
//!
//! # Responsibility
//! - Define the per-user cloud collection the repository mirrors into.
//! - Define the document shape tasks take on the wire.
//!
//! # Invariants
//! - Documents are keyed by task id under a per-user namespace.
//! - `fetch_all` drops documents that cannot be decoded instead of failing.
//! - `bulk_upsert` applies all documents or none.

use crate::model::task::{Subtask, Task, TaskColor, TaskId, TaskPriority};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CloudResult<T> = Result<T, CloudError>;

/// Failure reported by a remote document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    /// Transport failure (offline, DNS, reset connection).
    Network(String),
    /// Credentials missing, expired or revoked.
    Unauthorized(String),
    /// Remote store refused the write or read.
    Rejected { code: String, message: String },
    /// Remote store is temporarily unavailable.
    Unavailable(String),
}

impl Display for CloudError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Unauthorized(message) => write!(f, "unauthorized: {message}"),
            Self::Rejected { code, message } => write!(f, "rejected ({code}): {message}"),
            Self::Unavailable(message) => write!(f, "cloud unavailable: {message}"),
        }
    }
}

impl Error for CloudError {}

/// Per-user remote collection of task documents.
///
/// Implementations are called from the background mirror worker as well as
/// from the caller's thread, so they must be `Send + Sync`.
pub trait CloudSyncAdapter: Send + Sync {
    /// Creates or overwrites the document for `task.id`.
    fn upsert(&self, user_id: &str, task: &Task) -> CloudResult<()>;
    /// Removes the document for `task_id`; missing documents are not an error.
    fn delete(&self, user_id: &str, task_id: TaskId) -> CloudResult<()>;
    /// Returns every decodable document, newest `createdAt` first.
    fn fetch_all(&self, user_id: &str) -> CloudResult<Vec<Task>>;
    /// Writes every task in one atomic batch.
    fn bulk_upsert(&self, user_id: &str, tasks: &[Task]) -> CloudResult<()>;
}

/// Wire shape of one task document.
///
/// Carries the task fields by name plus `lastModified`, the server-side write
/// time in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDocument {
    pub id: TaskId,
    pub heading: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub color: TaskColor,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub last_modified: i64,
}

impl TaskDocument {
    pub fn from_task(task: &Task, last_modified: i64) -> Self {
        Self {
            id: task.id,
            heading: task.heading.clone(),
            body: task.body.clone(),
            is_completed: task.is_completed,
            created_at: Some(task.created_at),
            updated_at: Some(task.updated_at),
            due_date: task.due_date,
            priority: task.priority,
            color: task.color,
            tags: task.tags.clone(),
            subtasks: task.subtasks.clone(),
            last_modified,
        }
    }

    /// Decodes a raw document, returning `None` when it is not a usable task.
    ///
    /// A missing `createdAt` is filled with `now_ms`.
    pub fn decode(value: serde_json::Value, now_ms: i64) -> Option<Task> {
        let document: TaskDocument = serde_json::from_value(value).ok()?;
        let task = document.into_task(now_ms);
        task.validate_content().ok()?;
        Some(task)
    }

    pub fn into_task(self, now_ms: i64) -> Task {
        let created_at = self.created_at.unwrap_or(now_ms);
        let updated_at = self.updated_at.unwrap_or(created_at).max(created_at);
        Task {
            id: self.id,
            heading: self.heading,
            body: self.body,
            is_completed: self.is_completed,
            created_at,
            updated_at,
            color: self.color,
            priority: self.priority,
            due_date: self.due_date,
            tags: self.tags,
            subtasks: self.subtasks,
        }
    }
}
