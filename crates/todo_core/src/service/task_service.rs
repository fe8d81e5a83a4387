//! Task use-case service.
//!
//! # Responsibility
//! - Validate and normalize user input before it reaches the repository.
//! - Provide intent-level entry points (add, edit, complete, delete, sync).
//! - Map failures to short user-facing messages.
//!
//! # Invariants
//! - Blank headings are rejected here, before any store access.
//! - Headings and bodies are trimmed; tags are trimmed and deduplicated in
//!   insertion order.

use crate::model::task::{Subtask, Task, TaskColor, TaskId, TaskPriority};
use crate::repo::sync_repo::{SyncAwareTaskRepository, SyncError};
use crate::repo::task_store::{RepoError, TaskStore};
use crate::sync::cloud::CloudError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Heading is blank after trimming.
    EmptyHeading,
    TaskNotFound(TaskId),
    Repo(RepoError),
    Sync(SyncError),
    /// Internal mismatch between a write and its read-back.
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyHeading => write!(f, "task heading cannot be empty"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Sync(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<SyncError> for TaskServiceError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

/// Input for the full task editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub heading: String,
    pub body: String,
    pub color: TaskColor,
    pub priority: TaskPriority,
    pub due_date: Option<i64>,
    pub subtasks: Vec<Subtask>,
    pub tags: Vec<String>,
}

/// Editable fields of an existing task. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub heading: Option<String>,
    pub body: Option<String>,
    pub color: Option<TaskColor>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<i64>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub tags: Option<Vec<String>>,
}

/// Use-case facade over the sync-aware repository.
pub struct TaskService<S: TaskStore> {
    repo: SyncAwareTaskRepository<S>,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(repo: SyncAwareTaskRepository<S>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &SyncAwareTaskRepository<S> {
        &self.repo
    }

    /// Quick-add from the single-line dialog.
    pub fn add_task(
        &self,
        heading: &str,
        body: &str,
        color: TaskColor,
    ) -> Result<Task, TaskServiceError> {
        self.add_detailed_task(NewTask {
            heading: heading.to_string(),
            body: body.to_string(),
            color,
            ..NewTask::default()
        })
    }

    /// Creates a task from the full editor and returns the stored record.
    pub fn add_detailed_task(&self, input: NewTask) -> Result<Task, TaskServiceError> {
        let heading = normalize_heading(&input.heading)?;
        let task = Task::new(heading)
            .with_body(input.body.trim())
            .with_color(input.color)
            .with_priority(input.priority)
            .with_due_date(input.due_date)
            .with_tags(normalize_tags(&input.tags))
            .with_subtasks(normalize_subtasks(input.subtasks));

        let id = self.repo.insert_task(&task)?;
        info!("event=task_add module=service status=ok task_id={id}");
        self.repo
            .get_task_by_id(id)?
            .ok_or(TaskServiceError::InconsistentState(
                "created task not found in read-back",
            ))
    }

    /// Applies `edit` to the stored task and returns the updated record.
    pub fn edit_task(&self, id: TaskId, edit: TaskEdit) -> Result<Task, TaskServiceError> {
        let mut task = self
            .repo
            .get_task_by_id(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        if let Some(heading) = edit.heading {
            task.heading = normalize_heading(&heading)?.to_string();
        }
        if let Some(body) = edit.body {
            task.body = body.trim().to_string();
        }
        if let Some(color) = edit.color {
            task.color = color;
        }
        if let Some(priority) = edit.priority {
            task.priority = priority;
        }
        if let Some(due_date) = edit.due_date {
            task.due_date = due_date;
        }
        if let Some(subtasks) = edit.subtasks {
            task.subtasks = normalize_subtasks(subtasks);
        }
        if let Some(tags) = edit.tags {
            task.tags = normalize_tags(&tags);
        }

        self.repo.update_task(&task)?;
        info!("event=task_edit module=service status=ok task_id={id}");
        self.repo
            .get_task_by_id(id)?
            .ok_or(TaskServiceError::InconsistentState(
                "edited task not found in read-back",
            ))
    }

    pub fn set_completion(
        &self,
        id: TaskId,
        is_completed: bool,
    ) -> Result<Task, TaskServiceError> {
        let task = self.repo.toggle_task_completion(id, is_completed)?;
        info!(
            "event=task_completion module=service status=ok task_id={} completed={}",
            id, is_completed
        );
        Ok(task)
    }

    /// Deletes by id; a missing task is not an error.
    pub fn delete_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.repo.delete_task_by_id(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Pulls cloud tasks; returns how many remote tasks were fetched.
    pub fn sync_from_cloud(&self) -> Result<usize, TaskServiceError> {
        Ok(self.repo.sync_from_cloud()?.len())
    }

    /// Pushes every local task to the cloud in one batch.
    pub fn sync_all_to_cloud(&self) -> Result<usize, TaskServiceError> {
        let snapshot = self.repo.list_tasks()?;
        self.repo.sync_to_cloud(&snapshot)?;
        Ok(snapshot.len())
    }
}

/// Maps an error to the short message shown in the snackbar.
pub fn user_message(error: &TaskServiceError) -> String {
    match error {
        TaskServiceError::EmptyHeading => "Task heading cannot be empty".to_string(),
        TaskServiceError::TaskNotFound(_) => "Task no longer exists".to_string(),
        TaskServiceError::Repo(RepoError::Validation(err)) => format!("Invalid input: {err}"),
        TaskServiceError::Sync(SyncError::NotSignedIn) => "Not signed in".to_string(),
        TaskServiceError::Sync(SyncError::Cloud(CloudError::Network(_))) => {
            "No internet connection".to_string()
        }
        TaskServiceError::Sync(SyncError::Cloud(CloudError::Unavailable(_))) => {
            "Request timeout".to_string()
        }
        other => other.to_string(),
    }
}

fn normalize_heading(heading: &str) -> Result<&str, TaskServiceError> {
    let trimmed = heading.trim();
    if trimmed.is_empty() {
        return Err(TaskServiceError::EmptyHeading);
    }
    Ok(trimmed)
}

/// Trims tags and drops blanks and exact duplicates, keeping first occurrence.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if !trimmed.is_empty() && !normalized.iter().any(|known| known == trimmed) {
            normalized.push(trimmed.to_string());
        }
    }
    normalized
}

fn normalize_subtasks(subtasks: Vec<Subtask>) -> Vec<Subtask> {
    subtasks
        .into_iter()
        .filter_map(|mut subtask| {
            let title = subtask.title.trim();
            if title.is_empty() {
                return None;
            }
            subtask.title = title.to_string();
            Some(subtask)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, user_message, TaskServiceError};
    use crate::repo::sync_repo::SyncError;
    use crate::sync::cloud::CloudError;

    #[test]
    fn tags_keep_first_occurrence_order() {
        let tags = vec![
            " work ".to_string(),
            "home".to_string(),
            "".to_string(),
            "work".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["work", "home"]);
    }

    #[test]
    fn user_message_maps_offline_and_signed_out() {
        let offline = TaskServiceError::Sync(SyncError::Cloud(CloudError::Network(
            "dns".to_string(),
        )));
        assert_eq!(user_message(&offline), "No internet connection");
        assert_eq!(
            user_message(&TaskServiceError::Sync(SyncError::NotSignedIn)),
            "Not signed in"
        );
    }
}
