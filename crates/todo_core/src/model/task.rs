//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record shared by store, cloud mirror and views.
//! - Provide validation used by the boundary and by store write paths.
//!
//! # Invariants
//! - `id == 0` means "not yet stored"; the store assigns the real id.
//! - `heading` is never persisted empty.
//! - `created_at <= updated_at` for every persisted task.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned task identifier.
///
/// `0` is reserved for tasks that have not been inserted yet.
pub type TaskId = i64;

/// Sentinel id for tasks that the store has not assigned yet.
pub const UNASSIGNED_TASK_ID: TaskId = 0;

/// Task urgency level.
///
/// Declaration order is significant: the priority sort and the derived `Ord`
/// both rank `Low < Medium < High < Urgent`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

/// Display tag from the fixed card palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskColor {
    #[default]
    Default,
    Transparent,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Indigo,
    Purple,
    Pink,
    Brown,
    Gray,
}

impl TaskColor {
    pub const ALL: [TaskColor; 13] = [
        Self::Default,
        Self::Transparent,
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Teal,
        Self::Blue,
        Self::Indigo,
        Self::Purple,
        Self::Pink,
        Self::Brown,
        Self::Gray,
    ];

    /// Human-readable palette name shown by color pickers.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Transparent => "Transparent",
            Self::Red => "Red",
            Self::Orange => "Orange",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Teal => "Teal",
            Self::Blue => "Blue",
            Self::Indigo => "Indigo",
            Self::Purple => "Purple",
            Self::Pink => "Pink",
            Self::Brown => "Brown",
            Self::Gray => "Gray",
        }
    }

    pub fn ordinal(self) -> usize {
        Self::ALL
            .iter()
            .position(|color| *color == self)
            .unwrap_or(0)
    }

    /// Resolves a palette ordinal, falling back to `Default` when out of range.
    pub fn from_ordinal(ordinal: usize) -> Self {
        Self::ALL.get(ordinal).copied().unwrap_or_default()
    }
}

/// Checklist item nested inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl Subtask {
    /// Creates an open subtask with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            is_completed: false,
        }
    }
}

/// Validation errors for task invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyHeading,
    TimestampOrder { created_at: i64, updated_at: i64 },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyHeading => write!(f, "task heading cannot be empty"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must not be earlier than created_at ({created_at})"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical to-do record.
///
/// Timestamps are Unix epoch milliseconds. Field names serialize in camelCase
/// so cloud documents round-trip by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: TaskId,
    pub heading: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub color: TaskColor,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Creates an unsaved task with default metadata.
    ///
    /// Timestamps stay at zero; the store stamps them on insert.
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_TASK_ID,
            heading: heading.into(),
            body: String::new(),
            is_completed: false,
            created_at: 0,
            updated_at: 0,
            color: TaskColor::Default,
            priority: TaskPriority::Medium,
            due_date: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_color(mut self, color: TaskColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_due_date(mut self, due_date: Option<i64>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_subtasks(mut self, subtasks: Vec<Subtask>) -> Self {
        self.subtasks = subtasks;
        self
    }

    /// Validates persisted-shape invariants.
    ///
    /// # Errors
    /// - `EmptyHeading` when `heading` is blank after trimming.
    /// - `TimestampOrder` when `updated_at < created_at`.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        self.validate_content()?;
        if self.updated_at < self.created_at {
            return Err(TaskValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Validates caller-editable fields only; timestamps are store-owned.
    pub fn validate_content(&self) -> Result<(), TaskValidationError> {
        if self.heading.trim().is_empty() {
            return Err(TaskValidationError::EmptyHeading);
        }
        Ok(())
    }
}
