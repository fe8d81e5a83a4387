//! View parameters consumed by the query engine.

use serde::{Deserialize, Serialize};

/// Mutually exclusive list filter.
///
/// `TaskPriority::Urgent` has no filter of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskFilter {
    #[default]
    All,
    Today,
    Overdue,
    Completed,
    Pending,
    HighPriority,
    MediumPriority,
    LowPriority,
    WithDueDate,
    NoDueDate,
}

impl TaskFilter {
    /// Chip label.
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Today => "Due Today",
            Self::Overdue => "Overdue",
            Self::Completed => "Completed",
            Self::Pending => "Active",
            Self::HighPriority => "High Priority",
            Self::MediumPriority => "Medium Priority",
            Self::LowPriority => "Low Priority",
            Self::WithDueDate => "With Due Date",
            Self::NoDueDate => "No Due Date",
        }
    }
}

/// List ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskSort {
    #[default]
    CreatedDate,
    DueDate,
    Priority,
    Alphabetical,
    CompletionStatus,
}

impl TaskSort {
    /// Chip label.
    pub fn label(self) -> &'static str {
        match self {
            Self::CreatedDate => "Created Date",
            Self::DueDate => "Due Date",
            Self::Priority => "Priority",
            Self::Alphabetical => "A-Z",
            Self::CompletionStatus => "Status",
        }
    }
}

/// The three independent view parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub search: String,
    pub filter: TaskFilter,
    pub sort: TaskSort,
}

impl TaskQuery {
    pub fn new(search: impl Into<String>, filter: TaskFilter, sort: TaskSort) -> Self {
        Self {
            search: search.into(),
            filter,
            sort,
        }
    }
}
