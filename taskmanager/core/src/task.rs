use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// A single task: the value record persisted by the store and displayed by the UI.
///
/// Records are plain values. Mutation happens through explicit
/// [`TaskRepository`](crate::store::TaskRepository) calls that return a fresh
/// record, never through ambient mutation of a shared object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Constructs a new incomplete task with a fresh id and both timestamps set
    /// to the same instant.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: DateTime<Utc>,
        priority: Priority,
    ) -> Self {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            due_date,
            priority,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Status text shown in the detail view.
    pub fn status_label(&self) -> &'static str {
        if self.is_completed {
            "Completed"
        } else {
            "In Progress"
        }
    }
}

/// Task priority, stored as its raw ordinal (0 = Low, 1 = Medium, 2 = High).
///
/// An out-of-range ordinal read back from storage becomes `Unknown` and keeps
/// its raw value; it displays as "Unknown" instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i16", into = "i16")]
pub enum Priority {
    Low,
    Medium,
    High,
    Unknown(i16),
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

impl From<i16> for Priority {
    fn from(raw: i16) -> Self {
        match raw {
            0 => Priority::Low,
            1 => Priority::Medium,
            2 => Priority::High,
            other => Priority::Unknown(other),
        }
    }
}

impl From<Priority> for i16 {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Unknown(_) => "Unknown",
        };
        write!(f, "{label}")
    }
}

/// The tri-state completion filter applied to the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Incomplete,
    Completed,
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskFilter::All => "All",
            TaskFilter::Incomplete => "Incomplete",
            TaskFilter::Completed => "Completed",
        };
        write!(f, "{label}")
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please enter a task title.")]
    EmptyTitle,
}

/// Validates a title at the edit boundary: trims surrounding whitespace and
/// rejects an empty result. Nothing is committed on failure.
pub fn normalize_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Formats a timestamp the way the task list and detail views show dates,
/// e.g. "June 01, 2025 at 11:59 PM".
pub fn readable_date(ts: DateTime<Utc>) -> String {
    ts.format("%B %d, %Y at %I:%M %p").to_string()
}
