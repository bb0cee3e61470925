use crate::task::{Priority, Task};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("no task found with id {0}")]
    TaskNotFound(Uuid),
}

/// All persisted tasks, keyed by id.
///
/// Every mutating call returns the affected record as a value; the snapshot is
/// written back by the caller with [`save_as_json`](TaskRepository::save_as_json).
/// A corrupt or unwritable snapshot is a fatal persistence fault: there is no
/// degraded mode.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskRepository {
    tasks: HashMap<Uuid, Task>,
}

impl Default for TaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    pub fn new_from_json(json: &str) -> Self {
        serde_json::from_str(json).expect("cannot deserialize repository")
    }

    pub fn save_as_json(&self, writer: impl std::io::Write) {
        serde_json::to_writer(writer, &self).expect("cannot serialize repository");
    }

    /// Returns every task, sorted by due date ascending. Ties are broken by
    /// creation time and then id so the order never depends on map iteration.
    pub fn fetch_all(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        tasks
    }

    /// Creates and stores a new incomplete task, returning the record.
    pub fn create(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: DateTime<Utc>,
        priority: Priority,
    ) -> Task {
        let task = Task::new(title, description, due_date, priority);
        self.tasks.insert(task.id, task.clone());
        task
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Replaces the editable fields of an existing task and refreshes its
    /// `updated_at` timestamp. The id and `created_at` never change.
    pub fn update(
        &mut self,
        id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: DateTime<Utc>,
        priority: Priority,
    ) -> Result<Task, StoreError> {
        let task = self.tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        task.title = title.into();
        task.description = description.into();
        task.due_date = due_date;
        task.priority = priority;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    /// Flips the completion flag, refreshing `updated_at` like any other mutation.
    pub fn toggle_completion(&mut self, id: Uuid) -> Result<Task, StoreError> {
        let task = self.tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        task.is_completed = !task.is_completed;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    /// Removes a task and returns it so the caller can cancel its reminder;
    /// reminder cancellation belongs to the caller, not the store.
    pub fn delete(&mut self, id: Uuid) -> Result<Task, StoreError> {
        self.tasks.remove(&id).ok_or(StoreError::TaskNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
