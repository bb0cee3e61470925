use crate::task::Task;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// How many minutes before a task's due date its reminder fires.
pub const REMINDER_LEAD_MINUTES: i64 = 15;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertError {
    #[error("notification permission has not been granted")]
    PermissionDenied,
    #[error("alert delivery failed: {0}")]
    Delivery(String),
}

/// The boundary to the OS alert-delivery subsystem. Keys are the task id's
/// canonical string form; each key holds at most one pending one-shot alert.
#[cfg_attr(test, mockall::automock)]
pub trait AlertBackend {
    /// Asks the environment for permission to deliver alerts. `Ok(false)`
    /// means the user declined.
    fn request_permission(&mut self) -> Result<bool, AlertError>;

    /// Registers a single non-repeating alert for `key` at `trigger`,
    /// replacing any alert already pending under that key.
    fn schedule_alert(
        &mut self,
        key: &str,
        title: &str,
        body: &str,
        trigger: DateTime<Utc>,
    ) -> Result<(), AlertError>;

    /// Removes the pending alerts for the given keys; unknown keys are ignored.
    fn cancel_alerts(&mut self, keys: &[String]) -> Result<(), AlertError>;

    fn pending_alert_keys(&self) -> Vec<String>;
}

/// A pending one-shot alert: display payload plus its fire time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAlert {
    pub title: String,
    pub body: String,
    pub trigger: DateTime<Utc>,
}

/// In-memory alert backend, snapshotable to JSON alongside the task
/// repository. Stands in for the platform notification center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryAlerts {
    pending: HashMap<String, PendingAlert>,
    permission_granted: bool,
}

impl Default for MemoryAlerts {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAlerts {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            permission_granted: true,
        }
    }

    /// A backend whose permission was declined; every schedule attempt fails.
    pub fn denied() -> Self {
        Self {
            pending: HashMap::new(),
            permission_granted: false,
        }
    }

    pub fn new_from_json(json: &str) -> Self {
        serde_json::from_str(json).expect("cannot deserialize pending alerts")
    }

    pub fn save_as_json(&self, writer: impl std::io::Write) {
        serde_json::to_writer(writer, &self).expect("cannot serialize pending alerts");
    }

    pub fn pending(&self, key: &str) -> Option<&PendingAlert> {
        self.pending.get(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl AlertBackend for MemoryAlerts {
    fn request_permission(&mut self) -> Result<bool, AlertError> {
        Ok(self.permission_granted)
    }

    fn schedule_alert(
        &mut self,
        key: &str,
        title: &str,
        body: &str,
        trigger: DateTime<Utc>,
    ) -> Result<(), AlertError> {
        if !self.permission_granted {
            return Err(AlertError::PermissionDenied);
        }
        self.pending.insert(
            key.to_string(),
            PendingAlert {
                title: title.to_string(),
                body: body.to_string(),
                trigger,
            },
        );
        Ok(())
    }

    fn cancel_alerts(&mut self, keys: &[String]) -> Result<(), AlertError> {
        for key in keys {
            self.pending.remove(key);
        }
        Ok(())
    }

    fn pending_alert_keys(&self) -> Vec<String> {
        self.pending.keys().cloned().collect()
    }
}

/// Keeps each task paired with at most one pending reminder, fired
/// [`REMINDER_LEAD_MINUTES`] before the due date.
///
/// Every operation is total: a denied permission or a delivery failure is
/// logged and treated as a successful no-op. The task's persisted state never
/// depends on the reminder outcome.
pub struct ReminderScheduler<B> {
    backend: B,
}

impl<B: AlertBackend> ReminderScheduler<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Asks for alert permission once at startup. Fire-and-forget: the result
    /// is logged, never surfaced.
    pub fn request_permission(&mut self) {
        match self.backend.request_permission() {
            Ok(true) => tracing::debug!("notification permission granted"),
            Ok(false) => {
                tracing::warn!("notification permission declined; reminders will not fire")
            }
            Err(err) => tracing::warn!("notification permission request failed: {err}"),
        }
    }

    /// Schedules the task's reminder at `due_date - 15min`. A trigger at or
    /// before now means no reminder is created; that is not an error.
    pub fn schedule(&mut self, task: &Task) {
        let trigger = task.due_date - Duration::minutes(REMINDER_LEAD_MINUTES);
        if trigger <= Utc::now() {
            return;
        }
        if let Err(err) = self.backend.schedule_alert(
            &task.id.to_string(),
            &task.title,
            &task.description,
            trigger,
        ) {
            tracing::warn!(task_id = %task.id, "failed to schedule reminder: {err}");
        }
    }

    /// Cancel-then-schedule, re-evaluating the lead rule against the task's
    /// current due date. Never leaves two alerts for one task.
    pub fn update(&mut self, task: &Task) {
        self.cancel(task);
        self.schedule(task);
    }

    /// Removes the task's pending alert, if any. Idempotent.
    pub fn cancel(&mut self, task: &Task) {
        if let Err(err) = self.backend.cancel_alerts(&[task.id.to_string()]) {
            tracing::warn!(task_id = %task.id, "failed to cancel reminder: {err}");
        }
    }

    /// Startup pass over the authoritative task set: cancels the alerts of
    /// tasks whose due date has already passed. Tasks without a pending alert
    /// are untouched, and nothing is re-scheduled here.
    pub fn reconcile_all(&mut self, tasks: &[Task]) {
        let now = Utc::now();
        let pending = self.backend.pending_alert_keys();
        let stale: Vec<String> = tasks
            .iter()
            .filter(|t| t.due_date < now)
            .map(|t| t.id.to_string())
            .filter(|key| pending.contains(key))
            .collect();
        if stale.is_empty() {
            return;
        }
        if let Err(err) = self.backend.cancel_alerts(&stale) {
            tracing::warn!("failed to prune stale reminders: {err}");
        }
    }
}
