//! Core domain logic for the task manager: task records, the task store,
//! reminder synchronization, and the pure list/calendar query functions.
pub mod query;
pub mod reminders;
pub mod store;
pub mod task;

pub use reminders::{
    AlertBackend, AlertError, MemoryAlerts, PendingAlert, ReminderScheduler,
    REMINDER_LEAD_MINUTES,
};
pub use store::{StoreError, TaskRepository};
pub use task::{normalize_title, readable_date, Priority, Task, TaskFilter, ValidationError};
