//! Pure query functions over an in-memory task collection: completion
//! filtering, stable due-date sorting, and calendar-day grouping. No side
//! effects; callers supply the collection (usually `fetch_all` output).

use crate::task::{Task, TaskFilter};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Fixed textual day key. Grouping and lookup both go through this one format
/// so they can never drift apart.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Renders the calendar-day key for a timestamp, e.g. "2025-06-01".
pub fn day_key(ts: DateTime<Utc>) -> String {
    ts.format(DAY_KEY_FORMAT).to_string()
}

/// Keeps the tasks matching the completion filter. `All` returns the input
/// unchanged; the other modes preserve relative order.
pub fn filter_by_completion(tasks: Vec<Task>, filter: TaskFilter) -> Vec<Task> {
    match filter {
        TaskFilter::All => tasks,
        TaskFilter::Incomplete => tasks.into_iter().filter(|t| !t.is_completed).collect(),
        TaskFilter::Completed => tasks.into_iter().filter(|t| t.is_completed).collect(),
    }
}

/// Stable ascending sort on due date; ties keep their relative input order.
pub fn sort_by_due_date(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|t| t.due_date);
    tasks
}

/// Groups tasks by calendar day. Each task appears under exactly one key, in
/// input order; days with no tasks are absent from the map.
pub fn group_by_day(tasks: &[Task]) -> HashMap<String, Vec<Task>> {
    let mut by_day: HashMap<String, Vec<Task>> = HashMap::new();
    for task in tasks {
        by_day.entry(day_key(task.due_date)).or_default().push(task.clone());
    }
    by_day
}

/// The composition the list's filter control uses: filter first, then the
/// stable due-date sort.
pub fn filter_and_sort(tasks: Vec<Task>, filter: TaskFilter) -> Vec<Task> {
    sort_by_due_date(filter_by_completion(tasks, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;
    use chrono::TimeZone;

    fn task(title: &str, due: DateTime<Utc>, completed: bool) -> Task {
        let mut task = Task::new(title, "", due, Priority::Low);
        task.is_completed = completed;
        task
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn filter_all_returns_input_unchanged() {
        let tasks = vec![
            task("a", at(1, 9, 0), false),
            task("b", at(1, 10, 0), true),
        ];

        let filtered = filter_by_completion(tasks.clone(), TaskFilter::All);
        assert_eq!(filtered, tasks);
    }

    #[test]
    fn filter_incomplete_keeps_only_open_tasks() {
        let tasks = vec![
            task("open", at(1, 9, 0), false),
            task("done", at(1, 10, 0), true),
            task("also open", at(1, 11, 0), false),
        ];

        let filtered = filter_by_completion(tasks, TaskFilter::Incomplete);
        let titles: Vec<&str> = filtered.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["open", "also open"]);
    }

    #[test]
    fn filter_completed_keeps_only_done_tasks() {
        let tasks = vec![
            task("open", at(1, 9, 0), false),
            task("done", at(1, 10, 0), true),
        ];

        let filtered = filter_by_completion(tasks, TaskFilter::Completed);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "done");
    }

    #[test]
    fn sort_is_stable_for_equal_due_dates() {
        let due = at(1, 9, 0);
        let tasks = vec![
            task("later due", at(2, 9, 0), false),
            task("first tie", due, false),
            task("second tie", due, false),
        ];

        let sorted = sort_by_due_date(tasks);
        let titles: Vec<&str> = sorted.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first tie", "second tie", "later due"]);
    }

    #[test]
    fn filter_then_sort_yields_the_incomplete_subset_in_due_order() {
        let tie = at(1, 12, 0);
        let tasks = vec![
            task("done", at(1, 8, 0), true),
            task("c", at(3, 9, 0), false),
            task("a", tie, false),
            task("b", tie, false),
        ];

        let result = filter_and_sort(tasks, TaskFilter::Incomplete);
        let titles: Vec<&str> = result.iter().map(|t| t.title.as_str()).collect();

        assert_eq!(titles, vec!["a", "b", "c"]);
        assert!(result.iter().all(|t| !t.is_completed));
    }

    #[test]
    fn group_by_day_partitions_the_input() {
        let tasks = vec![
            task("morning", at(1, 9, 0), false),
            task("evening", at(1, 21, 0), true),
            task("next day", at(2, 9, 0), false),
        ];

        let by_day = group_by_day(&tasks);

        assert_eq!(by_day.len(), 2);
        let first = &by_day["2025-06-01"];
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].title, "morning");
        assert_eq!(first[1].title, "evening");
        assert_eq!(by_day["2025-06-02"].len(), 1);

        // Partition: every input task appears exactly once across all groups.
        let grouped_total: usize = by_day.values().map(Vec::len).sum();
        assert_eq!(grouped_total, tasks.len());
    }

    #[test]
    fn midnight_boundary_splits_groups() {
        let tasks = vec![
            task("before midnight", at(1, 23, 59), false),
            task("after midnight", at(2, 0, 1), false),
        ];

        let by_day = group_by_day(&tasks);
        assert_eq!(by_day["2025-06-01"].len(), 1);
        assert_eq!(by_day["2025-06-02"].len(), 1);
    }

    #[test]
    fn empty_days_are_absent_not_empty() {
        let tasks = vec![task("only", at(1, 9, 0), false)];

        let by_day = group_by_day(&tasks);
        assert_eq!(by_day.len(), 1);
        assert!(!by_day.contains_key("2025-06-02"));
    }
}
