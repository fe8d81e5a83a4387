//! Search, filter and sort pipeline.
//!
//! # Invariants
//! - Stages always run in the order search → filter → sort.
//! - Output depends only on the input list, the query and `now`.
//! - Sorting is stable: ties keep their input order.

use crate::model::task::{Task, TaskPriority};
use crate::query::params::{TaskFilter, TaskQuery, TaskSort};
use chrono::{DateTime, Local, TimeZone};
use std::cmp::Ordering;

/// Applies `query` to `tasks` against the local wall clock.
pub fn apply_filters_and_sort(tasks: &[Task], query: &TaskQuery) -> Vec<Task> {
    apply_filters_and_sort_at(tasks, query, &Local::now())
}

/// Applies `query` to `tasks` with an explicit "now".
///
/// Calendar-day checks (`TaskFilter::Today`) use the time zone of `now`.
pub fn apply_filters_and_sort_at<Tz: TimeZone>(
    tasks: &[Task],
    query: &TaskQuery,
    now: &DateTime<Tz>,
) -> Vec<Task> {
    let needle = query.search.to_lowercase();
    let mut view: Vec<Task> = tasks
        .iter()
        .filter(|task| matches_search(task, &needle))
        .filter(|task| matches_filter(task, query.filter, now))
        .cloned()
        .collect();
    sort_tasks(&mut view, query.sort);
    view
}

/// Case-insensitive substring match over heading, body, tags and subtasks.
///
/// `needle` must already be lowercase; an empty needle matches everything.
pub fn matches_search(task: &Task, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    task.heading.to_lowercase().contains(needle)
        || task.body.to_lowercase().contains(needle)
        || task
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
        || task
            .subtasks
            .iter()
            .any(|subtask| subtask.title.to_lowercase().contains(needle))
}

pub fn matches_filter<Tz: TimeZone>(task: &Task, filter: TaskFilter, now: &DateTime<Tz>) -> bool {
    match filter {
        TaskFilter::All => true,
        TaskFilter::Today => task
            .due_date
            .and_then(|due| now.timezone().timestamp_millis_opt(due).single())
            .is_some_and(|due| due.date_naive() == now.date_naive()),
        TaskFilter::Overdue => {
            !task.is_completed
                && task
                    .due_date
                    .is_some_and(|due| due < now.timestamp_millis())
        }
        TaskFilter::Completed => task.is_completed,
        TaskFilter::Pending => !task.is_completed,
        TaskFilter::HighPriority => task.priority == TaskPriority::High,
        TaskFilter::MediumPriority => task.priority == TaskPriority::Medium,
        TaskFilter::LowPriority => task.priority == TaskPriority::Low,
        TaskFilter::WithDueDate => task.due_date.is_some(),
        TaskFilter::NoDueDate => task.due_date.is_none(),
    }
}

/// Stable in-place sort.
pub fn sort_tasks(tasks: &mut [Task], sort: TaskSort) {
    match sort {
        TaskSort::CreatedDate => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        TaskSort::DueDate => tasks.sort_by(|a, b| compare_due_dates(a.due_date, b.due_date)),
        // LOW first, following declaration order.
        TaskSort::Priority => tasks.sort_by_key(|task| task.priority),
        TaskSort::Alphabetical => tasks.sort_by_cached_key(|task| task.heading.to_lowercase()),
        TaskSort::CompletionStatus => tasks.sort_by_key(|task| task.is_completed),
    }
}

fn compare_due_dates(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_filters_and_sort_at, compare_due_dates, matches_search};
    use crate::model::task::{Subtask, Task};
    use crate::query::params::{TaskFilter, TaskQuery, TaskSort};
    use chrono::{TimeZone, Utc};
    use std::cmp::Ordering;

    #[test]
    fn search_covers_tags_and_subtasks() {
        let task = Task::new("Groceries")
            .with_tags(["Errands"])
            .with_subtasks(vec![Subtask::new("Buy OAT milk")]);
        assert!(matches_search(&task, "errand"));
        assert!(matches_search(&task, "oat"));
        assert!(!matches_search(&task, "gym"));
    }

    #[test]
    fn missing_due_dates_sort_last() {
        assert_eq!(compare_due_dates(Some(5), None), Ordering::Less);
        assert_eq!(compare_due_dates(None, Some(5)), Ordering::Greater);
        assert_eq!(compare_due_dates(Some(1), Some(2)), Ordering::Less);
    }

    #[test]
    fn today_uses_calendar_day_of_now() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap();
        let early_same_day = Utc.with_ymd_and_hms(2026, 3, 10, 0, 30, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2026, 3, 11, 0, 30, 0).unwrap();

        let tasks = vec![
            Task::new("same day").with_due_date(Some(early_same_day.timestamp_millis())),
            Task::new("tomorrow").with_due_date(Some(next_day.timestamp_millis())),
            Task::new("undated"),
        ];
        let query = TaskQuery::new("", TaskFilter::Today, TaskSort::CreatedDate);
        let view = apply_filters_and_sort_at(&tasks, &query, &now);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].heading, "same day");
    }
}
