use chrono::{TimeZone, Utc};
use std::sync::Arc;
use todo_core::db::open_db_in_memory;
use todo_core::{
    apply_filters_and_sort_at, reduce, BoardEvent, BoardState, ManualClock, SqliteTaskStore,
    Task, TaskBoard, TaskFilter, TaskPriority, TaskSort, TaskStore,
};

fn sample_tasks() -> Vec<Task> {
    let mut tasks = Vec::new();
    for (id, heading, priority, done) in [
        (1, "Write report", TaskPriority::High, false),
        (2, "Read book", TaskPriority::Low, true),
        (3, "Report bug", TaskPriority::Medium, false),
    ] {
        let mut task = Task::new(heading).with_priority(priority);
        task.id = id;
        task.created_at = id * 10;
        task.updated_at = id * 10;
        task.is_completed = done;
        tasks.push(task);
    }
    tasks.reverse();
    tasks
}

#[test]
fn visible_list_matches_engine_regardless_of_event_order() {
    let now = Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap();
    let events = [
        BoardEvent::SearchChanged("report".to_string()),
        BoardEvent::FilterChanged(TaskFilter::Pending),
        BoardEvent::SortChanged(TaskSort::Priority),
    ];

    let mut forward = reduce(
        BoardState::default(),
        BoardEvent::TasksLoaded(sample_tasks()),
        &now,
    );
    for event in events.iter().cloned() {
        forward = reduce(forward, event, &now);
    }

    let mut backward = BoardState::default();
    for event in events.iter().rev().cloned() {
        backward = reduce(backward, event, &now);
    }
    backward = reduce(backward, BoardEvent::TasksLoaded(sample_tasks()), &now);

    assert_eq!(forward.visible, backward.visible);
    assert_eq!(
        forward.visible,
        apply_filters_and_sort_at(&forward.tasks, &forward.query, &now)
    );
    let headings: Vec<&str> = forward
        .visible
        .iter()
        .map(|task| task.heading.as_str())
        .collect();
    assert_eq!(headings, vec!["Report bug", "Write report"]);
}

#[test]
fn load_lifecycle_updates_flags() {
    let now = Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap();
    let initial = BoardState::default();
    assert!(initial.is_loading);

    let failed = reduce(
        initial.clone(),
        BoardEvent::LoadFailed("disk full".to_string()),
        &now,
    );
    assert!(!failed.is_loading);
    assert_eq!(failed.error.as_deref(), Some("disk full"));

    let loaded = reduce(failed, BoardEvent::TasksLoaded(sample_tasks()), &now);
    assert!(loaded.error.is_none());
    assert_eq!(loaded.progress(), (1, 3));
}

#[test]
fn pump_applies_latest_store_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let store =
        SqliteTaskStore::with_clock(&conn, Arc::new(ManualClock::new(1_000))).unwrap();
    let subscription = store.subscribe_all().unwrap();
    let mut board = TaskBoard::new();

    assert!(board.pump(&subscription));
    assert!(board.state().tasks.is_empty());
    assert!(!board.state().is_loading);

    store.insert(&Task::new("one")).unwrap();
    store.insert(&Task::new("two")).unwrap();
    assert!(board.pump(&subscription));
    assert_eq!(board.state().tasks.len(), 2);
    assert_eq!(board.state().visible.len(), 2);

    assert!(!board.pump(&subscription));

    board.dispatch(BoardEvent::SearchChanged("TWO".to_string()));
    assert_eq!(board.state().visible.len(), 1);
    assert_eq!(board.state().visible[0].heading, "two");
}

#[test]
fn completed_filter_narrows_visible_list_until_cleared() {
    let now = Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap();
    let state = reduce(
        BoardState::default(),
        BoardEvent::TasksLoaded(sample_tasks()),
        &now,
    );

    let state = reduce(state, BoardEvent::FilterChanged(TaskFilter::Completed), &now);
    let headings: Vec<&str> = state.visible.iter().map(|task| task.heading.as_str()).collect();
    assert_eq!(headings, vec!["Read book"]);

    let state = reduce(state, BoardEvent::ClearFilters, &now);
    assert_eq!(state.visible.len(), 3);
}
