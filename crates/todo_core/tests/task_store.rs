use std::collections::HashSet;
use std::sync::Arc;
use todo_core::db::open_db_in_memory;
use todo_core::{
    ManualClock, RepoError, SqliteTaskStore, Subtask, Task, TaskColor, TaskPriority, TaskStore,
    TaskValidationError,
};

#[test]
fn insert_assigns_unique_ids_and_store_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let store = SqliteTaskStore::with_clock(&conn, clock.clone()).unwrap();

    let mut forged = Task::new("first");
    forged.created_at = 42;
    forged.updated_at = 7;

    let first = store.insert(&forged).unwrap();
    clock.advance(10);
    let second = store.insert(&Task::new("second")).unwrap();
    assert_ne!(first, second);

    let loaded = store.get_by_id(first).unwrap().unwrap();
    assert_eq!(loaded.id, first);
    assert_eq!(loaded.created_at, 1_000);
    assert_eq!(loaded.updated_at, 1_000);

    let loaded = store.get_by_id(second).unwrap().unwrap();
    assert_eq!(loaded.created_at, 1_010);
}

#[test]
fn insert_then_get_preserves_all_editable_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();

    let mut subtask = Subtask::new("pack charger");
    subtask.is_completed = true;
    let task = Task::new("Trip")
        .with_body("weekend away")
        .with_color(TaskColor::Teal)
        .with_priority(TaskPriority::Urgent)
        .with_due_date(Some(1_700_000_000_000))
        .with_tags(["travel", "family"])
        .with_subtasks(vec![subtask.clone()]);

    let id = store.insert(&task).unwrap();
    let loaded = store.get_by_id(id).unwrap().unwrap();

    assert_eq!(loaded.heading, "Trip");
    assert_eq!(loaded.body, "weekend away");
    assert_eq!(loaded.color, TaskColor::Teal);
    assert_eq!(loaded.priority, TaskPriority::Urgent);
    assert_eq!(loaded.due_date, Some(1_700_000_000_000));
    assert_eq!(loaded.tags, vec!["travel", "family"]);
    assert_eq!(loaded.subtasks, vec![subtask]);
    assert!(!loaded.is_completed);
}

#[test]
fn insert_with_existing_explicit_id_fails() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();

    let id = store.insert(&Task::new("original")).unwrap();
    let mut duplicate = Task::new("duplicate");
    duplicate.id = id;

    assert!(matches!(store.insert(&duplicate), Err(RepoError::Db(_))));
    assert_eq!(store.get_by_id(id).unwrap().unwrap().heading, "original");

    let mut explicit = Task::new("explicit");
    explicit.id = 500;
    assert_eq!(store.insert(&explicit).unwrap(), 500);
}

#[test]
fn blank_heading_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();

    let err = store.insert(&Task::new("  \t ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::EmptyHeading)
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn update_keeps_created_at_and_bumps_updated_at_monotonically() {
    let conn = open_db_in_memory().unwrap();
    let clock = Arc::new(ManualClock::new(5_000));
    let store = SqliteTaskStore::with_clock(&conn, clock.clone()).unwrap();

    let id = store.insert(&Task::new("draft")).unwrap();
    let mut task = store.get_by_id(id).unwrap().unwrap();

    clock.set(6_000);
    task.heading = "final".to_string();
    task.created_at = 1;
    store.update(&task).unwrap();

    let updated = store.get_by_id(id).unwrap().unwrap();
    assert_eq!(updated.heading, "final");
    assert_eq!(updated.created_at, 5_000);
    assert_eq!(updated.updated_at, 6_000);

    clock.set(2_000);
    store.update(&updated).unwrap();
    let after_clock_skew = store.get_by_id(id).unwrap().unwrap();
    assert_eq!(after_clock_skew.updated_at, 6_000);
}

#[test]
fn update_missing_task_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();

    let mut ghost = Task::new("ghost");
    ghost.id = 77;
    assert!(matches!(store.update(&ghost), Err(RepoError::NotFound(77))));
}

#[test]
fn delete_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();

    let id = store.insert(&Task::new("gone soon")).unwrap();
    let task = store.get_by_id(id).unwrap().unwrap();
    store.delete(&task).unwrap();
    store.delete(&task).unwrap();
    store.delete_by_id(9_999).unwrap();

    assert!(store.get_by_id(id).unwrap().is_none());
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn list_all_orders_newest_first_with_id_tiebreak() {
    let conn = open_db_in_memory().unwrap();
    let clock = Arc::new(ManualClock::new(100));
    let store = SqliteTaskStore::with_clock(&conn, clock.clone()).unwrap();

    let a = store.insert(&Task::new("a")).unwrap();
    let b = store.insert(&Task::new("b")).unwrap();
    clock.advance(1);
    let c = store.insert(&Task::new("c")).unwrap();

    let ids: Vec<i64> = store.list_all().unwrap().iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![c, b, a]);
    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 3);
}

#[test]
fn counts_track_completion() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();

    store.insert(&Task::new("open")).unwrap();
    let mut done = Task::new("done");
    done.is_completed = true;
    store.insert(&done).unwrap();

    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(store.count_completed().unwrap(), 1);
}

#[test]
fn live_query_emits_initial_and_one_snapshot_per_mutation() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    store.insert(&Task::new("existing")).unwrap();

    let subscription = store.subscribe_all().unwrap();
    assert_eq!(subscription.try_recv().unwrap().len(), 1);

    let id = store.insert(&Task::new("new")).unwrap();
    let after_insert = subscription.try_recv().unwrap();
    assert_eq!(after_insert.len(), 2);

    let mut task = store.get_by_id(id).unwrap().unwrap();
    task.is_completed = true;
    store.update(&task).unwrap();
    let after_update = subscription.try_recv().unwrap();
    assert!(after_update.iter().any(|t| t.id == id && t.is_completed));

    store.delete_by_id(id).unwrap();
    assert_eq!(subscription.try_recv().unwrap().len(), 1);

    // Deleting a missing id changes nothing and emits nothing.
    store.delete_by_id(id).unwrap();
    assert!(subscription.try_recv().is_none());
}

#[test]
fn invalid_persisted_row_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO tasks (id, heading, created_at, updated_at, color) VALUES (3, 'odd', 1, 1, 'neon');",
        [],
    )
    .unwrap();

    assert!(matches!(store.get_by_id(3), Err(RepoError::InvalidData(_))));
    assert!(matches!(store.list_all(), Err(RepoError::InvalidData(_))));
}

#[test]
fn store_requires_migrated_schema() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteTaskStore::try_new(&conn),
        Err(RepoError::MissingRequiredTable("tasks"))
    ));
}

#[test]
fn unread_snapshots_collapse_to_the_latest() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let subscription = store.subscribe_all().unwrap();

    for index in 0..200 {
        store.insert(&Task::new(format!("task {index}"))).unwrap();
    }

    let mut pending = Vec::new();
    while let Some(snapshot) = subscription.try_recv() {
        pending.push(snapshot);
    }
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].len(), 200);
}
