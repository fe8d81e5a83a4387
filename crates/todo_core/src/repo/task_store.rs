//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable CRUD over the `tasks` table keyed by `TaskId`.
//! - Own timestamp stamping for inserts and updates.
//! - Publish a full snapshot to live subscribers after every mutation.
//!
//! # Invariants
//! - Write paths validate task content before SQL mutations.
//! - `created_at` is written once; updates keep the stored value.
//! - `updated_at` never goes below `created_at`, even if the clock goes back.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `list_all` and live snapshots are ordered by `created_at DESC, id DESC`.

use crate::clock::{Clock, SystemClock};
use crate::db::DbError;
use crate::model::task::{
    Subtask, Task, TaskColor, TaskId, TaskPriority, TaskValidationError, UNASSIGNED_TASK_ID,
};
use crate::repo::live::{SnapshotPublisher, TaskSubscription};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    heading,
    body,
    is_completed,
    created_at,
    updated_at,
    color,
    priority,
    due_date,
    tags_json,
    subtasks_json
FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Local persistence contract for tasks.
pub trait TaskStore {
    /// Stores `task` and returns its id.
    ///
    /// `UNASSIGNED_TASK_ID` asks the store for a fresh id; any other id is
    /// kept and fails when it already exists. Caller timestamps are ignored.
    fn insert(&self, task: &Task) -> RepoResult<TaskId>;
    /// Replaces editable fields of an existing task and bumps `updated_at`.
    fn update(&self, task: &Task) -> RepoResult<()>;
    /// Removes `task` by id. Removing a missing task is a no-op.
    fn delete(&self, task: &Task) -> RepoResult<()> {
        self.delete_by_id(task.id)
    }
    fn delete_by_id(&self, id: TaskId) -> RepoResult<()>;
    fn get_by_id(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// All tasks, newest `created_at` first.
    fn list_all(&self) -> RepoResult<Vec<Task>>;
    /// Live variant of [`TaskStore::list_all`].
    fn subscribe_all(&self) -> RepoResult<TaskSubscription>;
    fn count(&self) -> RepoResult<u64>;
    fn count_completed(&self) -> RepoResult<u64>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
    clock: Arc<dyn Clock>,
    publisher: SnapshotPublisher,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Constructs a store from a migrated connection using the system clock.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_clock(conn, Arc::new(SystemClock))
    }

    /// Constructs a store with an injected time source.
    pub fn with_clock(conn: &'conn Connection, clock: Arc<dyn Clock>) -> RepoResult<Self> {
        if !table_exists(conn, "tasks")? {
            return Err(RepoError::MissingRequiredTable("tasks"));
        }
        Ok(Self {
            conn,
            clock,
            publisher: SnapshotPublisher::new(),
        })
    }

    fn publish_snapshot(&self, event: &str) {
        if !self.publisher.has_subscribers() {
            return;
        }
        match self.list_all() {
            Ok(snapshot) => self.publisher.publish(&snapshot),
            Err(err) => error!(
                "event=live_query_publish module=repo status=error trigger={} error={}",
                event, err
            ),
        }
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate_content()?;
        let now = self.clock.now_ms();
        let tags_json = encode_json(&task.tags, "tags")?;
        let subtasks_json = encode_json(&task.subtasks, "subtasks")?;
        let explicit_id = (task.id != UNASSIGNED_TASK_ID).then_some(task.id);

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                heading,
                body,
                is_completed,
                created_at,
                updated_at,
                color,
                priority,
                due_date,
                tags_json,
                subtasks_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                explicit_id,
                task.heading.as_str(),
                task.body.as_str(),
                bool_to_int(task.is_completed),
                now,
                color_to_db(task.color),
                priority_to_db(task.priority),
                task.due_date,
                tags_json,
                subtasks_json,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("event=task_insert module=repo status=ok task_id={id}");
        self.publish_snapshot("insert");
        Ok(id)
    }

    fn update(&self, task: &Task) -> RepoResult<()> {
        task.validate_content()?;
        let now = self.clock.now_ms();
        let tags_json = encode_json(&task.tags, "tags")?;
        let subtasks_json = encode_json(&task.subtasks, "subtasks")?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                heading = ?1,
                body = ?2,
                is_completed = ?3,
                color = ?4,
                priority = ?5,
                due_date = ?6,
                tags_json = ?7,
                subtasks_json = ?8,
                updated_at = MAX(?9, created_at, updated_at)
             WHERE id = ?10;",
            params![
                task.heading.as_str(),
                task.body.as_str(),
                bool_to_int(task.is_completed),
                color_to_db(task.color),
                priority_to_db(task.priority),
                task.due_date,
                tags_json,
                subtasks_json,
                now,
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        debug!("event=task_update module=repo status=ok task_id={}", task.id);
        self.publish_snapshot("update");
        Ok(())
    }

    fn delete_by_id(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed > 0 {
            debug!("event=task_delete module=repo status=ok task_id={id}");
            self.publish_snapshot("delete");
        }
        Ok(())
    }

    fn get_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_all(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL} ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn subscribe_all(&self) -> RepoResult<TaskSubscription> {
        let initial = self.list_all()?;
        Ok(self.publisher.subscribe(initial))
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn count_completed(&self) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE is_completed = 1;",
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: TaskId = row.get("id")?;

    let color_text: String = row.get("color")?;
    let color = parse_color(&color_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid color `{color_text}` in tasks.color"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = parse_priority(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in tasks.priority"
        ))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` for task {id}"
            )));
        }
    };

    let tags_json: String = row.get("tags_json")?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid tags_json for task {id}: {err}"))
    })?;

    let subtasks_json: String = row.get("subtasks_json")?;
    let subtasks: Vec<Subtask> = serde_json::from_str(&subtasks_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid subtasks_json for task {id}: {err}"))
    })?;

    let task = Task {
        id,
        heading: row.get("heading")?,
        body: row.get("body")?,
        is_completed,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        color,
        priority,
        due_date: row.get("due_date")?,
        tags,
        subtasks,
    };
    task.validate()?;
    Ok(task)
}

fn encode_json<T: serde::Serialize>(value: &T, field: &str) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode task {field}: {err}")))
}

fn color_to_db(color: TaskColor) -> &'static str {
    match color {
        TaskColor::Default => "default",
        TaskColor::Transparent => "transparent",
        TaskColor::Red => "red",
        TaskColor::Orange => "orange",
        TaskColor::Yellow => "yellow",
        TaskColor::Green => "green",
        TaskColor::Teal => "teal",
        TaskColor::Blue => "blue",
        TaskColor::Indigo => "indigo",
        TaskColor::Purple => "purple",
        TaskColor::Pink => "pink",
        TaskColor::Brown => "brown",
        TaskColor::Gray => "gray",
    }
}

fn parse_color(value: &str) -> Option<TaskColor> {
    TaskColor::ALL
        .into_iter()
        .find(|color| color_to_db(*color) == value)
}

fn priority_to_db(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "low",
        TaskPriority::Medium => "medium",
        TaskPriority::High => "high",
        TaskPriority::Urgent => "urgent",
    }
}

fn parse_priority(value: &str) -> Option<TaskPriority> {
    match value {
        "low" => Some(TaskPriority::Low),
        "medium" => Some(TaskPriority::Medium),
        "high" => Some(TaskPriority::High),
        "urgent" => Some(TaskPriority::Urgent),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}
