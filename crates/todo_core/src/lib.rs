//! Core domain logic for the to-do app.
//! Local storage is the source of truth; the cloud copy is a best-effort mirror.

pub mod board;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod sync;

pub use board::{reduce, BoardEvent, BoardState, TaskBoard};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::task::{Subtask, Task, TaskColor, TaskId, TaskPriority, TaskValidationError};
pub use query::engine::{apply_filters_and_sort, apply_filters_and_sort_at};
pub use query::params::{TaskFilter, TaskQuery, TaskSort};
pub use repo::live::TaskSubscription;
pub use repo::sync_repo::{SyncAwareTaskRepository, SyncError, SyncResult};
pub use repo::task_store::{RepoError, RepoResult, SqliteTaskStore, TaskStore};
pub use service::task_service::{user_message, NewTask, TaskEdit, TaskService, TaskServiceError};
pub use sync::cloud::{CloudError, CloudResult, CloudSyncAdapter, TaskDocument};
pub use sync::identity::{IdentityProvider, SessionIdentity, UserSession};
pub use sync::memory::InMemoryCloudStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
