//! Sync-aware task repository.
//!
//! # Responsibility
//! - Present one CRUD + live-query surface over the local task store.
//! - Mirror every successful local mutation to the signed-in user's cloud
//!   collection, best effort.
//! - Run explicit pull/push synchronisation on request.
//!
//! # Invariants
//! - A remote failure never fails or rolls back a local operation.
//! - Mirror jobs are queued only after the local write succeeded.
//! - `sync_from_cloud`/`sync_to_cloud` check identity before any remote call.
//! - Mirrored upserts carry the stored task (assigned id, store timestamps).

use crate::model::task::{Task, TaskId};
use crate::repo::live::TaskSubscription;
use crate::repo::task_store::{RepoError, RepoResult, TaskStore};
use crate::sync::cloud::{CloudError, CloudSyncAdapter};
use crate::sync::identity::IdentityProvider;
use crate::sync::mirror::{MirrorDispatcher, MirrorJob};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type SyncResult<T> = Result<T, SyncError>;

/// Failure of an explicit sync request.
#[derive(Debug)]
pub enum SyncError {
    /// No user is signed in; no remote call was made.
    NotSignedIn,
    Cloud(CloudError),
    Repo(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSignedIn => write!(f, "user not signed in"),
            Self::Cloud(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotSignedIn => None,
            Self::Cloud(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<CloudError> for SyncError {
    fn from(value: CloudError) -> Self {
        Self::Cloud(value)
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Outcome counters of one `sync_from_cloud` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PullStats {
    inserted: usize,
    updated: usize,
    dropped: usize,
}

/// Local-first repository with best-effort cloud mirroring.
pub struct SyncAwareTaskRepository<S: TaskStore> {
    store: S,
    cloud: Arc<dyn CloudSyncAdapter>,
    identity: Arc<dyn IdentityProvider>,
    mirror: MirrorDispatcher,
}

impl<S: TaskStore> SyncAwareTaskRepository<S> {
    /// Wraps `store` and starts the background mirror worker.
    pub fn new(
        store: S,
        cloud: Arc<dyn CloudSyncAdapter>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let mirror = MirrorDispatcher::start(Arc::clone(&cloud));
        Self {
            store,
            cloud,
            identity,
            mirror,
        }
    }

    /// Live list of all tasks, newest `created_at` first.
    pub fn get_all_tasks(&self) -> RepoResult<TaskSubscription> {
        self.store.subscribe_all()
    }

    /// One-shot copy of the current list, same order as the live query.
    pub fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        self.store.list_all()
    }

    pub fn get_task_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.store.get_by_id(id)
    }

    /// Inserts `task` and returns the store-assigned id.
    ///
    /// Caller-supplied timestamps are discarded.
    pub fn insert_task(&self, task: &Task) -> RepoResult<TaskId> {
        let id = self.store.insert(task)?;
        self.mirror_upsert(id);
        Ok(id)
    }

    /// Updates `task`; `id` and `created_at` never change.
    pub fn update_task(&self, task: &Task) -> RepoResult<()> {
        self.store.update(task)?;
        self.mirror_upsert(task.id);
        Ok(())
    }

    pub fn delete_task(&self, task: &Task) -> RepoResult<()> {
        self.store.delete(task)?;
        self.mirror_delete(task.id);
        Ok(())
    }

    pub fn delete_task_by_id(&self, id: TaskId) -> RepoResult<()> {
        self.store.delete_by_id(id)?;
        self.mirror_delete(id);
        Ok(())
    }

    /// Sets the completion flag and returns the stored task.
    pub fn toggle_task_completion(&self, id: TaskId, is_completed: bool) -> RepoResult<Task> {
        let mut task = self.store.get_by_id(id)?.ok_or(RepoError::NotFound(id))?;
        task.is_completed = is_completed;
        self.update_task(&task)?;
        self.store.get_by_id(id)?.ok_or(RepoError::NotFound(id))
    }

    pub fn get_task_count(&self) -> RepoResult<u64> {
        self.store.count()
    }

    pub fn get_completed_task_count(&self) -> RepoResult<u64> {
        self.store.count_completed()
    }

    /// Pulls the signed-in user's cloud tasks into the local store.
    ///
    /// Each remote task is inserted, or updated when the insert fails (for
    /// example on an id collision). Tasks that fail both are logged and
    /// skipped. Returns the fetched remote list.
    ///
    /// # Errors
    /// - `NotSignedIn` before any remote call when no user is signed in.
    /// - `Cloud` when the remote fetch fails; the local store is untouched.
    pub fn sync_from_cloud(&self) -> SyncResult<Vec<Task>> {
        let user_id = self.require_user("sync_from_cloud")?;
        let remote = self.cloud.fetch_all(&user_id).map_err(|err| {
            warn!(
                "event=sync_from_cloud module=repo status=error stage=fetch error={}",
                err
            );
            err
        })?;

        let mut stats = PullStats::default();
        for task in &remote {
            match self.store.insert(task) {
                Ok(_) => stats.inserted += 1,
                Err(insert_err) => match self.store.update(task) {
                    Ok(()) => stats.updated += 1,
                    Err(update_err) => {
                        stats.dropped += 1;
                        warn!(
                            "event=sync_from_cloud module=repo status=skipped task_id={} insert_error={} update_error={}",
                            task.id, insert_err, update_err
                        );
                    }
                },
            }
        }

        info!(
            "event=sync_from_cloud module=repo status=ok fetched={} inserted={} updated={} dropped={}",
            remote.len(),
            stats.inserted,
            stats.updated,
            stats.dropped
        );
        Ok(remote)
    }

    /// Pushes `tasks` to the signed-in user's collection in one batch.
    pub fn sync_to_cloud(&self, tasks: &[Task]) -> SyncResult<()> {
        let user_id = self.require_user("sync_to_cloud")?;
        match self.cloud.bulk_upsert(&user_id, tasks) {
            Ok(()) => {
                info!(
                    "event=sync_to_cloud module=repo status=ok count={}",
                    tasks.len()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=sync_to_cloud module=repo status=error count={} error={}",
                    tasks.len(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Blocks until mirror jobs queued so far have been attempted.
    pub fn flush_mirror(&self) {
        self.mirror.flush();
    }

    fn require_user(&self, event: &str) -> SyncResult<String> {
        self.identity.current_user_id().ok_or_else(|| {
            info!("event={event} module=repo status=rejected reason=not_signed_in");
            SyncError::NotSignedIn
        })
    }

    fn mirror_upsert(&self, id: TaskId) {
        let Some(user_id) = self.identity.current_user_id() else {
            return;
        };
        match self.store.get_by_id(id) {
            Ok(Some(task)) => self.mirror.dispatch(MirrorJob::Upsert { user_id, task }),
            Ok(None) => warn!(
                "event=cloud_mirror module=repo status=skipped task_id={} reason=missing_after_write",
                id
            ),
            Err(err) => warn!(
                "event=cloud_mirror module=repo status=skipped task_id={} reason=read_back_failed error={}",
                id, err
            ),
        }
    }

    fn mirror_delete(&self, task_id: TaskId) {
        if let Some(user_id) = self.identity.current_user_id() {
            self.mirror.dispatch(MirrorJob::Delete { user_id, task_id });
        }
    }
}
