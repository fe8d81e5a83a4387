//! In-process cloud collection.
//!
//! Backs the CLI probe and tests. Documents are stored as raw JSON values so
//! malformed records can be planted and the drop-on-decode path exercised.

use crate::clock::{Clock, SystemClock};
use crate::model::task::{Task, TaskId};
use crate::sync::cloud::{CloudError, CloudResult, CloudSyncAdapter, TaskDocument};
use log::warn;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct CloudState {
    users: HashMap<String, BTreeMap<String, Value>>,
    offline: bool,
    injected_failures: VecDeque<CloudError>,
    write_calls: u64,
}

/// Thread-safe in-memory implementation of [`CloudSyncAdapter`].
pub struct InMemoryCloudStore {
    state: Mutex<CloudState>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCloudStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCloudStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Uses `clock` to stamp `lastModified`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CloudState::default()),
            clock,
        }
    }

    /// While offline, every call fails with `CloudError::Network`.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Queues an error returned by the next call, whatever its kind.
    pub fn fail_next(&self, error: CloudError) {
        self.lock().injected_failures.push_back(error);
    }

    /// Plants a raw document, bypassing encoding.
    pub fn put_raw_document(&self, user_id: &str, key: impl Into<String>, document: Value) {
        self.lock()
            .users
            .entry(user_id.to_string())
            .or_default()
            .insert(key.into(), document);
    }

    /// Raw document for one task id, if present.
    pub fn document(&self, user_id: &str, task_id: TaskId) -> Option<Value> {
        self.lock()
            .users
            .get(user_id)
            .and_then(|docs| docs.get(&task_id.to_string()).cloned())
    }

    pub fn document_count(&self, user_id: &str) -> usize {
        self.lock().users.get(user_id).map_or(0, BTreeMap::len)
    }

    /// Number of upsert/delete/bulk calls that reached the store.
    pub fn write_calls(&self) -> u64 {
        self.lock().write_calls
    }

    fn lock(&self) -> MutexGuard<'_, CloudState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn encode(&self, task: &Task) -> CloudResult<Value> {
        serde_json::to_value(TaskDocument::from_task(task, self.clock.now_ms())).map_err(|err| {
            CloudError::Rejected {
                code: "invalid_document".to_string(),
                message: err.to_string(),
            }
        })
    }
}

impl CloudState {
    fn check_available(&mut self) -> CloudResult<()> {
        if let Some(error) = self.injected_failures.pop_front() {
            return Err(error);
        }
        if self.offline {
            return Err(CloudError::Network("no internet connection".to_string()));
        }
        Ok(())
    }
}

impl CloudSyncAdapter for InMemoryCloudStore {
    fn upsert(&self, user_id: &str, task: &Task) -> CloudResult<()> {
        let document = self.encode(task)?;
        let mut state = self.lock();
        state.check_available()?;
        state.write_calls += 1;
        state
            .users
            .entry(user_id.to_string())
            .or_default()
            .insert(task.id.to_string(), document);
        Ok(())
    }

    fn delete(&self, user_id: &str, task_id: TaskId) -> CloudResult<()> {
        let mut state = self.lock();
        state.check_available()?;
        state.write_calls += 1;
        if let Some(documents) = state.users.get_mut(user_id) {
            documents.remove(&task_id.to_string());
        }
        Ok(())
    }

    fn fetch_all(&self, user_id: &str) -> CloudResult<Vec<Task>> {
        let now_ms = self.clock.now_ms();
        let raw: Vec<(String, Value)> = {
            let mut state = self.lock();
            state.check_available()?;
            state
                .users
                .get(user_id)
                .map(|docs| {
                    docs.iter()
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut tasks = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            match TaskDocument::decode(value, now_ms) {
                Some(task) => tasks.push(task),
                None => warn!(
                    "event=cloud_decode module=sync status=dropped document_key={}",
                    key
                ),
            }
        }
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    fn bulk_upsert(&self, user_id: &str, tasks: &[Task]) -> CloudResult<()> {
        let documents = tasks
            .iter()
            .map(|task| -> CloudResult<(String, Value)> {
                Ok((task.id.to_string(), self.encode(task)?))
            })
            .collect::<CloudResult<Vec<_>>>()?;

        let mut state = self.lock();
        state.check_available()?;
        state.write_calls += 1;
        state
            .users
            .entry(user_id.to_string())
            .or_default()
            .extend(documents);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryCloudStore;
    use crate::model::task::Task;
    use crate::sync::cloud::{CloudError, CloudSyncAdapter};

    fn stored(id: i64, heading: &str, created_at: i64) -> Task {
        let mut task = Task::new(heading);
        task.id = id;
        task.created_at = created_at;
        task.updated_at = created_at;
        task
    }

    #[test]
    fn namespaces_are_per_user() {
        let cloud = InMemoryCloudStore::new();
        cloud.upsert("alice", &stored(1, "alice task", 10)).unwrap();
        cloud.upsert("bob", &stored(1, "bob task", 10)).unwrap();

        let alice = cloud.fetch_all("alice").unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].heading, "alice task");
        assert!(cloud.fetch_all("carol").unwrap().is_empty());
    }

    #[test]
    fn bulk_upsert_is_all_or_nothing_when_unavailable() {
        let cloud = InMemoryCloudStore::new();
        cloud.fail_next(CloudError::Unavailable("maintenance".to_string()));
        let err = cloud
            .bulk_upsert("alice", &[stored(1, "a", 1), stored(2, "b", 2)])
            .unwrap_err();
        assert_eq!(err, CloudError::Unavailable("maintenance".to_string()));
        assert_eq!(cloud.document_count("alice"), 0);

        cloud
            .bulk_upsert("alice", &[stored(1, "a", 1), stored(2, "b", 2)])
            .unwrap();
        assert_eq!(cloud.document_count("alice"), 2);
    }

    #[test]
    fn fetch_all_orders_newest_first() {
        let cloud = InMemoryCloudStore::new();
        cloud.upsert("u", &stored(1, "old", 100)).unwrap();
        cloud.upsert("u", &stored(2, "new", 300)).unwrap();
        cloud.upsert("u", &stored(3, "mid", 200)).unwrap();

        let headings: Vec<String> = cloud
            .fetch_all("u")
            .unwrap()
            .into_iter()
            .map(|task| task.heading)
            .collect();
        assert_eq!(headings, vec!["new", "mid", "old"]);
    }
}
