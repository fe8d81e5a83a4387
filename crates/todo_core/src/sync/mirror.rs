//! Fire-and-forget cloud mirroring.
//!
//! # Responsibility
//! - Run mirror writes on one background worker so local calls never wait on
//!   the network.
//! - Log and discard every mirror failure.
//!
//! # Invariants
//! - Jobs run in dispatch order.
//! - A failed job is never retried and never reported to the dispatcher.
//! - Dropping the dispatcher drains queued jobs and joins the worker.

use crate::model::task::{Task, TaskId};
use crate::sync::cloud::{CloudResult, CloudSyncAdapter};
use log::{debug, error, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "todo-cloud-mirror";

/// One best-effort remote write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorJob {
    Upsert { user_id: String, task: Task },
    Delete { user_id: String, task_id: TaskId },
}

impl MirrorJob {
    fn op(&self) -> &'static str {
        match self {
            Self::Upsert { .. } => "upsert",
            Self::Delete { .. } => "delete",
        }
    }

    fn task_id(&self) -> TaskId {
        match self {
            Self::Upsert { task, .. } => task.id,
            Self::Delete { task_id, .. } => *task_id,
        }
    }
}

enum Command {
    Run(MirrorJob),
    Flush(Sender<()>),
}

/// Handle to the background mirror worker.
pub struct MirrorDispatcher {
    sender: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl MirrorDispatcher {
    /// Spawns the worker thread.
    ///
    /// When the thread cannot be spawned the dispatcher still works but drops
    /// every job with an error log, keeping local operations unaffected.
    pub fn start(cloud: Arc<dyn CloudSyncAdapter>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(cloud.as_ref(), receiver));

        match spawned {
            Ok(worker) => Self {
                sender: Some(sender),
                worker: Some(worker),
            },
            Err(err) => {
                error!(
                    "event=cloud_mirror_start module=sync status=error error={}",
                    err
                );
                Self {
                    sender: None,
                    worker: None,
                }
            }
        }
    }

    /// Queues `job` and returns immediately.
    pub fn dispatch(&self, job: MirrorJob) {
        let op = job.op();
        let task_id = job.task_id();
        let queued = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(Command::Run(job)).is_ok());
        if !queued {
            warn!(
                "event=cloud_mirror module=sync status=dropped op={} task_id={} reason=worker_unavailable",
                op, task_id
            );
        }
    }

    /// Blocks until every job dispatched before this call has been attempted.
    pub fn flush(&self) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };
        let (ack_sender, ack_receiver) = mpsc::channel();
        if sender.send(Command::Flush(ack_sender)).is_ok() {
            let _ = ack_receiver.recv();
        }
    }
}

impl Drop for MirrorDispatcher {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=cloud_mirror_stop module=sync status=error reason=worker_panicked");
            }
        }
    }
}

fn run_worker(cloud: &dyn CloudSyncAdapter, receiver: Receiver<Command>) {
    for command in receiver {
        match command {
            Command::Run(job) => {
                let op = job.op();
                let task_id = job.task_id();
                match execute(cloud, job) {
                    Ok(()) => debug!(
                        "event=cloud_mirror module=sync status=ok op={} task_id={}",
                        op, task_id
                    ),
                    Err(err) => warn!(
                        "event=cloud_mirror module=sync status=error op={} task_id={} error={}",
                        op, task_id, err
                    ),
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

fn execute(cloud: &dyn CloudSyncAdapter, job: MirrorJob) -> CloudResult<()> {
    match job {
        MirrorJob::Upsert { user_id, task } => cloud.upsert(&user_id, &task),
        MirrorJob::Delete { user_id, task_id } => cloud.delete(&user_id, task_id),
    }
}
