//! Serialized background work queue.
//!
//! # Responsibility
//! - Own the background SQLite connection on one dedicated thread.
//! - Run submitted jobs strictly in submission order.
//!
//! # Invariants
//! - The background connection never leaves the worker thread.
//! - A job's result is delivered exactly once, through its `Pending`.
//! - A panicking job fails only its own `Pending`; the worker keeps running.
//! - Waiting on a `Pending` from the worker itself fails instead of blocking.
//! - Dropping the queue drains already-submitted jobs before the worker exits.

use crate::store::error::{StoreError, StoreResult};
use log::{debug, error, info};
use rusqlite::Connection;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{JoinHandle, ThreadId};
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "roster-store-queue";

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Handle to a result computed on the background queue.
///
/// Dropping it does not cancel the job.
#[must_use = "a pending result does nothing unless waited on; drop it explicitly to fire and forget"]
#[derive(Debug)]
pub struct Pending<T> {
    receiver: Receiver<StoreResult<T>>,
    worker: ThreadId,
}

impl<T> Pending<T> {
    /// Blocks until the job finishes and returns its result.
    ///
    /// # Errors
    /// - `StoreError::QueueClosed` when the worker stopped or the job
    ///   panicked before replying.
    /// - `StoreError::ReentrantWait` when called on the queue worker, e.g.
    ///   from a ToDo observer; the job itself still runs later.
    pub fn wait(self) -> StoreResult<T> {
        if std::thread::current().id() == self.worker {
            error!("event=queue_wait module=store status=error error_code=reentrant_wait");
            return Err(StoreError::ReentrantWait);
        }
        self.receiver.recv().unwrap_or(Err(StoreError::QueueClosed))
    }
}

pub(crate) struct WorkQueue {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl WorkQueue {
    pub(crate) fn spawn(mut conn: Connection) -> StoreResult<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                info!("event=queue_start module=store status=ok");
                while let Ok(job) = receiver.recv() {
                    if catch_unwind(AssertUnwindSafe(|| job(&mut conn))).is_err() {
                        error!("event=queue_job module=store status=error error_code=job_panicked");
                    }
                }
                info!("event=queue_stop module=store status=ok");
            })
            .map_err(StoreError::WorkerSpawn)?;

        Ok(Self {
            sender: Some(sender),
            worker_id: worker.thread().id(),
            worker: Some(worker),
        })
    }

    /// Enqueues one job; `op` names it in log events.
    pub(crate) fn submit<T, F>(&self, op: &'static str, job: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let (reply, receiver) = mpsc::sync_channel(1);
        let boxed: Job = Box::new(move |conn| {
            let started_at = Instant::now();
            let result = job(conn);
            match &result {
                Ok(_) => debug!(
                    "event=queue_job module=store status=ok op={} duration_ms={}",
                    op,
                    started_at.elapsed().as_millis()
                ),
                Err(err) => error!(
                    "event=queue_job module=store status=error op={} duration_ms={} error_code={} error={}",
                    op,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                ),
            }
            // The caller may have dropped its handle.
            let _ = reply.send(result);
        });

        match &self.sender {
            Some(sender) if sender.send(boxed).is_ok() => {}
            _ => error!(
                "event=queue_submit module=store status=error op={} error_code=queue_closed",
                op
            ),
        }
        Pending {
            receiver,
            worker: self.worker_id,
        }
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        drop(self.sender.take());
        let Some(worker) = self.worker.take() else {
            return;
        };
        // Dropped from inside a job: the worker exits once the job returns.
        if std::thread::current().id() == self.worker_id {
            return;
        }
        if worker.join().is_err() {
            error!("event=queue_stop module=store status=error error_code=worker_panicked");
        }
    }
}
