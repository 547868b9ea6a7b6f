//! Synchronizer: refresh the local ToDo list from the remote endpoint.
//!
//! # Responsibility
//! - Fetch, decode and merge the remote collection as one unit of work.
//! - Keep the caller's thread free by running the cycle on its own thread.
//!
//! # Invariants
//! - Fetch errors reach the callback unchanged.
//! - Merge only starts after the whole payload decoded.
//! - A successful merge is followed by a ToDo fetch so observers refresh.

use crate::model::todo::ToDoInput;
use crate::store::{MergeReport, Store, StoreError};
use crate::sync::fetcher::{FetchError, RemoteFetcher};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

const SYNC_THREAD_NAME: &str = "roster-sync";

pub type SyncResult<T> = Result<T, SyncError>;

/// Malformed remote payload.
#[derive(Debug)]
pub struct DecodeError(serde_json::Error);

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to decode remote todos: {}", self.0)
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

/// Failure of one sync cycle, by stage.
#[derive(Debug)]
pub enum SyncError {
    Fetch(FetchError),
    Decode(DecodeError),
    Store(StoreError),
    /// The sync thread could not be started; the callback was not called.
    Spawn(std::io::Error),
}

impl SyncError {
    fn code(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch_failed",
            Self::Decode(_) => "decode_failed",
            Self::Store(err) => err.code(),
            Self::Spawn(_) => "spawn_failed",
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start sync: {err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Spawn(err) => Some(err),
        }
    }
}

impl From<FetchError> for SyncError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<DecodeError> for SyncError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Decodes the remote JSON array of ToDo objects.
pub fn decode_todos(body: &[u8]) -> Result<Vec<ToDoInput>, DecodeError> {
    serde_json::from_slice(body).map_err(DecodeError)
}

/// Join handle of a background sync cycle.
pub struct SyncHandle {
    thread: JoinHandle<()>,
}

impl SyncHandle {
    /// Waits until the cycle and its callback have finished.
    pub fn join(self) {
        if self.thread.join().is_err() {
            error!("event=sync_todos module=sync status=error error_code=sync_panicked");
        }
    }
}

/// Coordinates remote refreshes into one store.
#[derive(Clone)]
pub struct Synchronizer {
    store: Arc<Store>,
    fetcher: Arc<dyn RemoteFetcher>,
    url: String,
}

impl Synchronizer {
    pub fn new(store: Arc<Store>, fetcher: Arc<dyn RemoteFetcher>, url: impl Into<String>) -> Self {
        Self {
            store,
            fetcher,
            url: url.into(),
        }
    }

    /// Runs one sync cycle on a new thread and reports through `callback`.
    ///
    /// The callback runs on the sync thread; UI callers must re-dispatch.
    ///
    /// # Errors
    /// - `SyncError::Spawn` when the thread cannot start; `callback` is
    ///   dropped without being called.
    pub fn sync_todos(
        &self,
        callback: impl FnOnce(SyncResult<MergeReport>) + Send + 'static,
    ) -> SyncResult<SyncHandle> {
        let this = self.clone();
        let thread = std::thread::Builder::new()
            .name(SYNC_THREAD_NAME.to_string())
            .spawn(move || callback(this.sync_todos_blocking()))
            .map_err(SyncError::Spawn)?;
        Ok(SyncHandle { thread })
    }

    /// Runs one sync cycle on the calling thread.
    pub fn sync_todos_blocking(&self) -> SyncResult<MergeReport> {
        let started_at = Instant::now();
        info!("event=sync_todos module=sync status=start");

        let result = self.run_cycle();
        match &result {
            Ok(report) => {
                info!(
                    "event=sync_todos module=sync status=ok received={} inserted={} skipped={} duration_ms={}",
                    report.received,
                    report.inserted,
                    report.skipped,
                    started_at.elapsed().as_millis()
                );
                // Observers pick the refreshed list up from the queue.
                drop(self.store.fetch_todos());
            }
            Err(err) => error!(
                "event=sync_todos module=sync status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    fn run_cycle(&self) -> SyncResult<MergeReport> {
        let body = self.fetcher.fetch(&self.url)?;
        let incoming = decode_todos(&body)?;
        let report = self.store.merge_todos(incoming).wait()?;
        Ok(report)
    }
}
