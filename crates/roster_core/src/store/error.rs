//! Store error taxonomy.

use crate::db::DbError;
use crate::repo::{RecordRef, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by every store operation.
#[derive(Debug)]
pub enum StoreError {
    /// The database could not be opened or migrated.
    LoadFailure(DbError),
    /// The path cannot be shared by the view and queue connections.
    InvalidPath(PathBuf),
    /// The data directory could not be created.
    DataDir(std::io::Error),
    /// The background queue worker could not be started.
    WorkerSpawn(std::io::Error),
    /// A read failed or returned unusable rows.
    FetchObjectsFailure(RepoError),
    /// A mutation or its commit failed; the scope was rolled back.
    SaveFailure(RepoError),
    /// An opaque reference did not resolve inside the mutation scope.
    InvalidReference(RecordRef),
    /// The background queue stopped before the job produced a result.
    QueueClosed,
    /// A queue result was awaited on the queue worker itself.
    ReentrantWait,
}

impl StoreError {
    pub(crate) fn from_read(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(record) => Self::InvalidReference(record),
            other => Self::FetchObjectsFailure(other),
        }
    }

    pub(crate) fn from_write(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(record) => Self::InvalidReference(record),
            other => Self::SaveFailure(other),
        }
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LoadFailure(_) => "load_failure",
            Self::InvalidPath(_) => "invalid_path",
            Self::DataDir(_) => "data_dir_failed",
            Self::WorkerSpawn(_) => "worker_spawn_failed",
            Self::FetchObjectsFailure(_) => "fetch_objects_failure",
            Self::SaveFailure(_) => "save_failure",
            Self::InvalidReference(_) => "invalid_reference",
            Self::QueueClosed => "queue_closed",
            Self::ReentrantWait => "reentrant_wait",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFailure(err) => write!(f, "failed to load persistent store: {err}"),
            Self::InvalidPath(path) => write!(
                f,
                "store path `{}` must name a database file",
                path.display()
            ),
            Self::DataDir(err) => write!(f, "failed to create data directory: {err}"),
            Self::WorkerSpawn(err) => write!(f, "failed to start store queue: {err}"),
            Self::FetchObjectsFailure(err) => write!(f, "failed to fetch objects: {err}"),
            Self::SaveFailure(err) => write!(f, "failed to save context: {err}"),
            Self::InvalidReference(record) => write!(f, "invalid reference: {record}"),
            Self::QueueClosed => write!(f, "store queue is closed"),
            Self::ReentrantWait => {
                write!(f, "cannot wait on the store queue from inside a queue job")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LoadFailure(err) => Some(err),
            Self::InvalidPath(_) => None,
            Self::DataDir(err) => Some(err),
            Self::WorkerSpawn(err) => Some(err),
            Self::FetchObjectsFailure(err) => Some(err),
            Self::SaveFailure(err) => Some(err),
            Self::InvalidReference(_) => None,
            Self::QueueClosed => None,
            Self::ReentrantWait => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::LoadFailure(value)
    }
}
