//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define table-level data access contracts for groups/people and todos.
//! - Keep SQL details out of the store and its mutation scopes.
//!
//! # Invariants
//! - Repositories never open or commit transactions; the caller's mutation
//!   scope owns the transaction boundary.
//! - Missing targets surface as `RepoError::NotFound`, not as silent no-ops.

use crate::db::DbError;
use crate::model::group::{GroupId, PersonId};
use crate::model::todo::ToDoId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod group_repo;
pub mod todo_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Addressable record kinds, used for not-found reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    Group(GroupId),
    Person(PersonId),
    ToDo(ToDoId),
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group {id}"),
            Self::Person(id) => write!(f, "person {id}"),
            Self::ToDo(id) => write!(f, "todo {id}"),
        }
    }
}

/// Repository error shared by all roster tables.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(RecordRef),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(record) => write!(f, "{record} not found"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
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

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
