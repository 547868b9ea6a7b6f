//! Presentation adapters over the store.
//!
//! # Responsibility
//! - Keep the last announced snapshot for index-based UI accessors.
//! - Validate user input and translate actions into store calls.
//!
//! # Invariants
//! - Snapshots are replaced wholesale on every notification.
//! - View-models never mutate snapshot records to change stored state.
//! - Users only ever see fixed alert titles; error detail goes to logs.

use crate::store::StoreError;
use crate::sync::SyncError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod people;
mod todos;

pub use people::PeopleViewModel;
pub use todos::ToDoViewModel;

/// Alert title for failed group/person loads.
pub const PEOPLE_ERROR_TITLE: &str = "Error fetching people";
/// Alert title for failed ToDo loads or syncs.
pub const TODO_ERROR_TITLE: &str = "Error getting ToDo data";
/// Alert title for rejected empty input.
pub const EMPTY_FIELD_TITLE: &str = "Empty field(s)";

/// Receives snapshot-refresh events from a view-model.
///
/// Called on the thread that produced the snapshot.
pub trait ViewModelDelegate: Send + Sync {
    /// A new snapshot (or a failure) arrived; the UI should reload.
    fn did_get_data(&self, error: Option<&(dyn Error + 'static)>);
}

#[derive(Debug)]
pub enum ViewModelError {
    /// A required text field was empty.
    EmptyField,
    /// An action needed a selected group (or pending completion) that is unset.
    NothingSelected,
    /// The index does not address a row in the current snapshot.
    IndexOutOfRange,
    Store(StoreError),
    Sync(SyncError),
}

impl ViewModelError {
    /// Whether the user's input was rejected before reaching the store.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyField | Self::NothingSelected)
    }
}

impl Display for ViewModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField => write!(f, "required field is empty"),
            Self::NothingSelected => write!(f, "no selection"),
            Self::IndexOutOfRange => write!(f, "index out of range"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ViewModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Sync(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ViewModelError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SyncError> for ViewModelError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

fn valid_entries(entries: &[&str]) -> bool {
    entries.iter().all(|entry| !entry.is_empty())
}
