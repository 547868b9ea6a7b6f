//! Local persistence and ToDo synchronization core for Roster.
//! This crate owns all group, person and ToDo state.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod sync;
pub mod viewmodel;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::group::{EntityRef, Group, GroupId, Person, PersonId};
pub use model::todo::{ToDo, ToDoId, ToDoInput};
pub use store::{
    MergeReport, MutationScope, Pending, Store, StoreError, StoreResult, SubscriptionId,
};
pub use sync::{
    DecodeError, FetchError, HttpFetcher, RemoteFetcher, SyncError, SyncHandle, SyncResult,
    Synchronizer,
};
pub use viewmodel::{PeopleViewModel, ToDoViewModel, ViewModelDelegate, ViewModelError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
