//! Remote ToDo synchronization.
//!
//! # Responsibility
//! - Define the remote fetch contract and its HTTP implementation.
//! - Run fetch -> decode -> merge -> notify as one unit of work.
//!
//! # Invariants
//! - A decode failure never reaches the store.
//! - No step is retried automatically.

pub mod fetcher;
pub mod synchronizer;

pub use fetcher::{FetchError, HttpFetcher, RemoteFetcher};
pub use synchronizer::{decode_todos, DecodeError, SyncError, SyncHandle, SyncResult, Synchronizer};
