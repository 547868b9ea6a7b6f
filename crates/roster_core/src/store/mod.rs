//! Persistence store: the single owner of group, person and ToDo state.
//!
//! # Responsibility
//! - Serve group reads and group/person CRUD on the view connection.
//! - Run ToDo work and person inserts on the serialized background queue.
//! - Announce full snapshots to observers on every fetch.
//!
//! # Invariants
//! - Every mutation runs in a `MutationScope` and ends with an explicit save
//!   whose result is returned to the caller.
//! - Only opaque ids cross between the caller and the queue.
//! - Both connections open the same file, so a queue commit is visible to
//!   the next view read.
//! - Notifications carry the whole current state; there is no diffing.

mod error;
mod merge;
mod notify;
mod queue;
mod scope;

pub use error::{StoreError, StoreResult};
pub use merge::MergeReport;
pub use notify::SubscriptionId;
pub use queue::Pending;
pub use scope::MutationScope;

use crate::config::StoreConfig;
use crate::db::open_db;
use crate::model::group::{EntityRef, Group, GroupId, PersonId};
use crate::model::todo::{ToDo, ToDoId, ToDoInput};
use crate::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use crate::repo::todo_repo::{SqliteToDoRepository, ToDoRepository};
use log::{error, info};
use notify::ObserverList;
use parking_lot::Mutex;
use queue::WorkQueue;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Explicitly constructed store; share it with `Arc<Store>`.
pub struct Store {
    path: PathBuf,
    view: Mutex<Connection>,
    queue: WorkQueue,
    group_observers: Arc<ObserverList<Group>>,
    todo_observers: Arc<ObserverList<ToDo>>,
}

impl Store {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// Opens the view connection first so migrations run once, then the
    /// background connection handed to the queue worker.
    ///
    /// # Errors
    /// - `StoreError::InvalidPath` for an empty path, `:memory:` or a
    ///   `file:` URI; both connections must reach the same file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !names_database_file(&path) {
            error!("event=store_open module=store status=error error_code=invalid_path");
            return Err(StoreError::InvalidPath(path));
        }
        let view = open_db(&path)?;
        let background = open_db(&path)?;
        let queue = WorkQueue::spawn(background)?;

        info!("event=store_open module=store status=ok");
        Ok(Self {
            path,
            view: Mutex::new(view),
            queue,
            group_observers: Arc::default(),
            todo_observers: Arc::default(),
        })
    }

    /// Opens the database described by `config`, creating its directory.
    pub fn open_with_config(config: &StoreConfig) -> StoreResult<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(|err| {
            error!(
                "event=store_open module=store status=error error_code=data_dir_failed error={}",
                err
            );
            StoreError::DataDir(err)
        })?;
        Self::open(config.db_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers a group observer; it receives every group snapshot.
    pub fn subscribe_groups(
        &self,
        observer: impl Fn(&StoreResult<Vec<Group>>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.group_observers.subscribe(observer)
    }

    pub fn unsubscribe_groups(&self, id: SubscriptionId) -> bool {
        self.group_observers.unsubscribe(id)
    }

    /// Registers a ToDo observer; it is called on the background queue.
    ///
    /// Waiting on a `Pending` inside the observer returns
    /// `StoreError::ReentrantWait`; re-dispatch instead.
    pub fn subscribe_todos(
        &self,
        observer: impl Fn(&StoreResult<Vec<ToDo>>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.todo_observers.subscribe(observer)
    }

    pub fn unsubscribe_todos(&self, id: SubscriptionId) -> bool {
        self.todo_observers.unsubscribe(id)
    }

    /// Reads all groups with their people and announces the result.
    ///
    /// Failures are announced too, then returned.
    pub fn fetch_groups(&self) -> StoreResult<Vec<Group>> {
        let started_at = Instant::now();
        let result = {
            let conn = self.view.lock();
            SqliteGroupRepository::new(&conn)
                .list_groups()
                .map_err(StoreError::from_read)
        };
        log_fetch("fetch_groups", started_at, &result, self.group_observers.len());
        self.group_observers.notify(&result);
        result
    }

    /// Creates a group and waits for the commit.
    ///
    /// Observers are not notified; call `fetch_groups` to see the change.
    pub fn insert_group(&self, name: &str) -> StoreResult<GroupId> {
        self.with_view_scope("insert_group", |scope| scope.insert_group(name))
    }

    /// Creates a person under `group` on the background queue and waits.
    ///
    /// The group is re-resolved inside the queue's own scope.
    ///
    /// # Errors
    /// - `StoreError::InvalidReference` when `group` does not resolve; no
    ///   person is created.
    pub fn insert_person(&self, name: &str, address: &str, group: GroupId) -> StoreResult<PersonId> {
        let name = name.to_string();
        let address = address.to_string();
        self.perform("insert_person", move |scope| {
            scope.insert_person(&name, &address, group)
        })
        .wait()
    }

    pub fn update_person(&self, person: PersonId, name: &str, address: &str) -> StoreResult<()> {
        self.with_view_scope("update_person", |scope| {
            scope.update_person(person, name, address)
        })
    }

    /// Deletes a group (cascading to its people) or one person.
    pub fn remove_entity(&self, entity: impl Into<EntityRef>) -> StoreResult<()> {
        let entity = entity.into();
        self.with_view_scope("remove_entity", |scope| scope.remove_entity(entity))
    }

    /// Reads all ToDos (ascending `id`) on the queue and announces them.
    pub fn fetch_todos(&self) -> Pending<Vec<ToDo>> {
        let observers = Arc::clone(&self.todo_observers);
        self.queue.submit("fetch_todos", move |conn| {
            let started_at = Instant::now();
            let result = SqliteToDoRepository::new(conn)
                .list_todos()
                .map_err(StoreError::from_read);
            log_fetch("fetch_todos", started_at, &result, observers.len());
            observers.notify(&result);
            result
        })
    }

    /// Merges remote records, skipping ids already stored, in one save.
    pub fn merge_todos(&self, incoming: Vec<ToDoInput>) -> Pending<MergeReport> {
        self.perform("merge_todos", move |scope| {
            let report = scope.merge_todos(incoming)?;
            info!(
                "event=merge_todos module=store status=ok received={} inserted={} skipped={}",
                report.received, report.inserted, report.skipped
            );
            Ok(report)
        })
    }

    pub fn update_todo(&self, id: ToDoId, title: &str, completed: bool) -> Pending<()> {
        let title = title.to_string();
        self.perform("update_todo", move |scope| {
            scope.update_todo(id, &title, completed)
        })
    }

    pub fn remove_todo(&self, id: ToDoId) -> Pending<()> {
        self.perform("remove_todo", move |scope| scope.remove_todo(id))
    }

    /// Batch-deletes every ToDo; succeeds on an empty table.
    pub fn remove_all_todos(&self) -> Pending<usize> {
        self.perform("remove_all_todos", |scope| scope.remove_all_todos())
    }

    /// Runs `job` in a fresh scope on the background queue and saves it.
    ///
    /// A job error skips the save, so the scope rolls back.
    pub fn perform<T, F>(&self, op: &'static str, job: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&MutationScope<'_>) -> StoreResult<T> + Send + 'static,
    {
        self.queue.submit(op, move |conn| {
            let scope = MutationScope::begin(conn)?;
            let value = job(&scope)?;
            scope.save()?;
            Ok(value)
        })
    }

    fn with_view_scope<T>(
        &self,
        op: &'static str,
        job: impl FnOnce(&MutationScope<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let mut conn = self.view.lock();
        let result = MutationScope::begin(&mut conn).and_then(|scope| {
            let value = job(&scope)?;
            scope.save()?;
            Ok(value)
        });
        match &result {
            Ok(_) => info!(
                "event={} module=store status=ok duration_ms={}",
                op,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={} module=store status=error duration_ms={} error_code={} error={}",
                op,
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }
}

fn names_database_file(path: &Path) -> bool {
    let raw = path.to_string_lossy();
    !(raw.trim().is_empty() || raw == ":memory:" || raw.starts_with("file:"))
}

fn log_fetch<T>(op: &str, started_at: Instant, result: &StoreResult<Vec<T>>, observers: usize) {
    match result {
        Ok(items) => info!(
            "event={} module=store status=ok count={} observers={} duration_ms={}",
            op,
            items.len(),
            observers,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={} module=store status=error observers={} duration_ms={} error_code={} error={}",
            op,
            observers,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
}
