//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate core results into flat envelopes with fixed user messages.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Ids cross the boundary as strings (groups, people) or `i64` (ToDos).
//! - Error detail goes to the log; envelopes carry alert titles only.

use log::error;
use once_cell::sync::OnceCell;
use roster_core::viewmodel::{EMPTY_FIELD_TITLE, PEOPLE_ERROR_TITLE, TODO_ERROR_TITLE};
use roster_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Group, GroupId, HttpFetcher, Person, PersonId, Store, StoreConfig, StoreError, Synchronizer,
    ToDo,
};
use std::sync::Arc;

const INVALID_ID_MESSAGE: &str = "Unknown record";

struct Runtime {
    store: Arc<Store>,
    synchronizer: Synchronizer,
}

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created record, when the action created one.
    pub id: Option<String>,
    /// Alert title on failure, empty on success.
    pub message: String,
}

impl ActionResponse {
    fn success(id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonItem {
    pub id: String,
    pub name: String,
    pub address: String,
}

/// One list section: a group and its people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupItem {
    pub id: String,
    pub name: String,
    pub people: Vec<PersonItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListResponse {
    pub ok: bool,
    pub groups: Vec<GroupItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDoItem {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub completed: bool,
    /// Pre-formatted `"<id>: <title>"` cell label.
    pub cell_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDoListResponse {
    pub ok: bool,
    pub items: Vec<ToDoItem>,
    pub message: String,
}

/// Outcome of one remote refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResponse {
    pub ok: bool,
    pub received: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub message: String,
}

/// Lists all groups with their people.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn group_list() -> GroupListResponse {
    match runtime().and_then(|rt| rt.store.fetch_groups()) {
        Ok(groups) => GroupListResponse {
            ok: true,
            groups: groups.into_iter().map(to_group_item).collect(),
            message: String::new(),
        },
        Err(err) => {
            log_failure("group_list", &err);
            GroupListResponse {
                ok: false,
                groups: Vec::new(),
                message: PEOPLE_ERROR_TITLE.to_string(),
            }
        }
    }
}

/// Creates a group; returns its id.
#[flutter_rust_bridge::frb(sync)]
pub fn group_create(name: String) -> ActionResponse {
    let name = name.trim();
    if name.is_empty() {
        return ActionResponse::failure(EMPTY_FIELD_TITLE);
    }
    people_action("group_create", || {
        runtime()?
            .store
            .insert_group(name)
            .map(|id| Some(id.to_string()))
    })
}

/// Deletes a group and all of its people.
#[flutter_rust_bridge::frb(sync)]
pub fn group_delete(group_id: String) -> ActionResponse {
    let Some(id) = GroupId::parse(&group_id) else {
        return ActionResponse::failure(INVALID_ID_MESSAGE);
    };
    people_action("group_delete", || {
        runtime()?.store.remove_entity(id).map(|()| None)
    })
}

/// Creates a person under `group_id`; returns the person id.
#[flutter_rust_bridge::frb(sync)]
pub fn person_create(group_id: String, name: String, address: String) -> ActionResponse {
    let (name, address) = (name.trim(), address.trim());
    if name.is_empty() || address.is_empty() {
        return ActionResponse::failure(EMPTY_FIELD_TITLE);
    }
    let Some(group) = GroupId::parse(&group_id) else {
        return ActionResponse::failure(INVALID_ID_MESSAGE);
    };
    people_action("person_create", || {
        runtime()?
            .store
            .insert_person(name, address, group)
            .map(|id| Some(id.to_string()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn person_update(person_id: String, name: String, address: String) -> ActionResponse {
    let (name, address) = (name.trim(), address.trim());
    if name.is_empty() || address.is_empty() {
        return ActionResponse::failure(EMPTY_FIELD_TITLE);
    }
    let Some(id) = PersonId::parse(&person_id) else {
        return ActionResponse::failure(INVALID_ID_MESSAGE);
    };
    people_action("person_update", || {
        runtime()?
            .store
            .update_person(id, name, address)
            .map(|()| None)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn person_delete(person_id: String) -> ActionResponse {
    let Some(id) = PersonId::parse(&person_id) else {
        return ActionResponse::failure(INVALID_ID_MESSAGE);
    };
    people_action("person_delete", || {
        runtime()?.store.remove_entity(id).map(|()| None)
    })
}

/// Lists stored ToDos in ascending id order.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list() -> ToDoListResponse {
    match runtime().and_then(|rt| rt.store.fetch_todos().wait()) {
        Ok(todos) => ToDoListResponse {
            ok: true,
            items: todos.into_iter().map(to_todo_item).collect(),
            message: String::new(),
        },
        Err(err) => {
            log_failure("todo_list", &err);
            ToDoListResponse {
                ok: false,
                items: Vec::new(),
                message: TODO_ERROR_TITLE.to_string(),
            }
        }
    }
}

/// Fetches the remote collection and merges it into the store.
///
/// # FFI contract
/// - Async call (network bound); FRB runs it off the UI thread.
/// - Never panics.
pub fn todo_sync() -> SyncResponse {
    let result = runtime()
        .map_err(roster_core::SyncError::from)
        .and_then(|rt| rt.synchronizer.sync_todos_blocking());
    match result {
        Ok(report) => SyncResponse {
            ok: true,
            received: saturating_u32(report.received),
            inserted: saturating_u32(report.inserted),
            skipped: saturating_u32(report.skipped),
            message: String::new(),
        },
        Err(err) => {
            log_failure("todo_sync", &err);
            SyncResponse {
                ok: false,
                received: 0,
                inserted: 0,
                skipped: 0,
                message: TODO_ERROR_TITLE.to_string(),
            }
        }
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_update(id: i64, title: String, completed: bool) -> ActionResponse {
    let title = title.trim();
    if title.is_empty() {
        return ActionResponse::failure(EMPTY_FIELD_TITLE);
    }
    todo_action("todo_update", || {
        runtime()?.store.update_todo(id, title, completed).wait()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(id: i64) -> ActionResponse {
    todo_action("todo_delete", || runtime()?.store.remove_todo(id).wait())
}

/// Deletes every stored ToDo.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_clear_all() -> ActionResponse {
    todo_action("todo_clear_all", || {
        runtime()?.store.remove_all_todos().wait().map(|_| ())
    })
}

fn runtime() -> Result<&'static Runtime, StoreError> {
    RUNTIME.get_or_try_init(|| {
        let config = StoreConfig::from_env();
        let store = Arc::new(Store::open_with_config(&config)?);
        let synchronizer = Synchronizer::new(
            Arc::clone(&store),
            Arc::new(HttpFetcher::new()),
            config.todo_url,
        );
        Ok(Runtime {
            store,
            synchronizer,
        })
    })
}

fn people_action(
    op: &str,
    f: impl FnOnce() -> Result<Option<String>, StoreError>,
) -> ActionResponse {
    match f() {
        Ok(id) => ActionResponse::success(id),
        Err(err) => {
            log_failure(op, &err);
            ActionResponse::failure(failure_title(&err, PEOPLE_ERROR_TITLE))
        }
    }
}

fn todo_action(op: &str, f: impl FnOnce() -> Result<(), StoreError>) -> ActionResponse {
    match f() {
        Ok(()) => ActionResponse::success(None),
        Err(err) => {
            log_failure(op, &err);
            ActionResponse::failure(failure_title(&err, TODO_ERROR_TITLE))
        }
    }
}

fn failure_title(err: &StoreError, fallback: &'static str) -> &'static str {
    match err {
        StoreError::InvalidReference(_) => INVALID_ID_MESSAGE,
        _ => fallback,
    }
}

fn log_failure(op: &str, err: &dyn std::error::Error) {
    error!("event={op} module=ffi status=error error={err}");
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_group_item(group: Group) -> GroupItem {
    GroupItem {
        id: group.id.to_string(),
        name: group.name,
        people: group.people.into_iter().map(to_person_item).collect(),
    }
}

fn to_person_item(person: Person) -> PersonItem {
    PersonItem {
        id: person.id.to_string(),
        name: person.name.unwrap_or_default(),
        address: person.address.unwrap_or_default(),
    }
}

fn to_todo_item(todo: ToDo) -> ToDoItem {
    ToDoItem {
        cell_title: todo.cell_title(),
        id: todo.id,
        user_id: todo.user_id,
        title: todo.title.unwrap_or_default(),
        completed: todo.completed,
    }
}
