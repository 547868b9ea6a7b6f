use parking_lot::Mutex;
use roster_core::{
    FetchError, RemoteFetcher, Store, StoreConfig, SyncError, Synchronizer, ToDoInput,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const TEST_URL: &str = "http://todos.test/todos";

/// Serves a canned body and records requested URLs.
struct CannedFetcher {
    response: Result<Vec<u8>, FetchError>,
    requests: Mutex<Vec<String>>,
}

impl CannedFetcher {
    fn body(body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(body.as_bytes().to_vec()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(error: FetchError) -> Arc<Self> {
        Arc::new(Self {
            response: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }
}

impl RemoteFetcher for CannedFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().push(url.to_string());
        self.response.clone()
    }
}

fn open_store() -> (TempDir, Arc<Store>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open_with_config(&StoreConfig::in_dir(dir.path())).unwrap();
    (dir, Arc::new(store))
}

fn seed(store: &Store, ids: &[i64]) {
    let batch = ids
        .iter()
        .map(|&id| ToDoInput {
            user_id: 1,
            id,
            title: Some(format!("seed {id}")),
            completed: false,
        })
        .collect();
    store.merge_todos(batch).wait().unwrap();
}

#[test]
fn sync_merges_remote_records_into_the_store() {
    let (_dir, store) = open_store();
    seed(&store, &[1, 2]);
    let fetcher = CannedFetcher::body(
        r#"[
            {"userId": 1, "id": 2, "title": "remote b", "completed": true},
            {"userId": 2, "id": 3, "title": "remote c", "completed": false}
        ]"#,
    );
    let synchronizer = Synchronizer::new(Arc::clone(&store), fetcher.clone(), TEST_URL);

    let report = synchronizer.sync_todos_blocking().unwrap();
    assert_eq!(report.received, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(*fetcher.requests.lock(), vec![TEST_URL.to_string()]);

    let todos = store.fetch_todos().wait().unwrap();
    assert_eq!(todos.iter().map(|todo| todo.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(todos[1].title.as_deref(), Some("seed 2"));
}

#[test]
fn fetch_failure_is_reported_unchanged() {
    let (_dir, store) = open_store();
    seed(&store, &[1]);
    let synchronizer = Synchronizer::new(
        Arc::clone(&store),
        CannedFetcher::failing(FetchError::Status(503)),
        TEST_URL,
    );

    match synchronizer.sync_todos_blocking() {
        Err(SyncError::Fetch(err)) => {
            assert_eq!(err, FetchError::Status(503));
            assert_eq!(err.to_string(), "Error getting data from URL");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(store.fetch_todos().wait().unwrap().len(), 1);
}

#[test]
fn decode_failure_leaves_the_store_untouched() {
    let (_dir, store) = open_store();
    seed(&store, &[1]);
    let synchronizer = Synchronizer::new(
        Arc::clone(&store),
        CannedFetcher::body(r#"[{"userId": 1, "id": 5}, {"id": "oops"}]"#),
        TEST_URL,
    );

    let err = synchronizer.sync_todos_blocking().unwrap_err();
    assert!(matches!(err, SyncError::Decode(_)), "{err}");

    let todos = store.fetch_todos().wait().unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, 1);
}

#[test]
fn successful_sync_refreshes_todo_observers() {
    let (_dir, store) = open_store();
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);
    store.subscribe_todos(move |result| {
        if matches!(result, Ok(todos) if !todos.is_empty()) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    let synchronizer = Synchronizer::new(
        Arc::clone(&store),
        CannedFetcher::body(r#"[{"userId": 1, "id": 1, "title": "a", "completed": false}]"#),
        TEST_URL,
    );

    synchronizer.sync_todos_blocking().unwrap();
    // Queue jobs run in order, so the sync's own refresh has run by now.
    store.remove_all_todos().wait().unwrap();

    assert_eq!(notifications.load(Ordering::SeqCst), 1);
}

#[test]
fn sync_todos_runs_off_the_calling_thread() {
    let (_dir, store) = open_store();
    let synchronizer = Synchronizer::new(
        Arc::clone(&store),
        CannedFetcher::body(r#"[{"userId": 1, "id": 9, "title": null}]"#),
        TEST_URL,
    );
    let caller = std::thread::current().id();
    let (sender, receiver) = mpsc::channel();

    let handle = synchronizer
        .sync_todos(move |result| {
            let on_caller = std::thread::current().id() == caller;
            sender.send((result.map(|report| report.inserted), on_caller)).unwrap();
        })
        .unwrap();
    let (inserted, on_caller) = receiver.recv_timeout(Duration::from_secs(10)).unwrap();
    handle.join();

    assert_eq!(inserted.unwrap(), 1);
    assert!(!on_caller);
    let todos = store.fetch_todos().wait().unwrap();
    assert_eq!(todos[0].title, None);
    assert!(!todos[0].completed);
}
