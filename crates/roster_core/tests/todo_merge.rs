use parking_lot::Mutex;
use roster_core::{MergeReport, Store, StoreConfig, StoreError, ToDo, ToDoInput};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn open_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open_with_config(&StoreConfig::in_dir(dir.path())).unwrap();
    (dir, store)
}

fn input(id: i64, title: &str) -> ToDoInput {
    ToDoInput {
        user_id: 1,
        id,
        title: Some(title.to_string()),
        completed: false,
    }
}

fn ids(todos: &[ToDo]) -> Vec<i64> {
    todos.iter().map(|todo| todo.id).collect()
}

#[test]
fn merge_skips_ids_already_stored() {
    let (_dir, store) = open_store();
    store
        .merge_todos(vec![input(1, "a"), input(2, "b")])
        .wait()
        .unwrap();

    let report = store
        .merge_todos(vec![input(2, "b2"), input(3, "c")])
        .wait()
        .unwrap();
    assert_eq!(
        report,
        MergeReport {
            received: 2,
            inserted: 1,
            skipped: 1
        }
    );

    let todos = store.fetch_todos().wait().unwrap();
    assert_eq!(ids(&todos), vec![1, 2, 3]);
    assert_eq!(todos[1].title.as_deref(), Some("b"), "existing record untouched");
}

#[test]
fn merge_is_idempotent() {
    let (_dir, store) = open_store();
    let batch = vec![input(5, "e"), input(4, "d")];

    store.merge_todos(batch.clone()).wait().unwrap();
    let first = store.fetch_todos().wait().unwrap();
    let report = store.merge_todos(batch).wait().unwrap();
    let second = store.fetch_todos().wait().unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(first, second);
}

#[test]
fn duplicates_inside_one_batch_keep_the_first_occurrence() {
    let (_dir, store) = open_store();

    let report = store
        .merge_todos(vec![input(7, "first"), input(7, "second"), input(8, "h")])
        .wait()
        .unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 1);

    let todos = store.fetch_todos().wait().unwrap();
    assert_eq!(ids(&todos), vec![7, 8]);
    assert_eq!(todos[0].title.as_deref(), Some("first"));
}

#[test]
fn stored_ids_stay_unique_across_many_merges() {
    let (_dir, store) = open_store();
    for round in 0..3 {
        let batch: Vec<ToDoInput> = (0..20).map(|id| input(id + round * 5, "x")).collect();
        store.merge_todos(batch).wait().unwrap();
    }

    let todos = store.fetch_todos().wait().unwrap();
    let unique: HashSet<i64> = todos.iter().map(|todo| todo.id).collect();
    assert_eq!(unique.len(), todos.len());
    assert_eq!(todos.len(), 30);
}

#[test]
fn fetch_orders_by_ascending_id() {
    let (_dir, store) = open_store();
    store
        .merge_todos(vec![input(40000, "big"), input(3, "c"), input(12, "l")])
        .wait()
        .unwrap();

    assert_eq!(ids(&store.fetch_todos().wait().unwrap()), vec![3, 12, 40000]);
}

#[test]
fn update_and_remove_address_todos_by_id() {
    let (_dir, store) = open_store();
    store
        .merge_todos(vec![input(1, "a"), input(2, "b")])
        .wait()
        .unwrap();

    store.update_todo(1, "renamed", true).wait().unwrap();
    store.remove_todo(2).wait().unwrap();

    let todos = store.fetch_todos().wait().unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title.as_deref(), Some("renamed"));
    assert!(todos[0].completed);

    let err = store.remove_todo(2).wait().unwrap_err();
    assert!(matches!(err, StoreError::InvalidReference(_)));
    let err = store.update_todo(99, "x", false).wait().unwrap_err();
    assert!(matches!(err, StoreError::InvalidReference(_)));
}

#[test]
fn remove_all_clears_the_list_and_handles_empty_tables() {
    let (_dir, store) = open_store();
    assert_eq!(store.remove_all_todos().wait().unwrap(), 0);

    store
        .merge_todos(vec![input(1, "a"), input(2, "b"), input(3, "c")])
        .wait()
        .unwrap();
    assert_eq!(store.remove_all_todos().wait().unwrap(), 3);
    assert!(store.fetch_todos().wait().unwrap().is_empty());

    let report = store.merge_todos(vec![input(1, "a")]).wait().unwrap();
    assert_eq!(report.inserted, 1, "cleared ids can be merged again");
}

#[test]
fn todo_observers_receive_every_fetch_result() {
    let (_dir, store) = open_store();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = store.subscribe_todos(move |result| {
        let count = result.as_ref().map(|todos| todos.len()).unwrap_or_default();
        sink.lock().push(count);
    });

    store.fetch_todos().wait().unwrap();
    store.merge_todos(vec![input(1, "a")]).wait().unwrap();
    store.fetch_todos().wait().unwrap();
    assert_eq!(*seen.lock(), vec![0, 1]);

    store.unsubscribe_todos(subscription);
    store.fetch_todos().wait().unwrap();
    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn pending_results_arrive_in_submission_order() {
    let (_dir, store) = open_store();
    let merge = store.merge_todos(vec![input(1, "a")]);
    let fetch = store.fetch_todos();
    let clear = store.remove_all_todos();

    assert_eq!(fetch.wait().unwrap().len(), 1);
    assert_eq!(merge.wait().unwrap().inserted, 1);
    assert_eq!(clear.wait().unwrap(), 1);
}

#[test]
fn failed_merge_job_commits_nothing() {
    let (_dir, store) = open_store();
    store.merge_todos(vec![input(1, "a")]).wait().unwrap();

    let err = store
        .perform("merge_then_fail", |scope| {
            let report = scope.merge_todos(vec![input(2, "b"), input(3, "c")])?;
            assert_eq!(report.inserted, 2);
            scope.remove_todo(404)?;
            Ok(report)
        })
        .wait()
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidReference(_)), "{err}");
    assert_eq!(ids(&store.fetch_todos().wait().unwrap()), vec![1]);
}

#[test]
fn observer_waiting_on_the_queue_fails_fast_instead_of_hanging() {
    let (_dir, store) = open_store();
    let store = Arc::new(store);
    store
        .merge_todos(vec![input(1, "a"), input(2, "b")])
        .wait()
        .unwrap();

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);
    let weak = Arc::downgrade(&store);
    let subscription = store.subscribe_todos(move |_result| {
        if let Some(store) = weak.upgrade() {
            let cleared = store.remove_all_todos().wait();
            sink.lock().push(matches!(cleared, Err(StoreError::ReentrantWait)));
        }
    });

    assert_eq!(store.fetch_todos().wait().unwrap().len(), 2);
    assert_eq!(*outcomes.lock(), vec![true]);

    store.unsubscribe_todos(subscription);
    assert!(
        store.fetch_todos().wait().unwrap().is_empty(),
        "the clear submitted by the observer still runs"
    );
}

#[test]
fn panicking_observer_does_not_stop_the_queue() {
    let (_dir, store) = open_store();
    let subscription = store.subscribe_todos(|_result| panic!("observer failure"));

    let err = store.fetch_todos().wait().unwrap_err();
    assert!(matches!(err, StoreError::QueueClosed));

    store.unsubscribe_todos(subscription);
    let report = store.merge_todos(vec![input(1, "a")]).wait().unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(ids(&store.fetch_todos().wait().unwrap()), vec![1]);
}
