//! ToDo list adapter.

use crate::model::todo::{ToDo, ToDoId};
use crate::store::{Pending, Store, SubscriptionId};
use crate::sync::{SyncHandle, Synchronizer};
use crate::viewmodel::{
    valid_entries, ViewModelDelegate, ViewModelError, EMPTY_FIELD_TITLE, TODO_ERROR_TITLE,
};
use parking_lot::Mutex;
use std::sync::Arc;

const COMPLETED_LABEL: &str = "Completed";
const INCOMPLETE_LABEL: &str = "Incomplete";

/// Flat ToDo list with remote refresh.
pub struct ToDoViewModel {
    store: Arc<Store>,
    synchronizer: Synchronizer,
    delegate: Arc<dyn ViewModelDelegate>,
    todos: Arc<Mutex<Vec<ToDo>>>,
    pending_completion: Mutex<Option<bool>>,
    subscription: SubscriptionId,
}

impl ToDoViewModel {
    /// Subscribes to ToDo snapshots; `delegate` is told about each one.
    ///
    /// The delegate is called from the store's background queue.
    pub fn new(
        store: Arc<Store>,
        synchronizer: Synchronizer,
        delegate: Arc<dyn ViewModelDelegate>,
    ) -> Self {
        let todos = Arc::new(Mutex::new(Vec::new()));
        let snapshot = Arc::clone(&todos);
        let listener = Arc::clone(&delegate);
        let subscription = store.subscribe_todos(move |result| match result {
            Ok(fetched) => {
                *snapshot.lock() = fetched.clone();
                listener.did_get_data(None);
            }
            Err(err) => listener.did_get_data(Some(err)),
        });

        Self {
            store,
            synchronizer,
            delegate,
            todos,
            pending_completion: Mutex::new(None),
            subscription,
        }
    }

    /// Alert title for a failed action.
    pub fn alert_title(error: &ViewModelError) -> &'static str {
        if error.is_input_error() {
            EMPTY_FIELD_TITLE
        } else {
            TODO_ERROR_TITLE
        }
    }

    /// Re-reads the list on the queue; the snapshot updates on delivery.
    pub fn fetch_data(&self) -> Pending<Vec<ToDo>> {
        self.store.fetch_todos()
    }

    /// Starts a remote refresh; failures go to the delegate.
    pub fn fetch_from_api(&self) -> Result<SyncHandle, ViewModelError> {
        let delegate = Arc::clone(&self.delegate);
        let handle = self.synchronizer.sync_todos(move |result| {
            if let Err(err) = result {
                delegate.did_get_data(Some(&err));
            }
        })?;
        Ok(handle)
    }

    /// Clears every ToDo, then re-reads the (empty) list.
    pub fn delete_all(&self) -> Pending<usize> {
        let removed = self.store.remove_all_todos();
        drop(self.store.fetch_todos());
        removed
    }

    pub fn count(&self) -> usize {
        self.todos.lock().len()
    }

    pub fn title(&self, index: usize) -> String {
        self.todos
            .lock()
            .get(index)
            .and_then(|todo| todo.title.clone())
            .unwrap_or_default()
    }

    /// Id at `index`, or 0 when the row does not exist.
    pub fn id(&self, index: usize) -> ToDoId {
        self.todos.lock().get(index).map_or(0, |todo| todo.id)
    }

    pub fn completion_label(&self, index: usize) -> &'static str {
        match self.todos.lock().get(index) {
            Some(todo) if todo.completed => COMPLETED_LABEL,
            Some(_) => INCOMPLETE_LABEL,
            None => "",
        }
    }

    pub fn cell_title(&self, index: usize) -> String {
        format!("{}: {}", self.id(index), self.title(index))
    }

    /// Stages the completion flag used by the next `update_todo`.
    pub fn set_pending_completion(&self, completed: Option<bool>) {
        *self.pending_completion.lock() = completed;
    }

    /// Stages the current completion flag of the row at `index`.
    pub fn stage_completion_from(&self, index: usize) {
        let completed = self.todos.lock().get(index).map(|todo| todo.completed);
        self.set_pending_completion(completed);
    }

    /// Removes the row locally at once and deletes it on the queue.
    pub fn delete_todo(&self, index: usize) -> Result<Pending<()>, ViewModelError> {
        let removed = {
            let mut todos = self.todos.lock();
            if index >= todos.len() {
                return Err(ViewModelError::IndexOutOfRange);
            }
            todos.remove(index)
        };
        let pending = self.store.remove_todo(removed.id);
        self.delegate.did_get_data(None);
        Ok(pending)
    }

    /// Applies `new_title` and the staged completion flag to one row.
    ///
    /// The staged flag is consumed whether or not the update goes through.
    pub fn update_todo(&self, index: usize, new_title: &str) -> Result<Pending<()>, ViewModelError> {
        let completed = self
            .pending_completion
            .lock()
            .take()
            .ok_or(ViewModelError::NothingSelected)?;
        if !valid_entries(&[new_title]) {
            return Err(ViewModelError::EmptyField);
        }
        let id = self
            .todos
            .lock()
            .get(index)
            .map(|todo| todo.id)
            .ok_or(ViewModelError::IndexOutOfRange)?;

        let pending = self.store.update_todo(id, new_title, completed);
        drop(self.store.fetch_todos());
        Ok(pending)
    }
}

impl Drop for ToDoViewModel {
    fn drop(&mut self) {
        self.store.unsubscribe_todos(self.subscription);
    }
}
