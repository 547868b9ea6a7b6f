//! Group/person list adapter.

use crate::model::group::{Group, GroupId, Person, PersonId};
use crate::store::{Store, SubscriptionId};
use crate::viewmodel::{
    valid_entries, ViewModelDelegate, ViewModelError, EMPTY_FIELD_TITLE, PEOPLE_ERROR_TITLE,
};
use log::warn;
use parking_lot::Mutex;
use std::sync::Arc;

/// Sectioned people list: one section per group, one row per person.
pub struct PeopleViewModel {
    store: Arc<Store>,
    groups: Arc<Mutex<Vec<Group>>>,
    selected_group: Mutex<Option<usize>>,
    subscription: SubscriptionId,
}

impl PeopleViewModel {
    /// Subscribes to group snapshots; `delegate` is told about each one.
    pub fn new(store: Arc<Store>, delegate: Arc<dyn ViewModelDelegate>) -> Self {
        let groups = Arc::new(Mutex::new(Vec::new()));
        let snapshot = Arc::clone(&groups);
        let subscription = store.subscribe_groups(move |result| match result {
            Ok(fetched) => {
                *snapshot.lock() = fetched.clone();
                delegate.did_get_data(None);
            }
            Err(err) => delegate.did_get_data(Some(err)),
        });

        Self {
            store,
            groups,
            selected_group: Mutex::new(None),
            subscription,
        }
    }

    /// Alert title for a failed action.
    pub fn alert_title(error: &ViewModelError) -> &'static str {
        if error.is_input_error() {
            EMPTY_FIELD_TITLE
        } else {
            PEOPLE_ERROR_TITLE
        }
    }

    /// Re-reads all groups; the snapshot updates through the subscription.
    pub fn fetch_data(&self) -> Result<(), ViewModelError> {
        self.store.fetch_groups()?;
        Ok(())
    }

    pub fn select_group(&self, index: usize) {
        *self.selected_group.lock() = Some(index);
    }

    pub fn selected_group(&self) -> Option<usize> {
        *self.selected_group.lock()
    }

    pub fn group_count(&self) -> usize {
        self.groups.lock().len()
    }

    pub fn create_group(&self, name: &str) -> Result<GroupId, ViewModelError> {
        if !valid_entries(&[name]) {
            return Err(ViewModelError::EmptyField);
        }
        let id = self.store.insert_group(name)?;
        self.fetch_data()?;
        Ok(id)
    }

    /// Deletes the selected group and its people, then clears the selection.
    ///
    /// A selection that no longer addresses a group is kept.
    pub fn delete_group(&self) -> Result<(), ViewModelError> {
        let selected = self
            .selected_group()
            .ok_or(ViewModelError::NothingSelected)?;
        let id = self.group_id(selected)?;
        *self.selected_group.lock() = None;
        self.store.remove_entity(id)?;
        self.fetch_data()
    }

    pub fn title_for_section(&self, section: usize) -> String {
        match self.groups.lock().get(section) {
            Some(group) => group.name.clone(),
            None => {
                warn!("event=vm_lookup module=viewmodel status=error target=group_title");
                String::new()
            }
        }
    }

    pub fn people_count(&self, section: usize) -> usize {
        self.groups
            .lock()
            .get(section)
            .map_or(0, |group| group.people.len())
    }

    pub fn person_name(&self, section: usize, row: usize) -> String {
        self.with_person(section, row, |person| person.name.clone())
            .flatten()
            .unwrap_or_default()
    }

    pub fn person_address(&self, section: usize, row: usize) -> String {
        self.with_person(section, row, |person| person.address.clone())
            .flatten()
            .unwrap_or_default()
    }

    /// Adds a person to the selected group, then clears the selection.
    pub fn add_person(&self, name: &str, address: &str) -> Result<PersonId, ViewModelError> {
        if !valid_entries(&[name, address]) {
            return Err(ViewModelError::EmptyField);
        }
        let selected = self
            .selected_group()
            .ok_or(ViewModelError::NothingSelected)?;
        let group = self.group_id(selected)?;

        let id = self.store.insert_person(name, address, group)?;
        *self.selected_group.lock() = None;
        self.fetch_data()?;
        Ok(id)
    }

    pub fn delete_person(&self, section: usize, row: usize) -> Result<(), ViewModelError> {
        let id = self.person_id(section, row)?;
        self.store.remove_entity(id)?;
        self.fetch_data()
    }

    pub fn update_person(
        &self,
        section: usize,
        row: usize,
        name: &str,
        address: &str,
    ) -> Result<(), ViewModelError> {
        if !valid_entries(&[name, address]) {
            return Err(ViewModelError::EmptyField);
        }
        let id = self.person_id(section, row)?;
        self.store.update_person(id, name, address)?;
        self.fetch_data()
    }

    fn group_id(&self, section: usize) -> Result<GroupId, ViewModelError> {
        self.groups
            .lock()
            .get(section)
            .map(|group| group.id)
            .ok_or(ViewModelError::IndexOutOfRange)
    }

    fn person_id(&self, section: usize, row: usize) -> Result<PersonId, ViewModelError> {
        self.with_person(section, row, |person| person.id)
            .ok_or(ViewModelError::IndexOutOfRange)
    }

    fn with_person<T>(&self, section: usize, row: usize, f: impl FnOnce(&Person) -> T) -> Option<T> {
        let groups = self.groups.lock();
        groups
            .get(section)
            .and_then(|group| group.people.get(row))
            .map(f)
    }
}

impl Drop for PeopleViewModel {
    fn drop(&mut self) {
        self.store.unsubscribe_groups(self.subscription);
    }
}
