//! Mutation scopes: one SQLite transaction per unit of work.
//!
//! # Responsibility
//! - Group store mutations so they become durable together on `save`.
//! - Resolve opaque references inside the scope that mutates them.
//!
//! # Invariants
//! - A scope borrows one connection exclusively and cannot cross threads.
//! - Dropping a scope without `save` rolls every mutation back.
//! - Records read from a scope are snapshots; only ids leave the scope.

use crate::model::group::{EntityRef, Group, GroupId, PersonId};
use crate::model::todo::{ToDo, ToDoId, ToDoInput};
use crate::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use crate::repo::todo_repo::{SqliteToDoRepository, ToDoRepository};
use crate::repo::RepoError;
use crate::store::error::{StoreError, StoreResult};
use crate::store::merge::{merge_into, MergeReport};
use log::error;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// One unit of work over a store connection.
pub struct MutationScope<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> MutationScope<'conn> {
    /// Opens a write scope on `conn`.
    ///
    /// The write lock is taken up front so concurrent scopes on other
    /// connections serialize instead of failing at commit time.
    pub fn begin(conn: &'conn mut Connection) -> StoreResult<Self> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::SaveFailure(RepoError::from(err)))?;
        Ok(Self { tx })
    }

    fn groups(&self) -> SqliteGroupRepository<'_> {
        SqliteGroupRepository::new(&self.tx)
    }

    fn todos(&self) -> SqliteToDoRepository<'_> {
        SqliteToDoRepository::new(&self.tx)
    }

    pub fn insert_group(&self, name: &str) -> StoreResult<GroupId> {
        self.groups()
            .create_group(name)
            .map_err(StoreError::from_write)
    }

    /// Creates a person under `group`, resolving the reference in this scope.
    ///
    /// # Errors
    /// - `StoreError::InvalidReference` when `group` does not exist here.
    pub fn insert_person(
        &self,
        name: &str,
        address: &str,
        group: GroupId,
    ) -> StoreResult<PersonId> {
        self.groups()
            .create_person(group, Some(name), Some(address))
            .map_err(StoreError::from_write)
    }

    pub fn update_person(&self, person: PersonId, name: &str, address: &str) -> StoreResult<()> {
        self.groups()
            .update_person(person, Some(name), Some(address))
            .map_err(StoreError::from_write)
    }

    /// Deletes a group (with its people) or a single person.
    pub fn remove_entity(&self, entity: EntityRef) -> StoreResult<()> {
        let repo = self.groups();
        let result = match entity {
            EntityRef::Group(id) => repo.delete_group(id),
            EntityRef::Person(id) => repo.delete_person(id),
        };
        result.map_err(StoreError::from_write)
    }

    pub fn list_groups(&self) -> StoreResult<Vec<Group>> {
        self.groups().list_groups().map_err(StoreError::from_read)
    }

    pub fn list_todos(&self) -> StoreResult<Vec<ToDo>> {
        self.todos().list_todos().map_err(StoreError::from_read)
    }

    /// Inserts incoming records whose ids are not stored yet.
    pub fn merge_todos(&self, incoming: Vec<ToDoInput>) -> StoreResult<MergeReport> {
        merge_into(&self.todos(), incoming).map_err(StoreError::from_write)
    }

    pub fn update_todo(&self, id: ToDoId, title: &str, completed: bool) -> StoreResult<()> {
        self.todos()
            .update_todo(id, Some(title), completed)
            .map_err(StoreError::from_write)
    }

    pub fn remove_todo(&self, id: ToDoId) -> StoreResult<()> {
        self.todos().delete_todo(id).map_err(StoreError::from_write)
    }

    /// Deletes every ToDo in one statement; returns the removed count.
    pub fn remove_all_todos(&self) -> StoreResult<usize> {
        self.todos()
            .delete_all_todos()
            .map_err(StoreError::from_write)
    }

    /// Commits every mutation made in this scope.
    ///
    /// # Errors
    /// - `StoreError::SaveFailure` when the commit fails; nothing from the
    ///   scope is persisted in that case.
    pub fn save(self) -> StoreResult<()> {
        self.tx.commit().map_err(|err| {
            error!(
                "event=save_context module=store status=error error_code=save_failure error={}",
                err
            );
            StoreError::SaveFailure(RepoError::from(err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::MutationScope;
    use crate::db::open_db_in_memory;
    use crate::model::group::{EntityRef, PersonId};
    use crate::model::todo::ToDoInput;
    use crate::repo::RecordRef;
    use crate::store::error::StoreError;

    #[test]
    fn unsaved_scope_rolls_back() {
        let mut conn = open_db_in_memory().unwrap();
        {
            let scope = MutationScope::begin(&mut conn).unwrap();
            scope.insert_group("Temp").unwrap();
        }

        let scope = MutationScope::begin(&mut conn).unwrap();
        assert!(scope.list_groups().unwrap().is_empty());
    }

    #[test]
    fn saved_scope_persists_every_mutation() {
        let mut conn = open_db_in_memory().unwrap();
        let scope = MutationScope::begin(&mut conn).unwrap();
        let group = scope.insert_group("Friends").unwrap();
        scope.insert_person("Sam", "1 Rd", group).unwrap();
        scope
            .merge_todos(vec![ToDoInput {
                user_id: 1,
                id: 1,
                title: Some("A".to_string()),
                completed: false,
            }])
            .unwrap();
        scope.save().unwrap();

        let scope = MutationScope::begin(&mut conn).unwrap();
        assert_eq!(scope.list_groups().unwrap()[0].people.len(), 1);
        assert_eq!(scope.list_todos().unwrap().len(), 1);
    }

    #[test]
    fn removing_unknown_person_is_an_invalid_reference() {
        let mut conn = open_db_in_memory().unwrap();
        let scope = MutationScope::begin(&mut conn).unwrap();
        let missing = PersonId::generate();
        let err = scope.remove_entity(EntityRef::Person(missing)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(RecordRef::Person(id)) if id == missing));
    }
}
