//! Group/Person repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the two-level group -> person hierarchy.
//! - Assemble group snapshots with their people resolved.
//!
//! # Invariants
//! - A person row always references an existing group row.
//! - Deleting a group deletes its people (`ON DELETE CASCADE`).
//! - Listing order is deterministic: creation order, then insertion order.

use crate::model::group::{Group, GroupId, Person, PersonId};
use crate::repo::{RecordRef, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

/// Repository interface for group and person operations.
pub trait GroupRepository {
    /// Creates one group and returns its id.
    fn create_group(&self, name: &str) -> RepoResult<GroupId>;
    /// Returns whether the group exists in this connection's view.
    fn group_exists(&self, id: GroupId) -> RepoResult<bool>;
    /// Creates one person under an existing group.
    fn create_person(
        &self,
        group: GroupId,
        name: Option<&str>,
        address: Option<&str>,
    ) -> RepoResult<PersonId>;
    /// Replaces name and address of one person.
    fn update_person(
        &self,
        id: PersonId,
        name: Option<&str>,
        address: Option<&str>,
    ) -> RepoResult<()>;
    /// Deletes one group together with its people.
    fn delete_group(&self, id: GroupId) -> RepoResult<()>;
    /// Deletes one person.
    fn delete_person(&self, id: PersonId) -> RepoResult<()>;
    /// Lists all groups with their people.
    fn list_groups(&self) -> RepoResult<Vec<Group>>;
}

/// SQLite-backed group repository.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GroupRepository for SqliteGroupRepository<'_> {
    fn create_group(&self, name: &str) -> RepoResult<GroupId> {
        let id = GroupId::generate();
        self.conn.execute(
            "INSERT INTO groups (uuid, name) VALUES (?1, ?2);",
            params![id.to_string(), name],
        )?;
        Ok(id)
    }

    fn group_exists(&self, id: GroupId) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM groups WHERE uuid = ?1;",
                [id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn create_person(
        &self,
        group: GroupId,
        name: Option<&str>,
        address: Option<&str>,
    ) -> RepoResult<PersonId> {
        if !self.group_exists(group)? {
            return Err(RepoError::NotFound(RecordRef::Group(group)));
        }

        let id = PersonId::generate();
        self.conn.execute(
            "INSERT INTO people (uuid, group_uuid, name, address) VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), group.to_string(), name, address],
        )?;
        Ok(id)
    }

    fn update_person(
        &self,
        id: PersonId,
        name: Option<&str>,
        address: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE people
             SET
                name = ?2,
                address = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), name, address],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Person(id)));
        }
        Ok(())
    }

    fn delete_group(&self, id: GroupId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM groups WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Group(id)));
        }
        Ok(())
    }

    fn delete_person(&self, id: PersonId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM people WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Person(id)));
        }
        Ok(())
    }

    fn list_groups(&self) -> RepoResult<Vec<Group>> {
        let mut groups = Vec::new();
        let mut positions = HashMap::new();

        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM groups ORDER BY created_at ASC, rowid ASC;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id = parse_group_id(&row.get::<_, String>("uuid")?, "groups.uuid")?;
            positions.insert(id, groups.len());
            groups.push(Group {
                id,
                name: row.get("name")?,
                people: Vec::new(),
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT uuid, group_uuid, name, address
             FROM people
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let person = parse_person_row(row)?;
            let index = positions.get(&person.group).copied().ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "person {} references missing group {}",
                    person.id, person.group
                ))
            })?;
            groups[index].people.push(person);
        }

        Ok(groups)
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id_text: String = row.get("uuid")?;
    let id = PersonId::parse(&id_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in people.uuid"))
    })?;
    let group = parse_group_id(&row.get::<_, String>("group_uuid")?, "people.group_uuid")?;

    Ok(Person {
        id,
        name: row.get("name")?,
        address: row.get("address")?,
        group,
    })
}

fn parse_group_id(value: &str, column: &'static str) -> RepoResult<GroupId> {
    GroupId::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
