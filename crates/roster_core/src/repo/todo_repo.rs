//! ToDo repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the flat ToDo list.
//! - Provide the id lookups the merge path needs.
//!
//! # Invariants
//! - Listing order is `id ASC`.
//! - Bulk delete is one statement, not a per-row loop.
//! - The table carries no uniqueness constraint on `id`; callers that insert
//!   must check `existing_ids` first.

use crate::model::todo::{ToDo, ToDoId};
use crate::repo::{bool_to_int, RecordRef, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;

/// Repository interface for ToDo operations.
pub trait ToDoRepository {
    /// Lists all ToDos ordered by id.
    fn list_todos(&self) -> RepoResult<Vec<ToDo>>;
    /// Returns the set of ids currently stored.
    fn existing_ids(&self) -> RepoResult<HashSet<ToDoId>>;
    /// Inserts one ToDo as-is.
    fn insert_todo(&self, todo: &ToDo) -> RepoResult<()>;
    /// Replaces title and completion of one ToDo.
    fn update_todo(&self, id: ToDoId, title: Option<&str>, completed: bool) -> RepoResult<()>;
    /// Deletes one ToDo.
    fn delete_todo(&self, id: ToDoId) -> RepoResult<()>;
    /// Deletes every ToDo and returns how many rows were removed.
    fn delete_all_todos(&self) -> RepoResult<usize>;
}

/// SQLite-backed ToDo repository.
pub struct SqliteToDoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteToDoRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ToDoRepository for SqliteToDoRepository<'_> {
    fn list_todos(&self) -> RepoResult<Vec<ToDo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, completed
             FROM todos
             ORDER BY id ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }
        Ok(todos)
    }

    fn existing_ids(&self) -> RepoResult<HashSet<ToDoId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM todos;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, ToDoId>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    fn insert_todo(&self, todo: &ToDo) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO todos (id, user_id, title, completed) VALUES (?1, ?2, ?3, ?4);",
            params![
                todo.id,
                todo.user_id,
                todo.title.as_deref(),
                bool_to_int(todo.completed),
            ],
        )?;
        Ok(())
    }

    fn update_todo(&self, id: ToDoId, title: Option<&str>, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE todos SET title = ?2, completed = ?3 WHERE id = ?1;",
            params![id, title, bool_to_int(completed)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::ToDo(id)));
        }
        Ok(())
    }

    fn delete_todo(&self, id: ToDoId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM todos WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::ToDo(id)));
        }
        Ok(())
    }

    fn delete_all_todos(&self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM todos;", [])?;
        Ok(removed)
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<ToDo> {
    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in todos.completed"
            )));
        }
    };

    Ok(ToDo {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        completed,
    })
}
