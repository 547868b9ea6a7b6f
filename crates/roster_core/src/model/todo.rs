//! ToDo model and remote payload shape.
//!
//! # Invariants
//! - `ToDo::id` is unique inside the store; the merge path enforces it.
//! - Identifiers are 64-bit; remote values are never truncated.

use serde::{Deserialize, Serialize};

/// Remote-assigned ToDo identifier, also used as the opaque reference.
pub type ToDoId = i64;

/// Stored ToDo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDo {
    pub id: ToDoId,
    pub user_id: i64,
    pub title: Option<String>,
    pub completed: bool,
}

/// One element of the remote ToDo collection.
///
/// Field names follow the endpoint's camelCase JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToDoInput {
    pub user_id: i64,
    pub id: ToDoId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl From<ToDoInput> for ToDo {
    fn from(value: ToDoInput) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            title: value.title,
            completed: value.completed,
        }
    }
}

impl ToDo {
    /// Label used by list cells: `"<id>: <title>"`.
    pub fn cell_title(&self) -> String {
        format!("{}: {}", self.id, self.title.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::{ToDo, ToDoInput};

    #[test]
    fn input_uses_camel_case_and_defaults() {
        let input: ToDoInput = serde_json::from_str(r#"{"userId": 3, "id": 40000}"#)
            .expect("payload should decode");
        assert_eq!(input.user_id, 3);
        assert_eq!(input.id, 40000);
        assert_eq!(input.title, None);
        assert!(!input.completed);
    }

    #[test]
    fn cell_title_joins_id_and_title() {
        let todo = ToDo {
            id: 7,
            user_id: 1,
            title: Some("water plants".to_string()),
            completed: false,
        };
        assert_eq!(todo.cell_title(), "7: water plants");

        let untitled = ToDo { title: None, ..todo };
        assert_eq!(untitled.cell_title(), "7: ");
    }
}
