//! Group/Person hierarchy model.
//!
//! # Invariants
//! - `Group::name` always exists; an empty string is a valid name.
//! - Every `Person` belongs to exactly one group through `Person::group`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque, store-assigned group reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Uuid);

/// Opaque, store-assigned person reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(Uuid);

macro_rules! opaque_id {
    ($name:ident) => {
        impl $name {
            /// Allocates a fresh identifier.
            pub(crate) fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses an identifier previously produced by `Display`.
            pub fn parse(value: &str) -> Option<Self> {
                Uuid::parse_str(value.trim()).ok().map(Self)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

opaque_id!(GroupId);
opaque_id!(PersonId);

/// Snapshot of one group with its people resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// People ordered by creation.
    pub people: Vec<Person>,
}

impl Group {
    /// Finds a member by id.
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }
}

/// Snapshot of one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: Option<String>,
    pub address: Option<String>,
    /// Owning group.
    pub group: GroupId,
}

/// Reference accepted by `Store::remove_entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Group(GroupId),
    Person(PersonId),
}

impl From<GroupId> for EntityRef {
    fn from(value: GroupId) -> Self {
        Self::Group(value)
    }
}

impl From<PersonId> for EntityRef {
    fn from(value: PersonId) -> Self {
        Self::Person(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupId, PersonId};

    #[test]
    fn ids_round_trip_through_display() {
        let group = GroupId::generate();
        assert_eq!(GroupId::parse(&group.to_string()), Some(group));

        let person = PersonId::generate();
        assert_eq!(PersonId::parse(&format!("  {person} ")), Some(person));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(GroupId::parse("not-a-uuid").is_none());
        assert!(PersonId::parse("").is_none());
    }
}
