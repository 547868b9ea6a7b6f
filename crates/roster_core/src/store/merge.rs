//! Remote ToDo merge with duplicate suppression.
//!
//! # Invariants
//! - A stored record whose id appears in the incoming batch is left untouched.
//! - Within one batch the first occurrence of an id wins.
//! - Re-merging the same batch inserts nothing.

use crate::model::todo::{ToDo, ToDoInput};
use crate::repo::todo_repo::ToDoRepository;
use crate::repo::RepoResult;

/// Outcome counters of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub received: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Inserts every incoming record whose id is not yet known.
///
/// Runs inside the caller's transaction; nothing is durable until the
/// enclosing scope saves.
pub(crate) fn merge_into(
    repo: &impl ToDoRepository,
    incoming: Vec<ToDoInput>,
) -> RepoResult<MergeReport> {
    let mut known = repo.existing_ids()?;
    let mut report = MergeReport {
        received: incoming.len(),
        ..MergeReport::default()
    };

    for input in incoming {
        if !known.insert(input.id) {
            report.skipped += 1;
            continue;
        }
        repo.insert_todo(&ToDo::from(input))?;
        report.inserted += 1;
    }

    Ok(report)
}
