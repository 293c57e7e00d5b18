//! Next-task selection over a decoded ledger read.

use super::models::{LedgerEntry, TaskStatus};

/// A work item chosen for an interpreter, with its position in the ledger.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedTask {
    pub entry: LedgerEntry,
    /// Zero-based position of the chosen row among the `total_files` work items.
    pub current_index: usize,
    pub total_files: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TaskSelection {
    Selected(SelectedTask),
    NothingPending { total_files: usize },
}

/// First unclaimed entry in ledger order.
pub fn select_next(entries: &[LedgerEntry]) -> TaskSelection {
    match select_candidates(entries, 1).into_iter().next() {
        Some(task) => TaskSelection::Selected(task),
        None => TaskSelection::NothingPending {
            total_files: entries.len(),
        },
    }
}

/// Up to `limit` unclaimed entries in ledger order.
pub fn select_candidates(entries: &[LedgerEntry], limit: usize) -> Vec<SelectedTask> {
    let total_files = entries.len();
    entries
        .iter()
        .filter(|entry| entry.item.status == TaskStatus::Unclaimed)
        .take(limit)
        .map(|entry| SelectedTask {
            entry: entry.clone(),
            current_index: entry.index,
            total_files,
        })
        .collect()
}
