//! Claim coordinator: unclaimed -> claimed transitions against the live ledger.
//!
//! The ledger offers no conditional writes. Before committing a claim the
//! coordinator re-reads the candidate's status cell and moves on when another
//! interpreter got there first. Two requests that both re-read before either
//! writes still receive the same row; this narrows the race, it does not close it.

use super::error::DeskError;
use super::ledger::{LoadedLedger, WorkLedger};
use super::models::TaskStatus;
use super::selector::{select_candidates, SelectedTask};

const CLAIM_SCAN_LIMIT: usize = 16;

/// Claim outcome.
#[derive(Clone, Debug, PartialEq)]
pub enum ClaimDecision {
    Claimed(SelectedTask),
    NothingPending { total_files: usize },
    /// Every candidate from the scan was claimed by someone else between the
    /// read and the verify step.
    Contended { attempted: usize },
}

#[derive(Clone)]
pub struct ClaimCoordinator {
    ledger: WorkLedger,
}

impl ClaimCoordinator {
    pub fn new(ledger: WorkLedger) -> Self {
        Self { ledger }
    }

    /// Reads the ledger and claims the first unclaimed row for `interpreter`.
    pub async fn claim_next(&self, interpreter: &str) -> Result<ClaimDecision, DeskError> {
        let loaded = self.ledger.load().await?;
        self.claim_from(&loaded, interpreter).await
    }

    /// Claims against an already loaded read of the ledger.
    pub async fn claim_from(
        &self,
        loaded: &LoadedLedger,
        interpreter: &str,
    ) -> Result<ClaimDecision, DeskError> {
        let candidates = select_candidates(loaded.entries(), CLAIM_SCAN_LIMIT);
        if candidates.is_empty() {
            return Ok(ClaimDecision::NothingPending {
                total_files: loaded.total_files(),
            });
        }
        let status_col = loaded.require_column(&self.ledger.columns().status)?;
        let interpreter_col = loaded.require_column(&self.ledger.columns().interpreter)?;
        let markers = self.ledger.markers();
        let store = self.ledger.store();
        let attempted = candidates.len();

        for mut task in candidates {
            let row = task.entry.row_number;
            let current = store.read_cell(row, status_col).await?;
            if !markers.is_unclaimed(&current) {
                log::info!(
                    "desk_claim_skipped interpreter={} row={} status={:?}",
                    interpreter,
                    row,
                    current
                );
                continue;
            }
            store
                .update_cell(row, status_col, &markers.claimed(interpreter))
                .await?;
            store.update_cell(row, interpreter_col, interpreter).await?;
            log::info!(
                "desk_claim interpreter={} row={} filename={}",
                interpreter,
                row,
                task.entry.item.filename
            );
            task.entry.item.status = TaskStatus::Claimed {
                interpreter: interpreter.to_string(),
            };
            return Ok(ClaimDecision::Claimed(task));
        }

        log::warn!(
            "desk_claim_contended interpreter={} attempted={}",
            interpreter,
            attempted
        );
        Ok(ClaimDecision::Contended { attempted })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clipdesk_ledger::{MemoryRowStore, RowStore};

    use super::*;
    use crate::models::{LedgerColumns, StatusMarkers};

    const HEADER: [&str; 6] = [
        "filename",
        "file_id",
        "duration",
        "translation",
        "status",
        "interpreter",
    ];

    fn coordinator(store: Arc<MemoryRowStore>) -> ClaimCoordinator {
        ClaimCoordinator::new(WorkLedger::new(
            store,
            LedgerColumns::default(),
            StatusMarkers::default(),
        ))
    }

    #[tokio::test]
    async fn claim_writes_marker_for_first_unclaimed_row() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            HEADER.to_vec(),
            vec!["a.wav", "", "30", "hi", "done"],
            vec!["b.wav", "", "45", "", ""],
        ]));
        let decision = coordinator(store.clone()).claim_next("ann").await.unwrap();
        let ClaimDecision::Claimed(task) = decision else {
            panic!("expected a claim, got {:?}", decision);
        };
        assert_eq!(task.entry.item.filename, "b.wav");
        assert_eq!(task.current_index, 1);
        assert_eq!(store.snapshot()[2][4], "claimed:ann");
        assert_eq!(store.snapshot()[2][5], "ann");
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn stale_read_moves_on_to_next_candidate() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            HEADER.to_vec(),
            vec!["a.wav", "", "30", "", ""],
            vec!["b.wav", "", "45", "", ""],
        ]));
        let coordinator = coordinator(store.clone());
        let loaded = coordinator.ledger.load().await.unwrap();
        store.update_cell(2, 5, "claimed:bob").await.unwrap();

        let decision = coordinator.claim_from(&loaded, "ann").await.unwrap();
        let ClaimDecision::Claimed(task) = decision else {
            panic!("expected a claim, got {:?}", decision);
        };
        assert_eq!(task.entry.item.filename, "b.wav");
        assert_eq!(store.snapshot()[1][4], "claimed:bob");
        assert_eq!(store.snapshot()[2][4], "claimed:ann");
    }

    #[tokio::test]
    async fn progress_counts_work_items_not_raw_rows() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            HEADER.to_vec(),
            vec!["a.wav", "", "30", "hi", "done"],
            vec!["", "", "", "", ""],
            vec!["b.wav", "", "45", "", ""],
        ]));
        let decision = coordinator(store.clone()).claim_next("ann").await.unwrap();
        let ClaimDecision::Claimed(task) = decision else {
            panic!("expected a claim, got {:?}", decision);
        };
        assert_eq!(task.entry.item.filename, "b.wav");
        assert_eq!(task.current_index, 1);
        assert_eq!(task.total_files, 2);
        assert_eq!(task.entry.row_number, 4);
        assert_eq!(store.snapshot()[3][4], "claimed:ann");
        assert!(store.snapshot()[2].iter().all(|cell| cell.is_empty()));
    }

    #[tokio::test]
    async fn every_candidate_taken_is_contended() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            HEADER.to_vec(),
            vec!["a.wav", "", "30", "", ""],
        ]));
        let coordinator = coordinator(store.clone());
        let loaded = coordinator.ledger.load().await.unwrap();
        store.update_cell(2, 5, "claimed:bob").await.unwrap();

        assert_eq!(
            coordinator.claim_from(&loaded, "ann").await.unwrap(),
            ClaimDecision::Contended { attempted: 1 }
        );
        assert_eq!(store.snapshot()[1][4], "claimed:bob");
    }

    #[tokio::test]
    async fn no_unclaimed_rows_is_nothing_pending() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            HEADER.to_vec(),
            vec!["a.wav", "", "30", "x", "done"],
            vec!["b.wav", "", "45", "", "claimed:bob"],
        ]));
        assert_eq!(
            coordinator(store.clone()).claim_next("ann").await.unwrap(),
            ClaimDecision::NothingPending { total_files: 2 }
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn write_failure_surfaces_as_transient() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            HEADER.to_vec(),
            vec!["a.wav", "", "30", "", ""],
        ]));
        store.set_fail_writes(true);
        assert!(matches!(
            coordinator(store).claim_next("ann").await,
            Err(DeskError::TransientWriteFailure(_))
        ));
    }
}
