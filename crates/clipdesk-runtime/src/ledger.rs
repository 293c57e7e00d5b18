//! Work ledger: schema-repaired reads decoded into work items.
//!
//! Every [`WorkLedger::load`] repairs the header first and decodes against the
//! repaired header, so column positions handed to writers are never older than
//! the last repair.

use clipdesk_ledger::{ensure_columns, LedgerSnapshot, RowRef, SharedRowStore};

use super::error::DeskError;
use super::models::{
    non_empty, parse_duration, LedgerColumns, LedgerEntry, StatusMarkers, TaskStatus, WorkItem,
};

/// Which field identifies the target of a completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityKey {
    Filename,
    FileId,
}

impl IdentityKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::FileId => "file_id",
        }
    }
}

#[derive(Clone)]
pub struct WorkLedger {
    store: SharedRowStore,
    columns: LedgerColumns,
    markers: StatusMarkers,
}

impl WorkLedger {
    pub fn new(store: SharedRowStore, columns: LedgerColumns, markers: StatusMarkers) -> Self {
        Self {
            store,
            columns,
            markers,
        }
    }

    pub fn store(&self) -> &SharedRowStore {
        &self.store
    }

    pub fn columns(&self) -> &LedgerColumns {
        &self.columns
    }

    pub fn markers(&self) -> &StatusMarkers {
        &self.markers
    }

    /// Repairs the header, then decodes every row with a filename.
    pub async fn load(&self) -> Result<LoadedLedger, DeskError> {
        let repair = ensure_columns(self.store.as_ref(), &self.columns.required()).await?;
        if let Some(failure) = repair.failure.as_deref() {
            log::warn!(
                "desk_schema_degraded appended={} error={}",
                repair.appended.len(),
                failure
            );
        }
        let snapshot = repair.snapshot;
        let entries = snapshot
            .rows()
            .filter_map(|row| {
                decode_item(&row, &self.columns, &self.markers).map(|item| (row.row_number, item))
            })
            .enumerate()
            .map(|(index, (row_number, item))| LedgerEntry {
                index,
                row_number,
                item,
            })
            .collect();
        Ok(LoadedLedger {
            snapshot,
            columns: self.columns.clone(),
            entries,
        })
    }
}

fn decode_item(row: &RowRef<'_>, columns: &LedgerColumns, markers: &StatusMarkers) -> Option<WorkItem> {
    let filename = non_empty(row.cell(&columns.filename))?;
    Some(WorkItem {
        filename,
        file_id: non_empty(row.cell(&columns.file_id)),
        duration: parse_duration(row.cell(&columns.duration)),
        translation: row.cell(&columns.translation).to_string(),
        status: markers.parse(row.cell(&columns.status)),
        interpreter: non_empty(row.cell(&columns.interpreter)),
    })
}

/// One decoded read of the ledger.
#[derive(Clone, Debug)]
pub struct LoadedLedger {
    snapshot: LedgerSnapshot,
    columns: LedgerColumns,
    entries: Vec<LedgerEntry>,
}

impl LoadedLedger {
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn total_files(&self) -> usize {
        self.entries.len()
    }

    pub fn snapshot(&self) -> &LedgerSnapshot {
        &self.snapshot
    }

    /// 1-based position of a header column this read saw, or SchemaInconsistent.
    pub fn require_column(&self, header_name: &str) -> Result<usize, DeskError> {
        self.snapshot.columns().position(header_name).ok_or_else(|| {
            DeskError::SchemaInconsistent(format!(
                "required column '{}' is missing from the ledger header",
                header_name
            ))
        })
    }

    /// Resolves exactly one entry for `value` under `key`.
    pub fn find_unique(&self, key: IdentityKey, value: &str) -> Result<&LedgerEntry, DeskError> {
        let value = value.trim();
        let matches: Vec<&LedgerEntry> = self
            .entries
            .iter()
            .filter(|entry| match key {
                IdentityKey::Filename => entry.item.filename == value,
                IdentityKey::FileId => entry.item.file_id.as_deref() == Some(value),
            })
            .collect();
        match matches.as_slice() {
            [] => Err(DeskError::NotFound(format!(
                "no ledger row has {} '{}'",
                key.as_str(),
                value
            ))),
            [entry] => Ok(*entry),
            many => Err(DeskError::DuplicateIdentity {
                key: value.to_string(),
                rows: many.iter().map(|e| e.row_number).collect(),
            }),
        }
    }

    /// Entries `interpreter` holds or finished. A live claim marker decides
    /// held rows; otherwise the interpreter column does. Rows released back to
    /// unclaimed are left out.
    pub fn assigned_to<'a>(&'a self, interpreter: &'a str) -> impl Iterator<Item = &'a LedgerEntry> {
        self.entries.iter().filter(move |e| match &e.item.status {
            TaskStatus::Unclaimed => false,
            TaskStatus::Claimed { interpreter: holder } => holder == interpreter,
            _ => e.item.interpreter.as_deref() == Some(interpreter),
        })
    }

    pub fn columns(&self) -> &LedgerColumns {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clipdesk_ledger::MemoryRowStore;

    use super::*;

    fn ledger(store: Arc<MemoryRowStore>) -> WorkLedger {
        WorkLedger::new(store, LedgerColumns::default(), StatusMarkers::default())
    }

    #[tokio::test]
    async fn load_repairs_header_and_decodes_rows() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            vec!["filename", "duration", "translation"],
            vec!["a.wav", "30", "hello"],
            vec!["", "", ""],
            vec!["b.wav", "45"],
        ]));
        let loaded = ledger(store.clone()).load().await.unwrap();
        assert_eq!(loaded.total_files(), 2);
        let b = &loaded.entries()[1];
        assert_eq!(b.index, 1);
        assert_eq!(b.row_number, 4);
        assert_eq!(b.item.duration, Some(45.0));
        assert_eq!(b.item.status, TaskStatus::Unclaimed);
        assert!(loaded.require_column("interpreter").is_ok());
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test]
    async fn missing_column_after_failed_repair_is_schema_inconsistent() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![vec!["filename"], vec!["a.wav"]]));
        store.set_fail_appends(true);
        let loaded = ledger(store).load().await.unwrap();
        assert_eq!(loaded.total_files(), 1);
        assert!(matches!(
            loaded.require_column("status"),
            Err(DeskError::SchemaInconsistent(_))
        ));
    }

    #[tokio::test]
    async fn find_unique_requires_exactly_one_match() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            vec!["filename", "file_id", "duration", "translation", "status", "interpreter"],
            vec!["a.wav", "f-1"],
            vec!["b.wav", "f-2"],
            vec!["a.wav", "f-3"],
        ]));
        let loaded = ledger(store).load().await.unwrap();
        assert_eq!(
            loaded.find_unique(IdentityKey::FileId, "f-2").unwrap().row_number,
            3
        );
        assert!(matches!(
            loaded.find_unique(IdentityKey::Filename, "zzz.wav"),
            Err(DeskError::NotFound(_))
        ));
        match loaded.find_unique(IdentityKey::Filename, "a.wav") {
            Err(DeskError::DuplicateIdentity { rows, .. }) => assert_eq!(rows, vec![2, 4]),
            other => panic!("expected duplicate identity, got {:?}", other),
        }
        assert!(matches!(
            loaded.find_unique(IdentityKey::FileId, "b.wav"),
            Err(DeskError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn assigned_to_follows_claims_and_skips_released_rows() {
        let store = Arc::new(MemoryRowStore::from_rows(vec![
            vec!["filename", "file_id", "duration", "translation", "status", "interpreter"],
            vec!["a.wav", "", "", "hi", "done", "ann"],
            vec!["b.wav", "", "", "", "claimed:ann", ""],
            vec!["c.wav", "", "", "", "", "ann"],
            vec!["d.wav", "", "", "", "claimed:bob", "ann"],
        ]));
        let loaded = ledger(store).load().await.unwrap();
        let names: Vec<&str> = loaded
            .assigned_to("ann")
            .map(|e| e.item.filename.as_str())
            .collect();
        assert_eq!(names, vec!["a.wav", "b.wav"]);
        let bob: Vec<&str> = loaded
            .assigned_to("bob")
            .map(|e| e.item.filename.as_str())
            .collect();
        assert_eq!(bob, vec!["d.wav"]);
    }

    #[tokio::test]
    async fn unreachable_store_is_backing_store_unavailable() {
        let store = Arc::new(MemoryRowStore::new());
        store.set_fail_reads(true);
        assert!(matches!(
            ledger(store).load().await,
            Err(DeskError::BackingStoreUnavailable(_))
        ));
    }
}
