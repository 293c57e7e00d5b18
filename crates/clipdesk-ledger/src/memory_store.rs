//! In-memory RowStore implementation.
//!
//! Backs the `memory` deployment backend and every test in the workspace.
//! Fault switches let tests make reads, cell writes or column appends fail,
//! and the write counter makes "no mutation" properties observable.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::LedgerError;
use super::store::{check_coordinates, last_header_column, RowStore};

/// In-memory ledger grid; row 1 (index 0) is the header.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    grid: RwLock<Vec<Vec<String>>>,
    writes: AtomicU64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_appends: AtomicBool,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid seeded from string slices, header first.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let grid = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self {
            grid: RwLock::new(grid),
            ..Self::default()
        }
    }

    /// Successful `update_cell` plus `append_column` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Copy of the current grid.
    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.grid
            .read()
            .map(|grid| grid.clone())
            .unwrap_or_default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    fn check_readable(&self) -> Result<(), LedgerError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::unavailable("memory ledger reads disabled"));
        }
        Ok(())
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, LedgerError> {
        self.check_readable()?;
        let grid = self
            .grid
            .read()
            .map_err(|e| LedgerError::unavailable(e.to_string()))?;
        Ok(grid.clone())
    }

    async fn read_cell(&self, row: usize, col: usize) -> Result<String, LedgerError> {
        check_coordinates(row, col)?;
        self.check_readable()?;
        let grid = self
            .grid
            .read()
            .map_err(|e| LedgerError::unavailable(e.to_string()))?;
        Ok(grid
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .cloned()
            .unwrap_or_default())
    }

    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), LedgerError> {
        check_coordinates(row, col)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::write("memory ledger writes disabled"));
        }
        let mut grid = self
            .grid
            .write()
            .map_err(|e| LedgerError::write(e.to_string()))?;
        let cells = grid
            .get_mut(row - 1)
            .ok_or(LedgerError::InvalidCell { row, col })?;
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn append_column(&self, name: &str) -> Result<usize, LedgerError> {
        if self.fail_appends.load(Ordering::SeqCst) || self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::write("memory ledger column appends disabled"));
        }
        let mut grid = self
            .grid
            .write()
            .map_err(|e| LedgerError::write(e.to_string()))?;
        if grid.is_empty() {
            grid.push(Vec::new());
        }
        let header = &mut grid[0];
        let col = last_header_column(header) + 1;
        if header.len() < col {
            header.resize(col, String::new());
        }
        header[col - 1] = name.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(col)
    }
}
