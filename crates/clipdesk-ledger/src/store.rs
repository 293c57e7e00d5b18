//! RowStore: the adapter boundary around the externally-owned ledger.
//!
//! The ledger is a grid of text cells addressed by 1-based `(row, col)`
//! coordinates. Row 1 is the header naming columns; data rows start at row 2.
//! Stores offer no transactions, locks or conditional writes, so every
//! read-then-write sequence built on top of this trait is advisory.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::LedgerError;

/// Row-store contract used by the schema manager, selector and reconciler.
///
/// Implementations must guarantee:
/// - `read_all_rows` returns rows in ledger order with the header at index 0.
///   Rows may be ragged; a missing trailing cell reads as `""`.
/// - `update_cell` is visible to every later read (no local write-back cache).
/// - `append_column` never moves or renames an existing header cell.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Full grid, header first.
    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, LedgerError>;

    /// Header row only.
    async fn read_header(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self.read_all_rows().await?.into_iter().next().unwrap_or_default())
    }

    /// Single cell; `""` when the cell was never written.
    async fn read_cell(&self, row: usize, col: usize) -> Result<String, LedgerError> {
        check_coordinates(row, col)?;
        let rows = self.read_all_rows().await?;
        Ok(rows
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .cloned()
            .unwrap_or_default())
    }

    /// Overwrite one cell.
    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), LedgerError>;

    /// Add a header cell named `name` after the last non-empty header cell.
    /// Returns the new column's 1-based position.
    async fn append_column(&self, name: &str) -> Result<usize, LedgerError>;

    /// Reachability probe used by startup health checks.
    async fn ping(&self) -> Result<(), LedgerError> {
        self.read_header().await.map(|_| ())
    }
}

/// Shared handle used by request handlers; the backend is chosen at startup.
pub type SharedRowStore = Arc<dyn RowStore>;

/// Rejects the zero coordinates a 1-based grid cannot address.
pub fn check_coordinates(row: usize, col: usize) -> Result<(), LedgerError> {
    if row == 0 || col == 0 {
        return Err(LedgerError::InvalidCell { row, col });
    }
    Ok(())
}

/// Position (1-based) of the last non-empty header cell, or 0 for an empty header.
pub fn last_header_column(header: &[String]) -> usize {
    header
        .iter()
        .rposition(|cell| !cell.trim().is_empty())
        .map(|idx| idx + 1)
        .unwrap_or(0)
}
