//! Point-in-time copy of the ledger grid.

use super::columns::ColumnMap;

/// One read of the whole ledger: header plus data rows, in ledger order.
///
/// A snapshot is never refreshed; callers that write re-read instead of
/// trusting an old snapshot's column positions.
#[derive(Clone, Debug, Default)]
pub struct LedgerSnapshot {
    header: Vec<String>,
    columns: ColumnMap,
    rows: Vec<Vec<String>>,
}

/// A data row borrowed from a snapshot.
#[derive(Clone, Copy, Debug)]
pub struct RowRef<'a> {
    /// Zero-based position among data rows.
    pub index: usize,
    /// 1-based ledger row (header is row 1, so `index + 2`).
    pub row_number: usize,
    cells: &'a [String],
    columns: &'a ColumnMap,
}

impl<'a> RowRef<'a> {
    /// Cell under the named column, `""` when the column or cell is absent.
    pub fn cell(&self, column: &str) -> &'a str {
        self.columns
            .position(column)
            .and_then(|pos| self.cells.get(pos - 1))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl LedgerSnapshot {
    /// Splits a raw grid (header at index 0) into header and data rows.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        let header = if grid.is_empty() {
            Vec::new()
        } else {
            grid.remove(0)
        };
        let columns = ColumnMap::from_header(&header);
        Self {
            header,
            columns,
            rows: grid,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|cells| RowRef {
            index,
            row_number: index + 2,
            cells,
            columns: &self.columns,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.rows.len()).filter_map(move |idx| self.row(idx))
    }
}
