//! Error type shared by every row-store adapter.

/// Ledger-level error type.
///
/// Read failures surface as [`LedgerError::Unavailable`]; a write rejected after
/// the reads succeeded surfaces as [`LedgerError::Write`].
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The store could not be reached, authenticated against, or decoded.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    /// A write was rejected by the store.
    #[error("ledger write failed: {0}")]
    Write(String),
    /// Coordinates outside the provisioned grid (rows and columns are 1-based).
    #[error("invalid ledger cell: row {row}, column {col}")]
    InvalidCell { row: usize, col: usize },
}

impl LedgerError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }

    /// True when the failure says nothing about the data, only about reachability.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
