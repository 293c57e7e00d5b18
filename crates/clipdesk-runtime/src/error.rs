//! Runtime error taxonomy for task operations.

use clipdesk_ledger::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("work item not found: {0}")]
    NotFound(String),
    /// An identity lookup matched more than one row; nothing was written.
    #[error("work item identity '{key}' matches ledger rows {rows:?}")]
    DuplicateIdentity { key: String, rows: Vec<usize> },
    #[error("backing store unavailable: {0}")]
    BackingStoreUnavailable(String),
    /// A column the operation needs is absent and could not be added.
    #[error("ledger schema inconsistent: {0}")]
    SchemaInconsistent(String),
    /// A write failed after the reads it depended on succeeded.
    #[error("ledger write failed: {0}")]
    TransientWriteFailure(String),
}

impl From<LedgerError> for DeskError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unavailable(msg) => Self::BackingStoreUnavailable(msg),
            LedgerError::Write(msg) => Self::TransientWriteFailure(msg),
            other @ LedgerError::InvalidCell { .. } => Self::TransientWriteFailure(other.to_string()),
        }
    }
}
