//! Work-ledger access for clipdesk: the row-store boundary, header resolution
//! and schema repair.
//!
//! The ledger is externally owned. Nothing in this crate caches it across
//! calls; every operation reads what it needs from the live store.

pub mod columns;
pub mod error;
pub mod memory_store;
pub mod schema;
#[cfg(feature = "sheets")]
pub mod sheets_store;
pub mod snapshot;
#[cfg(feature = "sqlite-persistence")]
pub mod sqlite_store;
pub mod store;

pub use columns::ColumnMap;
pub use error::LedgerError;
pub use memory_store::MemoryRowStore;
pub use schema::{ensure_columns, plan_missing_columns, SchemaRepair};
#[cfg(feature = "sheets")]
pub use sheets_store::{column_letters, SheetsConfig, SheetsRowStore};
pub use snapshot::{LedgerSnapshot, RowRef};
#[cfg(feature = "sqlite-persistence")]
pub use sqlite_store::SqliteRowStore;
pub use store::{RowStore, SharedRowStore};
