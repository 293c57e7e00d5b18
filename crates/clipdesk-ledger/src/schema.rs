//! Schema manager: keeps the ledger header carrying every required column.
//!
//! Repair only appends. Existing header cells are never moved, renamed or
//! removed, and a header that already has every required column costs one
//! read and zero writes.

use super::columns::ColumnMap;
use super::error::LedgerError;
use super::snapshot::LedgerSnapshot;
use super::store::RowStore;

/// Outcome of [`ensure_columns`].
#[derive(Clone, Debug)]
pub struct SchemaRepair {
    /// Ledger as it stands after the repair attempt.
    pub snapshot: LedgerSnapshot,
    /// Columns appended by this call, in append order.
    pub appended: Vec<String>,
    /// Text of the append failure that stopped the repair, if any.
    pub failure: Option<String>,
}

impl SchemaRepair {
    pub fn is_noop(&self) -> bool {
        self.appended.is_empty() && self.failure.is_none()
    }
}

/// Minimal append plan: required names absent from `header`, in required
/// order, each at most once.
pub fn plan_missing_columns(header: &[String], required: &[&str]) -> Vec<String> {
    let mut planned: Vec<String> = Vec::new();
    for name in ColumnMap::from_header(header).missing(required) {
        let name = name.trim();
        if !name.is_empty() && !planned.iter().any(|p| p == name) {
            planned.push(name.to_string());
        }
    }
    planned
}

/// Reads the ledger and appends any missing required column.
///
/// A failed append does not fail the call: the repair stops, the failure is
/// logged and recorded, and the snapshot reflects whatever columns exist.
/// Read failures are returned as errors.
pub async fn ensure_columns<S>(store: &S, required: &[&str]) -> Result<SchemaRepair, LedgerError>
where
    S: RowStore + ?Sized,
{
    let snapshot = LedgerSnapshot::from_grid(store.read_all_rows().await?);
    let plan = plan_missing_columns(snapshot.header(), required);
    if plan.is_empty() {
        return Ok(SchemaRepair {
            snapshot,
            appended: Vec::new(),
            failure: None,
        });
    }

    let mut appended = Vec::with_capacity(plan.len());
    let mut failure = None;
    for name in plan {
        match store.append_column(&name).await {
            Ok(col) => {
                log::info!("ledger_schema_column_appended column={} position={}", name, col);
                appended.push(name);
            }
            Err(e) => {
                log::warn!(
                    "ledger_schema_repair_failed column={} appended={} error={}",
                    name,
                    appended.len(),
                    e
                );
                failure = Some(e.to_string());
                break;
            }
        }
    }

    let snapshot = if appended.is_empty() {
        snapshot
    } else {
        LedgerSnapshot::from_grid(store.read_all_rows().await?)
    };
    Ok(SchemaRepair {
        snapshot,
        appended,
        failure,
    })
}
