//! Work-item domain models and the status-marker vocabulary.

use serde::{Deserialize, Serialize};

/// Header names for each logical column. Deployments pointing at an existing
/// sheet override these to match its header row.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerColumns {
    pub filename: String,
    pub file_id: String,
    pub duration: String,
    pub translation: String,
    pub status: String,
    pub interpreter: String,
}

impl Default for LedgerColumns {
    fn default() -> Self {
        Self {
            filename: "filename".to_string(),
            file_id: "file_id".to_string(),
            duration: "duration".to_string(),
            translation: "translation".to_string(),
            status: "status".to_string(),
            interpreter: "interpreter".to_string(),
        }
    }
}

impl LedgerColumns {
    /// Every column the schema manager keeps in the header.
    pub fn required(&self) -> [&str; 6] {
        [
            self.filename.as_str(),
            self.file_id.as_str(),
            self.duration.as_str(),
            self.translation.as_str(),
            self.status.as_str(),
            self.interpreter.as_str(),
        ]
    }
}

/// Status cell vocabulary. Unclaimed is always the empty cell.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusMarkers {
    pub claimed_prefix: String,
    pub done: String,
}

impl Default for StatusMarkers {
    fn default() -> Self {
        Self {
            claimed_prefix: "claimed:".to_string(),
            done: "done".to_string(),
        }
    }
}

impl StatusMarkers {
    pub const UNCLAIMED: &'static str = "";

    pub fn claimed(&self, interpreter: &str) -> String {
        format!("{}{}", self.claimed_prefix, interpreter)
    }

    /// Strict equality against the unclaimed marker; whitespace is not unclaimed.
    pub fn is_unclaimed(&self, raw: &str) -> bool {
        raw == Self::UNCLAIMED
    }

    pub fn parse(&self, raw: &str) -> TaskStatus {
        if self.is_unclaimed(raw) {
            return TaskStatus::Unclaimed;
        }
        if raw.trim() == self.done {
            return TaskStatus::Done;
        }
        match raw.trim().strip_prefix(self.claimed_prefix.as_str()) {
            Some(interpreter) => TaskStatus::Claimed {
                interpreter: interpreter.trim().to_string(),
            },
            None => TaskStatus::Other(raw.to_string()),
        }
    }

    pub fn render(&self, status: &TaskStatus) -> String {
        match status {
            TaskStatus::Unclaimed => Self::UNCLAIMED.to_string(),
            TaskStatus::Claimed { interpreter } => self.claimed(interpreter),
            TaskStatus::Done => self.done.clone(),
            TaskStatus::Other(raw) => raw.clone(),
        }
    }
}

/// Decoded status cell.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Unclaimed,
    Claimed { interpreter: String },
    Done,
    /// Text this deployment's markers do not recognise; never eligible.
    Other(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// One ledger row decoded into logical fields.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkItem {
    pub filename: String,
    pub file_id: Option<String>,
    /// Seconds; `None` when the cell is empty or not a number.
    pub duration: Option<f64>,
    pub translation: String,
    pub status: TaskStatus,
    pub interpreter: Option<String>,
}

/// A work item together with where it lives in the ledger.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerEntry {
    /// Zero-based position among work items (reported as `current_index`).
    /// Rows without a filename are not counted.
    pub index: usize,
    /// 1-based ledger row used for cell writes.
    pub row_number: usize,
    pub item: WorkItem,
}

pub(crate) fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn parse_duration(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|d| d.is_finite())
}
