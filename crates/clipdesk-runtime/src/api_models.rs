//! Request and response bodies for the task desk API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{LedgerEntry, TaskStatus};

#[derive(Clone, Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub meta: ApiMeta,
    pub request_id: String,
    pub data: T,
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiMeta {
    pub status: &'static str,
    pub api_version: &'static str,
}

impl ApiMeta {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            api_version: "v1",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginRequest {
    pub interpreter_name: String,
    pub secret: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub interpreter_name: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GetTaskQuery {
    pub interpreter_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GetTaskResponse {
    Assigned {
        filename: String,
        file_id: Option<String>,
        duration: Option<f64>,
        row_number: usize,
        current_index: usize,
        total_files: usize,
    },
    AllDone {
        message: String,
        total_files: usize,
    },
}

/// One work item as reported to clients.
#[derive(Clone, Debug, Serialize)]
pub struct TaskView {
    pub filename: String,
    pub file_id: Option<String>,
    pub duration: Option<f64>,
    pub translation: String,
    pub status: String,
    pub claimed_by: Option<String>,
    pub interpreter: Option<String>,
    pub row_number: usize,
    pub current_index: usize,
}

impl From<&LedgerEntry> for TaskView {
    fn from(entry: &LedgerEntry) -> Self {
        let item = &entry.item;
        let claimed_by = match &item.status {
            TaskStatus::Claimed { interpreter } => Some(interpreter.clone()),
            _ => None,
        };
        Self {
            filename: item.filename.clone(),
            file_id: item.file_id.clone(),
            duration: item.duration,
            translation: item.translation.clone(),
            status: status_label(&item.status),
            claimed_by,
            interpreter: item.interpreter.clone(),
            row_number: entry.row_number,
            current_index: entry.index,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskListResponse {
    pub interpreter_name: String,
    pub tasks: Vec<TaskView>,
    pub total_files: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SaveTaskRequest {
    pub filename: Option<String>,
    pub file_id: Option<String>,
    pub translation: String,
    pub interpreter_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SaveTaskResponse {
    pub target: String,
    pub status: String,
    pub terminal: bool,
    /// `committed` when the ledger was written before responding, `accepted`
    /// when the write was handed to a background task.
    pub durability: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn status_label(status: &TaskStatus) -> String {
    match status {
        TaskStatus::Unclaimed => "unclaimed".to_string(),
        TaskStatus::Claimed { .. } => "claimed".to_string(),
        TaskStatus::Done => "done".to_string(),
        TaskStatus::Other(raw) => raw.clone(),
    }
}
