//! Completion reconciler: writes a finished translation back to its row.
//!
//! Column positions are taken from the header read that follows schema repair,
//! never from an earlier read. Writes go translation, status, interpreter.

use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;

use super::error::DeskError;
use super::ledger::{IdentityKey, WorkLedger};
use super::models::TaskStatus;

/// When completion writes land relative to the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// Writes finish before the caller is answered.
    #[default]
    Synchronous,
    /// Existence is verified, then writes run on a spawned task. Failures only
    /// reach the server log.
    Background,
}

impl CompletionMode {
    pub fn durability(&self) -> &'static str {
        match self {
            Self::Synchronous => "committed",
            Self::Background => "accepted",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// Value of the deployment's identity key.
    pub target: String,
    pub translation: String,
    pub interpreter: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionOutcome {
    pub target: String,
    pub row_number: usize,
    pub status: TaskStatus,
    pub terminal: bool,
}

#[derive(Clone)]
pub struct CompletionReconciler {
    ledger: WorkLedger,
    identity_key: IdentityKey,
}

impl CompletionReconciler {
    pub fn new(ledger: WorkLedger, identity_key: IdentityKey) -> Self {
        Self {
            ledger,
            identity_key,
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        self.identity_key
    }

    /// Re-reads the ledger, resolves the target and writes the completion.
    pub async fn complete(&self, req: &CompletionRequest) -> Result<CompletionOutcome, DeskError> {
        let loaded = self.ledger.load().await?;
        let entry = loaded.find_unique(self.identity_key, &req.target)?;
        let columns = self.ledger.columns();
        let translation_col = loaded.require_column(&columns.translation)?;
        let status_col = loaded.require_column(&columns.status)?;
        let interpreter_col = loaded.require_column(&columns.interpreter)?;

        let text = req.translation.trim();
        let (translation, status) = if text.is_empty() {
            ("", TaskStatus::Unclaimed)
        } else {
            (req.translation.as_str(), TaskStatus::Done)
        };
        let markers = self.ledger.markers();
        let store = self.ledger.store();
        let row = entry.row_number;

        store.update_cell(row, translation_col, translation).await?;
        store
            .update_cell(row, status_col, &markers.render(&status))
            .await?;
        store
            .update_cell(row, interpreter_col, &req.interpreter)
            .await?;

        let terminal = status.is_terminal();
        log::info!(
            "desk_completion_written target={} row={} interpreter={} terminal={} translation_sha256={}",
            req.target,
            row,
            req.interpreter,
            terminal,
            translation_digest(translation)
        );
        Ok(CompletionOutcome {
            target: req.target.clone(),
            row_number: row,
            status,
            terminal,
        })
    }

    /// Confirms the target resolves to exactly one row without writing.
    pub async fn verify_target(&self, target: &str) -> Result<usize, DeskError> {
        let loaded = self.ledger.load().await?;
        Ok(loaded.find_unique(self.identity_key, target)?.row_number)
    }

    /// Runs [`complete`](Self::complete) on a spawned task; failures are logged
    /// as `completion_write_failed` and never reach the caller.
    pub fn spawn_complete(
        &self,
        req: CompletionRequest,
        request_id: String,
    ) -> JoinHandle<Option<CompletionOutcome>> {
        let reconciler = self.clone();
        tokio::spawn(async move {
            match reconciler.complete(&req).await {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    log::error!(
                        "completion_write_failed request_id={} target={} interpreter={} translation_sha256={} error={}",
                        request_id,
                        req.target,
                        req.interpreter,
                        translation_digest(&req.translation),
                        err
                    );
                    None
                }
            }
        })
    }
}

/// Hex SHA-256 of translation text, logged in place of the text.
pub fn translation_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
