//! Task distribution runtime for clipdesk: next-task selection, claims,
//! completion write-back, interpreter sessions and the HTTP surface.

pub mod api_errors;
pub mod api_handlers;
pub mod api_models;
pub mod claim;
pub mod completion;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod selector;
pub mod session;

pub use api_errors::ApiError;
pub use api_handlers::{build_router, DeskApiState};
pub use api_models::{
    ApiEnvelope, ApiMeta, GetTaskQuery, GetTaskResponse, HealthResponse, LoginRequest,
    LoginResponse, SaveTaskRequest, SaveTaskResponse, TaskListResponse, TaskView,
};
pub use claim::{ClaimCoordinator, ClaimDecision};
pub use completion::{
    translation_digest, CompletionMode, CompletionOutcome, CompletionReconciler,
    CompletionRequest,
};
pub use config::{ConfigError, DeskConfig, LedgerBackend};
pub use error::DeskError;
pub use ledger::{IdentityKey, LoadedLedger, WorkLedger};
pub use models::{LedgerColumns, LedgerEntry, StatusMarkers, TaskStatus, WorkItem};
pub use selector::{select_candidates, select_next, SelectedTask, TaskSelection};
pub use session::{Credentials, IssuedToken, Session, SessionError, SessionRegistry};
