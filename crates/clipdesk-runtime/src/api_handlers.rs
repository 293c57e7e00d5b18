//! Axum handlers for the interpreter task desk.

use std::path::PathBuf;

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::{from_fn, Next};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use clipdesk_ledger::SharedRowStore;

use super::api_errors::ApiError;
use super::api_models::{
    status_label, ApiEnvelope, ApiMeta, GetTaskQuery, GetTaskResponse, HealthResponse,
    LoginRequest, LoginResponse, SaveTaskRequest, SaveTaskResponse, TaskListResponse, TaskView,
};
use super::claim::{ClaimCoordinator, ClaimDecision};
use super::completion::{CompletionMode, CompletionReconciler, CompletionRequest};
use super::config::DeskConfig;
use super::ledger::{IdentityKey, WorkLedger};
use super::models::TaskStatus;
use super::session::{Session, SessionRegistry};

const ALL_DONE_MESSAGE: &str = "all tasks are done";

#[derive(Clone)]
pub struct DeskApiState {
    pub ledger: WorkLedger,
    pub claims: ClaimCoordinator,
    pub completions: CompletionReconciler,
    pub sessions: SessionRegistry,
    pub completion_mode: CompletionMode,
    pub static_page: Option<PathBuf>,
}

impl DeskApiState {
    pub fn new(ledger: WorkLedger, sessions: SessionRegistry) -> Self {
        Self {
            claims: ClaimCoordinator::new(ledger.clone()),
            completions: CompletionReconciler::new(ledger.clone(), IdentityKey::Filename),
            ledger,
            sessions,
            completion_mode: CompletionMode::Synchronous,
            static_page: None,
        }
    }

    pub fn from_config(config: &DeskConfig, store: SharedRowStore) -> Self {
        let ledger = WorkLedger::new(store, config.columns.clone(), config.markers.clone());
        Self::new(ledger, SessionRegistry::new(config.credentials.clone()))
            .with_identity_key(config.identity_key)
            .with_completion_mode(config.completion_mode)
            .with_static_page(config.static_page.clone())
    }

    pub fn with_identity_key(mut self, key: IdentityKey) -> Self {
        self.completions = CompletionReconciler::new(self.ledger.clone(), key);
        self
    }

    pub fn with_completion_mode(mut self, mode: CompletionMode) -> Self {
        self.completion_mode = mode;
        self
    }

    pub fn with_static_page(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_page = Some(path.into());
        self
    }
}

pub fn build_router(state: DeskApiState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/get-task", get(get_task))
        .route("/get-task/:filename", get(get_task_by_filename))
        .route("/get-all-tasks", get(get_all_tasks))
        .route("/save-task", post(save_task))
        .route("/update-task", post(save_task))
        .layer(from_fn(request_log_middleware))
        .with_state(state)
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

async fn request_log_middleware(
    mut request: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    let rid = request_id(request.headers());
    let header = HeaderValue::from_str(&rid).ok();
    if let Some(value) = header.clone() {
        request.headers_mut().insert("x-request-id", value);
    }
    log::info!(
        "desk_api_request request_id={} method={} path={}",
        rid,
        request.method(),
        request.uri().path()
    );
    let mut response = next.run(request).await;
    log::info!(
        "desk_api_response request_id={} status={}",
        rid,
        response.status().as_u16()
    );
    if let Some(value) = header {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn authorize(
    state: &DeskApiState,
    headers: &HeaderMap,
    rid: &str,
) -> Result<Session, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token").with_request_id(rid))?;
    state
        .sessions
        .resolve(token)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(rid))
}

/// Optional names carried in requests must agree with the session identity.
fn check_claimed_name(
    session: &Session,
    claimed: Option<&str>,
    rid: &str,
) -> Result<(), ApiError> {
    match claimed.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) if name != session.interpreter => Err(ApiError::forbidden(format!(
            "interpreter_name '{}' does not match the authenticated interpreter",
            name
        ))
        .with_request_id(rid)),
        _ => Ok(()),
    }
}

fn envelope<T>(rid: String, data: T) -> Json<ApiEnvelope<T>> {
    Json(ApiEnvelope {
        meta: ApiMeta::ok(),
        request_id: rid,
        data,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn index_page(
    State(state): State<DeskApiState>,
    headers: HeaderMap,
) -> Result<Html<String>, ApiError> {
    let rid = request_id(&headers);
    let path = state.static_page.as_ref().ok_or_else(|| {
        ApiError::not_found("no interpreter page is configured").with_request_id(&rid)
    })?;
    let page = tokio::fs::read_to_string(path).await.map_err(|e| {
        log::warn!(
            "desk_static_page_unavailable request_id={} path={} error={}",
            rid,
            path.display(),
            e
        );
        ApiError::not_found("interpreter page is not available").with_request_id(&rid)
    })?;
    Ok(Html(page))
}

pub async fn login(
    State(state): State<DeskApiState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiEnvelope<LoginResponse>>, ApiError> {
    let rid = request_id(&headers);
    let issued = state
        .sessions
        .authenticate(&req.interpreter_name, &req.secret)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(&rid))?;
    Ok(envelope(
        rid,
        LoginResponse {
            token: issued.token,
            token_type: "bearer",
            interpreter_name: issued.session.interpreter,
            issued_at: issued.session.issued_at,
        },
    ))
}

pub async fn get_task(
    State(state): State<DeskApiState>,
    headers: HeaderMap,
    Query(query): Query<GetTaskQuery>,
) -> Result<Json<ApiEnvelope<GetTaskResponse>>, ApiError> {
    let rid = request_id(&headers);
    let session = authorize(&state, &headers, &rid).await?;
    check_claimed_name(&session, query.interpreter_name.as_deref(), &rid)?;

    let decision = state
        .claims
        .claim_next(&session.interpreter)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(&rid))?;
    let data = match decision {
        ClaimDecision::Claimed(task) => {
            log::info!(
                "desk_task_assigned request_id={} interpreter={} filename={} row={}",
                rid,
                session.interpreter,
                task.entry.item.filename,
                task.entry.row_number
            );
            GetTaskResponse::Assigned {
                filename: task.entry.item.filename,
                file_id: task.entry.item.file_id,
                duration: task.entry.item.duration,
                row_number: task.entry.row_number,
                current_index: task.current_index,
                total_files: task.total_files,
            }
        }
        ClaimDecision::NothingPending { total_files } => GetTaskResponse::AllDone {
            message: ALL_DONE_MESSAGE.to_string(),
            total_files,
        },
        ClaimDecision::Contended { attempted } => {
            return Err(ApiError::conflict(
                "every pending task was claimed concurrently, retry the request",
            )
            .with_request_id(rid)
            .with_details(serde_json::json!({ "attempted": attempted })));
        }
    };
    Ok(envelope(rid, data))
}

pub async fn get_task_by_filename(
    State(state): State<DeskApiState>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<Json<ApiEnvelope<TaskView>>, ApiError> {
    let rid = request_id(&headers);
    authorize(&state, &headers, &rid).await?;
    let loaded = state.ledger.load().await.map_err(|e| ApiError::from(e).with_request_id(&rid))?;
    let entry = loaded
        .find_unique(IdentityKey::Filename, &filename)
        .map_err(|e| ApiError::from(e).with_request_id(&rid))?;
    Ok(envelope(rid, TaskView::from(entry)))
}

pub async fn get_all_tasks(
    State(state): State<DeskApiState>,
    headers: HeaderMap,
) -> Result<Json<ApiEnvelope<TaskListResponse>>, ApiError> {
    let rid = request_id(&headers);
    let session = authorize(&state, &headers, &rid).await?;
    let loaded = state.ledger.load().await.map_err(|e| ApiError::from(e).with_request_id(&rid))?;
    let tasks = loaded
        .assigned_to(&session.interpreter)
        .map(TaskView::from)
        .collect();
    Ok(envelope(
        rid,
        TaskListResponse {
            interpreter_name: session.interpreter,
            tasks,
            total_files: loaded.total_files(),
        },
    ))
}

pub async fn save_task(
    State(state): State<DeskApiState>,
    headers: HeaderMap,
    Json(req): Json<SaveTaskRequest>,
) -> Result<Json<ApiEnvelope<SaveTaskResponse>>, ApiError> {
    let rid = request_id(&headers);
    let session = authorize(&state, &headers, &rid).await?;
    check_claimed_name(&session, req.interpreter_name.as_deref(), &rid)?;

    let key = state.completions.identity_key();
    let target = match key {
        IdentityKey::Filename => req.filename,
        IdentityKey::FileId => req.file_id,
    }
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .ok_or_else(|| {
        ApiError::bad_request(format!("{} is required", key.as_str())).with_request_id(&rid)
    })?;
    let completion = CompletionRequest {
        target,
        translation: req.translation,
        interpreter: session.interpreter,
    };

    let mode = state.completion_mode;
    let data = match mode {
        CompletionMode::Synchronous => {
            let outcome = state
                .completions
                .complete(&completion)
                .await
                .map_err(|e| ApiError::from(e).with_request_id(&rid))?;
            SaveTaskResponse {
                target: outcome.target,
                status: status_label(&outcome.status),
                terminal: outcome.terminal,
                durability: mode.durability(),
            }
        }
        CompletionMode::Background => {
            state
                .completions
                .verify_target(&completion.target)
                .await
                .map_err(|e| ApiError::from(e).with_request_id(&rid))?;
            let status = if completion.translation.trim().is_empty() {
                TaskStatus::Unclaimed
            } else {
                TaskStatus::Done
            };
            log::info!(
                "desk_completion_accepted request_id={} target={} interpreter={}",
                rid,
                completion.target,
                completion.interpreter
            );
            let target = completion.target.clone();
            let _ = state.completions.spawn_complete(completion, rid.clone());
            SaveTaskResponse {
                target,
                terminal: status.is_terminal(),
                status: status_label(&status),
                durability: mode.durability(),
            }
        }
    };
    Ok(envelope(rid, data))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use clipdesk_ledger::MemoryRowStore;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use super::*;
    use crate::models::{LedgerColumns, StatusMarkers};
    use crate::session::Credentials;

    fn ledger_store() -> Arc<MemoryRowStore> {
        Arc::new(MemoryRowStore::from_rows(vec![
            vec!["filename", "file_id", "duration", "translation", "status", "interpreter"],
            vec!["a.wav", "f-1", "30", "hello", "done", "ann"],
            vec!["b.wav", "f-2", "45", "", "", ""],
        ]))
    }

    fn state(store: Arc<MemoryRowStore>) -> DeskApiState {
        let ledger = WorkLedger::new(store, LedgerColumns::default(), StatusMarkers::default());
        DeskApiState::new(
            ledger,
            SessionRegistry::new(Credentials::Shared("open".to_string())),
        )
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn login_token(router: &Router, name: &str) -> String {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "interpreter_name": name, "secret": "open" }).to_string(),
            ))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        json_body(resp).await["data"]["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn authed(method: Method, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token));
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn health_is_plain_ok() {
        let router = build_router(state(ledger_store()));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn login_with_wrong_secret_is_unauthorized() {
        let router = build_router(state(ledger_store()));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header("content-type", "application/json")
            .header("x-request-id", "rid-login")
            .body(Body::from(
                serde_json::json!({ "interpreter_name": "ann", "secret": "nope" }).to_string(),
            ))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let json = json_body(resp).await;
        assert_eq!(json["request_id"], "rid-login");
        assert_eq!(json["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn get_task_claims_next_row() {
        let store = ledger_store();
        let router = build_router(state(store.clone()));
        let token = login_token(&router, "bob").await;

        let resp = router
            .clone()
            .oneshot(authed(Method::GET, "/get-task", &token, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["meta"]["status"], "ok");
        assert_eq!(json["data"]["outcome"], "assigned");
        assert_eq!(json["data"]["filename"], "b.wav");
        assert_eq!(json["data"]["duration"], 45.0);
        assert_eq!(json["data"]["current_index"], 1);
        assert_eq!(json["data"]["total_files"], 2);
        assert_eq!(store.snapshot()[2][4], "claimed:bob");

        let resp = router
            .oneshot(authed(Method::GET, "/get-task", &token, None))
            .await
            .unwrap();
        let json = json_body(resp).await;
        assert_eq!(json["data"]["outcome"], "all_done");
        assert_eq!(json["data"]["total_files"], 2);
    }

    #[tokio::test]
    async fn missing_or_unknown_token_mutates_nothing() {
        let store = ledger_store();
        let router = build_router(state(store.clone()));
        let before = store.snapshot();

        let anonymous = Request::builder()
            .uri("/get-task")
            .body(Body::empty())
            .unwrap();
        let resp = router.clone().oneshot(anonymous).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = serde_json::json!({ "filename": "b.wav", "translation": "x" });
        let resp = router
            .oneshot(authed(Method::POST, "/save-task", "forged", Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn mismatched_interpreter_name_is_forbidden() {
        let store = ledger_store();
        let router = build_router(state(store.clone()));
        let token = login_token(&router, "bob").await;
        let resp = router
            .oneshot(authed(
                Method::GET,
                "/get-task?interpreter_name=ann",
                &token,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn save_and_update_task_complete_rows() {
        let store = ledger_store();
        let router = build_router(state(store.clone()));
        let token = login_token(&router, "bob").await;

        let body = serde_json::json!({
            "filename": "b.wav",
            "translation": "สวัสดี",
            "interpreter_name": "bob"
        });
        let resp = router
            .clone()
            .oneshot(authed(Method::POST, "/save-task", &token, Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["data"]["status"], "done");
        assert_eq!(json["data"]["terminal"], true);
        assert_eq!(json["data"]["durability"], "committed");
        assert_eq!(
            store.snapshot()[2],
            vec!["b.wav", "f-2", "45", "สวัสดี", "done", "bob"]
        );

        let body = serde_json::json!({ "filename": "b.wav", "translation": "  " });
        let resp = router
            .oneshot(authed(Method::POST, "/update-task", &token, Some(body)))
            .await
            .unwrap();
        let json = json_body(resp).await;
        assert_eq!(json["data"]["status"], "unclaimed");
        assert_eq!(store.snapshot()[2], vec!["b.wav", "f-2", "45", "", "", "bob"]);
    }

    #[tokio::test]
    async fn save_task_for_unknown_file_is_not_found() {
        let store = ledger_store();
        let router = build_router(state(store.clone()));
        let token = login_token(&router, "bob").await;
        let before = store.snapshot();
        let body = serde_json::json!({ "filename": "zzz.wav", "translation": "x" });
        let resp = router
            .oneshot(authed(Method::POST, "/save-task", &token, Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["error"]["code"], "not_found");
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn save_task_without_configured_key_is_bad_request() {
        let store = ledger_store();
        let router = build_router(state(store).with_identity_key(IdentityKey::FileId));
        let token = login_token(&router, "bob").await;
        let body = serde_json::json!({ "filename": "b.wav", "translation": "x" });
        let resp = router
            .oneshot(authed(Method::POST, "/save-task", &token, Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn background_completion_is_accepted_then_written() {
        let store = ledger_store();
        let router = build_router(
            state(store.clone())
                .with_identity_key(IdentityKey::FileId)
                .with_completion_mode(CompletionMode::Background),
        );
        let token = login_token(&router, "bob").await;

        let missing = serde_json::json!({ "file_id": "f-9", "translation": "x" });
        let resp = router
            .clone()
            .oneshot(authed(Method::POST, "/save-task", &token, Some(missing)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = serde_json::json!({ "file_id": "f-2", "translation": "bonjour" });
        let resp = router
            .oneshot(authed(Method::POST, "/save-task", &token, Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["data"]["durability"], "accepted");

        let mut written = false;
        for _ in 0..100 {
            if store.snapshot()[2][4] == "done" {
                written = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(written);
        assert_eq!(store.snapshot()[2][3], "bonjour");
    }

    #[tokio::test]
    async fn get_all_tasks_lists_callers_rows() {
        let router = build_router(state(ledger_store()));
        let token = login_token(&router, "ann").await;
        let resp = router
            .oneshot(authed(Method::GET, "/get-all-tasks", &token, None))
            .await
            .unwrap();
        let json = json_body(resp).await;
        let tasks = json["data"]["tasks"].as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["filename"], "a.wav");
        assert_eq!(tasks[0]["status"], "done");
    }

    #[tokio::test]
    async fn claimed_row_is_listed_for_its_holder() {
        let store = ledger_store();
        let router = build_router(state(store.clone()));
        let token = login_token(&router, "bob").await;

        let resp = router
            .clone()
            .oneshot(authed(Method::GET, "/get-task", &token, None))
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["data"]["filename"], "b.wav");
        assert_eq!(store.snapshot()[2][5], "bob");

        let resp = router
            .clone()
            .oneshot(authed(Method::GET, "/get-all-tasks", &token, None))
            .await
            .unwrap();
        let json = json_body(resp).await;
        let tasks = json["data"]["tasks"].as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["filename"], "b.wav");
        assert_eq!(tasks[0]["status"], "claimed");
        assert_eq!(tasks[0]["claimed_by"], "bob");

        let body = serde_json::json!({ "filename": "b.wav", "translation": " " });
        let resp = router
            .clone()
            .oneshot(authed(Method::POST, "/update-task", &token, Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = router
            .oneshot(authed(Method::GET, "/get-all-tasks", &token, None))
            .await
            .unwrap();
        let json = json_body(resp).await;
        assert!(json["data"]["tasks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_task_by_filename_does_not_claim() {
        let store = ledger_store();
        let router = build_router(state(store.clone()));
        let token = login_token(&router, "bob").await;
        let resp = router
            .clone()
            .oneshot(authed(Method::GET, "/get-task/b.wav", &token, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["data"]["status"], "unclaimed");
        assert_eq!(json["data"]["row_number"], 3);
        assert_eq!(store.write_count(), 0);

        let resp = router
            .oneshot(authed(Method::GET, "/get-task/zzz.wav", &token, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreachable_ledger_is_service_unavailable() {
        let store = ledger_store();
        let router = build_router(state(store.clone()));
        let token = login_token(&router, "bob").await;
        store.set_fail_reads(true);
        let resp = router
            .oneshot(authed(Method::GET, "/get-task", &token, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn index_serves_configured_page() {
        let path = std::env::temp_dir().join(format!("clipdesk-page-{}.html", uuid::Uuid::new_v4()));
        std::fs::write(&path, "<h1>desk</h1>").unwrap();
        let router = build_router(state(ledger_store()).with_static_page(path.clone()));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<h1>desk</h1>");
        let _ = std::fs::remove_file(path);

        let router = build_router(state(ledger_store()).with_static_page("/nonexistent/page.html"));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(
            router.oneshot(req).await.unwrap().status(),
            StatusCode::NOT_FOUND
        );
    }
}
