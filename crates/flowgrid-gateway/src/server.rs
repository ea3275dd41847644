//! Gateway server: the execute event, trigger webhooks, and the status
//! channel socket

use crate::auth::ChannelTokens;
use crate::ws::stream_status;
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use flowgrid_core::{ExecuteWorkflow, OrgId, RunContext, RunId, WorkflowId};
use flowgrid_engine::RunDriver;
use flowgrid_store::WorkflowStore;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Gateway configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub port: u16,
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 8090,
            bind: "0.0.0.0".into(),
        }
    }
}

pub struct AppState {
    pub workflows: Arc<dyn WorkflowStore>,
    pub driver: Arc<RunDriver>,
    pub tokens: ChannelTokens,
}

type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/workflows/execute", post(execute_handler))
        .route("/webhooks/google-form/:workflow_id", post(google_form_handler))
        .route("/webhooks/stripe/:workflow_id", post(stripe_handler))
        .route("/runs/:run_id/status", get(status_ws_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

pub async fn start_gateway(state: AppState, config: GatewayConfig) -> anyhow::Result<()> {
    let bind_addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let app = router(Arc::new(state));

    info!("Flowgrid gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Execute event: POST http://{}/workflows/execute", bind_addr);
    info!("  Status channel: ws://{}/runs/:run_id/status", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Short human-readable message only; details stay server-side.
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid token".into()),
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

/// The org comes from the authenticated session; the header is its stand-in
/// at this boundary.
fn org_from_headers(headers: &HeaderMap) -> Result<OrgId, ApiError> {
    headers
        .get("x-organization-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(OrgId::new)
        .ok_or_else(|| ApiError::BadRequest("missing x-organization-id header".into()))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

/// Start a run for the `workflows/execute.workflow` event. The run proceeds
/// in the background; the response carries the run id and a channel token
/// for the status socket.
async fn execute_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<ExecuteWorkflow>,
) -> Result<Response, ApiError> {
    let org = org_from_headers(&headers)?;
    let initial = payload
        .initial_data
        .map(RunContext::from_map)
        .unwrap_or_default();
    spawn_run(&state, &org, &payload.workflow_id, initial).await
}

async fn google_form_handler(
    State(state): State<SharedState>,
    Path(workflow_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Response, ApiError> {
    let org = org_from_headers(&headers)?;
    let mut initial = RunContext::new();
    initial.insert("googleForm", payload);
    spawn_run(&state, &org, &WorkflowId::new(workflow_id), initial).await
}

async fn stripe_handler(
    State(state): State<SharedState>,
    Path(workflow_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Response, ApiError> {
    let org = org_from_headers(&headers)?;
    let mut initial = RunContext::new();
    initial.insert("stripe", payload);
    spawn_run(&state, &org, &WorkflowId::new(workflow_id), initial).await
}

async fn spawn_run(
    state: &SharedState,
    org: &OrgId,
    workflow_id: &WorkflowId,
    initial: RunContext,
) -> Result<Response, ApiError> {
    let workflow = state
        .workflows
        .workflow(org, workflow_id)
        .await
        .map_err(|_| ApiError::NotFound(format!("workflow not found: {workflow_id}")))?;

    let run_id = RunId::generate();
    let token = state.tokens.issue(&run_id);
    info!(run = %run_id, workflow = %workflow_id, "run accepted");

    let driver = state.driver.clone();
    let spawned_run = run_id.clone();
    tokio::spawn(async move {
        if let Err(e) = driver.execute(&workflow, &spawned_run, initial).await {
            error!(run = %spawned_run, "run failed: {e}");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "runId": run_id,
            "channelToken": token,
            "statusUrl": format!("/runs/{run_id}/status"),
        })),
    )
        .into_response())
}

#[derive(Deserialize)]
struct StatusQuery {
    token: String,
}

async fn status_ws_handler(
    State(state): State<SharedState>,
    Path(run_id): Path<String>,
    Query(query): Query<StatusQuery>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let run_id = RunId::new(run_id);
    if !state.tokens.verify(&query.token, &run_id) {
        return Err(ApiError::Unauthorized);
    }
    Ok(upgrade.on_upgrade(move |socket| async move {
        stream_status(socket, state.driver.bus(), run_id).await;
    }))
}
