//! API routes for grindd
//!
//! - `GET  /config`       current record, after lazy expiry
//! - `POST /config`       admin patch (bearer secret required)
//! - `POST /client-grind` client self-imposed grind period
//! - `GET  /health`       liveness

use crate::auth;
use crate::error::ApiError;
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use grind_common::{
    ClientGrindRequest, ConfigPatch, ConfigRecord, HealthResponse, ModeStateMachine, StateError,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::error;

type AppStateArc = Arc<AppState>;

pub const INVALID_JSON: &str = "request body must be valid JSON";

// ============================================================================
// Config Routes
// ============================================================================

pub fn config_routes() -> Router<AppStateArc> {
    Router::new().route(
        "/config",
        get(get_config)
            .post(update_config)
            .fallback(method_not_allowed),
    )
}

async fn get_config(State(state): State<AppStateArc>) -> Result<Json<ConfigRecord>, ApiError> {
    let record = run_machine(&state, |machine| machine.read_with_lazy_expiry()).await?;
    Ok(Json(record))
}

async fn update_config(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ConfigRecord>, ApiError> {
    auth::authorize(&headers, &state.secret)?;

    let body = parse_body(&body?, false)?;
    let patch = ConfigPatch::from_value(&body)?;

    let record = run_machine(&state, move |machine| machine.admin_update(&patch)).await?;
    Ok(Json(record))
}

// ============================================================================
// Client Routes
// ============================================================================

pub fn client_routes() -> Router<AppStateArc> {
    Router::new().route(
        "/client-grind",
        post(client_grind).fallback(method_not_allowed),
    )
}

async fn client_grind(
    State(state): State<AppStateArc>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ConfigRecord>, ApiError> {
    let body = parse_body(&body?, true)?;
    let request = ClientGrindRequest::from_value(&body)?;

    let record = run_machine(&state, move |machine| machine.client_enable_grind(&request)).await?;
    Ok(Json(record))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check).fallback(method_not_allowed))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: grind_common::VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Fallbacks and helpers
// ============================================================================

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Parse a JSON body. With `empty_as_object`, an empty body reads as `{}`.
fn parse_body(bytes: &[u8], empty_as_object: bool) -> Result<Value, ApiError> {
    if empty_as_object && bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).map_err(|_| ApiError::bad_request(INVALID_JSON))
}

/// Run a state machine operation off the async runtime; it does blocking file I/O
async fn run_machine<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&ModeStateMachine) -> Result<T, StateError> + Send + 'static,
    T: Send + 'static,
{
    let machine = Arc::clone(&state.machine);
    let result = tokio::task::spawn_blocking(move || op(&machine))
        .await
        .map_err(|e| {
            error!("State machine task failed: {}", e);
            ApiError::internal()
        })?;
    Ok(result?)
}
