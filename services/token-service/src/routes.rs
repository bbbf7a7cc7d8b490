//! HTTP surface: token actions, health and metrics
//!
//! Every token action is a `GET` with query parameters. Failures render as
//! `{"error": "<message>"}` with 400 for anything the caller sent and 500
//! when the service itself could not hash or persist.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{MatchedPath, Query, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use session::{SessionManager, TokenPair};
use tracing::{error, info, warn};
use user_store::FileUserStore;

use crate::metrics::{record_failure, record_request};

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager<FileUserStore>>,
    pub started_at: Instant,
    pub prometheus: PrometheusHandle,
}

/// Query parameters shared by the token actions. Absent values are empty
/// strings so the session layer reports which one is blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenParams {
    user_id: String,
    access_token: String,
    refresh_token: String,
}

/// Build the axum router with all routes and shared state.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/get_users", get(get_users))
        .route("/get_tokens", get(get_tokens))
        .route("/ping", get(ping))
        .route("/refresh_tokens", get(refresh_tokens))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_requests))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// Session failure rendered as the JSON error envelope.
struct ApiError(session::Error);

impl From<session::Error> for ApiError {
    fn from(err: session::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        record_failure(kind);

        let status = if self.0.is_client_error() {
            warn!(kind, error = %self.0, "request rejected");
            StatusCode::BAD_REQUEST
        } else {
            error!(kind, error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        json_response(status, serde_json::json!({ "error": self.0.to_string() }))
    }
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (status, [(CONTENT_TYPE, "application/json")], body.to_string()).into_response()
}

fn pair_response(pair: TokenPair) -> Response {
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "access_token": pair.access_token,
            "refresh_token": pair.refresh_token,
        }),
    )
}

async fn get_users(State(state): State<AppState>) -> Result<Response, ApiError> {
    let users = state.sessions.list_users().await?;
    let body: Vec<serde_json::Value> = users
        .iter()
        .map(|user| {
            serde_json::json!({
                "id": user.id,
                "has_refresh_token": user.has_refresh_token(),
            })
        })
        .collect();
    Ok(json_response(StatusCode::OK, serde_json::Value::Array(body)))
}

async fn get_tokens(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> Result<Response, ApiError> {
    let pair = state.sessions.issue(&params.user_id).await?;
    Ok(pair_response(pair))
}

async fn ping(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> Result<Response, ApiError> {
    let token = state.sessions.authenticate(&params.access_token).await?;
    info!(user_id = token.subject(), "ping");
    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        "pong",
    )
        .into_response())
}

async fn refresh_tokens(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> Result<Response, ApiError> {
    let pair = state
        .sessions
        .renew(&params.access_token, &params.refresh_token)
        .await?;
    Ok(pair_response(pair))
}

async fn health_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "users": state.sessions.store().len().await,
            "uptime_seconds": state.started_at.elapsed().as_secs(),
        }),
    )
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.prometheus.render(),
    )
}

/// Record count and latency per matched route.
async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let start = Instant::now();

    let response = next.run(request).await;

    record_request(
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
