//! REST API handlers for the control plane
//!
//! This module defines the API routes and handlers for monitor management.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::config::SiteDefinition;
use crate::error::Error;
use crate::metrics;
use crate::models::MonitorStatus;
use crate::monitor::LifecycleOutcome;
use crate::utils::error::ConfigError;

use super::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub monitors: usize,
}

/// Error wrapper mapping crate errors to HTTP statuses
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Config(ConfigError::DuplicateName(_) | ConfigError::DuplicateStorage(_)) => {
                StatusCode::CONFLICT
            }
            Error::Config(ConfigError::Site { source, .. })
                if matches!(
                    **source,
                    ConfigError::DuplicateName(_) | ConfigError::DuplicateStorage(_)
                ) =>
            {
                StatusCode::CONFLICT
            }
            Error::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "API request failed");
        }
        (status, Json(ApiResponse::error(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/v1/monitors", get(list_monitors).post(add_monitor))
        .route(
            "/api/v1/monitors/{name}",
            get(get_monitor).delete(remove_monitor),
        )
        .route("/api/v1/monitors/{name}/start", post(start_monitor))
        .route("/api/v1/monitors/{name}/stop", post(stop_monitor))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        monitors: state.manager.registry().len().await,
    }))
}

async fn list_monitors(State(state): State<AppState>) -> Json<ApiResponse<Vec<MonitorStatus>>> {
    Json(ApiResponse::success(state.manager.list().await))
}

async fn get_monitor(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<MonitorStatus> {
    let status = state.manager.status(&name).await?;
    Ok(Json(ApiResponse::success(status)))
}

async fn add_monitor(
    State(state): State<AppState>,
    Json(site): Json<SiteDefinition>,
) -> Result<(StatusCode, Json<ApiResponse<MonitorStatus>>), ApiError> {
    let status = state.manager.add(site).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(status).with_message("monitor added")),
    ))
}

async fn remove_monitor(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<MonitorStatus> {
    let status = state.manager.remove(&name).await?;
    Ok(Json(ApiResponse::success(status).with_message("monitor removed")))
}

async fn start_monitor(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<LifecycleOutcome> {
    let outcome = state.manager.start(&name).await?;
    Ok(Json(ApiResponse::success(outcome).with_message(outcome.message())))
}

async fn stop_monitor(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<LifecycleOutcome> {
    let outcome = state.manager.stop(&name).await?;
    Ok(Json(ApiResponse::success(outcome).with_message(outcome.message())))
}

/// Prometheus text exposition
async fn metrics_handler() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(e.to_string())),
        )
            .into_response(),
    }
}
