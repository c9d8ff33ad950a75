//! API handlers

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::api::AppState;
use crate::Error;

/// Error surfaced to HTTP callers as a status code and plain-text message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, error = %self.message, "Request failed");
        }
        (self.status, self.message).into_response()
    }
}

fn json_body(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Health check with backend status
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let health = state.gateway.health().await.map_err(|e| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("backend unavailable: {e}"),
        )
    })?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        index: health.index,
        cluster_name: health.cluster_name,
        backend_version: health.backend_version,
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub index: String,
    pub cluster_name: String,
    pub backend_version: String,
}

/// Fetch a document by id on the blocking pool
pub async fn document_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let body = state.gateway.clone().document_by_id(id).await?;

    Ok(json_body(body))
}

/// Fetch a document by id, awaiting the pending result
pub async fn document_by_id_async(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let body = state.gateway.document_by_id_async(id).await?;
    Ok(json_body(body))
}

/// Search documents by first name, awaiting the pending result
pub async fn documents_by_first_name(
    State(state): State<AppState>,
    Path(search): Path<String>,
) -> Result<Response, ApiError> {
    let body = state.gateway.search_by_first_name_async(search).await?;
    Ok(json_body(body))
}
