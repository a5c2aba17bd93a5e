// HTTP request handlers
use crate::domain::backend::BackendKind;
use crate::error::ServiceError;
use crate::infrastructure::http_response::{accepts_brotli, respond};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Response, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SelectBackendRequest {
    pub backend: String,
}

#[derive(Deserialize, Default)]
pub struct ExecuteRequest {
    pub query: Option<String>,
    pub page: Option<u32>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::UnknownChart(_) => StatusCode::NOT_FOUND,
        ServiceError::UnknownBackend(_) | ServiceError::BackendNotConfigured(_) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::Session(_) => StatusCode::CONFLICT,
    }
}

async fn reply<T: Serialize>(result: Result<T, ServiceError>, headers: &HeaderMap) -> Response<Body> {
    let compress = accepts_brotli(headers);
    match result {
        Ok(view) => respond(StatusCode::OK, &view, compress).await,
        Err(err) => {
            let status = status_for(&err);
            tracing::debug!("request rejected ({}): {}", status, err);
            let body = ErrorBody {
                error: err.to_string(),
            };
            respond(status, &body, compress).await
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_charts(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response<Body> {
    let views = state.chart_service.list().await;
    reply(Ok(views), &headers).await
}

pub async fn get_chart(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    reply(state.chart_service.view(&id).await, &headers).await
}

/// "Initial Load" button
pub async fn load_chart(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    reply(state.chart_service.start_initial_load(&id).await, &headers).await
}

/// "Load More" button
pub async fn load_more_chart(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    reply(state.chart_service.load_more(&id).await, &headers).await
}

pub async fn reset_chart(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    reply(state.chart_service.reset(&id).await, &headers).await
}

pub async fn get_console(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response<Body> {
    let view = state.console_service.view().await;
    reply(Ok(view), &headers).await
}

pub async fn select_backend(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectBackendRequest>,
) -> Response<Body> {
    let result = match request.backend.parse::<BackendKind>() {
        Ok(backend) => state.console_service.select_backend(backend).await,
        Err(name) => Err(ServiceError::UnknownBackend(name)),
    };
    reply(result, &headers).await
}

pub async fn execute_query(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Response<Body> {
    let result = state
        .console_service
        .execute(request.query, request.page)
        .await;
    reply(result, &headers).await
}

pub async fn next_page(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response<Body> {
    reply(state.console_service.next().await, &headers).await
}

pub async fn previous_page(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response<Body> {
    reply(state.console_service.previous().await, &headers).await
}
