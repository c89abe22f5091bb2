// HTTP request handlers
use crate::application::panel::PanelEvent;
use crate::domain::error::ChartError;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

/// Non-fatal notification shown when an event or draw is rejected
#[derive(Debug, Serialize)]
pub struct Notification {
    pub error: &'static str,
    pub message: String,
}

impl From<&ChartError> for Notification {
    fn from(e: &ChartError) -> Self {
        Self {
            error: e.kind(),
            message: e.to_string(),
        }
    }
}

fn error_status(e: &ChartError) -> StatusCode {
    match e {
        ChartError::DataUnavailable(_) => StatusCode::CONFLICT,
        ChartError::UnknownMetric(_)
        | ChartError::UnknownAlgorithm(_)
        | ChartError::UnknownDate(_)
        | ChartError::ControlDisabled(_)
        | ChartError::InvalidSetting { .. } => StatusCode::BAD_REQUEST,
        ChartError::EmptySeries { .. } | ChartError::InvalidColumn { .. } | ChartError::Query(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn respond_error(e: &ChartError, compress: bool) -> Response {
    respond(error_status(e), &Notification::from(e), compress).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current selections, choices and enablement
pub async fn get_panel(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.panel.lock().await.view();
    respond(StatusCode::OK, &view, accepts_brotli(&headers)).await
}

/// Apply one user interaction to the panel
pub async fn post_event(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(event): Json<PanelEvent>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let result = state.panel.lock().await.apply(event);

    match result {
        Ok(view) => respond(StatusCode::OK, &view, compress).await,
        Err(e) => {
            tracing::warn!("Rejected panel event: {}", e);
            respond_error(&e, compress).await
        }
    }
}

/// Rebuild the chart from the current selections
pub async fn draw(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    let mut panel = state.panel.lock().await;

    match panel.draw().await {
        Ok(figure) => respond(StatusCode::OK, figure, compress).await,
        Err(e) => respond_error(&e, compress).await,
    }
}

/// Last successfully drawn figure
pub async fn get_figure(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let panel = state.panel.lock().await;

    match panel.figure() {
        Some(figure) => respond(StatusCode::OK, figure, accepts_brotli(&headers)).await,
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
