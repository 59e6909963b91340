//! HTTP 层
//!
//! - `GET /health` - 健康检查
//! - `POST /process` - Webhook 入口：校验 → 定位行 → LLM → 写回

pub mod gate;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::SheetsBackend;
use crate::services::{RowLocator, RowUpdater, TextProcessor};
use crate::workflow::ProcessFlow;

pub use gate::{RequestGate, SECRET_HEADER};

/// 路由共享状态
///
/// 所有字段在启动时构造一次，请求之间只读共享
#[derive(Clone)]
pub struct AppState {
    gate: Arc<RequestGate>,
    flow: Arc<ProcessFlow>,
}

impl AppState {
    pub fn new(
        config: &Config,
        backend: Arc<dyn SheetsBackend>,
        processor: Arc<dyn TextProcessor>,
    ) -> Self {
        let locator =
            RowLocator::new(backend.clone()).including_header(config.pk_scan_includes_header);
        let updater = RowUpdater::new(backend, locator);

        Self {
            gate: Arc::new(RequestGate::new(config)),
            flow: Arc::new(ProcessFlow::new(config, updater, processor)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/process", post(process))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ProcessResponse {
    status: &'static str,
    row_id: Value,
    ai_result: String,
    processed_at: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn process(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ProcessResponse>> {
    state.gate.verify_secret(&headers)?;

    let request = state.gate.parse_body(&body).inspect_err(|e| {
        warn!("请求校验失败: {}", e);
    })?;

    let outcome = state.flow.run(&request).await?;

    Ok(Json(ProcessResponse {
        status: "success",
        row_id: outcome.row_id,
        ai_result: outcome.ai_result,
        processed_at: outcome.processed_at,
    }))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            AppError::RowNotFound { .. } => warn!("请求处理失败: {}", self),
            _ if status.is_server_error() => error!("请求处理失败: {}", self),
            _ => {}
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
