// HTTP route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use crucible_common::types::ExecuteRequest;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{executor, AppState};

/// POST /execute - compile, run, and judge one submission.
///
/// Every orderly outcome is a 200 carrying the canonical result, including
/// compile errors and failed tests. 400 is reserved for requests the
/// executor cannot meaningfully look at.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteRequest>,
) -> impl IntoResponse {
    if payload.language.is_empty() || payload.code.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "language and code are required" })),
        )
            .into_response();
    }
    if payload.run_tests && payload.test_code.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "testCode is required when runTests is set" })),
        )
            .into_response();
    }

    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        language = %payload.language,
        run_tests = payload.run_tests,
        source_size = payload.code.len(),
        "execution request"
    );

    let result = executor::execute(&payload, &state.config).await;
    (StatusCode::OK, Json(result)).into_response()
}

/// GET /status - health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
