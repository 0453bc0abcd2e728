use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::router::GalleryState;

/// GET /health -> liveness probe.
pub async fn health() -> &'static str {
    "OK"
}

/// GET /status -> database reachability. Failures are logged, not echoed.
pub async fn status(State(state): State<GalleryState>) -> Response {
    match state.storage.list_tables().await {
        Ok(tables) => (
            StatusCode::OK,
            Json(json!({ "status": "up", "tables": tables })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "status probe: database unreachable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "degraded", "message": "database connection failed" })),
            )
                .into_response()
        }
    }
}
