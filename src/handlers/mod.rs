pub mod mempool;
pub mod simulation;
pub mod stats;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// Pool still warming up — retry shortly.
    PoolNotReady,
    AlreadyRunning,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::PoolNotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Mempool is still warming up".into(),
            ),
            Self::AlreadyRunning => {
                (StatusCode::CONFLICT, "Simulation already running".into())
            }
        };

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
