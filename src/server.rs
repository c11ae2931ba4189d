use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Statistics ──────────────────────────────────────────
        .route("/api/mempool/stats", get(handlers::stats::get_stats))
        .route(
            "/api/mempool/stats/range",
            get(handlers::stats::get_stats_range),
        )
        .route(
            "/api/mempool/stats/stream",
            get(handlers::stats::stats_stream),
        )
        // ── Mempool ─────────────────────────────────────────────
        .route("/api/mempool", get(handlers::mempool::get_info))
        .route("/api/mempool/tx", post(handlers::mempool::submit_tx))
        .route("/api/mempool/fees", get(handlers::mempool::get_fees))
        // ── Simulation control ──────────────────────────────────
        .route(
            "/api/simulation/start",
            post(handlers::simulation::start_simulation),
        )
        .route(
            "/api/simulation/stop",
            post(handlers::simulation::stop_simulation),
        )
        .route(
            "/api/simulation/status",
            get(handlers::simulation::simulation_status),
        )
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
