use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::stats::StatsReply;
use crate::AppState;

// ─── GET /api/mempool/stats ──────────────────────────────────────
/// The full retained history as non-interpolated samples, flat-encoded:
/// `{time_from, time_to, samples: [[delta,tx_count,dyn_mem,min_fee_per_k],..]}`.

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsReply> {
    Json(state.stats.query_range(0, 0).into())
}

// ─── GET /api/mempool/stats/range ────────────────────────────────
/// Explicit-range variant.  Missing params default to 0, so an empty
/// query string means "everything".  `to < from` yields an empty reply
/// with zeroed bounds, never an error.

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    #[serde(default)]
    pub from: u64,
    #[serde(default)]
    pub to: u64,
}

pub async fn get_stats_range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Json<StatsReply> {
    Json(state.stats.query_range(params.from, params.to).into())
}

// ─── GET /api/mempool/stats/stream ───────────────────────────────
/// Server-Sent Events endpoint: pushes the full `StatsReply` on every
/// sampling interval so a chart can track the store live.

pub async fn stats_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(state.sample_interval);

    let stream = IntervalStream::new(interval).map(move |_| {
        let reply: StatsReply = state.stats.query_range(0, 0).into();
        let json = serde_json::to_string(&reply).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
