use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::fees::FeeratePercentiles;
use crate::mempool::{PoolInfo, PoolTx, SubmitError};
use crate::AppState;

use super::AppError;

// ─── GET /api/mempool ────────────────────────────────────────────

pub async fn get_info(State(state): State<Arc<AppState>>) -> Json<PoolInfo> {
    Json(state.pool.info())
}

// ─── POST /api/mempool/tx ────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitTxRequest {
    /// Virtual size in vbytes.
    pub vsize: u64,
    /// Absolute fee in the base unit.
    pub fee: u64,
}

#[derive(Debug, Serialize)]
pub struct SubmitTxResponse {
    pub tx: PoolTx,
    pub fee_per_k: u64,
}

pub async fn submit_tx(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitTxRequest>,
) -> Result<Json<SubmitTxResponse>, AppError> {
    let now = chrono::Utc::now().timestamp().max(0) as u64;

    let tx = state
        .pool
        .submit(req.vsize, req.fee, now)
        .map_err(|e| match e {
            SubmitError::NotReady => AppError::PoolNotReady,
            SubmitError::InvalidSize => {
                AppError::BadRequest("vsize must be greater than zero".into())
            }
            SubmitError::FeeTooLow(required) => AppError::BadRequest(format!(
                "fee rate below the current minimum of {required} per KvB"
            )),
        })?;

    let fee_per_k = tx.fee_per_k();
    Ok(Json(SubmitTxResponse { tx, fee_per_k }))
}

// ─── GET /api/mempool/fees ───────────────────────────────────────
/// Percentile breakdown of the fee rates currently resident in the pool.

pub async fn get_fees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeeratePercentiles>, AppError> {
    let rates = state.pool.fee_rates().ok_or(AppError::PoolNotReady)?;
    Ok(Json(FeeratePercentiles::from_rates(&rates)))
}
