use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Target transaction submissions per second
    #[serde(default = "default_tx_per_sec")]
    pub tx_per_sec: u32,

    /// How long the simulation runs (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Seconds between simulated confirmation batches
    #[serde(default = "default_confirm_every")]
    pub confirm_every_secs: u64,
}

fn default_tx_per_sec() -> u32 {
    50
}
fn default_duration() -> u64 {
    120
}
fn default_confirm_every() -> u64 {
    15
}

#[derive(Debug, Serialize)]
pub struct SimulationStatus {
    pub running: bool,
    pub message: String,
}

// ─── POST /api/simulation/start ──────────────────────────────────

pub async fn start_simulation(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SimulationConfig>,
) -> Result<Json<SimulationStatus>, AppError> {
    // Guard: only one simulation at a time
    if state.sim_running.load(Ordering::SeqCst) {
        return Err(AppError::AlreadyRunning);
    }
    if !state.pool.info().ready {
        return Err(AppError::PoolNotReady);
    }

    // Validate inputs
    if config.tx_per_sec == 0 || config.tx_per_sec > 10_000 {
        return Err(AppError::BadRequest(
            "tx_per_sec must be between 1 and 10000".into(),
        ));
    }
    if config.duration_secs == 0 || config.duration_secs > 86_400 {
        return Err(AppError::BadRequest(
            "duration_secs must be between 1 and 86400".into(),
        ));
    }
    if config.confirm_every_secs == 0 || config.confirm_every_secs > 3_600 {
        return Err(AppError::BadRequest(
            "confirm_every_secs must be between 1 and 3600".into(),
        ));
    }

    // Flip the flag BEFORE spawning so the loops see it immediately
    state.sim_running.store(true, Ordering::SeqCst);

    let msg = format!(
        "Started: {} tx/s for {}s, confirming every {}s",
        config.tx_per_sec, config.duration_secs, config.confirm_every_secs,
    );

    let running = state.sim_running.clone();
    let pool = state.pool.clone();
    let handle = tokio::spawn(async move {
        crate::simulator::run(
            running,
            pool,
            config.tx_per_sec,
            config.duration_secs,
            config.confirm_every_secs,
        )
        .await;
    });

    // Stash the handle so `stop` can await clean shutdown
    let mut guard = state.sim_handle.lock().await;
    *guard = Some(handle);

    Ok(Json(SimulationStatus {
        running: true,
        message: msg,
    }))
}

// ─── POST /api/simulation/stop ───────────────────────────────────

pub async fn stop_simulation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SimulationStatus>, AppError> {
    if !state.sim_running.load(Ordering::SeqCst) {
        return Ok(Json(SimulationStatus {
            running: false,
            message: "No simulation is running".into(),
        }));
    }

    state.sim_running.store(false, Ordering::SeqCst);

    let mut guard = state.sim_handle.lock().await;
    if let Some(handle) = guard.take() {
        // Ignore JoinError — the task may have already finished
        let _ = handle.await;
    }

    Ok(Json(SimulationStatus {
        running: false,
        message: "Simulation stopped".into(),
    }))
}

// ─── GET /api/simulation/status ──────────────────────────────────

pub async fn simulation_status(State(state): State<Arc<AppState>>) -> Json<SimulationStatus> {
    let running = state.sim_running.load(Ordering::SeqCst);
    Json(SimulationStatus {
        running,
        message: if running {
            "Simulation in progress".into()
        } else {
            "Idle".into()
        },
    })
}
