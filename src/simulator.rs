use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tokio::time::Instant;

use crate::mempool::Mempool;

// ─── Public entry point ──────────────────────────────────────────

/// Drives the mempool with randomized submissions until the deadline or
/// the `running` flag is cleared.  One task submits transactions at the
/// target rate, another confirms a batch on a fixed cadence to mimic
/// block production.
pub async fn run(
    running: Arc<AtomicBool>,
    pool: Arc<Mempool>,
    tx_per_sec: u32,
    duration_secs: u64,
    confirm_every_secs: u64,
) {
    let deadline = Instant::now() + Duration::from_secs(duration_secs);

    let submitter = {
        let running = running.clone();
        let pool = pool.clone();
        tokio::spawn(async move {
            submit_loop(running, pool, tx_per_sec, deadline).await;
        })
    };

    let miner = {
        let running = running.clone();
        tokio::spawn(async move {
            confirm_loop(running, pool, confirm_every_secs, deadline).await;
        })
    };

    let _ = submitter.await;
    let _ = miner.await;

    // Mark the run as finished
    running.store(false, Ordering::SeqCst);
}

// ─── Submission loop ─────────────────────────────────────────────

async fn submit_loop(
    running: Arc<AtomicBool>,
    pool: Arc<Mempool>,
    tx_per_sec: u32,
    deadline: Instant,
) {
    // Deterministic RNG so re-runs produce the same traffic shape.
    let mut rng = StdRng::seed_from_u64(1_000);
    let mut ticker =
        tokio::time::interval(Duration::from_micros(1_000_000 / tx_per_sec.max(1) as u64));

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        ticker.tick().await;

        let base = pool.info().min_fee_per_k.max(1);
        let vsize = rng.gen_range(140..=2_500u64);
        // Mostly around the floor, occasionally well above it.
        let rate = if rng.gen_bool(0.8) {
            rng.gen_range(base..=base.saturating_mul(4))
        } else {
            rng.gen_range(base..=base.saturating_mul(40))
        };
        let fee = rate * vsize / 1_000;
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        // Below-floor rejections are part of normal pool behavior.
        let _ = pool.submit(vsize, fee, now);
    }
}

// ─── Confirmation loop ───────────────────────────────────────────

async fn confirm_loop(
    running: Arc<AtomicBool>,
    pool: Arc<Mempool>,
    confirm_every_secs: u64,
    deadline: Instant,
) {
    let mut rng = StdRng::seed_from_u64(2_000);
    let mut ticker = tokio::time::interval(Duration::from_secs(confirm_every_secs.max(1)));
    // The first interval tick fires immediately; skip it so a fresh run
    // does not instantly confirm the seeded transactions.
    ticker.tick().await;

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        ticker.tick().await;
        let batch = rng.gen_range(50..=400usize);
        pool.confirm(batch);
    }
}
