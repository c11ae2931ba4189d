use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

mod config;
mod fees;
mod handlers;
mod mempool;
mod middleware;
mod server;
mod simulator;
mod stats;

use config::Config;
use mempool::Mempool;
use stats::{SampleStore, StatsCollector};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// The in-memory transaction pool being sampled.
    pub pool: Arc<Mempool>,

    /// Read handle to the sample history — handlers can only query;
    /// the single write handle lives inside the collector.
    pub stats: Arc<SampleStore>,

    /// Sampling cadence, reused by the SSE stream.
    pub sample_interval: std::time::Duration,

    /// Flag checked by the simulator loops on each iteration.
    pub sim_running: Arc<AtomicBool>,

    /// Handle to the spawned simulation so we can await clean shutdown.
    pub sim_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[tokio::main]
async fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║        MEMPOOL STATISTICS OBSERVATORY            ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    // ── 1. Configuration (read once, immutable afterwards) ───────
    let cfg = Config::from_env();
    println!(
        "Sampling every {}s, retaining up to {} samples{}",
        cfg.sample_interval.as_secs(),
        cfg.retention.max_samples,
        match cfg.retention.max_age {
            Some(age) => format!(" (max age {}s)", age.as_secs()),
            None => String::new(),
        },
    );

    // ── 2. Build and seed the pool ───────────────────────────────
    let pool = Arc::new(Mempool::new(cfg.pool_max_memory, cfg.base_fee_per_k));
    {
        // Deterministic RNG so re-runs start from the same pool shape.
        let mut rng = StdRng::seed_from_u64(42);
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        pool.seed(&mut rng, cfg.seed_txs, now);
        let info = pool.info();
        println!(
            "Pool seeded: {} txs, {:.1} MB, min fee {} per KvB",
            info.tx_count,
            info.dynamic_memory_usage as f64 / (1024.0 * 1024.0),
            info.min_fee_per_k,
        );
    }

    // ── 3. Arm the statistics subsystem (Stopped → Running) ──────
    let (stats, writer) = SampleStore::with_policy(cfg.retention);
    let collector = StatsCollector::start(pool.clone(), writer, cfg.sample_interval);

    // ── 4. Build shared state and router ─────────────────────────
    let state = Arc::new(AppState {
        pool,
        stats,
        sample_interval: cfg.sample_interval,
        sim_running: Arc::new(AtomicBool::new(false)),
        sim_handle: tokio::sync::Mutex::new(None),
    });
    let app = server::create_router(state.clone());

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .expect("Failed to bind — is the port already in use?");

    println!();
    println!("Server listening on http://{}", cfg.bind_addr);
    println!("Stats JSON    → /api/mempool/stats");
    println!("Stats SSE     → /api/mempool/stats/stream");
    println!("Pool info     → /api/mempool");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await
        .expect("Server exited with error");

    // ── 6. Ordered teardown (Running → Stopped) ──────────────────
    // Stop producing into the pool first, then disarm the sampler;
    // the store is dropped last, after the collector has fully exited.
    state
        .sim_running
        .store(false, std::sync::atomic::Ordering::SeqCst);
    if let Some(handle) = state.sim_handle.lock().await.take() {
        let _ = handle.await;
    }
    let skipped = collector.ticks_skipped();
    collector.shutdown().await;
    println!("Collector stopped ({skipped} ticks skipped)");
}
