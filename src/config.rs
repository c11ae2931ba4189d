use std::time::Duration;

use crate::stats::RetentionPolicy;

// ─── Defaults ────────────────────────────────────────────────────

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
/// One sample every 2 seconds.
const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 2;
/// Retained history: 43200 samples ≈ one day at the default interval.
const DEFAULT_MAX_SAMPLES: usize = 43_200;
/// Pool memory budget: 300 MB, matching the usual mempool default.
const DEFAULT_POOL_MAX_MEMORY: u64 = 300 * 1024 * 1024;
/// Base relay fee: 1000 per KvB (1 unit per vbyte).
const DEFAULT_BASE_FEE_PER_K: u64 = 1_000;
/// Startup seed size for the simulated pool.
const DEFAULT_SEED_TXS: usize = 2_000;

// ─── Config ──────────────────────────────────────────────────────

/// Process configuration, read once at startup and immutable afterwards.
/// Environment variables override the defaults above.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub sample_interval: Duration,
    pub retention: RetentionPolicy,
    pub pool_max_memory: u64,
    pub base_fee_per_k: u64,
    pub seed_txs: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let mut retention = RetentionPolicy::by_count(
            env_parse("STATS_MAX_SAMPLES", DEFAULT_MAX_SAMPLES),
        );
        if let Some(secs) = env_opt::<u64>("STATS_MAX_AGE_SECS") {
            retention = retention.with_max_age(Duration::from_secs(secs));
        }

        Self {
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            sample_interval: Duration::from_secs(env_parse(
                "STATS_INTERVAL_SECS",
                DEFAULT_SAMPLE_INTERVAL_SECS,
            )),
            retention,
            pool_max_memory: env_parse("POOL_MAX_MEMORY", DEFAULT_POOL_MAX_MEMORY),
            base_fee_per_k: env_parse("POOL_BASE_FEE_PER_K", DEFAULT_BASE_FEE_PER_K),
            seed_txs: env_parse("POOL_SEED_TXS", DEFAULT_SEED_TXS),
        }
    }
}

/// Parse an env var, falling back to the default on absence or garbage.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env_opt(name).unwrap_or(default)
}

fn env_opt<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        let cfg = Config::from_env();
        assert_eq!(cfg.sample_interval, Duration::from_secs(2));
        assert_eq!(cfg.retention.max_samples, 43_200);
        assert!(cfg.retention.max_age.is_none());
        assert_eq!(cfg.base_fee_per_k, 1_000);
    }

    #[test]
    fn garbage_values_fall_back_to_defaults() {
        assert_eq!(env_parse("STATS_NO_SUCH_VAR", 7u64), 7);
        std::env::set_var("STATS_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse("STATS_TEST_GARBAGE", 7u64), 7);
        std::env::remove_var("STATS_TEST_GARBAGE");
    }
}
