use hdrhistogram::Histogram;
use serde::Serialize;

/// HdrHistogram range: 1 → 10M base units per KvB, 3 significant figures.
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 10_000_000;
const HIST_SIGFIG: u8 = 3;

/// Percentile breakdown of the fee rates currently resident in the pool.
/// Serialized straight into the `/api/mempool/fees` reply.
#[derive(Debug, Clone, Serialize)]
pub struct FeeratePercentiles {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub count: u64,
}

impl FeeratePercentiles {
    /// Builds the breakdown from raw per-KvB fee rates.
    /// Returns zeroed values when the pool is empty.
    pub fn from_rates(rates: &[u64]) -> Self {
        let mut hist = Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
            .expect("histogram bounds are static");
        for &rate in rates {
            // Saturate at the histogram ceiling rather than dropping.
            let _ = hist.record(rate.clamp(HIST_LOW, HIST_HIGH));
        }

        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_percentile(50.0),
            p90: hist.value_at_percentile(90.0),
            p99: hist.value_at_percentile(99.0),
            count: hist.len(),
        }
    }

    /// All-zero placeholder for a pool with no transactions.
    pub fn empty() -> Self {
        Self {
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0,
            p90: 0,
            p99: 0,
            count: 0,
        }
    }
}
